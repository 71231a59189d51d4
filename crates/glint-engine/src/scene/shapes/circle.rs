use core::f32::consts::TAU;

use crate::coords::Vec2;
use crate::paint::Color;
use crate::scene::{RenderList, Topology, Vertex};

impl RenderList {
    /// Closed circle outline as a line strip of `segments + 1` vertices.
    ///
    /// The last vertex repeats the first. `segments == 0` emits nothing.
    pub fn add_circle(&mut self, center: Vec2, radius: f32, color: Color, segments: u32) {
        if segments == 0 {
            return;
        }

        let step = TAU / segments as f32;
        let v: Vec<Vertex> = (0..=segments)
            .map(|i| {
                // exact wrap so the strip closes without a seam
                let theta = if i == segments { 0.0 } else { step * i as f32 };
                let p = Vec2::new(center.x + radius * theta.cos(), center.y + radius * theta.sin());
                Vertex::new(p, color)
            })
            .collect();

        self.add_vertices(&v, Topology::LineStrip, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_vertex_count_and_closure() {
        let mut list = RenderList::new();
        list.add_circle(Vec2::new(50.0, 50.0), 10.0, Color::WHITE, 24);

        assert_eq!(list.vertex_count(), 25);
        let first = list.vertices()[0];
        let last = list.vertices()[24];
        assert_eq!(first.pos, last.pos);
        assert_eq!(first.position(), Vec2::new(60.0, 50.0));
    }

    #[test]
    fn circle_draws_segments_lines() {
        let mut list = RenderList::new();
        list.add_circle(Vec2::zero(), 5.0, Color::WHITE, 64);
        let calls = list.draw_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].primitive_count, 64);
    }

    #[test]
    fn zero_segments_emits_nothing() {
        let mut list = RenderList::new();
        list.add_circle(Vec2::zero(), 5.0, Color::WHITE, 0);
        assert!(list.is_empty());
    }
}
