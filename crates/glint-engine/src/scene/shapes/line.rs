use crate::coords::Vec2;
use crate::paint::Color;
use crate::scene::{RenderList, Topology, Vertex};

impl RenderList {
    /// One-pixel line as a `LineList` pair.
    pub fn add_line(&mut self, a: Vec2, b: Vec2, color: Color) {
        let v = [Vertex::new(a, color), Vertex::new(b, color)];
        self.add_vertices(&v, Topology::LineList, None);
    }

    /// Line of arbitrary `thickness` as a 4-vertex triangle strip.
    ///
    /// The quad is centered on the segment. A zero-length segment has no
    /// direction and emits nothing.
    pub fn add_thick_line(&mut self, a: Vec2, b: Vec2, color: Color, thickness: f32) {
        let dir = b - a;
        let len = dir.length();
        if len <= f32::EPSILON || !len.is_finite() {
            return;
        }

        let offset = (dir / len).perp() * (thickness * 0.5);
        let v = [
            Vertex::new(a + offset, color),
            Vertex::new(a - offset, color),
            Vertex::new(b + offset, color),
            Vertex::new(b - offset, color),
        ];
        self.add_vertices(&v, Topology::TriangleStrip, None);
    }
}
