use crate::coords::{Rect, Vec2};
use crate::paint::Color;
use crate::scene::{RenderList, Topology, Vertex};

/// Two triangles covering `min..max`: TL, TR, BL, TR, BR, BL.
#[inline]
pub(super) fn quad(min: Vec2, max: Vec2, colors: [Color; 4]) -> [Vertex; 6] {
    let [tl, tr, bl, br] = colors;
    let top_right = Vertex::new(Vec2::new(max.x, min.y), tr);
    let bottom_left = Vertex::new(Vec2::new(min.x, max.y), bl);
    [
        Vertex::new(min, tl),
        top_right,
        bottom_left,
        top_right,
        Vertex::new(max, br),
        bottom_left,
    ]
}

impl RenderList {
    /// Solid rectangle from `min` (top-left) to `max` (bottom-right).
    pub fn add_rect_filled(&mut self, min: Vec2, max: Vec2, color: Color) {
        let v = quad(min, max, [color; 4]);
        self.add_vertices(&v, Topology::TriangleList, None);
    }

    /// Rectangle outline built from four filled edge bars, each
    /// `stroke_width` thick and lying inside `min..max`.
    pub fn add_rect(&mut self, min: Vec2, max: Vec2, color: Color, stroke_width: f32) {
        let s = stroke_width;
        self.add_rect_filled(min, Vec2::new(max.x, min.y + s), color);
        self.add_rect_filled(Vec2::new(min.x, max.y - s), max, color);
        self.add_rect_filled(min, Vec2::new(min.x + s, max.y), color);
        self.add_rect_filled(Vec2::new(max.x - s, min.y), max, color);
    }

    #[inline]
    pub fn add_rect_filled_rect(&mut self, rect: Rect, color: Color) {
        self.add_rect_filled(rect.min(), rect.max(), color);
    }

    #[inline]
    pub fn add_rect_outline_rect(&mut self, rect: Rect, color: Color, stroke_width: f32) {
        self.add_rect(rect.min(), rect.max(), color, stroke_width);
    }
}
