use crate::coords::{Rect, Vec2};
use crate::paint::Color;
use crate::scene::{RenderList, Topology};

use super::rect::quad;

/// Axis along which a gradient rectangle interpolates.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum GradientDirection {
    /// `from` on the left edge, `to` on the right edge.
    #[default]
    Horizontal,
    /// `from` on the top edge, `to` on the bottom edge.
    Vertical,
}

impl RenderList {
    /// Rectangle with per-corner colors; the rasterizer interpolates.
    pub fn add_gradient_rect(
        &mut self,
        min: Vec2,
        max: Vec2,
        from: Color,
        to: Color,
        direction: GradientDirection,
    ) {
        let corners = match direction {
            GradientDirection::Horizontal => [from, to, from, to],
            GradientDirection::Vertical => [from, from, to, to],
        };
        let v = quad(min, max, corners);
        self.add_vertices(&v, Topology::TriangleList, None);
    }

    #[inline]
    pub fn add_gradient_rect_rect(
        &mut self,
        rect: Rect,
        from: Color,
        to: Color,
        direction: GradientDirection,
    ) {
        self.add_gradient_rect(rect.min(), rect.max(), from, to, direction);
    }
}
