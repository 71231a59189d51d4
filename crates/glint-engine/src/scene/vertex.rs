use bytemuck::{Pod, Zeroable};

use crate::coords::Vec2;
use crate::paint::Color;

/// One emitted vertex (20 bytes).
///
/// Layout, as uploaded to the GPU:
///
///  offset  0  pos    [f32; 2]   screen pixels
///  offset  8  color  u32        packed `0xAARRGGBB`
///  offset 12  uv     [f32; 2]   atlas coordinates, `[0, 0]` when untextured
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub color: u32,
    pub uv: [f32; 2],
}

impl Vertex {
    #[inline]
    pub fn new(pos: Vec2, color: Color) -> Self {
        Self { pos: pos.to_array(), color: color.argb(), uv: [0.0, 0.0] }
    }

    #[inline]
    pub fn textured(pos: Vec2, color: Color, uv: [f32; 2]) -> Self {
        Self { pos: pos.to_array(), color: color.argb(), uv }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.pos[0], self.pos[1])
    }

    #[inline]
    pub fn color(&self) -> Color {
        Color(self.color)
    }
}
