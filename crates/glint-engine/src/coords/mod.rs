//! Screen-space geometry shared by the list, text and backend layers.
//!
//! Canonical space:
//! - pixels of the bound render target
//! - origin top-left
//! - +X right, +Y down
//!
//! Backends convert to clip space in the vertex shader from the viewport size.

mod rect;
mod vec2;
mod viewport;

pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::{ScissorRect, Viewport};
