//! Geometry emitters appending to a [`RenderList`](super::RenderList).
//!
//! Every emitter is an `impl RenderList` block in its own file. Emitters
//! never touch the GPU; they only append vertices and batches.

mod circle;
mod gradient;
mod line;
mod rect;

pub use gradient::GradientDirection;
