//! Vertex accumulation.
//!
//! Responsibilities:
//! - store emitted vertices in draw order
//! - group them into `(topology, texture)` batches so a frame turns into as
//!   few draw calls as possible
//! - keep shape-specific emitters isolated per shape file under `scene::shapes`

mod list;
mod topology;
mod vertex;

pub mod shapes;

pub use list::{Batch, DrawCall, RenderList};
pub use topology::Topology;
pub use vertex::Vertex;
