//! GPU side of the overlay: the backend capability interface, its two
//! implementations and the [`Renderer`] that drives them.
//!
//! Convention:
//! - CPU geometry is in target pixels (top-left origin, +Y down).
//! - Vertex shaders convert to clip space from the viewport size.
//! - Vertex colors are straight (non-premultiplied) alpha.

mod backend;
mod gpu;
mod headless;
mod renderer;

pub use backend::{Backend, BackendError, PipelineConfig, TextureId};
pub use gpu::{WgpuBackend, WgpuSnapshot};
pub use headless::{ContextState, HeadlessBackend, ObjectId, PipelineStage};
pub use renderer::{FontHandle, Renderer, RendererConfig};
