use thiserror::Error;

use crate::scene::{DrawCall, Vertex};
use crate::text::AtlasImage;

/// Opaque handle to a texture owned by a [`Backend`].
///
/// Ids are never reused by a backend instance, so a stale id can only miss.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TextureId(pub u64);

/// Parameters for (re)creating pipeline objects.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PipelineConfig {
    /// Vertices the dynamic vertex buffer can hold.
    pub vertex_capacity: usize,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("pipeline objects are not created")]
    NotLive,
    #[error("no render target bound")]
    NoTarget,
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("device limit exceeded: {0}")]
    Limit(String),
    #[error("unknown texture {0:?}")]
    UnknownTexture(TextureId),
    #[error("injected failure at {0}")]
    Injected(&'static str),
}

/// Everything the [`Renderer`](super::Renderer) needs from a GPU API.
///
/// A backend owns its pipeline objects (programs, vertex layout, fixed
/// states, vertex buffer, sampler, a 1×1 white fallback texture) and every
/// texture it hands out. Each object is released exactly once.
pub trait Backend {
    /// Host state captured by [`capture_state`](Self::capture_state).
    type Snapshot;

    /// Creates every pipeline object. All-or-nothing: on error, whatever was
    /// already created is released before returning.
    fn create_pipeline(&mut self, config: &PipelineConfig) -> Result<(), BackendError>;

    /// Releases the pipeline objects. Idempotent.
    fn teardown(&mut self);

    fn is_live(&self) -> bool;

    /// Snapshots the host state the overlay is about to overwrite.
    fn capture_state(&mut self) -> Self::Snapshot;

    /// Binds overlay state: straight alpha blending on, depth test off,
    /// scissor on, overlay programs and vertex layout bound.
    fn apply_frame_state(&mut self) -> Result<(), BackendError>;

    /// Puts back what [`capture_state`](Self::capture_state) saw.
    fn restore_state(&mut self, snapshot: Self::Snapshot);

    fn vertex_capacity(&self) -> usize;

    /// Makes room for at least `capacity` vertices.
    fn grow_vertex_buffer(&mut self, capacity: usize) -> Result<(), BackendError>;

    /// Uploads `vertices` once, then issues `draws` in order. Draws without a
    /// texture sample the white fallback.
    fn submit_batches(&mut self, vertices: &[Vertex], draws: &[DrawCall]) -> Result<(), BackendError>;

    fn create_texture(&mut self, image: &AtlasImage) -> Result<TextureId, BackendError>;

    /// Releases a texture. Unknown ids are ignored.
    fn release_texture(&mut self, id: TextureId);
}
