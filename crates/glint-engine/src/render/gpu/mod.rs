//! [`Backend`](super::Backend) over wgpu.

mod backend;

pub use backend::{WgpuBackend, WgpuSnapshot};
