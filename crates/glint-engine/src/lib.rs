//! Glint engine crate.
//!
//! An immediate-mode 2D overlay drawn on top of a host's frame: shapes and
//! text are accumulated into batched vertex lists, text goes through a
//! per-font glyph atlas, and the [`render::Renderer`] brackets each frame so
//! the host's pipeline state comes back untouched.

pub mod coords;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
pub mod text;

mod error;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
