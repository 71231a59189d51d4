//! Fonts: glyph atlas construction, inline color markup and text layout.
//!
//! A [`Font`] turns a [`FontDesc`] into a single RGBA atlas texture covering
//! Basic Latin through Latin Extended-B, then lays out strings as textured
//! quads appended to a [`RenderList`](crate::scene::RenderList).
//!
//! Glyph shapes come from a [`GlyphRasterizer`] obtained through a
//! [`FontProvider`]; [`FontLibrary`] is the system-backed provider.

mod atlas;
mod flags;
mod font;
mod library;
mod markup;
mod rasterizer;

pub use atlas::AtlasImage;
pub use flags::{FontFlags, TextFlags};
pub use font::{Font, FontDesc, FontState, GlyphUv};
pub use library::FontLibrary;
pub use markup::{preprocess_text, TextSegment};
pub use rasterizer::{FontProvider, FontdueRasterizer, GlyphBitmap, GlyphRasterizer};
