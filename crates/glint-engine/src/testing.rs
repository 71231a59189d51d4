//! Deterministic font fixtures for unit tests.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::text::{FontDesc, FontProvider, GlyphBitmap, GlyphRasterizer};

/// Monospace rasterizer: every glyph is `advance` wide and fully covers a
/// box inset by [`TOP_BEARING`](Self::TOP_BEARING) from the top and bottom.
#[derive(Debug, Clone)]
pub(crate) struct FixedRasterizer {
    line_height: u32,
    advance: u32,
    missing: HashSet<char>,
}

impl FixedRasterizer {
    pub const TOP_BEARING: i32 = 2;

    pub fn new(line_height: u32, advance: u32) -> Self {
        Self { line_height, advance, missing: HashSet::new() }
    }

    pub fn with_missing(mut self, chars: &[char]) -> Self {
        self.missing.extend(chars.iter().copied());
        self
    }
}

impl GlyphRasterizer for FixedRasterizer {
    fn line_height(&self) -> u32 {
        self.line_height
    }

    fn measure(&self, ch: char) -> Option<(u32, u32)> {
        (!self.missing.contains(&ch)).then_some((self.advance, self.line_height))
    }

    fn rasterize(&self, ch: char) -> Option<GlyphBitmap> {
        if ch == ' ' || self.missing.contains(&ch) {
            return None;
        }
        let height = self.line_height.saturating_sub(2 * Self::TOP_BEARING as u32).max(1);
        Some(GlyphBitmap {
            width: self.advance,
            height,
            offset_x: 0,
            offset_y: Self::TOP_BEARING,
            coverage: vec![255; (self.advance * height) as usize],
        })
    }
}

/// Every `(desc, dpi)` a [`FixedProvider`] resolved, shared with the test
/// after the provider moves into a renderer.
pub(crate) type ResolveLog = Rc<RefCell<Vec<(FontDesc, f32)>>>;

/// Provider that hands out [`FixedRasterizer`]s sized from the point size and
/// fails for families listed as unknown.
#[derive(Debug, Default)]
pub(crate) struct FixedProvider {
    unknown: HashSet<String>,
    resolved: ResolveLog,
}

impl FixedProvider {
    pub fn with_unknown(family: &str) -> Self {
        let mut p = Self::default();
        p.unknown.insert(family.to_owned());
        p
    }

    pub fn resolve_log(&self) -> ResolveLog {
        Rc::clone(&self.resolved)
    }
}

impl FontProvider for FixedProvider {
    fn resolve(&mut self, desc: &FontDesc, dpi: f32) -> Result<Box<dyn GlyphRasterizer>> {
        if self.unknown.contains(&desc.family) {
            return Err(Error::FontResolution {
                family: desc.family.clone(),
                reason: "no such family".into(),
            });
        }
        self.resolved.borrow_mut().push((desc.clone(), dpi));
        let line_height = desc.size + desc.size / 3;
        Ok(Box::new(FixedRasterizer::new(line_height, desc.size / 2 + 1)))
    }
}
