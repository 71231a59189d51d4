use fontdue::{Font as FontdueFont, FontSettings};

use crate::error::{Error, Result};

use super::FontDesc;

const POINTS_PER_INCH: f32 = 72.0;

/// 8-bit coverage bitmap of one glyph, positioned relative to its cell.
///
/// The cell is the `(cx, cy)` box returned by
/// [`GlyphRasterizer::measure`]: its top edge is the line's top, its left
/// edge the pen position. Offsets may be negative (overhanging glyphs).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    pub offset_x: i32,
    pub offset_y: i32,
    /// Row-major, `width * height` bytes, 0 = empty, 255 = fully covered.
    pub coverage: Vec<u8>,
}

/// Glyph metrics and coverage for one face at one pixel size.
pub trait GlyphRasterizer {
    /// Height of one text line in pixels.
    fn line_height(&self) -> u32;

    /// Cell extent `(cx, cy)` of `ch`, or `None` when the face has no glyph.
    ///
    /// `cx` is the advance width, `cy` the line height. Space is always
    /// measurable.
    fn measure(&self, ch: char) -> Option<(u32, u32)>;

    /// Coverage of `ch`; `None` when there is nothing to draw.
    fn rasterize(&self, ch: char) -> Option<GlyphBitmap>;
}

/// Resolves a font description to a rasterizer.
pub trait FontProvider {
    fn resolve(&mut self, desc: &FontDesc, dpi: f32) -> Result<Box<dyn GlyphRasterizer>>;
}

/// [`GlyphRasterizer`] over a parsed fontdue face.
pub struct FontdueRasterizer {
    font: FontdueFont,
    px: f32,
    ascent: f32,
    line_height: u32,
}

impl FontdueRasterizer {
    /// Parses `bytes` (face `collection_index` of a collection) and sizes it
    /// to `size_pt` points at `dpi`.
    pub fn from_bytes(
        family: &str,
        bytes: &[u8],
        collection_index: u32,
        size_pt: u32,
        dpi: f32,
    ) -> Result<Self> {
        let settings = FontSettings { collection_index, ..FontSettings::default() };
        let font = FontdueFont::from_bytes(bytes, settings).map_err(|e| Error::FontResolution {
            family: family.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(font, size_pt, dpi))
    }

    pub fn new(font: FontdueFont, size_pt: u32, dpi: f32) -> Self {
        let px = size_pt as f32 * dpi / POINTS_PER_INCH;
        let (ascent, descent) = font
            .horizontal_line_metrics(px)
            .map(|m| (m.ascent, m.descent))
            .unwrap_or((px * 0.8, -px * 0.2));
        let line_height = (ascent - descent).ceil().max(1.0) as u32;

        Self { font, px, ascent, line_height }
    }

    #[inline]
    pub fn pixel_size(&self) -> f32 {
        self.px
    }

    fn has_glyph(&self, ch: char) -> bool {
        ch == ' ' || self.font.lookup_glyph_index(ch) != 0
    }
}

impl GlyphRasterizer for FontdueRasterizer {
    fn line_height(&self) -> u32 {
        self.line_height
    }

    fn measure(&self, ch: char) -> Option<(u32, u32)> {
        if !self.has_glyph(ch) {
            return None;
        }
        let metrics = self.font.metrics(ch, self.px);
        Some((metrics.advance_width.ceil().max(0.0) as u32, self.line_height))
    }

    fn rasterize(&self, ch: char) -> Option<GlyphBitmap> {
        if !self.has_glyph(ch) {
            return None;
        }
        let (metrics, coverage) = self.font.rasterize(ch, self.px);
        if metrics.width == 0 || metrics.height == 0 {
            return None;
        }

        // fontdue's ymin is the bitmap's bottom edge above the baseline
        let top = self.ascent.round() as i32 - (metrics.ymin + metrics.height as i32);
        Some(GlyphBitmap {
            width: metrics.width as u32,
            height: metrics.height as u32,
            offset_x: metrics.xmin,
            offset_y: top,
            coverage,
        })
    }
}
