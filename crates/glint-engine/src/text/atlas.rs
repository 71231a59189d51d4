use std::collections::HashMap;

use crate::error::{Error, Result};

use super::font::GlyphUv;
use super::rasterizer::{GlyphBitmap, GlyphRasterizer};

/// Characters baked into every atlas: Basic Latin through Latin Extended-B.
pub(crate) const ALPHABET: core::ops::Range<u32> = 0x20..0x250;

/// RGBA8 atlas pixels: white RGB with glyph coverage in alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasImage {
    pub width: u32,
    pub height: u32,
    /// Row-major, 4 bytes per pixel.
    pub pixels: Vec<u8>,
}

impl AtlasImage {
    fn new(width: u32, height: u32) -> Self {
        let mut pixels = vec![0xFF; width as usize * height as usize * 4];
        for px in pixels.chunks_exact_mut(4) {
            px[3] = 0;
        }
        Self { width, height, pixels }
    }

    #[inline]
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixels[(y as usize * self.width as usize + x as usize) * 4 + 3]
    }

    /// Writes `bitmap` with its top-left at `(x, y)`, clipped to the image.
    fn blit_coverage(&mut self, x: i32, y: i32, bitmap: &GlyphBitmap) {
        let (w, h) = (self.width as i32, self.height as i32);
        for row in 0..bitmap.height as i32 {
            let dy = y + row;
            if dy < 0 || dy >= h {
                continue;
            }
            for col in 0..bitmap.width as i32 {
                let dx = x + col;
                if dx < 0 || dx >= w {
                    continue;
                }
                let src = (row * bitmap.width as i32 + col) as usize;
                let Some(&coverage) = bitmap.coverage.get(src) else { continue };
                let dst = ((dy * w + dx) as usize) * 4 + 3;
                self.pixels[dst] = self.pixels[dst].max(coverage);
            }
        }
    }
}

/// One measurable character of the alphabet.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct GlyphCell {
    pub ch: char,
    pub cx: u32,
    pub cy: u32,
}

/// Measures every alphabet character the face knows.
pub(crate) fn measure_alphabet(rasterizer: &dyn GlyphRasterizer) -> Vec<GlyphCell> {
    ALPHABET
        .filter_map(char::from_u32)
        .filter_map(|ch| rasterizer.measure(ch).map(|(cx, cy)| GlyphCell { ch, cx, cy }))
        .collect()
}

/// Row packer shared by sizing and rendering so both passes agree.
///
/// Cells are `margin` pixels apart horizontally on both sides and one pixel
/// apart vertically.
#[derive(Debug)]
struct RowPacker {
    width: u32,
    height: u32,
    margin: u32,
    x: u32,
    y: u32,
}

impl RowPacker {
    fn new(width: u32, height: u32, margin: u32) -> Self {
        Self { width, height, margin, x: margin, y: 0 }
    }

    /// Cell origin for a `cx × cy` glyph, or `None` when the atlas is full.
    fn place(&mut self, cx: u32, cy: u32) -> Option<(u32, u32)> {
        if self.x + cx + self.margin > self.width {
            self.x = self.margin;
            self.y += cy + 1;
        }
        if self.y + cy > self.height {
            return None;
        }
        let at = (self.x, self.y);
        self.x += cx + 2 * self.margin;
        Some(at)
    }
}

/// Smallest square power-of-two atlas, starting at `initial`, that fits
/// every cell. Each overflow doubles the side and repacks from the start.
pub(crate) fn estimate_texture_size(
    cells: &[GlyphCell],
    margin: u32,
    initial: u32,
    max: u32,
) -> Result<u32> {
    let mut size = initial.max(1);
    'grow: loop {
        if size > max {
            return Err(Error::AtlasTooLarge { width: size, height: size, max });
        }
        let mut packer = RowPacker::new(size, size, margin);
        for cell in cells {
            if packer.place(cell.cx, cell.cy).is_none() {
                size = size.saturating_mul(2);
                continue 'grow;
            }
        }
        return Ok(size);
    }
}

/// Rasterizes `cells` into a `size × size` atlas and returns the image with
/// each character's normalized footprint.
pub(crate) fn render_alphabet(
    rasterizer: &dyn GlyphRasterizer,
    cells: &[GlyphCell],
    margin: u32,
    size: u32,
) -> Result<(AtlasImage, HashMap<char, GlyphUv>)> {
    let mut image = AtlasImage::new(size, size);
    let mut glyphs = HashMap::with_capacity(cells.len());
    let mut packer = RowPacker::new(size, size, margin);
    let extent = size as f32;

    for cell in cells {
        let (x, y) = packer.place(cell.cx, cell.cy).ok_or(Error::AtlasOverflow)?;

        if let Some(bitmap) = rasterizer.rasterize(cell.ch) {
            image.blit_coverage(x as i32 + bitmap.offset_x, y as i32 + bitmap.offset_y, &bitmap);
        }

        glyphs.insert(
            cell.ch,
            GlyphUv {
                x0: (x - margin) as f32 / extent,
                y0: y as f32 / extent,
                x1: (x + cell.cx + margin) as f32 / extent,
                y1: (y + cell.cy) as f32 / extent,
            },
        );
    }

    Ok((image, glyphs))
}
