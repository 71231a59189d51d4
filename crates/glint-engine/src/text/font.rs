use std::collections::HashMap;

use crate::coords::Vec2;
use crate::error::{Error, Result};
use crate::paint::Color;
use crate::render::{Backend, RendererConfig, TextureId};
use crate::scene::{RenderList, Topology, Vertex};

use super::atlas::{estimate_texture_size, measure_alphabet, render_alphabet};
use super::markup::{preprocess_text, strip_markup};
use super::{FontFlags, GlyphRasterizer, TextFlags};

/// What to load: family name, size in points and face flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontDesc {
    pub family: String,
    pub size: u32,
    pub flags: FontFlags,
}

impl FontDesc {
    pub fn new(family: impl Into<String>, size: u32, flags: FontFlags) -> Self {
        Self { family: family.into(), size, flags }
    }
}

/// Atlas lifecycle of a [`Font`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FontState {
    Uninitialized,
    Initializing,
    Ready,
    /// Atlas released on device loss; glyph map and metrics kept.
    Lost,
}

/// Normalized atlas rectangle of one glyph's footprint (cell plus margins).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphUv {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl GlyphUv {
    /// Footprint size in pixels for an atlas of `width × height`.
    #[inline]
    pub fn footprint(&self, width: u32, height: u32) -> Vec2 {
        Vec2::new((self.x1 - self.x0) * width as f32, (self.y1 - self.y0) * height as f32)
    }
}

/// A font baked into one atlas texture.
pub struct Font {
    desc: FontDesc,
    rasterizer: Box<dyn GlyphRasterizer>,
    state: FontState,
    glyphs: HashMap<char, GlyphUv>,
    atlas_size: u32,
    margin: u32,
    line_height: f32,
    texture: Option<TextureId>,
}

impl Font {
    /// Wraps a resolved rasterizer. No atlas exists until
    /// [`initialize`](Self::initialize).
    pub fn new(desc: FontDesc, rasterizer: Box<dyn GlyphRasterizer>) -> Self {
        Self {
            desc,
            rasterizer,
            state: FontState::Uninitialized,
            glyphs: HashMap::new(),
            atlas_size: 0,
            margin: 0,
            line_height: 0.0,
            texture: None,
        }
    }

    #[inline]
    pub fn desc(&self) -> &FontDesc {
        &self.desc
    }

    #[inline]
    pub fn state(&self) -> FontState {
        self.state
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.state == FontState::Ready
    }

    #[inline]
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Side length of the square atlas, 0 before the first initialize.
    #[inline]
    pub fn atlas_size(&self) -> u32 {
        self.atlas_size
    }

    #[inline]
    pub fn margin(&self) -> u32 {
        self.margin
    }

    #[inline]
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    #[inline]
    pub fn glyph(&self, ch: char) -> Option<&GlyphUv> {
        self.glyphs.get(&ch)
    }

    /// Characters present in the atlas, sorted.
    pub fn glyph_set(&self) -> Vec<char> {
        let mut set: Vec<char> = self.glyphs.keys().copied().collect();
        set.sort_unstable();
        set
    }

    /// Builds the atlas from scratch and uploads it through `backend`.
    ///
    /// Any texture still held is released first. On failure the font is left
    /// `Uninitialized` and holds no texture.
    pub fn initialize<B: Backend>(&mut self, backend: &mut B, config: &RendererConfig) -> Result<()> {
        self.release(backend);
        self.state = FontState::Initializing;

        match self.build_atlas(backend, config) {
            Ok(()) => {
                self.state = FontState::Ready;
                log::debug!(
                    "font `{}` {}pt: {} glyphs in {}x{} atlas",
                    self.desc.family,
                    self.desc.size,
                    self.glyphs.len(),
                    self.atlas_size,
                    self.atlas_size
                );
                Ok(())
            }
            Err(e) => {
                self.state = FontState::Uninitialized;
                Err(e)
            }
        }
    }

    fn build_atlas<B: Backend>(&mut self, backend: &mut B, config: &RendererConfig) -> Result<()> {
        let line_height = self.rasterizer.measure(' ').map_or(self.rasterizer.line_height(), |(_, cy)| cy);
        let margin = (line_height as f32 * 0.3).ceil() as u32;

        let cells = measure_alphabet(self.rasterizer.as_ref());
        let size = estimate_texture_size(&cells, margin, config.initial_atlas_size, config.max_atlas_size)?;
        let (image, glyphs) = render_alphabet(self.rasterizer.as_ref(), &cells, margin, size)?;
        let texture = backend.create_texture(&image)?;

        self.glyphs = glyphs;
        self.atlas_size = size;
        self.margin = margin;
        self.line_height = line_height as f32;
        self.texture = Some(texture);
        Ok(())
    }

    /// Releases the atlas texture; glyph map and metrics stay.
    pub fn on_lost_device<B: Backend>(&mut self, backend: &mut B) {
        self.release(backend);
        if self.state == FontState::Ready {
            self.state = FontState::Lost;
        }
    }

    /// Releases the atlas texture if one is held.
    pub(crate) fn release<B: Backend>(&mut self, backend: &mut B) {
        if let Some(texture) = self.texture.take() {
            backend.release_texture(texture);
        }
    }

    /// Width of the widest line and `lines × line_height`, ignoring color
    /// tags.
    ///
    /// A lost font keeps its metrics and still measures. A font whose atlas
    /// was never built has none and returns [`Error::FontNotReady`].
    pub fn calculate_text_extent(&self, text: &str) -> Result<Vec2> {
        match self.state {
            FontState::Ready | FontState::Lost => Ok(self.plain_extent(&strip_markup(text))),
            FontState::Uninitialized | FontState::Initializing => {
                Err(Error::FontNotReady { family: self.desc.family.clone() })
            }
        }
    }

    fn plain_extent(&self, text: &str) -> Vec2 {
        let mut width = 0.0f32;
        let mut row = 0.0f32;
        let mut height = self.line_height;

        for ch in text.chars() {
            if ch == '\n' {
                height += self.line_height;
                width = width.max(row);
                row = 0.0;
            } else if ch >= ' ' {
                if let Some(glyph) = self.glyphs.get(&ch) {
                    row += self.advance(glyph);
                }
            }
        }

        Vec2::new(width.max(row), height)
    }

    #[inline]
    fn advance(&self, glyph: &GlyphUv) -> f32 {
        glyph.footprint(self.atlas_size, self.atlas_size).x - 2.0 * self.margin as f32
    }

    /// Lays out `text` at `pos` and appends one textured quad per visible
    /// glyph to `list`.
    ///
    /// `{#RRGGBB}` / `{#AARRGGBB}` tags recolor the text that follows.
    /// `OUTLINE` draws each glyph first in `outline_color` shifted up-left by
    /// `outline_thickness`; otherwise `DROP_SHADOW` draws it first in black
    /// shifted one pixel down-right.
    #[allow(clippy::too_many_arguments)]
    pub fn render_text(
        &self,
        list: &mut RenderList,
        pos: Vec2,
        text: &str,
        color: Color,
        flags: TextFlags,
        outline_color: Color,
        outline_thickness: f32,
    ) -> Result<()> {
        let texture = match (self.state, self.texture) {
            (FontState::Ready, Some(texture)) => texture,
            _ => return Err(Error::FontNotReady { family: self.desc.family.clone() }),
        };

        let segments = preprocess_text(text, color);

        let mut origin = pos;
        if flags.needs_extent() {
            let plain: String = segments.iter().map(|s| s.text.as_str()).collect();
            let size = self.plain_extent(&plain);

            if flags.contains(TextFlags::RIGHT) {
                origin.x -= size.x;
            } else if flags.contains(TextFlags::CENTERED_X) {
                origin.x -= size.x * 0.5;
            }
            if flags.contains(TextFlags::CENTERED_Y) {
                origin.y -= size.y * 0.5;
            }
        }

        let start_x = origin.x - self.margin as f32;
        let mut pen = Vec2::new(start_x, origin.y);
        let outline = Vec2::new(outline_thickness, outline_thickness);

        for segment in &segments {
            for ch in segment.text.chars() {
                if ch == '\n' {
                    pen.x = start_x;
                    pen.y += self.line_height;
                    continue;
                }
                if ch < ' ' {
                    continue;
                }
                let Some(glyph) = self.glyphs.get(&ch) else { continue };
                let size = glyph.footprint(self.atlas_size, self.atlas_size);

                if ch != ' ' {
                    if flags.contains(TextFlags::OUTLINE) {
                        emit_glyph(list, texture, pen - outline, size, glyph, outline_color);
                    } else if flags.contains(TextFlags::DROP_SHADOW) {
                        let shadow = Color::BLACK.with_alpha(segment.color.a());
                        emit_glyph(list, texture, pen + Vec2::new(1.0, 1.0), size, glyph, shadow);
                    }
                    emit_glyph(list, texture, pen, size, glyph, segment.color);
                }

                pen.x += size.x - 2.0 * self.margin as f32;
            }
        }

        Ok(())
    }
}

impl core::fmt::Debug for Font {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Font")
            .field("desc", &self.desc)
            .field("state", &self.state)
            .field("glyphs", &self.glyphs.len())
            .field("atlas_size", &self.atlas_size)
            .field("texture", &self.texture)
            .finish()
    }
}

/// Quad as BL, TL, BR, TR, BR, TL.
fn emit_glyph(list: &mut RenderList, texture: TextureId, at: Vec2, size: Vec2, uv: &GlyphUv, color: Color) {
    let (l, t, r, b) = (at.x, at.y, at.x + size.x, at.y + size.y);
    let bl = Vertex::textured(Vec2::new(l, b), color, [uv.x0, uv.y1]);
    let tl = Vertex::textured(Vec2::new(l, t), color, [uv.x0, uv.y0]);
    let br = Vertex::textured(Vec2::new(r, b), color, [uv.x1, uv.y1]);
    let tr = Vertex::textured(Vec2::new(r, t), color, [uv.x1, uv.y0]);
    list.add_vertices(&[bl, tl, br, tr, br, tl], Topology::TriangleList, Some(texture));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessBackend;
    use crate::testing::FixedRasterizer;

    // line height 16, advance 8, margin ceil(4.8) = 5
    fn ready_font(backend: &mut HeadlessBackend) -> Font {
        let mut font = Font::new(FontDesc::new("Fixed", 12, FontFlags::empty()), Box::new(FixedRasterizer::new(16, 8)));
        font.initialize(backend, &RendererConfig::default()).unwrap();
        font
    }

    fn backend() -> HeadlessBackend {
        HeadlessBackend::new()
    }

    #[test]
    fn initialize_builds_atlas() {
        let mut b = backend();
        let font = ready_font(&mut b);

        assert_eq!(font.state(), FontState::Ready);
        assert_eq!(font.margin(), 5);
        assert_eq!(font.atlas_size(), 1024);
        assert!(font.texture().is_some());
        assert_eq!(font.glyph_set().len(), 0x250 - 0x20);
        assert!(b.texture_pixels(font.texture().unwrap()).is_some());
    }

    #[test]
    fn missing_glyphs_are_not_baked() {
        let mut b = backend();
        let raster = FixedRasterizer::new(16, 8).with_missing(&['Q', 'é']);
        let mut font = Font::new(FontDesc::new("Fixed", 12, FontFlags::empty()), Box::new(raster));
        font.initialize(&mut b, &RendererConfig::default()).unwrap();

        assert!(font.glyph('Q').is_none());
        assert!(font.glyph('é').is_none());
        assert!(font.glyph('R').is_some());
    }

    #[test]
    fn extent_height_counts_lines() {
        let mut b = backend();
        let font = ready_font(&mut b);

        assert_eq!(font.calculate_text_extent("A").unwrap().y, font.line_height());
        assert_eq!(font.calculate_text_extent("A\nA").unwrap().y, 2.0 * font.line_height());
    }

    #[test]
    fn extent_width_is_widest_line_without_tags() {
        let mut b = backend();
        let font = ready_font(&mut b);

        assert_eq!(font.calculate_text_extent("AB").unwrap().x, 16.0);
        assert_eq!(font.calculate_text_extent("A\nABC\nAB").unwrap().x, 24.0);
        assert_eq!(font.calculate_text_extent("{#FF0000}AB").unwrap().x, 16.0);
        // control characters other than newline take no room
        assert_eq!(font.calculate_text_extent("A\tB").unwrap().x, 16.0);
    }

    #[test]
    fn render_emits_quad_per_visible_glyph() {
        let mut b = backend();
        let font = ready_font(&mut b);
        let mut list = RenderList::new();

        font.render_text(&mut list, Vec2::new(100.0, 50.0), "A B", Color::WHITE, TextFlags::empty(), Color::BLACK, 1.0)
            .unwrap();

        assert_eq!(list.vertex_count(), 12);
        assert_eq!(list.batches().len(), 1);
        assert_eq!(list.batches()[0].texture, font.texture());

        // first quad: BL at (pen, y + h) where pen = x - margin
        let first = list.vertices()[0].position();
        assert_eq!(first, Vec2::new(95.0, 66.0));
        // 'B' starts one advance later, after the space
        let second = list.vertices()[6].position();
        assert_eq!(second.x, 95.0 + 16.0);
    }

    #[test]
    fn newline_resets_pen() {
        let mut b = backend();
        let font = ready_font(&mut b);
        let mut list = RenderList::new();

        font.render_text(&mut list, Vec2::new(10.0, 0.0), "AB\nC", Color::WHITE, TextFlags::empty(), Color::BLACK, 1.0)
            .unwrap();

        let c_tl = list.vertices()[13].position();
        assert_eq!(c_tl, Vec2::new(5.0, 16.0));
    }

    #[test]
    fn right_and_center_alignment() {
        let mut b = backend();
        let font = ready_font(&mut b);

        let mut right = RenderList::new();
        font.render_text(&mut right, Vec2::new(100.0, 0.0), "AB", Color::WHITE, TextFlags::RIGHT, Color::BLACK, 1.0)
            .unwrap();
        assert_eq!(right.vertices()[1].position(), Vec2::new(100.0 - 16.0 - 5.0, 0.0));

        let mut centered = RenderList::new();
        font.render_text(&mut centered, Vec2::new(100.0, 100.0), "AB", Color::WHITE, TextFlags::CENTERED, Color::BLACK, 1.0)
            .unwrap();
        assert_eq!(centered.vertices()[1].position(), Vec2::new(100.0 - 8.0 - 5.0, 92.0));
    }

    #[test]
    fn markup_colors_quads() {
        let mut b = backend();
        let font = ready_font(&mut b);
        let mut list = RenderList::new();

        font.render_text(&mut list, Vec2::zero(), "A{#00FF00}B", Color::WHITE, TextFlags::empty(), Color::BLACK, 1.0)
            .unwrap();

        assert_eq!(list.vertex_count(), 12);
        assert_eq!(list.vertices()[0].color(), Color::WHITE);
        assert_eq!(list.vertices()[6].color(), Color::from_argb(0xFF00_FF00));
    }

    #[test]
    fn outline_precedes_main_quad() {
        let mut b = backend();
        let font = ready_font(&mut b);
        let mut list = RenderList::new();
        let outline = Color::from_rgb8(255, 0, 0);

        font.render_text(&mut list, Vec2::new(20.0, 20.0), "A", Color::WHITE, TextFlags::OUTLINE | TextFlags::DROP_SHADOW, outline, 2.0)
            .unwrap();

        assert_eq!(list.vertex_count(), 12);
        assert_eq!(list.vertices()[0].color(), outline);
        assert_eq!(list.vertices()[1].position(), Vec2::new(13.0, 18.0));
        assert_eq!(list.vertices()[7].position(), Vec2::new(15.0, 20.0));
    }

    #[test]
    fn drop_shadow_is_black_with_text_alpha() {
        let mut b = backend();
        let font = ready_font(&mut b);
        let mut list = RenderList::new();
        let color = Color::from_rgba8(10, 20, 30, 128);

        font.render_text(&mut list, Vec2::new(20.0, 20.0), "A", color, TextFlags::DROP_SHADOW, Color::BLACK, 1.0)
            .unwrap();

        assert_eq!(list.vertices()[0].color(), Color::from_rgba8(0, 0, 0, 128));
        assert_eq!(list.vertices()[1].position(), Vec2::new(16.0, 21.0));
        assert_eq!(list.vertices()[6].color(), color);
    }

    #[test]
    fn lost_font_refuses_to_draw_but_still_measures() {
        let mut b = backend();
        let mut font = ready_font(&mut b);
        let id = font.texture().unwrap();

        font.on_lost_device(&mut b);
        assert_eq!(font.state(), FontState::Lost);
        assert!(font.texture().is_none());
        assert!(b.texture_pixels(id).is_none());

        let mut list = RenderList::new();
        let err = font
            .render_text(&mut list, Vec2::zero(), "A", Color::WHITE, TextFlags::empty(), Color::BLACK, 1.0)
            .unwrap_err();
        assert!(matches!(err, Error::FontNotReady { .. }));
        assert!(list.is_empty());
        assert_eq!(font.calculate_text_extent("AB").unwrap().x, 16.0);
    }

    #[test]
    fn failed_initialize_holds_nothing() {
        let mut b = backend();
        let config = RendererConfig { max_atlas_size: 512, ..RendererConfig::default() };
        let mut font = Font::new(FontDesc::new("Huge", 72, FontFlags::empty()), Box::new(FixedRasterizer::new(64, 48)));

        let err = font.initialize(&mut b, &config).unwrap_err();
        assert!(matches!(err, Error::AtlasTooLarge { .. }));
        assert_eq!(font.state(), FontState::Uninitialized);
        assert!(font.texture().is_none());
        assert_eq!(b.texture_count(), 0);
    }

    #[test]
    fn unbuilt_font_refuses_to_measure() {
        let font = Font::new(FontDesc::new("Fixed", 12, FontFlags::empty()), Box::new(FixedRasterizer::new(16, 8)));

        let err = font.calculate_text_extent("A\nA").unwrap_err();
        assert!(matches!(err, Error::FontNotReady { ref family } if family == "Fixed"));
    }
}
