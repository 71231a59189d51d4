use std::collections::BTreeMap;

use crate::coords::Vec2;
use crate::error::{Error, Result};
use crate::paint::Color;
use crate::scene::shapes::GradientDirection;
use crate::scene::RenderList;
use crate::text::{Font, FontDesc, FontFlags, FontProvider, TextFlags};

use super::{Backend, PipelineConfig};

/// Handle to a font registered with a [`Renderer`].
///
/// Handles count up from 1 and are never reused.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FontHandle(u64);

impl FontHandle {
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Renderer tuning.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RendererConfig {
    /// Initial vertex buffer capacity. Grows to the next power of two when a
    /// submission needs more.
    pub vertex_capacity: usize,
    /// Side of the first atlas size tried for each font.
    pub initial_atlas_size: u32,
    /// Largest atlas side a font may grow to.
    pub max_atlas_size: u32,
    /// Pixels per inch used to convert point sizes.
    pub dpi: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            vertex_capacity: 4096,
            initial_atlas_size: 1024,
            max_atlas_size: 16384,
            dpi: 96.0,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum DeviceState {
    Ready,
    Lost,
}

enum FrameState<S> {
    Idle,
    Active(S),
}

/// Immediate-mode overlay renderer.
///
/// Frame bracket:
///
/// ```text
/// begin_frame → add_* … → render (any number of times) → end_frame
/// ```
///
/// `begin_frame` snapshots the host state and binds overlay state;
/// `end_frame` restores the snapshot. Device loss is handled by the host
/// calling [`on_lost_device`](Self::on_lost_device) and later
/// [`on_reset_device`](Self::on_reset_device), both outside a frame.
pub struct Renderer<B: Backend> {
    backend: B,
    provider: Box<dyn FontProvider>,
    config: RendererConfig,
    list: RenderList,
    fonts: BTreeMap<FontHandle, Font>,
    next_font: u64,
    device: DeviceState,
    frame: FrameState<B::Snapshot>,
}

impl<B: Backend> Renderer<B> {
    /// Creates the pipeline objects on `backend`.
    ///
    /// Fails without leaving anything allocated when any object cannot be
    /// created.
    pub fn new(mut backend: B, provider: impl FontProvider + 'static, config: RendererConfig) -> Result<Self> {
        backend.create_pipeline(&PipelineConfig { vertex_capacity: config.vertex_capacity })?;
        log::info!("overlay renderer ready ({} vertex capacity)", config.vertex_capacity);

        Ok(Self {
            backend,
            provider: Box::new(provider),
            config,
            list: RenderList::with_capacity(config.vertex_capacity),
            fonts: BTreeMap::new(),
            next_font: 1,
            device: DeviceState::Ready,
            frame: FrameState::Idle,
        })
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Host access to the backend, e.g. to rebind its render target.
    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[inline]
    pub fn is_device_lost(&self) -> bool {
        self.device == DeviceState::Lost
    }

    #[inline]
    pub fn is_frame_active(&self) -> bool {
        matches!(self.frame, FrameState::Active(_))
    }

    /// The default list `add_*` calls append to.
    #[inline]
    pub fn default_list(&self) -> &RenderList {
        &self.list
    }

    /// A fresh list sized like the default one, for deferred passes.
    pub fn create_render_list(&self) -> RenderList {
        RenderList::with_capacity(self.config.vertex_capacity)
    }

    // ── frame bracket ─────────────────────────────────────────────────────

    /// Captures the host state and binds the overlay pipeline.
    pub fn begin_frame(&mut self) -> Result<()> {
        self.expect_idle("begin_frame", DeviceState::Ready)?;

        let snapshot = self.backend.capture_state();
        if let Err(e) = self.backend.apply_frame_state() {
            self.backend.restore_state(snapshot);
            return Err(e.into());
        }
        self.frame = FrameState::Active(snapshot);
        Ok(())
    }

    /// Submits and clears the default list.
    pub fn render(&mut self) -> Result<()> {
        self.expect_active("render")?;
        let result = submit_list(&mut self.backend, &mut self.config, &self.list);
        self.list.clear();
        self.check_submit(result)
    }

    /// Submits `list` as-is; the caller keeps and clears it.
    pub fn render_list(&mut self, list: &RenderList) -> Result<()> {
        self.expect_active("render_list")?;
        let result = submit_list(&mut self.backend, &mut self.config, list);
        self.check_submit(result)
    }

    /// A failed buffer grow leaves the backend without a pipeline. The
    /// renderer is then lost: font atlases are released and the host must
    /// end the frame and call [`on_reset_device`](Self::on_reset_device).
    fn check_submit(&mut self, result: Result<()>) -> Result<()> {
        if result.is_err() && self.device == DeviceState::Ready && !self.backend.is_live() {
            for font in self.fonts.values_mut() {
                font.on_lost_device(&mut self.backend);
            }
            self.device = DeviceState::Lost;
            log::error!("overlay pipeline lost during submit; reset required");
        }
        result
    }

    /// Restores the host state captured by [`begin_frame`](Self::begin_frame).
    pub fn end_frame(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.frame, FrameState::Idle) {
            FrameState::Active(snapshot) => {
                self.backend.restore_state(snapshot);
                Ok(())
            }
            FrameState::Idle => Err(Error::InvalidState { op: "end_frame", state: "no frame active" }),
        }
    }

    // ── device loss ───────────────────────────────────────────────────────

    /// Releases every device object: font atlases first, then the pipeline.
    pub fn on_lost_device(&mut self) -> Result<()> {
        self.expect_idle("on_lost_device", DeviceState::Ready)?;

        for font in self.fonts.values_mut() {
            font.on_lost_device(&mut self.backend);
        }
        self.backend.teardown();
        self.device = DeviceState::Lost;
        log::info!("overlay device lost: released {} font atlases", self.fonts.len());
        Ok(())
    }

    /// Recreates the pipeline with the current capacity and rebuilds every
    /// font atlas. On failure everything is released again and the renderer
    /// stays lost.
    pub fn on_reset_device(&mut self) -> Result<()> {
        self.expect_idle("on_reset_device", DeviceState::Lost)?;

        self.backend.create_pipeline(&PipelineConfig { vertex_capacity: self.config.vertex_capacity })?;

        let rebuilt = self.fonts.values_mut().try_for_each(|font| {
            font.initialize(&mut self.backend, &self.config).map_err(|e| {
                log::error!("overlay reset failed rebuilding font `{}`: {e}", font.desc().family);
                e
            })
        });
        if let Err(e) = rebuilt {
            for font in self.fonts.values_mut() {
                font.on_lost_device(&mut self.backend);
            }
            self.backend.teardown();
            return Err(e);
        }

        self.device = DeviceState::Ready;
        log::info!("overlay device reset: rebuilt {} font atlases", self.fonts.len());
        Ok(())
    }

    // ── shapes on the default list ────────────────────────────────────────

    pub fn add_rect_filled(&mut self, min: Vec2, max: Vec2, color: Color) {
        self.list.add_rect_filled(min, max, color);
    }

    pub fn add_rect(&mut self, min: Vec2, max: Vec2, color: Color, stroke_width: f32) {
        self.list.add_rect(min, max, color, stroke_width);
    }

    pub fn add_line(&mut self, a: Vec2, b: Vec2, color: Color) {
        self.list.add_line(a, b, color);
    }

    pub fn add_thick_line(&mut self, a: Vec2, b: Vec2, color: Color, thickness: f32) {
        self.list.add_thick_line(a, b, color, thickness);
    }

    pub fn add_circle(&mut self, center: Vec2, radius: f32, color: Color, segments: u32) {
        self.list.add_circle(center, radius, color, segments);
    }

    pub fn add_gradient_rect(&mut self, min: Vec2, max: Vec2, from: Color, to: Color, direction: GradientDirection) {
        self.list.add_gradient_rect(min, max, from, to, direction);
    }

    // ── fonts ─────────────────────────────────────────────────────────────

    /// Resolves and bakes a font.
    ///
    /// While the device is lost the font is only resolved; its atlas is
    /// built on the next [`on_reset_device`](Self::on_reset_device).
    pub fn add_font(&mut self, family: &str, size: u32, flags: FontFlags) -> Result<FontHandle> {
        let desc = FontDesc::new(family, size, flags);
        let rasterizer = self.provider.resolve(&desc, self.config.dpi)?;
        let mut font = Font::new(desc, rasterizer);

        if self.device == DeviceState::Ready {
            font.initialize(&mut self.backend, &self.config)?;
        }

        let handle = FontHandle(self.next_font);
        self.next_font += 1;
        log::debug!("font {handle:?} added: `{family}` {size}pt {flags:?}");
        self.fonts.insert(handle, font);
        Ok(handle)
    }

    /// Drops a font and releases its atlas.
    pub fn remove_font(&mut self, handle: FontHandle) -> Result<()> {
        let mut font = self.fonts.remove(&handle).ok_or_else(|| unknown_font(handle))?;
        font.release(&mut self.backend);
        Ok(())
    }

    #[inline]
    pub fn font(&self, handle: FontHandle) -> Option<&Font> {
        self.fonts.get(&handle)
    }

    /// Lays out `text` onto the default list.
    #[allow(clippy::too_many_arguments)]
    pub fn add_text(
        &mut self,
        handle: FontHandle,
        text: &str,
        pos: Vec2,
        color: Color,
        flags: TextFlags,
        outline_color: Color,
        outline_thickness: f32,
    ) -> Result<()> {
        let font = self.fonts.get(&handle).ok_or_else(|| unknown_font(handle))?;
        font.render_text(&mut self.list, pos, text, color, flags, outline_color, outline_thickness)
    }

    /// Lays out `text` onto a caller-owned list.
    #[allow(clippy::too_many_arguments)]
    pub fn add_text_to(
        &self,
        list: &mut RenderList,
        handle: FontHandle,
        text: &str,
        pos: Vec2,
        color: Color,
        flags: TextFlags,
        outline_color: Color,
        outline_thickness: f32,
    ) -> Result<()> {
        let font = self.fonts.get(&handle).ok_or_else(|| unknown_font(handle))?;
        font.render_text(list, pos, text, color, flags, outline_color, outline_thickness)
    }

    pub fn calculate_text_extent(&self, handle: FontHandle, text: &str) -> Result<Vec2> {
        let font = self.fonts.get(&handle).ok_or_else(|| unknown_font(handle))?;
        font.calculate_text_extent(text)
    }

    // ── state checks ──────────────────────────────────────────────────────

    fn expect_idle(&self, op: &'static str, device: DeviceState) -> Result<()> {
        if self.is_frame_active() {
            return Err(Error::InvalidState { op, state: "frame active" });
        }
        if self.device != device {
            let state = match self.device {
                DeviceState::Ready => "device ready",
                DeviceState::Lost => "device lost",
            };
            return Err(Error::InvalidState { op, state });
        }
        Ok(())
    }

    fn expect_active(&self, op: &'static str) -> Result<()> {
        if self.is_frame_active() {
            Ok(())
        } else {
            Err(Error::InvalidState { op, state: "no frame active" })
        }
    }
}

impl<B: Backend> Drop for Renderer<B> {
    fn drop(&mut self) {
        if let FrameState::Active(snapshot) = std::mem::replace(&mut self.frame, FrameState::Idle) {
            self.backend.restore_state(snapshot);
        }
        for font in self.fonts.values_mut() {
            font.release(&mut self.backend);
        }
        self.backend.teardown();
    }
}

/// Uploads `list` and issues its draws, growing the vertex buffer first when
/// the list outgrew it.
fn submit_list<B: Backend>(backend: &mut B, config: &mut RendererConfig, list: &RenderList) -> Result<()> {
    if list.is_empty() {
        return Ok(());
    }

    let count = list.vertex_count();
    if count > backend.vertex_capacity() {
        let capacity = count.next_power_of_two();
        log::debug!("growing overlay vertex buffer {} -> {capacity}", backend.vertex_capacity());
        backend.grow_vertex_buffer(capacity)?;
        config.vertex_capacity = capacity;
        backend.apply_frame_state()?;
    }

    let draws = list.draw_calls();
    backend.submit_batches(list.vertices(), &draws)?;
    Ok(())
}

fn unknown_font(handle: FontHandle) -> Error {
    log::error!("unknown font handle {handle:?}");
    Error::UnknownFont(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{BackendError, ContextState, HeadlessBackend, ObjectId, PipelineStage, TextureId};
    use crate::scene::Topology;
    use crate::testing::FixedProvider;

    fn renderer() -> Renderer<HeadlessBackend> {
        Renderer::new(HeadlessBackend::new(), FixedProvider::default(), RendererConfig::default()).unwrap()
    }

    fn host_state() -> ContextState {
        ContextState {
            vertex_program: Some(ObjectId(9001)),
            pixel_program: Some(ObjectId(9002)),
            input_layout: Some(ObjectId(9003)),
            blend_state: Some(ObjectId(9004)),
            raster_state: Some(ObjectId(9005)),
            depth_stencil_state: Some(ObjectId(9006)),
            vertex_buffer: Some(ObjectId(9007)),
            constant_buffer: None,
            sampler: Some(ObjectId(9008)),
            texture: Some(TextureId(9009)),
            topology: Some(Topology::LineList),
            viewport: crate::coords::Viewport::new(10.0, 10.0, 300.0, 200.0),
            scissor: crate::coords::ScissorRect::new(5, 5, 50, 50),
            blend_enabled: false,
            depth_enabled: true,
            scissor_enabled: false,
        }
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn failed_construction_leaves_nothing_alive() {
        for stage in PipelineStage::ALL {
            let mut backend = HeadlessBackend::new();
            backend.fail_pipeline_at(Some(stage));
            let err = Renderer::new(backend, FixedProvider::default(), RendererConfig::default()).err().unwrap();
            assert!(matches!(err, Error::Backend(BackendError::Injected(_))));
        }

        // the backend is consumed on failure; check rollback directly
        let mut backend = HeadlessBackend::new();
        backend.fail_pipeline_at(Some(PipelineStage::Sampler));
        assert!(backend.create_pipeline(&PipelineConfig { vertex_capacity: 16 }).is_err());
        assert_eq!(backend.live_object_count(), 0);
    }

    // ── frame bracket ─────────────────────────────────────────────────────

    #[test]
    fn noop_frame_restores_host_state() {
        let mut r = renderer();
        *r.backend_mut().context_mut() = host_state();

        r.begin_frame().unwrap();
        assert!(r.backend().context().blend_enabled);
        assert!(!r.backend().context().depth_enabled);
        r.end_frame().unwrap();

        assert_eq!(r.backend().context(), &host_state());
    }

    #[test]
    fn frame_with_draws_restores_host_state() {
        let mut r = renderer();
        let font = r.add_font("Fixed", 12, FontFlags::empty()).unwrap();
        *r.backend_mut().context_mut() = host_state();

        r.begin_frame().unwrap();
        r.add_rect_filled(Vec2::zero(), Vec2::new(10.0, 10.0), Color::WHITE);
        r.add_circle(Vec2::new(50.0, 50.0), 5.0, Color::WHITE, 16);
        r.add_text(font, "hi", Vec2::new(5.0, 5.0), Color::WHITE, TextFlags::empty(), Color::BLACK, 1.0)
            .unwrap();
        r.render().unwrap();
        r.end_frame().unwrap();

        assert_eq!(r.backend().draws().len(), 3);
        assert_eq!(r.backend().context(), &host_state());
    }

    #[test]
    fn empty_render_does_nothing() {
        let mut r = renderer();
        r.begin_frame().unwrap();
        r.render().unwrap();
        r.end_frame().unwrap();

        assert!(r.backend().uploads().is_empty());
        assert!(r.backend().draws().is_empty());
    }

    #[test]
    fn render_submits_once_and_clears() {
        let mut r = renderer();
        r.begin_frame().unwrap();
        r.add_rect_filled(Vec2::zero(), Vec2::new(10.0, 10.0), Color::WHITE);
        r.add_line(Vec2::zero(), Vec2::new(10.0, 10.0), Color::WHITE);
        r.add_thick_line(Vec2::zero(), Vec2::new(10.0, 0.0), Color::WHITE, 3.0);
        r.render().unwrap();

        assert_eq!(r.backend().uploads(), &[12]);
        let topologies: Vec<_> = r.backend().draws().iter().map(|d| d.topology).collect();
        assert_eq!(topologies, [Topology::TriangleList, Topology::LineList, Topology::TriangleStrip]);
        assert!(r.default_list().is_empty());

        r.render().unwrap();
        assert_eq!(r.backend().uploads().len(), 1);
        r.end_frame().unwrap();
    }

    #[test]
    fn caller_list_is_left_intact() {
        let mut r = renderer();
        let mut list = r.create_render_list();
        list.add_rect_filled(Vec2::zero(), Vec2::new(1.0, 1.0), Color::WHITE);

        r.begin_frame().unwrap();
        r.render_list(&list).unwrap();
        r.render_list(&list).unwrap();
        r.end_frame().unwrap();

        assert_eq!(list.vertex_count(), 6);
        assert_eq!(r.backend().uploads(), &[6, 6]);
    }

    #[test]
    fn oversized_list_grows_buffer() {
        let config = RendererConfig { vertex_capacity: 16, ..RendererConfig::default() };
        let mut r = Renderer::new(HeadlessBackend::new(), FixedProvider::default(), config).unwrap();

        r.begin_frame().unwrap();
        for i in 0..5 {
            let y = i as f32 * 4.0;
            r.add_rect_filled(Vec2::new(0.0, y), Vec2::new(4.0, y + 2.0), Color::WHITE);
        }
        r.render().unwrap();

        assert_eq!(r.backend().vertex_capacity(), 32);
        assert_eq!(r.config().vertex_capacity, 32);
        assert_eq!(r.backend().uploads(), &[30]);
        assert_eq!(r.backend().draws().len(), 1);
        // frame state was re-applied against the new objects
        assert_eq!(r.backend().context().vertex_buffer, r.backend().object(PipelineStage::VertexBuffer));
        r.end_frame().unwrap();
        assert_eq!(r.backend().double_releases(), 0);
    }

    #[test]
    fn frame_state_follows_target_resize() {
        let mut r = renderer();
        r.begin_frame().unwrap();
        assert_eq!(r.backend().context().viewport, crate::coords::Viewport::full(1280, 720));
        r.end_frame().unwrap();

        r.on_lost_device().unwrap();
        r.backend_mut().set_target_size(640, 480);
        r.on_reset_device().unwrap();

        r.begin_frame().unwrap();
        assert_eq!(r.backend().context().viewport, crate::coords::Viewport::full(640, 480));
        assert_eq!(r.backend().context().scissor, crate::coords::ScissorRect::full(640, 480));
        r.end_frame().unwrap();
    }

    // ── ordering ──────────────────────────────────────────────────────────

    #[test]
    fn ordering_violations_are_rejected() {
        let mut r = renderer();

        assert!(matches!(r.render(), Err(Error::InvalidState { op: "render", .. })));
        assert!(matches!(r.end_frame(), Err(Error::InvalidState { op: "end_frame", .. })));
        assert!(matches!(r.on_reset_device(), Err(Error::InvalidState { state: "device ready", .. })));

        r.begin_frame().unwrap();
        assert!(matches!(r.begin_frame(), Err(Error::InvalidState { state: "frame active", .. })));
        assert!(matches!(r.on_lost_device(), Err(Error::InvalidState { state: "frame active", .. })));
        r.end_frame().unwrap();

        r.on_lost_device().unwrap();
        assert!(matches!(r.begin_frame(), Err(Error::InvalidState { state: "device lost", .. })));
        assert!(matches!(r.on_lost_device(), Err(Error::InvalidState { .. })));
    }

    #[test]
    fn failed_apply_restores_snapshot() {
        let mut r = renderer();
        r.backend_mut().teardown();
        *r.backend_mut().context_mut() = host_state();

        assert!(matches!(r.begin_frame(), Err(Error::Backend(BackendError::NotLive))));
        assert!(!r.is_frame_active());
        assert_eq!(r.backend().context(), &host_state());
    }

    // ── device loss ───────────────────────────────────────────────────────

    #[test]
    fn lost_then_reset_rebuilds_fonts() {
        let mut r = renderer();
        let a = r.add_font("Fixed", 12, FontFlags::empty()).unwrap();
        let b = r.add_font("Fixed", 20, FontFlags::BOLD).unwrap();

        let before: Vec<_> = [a, b].iter().map(|&h| (r.font(h).unwrap().glyph_set(), r.font(h).unwrap().texture())).collect();

        r.on_lost_device().unwrap();
        assert!(r.is_device_lost());
        assert!(!r.backend().is_live());
        assert!(!r.font(a).unwrap().is_initialized());
        assert_eq!(r.backend().live_object_count(), 0);

        r.on_reset_device().unwrap();
        for (h, (glyphs, texture)) in [a, b].iter().zip(before) {
            let font = r.font(*h).unwrap();
            assert!(font.is_initialized());
            assert_eq!(font.glyph_set(), glyphs);
            assert_ne!(font.texture(), texture);
        }
        assert_eq!(r.backend().double_releases(), 0);
    }

    #[test]
    fn failed_reset_rolls_back_and_stays_lost() {
        let mut r = renderer();
        r.add_font("Fixed", 12, FontFlags::empty()).unwrap();
        r.add_font("Fixed", 14, FontFlags::empty()).unwrap();
        r.on_lost_device().unwrap();

        r.backend_mut().fail_texture_creation(true);
        assert!(r.on_reset_device().is_err());
        assert!(r.is_device_lost());
        assert_eq!(r.backend().live_object_count(), 0);

        r.backend_mut().fail_pipeline_at(Some(PipelineStage::ConstantBuffer));
        r.backend_mut().fail_texture_creation(false);
        assert!(r.on_reset_device().is_err());
        assert_eq!(r.backend().live_object_count(), 0);

        r.backend_mut().fail_pipeline_at(None);
        r.on_reset_device().unwrap();
        assert!(!r.is_device_lost());
        assert_eq!(r.backend().double_releases(), 0);
    }

    #[test]
    fn reset_keeps_grown_capacity() {
        let config = RendererConfig { vertex_capacity: 8, ..RendererConfig::default() };
        let mut r = Renderer::new(HeadlessBackend::new(), FixedProvider::default(), config).unwrap();
        r.begin_frame().unwrap();
        r.add_circle(Vec2::zero(), 4.0, Color::WHITE, 20);
        r.render().unwrap();
        r.end_frame().unwrap();

        r.on_lost_device().unwrap();
        r.on_reset_device().unwrap();
        assert_eq!(r.backend().vertex_capacity(), 32);
    }

    #[test]
    fn font_added_while_lost_is_built_on_reset() {
        let mut r = renderer();
        r.on_lost_device().unwrap();
        let h = r.add_font("Fixed", 12, FontFlags::empty()).unwrap();
        assert!(!r.font(h).unwrap().is_initialized());

        r.on_reset_device().unwrap();
        assert!(r.font(h).unwrap().is_initialized());
    }

    #[test]
    fn extent_of_font_added_while_lost_waits_for_reset() {
        let mut r = renderer();
        r.on_lost_device().unwrap();
        let h = r.add_font("Fixed", 12, FontFlags::empty()).unwrap();

        let err = r.calculate_text_extent(h, "A\nA").unwrap_err();
        assert!(matches!(err, Error::FontNotReady { .. }));

        r.on_reset_device().unwrap();
        let extent = r.calculate_text_extent(h, "A\nA").unwrap();
        assert_eq!(extent.y, 2.0 * r.font(h).unwrap().line_height());
        assert!(extent.x > 0.0);
    }

    #[test]
    fn failed_grow_marks_device_lost() {
        let config = RendererConfig { vertex_capacity: 4, ..RendererConfig::default() };
        let mut r = Renderer::new(HeadlessBackend::new(), FixedProvider::default(), config).unwrap();
        let h = r.add_font("Fixed", 12, FontFlags::empty()).unwrap();

        r.begin_frame().unwrap();
        r.add_rect_filled(Vec2::zero(), Vec2::new(4.0, 4.0), Color::WHITE);
        r.backend_mut().fail_pipeline_at(Some(PipelineStage::VertexBuffer));
        assert!(matches!(r.render(), Err(Error::Backend(BackendError::Injected(_)))));

        assert!(r.is_device_lost());
        assert!(!r.font(h).unwrap().is_initialized());
        assert_eq!(r.backend().live_object_count(), 0);
        r.end_frame().unwrap();

        assert!(matches!(r.begin_frame(), Err(Error::InvalidState { state: "device lost", .. })));
        r.backend_mut().fail_pipeline_at(None);
        r.on_reset_device().unwrap();
        assert!(r.font(h).unwrap().is_initialized());
        assert_eq!(r.backend().double_releases(), 0);
    }

    // ── fonts ─────────────────────────────────────────────────────────────

    #[test]
    fn handles_start_at_one_and_are_not_reused() {
        let mut r = renderer();
        let a = r.add_font("Fixed", 12, FontFlags::empty()).unwrap();
        r.remove_font(a).unwrap();
        let b = r.add_font("Fixed", 12, FontFlags::empty()).unwrap();

        assert_eq!(a.raw(), 1);
        assert_eq!(b.raw(), 2);
        assert!(r.font(a).is_none());
    }

    #[test]
    fn unknown_handle_is_an_error() {
        let mut r = renderer();
        let a = r.add_font("Fixed", 12, FontFlags::empty()).unwrap();
        r.remove_font(a).unwrap();

        assert!(matches!(r.calculate_text_extent(a, "x"), Err(Error::UnknownFont(h)) if h == a));
        let err = r.add_text(a, "x", Vec2::zero(), Color::WHITE, TextFlags::empty(), Color::BLACK, 1.0);
        assert!(matches!(err, Err(Error::UnknownFont(_))));
        assert!(matches!(r.remove_font(a), Err(Error::UnknownFont(_))));
    }

    #[test]
    fn add_font_forwards_description_and_dpi() {
        let provider = FixedProvider::default();
        let log = provider.resolve_log();
        let config = RendererConfig { dpi: 120.0, ..RendererConfig::default() };
        let mut r = Renderer::new(HeadlessBackend::new(), provider, config).unwrap();

        let h = r.add_font("Fixed", 18, FontFlags::BOLD | FontFlags::ITALIC).unwrap();

        let expected = FontDesc::new("Fixed", 18, FontFlags::BOLD | FontFlags::ITALIC);
        assert_eq!(*log.borrow(), [(expected.clone(), 120.0)]);
        assert_eq!(r.font(h).unwrap().desc(), &expected);
    }

    #[test]
    fn unresolvable_family_is_an_error() {
        let mut r =
            Renderer::new(HeadlessBackend::new(), FixedProvider::with_unknown("Nope"), RendererConfig::default()).unwrap();
        assert!(matches!(r.add_font("Nope", 12, FontFlags::empty()), Err(Error::FontResolution { .. })));
        assert_eq!(r.backend().texture_count(), 0);
    }

    #[test]
    fn remove_font_releases_atlas() {
        let mut r = renderer();
        let h = r.add_font("Fixed", 12, FontFlags::empty()).unwrap();
        assert_eq!(r.backend().texture_count(), 1);
        r.remove_font(h).unwrap();
        assert_eq!(r.backend().texture_count(), 0);
    }

    #[test]
    fn text_batches_use_the_atlas() {
        let mut r = renderer();
        let h = r.add_font("Fixed", 12, FontFlags::empty()).unwrap();
        let atlas = r.font(h).unwrap().texture();

        r.begin_frame().unwrap();
        r.add_rect_filled(Vec2::zero(), Vec2::new(1.0, 1.0), Color::WHITE);
        r.add_text(h, "ab", Vec2::zero(), Color::WHITE, TextFlags::empty(), Color::BLACK, 1.0).unwrap();
        r.render().unwrap();
        r.end_frame().unwrap();

        let textures: Vec<_> = r.backend().draws().iter().map(|d| d.texture).collect();
        assert_eq!(textures, [None, atlas]);
    }

    #[test]
    fn text_to_caller_list() {
        let (r, h) = renderer_with_font();
        let mut list = r.create_render_list();
        r.add_text_to(&mut list, h, "abc", Vec2::zero(), Color::WHITE, TextFlags::empty(), Color::BLACK, 1.0)
            .unwrap();
        assert_eq!(list.vertex_count(), 18);
        assert!(r.default_list().is_empty());
    }

    fn renderer_with_font() -> (Renderer<HeadlessBackend>, FontHandle) {
        let mut r = renderer();
        let h = r.add_font("Fixed", 12, FontFlags::empty()).unwrap();
        (r, h)
    }
}
