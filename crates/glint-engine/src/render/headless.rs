//! Recording backend modelled on an immediate-mode device context.
//!
//! Nothing is drawn. The backend keeps a [`ContextState`] the host can
//! mutate, tracks every object it creates and logs every draw, which is
//! enough to check batching, state capture/restore and release discipline
//! without a GPU.

use std::collections::{BTreeSet, HashMap};

use crate::coords::{ScissorRect, Viewport};
use crate::scene::{DrawCall, Topology, Vertex};
use crate::text::AtlasImage;

use super::{Backend, BackendError, PipelineConfig, TextureId};

/// Id of a pipeline object created by a [`HeadlessBackend`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ObjectId(pub u64);

/// Pipeline objects in creation order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PipelineStage {
    VertexProgram,
    PixelProgram,
    InputLayout,
    BlendState,
    RasterState,
    DepthStencilState,
    VertexBuffer,
    ConstantBuffer,
    Sampler,
    FallbackTexture,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 10] = [
        PipelineStage::VertexProgram,
        PipelineStage::PixelProgram,
        PipelineStage::InputLayout,
        PipelineStage::BlendState,
        PipelineStage::RasterState,
        PipelineStage::DepthStencilState,
        PipelineStage::VertexBuffer,
        PipelineStage::ConstantBuffer,
        PipelineStage::Sampler,
        PipelineStage::FallbackTexture,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PipelineStage::VertexProgram => "vertex program",
            PipelineStage::PixelProgram => "pixel program",
            PipelineStage::InputLayout => "input layout",
            PipelineStage::BlendState => "blend state",
            PipelineStage::RasterState => "raster state",
            PipelineStage::DepthStencilState => "depth-stencil state",
            PipelineStage::VertexBuffer => "vertex buffer",
            PipelineStage::ConstantBuffer => "constant buffer",
            PipelineStage::Sampler => "sampler",
            PipelineStage::FallbackTexture => "fallback texture",
        }
    }
}

/// Bound state of the modelled device context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextState {
    pub vertex_program: Option<ObjectId>,
    pub pixel_program: Option<ObjectId>,
    pub input_layout: Option<ObjectId>,
    pub blend_state: Option<ObjectId>,
    pub raster_state: Option<ObjectId>,
    pub depth_stencil_state: Option<ObjectId>,
    pub vertex_buffer: Option<ObjectId>,
    pub constant_buffer: Option<ObjectId>,
    pub sampler: Option<ObjectId>,
    pub texture: Option<TextureId>,
    pub topology: Option<Topology>,
    pub viewport: Viewport,
    pub scissor: ScissorRect,
    pub blend_enabled: bool,
    pub depth_enabled: bool,
    pub scissor_enabled: bool,
}

#[derive(Debug)]
struct PipelineObjects {
    ids: Vec<(PipelineStage, ObjectId)>,
    capacity: usize,
}

impl PipelineObjects {
    fn get(&self, stage: PipelineStage) -> Option<ObjectId> {
        self.ids.iter().find(|(s, _)| *s == stage).map(|&(_, id)| id)
    }
}

/// Recording [`Backend`] used by tests and headless hosts.
#[derive(Debug)]
pub struct HeadlessBackend {
    context: ContextState,
    target_size: (u32, u32),
    objects: Option<PipelineObjects>,
    live: BTreeSet<ObjectId>,
    textures: HashMap<TextureId, AtlasImage>,
    next_id: u64,

    fail_stage: Option<PipelineStage>,
    fail_textures: bool,

    pipelines_created: usize,
    teardowns: usize,
    double_releases: usize,
    uploads: Vec<usize>,
    draws: Vec<DrawCall>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// A backend with a 1280×720 target and no pipeline objects yet.
    pub fn new() -> Self {
        Self {
            context: ContextState::default(),
            target_size: (1280, 720),
            objects: None,
            live: BTreeSet::new(),
            textures: HashMap::new(),
            next_id: 1,
            fail_stage: None,
            fail_textures: false,
            pipelines_created: 0,
            teardowns: 0,
            double_releases: 0,
            uploads: Vec::new(),
            draws: Vec::new(),
        }
    }

    pub fn with_target_size(mut self, width: u32, height: u32) -> Self {
        self.target_size = (width, height);
        self
    }

    pub fn set_target_size(&mut self, width: u32, height: u32) {
        self.target_size = (width, height);
    }

    #[inline]
    pub fn context(&self) -> &ContextState {
        &self.context
    }

    /// Host-side access to the bound state.
    #[inline]
    pub fn context_mut(&mut self) -> &mut ContextState {
        &mut self.context
    }

    /// Makes every later `create_pipeline` fail when it reaches `stage`.
    pub fn fail_pipeline_at(&mut self, stage: Option<PipelineStage>) {
        self.fail_stage = stage;
    }

    pub fn fail_texture_creation(&mut self, fail: bool) {
        self.fail_textures = fail;
    }

    /// Pipeline objects and textures currently alive.
    pub fn live_object_count(&self) -> usize {
        self.live.len() + self.textures.len()
    }

    #[inline]
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn texture_pixels(&self, id: TextureId) -> Option<&AtlasImage> {
        self.textures.get(&id)
    }

    #[inline]
    pub fn pipelines_created(&self) -> usize {
        self.pipelines_created
    }

    #[inline]
    pub fn teardowns(&self) -> usize {
        self.teardowns
    }

    /// Releases of objects that were not alive. Always 0 unless something
    /// frees twice.
    #[inline]
    pub fn double_releases(&self) -> usize {
        self.double_releases
    }

    /// Vertex count of each upload, in order.
    #[inline]
    pub fn uploads(&self) -> &[usize] {
        &self.uploads
    }

    #[inline]
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }

    pub fn clear_log(&mut self) {
        self.uploads.clear();
        self.draws.clear();
    }

    pub fn object(&self, stage: PipelineStage) -> Option<ObjectId> {
        self.objects.as_ref().and_then(|o| o.get(stage))
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn release_object(&mut self, id: ObjectId) {
        if !self.live.remove(&id) {
            self.double_releases += 1;
        }
    }

    fn release_all(&mut self, objects: PipelineObjects) {
        for (_, id) in objects.ids {
            self.release_object(id);
        }
    }
}

impl Backend for HeadlessBackend {
    type Snapshot = ContextState;

    fn create_pipeline(&mut self, config: &PipelineConfig) -> Result<(), BackendError> {
        self.teardown();

        let mut objects = PipelineObjects { ids: Vec::with_capacity(PipelineStage::ALL.len()), capacity: config.vertex_capacity };
        for stage in PipelineStage::ALL {
            if self.fail_stage == Some(stage) {
                log::debug!("headless: injected failure creating {}", stage.name());
                self.release_all(objects);
                return Err(BackendError::Injected(stage.name()));
            }
            let id = ObjectId(self.allocate());
            self.live.insert(id);
            objects.ids.push((stage, id));
        }

        self.objects = Some(objects);
        self.pipelines_created += 1;
        Ok(())
    }

    fn teardown(&mut self) {
        if let Some(objects) = self.objects.take() {
            self.release_all(objects);
            self.teardowns += 1;
        }
    }

    fn is_live(&self) -> bool {
        self.objects.is_some()
    }

    fn capture_state(&mut self) -> ContextState {
        self.context.clone()
    }

    fn apply_frame_state(&mut self) -> Result<(), BackendError> {
        let objects = self.objects.as_ref().ok_or(BackendError::NotLive)?;
        let (w, h) = self.target_size;

        let ctx = &mut self.context;
        ctx.vertex_program = objects.get(PipelineStage::VertexProgram);
        ctx.pixel_program = objects.get(PipelineStage::PixelProgram);
        ctx.input_layout = objects.get(PipelineStage::InputLayout);
        ctx.blend_state = objects.get(PipelineStage::BlendState);
        ctx.raster_state = objects.get(PipelineStage::RasterState);
        ctx.depth_stencil_state = objects.get(PipelineStage::DepthStencilState);
        ctx.vertex_buffer = objects.get(PipelineStage::VertexBuffer);
        ctx.constant_buffer = objects.get(PipelineStage::ConstantBuffer);
        ctx.sampler = objects.get(PipelineStage::Sampler);
        ctx.texture = None;
        ctx.topology = Some(Topology::TriangleList);
        ctx.viewport = Viewport::full(w, h);
        ctx.scissor = ScissorRect::full(w, h);
        ctx.blend_enabled = true;
        ctx.depth_enabled = false;
        ctx.scissor_enabled = true;
        Ok(())
    }

    fn restore_state(&mut self, snapshot: ContextState) {
        self.context = snapshot;
    }

    fn vertex_capacity(&self) -> usize {
        self.objects.as_ref().map_or(0, |o| o.capacity)
    }

    /// Buffers of a fixed-size device cannot be resized in place: every
    /// pipeline object is torn down and recreated at the new size.
    fn grow_vertex_buffer(&mut self, capacity: usize) -> Result<(), BackendError> {
        self.teardown();
        self.create_pipeline(&PipelineConfig { vertex_capacity: capacity })
    }

    fn submit_batches(&mut self, vertices: &[Vertex], draws: &[DrawCall]) -> Result<(), BackendError> {
        let objects = self.objects.as_ref().ok_or(BackendError::NotLive)?;
        if vertices.len() > objects.capacity {
            return Err(BackendError::Limit(format!(
                "{} vertices exceed buffer capacity {}",
                vertices.len(),
                objects.capacity
            )));
        }
        if let Some(missing) = draws.iter().filter_map(|d| d.texture).find(|t| !self.textures.contains_key(t)) {
            return Err(BackendError::UnknownTexture(missing));
        }

        self.uploads.push(vertices.len());
        for draw in draws {
            self.context.topology = Some(draw.topology);
            self.context.texture = draw.texture;
            self.draws.push(*draw);
        }
        Ok(())
    }

    fn create_texture(&mut self, image: &AtlasImage) -> Result<TextureId, BackendError> {
        if self.fail_textures {
            return Err(BackendError::Injected("texture"));
        }
        let id = TextureId(self.allocate());
        self.textures.insert(id, image.clone());
        Ok(id)
    }

    fn release_texture(&mut self, id: TextureId) {
        if self.textures.remove(&id).is_none() {
            self.double_releases += 1;
        }
    }
}
