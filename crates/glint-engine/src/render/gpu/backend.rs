use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};

use crate::coords::{ScissorRect, Viewport};
use crate::render::{Backend, BackendError, PipelineConfig, TextureId};
use crate::scene::{DrawCall, Topology, Vertex};
use crate::text::AtlasImage;

// ── GPU types ─────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    size: [f32; 2],
    _pad: [f32; 2], // 16-byte alignment
}

const VERTEX_ATTRS: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Unorm8x4, 2 => Float32x2];

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRS,
    }
}

fn straight_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

fn primitive_topology(topology: Topology) -> Option<wgpu::PrimitiveTopology> {
    Some(match topology {
        Topology::PointList => wgpu::PrimitiveTopology::PointList,
        Topology::LineList => wgpu::PrimitiveTopology::LineList,
        Topology::LineStrip => wgpu::PrimitiveTopology::LineStrip,
        Topology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        Topology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        Topology::Undefined => return None,
    })
}

// ── objects ───────────────────────────────────────────────────────────────

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// Everything `create_pipeline` builds. Dropping it releases the lot.
struct PipelineObjects {
    /// Indexed like [`Topology::DRAWABLE`].
    pipelines: Vec<wgpu::RenderPipeline>,
    texture_layout: wgpu::BindGroupLayout,
    viewport_ubo: wgpu::Buffer,
    viewport_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    white: GpuTexture,
}

#[derive(Clone)]
struct TargetBinding {
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

/// Host pass state the overlay overrides during a frame.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct WgpuSnapshot {
    pub viewport: Option<Viewport>,
    pub scissor: Option<ScissorRect>,
}

/// [`Backend`] drawing into a host-owned color target with wgpu.
///
/// Each submission records its own encoder with a single render pass that
/// loads and stores the bound target, then submits it to the queue.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: wgpu::TextureFormat,

    target: Option<TargetBinding>,
    pass: WgpuSnapshot,

    objects: Option<PipelineObjects>,
    textures: HashMap<TextureId, GpuTexture>,
    next_texture: u64,
}

impl WgpuBackend {
    /// Wraps `device`/`queue`. Pipelines target `format`.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        Self {
            device: device.clone(),
            queue: queue.clone(),
            format,
            target: None,
            pass: WgpuSnapshot::default(),
            objects: None,
            textures: HashMap::new(),
            next_texture: 1,
        }
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Sets the color target overlay passes draw into.
    pub fn bind_target(&mut self, view: &wgpu::TextureView, width: u32, height: u32) {
        self.target = Some(TargetBinding { view: view.clone(), width, height });
    }

    pub fn unbind_target(&mut self) {
        self.target = None;
    }

    /// Host-side viewport for passes outside the overlay's frame bracket.
    pub fn set_viewport(&mut self, viewport: Option<Viewport>) {
        self.pass.viewport = viewport;
    }

    pub fn set_scissor(&mut self, scissor: Option<ScissorRect>) {
        self.pass.scissor = scissor;
    }

    #[inline]
    pub fn pass_state(&self) -> WgpuSnapshot {
        self.pass
    }

    /// Swaps in a recreated device. Call between `on_lost_device` and
    /// `on_reset_device`; anything still alive on the old device is dropped.
    pub fn rebind_device(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat) {
        if self.objects.is_some() || !self.textures.is_empty() {
            log::warn!("rebinding device with {} live textures; dropping them", self.textures.len());
        }
        self.teardown();
        self.textures.clear();
        self.target = None;
        self.device = device.clone();
        self.queue = queue.clone();
        self.format = format;
    }

    fn check_vertex_capacity(&self, capacity: usize) -> Result<u64, BackendError> {
        if capacity == 0 {
            return Err(BackendError::Unsupported("zero vertex capacity".into()));
        }
        let size = (capacity * std::mem::size_of::<Vertex>()) as u64;
        let max = self.device.limits().max_buffer_size;
        if size > max {
            return Err(BackendError::Limit(format!("vertex buffer of {size} bytes exceeds {max}")));
        }
        Ok(size)
    }

    fn create_vertex_buffer(&self, size: u64) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glint overlay vbo"),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn upload_texture(
        &self,
        image: &AtlasImage,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
    ) -> Result<GpuTexture, BackendError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if image.width == 0 || image.height == 0 || image.width > max || image.height > max {
            return Err(BackendError::Limit(format!(
                "texture {}x{} outside 1..={max}",
                image.width, image.height
            )));
        }

        let size = wgpu::Extent3d { width: image.width, height: image.height, depth_or_array_layers: 1 };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glint overlay texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(image.width * 4),
                rows_per_image: Some(image.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glint overlay texture bind group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(&view) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(sampler) },
            ],
        });

        Ok(GpuTexture { _texture: texture, bind_group })
    }

    fn build_objects(&self, config: &PipelineConfig) -> Result<PipelineObjects, BackendError> {
        let vertex_bytes = self.check_vertex_capacity(config.vertex_capacity)?;
        let device = &self.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("glint overlay shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/overlay.wgsl").into()),
        });

        let viewport_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("glint overlay viewport bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<ViewportUniform>() as u64),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("glint overlay texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("glint overlay pipeline layout"),
            bind_group_layouts: &[&viewport_layout, &texture_layout],
            immediate_size: 0,
        });

        let mut pipelines = Vec::with_capacity(Topology::DRAWABLE.len());
        for topology in Topology::DRAWABLE {
            let Some(primitive) = primitive_topology(topology) else { continue };
            pipelines.push(device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("glint overlay pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[vertex_layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.format,
                        blend: Some(straight_alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: primitive,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            }));
        }

        let viewport_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glint overlay viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let viewport_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glint overlay viewport bind group"),
            layout: &viewport_layout,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: viewport_ubo.as_entire_binding() }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glint overlay sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let vertex_buffer = self.create_vertex_buffer(vertex_bytes);

        let white_image = AtlasImage { width: 1, height: 1, pixels: vec![0xFF; 4] };
        let white = self.upload_texture(&white_image, &texture_layout, &sampler)?;

        Ok(PipelineObjects {
            pipelines,
            texture_layout,
            viewport_ubo,
            viewport_bind_group,
            sampler,
            vertex_buffer,
            vertex_capacity: config.vertex_capacity,
            white,
        })
    }
}

impl Backend for WgpuBackend {
    type Snapshot = WgpuSnapshot;

    /// Objects are only stored once all of them exist; an early error drops
    /// the partial set.
    fn create_pipeline(&mut self, config: &PipelineConfig) -> Result<(), BackendError> {
        self.teardown();
        let objects = self.build_objects(config)?;
        log::debug!("wgpu overlay pipeline created ({:?}, {} vertices)", self.format, config.vertex_capacity);
        self.objects = Some(objects);
        Ok(())
    }

    fn teardown(&mut self) {
        if self.objects.take().is_some() {
            log::debug!("wgpu overlay pipeline released");
        }
    }

    fn is_live(&self) -> bool {
        self.objects.is_some()
    }

    fn capture_state(&mut self) -> WgpuSnapshot {
        self.pass
    }

    fn apply_frame_state(&mut self) -> Result<(), BackendError> {
        let objects = self.objects.as_ref().ok_or(BackendError::NotLive)?;
        let target = self.target.as_ref().ok_or(BackendError::NoTarget)?;

        let (w, h) = (target.width.max(1), target.height.max(1));
        self.queue.write_buffer(
            &objects.viewport_ubo,
            0,
            bytemuck::bytes_of(&ViewportUniform { size: [w as f32, h as f32], _pad: [0.0; 2] }),
        );

        self.pass = WgpuSnapshot {
            viewport: Some(Viewport::full(w, h)),
            scissor: Some(ScissorRect::full(w, h)),
        };
        Ok(())
    }

    fn restore_state(&mut self, snapshot: WgpuSnapshot) {
        self.pass = snapshot;
    }

    fn vertex_capacity(&self) -> usize {
        self.objects.as_ref().map_or(0, |o| o.vertex_capacity)
    }

    fn grow_vertex_buffer(&mut self, capacity: usize) -> Result<(), BackendError> {
        if self.objects.is_none() {
            return Err(BackendError::NotLive);
        }
        let size = self.check_vertex_capacity(capacity)?;
        let buffer = self.create_vertex_buffer(size);
        let objects = self.objects.as_mut().ok_or(BackendError::NotLive)?;
        objects.vertex_buffer = buffer;
        objects.vertex_capacity = capacity;
        Ok(())
    }

    fn submit_batches(&mut self, vertices: &[Vertex], draws: &[DrawCall]) -> Result<(), BackendError> {
        let objects = self.objects.as_ref().ok_or(BackendError::NotLive)?;
        let target = self.target.as_ref().ok_or(BackendError::NoTarget)?;

        if vertices.len() > objects.vertex_capacity {
            return Err(BackendError::Limit(format!(
                "{} vertices exceed buffer capacity {}",
                vertices.len(),
                objects.vertex_capacity
            )));
        }
        if let Some(missing) = draws.iter().filter_map(|d| d.texture).find(|t| !self.textures.contains_key(t)) {
            return Err(BackendError::UnknownTexture(missing));
        }

        let scissor = match self.pass.scissor {
            Some(s) => match s.clamped_to(target.width, target.height) {
                Some(s) => Some(s),
                // fully clipped
                None => return Ok(()),
            },
            None => None,
        };

        self.queue.write_buffer(&objects.vertex_buffer, 0, bytemuck::cast_slice(vertices));

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("glint overlay encoder"),
        });

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("glint overlay pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let Some(vp) = self.pass.viewport.filter(|v| v.is_valid()) {
                rpass.set_viewport(vp.x, vp.y, vp.width, vp.height, 0.0, 1.0);
            }
            if let Some(s) = scissor {
                rpass.set_scissor_rect(s.x, s.y, s.width, s.height);
            }

            rpass.set_bind_group(0, &objects.viewport_bind_group, &[]);
            rpass.set_vertex_buffer(0, objects.vertex_buffer.slice(..));

            for draw in draws {
                let Some(index) = draw.topology.drawable_index() else { continue };
                let texture = match draw.texture {
                    Some(id) => self.textures.get(&id).unwrap_or(&objects.white),
                    None => &objects.white,
                };

                rpass.set_pipeline(&objects.pipelines[index]);
                rpass.set_bind_group(1, &texture.bind_group, &[]);
                rpass.draw(draw.first_vertex..draw.first_vertex + draw.vertex_count, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn create_texture(&mut self, image: &AtlasImage) -> Result<TextureId, BackendError> {
        let objects = self.objects.as_ref().ok_or(BackendError::NotLive)?;
        let texture = self.upload_texture(image, &objects.texture_layout, &objects.sampler)?;

        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(id, texture);
        Ok(id)
    }

    fn release_texture(&mut self, id: TextureId) {
        self.textures.remove(&id);
    }
}
