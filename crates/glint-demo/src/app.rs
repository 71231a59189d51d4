use std::time::Instant;

use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use glint_engine::coords::{ScissorRect, Viewport};
use glint_engine::render::{Renderer, RendererConfig, WgpuBackend, WgpuSnapshot};
use glint_engine::text::FontLibrary;

use crate::gpu::{Gpu, GpuInit, SurfaceErrorAction};
use crate::scene::{self, DemoFonts};

const BACKGROUND: wgpu::Color = wgpu::Color { r: 0.06, g: 0.07, b: 0.09, a: 1.0 };

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct Overlay {
    renderer: Renderer<WgpuBackend>,
    fonts: Option<DemoFonts>,
}

struct DemoApp {
    library: Option<FontLibrary>,
    preferred_family: Option<String>,
    started: Instant,

    entry: Option<WindowEntry>,
    overlay: Option<Overlay>,
    failed: Option<anyhow::Error>,
}

/// Opens a window and draws the demo overlay over a cleared frame until
/// the window is closed.
pub fn run(library: FontLibrary, preferred_family: Option<String>) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DemoApp {
        library: Some(library),
        preferred_family,
        started: Instant::now(),
        entry: None,
        overlay: None,
        failed: None,
    };

    event_loop
        .run_app(&mut app)
        .context("winit event loop terminated with error")?;

    match app.failed.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

impl DemoApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failed = Some(err);
        event_loop.exit();
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title("glint overlay demo")
            .with_inner_size(LogicalSize::new(960.0, 600.0));
        let window = event_loop.create_window(attrs).context("failed to create window")?;

        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, GpuInit::default())),
        }
        .try_build()?;

        let library = self.library.take().context("window created twice")?;
        let backend = entry.with_gpu(|gpu| WgpuBackend::new(gpu.device(), gpu.queue(), gpu.format()));
        let mut renderer = Renderer::new(backend, library, RendererConfig::default())
            .context("failed to create overlay renderer")?;
        let fonts = scene::load_fonts(&mut renderer, self.preferred_family.as_deref());

        self.entry = Some(entry);
        self.overlay = Some(Overlay { renderer, fonts });
        Ok(())
    }

    /// Resizes drop every GPU object of the overlay and rebuild them against
    /// the reconfigured surface, the same path a real device loss takes.
    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        let (Some(entry), Some(overlay)) = (self.entry.as_mut(), self.overlay.as_mut()) else {
            return Ok(());
        };
        let renderer = &mut overlay.renderer;

        if !renderer.is_device_lost() {
            renderer.on_lost_device()?;
        }
        entry.with_gpu_mut(|gpu| gpu.resize(size));

        if size.width == 0 || size.height == 0 {
            // Minimized; stay lost until a real size comes back.
            return Ok(());
        }

        entry.with_gpu(|gpu| {
            renderer
                .backend_mut()
                .rebind_device(gpu.device(), gpu.queue(), gpu.format())
        });
        renderer.on_reset_device()?;
        entry.with_window(|w| w.request_redraw());
        Ok(())
    }

    /// Returns `false` when the app should exit.
    fn redraw(&mut self) -> Result<bool> {
        let (Some(entry), Some(overlay)) = (self.entry.as_mut(), self.overlay.as_mut()) else {
            return Ok(true);
        };
        if overlay.renderer.is_device_lost() {
            return Ok(true);
        }

        let frame = match entry.with_gpu(|gpu| gpu.acquire()) {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("surface error: {err}");
                let action = entry.with_gpu_mut(|gpu| gpu.handle_surface_error(err));
                entry.with_window(|w| w.request_redraw());
                return Ok(action != SurfaceErrorAction::Fatal);
            }
        };

        let size = entry.with_gpu(|gpu| gpu.size());
        let t = self.started.elapsed().as_secs_f32();
        let renderer = &mut overlay.renderer;

        entry.with_gpu(|gpu| gpu.clear(&frame, BACKGROUND));
        let host = WgpuSnapshot {
            viewport: Some(Viewport::full(size.width, size.height)),
            scissor: Some(ScissorRect::full(size.width, size.height)),
        };
        let backend = renderer.backend_mut();
        backend.bind_target(&frame.view, size.width, size.height);
        backend.set_viewport(host.viewport);
        backend.set_scissor(host.scissor);

        renderer.begin_frame()?;
        let drawn = scene::draw(renderer, overlay.fonts.as_ref(), size.width as f32, size.height as f32, t)
            .and_then(|_| renderer.render());
        renderer.end_frame()?;
        drawn?;

        if renderer.backend().pass_state() != host {
            log::warn!("overlay left host pass state modified: {:?}", renderer.backend().pass_state());
        }

        renderer.backend_mut().unbind_target();
        entry.with_gpu(|gpu| gpu.present(frame));
        entry.with_window(|w| w.request_redraw());
        Ok(true)
    }
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            self.fail(event_loop, e.context("failed to initialize demo window"));
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.overlay = None;
                self.entry = None;
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Err(e) = self.resize(size) {
                    self.fail(event_loop, e.context("overlay reset after resize failed"));
                }
            }

            WindowEvent::RedrawRequested => match self.redraw() {
                Ok(true) => {}
                Ok(false) => event_loop.exit(),
                Err(e) => self.fail(event_loop, e.context("overlay frame failed")),
            },

            _ => {}
        }
    }
}
