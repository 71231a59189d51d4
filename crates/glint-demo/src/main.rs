mod app;
mod gpu;
mod scene;

use anyhow::{bail, Context, Result};

use glint_engine::logging::{init_logging, LoggingConfig};
use glint_engine::render::{HeadlessBackend, Renderer, RendererConfig};
use glint_engine::text::FontLibrary;

/// Family name `--font <path>` is registered under.
const CUSTOM_FAMILY: &str = "demo-custom";

struct Args {
    verbose: bool,
    headless: Option<u32>,
    font_path: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args { verbose: false, headless: None, font_path: None };
    let mut it = std::env::args().skip(1);

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--verbose" | "-v" => args.verbose = true,
            "--headless" => args.headless = Some(3),
            "--frames" => {
                let n = it.next().context("--frames needs a value")?;
                args.headless = Some(n.parse().with_context(|| format!("invalid frame count `{n}`"))?);
            }
            "--font" => args.font_path = Some(it.next().context("--font needs a path")?),
            other => bail!("unknown argument `{other}` (expected --verbose, --headless, --frames <n>, --font <path>)"),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    let args = parse_args()?;
    init_logging(if args.verbose { LoggingConfig::verbose() } else { LoggingConfig::default() });

    let mut library = FontLibrary::new();
    let preferred = match &args.font_path {
        Some(path) => {
            let bytes = std::fs::read(path).with_context(|| format!("failed to read font `{path}`"))?;
            library.register(CUSTOM_FAMILY, bytes);
            Some(CUSTOM_FAMILY.to_string())
        }
        None => None,
    };

    match args.headless {
        Some(frames) => run_headless(library, preferred.as_deref(), frames),
        None => app::run(library, preferred),
    }
}

/// Drives the overlay against the in-memory backend and logs what each
/// frame would have drawn, including a device loss/reset cycle that also
/// resizes the target.
fn run_headless(library: FontLibrary, preferred: Option<&str>, frames: u32) -> Result<()> {
    let backend = HeadlessBackend::new().with_target_size(1280, 720);
    let mut renderer = Renderer::new(backend, library, RendererConfig::default())
        .context("failed to create overlay renderer")?;
    let fonts = scene::load_fonts(&mut renderer, preferred);

    let frame = |renderer: &mut Renderer<HeadlessBackend>, (width, height): (u32, u32), index: u32| -> Result<()> {
        renderer.backend_mut().clear_log();
        renderer.begin_frame()?;
        let drawn = scene::draw(renderer, fonts.as_ref(), width as f32, height as f32, index as f32 * 0.25)
            .and_then(|_| renderer.render());
        renderer.end_frame()?;
        drawn?;

        let backend = renderer.backend();
        let vertices: usize = backend.uploads().iter().sum();
        log::info!("frame {index} ({width}x{height}): {} draw calls, {vertices} vertices", backend.draws().len());
        Ok(())
    };

    for index in 0..frames {
        frame(&mut renderer, (1280, 720), index)?;
    }

    renderer.on_lost_device()?;
    log::info!("device lost: {} live backend objects", renderer.backend().live_object_count());
    renderer.backend_mut().set_target_size(1920, 1080);
    renderer.on_reset_device()?;
    log::info!("device reset: {} live backend objects", renderer.backend().live_object_count());

    frame(&mut renderer, (1920, 1080), frames)?;
    Ok(())
}
