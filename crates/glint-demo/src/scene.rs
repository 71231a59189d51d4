use glint_engine::coords::{Rect, Vec2};
use glint_engine::paint::Color;
use glint_engine::render::{Backend, FontHandle, Renderer};
use glint_engine::scene::shapes::GradientDirection;
use glint_engine::text::{FontFlags, TextFlags};

/// Tried in order until one resolves.
const FAMILIES: &[&str] = &["Segoe UI", "DejaVu Sans", "Liberation Sans", "Noto Sans", "Arial", "Helvetica"];

pub struct DemoFonts {
    pub body: FontHandle,
    pub title: FontHandle,
}

/// Loads the demo fonts. `preferred` (from `--font`) is tried first.
pub fn load_fonts<B: Backend>(renderer: &mut Renderer<B>, preferred: Option<&str>) -> Option<DemoFonts> {
    let families = preferred.into_iter().chain(FAMILIES.iter().copied());

    for family in families {
        let body = match renderer.add_font(family, 12, FontFlags::empty()) {
            Ok(handle) => handle,
            Err(e) => {
                log::debug!("font `{family}` unavailable: {e}");
                continue;
            }
        };
        match renderer.add_font(family, 20, FontFlags::BOLD) {
            Ok(title) => {
                log::info!("demo fonts: `{family}`");
                return Some(DemoFonts { body, title });
            }
            Err(e) => {
                log::debug!("bold `{family}` unavailable: {e}");
                if let Err(e) = renderer.remove_font(body) {
                    log::warn!("failed to drop regular `{family}` font: {e}");
                }
            }
        }
    }

    log::warn!("no usable system font found; drawing shapes only");
    None
}

/// Appends one frame of the demo overlay to the renderer's default list.
pub fn draw<B: Backend>(
    renderer: &mut Renderer<B>,
    fonts: Option<&DemoFonts>,
    width: f32,
    height: f32,
    t: f32,
) -> glint_engine::Result<()> {
    let panel_min = Vec2::new(20.0, 20.0);
    let panel_max = Vec2::new(360.0, 220.0);

    renderer.add_gradient_rect(
        panel_min,
        panel_max,
        Color::from_rgba8(20, 24, 40, 220),
        Color::from_rgba8(40, 20, 60, 220),
        GradientDirection::Vertical,
    );
    renderer.add_rect(panel_min, panel_max, Color::from_rgb8(120, 140, 255), 2.0);
    renderer.add_rect_filled(
        Vec2::new(30.0, 190.0),
        Vec2::new(30.0 + 320.0 * (0.5 + 0.5 * t.sin()), 205.0),
        Color::from_rgb8(80, 200, 120),
    );

    let center = Vec2::new(width - 80.0, 80.0);
    renderer.add_circle(center, 50.0, Color::from_rgb8(255, 200, 60), 48);
    let hand = Vec2::new(center.x + 45.0 * t.cos(), center.y + 45.0 * t.sin());
    renderer.add_thick_line(center, hand, Color::from_rgb8(255, 90, 90), 4.0);

    renderer.add_line(Vec2::new(0.0, height - 1.0), Vec2::new(width, height - 1.0), Color::WHITE);
    renderer.add_gradient_rect(
        Vec2::new(0.0, height - 12.0),
        Vec2::new(width, height - 2.0),
        Color::from_rgb8(255, 60, 60),
        Color::from_rgb8(60, 60, 255),
        GradientDirection::Horizontal,
    );

    let Some(fonts) = fonts else { return Ok(()) };
    let none = Color::TRANSPARENT;

    renderer.add_text(fonts.title, "glint overlay", Vec2::new(32.0, 28.0), Color::WHITE, TextFlags::DROP_SHADOW, none, 0.0)?;
    renderer.add_text(
        fonts.body,
        "{#ff78ff78}batched{#ffffffff} shapes and {#ffffc83c}atlas{#ffffffff} text",
        Vec2::new(32.0, 70.0),
        Color::WHITE,
        TextFlags::empty(),
        none,
        0.0,
    )?;
    renderer.add_text(
        fonts.body,
        "outlined label",
        Vec2::new(32.0, 100.0),
        Color::from_rgb8(255, 230, 120),
        TextFlags::OUTLINE,
        Color::BLACK,
        1.0,
    )?;

    let extent = renderer.calculate_text_extent(fonts.body, "centered")?;
    renderer.add_text(
        fonts.body,
        "centered",
        Vec2::new(190.0, 150.0),
        Color::WHITE,
        TextFlags::CENTERED,
        none,
        0.0,
    )?;
    let frame = Rect::centered_at(Vec2::new(190.0, 150.0), extent).inflate(4.0, 2.0);
    renderer.add_rect(frame.min(), frame.max(), Color::from_rgba8(255, 255, 255, 96), 1.0);

    renderer.add_text(
        fonts.body,
        "right aligned",
        Vec2::new(width - 10.0, height - 30.0),
        Color::WHITE,
        TextFlags::RIGHT,
        none,
        0.0,
    )?;

    Ok(())
}
