use std::collections::HashMap;

use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::{Properties, Style, Weight};
use font_kit::source::SystemSource;

use crate::error::{Error, Result};

use super::{FontDesc, FontFlags, FontProvider, FontdueRasterizer, GlyphRasterizer};

/// System-backed [`FontProvider`].
///
/// Families registered with [`register`](Self::register) are served from
/// memory; everything else is looked up through the platform font database
/// (fontconfig, Core Text or DirectWrite) and rasterized with fontdue.
pub struct FontLibrary {
    /// Opened on the first system lookup.
    source: Option<SystemSource>,
    registered: HashMap<String, Vec<u8>>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self { source: None, registered: HashMap::new() }
    }

    /// Makes `bytes` (TrueType/OpenType) available under `family`.
    ///
    /// Lookup is case-insensitive. Registered faces ignore `BOLD`/`ITALIC`.
    pub fn register(&mut self, family: &str, bytes: Vec<u8>) {
        self.registered.insert(family.to_lowercase(), bytes);
    }

    fn load_system(&mut self, desc: &FontDesc) -> Result<(Vec<u8>, u32)> {
        let resolution_error = |reason: String| Error::FontResolution { family: desc.family.clone(), reason };

        let mut props = Properties::new();
        if desc.flags.contains(FontFlags::BOLD) {
            props.weight(Weight::BOLD);
        }
        if desc.flags.contains(FontFlags::ITALIC) {
            props.style(Style::Italic);
        }

        let source = self.source.get_or_insert_with(SystemSource::new);
        let handle = source
            .select_best_match(&[FamilyName::Title(desc.family.clone())], &props)
            .map_err(|e| resolution_error(e.to_string()))?;

        let font_index = match &handle {
            Handle::Path { font_index, .. } | Handle::Memory { font_index, .. } => *font_index,
        };

        let font = handle.load().map_err(|e| resolution_error(e.to_string()))?;
        let data = font
            .copy_font_data()
            .ok_or_else(|| resolution_error("font data not accessible".into()))?;

        log::debug!("font `{}` resolved to `{}`", desc.family, font.full_name());
        Ok((data.to_vec(), font_index))
    }
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl FontProvider for FontLibrary {
    fn resolve(&mut self, desc: &FontDesc, dpi: f32) -> Result<Box<dyn GlyphRasterizer>> {
        let rasterizer = match self.registered.get(&desc.family.to_lowercase()) {
            Some(bytes) => FontdueRasterizer::from_bytes(&desc.family, bytes, 0, desc.size, dpi)?,
            None => {
                let (bytes, index) = self.load_system(desc)?;
                FontdueRasterizer::from_bytes(&desc.family, &bytes, index, desc.size, dpi)?
            }
        };
        Ok(Box::new(rasterizer))
    }
}
