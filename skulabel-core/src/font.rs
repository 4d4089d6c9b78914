//! Font resolution
//!
//! Fonts are resolved once, before any rendering, into immutable handles that
//! are passed explicitly to the compositor.

use std::path::Path;
use std::sync::Arc;

use rusttype::Font;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{LabelError, LabelResult};

/// DejaVu Sans, shipped so rendering never depends on host fonts.
static BUNDLED_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

/// A parsed font at a fixed pixel size
#[derive(Clone)]
pub struct FontHandle {
    font: Arc<Font<'static>>,
    pub px: f32,
}

impl std::fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontHandle").field("px", &self.px).finish()
    }
}

impl FontHandle {
    pub fn font(&self) -> &Font<'static> {
        &self.font
    }

    /// Same face at another size
    pub fn with_px(&self, px: f32) -> Self {
        Self { font: Arc::clone(&self.font), px }
    }
}

pub fn bundled_font(px: f32) -> LabelResult<FontHandle> {
    let font = Font::try_from_bytes(BUNDLED_FONT)
        .ok_or_else(|| LabelError::Font("bundled font is not a valid TrueType face".into()))?;
    Ok(FontHandle { font: Arc::new(font), px })
}

pub fn load_font(path: &Path, px: f32) -> LabelResult<FontHandle> {
    let bytes = std::fs::read(path)
        .map_err(|e| LabelError::Font(format!("{}: {}", path.display(), e)))?;
    let font = Font::try_from_vec(bytes)
        .ok_or_else(|| LabelError::Font(format!("{}: not a valid TrueType face", path.display())))?;
    Ok(FontHandle { font: Arc::new(font), px })
}

/// Load `preferred` if given and readable, otherwise fall back to the bundled face.
pub fn resolve_font(preferred: Option<&Path>, px: f32) -> LabelResult<FontHandle> {
    match preferred {
        Some(path) => match load_font(path, px) {
            Ok(handle) => {
                info!(path = %path.display(), px, "font loaded");
                Ok(handle)
            }
            Err(e) => {
                warn!(error = %e, "preferred font unavailable, using bundled font");
                bundled_font(px)
            }
        },
        None => bundled_font(px),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// TrueType file for all label text
    pub path: Option<std::path::PathBuf>,
    pub header_px: f32,
    pub product_px: f32,
    pub size_px: f32,
    /// Floor when shrinking text to fit a cell
    pub min_px: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: None,
            header_px: 24.0,
            product_px: 18.0,
            size_px: 48.0,
            min_px: 6.0,
        }
    }
}

/// The three faces a label needs
#[derive(Debug, Clone)]
pub struct LabelFonts {
    /// SKU and color cells
    pub header: FontHandle,
    pub product: FontHandle,
    /// Large size glyph
    pub size: FontHandle,
    pub min_px: f32,
}

impl LabelFonts {
    pub fn resolve(config: &FontConfig) -> LabelResult<Self> {
        if config.min_px <= 0.0 || config.header_px <= 0.0 || config.product_px <= 0.0 || config.size_px <= 0.0 {
            return Err(LabelError::InvalidConfig("font sizes must be positive".into()));
        }
        let base = resolve_font(config.path.as_deref(), config.header_px)?;
        Ok(Self {
            product: base.with_px(config.product_px),
            size: base.with_px(config.size_px),
            header: base,
            min_px: config.min_px,
        })
    }
}
