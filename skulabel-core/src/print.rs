//! Print Authority System
//!
//! Defines where the print resolution of a run comes from. Every exported
//! artifact of a run carries the same resolution.

use serde::{Deserialize, Serialize};

pub const DEFAULT_DPI: u32 = 300;
pub const MIN_DPI: u32 = 72;
pub const MAX_DPI: u32 = 1200;

const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;

/// PrintAuthority records which layer decided the print specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintAuthority {
    /// System defaults (fallback)
    System,
    /// Loaded from a config file
    Config,
    /// Command-line override (with validation)
    User,
}

impl Default for PrintAuthority {
    fn default() -> Self {
        Self::System
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    #[default]
    Rgb,
    Grayscale,
}

/// Print specifications for physical output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintSpec {
    #[serde(default = "config_authority")]
    pub authority: PrintAuthority,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default)]
    pub color_space: ColorSpace,
}

fn config_authority() -> PrintAuthority { PrintAuthority::Config }
fn default_dpi() -> u32 { DEFAULT_DPI }

impl Default for PrintSpec {
    fn default() -> Self {
        Self {
            authority: PrintAuthority::System,
            dpi: DEFAULT_DPI,
            color_space: ColorSpace::Rgb,
        }
    }
}

impl PrintSpec {
    /// Create from user with validation
    pub fn from_user(dpi: u32, color_space: ColorSpace) -> Result<Self, &'static str> {
        if !(MIN_DPI..=MAX_DPI).contains(&dpi) {
            return Err("DPI must be between 72 and 1200");
        }
        Ok(Self {
            authority: PrintAuthority::User,
            dpi,
            color_space,
        })
    }

    pub fn is_valid(&self) -> bool {
        (MIN_DPI..=MAX_DPI).contains(&self.dpi)
    }

    /// Pixel density as stored in PNG `pHYs` (pixels per meter)
    pub fn pixels_per_meter(&self) -> u32 {
        (self.dpi as f64 * 1000.0 / MM_PER_INCH).round() as u32
    }

    pub fn mm_to_px(&self, mm: f64) -> u32 {
        (mm / MM_PER_INCH * self.dpi as f64).round() as u32
    }

    /// Physical size of `px` pixels in PDF points
    pub fn px_to_points(&self, px: u32) -> f64 {
        px as f64 * POINTS_PER_INCH / self.dpi as f64
    }
}
