//! Generator configuration
//!
//! One JSON document; every field has a default so an empty `{}` is a
//! working config.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::barcode::BarcodeOptions;
use crate::ean::{validate_prefix, DEFAULT_MAX_ATTEMPTS, DEFAULT_PREFIX};
use crate::error::{LabelError, LabelResult};
use crate::export::{default_formats, ExportFormat};
use crate::font::FontConfig;
use crate::layout::LabelGeometry;
use crate::print::PrintSpec;
use crate::{ENGINE_VERSION, MIN_CONFIG_ENGINE_VERSION};

/// What a batch does when one variant fails to render or write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failure and return its error
    #[default]
    Abort,
    /// Record the failure in the report and continue
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub engine_min_version: String,
    pub prefix: String,
    pub output_root: PathBuf,
    /// Consecutive colliding draws tolerated per identifier
    pub max_attempts: u32,
    pub seed: Option<u64>,
    pub failure_policy: FailurePolicy,
    pub formats: Vec<ExportFormat>,
    pub print: PrintSpec,
    pub barcode: BarcodeOptions,
    pub fonts: FontConfig,
    pub geometry: LabelGeometry,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            engine_min_version: MIN_CONFIG_ENGINE_VERSION.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            output_root: PathBuf::from("sku_labels_ui"),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            seed: None,
            failure_policy: FailurePolicy::Abort,
            formats: default_formats(),
            print: PrintSpec::default(),
            barcode: BarcodeOptions::default(),
            fonts: FontConfig::default(),
            geometry: LabelGeometry::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn load_from_file(path: &Path) -> LabelResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LabelResult<()> {
        self.check_engine_version()?;
        validate_prefix(&self.prefix).map_err(|e| LabelError::InvalidConfig(e.to_string()))?;
        if self.max_attempts == 0 {
            return Err(LabelError::InvalidConfig("max_attempts must be > 0".into()));
        }
        if self.formats.is_empty() {
            return Err(LabelError::InvalidConfig("at least one export format is required".into()));
        }
        if !self.print.is_valid() {
            return Err(LabelError::InvalidConfig(format!("dpi {} out of range", self.print.dpi)));
        }
        if self.barcode.module_width_mm <= 0.0 || self.barcode.bar_height_mm <= 0.0 {
            return Err(LabelError::InvalidConfig("barcode dimensions must be positive".into()));
        }
        self.geometry.validate()
    }

    fn check_engine_version(&self) -> LabelResult<()> {
        let engine_ver = semver::Version::parse(ENGINE_VERSION)
            .map_err(|_| LabelError::InvalidConfig("Invalid engine version".into()))?;
        let min_ver = semver::Version::parse(&self.engine_min_version)
            .map_err(|_| LabelError::InvalidConfig(format!("Invalid engine_min_version {}", self.engine_min_version)))?;

        if engine_ver < min_ver {
            return Err(LabelError::EngineVersionMismatch(
                self.engine_min_version.clone(),
                ENGINE_VERSION.to_string(),
            ));
        }
        Ok(())
    }
}
