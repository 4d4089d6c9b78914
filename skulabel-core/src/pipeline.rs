//! Label Pipeline - Single Entry Point
//!
//! CRITICAL: generate_collection MUST call validate internally. Nothing is
//! rendered or written for a request that fails validation.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use image::RgbImage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::barcode::Ean13Rasterizer;
use crate::catalog::{CollectionRequest, LabelJob, Variant};
use crate::compose::LabelCompositor;
use crate::config::{FailurePolicy, GeneratorConfig};
use crate::ean::{Ean13, IdentifierGenerator};
use crate::error::{LabelError, LabelResult};
use crate::font::LabelFonts;
use crate::hashing::compute_request_hash;
use crate::output::{LabelWriter, WrittenFile};
use crate::validation::{ValidationResult, Validator};
use crate::ENGINE_VERSION;

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRecord {
    pub sku: String,
    pub identifier: Ean13,
    pub variant: Variant,
    pub files: Vec<WrittenFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelFailure {
    pub sku: String,
    pub identifier: Ean13,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub collection: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub request_hash: String,
    pub validation: ValidationResult,
    pub labels: Vec<LabelRecord>,
    pub failures: Vec<LabelFailure>,
}

impl GenerationReport {
    /// Every file written in this run, in generation order
    pub fn written_paths(&self) -> Vec<PathBuf> {
        self.labels
            .iter()
            .flat_map(|l| l.files.iter().map(|f| f.path.clone()))
            .collect()
    }
}

/// The label pipeline - validation, enumeration, identifiers, render, write
pub struct LabelPipeline {
    config: GeneratorConfig,
    validator: Validator,
    compositor: LabelCompositor,
    writer: LabelWriter,
}

impl LabelPipeline {
    /// Resolves fonts once and builds the compositor and writer from `config`.
    pub fn new(config: GeneratorConfig) -> LabelResult<Self> {
        config.validate()?;
        let fonts = LabelFonts::resolve(&config.fonts)?;
        let rasterizer = Ean13Rasterizer::new(config.barcode.clone(), config.print.clone())
            .with_font(fonts.header.clone());
        let compositor = LabelCompositor::new(config.geometry.clone(), fonts, Box::new(rasterizer))?;
        Ok(Self::with_compositor(config, compositor))
    }

    /// Use a prepared compositor, e.g. one with a different barcode rasterizer.
    pub fn with_compositor(config: GeneratorConfig, compositor: LabelCompositor) -> Self {
        let writer = LabelWriter::new(config.output_root.clone(), config.formats.clone(), config.print.clone());
        Self {
            config,
            validator: Validator::new(),
            compositor,
            writer,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn writer(&self) -> &LabelWriter {
        &self.writer
    }

    /// This is the ONLY validation entry point.
    pub fn validate_request(&self, request: &CollectionRequest) -> ValidationResult {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let result = self.validator.validate(request, &self.config);
        for w in result.warnings() {
            warn!(rule = %w.rule, "{}", w.message);
        }
        result
    }

    /// Validate, enumerate and bind each variant to a fresh identifier.
    pub fn plan(&self, request: &CollectionRequest) -> LabelResult<Vec<LabelJob>> {
        let validation = self.validate_request(request);
        if !validation.valid {
            return Err(LabelError::InvalidInput(validation.error_summary()));
        }
        self.plan_validated(request)
    }

    fn plan_validated(&self, request: &CollectionRequest) -> LabelResult<Vec<LabelJob>> {
        let variants = request.variants();
        if variants.is_empty() {
            return Err(LabelError::InvalidInput("selection produces no variants".into()));
        }
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let identifiers = IdentifierGenerator::new(&self.config.prefix, self.config.max_attempts, rng)?
            .generate(variants.len())?;
        LabelJob::pair(variants, identifiers)
    }

    pub fn render_label(&self, job: &LabelJob) -> LabelResult<RgbImage> {
        self.compositor.render_label(&job.variant, &job.identifier)
    }

    pub fn write_label(&self, collection: &str, job: &LabelJob, raster: &RgbImage) -> LabelResult<Vec<WrittenFile>> {
        self.writer
            .write_label(collection, &job.variant.product_name, &job.sku(), raster)
    }

    /// Generate and write every label of a collection.
    ///
    /// CRITICAL: This ALWAYS validates first. With `FailurePolicy::Abort` the
    /// first failing variant ends the run; labels already written stay.
    pub fn generate_collection(&self, request: &CollectionRequest) -> LabelResult<GenerationReport> {
        let span = info_span!("collection", collection = %request.collection);
        let _enter = span.enter();

        let validation = self.validate_request(request);
        if !validation.valid {
            return Err(LabelError::InvalidInput(validation.error_summary()));
        }

        let jobs = self.plan_validated(request)?;
        info!(labels = jobs.len(), prefix = %self.config.prefix, "generating labels");

        let mut labels = Vec::with_capacity(jobs.len());
        let mut failures = vec![];
        for job in jobs {
            let sku = job.sku();
            let result = self
                .render_label(&job)
                .and_then(|raster| self.write_label(&request.collection, &job, &raster));
            match result {
                Ok(files) => {
                    info!(sku = %sku, identifier = %job.identifier, "label generated");
                    labels.push(LabelRecord {
                        sku,
                        identifier: job.identifier,
                        variant: job.variant,
                        files,
                    });
                }
                Err(e) => match self.config.failure_policy {
                    FailurePolicy::Abort => return Err(e),
                    FailurePolicy::Skip => {
                        warn!(sku = %sku, error = %e, "label skipped");
                        failures.push(LabelFailure {
                            sku,
                            identifier: job.identifier,
                            error: e.to_string(),
                        });
                    }
                },
            }
        }

        Ok(GenerationReport {
            run_id: Uuid::new_v4().to_string(),
            collection: request.collection.clone(),
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
            request_hash: compute_request_hash(request, &self.config, ENGINE_VERSION)?,
            validation,
            labels,
            failures,
        })
    }
}

/// Generate a full collection with `config`, returning the written paths.
pub fn generate_collection(config: GeneratorConfig, request: &CollectionRequest) -> LabelResult<Vec<PathBuf>> {
    let pipeline = LabelPipeline::new(config)?;
    Ok(pipeline.generate_collection(request)?.written_paths())
}
