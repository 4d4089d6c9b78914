//! SKU Label Engine - printable EAN-13 labels for garment collections
//!
//! # Guarantees
//! 1. Identifiers are unique within a run and always carry a valid check digit
//! 2. Variants follow product → size → color order, one per enabled combination
//! 3. Every label has the same canvas and layout
//! 4. Output paths derive only from collection, product and SKU
//! 5. Nothing is rendered for a request that fails validation

pub mod error;
pub mod ean;
pub mod catalog;
pub mod print;
pub mod font;
pub mod raster;
pub mod layout;
pub mod barcode;
pub mod compose;
pub mod export;
pub mod hashing;
pub mod output;
pub mod config;
pub mod validation;
pub mod pipeline;

pub use error::{LabelError, LabelResult};
pub use ean::{check_digit, generate_identifiers, Ean13, IdentifierGenerator};
pub use catalog::{enumerate_variants, CollectionRequest, ColorSelection, LabelJob, Product, SizeSelection, Variant};
pub use print::{ColorSpace, PrintAuthority, PrintSpec};
pub use font::{resolve_font, FontHandle, LabelFonts};
pub use layout::{LabelGeometry, Rect};
pub use barcode::{BarcodeOptions, BarcodeRasterizer, Ean13Rasterizer};
pub use compose::LabelCompositor;
pub use export::ExportFormat;
pub use hashing::{canonical_json, compute_request_hash, sha256_hex};
pub use output::{LabelWriter, WrittenFile};
pub use config::{FailurePolicy, GeneratorConfig};
pub use validation::{ValidationResult, ValidationRule, ValidationViolation, ViolationSeverity};
pub use pipeline::{generate_collection, GenerationReport, LabelPipeline};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const MIN_CONFIG_ENGINE_VERSION: &str = "1.0.0";
