//! Error types for the label engine

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelError {
    /// Caller supplied an unusable collection request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The identifier body space could not yield another unused code
    #[error("Identifier capacity exhausted: {generated} of {requested} generated after {attempts} attempts")]
    Capacity {
        requested: usize,
        generated: usize,
        attempts: u32,
    },

    #[error("Invalid EAN-13 identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Barcode rendering failed: {0}")]
    Barcode(String),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Config requires engine >= {0}, current is {1}")]
    EngineVersionMismatch(String, String),

    /// Variant and identifier lists were not index-aligned
    #[error("Job mismatch: {variants} variants but {identifiers} identifiers")]
    JobMismatch { variants: usize, identifiers: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PNG encoding error: {0}")]
    PngEncoding(#[from] png::EncodingError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type LabelResult<T> = Result<T, LabelError>;
