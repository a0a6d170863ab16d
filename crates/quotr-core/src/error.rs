//! Error types for the quotr-core library.

use thiserror::Error;

/// Main error type for the quotr library.
///
/// OCR failures never surface here; they become diagnostics.
#[derive(Error, Debug)]
pub enum QuotrError {
    /// The document could not be opened at all.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// The extractor could not be built from its configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Fatal errors raised while opening a source document.
///
/// These are the only failures the orchestrator lets escape; everything
/// that happens after the document is open is absorbed into diagnostics.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Failed to open/parse the document.
    #[error("failed to parse document: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The document is empty or has no pages.
    #[error("document has no pages")]
    NoPages,

    /// The input format is not supported.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The OCR tool is disabled, missing or not installed.
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    Image(String),
}

/// Errors raised while loading or compiling configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configured regular expression does not compile.
    #[error("invalid pattern for {owner}: {pattern}: {source}")]
    InvalidPattern {
        owner: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Failed to read or write a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for this schema.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is semantically invalid.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for the quotr library.
pub type Result<T> = std::result::Result<T, QuotrError>;
