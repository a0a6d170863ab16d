//! Core library for quote and invoice line-item extraction.
//!
//! This crate provides:
//! - A configurable pattern library (manufacturer profiles, field detectors)
//! - A text line segmenter and a table normalizer producing raw line items
//! - A record cleaner that coerces, repairs and deduplicates line items
//! - Document providers (PDF, plain text, images) and an OCR fallback
//! - An orchestrator tying them together into one [`ExtractionResult`]

pub mod error;
pub mod extract;
pub mod models;
pub mod ocr;
pub mod source;

pub use error::{ConfigError, DocumentError, OcrError, QuotrError, Result};
pub use extract::{
    ExtractionResult, ExtractionStatus, Extractor, LineSegmenter, NoRecordsReason, PatternLibrary,
    RecordCleaner, TableGrid, TableNormalizer, TextLine,
};
pub use models::{
    Diagnostic, DiagnosticCode, Field, LineItem, LineItemRecord, OUTPUT_COLUMNS, QuotrConfig, Source,
};
pub use ocr::{NoOcr, OcrProvider, create_provider};
pub use source::{PageContent, PageProvider, open_document};
