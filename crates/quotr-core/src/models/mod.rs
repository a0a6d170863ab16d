//! Data models: line items, diagnostics and configuration.

pub mod config;
pub mod diagnostic;
pub mod line_item;

pub use config::QuotrConfig;
pub use diagnostic::{Diagnostic, DiagnosticCode};
pub use line_item::{Field, LineItem, LineItemRecord, OUTPUT_COLUMNS, Source};
