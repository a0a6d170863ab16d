//! Structured diagnostics for absorbed, non-fatal extraction problems.

use serde::{Deserialize, Serialize};

/// Kind of absorbed problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// Text before the first identifier was not attached to any item.
    PreambleDiscarded,
    /// A table row was padded or truncated to the header width.
    RaggedRow,
    /// A table had no identifiable manufacturer/description column.
    TableSkipped,
    /// A table cell did not fit its column and was kept as a note.
    CellTypeMismatch,
    /// Candidates from the secondary source repeated a primary one.
    CandidatesSuperseded,
    /// A table row without an identifier was dropped.
    RowDropped,
    /// A table row without an identifier was merged into the previous row.
    ContinuationMerged,
    /// A record lost its identifier during sanitization.
    RecordDropped,
    /// A quantity value could not be coerced.
    InvalidQuantity,
    /// A money value could not be coerced.
    InvalidPrice,
    /// A discount value could not be coerced or was out of range.
    InvalidDiscount,
    /// Exact duplicate records were collapsed.
    DuplicatesRemoved,
    /// A page could not be read by the primary provider.
    PageUnreadable,
    /// The primary provider produced no usable text; OCR was invoked.
    OcrFallback,
    /// The OCR provider failed.
    OcrFailed,
    /// The OCR provider returned no text.
    OcrEmpty,
}

/// A diagnostic recorded while extracting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
            table: None,
            row: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: Option<u32>) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn with_table(mut self, table: usize) -> Self {
        self.table = Some(table);
        self
    }

    #[must_use]
    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }
}
