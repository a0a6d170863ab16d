//! Line item extraction: segmentation, table normalization, cleaning and the
//! orchestrator that runs them over one document.

pub mod cleaner;
mod pipeline;
pub mod rules;
pub mod segmenter;
pub mod table;

pub use cleaner::{Cleaned, NOTES_SEPARATOR, RecordCleaner, dedup};
pub use pipeline::Extractor;
pub use rules::{FieldExtractor, ManufacturerMatch, ManufacturerProfile, PatternLibrary};
pub use segmenter::{LineSegmenter, TextLine};
pub use table::{ColumnMap, TableGrid, TableNormalizer};

use serde::{Deserialize, Serialize};

use crate::models::diagnostic::Diagnostic;
use crate::models::line_item::{LineItem, LineItemRecord};

/// Raw accumulators produced by the segmenter or the table normalizer.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    pub items: Vec<LineItem>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Candidates {
    /// Append `other` after the items already held.
    pub fn extend(&mut self, other: Candidates) {
        self.items.extend(other.items);
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Why a document produced no records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoRecordsReason {
    /// No text or tables, even after the OCR fallback.
    NoExtractableText,
    /// Text was found but no line item was recognized in it.
    NoLineItemsRecognized,
}

/// Outcome of one extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum ExtractionStatus {
    RecordsFound,
    NoRecords(NoRecordsReason),
}

impl ExtractionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionStatus::RecordsFound)
    }
}

impl std::fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionStatus::RecordsFound => write!(f, "records found"),
            ExtractionStatus::NoRecords(NoRecordsReason::NoExtractableText) => {
                write!(f, "no records: no extractable text")
            }
            ExtractionStatus::NoRecords(NoRecordsReason::NoLineItemsRecognized) => {
                write!(f, "no records: no line items recognized")
            }
        }
    }
}

/// Result of extracting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Final records in output order.
    pub records: Vec<LineItemRecord>,
    /// Absorbed problems, in the order they occurred.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether the text came from the OCR fallback.
    pub degraded: bool,
    pub status: ExtractionStatus,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::line_item::Source;

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ExtractionStatus::NoRecords(
            NoRecordsReason::NoExtractableText,
        ))
        .unwrap();
        assert_eq!(json, r#"{"status":"no_records","reason":"no_extractable_text"}"#);

        let json = serde_json::to_string(&ExtractionStatus::RecordsFound).unwrap();
        assert_eq!(json, r#"{"status":"records_found"}"#);
    }

    #[test]
    fn test_candidates_extend_keeps_order() {
        let mut first = Candidates::default();
        first.items.push(LineItem::with_identifier(Source::Table, "A-1"));

        let mut second = Candidates::default();
        second.items.push(LineItem::with_identifier(Source::Text, "B-2"));

        first.extend(second);
        let ids: Vec<_> = first
            .items
            .iter()
            .filter_map(|i| i.manufacturer_number.as_deref())
            .collect();
        assert_eq!(ids, vec!["A-1", "B-2"]);
    }
}
