//! Extraction orchestrator.

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::{
    Candidates, ExtractionResult, ExtractionStatus, LineSegmenter, NoRecordsReason, RecordCleaner,
    TableGrid, TableNormalizer, TextLine,
};
use crate::error::Result;
use crate::extract::rules::sanitize::clean_part_number;
use crate::extract::rules::{PatternLibrary, split_lines};
use crate::models::config::{QuotrConfig, SourcePrecedence};
use crate::models::diagnostic::{Diagnostic, DiagnosticCode};
use crate::models::line_item::LineItem;
use crate::ocr::{OcrProvider, create_provider};
use crate::source::{PageProvider, TextDocument, detect_tables, open_document};

/// Runs the whole extraction for one document at a time.
///
/// Holds only immutable configuration and compiled patterns; documents share
/// no state.
pub struct Extractor {
    config: QuotrConfig,
    library: PatternLibrary,
}

impl Extractor {
    /// Validate `config` and compile its patterns.
    pub fn new(config: QuotrConfig) -> Result<Self> {
        config.validate()?;
        let library = PatternLibrary::from_config(&config.patterns)?;
        info!(
            "Extractor ready: {} profiles, {} detectors, {} header rules",
            library.profiles().len(),
            library.detectors().len(),
            library.header_rules().len()
        );
        Ok(Self { config, library })
    }

    pub fn config(&self) -> &QuotrConfig {
        &self.config
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    /// Open `path` and extract it with the configured OCR provider.
    ///
    /// Fails only when the document cannot be opened.
    pub fn process_file(&self, path: &Path) -> Result<ExtractionResult> {
        info!("Processing {}", path.display());
        let provider = open_document(path, &self.config.pdf)?;
        let ocr = create_provider(&self.config.ocr);
        Ok(self.extract(provider.as_ref(), ocr.as_ref()))
    }

    /// Extract in-memory text. Form feeds separate pages.
    ///
    /// There is nothing to recognize, so blank text is never degraded.
    pub fn extract_text(&self, text: &str) -> ExtractionResult {
        let pdf = &self.config.pdf;
        let document = TextDocument::from_text(text)
            .with_table_detection(pdf.detect_tables.then_some(pdf.min_table_cols));
        self.run(&document, None)
    }

    /// Extract line items from an opened document, running `ocr` when it
    /// yields no usable text or tables.
    pub fn extract(&self, provider: &dyn PageProvider, ocr: &dyn OcrProvider) -> ExtractionResult {
        self.run(provider, Some(ocr))
    }

    fn run(&self, provider: &dyn PageProvider, ocr: Option<&dyn OcrProvider>) -> ExtractionResult {
        let start = Instant::now();
        let mut diagnostics = Vec::new();

        let pages = provider.pages();
        debug!("{} provider returned {} pages", provider.kind(), pages.len());

        let mut lines = Vec::new();
        let mut tables = Vec::new();
        let mut text_chars = 0;
        for page in pages {
            if let Some(reason) = &page.unreadable {
                diagnostics.push(
                    Diagnostic::new(DiagnosticCode::PageUnreadable, reason.clone())
                        .with_page(Some(page.number)),
                );
            }
            text_chars += page.text_chars();
            lines.extend(
                page.lines
                    .into_iter()
                    .map(|line| TextLine::new(line, Some(page.number))),
            );
            tables.extend(page.tables);
        }

        let mut degraded = false;
        let usable_text = text_chars > 0 && text_chars >= self.config.ocr.min_text_chars;
        let fallback = ocr.filter(|_| !usable_text && !tables.iter().any(TableGrid::has_data));
        if let Some(ocr) = fallback {
            degraded = true;
            let (ocr_lines, ocr_tables) = self.ocr_fallback(provider, ocr, &mut diagnostics);
            if !ocr_lines.is_empty() || !ocr_tables.is_empty() {
                lines = ocr_lines;
                tables = ocr_tables;
            }
        }

        let has_input = lines.iter().any(|l| !l.text.trim().is_empty())
            || tables.iter().any(TableGrid::has_data);

        let extraction = &self.config.extraction;
        let text = LineSegmenter::from_config(&self.library, extraction).segment(&lines);
        let table = TableNormalizer::from_config(&self.library, extraction).normalize(&tables);
        debug!(
            "Candidates: {} from tables, {} from text",
            table.items.len(),
            text.items.len()
        );

        let candidates = choose(extraction.precedence, table, text);
        diagnostics.extend(candidates.diagnostics);

        let cleaned = RecordCleaner::from_config(&self.library, extraction).clean(candidates.items);
        diagnostics.extend(cleaned.diagnostics);
        let records = cleaned.records;

        let status = if !records.is_empty() {
            ExtractionStatus::RecordsFound
        } else if has_input {
            ExtractionStatus::NoRecords(NoRecordsReason::NoLineItemsRecognized)
        } else {
            ExtractionStatus::NoRecords(NoRecordsReason::NoExtractableText)
        };

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "Extracted {} records ({}, degraded: {}, {} diagnostics) in {}ms",
            records.len(),
            status,
            degraded,
            diagnostics.len(),
            processing_time_ms
        );

        ExtractionResult {
            records,
            diagnostics,
            degraded,
            status,
            processing_time_ms,
        }
    }

    /// Run OCR once over every page image. Failures come back as an empty
    /// line sequence plus a diagnostic.
    fn ocr_fallback(
        &self,
        provider: &dyn PageProvider,
        ocr: &dyn OcrProvider,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (Vec<TextLine>, Vec<TableGrid>) {
        info!("No usable text in {} document, falling back to {} OCR", provider.kind(), ocr.name());
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::OcrFallback,
            format!("no usable text layer; ran {} OCR", ocr.name()),
        ));

        let text = match provider.page_images().and_then(|images| ocr.recognize(&images)) {
            Ok(text) => text,
            Err(e) => {
                warn!("OCR failed: {}", e);
                diagnostics.push(Diagnostic::new(DiagnosticCode::OcrFailed, e.to_string()));
                return (Vec::new(), Vec::new());
            }
        };

        let lines: Vec<TextLine> = split_lines(&text)
            .into_iter()
            .map(|line| TextLine::new(line, None))
            .collect();
        if lines.is_empty() {
            diagnostics.push(Diagnostic::new(
                DiagnosticCode::OcrEmpty,
                format!("{} OCR returned no text", ocr.name()),
            ));
            return (Vec::new(), Vec::new());
        }

        let pdf = &self.config.pdf;
        let tables = if pdf.detect_tables {
            detect_tables(text.lines(), pdf.min_table_cols, None)
        } else {
            Vec::new()
        };
        debug!("OCR produced {} lines and {} tables", lines.len(), tables.len());
        (lines, tables)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            config: QuotrConfig::default(),
            library: PatternLibrary::builtin(),
        }
    }
}

/// Pick the candidates that survive into cleaning.
///
/// Under the two ordered precedences every primary item is kept, and a
/// secondary item is added unless a primary item on the same page already
/// carries its identifier.
fn choose(precedence: SourcePrecedence, table: Candidates, text: Candidates) -> Candidates {
    let mut diagnostics = table.diagnostics;
    diagnostics.extend(text.diagnostics);

    let (primary, secondary, label) = match precedence {
        SourcePrecedence::TablesThenText => (table.items, text.items, "text"),
        SourcePrecedence::TextThenTables => (text.items, table.items, "table"),
        SourcePrecedence::Merge => {
            let mut items = table.items;
            items.extend(text.items);
            return Candidates { items, diagnostics };
        }
    };

    let covered: HashSet<(String, Option<u32>)> = primary.iter().filter_map(coverage_key).collect();
    let mut items = primary;
    let mut superseded = 0;
    for item in secondary {
        match coverage_key(&item) {
            Some(key) if covered.contains(&key) => superseded += 1,
            _ => items.push(item),
        }
    }

    if superseded > 0 {
        debug!("{} {} candidates already covered", superseded, label);
        diagnostics.push(Diagnostic::new(
            DiagnosticCode::CandidatesSuperseded,
            format!("{superseded} {label} candidates repeated an identifier already found"),
        ));
    }

    Candidates { items, diagnostics }
}

fn coverage_key(item: &LineItem) -> Option<(String, Option<u32>)> {
    let id = clean_part_number(item.manufacturer_number.as_deref()?);
    (!id.is_empty()).then_some((id, item.page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use image::DynamicImage;
    use pretty_assertions::assert_eq;

    use crate::error::{ConfigError, OcrError, QuotrError};
    use crate::models::line_item::Source;
    use crate::source::PageContent;

    struct FakePages(Vec<PageContent>);

    impl PageProvider for FakePages {
        fn kind(&self) -> &'static str {
            "fake"
        }

        fn pages(&self) -> Vec<PageContent> {
            self.0.clone()
        }

        fn page_images(&self) -> std::result::Result<Vec<DynamicImage>, OcrError> {
            Ok(vec![DynamicImage::new_rgb8(4, 4)])
        }
    }

    struct CountingOcr {
        text: Option<&'static str>,
        calls: Cell<usize>,
    }

    impl CountingOcr {
        fn returning(text: Option<&'static str>) -> Self {
            Self {
                text,
                calls: Cell::new(0),
            }
        }
    }

    impl OcrProvider for CountingOcr {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn recognize(&self, _images: &[DynamicImage]) -> std::result::Result<String, OcrError> {
            self.calls.set(self.calls.get() + 1);
            self.text
                .map(str::to_string)
                .ok_or_else(|| OcrError::Unavailable("not installed".to_string()))
        }
    }

    fn blank_pages() -> FakePages {
        FakePages(vec![PageContent::from_text(1, "   \n\n", None)])
    }

    fn codes(result: &ExtractionResult) -> Vec<DiagnosticCode> {
        result.diagnostics.iter().map(|d| d.code).collect()
    }

    #[test]
    fn test_text_layer_skips_ocr() {
        let pages = FakePages(vec![PageContent::from_text(1, "MFG: ABC-123\nQty: 5", None)]);
        let ocr = CountingOcr::returning(Some("MFG: XYZ-999"));
        let result = Extractor::default().extract(&pages, &ocr);

        assert_eq!(ocr.calls.get(), 0);
        assert!(!result.degraded);
        assert_eq!(result.status, ExtractionStatus::RecordsFound);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].manufacturer_number, "ABC-123");
        assert_eq!(result.records[0].page, Some(1));
    }

    #[test]
    fn test_blank_text_runs_ocr_once() {
        let ocr = CountingOcr::returning(Some("MFG: ABC-123 Qty: 5\nMFG: XYZ-999 Qty: 2"));
        let result = Extractor::default().extract(&blank_pages(), &ocr);

        assert_eq!(ocr.calls.get(), 1);
        assert!(result.degraded);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[1].quantity, Some(2));
        assert_eq!(codes(&result), vec![DiagnosticCode::OcrFallback]);
    }

    #[test]
    fn test_empty_ocr_is_an_empty_result() {
        let ocr = CountingOcr::returning(Some("  \n"));
        let result = Extractor::default().extract(&blank_pages(), &ocr);

        assert_eq!(ocr.calls.get(), 1);
        assert!(result.records.is_empty());
        assert!(result.degraded);
        assert_eq!(
            result.status,
            ExtractionStatus::NoRecords(NoRecordsReason::NoExtractableText)
        );
        assert_eq!(
            codes(&result),
            vec![DiagnosticCode::OcrFallback, DiagnosticCode::OcrEmpty]
        );
    }

    #[test]
    fn test_ocr_failure_degrades_to_empty() {
        let ocr = CountingOcr::returning(None);
        let result = Extractor::default().extract(&blank_pages(), &ocr);

        assert_eq!(ocr.calls.get(), 1);
        assert!(result.records.is_empty());
        assert_eq!(
            codes(&result),
            vec![DiagnosticCode::OcrFallback, DiagnosticCode::OcrFailed]
        );
    }

    #[test]
    fn test_tables_count_as_usable_input() {
        let grid = TableGrid::from_cells(
            Some(1),
            vec![vec!["Part #", "Description", "Qty"], vec!["ABC-123", "Widget", "2"]],
        );
        let pages = FakePages(vec![PageContent {
            number: 1,
            tables: vec![grid],
            ..PageContent::default()
        }]);
        let ocr = CountingOcr::returning(Some("MFG: XYZ-999"));
        let result = Extractor::default().extract(&pages, &ocr);

        assert_eq!(ocr.calls.get(), 0);
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].source, Source::Table);
    }

    #[test]
    fn test_unrecognized_text_reason() {
        let result = Extractor::default().extract_text("Thank you for your business.");
        assert!(result.records.is_empty());
        assert!(!result.degraded);
        assert_eq!(
            result.status,
            ExtractionStatus::NoRecords(NoRecordsReason::NoLineItemsRecognized)
        );
    }

    #[test]
    fn test_unreadable_page_is_reported() {
        let pages = FakePages(vec![
            PageContent::unreadable(1, "bad content stream"),
            PageContent::from_text(2, "MFG: ABC-123", None),
        ]);
        let ocr = CountingOcr::returning(None);
        let result = Extractor::default().extract(&pages, &ocr);

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::PageUnreadable);
        assert_eq!(result.diagnostics[0].page, Some(1));
    }

    fn candidates(source: Source, ids: &[&str]) -> Candidates {
        Candidates {
            items: ids
                .iter()
                .map(|id| LineItem::with_identifier(source, *id))
                .collect(),
            diagnostics: Vec::new(),
        }
    }

    fn ids(c: &Candidates) -> Vec<String> {
        c.items
            .iter()
            .filter_map(|i| i.manufacturer_number.clone())
            .collect()
    }

    #[test]
    fn test_precedence() {
        let table = candidates(Source::Table, &["T-1"]);
        let text = candidates(Source::Text, &["X-1"]);

        assert_eq!(
            ids(&choose(SourcePrecedence::TablesThenText, table.clone(), text.clone())),
            vec!["T-1", "X-1"]
        );
        assert_eq!(
            ids(&choose(SourcePrecedence::TextThenTables, table.clone(), text.clone())),
            vec!["X-1", "T-1"]
        );
        assert_eq!(
            ids(&choose(SourcePrecedence::Merge, table.clone(), text.clone())),
            vec!["T-1", "X-1"]
        );
        assert_eq!(
            ids(&choose(SourcePrecedence::TablesThenText, Candidates::default(), text)),
            vec!["X-1"]
        );
    }

    #[test]
    fn test_secondary_keeps_items_the_primary_missed() {
        let table = candidates(Source::Table, &["ABC-123"]);
        let text = candidates(Source::Text, &["abc-123", "LMN-555"]);

        let chosen = choose(SourcePrecedence::TablesThenText, table, text);

        assert_eq!(ids(&chosen), vec!["ABC-123", "LMN-555"]);
        assert_eq!(chosen.items[1].source, Source::Text);
        assert_eq!(chosen.diagnostics.len(), 1);
        assert_eq!(chosen.diagnostics[0].code, DiagnosticCode::CandidatesSuperseded);
    }

    #[test]
    fn test_same_identifier_on_another_page_is_kept() {
        let mut table = candidates(Source::Table, &["ABC-123"]);
        table.items[0].page = Some(1);
        let mut text = candidates(Source::Text, &["ABC-123"]);
        text.items[0].page = Some(2);

        let chosen = choose(SourcePrecedence::TablesThenText, table, text);

        assert_eq!(chosen.items.len(), 2);
        assert!(chosen.diagnostics.is_empty());
    }

    #[test]
    fn test_text_outside_the_table_survives_extraction() {
        let text = "Part #  Description  Qty\n\
                    ABC-123  Widget  2\n\
                    XYZ-999  Gadget  1\n\
                    \n\
                    Also included: MFG: LMN-555 Qty: 3\n";
        let result = Extractor::default().extract_text(text);

        let found: Vec<&str> = result
            .records
            .iter()
            .map(|r| r.manufacturer_number.as_str())
            .collect();
        assert_eq!(found, vec!["ABC-123", "XYZ-999", "LMN-555"]);
        assert_eq!(result.records[0].source, Source::Table);
        assert_eq!(result.records[2].source, Source::Text);
        assert_eq!(result.records[2].quantity, Some(3));
    }

    #[test]
    fn test_blank_text_is_not_degraded() {
        let result = Extractor::default().extract_text("   \n\n");

        assert!(!result.degraded);
        assert!(result.diagnostics.is_empty());
        assert_eq!(
            result.status,
            ExtractionStatus::NoRecords(NoRecordsReason::NoExtractableText)
        );
    }

    #[test]
    fn test_invalid_pattern_is_a_config_error() {
        let mut config = QuotrConfig::default();
        config.patterns.profiles[0].patterns.push("([unclosed".to_string());
        assert!(matches!(
            Extractor::new(config),
            Err(QuotrError::Config(ConfigError::InvalidPattern { .. }))
        ));
    }
}
