use std::str::FromStr;

use pretty_assertions::assert_eq;
use quotr_core::extract::cleaner::dedup;
use quotr_core::models::config::{QuantityDefault, SourcePrecedence};
use quotr_core::{
    DiagnosticCode, ExtractionStatus, Extractor, LineItemRecord, OUTPUT_COLUMNS, PatternLibrary,
    QuotrConfig, RecordCleaner, TableGrid, TableNormalizer,
};
use rust_decimal::Decimal;

fn numbers_and_quantities(records: &[LineItemRecord]) -> Vec<(String, Option<u32>)> {
    records
        .iter()
        .map(|r| (r.manufacturer_number.clone(), r.quantity))
        .collect()
}

#[test]
fn new_identifier_closes_previous_record() {
    let result = Extractor::default().extract_text("MFG: ABC-123\nQty: 5\nMFG: XYZ-999\nQty: 2\n");

    assert_eq!(result.status, ExtractionStatus::RecordsFound);
    assert_eq!(
        numbers_and_quantities(&result.records),
        vec![("ABC-123".to_string(), Some(5)), ("XYZ-999".to_string(), Some(2))]
    );
}

#[test]
fn same_part_with_different_quantity_is_kept() {
    let text = "MFG: ABC-123 Qty: 1\nMFG: ABC-123 Qty: 4\nMFG: ABC-123 Qty: 4\n";
    let result = Extractor::default().extract_text(text);

    assert_eq!(
        numbers_and_quantities(&result.records),
        vec![("ABC-123".to_string(), Some(1)), ("ABC-123".to_string(), Some(4))]
    );
    assert!(
        result
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::DuplicatesRemoved)
    );
}

#[test]
fn price_text_becomes_a_decimal() {
    let result = Extractor::default().extract_text("MFG: ABC-123 Unit Price: $1,234.56");

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].unit_price, Some(Decimal::from_str("1234.56").unwrap()));
    assert_eq!(result.records[0].net_price, None);
}

#[test]
fn ragged_row_still_produces_a_record() {
    let library = PatternLibrary::builtin();
    let table = TableGrid::from_cells(
        Some(1),
        vec![
            vec!["Part #", "Description", "Qty", "Unit Price", "Net Price"],
            vec!["ABC-123", "Rack kit", "3"],
        ],
    );

    let candidates = TableNormalizer::new(&library).normalize([&table]);
    let cleaned = RecordCleaner::new(&library).clean(candidates.items);

    assert_eq!(cleaned.records.len(), 1);
    let record = &cleaned.records[0];
    assert_eq!(record.manufacturer_number, "ABC-123");
    assert_eq!(record.description, "Rack kit");
    assert_eq!(record.quantity, Some(3));
    assert_eq!(record.unit_price, None);
    assert!(
        candidates
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::RaggedRow)
    );
}

#[test]
fn cleaning_twice_changes_nothing() {
    let library = PatternLibrary::builtin();
    let text = "\
MFG: ABC-123 Rack kit Qty: 2 List Price: $120.00 Discount: 25% Net: $90.00
Notes: ships in 2 weeks
MFG: XYZ-999
Qty: 1
";
    let result = Extractor::default().extract_text(text);
    assert_eq!(result.records.len(), 2);

    let cleaner = RecordCleaner::new(&library);
    let again = cleaner.clean_records(&result.records);
    assert_eq!(again, result.records);
    assert_eq!(dedup(again.clone()), again);
}

#[test]
fn quantity_default_is_configurable() {
    let mut config = QuotrConfig::default();
    config.extraction.quantity_default = QuantityDefault::One;
    let extractor = Extractor::new(config).unwrap();

    let result = extractor.extract_text("MFG: ABC-123 Rack kit");
    assert_eq!(result.records[0].quantity, Some(1));

    let result = Extractor::default().extract_text("MFG: ABC-123 Rack kit");
    assert_eq!(result.records[0].quantity, None);
}

#[test]
fn table_and_text_precedence() {
    let text = "\
Part #  Description  Qty
ABC-123  Rack kit  2
XYZ-999  Fan tray  1

MFG: LMN-555 Qty: 9
";
    let tables_first = Extractor::default().extract_text(text);
    let numbers: Vec<&str> = tables_first
        .records
        .iter()
        .map(|r| r.manufacturer_number.as_str())
        .collect();
    assert_eq!(numbers, vec!["ABC-123", "XYZ-999", "LMN-555"]);
    assert_eq!(tables_first.records[2].quantity, Some(9));
    assert!(
        tables_first
            .diagnostics
            .iter()
            .any(|d| d.code == DiagnosticCode::CandidatesSuperseded)
    );

    let mut config = QuotrConfig::default();
    config.extraction.precedence = SourcePrecedence::Merge;
    let merged = Extractor::new(config).unwrap().extract_text(text);
    assert!(
        merged
            .records
            .iter()
            .any(|r| r.manufacturer_number == "LMN-555")
    );
    assert_eq!(merged.records[0].manufacturer_number, "ABC-123");
}

#[test]
fn cells_follow_output_columns() {
    let result = Extractor::default().extract_text("MFG: ABC-123 Rack kit Qty: 2 Unit Price: $10.50");
    let cells = result.records[0].cells();

    assert_eq!(cells.len(), OUTPUT_COLUMNS.len());
    assert_eq!(cells[0], "ABC-123");
    assert_eq!(cells[1], "Rack kit");
    assert_eq!(cells[2], "2");
    assert_eq!(cells[3], "10.50");
    assert_eq!(cells[9], "");
}
