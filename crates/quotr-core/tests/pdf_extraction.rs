mod common;

use std::str::FromStr;

use quotr_core::models::config::OcrEngineKind;
use quotr_core::{
    DiagnosticCode, DocumentError, ExtractionStatus, Extractor, NoRecordsReason, QuotrConfig, QuotrError,
};
use rust_decimal::Decimal;
use tempfile::tempdir;

fn extractor_without_ocr() -> Extractor {
    let mut config = QuotrConfig::default();
    config.ocr.engine = OcrEngineKind::None;
    Extractor::new(config).expect("default config should compile")
}

#[test]
fn extracts_line_items_from_pdf_text() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("quote.pdf");

    common::write_quote_pdf(
        &input,
        &[vec![
            "Quotation Q-1001",
            "Mfr Part  Description  Qty  Unit Price",
            "ABC-123  Rack mount kit  2  $10.00",
            "XYZ-999  Fan tray  1  $5.50",
        ]],
    )
    .expect("PDF fixture should be created");

    let result = extractor_without_ocr()
        .process_file(&input)
        .expect("extraction should succeed");

    assert_eq!(result.status, ExtractionStatus::RecordsFound, "{result:?}");
    assert!(!result.degraded);

    let numbers: Vec<&str> = result
        .records
        .iter()
        .map(|r| r.manufacturer_number.as_str())
        .collect();
    assert!(numbers.contains(&"ABC-123"), "unexpected records: {result:?}");
    assert!(numbers.contains(&"XYZ-999"), "unexpected records: {result:?}");

    let fan = result
        .records
        .iter()
        .find(|r| r.manufacturer_number == "XYZ-999")
        .expect("XYZ-999 should be extracted");
    assert_eq!(fan.unit_price, Some(Decimal::from_str("5.50").unwrap()));
    assert_eq!(fan.page, Some(1));
}

#[test]
fn records_keep_their_page() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("two-pages.pdf");

    common::write_quote_pdf(
        &input,
        &[vec!["MFG: ABC-123", "Qty: 5"], vec!["MFG: XYZ-999", "Qty: 2"]],
    )
    .expect("PDF fixture should be created");

    let result = extractor_without_ocr()
        .process_file(&input)
        .expect("extraction should succeed");

    let pages: Vec<(String, Option<u32>, Option<u32>)> = result
        .records
        .iter()
        .map(|r| (r.manufacturer_number.clone(), r.quantity, r.page))
        .collect();
    assert_eq!(
        pages,
        vec![
            ("ABC-123".to_string(), Some(5), Some(1)),
            ("XYZ-999".to_string(), Some(2), Some(2)),
        ]
    );
}

#[test]
fn blank_pdf_degrades_to_empty_result() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("scan.pdf");
    common::write_blank_pdf(&input).expect("PDF fixture should be created");

    let result = extractor_without_ocr()
        .process_file(&input)
        .expect("a blank PDF is not an error");

    assert!(result.records.is_empty());
    assert!(result.degraded);
    assert_eq!(
        result.status,
        ExtractionStatus::NoRecords(NoRecordsReason::NoExtractableText)
    );
    let codes: Vec<DiagnosticCode> = result.diagnostics.iter().map(|d| d.code).collect();
    assert!(codes.contains(&DiagnosticCode::OcrFallback));
    assert!(codes.contains(&DiagnosticCode::OcrFailed));
}

#[test]
fn corrupt_pdf_is_a_document_error() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("broken.pdf");
    std::fs::write(&input, b"%PDF-1.5 this is not a pdf").expect("fixture should be written");

    let err = extractor_without_ocr().process_file(&input).unwrap_err();
    assert!(matches!(err, QuotrError::Document(DocumentError::Parse(_))));
}
