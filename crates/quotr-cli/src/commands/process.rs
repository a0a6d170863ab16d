//! Process command - extract line items from a single document.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info};

use quotr_core::models::config::OcrEngineKind;
use quotr_core::{
    Diagnostic, ExtractionResult, ExtractionStatus, Extractor, LineItemRecord, OUTPUT_COLUMNS,
    QuotrConfig,
};

use super::config::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, image or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    ocr: OcrArgs,

    /// Print diagnostics to stderr
    #[arg(long)]
    show_diagnostics: bool,
}

/// OCR overrides shared by `process` and `batch`.
#[derive(Args, Clone)]
pub struct OcrArgs {
    /// OCR engine for documents without a text layer
    #[arg(long, value_enum)]
    ocr: Option<OcrChoice>,

    /// Model directory for the onnx engine
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

impl OcrArgs {
    /// Apply the overrides to `config`.
    pub fn apply(&self, config: &mut QuotrConfig) {
        if let Some(choice) = self.ocr {
            config.ocr.engine = match choice {
                OcrChoice::Tesseract => OcrEngineKind::Tesseract,
                OcrChoice::Onnx => OcrEngineKind::Onnx,
                OcrChoice::None => OcrEngineKind::None,
            };
        }
        if let Some(dir) = &self.model_dir {
            config.ocr.model_dir = dir.clone();
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OcrChoice {
    /// tesseract command line tool
    Tesseract,
    /// PaddleOCR ONNX models
    Onnx,
    /// Never run OCR
    None,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON report with records and diagnostics
    Json,
    /// CSV with one row per line item
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// JSON output document.
#[derive(Serialize)]
struct Report<'a> {
    source: String,
    extracted_at: DateTime<Utc>,
    status: ExtractionStatus,
    degraded: bool,
    processing_time_ms: u64,
    records: &'a [LineItemRecord],
    diagnostics: &'a [Diagnostic],
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.ocr.apply(&mut config);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Extracting {}", args.input.display()));

    let extractor = Extractor::new(config)?;
    let result = extractor.process_file(&args.input);
    pb.finish_and_clear();
    let result = result?;

    let output = format_result(&args.input, &result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} {} records written to {}",
            style("✓").green(),
            result.records.len(),
            output_path.display()
        );
    } else {
        print!("{}", output);
    }

    report_status(&result);
    if args.show_diagnostics {
        print_diagnostics(&result.diagnostics);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Notices on stderr for degraded or empty results.
fn report_status(result: &ExtractionResult) {
    if result.degraded {
        eprintln!(
            "{} No usable text layer; results come from OCR",
            style("ℹ").blue()
        );
    }
    if let ExtractionStatus::NoRecords(_) = result.status {
        eprintln!("{} {}", style("⚠").yellow(), result.status);
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    eprintln!();
    eprintln!("{}", style("Diagnostics:").yellow());
    for d in diagnostics {
        let mut location = Vec::new();
        if let Some(page) = d.page {
            location.push(format!("page {page}"));
        }
        if let Some(table) = d.table {
            location.push(format!("table {table}"));
        }
        if let Some(row) = d.row {
            location.push(format!("row {row}"));
        }
        let location = if location.is_empty() {
            String::new()
        } else {
            format!(" ({})", location.join(", "))
        };
        eprintln!("  - {:?}{}: {}", d.code, location, d.message);
    }
}

/// Render one extraction in `format`.
pub fn format_result(
    source: &Path,
    result: &ExtractionResult,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let report = Report {
                source: source.display().to_string(),
                extracted_at: Utc::now(),
                status: result.status,
                degraded: result.degraded,
                processing_time_ms: result.processing_time_ms,
                records: &result.records,
                diagnostics: &result.diagnostics,
            };
            Ok(format!("{}\n", serde_json::to_string_pretty(&report)?))
        }
        OutputFormat::Csv => format_csv(&result.records),
        OutputFormat::Text => Ok(format_text(source, result)),
    }
}

fn format_csv(records: &[LineItemRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(OUTPUT_COLUMNS.iter().map(|f| f.header()))?;
    for record in records {
        wtr.write_record(record.cells())?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(source: &Path, result: &ExtractionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Document: {}\n", source.display()));
    output.push_str(&format!("Status: {}\n", result.status));
    if result.degraded {
        output.push_str("Source: OCR fallback\n");
    }
    output.push_str(&format!("Records: {}\n", result.records.len()));

    for (idx, record) in result.records.iter().enumerate() {
        output.push('\n');
        output.push_str(&format!("#{} {}\n", idx + 1, record.manufacturer_number));
        for (field, cell) in OUTPUT_COLUMNS.iter().zip(record.cells()).skip(1) {
            if !cell.is_empty() {
                output.push_str(&format!("  {:<12} {}\n", format!("{}:", field.header()), cell));
            }
        }
    }

    output
}
