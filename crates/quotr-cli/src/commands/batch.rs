//! Batch processing command for multiple documents.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use quotr_core::source::is_supported;
use quotr_core::{ExtractionResult, ExtractionStatus, Extractor};

use super::config::load_config;
use super::process::{OcrArgs, OutputFormat, format_result};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input files (e.g. "quotes/*.pdf")
    #[arg(required = true)]
    input: String,

    /// Output directory, one file per input
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also write summary.csv
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    ocr: OcrArgs,
}

/// Outcome for one input file.
struct FileOutcome {
    path: PathBuf,
    result: Result<ExtractionResult, String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.ocr.apply(&mut config);
    let extractor = Extractor::new(config)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && is_supported(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("=>-"),
    );

    let mut outcomes = Vec::with_capacity(files.len());
    let mut written = HashSet::new();
    for path in files {
        pb.set_message(
            path.file_name()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string(),
        );
        let file_start = Instant::now();
        let result = extractor.process_file(&path);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        let result = match result {
            Ok(result) => {
                if let Some(output_dir) = &args.output_dir {
                    let name = output_name(&path, args.format.extension(), &mut written);
                    write_output(&output_dir.join(name), &path, &result, args.format)?;
                }
                Ok(result)
            }
            Err(e) if args.continue_on_error => {
                warn!("Failed to process {}: {}", path.display(), e);
                Err(e.to_string())
            }
            Err(e) => {
                pb.abandon();
                error!("Failed to process {}: {}", path.display(), e);
                anyhow::bail!("Processing {} failed: {}", path.display(), e);
            }
        };

        outcomes.push(FileOutcome {
            path,
            result,
            processing_time_ms,
        });
        pb.inc(1);
    }

    pb.finish_with_message("complete");

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &outcomes)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = outcomes.iter().filter(|o| o.result.is_err()).collect();
    let empty = outcomes
        .iter()
        .filter(|o| matches!(&o.result, Ok(r) if !r.status.is_success()))
        .count();
    let records: usize = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok())
        .map(|r| r.records.len())
        .sum();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} records, {} files without records, {} failed",
        style(records).green(),
        style(empty).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            if let Err(e) = &outcome.result {
                println!("  - {}: {}", outcome.path.display(), e);
            }
        }
    }

    Ok(())
}

/// Output file name for `input`: the full input file name plus `ext`, so
/// `quote.pdf` and `quote.txt` do not collide. Names already in `taken` get a
/// numeric suffix.
fn output_name(input: &Path, ext: &str, taken: &mut HashSet<String>) -> String {
    let file_name = input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("document");

    let mut name = format!("{file_name}.{ext}");
    let mut n = 2;
    while taken.contains(&name) {
        name = format!("{file_name}-{n}.{ext}");
        n += 1;
    }
    taken.insert(name.clone());
    name
}

fn write_output(
    output_path: &Path,
    input: &Path,
    result: &ExtractionResult,
    format: OutputFormat,
) -> anyhow::Result<()> {
    fs::write(output_path, format_result(input, result, format)?)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn write_summary(path: &Path, outcomes: &[FileOutcome]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["file", "status", "records", "degraded", "processing_time_ms", "error"])?;

    for outcome in outcomes {
        let file = outcome.path.display().to_string();
        let time = outcome.processing_time_ms.to_string();
        match &outcome.result {
            Ok(result) => {
                let status = match result.status {
                    ExtractionStatus::RecordsFound => "records_found",
                    ExtractionStatus::NoRecords(_) => "no_records",
                };
                wtr.write_record([
                    file.as_str(),
                    status,
                    &result.records.len().to_string(),
                    &result.degraded.to_string(),
                    &time,
                    "",
                ])?;
            }
            Err(e) => {
                wtr.write_record([file.as_str(), "error", "", "", &time, e.as_str()])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names_keep_the_extension() {
        let mut taken = HashSet::new();

        assert_eq!(output_name(Path::new("in/quote.pdf"), "csv", &mut taken), "quote.pdf.csv");
        assert_eq!(output_name(Path::new("in/quote.txt"), "csv", &mut taken), "quote.txt.csv");
    }

    #[test]
    fn test_same_file_name_in_two_directories() {
        let mut taken = HashSet::new();

        assert_eq!(output_name(Path::new("a/quote.pdf"), "json", &mut taken), "quote.pdf.json");
        assert_eq!(output_name(Path::new("b/quote.pdf"), "json", &mut taken), "quote.pdf-2.json");
    }
}
