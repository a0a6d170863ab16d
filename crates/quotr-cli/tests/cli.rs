use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{TempDir, tempdir};

const QUOTE: &str = "\
MFG: ABC-123 Rack mount kit Qty: 2 Unit Price: $10.50
MFG: XYZ-999
Qty: 1
";

/// `quotr` with the user configuration directory pointed at `home`.
fn quotr(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("quotr").expect("binary should build");
    cmd.env("XDG_CONFIG_HOME", home).env("HOME", home);
    cmd
}

fn write_quote(dir: &TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, QUOTE).expect("fixture should be written");
    path
}

#[test]
fn help_lists_commands() {
    let dir = tempdir().unwrap();
    quotr(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("profiles"));
}

#[test]
fn process_text_file_as_json() {
    let dir = tempdir().unwrap();
    let input = write_quote(&dir, "quote.txt");

    quotr(dir.path())
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"manufacturer_number\": \"ABC-123\""))
        .stdout(predicate::str::contains("\"manufacturer_number\": \"XYZ-999\""))
        .stdout(predicate::str::contains("records_found"));
}

#[test]
fn process_text_file_as_csv() {
    let dir = tempdir().unwrap();
    let input = write_quote(&dir, "quote.txt");
    let output = dir.path().join("quote.csv");

    quotr(dir.path())
        .args(["process", "--format", "csv", "--output"])
        .arg(&output)
        .arg(&input)
        .assert()
        .success();

    let csv = std::fs::read_to_string(&output).unwrap();
    assert!(csv.starts_with("Manufacturer Number,Description,Quantity,Unit Price"));
    assert!(csv.contains("ABC-123,Rack mount kit,2,10.50"));
    assert!(csv.contains("XYZ-999,,1,"));
}

#[test]
fn process_reports_diagnostics() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("quote.txt");
    std::fs::write(&input, format!("{QUOTE}MFG: XYZ-999\nQty: 1\n")).unwrap();

    quotr(dir.path())
        .args(["process", "--format", "text", "--show-diagnostics"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("#1 ABC-123"))
        .stderr(predicate::str::contains("DuplicatesRemoved"));
}

#[test]
fn missing_input_fails() {
    let dir = tempdir().unwrap();
    quotr(dir.path())
        .args(["process", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn unsupported_format_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("quote.docx");
    std::fs::write(&input, "not really a document").unwrap();

    quotr(dir.path())
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported document format"));
}

#[test]
fn config_init_get_and_set() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("quotr.json");

    quotr(dir.path())
        .args(["config", "init", "--output"])
        .arg(&config)
        .assert()
        .success();
    assert!(config.exists());

    quotr(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "extraction.quantity_default", "one"])
        .assert()
        .success();

    quotr(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "extraction.quantity_default"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"one\""));

    quotr(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "extraction.no_such_key", "1"])
        .assert()
        .failure();
}

#[test]
fn profiles_list_and_detect() {
    let dir = tempdir().unwrap();

    quotr(dir.path())
        .args(["profiles", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cisco"))
        .stdout(predicate::str::contains("labeled"));

    quotr(dir.path())
        .args(["profiles", "detect", "MFG: ABC-123 Qty: 5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("labeled"))
        .stdout(predicate::str::contains("ABC-123"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let dir = tempdir().unwrap();
    write_quote(&dir, "a.txt");
    write_quote(&dir, "a.text");
    std::fs::write(dir.path().join("empty.txt"), "Thank you for your business.\n").unwrap();
    let out = dir.path().join("out");

    quotr(dir.path())
        .arg("batch")
        .arg(format!("{}/*.t*t", dir.path().display()))
        .arg("--output-dir")
        .arg(&out)
        .args(["--format", "csv", "--summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 3 files"));

    assert!(out.join("a.txt.csv").exists());
    assert!(out.join("a.text.csv").exists());

    let summary = std::fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("file,status,records,degraded"));
    assert!(summary.contains("records_found,2,false"));
    assert!(summary.contains("no_records,0,false"));
}
