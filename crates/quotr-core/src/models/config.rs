//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::extract::rules::patterns::{default_detectors, default_header_rules, default_profiles};
use crate::models::line_item::Field;

/// Main configuration for the quotr pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotrConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// OCR fallback configuration.
    pub ocr: OcrConfig,

    /// Segmentation, normalization and cleaning policy.
    pub extraction: ExtractionConfig,

    /// Manufacturer profiles, field detectors and table header rules.
    pub patterns: PatternConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,

    /// Recover table grids from column-aligned page text.
    pub detect_tables: bool,

    /// Minimum cells per line for a line to count as a table row.
    pub min_table_cols: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 0,
            detect_tables: true,
            min_table_cols: 3,
        }
    }
}

/// Which OCR provider to use for the fallback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrEngineKind {
    /// Tesseract command line tool.
    Tesseract,
    /// PaddleOCR ONNX models via pure-onnx-ocr.
    Onnx,
    /// Never run OCR.
    None,
}

/// OCR fallback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Allow the OCR fallback at all.
    pub enabled: bool,

    /// Provider used for the fallback.
    pub engine: OcrEngineKind,

    /// Path or name of the tesseract binary.
    pub tesseract_path: String,

    /// Tesseract language code.
    pub language: String,

    /// Directory with det.onnx, latin_rec.onnx and latin_dict.txt.
    pub model_dir: PathBuf,

    /// Minimum non-blank characters for primary text to count as usable.
    pub min_text_chars: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            engine: OcrEngineKind::Tesseract,
            tesseract_path: "tesseract".to_string(),
            language: "eng".to_string(),
            model_dir: PathBuf::from("models"),
            min_text_chars: 1,
        }
    }
}

/// Which extraction path wins when both produce records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourcePrecedence {
    /// Table records, plus text records whose identifier no table row on
    /// the same page carries.
    TablesThenText,
    /// Text records, plus table records whose identifier no text record on
    /// the same page carries.
    TextThenTables,
    /// Keep both, table records first.
    Merge,
}

/// Value used when no quantity was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityDefault {
    /// Leave the quantity empty.
    Absent,
    /// Assume a quantity of one.
    One,
}

/// What fills an empty description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionFallback {
    /// Promote the first note fragment.
    Notes,
    /// Leave the description blank.
    Blank,
}

/// What happens to text read before the first identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreambleMode {
    /// Keep it as the first item's leading description.
    #[default]
    Description,
    /// Move it to the first item's notes.
    Notes,
    /// Drop it and report a diagnostic. For documents that open with
    /// header text.
    Discard,
}

/// Segmentation, normalization and cleaning policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Table-vs-text precedence.
    pub precedence: SourcePrecedence,

    /// Quantity default for records whose profile does not override it.
    pub quantity_default: QuantityDefault,

    /// Description fallback for records whose profile does not override it.
    pub description_fallback: DescriptionFallback,

    /// Decimal separator used by money values ('.' or ',').
    pub decimal_separator: char,

    /// Round money values to this many decimal places.
    pub price_scale: Option<u32>,

    /// Start a text item on a leading part-number token when the line also
    /// carries a quantity or a price.
    pub text_token_recovery: bool,

    /// Where text seen before the first identifier goes.
    pub preamble: PreambleMode,

    /// Append identifier-less table rows to the previous row's description.
    pub merge_continuation_rows: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            precedence: SourcePrecedence::TablesThenText,
            quantity_default: QuantityDefault::Absent,
            description_fallback: DescriptionFallback::Notes,
            decimal_separator: '.',
            price_scale: None,
            text_token_recovery: true,
            preamble: PreambleMode::Description,
            merge_continuation_rows: true,
        }
    }
}

/// A manufacturer profile as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Profile name.
    pub name: String,

    /// Case-insensitive substrings that activate the profile.
    /// An empty list makes the profile a generic fallback.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Regular expressions, tried in order. Capture group 1 is the identifier.
    pub patterns: Vec<String>,

    /// Overrides `extraction.quantity_default` for this profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_default: Option<QuantityDefault>,

    /// Overrides `extraction.description_fallback` for this profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_fallback: Option<DescriptionFallback>,
}

/// A field detector as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Field the detector fills.
    pub kind: Field,

    /// Regular expression. Capture group 1 is the value.
    pub pattern: String,
}

/// Maps table header text to a canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRule {
    /// Field the column holds.
    pub field: Field,

    /// Case-insensitive substrings that identify the header cell.
    pub keywords: Vec<String>,
}

/// Pattern data: all of it may be overridden from a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Manufacturer profiles, in priority order.
    pub profiles: Vec<ProfileConfig>,

    /// Field detectors, in the order the segmenter applies them.
    pub detectors: Vec<DetectorConfig>,

    /// Table header rules, most specific first.
    pub header_rules: Vec<HeaderRule>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            profiles: default_profiles(),
            detectors: default_detectors(),
            header_rules: default_header_rules(),
        }
    }
}

impl QuotrConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.extraction.decimal_separator, '.' | ',') {
            return Err(ConfigError::Invalid(format!(
                "decimal_separator must be '.' or ',', got {:?}",
                self.extraction.decimal_separator
            )));
        }
        if self.pdf.min_table_cols < 2 {
            return Err(ConfigError::Invalid(
                "pdf.min_table_cols must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = QuotrConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.extraction.quantity_default, QuantityDefault::Absent);
        assert!(!config.patterns.profiles.is_empty());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "extraction": { "quantity_default": "one" } }"#;
        let config: QuotrConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.extraction.quantity_default, QuantityDefault::One);
        assert_eq!(config.extraction.decimal_separator, '.');
        assert_eq!(config.ocr.engine, OcrEngineKind::Tesseract);
        assert_eq!(config.patterns.detectors, default_detectors());
    }

    #[test]
    fn test_preamble_mode_from_json() {
        assert_eq!(QuotrConfig::default().extraction.preamble, PreambleMode::Description);

        let json = r#"{ "extraction": { "preamble": "discard" } }"#;
        let config: QuotrConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.extraction.preamble, PreambleMode::Discard);
    }

    #[test]
    fn test_invalid_separator_rejected() {
        let mut config = QuotrConfig::default();
        config.extraction.decimal_separator = ';';
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_profile_overrides_roundtrip_through_json() {
        let json = r#"{
            "name": "acme",
            "keywords": ["acme"],
            "patterns": ["(AC-\\d+)"],
            "quantity_default": "one"
        }"#;
        let profile: ProfileConfig = serde_json::from_str(json).unwrap();
        assert_eq!(profile.quantity_default, Some(QuantityDefault::One));
        assert_eq!(profile.description_fallback, None);
    }
}
