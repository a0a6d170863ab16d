//! Field detectors: one compiled regex per configured field matcher.

use regex::{Captures, Regex};

use super::{ExtractionMatch, FieldExtractor};
use crate::error::ConfigError;
use crate::models::config::DetectorConfig;
use crate::models::line_item::Field;

/// A compiled field matcher.
#[derive(Debug, Clone)]
pub struct FieldDetector {
    kind: Field,
    regex: Regex,
}

impl FieldDetector {
    /// Compile a detector for `kind`.
    pub fn new(kind: Field, pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            owner: format!("detector {kind:?}"),
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { kind, regex })
    }

    pub fn from_config(config: &DetectorConfig) -> Result<Self, ConfigError> {
        Self::new(config.kind, &config.pattern)
    }

    /// Field this detector fills.
    pub fn kind(&self) -> Field {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

/// Turn one set of captures into a match: group 1 is the value when present,
/// the whole match otherwise. The span always covers the whole match so the
/// label is stripped together with the value.
pub(crate) fn match_from_captures(caps: &Captures<'_>) -> Option<ExtractionMatch<String>> {
    let whole = caps.get(0)?;
    let value = caps
        .get(1)
        .map(|m| m.as_str())
        .unwrap_or_else(|| whole.as_str())
        .trim();
    if value.is_empty() {
        return None;
    }
    Some(ExtractionMatch::new(
        value.to_string(),
        whole.as_str(),
        whole.start(),
        whole.end(),
    ))
}

impl FieldExtractor for FieldDetector {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.regex
            .captures_iter(text)
            .find_map(|caps| match_from_captures(&caps))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| match_from_captures(&caps))
            .collect()
    }
}
