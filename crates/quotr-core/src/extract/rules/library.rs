//! The compiled pattern library shared by the segmenter and the normalizer.

use tracing::debug;

use super::fields::FieldDetector;
use super::manufacturer::{ManufacturerMatch, ManufacturerProfile};
use super::{ExtractionMatch, FieldExtractor};
use crate::error::ConfigError;
use crate::models::config::{HeaderRule, PatternConfig};
use crate::models::line_item::Field;

/// Manufacturer profiles, field detectors and header rules, compiled once.
///
/// The library holds no mutable state; one instance can serve any number of
/// documents.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    profiles: Vec<ManufacturerProfile>,
    detectors: Vec<FieldDetector>,
    header_rules: Vec<HeaderRule>,
}

impl PatternLibrary {
    /// Compile every pattern in `config`, preserving order.
    pub fn from_config(config: &PatternConfig) -> Result<Self, ConfigError> {
        let profiles = config
            .profiles
            .iter()
            .map(ManufacturerProfile::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        let detectors = config
            .detectors
            .iter()
            .map(FieldDetector::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        let header_rules = config
            .header_rules
            .iter()
            .map(|rule| HeaderRule {
                field: rule.field,
                keywords: rule.keywords.iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();

        debug!(
            "Compiled pattern library: {} profiles, {} detectors",
            profiles.len(),
            detectors.len()
        );

        Ok(Self {
            profiles,
            detectors,
            header_rules,
        })
    }

    /// Library built from the compiled-in defaults.
    pub fn builtin() -> Self {
        Self::from_config(&PatternConfig::default()).expect("built-in patterns compile")
    }

    pub fn profiles(&self) -> &[ManufacturerProfile] {
        &self.profiles
    }

    pub fn profile(&self, name: &str) -> Option<&ManufacturerProfile> {
        self.profiles.iter().find(|p| p.name() == name)
    }

    /// Detectors in application order.
    pub fn detectors(&self) -> &[FieldDetector] {
        &self.detectors
    }

    /// Header rules with lowercased keywords, most specific first.
    pub fn header_rules(&self) -> &[HeaderRule] {
        &self.header_rules
    }

    /// Find a manufacturer number in `text`.
    ///
    /// Profiles whose keywords occur in `text` are tried first, in listed
    /// order; generic profiles follow. Keyword profiles that are not
    /// triggered are never tried.
    pub fn detect_manufacturer(&self, text: &str) -> Option<ManufacturerMatch> {
        if text.trim().is_empty() {
            return None;
        }
        let lower = text.to_lowercase();

        let triggered = self
            .profiles
            .iter()
            .filter(|p| !p.is_generic() && p.is_triggered_by(&lower));
        let generic = self.profiles.iter().filter(|p| p.is_generic());

        triggered.chain(generic).find_map(|profile| {
            profile.find(text).map(|matched| ManufacturerMatch {
                profile: profile.name().to_string(),
                matched,
            })
        })
    }

    /// First match among the detectors for `kind`.
    pub fn extract_field(&self, kind: Field, text: &str) -> Option<ExtractionMatch<String>> {
        self.detectors
            .iter()
            .filter(|d| d.kind() == kind)
            .find_map(|d| d.extract(text))
    }

    pub fn extract_quantity(&self, text: &str) -> Option<ExtractionMatch<String>> {
        self.extract_field(Field::Quantity, text)
    }

    /// First match among the money detectors, with the field it fills.
    pub fn extract_price(&self, text: &str) -> Option<(Field, ExtractionMatch<String>)> {
        self.detectors
            .iter()
            .filter(|d| d.kind().is_money())
            .find_map(|d| d.extract(text).map(|m| (d.kind(), m)))
    }

    pub fn extract_discount(&self, text: &str) -> Option<ExtractionMatch<String>> {
        self.extract_field(Field::Discount, text)
    }
}
