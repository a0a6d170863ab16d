//! Manufacturer profiles and part-number recognition.

use regex::Regex;

use super::ExtractionMatch;
use super::fields::match_from_captures;
use super::patterns::LEADING_TOKEN;
use crate::error::ConfigError;
use crate::models::config::{DescriptionFallback, ProfileConfig, QuantityDefault};

/// A compiled manufacturer profile.
#[derive(Debug, Clone)]
pub struct ManufacturerProfile {
    name: String,
    keywords: Vec<String>,
    patterns: Vec<Regex>,
    quantity_default: Option<QuantityDefault>,
    description_fallback: Option<DescriptionFallback>,
}

impl ManufacturerProfile {
    /// Compile a profile, keeping pattern order.
    pub fn from_config(config: &ProfileConfig) -> Result<Self, ConfigError> {
        let patterns = config
            .patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|source| ConfigError::InvalidPattern {
                    owner: format!("profile {}", config.name),
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: config.name.clone(),
            keywords: config
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            patterns,
            quantity_default: config.quantity_default,
            description_fallback: config.description_fallback,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }

    /// Profiles without keywords are tried only after keyword profiles.
    pub fn is_generic(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Whether any keyword occurs in `lowercase_text`.
    pub fn is_triggered_by(&self, lowercase_text: &str) -> bool {
        self.keywords.iter().any(|k| lowercase_text.contains(k.as_str()))
    }

    pub fn quantity_default(&self) -> Option<QuantityDefault> {
        self.quantity_default
    }

    pub fn description_fallback(&self) -> Option<DescriptionFallback> {
        self.description_fallback
    }

    /// First match of the first pattern that fires.
    pub fn find(&self, text: &str) -> Option<ExtractionMatch<String>> {
        self.patterns.iter().find_map(|re| {
            re.captures_iter(text)
                .find_map(|caps| match_from_captures(&caps))
        })
    }
}

/// A detected manufacturer number and the profile that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManufacturerMatch {
    pub profile: String,
    pub matched: ExtractionMatch<String>,
}

impl ManufacturerMatch {
    pub fn identifier(&self) -> &str {
        &self.matched.value
    }

    /// Exact matched substring, to be stripped from the line.
    pub fn matched_span(&self) -> &str {
        &self.matched.source
    }
}

/// Split a leading part-number token off free text.
///
/// The token must contain a digit and at least one letter, dash or slash, so
/// row numbers ("12") and bare amounts ("5.00") are not taken for part numbers.
pub fn recover_leading_token(text: &str) -> Option<(String, String)> {
    let caps = LEADING_TOKEN.captures(text.trim())?;
    let token = caps[1].trim_end_matches('.');
    let rest = caps[2].trim();

    let has_digit = token.chars().any(|c| c.is_ascii_digit());
    let has_shape = token
        .chars()
        .any(|c| c.is_ascii_uppercase() || c == '-' || c == '/');
    if token.len() < 3 || !has_digit || !has_shape || rest.is_empty() {
        return None;
    }
    Some((token.to_string(), rest.to_string()))
}
