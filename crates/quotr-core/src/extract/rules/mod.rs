//! Pattern library: manufacturer profiles, field detectors and sanitizers.

pub mod fields;
pub mod library;
pub mod manufacturer;
pub mod patterns;
pub mod sanitize;

pub use fields::FieldDetector;
pub use library::PatternLibrary;
pub use manufacturer::{ManufacturerMatch, ManufacturerProfile, recover_leading_token};
pub use sanitize::{normalize_line, split_lines};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence of the field.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all non-overlapping occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A value found in a piece of text, with the span it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted value (capture group 1, or the whole match).
    pub value: T,
    /// Byte span of the whole match in the searched text.
    pub position: (usize, usize),
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            value,
            position: (start, end),
            source: source.into(),
        }
    }

    /// Remove the matched span from `text` and tidy what is left.
    ///
    /// `text` must be the string the match was produced from.
    pub fn strip_from(&self, text: &str) -> String {
        let (start, end) = self.position;
        let before = text.get(..start).unwrap_or_default();
        let after = text.get(end..).unwrap_or_default();
        sanitize::tidy_fragment(&format!("{before} {after}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_from_removes_span() {
        let text = "Widget Qty: 5 rack mount";
        let start = text.find("Qty").unwrap();
        let m = ExtractionMatch::new("5".to_string(), "Qty: 5", start, start + 6);
        assert_eq!(m.strip_from(text), "Widget rack mount");
    }

    #[test]
    fn test_strip_from_drops_punctuation_residue() {
        let text = "Qty: 5,";
        let m = ExtractionMatch::new("5".to_string(), "Qty: 5", 0, 6);
        assert_eq!(m.strip_from(text), "");
    }
}
