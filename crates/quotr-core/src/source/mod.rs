//! Document providers: page text, table grids and page images.

mod pdf;
mod table_detect;
mod text;

pub use pdf::PdfExtractor;
pub use table_detect::{detect_tables, split_line_into_cells};
pub use text::{ImageDocument, TextDocument};

use std::path::Path;

use image::DynamicImage;

use crate::error::{DocumentError, OcrError};
use crate::extract::TableGrid;
use crate::extract::rules::split_lines;
use crate::models::config::PdfConfig;

/// Extensions opened as raster images.
pub const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

/// Text and tables of one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    /// Page number (1-indexed).
    pub number: u32,
    /// Normalized, non-blank lines in reading order.
    pub lines: Vec<String>,
    /// Table grids found on the page.
    pub tables: Vec<TableGrid>,
    /// Why the page could not be read, if it could not.
    pub unreadable: Option<String>,
}

impl PageContent {
    /// Build a page from raw text. When `table_cols` is set, column-aligned
    /// runs of lines are also returned as table grids.
    pub fn from_text(number: u32, raw: &str, table_cols: Option<usize>) -> Self {
        let tables = table_cols
            .map(|cols| detect_tables(raw.lines(), cols, Some(number)))
            .unwrap_or_default();
        Self {
            number,
            lines: split_lines(raw),
            tables,
            unreadable: None,
        }
    }

    /// A page the provider failed to read.
    pub fn unreadable(number: u32, reason: impl Into<String>) -> Self {
        Self {
            number,
            unreadable: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Count of non-whitespace characters across all lines.
    pub fn text_chars(&self) -> usize {
        self.lines
            .iter()
            .map(|l| l.chars().filter(|c| !c.is_whitespace()).count())
            .sum()
    }
}

/// Source of page text, table grids and page images for one document.
///
/// Opening the document is the only fatal step and happens in the
/// implementor's constructor. Reading pages never fails as a whole: a page
/// that cannot be read comes back marked `unreadable`.
pub trait PageProvider {
    /// Short name for logs ("pdf", "text", "image").
    fn kind(&self) -> &'static str;

    /// Every page in order.
    fn pages(&self) -> Vec<PageContent>;

    /// Page images for the OCR fallback.
    fn page_images(&self) -> Result<Vec<DynamicImage>, OcrError>;
}

/// Open `path` with the provider matching its extension.
pub fn open_document(path: &Path, config: &PdfConfig) -> Result<Box<dyn PageProvider>, DocumentError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => Ok(Box::new(PdfExtractor::from_file(path, config)?)),
        "txt" | "text" => Ok(Box::new(TextDocument::from_file(path, config)?)),
        ext if IMAGE_EXTENSIONS.contains(&ext) => Ok(Box::new(ImageDocument::from_file(path)?)),
        other => Err(DocumentError::UnsupportedFormat(if other.is_empty() {
            path.display().to_string()
        } else {
            format!(".{other}")
        })),
    }
}

/// Whether `path` has an extension `open_document` understands.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|ext| ext == "pdf" || ext == "txt" || ext == "text" || IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_from_text() {
        let raw = "Quote\n\nPart  Description  Qty\nABC-1  Widget  2\n";
        let page = PageContent::from_text(3, raw, Some(3));

        assert_eq!(page.lines, vec!["Quote", "Part Description Qty", "ABC-1 Widget 2"]);
        assert_eq!(page.tables.len(), 1);
        assert_eq!(page.tables[0].page, Some(3));

        let page = PageContent::from_text(3, raw, None);
        assert!(page.tables.is_empty());
    }

    #[test]
    fn test_text_chars_ignores_whitespace() {
        let page = PageContent::from_text(1, " a b \n\n c ", None);
        assert_eq!(page.text_chars(), 3);
        assert_eq!(PageContent::unreadable(1, "broken").text_chars(), 0);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = open_document(Path::new("quote.docx"), &PdfConfig::default()).err();
        assert!(matches!(err, Some(DocumentError::UnsupportedFormat(ext)) if ext == ".docx"));
        assert!(is_supported(Path::new("scan.JPG")));
        assert!(!is_supported(Path::new("quote.docx")));
    }
}
