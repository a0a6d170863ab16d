//! Plain-text and raster-image documents.

use std::path::Path;

use image::DynamicImage;
use tracing::debug;

use super::{PageContent, PageProvider};
use crate::error::{DocumentError, OcrError};
use crate::models::config::PdfConfig;

/// A plain-text document. Form feeds separate pages.
#[derive(Debug, Clone)]
pub struct TextDocument {
    pages: Vec<String>,
    table_cols: Option<usize>,
}

impl TextDocument {
    /// Wrap in-memory text; no table detection.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut pages: Vec<String> = text.split('\u{000C}').map(str::to_string).collect();
        if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
            pages.pop();
        }
        Self {
            pages,
            table_cols: None,
        }
    }

    /// Read a UTF-8 text file.
    pub fn from_file(path: &Path, config: &PdfConfig) -> Result<Self, DocumentError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DocumentError::Parse(format!("{}: {}", path.display(), e)))?;
        let document = Self::from_text(text).with_table_detection(
            config.detect_tables.then_some(config.min_table_cols),
        );
        debug!("Loaded text document with {} pages", document.pages.len());
        Ok(document)
    }

    /// Recover table grids from lines with at least `min_cols` aligned cells.
    pub fn with_table_detection(mut self, min_cols: Option<usize>) -> Self {
        self.table_cols = min_cols;
        self
    }
}

impl PageProvider for TextDocument {
    fn kind(&self) -> &'static str {
        "text"
    }

    fn pages(&self) -> Vec<PageContent> {
        self.pages
            .iter()
            .enumerate()
            .map(|(idx, text)| PageContent::from_text(idx as u32 + 1, text, self.table_cols))
            .collect()
    }

    fn page_images(&self) -> Result<Vec<DynamicImage>, OcrError> {
        Ok(Vec::new())
    }
}

/// A scanned page or photo. It has no text layer; everything comes from OCR.
#[derive(Debug, Clone)]
pub struct ImageDocument {
    image: DynamicImage,
}

impl ImageDocument {
    pub fn from_image(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn from_file(path: &Path) -> Result<Self, DocumentError> {
        let image = image::open(path)
            .map_err(|e| DocumentError::Parse(format!("{}: {}", path.display(), e)))?;
        debug!("Loaded image {}x{}", image.width(), image.height());
        Ok(Self::from_image(image))
    }
}

impl PageProvider for ImageDocument {
    fn kind(&self) -> &'static str {
        "image"
    }

    fn pages(&self) -> Vec<PageContent> {
        vec![PageContent {
            number: 1,
            ..PageContent::default()
        }]
    }

    fn page_images(&self) -> Result<Vec<DynamicImage>, OcrError> {
        Ok(vec![self.image.clone()])
    }
}
