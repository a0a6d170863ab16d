//! OCR fallback providers.
//!
//! The orchestrator calls [`OcrProvider::recognize`] at most once per
//! document, with every page image, and only when the text layer is empty.

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "tesseract")]
mod tesseract;

#[cfg(feature = "onnx")]
pub use onnx::OnnxOcr;
#[cfg(feature = "tesseract")]
pub use tesseract::TesseractOcr;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::OcrError;
use crate::models::config::{OcrConfig, OcrEngineKind};

/// Turns page images into a flat text blob.
pub trait OcrProvider {
    /// Short name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Recognize the text of `images`, in page order, one line per text row.
    fn recognize(&self, images: &[DynamicImage]) -> Result<String, OcrError>;
}

/// Provider used when OCR is disabled or unavailable in this build.
#[derive(Debug, Clone, Default)]
pub struct NoOcr {
    reason: String,
}

impl NoOcr {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl OcrProvider for NoOcr {
    fn name(&self) -> &'static str {
        "none"
    }

    fn recognize(&self, _images: &[DynamicImage]) -> Result<String, OcrError> {
        Err(OcrError::Unavailable(if self.reason.is_empty() {
            "OCR disabled".to_string()
        } else {
            self.reason.clone()
        }))
    }
}

/// Build the provider selected in `config`.
///
/// Model loading is deferred until the first call to `recognize`, so a
/// document with a usable text layer never pays for it.
pub fn create_provider(config: &OcrConfig) -> Box<dyn OcrProvider> {
    if !config.enabled {
        return Box::new(NoOcr::new("OCR disabled in configuration"));
    }
    match config.engine {
        OcrEngineKind::None => Box::new(NoOcr::new("OCR engine set to none")),
        #[cfg(feature = "tesseract")]
        OcrEngineKind::Tesseract => Box::new(TesseractOcr::new(
            config.tesseract_path.clone(),
            config.language.clone(),
        )),
        #[cfg(feature = "onnx")]
        OcrEngineKind::Onnx => Box::new(OnnxOcr::new(config.model_dir.clone())),
        #[allow(unreachable_patterns)]
        other => {
            warn!("OCR engine {:?} not compiled in", other);
            Box::new(NoOcr::new(format!("OCR engine {other:?} not compiled in")))
        }
    }
}

/// A recognized text region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    /// Quadrilateral corners (x1, y1, x2, y2, x3, y3, x4, y4).
    pub bbox: [f32; 8],

    /// Recognized text.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Axis-aligned bounding rectangle (min_x, min_y, max_x, max_y).
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().copied().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().copied().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Vertical band, in pixels, within which boxes count as one row.
const ROW_BAND: f32 = 20.0;

/// Join boxes into text in reading order: rows top to bottom, boxes in a
/// row left to right and separated by two spaces so column gaps survive.
pub fn reading_order_text(mut boxes: Vec<TextBox>) -> String {
    let row_of = |b: &TextBox| (b.rect().1 / ROW_BAND) as i32;
    boxes.sort_by(|a, b| {
        row_of(a)
            .cmp(&row_of(b))
            .then_with(|| a.rect().0.partial_cmp(&b.rect().0).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<String> = Vec::new();
    let mut current_row: Option<i32> = None;
    for b in &boxes {
        let row = row_of(b);
        match lines.last_mut() {
            Some(line) if current_row == Some(row) => {
                line.push_str("  ");
                line.push_str(&b.text);
            }
            _ => lines.push(b.text.clone()),
        }
        current_row = Some(row);
    }
    lines.join("\n")
}
