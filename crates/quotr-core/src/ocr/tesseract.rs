//! Tesseract command-line OCR.

use std::process::Command;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info};

use super::OcrProvider;
use crate::error::OcrError;

/// Runs the `tesseract` binary once per page image.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    language: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    /// Whether the binary can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn recognize_one(&self, dir: &std::path::Path, index: usize, image: &DynamicImage) -> Result<String, OcrError> {
        let path = dir.join(format!("page-{}.png", index + 1));
        image
            .save(&path)
            .map_err(|e| OcrError::Image(format!("failed to write page image: {e}")))?;

        let output = Command::new(&self.binary)
            .arg(&path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| {
                OcrError::Unavailable(format!("failed to run {} (is it installed?): {}", self.binary, e))
            })?;

        if !output.status.success() {
            return Err(OcrError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl OcrProvider for TesseractOcr {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, images: &[DynamicImage]) -> Result<String, OcrError> {
        let start = Instant::now();
        let dir = tempfile::tempdir()
            .map_err(|e| OcrError::Recognition(format!("failed to create temp dir: {e}")))?;

        let mut pages = Vec::with_capacity(images.len());
        for (index, image) in images.iter().enumerate() {
            debug!("Running tesseract on page image {} ({}x{})", index + 1, image.width(), image.height());
            pages.push(self.recognize_one(dir.path(), index, image)?);
        }

        info!(
            "Tesseract recognized {} page images in {}ms",
            images.len(),
            start.elapsed().as_millis()
        );
        Ok(pages.join("\n"))
    }
}
