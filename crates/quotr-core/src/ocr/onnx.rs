//! PaddleOCR models run through `pure-onnx-ocr` (pure Rust, no ONNX Runtime).

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use pure_onnx_ocr::engine::{OcrEngine, OcrEngineBuilder};
use tracing::{debug, info};

use super::{OcrProvider, TextBox, reading_order_text};
use crate::error::OcrError;

/// OCR provider backed by det/rec ONNX models in `model_dir`.
///
/// The models are loaded on the first `recognize` call.
pub struct OnnxOcr {
    model_dir: PathBuf,
    engine: OnceLock<Result<OcrEngine, String>>,
}

impl OnnxOcr {
    pub fn new(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: model_dir.into(),
            engine: OnceLock::new(),
        }
    }

    fn engine(&self) -> Result<&OcrEngine, OcrError> {
        self.engine
            .get_or_init(|| {
                let det_path = self.model_dir.join("det.onnx");
                let rec_path = self.model_dir.join("latin_rec.onnx");
                let dict_path = self.model_dir.join("latin_dict.txt");

                let engine = OcrEngineBuilder::new()
                    .det_model_path(&det_path)
                    .rec_model_path(&rec_path)
                    .dictionary_path(&dict_path)
                    .build()
                    .map_err(|e| format!("pure-onnx-ocr ({}): {}", self.model_dir.display(), e))?;
                info!("Loaded pure-onnx-ocr engine from {}", self.model_dir.display());
                Ok(engine)
            })
            .as_ref()
            .map_err(|e| OcrError::ModelLoad(e.clone()))
    }

    fn recognize_one(&self, engine: &OcrEngine, image: &DynamicImage) -> Result<String, OcrError> {
        let (width, height) = image.dimensions();
        debug!("Running pure-onnx-ocr on {}x{} image", width, height);

        let results = engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {e}")))?;

        let boxes = results
            .iter()
            .map(|r| TextBox {
                bbox: polygon_to_bbox(&r.bounding_box),
                text: r.text.replace("[UNK]", " ").trim().to_string(),
                confidence: r.confidence,
            })
            .filter(|b| !b.text.is_empty())
            .collect::<Vec<_>>();
        debug!("pure-onnx-ocr returned {} text regions", boxes.len());

        Ok(reading_order_text(boxes))
    }
}

impl OcrProvider for OnnxOcr {
    fn name(&self) -> &'static str {
        "onnx"
    }

    fn recognize(&self, images: &[DynamicImage]) -> Result<String, OcrError> {
        let start = Instant::now();
        let engine = self.engine()?;

        let pages = images
            .iter()
            .map(|image| self.recognize_one(engine, image))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "pure-onnx-ocr recognized {} images in {}ms",
            images.len(),
            start.elapsed().as_millis()
        );
        Ok(pages.join("\n"))
    }
}

/// First four exterior points of the polygon as `[x1, y1, ..., x4, y4]`.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}
