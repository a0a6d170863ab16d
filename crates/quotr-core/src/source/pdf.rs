//! PDF provider built on lopdf and pdf-extract.

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::{PageContent, PageProvider};
use crate::error::{DocumentError, OcrError};
use crate::models::config::PdfConfig;

/// PDF document opened for text, table and image extraction.
pub struct PdfExtractor {
    document: Document,
    raw_data: Vec<u8>,
    max_pages: usize,
    table_cols: Option<usize>,
}

impl PdfExtractor {
    /// Open a PDF file.
    pub fn from_file(path: &Path, config: &PdfConfig) -> Result<Self, DocumentError> {
        let data = std::fs::read(path)
            .map_err(|e| DocumentError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(&data, config)
    }

    /// Open a PDF from memory. Encrypted documents are retried with an empty
    /// password.
    pub fn from_bytes(data: &[u8], config: &PdfConfig) -> Result<Self, DocumentError> {
        let mut document =
            Document::load_mem(data).map_err(|e| DocumentError::Parse(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            document.decrypt("").map_err(|_| DocumentError::Encrypted)?;
            debug!("Decrypted PDF with empty password");
            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| DocumentError::Parse(format!("failed to save decrypted PDF: {e}")))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(DocumentError::NoPages);
        }
        debug!("Loaded PDF with {} pages", page_count);

        Ok(Self {
            document,
            raw_data,
            max_pages: config.max_pages,
            table_cols: config.detect_tables.then_some(config.min_table_cols),
        })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Page numbers to process, honoring `max_pages`.
    fn page_numbers(&self) -> Vec<u32> {
        let pages = self.document.get_pages();
        let limit = if self.max_pages == 0 {
            pages.len()
        } else {
            self.max_pages
        };
        pages.keys().copied().take(limit).collect()
    }

    /// Text of every page. pdf-extract is tried on the whole document first;
    /// lopdf's own extractor fills in pages pdf-extract could not split out.
    fn page_texts(&self) -> Vec<(u32, Result<String, String>)> {
        let numbers = self.page_numbers();
        let by_pages = match pdf_extract::extract_text_from_mem_by_pages(&self.raw_data) {
            Ok(pages) if pages.len() == self.page_count() as usize => Some(pages),
            Ok(pages) => {
                warn!(
                    "pdf-extract returned {} pages for a {}-page document",
                    pages.len(),
                    self.page_count()
                );
                None
            }
            Err(e) => {
                warn!("pdf-extract failed: {}", e);
                None
            }
        };

        numbers
            .into_iter()
            .map(|number| {
                let primary = by_pages
                    .as_ref()
                    .and_then(|pages| (number as usize).checked_sub(1).and_then(|i| pages.get(i)))
                    .filter(|text| !text.trim().is_empty())
                    .cloned();
                let text = match primary {
                    Some(text) => Ok(text),
                    None => self
                        .document
                        .extract_text(&[number])
                        .map_err(|e| e.to_string()),
                };
                (number, text)
            })
            .collect()
    }

    /// Images referenced from a page's resources, following inherited
    /// resources up the page tree.
    fn page_images_for(&self, page_id: ObjectId) -> Vec<DynamicImage> {
        let Some(resources) = page_resources(&self.document, page_id) else {
            return Vec::new();
        };
        let Ok(xobjects) = resources.get(b"XObject") else {
            return Vec::new();
        };
        let Ok((_, Object::Dictionary(xobjects))) = self.document.dereference(xobjects) else {
            return Vec::new();
        };

        xobjects
            .iter()
            .filter_map(|(_, obj)| self.document.dereference(obj).ok())
            .filter_map(|(_, obj)| decode_image(&self.document, obj))
            .collect()
    }

    /// Every image object in the document.
    fn all_images(&self) -> Vec<DynamicImage> {
        self.document
            .objects
            .values()
            .filter_map(|obj| decode_image(&self.document, obj))
            .collect()
    }
}

impl PageProvider for PdfExtractor {
    fn kind(&self) -> &'static str {
        "pdf"
    }

    fn pages(&self) -> Vec<PageContent> {
        self.page_texts()
            .into_iter()
            .map(|(number, text)| match text {
                Ok(text) => {
                    trace!("Page {}: {} chars", number, text.len());
                    PageContent::from_text(number, &text, self.table_cols)
                }
                Err(reason) => {
                    warn!("Page {} unreadable: {}", number, reason);
                    PageContent::unreadable(number, reason)
                }
            })
            .collect()
    }

    fn page_images(&self) -> Result<Vec<DynamicImage>, OcrError> {
        let pages = self.document.get_pages();
        let mut images: Vec<DynamicImage> = self
            .page_numbers()
            .into_iter()
            .filter_map(|number| pages.get(&number))
            .flat_map(|page_id| self.page_images_for(*page_id))
            .collect();

        if images.is_empty() {
            debug!("No page XObject images, scanning all objects");
            images = self.all_images();
        }
        debug!("Extracted {} images for OCR", images.len());
        Ok(images)
    }
}

fn page_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let mut node_id = page_id;
    loop {
        let Ok(Object::Dictionary(node)) = doc.get_object(node_id) else {
            return None;
        };
        if let Ok(resources) = node.get(b"Resources") {
            if let Ok((_, Object::Dictionary(dict))) = doc.dereference(resources) {
                return Some(dict.clone());
            }
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(parent)) => node_id = *parent,
            _ => return None,
        }
    }
}

fn name_of<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a [u8]> {
    match obj {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(items) => items.first().and_then(|o| o.as_name().ok()),
        Object::Reference(id) => doc.get_object(*id).ok().and_then(|o| o.as_name().ok()),
        _ => None,
    }
}

/// Decode an image XObject. JPEG streams and 8-bit RGB/gray rasters are
/// supported; anything else is skipped.
fn decode_image(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;
    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
    trace!("Image object {}x{}", width, height);

    match dict.get(b"Filter").ok().and_then(|f| name_of(doc, f)) {
        Some(b"DCTDecode") => {
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                .ok();
        }
        Some(b"JPXDecode" | b"CCITTFaxDecode" | b"JBIG2Decode") => {
            trace!("Unsupported image filter");
            return None;
        }
        _ => {}
    }

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        return None;
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    let pixels = (width as usize) * (height as usize);

    match dict.get(b"ColorSpace").ok().and_then(|c| name_of(doc, c)) {
        Some(b"DeviceGray" | b"G") if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
        }
        Some(b"DeviceRGB" | b"RGB") | None if data.len() >= pixels * 3 => {
            RgbImage::from_raw(width, height, data[..pixels * 3].to_vec()).map(DynamicImage::ImageRgb8)
        }
        _ => None,
    }
}
