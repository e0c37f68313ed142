//! # OCR Processing Module
//!
//! This module provides the optical character recognition collaborator used by the
//! best-image search. The search only depends on the [`OcrEngine`] trait; the
//! production implementation, [`TesseractOcr`], drives Tesseract through `leptess`.
//!
//! ## Operations
//!
//! - Plain-text transcription of a grayscale image
//! - Word-level data: every recognized word with Tesseract's confidence (0-100),
//!   read from the hOCR output (`x_wconf`)
//!
//! ## Dependencies
//!
//! - `leptess`: Rust bindings for Tesseract OCR and Leptonica
//! - `image`: in-memory PNG encoding handed to Leptonica
//! - `regex`: hOCR parsing

use std::io::Cursor;
use std::time::Instant;

use image::GrayImage;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info};

pub use crate::instance_manager::OcrInstanceManager;
use crate::observability;
pub use crate::ocr_config::{ModelType, OcrConfig, PageSegMode};
pub use crate::ocr_errors::OcrError;

/// One recognized word and the engine's confidence in it.
///
/// `confidence` is `None` when the engine reported no usable value for the word.
#[derive(Debug, Clone, PartialEq)]
pub struct WordData {
    pub text: String,
    pub confidence: Option<f32>,
}

impl WordData {
    pub fn new(text: impl Into<String>, confidence: Option<f32>) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// The OCR capability consumed by scoring.
///
/// Implementations must be usable from several sweep workers at once.
pub trait OcrEngine: Send + Sync {
    /// Plain-text transcription of the image.
    fn ocr_text(&self, image: &GrayImage) -> Result<String, OcrError>;

    /// Word-level transcription with per-word confidence, in reading order.
    fn ocr_word_data(&self, image: &GrayImage) -> Result<Vec<WordData>, OcrError>;
}

/// Number of whitespace-separated words in a transcription
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

lazy_static! {
    static ref HOCR_WORD: Regex = Regex::new(
        r#"(?s)<span\s+class=['"]ocrx_word['"][^>]*?title=['"]([^'"]*)['"][^>]*>(.*?)</span>"#
    )
    .expect("hOCR word pattern is valid");
    static ref HOCR_CONFIDENCE: Regex =
        Regex::new(r"x_wconf\s+(-?\d+(?:\.\d+)?)").expect("hOCR confidence pattern is valid");
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").expect("tag pattern is valid");
}

/// Extract words and their confidences from Tesseract hOCR output.
///
/// Inline markup inside a word (`<strong>`, `<em>`) is removed and HTML entities are
/// decoded. Negative confidences are treated as missing.
///
/// # Examples
///
/// ```
/// use scan_sweep::ocr::parse_hocr_words;
///
/// let hocr = "<span class='ocrx_word' id='word_1_1' title='bbox 1 2 3 4; x_wconf 91'>Hello</span>";
/// let words = parse_hocr_words(hocr);
/// assert_eq!(words.len(), 1);
/// assert_eq!(words[0].text, "Hello");
/// assert_eq!(words[0].confidence, Some(91.0));
/// ```
pub fn parse_hocr_words(hocr: &str) -> Vec<WordData> {
    HOCR_WORD
        .captures_iter(hocr)
        .map(|caps| {
            let title = caps.get(1).map_or("", |m| m.as_str());
            let inner = caps.get(2).map_or("", |m| m.as_str());

            let confidence = HOCR_CONFIDENCE
                .captures(title)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse::<f32>().ok())
                .filter(|conf| *conf >= 0.0);

            let text = decode_entities(&HTML_TAG.replace_all(inner, ""));
            WordData::new(text.trim(), confidence)
        })
        .collect()
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Encode a grayscale image as PNG bytes for Leptonica
pub fn encode_png(image: &GrayImage) -> Result<Vec<u8>, OcrError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .map_err(|e| OcrError::ImageLoad(format!("Failed to encode image as PNG: {e}")))?;
    Ok(buffer.into_inner())
}

/// Tesseract-backed [`OcrEngine`]
///
/// Engines are pooled so concurrent workers never share a Tesseract handle.
///
/// # Examples
///
/// ```rust,no_run
/// use scan_sweep::ocr::{OcrConfig, OcrEngine, TesseractOcr};
/// use scan_sweep::preprocessing::load_grayscale;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let ocr = TesseractOcr::new(OcrConfig::default());
/// let page = load_grayscale("scan.png")?;
/// println!("{}", ocr.ocr_text(&page)?);
/// # Ok(())
/// # }
/// ```
pub struct TesseractOcr {
    instances: OcrInstanceManager,
}

impl TesseractOcr {
    pub fn new(config: OcrConfig) -> Self {
        Self {
            instances: OcrInstanceManager::new(config),
        }
    }

    /// Create one engine up front so configuration problems surface before a search
    pub fn check_available(&self) -> Result<(), OcrError> {
        let _instance = self
            .instances
            .checkout()
            .map_err(|e| OcrError::Initialization(e.to_string()))?;
        info!("OCR engine available");
        Ok(())
    }

    fn run<T>(
        &self,
        operation: &'static str,
        psm: PageSegMode,
        image: &GrayImage,
        extract: impl FnOnce(&mut leptess::LepTess) -> Result<T, OcrError>,
    ) -> Result<T, OcrError> {
        let span = observability::ocr_span(operation);
        let _enter = span.enter();
        let start = Instant::now();

        let png = encode_png(image)?;

        let result = (|| {
            let mut tess = self
                .instances
                .checkout()
                .map_err(|e| OcrError::Initialization(e.to_string()))?;

            tess.set_variable(leptess::Variable::TesseditPagesegMode, psm.as_str())
                .map_err(|e| OcrError::Initialization(format!("Failed to set PSM mode: {e:?}")))?;

            tess.set_image_from_mem(&png)
                .map_err(|e| OcrError::ImageLoad(format!("Failed to load image for OCR: {e:?}")))?;

            extract(&mut *tess)
        })();

        let elapsed = start.elapsed();
        observability::record_ocr_metrics(operation, result.is_ok(), elapsed);
        debug!(
            operation,
            duration_ms = elapsed.as_millis() as u64,
            width = image.width(),
            height = image.height(),
            success = result.is_ok(),
            "OCR call finished"
        );

        result
    }
}

impl OcrEngine for TesseractOcr {
    fn ocr_text(&self, image: &GrayImage) -> Result<String, OcrError> {
        let psm = self.instances.config().text_psm;
        self.run("ocr_text", psm, image, |tess| {
            tess.get_utf8_text().map_err(|e| {
                OcrError::Extraction(format!("Failed to extract text from image: {e}"))
            })
        })
    }

    fn ocr_word_data(&self, image: &GrayImage) -> Result<Vec<WordData>, OcrError> {
        let psm = self.instances.config().word_data_psm;
        self.run("ocr_word_data", psm, image, |tess| {
            let hocr = tess.get_hocr_text(0).map_err(|e| {
                OcrError::Extraction(format!("Failed to extract hOCR from image: {e}"))
            })?;
            Ok(parse_hocr_words(&hocr))
        })
    }
}
