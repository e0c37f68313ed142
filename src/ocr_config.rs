//! # OCR Configuration Module
//!
//! This module defines configuration structures for the Tesseract OCR collaborator:
//! languages, model type and the page segmentation modes used for plain text and
//! word-level data.

use std::env;

use crate::errors::{AppError, AppResult};

// Constants for OCR configuration
pub const DEFAULT_LANGUAGES: &str = "eng";
pub const DEFAULT_POOL_SIZE: usize = 16;

/// Page Segmentation Mode for Tesseract OCR
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageSegMode {
    /// Orientation and script detection (OSD) only
    OsdOnly = 0,
    /// Automatic page segmentation with OSD
    AutoOsd = 1,
    /// Automatic page segmentation, no OSD
    AutoNoOsd = 2,
    /// Fully automatic page segmentation
    #[default]
    Auto = 3,
    /// Assume a single column of text
    SingleColumn = 4,
    /// Assume a single uniform block of vertically aligned text
    SingleBlockVert = 5,
    /// Assume a single uniform block of text
    SingleBlock = 6,
    /// Treat the image as a single text line
    SingleLine = 7,
    /// Treat the image as a single word
    SingleWord = 8,
    /// Treat the image as a single word in a circle
    WordInCircle = 9,
    /// Treat the image as a single character
    SingleChar = 10,
    /// Find as much text as possible in no particular order
    SparseText = 11,
    /// Sparse text with OSD
    SparseTextOsd = 12,
    /// Treat the image as a single text line, bypassing hacks that are Tesseract-specific
    RawLine = 13,
}

impl PageSegMode {
    /// Convert PSM mode to string value for Tesseract
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSegMode::OsdOnly => "0",
            PageSegMode::AutoOsd => "1",
            PageSegMode::AutoNoOsd => "2",
            PageSegMode::Auto => "3",
            PageSegMode::SingleColumn => "4",
            PageSegMode::SingleBlockVert => "5",
            PageSegMode::SingleBlock => "6",
            PageSegMode::SingleLine => "7",
            PageSegMode::SingleWord => "8",
            PageSegMode::WordInCircle => "9",
            PageSegMode::SingleChar => "10",
            PageSegMode::SparseText => "11",
            PageSegMode::SparseTextOsd => "12",
            PageSegMode::RawLine => "13",
        }
    }

    /// Parse the numeric Tesseract value (as used on the tesseract command line)
    pub fn from_value(value: &str) -> Option<Self> {
        let mode = match value.trim() {
            "0" => PageSegMode::OsdOnly,
            "1" => PageSegMode::AutoOsd,
            "2" => PageSegMode::AutoNoOsd,
            "3" => PageSegMode::Auto,
            "4" => PageSegMode::SingleColumn,
            "5" => PageSegMode::SingleBlockVert,
            "6" => PageSegMode::SingleBlock,
            "7" => PageSegMode::SingleLine,
            "8" => PageSegMode::SingleWord,
            "9" => PageSegMode::WordInCircle,
            "10" => PageSegMode::SingleChar,
            "11" => PageSegMode::SparseText,
            "12" => PageSegMode::SparseTextOsd,
            "13" => PageSegMode::RawLine,
            _ => return None,
        };
        Some(mode)
    }
}

/// Tesseract model type for different accuracy/speed trade-offs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ModelType {
    /// Fast model (tessdata_fast) - faster processing, lower accuracy
    #[default]
    Fast,
    /// Best model (tessdata_best) - slower processing, higher accuracy
    Best,
}

impl ModelType {
    /// Get the tessdata directory name for this model type
    pub fn tessdata_dir(&self) -> &'static str {
        match self {
            ModelType::Fast => "tessdata_fast",
            ModelType::Best => "tessdata_best",
        }
    }
}

/// Configuration structure for OCR processing
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// OCR language codes (e.g., "eng", "eng+fra", "deu")
    pub languages: String,
    /// Tesseract model type (Fast vs Best accuracy)
    pub model_type: ModelType,
    /// Page segmentation mode for plain-text transcription
    pub text_psm: PageSegMode,
    /// Page segmentation mode for word-level confidence data
    pub word_data_psm: PageSegMode,
    /// Maximum number of idle engines kept for reuse
    pub pool_size: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            languages: DEFAULT_LANGUAGES.to_string(),
            model_type: ModelType::default(),
            text_psm: PageSegMode::Auto,
            word_data_psm: PageSegMode::SingleBlock,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl OcrConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(languages) = env::var("OCR_LANGUAGES") {
            config.languages = languages;
        }
        config.model_type = match env::var("OCR_MODEL_TYPE")
            .unwrap_or_else(|_| "fast".to_string())
            .to_lowercase()
            .as_str()
        {
            "fast" => ModelType::Fast,
            "best" => ModelType::Best,
            other => {
                return Err(AppError::Config(format!(
                    "OCR_MODEL_TYPE must be 'fast' or 'best', got '{}'",
                    other
                )))
            }
        };
        if let Ok(psm) = env::var("OCR_TEXT_PSM") {
            config.text_psm = PageSegMode::from_value(&psm).ok_or_else(|| {
                AppError::Config("OCR_TEXT_PSM must be a number between 0 and 13".to_string())
            })?;
        }
        if let Ok(psm) = env::var("OCR_WORD_DATA_PSM") {
            config.word_data_psm = PageSegMode::from_value(&psm).ok_or_else(|| {
                AppError::Config("OCR_WORD_DATA_PSM must be a number between 0 and 13".to_string())
            })?;
        }
        config.pool_size = env::var("OCR_POOL_SIZE")
            .unwrap_or_else(|_| DEFAULT_POOL_SIZE.to_string())
            .parse()
            .map_err(|_| AppError::Config("OCR_POOL_SIZE must be a valid number".to_string()))?;

        Ok(config)
    }

    /// Validate OCR configuration parameters
    pub fn validate(&self) -> AppResult<()> {
        if self.languages.trim().is_empty() {
            return Err(AppError::Config("languages cannot be empty".to_string()));
        }

        if self.pool_size == 0 {
            return Err(AppError::Config(
                "pool_size must be greater than 0".to_string(),
            ));
        }

        // OSD-only mode produces no text at all
        if self.text_psm == PageSegMode::OsdOnly || self.word_data_psm == PageSegMode::OsdOnly {
            return Err(AppError::Config(
                "OSD-only page segmentation cannot be used for text recognition".to_string(),
            ));
        }

        Ok(())
    }
}
