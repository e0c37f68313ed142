//! # OCR Error Types Module
//!
//! This module defines custom error types used by the OCR collaborator.
//! A failing OCR call on one candidate is never fatal to a search; these errors
//! surface only from driver-level calls (original word count, reference text, bulk runs).

/// Custom error types for OCR operations
#[derive(Debug, Clone, PartialEq)]
pub enum OcrError {
    /// OCR engine initialization errors
    Initialization(String),
    /// Image encoding or loading errors
    ImageLoad(String),
    /// Text extraction errors
    Extraction(String),
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrError::Initialization(msg) => {
                write!(f, "[OCR_INIT] OCR engine initialization failed: {}", msg)
            }
            OcrError::ImageLoad(msg) => write!(
                f,
                "[IMAGE_LOAD] Failed to load image for OCR processing: {}",
                msg
            ),
            OcrError::Extraction(msg) => write!(
                f,
                "[OCR_EXTRACT] Text extraction from image failed: {}",
                msg
            ),
        }
    }
}

impl std::error::Error for OcrError {}
