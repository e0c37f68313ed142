//! # Application Error Types
//!
//! This module defines the error types shared by the search core and its drivers.
//! It provides structured error handling for the whole-search outcomes and for
//! driver-level failures (configuration, file system, OCR engine setup).

use std::fmt;

/// Whole-search failure conditions surfaced by `find_best_image`.
///
/// Per-candidate failures never appear here: a candidate whose transform or OCR
/// call fails is logged and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    /// The unmodified image yields zero recognizable words; no candidate was evaluated
    NoTextFound,
    /// Every candidate failed the retained-word-ratio gate (confidence mode only)
    NoAcceptableCandidate,
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::NoTextFound => {
                write!(f, "[NO_TEXT] Could not find any text in the image")
            }
            SearchError::NoAcceptableCandidate => write!(
                f,
                "[NO_CANDIDATE] No preprocessed image kept enough of the original text"
            ),
        }
    }
}

impl std::error::Error for SearchError {}

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// OCR processing errors
    Ocr(String),
    /// Image transform errors
    Preprocessing(String),
    /// File system errors
    FileSystem(String),
    /// Whole-search failures
    Search(SearchError),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Ocr(msg) => write!(f, "[OCR] {}", msg),
            AppError::Preprocessing(msg) => write!(f, "[PREPROCESSING] {}", msg),
            AppError::FileSystem(msg) => write!(f, "[FILESYSTEM] {}", msg),
            AppError::Search(err) => write!(f, "[SEARCH] {}", err),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileSystem(err.to_string())
    }
}

impl From<crate::ocr_errors::OcrError> for AppError {
    fn from(err: crate::ocr_errors::OcrError) -> Self {
        AppError::Ocr(err.to_string())
    }
}

impl From<crate::preprocessing::PreprocessingError> for AppError {
    fn from(err: crate::preprocessing::PreprocessingError) -> Self {
        AppError::Preprocessing(err.to_string())
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        AppError::Search(err)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting
pub mod error_logging {
    use tracing::{error, warn};

    /// Log a candidate that could not be scored. The sweep continues.
    pub fn log_candidate_failure(
        error: &impl std::fmt::Display,
        stage: &str,
        method: &str,
        parameters: &str,
    ) {
        warn!(
            target: "search",
            error = %error,
            stage = %stage,
            method = %method,
            parameters = %parameters,
            "Candidate skipped"
        );
    }

    /// Log OCR processing errors with image context
    pub fn log_ocr_error(
        error: &impl std::fmt::Display,
        operation: &str,
        image_dimensions: Option<(u32, u32)>,
        processing_duration: Option<std::time::Duration>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            image_dimensions = ?image_dimensions,
            processing_duration_ms = ?processing_duration.map(|d| d.as_millis()),
            "OCR processing failed"
        );
    }

    /// Log file system errors with path and operation context
    pub fn log_filesystem_error(
        error: &impl std::fmt::Display,
        operation: &str,
        path: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            path = ?path,
            "File system operation failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_error_messages_are_distinct() {
        let no_text = SearchError::NoTextFound.to_string();
        let no_candidate = SearchError::NoAcceptableCandidate.to_string();

        assert!(no_text.starts_with("[NO_TEXT]"));
        assert!(no_candidate.starts_with("[NO_CANDIDATE]"));
        assert_ne!(no_text, no_candidate);
    }

    #[test]
    fn test_app_error_from_search_error() {
        let err: AppError = SearchError::NoTextFound.into();
        assert_eq!(err, AppError::Search(SearchError::NoTextFound));
        assert!(err.to_string().contains("[SEARCH]"));
    }

    #[test]
    fn test_app_error_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.png");
        let err: AppError = io.into();
        match err {
            AppError::FileSystem(msg) => assert!(msg.contains("missing.png")),
            other => panic!("unexpected variant: {:?}", other),
        }
    }
}
