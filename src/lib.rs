//! # Scan Sweep
//!
//! Finds the preprocessing of a noisy scanned document that OCRs best. Hundreds of
//! binarization and filtering configurations are swept, each result is scored by OCR
//! confidence (or by similarity to a clean reference) and the best image is kept.

pub mod bulk;
pub mod candidates;
pub mod config;
pub mod errors;
pub mod instance_manager;
pub mod observability;
pub mod observability_config;
pub mod ocr;
pub mod ocr_config;
pub mod ocr_errors;
pub mod preprocessing;
pub mod registry;
pub mod scoring;
pub mod search;
pub mod similarity;

// Re-export types for easier access
pub use errors::SearchError;
pub use registry::{BestImageRegistry, ScoredResult};
pub use search::{SearchCoordinator, SearchProgress};
pub use similarity::calculate_accuracy;
