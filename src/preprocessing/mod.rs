//! # Image Preprocessing Module
//!
//! This module provides the image-transform primitives swept by the best-image search.
//! Every transform returns a new grayscale buffer; inputs are never mutated in place.
//!
//! The module is organized into focused sub-modules:
//! - `thresholding`: fixed, Otsu and adaptive binarization
//! - `filtering`: median smoothing and bold-stroke dilation
//! - `types`: shared types, errors and the `ImageOps` trait

pub mod filtering;
pub mod thresholding;
pub mod types;

use std::path::Path;

use image::GrayImage;

// Re-export commonly used types and functions for convenience
pub use types::{
    AdaptiveMethod, ImageOps, PreprocessingError, StandardImageOps, ThresholdMode,
    ThresholdedImageResult,
};

pub use filtering::{dilate_bold, median_filter};
pub use thresholding::{adaptive_threshold, apply_otsu_threshold, threshold};

/// Loads an image from disk and converts it to 8-bit grayscale.
pub fn load_grayscale(path: impl AsRef<Path>) -> Result<GrayImage, PreprocessingError> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|e| PreprocessingError::ImageLoad {
        message: format!("{}: {}", path.display(), e),
    })?;
    Ok(image.to_luma8())
}

/// Writes a grayscale image to disk; the format follows the file extension.
pub fn save_image(path: impl AsRef<Path>, image: &GrayImage) -> Result<(), PreprocessingError> {
    let path = path.as_ref();
    image.save(path).map_err(|e| PreprocessingError::ImageLoad {
        message: format!("{}: {}", path.display(), e),
    })
}
