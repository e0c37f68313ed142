//! # Shared Types for Image Preprocessing
//!
//! This module contains the shared types, enums and the transform trait used
//! across the preprocessing sub-modules and by the search coordinator.

use image::GrayImage;

/// Errors that can occur during image preprocessing operations.
#[derive(Debug, Clone, PartialEq)]
pub enum PreprocessingError {
    /// A transform parameter is outside its valid domain
    InvalidParameter { name: &'static str, value: i64 },
    /// Image processing operation failed
    ProcessingFailed { message: String },
    /// Failed to load, decode or encode an image
    ImageLoad { message: String },
}

impl std::fmt::Display for PreprocessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreprocessingError::InvalidParameter { name, value } => {
                write!(
                    f,
                    "Invalid {}: {}. Must be an odd value of at least 3",
                    name, value
                )
            }
            PreprocessingError::ProcessingFailed { message } => {
                write!(f, "Image processing failed: {}", message)
            }
            PreprocessingError::ImageLoad { message } => {
                write!(f, "Failed to load image: {}", message)
            }
        }
    }
}

impl std::error::Error for PreprocessingError {}

/// Fixed global threshold modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMode {
    /// `pixel > value ? max : 0`
    Binary,
    /// `pixel > value ? 0 : max`
    BinaryInverted,
    /// `pixel > value ? value : pixel`
    Truncate,
    /// `pixel > value ? pixel : 0`
    ToZero,
    /// `pixel > value ? 0 : pixel`
    ToZeroInverted,
}

/// How the local threshold of an adaptive threshold is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveMethod {
    /// Unweighted mean of the block
    Mean,
    /// Gaussian-weighted mean of the block
    Gaussian,
}

impl AdaptiveMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdaptiveMethod::Mean => "Mean",
            AdaptiveMethod::Gaussian => "Gaussian",
        }
    }
}

/// Result of an Otsu thresholding operation.
#[derive(Debug, Clone)]
pub struct ThresholdedImageResult {
    /// The thresholded binary image
    pub image: GrayImage,
    /// Optimal threshold value found by Otsu's method
    pub threshold: u8,
}

/// The image-transform primitives a search consumes.
///
/// Every method takes the source by reference and returns a new buffer; the
/// source is never mutated. `StandardImageOps` is the production implementation,
/// tests substitute their own.
pub trait ImageOps: Send + Sync {
    /// Fixed global threshold.
    fn threshold(
        &self,
        image: &GrayImage,
        value: u8,
        max_value: u8,
        mode: ThresholdMode,
    ) -> GrayImage;

    /// Global threshold chosen by Otsu's method, returned with the binary image.
    fn otsu_threshold(&self, image: &GrayImage) -> ThresholdedImageResult;

    /// Locally computed threshold per `block_size` x `block_size` neighbourhood.
    fn adaptive_threshold(
        &self,
        image: &GrayImage,
        max_value: u8,
        method: AdaptiveMethod,
        block_size: u32,
        c: i32,
    ) -> Result<GrayImage, PreprocessingError>;

    /// Neighbourhood median smoothing.
    fn median_filter(
        &self,
        image: &GrayImage,
        kernel_size: u32,
    ) -> Result<GrayImage, PreprocessingError>;

    /// Thicken dark text strokes (invert, 2x2 dilation, un-invert).
    fn dilate_bold(&self, image: &GrayImage) -> GrayImage;
}

/// Production transforms backed by this crate's preprocessing functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardImageOps;

impl ImageOps for StandardImageOps {
    fn threshold(
        &self,
        image: &GrayImage,
        value: u8,
        max_value: u8,
        mode: ThresholdMode,
    ) -> GrayImage {
        super::thresholding::threshold(image, value, max_value, mode)
    }

    fn otsu_threshold(&self, image: &GrayImage) -> ThresholdedImageResult {
        super::thresholding::apply_otsu_threshold(image)
    }

    fn adaptive_threshold(
        &self,
        image: &GrayImage,
        max_value: u8,
        method: AdaptiveMethod,
        block_size: u32,
        c: i32,
    ) -> Result<GrayImage, PreprocessingError> {
        super::thresholding::adaptive_threshold(image, max_value, method, block_size, c)
    }

    fn median_filter(
        &self,
        image: &GrayImage,
        kernel_size: u32,
    ) -> Result<GrayImage, PreprocessingError> {
        super::filtering::median_filter(image, kernel_size)
    }

    fn dilate_bold(&self, image: &GrayImage) -> GrayImage {
        super::filtering::dilate_bold(image)
    }
}
