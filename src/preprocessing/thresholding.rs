//! # Image Thresholding Module
//!
//! This module provides the binarization primitives swept by the search:
//! fixed global thresholds, Otsu's automatic threshold, and adaptive (local)
//! thresholds with a mean or Gaussian neighbourhood.

use image::GrayImage;
use tracing;

use super::types::{AdaptiveMethod, PreprocessingError, ThresholdMode, ThresholdedImageResult};

/// Applies a fixed global threshold to every pixel.
///
/// The comparison is strict: a pixel equal to `value` counts as "not above".
/// The input is left untouched; a new buffer is returned.
pub fn threshold(image: &GrayImage, value: u8, max_value: u8, mode: ThresholdMode) -> GrayImage {
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        let intensity = pixel[0];
        let above = intensity > value;
        pixel[0] = match mode {
            ThresholdMode::Binary => {
                if above {
                    max_value
                } else {
                    0
                }
            }
            ThresholdMode::BinaryInverted => {
                if above {
                    0
                } else {
                    max_value
                }
            }
            ThresholdMode::Truncate => {
                if above {
                    value
                } else {
                    intensity
                }
            }
            ThresholdMode::ToZero => {
                if above {
                    intensity
                } else {
                    0
                }
            }
            ThresholdMode::ToZeroInverted => {
                if above {
                    0
                } else {
                    intensity
                }
            }
        };
    }
    output
}

/// Applies Otsu's thresholding algorithm to convert an image to binary (black/white).
///
/// This function automatically determines the optimal threshold value using Otsu's method,
/// which maximizes the between-class variance. Pixels above the threshold become white.
///
/// # Examples
///
/// ```no_run
/// use scan_sweep::preprocessing::{apply_otsu_threshold, load_grayscale};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let img = load_grayscale("scan.png")?;
/// let thresholded = apply_otsu_threshold(&img);
/// println!("Optimal threshold: {}", thresholded.threshold);
/// # Ok(())
/// # }
/// ```
pub fn apply_otsu_threshold(image: &GrayImage) -> ThresholdedImageResult {
    let start_time = std::time::Instant::now();

    // Calculate histogram
    let mut histogram = [0u32; 256];
    let total_pixels = (image.width() as f64) * (image.height() as f64);

    for pixel in image.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let optimal_threshold = find_otsu_threshold(&histogram, total_pixels);
    let binary_img = threshold(image, optimal_threshold, 255, ThresholdMode::Binary);

    tracing::debug!(
        target: "preprocessing",
        "Otsu thresholding completed in {}ms: threshold={}, dimensions={}x{}",
        start_time.elapsed().as_millis(),
        optimal_threshold,
        image.width(),
        image.height()
    );

    ThresholdedImageResult {
        image: binary_img,
        threshold: optimal_threshold,
    }
}

/// Finds the optimal threshold using Otsu's method by maximizing between-class variance.
///
/// Returns 128 when no split separates two non-empty classes (uniform or empty image).
fn find_otsu_threshold(histogram: &[u32; 256], total_pixels: f64) -> u8 {
    let mut cumulative_sum = 0f64;
    let mut cumulative_weighted_sum = 0f64;

    let mut cumulative_sums = [0f64; 256];
    let mut cumulative_weighted_sums = [0f64; 256];

    for i in 0..256 {
        let pixel_count = histogram[i] as f64;
        cumulative_sum += pixel_count;
        cumulative_weighted_sum += (i as f64) * pixel_count;

        cumulative_sums[i] = cumulative_sum;
        cumulative_weighted_sums[i] = cumulative_weighted_sum;
    }

    let mut max_variance = 0f64;
    let mut optimal_threshold = 128u8;

    let total_weighted_sum = cumulative_weighted_sums[255];

    for threshold_idx in 0..255usize {
        // Weight of background class (pixels <= threshold)
        let w0 = cumulative_sums[threshold_idx] / total_pixels;
        let w1 = 1.0 - w0;

        if w0 <= 0.0 || w1 <= 0.0 || !w0.is_finite() {
            continue;
        }

        let mu0 = cumulative_weighted_sums[threshold_idx] / cumulative_sums[threshold_idx];
        let mu1 = (total_weighted_sum - cumulative_weighted_sums[threshold_idx])
            / (cumulative_sums[255] - cumulative_sums[threshold_idx]);

        let variance = w0 * w1 * (mu0 - mu1).powi(2);

        if variance > max_variance {
            max_variance = variance;
            optimal_threshold = threshold_idx as u8;
        }
    }

    optimal_threshold
}

/// Applies an adaptive threshold: each pixel is compared with a local threshold
/// computed over its `block_size` x `block_size` neighbourhood minus `c`.
///
/// A pixel becomes `max_value` when `pixel - local > -c`, otherwise 0. Borders are
/// handled by replicating edge pixels. `block_size` must be odd and at least 3.
pub fn adaptive_threshold(
    image: &GrayImage,
    max_value: u8,
    method: AdaptiveMethod,
    block_size: u32,
    c: i32,
) -> Result<GrayImage, PreprocessingError> {
    if block_size < 3 || block_size % 2 == 0 {
        return Err(PreprocessingError::InvalidParameter {
            name: "block size",
            value: i64::from(block_size),
        });
    }

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Ok(image.clone());
    }

    let local = local_mean(image, method, block_size);

    Ok(GrayImage::from_fn(width, height, |x, y| {
        let src = i32::from(image.get_pixel(x, y)[0]);
        let mean = i32::from(local.get_pixel(x, y)[0]);
        if src - mean > -c {
            image::Luma([max_value])
        } else {
            image::Luma([0u8])
        }
    }))
}

/// Standard deviation used for a Gaussian block when none is given explicitly.
pub fn gaussian_sigma_for_block(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Local threshold surface: box mean or Gaussian-weighted mean over the block,
/// both with replicated borders.
fn local_mean(image: &GrayImage, method: AdaptiveMethod, block_size: u32) -> GrayImage {
    match method {
        AdaptiveMethod::Mean => {
            let radius = block_size / 2;
            imageproc::filter::box_filter(image, radius, radius)
        }
        AdaptiveMethod::Gaussian => {
            imageproc::filter::gaussian_blur_f32(image, gaussian_sigma_for_block(block_size))
        }
    }
}
