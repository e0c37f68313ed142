//! # Image Filtering Module
//!
//! This module provides the smoothing and morphological primitives used by the search:
//! median filtering for salt-and-pepper noise and the "bold" stroke thickening applied
//! as a post-process after any base transform.

use image::GrayImage;
use tracing;

use super::types::PreprocessingError;

/// Applies a median filter with a square `kernel_size` x `kernel_size` window.
///
/// `kernel_size` must be odd and at least 3. Edge pixels are handled by
/// replicating the border.
///
/// # Examples
///
/// ```
/// use image::GrayImage;
/// use scan_sweep::preprocessing::median_filter;
///
/// let img = GrayImage::from_pixel(8, 8, image::Luma([200]));
/// let smoothed = median_filter(&img, 5).unwrap();
/// assert_eq!(smoothed.get_pixel(3, 3)[0], 200);
/// ```
pub fn median_filter(image: &GrayImage, kernel_size: u32) -> Result<GrayImage, PreprocessingError> {
    if kernel_size < 3 || kernel_size % 2 == 0 {
        return Err(PreprocessingError::InvalidParameter {
            name: "kernel size",
            value: i64::from(kernel_size),
        });
    }

    let start_time = std::time::Instant::now();
    let radius = kernel_size / 2;
    let filtered = imageproc::filter::median_filter(image, radius, radius);

    tracing::debug!(
        target: "preprocessing",
        "Median filter completed in {}ms: kernel={}, dimensions={}x{}",
        start_time.elapsed().as_millis(),
        kernel_size,
        filtered.width(),
        filtered.height()
    );

    Ok(filtered)
}

/// Thickens dark text strokes on a light page.
///
/// The image is inverted so text becomes the bright foreground, dilated once with a
/// 2x2 structuring element, then inverted back. The input is left untouched.
pub fn dilate_bold(image: &GrayImage) -> GrayImage {
    let mut inverted = image.clone();
    image::imageops::invert(&mut inverted);

    let mut dilated = apply_dilation_2x2(&inverted);
    image::imageops::invert(&mut dilated);
    dilated
}

/// Applies dilation with a 2x2 structuring element anchored at its bottom-right cell.
///
/// Each output pixel is the maximum of itself and its left, upper and upper-left
/// neighbours; neighbours outside the image are ignored.
fn apply_dilation_2x2(image: &GrayImage) -> GrayImage {
    let (width, height) = image.dimensions();
    let mut result = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut max_val = image.get_pixel(x, y)[0];
            if x > 0 {
                max_val = max_val.max(image.get_pixel(x - 1, y)[0]);
            }
            if y > 0 {
                max_val = max_val.max(image.get_pixel(x, y - 1)[0]);
            }
            if x > 0 && y > 0 {
                max_val = max_val.max(image.get_pixel(x - 1, y - 1)[0]);
            }
            result.put_pixel(x, y, image::Luma([max_val]));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_filter_removes_salt_noise() {
        let mut img = GrayImage::from_pixel(9, 9, image::Luma([0]));
        img.put_pixel(4, 4, image::Luma([255]));

        let filtered = median_filter(&img, 3).expect("odd kernel is valid");
        assert_eq!(filtered.get_pixel(4, 4)[0], 0);
    }

    #[test]
    fn test_median_filter_rejects_invalid_kernels() {
        let img = GrayImage::from_pixel(4, 4, image::Luma([0]));
        assert!(median_filter(&img, 4).is_err());
        assert!(median_filter(&img, 1).is_err());
        assert!(median_filter(&img, 0).is_err());
    }

    #[test]
    fn test_dilate_bold_thickens_dark_pixel() {
        let mut img = GrayImage::from_pixel(4, 4, image::Luma([255]));
        img.put_pixel(1, 1, image::Luma([0]));

        let bold = dilate_bold(&img);

        // The dark pixel spreads right, down and diagonally
        assert_eq!(bold.get_pixel(1, 1)[0], 0);
        assert_eq!(bold.get_pixel(2, 1)[0], 0);
        assert_eq!(bold.get_pixel(1, 2)[0], 0);
        assert_eq!(bold.get_pixel(2, 2)[0], 0);

        // but never up or left
        assert_eq!(bold.get_pixel(0, 1)[0], 255);
        assert_eq!(bold.get_pixel(1, 0)[0], 255);

        let dark = bold.pixels().filter(|p| p[0] == 0).count();
        assert_eq!(dark, 4);
    }

    #[test]
    fn test_dilate_bold_leaves_input_untouched() {
        let mut img = GrayImage::from_pixel(3, 3, image::Luma([255]));
        img.put_pixel(0, 0, image::Luma([0]));
        let before = img.clone();

        let _ = dilate_bold(&img);
        assert_eq!(img, before);
    }

    #[test]
    fn test_dilate_bold_blank_page_is_unchanged() {
        let img = GrayImage::from_pixel(5, 5, image::Luma([255]));
        assert_eq!(dilate_bold(&img), img);
    }
}
