//! # Bulk Accuracy
//!
//! Measures how well Otsu thresholding alone recovers text over a whole data set of
//! noisy scans and their clean counterparts.
//!
//! Both directories are listed in file-name order (hidden files skipped) and paired by
//! position. A pair is compared only when both names carry a supported image extension.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::{error_logging, AppError, AppResult};
use crate::ocr::OcrEngine;
use crate::preprocessing::{load_grayscale, ImageOps};
use crate::similarity::calculate_accuracy;

/// Image extensions considered by the bulk comparison (case-insensitive)
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "tiff"];

/// Accuracy of one noisy/clean pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairAccuracy {
    pub noisy: PathBuf,
    pub clean: PathBuf,
    pub accuracy: f64,
}

/// Outcome of a bulk comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkAccuracyReport {
    pub pairs: Vec<PairAccuracy>,
    pub comparisons: usize,
    pub average_accuracy: f64,
}

/// Whether a file name has one of the [`SUPPORTED_EXTENSIONS`]
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Non-hidden entries of a directory, sorted by file name
pub fn sorted_entries(dir: &Path) -> AppResult<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| {
        error_logging::log_filesystem_error(&e, "read_dir", dir.to_str());
        AppError::FileSystem(format!("Cannot read directory {}: {}", dir.display(), e))
    })? {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden {
            entries.push(entry.path());
        }
    }
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}

/// Pair two sorted listings by position, keeping pairs of supported images.
///
/// Extra entries in the longer listing are ignored.
pub fn pair_images(noisy: &[PathBuf], clean: &[PathBuf]) -> Vec<(PathBuf, PathBuf)> {
    noisy
        .iter()
        .zip(clean)
        .filter(|(n, c)| is_supported_image(n) && is_supported_image(c))
        .map(|(n, c)| (n.clone(), c.clone()))
        .collect()
}

/// Otsu-threshold every noisy image, OCR it and its clean pair, and average the accuracies.
///
/// Pairs that fail to load or OCR are logged and left out of the average.
///
/// # Errors
///
/// Directory read failures, and a data set with no successful comparison.
pub fn bulk_accuracy(
    ops: &dyn ImageOps,
    ocr: &dyn OcrEngine,
    noisy_dir: &Path,
    clean_dir: &Path,
) -> AppResult<BulkAccuracyReport> {
    let pairs = pair_images(&sorted_entries(noisy_dir)?, &sorted_entries(clean_dir)?);
    info!(
        noisy_dir = %noisy_dir.display(),
        clean_dir = %clean_dir.display(),
        pairs = pairs.len(),
        "Starting bulk accuracy comparison"
    );

    let mut results = Vec::with_capacity(pairs.len());
    for (noisy, clean) in pairs {
        match compare_pair(ops, ocr, &noisy, &clean) {
            Ok(accuracy) => {
                debug!(noisy = %noisy.display(), accuracy, "Pair compared");
                results.push(PairAccuracy {
                    noisy,
                    clean,
                    accuracy,
                });
            }
            Err(e) => warn!(
                error = %e,
                noisy = %noisy.display(),
                clean = %clean.display(),
                "Pair skipped"
            ),
        }
    }

    if results.is_empty() {
        return Err(AppError::Internal(
            "No valid image pairs found for comparison".to_string(),
        ));
    }

    let comparisons = results.len();
    let average_accuracy = results.iter().map(|r| r.accuracy).sum::<f64>() / comparisons as f64;
    info!(
        comparisons,
        average_accuracy,
        "Bulk accuracy comparison finished"
    );

    Ok(BulkAccuracyReport {
        pairs: results,
        comparisons,
        average_accuracy,
    })
}

fn compare_pair(
    ops: &dyn ImageOps,
    ocr: &dyn OcrEngine,
    noisy: &Path,
    clean: &Path,
) -> AppResult<f64> {
    let noisy_image = load_grayscale(noisy)?;
    let clean_image = load_grayscale(clean)?;

    let thresholded = ops.otsu_threshold(&noisy_image);
    let text = ocr.ocr_text(&thresholded.image)?;
    let reference = ocr.ocr_text(&clean_image)?;

    Ok(calculate_accuracy(&text, &reference))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_supported_image() {
        assert!(is_supported_image(Path::new("scan.png")));
        assert!(is_supported_image(Path::new("scan.JPEG")));
        assert!(is_supported_image(Path::new("dir/scan.tiff")));
        assert!(!is_supported_image(Path::new("scan.tif")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("README")));
    }

    #[test]
    fn test_pair_images_by_position() {
        let noisy: Vec<PathBuf> = ["a.png", "b.txt", "c.png", "d.png"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let clean: Vec<PathBuf> = ["a.png", "b.png", "c.bmp"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let pairs = pair_images(&noisy, &clean);

        assert_eq!(
            pairs,
            vec![
                (PathBuf::from("a.png"), PathBuf::from("a.png")),
                (PathBuf::from("c.png"), PathBuf::from("c.bmp")),
            ]
        );
    }

    #[test]
    fn test_sorted_entries_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", ".hidden.png", "a.png"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let names: Vec<String> = sorted_entries(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_missing_directory_is_filesystem_error() {
        let result = sorted_entries(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(AppError::FileSystem(_))));
    }
}
