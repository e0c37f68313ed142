//! # Candidate Generator
//!
//! Enumerates the preprocessing configurations a search evaluates and applies them.
//!
//! | Family | Parameter | Range | Candidates |
//! |---|---|---|---|
//! | Otsu | none | - | 2 |
//! | Binary threshold | threshold | 100..=200 | 202 |
//! | Adaptive mean | C constant (block 255) | 0..=100 | 202 |
//! | Adaptive gaussian | C constant (block 255) | 0..=100 | 202 |
//! | Median filter | kernel size | 3, 5, ..., 21 | 20 |
//!
//! Every configuration runs once as is and once followed by the bold transform.

use std::fmt;
use std::ops::RangeInclusive;

use image::GrayImage;

use crate::preprocessing::{AdaptiveMethod, ImageOps, PreprocessingError, ThresholdMode};

/// Global threshold values swept by the binary family
pub const BINARY_THRESHOLDS: RangeInclusive<u8> = 100..=200;
/// C constants swept by both adaptive families
pub const ADAPTIVE_C_CONSTANTS: RangeInclusive<i32> = 0..=100;
/// Neighbourhood size used by both adaptive families
pub const ADAPTIVE_BLOCK_SIZE: u32 = 255;
/// Smallest median kernel
pub const MEDIAN_KERNEL_MIN: u32 = 3;
/// Largest median kernel
pub const MEDIAN_KERNEL_MAX: u32 = 21;
/// Foreground value written by the threshold transforms
pub const MAX_VALUE: u8 = 255;

/// Total number of candidates produced by [`generate_candidates`]
pub const TOTAL_CANDIDATES: usize = 628;

/// The five transform families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodFamily {
    Otsu,
    BinaryThreshold,
    AdaptiveMean,
    AdaptiveGaussian,
    MedianFilter,
}

impl MethodFamily {
    /// Human-readable method label reported with a result
    pub fn label(&self) -> &'static str {
        match self {
            MethodFamily::Otsu => "Otsu's Thresholding",
            MethodFamily::BinaryThreshold => "Binary Thresholding",
            MethodFamily::AdaptiveMean | MethodFamily::AdaptiveGaussian => "Adaptive Thresholding",
            MethodFamily::MedianFilter => "Median Filtering",
        }
    }

    /// Short identifier used in logs and metric labels
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodFamily::Otsu => "otsu",
            MethodFamily::BinaryThreshold => "binary_threshold",
            MethodFamily::AdaptiveMean => "adaptive_mean",
            MethodFamily::AdaptiveGaussian => "adaptive_gaussian",
            MethodFamily::MedianFilter => "median_filter",
        }
    }

    /// Every parameter value of this family, in ascending order
    pub fn sweep(&self) -> Vec<Method> {
        match self {
            MethodFamily::Otsu => vec![Method::Otsu],
            MethodFamily::BinaryThreshold => BINARY_THRESHOLDS
                .map(|threshold| Method::BinaryThreshold { threshold })
                .collect(),
            MethodFamily::AdaptiveMean => ADAPTIVE_C_CONSTANTS
                .map(|c| Method::AdaptiveMean { c })
                .collect(),
            MethodFamily::AdaptiveGaussian => ADAPTIVE_C_CONSTANTS
                .map(|c| Method::AdaptiveGaussian { c })
                .collect(),
            MethodFamily::MedianFilter => (MEDIAN_KERNEL_MIN..=MEDIAN_KERNEL_MAX)
                .step_by(2)
                .map(|kernel_size| Method::MedianFilter { kernel_size })
                .collect(),
        }
    }
}

/// One transform with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Otsu,
    BinaryThreshold { threshold: u8 },
    AdaptiveMean { c: i32 },
    AdaptiveGaussian { c: i32 },
    MedianFilter { kernel_size: u32 },
}

impl Method {
    pub fn family(&self) -> MethodFamily {
        match self {
            Method::Otsu => MethodFamily::Otsu,
            Method::BinaryThreshold { .. } => MethodFamily::BinaryThreshold,
            Method::AdaptiveMean { .. } => MethodFamily::AdaptiveMean,
            Method::AdaptiveGaussian { .. } => MethodFamily::AdaptiveGaussian,
            Method::MedianFilter { .. } => MethodFamily::MedianFilter,
        }
    }
}

/// A concrete configuration to score: a method and whether strokes are thickened after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub method: Method,
    pub bold: bool,
}

/// A candidate's output image together with its report strings
#[derive(Debug, Clone)]
pub struct TransformedImage {
    pub image: GrayImage,
    pub label: &'static str,
    pub parameters: String,
}

impl Candidate {
    pub fn new(method: Method, bold: bool) -> Self {
        Self { method, bold }
    }

    /// Apply the base transform, then the bold transform when requested.
    ///
    /// The input image is never modified; the returned image is a new buffer.
    pub fn apply(
        &self,
        ops: &dyn ImageOps,
        image: &GrayImage,
    ) -> Result<TransformedImage, PreprocessingError> {
        let bold = self.bold_text();
        let (base, parameters) = match self.method {
            Method::Otsu => {
                let otsu = ops.otsu_threshold(image);
                (
                    otsu.image,
                    format!(
                        "Calculated Threshold: {}, Bold Text: {}",
                        otsu.threshold, bold
                    ),
                )
            }
            Method::BinaryThreshold { threshold } => (
                ops.threshold(image, threshold, MAX_VALUE, ThresholdMode::Binary),
                format!("Threshold: {}, Bold Text: {}", threshold, bold),
            ),
            Method::AdaptiveMean { c } => (
                ops.adaptive_threshold(
                    image,
                    MAX_VALUE,
                    AdaptiveMethod::Mean,
                    ADAPTIVE_BLOCK_SIZE,
                    c,
                )?,
                adaptive_parameters(AdaptiveMethod::Mean, c, bold),
            ),
            Method::AdaptiveGaussian { c } => (
                ops.adaptive_threshold(
                    image,
                    MAX_VALUE,
                    AdaptiveMethod::Gaussian,
                    ADAPTIVE_BLOCK_SIZE,
                    c,
                )?,
                adaptive_parameters(AdaptiveMethod::Gaussian, c, bold),
            ),
            Method::MedianFilter { kernel_size } => (
                ops.median_filter(image, kernel_size)?,
                format!("Kernel Size: {}, Bold Text: {}", kernel_size, bold),
            ),
        };

        let image = if self.bold {
            ops.dilate_bold(&base)
        } else {
            base
        };

        Ok(TransformedImage {
            image,
            label: self.method.family().label(),
            parameters,
        })
    }

    fn bold_text(&self) -> &'static str {
        if self.bold {
            "Yes"
        } else {
            "No"
        }
    }
}

fn adaptive_parameters(method: AdaptiveMethod, c: i32, bold: &str) -> String {
    format!(
        "Method: {}, Block Size: {}, C Constant: {}, Bold Text: {}",
        method.as_str(),
        ADAPTIVE_BLOCK_SIZE,
        c,
        bold
    )
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.method {
            Method::Otsu => write!(f, "otsu")?,
            Method::BinaryThreshold { threshold } => write!(f, "binary_threshold({threshold})")?,
            Method::AdaptiveMean { c } => write!(f, "adaptive_mean(c={c})")?,
            Method::AdaptiveGaussian { c } => write!(f, "adaptive_gaussian(c={c})")?,
            Method::MedianFilter { kernel_size } => write!(f, "median_filter({kernel_size})")?,
        }
        if self.bold {
            write!(f, "+bold")?;
        }
        Ok(())
    }
}

/// The unit of work handed to one worker: a sequential sweep in ascending parameter order
#[derive(Debug, Clone)]
pub struct MethodGroup {
    pub name: String,
    pub candidates: Vec<Candidate>,
}

/// The nine method groups, in dispatch order.
///
/// The Otsu group holds both its plain and bold candidate. The remaining eight groups
/// are the four swept families without bold, then the same four with bold.
pub fn method_groups() -> Vec<MethodGroup> {
    const SWEPT: [MethodFamily; 4] = [
        MethodFamily::BinaryThreshold,
        MethodFamily::AdaptiveMean,
        MethodFamily::AdaptiveGaussian,
        MethodFamily::MedianFilter,
    ];

    let mut groups = vec![MethodGroup {
        name: MethodFamily::Otsu.as_str().to_string(),
        candidates: vec![
            Candidate::new(Method::Otsu, false),
            Candidate::new(Method::Otsu, true),
        ],
    }];

    for bold in [false, true] {
        for family in SWEPT {
            let name = if bold {
                format!("{}_bold", family.as_str())
            } else {
                family.as_str().to_string()
            };
            groups.push(MethodGroup {
                name,
                candidates: family
                    .sweep()
                    .into_iter()
                    .map(|method| Candidate::new(method, bold))
                    .collect(),
            });
        }
    }

    groups
}

/// All candidates of a search as one flat list, in group order
pub fn generate_candidates() -> Vec<Candidate> {
    method_groups()
        .into_iter()
        .flat_map(|group| group.candidates)
        .collect()
}
