//! # Candidate Scoring
//!
//! Turns a preprocessed image into a comparable score. Two modes exist:
//!
//! - **Confidence**: mean per-word OCR confidence, gated on how many of the original
//!   image's words are still recognized.
//! - **Accuracy**: token-level similarity of the OCR transcription to a clean reference.
//!
//! OCR is injected as an [`OcrEngine`]; the arithmetic lives in pure functions so it
//! can be exercised without an engine.

use image::GrayImage;

use crate::ocr::{OcrEngine, OcrError, WordData};
use crate::similarity::calculate_accuracy;

/// Default minimum fraction of the original words a candidate must keep
pub const DEFAULT_MIN_RETAINED_WORD_RATIO: f64 = 0.90;

/// How candidates of one search are scored
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringMode {
    /// No clean reference: mean OCR confidence with a retained-word-ratio gate
    Confidence {
        original_word_count: usize,
        min_retained_ratio: f64,
    },
    /// Similarity of the candidate's transcription to the clean reference text
    Accuracy { reference_text: String },
}

impl ScoringMode {
    pub fn confidence(original_word_count: usize) -> Self {
        ScoringMode::Confidence {
            original_word_count,
            min_retained_ratio: DEFAULT_MIN_RETAINED_WORD_RATIO,
        }
    }

    pub fn accuracy(reference_text: impl Into<String>) -> Self {
        ScoringMode::Accuracy {
            reference_text: reference_text.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScoringMode::Confidence { .. } => "confidence",
            ScoringMode::Accuracy { .. } => "accuracy",
        }
    }
}

/// Why a candidate produced no eligible score
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// Word data contained no non-empty word
    NoWords,
    /// Plain-text transcription was empty after trimming
    EmptyText,
    /// Too few of the original words survived preprocessing
    BelowRetention { ratio: f64 },
}

impl Rejection {
    /// Metric label
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::NoWords => "no_words",
            Rejection::EmptyText => "empty_text",
            Rejection::BelowRetention { .. } => "below_retention",
        }
    }
}

/// Outcome of scoring one candidate image
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CandidateScore {
    Scored(f64),
    Rejected(Rejection),
}

/// Word count and confidence sum over the non-empty words of an OCR result
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WordTally {
    pub num_words: usize,
    pub confidence_total: f64,
}

/// Count non-empty words and sum their confidences.
///
/// Entries whose text is empty after trimming are skipped entirely. A word without a
/// confidence still counts and contributes 0 to the sum.
pub fn tally_words(words: &[WordData]) -> WordTally {
    words
        .iter()
        .filter(|word| !word.text.trim().is_empty())
        .fold(WordTally::default(), |tally, word| WordTally {
            num_words: tally.num_words + 1,
            confidence_total: tally.confidence_total + f64::from(word.confidence.unwrap_or(0.0)),
        })
}

/// Apply the confidence-mode rules to an already collected tally.
pub fn score_confidence(
    tally: WordTally,
    plain_text: &str,
    original_word_count: usize,
    min_retained_ratio: f64,
) -> CandidateScore {
    if tally.num_words == 0 {
        return CandidateScore::Rejected(Rejection::NoWords);
    }
    if plain_text.trim().is_empty() {
        return CandidateScore::Rejected(Rejection::EmptyText);
    }

    // A search never starts with zero original words; treat it as fully retained.
    let ratio = if original_word_count == 0 {
        1.0
    } else {
        tally.num_words as f64 / original_word_count as f64
    };
    if ratio < min_retained_ratio {
        return CandidateScore::Rejected(Rejection::BelowRetention { ratio });
    }

    CandidateScore::Scored(tally.confidence_total / tally.num_words as f64)
}

/// Score one candidate image with the given OCR engine.
///
/// In confidence mode the plain text is only requested once word data reported at
/// least one word.
///
/// # Errors
///
/// Returns the OCR error unchanged; the caller decides whether it is fatal.
pub fn score_candidate(
    ocr: &dyn OcrEngine,
    image: &GrayImage,
    mode: &ScoringMode,
) -> Result<CandidateScore, OcrError> {
    match mode {
        ScoringMode::Confidence {
            original_word_count,
            min_retained_ratio,
        } => {
            let tally = tally_words(&ocr.ocr_word_data(image)?);
            if tally.num_words == 0 {
                return Ok(CandidateScore::Rejected(Rejection::NoWords));
            }
            let text = ocr.ocr_text(image)?;
            Ok(score_confidence(tally, &text, *original_word_count, *min_retained_ratio))
        }
        ScoringMode::Accuracy { reference_text } => {
            Ok(CandidateScore::Scored(accuracy_against(ocr, image, reference_text)?))
        }
    }
}

/// OCR an image and score the transcription against a reference text (0-100).
pub fn accuracy_against(
    ocr: &dyn OcrEngine,
    image: &GrayImage,
    reference_text: &str,
) -> Result<f64, OcrError> {
    let text = ocr.ocr_text(image)?;
    Ok(calculate_accuracy(&text, reference_text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(entries: &[(&str, Option<f32>)]) -> Vec<WordData> {
        entries
            .iter()
            .map(|(text, conf)| WordData::new(*text, *conf))
            .collect()
    }

    struct FixedOcr {
        text: String,
        words: Vec<WordData>,
    }

    impl OcrEngine for FixedOcr {
        fn ocr_text(&self, _image: &GrayImage) -> Result<String, OcrError> {
            Ok(self.text.clone())
        }

        fn ocr_word_data(&self, _image: &GrayImage) -> Result<Vec<WordData>, OcrError> {
            Ok(self.words.clone())
        }
    }

    #[test]
    fn test_tally_skips_empty_and_counts_missing_confidence() {
        let tally = tally_words(&words(&[
            ("HELLO", Some(90.0)),
            ("", None),
            ("  ", Some(50.0)),
            ("WORLD", None),
        ]));

        assert_eq!(tally.num_words, 2);
        assert!((tally.confidence_total - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_mean_confidence() {
        let tally = tally_words(&words(&[("a", Some(80.0)), ("b", Some(90.0))]));
        assert_eq!(
            score_confidence(tally, "a b", 2, DEFAULT_MIN_RETAINED_WORD_RATIO),
            CandidateScore::Scored(85.0)
        );
    }

    #[test]
    fn test_retention_gate() {
        // 17 of 20 words survive: ratio 0.85
        let tally = WordTally {
            num_words: 17,
            confidence_total: 17.0 * 99.0,
        };
        match score_confidence(tally, "text", 20, DEFAULT_MIN_RETAINED_WORD_RATIO) {
            CandidateScore::Rejected(Rejection::BelowRetention { ratio }) => {
                assert!((ratio - 0.85).abs() < 1e-9)
            }
            other => panic!("expected retention rejection, got {:?}", other),
        }

        // 18 of 20 is exactly at the boundary and passes
        let tally = WordTally {
            num_words: 18,
            confidence_total: 18.0 * 70.0,
        };
        assert_eq!(
            score_confidence(tally, "text", 20, DEFAULT_MIN_RETAINED_WORD_RATIO),
            CandidateScore::Scored(70.0)
        );
    }

    #[test]
    fn test_rejects_empty_plain_text() {
        let tally = WordTally {
            num_words: 3,
            confidence_total: 240.0,
        };
        assert_eq!(
            score_confidence(tally, " \n ", 3, DEFAULT_MIN_RETAINED_WORD_RATIO),
            CandidateScore::Rejected(Rejection::EmptyText)
        );
    }

    #[test]
    fn test_score_candidate_confidence_mode() {
        let ocr = FixedOcr {
            text: "one two".to_string(),
            words: words(&[("one", Some(60.0)), ("two", Some(80.0))]),
        };
        let image = GrayImage::new(2, 2);

        let score = score_candidate(&ocr, &image, &ScoringMode::confidence(2)).unwrap();
        assert_eq!(score, CandidateScore::Scored(70.0));

        let none = FixedOcr {
            text: String::new(),
            words: Vec::new(),
        };
        let score = score_candidate(&none, &image, &ScoringMode::confidence(2)).unwrap();
        assert_eq!(score, CandidateScore::Rejected(Rejection::NoWords));
    }

    #[test]
    fn test_score_candidate_accuracy_mode() {
        let ocr = FixedOcr {
            text: "HXLLO WORLD".to_string(),
            words: Vec::new(),
        };
        let image = GrayImage::new(2, 2);

        let score =
            score_candidate(&ocr, &image, &ScoringMode::accuracy("HELLO WORLD")).unwrap();
        assert_eq!(score, CandidateScore::Scored(50.0));
        assert_eq!(ScoringMode::accuracy("x").name(), "accuracy");
    }
}
