//! # Best-Image Search
//!
//! Sweeps every candidate configuration over a noisy image and keeps the best one.
//!
//! ## Phases
//!
//! 1. **Word counting**: OCR the unmodified image once. Zero words aborts with
//!    [`SearchError::NoTextFound`] before any candidate is evaluated.
//! 2. **Dispatch**: the candidates are split into nine method groups. A group is swept
//!    sequentially in ascending parameter order by one worker.
//! 3. **Run**: all groups run concurrently on scoped threads when enough hardware
//!    execution units exist, otherwise one after another on the calling thread.
//!    Every evaluation attempts a registry update immediately.
//! 4. **Aggregate**: every worker is joined before the registry is read.
//!
//! Failures of a single candidate (transform or OCR, including panics) are logged
//! and skipped.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use image::GrayImage;
use serde::Serialize;
use tracing::{debug, error, info, warn, Span};

use crate::candidates::{method_groups, Candidate, MethodGroup};
use crate::config::SearchConfig;
use crate::errors::error_logging;
use crate::errors::SearchError;
use crate::observability;
use crate::ocr::{count_words, OcrEngine, OcrError};
use crate::preprocessing::ImageOps;
use crate::registry::{BestImageRegistry, ScoredResult};
use crate::scoring::{score_candidate, CandidateScore, ScoringMode};

/// Evaluated and total candidate counts of the running (or last) search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SearchProgress {
    pub evaluated: usize,
    pub total: usize,
}

/// Runs best-image searches with injected transform and OCR collaborators.
///
/// The registry and progress counters can be read from other threads while
/// [`find_best_image`](Self::find_best_image) runs.
pub struct SearchCoordinator {
    ops: Arc<dyn ImageOps>,
    ocr: Arc<dyn OcrEngine>,
    config: SearchConfig,
    registry: BestImageRegistry,
    evaluated: AtomicUsize,
    total: AtomicUsize,
}

impl SearchCoordinator {
    pub fn new(ops: Arc<dyn ImageOps>, ocr: Arc<dyn OcrEngine>, config: SearchConfig) -> Self {
        Self {
            ops,
            ocr,
            config,
            registry: BestImageRegistry::new(),
            evaluated: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }

    /// Current best result holder, for progress display
    pub fn registry(&self) -> &BestImageRegistry {
        &self.registry
    }

    pub fn progress(&self) -> SearchProgress {
        SearchProgress {
            evaluated: self.evaluated.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
        }
    }

    /// Find the preprocessing configuration that scores best on `noisy`.
    ///
    /// With `clean_reference_text` candidates are scored by similarity to it,
    /// otherwise by mean OCR confidence with the retained-word gate. A supplied
    /// `original_word_count` skips the word-counting OCR call.
    ///
    /// # Errors
    ///
    /// - [`SearchError::NoTextFound`] when the original image has no words
    /// - [`SearchError::NoAcceptableCandidate`] when no candidate produced an eligible score
    pub fn find_best_image(
        &self,
        noisy: &GrayImage,
        original_word_count: Option<usize>,
        clean_reference_text: Option<&str>,
    ) -> Result<ScoredResult, SearchError> {
        let start = Instant::now();
        self.registry.reset();
        self.evaluated.store(0, Ordering::Relaxed);
        self.total.store(0, Ordering::Relaxed);

        let original_word_count = match original_word_count {
            Some(count) => count,
            None => self.count_original_words(noisy),
        };
        if original_word_count == 0 {
            info!(target: "search", "No text found in the original image, search skipped");
            observability::record_search_metrics("no_text", "skipped", start.elapsed());
            return Err(SearchError::NoTextFound);
        }

        let mode = match clean_reference_text {
            Some(reference) => ScoringMode::accuracy(reference),
            None => ScoringMode::Confidence {
                original_word_count,
                min_retained_ratio: self.config.min_retained_word_ratio,
            },
        };

        let groups = method_groups();
        let total: usize = groups.iter().map(|group| group.candidates.len()).sum();
        self.total.store(total, Ordering::Relaxed);

        let parallel = self.config.runs_parallel(available_units());

        let span = observability::search_span(mode.name(), total);
        let _enter = span.enter();
        info!(
            target: "search",
            original_word_count,
            groups = groups.len(),
            total_candidates = total,
            parallel,
            "Starting best image search"
        );

        if parallel {
            self.run_parallel(&groups, noisy, &mode);
        } else {
            for group in &groups {
                self.run_group(group, noisy, &mode);
            }
        }

        let best = self.registry.read();
        let duration = start.elapsed();
        observability::record_search_metrics(
            if best.is_some() { "found" } else { "not_found" },
            if parallel { "parallel" } else { "sequential" },
            duration,
        );

        match best {
            Some(best) => {
                info!(
                    target: "search",
                    method = %best.method,
                    parameters = %best.parameters,
                    score = best.score,
                    duration_ms = duration.as_millis() as u64,
                    "Best image search finished"
                );
                Ok(best)
            }
            None => {
                warn!(
                    target: "search",
                    duration_ms = duration.as_millis() as u64,
                    "No candidate produced an acceptable image"
                );
                Err(SearchError::NoAcceptableCandidate)
            }
        }
    }

    fn count_original_words(&self, noisy: &GrayImage) -> usize {
        match self.ocr.ocr_text(noisy) {
            Ok(text) => count_words(&text),
            Err(e) => {
                error_logging::log_ocr_error(
                    &e,
                    "count_original_words",
                    Some(noisy.dimensions()),
                    None,
                );
                0
            }
        }
    }

    fn run_parallel(&self, groups: &[MethodGroup], noisy: &GrayImage, mode: &ScoringMode) {
        let parent = Span::current();

        std::thread::scope(|scope| {
            let handles: Vec<_> = groups
                .iter()
                .map(|group| {
                    let parent = parent.clone();
                    scope.spawn(move || parent.in_scope(|| self.run_group(group, noisy, mode)))
                })
                .collect();

            for (group, handle) in groups.iter().zip(handles) {
                if handle.join().is_err() {
                    error!(target: "search", group = %group.name, "Method group worker panicked");
                }
            }
        });
    }

    fn run_group(&self, group: &MethodGroup, noisy: &GrayImage, mode: &ScoringMode) {
        let span = observability::group_span(&group.name, group.candidates.len());
        let _enter = span.enter();

        for candidate in &group.candidates {
            // a panicking transform or OCR call only loses this candidate
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| self.evaluate(candidate, noisy, mode)));
            if let Err(payload) = outcome {
                error_logging::log_candidate_failure(
                    &panic_message(&*payload),
                    "panic",
                    candidate.method.family().label(),
                    &candidate.to_string(),
                );
                observability::record_candidate_failure("panic");
            }
            self.evaluated.fetch_add(1, Ordering::Relaxed);
        }

        debug!(target: "search", group = %group.name, "Method group finished");
    }

    fn evaluate(&self, candidate: &Candidate, noisy: &GrayImage, mode: &ScoringMode) {
        let family = candidate.method.family();

        let transformed = match candidate.apply(self.ops.as_ref(), noisy) {
            Ok(transformed) => transformed,
            Err(e) => {
                error_logging::log_candidate_failure(
                    &e,
                    "transform",
                    family.label(),
                    &candidate.to_string(),
                );
                observability::record_candidate_failure("transform");
                return;
            }
        };

        let score = match score_candidate(self.ocr.as_ref(), &transformed.image, mode) {
            Ok(score) => score,
            Err(e) => {
                error_logging::log_candidate_failure(
                    &e,
                    "ocr",
                    transformed.label,
                    &transformed.parameters,
                );
                observability::record_candidate_failure("ocr");
                return;
            }
        };

        observability::record_candidate_evaluated(family.as_str());
        match score {
            CandidateScore::Scored(score) => {
                debug!(
                    target: "search",
                    method = transformed.label,
                    parameters = %transformed.parameters,
                    score,
                    "Candidate scored"
                );

                let parameters = transformed.parameters;
                let updated = self.registry.try_update(ScoredResult {
                    image: transformed.image,
                    score,
                    method: transformed.label.to_string(),
                    parameters: parameters.clone(),
                });
                if updated {
                    observability::record_registry_update();
                    info!(
                        target: "search",
                        method = transformed.label,
                        parameters = %parameters,
                        score,
                        "New best image"
                    );
                }
            }
            CandidateScore::Rejected(rejection) => {
                observability::record_candidate_rejected(rejection.reason());
                debug!(
                    target: "search",
                    method = transformed.label,
                    parameters = %transformed.parameters,
                    reason = rejection.reason(),
                    "Candidate rejected"
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {}", message)
    } else {
        "panic with a non-string payload".to_string()
    }
}

/// Number of hardware execution units, 1 when it cannot be determined
pub fn available_units() -> usize {
    std::thread::available_parallelism()
        .map(|units| units.get())
        .unwrap_or(1)
}

/// OCR a clean image to obtain the reference text for accuracy scoring
pub fn reference_text_from_image(
    ocr: &dyn OcrEngine,
    clean: &GrayImage,
) -> Result<String, OcrError> {
    ocr.ocr_text(clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionMode;
    use crate::ocr::WordData;
    use crate::preprocessing::{
        AdaptiveMethod, PreprocessingError, ThresholdMode, ThresholdedImageResult,
    };
    use metrics::{
        Counter, CounterFn, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString,
        Unit,
    };
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Transforms that return a copy of their input
    struct PassThroughOps;

    impl ImageOps for PassThroughOps {
        fn threshold(&self, image: &GrayImage, _: u8, _: u8, _: ThresholdMode) -> GrayImage {
            image.clone()
        }

        fn otsu_threshold(&self, image: &GrayImage) -> ThresholdedImageResult {
            ThresholdedImageResult {
                image: image.clone(),
                threshold: 128,
            }
        }

        fn adaptive_threshold(
            &self,
            image: &GrayImage,
            _: u8,
            _: AdaptiveMethod,
            _: u32,
            _: i32,
        ) -> Result<GrayImage, PreprocessingError> {
            Ok(image.clone())
        }

        fn median_filter(
            &self,
            image: &GrayImage,
            _: u32,
        ) -> Result<GrayImage, PreprocessingError> {
            Ok(image.clone())
        }

        fn dilate_bold(&self, image: &GrayImage) -> GrayImage {
            image.clone()
        }
    }

    /// OCR that reports the same fixed text for every image
    struct ConstantOcr(&'static str);

    impl OcrEngine for ConstantOcr {
        fn ocr_text(&self, _image: &GrayImage) -> Result<String, OcrError> {
            Ok(self.0.to_string())
        }

        fn ocr_word_data(&self, _image: &GrayImage) -> Result<Vec<WordData>, OcrError> {
            Ok(self
                .0
                .split_whitespace()
                .map(|w| WordData::new(w, Some(75.0)))
                .collect())
        }
    }

    struct FailingOcr;

    impl OcrEngine for FailingOcr {
        fn ocr_text(&self, _image: &GrayImage) -> Result<String, OcrError> {
            Err(OcrError::Extraction("engine unavailable".to_string()))
        }

        fn ocr_word_data(&self, _image: &GrayImage) -> Result<Vec<WordData>, OcrError> {
            Err(OcrError::Extraction("engine unavailable".to_string()))
        }
    }

    fn coordinator(ocr: Arc<dyn OcrEngine>) -> SearchCoordinator {
        SearchCoordinator::new(
            Arc::new(PassThroughOps),
            ocr,
            SearchConfig {
                execution: ExecutionMode::Sequential,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_ocr_failure_on_original_is_no_text() {
        let search = coordinator(Arc::new(FailingOcr));
        let noisy = GrayImage::new(4, 4);

        assert_eq!(
            search.find_best_image(&noisy, None, None),
            Err(SearchError::NoTextFound)
        );
        assert_eq!(search.progress(), SearchProgress::default());
    }

    #[test]
    fn test_every_candidate_counted_in_progress() {
        let search = coordinator(Arc::new(ConstantOcr("SOME TEXT")));
        let noisy = GrayImage::from_fn(6, 6, |x, y| image::Luma([((x + y) * 20) as u8]));

        let best = search.find_best_image(&noisy, None, None).unwrap();

        assert_eq!(best.score, 75.0);
        assert_eq!(
            search.progress(),
            SearchProgress {
                evaluated: 628,
                total: 628
            }
        );
        // all scores tie, so the last candidate of the last group wins
        assert_eq!(best.method, "Median Filtering");
        assert_eq!(best.parameters, "Kernel Size: 21, Bold Text: Yes");
    }

    #[test]
    fn test_supplied_word_count_skips_counting() {
        let search = coordinator(Arc::new(FailingOcr));
        let noisy = GrayImage::new(4, 4);

        // every candidate fails OCR, so nothing is eligible
        assert_eq!(
            search.find_best_image(&noisy, Some(3), None),
            Err(SearchError::NoAcceptableCandidate)
        );
        assert_eq!(search.progress().evaluated, 628);
    }

    /// Counts every counter increment under `name{label=value,...}`
    #[derive(Default)]
    struct CountingRecorder {
        counts: Arc<Mutex<HashMap<String, u64>>>,
    }

    impl CountingRecorder {
        fn total(&self, name: &str) -> u64 {
            self.counts
                .lock()
                .iter()
                .filter(|(key, _)| key.starts_with(&format!("{}{{", name)))
                .map(|(_, count)| *count)
                .sum()
        }

        fn count(&self, key: &str) -> u64 {
            self.counts.lock().get(key).copied().unwrap_or(0)
        }
    }

    struct KeyedCounter {
        key: String,
        counts: Arc<Mutex<HashMap<String, u64>>>,
    }

    impl CounterFn for KeyedCounter {
        fn increment(&self, value: u64) {
            *self.counts.lock().entry(self.key.clone()).or_default() += value;
        }

        fn absolute(&self, value: u64) {
            self.counts.lock().insert(self.key.clone(), value);
        }
    }

    impl Recorder for CountingRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            let labels: Vec<String> = key
                .labels()
                .map(|label| format!("{}={}", label.key(), label.value()))
                .collect();
            Counter::from_arc(Arc::new(KeyedCounter {
                key: format!("{}{{{}}}", key.name(), labels.join(",")),
                counts: Arc::clone(&self.counts),
            }))
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    #[test]
    fn test_rejected_candidates_count_as_evaluated() {
        let recorder = CountingRecorder::default();
        let search = coordinator(Arc::new(ConstantOcr("SOME TEXT")));
        let noisy = GrayImage::new(4, 4);

        // two words out of ten never pass the retention gate
        let result = metrics::with_local_recorder(&recorder, || {
            search.find_best_image(&noisy, Some(10), None)
        });

        assert_eq!(result, Err(SearchError::NoAcceptableCandidate));
        assert_eq!(recorder.total("search_candidates_evaluated_total"), 628);
        assert_eq!(recorder.total("search_candidates_rejected_total"), 628);
        assert_eq!(
            recorder.count("search_runs_total{result=not_found,execution=sequential}"),
            1
        );
    }

    #[test]
    fn test_no_text_search_is_recorded_as_skipped() {
        let recorder = CountingRecorder::default();
        let search = coordinator(Arc::new(ConstantOcr("")));

        let result = metrics::with_local_recorder(&recorder, || {
            search.find_best_image(&GrayImage::new(4, 4), None, None)
        });

        assert_eq!(result, Err(SearchError::NoTextFound));
        assert_eq!(
            recorder.count("search_runs_total{result=no_text,execution=skipped}"),
            1
        );
        assert_eq!(recorder.total("search_candidates_evaluated_total"), 0);
    }

    #[test]
    fn test_panicking_candidate_is_skipped() {
        /// Panics on one specific candidate image, reads "HELLO WORLD" otherwise
        struct PanickyOcr;

        impl OcrEngine for PanickyOcr {
            fn ocr_text(&self, image: &GrayImage) -> Result<String, OcrError> {
                if image.get_pixel(0, 0)[0] == 7 {
                    panic!("engine crashed");
                }
                Ok("HELLO WORLD".to_string())
            }

            fn ocr_word_data(&self, _image: &GrayImage) -> Result<Vec<WordData>, OcrError> {
                Ok(Vec::new())
            }
        }

        let search = coordinator(Arc::new(PanickyOcr));

        // pass-through transforms keep the marker, so every candidate panics
        let result = search.find_best_image(
            &GrayImage::from_pixel(2, 2, image::Luma([7])),
            Some(2),
            Some("HELLO WORLD"),
        );

        assert_eq!(result, Err(SearchError::NoAcceptableCandidate));
        assert_eq!(search.progress().evaluated, 628);
    }

    #[test]
    fn test_panic_message_extraction() {
        assert_eq!(panic_message(&"boom"), "panic: boom");
        assert_eq!(panic_message(&"boom".to_string()), "panic: boom");
        assert_eq!(panic_message(&42u32), "panic with a non-string payload");
    }

    #[test]
    fn test_reference_text_from_image() {
        let ocr = ConstantOcr("HELLO WORLD");
        assert_eq!(
            reference_text_from_image(&ocr, &GrayImage::new(1, 1)).unwrap(),
            "HELLO WORLD"
        );
    }
}
