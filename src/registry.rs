//! # Best-Image Registry
//!
//! The one piece of state shared by all search workers. Workers only ever call
//! [`BestImageRegistry::try_update`]; the lock is held for the compare-and-replace
//! step alone, never while transforming or running OCR.

use image::GrayImage;
use parking_lot::Mutex;

/// A scored candidate image and the configuration that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult {
    pub image: GrayImage,
    pub score: f64,
    pub method: String,
    pub parameters: String,
}

/// Guarded "best so far" record
#[derive(Debug, Default)]
pub struct BestImageRegistry {
    best: Mutex<Option<ScoredResult>>,
}

impl BestImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current best. May still change while a search runs.
    pub fn read(&self) -> Option<ScoredResult> {
        self.best.lock().clone()
    }

    /// Replace the current best when the registry is empty or `candidate.score` is at
    /// least the current score. Equal scores replace, so the latest commit wins.
    ///
    /// Returns whether the candidate was stored. NaN scores are never stored.
    pub fn try_update(&self, candidate: ScoredResult) -> bool {
        if candidate.score.is_nan() {
            return false;
        }

        let mut best = self.best.lock();
        let replace = match best.as_ref() {
            None => true,
            Some(current) => candidate.score >= current.score,
        };
        if replace {
            *best = Some(candidate);
        }
        replace
    }

    /// Empty the registry for the next search
    pub fn reset(&self) {
        *self.best.lock() = None;
    }
}
