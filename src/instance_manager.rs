//! # OCR Instance Manager Module
//!
//! This module provides thread-safe pooling of Tesseract instances.
//! A Tesseract handle serves one image at a time, so parallel sweep workers each
//! check out their own engine; engines go back to the pool when the guard drops.

use std::ops::{Deref, DerefMut};

use leptess::LepTess;
use parking_lot::Mutex;
use tracing::info;

use crate::ocr_config::{ModelType, OcrConfig};

/// Thread-safe pool of reusable Tesseract instances
///
/// Creating an engine costs roughly 100-500ms, which would dominate a sweep of
/// several hundred candidates. Idle engines are kept up to `pool_size`; a checkout
/// when the pool is empty creates a fresh engine.
pub struct OcrInstanceManager {
    config: OcrConfig,
    idle: Mutex<Vec<LepTess>>,
}

/// An engine checked out of the pool, returned on drop
pub struct PooledInstance<'a> {
    manager: &'a OcrInstanceManager,
    tess: Option<LepTess>,
}

impl OcrInstanceManager {
    /// Create a new, empty pool for the given configuration
    pub fn new(config: OcrConfig) -> Self {
        Self {
            config,
            idle: Mutex::new(Vec::new()),
        }
    }

    /// Configuration the pooled engines are created with
    pub fn config(&self) -> &OcrConfig {
        &self.config
    }

    /// Take an idle engine or create a new one
    ///
    /// # Errors
    ///
    /// Returns error if Tesseract instance creation fails (e.g., missing language data)
    pub fn checkout(&self) -> anyhow::Result<PooledInstance<'_>> {
        let reused = self.idle.lock().pop();
        let tess = match reused {
            Some(tess) => tess,
            None => self.create_instance()?,
        };

        Ok(PooledInstance {
            manager: self,
            tess: Some(tess),
        })
    }

    fn create_instance(&self) -> anyhow::Result<LepTess> {
        info!(
            "Creating new OCR instance for languages: {} with model: {}",
            self.config.languages,
            self.config.model_type.tessdata_dir()
        );

        let tessdata_path = Self::get_tessdata_path(self.config.model_type);

        LepTess::new(tessdata_path.as_deref(), &self.config.languages)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Tesseract OCR instance: {}", e))
    }

    fn give_back(&self, tess: LepTess) {
        let mut idle = self.idle.lock();
        if idle.len() < self.config.pool_size {
            idle.push(tess);
        }
    }

    /// Get the tessdata path for the specified model type
    ///
    /// Falls back to Tesseract's default lookup when no model-specific directory exists.
    fn get_tessdata_path(model_type: ModelType) -> Option<String> {
        let possible_paths = match model_type {
            ModelType::Fast => [
                "/usr/share/tesseract-ocr/5/tessdata_fast",
                "/usr/share/tesseract-ocr/4.00/tessdata_fast",
                "/usr/share/tessdata_fast",
                "/usr/local/share/tessdata_fast",
            ],
            ModelType::Best => [
                "/usr/share/tesseract-ocr/5/tessdata_best",
                "/usr/share/tesseract-ocr/4.00/tessdata_best",
                "/usr/share/tessdata_best",
                "/usr/local/share/tessdata_best",
            ],
        };

        possible_paths
            .iter()
            .find(|path| std::path::Path::new(path).exists())
            .map(|path| path.to_string())
    }
}

impl Deref for PooledInstance<'_> {
    type Target = LepTess;

    fn deref(&self) -> &LepTess {
        self.tess
            .as_ref()
            .unwrap_or_else(|| unreachable!("engine is present until drop"))
    }
}

impl DerefMut for PooledInstance<'_> {
    fn deref_mut(&mut self) -> &mut LepTess {
        self.tess
            .as_mut()
            .unwrap_or_else(|| unreachable!("engine is present until drop"))
    }
}

impl Drop for PooledInstance<'_> {
    fn drop(&mut self) {
        if let Some(tess) = self.tess.take() {
            self.manager.give_back(tess);
        }
    }
}
