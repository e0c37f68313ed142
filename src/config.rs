//! # Unified Application Configuration
//!
//! This module consolidates the search, OCR and observability settings into a single
//! configuration object. It supports loading from environment variables, validation,
//! and a summary line for startup logging.

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::observability_config::ObservabilityConfig;
use crate::ocr_config::OcrConfig;
use crate::scoring::DEFAULT_MIN_RETAINED_WORD_RATIO;

/// Hardware execution units required before method groups run in parallel
pub const DEFAULT_MIN_PARALLEL_UNITS: usize = 8;

/// How the method groups of a search are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Parallel when enough hardware execution units are available, else sequential
    #[default]
    Auto,
    /// Always one worker per method group
    Parallel,
    /// Always on the calling thread, groups in dispatch order
    Sequential,
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Ok(ExecutionMode::Auto),
            "parallel" => Ok(ExecutionMode::Parallel),
            "sequential" => Ok(ExecutionMode::Sequential),
            other => Err(format!(
                "execution mode must be 'auto', 'parallel' or 'sequential', got '{}'",
                other
            )),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionMode::Auto => "auto",
            ExecutionMode::Parallel => "parallel",
            ExecutionMode::Sequential => "sequential",
        };
        f.write_str(name)
    }
}

/// Best-image search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Minimum fraction of the original words a candidate must keep (confidence mode)
    pub min_retained_word_ratio: f64,
    /// Hardware execution units needed for `ExecutionMode::Auto` to go parallel
    pub min_parallel_units: usize,
    /// Parallel/sequential policy
    pub execution: ExecutionMode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_retained_word_ratio: DEFAULT_MIN_RETAINED_WORD_RATIO,
            min_parallel_units: DEFAULT_MIN_PARALLEL_UNITS,
            execution: ExecutionMode::Auto,
        }
    }
}

impl SearchConfig {
    /// Load search configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(execution) = env::var("SEARCH_EXECUTION") {
            config.execution = execution
                .parse()
                .map_err(|e| AppError::Config(format!("SEARCH_EXECUTION: {}", e)))?;
        }
        config.min_retained_word_ratio = env::var("SEARCH_MIN_RETAINED_WORD_RATIO")
            .unwrap_or_else(|_| DEFAULT_MIN_RETAINED_WORD_RATIO.to_string())
            .parse()
            .map_err(|_| {
                AppError::Config(
                    "SEARCH_MIN_RETAINED_WORD_RATIO must be a valid number".to_string(),
                )
            })?;

        Ok(config)
    }

    /// Validate search configuration
    pub fn validate(&self) -> AppResult<()> {
        if !(0.0..=1.0).contains(&self.min_retained_word_ratio) {
            return Err(AppError::Config(format!(
                "min_retained_word_ratio must be between 0 and 1, got {}",
                self.min_retained_word_ratio
            )));
        }

        if self.min_parallel_units == 0 {
            return Err(AppError::Config(
                "min_parallel_units must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether a search with this configuration runs its groups in parallel
    pub fn runs_parallel(&self, available_units: usize) -> bool {
        match self.execution {
            ExecutionMode::Auto => available_units >= self.min_parallel_units,
            ExecutionMode::Parallel => true,
            ExecutionMode::Sequential => false,
        }
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Search configuration
    pub search: SearchConfig,
    /// OCR processing configuration
    pub ocr: OcrConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            search: SearchConfig::from_env()?,
            ocr: OcrConfig::from_env()?,
            observability: ObservabilityConfig::from_env(),
        })
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.search.validate()?;
        self.ocr.validate()?;
        self.observability.validate().map_err(AppError::Config)?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: execution={}, min_retained_word_ratio={}, ocr_languages={}, ocr_model={}, environment={}",
            self.search.execution,
            self.search.min_retained_word_ratio,
            self.ocr.languages,
            self.ocr.model_type.tessdata_dir(),
            self.observability.environment
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.summary().contains("execution=auto"));
    }

    #[test]
    fn test_search_config_validation() {
        let mut config = SearchConfig::default();

        config.min_retained_word_ratio = 1.5;
        assert!(config.validate().is_err());
        config.min_retained_word_ratio = 0.9;

        config.min_parallel_units = 0;
        assert!(config.validate().is_err());
        config.min_parallel_units = 8;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parallel_gate() {
        let auto = SearchConfig::default();
        assert!(!auto.runs_parallel(7));
        assert!(auto.runs_parallel(8));
        assert!(auto.runs_parallel(64));

        let forced = SearchConfig {
            execution: ExecutionMode::Parallel,
            ..Default::default()
        };
        assert!(forced.runs_parallel(1));

        let sequential = SearchConfig {
            execution: ExecutionMode::Sequential,
            ..Default::default()
        };
        assert!(!sequential.runs_parallel(128));
    }

    #[test]
    fn test_execution_mode_parsing() {
        assert_eq!(
            "Parallel".parse::<ExecutionMode>(),
            Ok(ExecutionMode::Parallel)
        );
        assert_eq!(" auto ".parse::<ExecutionMode>(), Ok(ExecutionMode::Auto));
        assert!("threads".parse::<ExecutionMode>().is_err());
        assert_eq!(ExecutionMode::Sequential.to_string(), "sequential");
    }
}
