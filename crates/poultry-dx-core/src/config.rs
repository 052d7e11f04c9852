//! Scoring parameters.
//!
//! Every threshold the scorer and assembler use lives here as a named
//! default, so deployments can tune them from a JSON file without touching
//! the algorithm.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scores below this are not reported at all.
pub const DEFAULT_RELEVANCE_THRESHOLD: u8 = 10;

/// Only matches at or above this score influence overall severity.
pub const DEFAULT_SEVERITY_THRESHOLD: u8 = 40;

/// Signature weight at which a symptom counts as pathognomonic.
pub const DEFAULT_PATHOGNOMONIC_WEIGHT: f64 = 0.8;

/// Multiplier applied when a pathognomonic symptom is present.
pub const DEFAULT_SPECIFICITY_BONUS: f64 = 1.25;

/// Number of ranked diseases returned.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Mortality fraction above which a vet is always recommended.
pub const DEFAULT_MORTALITY_ALARM_RATE: f64 = 0.05;

/// Number of top results whose prevention/facts are merged.
pub const DEFAULT_MERGE_DEPTH: usize = 3;

/// Cap on merged prevention/facts entries.
pub const DEFAULT_MAX_MERGED_ITEMS: usize = 8;

/// Confidence below which the response is flagged as low confidence.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.25;

/// Age assumed when the request doesn't carry one.
pub const DEFAULT_AGE_DAYS: u32 = 21;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    OutOfRange(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunable parameters of the scoring engine and result assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub relevance_threshold: u8,
    pub severity_threshold: u8,
    pub pathognomonic_weight: f64,
    pub specificity_bonus: f64,
    pub max_results: usize,
    pub mortality_alarm_rate: f64,
    pub merge_depth: usize,
    pub max_merged_items: usize,
    pub min_confidence: f64,
    pub default_age_days: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            severity_threshold: DEFAULT_SEVERITY_THRESHOLD,
            pathognomonic_weight: DEFAULT_PATHOGNOMONIC_WEIGHT,
            specificity_bonus: DEFAULT_SPECIFICITY_BONUS,
            max_results: DEFAULT_MAX_RESULTS,
            mortality_alarm_rate: DEFAULT_MORTALITY_ALARM_RATE,
            merge_depth: DEFAULT_MERGE_DEPTH,
            max_merged_items: DEFAULT_MAX_MERGED_ITEMS,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            default_age_days: DEFAULT_AGE_DAYS,
        }
    }
}

impl ScoringConfig {
    /// Parse a (possibly partial) JSON config; missing keys take defaults.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check parameter ranges and their relationships.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.relevance_threshold > 100 || self.severity_threshold > 100 {
            return Err(ConfigError::OutOfRange("score thresholds must be within 0-100".into()));
        }
        if self.severity_threshold < self.relevance_threshold {
            return Err(ConfigError::OutOfRange(
                "severity_threshold must not be below relevance_threshold".into(),
            ));
        }
        if !(self.pathognomonic_weight > 0.0 && self.pathognomonic_weight <= 1.0) {
            return Err(ConfigError::OutOfRange("pathognomonic_weight must be in (0, 1]".into()));
        }
        if !(self.specificity_bonus >= 1.0 && self.specificity_bonus.is_finite()) {
            return Err(ConfigError::OutOfRange("specificity_bonus must be >= 1.0".into()));
        }
        if self.max_results == 0 {
            return Err(ConfigError::OutOfRange("max_results must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.mortality_alarm_rate) {
            return Err(ConfigError::OutOfRange("mortality_alarm_rate must be in [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::OutOfRange("min_confidence must be in [0, 1]".into()));
        }
        Ok(())
    }
}
