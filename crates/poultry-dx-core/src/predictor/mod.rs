//! Disease predictor.
//!
//! Pipeline: Validation → Symptom Normalization → Scoring & Ranking → Result Assembly

mod assembler;
mod normalizer;
mod scorer;

pub use assembler::*;
pub use normalizer::*;
pub use scorer::*;

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

use crate::config::ScoringConfig;
use crate::knowledge::KnowledgeBase;
use crate::models::{BirdType, PredictionRequest, PredictionResponse, ValidatedRequest};

/// Prediction errors.
#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type PredictResult<T> = Result<T, PredictError>;

/// Parse a bird type label, rejecting unknown ones.
pub fn parse_bird_type(raw: &str) -> PredictResult<BirdType> {
    raw.parse()
        .map_err(|e: crate::models::UnknownBirdType| PredictError::InvalidInput(e.to_string()))
}

/// Main predictor that coordinates the full pipeline.
pub struct Predictor<'a> {
    config: &'a ScoringConfig,
    normalizer: SymptomNormalizer<'a>,
    scorer: Scorer<'a>,
    assembler: ResultAssembler<'a>,
}

impl<'a> Predictor<'a> {
    /// Create a predictor over a validated knowledge base.
    pub fn new(kb: &'a KnowledgeBase, config: &'a ScoringConfig) -> Self {
        Self {
            config,
            normalizer: SymptomNormalizer::new(kb),
            scorer: Scorer::new(kb, config),
            assembler: ResultAssembler::new(kb, config),
        }
    }

    /// Check a raw request and fill in defaults.
    pub fn validate(&self, request: &PredictionRequest) -> PredictResult<ValidatedRequest> {
        let bird_type = parse_bird_type(&request.bird_type)?;

        let age_days = match request.age_days {
            None => self.config.default_age_days,
            Some(age) if age < 0 => {
                return Err(PredictError::InvalidInput(format!(
                    "age_days must not be negative, got {}",
                    age
                )))
            }
            Some(age) => u32::try_from(age).map_err(|_| {
                PredictError::InvalidInput(format!("age_days out of range: {}", age))
            })?,
        };

        let flock_size = match request.flock_size {
            None => None,
            Some(size) if size <= 0 => {
                return Err(PredictError::InvalidInput(format!(
                    "flock_size must be positive, got {}",
                    size
                )))
            }
            Some(size) => Some(
                u32::try_from(size).map_err(|_| {
                    PredictError::InvalidInput(format!("flock_size out of range: {}", size))
                })?,
            ),
        };

        let mortality_rate = request.mortality_rate.unwrap_or(0.0);
        if !(0.0..=1.0).contains(&mortality_rate) {
            return Err(PredictError::InvalidInput(format!(
                "mortality_rate must be a fraction between 0 and 1, got {}",
                mortality_rate
            )));
        }

        let breed = request
            .breed
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string);

        Ok(ValidatedRequest {
            bird_type,
            breed,
            age_days,
            flock_size,
            mortality_rate,
            symptoms: request.symptoms.clone(),
        })
    }

    /// Canonical symptom identifiers for raw inputs.
    pub fn normalize_symptoms<S: AsRef<str>>(
        &self,
        raw: &[S],
        bird_type: &str,
    ) -> PredictResult<BTreeSet<String>> {
        let bird_type = parse_bird_type(bird_type)?;
        Ok(self.normalizer.normalize(raw, bird_type))
    }

    /// Run the full pipeline for one request.
    pub fn predict(&self, request: &PredictionRequest) -> PredictResult<PredictionResponse> {
        let request = self.validate(request)?;

        let symptoms = self.normalizer.normalize(&request.symptoms, request.bird_type);
        let matches = self.scorer.rank(&symptoms, request.bird_type, request.age_days);
        let severity = self.scorer.overall_severity(&matches);
        let call_vet = self.scorer.should_call_vet(severity, request.mortality_rate, &matches);

        debug!(
            bird_type = %request.bird_type,
            inputs = request.symptoms.len(),
            recognized = symptoms.len(),
            matches = matches.len(),
            call_vet,
            "Prediction complete"
        );

        Ok(self.assembler.assemble(symptoms.len(), &matches, severity, call_vet))
    }

    /// JSON in, JSON out. Malformed requests are invalid input.
    pub fn predict_json(&self, json: &str) -> PredictResult<String> {
        let request: PredictionRequest = serde_json::from_str(json)
            .map_err(|e| PredictError::InvalidInput(e.to_string()))?;
        let response = self.predict(&request)?;
        Ok(response.to_json()?)
    }

    /// Get the normalizer for direct access.
    pub fn normalizer(&self) -> &SymptomNormalizer<'a> {
        &self.normalizer
    }

    /// Get the normalizer for registering extra aliases.
    pub fn normalizer_mut(&mut self) -> &mut SymptomNormalizer<'a> {
        &mut self.normalizer
    }

    pub fn scorer(&self) -> &Scorer<'a> {
        &self.scorer
    }
}
