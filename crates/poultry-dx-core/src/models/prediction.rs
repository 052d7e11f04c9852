//! Prediction request/response models.

use serde::{Deserialize, Serialize};

use super::bird::BirdType;
use super::disease::{DiseaseCategory, SeverityTier};

/// Prediction request as received from the caller.
///
/// Loosely typed on purpose: the predictor validates it into a
/// [`ValidatedRequest`] and rejects anything out of range.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PredictionRequest {
    /// "broiler", "layer" or "breeder"
    pub bird_type: String,
    /// Informational only, never affects scoring
    #[serde(default)]
    pub breed: Option<String>,
    /// Age in days; a fixed baseline is used when absent
    #[serde(default)]
    pub age_days: Option<i64>,
    #[serde(default)]
    pub flock_size: Option<i64>,
    /// Fraction of the flock lost (0.0 - 1.0)
    #[serde(default)]
    pub mortality_rate: Option<f64>,
    /// Selected or free-text symptom names
    #[serde(default)]
    pub symptoms: Vec<String>,
    /// Reserved for the chat pathway
    #[serde(default)]
    pub additional_info: Option<String>,
}

impl PredictionRequest {
    /// Create a request with only bird type and symptoms set.
    pub fn new(bird_type: &str, symptoms: &[&str]) -> Self {
        Self {
            bird_type: bird_type.to_string(),
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }
}

/// A request that passed validation, with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub bird_type: BirdType,
    pub breed: Option<String>,
    pub age_days: u32,
    pub flock_size: Option<u32>,
    pub mortality_rate: f64,
    pub symptoms: Vec<String>,
}

/// How a raw symptom string was mapped onto the vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum MatchMethod {
    /// Display name or identifier matched exactly
    Exact,
    /// A registered alias matched exactly
    Alias,
    /// One string contains the other
    Substring,
    /// Edit-distance similarity above threshold
    Fuzzy { similarity: f64 },
}

/// A raw symptom string resolved to a canonical symptom.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomResolution {
    pub input: String,
    pub symptom_id: String,
    pub method: MatchMethod,
}

/// Score of one candidate disease against the input symptoms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    pub disease_id: String,
    /// Final score (0 - 100)
    pub match_score: u8,
    /// Fraction of signature weight present, before the specificity bonus
    pub raw_score: f64,
    /// Whether a pathognomonic symptom boosted the score
    pub bonus_applied: bool,
    /// Signature symptoms present in the input (signature order)
    pub matched_symptoms: Vec<String>,
    /// Signature symptoms absent from the input (signature order)
    pub missing_symptoms: Vec<String>,
    pub severity: SeverityTier,
    /// Whether the flock's age falls in the disease's susceptibility window
    pub age_consistent: Option<bool>,
}

/// One ranked disease as presented to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseMatch {
    pub id: String,
    pub name: String,
    pub category: DiseaseCategory,
    pub match_score: u8,
    /// Fraction of signature weight present, before the specificity bonus
    pub raw_score: f64,
    pub bonus_applied: bool,
    /// Display names of matched signature symptoms
    pub matched_symptoms: Vec<String>,
    /// Display names of missing signature symptoms
    pub missing_symptoms: Vec<String>,
    pub severity: SeverityTier,
    pub mortality_rate: String,
    pub causes: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub notifiable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_consistent: Option<bool>,
}

/// Full prediction returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    /// Ranked candidates, highest score first
    pub diseases: Vec<DiseaseMatch>,
    /// Highest tier among confident matches, or null
    pub severity: Option<SeverityTier>,
    pub treatment: Vec<String>,
    pub prevention: Vec<String>,
    pub facts: Vec<String>,
    pub deficiencies: Option<Vec<String>>,
    /// Vet-alert flag
    #[serde(rename = "when_to_call_vet")]
    pub call_vet: bool,
    /// Overall confidence (0.0 - 0.95)
    pub confidence: f64,
    pub low_confidence: bool,
    pub low_confidence_message: Option<String>,
    /// Fingerprint of the knowledge base that produced this response
    pub knowledge_base: String,
}

impl PredictionResponse {
    /// Top-ranked disease, if any.
    pub fn top(&self) -> Option<&DiseaseMatch> {
        self.diseases.first()
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
