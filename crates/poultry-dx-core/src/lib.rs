//! Poultry-DX Core Library
//!
//! Rule-based poultry disease prediction from observed symptoms.
//!
//! # Architecture
//!
//! ```text
//! Prediction request (bird type, age, mortality, symptoms)
//!                     │
//!              Validation ──────────► InvalidInput
//!                     │
//!            Symptom Normalization
//!     (exact → alias → substring → fuzzy)
//!                     │
//!          Matching & Scoring Engine
//!   weighted overlap + specificity bonus
//!                     │
//!             Result Assembler
//!   treatment / prevention / facts / vet alert
//!                     │
//!             PredictionResponse
//!
//!  ┌──────────────────────────────────────────────┐
//!  │ KnowledgeBase (immutable, Arc-swapped)       │
//!  │ bundled JSON │ JSON file │ SQLite database   │
//!  └──────────────────────────────────────────────┘
//! ```
//!
//! # Core Principle
//!
//! **The engine never diagnoses.** Every response is a ranked list of
//! candidates; serious findings always recommend a veterinarian.
//!
//! # Modules
//!
//! - [`config`]: Tunable scoring thresholds
//! - [`db`]: SQLite storage for the knowledge base
//! - [`knowledge`]: Validated, indexed knowledge base
//! - [`models`]: Domain types (Symptom, Disease, PredictionRequest, etc.)
//! - [`predictor`]: Normalizer, scorer and result assembler

pub mod config;
pub mod db;
pub mod knowledge;
pub mod models;
pub mod predictor;

// Re-export commonly used types
pub use config::ScoringConfig;
pub use db::Database;
pub use knowledge::{KnowledgeBase, KnowledgeDocument};
pub use models::{
    BirdType, Disease, DiseaseCategory, DiseaseMatch, PredictionRequest, PredictionResponse,
    SeverityTier, Symptom,
};
pub use predictor::{PredictError, Predictor};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::info;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PoultryDxError {
    #[error("Knowledge base error: {0}")]
    KnowledgeBaseError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<knowledge::KnowledgeError> for PoultryDxError {
    fn from(e: knowledge::KnowledgeError) -> Self {
        PoultryDxError::KnowledgeBaseError(e.to_string())
    }
}

impl From<db::DbError> for PoultryDxError {
    fn from(e: db::DbError) -> Self {
        PoultryDxError::DatabaseError(e.to_string())
    }
}

impl From<config::ConfigError> for PoultryDxError {
    fn from(e: config::ConfigError) -> Self {
        PoultryDxError::ConfigError(e.to_string())
    }
}

impl From<PredictError> for PoultryDxError {
    fn from(e: PredictError) -> Self {
        match e {
            PredictError::InvalidInput(msg) => PoultryDxError::InvalidInput(msg),
            PredictError::Serialization(e) => PoultryDxError::SerializationError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for PoultryDxError {
    fn from(e: serde_json::Error) -> Self {
        PoultryDxError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PoultryDxError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PoultryDxError::InternalError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open the knowledge base compiled into the library with default scoring.
#[uniffi::export]
pub fn open_bundled() -> Result<Arc<PoultryDxCore>, PoultryDxError> {
    PoultryDxCore::load(KnowledgeSource::Bundled, ScoringConfig::default()).map(Arc::new)
}

/// Open a JSON knowledge document, with an optional scoring config file.
#[uniffi::export]
pub fn open_knowledge_base(
    path: String,
    config_path: Option<String>,
) -> Result<Arc<PoultryDxCore>, PoultryDxError> {
    let config = load_config(config_path.as_deref())?;
    PoultryDxCore::load(KnowledgeSource::File(PathBuf::from(path)), config).map(Arc::new)
}

/// Open a knowledge base previously imported into a SQLite database.
#[uniffi::export]
pub fn open_database(
    path: String,
    config_path: Option<String>,
) -> Result<Arc<PoultryDxCore>, PoultryDxError> {
    let config = load_config(config_path.as_deref())?;
    PoultryDxCore::load(KnowledgeSource::Database(PathBuf::from(path)), config).map(Arc::new)
}

fn load_config(config_path: Option<&str>) -> Result<ScoringConfig, PoultryDxError> {
    Ok(match config_path {
        Some(path) => ScoringConfig::from_path(path)?,
        None => ScoringConfig::default(),
    })
}

/// Where the knowledge base is (re)loaded from.
#[derive(Debug, Clone)]
pub enum KnowledgeSource {
    Bundled,
    File(PathBuf),
    Database(PathBuf),
}

impl KnowledgeSource {
    /// Build a fresh, fully validated knowledge base.
    pub fn load(&self) -> Result<KnowledgeBase, PoultryDxError> {
        Ok(match self {
            KnowledgeSource::Bundled => KnowledgeBase::bundled()?,
            KnowledgeSource::File(path) => KnowledgeBase::from_path(path)?,
            KnowledgeSource::Database(path) => {
                KnowledgeBase::from_database(&Database::open(path)?)?
            }
        })
    }
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe predictor facade for FFI.
///
/// Predictions take a snapshot of the current knowledge base; a reload swaps
/// in a new one without disturbing predictions already running.
#[derive(uniffi::Object)]
pub struct PoultryDxCore {
    source: KnowledgeSource,
    config: ScoringConfig,
    kb: RwLock<Arc<KnowledgeBase>>,
}

impl PoultryDxCore {
    /// Load a knowledge base from `source`.
    pub fn load(source: KnowledgeSource, config: ScoringConfig) -> Result<Self, PoultryDxError> {
        let kb = source.load()?;
        Ok(Self {
            source,
            config,
            kb: RwLock::new(Arc::new(kb)),
        })
    }

    /// Current knowledge base snapshot.
    pub fn knowledge_base(&self) -> Result<Arc<KnowledgeBase>, PoultryDxError> {
        Ok(Arc::clone(&*self.kb.read()?))
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Predict with the native request/response types.
    pub fn predict_request(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, PoultryDxError> {
        let kb = self.knowledge_base()?;
        Ok(Predictor::new(&kb, &self.config).predict(request)?)
    }
}

#[uniffi::export]
impl PoultryDxCore {
    // =========================================================================
    // Prediction
    // =========================================================================

    /// Rank candidate diseases for a set of observed symptoms.
    pub fn predict(
        &self,
        request: FfiPredictionRequest,
    ) -> Result<FfiPredictionResponse, PoultryDxError> {
        let response = self.predict_request(&request.into())?;
        Ok(response.into())
    }

    /// JSON request in, JSON response out.
    pub fn predict_json(&self, request_json: String) -> Result<String, PoultryDxError> {
        let kb = self.knowledge_base()?;
        Ok(Predictor::new(&kb, &self.config).predict_json(&request_json)?)
    }

    /// Canonical symptom identifiers for raw inputs (sorted, de-duplicated).
    pub fn normalize_symptoms(
        &self,
        symptoms: Vec<String>,
        bird_type: String,
    ) -> Result<Vec<String>, PoultryDxError> {
        let kb = self.knowledge_base()?;
        let ids = Predictor::new(&kb, &self.config).normalize_symptoms(&symptoms, &bird_type)?;
        Ok(ids.into_iter().collect())
    }

    // =========================================================================
    // Knowledge Base Queries
    // =========================================================================

    /// Diseases applicable to a bird type, in declaration order.
    pub fn list_diseases(
        &self,
        bird_type: String,
    ) -> Result<Vec<FfiDiseaseSummary>, PoultryDxError> {
        let bird_type = predictor::parse_bird_type(&bird_type)?;
        let kb = self.knowledge_base()?;
        Ok(kb
            .disease_summaries(bird_type)
            .into_iter()
            .map(|d| d.into())
            .collect())
    }

    /// Symptom picker groups.
    pub fn list_symptom_categories(&self) -> Result<Vec<FfiSymptomCategory>, PoultryDxError> {
        let kb = self.knowledge_base()?;
        Ok(kb
            .list_symptom_categories()
            .into_iter()
            .map(|group| FfiSymptomCategory {
                category: group.category.to_string(),
                symptoms: group.symptoms.into_iter().map(|s| s.into()).collect(),
            })
            .collect())
    }

    /// Common breeds for a bird type.
    pub fn list_breeds(&self, bird_type: String) -> Result<Vec<FfiBreed>, PoultryDxError> {
        let bird_type = predictor::parse_bird_type(&bird_type)?;
        let kb = self.knowledge_base()?;
        Ok(kb
            .breeds(bird_type)
            .iter()
            .map(|b| FfiBreed {
                name: b.name.clone(),
                notes: b.notes.clone(),
            })
            .collect())
    }

    /// SHA-256 fingerprint of the loaded knowledge document.
    pub fn knowledge_base_fingerprint(&self) -> Result<String, PoultryDxError> {
        Ok(self.knowledge_base()?.fingerprint().to_string())
    }

    /// Rebuild the knowledge base from its source and swap it in.
    ///
    /// On failure the current knowledge base stays active. Returns the new
    /// fingerprint.
    pub fn reload_knowledge_base(&self) -> Result<String, PoultryDxError> {
        let fresh = Arc::new(self.source.load()?);
        let fingerprint = fresh.fingerprint().to_string();

        let mut current = self.kb.write()?;
        let previous = std::mem::replace(&mut *current, fresh);
        info!(
            source = ?self.source,
            previous = %&previous.fingerprint()[..12],
            current = %&fingerprint[..12],
            "Knowledge base reloaded"
        );
        Ok(fingerprint)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe prediction request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPredictionRequest {
    pub bird_type: String,
    pub breed: Option<String>,
    pub age_days: Option<i64>,
    pub flock_size: Option<i64>,
    pub mortality_rate: Option<f64>,
    pub symptoms: Vec<String>,
    pub additional_info: Option<String>,
}

impl From<FfiPredictionRequest> for PredictionRequest {
    fn from(request: FfiPredictionRequest) -> Self {
        PredictionRequest {
            bird_type: request.bird_type,
            breed: request.breed,
            age_days: request.age_days,
            flock_size: request.flock_size,
            mortality_rate: request.mortality_rate,
            symptoms: request.symptoms,
            additional_info: request.additional_info,
        }
    }
}

/// FFI-safe ranked disease.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDiseaseMatch {
    pub id: String,
    pub name: String,
    pub category: String,
    pub match_score: u8,
    pub raw_score: f64,
    pub bonus_applied: bool,
    pub matched_symptoms: Vec<String>,
    pub missing_symptoms: Vec<String>,
    pub severity: String,
    pub mortality_rate: String,
    pub causes: Vec<String>,
    pub notifiable: bool,
    pub age_consistent: Option<bool>,
}

impl From<DiseaseMatch> for FfiDiseaseMatch {
    fn from(m: DiseaseMatch) -> Self {
        Self {
            id: m.id,
            name: m.name,
            category: m.category.to_string(),
            match_score: m.match_score,
            raw_score: m.raw_score,
            bonus_applied: m.bonus_applied,
            matched_symptoms: m.matched_symptoms,
            missing_symptoms: m.missing_symptoms,
            severity: m.severity.to_string(),
            mortality_rate: m.mortality_rate,
            causes: m.causes,
            notifiable: m.notifiable,
            age_consistent: m.age_consistent,
        }
    }
}

/// FFI-safe prediction response.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPredictionResponse {
    pub diseases: Vec<FfiDiseaseMatch>,
    pub severity: Option<String>,
    pub treatment: Vec<String>,
    pub prevention: Vec<String>,
    pub facts: Vec<String>,
    pub deficiencies: Option<Vec<String>>,
    pub when_to_call_vet: bool,
    pub confidence: f64,
    pub low_confidence: bool,
    pub low_confidence_message: Option<String>,
    pub knowledge_base: String,
}

impl From<PredictionResponse> for FfiPredictionResponse {
    fn from(response: PredictionResponse) -> Self {
        Self {
            diseases: response.diseases.into_iter().map(|d| d.into()).collect(),
            severity: response.severity.map(|s| s.to_string()),
            treatment: response.treatment,
            prevention: response.prevention,
            facts: response.facts,
            deficiencies: response.deficiencies,
            when_to_call_vet: response.call_vet,
            confidence: response.confidence,
            low_confidence: response.low_confidence,
            low_confidence_message: response.low_confidence_message,
            knowledge_base: response.knowledge_base,
        }
    }
}

/// FFI-safe disease list entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDiseaseSummary {
    pub id: String,
    pub name: String,
    pub category: String,
    pub severity: String,
}

impl From<knowledge::DiseaseSummary> for FfiDiseaseSummary {
    fn from(summary: knowledge::DiseaseSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            category: summary.category.to_string(),
            severity: summary.severity.to_string(),
        }
    }
}

/// FFI-safe symptom.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSymptom {
    pub id: String,
    pub name: String,
    pub aliases: Vec<String>,
}

impl From<&Symptom> for FfiSymptom {
    fn from(symptom: &Symptom) -> Self {
        Self {
            id: symptom.id.clone(),
            name: symptom.name.clone(),
            aliases: symptom.aliases.clone(),
        }
    }
}

/// FFI-safe symptom picker group.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSymptomCategory {
    pub category: String,
    pub symptoms: Vec<FfiSymptom>,
}

/// FFI-safe breed.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBreed {
    pub name: String,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(bird_type: &str, symptoms: &[&str]) -> FfiPredictionRequest {
        FfiPredictionRequest {
            bird_type: bird_type.to_string(),
            breed: None,
            age_days: None,
            flock_size: None,
            mortality_rate: None,
            symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
            additional_info: None,
        }
    }

    #[test]
    fn test_open_bundled_and_predict() {
        let core = open_bundled().unwrap();
        let response = core
            .predict(request("broiler", &["Bloody droppings", "Ruffled feathers", "Huddling"]))
            .unwrap();

        assert!(!response.diseases.is_empty());
        assert_eq!(response.diseases[0].id, "coccidiosis");
        assert_eq!(response.knowledge_base, core.knowledge_base_fingerprint().unwrap());
    }

    #[test]
    fn test_predict_exposes_score_breakdown() {
        let core = open_bundled().unwrap();
        let response = core
            .predict(request("broiler", &["twisted neck and paralysis"]))
            .unwrap();

        let top = &response.diseases[0];
        assert_eq!(top.id, "newcastle_disease");
        assert_eq!(top.match_score, 38);
        assert!(top.bonus_applied);
        assert!(top.raw_score < f64::from(top.match_score) / 100.0);
    }

    #[test]
    fn test_prediction_errors_keep_their_kind() {
        let invalid = PoultryDxError::from(PredictError::InvalidInput("bad".into()));
        assert!(matches!(invalid, PoultryDxError::InvalidInput(msg) if msg == "bad"));

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let serialization = PoultryDxError::from(PredictError::Serialization(source));
        assert!(matches!(serialization, PoultryDxError::SerializationError(_)));
    }

    #[test]
    fn test_invalid_bird_type() {
        let core = open_bundled().unwrap();
        assert!(matches!(
            core.predict(request("turkey", &["Coughing"])),
            Err(PoultryDxError::InvalidInput(_))
        ));
        assert!(matches!(
            core.list_diseases("turkey".into()),
            Err(PoultryDxError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_listings() {
        let core = open_bundled().unwrap();

        let broiler = core.list_diseases("broiler".into()).unwrap();
        let layer = core.list_diseases("layer".into()).unwrap();
        assert!(broiler.iter().any(|d| d.id == "ascites"));
        assert!(!layer.iter().any(|d| d.id == "ascites"));
        assert!(layer.iter().any(|d| d.id == "cage_layer_fatigue"));

        let groups = core.list_symptom_categories().unwrap();
        assert_eq!(groups[0].category, "respiratory");
        let total: usize = groups.iter().map(|g| g.symptoms.len()).sum();
        assert_eq!(total, core.knowledge_base().unwrap().symptoms().len());

        assert!(!core.list_breeds("layer".into()).unwrap().is_empty());
    }

    #[test]
    fn test_normalize_symptoms() {
        let core = open_bundled().unwrap();
        let ids = core
            .normalize_symptoms(
                vec!["Torticollis".into(), "twisted neck".into(), "bogus".into()],
                "layer".into(),
            )
            .unwrap();
        assert_eq!(ids, vec!["twisted_neck"]);
    }

    #[test]
    fn test_reload_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");

        let mut document = KnowledgeBase::bundled().unwrap().document().clone();
        std::fs::write(&path, serde_json::to_string(&document).unwrap()).unwrap();

        let core = open_knowledge_base(path.display().to_string(), None).unwrap();
        let before = core.knowledge_base_fingerprint().unwrap();
        let snapshot = core.knowledge_base().unwrap();

        document.version = "reloaded".into();
        std::fs::write(&path, serde_json::to_string(&document).unwrap()).unwrap();
        let after = core.reload_knowledge_base().unwrap();

        assert_ne!(before, after);
        assert_eq!(core.knowledge_base_fingerprint().unwrap(), after);
        // Snapshots taken before the swap are untouched
        assert_eq!(snapshot.fingerprint(), before);
    }

    #[test]
    fn test_failed_reload_keeps_current() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        let document = KnowledgeBase::bundled().unwrap().document().clone();
        std::fs::write(&path, serde_json::to_string(&document).unwrap()).unwrap();

        let core = open_knowledge_base(path.display().to_string(), None).unwrap();
        let before = core.knowledge_base_fingerprint().unwrap();

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            core.reload_knowledge_base(),
            Err(PoultryDxError::KnowledgeBaseError(_))
        ));
        assert_eq!(core.knowledge_base_fingerprint().unwrap(), before);
    }

    #[test]
    fn test_open_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.sqlite");

        let mut db = Database::open(&path).unwrap();
        db.import_knowledge_base(KnowledgeBase::bundled().unwrap().document()).unwrap();
        drop(db);

        let core = open_database(path.display().to_string(), None).unwrap();
        assert_eq!(
            core.knowledge_base_fingerprint().unwrap(),
            KnowledgeBase::bundled().unwrap().fingerprint()
        );
    }

    #[test]
    fn test_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("scoring.json");
        std::fs::write(&config_path, r#"{"max_results": 1}"#).unwrap();

        let kb_path = dir.path().join("kb.json");
        let document = KnowledgeBase::bundled().unwrap().document().to_json().unwrap();
        std::fs::write(&kb_path, document).unwrap();

        let core = open_knowledge_base(
            kb_path.display().to_string(),
            Some(config_path.display().to_string()),
        )
        .unwrap();
        assert_eq!(core.config().max_results, 1);

        let response = core
            .predict(request("layer", &["Coughing", "Sneezing", "Rales", "Nasal discharge"]))
            .unwrap();
        assert_eq!(response.diseases.len(), 1);

        assert!(matches!(
            open_knowledge_base(
                kb_path.display().to_string(),
                Some("/nonexistent/scoring.json".into())
            ),
            Err(PoultryDxError::ConfigError(_))
        ));
    }
}
