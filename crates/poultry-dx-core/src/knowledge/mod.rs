//! Disease knowledge base.
//!
//! Loaded once, validated as a whole and immutable afterwards. A reload
//! builds a fresh [`KnowledgeBase`] and swaps it in; nothing is patched in
//! place.

mod document;
mod vocabulary;

pub use document::*;
pub use vocabulary::*;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

use crate::db::Database;
use crate::models::{
    BirdType, Disease, DiseaseCategory, SeverityTier, Symptom, SymptomGroup,
};

/// Knowledge document compiled into the library.
const BUNDLED_DOCUMENT: &str = include_str!("../../data/knowledge_base.json");

/// Knowledge base load errors. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Duplicate symptom: {0}")]
    DuplicateSymptom(String),

    #[error("Duplicate disease: {0}")]
    DuplicateDisease(String),

    #[error("Alias '{alias}' maps to both {first} and {second}")]
    AmbiguousAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Disease {disease} references unknown symptom {symptom}")]
    UnknownSymptom { disease: String, symptom: String },

    #[error("Disease {disease} lists symptom {symptom} more than once")]
    DuplicateSignatureEntry { disease: String, symptom: String },

    #[error("Disease {disease}: weight {weight} for {symptom} is outside (0, 1]")]
    InvalidWeight {
        disease: String,
        symptom: String,
        weight: f64,
    },

    #[error("Disease {0} has an empty symptom signature")]
    EmptySignature(String),

    #[error("{0} has an empty applicability filter")]
    EmptyApplicability(String),

    #[error("No category guidance for {0} diseases")]
    MissingGuidance(DiseaseCategory),
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;

/// Condensed disease record for reference lists.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiseaseSummary {
    pub id: String,
    pub name: String,
    pub category: DiseaseCategory,
    pub severity: SeverityTier,
}

/// Validated, indexed, read-only knowledge base.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    document: KnowledgeDocument,
    symptom_index: HashMap<String, usize>,
    disease_index: HashMap<String, usize>,
    vocabulary: Vocabulary,
    fingerprint: String,
}

impl KnowledgeBase {
    /// Validate a document and build the lookup indexes.
    pub fn from_document(document: KnowledgeDocument) -> KnowledgeResult<Self> {
        let symptom_index = index_symptoms(&document.symptoms)?;
        let disease_index = index_diseases(&document.diseases)?;

        for disease in &document.diseases {
            validate_disease(disease, &symptom_index)?;
            if !document.category_guidance.contains_key(&disease.category) {
                return Err(KnowledgeError::MissingGuidance(disease.category));
            }
        }

        let vocabulary = Vocabulary::build(&document.symptoms)?;
        let fingerprint = hex::encode(Sha256::digest(serde_json::to_vec(&document)?));

        info!(
            version = %document.version,
            symptoms = document.symptoms.len(),
            diseases = document.diseases.len(),
            fingerprint = %&fingerprint[..12],
            "Knowledge base loaded"
        );

        Ok(Self {
            document,
            symptom_index,
            disease_index,
            vocabulary,
            fingerprint,
        })
    }

    /// Parse and validate a JSON knowledge document.
    pub fn from_json_str(json: &str) -> KnowledgeResult<Self> {
        Self::from_document(serde_json::from_str(json)?)
    }

    /// Load a JSON knowledge document from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> KnowledgeResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Load the knowledge document stored in a database.
    pub fn from_database(db: &Database) -> KnowledgeResult<Self> {
        Self::from_document(db.load_knowledge_document()?)
    }

    /// The knowledge base shipped with the library.
    pub fn bundled() -> KnowledgeResult<Self> {
        Self::from_json_str(BUNDLED_DOCUMENT)
    }

    /// Underlying document (e.g. for export or database import).
    pub fn document(&self) -> &KnowledgeDocument {
        &self.document
    }

    pub fn version(&self) -> &str {
        &self.document.version
    }

    /// SHA-256 of the canonical JSON document, hex encoded.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn symptoms(&self) -> &[Symptom] {
        &self.document.symptoms
    }

    pub fn symptom(&self, id: &str) -> Option<&Symptom> {
        self.symptom_index.get(id).map(|&i| &self.document.symptoms[i])
    }

    /// Display name for a symptom identifier, falling back to the identifier.
    pub fn symptom_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.symptom(id).map(|s| s.name.as_str()).unwrap_or(id)
    }

    pub fn diseases(&self) -> &[Disease] {
        &self.document.diseases
    }

    pub fn disease(&self, id: &str) -> Option<&Disease> {
        self.disease_index.get(id).map(|&i| &self.document.diseases[i])
    }

    /// Diseases applicable to a bird type, in declaration order.
    pub fn list_diseases(&self, bird_type: BirdType) -> Vec<&Disease> {
        self.document
            .diseases
            .iter()
            .filter(|d| d.applies_to(bird_type))
            .collect()
    }

    /// Reference list of applicable diseases.
    pub fn disease_summaries(&self, bird_type: BirdType) -> Vec<DiseaseSummary> {
        self.list_diseases(bird_type)
            .into_iter()
            .map(|d| DiseaseSummary {
                id: d.id.clone(),
                name: d.name.clone(),
                category: d.category,
                severity: d.severity,
            })
            .collect()
    }

    /// Symptoms grouped by category, categories in first-appearance order.
    pub fn list_symptom_categories(&self) -> Vec<SymptomGroup<'_>> {
        let mut groups: Vec<SymptomGroup<'_>> = Vec::new();
        for symptom in &self.document.symptoms {
            match groups.iter_mut().find(|g| g.category == symptom.category) {
                Some(group) => group.symptoms.push(symptom),
                None => groups.push(SymptomGroup {
                    category: &symptom.category,
                    symptoms: vec![symptom],
                }),
            }
        }
        groups
    }

    pub fn guidance(&self, category: DiseaseCategory) -> Option<&CategoryGuidance> {
        self.document.category_guidance.get(&category)
    }

    /// General poultry facts.
    pub fn facts(&self) -> &[String] {
        &self.document.facts
    }

    /// Common breeds for a bird type.
    pub fn breeds(&self, bird_type: BirdType) -> &[Breed] {
        self.document
            .breeds
            .get(&bird_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn index_symptoms(symptoms: &[Symptom]) -> KnowledgeResult<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(symptoms.len());
    for (i, symptom) in symptoms.iter().enumerate() {
        if symptom.id.trim().is_empty() || symptom.name.trim().is_empty() {
            return Err(KnowledgeError::InvalidRecord(format!(
                "symptom #{} needs an id and a name",
                i
            )));
        }
        if symptom.applies_to.is_empty() {
            return Err(KnowledgeError::EmptyApplicability(format!("symptom {}", symptom.id)));
        }
        if index.insert(symptom.id.clone(), i).is_some() {
            return Err(KnowledgeError::DuplicateSymptom(symptom.id.clone()));
        }
    }
    Ok(index)
}

fn index_diseases(diseases: &[Disease]) -> KnowledgeResult<HashMap<String, usize>> {
    let mut index = HashMap::with_capacity(diseases.len());
    for (i, disease) in diseases.iter().enumerate() {
        if disease.id.trim().is_empty() || disease.name.trim().is_empty() {
            return Err(KnowledgeError::InvalidRecord(format!(
                "disease #{} needs an id and a name",
                i
            )));
        }
        if index.insert(disease.id.clone(), i).is_some() {
            return Err(KnowledgeError::DuplicateDisease(disease.id.clone()));
        }
    }
    Ok(index)
}

fn validate_disease(disease: &Disease, symptoms: &HashMap<String, usize>) -> KnowledgeResult<()> {
    if disease.symptoms.is_empty() {
        return Err(KnowledgeError::EmptySignature(disease.id.clone()));
    }
    if disease.affects.is_empty() {
        return Err(KnowledgeError::EmptyApplicability(format!("disease {}", disease.id)));
    }

    let mut seen = HashSet::new();
    for entry in &disease.symptoms {
        if !symptoms.contains_key(&entry.symptom) {
            return Err(KnowledgeError::UnknownSymptom {
                disease: disease.id.clone(),
                symptom: entry.symptom.clone(),
            });
        }
        if !seen.insert(entry.symptom.as_str()) {
            return Err(KnowledgeError::DuplicateSignatureEntry {
                disease: disease.id.clone(),
                symptom: entry.symptom.clone(),
            });
        }
        // Also rejects NaN
        if !(entry.weight > 0.0 && entry.weight <= 1.0) {
            return Err(KnowledgeError::InvalidWeight {
                disease: disease.id.clone(),
                symptom: entry.symptom.clone(),
                weight: entry.weight,
            });
        }
    }
    Ok(())
}
