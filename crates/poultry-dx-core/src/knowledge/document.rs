//! Serialized form of the knowledge base.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{BirdType, Disease, DiseaseCategory, Symptom};

/// The persisted knowledge document, as stored on disk or in the database.
///
/// Maps are `BTreeMap`s so serialization order (and therefore the
/// fingerprint) is stable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeDocument {
    /// Data release label (e.g. "2024.1")
    pub version: String,
    /// Symptom vocabulary, in picker order
    pub symptoms: Vec<Symptom>,
    /// Disease records, in priority order for tie-breaking
    pub diseases: Vec<Disease>,
    /// Generic content per disease category
    #[serde(default)]
    pub category_guidance: BTreeMap<DiseaseCategory, CategoryGuidance>,
    /// General poultry facts
    #[serde(default)]
    pub facts: Vec<String>,
    /// Common breeds per bird type
    #[serde(default)]
    pub breeds: BTreeMap<BirdType, Vec<Breed>>,
}

/// Generic guidance used when a disease record leaves a section empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryGuidance {
    #[serde(default)]
    pub treatment: Vec<String>,
    #[serde(default)]
    pub prevention: Vec<String>,
    #[serde(default)]
    pub causes: Vec<String>,
    #[serde(default)]
    pub facts: Vec<String>,
}

/// A commercial breed or strain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Breed {
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl KnowledgeDocument {
    /// Create an empty document with the given version label.
    pub fn new(version: &str) -> Self {
        Self {
            version: version.to_string(),
            symptoms: Vec::new(),
            diseases: Vec::new(),
            category_guidance: BTreeMap::new(),
            facts: Vec::new(),
            breeds: BTreeMap::new(),
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
