//! Symptom vocabulary models.

use serde::{Deserialize, Serialize};

use super::bird::{any_bird, filter_admits, BirdFilter, BirdType};

/// An observable clinical sign in the controlled vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Symptom {
    /// Canonical identifier (e.g. "twisted_neck")
    pub id: String,
    /// Display name shown in the symptom picker
    pub name: String,
    /// Category key (e.g. "respiratory", "nervous")
    pub category: String,
    /// Alternative phrasings recognized by the normalizer
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Bird types this sign can be observed in
    #[serde(default = "any_bird")]
    pub applies_to: Vec<BirdFilter>,
}

impl Symptom {
    /// Create a symptom observable in any bird type.
    pub fn new(id: &str, name: &str, category: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            aliases: Vec::new(),
            applies_to: any_bird(),
        }
    }

    /// Check if this symptom can be observed in the given bird type.
    pub fn applies_to(&self, bird_type: BirdType) -> bool {
        filter_admits(&self.applies_to, bird_type)
    }
}

/// Symptoms of one category, in vocabulary order.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SymptomGroup<'a> {
    pub category: &'a str,
    pub symptoms: Vec<&'a Symptom>,
}
