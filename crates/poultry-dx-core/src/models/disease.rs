//! Disease knowledge records.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::bird::{any_bird, filter_admits, BirdFilter, BirdType};

/// Broad aetiological category of a disease.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DiseaseCategory {
    Viral,
    Bacterial,
    Parasitic,
    Fungal,
    Nutritional,
    Other,
}

impl DiseaseCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            DiseaseCategory::Viral => "viral",
            DiseaseCategory::Bacterial => "bacterial",
            DiseaseCategory::Parasitic => "parasitic",
            DiseaseCategory::Fungal => "fungal",
            DiseaseCategory::Nutritional => "nutritional",
            DiseaseCategory::Other => "other",
        }
    }
}

impl fmt::Display for DiseaseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Baseline severity tier. Ordered from least to most urgent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    #[serde(alias = "low")]
    Mild,
    Moderate,
    #[serde(alias = "high")]
    Severe,
    Critical,
}

impl SeverityTier {
    pub fn as_str(self) -> &'static str {
        match self {
            SeverityTier::Mild => "mild",
            SeverityTier::Moderate => "moderate",
            SeverityTier::Severe => "severe",
            SeverityTier::Critical => "critical",
        }
    }

    /// Tiers that warrant veterinary escalation on their own.
    pub fn needs_vet(self) -> bool {
        self >= SeverityTier::Severe
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a disease's symptom signature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomWeight {
    /// Symptom identifier
    pub symptom: String,
    /// Diagnostic specificity in (0, 1]
    pub weight: f64,
}

/// Typical susceptibility window in days of age.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AgeRange {
    pub min: u32,
    pub max: u32,
}

impl AgeRange {
    pub fn contains(&self, age_days: u32) -> bool {
        age_days >= self.min && age_days <= self.max
    }
}

/// A disease record linking a weighted symptom signature to guidance content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Disease {
    /// Stable identifier (e.g. "newcastle_disease")
    pub id: String,
    /// Display name
    pub name: String,
    pub category: DiseaseCategory,
    /// Ordered symptom signature; weights are independent evidence, not a distribution
    pub symptoms: Vec<SymptomWeight>,
    pub severity: SeverityTier,
    /// Free-text mortality descriptor (e.g. "5-30%")
    pub mortality_rate: String,
    #[serde(default)]
    pub causes: Vec<String>,
    #[serde(default)]
    pub treatment: Vec<String>,
    #[serde(default)]
    pub prevention: Vec<String>,
    #[serde(default)]
    pub facts: Vec<String>,
    /// Bird types the disease is relevant for
    #[serde(default = "any_bird")]
    pub affects: Vec<BirdFilter>,
    /// Reportable to the veterinary authority
    #[serde(default, skip_serializing_if = "is_false")]
    pub notifiable: bool,
    /// Nutrients implicated (nutritional diseases)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deficiencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range_days: Option<AgeRange>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Disease {
    /// Create a disease with an empty signature and no guidance content.
    pub fn new(id: &str, name: &str, category: DiseaseCategory, severity: SeverityTier) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            symptoms: Vec::new(),
            severity,
            mortality_rate: "variable".to_string(),
            causes: Vec::new(),
            treatment: Vec::new(),
            prevention: Vec::new(),
            facts: Vec::new(),
            affects: any_bird(),
            notifiable: false,
            deficiencies: Vec::new(),
            age_range_days: None,
        }
    }

    /// Builder-style helper for appending a signature entry.
    pub fn with_symptom(mut self, symptom: &str, weight: f64) -> Self {
        self.symptoms.push(SymptomWeight {
            symptom: symptom.to_string(),
            weight,
        });
        self
    }

    /// Check if the disease is relevant for the given bird type.
    pub fn applies_to(&self, bird_type: BirdType) -> bool {
        filter_admits(&self.affects, bird_type)
    }

    /// Sum of all signature weights.
    pub fn total_weight(&self) -> f64 {
        self.symptoms.iter().map(|s| s.weight).sum()
    }

    /// Check whether an age falls inside the susceptibility window, if one is known.
    pub fn age_consistent(&self, age_days: u32) -> Option<bool> {
        self.age_range_days.map(|range| range.contains(age_days))
    }
}
