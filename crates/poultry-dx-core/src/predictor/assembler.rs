//! Result assembler.
//!
//! Turns ranked matches into the caller-facing response: display names,
//! merged guidance with category fallbacks, deficiencies and confidence.

use crate::config::ScoringConfig;
use crate::knowledge::{CategoryGuidance, KnowledgeBase};
use crate::models::{
    Disease, DiseaseCategory, DiseaseMatch, MatchResult, PredictionResponse, SeverityTier,
};

/// General facts shown when nothing matched.
const GENERAL_FACTS_COUNT: usize = 3;

const TOP_SCORE_WEIGHT: f64 = 0.4;
const COVERAGE_WEIGHT: f64 = 0.25;
const MATCHED_RATIO_WEIGHT: f64 = 0.35;
/// Recognized symptoms needed for full coverage credit.
const FULL_COVERAGE_SYMPTOMS: f64 = 5.0;
const MAX_CONFIDENCE: f64 = 0.95;

const NO_MATCH_MESSAGE: &str = "No disease matched the selected symptoms. Select more symptoms or consult a veterinarian.";
const LOW_CONFIDENCE_MESSAGE: &str = "Low confidence: select more specific symptoms for a more reliable prediction, and consult a veterinarian if birds are getting worse.";

/// Guidance sections that fall back to category content.
#[derive(Debug, Clone, Copy)]
enum Section {
    Treatment,
    Prevention,
    Causes,
    Facts,
}

impl Section {
    fn of_disease(self, disease: &Disease) -> &[String] {
        match self {
            Section::Treatment => &disease.treatment,
            Section::Prevention => &disease.prevention,
            Section::Causes => &disease.causes,
            Section::Facts => &disease.facts,
        }
    }

    fn of_guidance(self, guidance: &CategoryGuidance) -> &[String] {
        match self {
            Section::Treatment => &guidance.treatment,
            Section::Prevention => &guidance.prevention,
            Section::Causes => &guidance.causes,
            Section::Facts => &guidance.facts,
        }
    }
}

/// Builds [`PredictionResponse`]s.
pub struct ResultAssembler<'a> {
    kb: &'a KnowledgeBase,
    config: &'a ScoringConfig,
}

impl<'a> ResultAssembler<'a> {
    pub fn new(kb: &'a KnowledgeBase, config: &'a ScoringConfig) -> Self {
        Self { kb, config }
    }

    /// Assemble the response for ranked matches.
    ///
    /// `recognized` is the number of distinct input symptoms the normalizer
    /// resolved.
    pub fn assemble(
        &self,
        recognized: usize,
        matches: &[MatchResult],
        severity: Option<SeverityTier>,
        call_vet: bool,
    ) -> PredictionResponse {
        // Matches always come from this knowledge base
        let ranked: Vec<(&MatchResult, &Disease)> = matches
            .iter()
            .filter_map(|m| self.kb.disease(&m.disease_id).map(|d| (m, d)))
            .collect();

        let diseases = ranked
            .iter()
            .map(|(m, d)| self.disease_match(m, d))
            .collect();

        let (treatment, prevention, facts) = match ranked.first() {
            Some((_, top)) => {
                let depth: Vec<&Disease> = ranked
                    .iter()
                    .take(self.config.merge_depth)
                    .map(|(_, d)| *d)
                    .collect();
                (
                    self.section(top, Section::Treatment).to_vec(),
                    self.merge(&depth, Section::Prevention),
                    self.merge(&depth, Section::Facts),
                )
            }
            None => (
                Vec::new(),
                Vec::new(),
                self.kb.facts().iter().take(GENERAL_FACTS_COUNT).cloned().collect(),
            ),
        };

        let deficiencies = dedup(
            ranked
                .iter()
                .filter(|(_, d)| d.category == DiseaseCategory::Nutritional)
                .flat_map(|(_, d)| d.deficiencies.iter()),
            usize::MAX,
        );

        let confidence = confidence(recognized, matches);
        let low_confidence = matches.is_empty() || confidence < self.config.min_confidence;
        let low_confidence_message = if matches.is_empty() {
            Some(NO_MATCH_MESSAGE.to_string())
        } else if low_confidence {
            Some(LOW_CONFIDENCE_MESSAGE.to_string())
        } else {
            None
        };

        PredictionResponse {
            diseases,
            severity,
            treatment,
            prevention,
            facts,
            deficiencies: (!deficiencies.is_empty()).then_some(deficiencies),
            call_vet,
            confidence,
            low_confidence,
            low_confidence_message,
            knowledge_base: self.kb.fingerprint().to_string(),
        }
    }

    fn disease_match(&self, m: &MatchResult, disease: &Disease) -> DiseaseMatch {
        let names = |ids: &[String]| -> Vec<String> {
            ids.iter().map(|id| self.kb.symptom_name(id).to_string()).collect()
        };
        DiseaseMatch {
            id: disease.id.clone(),
            name: disease.name.clone(),
            category: disease.category,
            match_score: m.match_score,
            raw_score: m.raw_score,
            bonus_applied: m.bonus_applied,
            matched_symptoms: names(&m.matched_symptoms),
            missing_symptoms: names(&m.missing_symptoms),
            severity: disease.severity,
            mortality_rate: disease.mortality_rate.clone(),
            causes: self.section(disease, Section::Causes).to_vec(),
            notifiable: disease.notifiable,
            age_consistent: m.age_consistent,
        }
    }

    /// A disease's own section, or its category's when empty.
    fn section<'d>(&'d self, disease: &'d Disease, section: Section) -> &'d [String] {
        let own = section.of_disease(disease);
        if !own.is_empty() {
            return own;
        }
        self.kb
            .guidance(disease.category)
            .map(|g| section.of_guidance(g))
            .unwrap_or(&[])
    }

    fn merge(&self, diseases: &[&Disease], section: Section) -> Vec<String> {
        dedup(
            diseases.iter().flat_map(|d| self.section(d, section).iter()),
            self.config.max_merged_items,
        )
    }
}

/// Order-preserving de-duplication, capped at `limit` entries.
fn dedup<'s>(items: impl Iterator<Item = &'s String>, limit: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        if out.len() >= limit {
            break;
        }
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

/// Overall confidence in [0, 0.95], rounded to 2 decimals.
fn confidence(recognized: usize, matches: &[MatchResult]) -> f64 {
    let Some(top) = matches.first() else {
        return 0.0;
    };
    if recognized == 0 {
        return 0.0;
    }

    let n = recognized as f64;
    let matched = top.matched_symptoms.len();
    let coverage = (n / FULL_COVERAGE_SYMPTOMS).min(1.0);
    let matched_ratio = (matched as f64 / n).min(1.0);

    let mut value = f64::from(top.match_score) / 100.0 * TOP_SCORE_WEIGHT
        + coverage * COVERAGE_WEIGHT
        + matched_ratio * MATCHED_RATIO_WEIGHT;
    // A single matching symptom is weak evidence
    if matched <= 1 {
        value *= 0.5;
    }
    (value.min(MAX_CONFIDENCE) * 100.0).round() / 100.0
}
