//! Matching and scoring engine.
//!
//! Each applicable disease is scored by weighted symptom overlap:
//!
//! ```text
//! raw   = Σ weight(matched) / Σ weight(signature)
//! score = round(100 × min(1, raw × bonus))   bonus only if a pathognomonic symptom matched
//! ```
//!
//! Scores below the relevance threshold are dropped, the rest are ranked by
//! score, then severity, then declaration order.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::ScoringConfig;
use crate::knowledge::KnowledgeBase;
use crate::models::{BirdType, Disease, MatchResult, SeverityTier};

/// Disease scorer.
pub struct Scorer<'a> {
    kb: &'a KnowledgeBase,
    config: &'a ScoringConfig,
}

impl<'a> Scorer<'a> {
    pub fn new(kb: &'a KnowledgeBase, config: &'a ScoringConfig) -> Self {
        Self { kb, config }
    }

    /// Score one disease against a set of canonical symptom identifiers.
    pub fn score_disease(
        &self,
        disease: &Disease,
        symptoms: &BTreeSet<String>,
        age_days: u32,
    ) -> MatchResult {
        let mut matched_weight = 0.0;
        let mut pathognomonic = false;
        let mut matched = Vec::new();
        let mut missing = Vec::new();

        for entry in &disease.symptoms {
            if symptoms.contains(&entry.symptom) {
                matched_weight += entry.weight;
                pathognomonic |= entry.weight >= self.config.pathognomonic_weight;
                matched.push(entry.symptom.clone());
            } else {
                missing.push(entry.symptom.clone());
            }
        }

        let total = disease.total_weight();
        let raw_score = if total > 0.0 {
            (matched_weight / total).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let bonus_applied = pathognomonic && self.config.specificity_bonus > 1.0;
        let boosted = if bonus_applied {
            (raw_score * self.config.specificity_bonus).min(1.0)
        } else {
            raw_score
        };

        MatchResult {
            disease_id: disease.id.clone(),
            match_score: (boosted * 100.0).round() as u8,
            raw_score,
            bonus_applied,
            matched_symptoms: matched,
            missing_symptoms: missing,
            severity: disease.severity,
            age_consistent: disease.age_consistent(age_days),
        }
    }

    /// Rank every applicable disease, keeping at most `max_results`.
    pub fn rank(
        &self,
        symptoms: &BTreeSet<String>,
        bird_type: BirdType,
        age_days: u32,
    ) -> Vec<MatchResult> {
        if symptoms.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<(usize, MatchResult)> = self
            .kb
            .diseases()
            .iter()
            .enumerate()
            .filter(|(_, d)| d.applies_to(bird_type))
            .map(|(pos, d)| (pos, self.score_disease(d, symptoms, age_days)))
            .filter(|(_, m)| {
                !m.matched_symptoms.is_empty() && m.match_score >= self.config.relevance_threshold
            })
            .collect();

        ranked.sort_by(|(pos_a, a), (pos_b, b)| {
            b.match_score
                .cmp(&a.match_score)
                .then(b.severity.cmp(&a.severity))
                .then(pos_a.cmp(pos_b))
        });
        ranked.truncate(self.config.max_results);

        debug!(
            symptoms = symptoms.len(),
            candidates = ranked.len(),
            top = ranked.first().map(|(_, m)| m.disease_id.as_str()).unwrap_or("-"),
            "Ranked diseases"
        );

        ranked.into_iter().map(|(_, m)| m).collect()
    }

    /// Highest tier among matches at or above the severity threshold.
    pub fn overall_severity(&self, matches: &[MatchResult]) -> Option<SeverityTier> {
        matches
            .iter()
            .filter(|m| m.match_score >= self.config.severity_threshold)
            .map(|m| m.severity)
            .max()
    }

    /// Vet alert: serious severity, mortality above the alarm rate, or a
    /// confident match on a notifiable disease.
    pub fn should_call_vet(
        &self,
        severity: Option<SeverityTier>,
        mortality_rate: f64,
        matches: &[MatchResult],
    ) -> bool {
        if severity.map_or(false, SeverityTier::needs_vet) {
            return true;
        }
        if mortality_rate > self.config.mortality_alarm_rate {
            return true;
        }
        matches.iter().any(|m| {
            m.match_score >= self.config.severity_threshold
                && self.kb.disease(&m.disease_id).map_or(false, |d| d.notifiable)
        })
    }
}
