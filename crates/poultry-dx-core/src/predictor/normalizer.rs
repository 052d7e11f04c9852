//! Symptom normalizer.
//!
//! Maps free text and picker labels onto canonical symptom identifiers:
//! - Exact display name / identifier (case, `_`, `-` and spacing ignored)
//! - Alias table (knowledge base plus caller-registered aliases)
//! - Whole-word substring containment
//! - Fuzzy similarity for typos
//!
//! Anything still unrecognized is dropped; the scorer never sees it.

use std::collections::{BTreeSet, HashMap};

use strsim::{jaro_winkler, normalized_levenshtein};
use tracing::debug;

use crate::knowledge::{symptom_key, KnowledgeBase, Term};
use crate::models::{BirdType, MatchMethod, SymptomResolution};

/// Shortest phrase allowed to take part in a substring match.
const MIN_SUBSTRING_LEN: usize = 4;

/// Minimum blended similarity for a fuzzy match.
const FUZZY_MATCH_THRESHOLD: f64 = 0.90;

/// Normalizer for raw symptom strings.
pub struct SymptomNormalizer<'a> {
    kb: &'a KnowledgeBase,
    /// Caller-registered aliases: key → symptom index
    extra_aliases: HashMap<String, usize>,
}

impl<'a> SymptomNormalizer<'a> {
    /// Create a normalizer over the knowledge base vocabulary.
    pub fn new(kb: &'a KnowledgeBase) -> Self {
        Self {
            kb,
            extra_aliases: HashMap::new(),
        }
    }

    /// Register an extra alias. Returns false if the symptom is unknown.
    pub fn add_alias(&mut self, alias: &str, symptom_id: &str) -> bool {
        let Some(idx) = self.kb.symptoms().iter().position(|s| s.id == symptom_id) else {
            return false;
        };
        let key = symptom_key(alias);
        if key.is_empty() {
            return false;
        }
        self.extra_aliases.insert(key, idx);
        true
    }

    /// Canonical identifiers for every recognized input, duplicates collapsed.
    pub fn normalize<S: AsRef<str>>(&self, raw: &[S], bird_type: BirdType) -> BTreeSet<String> {
        raw.iter()
            .flat_map(|s| self.resolve_all(s.as_ref(), bird_type))
            .map(|r| r.symptom_id)
            .collect()
    }

    /// First symptom a raw string resolves to, reporting which tier matched.
    pub fn resolve(&self, raw: &str, bird_type: BirdType) -> Option<SymptomResolution> {
        self.resolve_all(raw, bird_type).into_iter().next()
    }

    /// Every symptom named in one raw string, in order of appearance.
    ///
    /// Exact, alias and fuzzy tiers yield at most one symptom. The substring
    /// tier yields one per non-overlapping phrase, so free text such as
    /// "twisted neck and paralysis" resolves to both signs.
    pub fn resolve_all(&self, raw: &str, bird_type: BirdType) -> Vec<SymptomResolution> {
        let key = symptom_key(raw);
        if key.is_empty() {
            return Vec::new();
        }

        let vocab = self.kb.vocabulary();
        let hits: Vec<(usize, MatchMethod)> = if let Some(idx) = vocab.exact(&key) {
            vec![(idx, MatchMethod::Exact)]
        } else if let Some(idx) = vocab
            .alias(&key)
            .or_else(|| self.extra_aliases.get(&key).copied())
        {
            vec![(idx, MatchMethod::Alias)]
        } else {
            let words = tokens(&key);
            let contained = self.contained_phrases(&words, bird_type);
            if !contained.is_empty() {
                contained
                    .into_iter()
                    .map(|idx| (idx, MatchMethod::Substring))
                    .collect()
            } else if let Some(idx) = self.containing_phrase(&words.join(" "), bird_type) {
                vec![(idx, MatchMethod::Substring)]
            } else if let Some((idx, similarity)) = self.fuzzy_match(&key, bird_type) {
                vec![(idx, MatchMethod::Fuzzy { similarity })]
            } else {
                debug!(input = raw, "Unrecognized symptom dropped");
                return Vec::new();
            }
        };

        hits.into_iter()
            .filter_map(|(idx, method)| {
                let symptom = &self.kb.symptoms()[idx];
                if !symptom.applies_to(bird_type) {
                    debug!(
                        input = raw,
                        symptom = %symptom.id,
                        bird_type = %bird_type,
                        "Symptom not applicable to bird type"
                    );
                    return None;
                }
                Some(SymptomResolution {
                    input: raw.to_string(),
                    symptom_id: symptom.id.clone(),
                    method,
                })
            })
            .collect()
    }

    /// Known phrases inside the input, longest first, never sharing a word.
    ///
    /// Returns symptom indexes ordered by where they appear in the input.
    fn contained_phrases(&self, words: &[&str], bird_type: BirdType) -> Vec<usize> {
        let mut candidates: Vec<&Term> = self
            .applicable_terms(bird_type)
            .filter(|t| t.key.len() >= MIN_SUBSTRING_LEN)
            .collect();
        // Stable, so equal lengths keep vocabulary order
        candidates.sort_by(|a, b| b.key.len().cmp(&a.key.len()));

        let mut covered = vec![false; words.len()];
        let mut found: Vec<(usize, usize)> = Vec::new();

        for term in candidates {
            let phrase = tokens(&term.key);
            if phrase.is_empty() || phrase.len() > words.len() {
                continue;
            }
            let start = (0..=words.len() - phrase.len()).find(|&start| {
                let span = start..start + phrase.len();
                words[span.clone()] == phrase[..] && !covered[span].iter().any(|&c| c)
            });
            let Some(start) = start else {
                continue;
            };

            covered[start..start + phrase.len()]
                .iter_mut()
                .for_each(|c| *c = true);
            if !found.iter().any(|&(_, symptom)| symptom == term.symptom) {
                found.push((start, term.symptom));
            }
        }

        found.sort_by_key(|&(start, _)| start);
        found.into_iter().map(|(_, symptom)| symptom).collect()
    }

    /// Shortest known phrase containing the whole input.
    fn containing_phrase(&self, key: &str, bird_type: BirdType) -> Option<usize> {
        if key.len() < MIN_SUBSTRING_LEN {
            return None;
        }
        let mut containing: Option<&Term> = None;
        for term in self.applicable_terms(bird_type) {
            if contains_phrase(&term.key, key)
                && containing.map_or(true, |c| term.key.len() < c.key.len())
            {
                containing = Some(term);
            }
        }
        containing.map(|t| t.symptom)
    }

    /// Best fuzzy match above threshold; earlier vocabulary entries win ties.
    fn fuzzy_match(&self, key: &str, bird_type: BirdType) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for term in self.applicable_terms(bird_type) {
            let similarity = fuzzy_similarity(key, &term.key);
            if similarity >= FUZZY_MATCH_THRESHOLD && best.map_or(true, |(_, b)| similarity > b) {
                best = Some((term.symptom, similarity));
            }
        }
        best
    }

    fn applicable_terms(&self, bird_type: BirdType) -> impl Iterator<Item = &'a Term> + '_ {
        let symptoms = self.kb.symptoms();
        self.kb
            .vocabulary()
            .terms()
            .iter()
            .filter(move |t| symptoms[t.symptom].applies_to(bird_type))
    }
}

/// Words of a normalized key; punctuation separates words.
fn tokens(key: &str) -> Vec<&str> {
    key.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Whole-word containment of `needle` in `haystack` (both normalized keys).
fn contains_phrase(haystack: &str, needle: &str) -> bool {
    format!(" {} ", haystack).contains(&format!(" {} ", needle))
}

/// Blend of Jaro-Winkler (typos, shared prefixes) and normalized Levenshtein.
fn fuzzy_similarity(a: &str, b: &str) -> f64 {
    jaro_winkler(a, b) * 0.6 + normalized_levenshtein(a, b) * 0.4
}
