//! Lookup tables over the symptom vocabulary.

use std::collections::HashMap;

use crate::models::Symptom;

use super::{KnowledgeError, KnowledgeResult};

/// Canonical lookup key: lowercase, `_`/`-` as spaces, whitespace collapsed.
pub fn symptom_key(raw: &str) -> String {
    raw.to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A searchable phrase pointing at a symptom.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    /// Normalized phrase
    pub key: String,
    /// Index into the knowledge base's symptom list
    pub symptom: usize,
    /// Whether the phrase came from the alias table
    pub is_alias: bool,
}

/// Name, identifier and alias indexes for the normalizer.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    exact: HashMap<String, usize>,
    aliases: HashMap<String, usize>,
    terms: Vec<Term>,
}

impl Vocabulary {
    /// Build indexes, rejecting names or aliases that point at two symptoms.
    pub(crate) fn build(symptoms: &[Symptom]) -> KnowledgeResult<Self> {
        let mut vocab = Self::default();

        for (idx, symptom) in symptoms.iter().enumerate() {
            for key in [symptom_key(&symptom.id), symptom_key(&symptom.name)] {
                match vocab.exact.get(&key) {
                    Some(&other) if other != idx => {
                        return Err(KnowledgeError::DuplicateSymptom(symptom.id.clone()));
                    }
                    _ => {
                        vocab.exact.insert(key, idx);
                    }
                }
            }
        }

        for (idx, symptom) in symptoms.iter().enumerate() {
            vocab.terms.push(Term {
                key: symptom_key(&symptom.name),
                symptom: idx,
                is_alias: false,
            });

            for alias in &symptom.aliases {
                let key = symptom_key(alias);
                if key.is_empty() {
                    continue;
                }
                let existing = vocab.exact.get(&key).or_else(|| vocab.aliases.get(&key));
                match existing {
                    Some(&other) if other == idx => continue,
                    Some(&other) => {
                        return Err(KnowledgeError::AmbiguousAlias {
                            alias: alias.clone(),
                            first: symptoms[other].id.clone(),
                            second: symptom.id.clone(),
                        });
                    }
                    None => {}
                }
                vocab.aliases.insert(key.clone(), idx);
                vocab.terms.push(Term {
                    key,
                    symptom: idx,
                    is_alias: true,
                });
            }
        }

        Ok(vocab)
    }

    /// Symptom whose identifier or display name has this key.
    pub fn exact(&self, key: &str) -> Option<usize> {
        self.exact.get(key).copied()
    }

    /// Symptom with this alias key.
    pub fn alias(&self, key: &str) -> Option<usize> {
        self.aliases.get(key).copied()
    }

    /// All names and aliases in vocabulary order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }
}
