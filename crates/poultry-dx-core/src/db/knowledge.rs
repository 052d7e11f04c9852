//! Knowledge document import and load.

use std::collections::HashMap;

use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use tracing::info;

use super::{Database, DbError, DbResult};
use crate::knowledge::KnowledgeDocument;
use crate::models::{AgeRange, Disease, Symptom, SymptomWeight};

const META_VERSION: &str = "version";
const META_GUIDANCE: &str = "category_guidance";
const META_FACTS: &str = "facts";
const META_BREEDS: &str = "breeds";

impl Database {
    /// Replace the stored knowledge base with `document`.
    ///
    /// Runs in a single transaction: readers see either the old or the new
    /// knowledge base, never a mix.
    pub fn import_knowledge_base(&mut self, document: &KnowledgeDocument) -> DbResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            r#"
            DELETE FROM disease_symptoms;
            DELETE FROM diseases;
            DELETE FROM symptoms;
            DELETE FROM kb_meta;
            "#,
        )?;

        {
            let mut meta = tx.prepare("INSERT INTO kb_meta (key, value) VALUES (?1, ?2)")?;
            meta.execute(params![META_VERSION, document.version])?;
            meta.execute(params![
                META_GUIDANCE,
                serde_json::to_string(&document.category_guidance)?
            ])?;
            meta.execute(params![META_FACTS, serde_json::to_string(&document.facts)?])?;
            meta.execute(params![META_BREEDS, serde_json::to_string(&document.breeds)?])?;

            let mut insert_symptom = tx.prepare(
                r#"
                INSERT INTO symptoms (id, position, name, category, aliases, applies_to)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            for (position, symptom) in document.symptoms.iter().enumerate() {
                insert_symptom.execute(params![
                    symptom.id,
                    position as i64,
                    symptom.name,
                    symptom.category,
                    serde_json::to_string(&symptom.aliases)?,
                    serde_json::to_string(&symptom.applies_to)?,
                ])?;
            }

            let mut insert_disease = tx.prepare(
                r#"
                INSERT INTO diseases (
                    id, position, name, category, severity, mortality_rate,
                    causes, treatment, prevention, facts, affects,
                    notifiable, deficiencies, age_min_days, age_max_days
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                "#,
            )?;
            let mut insert_weight = tx.prepare(
                r#"
                INSERT INTO disease_symptoms (disease_id, symptom_id, position, weight)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for (position, disease) in document.diseases.iter().enumerate() {
                insert_disease.execute(params![
                    disease.id,
                    position as i64,
                    disease.name,
                    disease.category.as_str(),
                    disease.severity.as_str(),
                    disease.mortality_rate,
                    serde_json::to_string(&disease.causes)?,
                    serde_json::to_string(&disease.treatment)?,
                    serde_json::to_string(&disease.prevention)?,
                    serde_json::to_string(&disease.facts)?,
                    serde_json::to_string(&disease.affects)?,
                    disease.notifiable,
                    serde_json::to_string(&disease.deficiencies)?,
                    disease.age_range_days.map(|r| r.min),
                    disease.age_range_days.map(|r| r.max),
                ])?;
                for (entry_position, entry) in disease.symptoms.iter().enumerate() {
                    insert_weight.execute(params![
                        disease.id,
                        entry.symptom,
                        entry_position as i64,
                        entry.weight,
                    ])?;
                }
            }
        }

        tx.commit()?;
        info!(
            version = %document.version,
            symptoms = document.symptoms.len(),
            diseases = document.diseases.len(),
            "Knowledge base imported"
        );
        Ok(())
    }

    /// Version label of the stored knowledge base, if one was imported.
    pub fn knowledge_version(&self) -> DbResult<Option<String>> {
        self.meta(META_VERSION)
    }

    /// Rebuild the stored knowledge document.
    pub fn load_knowledge_document(&self) -> DbResult<KnowledgeDocument> {
        let version = self
            .knowledge_version()?
            .ok_or_else(|| DbError::NotFound("knowledge base (nothing imported)".into()))?;

        let mut document = KnowledgeDocument::new(&version);
        document.category_guidance = self.meta_json(META_GUIDANCE)?.unwrap_or_default();
        document.facts = self.meta_json(META_FACTS)?.unwrap_or_default();
        document.breeds = self.meta_json(META_BREEDS)?.unwrap_or_default();
        document.symptoms = self.load_symptoms()?;
        document.diseases = self.load_diseases()?;
        Ok(document)
    }

    fn meta(&self, key: &str) -> DbResult<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM kb_meta WHERE key = ?", [key], |row| row.get(0))
            .optional()?)
    }

    fn meta_json<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        self.meta(key)?
            .map(|value| serde_json::from_str(&value))
            .transpose()
            .map_err(DbError::from)
    }

    fn load_symptoms(&self) -> DbResult<Vec<Symptom>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, category, aliases, applies_to
            FROM symptoms
            ORDER BY position
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SymptomRow {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
                aliases: row.get(3)?,
                applies_to: row.get(4)?,
            })
        })?;

        let mut symptoms = Vec::new();
        for row in rows {
            let symptom: Symptom = row?.try_into()?;
            symptoms.push(symptom);
        }
        Ok(symptoms)
    }

    fn load_diseases(&self) -> DbResult<Vec<Disease>> {
        let mut signatures = self.load_signatures()?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, category, severity, mortality_rate,
                   causes, treatment, prevention, facts, affects,
                   notifiable, deficiencies, age_min_days, age_max_days
            FROM diseases
            ORDER BY position
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DiseaseRow {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
                severity: row.get(3)?,
                mortality_rate: row.get(4)?,
                causes: row.get(5)?,
                treatment: row.get(6)?,
                prevention: row.get(7)?,
                facts: row.get(8)?,
                affects: row.get(9)?,
                notifiable: row.get(10)?,
                deficiencies: row.get(11)?,
                age_min_days: row.get(12)?,
                age_max_days: row.get(13)?,
            })
        })?;

        let mut diseases = Vec::new();
        for row in rows {
            let mut disease: Disease = row?.try_into()?;
            disease.symptoms = signatures.remove(&disease.id).unwrap_or_default();
            diseases.push(disease);
        }
        Ok(diseases)
    }

    /// Signature entries per disease, in stored order.
    fn load_signatures(&self) -> DbResult<HashMap<String, Vec<SymptomWeight>>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT disease_id, symptom_id, weight
            FROM disease_symptoms
            ORDER BY disease_id, position
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                SymptomWeight {
                    symptom: row.get(1)?,
                    weight: row.get(2)?,
                },
            ))
        })?;

        let mut signatures: HashMap<String, Vec<SymptomWeight>> = HashMap::new();
        for row in rows {
            let (disease_id, entry) = row?;
            signatures.entry(disease_id).or_default().push(entry);
        }
        Ok(signatures)
    }
}

/// Enum columns are stored as their serde label.
fn parse_label<T: DeserializeOwned>(label: String) -> DbResult<T> {
    Ok(serde_json::from_value(serde_json::Value::String(label))?)
}

/// Intermediate row struct for database mapping.
struct SymptomRow {
    id: String,
    name: String,
    category: String,
    aliases: String,
    applies_to: String,
}

impl TryFrom<SymptomRow> for Symptom {
    type Error = DbError;

    fn try_from(row: SymptomRow) -> Result<Self, Self::Error> {
        Ok(Symptom {
            id: row.id,
            name: row.name,
            category: row.category,
            aliases: serde_json::from_str(&row.aliases)?,
            applies_to: serde_json::from_str(&row.applies_to)?,
        })
    }
}

/// Intermediate row struct for database mapping.
struct DiseaseRow {
    id: String,
    name: String,
    category: String,
    severity: String,
    mortality_rate: String,
    causes: String,
    treatment: String,
    prevention: String,
    facts: String,
    affects: String,
    notifiable: bool,
    deficiencies: String,
    age_min_days: Option<u32>,
    age_max_days: Option<u32>,
}

impl TryFrom<DiseaseRow> for Disease {
    type Error = DbError;

    fn try_from(row: DiseaseRow) -> Result<Self, Self::Error> {
        let age_range_days = match (row.age_min_days, row.age_max_days) {
            (Some(min), Some(max)) => Some(AgeRange { min, max }),
            _ => None,
        };
        Ok(Disease {
            id: row.id,
            name: row.name,
            category: parse_label(row.category)?,
            symptoms: Vec::new(),
            severity: parse_label(row.severity)?,
            mortality_rate: row.mortality_rate,
            causes: serde_json::from_str(&row.causes)?,
            treatment: serde_json::from_str(&row.treatment)?,
            prevention: serde_json::from_str(&row.prevention)?,
            facts: serde_json::from_str(&row.facts)?,
            affects: serde_json::from_str(&row.affects)?,
            notifiable: row.notifiable,
            deficiencies: serde_json::from_str(&row.deficiencies)?,
            age_range_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::{Breed, CategoryGuidance, KnowledgeBase};
    use crate::models::{BirdFilter, BirdType, DiseaseCategory, SeverityTier};

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn sample_document(version: &str) -> KnowledgeDocument {
        let mut doc = KnowledgeDocument::new(version);
        let mut egg = Symptom::new("egg_drop", "Drop in egg production", "reproductive");
        egg.aliases = vec!["fewer eggs".into()];
        egg.applies_to = vec![BirdFilter::Layer];
        doc.symptoms = vec![Symptom::new("coughing", "Coughing", "respiratory"), egg];

        let mut disease = Disease::new(
            "bronchitis",
            "Bronchitis",
            DiseaseCategory::Viral,
            SeverityTier::Moderate,
        )
        .with_symptom("coughing", 0.7)
        .with_symptom("egg_drop", 0.45);
        disease.notifiable = true;
        disease.treatment = vec!["Supportive care".into()];
        disease.age_range_days = Some(AgeRange { min: 7, max: 70 });
        doc.diseases = vec![disease];

        doc.category_guidance.insert(
            DiseaseCategory::Viral,
            CategoryGuidance {
                prevention: vec!["Vaccinate".into()],
                ..CategoryGuidance::default()
            },
        );
        doc.facts = vec!["Chickens have no sweat glands.".into()];
        doc.breeds.insert(
            BirdType::Layer,
            vec![Breed {
                name: "Hy-Line Brown".into(),
                notes: None,
            }],
        );
        doc
    }

    #[test]
    fn test_import_and_load_round_trip() {
        let mut db = setup_db();
        let doc = sample_document("1");

        db.import_knowledge_base(&doc).unwrap();
        let loaded = db.load_knowledge_document().unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_import_replaces_previous() {
        let mut db = setup_db();
        db.import_knowledge_base(&sample_document("1")).unwrap();

        let mut second = sample_document("2");
        second.diseases.clear();
        second.symptoms.truncate(1);
        db.import_knowledge_base(&second).unwrap();

        let loaded = db.load_knowledge_document().unwrap();
        assert_eq!(loaded.version, "2");
        assert!(loaded.diseases.is_empty());
        assert_eq!(loaded.symptoms.len(), 1);
    }

    #[test]
    fn test_failed_import_keeps_previous() {
        let mut db = setup_db();
        db.import_knowledge_base(&sample_document("1")).unwrap();

        // Signature references a symptom that isn't in the document
        let mut broken = sample_document("2");
        broken.symptoms.truncate(1);
        assert!(db.import_knowledge_base(&broken).is_err());

        assert_eq!(db.knowledge_version().unwrap().as_deref(), Some("1"));
        assert_eq!(db.load_knowledge_document().unwrap().symptoms.len(), 2);
    }

    #[test]
    fn test_load_empty_database() {
        let db = setup_db();
        assert_eq!(db.knowledge_version().unwrap(), None);
        assert!(matches!(db.load_knowledge_document(), Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_bundled_fingerprint_survives_round_trip() {
        let mut db = setup_db();
        let bundled = KnowledgeBase::bundled().unwrap();

        db.import_knowledge_base(bundled.document()).unwrap();
        let reloaded = KnowledgeBase::from_database(&db).unwrap();
        assert_eq!(reloaded.fingerprint(), bundled.fingerprint());
    }
}
