//! SQLite schema definition.

/// Knowledge base schema. List-valued columns hold JSON arrays.
pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Document metadata (version, category guidance, facts, breeds)
-- ============================================================================

CREATE TABLE IF NOT EXISTS kb_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- ============================================================================
-- Symptoms
-- ============================================================================

CREATE TABLE IF NOT EXISTS symptoms (
    id TEXT PRIMARY KEY,
    position INTEGER NOT NULL,                    -- picker order
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    aliases TEXT NOT NULL DEFAULT '[]',           -- JSON array of strings
    applies_to TEXT NOT NULL DEFAULT '["any"]'    -- JSON array of bird filters
);

CREATE INDEX IF NOT EXISTS idx_symptoms_position ON symptoms(position);

-- ============================================================================
-- Diseases
-- ============================================================================

CREATE TABLE IF NOT EXISTS diseases (
    id TEXT PRIMARY KEY,
    position INTEGER NOT NULL,                    -- declaration order, breaks score ties
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    severity TEXT NOT NULL,
    mortality_rate TEXT NOT NULL,
    causes TEXT NOT NULL DEFAULT '[]',
    treatment TEXT NOT NULL DEFAULT '[]',
    prevention TEXT NOT NULL DEFAULT '[]',
    facts TEXT NOT NULL DEFAULT '[]',
    affects TEXT NOT NULL DEFAULT '["any"]',
    notifiable INTEGER NOT NULL DEFAULT 0,
    deficiencies TEXT NOT NULL DEFAULT '[]',
    age_min_days INTEGER,
    age_max_days INTEGER
);

CREATE INDEX IF NOT EXISTS idx_diseases_position ON diseases(position);

-- Weighted symptom signature
CREATE TABLE IF NOT EXISTS disease_symptoms (
    disease_id TEXT NOT NULL REFERENCES diseases(id) ON DELETE CASCADE,
    symptom_id TEXT NOT NULL REFERENCES symptoms(id),
    position INTEGER NOT NULL,
    weight REAL NOT NULL CHECK (weight > 0 AND weight <= 1),
    PRIMARY KEY (disease_id, symptom_id)
);

CREATE INDEX IF NOT EXISTS idx_disease_symptoms_symptom ON disease_symptoms(symptom_id);
"#;
