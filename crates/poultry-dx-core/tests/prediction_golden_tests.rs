//! Golden tests for the prediction pipeline.
//!
//! These tests run known symptom pictures against the bundled knowledge base.

use poultry_dx_core::models::{DiseaseCategory, PredictionRequest, SeverityTier};
use poultry_dx_core::{KnowledgeBase, Predictor, ScoringConfig};

/// Expected outcome for one symptom picture.
struct GoldenCase {
    id: &'static str,
    bird_type: &'static str,
    symptoms: &'static [&'static str],
    age_days: Option<i64>,
    mortality_rate: Option<f64>,
    expected_top: Option<&'static str>,
    expected_top_score: Option<u8>,
    expected_severity: Option<SeverityTier>,
    expected_call_vet: bool,
    excluded: &'static [&'static str],
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "newcastle-layer-partial",
            bird_type: "layer",
            symptoms: &["greenish diarrhea", "drop in egg production", "respiratory distress"],
            age_days: None,
            mortality_rate: None,
            expected_top: Some("newcastle_disease"),
            expected_top_score: Some(35),
            // Nothing reaches the severity threshold
            expected_severity: None,
            expected_call_vet: false,
            excluded: &[],
        },
        GoldenCase {
            id: "newcastle-specific-pair",
            bird_type: "broiler",
            symptoms: &["twisted neck", "paralysis"],
            age_days: None,
            mortality_rate: None,
            expected_top: Some("newcastle_disease"),
            expected_top_score: Some(38),
            expected_severity: None,
            expected_call_vet: false,
            excluded: &[],
        },
        GoldenCase {
            id: "newcastle-combined-phrase",
            bird_type: "broiler",
            symptoms: &["twisted neck and paralysis"],
            age_days: None,
            mortality_rate: None,
            expected_top: Some("newcastle_disease"),
            expected_top_score: Some(38),
            expected_severity: None,
            expected_call_vet: false,
            excluded: &[],
        },
        GoldenCase {
            id: "newcastle-full-picture",
            bird_type: "layer",
            symptoms: &[
                "Twisted neck",
                "Respiratory distress",
                "Drop in egg production",
                "Greenish diarrhea",
            ],
            age_days: None,
            mortality_rate: None,
            expected_top: Some("newcastle_disease"),
            expected_top_score: Some(65),
            expected_severity: Some(SeverityTier::Critical),
            expected_call_vet: true,
            excluded: &[],
        },
        GoldenCase {
            id: "mortality-only",
            bird_type: "broiler",
            symptoms: &[],
            age_days: None,
            mortality_rate: Some(0.25),
            expected_top: None,
            expected_top_score: None,
            expected_severity: None,
            expected_call_vet: true,
            excluded: &[],
        },
        GoldenCase {
            id: "layer-disease-in-broiler",
            bird_type: "broiler",
            symptoms: &["Unable to stand", "Brittle bones", "Soft-shelled eggs"],
            age_days: None,
            mortality_rate: None,
            expected_top: Some("rickets"),
            expected_top_score: Some(63),
            expected_severity: Some(SeverityTier::Moderate),
            expected_call_vet: false,
            excluded: &["cage_layer_fatigue"],
        },
        GoldenCase {
            id: "cage-layer-fatigue",
            bird_type: "layer",
            symptoms: &["Unable to stand", "Brittle bones", "Soft-shelled eggs"],
            age_days: Some(200),
            mortality_rate: None,
            expected_top: Some("cage_layer_fatigue"),
            expected_top_score: Some(89),
            expected_severity: Some(SeverityTier::Moderate),
            expected_call_vet: false,
            excluded: &["rickets"],
        },
        GoldenCase {
            id: "coccidiosis",
            bird_type: "broiler",
            symptoms: &["Bloody droppings", "Ruffled feathers", "Huddling"],
            age_days: Some(28),
            mortality_rate: None,
            expected_top: Some("coccidiosis"),
            expected_top_score: Some(54),
            expected_severity: Some(SeverityTier::Severe),
            expected_call_vet: true,
            excluded: &[],
        },
        GoldenCase {
            id: "chronic-respiratory",
            bird_type: "layer",
            symptoms: &["Coughing", "Sneezing", "Rales", "Nasal discharge"],
            age_days: None,
            mortality_rate: Some(0.01),
            expected_top: Some("chronic_respiratory_disease"),
            expected_top_score: Some(51),
            expected_severity: Some(SeverityTier::Moderate),
            expected_call_vet: false,
            excluded: &[],
        },
        GoldenCase {
            id: "ascites-broiler",
            bird_type: "broiler",
            symptoms: &["Swollen abdomen", "Blue comb and wattles", "Respiratory distress"],
            age_days: Some(35),
            mortality_rate: None,
            expected_top: Some("ascites"),
            expected_top_score: Some(96),
            expected_severity: Some(SeverityTier::Severe),
            expected_call_vet: true,
            excluded: &[],
        },
        GoldenCase {
            id: "avian-influenza-high-mortality",
            bird_type: "broiler",
            symptoms: &[
                "Sudden death",
                "Swollen face",
                "Blue comb and wattles",
                "Hemorrhages on shanks",
            ],
            age_days: None,
            mortality_rate: Some(0.3),
            expected_top: Some("avian_influenza"),
            expected_top_score: Some(74),
            expected_severity: Some(SeverityTier::Critical),
            expected_call_vet: true,
            excluded: &[],
        },
        GoldenCase {
            id: "pullorum-chicks",
            bird_type: "broiler",
            symptoms: &["White diarrhea", "Huddling"],
            age_days: Some(5),
            mortality_rate: None,
            expected_top: Some("pullorum_disease"),
            expected_top_score: Some(60),
            expected_severity: Some(SeverityTier::Severe),
            expected_call_vet: true,
            excluded: &[],
        },
        GoldenCase {
            id: "fowl-pox-single-lesion",
            bird_type: "broiler",
            symptoms: &["Wart-like scabs on comb"],
            age_days: None,
            mortality_rate: None,
            expected_top: Some("fowl_pox"),
            expected_top_score: Some(56),
            expected_severity: Some(SeverityTier::Moderate),
            expected_call_vet: false,
            excluded: &[],
        },
        GoldenCase {
            id: "egg-symptom-in-broiler",
            bird_type: "broiler",
            symptoms: &["Drop in egg production"],
            age_days: None,
            mortality_rate: None,
            expected_top: None,
            expected_top_score: None,
            expected_severity: None,
            expected_call_vet: false,
            excluded: &[],
        },
    ]
}

#[test]
fn test_golden_cases() {
    let kb = KnowledgeBase::bundled().unwrap();
    let config = ScoringConfig::default();
    let predictor = Predictor::new(&kb, &config);

    for case in get_golden_cases() {
        let request = PredictionRequest {
            age_days: case.age_days,
            mortality_rate: case.mortality_rate,
            ..PredictionRequest::new(case.bird_type, case.symptoms)
        };
        let response = predictor.predict(&request).unwrap();

        assert_eq!(
            response.top().map(|d| d.id.as_str()),
            case.expected_top,
            "Case {}: top disease mismatch",
            case.id
        );
        assert_eq!(
            response.top().map(|d| d.match_score),
            case.expected_top_score,
            "Case {}: top score mismatch",
            case.id
        );
        assert_eq!(
            response.severity, case.expected_severity,
            "Case {}: severity mismatch",
            case.id
        );
        assert_eq!(
            response.call_vet, case.expected_call_vet,
            "Case {}: vet alert mismatch",
            case.id
        );

        for excluded in case.excluded {
            assert!(
                response.diseases.iter().all(|d| d.id != *excluded),
                "Case {}: {} should be excluded",
                case.id,
                excluded
            );
        }

        // Ranking invariants hold for every case
        assert!(
            response.diseases.len() <= config.max_results,
            "Case {}: too many results",
            case.id
        );
        for pair in response.diseases.windows(2) {
            assert!(
                pair[0].match_score >= pair[1].match_score,
                "Case {}: results not sorted",
                case.id
            );
        }
        for disease in &response.diseases {
            assert!(
                disease.match_score >= config.relevance_threshold,
                "Case {}: {} below relevance threshold",
                case.id,
                disease.id
            );
        }
    }
}

#[test]
fn test_specificity_bonus_ranks_newcastle_first() {
    let kb = KnowledgeBase::bundled().unwrap();
    let config = ScoringConfig::default();
    let predictor = Predictor::new(&kb, &config);

    let response = predictor
        .predict(&PredictionRequest::new("broiler", &["twisted neck", "paralysis"]))
        .unwrap();
    let ids: Vec<&str> = response.diseases.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["newcastle_disease", "vitamin_e_deficiency", "mareks_disease"]);
    assert_eq!(response.diseases[1].match_score, 24);

    // 1.6 of 5.2 signature weight, boosted by the pathognomonic twisted neck
    let newcastle = &response.diseases[0];
    assert!(newcastle.bonus_applied);
    assert!((newcastle.raw_score - 1.6 / 5.2).abs() < 1e-9);
    assert!(!response.diseases[1].bonus_applied);
}

#[test]
fn test_free_text_symptoms() {
    let kb = KnowledgeBase::bundled().unwrap();
    let config = ScoringConfig::default();
    let predictor = Predictor::new(&kb, &config);

    let canonical = predictor
        .predict(&PredictionRequest::new("broiler", &["Twisted neck", "Paralysis"]))
        .unwrap();
    let free_text = predictor
        .predict(&PredictionRequest::new(
            "broiler",
            &["birds show twisted neck", "PARALYSIS", "torticollis"],
        ))
        .unwrap();
    assert_eq!(canonical.diseases, free_text.diseases);

    let ids = predictor
        .normalize_symptoms(&["coughng", "blood in droppings", "star-gazing"], "layer")
        .unwrap();
    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    assert_eq!(ids, vec!["bloody_droppings", "coughing", "twisted_neck"]);

    // One string naming several signs keeps all of them
    let ids = predictor
        .normalize_symptoms(&["coughing, sneezing", "twisted neck and paralysis"], "layer")
        .unwrap();
    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    assert_eq!(ids, vec!["coughing", "paralysis", "sneezing", "twisted_neck"]);
}

#[test]
fn test_treatment_falls_back_to_category() {
    let kb = KnowledgeBase::bundled().unwrap();
    let config = ScoringConfig::default();
    let predictor = Predictor::new(&kb, &config);

    let request = PredictionRequest {
        age_days: Some(120),
        ..PredictionRequest::new("layer", &["Skin tumors", "Grey eye", "Leg paralysis"])
    };
    let response = predictor.predict(&request).unwrap();

    let top = response.top().unwrap();
    assert_eq!(top.id, "mareks_disease");
    assert!(top.notifiable);
    assert_eq!(top.age_consistent, Some(true));
    assert!(kb.disease("mareks_disease").unwrap().treatment.is_empty());

    let viral = kb.guidance(DiseaseCategory::Viral).unwrap();
    assert!(!response.treatment.is_empty());
    assert_eq!(response.treatment, viral.treatment);
    assert!(response.call_vet);
}

#[test]
fn test_nutritional_deficiencies_reported() {
    let kb = KnowledgeBase::bundled().unwrap();
    let config = ScoringConfig::default();
    let predictor = Predictor::new(&kb, &config);

    let response = predictor
        .predict(&PredictionRequest::new("layer", &["Unable to stand", "Brittle bones"]))
        .unwrap();
    assert_eq!(response.top().unwrap().id, "cage_layer_fatigue");
    assert_eq!(
        response.deficiencies,
        Some(vec!["Calcium".to_string(), "Phosphorus".to_string(), "Vitamin D3".to_string()])
    );

    let response = predictor
        .predict(&PredictionRequest::new("broiler", &["Bloody droppings"]))
        .unwrap();
    assert_eq!(response.deficiencies, None);
}

#[test]
fn test_merged_sections_are_bounded_and_unique() {
    let kb = KnowledgeBase::bundled().unwrap();
    let config = ScoringConfig::default();
    let predictor = Predictor::new(&kb, &config);

    let response = predictor
        .predict(&PredictionRequest::new(
            "broiler",
            &["Sudden death", "Swollen face", "Blue comb and wattles", "Hemorrhages on shanks"],
        ))
        .unwrap();

    for section in [&response.prevention, &response.facts] {
        assert!(!section.is_empty());
        assert!(section.len() <= config.max_merged_items);
        let unique: std::collections::HashSet<&String> = section.iter().collect();
        assert_eq!(unique.len(), section.len());
    }
    assert_eq!(response.treatment, kb.disease("avian_influenza").unwrap().treatment);
}

#[test]
fn test_empty_request_returns_general_facts() {
    let kb = KnowledgeBase::bundled().unwrap();
    let config = ScoringConfig::default();
    let predictor = Predictor::new(&kb, &config);

    let response = predictor.predict(&PredictionRequest::new("breeder", &[])).unwrap();
    assert!(response.diseases.is_empty());
    assert!(response.treatment.is_empty());
    assert!(response.prevention.is_empty());
    assert_eq!(response.facts, kb.facts()[..3].to_vec());
    assert!(response.low_confidence);
    assert!(response.low_confidence_message.is_some());
    assert_eq!(response.confidence, 0.0);
}

#[test]
fn test_confidence_levels() {
    let kb = KnowledgeBase::bundled().unwrap();
    let config = ScoringConfig::default();
    let predictor = Predictor::new(&kb, &config);

    let strong = predictor
        .predict(&PredictionRequest::new("breeder", &["Incoordination", "Tremors", "Lethargy"]))
        .unwrap();
    assert_eq!(strong.top().unwrap().id, "vitamin_e_deficiency");
    assert_eq!(strong.confidence, 0.84);
    assert!(!strong.low_confidence);

    // A single generic symptom gives little evidence
    let weak = predictor.predict(&PredictionRequest::new("layer", &["Lethargy"])).unwrap();
    assert_eq!(weak.top().unwrap().id, "vitamin_e_deficiency");
    assert_eq!(weak.confidence, 0.22);
    assert!(weak.low_confidence);
    assert!(weak.low_confidence_message.is_some());
}

#[test]
fn test_json_response_shape() {
    let kb = KnowledgeBase::bundled().unwrap();
    let config = ScoringConfig::default();
    let predictor = Predictor::new(&kb, &config);

    let request = r#"{"bird_type": "broiler", "age_days": 28, "symptoms": ["Bloody droppings", "Huddling"]}"#;
    let json = predictor.predict_json(request).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    for key in [
        "diseases",
        "severity",
        "treatment",
        "prevention",
        "facts",
        "deficiencies",
        "when_to_call_vet",
        "confidence",
        "low_confidence",
        "low_confidence_message",
        "knowledge_base",
    ] {
        assert!(value.get(key).is_some(), "missing key {}", key);
    }

    let top = &value["diseases"][0];
    for key in [
        "id",
        "name",
        "category",
        "match_score",
        "raw_score",
        "bonus_applied",
        "matched_symptoms",
        "missing_symptoms",
        "severity",
        "mortality_rate",
        "causes",
    ] {
        assert!(top.get(key).is_some(), "missing disease key {}", key);
    }
    assert_eq!(top["id"], "coccidiosis");
    assert_eq!(top["category"], "parasitic");
    assert_eq!(value["knowledge_base"], kb.fingerprint());
}

#[test]
fn test_predictions_are_deterministic() {
    let kb = KnowledgeBase::bundled().unwrap();
    let config = ScoringConfig::default();
    let predictor = Predictor::new(&kb, &config);

    let request =
        PredictionRequest::new("layer", &["Coughing", "Sneezing", "Rales", "Watery eyes"]);
    let first = predictor.predict(&request).unwrap();
    for _ in 0..5 {
        assert_eq!(predictor.predict(&request).unwrap(), first);
    }

    // Input order and duplicates don't matter
    let shuffled = PredictionRequest::new(
        "layer",
        &["Watery eyes", "rales", "Coughing", "Sneezing", "coughing"],
    );
    assert_eq!(predictor.predict(&shuffled).unwrap().diseases, first.diseases);
}
