//! Immutable reference data: the biomarker catalog, configured age brackets,
//! and the symptom synonym/category tables. Loaded once from bundled JSON
//! and injected into the engine; never a mutable global.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::enums::{FlagSeverity, TriggerDirection};
use crate::models::{AgeBracket, BiomarkerDefinition, NumericTrigger, RangeBounds};
use crate::types::TriageError;

/// Maps a free-text symptom alias to its canonical key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomSynonym {
    /// Lowercase, whitespace-collapsed alias as it appears after cleaning.
    pub alias: String,
    pub canonical: String,
}

/// Static classification entry. The first entry registered for a key wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomCategoryEntry {
    pub key: String,
    pub category: String,
}

#[derive(Deserialize)]
struct BiomarkerFile {
    age_brackets: Vec<AgeBracket>,
    biomarkers: Vec<BiomarkerDefinition>,
}

#[derive(Deserialize)]
struct SymptomFile {
    synonyms: Vec<SymptomSynonym>,
    categories: Vec<SymptomCategoryEntry>,
}

/// Loaded reference bundle for aggregation, range resolution, and flagging.
pub struct ReferenceData {
    pub age_brackets: Vec<AgeBracket>,
    pub biomarkers: Vec<BiomarkerDefinition>,
    pub synonyms: Vec<SymptomSynonym>,
    pub categories: Vec<SymptomCategoryEntry>,
}

impl ReferenceData {
    /// Load reference data from bundled JSON files.
    pub fn load(resources_dir: &Path) -> Result<Self, TriageError> {
        let biomarkers_path = resources_dir.join("biomarkers.json");
        let symptoms_path = resources_dir.join("symptom_reference.json");

        let biomarkers_json = std::fs::read_to_string(&biomarkers_path).map_err(|e| {
            TriageError::ReferenceLoad(biomarkers_path.display().to_string(), e.to_string())
        })?;
        let biomarker_file: BiomarkerFile =
            serde_json::from_str(&biomarkers_json).map_err(|e| {
                TriageError::ReferenceParse("biomarkers.json".into(), e.to_string())
            })?;

        let symptoms_json = std::fs::read_to_string(&symptoms_path).map_err(|e| {
            TriageError::ReferenceLoad(symptoms_path.display().to_string(), e.to_string())
        })?;
        let symptom_file: SymptomFile = serde_json::from_str(&symptoms_json).map_err(|e| {
            TriageError::ReferenceParse("symptom_reference.json".into(), e.to_string())
        })?;

        Ok(Self::from_parts(
            biomarker_file.age_brackets,
            biomarker_file.biomarkers,
            symptom_file.synonyms,
            symptom_file.categories,
        ))
    }

    /// Definitions whose base tiers do not nest are never served.
    fn from_parts(
        age_brackets: Vec<AgeBracket>,
        biomarkers: Vec<BiomarkerDefinition>,
        synonyms: Vec<SymptomSynonym>,
        categories: Vec<SymptomCategoryEntry>,
    ) -> Self {
        let biomarkers = biomarkers
            .into_iter()
            .filter(|def| {
                let valid = def.base_ordering_valid();
                if !valid {
                    tracing::warn!(
                        biomarker_id = %def.id,
                        "Base range tiers do not nest, skipping definition"
                    );
                }
                valid
            })
            .collect();

        Self {
            age_brackets,
            biomarkers,
            synonyms,
            categories,
        }
    }

    /// Look up a biomarker definition by id.
    pub fn get_definition(&self, biomarker_id: &str) -> Option<&BiomarkerDefinition> {
        self.biomarkers.iter().find(|b| b.id == biomarker_id)
    }

    pub fn definitions(&self) -> &[BiomarkerDefinition] {
        &self.biomarkers
    }

    /// First configured bracket containing the age.
    pub fn bracket_for_age(&self, age: u32) -> Option<&AgeBracket> {
        self.age_brackets.iter().find(|b| b.contains(age))
    }

    /// Canonical key for a cleaned (lowercase, space-separated) alias.
    pub fn resolve_synonym(&self, cleaned: &str) -> Option<&str> {
        self.synonyms
            .iter()
            .find(|s| s.alias == cleaned)
            .map(|s| s.canonical.as_str())
    }

    /// Category for a canonical symptom key; first registration wins.
    pub fn canonical_category(&self, key: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.category.as_str())
    }

    /// Create reference data for tests (no file I/O).
    pub fn load_test() -> Self {
        let age_brackets = vec![
            AgeBracket { name: "child".into(), min_age: 0, max_age: 12 },
            AgeBracket { name: "adolescent".into(), min_age: 13, max_age: 17 },
            AgeBracket { name: "adult".into(), min_age: 18, max_age: 64 },
            AgeBracket { name: "senior".into(), min_age: 65, max_age: 120 },
        ];

        let biomarkers = vec![
            BiomarkerDefinition {
                id: "hemoglobin".into(),
                display_name: "Hemoglobin".into(),
                unit: "g/dL".into(),
                category: "blood".into(),
                critical: RangeBounds { min: 8.0, max: 22.0 },
                normal: RangeBounds { min: 12.0, max: 18.0 },
                optimal: RangeBounds { min: 13.5, max: 17.5 },
                age_overrides: BTreeMap::from([
                    // child min deliberately sits below normal.min to exercise
                    // the per-side fallback
                    ("child".into(), RangeBounds { min: 10.0, max: 16.0 }),
                    ("adult".into(), RangeBounds { min: 13.0, max: 17.0 }),
                    ("senior".into(), RangeBounds { min: 12.5, max: 17.0 }),
                ]),
                gender_overrides: BTreeMap::from([
                    ("male".into(), RangeBounds { min: 14.0, max: 17.5 }),
                    ("female".into(), RangeBounds { min: 12.5, max: 16.0 }),
                ]),
                symptom_triggers: BTreeMap::from([
                    ("fatigue".into(), FlagSeverity::Moderate),
                    ("dizziness".into(), FlagSeverity::Moderate),
                ]),
                numeric_triggers: vec![],
            },
            BiomarkerDefinition {
                id: "ferritin".into(),
                display_name: "Ferritin".into(),
                unit: "ng/mL".into(),
                category: "blood".into(),
                critical: RangeBounds { min: 5.0, max: 1000.0 },
                normal: RangeBounds { min: 12.0, max: 300.0 },
                optimal: RangeBounds { min: 30.0, max: 150.0 },
                age_overrides: BTreeMap::new(),
                gender_overrides: BTreeMap::new(),
                symptom_triggers: BTreeMap::from([
                    ("fatigue".into(), FlagSeverity::Moderate),
                    ("hair_loss".into(), FlagSeverity::Moderate),
                ]),
                numeric_triggers: vec![
                    NumericTrigger {
                        direction: TriggerDirection::Below,
                        threshold: 12.0,
                        severity: FlagSeverity::Moderate,
                    },
                    NumericTrigger {
                        direction: TriggerDirection::Below,
                        threshold: 8.0,
                        severity: FlagSeverity::High,
                    },
                ],
            },
            BiomarkerDefinition {
                id: "testosterone".into(),
                display_name: "Testosterone".into(),
                unit: "ng/dL".into(),
                category: "hormone".into(),
                critical: RangeBounds { min: 100.0, max: 1500.0 },
                normal: RangeBounds { min: 300.0, max: 1000.0 },
                optimal: RangeBounds { min: 450.0, max: 900.0 },
                age_overrides: BTreeMap::from([
                    ("senior".into(), RangeBounds { min: 400.0, max: 850.0 }),
                ]),
                gender_overrides: BTreeMap::new(),
                symptom_triggers: BTreeMap::from([
                    ("low_libido".into(), FlagSeverity::High),
                    ("fatigue".into(), FlagSeverity::Moderate),
                ]),
                numeric_triggers: vec![],
            },
            BiomarkerDefinition {
                id: "tsh".into(),
                display_name: "TSH".into(),
                unit: "mIU/L".into(),
                category: "hormone".into(),
                critical: RangeBounds { min: 0.01, max: 10.0 },
                normal: RangeBounds { min: 0.4, max: 4.5 },
                optimal: RangeBounds { min: 1.0, max: 2.5 },
                age_overrides: BTreeMap::new(),
                gender_overrides: BTreeMap::new(),
                symptom_triggers: BTreeMap::from([
                    ("weight_gain".into(), FlagSeverity::Moderate),
                    ("fatigue".into(), FlagSeverity::Moderate),
                ]),
                numeric_triggers: vec![NumericTrigger {
                    direction: TriggerDirection::Above,
                    threshold: 10.0,
                    severity: FlagSeverity::High,
                }],
            },
            BiomarkerDefinition {
                id: "vitamin_d".into(),
                display_name: "Vitamin D".into(),
                unit: "ng/mL".into(),
                category: "vitamin".into(),
                critical: RangeBounds { min: 5.0, max: 150.0 },
                normal: RangeBounds { min: 20.0, max: 100.0 },
                optimal: RangeBounds { min: 40.0, max: 80.0 },
                age_overrides: BTreeMap::new(),
                gender_overrides: BTreeMap::new(),
                symptom_triggers: BTreeMap::from([
                    ("depression".into(), FlagSeverity::Moderate),
                ]),
                // moderate listed first; evaluation must still pick high
                // for values below both thresholds
                numeric_triggers: vec![
                    NumericTrigger {
                        direction: TriggerDirection::Below,
                        threshold: 20.0,
                        severity: FlagSeverity::Moderate,
                    },
                    NumericTrigger {
                        direction: TriggerDirection::Below,
                        threshold: 12.0,
                        severity: FlagSeverity::High,
                    },
                ],
            },
        ];

        let synonyms = vec![
            SymptomSynonym { alias: "tiredness".into(), canonical: "fatigue".into() },
            SymptomSynonym { alias: "exhaustion".into(), canonical: "fatigue".into() },
            SymptomSynonym { alias: "low energy".into(), canonical: "fatigue".into() },
            SymptomSynonym { alias: "sleeplessness".into(), canonical: "insomnia".into() },
            SymptomSynonym { alias: "trouble sleeping".into(), canonical: "insomnia".into() },
            SymptomSynonym { alias: "thinning hair".into(), canonical: "hair_loss".into() },
            SymptomSynonym { alias: "low sex drive".into(), canonical: "low_libido".into() },
        ];

        let categories = vec![
            SymptomCategoryEntry { key: "fatigue".into(), category: "energy".into() },
            SymptomCategoryEntry { key: "brain_fog".into(), category: "cognitive".into() },
            SymptomCategoryEntry { key: "insomnia".into(), category: "sleep".into() },
            SymptomCategoryEntry { key: "hair_loss".into(), category: "physical".into() },
            SymptomCategoryEntry { key: "low_libido".into(), category: "hormonal".into() },
            SymptomCategoryEntry { key: "weight_gain".into(), category: "metabolic".into() },
            SymptomCategoryEntry { key: "depression".into(), category: "mood".into() },
            SymptomCategoryEntry { key: "anxiety".into(), category: "mood".into() },
            SymptomCategoryEntry { key: "dizziness".into(), category: "neurological".into() },
            SymptomCategoryEntry { key: "headache".into(), category: "neurological".into() },
        ];

        Self::from_parts(age_brackets, biomarkers, synonyms, categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn lookup_definition() {
        let reference = ReferenceData::load_test();
        assert!(reference.get_definition("hemoglobin").is_some());
        assert!(reference.get_definition("unknown_marker").is_none());
    }

    #[test]
    fn bracket_for_age_boundaries() {
        let reference = ReferenceData::load_test();
        assert_eq!(reference.bracket_for_age(0).unwrap().name, "child");
        assert_eq!(reference.bracket_for_age(17).unwrap().name, "adolescent");
        assert_eq!(reference.bracket_for_age(18).unwrap().name, "adult");
        assert_eq!(reference.bracket_for_age(120).unwrap().name, "senior");
        assert!(reference.bracket_for_age(121).is_none());
    }

    #[test]
    fn synonym_and_category_lookup() {
        let reference = ReferenceData::load_test();
        assert_eq!(reference.resolve_synonym("low energy"), Some("fatigue"));
        assert_eq!(reference.resolve_synonym("fatigue"), None);
        assert_eq!(reference.canonical_category("insomnia"), Some("sleep"));
        assert_eq!(reference.canonical_category("mystery"), None);
    }

    #[test]
    fn first_registered_category_wins() {
        let mut reference = ReferenceData::load_test();
        reference.categories.push(SymptomCategoryEntry {
            key: "fatigue".into(),
            category: "sleep".into(),
        });
        assert_eq!(reference.canonical_category("fatigue"), Some("energy"));
    }

    #[test]
    fn invalid_base_ordering_skipped_at_load() {
        let reference = ReferenceData::from_parts(
            vec![],
            vec![BiomarkerDefinition {
                id: "broken".into(),
                display_name: "Broken".into(),
                unit: "u".into(),
                category: "misc".into(),
                critical: RangeBounds { min: 0.0, max: 10.0 },
                normal: RangeBounds { min: 2.0, max: 8.0 },
                // optimal wider than normal
                optimal: RangeBounds { min: 1.0, max: 9.0 },
                age_overrides: BTreeMap::new(),
                gender_overrides: BTreeMap::new(),
                symptom_triggers: BTreeMap::new(),
                numeric_triggers: vec![],
            }],
            vec![],
            vec![],
        );
        assert!(reference.get_definition("broken").is_none());
    }

    #[test]
    fn load_from_json_files() {
        let dir = tempfile::tempdir().unwrap();

        let biomarkers = serde_json::json!({
            "age_brackets": [
                { "name": "adult", "min_age": 18, "max_age": 64 }
            ],
            "biomarkers": [{
                "id": "tsh",
                "display_name": "TSH",
                "unit": "mIU/L",
                "category": "hormone",
                "critical": { "min": 0.01, "max": 10.0 },
                "normal": { "min": 0.4, "max": 4.5 },
                "optimal": { "min": 1.0, "max": 2.5 },
                "symptom_triggers": { "fatigue": "moderate" },
                "numeric_triggers": [
                    { "direction": "above", "threshold": 10.0, "severity": "high" }
                ]
            }]
        });
        let symptoms = serde_json::json!({
            "synonyms": [
                { "alias": "tiredness", "canonical": "fatigue" }
            ],
            "categories": [
                { "key": "fatigue", "category": "energy" }
            ]
        });

        let mut f = std::fs::File::create(dir.path().join("biomarkers.json")).unwrap();
        write!(f, "{biomarkers}").unwrap();
        let mut f = std::fs::File::create(dir.path().join("symptom_reference.json")).unwrap();
        write!(f, "{symptoms}").unwrap();

        let reference = ReferenceData::load(dir.path()).unwrap();
        let tsh = reference.get_definition("tsh").unwrap();
        assert_eq!(tsh.symptom_triggers.get("fatigue"), Some(&FlagSeverity::Moderate));
        assert_eq!(tsh.numeric_triggers[0].severity, FlagSeverity::High);
        assert_eq!(reference.resolve_synonym("tiredness"), Some("fatigue"));
    }

    #[test]
    fn load_missing_dir_errors() {
        let result = ReferenceData::load(Path::new("/nonexistent/reference"));
        assert!(matches!(result, Err(TriageError::ReferenceLoad(_, _))));
    }
}
