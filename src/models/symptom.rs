use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{FrequencyLevel, SeverityLevel};

/// A raw symptom report as delivered by one questionnaire. Ephemeral input;
/// severity/frequency arrive as free text and are parsed during the fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomReport {
    pub assessment_source: String,
    pub symptom_name: String,
    pub severity: Option<String>,
    pub frequency: Option<String>,
    pub reported_at: NaiveDateTime,
}

/// One normalized symptom, merged across all contributing questionnaires.
///
/// Severities and frequencies are appended per report, never deduplicated,
/// so the observation order carries the trend signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSymptom {
    pub key: String,
    pub display_name: String,
    pub category: String,
    /// Contributing assessment sources, in first-contribution order.
    pub sources: Vec<String>,
    pub severities: Vec<SeverityLevel>,
    pub frequencies: Vec<FrequencyLevel>,
    pub first_reported_at: NaiveDateTime,
    pub last_reported_at: NaiveDateTime,
    pub occurrence_count: u32,
}

impl CanonicalSymptom {
    /// Highest observed severity, ignoring the Unknown sentinel.
    pub fn max_severity(&self) -> Option<SeverityLevel> {
        self.severities
            .iter()
            .filter(|s| s.rank().is_some())
            .max_by_key(|s| s.rank())
            .copied()
    }
}

/// Deduplicated per-user symptom model. Mutated only by aggregation;
/// history snapshots are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomProfile {
    pub user_id: Uuid,
    /// Canonical key -> merged symptom. BTreeMap keeps iteration and
    /// serialization deterministic.
    pub symptoms: BTreeMap<String, CanonicalSymptom>,
    /// Assessment source -> sorted canonical keys it contributed to.
    pub by_source: BTreeMap<String, Vec<String>>,
    /// Category -> sorted canonical keys.
    pub by_category: BTreeMap<String, Vec<String>>,
    /// Total raw reports folded across all symptoms.
    pub total_count: u32,
    /// Most recent reported_at across all folded reports.
    pub last_updated: Option<NaiveDateTime>,
    pub history: Vec<ProfileSnapshot>,
}

impl SymptomProfile {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            symptoms: BTreeMap::new(),
            by_source: BTreeMap::new(),
            by_category: BTreeMap::new(),
            total_count: 0,
            last_updated: None,
            history: Vec::new(),
        }
    }

    pub fn latest_snapshot(&self) -> Option<&ProfileSnapshot> {
        self.history.last()
    }
}

/// Immutable point-in-time record of profile size and composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub taken_at: NaiveDateTime,
    pub total_count: u32,
    pub unique_symptoms: u32,
    pub category_counts: BTreeMap<String, u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn max_severity_skips_unknown() {
        let symptom = CanonicalSymptom {
            key: "fatigue".into(),
            display_name: "Fatigue".into(),
            category: "energy".into(),
            sources: vec!["hormone".into()],
            severities: vec![SeverityLevel::Unknown, SeverityLevel::Mild],
            frequencies: vec![],
            first_reported_at: at(1),
            last_reported_at: at(2),
            occurrence_count: 2,
        };
        assert_eq!(symptom.max_severity(), Some(SeverityLevel::Mild));
    }

    #[test]
    fn max_severity_empty_is_none() {
        let symptom = CanonicalSymptom {
            key: "headache".into(),
            display_name: "Headache".into(),
            category: "physical".into(),
            sources: vec![],
            severities: vec![SeverityLevel::Unknown],
            frequencies: vec![],
            first_reported_at: at(1),
            last_reported_at: at(1),
            occurrence_count: 1,
        };
        assert_eq!(symptom.max_severity(), None);
    }

    #[test]
    fn empty_profile_is_neutral() {
        let profile = SymptomProfile::empty(Uuid::new_v4());
        assert_eq!(profile.total_count, 0);
        assert!(profile.symptoms.is_empty());
        assert!(profile.latest_snapshot().is_none());
    }
}
