use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::enums::{FlagSeverity, Gender, TriggerDirection};

/// Inclusive min/max pair for one range tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    pub min: f64,
    pub max: f64,
}

impl RangeBounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Named, configured age bucket (inclusive bounds). Loaded with the
/// reference data, never hardcoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeBracket {
    pub name: String,
    pub min_age: u32,
    pub max_age: u32,
}

impl AgeBracket {
    pub fn contains(&self, age: u32) -> bool {
        age >= self.min_age && age <= self.max_age
    }
}

/// One configured numeric threshold rule for a biomarker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericTrigger {
    pub direction: TriggerDirection,
    pub threshold: f64,
    pub severity: FlagSeverity,
}

impl NumericTrigger {
    pub fn matches(&self, value: f64) -> bool {
        match self.direction {
            TriggerDirection::Below => value < self.threshold,
            TriggerDirection::Above => value > self.threshold,
        }
    }
}

/// Read-only reference definition of a lab biomarker: tiered base ranges,
/// demographic overrides for the optimal tier, and trigger rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerDefinition {
    pub id: String,
    pub display_name: String,
    pub unit: String,
    pub category: String,
    pub critical: RangeBounds,
    pub normal: RangeBounds,
    pub optimal: RangeBounds,
    /// Age bracket name -> optimal override.
    #[serde(default)]
    pub age_overrides: BTreeMap<String, RangeBounds>,
    /// Gender (as_str form) -> optimal override.
    #[serde(default)]
    pub gender_overrides: BTreeMap<String, RangeBounds>,
    /// Canonical symptom key -> flag severity.
    #[serde(default)]
    pub symptom_triggers: BTreeMap<String, FlagSeverity>,
    #[serde(default)]
    pub numeric_triggers: Vec<NumericTrigger>,
}

impl BiomarkerDefinition {
    /// Base tiers must nest: critical ⊇ normal ⊇ optimal.
    pub fn base_ordering_valid(&self) -> bool {
        self.critical.min <= self.normal.min
            && self.normal.min <= self.optimal.min
            && self.optimal.min <= self.optimal.max
            && self.optimal.max <= self.normal.max
            && self.normal.max <= self.critical.max
    }
}

/// Resolved tiered range for one (biomarker, age, gender). Derived, never
/// persisted; a deterministic pure function of its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedRange {
    pub biomarker_id: String,
    pub unit: String,
    pub critical: RangeBounds,
    pub normal: RangeBounds,
    pub optimal: RangeBounds,
    pub applied_age_bracket: Option<String>,
    pub applied_gender: Option<Gender>,
}

impl PersonalizedRange {
    pub fn ordering_valid(&self) -> bool {
        self.critical.min <= self.normal.min
            && self.normal.min <= self.optimal.min
            && self.optimal.min <= self.optimal.max
            && self.optimal.max <= self.normal.max
            && self.normal.max <= self.critical.max
    }
}

/// Outcome of a range resolution. An unknown biomarker id is an expected
/// steady state, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RangeResolution {
    Resolved(PersonalizedRange),
    UnknownBiomarker(String),
}

impl RangeResolution {
    pub fn resolved(&self) -> Option<&PersonalizedRange> {
        match self {
            Self::Resolved(range) => Some(range),
            Self::UnknownBiomarker(_) => None,
        }
    }
}
