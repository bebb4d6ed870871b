use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{FlagSeverity, RecommendationTier};
use super::flag::FlagTarget;

/// One ranked attention item produced by the correlator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub tier: RecommendationTier,
    pub target: FlagTarget,
    /// Highest severity among supporting flags; None for exploratory
    /// optimization entries, which have no flag of their own.
    pub severity: Option<FlagSeverity>,
    pub supporting_flags: Vec<Uuid>,
    pub supporting_symptoms: Vec<String>,
    pub last_flagged_at: Option<NaiveDateTime>,
}

/// The three capped, ranked lists returned to callers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub primary: Vec<Recommendation>,
    pub secondary: Vec<Recommendation>,
    pub optimization: Vec<Recommendation>,
}

impl RecommendationSet {
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty() && self.optimization.is_empty()
    }
}
