use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{FlagSeverity, FlagStatus, FlagType};

/// What a flag points at: a lab biomarker or a canonical symptom key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagTarget {
    Biomarker(String),
    Symptom(String),
}

impl FlagTarget {
    pub fn id(&self) -> &str {
        match self {
            Self::Biomarker(id) | Self::Symptom(id) => id,
        }
    }
}

impl std::fmt::Display for FlagTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Biomarker(id) => write!(f, "biomarker:{id}"),
            Self::Symptom(key) => write!(f, "symptom:{key}"),
        }
    }
}

/// An actionable marker that a biomarker or symptom needs attention.
///
/// Created and updated only by flag evaluation, upserted by
/// (user_id, target, flag_type) among active flags. Resolution is an
/// explicit external action; resolved flags are retained, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target: FlagTarget,
    pub flag_type: FlagType,
    pub severity: FlagSeverity,
    pub reason: String,
    /// Assessment sources whose reports contributed to this flag.
    pub source_assessments: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub status: FlagStatus,
    pub resolved_at: Option<NaiveDateTime>,
}

impl Flag {
    /// Build a fresh active flag candidate for upsert.
    pub fn candidate(
        user_id: Uuid,
        target: FlagTarget,
        flag_type: FlagType,
        severity: FlagSeverity,
        reason: String,
        source_assessments: Vec<String>,
    ) -> Self {
        let now = chrono::Local::now().naive_local();
        Self {
            id: Uuid::new_v4(),
            user_id,
            target,
            flag_type,
            severity,
            reason,
            source_assessments,
            created_at: now,
            updated_at: now,
            status: FlagStatus::Active,
            resolved_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == FlagStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_starts_active() {
        let flag = Flag::candidate(
            Uuid::new_v4(),
            FlagTarget::Biomarker("ferritin".into()),
            FlagType::OutOfRange,
            FlagSeverity::Moderate,
            "Ferritin 10 ng/mL is below the normal range".into(),
            vec![],
        );
        assert!(flag.is_active());
        assert!(flag.resolved_at.is_none());
        assert_eq!(flag.created_at, flag.updated_at);
    }

    #[test]
    fn target_display_and_id() {
        let target = FlagTarget::Symptom("fatigue".into());
        assert_eq!(target.id(), "fatigue");
        assert_eq!(target.to_string(), "symptom:fatigue");
    }
}
