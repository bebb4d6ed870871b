//! Flagging & triage: turns the symptom profile and externally measured lab
//! values into upserted flags. Two independent trigger families run per
//! evaluation; overlapping rules always collapse to a single severity.

pub mod messages;

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::models::enums::{FlagSeverity, FlagStatus, FlagType};
use crate::models::{
    BiomarkerDefinition, Flag, FlagTarget, PersonalizedRange, SymptomProfile,
};
use crate::ranges::resolve_range;
use crate::reference::ReferenceData;
use crate::storage::{DemographicProvider, FlagStore};
use crate::types::{Demographics, MeasuredValue, TriageError};

use messages::FlagMessages;

pub struct FlagEvaluator {
    reference: Arc<ReferenceData>,
    flags: Arc<dyn FlagStore>,
    demographics: Arc<dyn DemographicProvider>,
}

impl FlagEvaluator {
    pub fn new(
        reference: Arc<ReferenceData>,
        flags: Arc<dyn FlagStore>,
        demographics: Arc<dyn DemographicProvider>,
    ) -> Self {
        Self {
            reference,
            flags,
            demographics,
        }
    }

    /// Run both trigger families, upsert the resulting flags, and return the
    /// user's active flags after the upserts.
    pub fn evaluate(
        &self,
        user_id: Uuid,
        profile: &SymptomProfile,
        measured: &[MeasuredValue],
    ) -> Result<Vec<Flag>, TriageError> {
        let start = Instant::now();

        let demographics = self
            .demographics
            .get_profile(user_id)?
            .unwrap_or_else(Demographics::unknown);

        let mut candidates = symptom_triggered_candidates(profile, &self.reference);
        for value in measured {
            if let Some(flag) =
                value_triggered_candidate(user_id, value, demographics, &self.reference)
            {
                candidates.push(flag);
            }
        }

        let candidate_count = candidates.len();
        for candidate in candidates {
            self.flags.upsert(candidate)?;
        }

        let active = self.flags.get_all(user_id, Some(FlagStatus::Active))?;

        tracing::info!(
            user_id = %user_id,
            candidates = candidate_count,
            active = active.len(),
            processing_ms = start.elapsed().as_millis() as u64,
            "Flag evaluation complete"
        );

        Ok(active)
    }
}

/// One candidate per biomarker with at least one triggering symptom.
/// Severity is the strongest configured trigger among the matched symptoms;
/// attribution unions every contributing source assessment.
pub fn symptom_triggered_candidates(
    profile: &SymptomProfile,
    reference: &ReferenceData,
) -> Vec<Flag> {
    let mut candidates = Vec::new();

    for def in reference.definitions() {
        let matched: Vec<_> = profile
            .symptoms
            .values()
            .filter_map(|symptom| {
                def.symptom_triggers
                    .get(&symptom.key)
                    .map(|severity| (symptom, *severity))
            })
            .collect();

        let Some(severity) = matched.iter().map(|(_, s)| *s).max() else {
            continue;
        };

        let mut sources: Vec<String> = Vec::new();
        let mut names: Vec<String> = Vec::new();
        for (symptom, _) in &matched {
            names.push(symptom.display_name.clone());
            for source in &symptom.sources {
                if !sources.contains(source) {
                    sources.push(source.clone());
                }
            }
        }

        candidates.push(Flag::candidate(
            profile.user_id,
            FlagTarget::Biomarker(def.id.clone()),
            FlagType::SymptomTriggered,
            severity,
            FlagMessages::symptom_triggered(&names, &def.display_name),
            sources,
        ));
    }

    candidates
}

/// Candidate for one measured value, or None when the value sits inside the
/// normal tier or the biomarker is unknown.
pub fn value_triggered_candidate(
    user_id: Uuid,
    measured: &MeasuredValue,
    demographics: Demographics,
    reference: &ReferenceData,
) -> Option<Flag> {
    let Some(def) = reference.get_definition(&measured.biomarker_id) else {
        tracing::warn!(
            biomarker_id = %measured.biomarker_id,
            "Measured value for unknown biomarker, skipping"
        );
        return None;
    };

    let range = resolve_range(
        reference,
        &def.id,
        demographics.age,
        demographics.gender,
    );
    let range = range.resolved()?.clone();

    let severity = value_severity(def, &range, measured.value)?;
    let flag_type = if severity == FlagSeverity::Critical {
        FlagType::Critical
    } else {
        FlagType::OutOfRange
    };

    Some(Flag::candidate(
        user_id,
        FlagTarget::Biomarker(def.id.clone()),
        flag_type,
        severity,
        FlagMessages::out_of_range(&def.display_name, measured.value, &range, severity),
        vec![],
    ))
}

/// Single severity for a measured value.
///
/// Configured numeric triggers are evaluated most severe first and the first
/// match wins, so overlapping thresholds stay unambiguous. The personalized
/// range supplies the floor: a value outside the critical bounds is Critical
/// even when a weaker trigger also matches, outside normal is Moderate, and
/// inside normal produces nothing unless a trigger says otherwise.
pub fn value_severity(
    def: &BiomarkerDefinition,
    range: &PersonalizedRange,
    value: f64,
) -> Option<FlagSeverity> {
    let mut triggers: Vec<_> = def.numeric_triggers.iter().collect();
    triggers.sort_by(|a, b| b.severity.cmp(&a.severity));
    let trigger_severity = triggers.iter().find(|t| t.matches(value)).map(|t| t.severity);

    let range_severity = if !range.critical.contains(value) {
        Some(FlagSeverity::Critical)
    } else if !range.normal.contains(value) {
        Some(FlagSeverity::Moderate)
    } else {
        None
    };

    match (trigger_severity, range_severity) {
        (Some(t), Some(r)) => Some(t.max(r)),
        (Some(t), None) => Some(t),
        (None, r) => r,
    }
}
