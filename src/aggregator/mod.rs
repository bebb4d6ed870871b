//! Symptom aggregation: folds raw questionnaire reports into one canonical,
//! deduplicated per-user profile with append-only history.
//!
//! The fold is a pure function of the complete raw report set, so refreshing
//! one assessment source re-derives that source's contribution from raw data
//! while every other source's folded state reproduces identically.

pub mod analytics;
pub mod normalize;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::models::enums::{FrequencyLevel, SeverityLevel};
use crate::models::{CanonicalSymptom, ProfileSnapshot, SymptomProfile, SymptomReport};
use crate::reference::ReferenceData;
use crate::storage::{ProfileStore, RawSymptomSource};
use crate::types::TriageError;

pub use analytics::{compute_analytics, ProfileAnalytics, TrendComparison};

const UNCATEGORIZED: &str = "uncategorized";

pub struct SymptomAggregator {
    reports: Arc<dyn RawSymptomSource>,
    profiles: Arc<dyn ProfileStore>,
    reference: Arc<ReferenceData>,
}

impl SymptomAggregator {
    pub fn new(
        reports: Arc<dyn RawSymptomSource>,
        profiles: Arc<dyn ProfileStore>,
        reference: Arc<ReferenceData>,
    ) -> Self {
        Self {
            reports,
            profiles,
            reference,
        }
    }

    /// Rebuild the user's profile from raw reports and store it if changed.
    /// `source` names the questionnaire whose completion prompted the
    /// refresh; the rebuild itself always spans all sources.
    pub fn aggregate(
        &self,
        user_id: Uuid,
        source: Option<&str>,
    ) -> Result<SymptomProfile, TriageError> {
        let start = Instant::now();

        let raw = self.reports.get_reports(user_id, None)?;
        let previous = self.profiles.get(user_id)?;
        let profile = build_profile(user_id, raw, &self.reference, previous.as_ref());

        if previous.as_ref() != Some(&profile) {
            self.profiles.put(&profile)?;
        }

        tracing::info!(
            user_id = %user_id,
            scope = source.unwrap_or("all"),
            symptoms = profile.symptoms.len(),
            total = profile.total_count,
            processing_ms = start.elapsed().as_millis() as u64,
            "Symptom aggregation complete"
        );

        Ok(profile)
    }
}

/// Fold raw reports into a profile. Deterministic: reports are ordered by
/// (reported_at, source, name) before folding, and all maps are BTreeMaps.
pub fn build_profile(
    user_id: Uuid,
    mut raw: Vec<SymptomReport>,
    reference: &ReferenceData,
    previous: Option<&SymptomProfile>,
) -> SymptomProfile {
    raw.sort_by(|a, b| {
        a.reported_at
            .cmp(&b.reported_at)
            .then_with(|| a.assessment_source.cmp(&b.assessment_source))
            .then_with(|| a.symptom_name.cmp(&b.symptom_name))
    });

    let mut symptoms: BTreeMap<String, CanonicalSymptom> = BTreeMap::new();

    for report in &raw {
        let Some(key) = normalize::canonical_key(&report.symptom_name, reference) else {
            tracing::warn!(
                user_id = %user_id,
                source = %report.assessment_source,
                "Symptom name empty after normalization, dropping report"
            );
            continue;
        };

        let severity = parse_severity(report);
        let frequency = parse_frequency(report);

        match symptoms.get_mut(&key) {
            Some(existing) => {
                if !existing.sources.contains(&report.assessment_source) {
                    existing.sources.push(report.assessment_source.clone());
                }
                if let Some(severity) = severity {
                    existing.severities.push(severity);
                }
                if let Some(frequency) = frequency {
                    existing.frequencies.push(frequency);
                }
                existing.first_reported_at = existing.first_reported_at.min(report.reported_at);
                existing.last_reported_at = existing.last_reported_at.max(report.reported_at);
                existing.occurrence_count += 1;
            }
            None => {
                let category = reference
                    .canonical_category(&key)
                    .unwrap_or(UNCATEGORIZED)
                    .to_string();
                symptoms.insert(
                    key.clone(),
                    CanonicalSymptom {
                        key,
                        display_name: normalize::display_name(&report.symptom_name),
                        category,
                        sources: vec![report.assessment_source.clone()],
                        severities: severity.into_iter().collect(),
                        frequencies: frequency.into_iter().collect(),
                        first_reported_at: report.reported_at,
                        last_reported_at: report.reported_at,
                        occurrence_count: 1,
                    },
                );
            }
        }
    }

    let mut by_source: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut by_category: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut total_count = 0u32;
    for symptom in symptoms.values() {
        for source in &symptom.sources {
            by_source
                .entry(source.clone())
                .or_default()
                .push(symptom.key.clone());
        }
        by_category
            .entry(symptom.category.clone())
            .or_default()
            .push(symptom.key.clone());
        total_count += symptom.occurrence_count;
    }

    let last_updated = symptoms.values().map(|s| s.last_reported_at).max();

    let mut history = previous.map(|p| p.history.clone()).unwrap_or_default();
    if history.last().map(|s| s.total_count) != Some(total_count) {
        history.push(ProfileSnapshot {
            taken_at: chrono::Local::now().naive_local(),
            total_count,
            unique_symptoms: symptoms.len() as u32,
            category_counts: by_category
                .iter()
                .map(|(category, keys)| (category.clone(), keys.len() as u32))
                .collect(),
        });
    }

    SymptomProfile {
        user_id,
        symptoms,
        by_source,
        by_category,
        total_count,
        last_updated,
        history,
    }
}

fn parse_severity(report: &SymptomReport) -> Option<SeverityLevel> {
    let raw = report.severity.as_deref()?;
    let parsed = SeverityLevel::from_raw(raw);
    if parsed.is_none() {
        tracing::warn!(
            source = %report.assessment_source,
            value = raw,
            "Unrecognized severity value, dropping field"
        );
    }
    parsed
}

fn parse_frequency(report: &SymptomReport) -> Option<FrequencyLevel> {
    let raw = report.frequency.as_deref()?;
    let parsed = FrequencyLevel::from_raw(raw);
    if parsed.is_none() {
        tracing::warn!(
            source = %report.assessment_source,
            value = raw,
            "Unrecognized frequency value, dropping field"
        );
    }
    parsed
}
