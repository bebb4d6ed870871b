//! Recommendation correlation: folds active flags and the symptom profile
//! into three capped, deterministically ordered attention lists.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::enums::{FlagSeverity, RecommendationTier};
use crate::models::{Flag, FlagTarget, Recommendation, RecommendationSet, SymptomProfile};
use crate::reference::ReferenceData;

#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    pub max_per_tier: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self { max_per_tier: 5 }
    }
}

pub struct RecommendationCorrelator;

impl RecommendationCorrelator {
    /// Build the tiered lists. Primary holds targets with at least one
    /// high/critical flag, secondary targets with only moderate flags, and
    /// optimization unflagged targets sharing a category with a flagged one.
    pub fn correlate(
        flags: &[Flag],
        profile: &SymptomProfile,
        reference: &ReferenceData,
        config: &RecommendationConfig,
    ) -> RecommendationSet {
        let mut by_target: BTreeMap<&FlagTarget, Vec<&Flag>> = BTreeMap::new();
        for flag in flags.iter().filter(|f| f.is_active()) {
            by_target.entry(&flag.target).or_default().push(flag);
        }

        let mut primary = Vec::new();
        let mut secondary = Vec::new();
        let mut flagged_categories: BTreeSet<String> = BTreeSet::new();

        for (target, target_flags) in &by_target {
            let severity = target_flags
                .iter()
                .map(|f| f.severity)
                .max()
                .unwrap_or(FlagSeverity::Moderate);
            let last_flagged_at = target_flags.iter().map(|f| f.updated_at).max();

            if let Some(category) = target_category(target, profile, reference) {
                flagged_categories.insert(category.to_string());
            }

            let recommendation = Recommendation {
                tier: if severity >= FlagSeverity::High {
                    RecommendationTier::Primary
                } else {
                    RecommendationTier::Secondary
                },
                target: (*target).clone(),
                severity: Some(severity),
                supporting_flags: target_flags.iter().map(|f| f.id).collect(),
                supporting_symptoms: supporting_symptoms(target, profile, reference),
                last_flagged_at,
            };

            if severity >= FlagSeverity::High {
                primary.push(recommendation);
            } else {
                secondary.push(recommendation);
            }
        }

        let optimization = optimization_candidates(
            &by_target,
            &flagged_categories,
            profile,
            reference,
        );

        RecommendationSet {
            primary: ranked(primary, config.max_per_tier),
            secondary: ranked(secondary, config.max_per_tier),
            optimization: ranked(optimization, config.max_per_tier),
        }
    }
}

fn target_category<'a>(
    target: &FlagTarget,
    profile: &'a SymptomProfile,
    reference: &'a ReferenceData,
) -> Option<&'a str> {
    match target {
        FlagTarget::Biomarker(id) => {
            reference.get_definition(id).map(|d| d.category.as_str())
        }
        FlagTarget::Symptom(key) => profile
            .symptoms
            .get(key)
            .map(|s| s.category.as_str())
            .or_else(|| reference.canonical_category(key)),
    }
}

/// Profile symptoms that point at this target via configured triggers.
fn supporting_symptoms(
    target: &FlagTarget,
    profile: &SymptomProfile,
    reference: &ReferenceData,
) -> Vec<String> {
    match target {
        FlagTarget::Biomarker(id) => {
            let Some(def) = reference.get_definition(id) else {
                return Vec::new();
            };
            profile
                .symptoms
                .keys()
                .filter(|key| def.symptom_triggers.contains_key(*key))
                .cloned()
                .collect()
        }
        FlagTarget::Symptom(key) => vec![key.clone()],
    }
}

/// Unflagged biomarkers and symptoms sharing a category with a flagged
/// target. Exploratory: these carry no severity of their own.
fn optimization_candidates(
    flagged: &BTreeMap<&FlagTarget, Vec<&Flag>>,
    flagged_categories: &BTreeSet<String>,
    profile: &SymptomProfile,
    reference: &ReferenceData,
) -> Vec<Recommendation> {
    let mut candidates = Vec::new();

    for def in reference.definitions() {
        let target = FlagTarget::Biomarker(def.id.clone());
        if flagged.contains_key(&target) || !flagged_categories.contains(&def.category) {
            continue;
        }
        candidates.push(exploratory(target));
    }

    for symptom in profile.symptoms.values() {
        let target = FlagTarget::Symptom(symptom.key.clone());
        if flagged.contains_key(&target) || !flagged_categories.contains(&symptom.category) {
            continue;
        }
        candidates.push(exploratory(target));
    }

    candidates
}

fn exploratory(target: FlagTarget) -> Recommendation {
    Recommendation {
        tier: RecommendationTier::Optimization,
        target,
        severity: None,
        supporting_flags: Vec::new(),
        supporting_symptoms: Vec::new(),
        last_flagged_at: None,
    }
}

/// Severity desc, most recent contributing flag desc, target id asc.
fn ranked(mut list: Vec<Recommendation>, cap: usize) -> Vec<Recommendation> {
    list.sort_by(rank);
    list.truncate(cap);
    list
}

fn rank(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.severity
        .cmp(&a.severity)
        .then_with(|| b.last_flagged_at.cmp(&a.last_flagged_at))
        .then_with(|| a.target.id().cmp(b.target.id()))
        .then_with(|| a.target.cmp(&b.target))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};
    use uuid::Uuid;

    use super::*;
    use crate::aggregator::build_profile;
    use crate::models::enums::{FlagStatus, FlagType};
    use crate::models::SymptomReport;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 7, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn flag(user: Uuid, target: FlagTarget, severity: FlagSeverity, day: u32) -> Flag {
        let mut flag = Flag::candidate(
            user,
            target,
            FlagType::OutOfRange,
            severity,
            "test".into(),
            vec![],
        );
        flag.updated_at = at(day);
        flag
    }

    fn fatigue_profile(user: Uuid) -> SymptomProfile {
        build_profile(
            user,
            vec![SymptomReport {
                assessment_source: "hormone".into(),
                symptom_name: "Fatigue".into(),
                severity: None,
                frequency: None,
                reported_at: at(1),
            }],
            &ReferenceData::load_test(),
            None,
        )
    }

    #[test]
    fn splits_primary_and_secondary_by_severity() {
        let user = Uuid::new_v4();
        let reference = ReferenceData::load_test();
        let profile = fatigue_profile(user);
        let flags = vec![
            flag(user, FlagTarget::Biomarker("ferritin".into()), FlagSeverity::High, 2),
            flag(user, FlagTarget::Biomarker("tsh".into()), FlagSeverity::Moderate, 3),
        ];

        let set = RecommendationCorrelator::correlate(
            &flags,
            &profile,
            &reference,
            &RecommendationConfig::default(),
        );

        assert_eq!(set.primary.len(), 1);
        assert_eq!(set.primary[0].target.id(), "ferritin");
        assert_eq!(set.primary[0].supporting_symptoms, vec!["fatigue"]);
        assert_eq!(set.secondary.len(), 1);
        assert_eq!(set.secondary[0].target.id(), "tsh");
    }

    #[test]
    fn mixed_severities_on_one_target_rank_as_highest() {
        let user = Uuid::new_v4();
        let reference = ReferenceData::load_test();
        let profile = SymptomProfile::empty(user);
        let target = FlagTarget::Biomarker("ferritin".into());
        let mut symptom_flag = flag(user, target.clone(), FlagSeverity::Moderate, 1);
        symptom_flag.flag_type = FlagType::SymptomTriggered;
        let flags = vec![
            symptom_flag,
            flag(user, target, FlagSeverity::Critical, 2),
        ];

        let set = RecommendationCorrelator::correlate(
            &flags,
            &profile,
            &reference,
            &RecommendationConfig::default(),
        );

        assert_eq!(set.primary.len(), 1);
        assert_eq!(set.primary[0].severity, Some(FlagSeverity::Critical));
        assert_eq!(set.primary[0].supporting_flags.len(), 2);
        assert!(set.secondary.is_empty());
    }

    #[test]
    fn resolved_flags_are_ignored() {
        let user = Uuid::new_v4();
        let reference = ReferenceData::load_test();
        let mut resolved = flag(
            user,
            FlagTarget::Biomarker("ferritin".into()),
            FlagSeverity::High,
            1,
        );
        resolved.status = FlagStatus::Resolved;

        let set = RecommendationCorrelator::correlate(
            &[resolved],
            &SymptomProfile::empty(user),
            &reference,
            &RecommendationConfig::default(),
        );
        assert!(set.is_empty());
    }

    #[test]
    fn optimization_surfaces_category_siblings() {
        let user = Uuid::new_v4();
        let reference = ReferenceData::load_test();
        // ferritin is category "blood"; hemoglobin shares it and is unflagged
        let flags = vec![flag(
            user,
            FlagTarget::Biomarker("ferritin".into()),
            FlagSeverity::High,
            1,
        )];

        let set = RecommendationCorrelator::correlate(
            &flags,
            &SymptomProfile::empty(user),
            &reference,
            &RecommendationConfig::default(),
        );

        let targets: Vec<_> = set.optimization.iter().map(|r| r.target.id()).collect();
        assert_eq!(targets, vec!["hemoglobin"]);
        assert_eq!(set.optimization[0].severity, None);
    }

    #[test]
    fn ordering_is_deterministic() {
        let user = Uuid::new_v4();
        let reference = ReferenceData::load_test();
        let flags = vec![
            flag(user, FlagTarget::Biomarker("tsh".into()), FlagSeverity::High, 2),
            flag(user, FlagTarget::Biomarker("ferritin".into()), FlagSeverity::High, 2),
            flag(user, FlagTarget::Biomarker("hemoglobin".into()), FlagSeverity::Critical, 1),
            flag(user, FlagTarget::Biomarker("vitamin_d".into()), FlagSeverity::High, 4),
        ];

        let set = RecommendationCorrelator::correlate(
            &flags,
            &SymptomProfile::empty(user),
            &reference,
            &RecommendationConfig::default(),
        );

        let order: Vec<_> = set.primary.iter().map(|r| r.target.id()).collect();
        // critical first; equal severities by recency desc, then id asc
        assert_eq!(order, vec!["hemoglobin", "vitamin_d", "ferritin", "tsh"]);
    }

    #[test]
    fn lists_are_capped() {
        let user = Uuid::new_v4();
        let reference = ReferenceData::load_test();
        let flags: Vec<Flag> = ["ferritin", "hemoglobin", "tsh", "vitamin_d", "testosterone"]
            .iter()
            .map(|id| flag(user, FlagTarget::Biomarker((*id).into()), FlagSeverity::High, 1))
            .collect();

        let set = RecommendationCorrelator::correlate(
            &flags,
            &SymptomProfile::empty(user),
            &reference,
            &RecommendationConfig { max_per_tier: 2 },
        );
        assert_eq!(set.primary.len(), 2);
    }

    #[test]
    fn empty_inputs_empty_set() {
        let set = RecommendationCorrelator::correlate(
            &[],
            &SymptomProfile::empty(Uuid::new_v4()),
            &ReferenceData::load_test(),
            &RecommendationConfig::default(),
        );
        assert!(set.is_empty());
    }
}
