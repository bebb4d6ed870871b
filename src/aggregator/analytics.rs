use serde::{Deserialize, Serialize};

use crate::models::enums::{SeverityLevel, TrendDirection};
use crate::models::SymptomProfile;

/// Comparison of the two most recent history snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendComparison {
    pub direction: TrendDirection,
    /// total_count delta, latest minus previous.
    pub delta: i64,
}

impl TrendComparison {
    pub fn stable() -> Self {
        Self {
            direction: TrendDirection::Stable,
            delta: 0,
        }
    }
}

/// Derived analytics for one symptom profile. Pure function of the profile;
/// empty profiles yield neutral values, never errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileAnalytics {
    pub most_common_category: Option<String>,
    /// Canonical keys whose observed maximum sits in the severe tier,
    /// most recent first, capped at 5.
    pub most_severe_symptoms: Vec<String>,
    /// Canonical keys by occurrence count, ties alphabetical, capped at 5.
    pub most_frequent_symptoms: Vec<String>,
    pub trend: TrendComparison,
}

const TOP_N: usize = 5;

pub fn compute_analytics(profile: &SymptomProfile) -> ProfileAnalytics {
    ProfileAnalytics {
        most_common_category: most_common_category(profile),
        most_severe_symptoms: most_severe_symptoms(profile),
        most_frequent_symptoms: most_frequent_symptoms(profile),
        trend: trend(profile),
    }
}

/// Argmax of unique-symptom count per category; BTreeMap iteration order
/// breaks ties alphabetically.
fn most_common_category(profile: &SymptomProfile) -> Option<String> {
    let mut best: Option<(&String, usize)> = None;
    for (category, keys) in &profile.by_category {
        match best {
            Some((_, count)) if keys.len() <= count => {}
            _ => best = Some((category, keys.len())),
        }
    }
    best.map(|(category, _)| category.clone())
}

fn most_severe_symptoms(profile: &SymptomProfile) -> Vec<String> {
    let mut severe: Vec<_> = profile
        .symptoms
        .values()
        .filter(|s| s.max_severity() == Some(SeverityLevel::Severe))
        .collect();
    severe.sort_by(|a, b| {
        b.last_reported_at
            .cmp(&a.last_reported_at)
            .then_with(|| a.key.cmp(&b.key))
    });
    severe.into_iter().take(TOP_N).map(|s| s.key.clone()).collect()
}

fn most_frequent_symptoms(profile: &SymptomProfile) -> Vec<String> {
    let mut all: Vec<_> = profile.symptoms.values().collect();
    all.sort_by(|a, b| {
        b.occurrence_count
            .cmp(&a.occurrence_count)
            .then_with(|| a.key.cmp(&b.key))
    });
    all.into_iter().take(TOP_N).map(|s| s.key.clone()).collect()
}

fn trend(profile: &SymptomProfile) -> TrendComparison {
    let len = profile.history.len();
    if len < 2 {
        return TrendComparison::stable();
    }
    let latest = &profile.history[len - 1];
    let previous = &profile.history[len - 2];
    let delta = i64::from(latest.total_count) - i64::from(previous.total_count);
    let direction = match delta {
        d if d > 0 => TrendDirection::Increasing,
        d if d < 0 => TrendDirection::Decreasing,
        _ => TrendDirection::Stable,
    };
    TrendComparison { direction, delta }
}
