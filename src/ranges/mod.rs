//! Range personalization: resolves a biomarker's tiered reference range for
//! one demographic profile. Pure and lock-free; only the optimal tier is
//! ever adjusted, critical and normal bounds come straight from the base
//! definition.

use crate::models::enums::Gender;
use crate::models::{PersonalizedRange, RangeBounds, RangeResolution};
use crate::reference::ReferenceData;

/// Resolve the personalized range for (biomarker, age, gender).
///
/// Override precedence on the optimal tier: gender is applied after the age
/// bracket and therefore wins when both exist. A side of an override that
/// would break the tier ordering is rejected and falls back to the
/// next-lower-precedence bound for that side.
pub fn resolve_range(
    reference: &ReferenceData,
    biomarker_id: &str,
    age: Option<i32>,
    gender: Option<Gender>,
) -> RangeResolution {
    let Some(def) = reference.get_definition(biomarker_id) else {
        return RangeResolution::UnknownBiomarker(biomarker_id.to_string());
    };

    let mut optimal = def.optimal;
    let mut applied_age_bracket = None;
    let mut applied_gender = None;

    match age {
        Some(age) if age < 0 => {
            tracing::warn!(
                biomarker_id = %def.id,
                age,
                "Negative age, skipping age adjustment"
            );
        }
        Some(age) => {
            if let Some(bracket) = reference.bracket_for_age(age as u32) {
                if let Some(over) = def.age_overrides.get(&bracket.name) {
                    optimal = apply_optimal_override(optimal, *over, def.normal, &def.id, "age");
                    applied_age_bracket = Some(bracket.name.clone());
                }
            }
        }
        None => {}
    }

    if let Some(gender) = gender {
        if gender != Gender::Unknown {
            if let Some(over) = def.gender_overrides.get(gender.as_str()) {
                optimal = apply_optimal_override(optimal, *over, def.normal, &def.id, "gender");
                applied_gender = Some(gender);
            }
        }
    }

    RangeResolution::Resolved(PersonalizedRange {
        biomarker_id: def.id.clone(),
        unit: def.unit.clone(),
        critical: def.critical,
        normal: def.normal,
        optimal,
        applied_age_bracket,
        applied_gender,
    })
}

/// Per-side merge of one override layer onto the current optimal bounds.
/// Each side must stay inside the normal envelope; a violating side keeps
/// the current (lower-precedence) value. A cross-side inversion after the
/// merge rejects the whole layer.
fn apply_optimal_override(
    current: RangeBounds,
    candidate: RangeBounds,
    normal: RangeBounds,
    biomarker_id: &str,
    layer: &str,
) -> RangeBounds {
    let min_ok = candidate.min >= normal.min;
    let max_ok = candidate.max <= normal.max;
    if !min_ok {
        tracing::warn!(
            biomarker_id,
            layer,
            candidate_min = candidate.min,
            normal_min = normal.min,
            "Override min breaks tier ordering, keeping lower-precedence bound"
        );
    }
    if !max_ok {
        tracing::warn!(
            biomarker_id,
            layer,
            candidate_max = candidate.max,
            normal_max = normal.max,
            "Override max breaks tier ordering, keeping lower-precedence bound"
        );
    }

    let merged = RangeBounds {
        min: if min_ok { candidate.min } else { current.min },
        max: if max_ok { candidate.max } else { current.max },
    };
    if merged.min > merged.max {
        tracing::warn!(
            biomarker_id,
            layer,
            "Merged override inverts optimal bounds, rejecting layer"
        );
        return current;
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceData {
        ReferenceData::load_test()
    }

    #[test]
    fn gender_beats_age_bracket() {
        let resolution = resolve_range(&reference(), "hemoglobin", Some(40), Some(Gender::Male));
        let range = resolution.resolved().unwrap();
        assert_eq!(range.optimal, RangeBounds { min: 14.0, max: 17.5 });
        assert_eq!(range.critical, RangeBounds { min: 8.0, max: 22.0 });
        assert_eq!(range.applied_age_bracket.as_deref(), Some("adult"));
        assert_eq!(range.applied_gender, Some(Gender::Male));
    }

    #[test]
    fn age_only_applies_bracket_override() {
        let resolution = resolve_range(&reference(), "hemoglobin", Some(40), None);
        let range = resolution.resolved().unwrap();
        assert_eq!(range.optimal, RangeBounds { min: 13.0, max: 17.0 });
        assert_eq!(range.applied_gender, None);
    }

    #[test]
    fn violating_override_side_falls_back() {
        // child override min (10.0) sits below normal.min (12.0)
        let resolution = resolve_range(&reference(), "hemoglobin", Some(8), None);
        let range = resolution.resolved().unwrap();
        assert_eq!(range.optimal.min, 13.5, "rejected side keeps the base bound");
        assert_eq!(range.optimal.max, 16.0, "valid side still applies");
    }

    #[test]
    fn missing_demographics_use_base() {
        let resolution = resolve_range(&reference(), "hemoglobin", None, None);
        let range = resolution.resolved().unwrap();
        assert_eq!(range.optimal, RangeBounds { min: 13.5, max: 17.5 });
        assert_eq!(range.applied_age_bracket, None);
    }

    #[test]
    fn negative_age_skips_age_layer() {
        let resolution = resolve_range(&reference(), "hemoglobin", Some(-3), Some(Gender::Female));
        let range = resolution.resolved().unwrap();
        assert_eq!(range.applied_age_bracket, None);
        assert_eq!(range.optimal, RangeBounds { min: 12.5, max: 16.0 });
    }

    #[test]
    fn unknown_gender_skips_gender_layer() {
        let resolution = resolve_range(&reference(), "hemoglobin", Some(40), Some(Gender::Unknown));
        let range = resolution.resolved().unwrap();
        assert_eq!(range.applied_gender, None);
        assert_eq!(range.optimal, RangeBounds { min: 13.0, max: 17.0 });
    }

    #[test]
    fn unknown_biomarker_is_unresolvable() {
        let resolution = resolve_range(&reference(), "chromium", Some(40), None);
        assert_eq!(
            resolution,
            RangeResolution::UnknownBiomarker("chromium".into())
        );
    }

    #[test]
    fn ordering_invariant_holds_for_all_demographics() {
        let reference = reference();
        let genders = [None, Some(Gender::Male), Some(Gender::Female), Some(Gender::Unknown)];
        for def in reference.definitions() {
            for age in 0..=120 {
                for gender in genders {
                    let resolution = resolve_range(&reference, &def.id, Some(age), gender);
                    let range = resolution.resolved().unwrap();
                    assert!(
                        range.ordering_valid(),
                        "ordering violated for {} age={} gender={:?}: {:?}",
                        def.id,
                        age,
                        gender,
                        range
                    );
                }
            }
        }
    }

    #[test]
    fn inverting_layer_is_rejected_entirely() {
        let mut reference = reference();
        // craft an override whose sides are individually inside the normal
        // envelope but inverted relative to each other
        let def = reference
            .biomarkers
            .iter_mut()
            .find(|d| d.id == "ferritin")
            .unwrap();
        def.gender_overrides.insert(
            "male".into(),
            RangeBounds { min: 200.0, max: 100.0 },
        );

        let resolution = resolve_range(&reference, "ferritin", None, Some(Gender::Male));
        let range = resolution.resolved().unwrap();
        assert_eq!(range.optimal, RangeBounds { min: 30.0, max: 150.0 });
    }
}
