use crate::models::enums::FlagSeverity;
use crate::models::PersonalizedRange;

/// Reason-text builder for flags. Calm, factual framing; every message
/// names the evidence it came from.
pub struct FlagMessages;

impl FlagMessages {
    pub fn symptom_triggered(symptoms: &[String], biomarker: &str) -> String {
        format!(
            "Reported {} can relate to {}; checking this marker may be worthwhile.",
            symptoms.join(", "),
            biomarker,
        )
    }

    pub fn out_of_range(
        biomarker: &str,
        value: f64,
        range: &PersonalizedRange,
        severity: FlagSeverity,
    ) -> String {
        let bound = if value < range.normal.min {
            format!("below the expected minimum of {}", range.normal.min)
        } else {
            format!("above the expected maximum of {}", range.normal.max)
        };
        format!(
            "{} measured at {} {} is {} ({}).",
            biomarker,
            value,
            range.unit,
            bound,
            severity.as_str(),
        )
    }
}
