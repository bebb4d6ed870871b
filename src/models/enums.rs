use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// Variant order is the severity order; Ord derives rely on it.
str_enum!(SeverityLevel {
    None => "none",
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
    Unknown => "unknown",
});

impl SeverityLevel {
    /// Lenient parse for raw questionnaire input. Returns `None` for values
    /// no enumeration covers; the caller drops the field and keeps the report.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "none" => Some(Self::None),
            "mild" | "slight" | "low" => Some(Self::Mild),
            "moderate" | "medium" => Some(Self::Moderate),
            "severe" | "high" | "extreme" => Some(Self::Severe),
            "unknown" | "unsure" | "not sure" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Severity comparison must ignore the Unknown sentinel.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::None => Some(0),
            Self::Mild => Some(1),
            Self::Moderate => Some(2),
            Self::Severe => Some(3),
            Self::Unknown => None,
        }
    }
}

str_enum!(FrequencyLevel {
    Rarely => "rarely",
    Occasionally => "occasionally",
    Often => "often",
    Daily => "daily",
    Constant => "constant",
    Unknown => "unknown",
});

impl FrequencyLevel {
    /// Lenient parse for raw questionnaire input.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "rarely" | "rare" | "seldom" => Some(Self::Rarely),
            "occasionally" | "sometimes" => Some(Self::Occasionally),
            "often" | "frequently" => Some(Self::Often),
            "daily" | "every day" => Some(Self::Daily),
            "constant" | "constantly" | "always" => Some(Self::Constant),
            "unknown" | "unsure" | "not sure" => Some(Self::Unknown),
            _ => None,
        }
    }
}

str_enum!(Gender {
    Male => "male",
    Female => "female",
    Unknown => "unknown",
});

// Ascending actionability; Ord is used to rank flags and recommendations.
str_enum!(FlagSeverity {
    Moderate => "moderate",
    High => "high",
    Critical => "critical",
});

str_enum!(FlagType {
    SymptomTriggered => "symptom_triggered",
    OutOfRange => "out_of_range",
    Manual => "manual",
    Critical => "critical",
});

str_enum!(FlagStatus {
    Active => "active",
    Resolved => "resolved",
});

str_enum!(RecommendationTier {
    Primary => "primary",
    Secondary => "secondary",
    Optimization => "optimization",
});

str_enum!(TrendDirection {
    Increasing => "increasing",
    Decreasing => "decreasing",
    Stable => "stable",
});

str_enum!(TriggerDirection {
    Below => "below",
    Above => "above",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn severity_round_trip() {
        for (variant, s) in [
            (SeverityLevel::None, "none"),
            (SeverityLevel::Mild, "mild"),
            (SeverityLevel::Moderate, "moderate"),
            (SeverityLevel::Severe, "severe"),
            (SeverityLevel::Unknown, "unknown"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(SeverityLevel::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn severity_ordering_excludes_unknown() {
        assert!(SeverityLevel::Mild < SeverityLevel::Severe);
        assert_eq!(SeverityLevel::Unknown.rank(), None);
        assert_eq!(SeverityLevel::Severe.rank(), Some(3));
    }

    #[test]
    fn severity_from_raw_lenient() {
        assert_eq!(SeverityLevel::from_raw("  Severe "), Some(SeverityLevel::Severe));
        assert_eq!(SeverityLevel::from_raw("HIGH"), Some(SeverityLevel::Severe));
        assert_eq!(SeverityLevel::from_raw("not sure"), Some(SeverityLevel::Unknown));
        assert_eq!(SeverityLevel::from_raw("purple"), None);
    }

    #[test]
    fn frequency_from_raw_lenient() {
        assert_eq!(FrequencyLevel::from_raw("Sometimes"), Some(FrequencyLevel::Occasionally));
        assert_eq!(FrequencyLevel::from_raw("every day"), Some(FrequencyLevel::Daily));
        assert_eq!(FrequencyLevel::from_raw("42"), None);
    }

    #[test]
    fn flag_severity_ordering() {
        assert!(FlagSeverity::Moderate < FlagSeverity::High);
        assert!(FlagSeverity::High < FlagSeverity::Critical);
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(Gender::from_str("other?").is_err());
        assert!(FlagType::from_str("").is_err());
        assert!(FlagStatus::from_str("dismissed").is_err());
    }
}
