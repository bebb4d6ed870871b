//! Biomarker correlation and flagging engine.
//!
//! Merges raw symptom reports from independent questionnaires into one
//! deduplicated per-user profile, personalizes tiered clinical reference
//! ranges by age and gender, triages biomarkers and symptoms into flags,
//! and correlates active flags into ranked recommendations.
//!
//! The core is synchronous and CPU-bound: raw inputs arrive through the
//! collaborator traits in [`storage`], reference data is loaded once into an
//! immutable [`reference::ReferenceData`], and persistence stays the
//! embedder's concern.

pub mod aggregator;
pub mod engine;
pub mod flagging;
pub mod memory; // in-memory collaborators for tests and embedders
pub mod models;
pub mod ranges;
pub mod recommend;
pub mod reference;
pub mod storage;
pub mod types;

pub use aggregator::{ProfileAnalytics, SymptomAggregator, TrendComparison};
pub use engine::TriageEngine;
pub use models::enums::{
    FlagSeverity, FlagStatus, FlagType, FrequencyLevel, Gender, RecommendationTier,
    SeverityLevel, TrendDirection,
};
pub use models::{
    BiomarkerDefinition, CanonicalSymptom, Flag, FlagTarget, PersonalizedRange,
    ProfileSnapshot, RangeResolution, Recommendation, RecommendationSet, SymptomProfile,
    SymptomReport,
};
pub use recommend::RecommendationConfig;
pub use reference::ReferenceData;
pub use types::{Demographics, MeasuredValue, TriageError};
