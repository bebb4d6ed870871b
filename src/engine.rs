//! Top-level triage engine: wires the aggregator, range resolution, flag
//! evaluation, and recommendation correlation behind one synchronous API,
//! serializing the aggregate-then-flag sequence per user.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::aggregator::{compute_analytics, ProfileAnalytics, SymptomAggregator};
use crate::flagging::FlagEvaluator;
use crate::models::enums::{FlagStatus, Gender};
use crate::models::{
    Flag, ProfileSnapshot, RangeResolution, RecommendationSet, SymptomProfile,
};
use crate::ranges;
use crate::recommend::{RecommendationConfig, RecommendationCorrelator};
use crate::reference::ReferenceData;
use crate::storage::{DemographicProvider, FlagStore, ProfileStore, RawSymptomSource};
use crate::types::{MeasuredValue, TriageError};

pub struct TriageEngine {
    reference: Arc<ReferenceData>,
    aggregator: SymptomAggregator,
    evaluator: FlagEvaluator,
    profiles: Arc<dyn ProfileStore>,
    flags: Arc<dyn FlagStore>,
    recommendation_config: RecommendationConfig,
    /// One lock per user. Aggregation and flagging for the same user must
    /// never interleave; range resolution stays lock-free.
    user_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl TriageEngine {
    pub fn new(
        reference: Arc<ReferenceData>,
        reports: Arc<dyn RawSymptomSource>,
        demographics: Arc<dyn DemographicProvider>,
        profiles: Arc<dyn ProfileStore>,
        flags: Arc<dyn FlagStore>,
    ) -> Self {
        Self {
            aggregator: SymptomAggregator::new(reports, profiles.clone(), reference.clone()),
            evaluator: FlagEvaluator::new(reference.clone(), flags.clone(), demographics),
            reference,
            profiles,
            flags,
            recommendation_config: RecommendationConfig::default(),
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_recommendation_config(mut self, config: RecommendationConfig) -> Self {
        self.recommendation_config = config;
        self
    }

    fn user_lock(&self, user_id: Uuid) -> Result<Arc<Mutex<()>>, TriageError> {
        let mut locks = self.user_locks.lock().map_err(|_| TriageError::LockFailed)?;
        Ok(locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    /// Decoupled "assessment completed" entry point: refresh the profile,
    /// then re-run symptom-triggered flagging, under the user lock.
    pub fn on_assessment_completed(
        &self,
        user_id: Uuid,
        assessment_source: &str,
    ) -> Result<Vec<Flag>, TriageError> {
        let lock = self.user_lock(user_id)?;
        let _guard = lock.lock().map_err(|_| TriageError::LockFailed)?;

        let profile = self.aggregator.aggregate(user_id, Some(assessment_source))?;
        self.evaluator.evaluate(user_id, &profile, &[])
    }

    /// Rebuild and store the user's symptom profile.
    pub fn aggregate(
        &self,
        user_id: Uuid,
        source: Option<&str>,
    ) -> Result<SymptomProfile, TriageError> {
        let lock = self.user_lock(user_id)?;
        let _guard = lock.lock().map_err(|_| TriageError::LockFailed)?;
        self.aggregator.aggregate(user_id, source)
    }

    /// Evaluate both trigger families against the stored profile and the
    /// given measured values; returns the active flags after upsert.
    pub fn evaluate_flags(
        &self,
        user_id: Uuid,
        measured: &[MeasuredValue],
    ) -> Result<Vec<Flag>, TriageError> {
        let lock = self.user_lock(user_id)?;
        let _guard = lock.lock().map_err(|_| TriageError::LockFailed)?;

        let profile = self.stored_profile(user_id)?;
        self.evaluator.evaluate(user_id, &profile, measured)
    }

    pub fn get_analytics(&self, user_id: Uuid) -> Result<ProfileAnalytics, TriageError> {
        let profile = self.stored_profile(user_id)?;
        Ok(compute_analytics(&profile))
    }

    /// History snapshots, most recent first.
    pub fn get_history(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ProfileSnapshot>, TriageError> {
        let profile = self.stored_profile(user_id)?;
        Ok(profile.history.iter().rev().take(limit).cloned().collect())
    }

    pub fn resolve_range(
        &self,
        biomarker_id: &str,
        age: Option<i32>,
        gender: Option<Gender>,
    ) -> RangeResolution {
        ranges::resolve_range(&self.reference, biomarker_id, age, gender)
    }

    /// Explicit external resolution; the flag is retained, never deleted.
    pub fn resolve_flag(&self, flag_id: Uuid) -> Result<(), TriageError> {
        self.flags.resolve(flag_id).map_err(Into::into)
    }

    pub fn get_recommendations(&self, user_id: Uuid) -> Result<RecommendationSet, TriageError> {
        let flags = self.flags.get_all(user_id, Some(FlagStatus::Active))?;
        let profile = self.stored_profile(user_id)?;
        Ok(RecommendationCorrelator::correlate(
            &flags,
            &profile,
            &self.reference,
            &self.recommendation_config,
        ))
    }

    fn stored_profile(&self, user_id: Uuid) -> Result<SymptomProfile, TriageError> {
        Ok(self
            .profiles
            .get(user_id)?
            .unwrap_or_else(|| SymptomProfile::empty(user_id)))
    }
}
