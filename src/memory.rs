//! RwLock-backed in-memory collaborator implementations. Used by tests and
//! by embedders that need no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use crate::models::enums::FlagStatus;
use crate::models::{Flag, SymptomProfile, SymptomReport};
use crate::storage::{
    DemographicProvider, FlagStore, ProfileStore, RawSymptomSource, StorageError,
};
use crate::types::Demographics;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryReportSource {
    reports: RwLock<HashMap<Uuid, Vec<SymptomReport>>>,
}

impl InMemoryReportSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, user_id: Uuid, report: SymptomReport) {
        if let Ok(mut reports) = self.reports.write() {
            reports.entry(user_id).or_default().push(report);
        }
    }
}

impl RawSymptomSource for InMemoryReportSource {
    fn get_reports(
        &self,
        user_id: Uuid,
        source: Option<&str>,
    ) -> Result<Vec<SymptomReport>, StorageError> {
        let reports = self.reports.read().map_err(|_| StorageError::LockFailed)?;
        let mut result: Vec<SymptomReport> =
            reports.get(&user_id).cloned().unwrap_or_default();
        if let Some(source) = source {
            result.retain(|r| r.assessment_source == source);
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Demographics
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryDemographicProvider {
    profiles: RwLock<HashMap<Uuid, Demographics>>,
}

impl InMemoryDemographicProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, user_id: Uuid, demographics: Demographics) {
        if let Ok(mut profiles) = self.profiles.write() {
            profiles.insert(user_id, demographics);
        }
    }
}

impl DemographicProvider for InMemoryDemographicProvider {
    fn get_profile(&self, user_id: Uuid) -> Result<Option<Demographics>, StorageError> {
        let profiles = self.profiles.read().map_err(|_| StorageError::LockFailed)?;
        Ok(profiles.get(&user_id).copied())
    }
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, SymptomProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn get(&self, user_id: Uuid) -> Result<Option<SymptomProfile>, StorageError> {
        let profiles = self.profiles.read().map_err(|_| StorageError::LockFailed)?;
        Ok(profiles.get(&user_id).cloned())
    }

    fn put(&self, profile: &SymptomProfile) -> Result<(), StorageError> {
        let mut profiles = self.profiles.write().map_err(|_| StorageError::LockFailed)?;
        profiles.insert(profile.user_id, profile.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryFlagStore {
    flags: RwLock<Vec<Flag>>,
}

impl InMemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for InMemoryFlagStore {
    fn get_all(
        &self,
        user_id: Uuid,
        status: Option<FlagStatus>,
    ) -> Result<Vec<Flag>, StorageError> {
        let flags = self.flags.read().map_err(|_| StorageError::LockFailed)?;
        Ok(flags
            .iter()
            .filter(|f| f.user_id == user_id && status.map_or(true, |s| f.status == s))
            .cloned()
            .collect())
    }

    fn upsert(&self, flag: Flag) -> Result<Flag, StorageError> {
        let mut flags = self.flags.write().map_err(|_| StorageError::LockFailed)?;

        if let Some(existing) = flags.iter_mut().find(|f| {
            f.user_id == flag.user_id
                && f.target == flag.target
                && f.flag_type == flag.flag_type
                && f.is_active()
        }) {
            existing.severity = flag.severity;
            existing.reason = flag.reason;
            existing.source_assessments = flag.source_assessments;
            existing.updated_at = flag.updated_at;
            return Ok(existing.clone());
        }

        flags.push(flag.clone());
        Ok(flag)
    }

    fn resolve(&self, flag_id: Uuid) -> Result<(), StorageError> {
        let mut flags = self.flags.write().map_err(|_| StorageError::LockFailed)?;

        let flag = flags
            .iter_mut()
            .find(|f| f.id == flag_id)
            .ok_or_else(|| StorageError::NotFound {
                entity_type: "flag".into(),
                id: flag_id.to_string(),
            })?;

        // Resolving twice is a no-op, not an error.
        if flag.status == FlagStatus::Active {
            flag.status = FlagStatus::Resolved;
            flag.resolved_at = Some(chrono::Local::now().naive_local());
        }

        Ok(())
    }
}
