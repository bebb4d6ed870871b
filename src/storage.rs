//! Collaborator traits the core depends on. Persistence technology is the
//! embedder's concern; the core only sees these synchronous seams.

use thiserror::Error;
use uuid::Uuid;

use crate::models::enums::FlagStatus;
use crate::models::{Flag, SymptomProfile, SymptomReport};
use crate::types::Demographics;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Internal lock failed")]
    LockFailed,

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Raw questionnaire output, scoped per user and optionally per source.
pub trait RawSymptomSource: Send + Sync {
    fn get_reports(
        &self,
        user_id: Uuid,
        source: Option<&str>,
    ) -> Result<Vec<SymptomReport>, StorageError>;
}

/// Age/gender lookup. A user with no demographic record is an expected
/// steady state and yields `None`.
pub trait DemographicProvider: Send + Sync {
    fn get_profile(&self, user_id: Uuid) -> Result<Option<Demographics>, StorageError>;
}

pub trait ProfileStore: Send + Sync {
    fn get(&self, user_id: Uuid) -> Result<Option<SymptomProfile>, StorageError>;
    fn put(&self, profile: &SymptomProfile) -> Result<(), StorageError>;
}

pub trait FlagStore: Send + Sync {
    fn get_all(
        &self,
        user_id: Uuid,
        status: Option<FlagStatus>,
    ) -> Result<Vec<Flag>, StorageError>;

    /// Insert the candidate, or fold it into the existing ACTIVE flag with
    /// the same (user_id, target, flag_type). Returns the stored state.
    fn upsert(&self, flag: Flag) -> Result<Flag, StorageError>;

    /// Mark a flag resolved. Explicit external action; the flag is retained.
    fn resolve(&self, flag_id: Uuid) -> Result<(), StorageError>;
}
