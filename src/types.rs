use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::enums::Gender;
use crate::storage::StorageError;

/// Demographic inputs for range personalization. Age is signed so an
/// invalid negative value can arrive and be rejected per-field rather
/// than failing the whole evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: Option<i32>,
    pub gender: Option<Gender>,
}

impl Demographics {
    pub fn unknown() -> Self {
        Self {
            age: None,
            gender: None,
        }
    }
}

/// An externally measured lab value handed to flag evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasuredValue {
    pub biomarker_id: String,
    pub value: f64,
}

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Reference data load failed ({0}): {1}")]
    ReferenceLoad(String, String),

    #[error("Reference data parse failed ({0}): {1}")]
    ReferenceParse(String, String),

    #[error("Internal lock failed")]
    LockFailed,
}
