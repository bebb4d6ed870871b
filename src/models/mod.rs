pub mod biomarker;
pub mod enums;
pub mod flag;
pub mod recommendation;
pub mod symptom;

pub use biomarker::*;
pub use flag::*;
pub use recommendation::*;
pub use symptom::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseEnumError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}
