use thiserror::Error;

use crate::patient::PatientField;

/// Message shown to the user for any field that fails to parse.
pub const VALIDATION_MESSAGE: &str = "Please enter valid numeric values";

/// A raw field value that could not be turned into a number.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing value for '{0}'")]
    Missing(PatientField),

    #[error("'{field}' is not a number: {raw:?}")]
    NotNumeric { field: PatientField, raw: String },

    #[error("'{field}' must be finite, got {raw:?}")]
    NotFinite { field: PatientField, raw: String },
}

impl ValidationError {
    pub fn field(&self) -> PatientField {
        match self {
            Self::Missing(field) => *field,
            Self::NotNumeric { field, .. } | Self::NotFinite { field, .. } => *field,
        }
    }
}

/// The stored feature-name list cannot be turned into a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("feature list is empty")]
    Empty,

    #[error("duplicate feature column '{name}' at positions {first} and {second}")]
    DuplicateColumn {
        name: String,
        first: usize,
        second: usize,
    },
}
