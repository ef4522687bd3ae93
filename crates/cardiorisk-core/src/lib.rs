//! Core types: patient fields, categorical expansion, feature schema alignment.

pub mod error;
pub mod label;
pub mod patient;
pub mod schema;

pub use error::{SchemaError, VALIDATION_MESSAGE, ValidationError};
pub use label::RiskLabel;
pub use patient::{ExpandedRecord, FIELD_COUNT, PatientField, PatientRecord, indicator_name};
pub use schema::{Alignment, ColumnSource, ColumnSpec, FeatureSchema, FeatureVector};
