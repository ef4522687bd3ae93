use cardiorisk_core::{SchemaError, VALIDATION_MESSAGE, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact not found: {0}")]
    ArtifactNotFound(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("{component} expects {expected} features, got {actual}")]
    WidthMismatch {
        component: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid tree {tree}: {reason}")]
    InvalidTree { tree: usize, reason: String },

    #[error("classifier returned unexpected label {0}")]
    UnexpectedLabel(i64),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("onnx runtime error: {0}")]
    Onnx(String),

    #[error("{0}")]
    Other(String),
}

/// Failure of a single prediction request.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Unclassified(#[from] ModelError),
}

impl PredictError {
    /// Text shown to the user in place of a risk label.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(_) => VALIDATION_MESSAGE.to_string(),
            Self::Unclassified(e) => format!("An error occurred: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardiorisk_core::PatientField;

    #[test]
    fn validation_message_is_fixed() {
        let err = PredictError::from(ValidationError::NotNumeric {
            field: PatientField::Age,
            raw: "abc".into(),
        });
        assert_eq!(err.user_message(), "Please enter valid numeric values");
    }

    #[test]
    fn unclassified_message_embeds_cause() {
        let err = PredictError::from(ModelError::WidthMismatch {
            component: "scaler",
            expected: 15,
            actual: 14,
        });
        assert_eq!(
            err.user_message(),
            "An error occurred: scaler expects 15 features, got 14"
        );
    }
}
