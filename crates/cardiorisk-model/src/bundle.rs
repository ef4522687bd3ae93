//! Trained model bundle: classifier, scaler, and ordered feature names.
//!
//! The three artifacts come from the training run and are loaded once at
//! startup. A bundle directory holds:
//!
//! - `feature_names.json`: JSON array of column names, in training order
//! - `cardio_scaler.json`: scaler parameters (see [`ScalerSpec`])
//! - `cardio_model.json`: classifier parameters (see [`ClassifierSpec`]), or
//!   `cardio_model.onnx` when built with the `onnx` feature

use std::fs;
use std::path::{Path, PathBuf};

use cardiorisk_core::{ColumnSource, FeatureSchema};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::classifier::{Classifier, ClassifierSpec};
use crate::error::ModelError;
use crate::scaler::{Scaler, ScalerSpec};

pub const FEATURE_NAMES_FILE: &str = "feature_names.json";
pub const SCALER_FILE: &str = "cardio_scaler.json";
pub const MODEL_FILE: &str = "cardio_model.json";
pub const ONNX_MODEL_FILE: &str = "cardio_model.onnx";

/// Locations of the bundle artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePaths {
    pub feature_names: PathBuf,
    pub scaler: PathBuf,
    pub model: PathBuf,
    pub onnx_model: PathBuf,
}

impl BundlePaths {
    /// Default artifact names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            feature_names: dir.join(FEATURE_NAMES_FILE),
            scaler: dir.join(SCALER_FILE),
            model: dir.join(MODEL_FILE),
            onnx_model: dir.join(ONNX_MODEL_FILE),
        }
    }
}

/// Immutable classifier + scaler + feature schema.
pub struct ModelBundle {
    schema: FeatureSchema,
    scaler: Box<dyn Scaler>,
    classifier: Box<dyn Classifier>,
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("width", &self.schema.width())
            .field("scaler", &self.scaler.kind())
            .field("classifier", &self.classifier.kind())
            .finish()
    }
}

impl ModelBundle {
    /// Load a bundle from a directory with the default artifact names.
    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        Self::load_with(&BundlePaths::in_dir(dir))
    }

    /// Load a bundle from explicit artifact paths.
    pub fn load_with(paths: &BundlePaths) -> Result<Self, ModelError> {
        let names: Vec<String> = read_json(&paths.feature_names)?;

        let scaler: ScalerSpec = read_json(&paths.scaler)?;
        scaler.validate()?;

        let classifier = load_classifier(paths, names.len())?;

        let bundle = Self::from_parts(&names, Box::new(scaler), classifier)?;
        info!(
            width = bundle.schema.width(),
            scaler = bundle.scaler.kind(),
            classifier = bundle.classifier.kind(),
            "loaded model bundle"
        );
        Ok(bundle)
    }

    /// Assemble a bundle from already-constructed parts.
    ///
    /// Fails when the scaler or classifier was fitted on a different number
    /// of features than the name list holds.
    pub fn from_parts<S: AsRef<str>>(
        feature_names: &[S],
        scaler: Box<dyn Scaler>,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, ModelError> {
        let schema = FeatureSchema::resolve(feature_names)?;
        let width = schema.width();

        if let Some(w) = scaler.width()
            && w != width
        {
            return Err(ModelError::WidthMismatch {
                component: "scaler",
                expected: w,
                actual: width,
            });
        }
        if let Some(w) = classifier.width()
            && w != width
        {
            return Err(ModelError::WidthMismatch {
                component: "classifier",
                expected: w,
                actual: width,
            });
        }

        Ok(Self {
            schema,
            scaler,
            classifier,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn scaler(&self) -> &dyn Scaler {
        self.scaler.as_ref()
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Human-readable description of the bundle, one line per item.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec![
            format!("classifier: {}", self.classifier.kind()),
            format!("scaler:     {}", self.scaler.kind()),
            format!("features:   {}", self.schema.width()),
        ];
        for col in self.schema.columns() {
            let source = match col.source {
                ColumnSource::Field(field) => format!("field {field}"),
                ColumnSource::Indicator { field, category } => {
                    format!("{field} == {category}")
                }
                ColumnSource::Absent => "always 0".to_string(),
            };
            lines.push(format!("  {:>3}  {:<20} {}", col.position, col.name, source));
        }
        lines
    }
}

#[cfg(feature = "onnx")]
fn load_classifier(paths: &BundlePaths, width: usize) -> Result<Box<dyn Classifier>, ModelError> {
    if paths.onnx_model.exists() {
        let model = crate::onnx::OnnxClassifier::load(&paths.onnx_model, width)?;
        return Ok(Box::new(model));
    }
    load_json_classifier(&paths.model)
}

#[cfg(not(feature = "onnx"))]
fn load_classifier(paths: &BundlePaths, _width: usize) -> Result<Box<dyn Classifier>, ModelError> {
    load_json_classifier(&paths.model)
}

fn load_json_classifier(path: &Path) -> Result<Box<dyn Classifier>, ModelError> {
    let spec: ClassifierSpec = read_json(path)?;
    spec.validate()?;
    Ok(Box::new(spec))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ModelError> {
    if !path.exists() {
        return Err(ModelError::ArtifactNotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
