//! ONNX Runtime classifier for models exported with skl2onnx.
//!
//! Expects a float input named `float_input` of shape `[1, n]` and an int64
//! output named `label`. Both names are checked when the model is loaded.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::classifier::Classifier;
use crate::error::ModelError;

/// Input tensor name used by skl2onnx for numeric features.
pub const INPUT_NAME: &str = "float_input";

/// Output tensor holding the predicted class.
pub const LABEL_OUTPUT: &str = "label";

/// Classifier backed by an ONNX Runtime session.
///
/// Running a session needs exclusive access, so it sits behind a mutex while
/// the classifier itself is shared by reference.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    width: usize,
}

impl OnnxClassifier {
    /// Load a model file. `width` is the number of feature columns.
    pub fn load(model_path: &Path, width: usize) -> Result<Self, ModelError> {
        if !model_path.exists() {
            return Err(ModelError::ArtifactNotFound(model_path.to_path_buf()));
        }

        let session = Session::builder()
            .map_err(|e| ModelError::Onnx(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| ModelError::Onnx(e.to_string()))?;

        let inputs: Vec<&str> = session.inputs().iter().map(|i| i.name()).collect();
        let outputs: Vec<&str> = session.outputs().iter().map(|o| o.name()).collect();
        check_names(&inputs, &outputs)?;

        info!(path = %model_path.display(), width, "loaded onnx classifier");

        Ok(Self {
            session: Mutex::new(session),
            width,
        })
    }
}

/// Fail unless the model exposes the expected input and label output.
fn check_names(inputs: &[&str], outputs: &[&str]) -> Result<(), ModelError> {
    if !inputs.contains(&INPUT_NAME) {
        return Err(ModelError::Onnx(format!(
            "model has no input named '{INPUT_NAME}' (inputs: {})",
            inputs.join(", ")
        )));
    }
    if !outputs.contains(&LABEL_OUTPUT) {
        return Err(ModelError::Onnx(format!(
            "model has no output named '{LABEL_OUTPUT}' (outputs: {})",
            outputs.join(", ")
        )));
    }
    Ok(())
}

impl Classifier for OnnxClassifier {
    fn kind(&self) -> &'static str {
        "onnx"
    }

    fn width(&self) -> Option<usize> {
        Some(self.width)
    }

    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        if features.len() != self.width {
            return Err(ModelError::WidthMismatch {
                component: "classifier",
                expected: self.width,
                actual: features.len(),
            });
        }

        let data: Vec<f32> = features.iter().map(|&x| x as f32).collect();
        let shape = [1i64, self.width as i64];
        let tensor = Tensor::from_array((shape, data.into_boxed_slice()))
            .map_err(|e| ModelError::Onnx(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ModelError::Other("onnx session lock poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![INPUT_NAME => tensor])
            .map_err(|e| ModelError::Onnx(e.to_string()))?;

        let (_, labels) = outputs
            .get(LABEL_OUTPUT)
            .ok_or_else(|| ModelError::Onnx(format!("model produced no '{LABEL_OUTPUT}' output")))?
            .try_extract_tensor::<i64>()
            .map_err(|e| ModelError::Onnx(e.to_string()))?;

        labels
            .first()
            .copied()
            .ok_or_else(|| ModelError::Onnx("empty label output".into()))
    }
}
