//! Inference layer: model bundle loading, scaling, classification, and the patient adapter.

pub mod adapter;
pub mod batch;
pub mod bundle;
pub mod classifier;
mod error;
pub mod scaler;

#[cfg(feature = "onnx")]
mod onnx;

pub use adapter::{InferenceAdapter, Prediction};
pub use batch::{ScoreOptions, ScoreSummary, score_csv, write_csv};
pub use bundle::{BundlePaths, ModelBundle};
pub use classifier::{Classifier, ClassifierSpec};
pub use error::{ModelError, PredictError};
pub use scaler::{Scaler, ScalerSpec};

#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
