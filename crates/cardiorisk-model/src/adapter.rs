//! Inference adapter: raw form text in, risk label out.
//!
//! 1. Parse every field to a number; any failure stops here.
//! 2. Expand cholesterol and glucose into indicator columns.
//! 3. Align to the stored feature order, zero-filling absent columns.
//! 4. Scale.
//! 5. Predict a class label.
//! 6. Map the label to its message.

use cardiorisk_core::{FeatureVector, PatientRecord, RiskLabel};
use tracing::debug;

use crate::bundle::ModelBundle;
use crate::error::{ModelError, PredictError};

/// Turns patient form input into a risk prediction using a fixed bundle.
///
/// Holds the bundle by reference; predictions never mutate it.
pub struct InferenceAdapter<'a> {
    bundle: &'a ModelBundle,
}

/// Outcome of a successful prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: RiskLabel,
    /// Positive-class probability, when the classifier exposes one.
    pub probability: Option<f64>,
}

impl<'a> InferenceAdapter<'a> {
    pub fn new(bundle: &'a ModelBundle) -> Self {
        Self { bundle }
    }

    pub fn bundle(&self) -> &ModelBundle {
        self.bundle
    }

    /// Steps 1–3: parse and align, without scaling.
    pub fn features<I, K, V>(&self, raw: I) -> Result<FeatureVector, PredictError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let record = PatientRecord::parse(raw)?;
        Ok(self.bundle.schema().align(&record).features)
    }

    /// Steps 1–5: parse, align, scale, and classify.
    pub fn predict<I, K, V>(&self, raw: I) -> Result<RiskLabel, PredictError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(self.predict_detailed(raw)?.label)
    }

    /// Like [`predict`](Self::predict), also reporting the class probability.
    pub fn predict_detailed<I, K, V>(&self, raw: I) -> Result<Prediction, PredictError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let features = self.features(raw)?;
        self.predict_features(&features)
    }

    /// Steps 4–5 on an already aligned vector.
    pub fn predict_features(&self, features: &FeatureVector) -> Result<Prediction, PredictError> {
        let expected = self.bundle.schema().width();
        if features.len() != expected {
            return Err(ModelError::WidthMismatch {
                component: "feature schema",
                expected,
                actual: features.len(),
            }
            .into());
        }

        let scaled = self.bundle.scaler().transform(features.as_slice())?;
        let classifier = self.bundle.classifier();
        let class = classifier.predict(&scaled)?;
        let label = RiskLabel::from_class(class).ok_or(ModelError::UnexpectedLabel(class))?;
        let probability = classifier.probability(&scaled)?;

        debug!(class, ?probability, "prediction complete");
        Ok(Prediction { label, probability })
    }

    /// Steps 1–6: the text to show the user, a risk message or an error message.
    pub fn respond<I, K, V>(&self, raw: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        match self.predict(raw) {
            Ok(label) => label.message().to_string(),
            Err(e) => {
                debug!(error = %e, "prediction failed");
                e.user_message()
            }
        }
    }
}
