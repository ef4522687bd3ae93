//! Feature scalers fitted during training.
//!
//! Parameters are exported from the training run as JSON, tagged by `kind`.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Maps raw feature values to the scale the classifier was trained on.
pub trait Scaler {
    /// Short name for display and logs.
    fn kind(&self) -> &'static str;

    /// Number of features the scaler was fitted on, if it constrains width.
    fn width(&self) -> Option<usize>;

    /// Transform one feature vector. Output has the same width as input.
    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// Serialized scaler parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerSpec {
    Standard(StandardScaler),
    MinMax(MinMaxScaler),
}

impl ScalerSpec {
    /// Check internal consistency of the parameter arrays.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::Standard(s) => {
                if let (Some(mean), Some(scale)) = (&s.mean, &s.scale)
                    && mean.len() != scale.len()
                {
                    return Err(ModelError::Other(format!(
                        "standard scaler has {} means but {} scales",
                        mean.len(),
                        scale.len()
                    )));
                }
            }
            Self::MinMax(s) => {
                if s.min.len() != s.scale.len() {
                    return Err(ModelError::Other(format!(
                        "min_max scaler has {} mins but {} scales",
                        s.min.len(),
                        s.scale.len()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Scaler for ScalerSpec {
    fn kind(&self) -> &'static str {
        match self {
            Self::Standard(s) => s.kind(),
            Self::MinMax(s) => s.kind(),
        }
    }

    fn width(&self) -> Option<usize> {
        match self {
            Self::Standard(s) => s.width(),
            Self::MinMax(s) => s.width(),
        }
    }

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        match self {
            Self::Standard(s) => s.transform(features),
            Self::MinMax(s) => s.transform(features),
        }
    }
}

/// Standardization: `(x - mean) / scale`.
///
/// A missing `mean` skips centering, a missing `scale` skips scaling. A zero
/// scale entry (constant training column) divides by 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
}

impl Scaler for StandardScaler {
    fn kind(&self) -> &'static str {
        "standard"
    }

    fn width(&self) -> Option<usize> {
        self.mean
            .as_ref()
            .or(self.scale.as_ref())
            .map(|v| v.len())
    }

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_width(self.width(), features.len())?;

        Ok(features
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let mean = self.mean.as_ref().and_then(|m| m.get(i)).copied();
                let scale = self.scale.as_ref().and_then(|s| s.get(i)).copied();
                let centered = x - mean.unwrap_or(0.0);
                match scale {
                    Some(s) if s != 0.0 => centered / s,
                    _ => centered,
                }
            })
            .collect())
    }
}

/// Min-max scaling as exported from the fitted `min_` and `scale_`: `x * scale + min`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub min: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler for MinMaxScaler {
    fn kind(&self) -> &'static str {
        "min_max"
    }

    fn width(&self) -> Option<usize> {
        Some(self.min.len())
    }

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_width(self.width(), features.len())?;

        Ok(features
            .iter()
            .zip(self.scale.iter().zip(&self.min))
            .map(|(&x, (&scale, &min))| x * scale + min)
            .collect())
    }
}

fn check_width(expected: Option<usize>, actual: usize) -> Result<(), ModelError> {
    match expected {
        Some(expected) if expected != actual => Err(ModelError::WidthMismatch {
            component: "scaler",
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-12, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn standard_centers_and_scales() {
        let scaler = StandardScaler {
            mean: Some(vec![50.0, 120.0]),
            scale: Some(vec![10.0, 20.0]),
        };
        let out = scaler.transform(&[60.0, 100.0]).unwrap();
        assert_close(&out, &[1.0, -1.0]);
    }

    #[test]
    fn standard_zero_scale_divides_by_one() {
        let scaler = StandardScaler {
            mean: Some(vec![1.0, 1.0]),
            scale: Some(vec![0.0, 2.0]),
        };
        let out = scaler.transform(&[3.0, 3.0]).unwrap();
        assert_close(&out, &[2.0, 1.0]);
    }

    #[test]
    fn standard_without_mean_only_scales() {
        let scaler = StandardScaler {
            mean: None,
            scale: Some(vec![2.0]),
        };
        assert_close(&scaler.transform(&[3.0]).unwrap(), &[1.5]);
        assert_eq!(scaler.width(), Some(1));
    }

    #[test]
    fn min_max_applies_fitted_parameters() {
        // Fitted on [0, 10]: scale = 0.1, min = 0.
        let scaler = MinMaxScaler {
            min: vec![0.0, -1.0],
            scale: vec![0.1, 0.5],
        };
        let out = scaler.transform(&[5.0, 4.0]).unwrap();
        assert_close(&out, &[0.5, 1.0]);
    }

    #[test]
    fn width_mismatch_is_an_error() {
        let scaler = StandardScaler {
            mean: Some(vec![0.0; 3]),
            scale: Some(vec![1.0; 3]),
        };
        let err = scaler.transform(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::WidthMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn deserializes_tagged_json() {
        let spec: ScalerSpec =
            serde_json::from_str(r#"{"kind":"standard","mean":[1.0],"scale":[2.0]}"#).unwrap();
        assert_eq!(spec.kind(), "standard");
        assert_eq!(spec.width(), Some(1));

        let spec: ScalerSpec =
            serde_json::from_str(r#"{"kind":"min_max","min":[0.0,0.0],"scale":[1.0,1.0]}"#)
                .unwrap();
        assert_eq!(spec.kind(), "min_max");
        assert_eq!(spec.width(), Some(2));
    }

    #[test]
    fn validate_rejects_ragged_parameters() {
        let spec = ScalerSpec::Standard(StandardScaler {
            mean: Some(vec![0.0, 0.0]),
            scale: Some(vec![1.0]),
        });
        assert!(spec.validate().is_err());
    }
}
