//! Feature schema resolved from a model's stored column list.
//!
//! The stored list names every column the classifier was trained on, in
//! order. Each name is bound once, at load time, to where its value comes
//! from: a plain patient field, one category of a categorical field, or
//! nothing (always zero). Alignment then walks the bindings by position.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::SchemaError;
use crate::patient::{PatientField, PatientRecord};

/// Where a feature column gets its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnSource {
    /// The raw value of a non-categorical field.
    Field(PatientField),
    /// 1 when the categorical field equals `category`, else 0.
    Indicator {
        field: PatientField,
        category: f64,
    },
    /// Not produced by expansion; always 0.
    Absent,
}

/// One stored column: its name, position, and resolved source.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub position: usize,
    pub source: ColumnSource,
}

/// Ordered column layout the classifier expects.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    columns: Vec<ColumnSpec>,
}

impl FeatureSchema {
    /// Resolve the stored feature names into column bindings.
    pub fn resolve<S: AsRef<str>>(names: &[S]) -> Result<Self, SchemaError> {
        if names.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(names.len());
        let mut columns = Vec::with_capacity(names.len());

        for (position, name) in names.iter().enumerate() {
            let name = name.as_ref();
            if let Some(&first) = seen.get(name) {
                return Err(SchemaError::DuplicateColumn {
                    name: name.to_string(),
                    first,
                    second: position,
                });
            }
            seen.insert(name, position);

            let source = bind_column(name);
            if source == ColumnSource::Absent {
                warn!(column = name, position, "feature column has no input source; it will always be 0");
            }

            columns.push(ColumnSpec {
                name: name.to_string(),
                position,
                source,
            });
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Number of feature columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Build the ordered feature vector for a parsed record.
    ///
    /// Indicators for the observed categories that the schema does not carry
    /// are dropped and reported back.
    pub fn align(&self, record: &PatientRecord) -> Alignment {
        let values = self
            .columns
            .iter()
            .map(|col| match col.source {
                ColumnSource::Field(field) => record.get(field),
                ColumnSource::Indicator { field, category } => {
                    if record.get(field) == category {
                        1.0
                    } else {
                        0.0
                    }
                }
                ColumnSource::Absent => 0.0,
            })
            .collect();

        let dropped: Vec<String> = record
            .expand()
            .indicators()
            .filter(|name| !self.carries(name))
            .map(str::to_string)
            .collect();

        for name in &dropped {
            debug!(column = %name, "observed category has no trained column; all its indicators are 0");
        }

        Alignment {
            features: FeatureVector(values),
            dropped,
        }
    }

    /// Whether an expanded indicator column has a stored counterpart.
    ///
    /// Matches by bound category, so `gluc_2` is carried by a stored `gluc_2.0`.
    fn carries(&self, indicator: &str) -> bool {
        let ColumnSource::Indicator { field, category } = bind_column(indicator) else {
            return false;
        };
        self.columns.iter().any(|col| {
            matches!(col.source, ColumnSource::Indicator { field: f, category: c } if f == field && c == category)
        })
    }
}

/// Bind one stored column name to its input source.
fn bind_column(name: &str) -> ColumnSource {
    if let Some(field) = PatientField::from_key(name) {
        // Expansion removes the raw categorical column.
        return if field.is_categorical() {
            ColumnSource::Absent
        } else {
            ColumnSource::Field(field)
        };
    }

    for field in PatientField::CATEGORICAL {
        let Some(suffix) = name
            .strip_prefix(field.key())
            .and_then(|rest| rest.strip_prefix('_'))
        else {
            continue;
        };
        if let Ok(category) = suffix.parse::<f64>()
            && category.is_finite()
        {
            return ColumnSource::Indicator { field, category };
        }
    }

    ColumnSource::Absent
}

/// Result of aligning a record to a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub features: FeatureVector,
    /// Expanded indicator columns with no matching stored column.
    pub dropped: Vec<String>,
}

/// Ordered numeric vector matching a [`FeatureSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}
