//! Patient input fields and the parsed patient record.
//!
//! A submission arrives as text keyed by field name. Parsing turns it into a
//! [`PatientRecord`] holding one `f64` per field; expansion then replaces the
//! two multi-category fields with `<field>_<value>` indicator columns.

use std::fmt;

use tracing::debug;

use crate::error::ValidationError;

/// Number of recognized input fields.
pub const FIELD_COUNT: usize = 11;

/// One recognized input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatientField {
    Age,
    Gender,
    Height,
    Weight,
    ApHi,
    ApLo,
    Cholesterol,
    Gluc,
    Smoke,
    Alco,
    Active,
}

impl PatientField {
    /// All fields in form order.
    pub const ALL: [PatientField; FIELD_COUNT] = [
        Self::Age,
        Self::Gender,
        Self::Height,
        Self::Weight,
        Self::ApHi,
        Self::ApLo,
        Self::Cholesterol,
        Self::Gluc,
        Self::Smoke,
        Self::Alco,
        Self::Active,
    ];

    /// Fields expanded into indicator columns.
    pub const CATEGORICAL: [PatientField; 2] = [Self::Cholesterol, Self::Gluc];

    /// Key used in raw input maps and stored feature names.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Gender => "gender",
            Self::Height => "height",
            Self::Weight => "weight",
            Self::ApHi => "ap_hi",
            Self::ApLo => "ap_lo",
            Self::Cholesterol => "cholesterol",
            Self::Gluc => "gluc",
            Self::Smoke => "smoke",
            Self::Alco => "alco",
            Self::Active => "active",
        }
    }

    /// Prompt text shown next to the input.
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::Age => "Age (years)",
            Self::Gender => "Gender (1:female, 2:male)",
            Self::Height => "Height (cm)",
            Self::Weight => "Weight (kg)",
            Self::ApHi => "Systolic BP",
            Self::ApLo => "Diastolic BP",
            Self::Cholesterol => "Cholesterol (1:normal, 2:above normal, 3:well above normal)",
            Self::Gluc => "Glucose (1:normal, 2:above normal, 3:well above normal)",
            Self::Smoke => "Smoking (0:no, 1:yes)",
            Self::Alco => "Alcohol intake (0:no, 1:yes)",
            Self::Active => "Physical activity (0:no, 1:yes)",
        }
    }

    pub fn is_categorical(&self) -> bool {
        Self::CATEGORICAL.contains(self)
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.key() == key)
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for PatientField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Name of the indicator column for `field` observed at `value`.
///
/// Integral values print without a fractional part (`cholesterol_2`), anything
/// else prints as a decimal (`cholesterol_2.5`).
pub fn indicator_name(field: PatientField, value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}_{}", field.key(), value as i64)
    } else {
        format!("{}_{}", field.key(), value)
    }
}

/// A fully parsed submission: every field holds a finite number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatientRecord {
    values: [f64; FIELD_COUNT],
}

impl PatientRecord {
    /// Parse raw text values keyed by field name.
    ///
    /// Values are trimmed before parsing. The first field (in form order)
    /// that is missing, empty, non-numeric, or non-finite fails the whole
    /// record. Unrecognized keys are ignored; a repeated key keeps its last value.
    pub fn parse<I, K, V>(raw: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut texts: [Option<String>; FIELD_COUNT] = Default::default();
        for (key, value) in raw {
            match PatientField::from_key(key.as_ref()) {
                Some(field) => texts[field.index()] = Some(value.as_ref().to_string()),
                None => debug!(key = key.as_ref(), "ignoring unrecognized input field"),
            }
        }

        let mut values = [0.0f64; FIELD_COUNT];
        for field in PatientField::ALL {
            let text = texts[field.index()]
                .as_deref()
                .ok_or(ValidationError::Missing(field))?;
            values[field.index()] = parse_value(field, text)?;
        }

        Ok(Self { values })
    }

    pub fn get(&self, field: PatientField) -> f64 {
        self.values[field.index()]
    }

    /// Replace the categorical fields with their observed indicator columns.
    pub fn expand(&self) -> ExpandedRecord {
        let mut columns: Vec<(String, f64)> = PatientField::ALL
            .iter()
            .filter(|f| !f.is_categorical())
            .map(|f| (f.key().to_string(), self.get(*f)))
            .collect();

        for field in PatientField::CATEGORICAL {
            columns.push((indicator_name(field, self.get(field)), 1.0));
        }

        ExpandedRecord { columns }
    }
}

fn parse_value(field: PatientField, text: &str) -> Result<f64, ValidationError> {
    let trimmed = text.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| ValidationError::NotNumeric {
            field,
            raw: text.to_string(),
        })?;
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field,
            raw: text.to_string(),
        });
    }
    Ok(value)
}

/// Named columns after categorical expansion, before schema alignment.
///
/// Holds the plain numeric fields followed by one indicator per categorical
/// field. Sibling indicators are absent, not zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedRecord {
    columns: Vec<(String, f64)>,
}

impl ExpandedRecord {
    pub fn columns(&self) -> &[(String, f64)] {
        &self.columns
    }

    /// Indicator columns, one per categorical field.
    pub fn indicators(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(|(name, _)| name.as_str())
            .filter(|name| PatientField::from_key(name).is_none())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn scenario_a() -> Vec<(&'static str, &'static str)> {
        vec![
            ("age", "50"),
            ("gender", "2"),
            ("height", "170"),
            ("weight", "80"),
            ("ap_hi", "140"),
            ("ap_lo", "90"),
            ("cholesterol", "2"),
            ("gluc", "1"),
            ("smoke", "0"),
            ("alco", "0"),
            ("active", "1"),
        ]
    }

    fn with(field: &str, value: &'static str) -> Vec<(&'static str, &'static str)> {
        scenario_a()
            .into_iter()
            .map(|(k, v)| if k == field { (k, value) } else { (k, v) })
            .collect()
    }

    fn column(expanded: &ExpandedRecord, name: &str) -> Option<f64> {
        expanded
            .columns()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    #[test]
    fn parses_all_fields() {
        let record = PatientRecord::parse(scenario_a()).unwrap();
        assert_eq!(record.get(PatientField::Age), 50.0);
        assert_eq!(record.get(PatientField::ApHi), 140.0);
        assert_eq!(record.get(PatientField::Cholesterol), 2.0);
        assert_eq!(record.get(PatientField::Active), 1.0);
    }

    #[test]
    fn trims_whitespace_and_accepts_decimals() {
        let record = PatientRecord::parse(with("weight", "  80.5 ")).unwrap();
        assert_eq!(record.get(PatientField::Weight), 80.5);
    }

    #[test]
    fn rejects_non_numeric() {
        let err = PatientRecord::parse(with("age", "fifty")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotNumeric {
                field: PatientField::Age,
                raw: "fifty".into()
            }
        );
    }

    #[test]
    fn rejects_empty_and_non_finite() {
        let err = PatientRecord::parse(with("height", "")).unwrap_err();
        assert_eq!(err.field(), PatientField::Height);

        let err = PatientRecord::parse(with("ap_lo", "NaN")).unwrap_err();
        assert!(matches!(err, ValidationError::NotFinite { field: PatientField::ApLo, .. }));

        let err = PatientRecord::parse(with("gluc", "inf")).unwrap_err();
        assert!(matches!(err, ValidationError::NotFinite { field: PatientField::Gluc, .. }));
    }

    #[test]
    fn missing_field_is_a_validation_error() {
        let raw: Vec<_> = scenario_a().into_iter().filter(|(k, _)| *k != "alco").collect();
        let err = PatientRecord::parse(raw).unwrap_err();
        assert_eq!(err, ValidationError::Missing(PatientField::Alco));
    }

    #[test]
    fn first_bad_field_in_form_order_is_reported() {
        let mut raw = with("smoke", "x");
        raw.push(("gender", "y"));
        let err = PatientRecord::parse(raw).unwrap_err();
        assert_eq!(err.field(), PatientField::Gender);
    }

    #[test]
    fn ignores_unknown_keys() {
        let mut raw = scenario_a();
        raw.push(("id", "not-a-number"));
        assert!(PatientRecord::parse(raw).is_ok());
    }

    #[test]
    fn expand_replaces_categoricals_with_indicators() {
        let record = PatientRecord::parse(scenario_a()).unwrap();
        let expanded = record.expand();

        assert_eq!(expanded.columns().len(), 11);
        assert_eq!(column(&expanded, "cholesterol_2"), Some(1.0));
        assert_eq!(column(&expanded, "gluc_1"), Some(1.0));
        assert_eq!(column(&expanded, "cholesterol"), None);
        assert_eq!(column(&expanded, "cholesterol_1"), None);
        assert_eq!(column(&expanded, "age"), Some(50.0));
        assert_eq!(expanded.indicators().collect::<Vec<_>>(), ["cholesterol_2", "gluc_1"]);

        // Indicators come after the plain fields.
        let names: Vec<&str> = expanded.columns().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(&names[names.len() - 2..], &["cholesterol_2", "gluc_1"]);
    }

    #[test]
    fn indicator_names() {
        assert_eq!(indicator_name(PatientField::Cholesterol, 3.0), "cholesterol_3");
        assert_eq!(indicator_name(PatientField::Gluc, 2.5), "gluc_2.5");
        assert_eq!(indicator_name(PatientField::Gluc, -1.0), "gluc_-1");
    }

    #[test]
    fn field_keys_round_trip() {
        for field in PatientField::ALL {
            assert_eq!(PatientField::from_key(field.key()), Some(field));
        }
        assert_eq!(PatientField::from_key("cardio"), None);
    }
}
