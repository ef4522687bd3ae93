//! Batch scoring of delimited patient files.
//!
//! Every column is read as text so each row goes through the same parsing
//! and validation as a single form submission. Row failures are recorded in
//! the output, never fatal to the batch. Rows with fewer cells than the header
//! read the missing cells as null and fail validation.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Builder, StringArray, StringBuilder};
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, Writer};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use cardiorisk_core::{PatientField, RiskLabel};
use tracing::{info, warn};

use crate::adapter::InferenceAdapter;
use crate::error::ModelError;

pub const RISK_COLUMN: &str = "risk";
pub const PROBABILITY_COLUMN: &str = "probability";
pub const ERROR_COLUMN: &str = "error";

#[derive(Debug, Clone, Copy)]
pub struct ScoreOptions {
    pub delimiter: u8,
    pub batch_size: usize,
}

impl Default for ScoreOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            batch_size: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreSummary {
    pub rows: usize,
    pub high: usize,
    pub low: usize,
    pub failed: usize,
}

/// Score every row of a delimited file with a header row.
///
/// Returns the input columns plus `risk` (label message, null on failure),
/// `probability` (positive-class probability, null when failed or when the
/// classifier has none) and `error` (user-facing message, null on success).
pub fn score_csv(
    adapter: &InferenceAdapter<'_>,
    path: &Path,
    options: ScoreOptions,
) -> Result<(Vec<RecordBatch>, ScoreSummary), ModelError> {
    if !path.exists() {
        return Err(ModelError::ArtifactNotFound(path.to_path_buf()));
    }

    let format = Format::default()
        .with_header(true)
        .with_delimiter(options.delimiter)
        .with_truncated_rows(true);
    let (inferred, _) = format.infer_schema(File::open(path)?, Some(1))?;

    // Read everything as text.
    let text_schema: SchemaRef = Arc::new(Schema::new(
        inferred
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));

    let present: Vec<PatientField> = PatientField::ALL
        .iter()
        .copied()
        .filter(|f| text_schema.index_of(f.key()).is_ok())
        .collect();
    if present.is_empty() {
        return Err(ModelError::Other(format!(
            "{} has no patient field columns",
            path.display()
        )));
    }
    if present.len() < PatientField::ALL.len() {
        warn!(
            path = %path.display(),
            found = present.len(),
            "input is missing patient field columns; affected rows will fail validation"
        );
    }

    let reader = ReaderBuilder::new(text_schema.clone())
        .with_header(true)
        .with_delimiter(options.delimiter)
        .with_batch_size(options.batch_size)
        .with_truncated_rows(true)
        .build(File::open(path)?)?;

    let output_schema = scored_schema(&text_schema);
    let mut summary = ScoreSummary::default();
    let mut batches = Vec::new();

    for batch in reader {
        let batch = batch?;
        batches.push(score_batch(adapter, &batch, &present, &output_schema, &mut summary)?);
    }

    info!(
        path = %path.display(),
        rows = summary.rows,
        high = summary.high,
        low = summary.low,
        failed = summary.failed,
        "scored batch file"
    );
    Ok((batches, summary))
}

fn scored_schema(input: &Schema) -> SchemaRef {
    let mut fields: Vec<Field> = input.fields().iter().map(|f| f.as_ref().clone()).collect();
    fields.push(Field::new(RISK_COLUMN, DataType::Utf8, true));
    fields.push(Field::new(PROBABILITY_COLUMN, DataType::Float64, true));
    fields.push(Field::new(ERROR_COLUMN, DataType::Utf8, true));
    Arc::new(Schema::new(fields))
}

fn score_batch(
    adapter: &InferenceAdapter<'_>,
    batch: &RecordBatch,
    present: &[PatientField],
    output_schema: &SchemaRef,
    summary: &mut ScoreSummary,
) -> Result<RecordBatch, ModelError> {
    let mut field_columns: Vec<(PatientField, &StringArray)> = Vec::with_capacity(present.len());
    for &field in present {
        let col = batch
            .column_by_name(field.key())
            .and_then(|c| c.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| ModelError::Other(format!("column '{field}' is not text")))?;
        field_columns.push((field, col));
    }

    let mut risk = StringBuilder::new();
    let mut probability = Float64Builder::new();
    let mut error = StringBuilder::new();

    for row in 0..batch.num_rows() {
        let raw = field_columns
            .iter()
            .filter(|(_, col)| !col.is_null(row))
            .map(|(field, col)| (field.key(), col.value(row)));

        match adapter.predict_detailed(raw) {
            Ok(prediction) => {
                match prediction.label {
                    RiskLabel::High => summary.high += 1,
                    RiskLabel::Low => summary.low += 1,
                }
                risk.append_value(prediction.label.message());
                probability.append_option(prediction.probability);
                error.append_null();
            }
            Err(e) => {
                summary.failed += 1;
                risk.append_null();
                probability.append_null();
                error.append_value(e.user_message());
            }
        }
        summary.rows += 1;
    }

    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    columns.push(Arc::new(risk.finish()));
    columns.push(Arc::new(probability.finish()));
    columns.push(Arc::new(error.finish()));
    Ok(RecordBatch::try_new(output_schema.clone(), columns)?)
}

/// Write scored batches as CSV with a header row.
pub fn write_csv(path: &Path, batches: &[RecordBatch]) -> Result<(), ModelError> {
    let mut writer = Writer::new(File::create(path)?);
    for batch in batches {
        writer.write(batch)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::ModelBundle;
    use crate::bundle::tests::{NAMES, logistic, scaler};
    use arrow::array::Float64Array;
    use std::fs;
    use tempfile::TempDir;

    fn bundle() -> ModelBundle {
        ModelBundle::from_parts(&NAMES, Box::new(scaler()), Box::new(logistic())).unwrap()
    }

    fn risk_values(batches: &[RecordBatch], column: &str) -> Vec<Option<String>> {
        let mut out = Vec::new();
        for batch in batches {
            let col = batch
                .column_by_name(column)
                .unwrap()
                .as_any()
                .downcast_ref::<StringArray>()
                .unwrap();
            for i in 0..col.len() {
                out.push((!col.is_null(i)).then(|| col.value(i).to_string()));
            }
        }
        out
    }

    #[test]
    fn scores_semicolon_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("patients.csv");
        fs::write(
            &path,
            "id;age;gender;height;weight;ap_hi;ap_lo;cholesterol;gluc;smoke;alco;active;cardio\n\
             0;30;2;168;62;110;80;1;1;0;0;1;0\n\
             1;64;1;156;85;180;90;3;1;0;0;1;1\n\
             2;fifty;1;165;64;130;70;3;1;0;0;0;1\n",
        )
        .unwrap();

        let bundle = bundle();
        let adapter = InferenceAdapter::new(&bundle);
        let options = ScoreOptions {
            delimiter: b';',
            ..Default::default()
        };
        let (batches, summary) = score_csv(&adapter, &path, options).unwrap();

        assert_eq!(
            summary,
            ScoreSummary {
                rows: 3,
                high: 1,
                low: 1,
                failed: 1
            }
        );

        let risk = risk_values(&batches, RISK_COLUMN);
        assert_eq!(risk[0].as_deref(), Some("Low risk of cardiovascular disease"));
        assert_eq!(risk[1].as_deref(), Some("High risk of cardiovascular disease"));
        assert_eq!(risk[2], None);

        let errors = risk_values(&batches, ERROR_COLUMN);
        assert_eq!(errors[2].as_deref(), Some("Please enter valid numeric values"));
        assert_eq!(errors[0], None);

        // Input columns are carried through untouched.
        assert!(batches[0].column_by_name("cardio").is_some());
        assert_eq!(batches[0].num_columns(), 13 + 3);

        let probability = batches[0]
            .column_by_name(PROBABILITY_COLUMN)
            .unwrap()
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert!(probability.value(0) < 0.5);
        assert!(probability.value(1) > 0.5);
        assert!(probability.is_null(2));
    }

    #[test]
    fn missing_column_fails_rows_not_batch() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("partial.csv");
        fs::write(
            &path,
            "age,gender,height,weight,ap_hi,ap_lo,cholesterol,gluc,smoke,alco\n\
             50,2,170,80,140,90,2,1,0,0\n",
        )
        .unwrap();

        let bundle = bundle();
        let adapter = InferenceAdapter::new(&bundle);
        let (_, summary) = score_csv(&adapter, &path, ScoreOptions::default()).unwrap();
        assert_eq!(summary.rows, 1);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn short_row_fails_alone() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ragged.csv");
        fs::write(
            &path,
            "age,gender,height,weight,ap_hi,ap_lo,cholesterol,gluc,smoke,alco,active\n\
             30,2,168,62,110,80,1,1,0,0,1\n\
             50,2,170\n\
             64,1,156,85,180,90,3,1,0,0,1\n",
        )
        .unwrap();

        let bundle = bundle();
        let adapter = InferenceAdapter::new(&bundle);
        let (batches, summary) = score_csv(&adapter, &path, ScoreOptions::default()).unwrap();

        assert_eq!(
            summary,
            ScoreSummary {
                rows: 3,
                high: 1,
                low: 1,
                failed: 1
            }
        );
        let errors = risk_values(&batches, ERROR_COLUMN);
        assert_eq!(errors[1].as_deref(), Some("Please enter valid numeric values"));
        assert_eq!(errors[0], None);
        assert_eq!(errors[2], None);
    }

    #[test]
    fn file_without_patient_columns_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("other.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();

        let bundle = bundle();
        let adapter = InferenceAdapter::new(&bundle);
        assert!(score_csv(&adapter, &path, ScoreOptions::default()).is_err());
    }

    #[test]
    fn writes_scored_csv() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in.csv");
        fs::write(
            &input,
            "age,gender,height,weight,ap_hi,ap_lo,cholesterol,gluc,smoke,alco,active\n\
             50,2,170,80,140,90,2,1,0,0,1\n",
        )
        .unwrap();

        let bundle = bundle();
        let adapter = InferenceAdapter::new(&bundle);
        let (batches, _) = score_csv(&adapter, &input, ScoreOptions::default()).unwrap();

        let output = tmp.path().join("out.csv");
        write_csv(&output, &batches).unwrap();
        let text = fs::read_to_string(&output).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().ends_with("risk,probability,error"));
        assert!(lines.next().unwrap().contains("risk of cardiovascular disease"));
    }
}
