//! Terminal output for bundles and batch results.

use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use cardiorisk_model::{ModelBundle, PredictError, Prediction, ScoreSummary};

pub fn print_bundle(bundle: &ModelBundle) {
    for line in bundle.describe() {
        println!("{line}");
    }
}

pub fn print_prediction(result: &Result<Prediction, PredictError>) {
    match result {
        Ok(prediction) => {
            println!("{}", prediction.label.message());
            match prediction.probability {
                Some(p) => println!("Probability: {p:.3}"),
                None => println!("Probability: not available for this classifier"),
            }
        }
        Err(e) => println!("{}", e.user_message()),
    }
}

pub fn print_batches(batches: &[RecordBatch]) -> anyhow::Result<()> {
    if batches.iter().all(|b| b.num_rows() == 0) {
        println!("(no rows)");
        return Ok(());
    }
    println!("{}", pretty_format_batches(batches)?);
    Ok(())
}

pub fn print_summary(summary: &ScoreSummary) {
    eprintln!(
        "  {} rows: {} high risk, {} low risk, {} failed",
        summary.rows, summary.high, summary.low, summary.failed
    );
}
