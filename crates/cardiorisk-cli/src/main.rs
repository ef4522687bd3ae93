mod display;
mod form;

use std::path::PathBuf;

use anyhow::Context;
use cardiorisk_core::PatientField;
use cardiorisk_model::{InferenceAdapter, ModelBundle, ScoreOptions};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cardiorisk", version, about = "Cardiovascular disease risk predictor")]
struct Cli {
    /// Directory holding feature_names.json, cardio_scaler.json and cardio_model.json.
    #[arg(long, env = "CARDIORISK_MODEL_DIR", default_value = "models", global = true)]
    model_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prompt for patient information and show the predicted risk.
    Form,
    /// Predict from command-line values.
    Predict(PatientArgs),
    /// Score every row of a delimited file.
    Score {
        /// Input file with a header row naming the patient fields.
        input: PathBuf,
        /// Field delimiter (the public cardio dataset uses ';').
        #[arg(long, default_value_t = ',')]
        delimiter: char,
        /// Write scored rows to this CSV file instead of printing them.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show the loaded bundle and its feature columns.
    Inspect,
}

/// Raw patient values; parsed by the adapter, not by clap.
#[derive(Args)]
struct PatientArgs {
    #[arg(long, allow_hyphen_values = true)]
    age: String,
    #[arg(long, allow_hyphen_values = true)]
    gender: String,
    #[arg(long, allow_hyphen_values = true)]
    height: String,
    #[arg(long, allow_hyphen_values = true)]
    weight: String,
    #[arg(long = "ap-hi", alias = "ap_hi", allow_hyphen_values = true)]
    ap_hi: String,
    #[arg(long = "ap-lo", alias = "ap_lo", allow_hyphen_values = true)]
    ap_lo: String,
    #[arg(long, allow_hyphen_values = true)]
    cholesterol: String,
    #[arg(long, allow_hyphen_values = true)]
    gluc: String,
    #[arg(long, allow_hyphen_values = true)]
    smoke: String,
    #[arg(long, allow_hyphen_values = true)]
    alco: String,
    #[arg(long, allow_hyphen_values = true)]
    active: String,
    /// Also print the positive-class probability when the classifier has one.
    #[arg(long)]
    probability: bool,
}

impl PatientArgs {
    fn raw(&self) -> Vec<(&'static str, &str)> {
        PatientField::ALL
            .iter()
            .map(|field| {
                let value = match field {
                    PatientField::Age => &self.age,
                    PatientField::Gender => &self.gender,
                    PatientField::Height => &self.height,
                    PatientField::Weight => &self.weight,
                    PatientField::ApHi => &self.ap_hi,
                    PatientField::ApLo => &self.ap_lo,
                    PatientField::Cholesterol => &self.cholesterol,
                    PatientField::Gluc => &self.gluc,
                    PatientField::Smoke => &self.smoke,
                    PatientField::Alco => &self.alco,
                    PatientField::Active => &self.active,
                };
                (field.key(), value.as_str())
            })
            .collect()
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("cardiorisk v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    let bundle = ModelBundle::load(&cli.model_dir)
        .with_context(|| format!("loading model bundle from {}", cli.model_dir.display()))?;
    let adapter = InferenceAdapter::new(&bundle);

    match cli.command {
        Command::Form => form::run(&adapter)?,
        Command::Predict(args) if args.probability => {
            display::print_prediction(&adapter.predict_detailed(args.raw()))
        }
        Command::Predict(args) => println!("{}", adapter.respond(args.raw())),
        Command::Score {
            input,
            delimiter,
            output,
        } => {
            anyhow::ensure!(delimiter.is_ascii(), "delimiter must be a single ASCII character");
            let options = ScoreOptions {
                delimiter: delimiter as u8,
                ..Default::default()
            };
            let (batches, summary) = cardiorisk_model::score_csv(&adapter, &input, options)
                .with_context(|| format!("scoring {}", input.display()))?;

            match output {
                Some(path) => {
                    cardiorisk_model::write_csv(&path, &batches)
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!("  Wrote {} rows to {}", summary.rows, path.display());
                }
                None => display::print_batches(&batches)?,
            }
            display::print_summary(&summary);
        }
        Command::Inspect => display::print_bundle(&bundle),
    }

    Ok(())
}
