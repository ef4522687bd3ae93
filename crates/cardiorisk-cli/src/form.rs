//! Interactive patient form.

use cardiorisk_core::PatientField;
use cardiorisk_model::InferenceAdapter;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};

/// Prompt for every field, show the outcome, and repeat while the user wants to.
pub fn run(adapter: &InferenceAdapter<'_>) -> anyhow::Result<()> {
    let theme = ColorfulTheme::default();

    println!("Enter Patient Information");
    loop {
        let mut raw: Vec<(&'static str, String)> = Vec::with_capacity(PatientField::ALL.len());
        for field in PatientField::ALL {
            let value: String = Input::<String>::with_theme(&theme)
                .with_prompt(field.prompt())
                .allow_empty(true)
                .interact_text()?;
            raw.push((field.key(), value));
        }

        println!();
        println!("{}", adapter.respond(raw));
        println!();

        let again = Confirm::with_theme(&theme)
            .with_prompt("Predict another patient?")
            .default(true)
            .interact()?;
        if !again {
            return Ok(());
        }
    }
}
