use std::path::Path;

use backoffice_core::config::{self, BackofficeConfig};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;

use crate::output::Output;

/// Show current configuration
pub fn show(config: &BackofficeConfig) -> Result<()> {
    let output = Output::new();

    output.section("Current Configuration");
    println!();

    let toml_str = toml::to_string_pretty(config).into_diagnostic()?;
    println!("{}", toml_str);

    Ok(())
}

/// Save current configuration to file
pub async fn save(config: &BackofficeConfig, path: &Path) -> Result<()> {
    let output = Output::new();

    output.status(&format!("Saving configuration to: {}", path.display()));
    config::save_config(config, path).await?;

    output.success("Configuration saved successfully!");
    println!();
    println!("To use this configuration, run:");
    println!(
        "  {} --config {}",
        "backoffice".bright_green(),
        path.display()
    );

    Ok(())
}
