//! Import command handler.
//!
//! Reconstructs a fabric spec from a persisted layout and reports it
//! together with the capacity validation.

use super::exit_codes;
use super::output::{should_use_color, write_output, OutputTarget};
use crate::config::AppConfig;
use crate::import::Importer;
use crate::reports::{create_reporter_with_options, ReportFormat};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Inputs of the `import` subcommand.
#[derive(Debug, Clone)]
pub struct ImportCommand {
    /// Layout directory (legacy or manifest)
    pub path: PathBuf,
    pub format: ReportFormat,
    pub output_file: Option<PathBuf>,
    /// Also write the reconstructed spec as YAML to this path
    pub spec_file: Option<PathBuf>,
    pub no_color: bool,
    pub quiet: bool,
}

/// Run the import command, returning the desired exit code.
pub fn run_import(command: &ImportCommand, config: &AppConfig) -> Result<i32> {
    let importer = Importer::new().with_validator(config.import.validator());
    let result = importer
        .import(&command.path)
        .with_context(|| format!("importing {}", command.path.display()))?;

    if let Some(spec_file) = &command.spec_file {
        let yaml = serde_yaml::to_string(&result.fabric_spec).context("serializing fabric spec")?;
        std::fs::write(spec_file, yaml)
            .with_context(|| format!("writing {}", spec_file.display()))?;
        if !command.quiet {
            tracing::info!("Fabric spec written to {}", spec_file.display());
        }
    }

    let target = OutputTarget::from_option(command.output_file.clone());
    let reporter =
        create_reporter_with_options(command.format, should_use_color(command.no_color, &target));
    let report = reporter.generate_import_report(&result)?;
    write_output(&report, &target, command.quiet)?;

    Ok(if result.validation.is_valid {
        exit_codes::SUCCESS
    } else {
        exit_codes::DRIFT_OR_INVALID
    })
}
