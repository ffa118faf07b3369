//! Diff command handler.
//!
//! Compares two resource sets, either structurally or with breaking vs.
//! cosmetic classification.

use super::exit_codes;
use super::output::{should_use_color, write_output, OutputTarget};
use super::resources::load_resources;
use crate::config::AppConfig;
use crate::reports::{create_reporter_with_options, ReportFormat, ReportMetadata};
use anyhow::Result;
use std::path::PathBuf;

/// Inputs of the `diff` subcommand.
#[derive(Debug, Clone)]
pub struct DiffCommand {
    /// Expected side: a layout directory or a manifest file
    pub baseline: PathBuf,
    /// Compared side: a layout directory or a manifest file
    pub compared: PathBuf,
    /// Classify differences and fail only on breaking ones
    pub classify: bool,
    pub format: ReportFormat,
    pub output_file: Option<PathBuf>,
    pub no_color: bool,
    pub quiet: bool,
}

/// Run the diff command, returning the desired exit code.
pub fn run_diff(command: &DiffCommand, config: &AppConfig) -> Result<i32> {
    let codec = config.codec.manifest_codec();
    let baseline = load_resources(&command.baseline, &codec)?;
    let compared = load_resources(&command.compared, &codec)?;

    if !command.quiet {
        tracing::info!(
            "Loaded {} baseline and {} compared resources",
            baseline.len(),
            compared.len()
        );
    }

    let metadata = ReportMetadata::new(
        command.baseline.display().to_string(),
        command.compared.display().to_string(),
    );
    let target = OutputTarget::from_option(command.output_file.clone());
    let reporter =
        create_reporter_with_options(command.format, should_use_color(command.no_color, &target));

    let (report, clean) = if command.classify {
        let classification = config.classifier().classify(&baseline, &compared);
        let report = reporter.generate_classification_report(&classification, &metadata)?;
        (report, classification.is_valid)
    } else {
        let diff = config.diff_engine().compare(&baseline, &compared);
        let report = reporter.generate_diff_report(&diff, &metadata)?;
        (report, diff.is_empty())
    };
    write_output(&report, &target, command.quiet)?;

    Ok(if clean {
        exit_codes::SUCCESS
    } else {
        exit_codes::DRIFT_OR_INVALID
    })
}
