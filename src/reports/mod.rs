//! Report generation for import, diff and reconciliation results.
//!
//! - Summary: compact shell-friendly output
//! - JSON: structured data for programmatic integration

mod json;
mod summary;
mod types;

pub use json::JsonReporter;
pub use summary::SummaryReporter;
pub use types::{ReportFormat, ReportMetadata};

use crate::diff::{Classification, ResourceDiff};
use crate::import::ImportResult;
use crate::reconcile::{PollOutcome, RunScope};
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during report generation
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Format error: {0}")]
    FormatError(#[from] std::fmt::Error),
}

/// Trait for report generators
pub trait ReportGenerator {
    /// Report on an imported fabric spec and its validation
    fn generate_import_report(&self, result: &ImportResult) -> Result<String, ReportError>;

    /// Report on a raw structural diff
    fn generate_diff_report(
        &self,
        diff: &ResourceDiff,
        metadata: &ReportMetadata,
    ) -> Result<String, ReportError>;

    /// Report on a classified comparison
    fn generate_classification_report(
        &self,
        classification: &Classification,
        metadata: &ReportMetadata,
    ) -> Result<String, ReportError>;

    /// Report on a finished reconciliation poll
    fn generate_poll_report(
        &self,
        outcome: &PollOutcome,
        scope: &RunScope,
    ) -> Result<String, ReportError>;

    /// Get the format this generator produces
    fn format(&self) -> ReportFormat;
}

/// Write a generated report followed by a newline when it lacks one.
pub fn write_report(report: &str, writer: &mut dyn Write) -> Result<(), ReportError> {
    writer.write_all(report.as_bytes())?;
    if !report.ends_with('\n') {
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Create a report generator for the given format
#[must_use]
pub fn create_reporter(format: ReportFormat) -> Box<dyn ReportGenerator> {
    create_reporter_with_options(format, true)
}

/// Create a report generator with color control
#[must_use]
pub fn create_reporter_with_options(format: ReportFormat, colored: bool) -> Box<dyn ReportGenerator> {
    match format {
        ReportFormat::Summary => {
            let reporter = SummaryReporter::new();
            if colored {
                Box::new(reporter)
            } else {
                Box::new(reporter.no_color())
            }
        }
        ReportFormat::Json => Box::new(JsonReporter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_formats() {
        for format in [ReportFormat::Summary, ReportFormat::Json] {
            assert_eq!(create_reporter(format).format(), format);
        }
    }

    #[test]
    fn test_write_report_terminates_line() {
        let mut out = Vec::new();
        write_report("ok", &mut out).unwrap();
        write_report("done\n", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ok\ndone\n");
    }
}
