//! Report type definitions.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Compact human-readable summary
    #[default]
    Summary,
    /// Structured JSON output
    Json,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Summary => write!(f, "summary"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Identifies what a report was generated from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    /// Baseline side (expected resources, or the older layout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<String>,
    /// Compared side (live cluster, or the newer layout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compared: Option<String>,
}

impl ReportMetadata {
    #[must_use]
    pub fn new(baseline: impl Into<String>, compared: impl Into<String>) -> Self {
        Self {
            baseline: Some(baseline.into()),
            compared: Some(compared.into()),
        }
    }
}
