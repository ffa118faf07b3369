//! Provenance attached to imported specs.

use crate::model::TopologyType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Source tag recorded for imported specs.
pub const IMPORT_SOURCE: &str = "import";

/// Shape of the fabric as observed in the persisted files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPatterns {
    pub topology_type: TopologyType,
    pub spine_count: usize,
    pub leaf_count: usize,
    pub server_types: BTreeSet<String>,
    pub uplink_counts: BTreeSet<u32>,
}

/// How a spec was derived.
///
/// Only a [`ProvenanceBuilder`] can add entries, and it is consumed by
/// [`ProvenanceBuilder::finish`], so a finished provenance is never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    source: String,
    original_path: String,
    imported_at: DateTime<Utc>,
    detected_patterns: DetectedPatterns,
    assumptions: Vec<String>,
    warnings: Vec<String>,
}

impl Provenance {
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn original_path(&self) -> &str {
        &self.original_path
    }

    #[must_use]
    pub fn imported_at(&self) -> DateTime<Utc> {
        self.imported_at
    }

    #[must_use]
    pub fn detected_patterns(&self) -> &DetectedPatterns {
        &self.detected_patterns
    }

    #[must_use]
    pub fn assumptions(&self) -> &[String] {
        &self.assumptions
    }

    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Append-only accumulator used during one import pass.
#[derive(Debug)]
pub struct ProvenanceBuilder {
    inner: Provenance,
}

impl ProvenanceBuilder {
    #[must_use]
    pub fn new(path: &Path, patterns: DetectedPatterns) -> Self {
        Self {
            inner: Provenance {
                source: IMPORT_SOURCE.to_string(),
                original_path: path.display().to_string(),
                imported_at: Utc::now(),
                detected_patterns: patterns,
                assumptions: Vec::new(),
                warnings: Vec::new(),
            },
        }
    }

    pub fn assume(&mut self, assumption: impl Into<String>) -> &mut Self {
        let assumption = assumption.into();
        tracing::debug!(%assumption, "import assumption");
        self.inner.assumptions.push(assumption);
        self
    }

    pub fn warn(&mut self, warning: impl Into<String>) -> &mut Self {
        let warning = warning.into();
        tracing::warn!(%warning, "import warning");
        self.inner.warnings.push(warning);
        self
    }

    #[must_use]
    pub fn finish(self) -> Provenance {
        self.inner
    }
}
