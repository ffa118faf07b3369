//! Run-scoped namespace and label selector.

use super::ReconcileError;
use regex::Regex;
use std::sync::LazyLock;

/// Label every resource of a run carries.
pub const RUN_ID_LABEL: &str = "runId";

/// Default namespace prefix.
pub const DEFAULT_NAMESPACE_PREFIX: &str = "it";

static DNS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]{0,61}[a-z0-9])?$").expect("static regex"));

static LABEL_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([-A-Za-z0-9_.]{0,61}[A-Za-z0-9])?$").expect("static regex")
});

/// Where one reconciliation run's resources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunScope {
    prefix: String,
    run_id: String,
}

impl RunScope {
    /// Build a scope, checking that the run id is a valid label value and
    /// that `<prefix>-<runId>` is a valid namespace name.
    pub fn new(prefix: impl Into<String>, run_id: impl Into<String>) -> Result<Self, ReconcileError> {
        let scope = Self {
            prefix: prefix.into(),
            run_id: run_id.into(),
        };
        if !LABEL_VALUE.is_match(&scope.run_id) {
            return Err(ReconcileError::InvalidRunId(scope.run_id));
        }
        let namespace = scope.namespace();
        if !DNS_LABEL.is_match(&namespace) {
            return Err(ReconcileError::InvalidNamespace(namespace));
        }
        Ok(scope)
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `<prefix>-<runId>`
    #[must_use]
    pub fn namespace(&self) -> String {
        format!("{}-{}", self.prefix, self.run_id)
    }

    /// `runId=<runId>`
    #[must_use]
    pub fn selector(&self) -> String {
        format!("{RUN_ID_LABEL}={}", self.run_id)
    }
}
