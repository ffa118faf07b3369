//! Cluster reconciliation.
//!
//! Polls a live cluster, scoped to one run's namespace and label selector,
//! until every expected resource exists. Delays between attempts follow an
//! exponential [`BackoffPolicy`] and are slept through an injected
//! [`Scheduler`], so tests can drive the loop without wall-clock time.

mod backoff;
mod client;
mod poller;
mod scheduler;
mod scope;

pub use backoff::{format_duration, parse_duration, BackoffPolicy};
pub(crate) use backoff::human as human_duration;
pub use client::{ClusterClient, FetchError, ScriptedClient};
pub use poller::{PollOutcome, PollState, PollStatus, Poller};
pub use scheduler::{CancellationToken, ManualScheduler, Scheduler, SleepOutcome, ThreadScheduler};
pub use scope::{RunScope, DEFAULT_NAMESPACE_PREFIX, RUN_ID_LABEL};

/// Errors specific to setting up a reconciliation run.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ReconcileError {
    #[error("invalid duration '{0}': expected format like 500ms, 30s, 5m")]
    InvalidDuration(String),

    #[error("invalid backoff policy: {0}")]
    InvalidBackoff(String),

    #[error("invalid run id '{0}': expected a label value (alphanumerics, '-', '_', '.')")]
    InvalidRunId(String),

    #[error("invalid namespace '{0}': expected a lowercase DNS label")]
    InvalidNamespace(String),
}
