//! Backoff-driven reconciliation poller.
//!
//! The poller is an explicit state machine over discrete attempts:
//!
//! ```text
//! Idle -> Attempting -> Satisfied
//!              |
//!              +-> Retrying -> Attempting -> ...
//!              +-> Exhausted          (attempt budget spent)
//!              +-> Canceled           (token fired during fetch or sleep)
//! ```

use super::backoff::{serialize_millis, BackoffPolicy};
use super::client::{ClusterClient, FetchError};
use super::scheduler::{CancellationToken, Scheduler, SleepOutcome};
use super::scope::RunScope;
use crate::diff::{DiffEngine, ResourceDiff};
use crate::model::Resource;
use indexmap::IndexSet;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Poller state. The last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollState {
    Idle,
    Attempting,
    Retrying,
    Satisfied,
    Exhausted,
    Canceled,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Attempting => "attempting",
            Self::Retrying => "retrying",
            Self::Satisfied => "satisfied",
            Self::Exhausted => "exhausted",
            Self::Canceled => "canceled",
        };
        f.write_str(name)
    }
}

/// Terminal outcome of a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    Satisfied,
    Exhausted,
    Canceled,
}

impl From<PollStatus> for PollState {
    fn from(status: PollStatus) -> Self {
        match status {
            PollStatus::Satisfied => Self::Satisfied,
            PollStatus::Exhausted => Self::Exhausted,
            PollStatus::Canceled => Self::Canceled,
        }
    }
}

/// Everything the caller needs to decide what to do next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOutcome {
    pub status: PollStatus,
    /// Attempts started, including one interrupted by cancellation
    pub attempts: u32,
    /// Diff from the most recent completed fetch
    pub last_diff: Option<ResourceDiff>,
    /// Most recent fetch failure, if any attempt failed
    pub last_error: Option<String>,
    /// Every state entered, starting with `Idle`
    pub transitions: Vec<PollState>,
    /// Delays slept between attempts
    #[serde(rename = "delaysMs", serialize_with = "serialize_millis")]
    pub delays: Vec<Duration>,
}

impl PollOutcome {
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.status == PollStatus::Satisfied
    }
}

struct Run {
    transitions: Vec<PollState>,
    delays: Vec<Duration>,
    attempts: u32,
    last_diff: Option<ResourceDiff>,
    last_error: Option<String>,
}

impl Run {
    fn enter(&mut self, state: PollState) {
        tracing::debug!(attempt = self.attempts, %state, "poll transition");
        self.transitions.push(state);
    }

    fn finish(mut self, status: PollStatus) -> PollOutcome {
        self.enter(status.into());
        tracing::info!(
            status = %PollState::from(status),
            attempts = self.attempts,
            missing = self.last_diff.as_ref().map_or(0, |d| d.missing.len()),
            "poll finished"
        );
        PollOutcome {
            status,
            attempts: self.attempts,
            last_diff: self.last_diff,
            last_error: self.last_error,
            transitions: self.transitions,
            delays: self.delays,
        }
    }
}

/// Repeatedly fetches live resources until the expected set is present.
pub struct Poller<'a> {
    client: &'a dyn ClusterClient,
    scheduler: &'a dyn Scheduler,
    engine: DiffEngine,
    policy: BackoffPolicy,
}

impl<'a> Poller<'a> {
    #[must_use]
    pub fn new(client: &'a dyn ClusterClient, scheduler: &'a dyn Scheduler) -> Self {
        Self {
            client,
            scheduler,
            engine: DiffEngine::new(),
            policy: BackoffPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_engine(mut self, engine: DiffEngine) -> Self {
        self.engine = engine;
        self
    }

    #[must_use]
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Poll until every expected resource exists in the run's namespace,
    /// the attempt budget is spent, or `cancel` fires.
    pub fn poll(&self, expected: &[Resource], scope: &RunScope, cancel: &CancellationToken) -> PollOutcome {
        let mut run = Run {
            transitions: vec![PollState::Idle],
            delays: Vec::new(),
            attempts: 0,
            last_diff: None,
            last_error: None,
        };
        let kinds: IndexSet<&str> = expected.iter().map(|r| r.kind.as_str()).collect();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut delay = self.policy.first_delay();

        tracing::info!(
            namespace = %scope.namespace(),
            selector = %scope.selector(),
            expected = expected.len(),
            max_attempts,
            "polling cluster"
        );

        loop {
            if cancel.is_canceled() {
                return run.finish(PollStatus::Canceled);
            }
            run.attempts += 1;
            run.enter(PollState::Attempting);

            let fetched = self.fetch(&kinds, scope, cancel);
            // A cancel that lands mid-fetch ends the run, whatever came back.
            if cancel.is_canceled() {
                return run.finish(PollStatus::Canceled);
            }

            match fetched {
                Ok(actual) => {
                    let diff = self.engine.compare(expected, &actual);
                    let satisfied = diff.missing.is_empty();
                    tracing::debug!(
                        attempt = run.attempts,
                        found = actual.len(),
                        missing = diff.missing.len(),
                        "attempt compared"
                    );
                    run.last_diff = Some(diff);
                    if satisfied {
                        return run.finish(PollStatus::Satisfied);
                    }
                }
                Err(FetchError::Canceled) => return run.finish(PollStatus::Canceled),
                Err(err) => {
                    tracing::warn!(attempt = run.attempts, error = %err, "fetch failed, will retry");
                    run.last_error = Some(err.to_string());
                }
            }

            if run.attempts >= max_attempts {
                return run.finish(PollStatus::Exhausted);
            }

            run.enter(PollState::Retrying);
            run.delays.push(delay);
            if self.scheduler.sleep(delay, cancel) == SleepOutcome::Canceled {
                return run.finish(PollStatus::Canceled);
            }
            delay = self.policy.next_delay(delay);
        }
    }

    /// List every kind in parallel, then accumulate in kind order.
    ///
    /// `NotFound` counts as an empty list. Cancellation wins over any other
    /// failure; otherwise the first failure in kind order is returned.
    fn fetch(
        &self,
        kinds: &IndexSet<&str>,
        scope: &RunScope,
        cancel: &CancellationToken,
    ) -> Result<Vec<Resource>, FetchError> {
        let namespace = scope.namespace();
        let selector = scope.selector();

        let results: Vec<Result<Vec<Resource>, FetchError>> = kinds
            .iter()
            .copied()
            .collect::<Vec<_>>()
            .par_iter()
            .map(|kind| match self.client.list(kind, &namespace, &selector, cancel) {
                Err(FetchError::NotFound { .. }) => {
                    tracing::debug!(kind, namespace = %namespace, "kind not found yet");
                    Ok(Vec::new())
                }
                other => other,
            })
            .collect();

        if results.iter().any(|r| matches!(r, Err(FetchError::Canceled))) {
            return Err(FetchError::Canceled);
        }

        let mut resources = Vec::new();
        for result in results {
            resources.extend(result?);
        }
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{ManualScheduler, ScriptedClient};

    fn scope() -> RunScope {
        RunScope::new("it", "7").expect("scope")
    }

    fn service() -> Resource {
        Resource::new("v1", "Service", "service1")
    }

    #[test]
    fn test_satisfied_first_attempt() {
        let client = ScriptedClient::new().respond("Service", Ok(vec![service()]));
        let scheduler = ManualScheduler::new();
        let outcome = Poller::new(&client, &scheduler).poll(&[service()], &scope(), &CancellationToken::new());

        assert!(outcome.is_satisfied());
        assert_eq!(outcome.attempts, 1);
        assert_eq!(
            outcome.transitions,
            vec![PollState::Idle, PollState::Attempting, PollState::Satisfied]
        );
        assert!(scheduler.delays().is_empty());
        assert_eq!(
            client.calls(),
            vec![("Service".to_string(), "it-7".to_string(), "runId=7".to_string())]
        );
    }

    #[test]
    fn test_extra_resources_do_not_block() {
        let client = ScriptedClient::new().respond(
            "Service",
            Ok(vec![service(), Resource::new("v1", "Service", "other")]),
        );
        let scheduler = ManualScheduler::new();
        let outcome = Poller::new(&client, &scheduler).poll(&[service()], &scope(), &CancellationToken::new());
        assert!(outcome.is_satisfied());
    }

    #[test]
    fn test_satisfied_after_retries() {
        let client = ScriptedClient::new()
            .respond("Service", Ok(Vec::new()))
            .respond("Service", Err(FetchError::Transport("connection reset".into())))
            .respond("Service", Ok(vec![service()]));
        let scheduler = ManualScheduler::new();
        let outcome = Poller::new(&client, &scheduler).poll(&[service()], &scope(), &CancellationToken::new());

        assert!(outcome.is_satisfied());
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.last_error.as_deref(), Some("transport error: connection reset"));
        assert_eq!(
            scheduler.delays(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[test]
    fn test_exhausted_without_final_sleep() {
        let client = ScriptedClient::new();
        let scheduler = ManualScheduler::new();
        let policy = BackoffPolicy::default().with_max_attempts(3);
        let outcome = Poller::new(&client, &scheduler)
            .with_policy(policy)
            .poll(&[service()], &scope(), &CancellationToken::new());

        assert_eq!(outcome.status, PollStatus::Exhausted);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(scheduler.delays().len(), 2);
        assert_eq!(outcome.transitions.last(), Some(&PollState::Exhausted));
        let diff = outcome.last_diff.expect("diff");
        assert_eq!(diff.missing, vec![service().key()]);
    }

    #[test]
    fn test_canceled_during_sleep() {
        let client = ScriptedClient::new();
        let scheduler = ManualScheduler::new().cancel_on_sleep(2);
        let outcome = Poller::new(&client, &scheduler).poll(&[service()], &scope(), &CancellationToken::new());

        assert_eq!(outcome.status, PollStatus::Canceled);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(scheduler.delays().len(), 2);
    }

    #[test]
    fn test_canceled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let client = ScriptedClient::new();
        let scheduler = ManualScheduler::new();
        let outcome = Poller::new(&client, &scheduler).poll(&[service()], &scope(), &token);

        assert_eq!(outcome.status, PollStatus::Canceled);
        assert_eq!(outcome.attempts, 0);
        assert!(client.calls().is_empty());
    }
}
