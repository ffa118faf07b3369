//! Live-cluster fetch collaborator.

use super::scheduler::CancellationToken;
use crate::model::Resource;
use std::collections::BTreeMap;
use std::sync::Mutex;
use thiserror::Error;

/// Errors a cluster list call can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FetchError {
    /// The kind or namespace does not exist yet.
    #[error("{kind} not found in {namespace}")]
    NotFound { kind: String, namespace: String },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("canceled")]
    Canceled,
}

/// Read-only access to live cluster objects.
///
/// Implementations should check `cancel` before and, where possible,
/// during the call, and return [`FetchError::Canceled`] once it fires.
pub trait ClusterClient: Send + Sync {
    /// List objects of `kind` in `namespace` matching the label `selector`.
    fn list(
        &self,
        kind: &str,
        namespace: &str,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Resource>, FetchError>;
}

/// In-memory client serving a fixed response sequence per kind.
///
/// Each call for a kind consumes the next scripted response; the last one
/// repeats forever. Kinds with no script answer `NotFound`.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    scripts: Mutex<BTreeMap<String, Vec<Result<Vec<Resource>, FetchError>>>>,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl ScriptedClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a response for `kind`.
    #[must_use]
    pub fn respond(self, kind: &str, response: Result<Vec<Resource>, FetchError>) -> Self {
        self.scripts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(kind.to_string())
            .or_default()
            .push(response);
        self
    }

    /// Serve a fixed snapshot: every kind present answers with its
    /// resources, every other kind with `NotFound`.
    #[must_use]
    pub fn from_snapshot(resources: Vec<Resource>) -> Self {
        let mut by_kind: BTreeMap<String, Vec<Resource>> = BTreeMap::new();
        for resource in resources {
            by_kind.entry(resource.kind.clone()).or_default().push(resource);
        }
        by_kind
            .into_iter()
            .fold(Self::new(), |client, (kind, items)| client.respond(&kind, Ok(items)))
    }

    /// Every `(kind, namespace, selector)` requested so far.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl ClusterClient for ScriptedClient {
    fn list(
        &self,
        kind: &str,
        namespace: &str,
        selector: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Resource>, FetchError> {
        if cancel.is_canceled() {
            return Err(FetchError::Canceled);
        }
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((kind.to_string(), namespace.to_string(), selector.to_string()));

        let mut scripts = self
            .scripts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match scripts.get_mut(kind) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) => queue.first().cloned().unwrap_or(Ok(Vec::new())),
            None => Err(FetchError::NotFound {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_sequence_repeats_last() {
        let token = CancellationToken::new();
        let client = ScriptedClient::new()
            .respond("Service", Err(FetchError::Transport("reset".into())))
            .respond("Service", Ok(vec![Resource::new("v1", "Service", "svc")]));

        assert!(client.list("Service", "it-1", "runId=1", &token).is_err());
        assert_eq!(client.list("Service", "it-1", "runId=1", &token).map(|r| r.len()), Ok(1));
        assert_eq!(client.list("Service", "it-1", "runId=1", &token).map(|r| r.len()), Ok(1));
        assert_eq!(client.calls().len(), 3);
    }

    #[test]
    fn test_snapshot_groups_by_kind() {
        let token = CancellationToken::new();
        let client = ScriptedClient::from_snapshot(vec![
            Resource::new("v1", "Service", "a"),
            Resource::new("v1", "ConfigMap", "b"),
            Resource::new("v1", "Service", "c"),
        ]);
        assert_eq!(client.list("Service", "ns", "sel", &token).map(|r| r.len()), Ok(2));
        assert_eq!(client.list("ConfigMap", "ns", "sel", &token).map(|r| r.len()), Ok(1));
    }

    #[test]
    fn test_unscripted_kind_not_found() {
        let client = ScriptedClient::new();
        assert!(matches!(
            client.list("ConfigMap", "it-1", "runId=1", &CancellationToken::new()),
            Err(FetchError::NotFound { .. })
        ));
    }

    #[test]
    fn test_canceled_before_call() {
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            ScriptedClient::new().list("Service", "ns", "sel", &token),
            Err(FetchError::Canceled)
        );
    }
}
