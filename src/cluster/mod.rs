//! Read-only Kubernetes API client.
//!
//! Implements [`ClusterClient`] over the plain REST list endpoints with a
//! blocking `reqwest` client. Kinds are mapped to API paths through a route
//! table; custom fabric kinds and the core `ConfigMap`/`Service` kinds are
//! routed by default.

mod response;

pub use response::{ListItem, ListResponse};

use crate::codec::{CONNECTION_KIND, DEFAULT_API_VERSION, FABRIC_KIND, SERVER_KIND, SWITCH_KIND};
use crate::config::ClusterConfig;
use crate::model::Resource;
use crate::reconcile::{CancellationToken, ClusterClient, FetchError};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::collections::BTreeMap;
use std::time::Duration;

/// Where a kind is listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindRoute {
    /// `group/version`, or `v1` for the core group
    pub api_version: String,
    /// Lowercase plural resource name
    pub plural: String,
}

impl KindRoute {
    #[must_use]
    pub fn new(api_version: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            plural: plural.into(),
        }
    }

    /// Path of the namespaced list endpoint.
    #[must_use]
    pub fn list_path(&self, namespace: &str) -> String {
        let prefix = if self.api_version.contains('/') {
            format!("/apis/{}", self.api_version)
        } else {
            format!("/api/{}", self.api_version)
        };
        format!("{prefix}/namespaces/{namespace}/{}", self.plural)
    }
}

/// Routes for the fabric kinds plus `ConfigMap` and `Service`.
#[must_use]
pub fn default_routes() -> BTreeMap<String, KindRoute> {
    [
        (FABRIC_KIND, KindRoute::new(DEFAULT_API_VERSION, "fabrics")),
        (SWITCH_KIND, KindRoute::new(DEFAULT_API_VERSION, "switches")),
        (SERVER_KIND, KindRoute::new(DEFAULT_API_VERSION, "servers")),
        (CONNECTION_KIND, KindRoute::new(DEFAULT_API_VERSION, "connections")),
        ("ConfigMap", KindRoute::new("v1", "configmaps")),
        ("Service", KindRoute::new("v1", "services")),
    ]
    .into_iter()
    .map(|(kind, route)| (kind.to_string(), route))
    .collect()
}

/// Kubernetes client configuration.
#[derive(Debug, Clone)]
pub struct KubeClientConfig {
    /// API server base URL, e.g. `https://127.0.0.1:6443`
    pub api_server: String,
    /// Bearer token
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    pub routes: BTreeMap<String, KindRoute>,
}

impl Default for KubeClientConfig {
    fn default() -> Self {
        Self {
            api_server: "https://127.0.0.1:6443".to_string(),
            token: None,
            timeout: Duration::from_secs(10),
            routes: default_routes(),
        }
    }
}

impl KubeClientConfig {
    /// Settings from the `reconcile.cluster` config section; the token is
    /// read from the configured environment variable.
    #[must_use]
    pub fn from_config(config: &ClusterConfig) -> Self {
        Self {
            api_server: config.api_server.clone(),
            token: config.token(),
            timeout: config.timeout,
            routes: default_routes(),
        }
    }

    /// Route a kind under a different API version or plural.
    #[must_use]
    pub fn with_route(mut self, kind: impl Into<String>, route: KindRoute) -> Self {
        self.routes.insert(kind.into(), route);
        self
    }
}

/// Blocking HTTP client for live cluster reads.
pub struct KubeClient {
    client: Client,
    config: KubeClientConfig,
}

fn transport_error(msg: &str, err: &reqwest::Error) -> FetchError {
    FetchError::Transport(format!("{msg}: {err}"))
}

/// Map a non-success status to a fetch error.
fn status_error(status: StatusCode, kind: &str, namespace: &str, body: &str) -> FetchError {
    match status {
        StatusCode::NOT_FOUND => FetchError::NotFound {
            kind: kind.to_string(),
            namespace: namespace.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FetchError::Unauthorized(format!("{} listing {kind}: {body}", status.as_u16()))
        }
        _ => FetchError::Transport(format!("{} listing {kind}: {body}", status.as_u16())),
    }
}

impl KubeClient {
    /// Create a new client.
    pub fn new(config: KubeClientConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| transport_error("failed to create HTTP client", &e))?;

        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &KubeClientConfig {
        &self.config
    }

    fn url(&self, route: &KindRoute, namespace: &str) -> String {
        format!(
            "{}{}",
            self.config.api_server.trim_end_matches('/'),
            route.list_path(namespace)
        )
    }
}

impl ClusterClient for KubeClient {
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
        let route = self.config.routes.get(kind).ok_or_else(|| {
            FetchError::InvalidResponse(format!("no API route configured for kind {kind}"))
        })?;

        let url = self.url(route, namespace);
        tracing::debug!(%url, selector, "listing");

        let mut request = self.client.get(&url).query(&[("labelSelector", selector)]);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        // The blocking request runs on a worker so cancellation is observed
        // while it is still in flight.
        let api_version = route.api_version.clone();
        let kind = kind.to_string();
        let namespace = namespace.to_string();
        let fetched = cancel.run_until_canceled(move || -> Result<Vec<Resource>, FetchError> {
            let response = request
                .send()
                .map_err(|e| transport_error("list request failed", &e))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().unwrap_or_default();
                return Err(status_error(status, &kind, &namespace, &body));
            }

            let list: ListResponse = response
                .json()
                .map_err(|e| FetchError::InvalidResponse(e.to_string()))?;

            Ok(list
                .items
                .into_iter()
                .map(|item| item.into_resource(&api_version, &kind))
                .collect())
        });

        match fetched {
            Some(result) => result,
            None if cancel.is_canceled() => {
                tracing::debug!(%url, "list abandoned after cancellation");
                Err(FetchError::Canceled)
            }
            None => Err(FetchError::Transport(
                "list worker exited without a response".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_paths() {
        let routes = default_routes();
        assert_eq!(
            routes["Switch"].list_path("it-42"),
            "/apis/fabric.topology.io/v1alpha1/namespaces/it-42/switches"
        );
        assert_eq!(
            routes["ConfigMap"].list_path("it-42"),
            "/api/v1/namespaces/it-42/configmaps"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "Switch", "it-1", ""),
            FetchError::NotFound { .. }
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "Switch", "it-1", "denied"),
            FetchError::Unauthorized(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "Switch", "it-1", ""),
            FetchError::Transport(_)
        ));
    }

    #[test]
    fn test_from_config() {
        let cluster = ClusterConfig {
            api_server: "https://kube.lab:6443".to_string(),
            token_env: "FABRIC_DRIFT_TEST_UNSET_TOKEN".to_string(),
            timeout: Duration::from_secs(3),
        };
        let config = KubeClientConfig::from_config(&cluster)
            .with_route("Switch", KindRoute::new("fabric.topology.io/v1", "switches"));
        assert_eq!(config.api_server, "https://kube.lab:6443");
        assert_eq!(config.token, None);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(
            config.routes["Switch"].list_path("it-9"),
            "/apis/fabric.topology.io/v1/namespaces/it-9/switches"
        );
    }

    #[test]
    fn test_unrouted_kind() {
        let client = KubeClient::new(KubeClientConfig::default()).expect("client");
        assert!(matches!(
            client.list("Widget", "it-1", "runId=1", &CancellationToken::new()),
            Err(FetchError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_canceled_before_request() {
        let client = KubeClient::new(KubeClientConfig::default()).expect("client");
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            client.list("Switch", "it-1", "runId=1", &token),
            Err(FetchError::Canceled)
        );
    }

    #[test]
    fn test_cancel_interrupts_stalled_request() {
        use std::io::Read;
        use std::net::TcpListener;
        use std::time::Instant;

        // Accepts connections and never answers.
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        std::thread::spawn(move || {
            let mut held = Vec::new();
            for mut stream in listener.incoming().flatten() {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                held.push(stream);
            }
        });

        let config = KubeClientConfig {
            api_server: format!("http://{addr}"),
            timeout: Duration::from_secs(10),
            ..KubeClientConfig::default()
        };
        let client = KubeClient::new(config).expect("client");
        let token = CancellationToken::new();
        let _deadline = token.cancel_after(Duration::from_millis(100));

        let started = Instant::now();
        assert_eq!(
            client.list("Switch", "it-1", "runId=1", &token),
            Err(FetchError::Canceled)
        );
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
