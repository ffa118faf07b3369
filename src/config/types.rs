//! Configuration types for fabric-drift.

use crate::codec::{ManifestCodec, DEFAULT_API_VERSION, DEFAULT_NAMESPACE};
use crate::diff::{ClassifierConfig, DiffEngine, DiffOptions, SemanticClassifier};
use crate::import::{builtin_profiles, CapacityValidator, SwitchProfile, DEFAULT_NEAR_CAPACITY_THRESHOLD};
use crate::reconcile::{human_duration, BackoffPolicy, DEFAULT_NAMESPACE_PREFIX};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Environment variable consulted for the cluster bearer token by default.
pub const DEFAULT_TOKEN_ENV: &str = "FABRIC_DRIFT_TOKEN";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub import: ImportConfig,
    pub diff: DiffOptions,
    pub classifier: ClassifierConfig,
    pub codec: CodecConfig,
    pub reconcile: ReconcileConfig,
}

impl AppConfig {
    /// Structural diff engine built from the `diff` section.
    #[must_use]
    pub fn diff_engine(&self) -> DiffEngine {
        DiffEngine::with_options(&self.diff)
    }

    /// Classifier built from the `diff` and `classifier` sections.
    #[must_use]
    pub fn classifier(&self) -> SemanticClassifier {
        SemanticClassifier::new(self.diff_engine(), &self.classifier)
    }
}

/// Import and capacity validation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportConfig {
    /// Utilization ratio (0-1] reported as near capacity
    pub near_capacity_threshold: f64,
    /// Switch models added to, or overriding, the built-in catalog
    pub switch_profiles: BTreeMap<String, SwitchProfile>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            near_capacity_threshold: DEFAULT_NEAR_CAPACITY_THRESHOLD,
            switch_profiles: BTreeMap::new(),
        }
    }
}

impl ImportConfig {
    /// Built-in catalog merged with configured profiles.
    #[must_use]
    pub fn profiles(&self) -> BTreeMap<String, SwitchProfile> {
        let mut profiles = builtin_profiles();
        profiles.extend(self.switch_profiles.iter().map(|(k, v)| (k.clone(), *v)));
        profiles
    }

    #[must_use]
    pub fn validator(&self) -> CapacityValidator {
        CapacityValidator::new(self.profiles(), self.near_capacity_threshold)
    }
}

/// Manifest encoding settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CodecConfig {
    /// `apiVersion` written into manifest documents
    pub api_version: String,
    /// `metadata.namespace` written into manifest documents
    pub namespace: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl CodecConfig {
    #[must_use]
    pub fn manifest_codec(&self) -> ManifestCodec {
        ManifestCodec::new(&self.api_version, &self.namespace)
    }
}

/// Cluster reconciliation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ReconcileConfig {
    /// Namespaces are `<prefix>-<runId>`
    pub namespace_prefix: String,
    pub backoff: BackoffPolicy,
    pub cluster: ClusterConfig,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            namespace_prefix: DEFAULT_NAMESPACE_PREFIX.to_string(),
            backoff: BackoffPolicy::default(),
            cluster: ClusterConfig::default(),
        }
    }
}

/// Kubernetes API access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterConfig {
    /// API server base URL
    pub api_server: String,
    /// Environment variable holding the bearer token
    pub token_env: String,
    /// Per-request timeout (e.g. `10s`)
    #[serde(with = "human_duration")]
    #[schemars(with = "String")]
    pub timeout: Duration,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            api_server: "https://127.0.0.1:6443".to_string(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ClusterConfig {
    /// Read the bearer token from the configured environment variable.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env).ok().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "import:\n  nearCapacityThreshold: 0.9\nreconcile:\n  backoff:\n    maxAttempts: 3\n";
        let config: AppConfig = serde_yaml::from_str(yaml).expect("parse");
        assert!((config.import.near_capacity_threshold - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.reconcile.backoff.max_attempts, 3);
        assert_eq!(config.reconcile.backoff.initial_delay, Duration::from_secs(1));
        assert_eq!(config.reconcile.namespace_prefix, "it");
        assert_eq!(config.codec, CodecConfig::default());
    }

    #[test]
    fn test_profile_override() {
        let mut config = ImportConfig::default();
        config
            .switch_profiles
            .insert("DS2000".to_string(), SwitchProfile::new(40, 8));
        config
            .switch_profiles
            .insert("XR-9".to_string(), SwitchProfile::new(24, 4));
        let profiles = config.profiles();
        assert_eq!(profiles["DS2000"].endpoint_ports, 40);
        assert_eq!(profiles["XR-9"].fabric_ports, 4);
        assert!(profiles.contains_key("DS3000"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = AppConfig::default();
        let yaml = serde_yaml::to_string(&config).expect("serialize");
        let back: AppConfig = serde_yaml::from_str(&yaml).expect("parse");
        assert_eq!(back, config);
    }
}
