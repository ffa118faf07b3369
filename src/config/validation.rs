//! Configuration validation for fabric-drift.

use super::types::{AppConfig, ClusterConfig, ImportConfig, ReconcileConfig};
use crate::diff::{ClassifierConfig, DiffOptions};

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.import.validate());
        errors.extend(self.diff.validate());
        errors.extend(self.classifier.validate());
        errors.extend(self.reconcile.validate());

        if self.codec.api_version.trim().is_empty() {
            errors.push(ConfigError::new("codec.apiVersion", "must not be empty"));
        }
        if self.codec.namespace.trim().is_empty() {
            errors.push(ConfigError::new("codec.namespace", "must not be empty"));
        }
        errors
    }
}

impl Validatable for ImportConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let threshold = self.near_capacity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            errors.push(ConfigError::new(
                "import.nearCapacityThreshold",
                format!("must be in (0, 1], got {threshold}"),
            ));
        }
        for (model, profile) in &self.switch_profiles {
            if profile.endpoint_ports == 0 && profile.fabric_ports == 0 {
                errors.push(ConfigError::new(
                    format!("import.switchProfiles.{model}"),
                    "profile has no assignable ports",
                ));
            }
        }
        errors
    }
}

fn blank_entries(field: &str, values: &[String]) -> Vec<ConfigError> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(i, _)| ConfigError::new(format!("{field}[{i}]"), "must not be blank"))
        .collect()
}

impl Validatable for DiffOptions {
    fn validate(&self) -> Vec<ConfigError> {
        blank_entries("diff.ignoredLabels", &self.ignored_labels)
    }
}

impl Validatable for ClassifierConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = blank_entries("classifier.cosmeticLabels", &self.cosmetic_labels);
        errors.extend(blank_entries("classifier.structuralKinds", &self.structural_kinds));
        if self.structural_kinds.is_empty() {
            errors.push(ConfigError::new(
                "classifier.structuralKinds",
                "at least one structural kind is required",
            ));
        }
        errors
    }
}

impl Validatable for ReconcileConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let prefix_ok = !self.namespace_prefix.is_empty()
            && self
                .namespace_prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            && !self.namespace_prefix.starts_with('-');
        if !prefix_ok {
            errors.push(ConfigError::new(
                "reconcile.namespacePrefix",
                format!(
                    "'{}' must be lowercase alphanumerics and '-', not starting with '-'",
                    self.namespace_prefix
                ),
            ));
        }
        if let Err(e) = self.backoff.validate() {
            errors.push(ConfigError::new("reconcile.backoff", e.to_string()));
        }
        errors.extend(self.cluster.validate());
        errors
    }
}

impl Validatable for ClusterConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if !(self.api_server.starts_with("https://") || self.api_server.starts_with("http://")) {
            errors.push(ConfigError::new(
                "reconcile.cluster.apiServer",
                format!("'{}' must be an http(s) URL", self.api_server),
            ));
        }
        if self.timeout.is_zero() {
            errors.push(ConfigError::new("reconcile.cluster.timeout", "must be positive"));
        }
        if self.token_env.trim().is_empty() {
            errors.push(ConfigError::new("reconcile.cluster.tokenEnv", "must not be empty"));
        }
        errors
    }
}
