//! Port capacity validation against switch profiles.

use crate::model::{ConnectionKind, Switch, TopologyModel};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default utilization ratio at which a port group is reported as near capacity.
pub const DEFAULT_NEAR_CAPACITY_THRESHOLD: f64 = 0.8;

/// Assignable port groups of a switch model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SwitchProfile {
    /// Ports that may carry server links
    pub endpoint_ports: u32,
    /// Ports that may carry leaf-spine links
    pub fabric_ports: u32,
}

impl SwitchProfile {
    #[must_use]
    pub const fn new(endpoint_ports: u32, fabric_ports: u32) -> Self {
        Self {
            endpoint_ports,
            fabric_ports,
        }
    }
}

/// Built-in switch model catalog.
#[must_use]
pub fn builtin_profiles() -> BTreeMap<String, SwitchProfile> {
    [
        ("DS2000", SwitchProfile::new(48, 8)),
        ("DS3000", SwitchProfile::new(0, 32)),
        ("DS4000", SwitchProfile::new(0, 64)),
    ]
    .into_iter()
    .map(|(model, profile)| (model.to_string(), profile))
    .collect()
}

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// Invalidates the imported spec
    Error,
    /// Worth a look, does not invalidate
    Warning,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// One capacity finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    /// Device the finding is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    fn error(device: &str, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            device: Some(device.to_string()),
            message: message.into(),
        }
    }

    fn warning(device: &str, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            device: Some(device.to_string()),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.device {
            Some(device) => write!(f, "{}: {}: {}", self.severity, device, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Outcome of capacity validation. Returned as data, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Split issues by severity.
    #[must_use]
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = issues
            .into_iter()
            .partition(|i| i.severity == IssueSeverity::Error);
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Checks per-switch port demand against the profile catalog.
#[derive(Debug, Clone)]
pub struct CapacityValidator {
    profiles: BTreeMap<String, SwitchProfile>,
    threshold: f64,
}

impl Default for CapacityValidator {
    fn default() -> Self {
        Self::new(builtin_profiles(), DEFAULT_NEAR_CAPACITY_THRESHOLD)
    }
}

impl CapacityValidator {
    #[must_use]
    pub fn new(profiles: BTreeMap<String, SwitchProfile>, threshold: f64) -> Self {
        Self {
            profiles,
            threshold,
        }
    }

    #[must_use]
    pub fn profile(&self, model: &str) -> Option<&SwitchProfile> {
        self.profiles.get(model)
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Validate every switch in the model.
    #[must_use]
    pub fn check(&self, model: &TopologyModel) -> ValidationReport {
        let mut issues = Vec::new();
        for leaf in &model.leaves {
            self.check_leaf(model, leaf, &mut issues);
        }
        for spine in &model.spines {
            self.check_spine(model, spine, &mut issues);
        }
        ValidationReport::from_issues(issues)
    }

    fn check_leaf(&self, model: &TopologyModel, leaf: &Switch, issues: &mut Vec<ValidationIssue>) {
        let endpoints = model.connections_of(&leaf.id, ConnectionKind::Endpoint).count() as u32;
        let uplinks = model.connections_of(&leaf.id, ConnectionKind::Uplink).count() as u32;
        check_declared_ports(leaf, endpoints + uplinks, issues);

        let Some(profile) = self.profile(&leaf.model) else {
            issues.push(unknown_model(leaf));
            return;
        };
        self.check_group(leaf, "endpoint", endpoints, profile.endpoint_ports, issues);
        self.check_group(leaf, "fabric", uplinks, profile.fabric_ports, issues);
    }

    fn check_spine(&self, model: &TopologyModel, spine: &Switch, issues: &mut Vec<ValidationIssue>) {
        let uplinks = model.connections_of(&spine.id, ConnectionKind::Uplink).count() as u32;
        let endpoints = model.connections_of(&spine.id, ConnectionKind::Endpoint).count();
        if endpoints > 0 {
            issues.push(ValidationIssue::warning(
                &spine.id,
                format!("spine carries {endpoints} endpoint link(s)"),
            ));
        }
        check_declared_ports(spine, uplinks + endpoints as u32, issues);

        let Some(profile) = self.profile(&spine.model) else {
            issues.push(unknown_model(spine));
            return;
        };
        self.check_group(spine, "fabric", uplinks, profile.fabric_ports, issues);
    }

    fn check_group(
        &self,
        switch: &Switch,
        group: &str,
        demand: u32,
        capacity: u32,
        issues: &mut Vec<ValidationIssue>,
    ) {
        if demand > capacity {
            issues.push(ValidationIssue::error(
                &switch.id,
                format!(
                    "{group} port demand {demand} exceeds {capacity} assignable on {}",
                    switch.model
                ),
            ));
        } else if capacity > 0 && f64::from(demand) / f64::from(capacity) >= self.threshold {
            issues.push(ValidationIssue::warning(
                &switch.id,
                format!(
                    "{group} ports near capacity: {demand} of {capacity} in use ({:.0}%)",
                    f64::from(demand) / f64::from(capacity) * 100.0
                ),
            ));
        }
    }
}

fn check_declared_ports(switch: &Switch, used: u32, issues: &mut Vec<ValidationIssue>) {
    if used > switch.ports {
        issues.push(ValidationIssue::error(
            &switch.id,
            format!("{used} links cabled but only {} ports declared", switch.ports),
        ));
    }
}

fn unknown_model(switch: &Switch) -> ValidationIssue {
    ValidationIssue::warning(
        &switch.id,
        format!("no port profile for model '{}', capacity not checked", switch.model),
    )
}
