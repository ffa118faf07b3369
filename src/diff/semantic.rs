//! Breaking vs. cosmetic classification of structural differences.
//!
//! Persisted representations pick up noise between save cycles (regenerated
//! timestamps, display labels). Only removals of structural entities and
//! changes to non-bookkeeping fields invalidate a comparison.

use super::engine::DiffEngine;
use super::result::{DiffField, FieldDifference, ResourceDiff};
use crate::model::{Resource, ResourceKey};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Label keys that only carry bookkeeping by default.
pub const DEFAULT_COSMETIC_LABELS: &[&str] = &[
    "displayName",
    "fabric.topology.io/display-name",
    "generatedAt",
    "fabric.topology.io/generated-at",
    "namespace",
    "fabric.topology.io/namespace",
    "lastSaved",
];

/// Kinds whose presence is part of the topology structure by default.
pub const DEFAULT_STRUCTURAL_KINDS: &[&str] = &["Fabric", "Switch", "Server", "Connection"];

/// Impact of one difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    /// Invalidates equivalence of the two sets
    Breaking,
    /// Noise that does not invalidate equivalence
    Cosmetic,
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Breaking => f.write_str("breaking"),
            Self::Cosmetic => f.write_str("cosmetic"),
        }
    }
}

/// Classification rules. Every list is explicit and reviewable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassifierConfig {
    /// Label keys whose changes are cosmetic
    pub cosmetic_labels: Vec<String>,
    /// Kinds whose unexpected presence is breaking
    pub structural_kinds: Vec<String>,
    /// Impact of an `apiVersion` change
    pub api_version_impact: Impact,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            cosmetic_labels: DEFAULT_COSMETIC_LABELS.iter().map(|s| (*s).to_string()).collect(),
            structural_kinds: DEFAULT_STRUCTURAL_KINDS.iter().map(|s| (*s).to_string()).collect(),
            api_version_impact: Impact::Cosmetic,
        }
    }
}

/// Which side of the comparison a difference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Missing,
    Extra,
    Field,
}

/// A single classified difference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticDifference {
    pub key: ResourceKey,
    pub change: ChangeKind,
    pub impact: Impact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldDifference>,
    pub description: String,
}

/// Result of a classified comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// False iff at least one breaking difference exists
    pub is_valid: bool,
    /// Descriptions of the breaking differences
    pub errors: Vec<String>,
    pub semantic_differences: Vec<SemanticDifference>,
    /// The structural diff the classification was computed from
    pub diff: ResourceDiff,
}

impl Classification {
    pub fn breaking(&self) -> impl Iterator<Item = &SemanticDifference> {
        self.semantic_differences
            .iter()
            .filter(|d| d.impact == Impact::Breaking)
    }

    pub fn cosmetic(&self) -> impl Iterator<Item = &SemanticDifference> {
        self.semantic_differences
            .iter()
            .filter(|d| d.impact == Impact::Cosmetic)
    }
}

/// Classifier built on the structural diff engine.
pub struct SemanticClassifier {
    engine: DiffEngine,
    cosmetic_labels: BTreeSet<String>,
    structural_kinds: BTreeSet<String>,
    api_version_impact: Impact,
}

impl Default for SemanticClassifier {
    fn default() -> Self {
        Self::new(DiffEngine::new(), &ClassifierConfig::default())
    }
}

impl SemanticClassifier {
    #[must_use]
    pub fn new(engine: DiffEngine, config: &ClassifierConfig) -> Self {
        Self {
            engine,
            cosmetic_labels: config.cosmetic_labels.iter().cloned().collect(),
            structural_kinds: config.structural_kinds.iter().cloned().collect(),
            api_version_impact: config.api_version_impact,
        }
    }

    /// Compare `before` (the baseline) with `after` and classify the result.
    #[must_use]
    pub fn classify(&self, before: &[Resource], after: &[Resource]) -> Classification {
        self.classify_diff(self.engine.compare(before, after))
    }

    /// Classify an already computed diff.
    #[must_use]
    pub fn classify_diff(&self, diff: ResourceDiff) -> Classification {
        let mut differences = Vec::with_capacity(diff.total());

        for key in &diff.missing {
            differences.push(SemanticDifference {
                key: key.clone(),
                change: ChangeKind::Missing,
                impact: Impact::Breaking,
                field: None,
                description: format!("{key} is missing"),
            });
        }

        for key in &diff.extra {
            let impact = if self.structural_kinds.contains(&key.kind) {
                Impact::Breaking
            } else {
                Impact::Cosmetic
            };
            differences.push(SemanticDifference {
                key: key.clone(),
                change: ChangeKind::Extra,
                impact,
                field: None,
                description: format!("{key} is unexpected"),
            });
        }

        for entry in &diff.different {
            for field in &entry.fields {
                differences.push(SemanticDifference {
                    key: entry.key.clone(),
                    change: ChangeKind::Field,
                    impact: self.field_impact(field),
                    field: Some(field.clone()),
                    description: format!("{}: {field}", entry.key),
                });
            }
        }

        let errors: Vec<String> = differences
            .iter()
            .filter(|d| d.impact == Impact::Breaking)
            .map(|d| d.description.clone())
            .collect();

        tracing::debug!(
            breaking = errors.len(),
            cosmetic = differences.len() - errors.len(),
            "classified differences"
        );

        Classification {
            is_valid: errors.is_empty(),
            errors,
            semantic_differences: differences,
            diff,
        }
    }

    fn field_impact(&self, field: &FieldDifference) -> Impact {
        match &field.field {
            DiffField::ApiVersion => self.api_version_impact,
            DiffField::Label(key) if self.cosmetic_labels.contains(key) => Impact::Cosmetic,
            DiffField::Label(_) => Impact::Breaking,
        }
    }
}
