//! Diff result types.

use crate::model::ResourceKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rendering used for a value absent on one side.
pub const ABSENT: &str = "<none>";

/// Which comparable field disagreed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "field", content = "key", rename_all = "camelCase")]
pub enum DiffField {
    ApiVersion,
    Label(String),
}

/// A single field-level disagreement between matched resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldDifference {
    #[serde(flatten)]
    pub field: DiffField,
    pub expected: Option<String>,
    pub actual: Option<String>,
}

impl FieldDifference {
    #[must_use]
    pub fn new(field: DiffField, expected: Option<String>, actual: Option<String>) -> Self {
        Self {
            field,
            expected,
            actual,
        }
    }
}

impl fmt::Display for FieldDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected = self.expected.as_deref().unwrap_or(ABSENT);
        let actual = self.actual.as_deref().unwrap_or(ABSENT);
        match &self.field {
            DiffField::ApiVersion => write!(f, "apiVersion: expected {expected}, got {actual}"),
            DiffField::Label(key) => write!(f, "label {key}: expected {expected}, got {actual}"),
        }
    }
}

/// A resource present on both sides whose comparable fields disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDifference {
    pub key: ResourceKey,
    /// Human-readable rendering of `fields`, one string per field
    pub differences: Vec<String>,
    pub fields: Vec<FieldDifference>,
}

impl ResourceDifference {
    #[must_use]
    pub fn new(key: ResourceKey, fields: Vec<FieldDifference>) -> Self {
        Self {
            key,
            differences: fields.iter().map(ToString::to_string).collect(),
            fields,
        }
    }
}

/// Structural diff of two resource sets.
///
/// `missing`, `extra` and `different` are disjoint and sorted by key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResourceDiff {
    /// Expected but not found
    pub missing: Vec<ResourceKey>,
    /// Found but not expected
    pub extra: Vec<ResourceKey>,
    /// Found on both sides with disagreeing fields
    pub different: Vec<ResourceDifference>,
}

impl ResourceDiff {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.different.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.missing.len() + self.extra.len() + self.different.len()
    }

    /// Counts as (missing, extra, different).
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.missing.len(), self.extra.len(), self.different.len())
    }
}
