//! Field comparison strategies.
//!
//! The engine matches resources by key, then asks each registered
//! [`FieldComparator`] for the disagreements in its field.

use super::result::{DiffField, FieldDifference};
use crate::model::Resource;
use std::collections::BTreeSet;

/// Trait for comparing one declared field of two matched resources.
pub trait FieldComparator: Send + Sync {
    /// Disagreements between the expected and actual resource.
    fn compare(&self, expected: &Resource, actual: &Resource) -> Vec<FieldDifference>;

    /// Get the name of this comparator for logging/debugging.
    fn name(&self) -> &str;
}

/// Compares the `apiVersion` tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiVersionComparator;

impl FieldComparator for ApiVersionComparator {
    fn compare(&self, expected: &Resource, actual: &Resource) -> Vec<FieldDifference> {
        if expected.api_version == actual.api_version {
            Vec::new()
        } else {
            vec![FieldDifference::new(
                DiffField::ApiVersion,
                Some(expected.api_version.clone()),
                Some(actual.api_version.clone()),
            )]
        }
    }

    fn name(&self) -> &str {
        "apiVersion"
    }
}

/// Compares every label present on the expected resource.
///
/// Labels only present on the actual resource are not differences.
#[derive(Debug, Clone, Default)]
pub struct LabelComparator {
    ignored: BTreeSet<String>,
}

impl LabelComparator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the given label keys entirely.
    #[must_use]
    pub fn ignoring(mut self, keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignored.extend(keys.into_iter().map(Into::into));
        self
    }
}

impl FieldComparator for LabelComparator {
    fn compare(&self, expected: &Resource, actual: &Resource) -> Vec<FieldDifference> {
        expected
            .metadata
            .labels
            .iter()
            .filter(|(key, _)| !self.ignored.contains(*key))
            .filter_map(|(key, value)| {
                let got = actual.label(key);
                (got != Some(value.as_str())).then(|| {
                    FieldDifference::new(
                        DiffField::Label(key.clone()),
                        Some(value.clone()),
                        got.map(str::to_string),
                    )
                })
            })
            .collect()
    }

    fn name(&self) -> &str {
        "labels"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version() {
        let a = Resource::new("v1", "Service", "svc");
        let b = Resource::new("v2", "Service", "svc");
        assert!(ApiVersionComparator.compare(&a, &a).is_empty());
        assert_eq!(ApiVersionComparator.compare(&a, &b).len(), 1);
    }

    #[test]
    fn test_labels_only_from_expected() {
        let expected = Resource::new("v1", "Service", "svc")
            .with_label("app", "web")
            .with_label("tier", "front");
        let actual = Resource::new("v1", "Service", "svc")
            .with_label("app", "api")
            .with_label("extra", "x");

        let diffs = LabelComparator::new().compare(&expected, &actual);
        let rendered: Vec<String> = diffs.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "label app: expected web, got api",
                "label tier: expected front, got <none>"
            ]
        );
    }

    #[test]
    fn test_ignored_labels() {
        let expected = Resource::new("v1", "Service", "svc").with_label("generatedAt", "t1");
        let actual = Resource::new("v1", "Service", "svc").with_label("generatedAt", "t2");
        let comparator = LabelComparator::new().ignoring(["generatedAt"]);
        assert!(comparator.compare(&expected, &actual).is_empty());
    }
}
