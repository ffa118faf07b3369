//! Structural diff engine implementation.

use super::result::{ResourceDiff, ResourceDifference};
use super::traits::{ApiVersionComparator, FieldComparator, LabelComparator};
use crate::model::{Resource, ResourceKey};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which fields the engine compares on matched resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct DiffOptions {
    /// Compare `apiVersion` tags
    pub compare_api_version: bool,
    /// Compare labels present on the expected side
    pub compare_labels: bool,
    /// Label keys never compared
    pub ignored_labels: Vec<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            compare_api_version: true,
            compare_labels: true,
            ignored_labels: Vec::new(),
        }
    }
}

/// Structural diff engine for resource sets.
pub struct DiffEngine {
    comparators: Vec<Box<dyn FieldComparator>>,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffEngine {
    /// Create an engine comparing `apiVersion` and labels.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(&DiffOptions::default())
    }

    /// Create an engine from options.
    #[must_use]
    pub fn with_options(options: &DiffOptions) -> Self {
        let mut comparators: Vec<Box<dyn FieldComparator>> = Vec::new();
        if options.compare_api_version {
            comparators.push(Box::new(ApiVersionComparator));
        }
        if options.compare_labels {
            comparators.push(Box::new(
                LabelComparator::new().ignoring(options.ignored_labels.iter().cloned()),
            ));
        }
        Self { comparators }
    }

    /// Register an additional field comparator.
    #[must_use]
    pub fn with_comparator(mut self, comparator: Box<dyn FieldComparator>) -> Self {
        self.comparators.push(comparator);
        self
    }

    /// Names of the active comparators, in evaluation order.
    pub fn comparator_names(&self) -> impl Iterator<Item = &str> {
        self.comparators.iter().map(|c| c.name())
    }

    /// Compare an expected resource set against an actual one.
    ///
    /// Resources match by `(kind, name)` regardless of position. Each side
    /// is indexed first; a key repeated within one side keeps its last
    /// occurrence.
    #[must_use]
    pub fn compare(&self, expected: &[Resource], actual: &[Resource]) -> ResourceDiff {
        let expected = index("expected", expected);
        let actual = index("actual", actual);
        let mut result = ResourceDiff::new();

        for (key, want) in &expected {
            let Some(got) = actual.get(key) else {
                result.missing.push(key.clone());
                continue;
            };
            let fields: Vec<_> = self
                .comparators
                .iter()
                .flat_map(|c| c.compare(want, got))
                .collect();
            if !fields.is_empty() {
                result.different.push(ResourceDifference::new(key.clone(), fields));
            }
        }

        result.extra = actual
            .keys()
            .filter(|key| !expected.contains_key(*key))
            .cloned()
            .collect();

        result.missing.sort();
        result.extra.sort();
        result.different.sort_by(|a, b| a.key.cmp(&b.key));

        tracing::debug!(
            expected = expected.len(),
            actual = actual.len(),
            missing = result.missing.len(),
            extra = result.extra.len(),
            different = result.different.len(),
            "compared resource sets"
        );
        result
    }
}

fn index<'a>(side: &str, resources: &'a [Resource]) -> IndexMap<ResourceKey, &'a Resource> {
    let mut map = IndexMap::with_capacity(resources.len());
    for resource in resources {
        if map.insert(resource.key(), resource).is_some() {
            tracing::debug!(side, key = %resource.key(), "duplicate resource key, keeping last");
        }
    }
    map
}
