//! Kubernetes list response types.

use crate::model::{ObjectMeta, Resource};
use serde::Deserialize;
use serde_json::Value;

/// Body of a `GET .../namespaces/{ns}/{plural}` call.
#[derive(Debug, Deserialize)]
pub struct ListResponse {
    #[serde(default)]
    pub items: Vec<ListItem>,
}

/// One list item. Items do not carry `apiVersion`/`kind`; the caller fills
/// them in from the route it listed.
#[derive(Debug, Deserialize)]
pub struct ListItem {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: Value,
}

impl ListItem {
    #[must_use]
    pub fn into_resource(self, api_version: &str, kind: &str) -> Resource {
        Resource {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            metadata: self.metadata,
            spec: self.spec,
        }
    }
}
