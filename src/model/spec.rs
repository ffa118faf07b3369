//! Canonical fabric specification reconstructed from a topology.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Whether all leaves share one uplink/endpoint pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopologyType {
    SingleClass,
    MultiClass,
}

impl TopologyType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SingleClass => "single-class",
            Self::MultiClass => "multi-class",
        }
    }
}

impl fmt::Display for TopologyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A group of leaves sharing the same uplink count and reachable server types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafClass {
    pub class_id: String,
    pub uplinks_per_leaf: u32,
    /// Sorted distinct server types reachable through the class's endpoint links
    pub endpoint_profiles: Vec<String>,
    /// Largest number of endpoint links on any leaf in the class
    pub endpoints_per_leaf: u32,
    pub leaf_ids: Vec<String>,
}

impl LeafClass {
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaf_ids.len()
    }
}

/// Minimal description of fabric intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricSpec {
    pub name: String,
    pub spine_model_id: String,
    pub leaf_model_id: String,
    pub uplinks_per_leaf: u32,
    pub endpoint_profile: String,
    pub endpoint_count: u32,
    /// Populated only for heterogeneous (multi-class) fabrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_classes: Option<Vec<LeafClass>>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl FabricSpec {
    #[must_use]
    pub fn topology_type(&self) -> TopologyType {
        match &self.leaf_classes {
            Some(classes) if classes.len() > 1 => TopologyType::MultiClass,
            _ => TopologyType::SingleClass,
        }
    }

    /// When per-class definitions exist, the scalar `uplinks_per_leaf`,
    /// `endpoint_profile` and `endpoint_count` fields are only advisory.
    #[must_use]
    pub fn scalar_fields_advisory(&self) -> bool {
        self.topology_type() == TopologyType::MultiClass
    }

    /// Return a copy with one more metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
