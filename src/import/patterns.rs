//! Leaf pattern detection and spec inference.
//!
//! Both entry points are pure functions of the decoded model. Inference
//! returns a best-effort spec together with the assumptions and warnings
//! that qualify it, so callers can tell detected values from defaults.

use super::provenance::DetectedPatterns;
use crate::model::{ConnectionKind, FabricSpec, LeafClass, Switch, TopologyModel, TopologyType};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Placeholder used when a value cannot be observed.
pub const UNKNOWN: &str = "unknown";

/// What one leaf looks like from the connection list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafPattern {
    pub leaf_id: String,
    pub uplinks: u32,
    pub endpoint_links: u32,
    pub server_types: BTreeSet<String>,
}

/// Per-leaf patterns grouped into classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternAnalysis {
    pub patterns: DetectedPatterns,
    pub leaves: Vec<LeafPattern>,
    /// Classes in ascending (uplink count, server types) order
    pub classes: Vec<LeafClass>,
}

/// Best-effort spec plus everything that qualifies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inference {
    pub spec: FabricSpec,
    pub analysis: PatternAnalysis,
    pub assumptions: Vec<String>,
    pub warnings: Vec<String>,
}

fn leaf_pattern(model: &TopologyModel, leaf: &Switch) -> LeafPattern {
    let uplinks = model.connections_of(&leaf.id, ConnectionKind::Uplink).count() as u32;
    let mut endpoint_links = 0;
    let mut server_types = BTreeSet::new();
    for conn in model.connections_of(&leaf.id, ConnectionKind::Endpoint) {
        endpoint_links += 1;
        if let Some(server) = conn.peer_of(&leaf.id).and_then(|peer| model.server(peer)) {
            server_types.insert(server.server_type.clone());
        }
    }
    LeafPattern {
        leaf_id: leaf.id.clone(),
        uplinks,
        endpoint_links,
        server_types,
    }
}

/// Group leaves by (uplink count, reachable server types).
#[must_use]
pub fn detect_patterns(model: &TopologyModel) -> PatternAnalysis {
    let leaves: Vec<LeafPattern> = model.leaves.iter().map(|l| leaf_pattern(model, l)).collect();

    let mut groups: BTreeMap<(u32, BTreeSet<String>), Vec<&LeafPattern>> = BTreeMap::new();
    for leaf in &leaves {
        groups
            .entry((leaf.uplinks, leaf.server_types.clone()))
            .or_default()
            .push(leaf);
    }

    let classes: Vec<LeafClass> = groups
        .into_iter()
        .enumerate()
        .map(|(i, ((uplinks, types), members))| LeafClass {
            class_id: format!("class-{}", i + 1),
            uplinks_per_leaf: uplinks,
            endpoint_profiles: types.into_iter().collect(),
            endpoints_per_leaf: members.iter().map(|m| m.endpoint_links).max().unwrap_or(0),
            leaf_ids: members.iter().map(|m| m.leaf_id.clone()).collect(),
        })
        .collect();

    let patterns = DetectedPatterns {
        topology_type: if classes.len() > 1 {
            TopologyType::MultiClass
        } else {
            TopologyType::SingleClass
        },
        spine_count: model.spines.len(),
        leaf_count: model.leaves.len(),
        server_types: model.servers.iter().map(|s| s.server_type.clone()).collect(),
        uplink_counts: leaves.iter().map(|l| l.uplinks).collect(),
    };

    PatternAnalysis {
        patterns,
        leaves,
        classes,
    }
}

/// Most common model among `switches`, ties broken alphabetically.
fn dominant_model<'a>(switches: &'a [Switch]) -> Option<(&'a str, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for s in switches {
        *counts.entry(s.model.as_str()).or_default() += 1;
    }
    let distinct = counts.len();
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (model, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((model, n)),
        })
        .map(|(model, _)| (model, distinct))
}

fn model_id(role: &str, switches: &[Switch], assumptions: &mut Vec<String>, warnings: &mut Vec<String>) -> String {
    match dominant_model(switches) {
        None => {
            assumptions.push(format!("no {role} switches declared; {role} model recorded as '{UNKNOWN}'"));
            UNKNOWN.to_string()
        }
        Some((model, distinct)) => {
            if distinct > 1 {
                let all: BTreeSet<&str> = switches.iter().map(|s| s.model.as_str()).collect();
                warnings.push(format!(
                    "{role} switches use {distinct} models ({}); recorded the most common, '{model}'",
                    all.into_iter().collect::<Vec<_>>().join(", ")
                ));
            }
            model.to_string()
        }
    }
}

fn profile_name(types: &[String]) -> Option<String> {
    if types.is_empty() {
        None
    } else {
        Some(types.join("+"))
    }
}

/// Infer a fabric spec from a decoded model.
#[must_use]
pub fn infer_spec(model: &TopologyModel) -> Inference {
    let analysis = detect_patterns(model);
    let mut assumptions = Vec::new();
    let mut warnings = Vec::new();

    let spine_model_id = model_id("spine", &model.spines, &mut assumptions, &mut warnings);
    let leaf_model_id = model_id("leaf", &model.leaves, &mut assumptions, &mut warnings);

    for leaf in &analysis.leaves {
        if leaf.uplinks == 0 {
            warnings.push(format!("leaf '{}' has no uplinks", leaf.leaf_id));
        }
    }
    for spine in &model.spines {
        if model.connections_of(&spine.id, ConnectionKind::Uplink).next().is_none() {
            warnings.push(format!("spine '{}' terminates no uplinks", spine.id));
        }
    }

    let attached: HashSet<&str> = model
        .connections
        .iter()
        .filter(|c| c.kind == ConnectionKind::Endpoint)
        .flat_map(|c| [c.source.device.as_str(), c.destination.device.as_str()])
        .filter(|id| model.server(id).is_some())
        .collect();
    for server in &model.servers {
        if !attached.contains(server.id.as_str()) {
            warnings.push(format!("server '{}' has no endpoint connection", server.id));
        }
    }
    let endpoint_count = attached.len() as u32;

    let first = analysis.classes.first();
    let uplinks_per_leaf = first.map_or(0, |c| c.uplinks_per_leaf);
    let endpoint_profile = match first.and_then(|c| profile_name(&c.endpoint_profiles)) {
        Some(profile) => profile,
        None => {
            assumptions.push(format!(
                "no server types reachable through leaves; endpoint profile recorded as '{UNKNOWN}'"
            ));
            UNKNOWN.to_string()
        }
    };
    if first.is_none() {
        assumptions.push("no leaves declared; uplinks per leaf recorded as 0".to_string());
    }

    let leaf_classes = match analysis.patterns.topology_type {
        TopologyType::SingleClass => {
            if let Some(class) = first {
                if class.endpoint_profiles.len() > 1 {
                    warnings.push(format!(
                        "leaves reach mixed server types ({}); endpoint profile recorded as '{endpoint_profile}'",
                        class.endpoint_profiles.join(", ")
                    ));
                }
            }
            None
        }
        TopologyType::MultiClass => {
            assumptions.push(format!(
                "{} leaf classes detected; scalar uplinksPerLeaf and endpointProfile taken from class-1 and are advisory",
                analysis.classes.len()
            ));
            Some(analysis.classes.clone())
        }
    };

    let spec = FabricSpec {
        name: model.name.clone(),
        spine_model_id,
        leaf_model_id,
        uplinks_per_leaf,
        endpoint_profile,
        endpoint_count,
        leaf_classes,
        metadata: BTreeMap::new(),
    };

    Inference {
        spec,
        analysis,
        assumptions,
        warnings,
    }
}
