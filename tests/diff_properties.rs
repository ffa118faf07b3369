//! Behavioural properties of the diff engine and semantic classifier.

use fabric_drift::codec::ManifestCodec;
use fabric_drift::diff::{ChangeKind, DiffEngine, Impact, SemanticClassifier};
use fabric_drift::model::{Connection, Resource, Server, Switch, TopologyModel};
use proptest::prelude::*;

fn resource() -> impl Strategy<Value = Resource> {
    (
        prop::sample::select(vec!["v1", "v2"]),
        prop::sample::select(vec!["ConfigMap", "Service", "Switch"]),
        "[a-c][0-3]",
        prop::option::of(prop::sample::select(vec!["prod", "dev"])),
    )
        .prop_map(|(api, kind, name, env)| {
            let r = Resource::new(api, kind, name);
            match env {
                Some(env) => r.with_label("env", env),
                None => r,
            }
        })
}

fn resources() -> impl Strategy<Value = Vec<Resource>> {
    prop::collection::vec(resource(), 0..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn comparing_a_set_with_itself_is_empty(set in resources()) {
        prop_assert!(DiffEngine::new().compare(&set, &set).is_empty());
    }

    #[test]
    fn missing_and_extra_swap_when_sides_swap(a in resources(), b in resources()) {
        let engine = DiffEngine::new();
        let forward = engine.compare(&a, &b);
        let backward = engine.compare(&b, &a);
        prop_assert_eq!(&forward.missing, &backward.extra);
        prop_assert_eq!(&forward.extra, &backward.missing);
    }

    #[test]
    fn partitions_are_disjoint_and_sorted(a in resources(), b in resources()) {
        let diff = DiffEngine::new().compare(&a, &b);
        for key in &diff.missing {
            prop_assert!(!diff.extra.contains(key));
            prop_assert!(!diff.different.iter().any(|d| &d.key == key));
        }
        prop_assert!(diff.missing.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(diff.extra.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(diff.different.windows(2).all(|w| w[0].key < w[1].key));
    }

    #[test]
    fn order_does_not_matter(a in resources(), b in resources()) {
        // Deduplicate first: with repeated keys the last occurrence wins.
        let mut seen = std::collections::HashSet::new();
        let unique: Vec<Resource> = a.into_iter().rev().filter(|r| seen.insert(r.key())).collect();
        let mut shuffled = unique.clone();
        shuffled.reverse();
        let engine = DiffEngine::new();
        prop_assert_eq!(engine.compare(&unique, &b), engine.compare(&shuffled, &b));
    }

    #[test]
    fn verdict_matches_breaking_count(a in resources(), b in resources()) {
        let classification = SemanticClassifier::default().classify(&a, &b);
        prop_assert_eq!(classification.is_valid, classification.breaking().next().is_none());
        prop_assert_eq!(classification.errors.len(), classification.breaking().count());
    }
}

#[test]
fn test_missing_service() {
    let expected = vec![
        Resource::new("v1", "ConfigMap", "config1"),
        Resource::new("v1", "Service", "service1"),
    ];
    let actual = vec![Resource::new("v1", "ConfigMap", "config1")];

    let diff = DiffEngine::new().compare(&expected, &actual);
    assert_eq!(diff.counts(), (1, 0, 0));
    assert_eq!(diff.missing[0].kind, "Service");
    assert_eq!(diff.missing[0].name, "service1");
}

#[test]
fn test_label_and_api_version_changes() {
    let expected = vec![Resource::new("v1", "ConfigMap", "config1").with_label("env", "prod")];
    let actual = vec![Resource::new("v2", "ConfigMap", "config1").with_label("env", "dev")];

    let diff = DiffEngine::new().compare(&expected, &actual);
    assert_eq!(diff.different.len(), 1);
    assert_eq!(diff.different[0].fields.len(), 2);
    assert!(diff.different[0]
        .differences
        .iter()
        .any(|d| d == "label env: expected prod, got dev"));
}

fn fabric() -> TopologyModel {
    TopologyModel::new("lab")
        .with_switch(Switch::spine("spine-1", "DS3000", 32))
        .with_switch(Switch::spine("spine-2", "DS3000", 32))
        .with_switch(Switch::leaf("leaf-1", "DS2000", 56))
        .with_server(Server::new("server-1", "compute", 1))
        .with_connection(Connection::uplink("leaf-1", "E1/49", "spine-1", "E1/1"))
        .with_connection(Connection::uplink("leaf-1", "E1/50", "spine-2", "E1/1"))
        .with_connection(Connection::endpoint("leaf-1", "E1/1", "server-1", "eth0"))
}

#[test]
fn test_removing_a_switch_is_breaking() {
    let codec = ManifestCodec::default();
    let before = codec.to_resources(&fabric());
    let after = codec.to_resources(&fabric().without_device("spine-2"));

    let classification = SemanticClassifier::default().classify(&before, &after);
    assert!(!classification.is_valid);
    let breaking: Vec<_> = classification.breaking().collect();
    assert!(breaking
        .iter()
        .any(|d| d.key.kind == "Switch" && d.key.name == "spine-2" && d.change == ChangeKind::Missing));
    assert!(breaking.iter().any(|d| d.key.kind == "Connection"));
}

#[test]
fn test_display_name_rename_is_cosmetic() {
    let codec = ManifestCodec::default();
    let before: Vec<Resource> = codec
        .to_resources(&fabric())
        .into_iter()
        .map(|r| r.with_label("displayName", "Lab fabric"))
        .collect();
    let after: Vec<Resource> = codec
        .to_resources(&fabric())
        .into_iter()
        .map(|r| r.with_label("displayName", "Lab fabric (renamed)"))
        .collect();

    let classification = SemanticClassifier::default().classify(&before, &after);
    assert!(classification.is_valid, "{:?}", classification.errors);
    assert!(classification.breaking().next().is_none());
    assert!(classification.cosmetic().all(|d| d.impact == Impact::Cosmetic));
    assert_eq!(classification.cosmetic().count(), before.len());
}

#[test]
fn test_extra_non_structural_kind_is_cosmetic() {
    let codec = ManifestCodec::default();
    let before = codec.to_resources(&fabric());
    let mut after = before.clone();
    after.push(Resource::new("v1", "ConfigMap", "lab-notes"));

    let classification = SemanticClassifier::default().classify(&before, &after);
    assert!(classification.is_valid);
    assert_eq!(classification.cosmetic().count(), 1);

    after.push(Resource::new("fabric.topology.io/v1alpha1", "Switch", "spine-9"));
    let classification = SemanticClassifier::default().classify(&before, &after);
    assert!(!classification.is_valid);
}

#[test]
fn test_dropped_cable_is_seen_when_names_look_suffixed() {
    let with_both = fabric()
        .with_server(Server::new("server-1-2", "compute", 1))
        .with_connection(Connection::endpoint("leaf-1", "E1/2", "server-1", "eth1"))
        .with_connection(Connection::endpoint("leaf-1", "E1/3", "server-1-2", "eth0"));
    let mut without_second = with_both.clone();
    without_second.connections.retain(|c| c.source.port != "E1/2");

    let codec = ManifestCodec::default();
    let before = codec.to_resources(&with_both);
    let after = codec.to_resources(&without_second);

    let mut names: Vec<&str> = before
        .iter()
        .filter(|r| r.kind == "Connection")
        .map(|r| r.metadata.name.as_str())
        .collect();
    let total = names.len();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), total);

    let classification = SemanticClassifier::default().classify(&before, &after);
    assert!(!classification.is_valid);
    assert!(classification
        .breaking()
        .any(|d| d.key.kind == "Connection" && d.change == ChangeKind::Missing));
}
