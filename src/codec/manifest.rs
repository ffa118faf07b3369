//! Custom-resource manifest codec.
//!
//! A fabric is persisted as four multi-document YAML files: one `Fabric`
//! document in `fabric.yaml` and one document per switch, server and
//! connection in the remaining files. Every document carries `apiVersion`,
//! `kind`, `metadata.name`, `metadata.namespace`, optional `metadata.labels`
//! and a `spec`.

use super::document::{parse_documents, require_key, require_keys, to_yaml, typed, join_documents};
use super::traits::{CodecError, FileSet, FormatKind, TopologyCodec};
use super::{CONNECTIONS_FILE, FABRIC_FILE, SERVERS_FILE, SWITCHES_FILE};
use crate::model::{
    Connection, ConnectionKind, PortRef, Resource, Server, Switch, SwitchRole, TopologyModel,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};

/// Default API group/version written into every document.
pub const DEFAULT_API_VERSION: &str = "fabric.topology.io/v1alpha1";
/// Default namespace written into every document.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Label naming the fabric a resource belongs to.
pub const FABRIC_LABEL: &str = "fabric.topology.io/fabric";
/// Label carrying the switch role, server type or connection type.
pub const ROLE_LABEL: &str = "fabric.topology.io/role";

pub const FABRIC_KIND: &str = "Fabric";
pub const SWITCH_KIND: &str = "Switch";
pub const SERVER_KIND: &str = "Server";
pub const CONNECTION_KIND: &str = "Connection";

const DOCUMENT_FIELDS: &[&str] = &["apiVersion", "kind", "metadata", "spec"];

#[derive(Debug, Serialize, Deserialize)]
struct SwitchSpec {
    role: SwitchRole,
    model: String,
    ports: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ServerSpec {
    #[serde(rename = "type")]
    server_type: String,
    nics: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConnectionSpec {
    #[serde(rename = "type")]
    kind: ConnectionKind,
    source: PortRef,
    destination: PortRef,
}

/// Derive connection resource names as `<sourceDevice>-<destDevice>`.
///
/// Repeated device pairs get `-2`, `-3`, ... suffixes in declaration order.
/// A suffixed name that another pair already produces is skipped, so names
/// are unique across the whole list and stable for an unchanged one.
#[must_use]
pub fn connection_names(connections: &[Connection]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut next: HashMap<String, usize> = HashMap::new();
    connections
        .iter()
        .map(|c| {
            let base = format!("{}-{}", c.source.device, c.destination.device);
            let n = next.entry(base.clone()).or_insert(1);
            let mut name = if *n == 1 { base.clone() } else { format!("{base}-{n}") };
            while used.contains(&name) {
                *n += 1;
                name = format!("{base}-{n}");
            }
            *n += 1;
            used.insert(name.clone());
            name
        })
        .collect()
}

/// Codec for the custom-resource manifest layout.
#[derive(Debug, Clone)]
pub struct ManifestCodec {
    api_version: String,
    namespace: String,
}

impl Default for ManifestCodec {
    fn default() -> Self {
        Self::new(DEFAULT_API_VERSION, DEFAULT_NAMESPACE)
    }
}

impl ManifestCodec {
    #[must_use]
    pub fn new(api_version: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            namespace: namespace.into(),
        }
    }

    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn resource(&self, kind: &str, name: &str, fabric: &str, role: &str) -> Resource {
        Resource::new(&self.api_version, kind, name)
            .with_namespace(&self.namespace)
            .with_label(FABRIC_LABEL, fabric)
            .with_label(ROLE_LABEL, role)
    }

    /// Express a model as manifest resources: the fabric, then switches
    /// (spines first), servers and connections in declaration order.
    pub fn to_resources(&self, model: &TopologyModel) -> Vec<Resource> {
        let mut resources = Vec::with_capacity(1 + model.device_count() + model.connections.len());

        resources.push(
            self.resource(FABRIC_KIND, &model.name, &model.name, "fabric")
                .with_spec(json!({
                    "spines": model.spines.len(),
                    "leaves": model.leaves.len(),
                    "servers": model.servers.len(),
                    "connections": model.connections.len(),
                })),
        );

        for switch in model.switches() {
            resources.push(
                self.resource(SWITCH_KIND, &switch.id, &model.name, switch.role.as_str())
                    .with_spec(json!({
                        "role": switch.role,
                        "model": switch.model,
                        "ports": switch.ports,
                    })),
            );
        }

        for server in &model.servers {
            resources.push(
                self.resource(SERVER_KIND, &server.id, &model.name, &server.server_type)
                    .with_spec(json!({
                        "type": server.server_type,
                        "nics": server.nics,
                    })),
            );
        }

        let names = connection_names(&model.connections);
        for (conn, name) in model.connections.iter().zip(names) {
            resources.push(
                self.resource(CONNECTION_KIND, &name, &model.name, conn.kind.as_str())
                    .with_spec(json!({
                        "type": conn.kind,
                        "source": conn.source,
                        "destination": conn.destination,
                    })),
            );
        }

        resources
    }

    fn encode_documents(file: &str, resources: &[&Resource]) -> Result<String, CodecError> {
        let docs = resources
            .iter()
            .map(|r| to_yaml(file, r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(join_documents(&docs))
    }
}

/// Parse every document of a manifest file into resources.
pub fn resources_from_text(file: &str, text: &str) -> Result<Vec<Resource>, CodecError> {
    parse_documents(file, text)?
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let path = format!("documents[{i}]");
            require_keys(file, &path, doc, DOCUMENT_FIELDS)?;
            require_key(file, &format!("{path}.metadata"), require_key(file, &path, doc, "metadata")?, "name")?;
            typed::<Resource>(file, &path, doc)
        })
        .collect()
}

/// Parse every manifest file of a file set into one resource list.
///
/// Used to diff arbitrary manifests without building a topology model, so
/// unknown kinds are kept as-is.
pub fn resources_from_file_set(files: &FileSet) -> Result<Vec<Resource>, CodecError> {
    let mut resources = Vec::new();
    for (name, text) in files.iter() {
        resources.extend(resources_from_text(name, text)?);
    }
    Ok(resources)
}

fn expect_kind(file: &str, index: usize, resource: &Resource, kind: &str) -> Result<(), CodecError> {
    if resource.kind == kind {
        Ok(())
    } else {
        Err(CodecError::schema(
            file,
            format!("documents[{index}].kind"),
            format!("expected kind {kind}, found {}", resource.kind),
        ))
    }
}

fn spec_of<T: for<'de> Deserialize<'de>>(
    file: &str,
    index: usize,
    resource: &Resource,
) -> Result<T, CodecError> {
    serde_json::from_value(resource.spec.clone())
        .map_err(|e| CodecError::schema(file, format!("documents[{index}].spec"), e.to_string()))
}

impl TopologyCodec for ManifestCodec {
    fn format(&self) -> FormatKind {
        FormatKind::Manifest
    }

    fn encode(&self, model: &TopologyModel) -> Result<FileSet, CodecError> {
        let resources = self.to_resources(model);
        let of_kind = |kind: &str| resources.iter().filter(|r| r.kind == kind).collect::<Vec<_>>();

        Ok(FileSet::new()
            .with(FABRIC_FILE, Self::encode_documents(FABRIC_FILE, &of_kind(FABRIC_KIND))?)
            .with(SWITCHES_FILE, Self::encode_documents(SWITCHES_FILE, &of_kind(SWITCH_KIND))?)
            .with(SERVERS_FILE, Self::encode_documents(SERVERS_FILE, &of_kind(SERVER_KIND))?)
            .with(
                CONNECTIONS_FILE,
                Self::encode_documents(CONNECTIONS_FILE, &of_kind(CONNECTION_KIND))?,
            ))
    }

    fn decode(&self, files: &FileSet) -> Result<TopologyModel, CodecError> {
        let fabrics = resources_from_text(FABRIC_FILE, files.require(FABRIC_FILE)?)?;
        let fabric = match fabrics.as_slice() {
            [one] => one,
            [] => {
                return Err(CodecError::schema(
                    FABRIC_FILE,
                    "documents",
                    "expected exactly one Fabric document, found none",
                ))
            }
            many => {
                return Err(CodecError::schema(
                    FABRIC_FILE,
                    "documents",
                    format!("expected exactly one Fabric document, found {}", many.len()),
                ))
            }
        };
        expect_kind(FABRIC_FILE, 0, fabric, FABRIC_KIND)?;
        let mut model = TopologyModel::new(fabric.name());

        for (i, res) in resources_from_text(SWITCHES_FILE, files.require(SWITCHES_FILE)?)?
            .iter()
            .enumerate()
        {
            expect_kind(SWITCHES_FILE, i, res, SWITCH_KIND)?;
            let spec: SwitchSpec = spec_of(SWITCHES_FILE, i, res)?;
            model = model.with_switch(Switch::new(res.name(), spec.role, spec.model, spec.ports));
        }

        for (i, res) in resources_from_text(SERVERS_FILE, files.require(SERVERS_FILE)?)?
            .iter()
            .enumerate()
        {
            expect_kind(SERVERS_FILE, i, res, SERVER_KIND)?;
            let spec: ServerSpec = spec_of(SERVERS_FILE, i, res)?;
            model = model.with_server(Server::new(res.name(), spec.server_type, spec.nics));
        }

        for (i, res) in resources_from_text(CONNECTIONS_FILE, files.require(CONNECTIONS_FILE)?)?
            .iter()
            .enumerate()
        {
            expect_kind(CONNECTIONS_FILE, i, res, CONNECTION_KIND)?;
            let spec: ConnectionSpec = spec_of(CONNECTIONS_FILE, i, res)?;
            model = model.with_connection(Connection::new(spec.kind, spec.source, spec.destination));
        }

        model.validate().map_err(|e| CodecError::from_model(&e))?;
        tracing::debug!(
            fabric = %model.name,
            devices = model.device_count(),
            connections = model.connections.len(),
            "decoded manifest topology"
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> TopologyModel {
        TopologyModel::new("lab")
            .with_switch(Switch::spine("spine-1", "DS3000", 32))
            .with_switch(Switch::leaf("leaf-1", "DS2000", 56))
            .with_server(Server::new("server-1", "compute", 2))
            .with_connection(Connection::uplink("leaf-1", "E1/49", "spine-1", "E1/1"))
            .with_connection(Connection::uplink("leaf-1", "E1/50", "spine-1", "E1/2"))
            .with_connection(Connection::endpoint("leaf-1", "E1/1", "server-1", "eth0"))
    }

    #[test]
    fn test_round_trip() {
        let codec = ManifestCodec::default();
        let files = codec.encode(&model()).expect("encode");
        assert_eq!(files.len(), 4);
        assert_eq!(codec.decode(&files).expect("decode"), model());
    }

    #[test]
    fn test_encode_is_deterministic() {
        let codec = ManifestCodec::default();
        assert_eq!(
            codec.encode(&model()).expect("encode"),
            codec.encode(&model()).expect("encode")
        );
    }

    #[test]
    fn test_connection_names() {
        let names = connection_names(&model().connections);
        assert_eq!(names, vec!["leaf-1-spine-1", "leaf-1-spine-1-2", "leaf-1-server-1"]);
    }

    #[test]
    fn test_connection_names_never_collide_with_suffixes() {
        let connections = vec![
            Connection::endpoint("leaf-1", "E1/1", "server-1", "eth0"),
            Connection::endpoint("leaf-1", "E1/2", "server-1", "eth1"),
            Connection::endpoint("leaf-1", "E1/3", "server-1-2", "eth0"),
        ];
        assert_eq!(
            connection_names(&connections),
            vec!["leaf-1-server-1", "leaf-1-server-1-2", "leaf-1-server-1-2-2"]
        );

        let reversed: Vec<Connection> = connections.into_iter().rev().collect();
        assert_eq!(
            connection_names(&reversed),
            vec!["leaf-1-server-1-2", "leaf-1-server-1", "leaf-1-server-1-3"]
        );
    }

    #[test]
    fn test_resources_carry_metadata() {
        let resources = ManifestCodec::new("example.io/v1", "it-7").to_resources(&model());
        assert_eq!(resources.len(), 7);
        assert_eq!(resources[0].kind, FABRIC_KIND);
        for r in &resources {
            assert_eq!(r.api_version, "example.io/v1");
            assert_eq!(r.metadata.namespace.as_deref(), Some("it-7"));
            assert_eq!(r.label(FABRIC_LABEL), Some("lab"));
        }
        assert_eq!(resources[2].label(ROLE_LABEL), Some("leaf"));
    }

    #[test]
    fn test_missing_fabric_document() {
        let files = ManifestCodec::default()
            .encode(&model())
            .expect("encode")
            .with(FABRIC_FILE, "");
        let err = ManifestCodec::default().decode(&files).unwrap_err();
        assert_eq!(err.file(), FABRIC_FILE);
        assert!(matches!(err, CodecError::Schema { .. }));
    }

    #[test]
    fn test_missing_metadata_name() {
        let text = "apiVersion: v1\nkind: Server\nmetadata:\n  namespace: default\nspec:\n  type: compute\n  nics: 1\n";
        match resources_from_text(SERVERS_FILE, text).unwrap_err() {
            CodecError::Schema { field, .. } => assert_eq!(field, "documents[0].metadata.name"),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_kind_in_file() {
        let codec = ManifestCodec::default();
        let files = codec.encode(&model()).expect("encode");
        let swapped = files
            .clone()
            .with(SERVERS_FILE, files.get(SWITCHES_FILE).unwrap_or_default().to_string());
        match codec.decode(&swapped).unwrap_err() {
            CodecError::Schema { file, field, .. } => {
                assert_eq!(file, SERVERS_FILE);
                assert_eq!(field, "documents[0].kind");
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_spec_payload() {
        let text = "apiVersion: v1\nkind: Switch\nmetadata:\n  name: leaf-1\nspec:\n  role: leaf\n";
        let files = ManifestCodec::default()
            .encode(&model())
            .expect("encode")
            .with(SWITCHES_FILE, text);
        match ManifestCodec::default().decode(&files).unwrap_err() {
            CodecError::Schema { file, field, .. } => {
                assert_eq!(file, SWITCHES_FILE);
                assert_eq!(field, "documents[0].spec");
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }
}
