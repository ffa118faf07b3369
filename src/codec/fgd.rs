//! Legacy three-file golden definition (FGD) codec.
//!
//! ```yaml
//! # switches.yaml
//! fabric: lab
//! switches:
//!   - id: spine-1
//!     role: spine
//!     model: DS3000
//!     ports: 32
//! # servers.yaml
//! servers:
//!   - id: server-1
//!     type: compute
//!     nics: 2
//! # connections.yaml
//! connections:
//!   - type: uplink
//!     source: { device: leaf-1, port: E1/49 }
//!     destination: { device: spine-1, port: E1/1 }
//! ```

use super::document::{as_sequence, parse_document, require_key, require_keys, to_yaml, typed};
use super::traits::{CodecError, FileSet, FormatKind, TopologyCodec};
use super::{CONNECTIONS_FILE, SERVERS_FILE, SWITCHES_FILE};
use crate::model::{Connection, Server, Switch, SwitchRole, TopologyModel};
use serde::Serialize;
use serde_yaml::Value;

/// Fabric name used when `switches.yaml` does not carry one.
pub const DEFAULT_FABRIC_NAME: &str = "default";

const SWITCH_FIELDS: &[&str] = &["id", "role", "model", "ports"];
const SERVER_FIELDS: &[&str] = &["id", "type", "nics"];
const CONNECTION_FIELDS: &[&str] = &["type", "source", "destination"];
const PORT_FIELDS: &[&str] = &["device", "port"];

#[derive(Serialize)]
struct SwitchesDocument<'a> {
    fabric: &'a str,
    switches: Vec<&'a Switch>,
}

#[derive(Serialize)]
struct ServersDocument<'a> {
    servers: &'a [Server],
}

#[derive(Serialize)]
struct ConnectionsDocument<'a> {
    connections: &'a [Connection],
}

/// Codec for the legacy `servers` / `switches` / `connections` layout.
#[derive(Debug, Clone, Default)]
pub struct FgdCodec;

impl FgdCodec {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn decode_switches(text: &str) -> Result<(String, Vec<Switch>, Vec<Switch>), CodecError> {
        let file = SWITCHES_FILE;
        let root = parse_document(file, text)?;
        let records = as_sequence(file, "switches", require_key(file, "", &root, "switches")?)?;

        let name = match root.get("fabric") {
            None | Some(Value::Null) => DEFAULT_FABRIC_NAME.to_string(),
            Some(value) => typed::<String>(file, "fabric", value)?,
        };

        let mut spines = Vec::new();
        let mut leaves = Vec::new();
        for (i, record) in records.iter().enumerate() {
            let path = format!("switches[{i}]");
            require_keys(file, &path, record, SWITCH_FIELDS)?;
            let switch: Switch = typed(file, &path, record)?;
            match switch.role {
                SwitchRole::Spine => spines.push(switch),
                SwitchRole::Leaf => leaves.push(switch),
            }
        }
        Ok((name, spines, leaves))
    }

    fn decode_servers(text: &str) -> Result<Vec<Server>, CodecError> {
        let file = SERVERS_FILE;
        let root = parse_document(file, text)?;
        let records = as_sequence(file, "servers", require_key(file, "", &root, "servers")?)?;
        records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let path = format!("servers[{i}]");
                require_keys(file, &path, record, SERVER_FIELDS)?;
                typed(file, &path, record)
            })
            .collect()
    }

    fn decode_connections(text: &str) -> Result<Vec<Connection>, CodecError> {
        let file = CONNECTIONS_FILE;
        let root = parse_document(file, text)?;
        let records = as_sequence(
            file,
            "connections",
            require_key(file, "", &root, "connections")?,
        )?;
        records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let path = format!("connections[{i}]");
                require_keys(file, &path, record, CONNECTION_FIELDS)?;
                for side in ["source", "destination"] {
                    let side_path = format!("{path}.{side}");
                    require_keys(file, &side_path, require_key(file, &path, record, side)?, PORT_FIELDS)?;
                }
                typed(file, &path, record)
            })
            .collect()
    }
}

impl TopologyCodec for FgdCodec {
    fn format(&self) -> FormatKind {
        FormatKind::Fgd
    }

    fn encode(&self, model: &TopologyModel) -> Result<FileSet, CodecError> {
        let switches = SwitchesDocument {
            fabric: &model.name,
            switches: model.switches().collect(),
        };
        let servers = ServersDocument {
            servers: &model.servers,
        };
        let connections = ConnectionsDocument {
            connections: &model.connections,
        };

        Ok(FileSet::new()
            .with(SWITCHES_FILE, to_yaml(SWITCHES_FILE, &switches)?)
            .with(SERVERS_FILE, to_yaml(SERVERS_FILE, &servers)?)
            .with(CONNECTIONS_FILE, to_yaml(CONNECTIONS_FILE, &connections)?))
    }

    fn decode(&self, files: &FileSet) -> Result<TopologyModel, CodecError> {
        let (name, spines, leaves) = Self::decode_switches(files.require(SWITCHES_FILE)?)?;
        let servers = Self::decode_servers(files.require(SERVERS_FILE)?)?;
        let connections = Self::decode_connections(files.require(CONNECTIONS_FILE)?)?;

        let model = TopologyModel {
            name,
            spines,
            leaves,
            servers,
            connections,
        };
        model.validate().map_err(|e| CodecError::from_model(&e))?;
        tracing::debug!(
            fabric = %model.name,
            devices = model.device_count(),
            connections = model.connections.len(),
            "decoded legacy topology"
        );
        Ok(model)
    }
}
