//! Topology graph: switches, servers and the connections between them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// Position of a switch in the two-tier fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchRole {
    Spine,
    Leaf,
}

impl SwitchRole {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Spine => "spine",
            Self::Leaf => "leaf",
        }
    }
}

impl fmt::Display for SwitchRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three device kinds a topology is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Spine,
    Leaf,
    Server,
}

impl DeviceKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Spine => "spine",
            Self::Leaf => "leaf",
            Self::Server => "server",
        }
    }
}

impl From<SwitchRole> for DeviceKind {
    fn from(role: SwitchRole) -> Self {
        match role {
            SwitchRole::Spine => Self::Spine,
            SwitchRole::Leaf => Self::Leaf,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A spine or leaf switch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Switch {
    /// Stable identifier, unique among switches of the same role
    pub id: String,
    pub role: SwitchRole,
    /// Hardware model tag, used to look up the port profile
    pub model: String,
    /// Total front-panel port count
    pub ports: u32,
}

impl Switch {
    #[must_use]
    pub fn new(id: impl Into<String>, role: SwitchRole, model: impl Into<String>, ports: u32) -> Self {
        Self {
            id: id.into(),
            role,
            model: model.into(),
            ports,
        }
    }

    #[must_use]
    pub fn spine(id: impl Into<String>, model: impl Into<String>, ports: u32) -> Self {
        Self::new(id, SwitchRole::Spine, model, ports)
    }

    #[must_use]
    pub fn leaf(id: impl Into<String>, model: impl Into<String>, ports: u32) -> Self {
        Self::new(id, SwitchRole::Leaf, model, ports)
    }
}

/// An endpoint server attached to one or more leaves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    /// Server type tag (endpoint profile), e.g. `compute` or `storage`
    #[serde(rename = "type")]
    pub server_type: String,
    /// Number of NICs cabled into the fabric
    pub nics: u32,
}

impl Server {
    #[must_use]
    pub fn new(id: impl Into<String>, server_type: impl Into<String>, nics: u32) -> Self {
        Self {
            id: id.into(),
            server_type: server_type.into(),
            nics,
        }
    }
}

/// Connection type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// Leaf to spine fabric link
    Uplink,
    /// Leaf to server link
    Endpoint,
}

impl ConnectionKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uplink => "uplink",
            Self::Endpoint => "endpoint",
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortRef {
    pub device: String,
    pub port: String,
}

impl PortRef {
    #[must_use]
    pub fn new(device: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            port: port.into(),
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device, self.port)
    }
}

/// A typed cable between two device ports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
    pub source: PortRef,
    pub destination: PortRef,
}

impl Connection {
    #[must_use]
    pub const fn new(kind: ConnectionKind, source: PortRef, destination: PortRef) -> Self {
        Self {
            kind,
            source,
            destination,
        }
    }

    #[must_use]
    pub fn uplink(leaf: &str, leaf_port: &str, spine: &str, spine_port: &str) -> Self {
        Self::new(
            ConnectionKind::Uplink,
            PortRef::new(leaf, leaf_port),
            PortRef::new(spine, spine_port),
        )
    }

    #[must_use]
    pub fn endpoint(leaf: &str, leaf_port: &str, server: &str, server_port: &str) -> Self {
        Self::new(
            ConnectionKind::Endpoint,
            PortRef::new(leaf, leaf_port),
            PortRef::new(server, server_port),
        )
    }

    /// Whether either side of the connection lands on `device`.
    #[must_use]
    pub fn touches(&self, device: &str) -> bool {
        self.source.device == device || self.destination.device == device
    }

    /// The device on the other side from `device`, if the connection touches it.
    #[must_use]
    pub fn peer_of(&self, device: &str) -> Option<&str> {
        if self.source.device == device {
            Some(&self.destination.device)
        } else if self.destination.device == device {
            Some(&self.source.device)
        } else {
            None
        }
    }
}

/// Violations of the topology model invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelError {
    #[error("duplicate {kind} identifier '{id}'")]
    DuplicateId { kind: DeviceKind, id: String },

    #[error("connection {index} ({source_port} -> {destination_port}) references unknown device '{device}'")]
    UnknownDevice {
        index: usize,
        device: String,
        source_port: String,
        destination_port: String,
    },

    #[error("switch '{id}' has role {actual} but is listed among {expected} switches")]
    RoleMismatch {
        id: String,
        expected: SwitchRole,
        actual: SwitchRole,
    },
}

/// In-memory fabric topology.
///
/// Treated as an immutable value once built: the `with_*`/`without_*`
/// methods consume the model and return a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyModel {
    pub name: String,
    pub spines: Vec<Switch>,
    pub leaves: Vec<Switch>,
    pub servers: Vec<Server>,
    pub connections: Vec<Connection>,
}

impl TopologyModel {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spines: Vec::new(),
            leaves: Vec::new(),
            servers: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Add a switch to the list matching its role.
    #[must_use]
    pub fn with_switch(mut self, switch: Switch) -> Self {
        match switch.role {
            SwitchRole::Spine => self.spines.push(switch),
            SwitchRole::Leaf => self.leaves.push(switch),
        }
        self
    }

    #[must_use]
    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.push(server);
        self
    }

    #[must_use]
    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.connections.push(connection);
        self
    }

    /// Drop every device named `id` together with the connections touching it.
    #[must_use]
    pub fn without_device(mut self, id: &str) -> Self {
        self.spines.retain(|s| s.id != id);
        self.leaves.retain(|s| s.id != id);
        self.servers.retain(|s| s.id != id);
        self.connections.retain(|c| !c.touches(id));
        self
    }

    /// Iterate spines then leaves.
    pub fn switches(&self) -> impl Iterator<Item = &Switch> {
        self.spines.iter().chain(self.leaves.iter())
    }

    #[must_use]
    pub fn switch(&self, id: &str) -> Option<&Switch> {
        self.switches().find(|s| s.id == id)
    }

    #[must_use]
    pub fn server(&self, id: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.id == id)
    }

    /// Whether any device of any kind carries this identifier.
    #[must_use]
    pub fn has_device(&self, id: &str) -> bool {
        self.switch(id).is_some() || self.server(id).is_some()
    }

    /// Connections of the given kind that touch `device`.
    pub fn connections_of<'a>(
        &'a self,
        device: &'a str,
        kind: ConnectionKind,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.kind == kind && c.touches(device))
    }

    #[must_use]
    pub fn device_count(&self) -> usize {
        self.spines.len() + self.leaves.len() + self.servers.len()
    }

    /// Check the model invariants: device identifiers unique across spines,
    /// leaves and servers (connections name devices by bare id), switches
    /// stored under their own role, and connections that only reference
    /// declared devices.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_roles(&self.spines, SwitchRole::Spine)?;
        check_roles(&self.leaves, SwitchRole::Leaf)?;
        check_unique(
            self.spines
                .iter()
                .map(|s| (s.id.as_str(), DeviceKind::Spine))
                .chain(self.leaves.iter().map(|s| (s.id.as_str(), DeviceKind::Leaf)))
                .chain(self.servers.iter().map(|s| (s.id.as_str(), DeviceKind::Server))),
        )?;

        let known: HashSet<&str> = self
            .switches()
            .map(|s| s.id.as_str())
            .chain(self.servers.iter().map(|s| s.id.as_str()))
            .collect();

        for (index, conn) in self.connections.iter().enumerate() {
            for side in [&conn.source, &conn.destination] {
                if !known.contains(side.device.as_str()) {
                    return Err(ModelError::UnknownDevice {
                        index,
                        device: side.device.clone(),
                        source_port: conn.source.to_string(),
                        destination_port: conn.destination.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Stable 64-bit fingerprint of the model content.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        serde_json::to_vec(self).map_or(0, |bytes| xxh3_64(&bytes))
    }
}

fn check_roles(switches: &[Switch], expected: SwitchRole) -> Result<(), ModelError> {
    match switches.iter().find(|s| s.role != expected) {
        Some(s) => Err(ModelError::RoleMismatch {
            id: s.id.clone(),
            expected,
            actual: s.role,
        }),
        None => Ok(()),
    }
}

/// The reported kind is that of the second occurrence.
fn check_unique<'a>(ids: impl Iterator<Item = (&'a str, DeviceKind)>) -> Result<(), ModelError> {
    let mut seen = HashSet::new();
    for (id, kind) in ids {
        if !seen.insert(id) {
            return Err(ModelError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}
