//! Topology codecs.
//!
//! Two persisted formats describe the same [`TopologyModel`](crate::model::TopologyModel):
//!
//! - [`FgdCodec`]: the legacy golden definition, three plain YAML files
//! - [`ManifestCodec`]: custom-resource manifests, one document per entity
//!
//! Codecs are pure and operate on a [`FileSet`]; the [`store`](crate::store)
//! module owns the filesystem.

mod document;
mod fgd;
mod manifest;
mod traits;

pub use fgd::{FgdCodec, DEFAULT_FABRIC_NAME};
pub use manifest::{
    connection_names, resources_from_file_set, resources_from_text, ManifestCodec,
    CONNECTION_KIND, DEFAULT_API_VERSION, DEFAULT_NAMESPACE, FABRIC_KIND, FABRIC_LABEL,
    ROLE_LABEL, SERVER_KIND, SWITCH_KIND,
};
pub use traits::{CodecError, FileSet, FormatKind, TopologyCodec};

pub const SERVERS_FILE: &str = "servers.yaml";
pub const SWITCHES_FILE: &str = "switches.yaml";
pub const CONNECTIONS_FILE: &str = "connections.yaml";
/// Present only in the manifest layout.
pub const FABRIC_FILE: &str = "fabric.yaml";
