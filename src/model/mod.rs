//! In-memory data model.
//!
//! - [`TopologyModel`]: spines, leaves, servers and typed connections, as
//!   decoded from either persisted format.
//! - [`FabricSpec`]: the canonical, minimal intent reconstructed by the importer.
//! - [`Resource`]: manifest-style objects compared by the diff engine, whether
//!   they come from manifest files or from a live cluster.

mod resource;
mod spec;
mod topology;

pub use resource::*;
pub use spec::*;
pub use topology::*;
