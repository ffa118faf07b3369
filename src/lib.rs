//! **Network fabric topology import, drift detection and cluster reconciliation.**
//!
//! `fabric-drift` reads a fabric topology persisted in either of two layouts,
//! reconstructs the minimal fabric spec that produced it, compares resource
//! sets across save cycles, and waits for a live cluster to converge on an
//! expected set.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: the format-neutral [`TopologyModel`], the reconstructed
//!   [`FabricSpec`], and generic cluster [`Resource`]s.
//! - **[`codec`]**: the legacy three-file layout ([`FgdCodec`]) and the
//!   custom-resource manifest layout ([`ManifestCodec`]).
//! - **[`store`]**: fabric-scoped directories on disk.
//! - **[`import`]**: pattern detection, spec inference, provenance and port
//!   capacity validation.
//! - **[`diff`]**: the structural [`DiffEngine`] and the breaking vs. cosmetic
//!   [`SemanticClassifier`].
//! - **[`reconcile`]**: the backoff-driven [`Poller`] over a [`ClusterClient`].
//! - **[`cluster`]**: a read-only Kubernetes list client. Requires the
//!   `cluster` feature (on by default).
//! - **[`reports`]**: summary and JSON output.
//!
//! ## Importing a layout
//!
//! ```no_run
//! use std::path::Path;
//! use fabric_drift::import::Importer;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let result = Importer::new().import(Path::new("state/lab/fgd"))?;
//!
//!     println!(
//!         "{} is {} with {} endpoints",
//!         result.fabric_spec.name,
//!         result.fabric_spec.topology_type(),
//!         result.fabric_spec.endpoint_count
//!     );
//!     for error in &result.validation.errors {
//!         println!("  {error}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Diffing resource sets
//!
//! ```
//! use fabric_drift::diff::DiffEngine;
//! use fabric_drift::model::Resource;
//!
//! let expected = vec![
//!     Resource::new("v1", "ConfigMap", "config1"),
//!     Resource::new("v1", "Service", "service1"),
//! ];
//! let actual = vec![Resource::new("v1", "ConfigMap", "config1")];
//!
//! let diff = DiffEngine::new().compare(&expected, &actual);
//! assert_eq!(diff.missing[0].to_string(), "Service/service1");
//! assert!(diff.extra.is_empty() && diff.different.is_empty());
//! ```

#![warn(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_possible_truncation,
    clippy::module_name_repetitions
)]

pub mod cli;
#[cfg(feature = "cluster")]
pub mod cluster;
pub mod codec;
pub mod config;
pub mod diff;
pub mod error;
pub mod import;
pub mod model;
pub mod reconcile;
pub mod reports;
pub mod store;

pub use config::{AppConfig, ConfigError, ConfigPreset, Validatable};
pub use codec::{CodecError, FgdCodec, FileSet, FormatKind, ManifestCodec, TopologyCodec};
pub use diff::{Classification, DiffEngine, ResourceDiff, SemanticClassifier};
pub use error::{ErrorContext, FabricDriftError, Result};
pub use import::{ImportError, ImportResult, Importer, ValidationReport};
pub use model::{FabricSpec, LeafClass, Resource, ResourceKey, TopologyModel, TopologyType};
pub use reconcile::{
    BackoffPolicy, CancellationToken, ClusterClient, FetchError, PollOutcome, PollStatus, Poller,
    RunScope,
};
pub use reports::{ReportFormat, ReportGenerator};
pub use store::{DirectoryStore, StateStore, StoreError};
