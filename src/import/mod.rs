//! Topology import: reconstruct a canonical [`FabricSpec`] from persisted files.
//!
//! Import reads whichever layout lives at a path, decodes it, infers the
//! leaf patterns, validates port capacity and records how every value was
//! obtained:
//!
//! ```ignore
//! use fabric_drift::import::Importer;
//!
//! let result = Importer::new().import(Path::new("state/lab"))?;
//! println!("{} ({})", result.fabric_spec.name, result.fabric_spec.topology_type());
//! for warning in result.provenance.warnings() {
//!     println!("warning: {warning}");
//! }
//! ```

mod capacity;
mod patterns;
mod provenance;

pub use capacity::{
    builtin_profiles, CapacityValidator, IssueSeverity, SwitchProfile, ValidationIssue,
    ValidationReport, DEFAULT_NEAR_CAPACITY_THRESHOLD,
};
pub use patterns::{detect_patterns, infer_spec, Inference, LeafPattern, PatternAnalysis, UNKNOWN};
pub use provenance::{DetectedPatterns, Provenance, ProvenanceBuilder, IMPORT_SOURCE};

use crate::codec::CodecError;
use crate::model::{FabricSpec, LeafClass, TopologyModel};
use crate::store::{read_layout, StoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Spec metadata keys written by the importer.
pub mod metadata_keys {
    pub const IMPORT_SOURCE: &str = "importSource";
    pub const ORIGINAL_PATH: &str = "originalPath";
    pub const MODEL_FINGERPRINT: &str = "modelFingerprint";
    /// Prefix for per-file modification times, e.g. `originalModified/servers.yaml`.
    pub const ORIGINAL_MODIFIED: &str = "originalModified";
}

/// Import failures. Capacity problems are not errors; see [`ValidationReport`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ImportError {
    /// The layout could not be found or read.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A file was read but could not be decoded.
    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
}

/// Everything an import produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub fabric_spec: FabricSpec,
    /// Every detected class, including the single one of a homogeneous fabric
    pub leaf_classes: Vec<LeafClass>,
    pub provenance: Provenance,
    pub validation: ValidationReport,
}

/// Imports persisted layouts.
#[derive(Debug, Clone, Default)]
pub struct Importer {
    validator: CapacityValidator,
}

impl Importer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_validator(mut self, validator: CapacityValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Read, decode and import the layout at `path`.
    pub fn import(&self, path: &Path) -> Result<ImportResult, ImportError> {
        let layout = read_layout(path)?;
        let model = layout
            .format
            .codec()
            .decode(&layout.files)
            .map_err(|source| ImportError::Decode {
                path: layout.path_of(source.file()),
                source,
            })?;

        tracing::debug!(
            format = %layout.format,
            dir = %layout.dir.display(),
            "decoded layout for import"
        );
        Ok(self.import_model(&model, path, &layout.modified))
    }

    /// Import an already decoded model.
    ///
    /// `modified` maps file names to their modification times and is copied
    /// into the spec metadata; pass an empty map when there are no files.
    #[must_use]
    pub fn import_model(
        &self,
        model: &TopologyModel,
        origin: &Path,
        modified: &BTreeMap<String, DateTime<Utc>>,
    ) -> ImportResult {
        let inference = infer_spec(model);

        let mut spec = inference
            .spec
            .with_metadata(metadata_keys::IMPORT_SOURCE, IMPORT_SOURCE)
            .with_metadata(metadata_keys::ORIGINAL_PATH, origin.display().to_string())
            .with_metadata(
                metadata_keys::MODEL_FINGERPRINT,
                format!("{:016x}", model.fingerprint()),
            );
        for (file, time) in modified {
            spec = spec.with_metadata(
                format!("{}/{file}", metadata_keys::ORIGINAL_MODIFIED),
                time.to_rfc3339(),
            );
        }

        let mut provenance = ProvenanceBuilder::new(origin, inference.analysis.patterns.clone());
        for assumption in inference.assumptions {
            provenance.assume(assumption);
        }
        for warning in inference.warnings {
            provenance.warn(warning);
        }
        let provenance = provenance.finish();

        let validation = self.validator.check(model);

        tracing::info!(
            fabric = %spec.name,
            topology = %spec.topology_type(),
            spines = provenance.detected_patterns().spine_count,
            leaves = provenance.detected_patterns().leaf_count,
            valid = validation.is_valid,
            errors = validation.errors.len(),
            warnings = validation.warnings.len() + provenance.warnings().len(),
            "imported fabric"
        );

        ImportResult {
            fabric_spec: spec,
            leaf_classes: inference.analysis.classes,
            provenance,
            validation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Connection, Server, Switch, TopologyType};

    fn model() -> TopologyModel {
        TopologyModel::new("lab")
            .with_switch(Switch::spine("spine-1", "DS3000", 32))
            .with_switch(Switch::leaf("leaf-1", "DS2000", 56))
            .with_server(Server::new("server-1", "compute", 1))
            .with_connection(Connection::uplink("leaf-1", "E1/49", "spine-1", "E1/1"))
            .with_connection(Connection::endpoint("leaf-1", "E1/1", "server-1", "eth0"))
    }

    #[test]
    fn test_metadata_recorded() {
        let modified = BTreeMap::from([(
            "servers.yaml".to_string(),
            DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
                .expect("timestamp")
                .with_timezone(&Utc),
        )]);
        let result = Importer::new().import_model(&model(), Path::new("/state/lab"), &modified);
        let meta = &result.fabric_spec.metadata;

        assert_eq!(meta[metadata_keys::IMPORT_SOURCE], "import");
        assert_eq!(meta[metadata_keys::ORIGINAL_PATH], "/state/lab");
        assert_eq!(meta[metadata_keys::MODEL_FINGERPRINT].len(), 16);
        assert_eq!(
            meta["originalModified/servers.yaml"],
            "2024-05-01T10:00:00+00:00"
        );
    }

    #[test]
    fn test_capacity_failure_is_data() {
        let mut over = model();
        for i in 0..8 {
            over = over.with_connection(Connection::uplink(
                "leaf-1",
                &format!("E1/{}", 50 + i),
                "spine-1",
                &format!("E1/{}", 2 + i),
            ));
        }
        let result = Importer::new().import_model(&over, Path::new("x"), &BTreeMap::new());
        assert!(!result.validation.is_valid);
        assert_eq!(result.fabric_spec.uplinks_per_leaf, 9);
        assert_eq!(result.provenance.detected_patterns().topology_type, TopologyType::SingleClass);
    }

    #[test]
    fn test_missing_directory_is_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = Importer::new().import(&tmp.path().join("nowhere")).unwrap_err();
        assert!(matches!(err, ImportError::Store(StoreError::NoLayout { .. })));
    }
}
