//! Persisted-state save and load.
//!
//! A [`StateStore`] reads and writes the two textual layouts under a
//! fabric-scoped directory:
//!
//! ```text
//! <base>/<fabric>/fgd/{servers,switches,connections}.yaml
//! <base>/<fabric>/manifests/{fabric,switches,servers,connections}.yaml
//! ```
//!
//! Codecs never touch the filesystem; this module is the only place that
//! turns a [`FileSet`] into files and back.

mod directory;

pub use directory::{read_layout, DirectoryStore, Layout};

use crate::codec::{CodecError, FileSet, FormatKind};
use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;
use thiserror::Error;

/// Fabric names are used as directory names and as Kubernetes label values.
static FABRIC_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]{0,61}[a-z0-9])?$").expect("valid fabric name pattern")
});

/// Errors raised by persisted-state operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// No recognised layout exists at the location.
    #[error("no topology layout found at {}", path.display())]
    NoLayout { path: PathBuf },

    /// The layout was recognised but one of its files is absent.
    #[error("{format} layout at {} is missing {file}", path.display())]
    MissingFile {
        path: PathBuf,
        format: FormatKind,
        file: String,
    },

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid fabric name '{0}': expected lowercase alphanumerics and '-', at most 63 characters")]
    InvalidFabricName(String),

    /// Encoding before a save failed.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Check that a fabric name is usable as a directory and label value.
pub fn validate_fabric_name(name: &str) -> Result<(), StoreError> {
    if FABRIC_NAME.is_match(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidFabricName(name.to_string()))
    }
}

/// Opaque read/write of persisted topology layouts.
pub trait StateStore {
    /// Directory holding one fabric's layout in one format.
    fn layout_dir(&self, fabric: &str, format: FormatKind) -> PathBuf;

    /// Write a file set for a fabric, returning the directory written.
    fn save(&self, fabric: &str, format: FormatKind, files: &FileSet) -> Result<PathBuf, StoreError>;

    /// Read a fabric's layout in the given format.
    fn load(&self, fabric: &str, format: FormatKind) -> Result<Layout, StoreError>;

    /// Formats currently persisted for a fabric.
    fn formats(&self, fabric: &str) -> Vec<FormatKind>;
}
