//! Codec trait definitions and error types.

use crate::model::{ModelError, TopologyModel};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while encoding or decoding a topology.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CodecError {
    /// The text is not well-formed YAML.
    #[error("{file}: malformed document: {message}")]
    Parse { file: String, message: String },

    /// The text parsed but a required field is missing or has the wrong type.
    #[error("{file}: missing or invalid field '{field}': {message}")]
    Schema {
        file: String,
        field: String,
        message: String,
    },

    /// A file the format requires is absent from the file set.
    #[error("{file}: not present in file set")]
    MissingFile { file: String },

    /// Serialization failed.
    #[error("{file}: cannot encode: {message}")]
    Encode { file: String, message: String },
}

impl CodecError {
    /// Create a schema error.
    pub fn schema(
        file: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Schema {
            file: file.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Name of the file the error refers to.
    #[must_use]
    pub fn file(&self) -> &str {
        match self {
            Self::Parse { file, .. }
            | Self::Schema { file, .. }
            | Self::MissingFile { file }
            | Self::Encode { file, .. } => file,
        }
    }

    /// Map a model invariant violation onto the file that declares the offending entity.
    pub(crate) fn from_model(err: &ModelError) -> Self {
        match err {
            ModelError::DuplicateId { kind, id } => {
                let file = match kind {
                    crate::model::DeviceKind::Server => super::SERVERS_FILE,
                    _ => super::SWITCHES_FILE,
                };
                Self::schema(file, "id", format!("duplicate {kind} identifier '{id}'"))
            }
            ModelError::UnknownDevice { index, .. } => Self::schema(
                super::CONNECTIONS_FILE,
                format!("connections[{index}]"),
                err.to_string(),
            ),
            ModelError::RoleMismatch { .. } => {
                Self::schema(super::SWITCHES_FILE, "role", err.to_string())
            }
        }
    }
}

/// The two supported persisted formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormatKind {
    /// Legacy three-file golden definition
    Fgd,
    /// Custom-resource manifests
    Manifest,
}

impl FormatKind {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Fgd => "fgd",
            Self::Manifest => "manifest",
        }
    }

    /// Subdirectory name used under a fabric-scoped directory.
    #[must_use]
    pub const fn dir_name(&self) -> &'static str {
        match self {
            Self::Fgd => "fgd",
            Self::Manifest => "manifests",
        }
    }

    /// Files the format consists of, in canonical order.
    #[must_use]
    pub const fn file_names(&self) -> &'static [&'static str] {
        match self {
            Self::Fgd => &[super::SERVERS_FILE, super::SWITCHES_FILE, super::CONNECTIONS_FILE],
            Self::Manifest => &[
                super::FABRIC_FILE,
                super::SWITCHES_FILE,
                super::SERVERS_FILE,
                super::CONNECTIONS_FILE,
            ],
        }
    }

    /// Pick a format from the file stems present in a directory.
    ///
    /// A `fabric` document marks the manifest layout; otherwise any of the
    /// three legacy stems marks the legacy layout.
    pub fn detect<'a>(stems: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let stems: Vec<&str> = stems.into_iter().collect();
        if stems.contains(&"fabric") {
            Some(Self::Manifest)
        } else if stems
            .iter()
            .any(|s| matches!(*s, "servers" | "switches" | "connections"))
        {
            Some(Self::Fgd)
        } else {
            None
        }
    }

    /// Default codec for this format.
    #[must_use]
    pub fn codec(&self) -> Box<dyn TopologyCodec> {
        match self {
            Self::Fgd => Box::new(super::FgdCodec::new()),
            Self::Manifest => Box::new(super::ManifestCodec::default()),
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for FormatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fgd" | "legacy" => Ok(Self::Fgd),
            "manifest" | "manifests" | "crd" => Ok(Self::Manifest),
            other => Err(format!("unknown format '{other}' (expected fgd or manifest)")),
        }
    }
}

/// Named text documents making up one persisted topology.
///
/// Keys are canonical file names (`servers.yaml`, ...). Iteration order is
/// sorted so that writing a file set is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileSet {
    files: BTreeMap<String, String>,
}

impl FileSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.files.insert(name.into(), content.into());
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(name, content);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    /// Fetch a file the caller cannot proceed without.
    pub fn require(&self, name: &str) -> Result<&str, CodecError> {
        self.get(name).ok_or_else(|| CodecError::MissingFile {
            file: name.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Trait for topology formats.
///
/// Implementations are pure: they never touch the filesystem. Callers own
/// reading and writing the [`FileSet`].
pub trait TopologyCodec: Send + Sync {
    /// Which format this codec speaks.
    fn format(&self) -> FormatKind;

    /// Encode a model into its persisted documents.
    ///
    /// Output is deterministic: encoding an unchanged model twice yields
    /// byte-identical files.
    fn encode(&self, model: &TopologyModel) -> Result<FileSet, CodecError>;

    /// Decode persisted documents into a model, validating the model invariants.
    fn decode(&self, files: &FileSet) -> Result<TopologyModel, CodecError>;

    /// Format name for logging.
    fn format_name(&self) -> &'static str {
        self.format().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_layout() {
        assert_eq!(
            FormatKind::detect(["servers", "switches", "connections"]),
            Some(FormatKind::Fgd)
        );
        assert_eq!(
            FormatKind::detect(["fabric", "switches", "servers", "connections"]),
            Some(FormatKind::Manifest)
        );
        assert_eq!(FormatKind::detect(["servers"]), Some(FormatKind::Fgd));
        assert_eq!(FormatKind::detect(["README"]), None);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("FGD".parse::<FormatKind>(), Ok(FormatKind::Fgd));
        assert_eq!("manifests".parse::<FormatKind>(), Ok(FormatKind::Manifest));
        assert!("xml".parse::<FormatKind>().is_err());
    }

    #[test]
    fn test_require_missing_file() {
        let files = FileSet::new().with("servers.yaml", "servers: []\n");
        assert!(files.require("servers.yaml").is_ok());
        assert_eq!(
            files.require("switches.yaml"),
            Err(CodecError::MissingFile {
                file: "switches.yaml".to_string()
            })
        );
    }

    #[test]
    fn test_error_names_file() {
        let err = CodecError::schema("connections.yaml", "connections[2].source", "missing");
        assert_eq!(err.file(), "connections.yaml");
        assert!(err.to_string().contains("connections[2].source"));
    }
}
