//! Directory-backed state store and layout discovery.

use super::{validate_fabric_name, StateStore, StoreError};
use crate::codec::{FileSet, FormatKind};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Files read from one layout directory.
#[derive(Debug, Clone)]
pub struct Layout {
    pub format: FormatKind,
    pub dir: PathBuf,
    /// Contents keyed by canonical file name, whatever the on-disk extension.
    pub files: FileSet,
    /// Actual path each canonical file was read from.
    pub paths: BTreeMap<String, PathBuf>,
    /// Modification time per canonical file, where the filesystem reports one.
    pub modified: BTreeMap<String, DateTime<Utc>>,
}

impl Layout {
    /// Path a canonical file was read from, falling back to the canonical name.
    #[must_use]
    pub fn path_of(&self, file: &str) -> PathBuf {
        self.paths
            .get(file)
            .cloned()
            .unwrap_or_else(|| self.dir.join(file))
    }
}

/// Map of file stem to path for every YAML file directly inside `dir`.
///
/// When both `x.yaml` and `x.yml` exist, `x.yaml` wins.
fn yaml_stems(dir: &Path) -> Result<BTreeMap<String, PathBuf>, StoreError> {
    let entries = fs::read_dir(dir).map_err(|source| StoreError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut stems = BTreeMap::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        if !EXTENSIONS.contains(&ext) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        let preferred = ext == EXTENSIONS[0];
        if preferred || !stems.contains_key(&stem) {
            stems.insert(stem, path);
        }
    }
    Ok(stems)
}

/// Read a layout of a known format from `dir`.
pub(crate) fn read_format(dir: &Path, format: FormatKind) -> Result<Layout, StoreError> {
    if !dir.is_dir() {
        return Err(StoreError::NoLayout {
            path: dir.to_path_buf(),
        });
    }
    let stems = yaml_stems(dir)?;

    let mut layout = Layout {
        format,
        dir: dir.to_path_buf(),
        files: FileSet::new(),
        paths: BTreeMap::new(),
        modified: BTreeMap::new(),
    };

    for name in format.file_names() {
        let stem = name.trim_end_matches(".yaml");
        let path = stems.get(stem).ok_or_else(|| StoreError::MissingFile {
            path: dir.to_path_buf(),
            format,
            file: (*name).to_string(),
        })?;
        let text = fs::read_to_string(path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        if let Ok(mtime) = fs::metadata(path).and_then(|m| m.modified()) {
            layout
                .modified
                .insert((*name).to_string(), DateTime::<Utc>::from(mtime));
        }
        layout.files.insert(*name, text);
        layout.paths.insert((*name).to_string(), path.clone());
    }

    tracing::debug!(
        format = %format,
        dir = %dir.display(),
        files = layout.files.len(),
        "read topology layout"
    );
    Ok(layout)
}

/// Detect and read whichever layout lives at `dir`.
///
/// `dir` may hold the layout files directly, or be a fabric-scoped
/// directory with `fgd/` and/or `manifests/` subdirectories, in which case
/// the legacy layout is preferred.
pub fn read_layout(dir: &Path) -> Result<Layout, StoreError> {
    if !dir.is_dir() {
        return Err(StoreError::NoLayout {
            path: dir.to_path_buf(),
        });
    }

    let stems = yaml_stems(dir)?;
    if let Some(format) = FormatKind::detect(stems.keys().map(String::as_str)) {
        return read_format(dir, format);
    }

    for format in [FormatKind::Fgd, FormatKind::Manifest] {
        let sub = dir.join(format.dir_name());
        if sub.is_dir() {
            return read_format(&sub, format);
        }
    }

    Err(StoreError::NoLayout {
        path: dir.to_path_buf(),
    })
}

/// State store rooted at a base directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    base: PathBuf,
}

impl DirectoryStore {
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory holding every layout of one fabric.
    #[must_use]
    pub fn fabric_dir(&self, fabric: &str) -> PathBuf {
        self.base.join(fabric)
    }
}

impl StateStore for DirectoryStore {
    fn layout_dir(&self, fabric: &str, format: FormatKind) -> PathBuf {
        self.fabric_dir(fabric).join(format.dir_name())
    }

    fn save(&self, fabric: &str, format: FormatKind, files: &FileSet) -> Result<PathBuf, StoreError> {
        validate_fabric_name(fabric)?;
        let dir = self.layout_dir(fabric, format);
        fs::create_dir_all(&dir).map_err(|source| StoreError::Write {
            path: dir.clone(),
            source,
        })?;

        for (name, text) in files.iter() {
            let path = dir.join(name);
            fs::write(&path, text).map_err(|source| StoreError::Write {
                path: path.clone(),
                source,
            })?;
        }

        tracing::info!(fabric, format = %format, dir = %dir.display(), "saved topology");
        Ok(dir)
    }

    fn load(&self, fabric: &str, format: FormatKind) -> Result<Layout, StoreError> {
        validate_fabric_name(fabric)?;
        read_format(&self.layout_dir(fabric, format), format)
    }

    fn formats(&self, fabric: &str) -> Vec<FormatKind> {
        [FormatKind::Fgd, FormatKind::Manifest]
            .into_iter()
            .filter(|f| self.layout_dir(fabric, *f).is_dir())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CONNECTIONS_FILE, SERVERS_FILE, SWITCHES_FILE};

    fn fgd_files() -> FileSet {
        FileSet::new()
            .with(SERVERS_FILE, "servers: []\n")
            .with(SWITCHES_FILE, "switches: []\n")
            .with(CONNECTIONS_FILE, "connections: []\n")
    }

    #[test]
    fn test_save_then_load() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = DirectoryStore::new(tmp.path());

        let dir = store.save("lab", FormatKind::Fgd, &fgd_files()).expect("save");
        assert_eq!(dir, tmp.path().join("lab").join("fgd"));
        assert_eq!(store.formats("lab"), vec![FormatKind::Fgd]);

        let layout = store.load("lab", FormatKind::Fgd).expect("load");
        assert_eq!(layout.files, fgd_files());
        assert_eq!(layout.modified.len(), 3);
    }

    #[test]
    fn test_invalid_fabric_name_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = DirectoryStore::new(tmp.path());
        assert!(matches!(
            store.save("../escape", FormatKind::Fgd, &fgd_files()),
            Err(StoreError::InvalidFabricName(_))
        ));
    }

    #[test]
    fn test_yml_extension_accepted() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(tmp.path().join("servers.yml"), "servers: []\n").expect("write");
        fs::write(tmp.path().join("switches.yml"), "switches: []\n").expect("write");
        fs::write(tmp.path().join("connections.yaml"), "connections: []\n").expect("write");

        let layout = read_layout(tmp.path()).expect("layout");
        assert_eq!(layout.format, FormatKind::Fgd);
        assert_eq!(layout.files, fgd_files());
        assert_eq!(
            layout.path_of(SERVERS_FILE),
            tmp.path().join("servers.yml")
        );
    }

    #[test]
    fn test_missing_file_named() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(tmp.path().join("servers.yaml"), "servers: []\n").expect("write");
        match read_layout(tmp.path()) {
            Err(StoreError::MissingFile { file, format, .. }) => {
                assert_eq!(format, FormatKind::Fgd);
                assert_eq!(file, SWITCHES_FILE);
            }
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }

    #[test]
    fn test_fabric_dir_resolves_subdirectory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = DirectoryStore::new(tmp.path());
        store.save("lab", FormatKind::Fgd, &fgd_files()).expect("save");

        let layout = read_layout(&store.fabric_dir("lab")).expect("layout");
        assert_eq!(layout.format, FormatKind::Fgd);
    }

    #[test]
    fn test_no_layout() {
        let tmp = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            read_layout(tmp.path()),
            Err(StoreError::NoLayout { .. })
        ));
        assert!(matches!(
            read_layout(&tmp.path().join("absent")),
            Err(StoreError::NoLayout { .. })
        ));
    }
}
