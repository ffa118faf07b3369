//! Loading resource sets from layouts and manifest files.

use crate::codec::{resources_from_file_set, resources_from_text, FgdCodec, FormatKind, ManifestCodec, TopologyCodec};
use crate::error::{ErrorContext, FabricDriftError, Result};
use crate::model::{Resource, TopologyModel};
use crate::store::{read_layout, Layout};
use std::path::Path;

/// Read and decode the layout at `dir` into a model.
pub fn load_model(dir: &Path) -> Result<(Layout, TopologyModel)> {
    let layout = read_layout(dir).with_context(|| format!("reading layout {}", dir.display()))?;
    let model = layout
        .format
        .codec()
        .decode(&layout.files)
        .with_context(|| format!("decoding {} layout in {}", layout.format, layout.dir.display()))?;
    Ok((layout, model))
}

/// Resources described by `path`.
///
/// A file is read as a multi-document manifest stream. A manifest layout is
/// read document by document, so labels and `apiVersion` are kept exactly as
/// written. A legacy layout is decoded and rendered through `codec`.
pub fn load_resources(path: &Path, codec: &ManifestCodec) -> Result<Vec<Resource>> {
    if path.is_file() {
        let text =
            std::fs::read_to_string(path).map_err(|e| FabricDriftError::io(path, e))?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        return resources_from_text(&name, &text)
            .with_context(|| format!("parsing manifests in {}", path.display()));
    }

    let layout = read_layout(path).with_context(|| format!("reading layout {}", path.display()))?;
    let resources = match layout.format {
        FormatKind::Manifest => resources_from_file_set(&layout.files)
            .with_context(|| format!("parsing manifests in {}", layout.dir.display()))?,
        FormatKind::Fgd => {
            let model = FgdCodec::new()
                .decode(&layout.files)
                .with_context(|| format!("decoding fgd layout in {}", layout.dir.display()))?;
            codec.to_resources(&model)
        }
    };
    tracing::debug!(
        path = %path.display(),
        format = %layout.format,
        resources = resources.len(),
        "loaded resources"
    );
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SERVICES: &str = "\
apiVersion: v1
kind: ConfigMap
metadata:
  name: config1
---
apiVersion: v1
kind: Service
metadata:
  name: service1
";

    #[test]
    fn test_load_manifest_stream_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("expected.yaml");
        std::fs::write(&path, SERVICES).unwrap();

        let resources = load_resources(&path, &ManifestCodec::default()).unwrap();
        let keys: Vec<String> = resources.iter().map(|r| r.key().to_string()).collect();
        assert_eq!(keys, vec!["ConfigMap/config1", "Service/service1"]);
    }

    #[test]
    fn test_missing_path_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_resources(&tmp.path().join("nope"), &ManifestCodec::default()).unwrap_err();
        assert!(matches!(err, FabricDriftError::Store { .. }));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_bad_manifest_keeps_file_context() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.yaml");
        std::fs::write(&path, "kind: Service\nmetadata:\n  name: svc\n").unwrap();

        match load_resources(&path, &ManifestCodec::default()).unwrap_err() {
            FabricDriftError::Codec { context, source } => {
                assert!(context.contains("broken.yaml"));
                assert_eq!(source.file(), "broken.yaml");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
