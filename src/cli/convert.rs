//! Convert command handler.

use super::resources::load_model;
use crate::codec::{FgdCodec, FormatKind, TopologyCodec};
use crate::config::AppConfig;
use crate::store::{DirectoryStore, StateStore};
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Inputs of the `convert` subcommand.
#[derive(Debug, Clone)]
pub struct ConvertCommand {
    /// Source layout directory
    pub source: PathBuf,
    pub to: FormatKind,
    /// State base directory; output lands in `<out>/<fabric>/<format dir>/`
    pub out: PathBuf,
    /// Fabric name; defaults to the name decoded from the source
    pub fabric: Option<String>,
    pub quiet: bool,
}

/// Re-encode a layout in another format and persist it.
///
/// Returns the directory written.
pub fn run_convert(command: &ConvertCommand, config: &AppConfig) -> Result<PathBuf> {
    let (layout, mut model) = load_model(&command.source)?;
    if let Some(fabric) = &command.fabric {
        model.name.clone_from(fabric);
    }

    let codec: Box<dyn TopologyCodec> = match command.to {
        FormatKind::Fgd => Box::new(FgdCodec::new()),
        FormatKind::Manifest => Box::new(config.codec.manifest_codec()),
    };
    let files = codec
        .encode(&model)
        .with_context(|| format!("encoding {} as {}", model.name, command.to))?;

    let store = DirectoryStore::new(&command.out);
    let written = store
        .save(&model.name, command.to, &files)
        .with_context(|| format!("saving {} under {}", model.name, command.out.display()))?;

    if !command.quiet {
        tracing::info!(
            "Converted {} ({}) to {} in {}",
            model.name,
            layout.format,
            command.to,
            written.display()
        );
    }
    Ok(written)
}
