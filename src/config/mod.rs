//! Configuration module for fabric-drift.
//!
//! This module provides:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - Named presets
//! - YAML config file loading and discovery
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fabric_drift::config::{AppConfig, ConfigPreset};
//!
//! let config = AppConfig::from_preset(ConfigPreset::Strict);
//! let importer = Importer::new().with_validator(config.import.validator());
//!
//! use fabric_drift::config::file::load_or_default;
//! let (config, loaded_from) = load_or_default(None);
//! ```
//!
//! # Configuration File
//!
//! Place a `.fabric-drift.yaml` file in your project root or `~/.config/fabric-drift/`:
//!
//! ```yaml
//! import:
//!   nearCapacityThreshold: 0.75
//!   switchProfiles:
//!     DS2500:
//!       endpointPorts: 48
//!       fabricPorts: 12
//! reconcile:
//!   backoff:
//!     initialDelay: 500ms
//!     maxAttempts: 15
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::ConfigPreset;
pub use types::{
    AppConfig, ClusterConfig, CodecConfig, ImportConfig, ReconcileConfig, DEFAULT_TOKEN_ENV,
};
pub use validation::{ConfigError, Validatable};

pub use file::{
    discover_config_file, generate_example_config, load_config_file, load_or_default,
    ConfigFileError,
};

/// Generate a JSON Schema for the `.fabric-drift.yaml` format.
pub fn generate_json_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema)
}
