//! Named configuration presets.

use super::types::{AppConfig, ImportConfig, ReconcileConfig};
use crate::diff::{ClassifierConfig, DiffOptions, Impact};
use crate::reconcile::BackoffPolicy;
use std::time::Duration;

// ============================================================================
// Configuration Presets
// ============================================================================

/// Named configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Built-in defaults
    Default,
    /// Tighter capacity margin, `apiVersion` changes are breaking, fewer retries
    Strict,
    /// Looser capacity margin, more bookkeeping labels ignored, longer polling
    Lenient,
}

impl ConfigPreset {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }

    /// Parse a preset from a string name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::Default),
            "strict" | "ci" => Some(Self::Strict),
            "lenient" | "permissive" => Some(Self::Lenient),
            _ => None,
        }
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Default => "Built-in thresholds, classifier rules and backoff",
            Self::Strict => "Warn at 70% port use, treat apiVersion drift as breaking, 5 poll attempts",
            Self::Lenient => "Warn at 95% port use, ignore save-cycle labels, 20 poll attempts",
        }
    }

    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Default, Self::Strict, Self::Lenient]
    }
}

impl std::fmt::Display for ConfigPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Preset Implementations
// ============================================================================

impl AppConfig {
    /// Create an `AppConfig` from a named preset.
    #[must_use]
    pub fn from_preset(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Default => Self::default(),
            ConfigPreset::Strict => Self::strict_preset(),
            ConfigPreset::Lenient => Self::lenient_preset(),
        }
    }

    #[must_use]
    pub fn strict_preset() -> Self {
        Self {
            import: ImportConfig {
                near_capacity_threshold: 0.7,
                ..ImportConfig::default()
            },
            classifier: ClassifierConfig {
                api_version_impact: Impact::Breaking,
                ..ClassifierConfig::default()
            },
            reconcile: ReconcileConfig {
                backoff: BackoffPolicy::default().with_max_attempts(5),
                ..ReconcileConfig::default()
            },
            ..Self::default()
        }
    }

    /// Lenient preset.
    ///
    /// Save-cycle labels are dropped by the structural diff itself, so they
    /// never show up even as cosmetic noise.
    #[must_use]
    pub fn lenient_preset() -> Self {
        Self {
            import: ImportConfig {
                near_capacity_threshold: 0.95,
                ..ImportConfig::default()
            },
            diff: DiffOptions {
                ignored_labels: vec!["generatedAt".to_string(), "lastSaved".to_string()],
                ..DiffOptions::default()
            },
            reconcile: ReconcileConfig {
                backoff: BackoffPolicy::default()
                    .with_max_attempts(20)
                    .with_max_delay(Duration::from_secs(60)),
                ..ReconcileConfig::default()
            },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Validatable;

    #[test]
    fn test_preset_names() {
        for preset in ConfigPreset::all() {
            assert_eq!(ConfigPreset::from_name(preset.name()), Some(*preset));
            assert!(!preset.description().is_empty());
        }
        assert_eq!(ConfigPreset::from_name("CI"), Some(ConfigPreset::Strict));
        assert_eq!(ConfigPreset::from_name("loose"), None);
    }

    #[test]
    fn test_presets_are_valid() {
        for preset in ConfigPreset::all() {
            let config = AppConfig::from_preset(*preset);
            assert!(config.validate().is_empty(), "{preset} preset invalid");
        }
    }

    #[test]
    fn test_strict_preset() {
        let config = AppConfig::strict_preset();
        assert_eq!(config.classifier.api_version_impact, Impact::Breaking);
        assert_eq!(config.reconcile.backoff.max_attempts, 5);
        assert_eq!(config.codec, AppConfig::default().codec);
    }

    #[test]
    fn test_lenient_preset() {
        let config = AppConfig::lenient_preset();
        assert_eq!(config.reconcile.backoff.max_delay, Duration::from_secs(60));
        assert!(config.diff.ignored_labels.contains(&"lastSaved".to_string()));
    }
}
