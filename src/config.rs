//! Engine configuration.
//!
//! Defaults mirror the reference tuning of the highlight engine and the bulk
//! replace protocol. With the `config` feature enabled, a configuration can be read
//! from TOML, either from an explicit path or from the platform config directory
//! (`<config_dir>/richfind/config.toml`).

use crate::error::{Result, RichfindError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Matches replaced per transaction by a bulk replace unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 250;

/// Top-level configuration for the search controller and highlight engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub highlight: HighlightConfig,
    pub replace: ReplaceConfig,
    pub sections: SectionConfig,
}

/// Viewport windowing and scheduling knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Extra pixels decorated above and below the visible rectangle
    pub buffer_px: f64,
    /// Upper bound on decorations built for one window
    pub max_decorations: usize,
    /// Windows whose edges moved by at most this many positions are not recomputed
    pub stability_tolerance: usize,
    /// Frame length used to coalesce scroll and resize bursts
    pub frame_interval_ms: u64,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            buffer_px: 320.0,
            max_decorations: 2000,
            stability_tolerance: 50,
            frame_interval_ms: 16,
        }
    }
}

impl HighlightConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// Bulk replace tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaceConfig {
    /// Matches replaced per dispatched transaction
    pub batch_size: usize,
}

impl Default for ReplaceConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Which block kinds count as logical sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionConfig {
    pub kinds: Vec<String>,
    pub default_section: String,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            kinds: ["heading", "header", "footer", "footnote", "table"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_section: crate::document::DEFAULT_SECTION.to_string(),
        }
    }
}

impl EngineConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.replace.batch_size == 0 {
            return Err(RichfindError::config("replace.batch_size must be at least 1"));
        }
        if self.highlight.max_decorations == 0 {
            return Err(RichfindError::config(
                "highlight.max_decorations must be at least 1",
            ));
        }
        if self.highlight.frame_interval_ms == 0 {
            return Err(RichfindError::config(
                "highlight.frame_interval_ms must be at least 1",
            ));
        }
        if !self.highlight.buffer_px.is_finite() || self.highlight.buffer_px < 0.0 {
            return Err(RichfindError::config(
                "highlight.buffer_px must be a non-negative number",
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "config")]
impl EngineConfig {
    /// Parse and validate a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|err| RichfindError::config(format!("invalid TOML: {}", err)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|err| {
            RichfindError::file_error(format!("Failed to read {}", path.display()), err)
        })?;
        Self::from_toml_str(&source)
    }

    /// Default location of the configuration file, if the platform has one.
    pub fn default_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|dir| dir.join("richfind").join("config.toml"))
    }

    /// Load the configuration from [`EngineConfig::default_path`], falling back to
    /// defaults when no file exists.
    pub fn discover() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_tuning() {
        let config = EngineConfig::default();
        assert_eq!(config.highlight.buffer_px, 320.0);
        assert_eq!(config.highlight.max_decorations, 2000);
        assert_eq!(config.highlight.stability_tolerance, 50);
        assert_eq!(config.highlight.frame_interval(), Duration::from_millis(16));
        assert_eq!(config.replace.batch_size, 250);
        assert_eq!(config.sections.default_section, "text");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validation_rejects_zero_batches() {
        let mut config = EngineConfig::default();
        config.replace.batch_size = 0;
        assert!(matches!(
            config.validate(),
            Err(RichfindError::ConfigError { .. })
        ));
    }

    #[cfg(feature = "config")]
    #[test]
    fn partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [highlight]
            max_decorations = 500

            [sections]
            kinds = ["footer"]
            "#,
        )
        .unwrap();
        assert_eq!(config.highlight.max_decorations, 500);
        assert_eq!(config.highlight.buffer_px, 320.0);
        assert_eq!(config.replace.batch_size, 250);
        assert_eq!(config.sections.kinds, vec!["footer".to_string()]);
        assert_eq!(config.sections.default_section, "text");
    }

    #[cfg(feature = "config")]
    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = EngineConfig::from_toml_str("[replace]\nbatch_size = 0\n").unwrap_err();
        assert!(matches!(err, RichfindError::ConfigError { .. }));

        let err = EngineConfig::from_toml_str("highlight = 3").unwrap_err();
        assert!(matches!(err, RichfindError::ConfigError { .. }));
    }

    #[cfg(feature = "config")]
    #[test]
    fn load_reads_files() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "[replace]\nbatch_size = 10\n").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.replace.batch_size, 10);
    }
}
