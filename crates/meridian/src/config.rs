//! # Viewer Configuration
//!
//! One TOML file, one table per subsystem:
//!
//! ```toml
//! [assets]
//! request_timeout_secs = 300
//! upstream = "10.0.0.1:12043"
//!
//! [spatial]
//! occlusion_enabled = true
//! max_occlusion_queries = 1024
//!
//! [frame]
//! target_fps = 60
//! ```
//!
//! Missing tables and fields fall back to their defaults.

use std::path::Path;
use std::time::Duration;

use meridian_assets::{AssetConfig, AssetError};
use meridian_spatial::{SpatialConfig, SpatialError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading the viewer configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was opened.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The text is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The `[assets]` table holds values the coordinator rejects.
    #[error(transparent)]
    Assets(#[from] AssetError),

    /// The `[spatial]` table holds values the partitions reject.
    #[error(transparent)]
    Spatial(#[from] SpatialError),

    /// The `[frame]` table holds values the loop rejects.
    #[error("invalid frame config: {0}")]
    Frame(String),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Frame loop tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Target frames per second; sets the frame budget.
    pub target_fps: u32,
    /// Log a warning for every frame over budget.
    pub enable_timing_logs: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { target_fps: 60, enable_timing_logs: false }
    }
}

impl FrameConfig {
    /// Time one frame may take.
    #[must_use]
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }
}

/// Complete viewer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Asset coordinator settings.
    pub assets: AssetConfig,
    /// Spatial partition settings.
    pub spatial: SpatialConfig,
    /// Frame loop settings.
    pub frame: FrameConfig,
}

impl ViewerConfig {
    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed TOML, or the subsystem error for
    /// the first table with invalid values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`ViewerConfig::from_toml_str`].
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
        Self::from_toml_str(&text)
    }

    /// Checks every table.
    ///
    /// # Errors
    ///
    /// The first subsystem error found.
    pub fn validate(&self) -> ConfigResult<()> {
        self.assets.validate()?;
        self.spatial.validate()?;
        if self.frame.target_fps == 0 {
            return Err(ConfigError::Frame("target_fps must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.frame.target_fps, 60);
    }

    #[test]
    fn test_partial_tables() {
        let config = ViewerConfig::from_toml_str(
            r#"
            [assets]
            request_timeout_secs = 30
            upstream = "127.0.0.1:12043"

            [spatial]
            occlusion_enabled = false

            [frame]
            target_fps = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.assets.request_timeout_secs, 30);
        assert!(config.assets.upstream_host().is_some());
        assert!(!config.spatial.occlusion_enabled);
        assert_eq!(config.spatial.max_occlusion_queries, SpatialConfig::default().max_occlusion_queries);
        assert_eq!(config.frame.frame_budget(), Duration::from_secs(1) / 30);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = ViewerConfig::from_toml_str("[frame]\ntarget_fps = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Frame(_)));

        let err = ViewerConfig::from_toml_str("[assets]\nrequest_timeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Assets(AssetError::InvalidConfig(_))));

        let err = ViewerConfig::from_toml_str("[spatial]\nmin_node_size = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Spatial(SpatialError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let err = ViewerConfig::from_toml_str("[frame\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ViewerConfig::from_path("/nonexistent/meridian.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
