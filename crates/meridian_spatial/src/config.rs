//! Spatial partition configuration.
//!
//! Loaded once at startup from the `[spatial]` table of the viewer config.

use serde::{Deserialize, Serialize};

use crate::error::{SpatialError, SpatialResult};

/// Tunables shared by every partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Global occlusion switch. Partitions that never occlude ignore it.
    pub occlusion_enabled: bool,
    /// Query objects available to the occlusion backend.
    pub max_occlusion_queries: usize,
    /// Deepest level below the root.
    pub octree_max_depth: u32,
    /// Objects a node holds before it starts pushing new ones into children.
    pub octree_max_elements: usize,
    /// Smallest cell edge length.
    pub min_node_size: f32,
    /// Edge length of a fresh root cell.
    pub root_size: f32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            occlusion_enabled: true,
            max_occlusion_queries: 1024,
            octree_max_depth: 12,
            octree_max_elements: 8,
            min_node_size: 1.0,
            root_size: 256.0,
        }
    }
}

impl SpatialConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// [`SpatialError::InvalidConfig`] on malformed TOML or invalid values.
    pub fn from_toml_str(text: &str) -> SpatialResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SpatialError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the octree cannot work with.
    ///
    /// # Errors
    ///
    /// [`SpatialError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> SpatialResult<()> {
        if !(self.min_node_size.is_finite() && self.min_node_size > 0.0) {
            return Err(SpatialError::InvalidConfig("min_node_size must be > 0".into()));
        }
        if !(self.root_size.is_finite() && self.root_size >= self.min_node_size) {
            return Err(SpatialError::InvalidConfig("root_size must be >= min_node_size".into()));
        }
        if self.octree_max_elements == 0 {
            return Err(SpatialError::InvalidConfig("octree_max_elements must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SpatialConfig::from_toml_str("occlusion_enabled = false\nroot_size = 512.0").unwrap();
        assert!(!config.occlusion_enabled);
        assert_eq!(config.root_size, 512.0);
        assert_eq!(config.octree_max_elements, SpatialConfig::default().octree_max_elements);
    }

    #[test]
    fn test_rejects_zero_node_size() {
        let err = SpatialConfig::from_toml_str("min_node_size = 0.0").unwrap_err();
        assert!(matches!(err, SpatialError::InvalidConfig(_)));
    }
}
