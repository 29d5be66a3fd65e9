//! Asset subsystem configuration.
//!
//! Loaded once at startup from the `[assets]` table of the viewer config.

use std::net::SocketAddr;
use std::time::Duration;

use meridian_shared::{
    Host, ASSET_STORAGE_TIMEOUT, DEFAULT_TOXIC_FLUSH_INTERVAL, DEFAULT_TOXIC_RETENTION,
};
use serde::{Deserialize, Serialize};

use crate::error::{AssetError, AssetResult};

/// Tunables for the asset coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Seconds a request may stay pending.
    pub request_timeout_secs: u64,
    /// Seconds a toxic entry survives without being touched.
    pub toxic_retention_secs: u64,
    /// Seconds between periodic toxic-list flushes.
    pub toxic_flush_interval_secs: u64,
    /// Upstream asset host, `ip:port`.
    pub upstream: Option<SocketAddr>,
    /// Soft cap on in-flight downloads; logged when exceeded.
    pub max_pending_downloads: usize,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: ASSET_STORAGE_TIMEOUT.as_secs(),
            toxic_retention_secs: DEFAULT_TOXIC_RETENTION.as_secs(),
            toxic_flush_interval_secs: DEFAULT_TOXIC_FLUSH_INTERVAL.as_secs(),
            upstream: None,
            max_pending_downloads: 256,
        }
    }
}

impl AssetConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// [`AssetError::InvalidConfig`] on malformed TOML or invalid values.
    pub fn from_toml_str(text: &str) -> AssetResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| AssetError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the coordinator cannot work with.
    ///
    /// # Errors
    ///
    /// [`AssetError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> AssetResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(AssetError::InvalidConfig("request_timeout_secs must be > 0".into()));
        }
        if self.toxic_flush_interval_secs == 0 {
            return Err(AssetError::InvalidConfig("toxic_flush_interval_secs must be > 0".into()));
        }
        Ok(())
    }

    /// Request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Toxic retention window.
    #[must_use]
    pub const fn toxic_retention(&self) -> Duration {
        Duration::from_secs(self.toxic_retention_secs)
    }

    /// Toxic flush cadence.
    #[must_use]
    pub const fn toxic_flush_interval(&self) -> Duration {
        Duration::from_secs(self.toxic_flush_interval_secs)
    }

    /// Upstream host, if configured.
    #[must_use]
    pub fn upstream_host(&self) -> Option<Host> {
        self.upstream.map(Host::new)
    }
}
