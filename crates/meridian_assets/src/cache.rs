//! # Local Asset Cache
//!
//! Key-value store for asset bytes, keyed by `(id, type)`.
//!
//! ```text
//! get_asset_data ──► local cache ──► static cache ──► toxic? ──► upstream
//!                      (rw)            (ro)
//! ```
//!
//! The coordinator only needs open-for-read, open-for-write and get-size;
//! real backends (a disk cache, a packed archive) implement [`LocalCache`].

use std::collections::HashMap;
use std::sync::Arc;

use meridian_shared::{AssetId, AssetType};

use crate::error::{AssetError, AssetResult};

/// Storage for downloaded and locally-authored assets.
pub trait LocalCache {
    /// Size in bytes of a stored asset, `None` when absent.
    fn get_size(&self, id: AssetId, asset_type: AssetType) -> Option<usize>;

    /// Reads the full payload.
    ///
    /// # Errors
    ///
    /// [`AssetError::NotFoundLocally`] when the asset is absent.
    fn read(&self, id: AssetId, asset_type: AssetType) -> AssetResult<Arc<[u8]>>;

    /// Writes a payload, replacing any previous bytes. Returns bytes written.
    ///
    /// # Errors
    ///
    /// [`AssetError::Cache`] when the backend cannot persist the data.
    fn write(&mut self, id: AssetId, asset_type: AssetType, data: &[u8]) -> AssetResult<usize>;

    /// Drops an asset. Returns true if it was present.
    fn remove(&mut self, id: AssetId, asset_type: AssetType) -> bool;

    /// True if the asset is present.
    fn exists(&self, id: AssetId, asset_type: AssetType) -> bool {
        self.get_size(id, asset_type).is_some()
    }
}

/// Statistics for a memory cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Successful reads.
    pub hits: u64,
    /// Reads of absent assets.
    pub misses: u64,
    /// Writes accepted.
    pub writes: u64,
    /// Bytes currently held.
    pub bytes_stored: usize,
}

/// In-memory cache. Used as the session cache and by tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: HashMap<(AssetId, AssetType), Arc<[u8]>>,
    stats: parking_lot::Mutex<CacheStats>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache pre-populated with `(id, type, bytes)` entries.
    ///
    /// Used for the read-only static cache shipped with the viewer.
    #[must_use]
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (AssetId, AssetType, Vec<u8>)>,
    {
        let mut cache = Self::new();
        for (id, asset_type, bytes) in entries {
            cache.entries.insert((id, asset_type), bytes.into());
        }
        cache.stats.get_mut().bytes_stored = cache.entries.values().map(|b| b.len()).sum();
        cache
    }

    /// Number of stored assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        *self.stats.lock()
    }
}

impl LocalCache for MemoryCache {
    fn get_size(&self, id: AssetId, asset_type: AssetType) -> Option<usize> {
        self.entries.get(&(id, asset_type)).map(|b| b.len())
    }

    fn read(&self, id: AssetId, asset_type: AssetType) -> AssetResult<Arc<[u8]>> {
        let mut stats = self.stats.lock();
        match self.entries.get(&(id, asset_type)) {
            Some(bytes) => {
                stats.hits += 1;
                Ok(Arc::clone(bytes))
            }
            None => {
                stats.misses += 1;
                Err(AssetError::NotFoundLocally)
            }
        }
    }

    fn write(&mut self, id: AssetId, asset_type: AssetType, data: &[u8]) -> AssetResult<usize> {
        let previous = self.entries.insert((id, asset_type), Arc::from(data));
        let stats = self.stats.get_mut();
        stats.writes += 1;
        stats.bytes_stored = stats.bytes_stored - previous.map_or(0, |b| b.len()) + data.len();
        Ok(data.len())
    }

    fn remove(&mut self, id: AssetId, asset_type: AssetType) -> bool {
        match self.entries.remove(&(id, asset_type)) {
            Some(bytes) => {
                self.stats.get_mut().bytes_stored -= bytes.len();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_remove() {
        let mut cache = MemoryCache::new();
        let id = AssetId::from_u128(1);

        assert!(matches!(
            cache.read(id, AssetType::Texture),
            Err(AssetError::NotFoundLocally)
        ));

        assert_eq!(cache.write(id, AssetType::Texture, b"abcd").ok(), Some(4));
        assert_eq!(cache.get_size(id, AssetType::Texture), Some(4));
        // Same id, different type is a different entry.
        assert!(!cache.exists(id, AssetType::Sound));

        assert!(cache.remove(id, AssetType::Texture));
        assert!(cache.is_empty());
        assert_eq!(cache.stats().bytes_stored, 0);
    }

    #[test]
    fn test_overwrite_updates_byte_count() {
        let mut cache = MemoryCache::new();
        let id = AssetId::from_u128(2);
        cache.write(id, AssetType::Mesh, &[0; 10]).ok();
        cache.write(id, AssetType::Mesh, &[0; 3]).ok();

        assert_eq!(cache.stats().bytes_stored, 3);
        assert_eq!(cache.stats().writes, 2);
    }
}
