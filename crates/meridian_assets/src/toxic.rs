//! # Toxic Asset Quarantine
//!
//! Assets that crashed or failed a decoder are quarantined here so they are
//! never fetched again in this session.
//!
//! Retention is a sliding window: marking *or observing* an entry restarts
//! its clock. An entry not touched for the full retention period is purged,
//! lazily on lookup or in bulk by [`ToxicAssetList::flush_old`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use meridian_shared::AssetId;

/// Quarantined asset ids with their last-touched timestamp.
#[derive(Debug)]
pub struct ToxicAssetList {
    entries: HashMap<AssetId, Instant>,
    retention: Duration,
}

impl ToxicAssetList {
    /// Creates an empty list with the given retention window.
    #[must_use]
    pub fn new(retention: Duration) -> Self {
        Self { entries: HashMap::new(), retention }
    }

    /// Quarantines `id`, or refreshes it if already quarantined.
    pub fn mark(&mut self, id: AssetId, now: Instant) {
        self.entries.insert(id, now);
    }

    /// True if `id` is quarantined. A hit refreshes the entry; an entry past
    /// its window is dropped and reported clean.
    pub fn is_toxic(&mut self, id: AssetId, now: Instant) -> bool {
        let Some(last_seen) = self.entries.get_mut(&id) else {
            return false;
        };

        if now.saturating_duration_since(*last_seen) > self.retention {
            self.entries.remove(&id);
            return false;
        }

        *last_seen = now;
        true
    }

    /// Drops entries past their window, or every entry when `force` is
    /// set. Returns the number removed.
    pub fn flush_old(&mut self, now: Instant, force: bool) -> usize {
        let before = self.entries.len();
        if force {
            self.entries.clear();
        } else {
            let retention = self.retention;
            self.entries
                .retain(|_, last_seen| now.saturating_duration_since(*last_seen) <= retention);
        }
        before - self.entries.len()
    }

    /// Number of quarantined ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is quarantined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retention window.
    #[must_use]
    pub const fn retention(&self) -> Duration {
        self.retention
    }
}
