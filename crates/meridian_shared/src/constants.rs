//! Timing and sizing constants shared by every MERIDIAN crate.
//!
//! Runtime values live in the config structs; these are the defaults they
//! fall back to.

use std::time::Duration;

/// How long a pending asset transfer may sit unanswered before it is
/// failed with a timeout.
pub const ASSET_STORAGE_TIMEOUT: Duration = Duration::from_secs(300);

/// How long an asset stays toxic after it was last marked or observed.
pub const DEFAULT_TOXIC_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Cadence of the periodic toxic-list flush.
pub const DEFAULT_TOXIC_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

/// Number of camera slots tracked per spatial group.
pub const NUM_CAMERAS: usize = 8;
