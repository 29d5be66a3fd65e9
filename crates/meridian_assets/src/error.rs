//! # Asset Error Types
//!
//! Every way an asset transfer can fail, plus the extended status that rides
//! along with each completion.

use thiserror::Error;

/// Errors delivered to asset callbacks.
///
/// Each variant maps to a stable integer code via [`AssetError::code`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// Generic failure with no better classification.
    #[error("asset request failed")]
    Unknown,

    /// Asset is missing from every local cache.
    #[error("asset not found locally")]
    NotFoundLocally,

    /// Upstream reports the asset does not exist.
    #[error("asset not in database")]
    NotInDatabase,

    /// Upstream refused the request.
    #[error("insufficient permissions to fetch asset")]
    InsufficientPermissions,

    /// No response within the request timeout.
    #[error("asset request timed out")]
    Timeout,

    /// The local cache disagrees with itself about the stored bytes.
    #[error("local cache corrupt: expected {expected} bytes, found {actual}")]
    StorageCorrupt {
        /// Bytes that were written or announced.
        expected: usize,
        /// Bytes the cache reports holding.
        actual: usize,
    },

    /// Asset is quarantined after a decode failure.
    #[error("asset is toxic")]
    Toxic,

    /// No upstream host is configured.
    #[error("no upstream asset host")]
    NoUpstream,

    /// Refused to store an empty payload.
    #[error("refusing to store zero-size asset")]
    ZeroSize,

    /// The request was removed before it completed.
    #[error("asset request canceled")]
    Canceled,

    /// Local cache I/O failed.
    #[error("cache error: {0}")]
    Cache(String),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AssetError {
    /// Stable integer code for this error. Success is `0`.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::Unknown => -1,
            Self::NotFoundLocally => -3,
            Self::NotInDatabase => -4,
            Self::InsufficientPermissions => -5,
            Self::StorageCorrupt { .. } => -6,
            Self::Toxic => -7,
            Self::ZeroSize => -8,
            Self::Canceled => -9,
            Self::Cache(_) => -42,
            Self::InvalidConfig(_) => -50,
            Self::Timeout => -23016,
            Self::NoUpstream => -23017,
        }
    }

    /// Human-readable label for a status code, `0` included.
    #[must_use]
    pub const fn code_string(code: i32) -> &'static str {
        match code {
            0 => "No error",
            -1 => "Asset request failed",
            -3 => "Asset file not found locally",
            -4 => "Asset not in database",
            -5 => "Insufficient permissions",
            -6 => "Local cache corrupt",
            -7 => "Asset is toxic",
            -8 => "Zero-size asset",
            -9 => "Request canceled",
            -42 => "Cache I/O error",
            -50 => "Invalid configuration",
            -23016 => "Timeout",
            -23017 => "No upstream host",
            _ => "Unknown status",
        }
    }

    /// Extended status that accompanies this error on a callback.
    #[must_use]
    pub const fn ext_status(&self) -> ExtStatus {
        match self {
            Self::StorageCorrupt { .. } | Self::Cache(_) => ExtStatus::CacheCorrupt,
            Self::NoUpstream => ExtStatus::NoUpstream,
            Self::Timeout | Self::Canceled => ExtStatus::RequestDropped,
            Self::NotFoundLocally | Self::NotInDatabase => ExtStatus::NonexistentFile,
            Self::Toxic => ExtStatus::BlockedFile,
            Self::Unknown | Self::InsufficientPermissions | Self::ZeroSize | Self::InvalidConfig(_) => {
                ExtStatus::None
            }
        }
    }

    /// A terminal failure will not change if the same request is retried.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::NotInDatabase
                | Self::InsufficientPermissions
                | Self::Toxic
                | Self::ZeroSize
                | Self::StorageCorrupt { .. }
        )
    }
}

/// Extra context about how a request finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExtStatus {
    /// Nothing to add.
    #[default]
    None,
    /// Null asset id requested.
    NullId,
    /// Cache write or read-back mismatched.
    CacheCorrupt,
    /// No upstream was available.
    NoUpstream,
    /// Request was dropped before an answer arrived.
    RequestDropped,
    /// The file does not exist anywhere.
    NonexistentFile,
    /// The file is blocked by quarantine.
    BlockedFile,
}

/// Result type for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_to_strings() {
        for err in [
            AssetError::Unknown,
            AssetError::Timeout,
            AssetError::Toxic,
            AssetError::NoUpstream,
            AssetError::StorageCorrupt { expected: 4, actual: 2 },
        ] {
            assert_ne!(AssetError::code_string(err.code()), "Unknown status");
        }
        assert_eq!(AssetError::code_string(0), "No error");
    }

    #[test]
    fn test_toxic_is_terminal_timeout_is_not() {
        assert!(AssetError::Toxic.is_terminal());
        assert!(!AssetError::Timeout.is_terminal());
        assert_eq!(AssetError::Toxic.ext_status(), ExtStatus::BlockedFile);
    }
}
