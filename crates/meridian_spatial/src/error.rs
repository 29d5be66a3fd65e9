//! # Spatial Error Types
//!
//! All errors that can occur while mutating a spatial partition.

use thiserror::Error;

use crate::arena::GroupId;
use crate::object::ObjectId;

/// Errors that can occur in the spatial partition.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpatialError {
    /// Object extents are NaN or infinite.
    #[error("object {0} has non-finite extents")]
    InvalidExtents(ObjectId),

    /// Object is not in this partition.
    #[error("object {0} not found")]
    UnknownObject(ObjectId),

    /// Object is already in this partition.
    #[error("object {0} already inserted")]
    DuplicateObject(ObjectId),

    /// Group handle is stale or was never issued.
    #[error("group {0:?} not found")]
    UnknownGroup(GroupId),

    /// Octree cannot grow far enough to hold the object.
    #[error("object {0} lies outside the maximum octree extent")]
    OutOfRange(ObjectId),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for spatial operations.
pub type SpatialResult<T> = Result<T, SpatialError>;
