//! # MERIDIAN Shared
//!
//! Common types used by the asset transfer and spatial partition crates.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - a GPU API
//! - a networking stack
//! - anything that spawns threads
//!
//! If you need transport types, put them in `meridian_assets`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod ids;
pub mod math;

pub use constants::{
    ASSET_STORAGE_TIMEOUT, DEFAULT_TOXIC_FLUSH_INTERVAL, DEFAULT_TOXIC_RETENTION, NUM_CAMERAS,
};
pub use ids::{AssetId, AssetType, Host, TransactionId};
pub use math::{Aabb, Vec3};
