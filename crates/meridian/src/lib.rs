//! # MERIDIAN
//!
//! Viewer integration: configuration, the scene registry and the frame loop
//! that drives the asset coordinator and the spatial partitions.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ViewerLoop                           │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │ AssetStorage                 │ SceneRegistry                │
//! │ (meridian_assets)            │ one SpatialPartition / kind  │
//! │ tick: completions, timeouts  │ cull_all ──► SceneCull       │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │ ViewerConfig (TOML) · logging · FrameStatsAccumulator       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs on the caller's thread. Nothing here spawns.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod logging;
pub mod scene;
pub mod viewer_loop;

pub use config::{ConfigError, ConfigResult, FrameConfig, ViewerConfig};
pub use scene::{SceneCull, SceneRegistry};
pub use viewer_loop::{FrameStats, FrameStatsAccumulator, ViewerLoop, TARGET_FRAME_TIME};

// Re-export the subsystems so binaries need one dependency.
pub use meridian_assets as assets;
pub use meridian_shared as shared;
pub use meridian_spatial as spatial;
