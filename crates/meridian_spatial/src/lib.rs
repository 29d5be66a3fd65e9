//! # MERIDIAN Spatial
//!
//! Octree partitions of scene content, frustum and occlusion culling, and
//! draw-batch generation.
//!
//! ## Guarantees
//!
//! - Group bounds contain every child's bounds and every held object after
//!   a rebound.
//! - Rebuilding an unchanged group produces identical batches.
//! - Running out of occlusion queries draws too much, never too little.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                    SpatialPartition                       │
//! ├─────────────────────┬─────────────────┬───────────────────┤
//! │ Octree              │ GeometryManager │ OcclusionBackend  │
//! │ GroupArena<Group>   │ faces → batches │ query per camera  │
//! ├─────────────────────┴─────────────────┴───────────────────┤
//! │ cull(camera) ──► CullResult { groups, render map, alpha } │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//!
//! Partitions are owned and mutated by the render thread. Draw batches are
//! `Arc`-shared so a cull result can be handed to another thread for
//! submission.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod arena;
pub mod camera;
pub mod config;
pub mod cull_result;
pub mod draw_info;
pub mod error;
pub mod geometry;
pub mod group;
pub mod object;
pub mod occlusion;
pub mod octree;
pub mod partition;
pub mod state;

pub use arena::{GroupArena, GroupId};
pub use camera::{Camera, CameraSlot, Frustum, Intersection, Perspective, Plane};
pub use config::SpatialConfig;
pub use cull_result::{CullResult, CullStats};
pub use draw_info::{
    AlphaBatch, DrawInfo, DrawInfoRaw, DrawInfoRef, DrawParams, RenderType, NUM_RENDER_TYPES,
};
pub use error::{SpatialError, SpatialResult};
pub use geometry::{
    face_render_type, DrawMap, GeometryCount, GeometryManager, GroupGeometry, NullGeometryManager,
    ParticleGeometryManager, VolumeGeometryManager,
};
pub use group::{OcclusionSlot, SpatialGroup};
pub use object::{Face, MaterialParams, MatrixId, ObjectId, SceneObject, TextureId};
pub use occlusion::{OcclusionBackend, OcclusionStats, QueryHandle, QueryResult, ScriptedOcclusion};
pub use octree::Octree;
pub use partition::{PartitionType, SegmentHit, SpatialPartition};
pub use state::{GroupState, OcclusionMode, OcclusionState, StateMode};
