//! # MERIDIAN Assets
//!
//! Asynchronous asset transfer: fetch and store content-addressed assets
//! through a local cache, a read-only static cache and an upstream service.
//!
//! ## Guarantees
//!
//! - Every request's callback fires exactly once: success, failure,
//!   timeout or cancellation.
//! - At most one fetch per `(type, id)` is in flight; later requests ride
//!   along and are completed from the same answer.
//! - A toxic asset is refused without touching the network.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       AssetStorage                          │
//! ├──────────────┬──────────────────┬───────────────────────────┤
//! │ LocalCache   │ RequestRegistry  │ ToxicAssetList            │
//! │ (rw + ro)    │ dl / ul / local  │ sliding retention window  │
//! ├──────────────┴──────────────────┴───────────────────────────┤
//! │ MessageTransport ──► upstream ──► InboundMessage channel    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod request;
pub mod simulation;
pub mod storage;
pub mod toxic;
pub mod transport;

pub use cache::{CacheStats, LocalCache, MemoryCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AssetConfig;
pub use error::{AssetError, AssetResult, ExtStatus};
pub use metrics::{MetricEvent, MetricResult, MetricsSink, RecordingMetrics};
pub use registry::{Enqueued, RegistryStats, RequestRegistry};
pub use request::{
    AssetRequest, DownloadCallback, DownloadReply, PendingDetail, RequestKind, StoreCallback,
    StoreOptions, StoreReply,
};
pub use simulation::{NetworkConditions, SimulatedUpstream, UpstreamStats};
pub use storage::{AssetStorage, StorageStats, TempAssetInfo, TickReport};
pub use toxic::ToxicAssetList;
pub use transport::{AssetMessage, InboundMessage, MessageTransport, RecordingTransport, SentLog};
