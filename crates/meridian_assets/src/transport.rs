//! # Asset Transport
//!
//! Outbound requests go through [`MessageTransport::send_reliable`].
//! Completions come back as [`InboundMessage`]s on a crossbeam channel that
//! the coordinator drains once per tick on the main thread.
//!
//! ```text
//! AssetStorage ──send_reliable──► transport ──► upstream
//!      ▲                                           │
//!      └──── process_messages ◄── channel ◄────────┘
//! ```

use std::sync::Arc;

use meridian_shared::{AssetId, AssetType, Host};
use parking_lot::Mutex;

use crate::error::AssetError;

/// Outbound message to the upstream asset service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetMessage {
    /// Request an asset download.
    Fetch {
        /// Asset to fetch.
        id: AssetId,
        /// Asset type.
        asset_type: AssetType,
        /// Jump the upstream queue.
        priority: bool,
    },
    /// Upload an asset.
    Store {
        /// Asset id the data is stored under.
        id: AssetId,
        /// Asset type.
        asset_type: AssetType,
        /// Payload.
        data: Arc<[u8]>,
        /// Session-only; the upstream must not persist it.
        temp: bool,
        /// Persist on the upstream's local store only.
        store_local: bool,
    },
}

impl AssetMessage {
    /// Asset id the message refers to.
    #[must_use]
    pub const fn asset_id(&self) -> AssetId {
        match self {
            Self::Fetch { id, .. } | Self::Store { id, .. } => *id,
        }
    }
}

/// Completion arriving from the upstream.
#[derive(Debug, Clone)]
pub enum InboundMessage {
    /// A download finished.
    DownloadComplete {
        /// Asset id.
        id: AssetId,
        /// Asset type.
        asset_type: AssetType,
        /// Payload, or the upstream's failure.
        result: Result<Arc<[u8]>, AssetError>,
        /// Size the upstream announced before sending the payload.
        declared_size: Option<usize>,
    },
    /// An upload finished.
    UploadComplete {
        /// Asset id.
        id: AssetId,
        /// Asset type.
        asset_type: AssetType,
        /// Upstream verdict.
        result: Result<(), AssetError>,
    },
}

/// Reliable message channel to the upstream.
///
/// Implementations must not block; delivery happens later through the
/// coordinator's inbound channel.
pub trait MessageTransport {
    /// Queues a message for reliable delivery to `host`.
    fn send_reliable(&mut self, host: Host, message: AssetMessage);
}

/// Log of sent messages, shared between a [`RecordingTransport`] and the
/// code inspecting it.
pub type SentLog = Arc<Mutex<Vec<(Host, AssetMessage)>>>;

/// Transport that records every message and delivers nothing.
#[derive(Debug, Default, Clone)]
pub struct RecordingTransport {
    sent: SentLog,
}

impl RecordingTransport {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle onto the sent-message log. Stays valid after the transport
    /// is moved into a coordinator.
    #[must_use]
    pub fn log(&self) -> SentLog {
        Arc::clone(&self.sent)
    }
}

impl MessageTransport for RecordingTransport {
    fn send_reliable(&mut self, host: Host, message: AssetMessage) {
        self.sent.lock().push((host, message));
    }
}
