//! # Asset Requests
//!
//! A pending request owns its completion callback. The callback is an owned
//! closure, so caller context travels with it and is dropped with it.
//! Completing a request consumes it; a request therefore cannot fire twice.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use meridian_shared::{AssetId, AssetType, Host};
use uuid::Uuid;

use crate::error::{AssetError, AssetResult, ExtStatus};

/// Which pending list a request lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Waiting for bytes from the upstream.
    Download,
    /// Waiting for the upstream to commit an upload.
    Upload,
    /// Waiting for an upload to be committed to the upstream's local store.
    LocalUpload,
}

impl RequestKind {
    /// All kinds, in the order lists are scanned.
    pub const ALL: [Self; 3] = [Self::Download, Self::Upload, Self::LocalUpload];

    /// Short name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Upload => "upload",
            Self::LocalUpload => "local upload",
        }
    }
}

/// Delivered to a download callback.
#[derive(Debug, Clone)]
pub struct DownloadReply {
    /// Asset id.
    pub id: AssetId,
    /// Asset type.
    pub asset_type: AssetType,
    /// Bytes on success.
    pub result: AssetResult<Arc<[u8]>>,
    /// Extended status.
    pub ext_status: ExtStatus,
}

impl DownloadReply {
    pub(crate) fn new(id: AssetId, asset_type: AssetType, result: AssetResult<Arc<[u8]>>) -> Self {
        let ext_status = result.as_ref().err().map_or(ExtStatus::None, AssetError::ext_status);
        Self { id, asset_type, result, ext_status }
    }

    /// Integer status code, `0` on success.
    #[must_use]
    pub fn status(&self) -> i32 {
        self.result.as_ref().err().map_or(0, AssetError::code)
    }
}

/// Delivered to an upload callback.
#[derive(Debug, Clone)]
pub struct StoreReply {
    /// Asset id the data was stored under.
    pub id: AssetId,
    /// Asset type.
    pub asset_type: AssetType,
    /// Outcome.
    pub result: AssetResult<()>,
    /// Extended status.
    pub ext_status: ExtStatus,
}

impl StoreReply {
    pub(crate) fn new(id: AssetId, asset_type: AssetType, result: AssetResult<()>) -> Self {
        let ext_status = result.as_ref().err().map_or(ExtStatus::None, AssetError::ext_status);
        Self { id, asset_type, result, ext_status }
    }

    /// Integer status code, `0` on success.
    #[must_use]
    pub fn status(&self) -> i32 {
        self.result.as_ref().err().map_or(0, AssetError::code)
    }
}

/// Download completion callback.
pub type DownloadCallback = Box<dyn FnOnce(DownloadReply)>;

/// Upload completion callback.
pub type StoreCallback = Box<dyn FnOnce(StoreReply)>;

/// Callback attached to a pending request.
pub enum RequestCallback {
    /// Fires with a [`DownloadReply`].
    Download(DownloadCallback),
    /// Fires with a [`StoreReply`].
    Store(StoreCallback),
}

impl fmt::Debug for RequestCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Download(_) => f.write_str("RequestCallback::Download"),
            Self::Store(_) => f.write_str("RequestCallback::Store"),
        }
    }
}

/// Options for an upload.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    /// Session-only asset, not persisted upstream.
    pub temp: bool,
    /// Commit to the upstream's local store instead of the shared one.
    pub store_local: bool,
    /// Jump the upstream queue.
    pub priority: bool,
    /// A user is actively waiting on this upload.
    pub user_waiting: bool,
    /// Per-request timeout; the configured default when `None`.
    pub timeout: Option<Duration>,
    /// Agent the upload is made on behalf of.
    pub requesting_agent: Option<Uuid>,
}

/// A request waiting for the upstream.
#[derive(Debug)]
pub struct AssetRequest {
    /// Asset id.
    pub id: AssetId,
    /// Asset type.
    pub asset_type: AssetType,
    /// Upstream the request was sent to.
    pub host: Option<Host>,
    /// When the request was registered.
    pub time: Instant,
    /// How long it may stay pending.
    pub timeout: Duration,
    /// Jump the upstream queue.
    pub is_priority: bool,
    /// Session-only upload.
    pub is_temp: bool,
    /// A user is actively waiting.
    pub is_user_waiting: bool,
    /// Payload already sits in the local cache.
    pub data_in_cache: bool,
    /// Coalesced behind an identical in-flight request.
    pub is_duplicate: bool,
    /// Agent the request is made on behalf of.
    pub requesting_agent: Option<Uuid>,
    callback: Option<RequestCallback>,
}

impl AssetRequest {
    /// Creates a download request.
    #[must_use]
    pub fn download(
        id: AssetId,
        asset_type: AssetType,
        time: Instant,
        timeout: Duration,
        callback: DownloadCallback,
    ) -> Self {
        Self::new(id, asset_type, time, timeout, Some(RequestCallback::Download(callback)))
    }

    /// Creates an upload request.
    #[must_use]
    pub fn store(
        id: AssetId,
        asset_type: AssetType,
        time: Instant,
        timeout: Duration,
        callback: Option<StoreCallback>,
    ) -> Self {
        Self::new(id, asset_type, time, timeout, callback.map(RequestCallback::Store))
    }

    fn new(
        id: AssetId,
        asset_type: AssetType,
        time: Instant,
        timeout: Duration,
        callback: Option<RequestCallback>,
    ) -> Self {
        Self {
            id,
            asset_type,
            host: None,
            time,
            timeout,
            is_priority: false,
            is_temp: false,
            is_user_waiting: false,
            data_in_cache: false,
            is_duplicate: false,
            requesting_agent: None,
            callback,
        }
    }

    /// True if `(asset_type, id)` matches.
    #[inline]
    #[must_use]
    pub fn matches(&self, asset_type: AssetType, id: AssetId) -> bool {
        self.asset_type == asset_type && self.id == id
    }

    /// True once `now` is past this request's deadline.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.time) > self.timeout
    }

    /// Consumes the request, delivering a download outcome.
    ///
    /// A store callback on a download path receives the outcome without
    /// the payload.
    pub fn complete_download(self, result: AssetResult<Arc<[u8]>>) {
        match self.callback {
            Some(RequestCallback::Download(cb)) => cb(DownloadReply::new(self.id, self.asset_type, result)),
            Some(RequestCallback::Store(cb)) => {
                cb(StoreReply::new(self.id, self.asset_type, result.map(|_| ())));
            }
            None => {}
        }
    }

    /// Consumes the request, delivering an upload outcome.
    pub fn complete_store(self, result: AssetResult<()>) {
        match self.callback {
            Some(RequestCallback::Store(cb)) => cb(StoreReply::new(self.id, self.asset_type, result)),
            Some(RequestCallback::Download(cb)) => {
                let result = result.and(Err(AssetError::NotFoundLocally));
                cb(DownloadReply::new(self.id, self.asset_type, result));
            }
            None => {}
        }
    }

    /// Consumes the request with a failure, whatever its kind.
    pub fn fail(self, error: AssetError) {
        match self.callback {
            Some(RequestCallback::Download(cb)) => {
                cb(DownloadReply::new(self.id, self.asset_type, Err(error)));
            }
            Some(RequestCallback::Store(cb)) => cb(StoreReply::new(self.id, self.asset_type, Err(error))),
            None => {}
        }
    }

    /// Snapshot for diagnostics.
    #[must_use]
    pub fn details(&self, kind: RequestKind, now: Instant) -> PendingDetail {
        PendingDetail {
            kind,
            id: self.id,
            asset_type: self.asset_type,
            host: self.host,
            age: now.saturating_duration_since(self.time),
            is_priority: self.is_priority,
            is_temp: self.is_temp,
            is_user_waiting: self.is_user_waiting,
            is_duplicate: self.is_duplicate,
            requesting_agent: self.requesting_agent,
        }
    }
}

/// Read-only view of a pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDetail {
    /// List the request lives on.
    pub kind: RequestKind,
    /// Asset id.
    pub id: AssetId,
    /// Asset type.
    pub asset_type: AssetType,
    /// Upstream it was sent to.
    pub host: Option<Host>,
    /// Time spent pending.
    pub age: Duration,
    /// Priority flag.
    pub is_priority: bool,
    /// Session-only flag.
    pub is_temp: bool,
    /// User-waiting flag.
    pub is_user_waiting: bool,
    /// Coalesced flag.
    pub is_duplicate: bool,
    /// Agent the request is made on behalf of.
    pub requesting_agent: Option<Uuid>,
}
