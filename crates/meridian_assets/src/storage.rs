//! # Asset Storage Coordinator
//!
//! Single entry point for fetching and storing assets.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ get_asset_data(id, type, cb)                                 │
//! │   local cache hit ─────────────────────────► cb(Ok(bytes))   │
//! │   static cache hit ────────────────────────► cb(Ok(bytes))   │
//! │   toxic ───────────────────────────────────► cb(Err(Toxic))  │
//! │   no upstream ─────────────────────────────► cb(Err(..))     │
//! │   registry.enqueue ── Sent ──► transport.send_reliable       │
//! │                    └─ Coalesced (rides the in-flight fetch)  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ tick()                                                       │
//! │   process_messages ── take_matching ──► callbacks            │
//! │   check_for_timeouts ── take_timed_out ──► cb(Err(Timeout))  │
//! │   every flush interval: toxic.flush_old                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Threading
//!
//! Main-thread only. Methods take `&self` so a callback holding an
//! `Rc<AssetStorage>` may issue new requests while being dispatched. No
//! internal borrow is held across a callback.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{unbounded, Receiver, Sender};
use meridian_shared::{AssetId, AssetType, Host, TransactionId};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cache::LocalCache;
use crate::clock::{Clock, SystemClock};
use crate::config::AssetConfig;
use crate::error::{AssetError, AssetResult, ExtStatus};
use crate::metrics::{MetricEvent, MetricResult, MetricsSink};
use crate::registry::{Enqueued, RequestRegistry};
use crate::request::{
    AssetRequest, DownloadReply, PendingDetail, RequestKind, StoreCallback, StoreOptions, StoreReply,
};
use crate::toxic::ToxicAssetList;
use crate::transport::{AssetMessage, InboundMessage, MessageTransport};

/// Coordinator statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageStats {
    /// Requests served from the local cache.
    pub local_hits: u64,
    /// Requests served from the static cache.
    pub static_hits: u64,
    /// Requests refused because the asset is toxic.
    pub toxic_rejections: u64,
    /// Fetches sent upstream.
    pub fetches_sent: u64,
    /// Uploads sent upstream.
    pub stores_sent: u64,
    /// Inbound messages processed.
    pub messages_processed: u64,
    /// Requests failed by timeout.
    pub timeouts: u64,
    /// Cache size mismatches detected.
    pub corruptions: u64,
}

/// What one [`AssetStorage::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Inbound messages dispatched.
    pub messages: usize,
    /// Requests failed by timeout.
    pub timed_out: usize,
    /// Toxic entries flushed.
    pub toxic_flushed: usize,
}

/// Bookkeeping for a session-only asset authored by an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempAssetInfo {
    /// Agent that owns the asset.
    pub agent_id: Uuid,
    /// Host the asset was authored on.
    pub host_name: String,
}

/// Asset fetch/store coordinator.
pub struct AssetStorage {
    config: AssetConfig,
    clock: Rc<dyn Clock>,
    cache: RefCell<Box<dyn LocalCache>>,
    static_cache: Option<Box<dyn LocalCache>>,
    transport: RefCell<Box<dyn MessageTransport>>,
    metrics: Option<Box<dyn MetricsSink>>,
    registry: RefCell<RequestRegistry>,
    toxic: RefCell<ToxicAssetList>,
    temp_assets: RefCell<HashMap<AssetId, TempAssetInfo>>,
    session_uploads: RefCell<Vec<(AssetId, AssetType)>>,
    upstream: Cell<Option<Host>>,
    inbound_tx: Sender<InboundMessage>,
    inbound_rx: Receiver<InboundMessage>,
    last_toxic_flush: Cell<Instant>,
    stats: Cell<StorageStats>,
    session_id: Uuid,
}

impl AssetStorage {
    /// Creates a coordinator over a local cache and a transport.
    pub fn new<C, T>(config: AssetConfig, cache: C, transport: T) -> Self
    where
        C: LocalCache + 'static,
        T: MessageTransport + 'static,
    {
        let clock: Rc<dyn Clock> = Rc::new(SystemClock);
        let now = clock.now();
        let (inbound_tx, inbound_rx) = unbounded();

        info!(
            timeout_secs = config.request_timeout_secs,
            toxic_retention_secs = config.toxic_retention_secs,
            "Asset storage initialized"
        );

        Self {
            toxic: RefCell::new(ToxicAssetList::new(config.toxic_retention())),
            upstream: Cell::new(config.upstream_host()),
            config,
            clock,
            cache: RefCell::new(Box::new(cache)),
            static_cache: None,
            transport: RefCell::new(Box::new(transport)),
            metrics: None,
            registry: RefCell::new(RequestRegistry::new()),
            temp_assets: RefCell::new(HashMap::new()),
            session_uploads: RefCell::new(Vec::new()),
            inbound_tx,
            inbound_rx,
            last_toxic_flush: Cell::new(now),
            stats: Cell::new(StorageStats::default()),
            session_id: Uuid::nil(),
        }
    }

    /// Replaces the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.last_toxic_flush.set(clock.now());
        self.clock = clock;
        self
    }

    /// Adds a read-only cache consulted after the local cache.
    #[must_use]
    pub fn with_static_cache<C: LocalCache + 'static>(mut self, cache: C) -> Self {
        self.static_cache = Some(Box::new(cache));
        self
    }

    /// Attaches a metrics sink.
    #[must_use]
    pub fn with_metrics<M: MetricsSink + 'static>(mut self, sink: M) -> Self {
        self.metrics = Some(Box::new(sink));
        self
    }

    /// Sets the session secret used to derive ids from transaction ids.
    #[must_use]
    pub fn with_session(mut self, session_id: Uuid) -> Self {
        self.session_id = session_id;
        self
    }

    // =========================================================================
    // Fetch
    // =========================================================================

    /// Fetches an asset.
    ///
    /// `callback` fires exactly once, possibly before this returns (cache
    /// hit, toxic, no upstream) or from a later [`tick`](Self::tick).
    pub fn get_asset_data<F>(&self, id: AssetId, asset_type: AssetType, is_priority: bool, callback: F)
    where
        F: FnOnce(DownloadReply) + 'static,
    {
        debug!(%id, %asset_type, "get_asset_data");

        if id.is_null() {
            callback(DownloadReply {
                id,
                asset_type,
                result: Err(AssetError::NotFoundLocally),
                ext_status: ExtStatus::NullId,
            });
            return;
        }

        if let Some(bytes) = self.read_local(id, asset_type) {
            self.bump(|s| s.local_hits += 1);
            callback(DownloadReply::new(id, asset_type, Ok(bytes)));
            return;
        }

        if let Some(bytes) = self.read_static(id, asset_type) {
            self.bump(|s| s.static_hits += 1);
            callback(DownloadReply::new(id, asset_type, Ok(bytes)));
            return;
        }

        let now = self.clock.now();
        if self.toxic.borrow_mut().is_toxic(id, now) {
            self.bump(|s| s.toxic_rejections += 1);
            info!(%id, %asset_type, "Refusing to fetch toxic asset");
            callback(DownloadReply::new(id, asset_type, Err(AssetError::Toxic)));
            return;
        }

        let Some(upstream) = self.upstream.get() else {
            warn!(%id, %asset_type, "Fetch with no upstream");
            self.report(id, asset_type, 0, &Err(AssetError::NoUpstream), "fetch");
            callback(DownloadReply::new(id, asset_type, Err(AssetError::NoUpstream)));
            return;
        };

        let mut request = AssetRequest::download(id, asset_type, now, self.config.request_timeout(), Box::new(callback));
        request.host = Some(upstream);
        request.is_priority = is_priority;

        let outcome = self.registry.borrow_mut().enqueue(RequestKind::Download, request, true);
        match outcome {
            Enqueued::Sent => {
                self.transport.borrow_mut().send_reliable(
                    upstream,
                    AssetMessage::Fetch { id, asset_type, priority: is_priority },
                );
                self.bump(|s| s.fetches_sent += 1);

                let pending = self.registry.borrow().pending_count(RequestKind::Download);
                if pending > self.config.max_pending_downloads {
                    warn!(pending, cap = self.config.max_pending_downloads, "Download queue over soft cap");
                }
            }
            Enqueued::Coalesced => debug!(%id, %asset_type, "Coalesced with in-flight fetch"),
            Enqueued::Rejected(request) => request.fail(AssetError::Unknown),
        }
    }

    fn read_local(&self, id: AssetId, asset_type: AssetType) -> Option<Arc<[u8]>> {
        let size = self.cache.borrow().get_size(id, asset_type)?;
        if size == 0 {
            // Empty entries are leftovers from interrupted writes.
            self.cache.borrow_mut().remove(id, asset_type);
            return None;
        }
        self.cache.borrow().read(id, asset_type).ok()
    }

    fn read_static(&self, id: AssetId, asset_type: AssetType) -> Option<Arc<[u8]>> {
        let cache = self.static_cache.as_ref()?;
        cache.read(id, asset_type).ok().filter(|bytes| !bytes.is_empty())
    }

    // =========================================================================
    // Store
    // =========================================================================

    /// Stores an asset under a known id.
    ///
    /// The payload is written to the local cache first; a size mismatch on
    /// read-back fails the upload with [`AssetError::StorageCorrupt`].
    pub fn store_asset_data(
        &self,
        id: AssetId,
        asset_type: AssetType,
        data: &[u8],
        options: StoreOptions,
        callback: Option<StoreCallback>,
    ) {
        debug!(%id, %asset_type, size = data.len(), temp = options.temp, "store_asset_data");

        if data.is_empty() {
            warn!(%id, %asset_type, "Refusing to store zero-size asset");
            self.fail_store(id, asset_type, 0, AssetError::ZeroSize, callback);
            return;
        }

        if let Err(err) = self.write_verified(id, asset_type, data, data.len()) {
            self.fail_store(id, asset_type, data.len(), err, callback);
            return;
        }

        if options.temp {
            self.session_uploads.borrow_mut().push((id, asset_type));
        }

        let Some(upstream) = self.upstream.get() else {
            warn!(%id, %asset_type, "Store with no upstream");
            self.fail_store(id, asset_type, data.len(), AssetError::NoUpstream, callback);
            return;
        };

        let kind = if options.store_local { RequestKind::LocalUpload } else { RequestKind::Upload };
        let timeout = options.timeout.unwrap_or_else(|| self.config.request_timeout());
        let mut request = AssetRequest::store(id, asset_type, self.clock.now(), timeout, callback);
        request.host = Some(upstream);
        request.is_priority = options.priority;
        request.is_temp = options.temp;
        request.is_user_waiting = options.user_waiting;
        request.requesting_agent = options.requesting_agent;
        request.data_in_cache = true;

        let outcome = self.registry.borrow_mut().enqueue(kind, request, true);
        match outcome {
            Enqueued::Sent => {
                self.transport.borrow_mut().send_reliable(
                    upstream,
                    AssetMessage::Store {
                        id,
                        asset_type,
                        data: Arc::from(data),
                        temp: options.temp,
                        store_local: options.store_local,
                    },
                );
                self.bump(|s| s.stores_sent += 1);
            }
            Enqueued::Coalesced => debug!(%id, %asset_type, kind = kind.name(), "Coalesced with in-flight upload"),
            Enqueued::Rejected(request) => request.fail(AssetError::Unknown),
        }
    }

    /// Stores an asset keyed by an upload transaction. Returns the asset id
    /// the upstream will commit it under.
    pub fn store_asset_data_by_transaction(
        &self,
        transaction: TransactionId,
        asset_type: AssetType,
        data: &[u8],
        options: StoreOptions,
        callback: Option<StoreCallback>,
    ) -> AssetId {
        let id = transaction.make_asset_id(&self.session_id);
        debug!(%transaction, %id, "Derived asset id for upload transaction");
        self.store_asset_data(id, asset_type, data, options, callback);
        id
    }

    fn fail_store(
        &self,
        id: AssetId,
        asset_type: AssetType,
        size: usize,
        err: AssetError,
        callback: Option<StoreCallback>,
    ) {
        let result = Err(err);
        self.report(id, asset_type, size, &result, "store");
        if let Some(cb) = callback {
            cb(StoreReply::new(id, asset_type, result));
        }
    }

    /// Writes and reads back the size. On mismatch the entry is dropped.
    fn write_verified(&self, id: AssetId, asset_type: AssetType, data: &[u8], expected: usize) -> AssetResult<()> {
        let mut cache = self.cache.borrow_mut();
        cache.write(id, asset_type, data)?;
        let actual = cache.get_size(id, asset_type).unwrap_or(0);
        if actual == expected {
            return Ok(());
        }

        cache.remove(id, asset_type);
        drop(cache);
        self.bump(|s| s.corruptions += 1);
        error!(%id, %asset_type, expected, actual, "Local cache size mismatch");
        Err(AssetError::StorageCorrupt { expected, actual })
    }

    // =========================================================================
    // Completion
    // =========================================================================

    /// Sender for upstream completions. Hand this to the transport.
    #[must_use]
    pub fn inbound_sender(&self) -> Sender<InboundMessage> {
        self.inbound_tx.clone()
    }

    /// Dispatches every inbound message queued so far. Messages queued by
    /// callbacks during dispatch wait for the next call.
    pub fn process_messages(&self) -> usize {
        let inbound: Vec<InboundMessage> = self.inbound_rx.try_iter().collect();
        let count = inbound.len();

        for message in inbound {
            match message {
                InboundMessage::DownloadComplete { id, asset_type, result, declared_size } => {
                    self.download_complete(id, asset_type, result, declared_size);
                }
                InboundMessage::UploadComplete { id, asset_type, result } => {
                    self.upload_complete(id, asset_type, result);
                }
            }
        }

        self.bump(|s| s.messages_processed += count as u64);
        count
    }

    fn download_complete(
        &self,
        id: AssetId,
        asset_type: AssetType,
        result: AssetResult<Arc<[u8]>>,
        declared_size: Option<usize>,
    ) {
        let requests = self.registry.borrow_mut().take_matching(RequestKind::Download, asset_type, id);
        if requests.is_empty() {
            debug!(%id, %asset_type, "Download completed with nothing pending");
            return;
        }

        let result = match result {
            Ok(bytes) if bytes.is_empty() => Err(AssetError::ZeroSize),
            Ok(bytes) => {
                let expected = declared_size.unwrap_or(bytes.len());
                self.write_verified(id, asset_type, &bytes, expected).map(|()| bytes)
            }
            Err(err) => Err(err),
        };

        let size = result.as_ref().map_or(0, |b| b.len());
        self.report(id, asset_type, size, &result.as_ref().map(|_| ()).map_err(AssetError::clone), "download");
        debug!(%id, %asset_type, waiters = requests.len(), ok = result.is_ok(), "Download complete");

        for request in requests {
            request.complete_download(result.clone());
        }
    }

    fn upload_complete(&self, id: AssetId, asset_type: AssetType, result: AssetResult<()>) {
        let mut requests = self.registry.borrow_mut().take_matching(RequestKind::Upload, asset_type, id);
        requests.extend(
            self.registry
                .borrow_mut()
                .take_matching(RequestKind::LocalUpload, asset_type, id),
        );
        if requests.is_empty() {
            debug!(%id, %asset_type, "Upload completed with nothing pending");
            return;
        }

        let size = self.cache.borrow().get_size(id, asset_type).unwrap_or(0);
        self.report(id, asset_type, size, &result, "upload");

        for request in requests {
            request.complete_store(result.clone());
        }
    }

    /// Fails every request past its deadline with [`AssetError::Timeout`].
    pub fn check_for_timeouts(&self) -> usize {
        let now = self.clock.now();
        let expired = self.registry.borrow_mut().take_timed_out(now);
        let count = expired.len();

        for (kind, request) in expired {
            warn!(
                id = %request.id,
                asset_type = %request.asset_type,
                kind = kind.name(),
                "Asset request timed out"
            );
            self.report(request.id, request.asset_type, 0, &Err(AssetError::Timeout), kind.name());
            request.fail(AssetError::Timeout);
        }

        self.bump(|s| s.timeouts += count as u64);
        count
    }

    /// One cooperative step: drain completions, expire requests, and flush
    /// the toxic list when its interval has elapsed.
    pub fn tick(&self) -> TickReport {
        let messages = self.process_messages();
        let timed_out = self.check_for_timeouts();

        let now = self.clock.now();
        let toxic_flushed = if now.saturating_duration_since(self.last_toxic_flush.get())
            >= self.config.toxic_flush_interval()
        {
            self.last_toxic_flush.set(now);
            self.flush_old_toxic_assets(false)
        } else {
            0
        };

        TickReport { messages, timed_out, toxic_flushed }
    }

    // =========================================================================
    // Toxic list
    // =========================================================================

    /// Quarantines an asset.
    pub fn mark_asset_toxic(&self, id: AssetId) {
        if id.is_null() {
            return;
        }
        info!(%id, "Marking asset toxic");
        self.toxic.borrow_mut().mark(id, self.clock.now());
    }

    /// True if the asset is quarantined. Refreshes it when it is.
    pub fn is_asset_toxic(&self, id: AssetId) -> bool {
        !id.is_null() && self.toxic.borrow_mut().is_toxic(id, self.clock.now())
    }

    /// Drops expired toxic entries, or all of them with `force`.
    pub fn flush_old_toxic_assets(&self, force: bool) -> usize {
        let flushed = self.toxic.borrow_mut().flush_old(self.clock.now(), force);
        if flushed > 0 {
            debug!(flushed, force, "Flushed toxic assets");
        }
        flushed
    }

    /// Number of quarantined assets.
    #[must_use]
    pub fn toxic_count(&self) -> usize {
        self.toxic.borrow().len()
    }

    // =========================================================================
    // Upstream and pending requests
    // =========================================================================

    /// Replaces the upstream host. `None` disconnects.
    pub fn set_upstream(&self, host: Option<Host>) {
        info!(upstream = ?host, "Asset upstream changed");
        self.upstream.set(host);
    }

    /// Current upstream host.
    #[must_use]
    pub fn upstream(&self) -> Option<Host> {
        self.upstream.get()
    }

    /// True if an upstream is configured and reachable.
    #[must_use]
    pub fn is_upstream_ok(&self) -> bool {
        self.upstream.get().is_some_and(|h| h.is_ok())
    }

    /// True if either cache holds the asset.
    #[must_use]
    pub fn has_local_asset(&self, id: AssetId, asset_type: AssetType) -> bool {
        self.cache.borrow().exists(id, asset_type)
            || self.static_cache.as_ref().is_some_and(|c| c.exists(id, asset_type))
    }

    /// Number of pending requests of one kind.
    #[must_use]
    pub fn pending_count(&self, kind: RequestKind) -> usize {
        self.registry.borrow().pending_count(kind)
    }

    /// Details of pending requests, optionally filtered by type.
    #[must_use]
    pub fn pending_details(&self, kind: RequestKind, asset_type: Option<AssetType>) -> Vec<PendingDetail> {
        self.registry.borrow().pending_details(kind, asset_type, self.clock.now())
    }

    /// Details of the first pending request for `(asset_type, id)`.
    #[must_use]
    pub fn pending_request(&self, kind: RequestKind, asset_type: AssetType, id: AssetId) -> Option<PendingDetail> {
        let now = self.clock.now();
        self.registry
            .borrow()
            .find_request(kind, asset_type, id)
            .map(|r| r.details(kind, now))
    }

    /// Removes one pending request; its callback fires with
    /// [`AssetError::Canceled`]. Returns false if nothing matched.
    pub fn delete_pending_request(&self, kind: RequestKind, asset_type: AssetType, id: AssetId) -> bool {
        let removed = self.registry.borrow_mut().delete_pending(kind, asset_type, id);
        match removed {
            Some(request) => {
                debug!(%id, %asset_type, kind = kind.name(), "Pending request deleted");
                request.fail(AssetError::Canceled);
                true
            }
            None => false,
        }
    }

    /// Fails pending requests with `error`: all of them, or with `all`
    /// unset only those sent to a host that is no longer the upstream.
    pub fn cleanup_requests(&self, all: bool, error: &AssetError) -> usize {
        let removed = self.registry.borrow_mut().take_for_cleanup(all, self.upstream.get());
        let count = removed.len();
        if count > 0 {
            info!(count, all, %error, "Cleaning up pending asset requests");
        }
        for request in removed {
            request.fail(error.clone());
        }
        count
    }

    // =========================================================================
    // Session-only assets
    // =========================================================================

    /// Records ownership of a session-only asset.
    pub fn add_temp_asset_data(&self, id: AssetId, agent_id: Uuid, host_name: &str) {
        self.temp_assets
            .borrow_mut()
            .insert(id, TempAssetInfo { agent_id, host_name: host_name.to_owned() });
    }

    /// True if `id` is a recorded session-only asset.
    #[must_use]
    pub fn has_temp_asset_data(&self, id: AssetId) -> bool {
        self.temp_assets.borrow().contains_key(&id)
    }

    /// Owner of a session-only asset.
    #[must_use]
    pub fn temp_asset_agent(&self, id: AssetId) -> Option<Uuid> {
        self.temp_assets.borrow().get(&id).map(|info| info.agent_id)
    }

    /// Authoring host of a session-only asset.
    #[must_use]
    pub fn temp_asset_host_name(&self, id: AssetId) -> Option<String> {
        self.temp_assets.borrow().get(&id).map(|info| info.host_name.clone())
    }

    /// Forgets one session-only asset.
    pub fn remove_temp_asset_data(&self, id: AssetId) -> bool {
        self.temp_assets.borrow_mut().remove(&id).is_some()
    }

    /// Forgets every session-only asset owned by `agent_id`.
    pub fn remove_temp_asset_data_by_agent(&self, agent_id: Uuid) -> usize {
        let mut temp = self.temp_assets.borrow_mut();
        let before = temp.len();
        temp.retain(|_, info| info.agent_id != agent_id);
        before - temp.len()
    }

    /// Number of recorded session-only assets.
    #[must_use]
    pub fn temp_asset_count(&self) -> usize {
        self.temp_assets.borrow().len()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Cancels everything pending and drops session-only uploads from the
    /// local cache.
    pub fn shutdown(&self) {
        let canceled = self.cleanup_requests(true, &AssetError::Canceled);

        let uploads: Vec<_> = self.session_uploads.borrow_mut().drain(..).collect();
        let mut cache = self.cache.borrow_mut();
        for (id, asset_type) in &uploads {
            cache.remove(*id, *asset_type);
        }

        info!(canceled, purged = uploads.len(), "Asset storage shut down");
    }

    /// Returns statistics.
    #[must_use]
    pub fn stats(&self) -> StorageStats {
        self.stats.get()
    }

    /// Registry statistics.
    #[must_use]
    pub fn registry_stats(&self) -> crate::registry::RegistryStats {
        *self.registry.borrow().stats()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &AssetConfig {
        &self.config
    }

    fn bump(&self, f: impl FnOnce(&mut StorageStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    fn report(&self, id: AssetId, asset_type: AssetType, size: usize, result: &AssetResult<()>, message: &'static str) {
        let Some(sink) = &self.metrics else {
            return;
        };
        let (result, status) = match result {
            Ok(()) => (MetricResult::Okay, 0),
            Err(err) => {
                let category = match err {
                    AssetError::ZeroSize => MetricResult::ZeroSize,
                    AssetError::NoUpstream => MetricResult::NoUpstream,
                    AssetError::StorageCorrupt { .. } => MetricResult::StorageCorruption,
                    _ => MetricResult::Failed,
                };
                (category, err.code())
            }
        };
        sink.report(MetricEvent { id, asset_type, size, result, status, message });
    }
}

impl std::fmt::Debug for AssetStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetStorage")
            .field("upstream", &self.upstream.get())
            .field("pending", &self.registry.borrow().total_pending())
            .field("toxic", &self.toxic.borrow().len())
            .field("stats", &self.stats.get())
            .finish_non_exhaustive()
    }
}
