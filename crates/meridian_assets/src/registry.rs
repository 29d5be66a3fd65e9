//! # Request Registry
//!
//! Three pending lists, one per [`RequestKind`]. Lists are short, so every
//! lookup is a linear scan.
//!
//! ## Completion contract
//!
//! Every operation that completes requests *removes* them first and hands
//! them back as an owned `Vec`. The caller then fires callbacks with no
//! borrow of the registry held, so a callback may register new requests
//! without invalidating the iteration.

use std::time::Instant;

use meridian_shared::{AssetId, AssetType, Host};

use crate::request::{AssetRequest, PendingDetail, RequestKind};

/// Outcome of [`RequestRegistry::enqueue`].
#[derive(Debug)]
pub enum Enqueued {
    /// First request for this asset; the caller must send it upstream.
    Sent,
    /// An identical request is in flight; this one rides along.
    Coalesced,
    /// An identical request is in flight and duplicates were not allowed.
    Rejected(AssetRequest),
}

/// Registry statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryStats {
    /// Requests that went to the network.
    pub sent: u64,
    /// Requests coalesced behind an in-flight one.
    pub coalesced: u64,
    /// Requests completed by an upstream answer.
    pub completed: u64,
    /// Requests failed by timeout.
    pub timed_out: u64,
    /// Requests removed by cancellation or cleanup.
    pub canceled: u64,
}

/// Pending download, upload and local-upload lists.
#[derive(Debug, Default)]
pub struct RequestRegistry {
    downloads: Vec<AssetRequest>,
    uploads: Vec<AssetRequest>,
    local_uploads: Vec<AssetRequest>,
    stats: RegistryStats,
}

impl RequestRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&self, kind: RequestKind) -> &Vec<AssetRequest> {
        match kind {
            RequestKind::Download => &self.downloads,
            RequestKind::Upload => &self.uploads,
            RequestKind::LocalUpload => &self.local_uploads,
        }
    }

    fn list_mut(&mut self, kind: RequestKind) -> &mut Vec<AssetRequest> {
        match kind {
            RequestKind::Download => &mut self.downloads,
            RequestKind::Upload => &mut self.uploads,
            RequestKind::LocalUpload => &mut self.local_uploads,
        }
    }

    /// Registers a request.
    ///
    /// At most one request per `(type, id)` goes upstream. Later ones are
    /// attached as duplicates when `allow_duplicate` is set and handed back
    /// otherwise.
    pub fn enqueue(
        &mut self,
        kind: RequestKind,
        mut request: AssetRequest,
        allow_duplicate: bool,
    ) -> Enqueued {
        let in_flight = self.find_request(kind, request.asset_type, request.id).is_some();
        if in_flight {
            if !allow_duplicate {
                return Enqueued::Rejected(request);
            }
            request.is_duplicate = true;
            self.list_mut(kind).push(request);
            self.stats.coalesced += 1;
            return Enqueued::Coalesced;
        }

        self.list_mut(kind).push(request);
        self.stats.sent += 1;
        Enqueued::Sent
    }

    /// First pending request matching `(asset_type, id)`.
    #[must_use]
    pub fn find_request(&self, kind: RequestKind, asset_type: AssetType, id: AssetId) -> Option<&AssetRequest> {
        self.list(kind).iter().find(|r| r.matches(asset_type, id))
    }

    /// Removes and returns every request matching `(asset_type, id)`, in
    /// registration order.
    pub fn take_matching(&mut self, kind: RequestKind, asset_type: AssetType, id: AssetId) -> Vec<AssetRequest> {
        let taken = drain_where(self.list_mut(kind), |r| r.matches(asset_type, id));
        self.stats.completed += taken.len() as u64;
        taken
    }

    /// Removes and returns every request whose deadline passed.
    ///
    /// Duplicates expire together with the request that went upstream, so a
    /// later retry for the same asset is sent instead of coalesced.
    pub fn take_timed_out(&mut self, now: Instant) -> Vec<(RequestKind, AssetRequest)> {
        let mut expired = Vec::new();
        for kind in RequestKind::ALL {
            let lost: Vec<(AssetType, AssetId)> = self
                .list(kind)
                .iter()
                .filter(|r| !r.is_duplicate && r.is_expired(now))
                .map(|r| (r.asset_type, r.id))
                .collect();
            let taken = drain_where(self.list_mut(kind), |r| {
                r.is_expired(now) || lost.iter().any(|&(t, id)| r.matches(t, id))
            });
            expired.extend(taken.into_iter().map(|request| (kind, request)));
        }
        self.stats.timed_out += expired.len() as u64;
        expired
    }

    /// Removes requests for cleanup.
    ///
    /// With `all` set every request goes. Otherwise only requests whose host
    /// is not `upstream` (or is unreachable) go.
    pub fn take_for_cleanup(&mut self, all: bool, upstream: Option<Host>) -> Vec<AssetRequest> {
        let mut removed = Vec::new();
        for kind in RequestKind::ALL {
            removed.extend(drain_where(self.list_mut(kind), |r| {
                all || match (r.host, upstream) {
                    (Some(host), Some(up)) => host != up || !host.is_ok(),
                    _ => true,
                }
            }));
        }
        self.stats.canceled += removed.len() as u64;
        removed
    }

    /// Removes the first pending request matching `(asset_type, id)`.
    ///
    /// When that was the request sent upstream, the oldest duplicate takes
    /// its place and keeps waiting for the same answer.
    pub fn delete_pending(&mut self, kind: RequestKind, asset_type: AssetType, id: AssetId) -> Option<AssetRequest> {
        let list = self.list_mut(kind);
        let index = list.iter().position(|r| r.matches(asset_type, id))?;
        let removed = list.remove(index);
        if !removed.is_duplicate {
            if let Some(next) = list.iter_mut().find(|r| r.matches(asset_type, id)) {
                next.is_duplicate = false;
            }
        }
        self.stats.canceled += 1;
        Some(removed)
    }

    /// Number of pending requests of one kind.
    #[must_use]
    pub fn pending_count(&self, kind: RequestKind) -> usize {
        self.list(kind).len()
    }

    /// Number of pending requests across all lists.
    #[must_use]
    pub fn total_pending(&self) -> usize {
        self.downloads.len() + self.uploads.len() + self.local_uploads.len()
    }

    /// Details of pending requests, optionally filtered by type.
    #[must_use]
    pub fn pending_details(&self, kind: RequestKind, asset_type: Option<AssetType>, now: Instant) -> Vec<PendingDetail> {
        self.list(kind)
            .iter()
            .filter(|r| asset_type.map_or(true, |t| r.asset_type == t))
            .map(|r| r.details(kind, now))
            .collect()
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &RegistryStats {
        &self.stats
    }
}

/// Stable partition: removes matching elements and returns them in order.
fn drain_where<F>(list: &mut Vec<AssetRequest>, mut pred: F) -> Vec<AssetRequest>
where
    F: FnMut(&AssetRequest) -> bool,
{
    let mut taken = Vec::new();
    let mut kept = Vec::with_capacity(list.len());
    for request in list.drain(..) {
        if pred(&request) {
            taken.push(request);
        } else {
            kept.push(request);
        }
    }
    *list = kept;
    taken
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(id: u128, at: Instant) -> AssetRequest {
        AssetRequest::download(
            AssetId::from_u128(id),
            AssetType::Texture,
            at,
            Duration::from_secs(10),
            Box::new(|_| {}),
        )
    }

    #[test]
    fn test_duplicates_coalesce() {
        let now = Instant::now();
        let mut registry = RequestRegistry::new();

        assert!(matches!(registry.enqueue(RequestKind::Download, request(1, now), true), Enqueued::Sent));
        assert!(matches!(registry.enqueue(RequestKind::Download, request(1, now), true), Enqueued::Coalesced));
        assert!(matches!(
            registry.enqueue(RequestKind::Download, request(1, now), false),
            Enqueued::Rejected(_)
        ));

        assert_eq!(registry.pending_count(RequestKind::Download), 2);
        assert_eq!(registry.stats().sent, 1);
        assert_eq!(registry.stats().coalesced, 1);
    }

    #[test]
    fn test_take_timed_out_preserves_others() {
        let t0 = Instant::now();
        let mut registry = RequestRegistry::new();
        registry.enqueue(RequestKind::Download, request(1, t0), true);
        registry.enqueue(RequestKind::Download, request(2, t0 + Duration::from_secs(8)), true);

        let expired = registry.take_timed_out(t0 + Duration::from_secs(11));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].1.id, AssetId::from_u128(1));
        assert_eq!(registry.pending_count(RequestKind::Download), 1);

        // Already removed, never reported twice.
        assert!(registry.take_timed_out(t0 + Duration::from_secs(11)).is_empty());
    }

    #[test]
    fn test_take_matching_keeps_order() {
        let now = Instant::now();
        let mut registry = RequestRegistry::new();
        registry.enqueue(RequestKind::Download, request(5, now), true);
        registry.enqueue(RequestKind::Download, request(6, now), true);
        registry.enqueue(RequestKind::Download, request(5, now), true);

        let taken = registry.take_matching(RequestKind::Download, AssetType::Texture, AssetId::from_u128(5));
        assert_eq!(taken.len(), 2);
        assert!(!taken[0].is_duplicate);
        assert!(taken[1].is_duplicate);
        assert_eq!(registry.total_pending(), 1);
    }

    #[test]
    fn test_duplicates_expire_with_sent_request() {
        let t0 = Instant::now();
        let mut registry = RequestRegistry::new();
        registry.enqueue(RequestKind::Download, request(1, t0), true);
        registry.enqueue(RequestKind::Download, request(1, t0 + Duration::from_secs(5)), true);
        registry.enqueue(RequestKind::Download, request(2, t0 + Duration::from_secs(5)), true);

        let expired = registry.take_timed_out(t0 + Duration::from_secs(11));
        assert_eq!(expired.len(), 2);
        assert!(expired.iter().all(|(_, r)| r.id == AssetId::from_u128(1)));
        assert_eq!(registry.pending_count(RequestKind::Download), 1);

        // Nothing left in flight for asset 1: the next request goes out.
        assert!(matches!(registry.enqueue(RequestKind::Download, request(1, t0), true), Enqueued::Sent));
    }

    #[test]
    fn test_delete_promotes_next_duplicate() {
        let now = Instant::now();
        let mut registry = RequestRegistry::new();
        registry.enqueue(RequestKind::Download, request(3, now), true);
        registry.enqueue(RequestKind::Download, request(3, now), true);

        let removed = registry.delete_pending(RequestKind::Download, AssetType::Texture, AssetId::from_u128(3)).unwrap();
        assert!(!removed.is_duplicate);
        let left = registry.find_request(RequestKind::Download, AssetType::Texture, AssetId::from_u128(3)).unwrap();
        assert!(!left.is_duplicate);
    }
}
