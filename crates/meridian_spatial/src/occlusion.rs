//! Occlusion queries.
//!
//! The partition issues one query per group per camera and reads the
//! answer back on a later frame. The query source is a backend trait so a
//! GPU implementation and a scripted test double plug in the same way.
//!
//! Running out of query objects is not an error: the group is marked
//! `EARLY_FAIL` and drawn as if visible.

use std::collections::{HashMap, HashSet};

use meridian_shared::Aabb;

use crate::arena::GroupId;
use crate::camera::CameraSlot;

/// Handle to an issued query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryHandle(pub u32);

/// Answer to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryResult {
    /// Not available yet.
    Pending,
    /// Some samples passed.
    Visible,
    /// No samples passed.
    Occluded,
}

/// Source of occlusion queries.
pub trait OcclusionBackend {
    /// Starts a query for `bounds`. `None` when no query object is free.
    fn issue(&mut self, group: GroupId, slot: CameraSlot, bounds: &Aabb) -> Option<QueryHandle>;

    /// Reads a query. A final answer retires the handle.
    fn poll(&mut self, handle: QueryHandle) -> QueryResult;

    /// Abandons a query whose answer is no longer wanted.
    fn release(&mut self, handle: QueryHandle);

    /// Called once per frame after every camera has culled.
    fn end_frame(&mut self) {}
}

/// Statistics from an occlusion backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct OcclusionStats {
    /// Queries started.
    pub issued: u32,
    /// Issue attempts refused for lack of query objects.
    pub exhausted: u32,
    /// Answers that reported visible.
    pub answered_visible: u32,
    /// Answers that reported occluded.
    pub answered_occluded: u32,
    /// Queries abandoned.
    pub released: u32,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    group: GroupId,
    ready: bool,
}

/// Deterministic backend with one frame of latency.
///
/// Groups marked with [`ScriptedOcclusion::occlude`] answer occluded,
/// everything else answers visible. At most `capacity` queries are in
/// flight at once.
#[derive(Debug)]
pub struct ScriptedOcclusion {
    capacity: usize,
    next_handle: u32,
    in_flight: HashMap<QueryHandle, InFlight>,
    occluders: HashSet<GroupId>,
    stats: OcclusionStats,
}

impl ScriptedOcclusion {
    /// Creates a backend with `capacity` query objects.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_handle: 0,
            in_flight: HashMap::new(),
            occluders: HashSet::new(),
            stats: OcclusionStats::default(),
        }
    }

    /// Future answers for `group` report occluded.
    pub fn occlude(&mut self, group: GroupId) {
        self.occluders.insert(group);
    }

    /// Future answers for `group` report visible.
    pub fn reveal(&mut self, group: GroupId) {
        self.occluders.remove(&group);
    }

    /// Makes every in-flight query answerable.
    pub fn end_frame(&mut self) {
        for query in self.in_flight.values_mut() {
            query.ready = true;
        }
    }

    /// Queries in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Returns the statistics.
    #[must_use]
    pub const fn stats(&self) -> OcclusionStats {
        self.stats
    }
}

impl OcclusionBackend for ScriptedOcclusion {
    fn issue(&mut self, group: GroupId, _slot: CameraSlot, _bounds: &Aabb) -> Option<QueryHandle> {
        if self.in_flight.len() >= self.capacity {
            self.stats.exhausted += 1;
            return None;
        }

        let handle = QueryHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.in_flight.insert(handle, InFlight { group, ready: false });
        self.stats.issued += 1;
        Some(handle)
    }

    fn poll(&mut self, handle: QueryHandle) -> QueryResult {
        let Some(query) = self.in_flight.get(&handle).copied() else {
            // Unknown handles answer visible so nothing stays hidden.
            return QueryResult::Visible;
        };
        if !query.ready {
            return QueryResult::Pending;
        }

        self.in_flight.remove(&handle);
        if self.occluders.contains(&query.group) {
            self.stats.answered_occluded += 1;
            QueryResult::Occluded
        } else {
            self.stats.answered_visible += 1;
            QueryResult::Visible
        }
    }

    fn release(&mut self, handle: QueryHandle) {
        if self.in_flight.remove(&handle).is_some() {
            self.stats.released += 1;
        }
    }

    fn end_frame(&mut self) {
        ScriptedOcclusion::end_frame(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::GroupArena;

    fn groups(n: usize) -> Vec<GroupId> {
        let mut arena: GroupArena<()> = GroupArena::new();
        (0..n).map(|_| arena.allocate_with(|_| ())).collect()
    }

    #[test]
    fn test_answers_after_one_frame() {
        let ids = groups(2);
        let mut backend = ScriptedOcclusion::new(4);
        backend.occlude(ids[1]);

        let a = backend.issue(ids[0], CameraSlot::World, &Aabb::default()).unwrap();
        let b = backend.issue(ids[1], CameraSlot::World, &Aabb::default()).unwrap();
        assert_eq!(backend.poll(a), QueryResult::Pending);

        backend.end_frame();
        assert_eq!(backend.poll(a), QueryResult::Visible);
        assert_eq!(backend.poll(b), QueryResult::Occluded);
        assert_eq!(backend.in_flight(), 0);
    }

    #[test]
    fn test_exhaustion_returns_none() {
        let ids = groups(2);
        let mut backend = ScriptedOcclusion::new(1);

        assert!(backend.issue(ids[0], CameraSlot::World, &Aabb::default()).is_some());
        assert!(backend.issue(ids[1], CameraSlot::World, &Aabb::default()).is_none());
        assert_eq!(backend.stats().exhausted, 1);
    }

    #[test]
    fn test_release_frees_capacity() {
        let ids = groups(1);
        let mut backend = ScriptedOcclusion::new(1);

        let handle = backend.issue(ids[0], CameraSlot::Shadow0, &Aabb::default()).unwrap();
        backend.release(handle);
        assert!(backend.issue(ids[0], CameraSlot::Shadow0, &Aabb::default()).is_some());
        assert_eq!(backend.stats().released, 1);
    }
}
