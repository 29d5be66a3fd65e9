//! # Octree
//!
//! Loose-fit octree over [`SpatialGroup`]s stored in a [`GroupArena`].
//!
//! ## Placement
//!
//! An object lives in the deepest node whose child cell would not fully
//! contain it, or in a node that still has room (`max_elements`). When an
//! object falls outside the root cell the root grows toward it, doubling
//! each step, with the old root becoming one octant of the new one.
//!
//! ## Bounds
//!
//! Mutation never recomputes bounds. It marks the touched group and its
//! ancestors `DIRTY` ([`Octree::unbound`]); [`Octree::rebound`] then
//! recomputes tight bounds bottom-up, visiting only dirty groups.
//!
//! ## Pruning
//!
//! A group left with no objects and no children is freed and detached
//! from its parent, unless a render pass has it pinned. In-flight query
//! handles of freed groups are kept for the owner to release.

use std::collections::HashMap;

use meridian_shared::{Aabb, Vec3};
use tracing::{debug, trace};

use crate::arena::{GroupArena, GroupId};
use crate::camera::CameraSlot;
use crate::config::SpatialConfig;
use crate::error::{SpatialError, SpatialResult};
use crate::group::SpatialGroup;
use crate::object::{ObjectId, SceneObject};
use crate::occlusion::QueryHandle;
use crate::state::{GroupState, OcclusionMode, OcclusionState, StateMode};

/// Root doublings attempted before an object is declared out of range.
const MAX_ROOT_GROWTH: usize = 24;

#[derive(Debug, Clone)]
struct ObjectEntry {
    object: SceneObject,
    group: GroupId,
}

/// Smallest box containing every box, `None` for none.
fn union_all<'a>(boxes: impl Iterator<Item = &'a Aabb>) -> Option<Aabb> {
    boxes.fold(None, |acc: Option<Aabb>, b| Some(acc.map_or(*b, |a| a.union(b))))
}

/// Octree of spatial groups.
#[derive(Debug)]
pub struct Octree {
    groups: GroupArena<SpatialGroup>,
    root: GroupId,
    objects: HashMap<ObjectId, ObjectEntry>,
    max_depth: u32,
    max_elements: usize,
    min_node_size: f32,
    orphaned_queries: Vec<QueryHandle>,
}

impl Octree {
    /// Creates an octree with an empty root centered on the origin.
    #[must_use]
    pub fn new(config: &SpatialConfig) -> Self {
        let mut groups = GroupArena::new();
        let half = config.root_size * 0.5;
        let root = groups.allocate_with(|id| SpatialGroup::new(id, None, Vec3::ZERO, half));
        Self {
            groups,
            root,
            objects: HashMap::new(),
            max_depth: config.octree_max_depth,
            max_elements: config.octree_max_elements,
            min_node_size: config.min_node_size,
            orphaned_queries: Vec::new(),
        }
    }

    /// The root group.
    #[inline]
    #[must_use]
    pub const fn root(&self) -> GroupId {
        self.root
    }

    /// Looks up a group.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&SpatialGroup> {
        self.groups.get(id)
    }

    pub(crate) fn group_mut(&mut self, id: GroupId) -> Option<&mut SpatialGroup> {
        self.groups.get_mut(id)
    }

    fn require(&self, id: GroupId) -> SpatialResult<&SpatialGroup> {
        self.groups.get(id).ok_or(SpatialError::UnknownGroup(id))
    }

    fn require_mut(&mut self, id: GroupId) -> SpatialResult<&mut SpatialGroup> {
        self.groups.get_mut(id).ok_or(SpatialError::UnknownGroup(id))
    }

    /// Every live group, in slot order.
    pub fn groups(&self) -> impl Iterator<Item = &SpatialGroup> {
        self.groups.iter().map(|(_, g)| g)
    }

    /// Number of live groups.
    #[must_use]
    pub const fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Looks up an object.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id).map(|e| &e.object)
    }

    /// Every object, in no particular order.
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.values().map(|e| &e.object)
    }

    /// Number of objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Group holding an object.
    #[must_use]
    pub fn group_of(&self, id: ObjectId) -> Option<GroupId> {
        self.objects.get(&id).map(|e| e.group)
    }

    /// Objects held directly by a group, in insertion order.
    #[must_use]
    pub fn group_objects(&self, id: GroupId) -> Vec<&SceneObject> {
        self.groups.get(id).map_or_else(Vec::new, |g| {
            g.elements.iter().filter_map(|o| self.object(*o)).collect()
        })
    }

    /// Group and all descendants, parents before children.
    #[must_use]
    pub fn subtree(&self, id: GroupId) -> Vec<GroupId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(gid) = stack.pop() {
            if let Some(group) = self.groups.get(gid) {
                out.push(gid);
                stack.extend(group.children());
            }
        }
        out
    }

    /// Inserts an object. Returns the group it landed in.
    ///
    /// # Errors
    ///
    /// - [`SpatialError::InvalidExtents`] for NaN or infinite extents
    /// - [`SpatialError::DuplicateObject`] if the id is already present
    /// - [`SpatialError::OutOfRange`] if the root cannot grow to reach it
    pub fn insert(&mut self, object: SceneObject) -> SpatialResult<GroupId> {
        let id = object.id;
        if !object.extents.is_finite() {
            return Err(SpatialError::InvalidExtents(id));
        }
        if self.objects.contains_key(&id) {
            return Err(SpatialError::DuplicateObject(id));
        }

        self.grow_to_fit(&object.extents, id)?;
        let gid = self.descend(&object.extents)?;

        let group = self.require_mut(gid)?;
        group.elements.push(id);
        group.state.insert(GroupState::OBJECT_DIRTY | GroupState::GEOM_DIRTY);
        self.objects.insert(id, ObjectEntry { object, group: gid });
        self.unbound(gid);

        trace!(object = %id, group = %gid, "Inserted object");
        Ok(gid)
    }

    /// Walks down from the root to the node that should hold `extents`,
    /// creating at most one child per level.
    fn descend(&mut self, extents: &Aabb) -> SpatialResult<GroupId> {
        let mut gid = self.root;
        let mut depth = 0;
        let center = extents.center();

        while depth < self.max_depth {
            let group = self.require(gid)?;
            let octant = group.octant_of(center);
            let (child_center, child_half) = group.child_cell(octant);
            if child_half * 2.0 < self.min_node_size {
                break;
            }
            let child_cell = Aabb::from_center_half_extents(child_center, Vec3::splat(child_half));
            if !child_cell.contains(extents) {
                break;
            }

            gid = match group.children[octant] {
                Some(child) => child,
                None if group.elements.len() >= self.max_elements => {
                    let template = group.child_template(octant);
                    let child = self.groups.allocate_with(|id| SpatialGroup::new_child(id, &template));
                    self.require_mut(gid)?.children[octant] = Some(child);
                    child
                }
                None => break,
            };
            depth += 1;
        }

        Ok(gid)
    }

    fn grow_to_fit(&mut self, extents: &Aabb, object: ObjectId) -> SpatialResult<()> {
        for _ in 0..MAX_ROOT_GROWTH {
            let root = self.require(self.root)?;
            if root.cell().contains(extents) {
                return Ok(());
            }

            if root.is_empty() {
                // Nothing to keep in place: recenter on the object.
                let needed = extents.half_extents().max_element();
                let half = root.half_size().max(needed);
                let root = self.require_mut(self.root)?;
                root.center = extents.center();
                root.half_size = half;
                root.bounds = Aabb::point(root.center);
                root.state.insert(GroupState::DIRTY);
                continue;
            }

            let (old_center, half) = (root.center, root.half_size());
            let target = extents.center();
            let toward = |t: f32, c: f32| if t >= c { half } else { -half };
            let new_center = old_center
                + Vec3::new(
                    toward(target.x, old_center.x),
                    toward(target.y, old_center.y),
                    toward(target.z, old_center.z),
                );

            let old_root = self.root;
            let new_root = self
                .groups
                .allocate_with(|id| SpatialGroup::new(id, None, new_center, half * 2.0));
            let new_group = self.require_mut(new_root)?;
            let octant = new_group.octant_of(old_center);
            new_group.children[octant] = Some(old_root);
            self.require_mut(old_root)?.parent = Some(new_root);
            self.root = new_root;

            debug!(root = %new_root, half_size = half * 2.0, "Grew octree root");
        }

        Err(SpatialError::OutOfRange(object))
    }

    /// Removes an object and prunes groups it leaves empty.
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownObject`] if the id is not present.
    pub fn remove(&mut self, id: ObjectId) -> SpatialResult<SceneObject> {
        let entry = self.objects.remove(&id).ok_or(SpatialError::UnknownObject(id))?;
        let group = self.require_mut(entry.group)?;
        group.elements.retain(|o| *o != id);
        group.state.insert(GroupState::OBJECT_DIRTY | GroupState::GEOM_DIRTY);
        self.unbound(entry.group);
        self.prune(entry.group);

        trace!(object = %id, group = %entry.group, "Removed object");
        Ok(entry.object)
    }

    /// Moves an object. Stays in its group when the new extents still fit
    /// the group's cell, otherwise it is reinserted from the root.
    ///
    /// # Errors
    ///
    /// As for [`Octree::insert`] and [`Octree::remove`].
    pub fn move_object(&mut self, id: ObjectId, extents: Aabb) -> SpatialResult<GroupId> {
        if !extents.is_finite() {
            return Err(SpatialError::InvalidExtents(id));
        }
        let gid = self.group_of(id).ok_or(SpatialError::UnknownObject(id))?;

        if self.require(gid)?.cell().contains(&extents) {
            if let Some(entry) = self.objects.get_mut(&id) {
                entry.object.extents = extents;
            }
            self.require_mut(gid)?
                .state
                .insert(GroupState::OBJECT_DIRTY | GroupState::GEOM_DIRTY);
            self.unbound(gid);
            return Ok(gid);
        }

        let mut object = self.remove(id)?;
        object.extents = extents;
        self.insert(object)
    }

    /// Translates every cell, bound and object. All geometry goes dirty.
    pub fn shift(&mut self, offset: Vec3) {
        for (_, group) in self.groups.iter_mut() {
            group.translate(offset);
            group.state.insert(GroupState::GEOM_DIRTY);
        }
        for entry in self.objects.values_mut() {
            entry.object.extents = entry.object.extents.translated(offset);
        }
    }

    /// Marks a group and its ancestors as needing new bounds.
    pub fn unbound(&mut self, id: GroupId) {
        let mut next = Some(id);
        while let Some(gid) = next {
            let Some(group) = self.groups.get_mut(gid) else {
                break;
            };
            group.state.insert(GroupState::DIRTY);
            next = group.parent;
        }
    }

    /// Recomputes bounds of dirty groups under `id`, bottom-up.
    ///
    /// Returns the group's bounds, or `None` for a stale handle.
    pub fn rebound(&mut self, id: GroupId) -> Option<Aabb> {
        self.rebound_content(id)?;
        self.groups.get(id).map(|group| group.bounds)
    }

    /// Rebounds `id` and returns the union of the objects below it. Empty
    /// subtrees contribute nothing to their parent.
    fn rebound_content(&mut self, id: GroupId) -> Option<Option<Aabb>> {
        let group = self.groups.get(id)?;
        if !group.state.contains(GroupState::DIRTY) {
            return Some(group.content_bounds);
        }

        let children = group.children;
        let mut below: Option<Aabb> = None;
        for child in children.into_iter().flatten() {
            if let Some(Some(child_bounds)) = self.rebound_content(child) {
                below = Some(below.map_or(child_bounds, |b| b.union(&child_bounds)));
            }
        }

        let objects = &self.objects;
        let group = self.groups.get_mut(id)?;
        let own = union_all(
            group
                .elements
                .iter()
                .filter_map(|o| objects.get(o))
                .map(|e| &e.object.extents),
        );
        group.object_bounds = own;
        group.content_bounds = match (own, below) {
            (Some(a), Some(b)) => Some(a.union(&b)),
            (Some(a), None) | (None, Some(a)) => Some(a),
            (None, None) => None,
        };
        group.bounds = group.content_bounds.unwrap_or_else(|| Aabb::point(group.center));
        group.state.remove(GroupState::DIRTY);
        Some(group.content_bounds)
    }

    /// Frees `id` and walks up freeing ancestors it leaves empty.
    fn prune(&mut self, id: GroupId) {
        let mut gid = id;
        while gid != self.root {
            let Some(group) = self.groups.get(gid) else {
                return;
            };
            if !group.is_empty() || group.pin_count > 0 {
                return;
            }

            let parent = group.parent;
            if let Some(mut dead) = self.groups.free(gid) {
                dead.state.insert(GroupState::DEAD);
                self.orphaned_queries.extend(dead.occlusion.iter().filter_map(|slot| slot.query));
                trace!(group = %gid, state = dead.state.bits(), "Pruned group");
            }

            let Some(parent) = parent else {
                return;
            };
            if let Some(parent_group) = self.groups.get_mut(parent) {
                for child in &mut parent_group.children {
                    if *child == Some(gid) {
                        *child = None;
                    }
                }
            }
            self.unbound(parent);
            gid = parent;
        }
    }

    /// Adds a render-pass reference. Returns the new count.
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownGroup`] for a stale handle.
    pub fn pin(&mut self, id: GroupId) -> SpatialResult<u32> {
        let group = self.require_mut(id)?;
        group.pin_count += 1;
        Ok(group.pin_count)
    }

    /// Drops a render-pass reference; an empty group is pruned when the
    /// count reaches zero. Returns the new count.
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownGroup`] for a stale handle.
    pub fn unpin(&mut self, id: GroupId) -> SpatialResult<u32> {
        let group = self.require_mut(id)?;
        group.pin_count = group.pin_count.saturating_sub(1);
        let count = group.pin_count;
        if count == 0 {
            self.prune(id);
        }
        Ok(count)
    }

    /// Applies `apply` to a group and, per `mode`, its descendants. In
    /// diff mode descent stops at a child for which `agrees` holds.
    fn propagate<A, F>(&mut self, id: GroupId, mode: StateMode, agrees: A, apply: F) -> SpatialResult<()>
    where
        A: Fn(&SpatialGroup) -> bool,
        F: Fn(&mut SpatialGroup),
    {
        apply(self.require_mut(id)?);
        if mode == StateMode::Single {
            return Ok(());
        }

        let mut stack: Vec<GroupId> = self.require(id)?.children().collect();
        while let Some(gid) = stack.pop() {
            let Some(group) = self.groups.get_mut(gid) else {
                continue;
            };
            if mode == StateMode::Diff && agrees(group) {
                continue;
            }
            apply(group);
            stack.extend(group.children());
        }
        Ok(())
    }

    /// Sets group state bits.
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownGroup`] for a stale handle.
    pub fn set_state(&mut self, id: GroupId, state: GroupState, mode: StateMode) -> SpatialResult<()> {
        self.propagate(id, mode, |g| g.state.contains(state), |g| g.state.insert(state))
    }

    /// Clears group state bits.
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownGroup`] for a stale handle.
    pub fn clear_state(&mut self, id: GroupId, state: GroupState, mode: StateMode) -> SpatialResult<()> {
        self.propagate(id, mode, |g| !g.state.intersects(state), |g| g.state.remove(state))
    }

    /// Sets occlusion bits for `slot`, or for every camera in
    /// [`OcclusionMode::AllCameras`].
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownGroup`] for a stale handle.
    pub fn set_occlusion_state(
        &mut self,
        id: GroupId,
        state: OcclusionState,
        mode: OcclusionMode,
        slot: CameraSlot,
    ) -> SpatialResult<()> {
        let i = slot.index();
        match Self::slot_mode(mode) {
            Some(mode) => self.propagate(
                id,
                mode,
                |g| g.occlusion[i].state.contains(state),
                |g| g.occlusion[i].state.insert(state),
            ),
            None => {
                let group = self.require_mut(id)?;
                for slot in &mut group.occlusion {
                    slot.state.insert(state);
                }
                Ok(())
            }
        }
    }

    /// Clears occlusion bits for `slot`, or for every camera in
    /// [`OcclusionMode::AllCameras`].
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownGroup`] for a stale handle.
    pub fn clear_occlusion_state(
        &mut self,
        id: GroupId,
        state: OcclusionState,
        mode: OcclusionMode,
        slot: CameraSlot,
    ) -> SpatialResult<()> {
        let i = slot.index();
        match Self::slot_mode(mode) {
            Some(mode) => self.propagate(
                id,
                mode,
                |g| !g.occlusion[i].state.intersects(state),
                |g| g.occlusion[i].state.remove(state),
            ),
            None => {
                let group = self.require_mut(id)?;
                for slot in &mut group.occlusion {
                    slot.state.remove(state);
                }
                Ok(())
            }
        }
    }

    const fn slot_mode(mode: OcclusionMode) -> Option<StateMode> {
        match mode {
            OcclusionMode::Single => Some(StateMode::Single),
            OcclusionMode::Branch => Some(StateMode::Branch),
            OcclusionMode::Diff => Some(StateMode::Diff),
            OcclusionMode::AllCameras => None,
        }
    }

    /// Query handles of pruned groups, for the owner to release.
    pub fn take_orphaned_queries(&mut self) -> Vec<QueryHandle> {
        std::mem::take(&mut self.orphaned_queries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SpatialConfig {
        SpatialConfig { octree_max_elements: 1, root_size: 64.0, ..SpatialConfig::default() }
    }

    fn cube(id: u32, center: Vec3, half: f32) -> SceneObject {
        SceneObject::new(ObjectId(id), Aabb::from_center_half_extents(center, Vec3::splat(half)))
    }

    #[test]
    fn test_insert_descends_when_full() {
        let mut tree = Octree::new(&config());
        let first = tree.insert(cube(1, Vec3::splat(10.0), 0.5)).unwrap();
        let second = tree.insert(cube(2, Vec3::splat(12.0), 0.5)).unwrap();

        assert_eq!(first, tree.root());
        assert_ne!(second, tree.root());
        assert_eq!(tree.group(second).unwrap().parent(), Some(tree.root()));
    }

    #[test]
    fn test_large_object_stays_high() {
        let mut tree = Octree::new(&config());
        tree.insert(cube(1, Vec3::splat(10.0), 0.5)).unwrap();
        // Straddles the root center, so no child cell can hold it.
        let gid = tree.insert(cube(2, Vec3::ZERO, 4.0)).unwrap();
        assert_eq!(gid, tree.root());
    }

    #[test]
    fn test_root_grows_toward_far_object() {
        let mut tree = Octree::new(&config());
        tree.insert(cube(1, Vec3::splat(1.0), 0.5)).unwrap();
        let old_root = tree.root();

        tree.insert(cube(2, Vec3::splat(100.0), 0.5)).unwrap();
        assert_ne!(tree.root(), old_root);
        assert!(tree.group(tree.root()).unwrap().cell().contains(tree.object(ObjectId(2)).map(|o| &o.extents).unwrap()));

        let bounds = tree.rebound(tree.root()).unwrap();
        assert!(bounds.contains_point(Vec3::splat(1.0)));
        assert!(bounds.contains_point(Vec3::splat(100.0)));
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut tree = Octree::new(&config());
        tree.insert(cube(1, Vec3::ZERO, 1.0)).unwrap();

        assert_eq!(tree.insert(cube(1, Vec3::ZERO, 1.0)), Err(SpatialError::DuplicateObject(ObjectId(1))));
        assert_eq!(
            tree.insert(cube(2, Vec3::splat(f32::NAN), 1.0)),
            Err(SpatialError::InvalidExtents(ObjectId(2)))
        );
        assert_eq!(tree.remove(ObjectId(9)).unwrap_err(), SpatialError::UnknownObject(ObjectId(9)));
    }

    #[test]
    fn test_remove_prunes_empty_children() {
        let mut tree = Octree::new(&config());
        tree.insert(cube(1, Vec3::splat(10.0), 0.5)).unwrap();
        let child = tree.insert(cube(2, Vec3::splat(12.0), 0.5)).unwrap();
        assert_eq!(tree.group_count(), 2);

        tree.remove(ObjectId(2)).unwrap();
        assert!(tree.group(child).is_none());
        assert_eq!(tree.group_count(), 1);
        assert_eq!(tree.group(tree.root()).unwrap().child_count(), 0);
    }

    #[test]
    fn test_pinned_group_survives_until_unpinned() {
        let mut tree = Octree::new(&config());
        tree.insert(cube(1, Vec3::splat(10.0), 0.5)).unwrap();
        let child = tree.insert(cube(2, Vec3::splat(12.0), 0.5)).unwrap();

        tree.pin(child).unwrap();
        tree.remove(ObjectId(2)).unwrap();
        assert!(tree.group(child).is_some());

        assert_eq!(tree.unpin(child).unwrap(), 0);
        assert!(tree.group(child).is_none());
    }

    #[test]
    fn test_rebound_clears_dirty_and_contains_objects() {
        let mut tree = Octree::new(&config());
        for i in 0..6 {
            tree.insert(cube(i, Vec3::splat(i as f32 * 3.0), 0.5)).unwrap();
        }
        let root = tree.root();
        let bounds = tree.rebound(root).unwrap();

        for object in tree.objects() {
            assert!(bounds.contains(&object.extents));
        }
        assert!(tree.groups().all(|g| !g.state().contains(GroupState::DIRTY)));
    }

    #[test]
    fn test_move_within_cell_keeps_group() {
        let mut tree = Octree::new(&config());
        let gid = tree.insert(cube(1, Vec3::splat(10.0), 0.5)).unwrap();

        assert_eq!(tree.move_object(ObjectId(1), Aabb::from_center_half_extents(Vec3::splat(11.0), Vec3::splat(0.5))).unwrap(), gid);
        assert_eq!(tree.object(ObjectId(1)).unwrap().extents.center(), Vec3::splat(11.0));
    }

    #[test]
    fn test_late_prune_leaves_tight_bounds() {
        let mut tree = Octree::new(&config());
        tree.insert(cube(1, Vec3::splat(10.0), 0.5)).unwrap();
        let mid = tree.insert(cube(2, Vec3::splat(20.0), 0.5)).unwrap();
        let leaf = tree.insert(cube(3, Vec3::splat(22.0), 0.5)).unwrap();
        assert_eq!(tree.group(leaf).unwrap().parent(), Some(mid));

        tree.pin(leaf).unwrap();
        tree.remove(ObjectId(3)).unwrap();
        let root = tree.root();
        tree.rebound(root).unwrap();
        tree.unpin(leaf).unwrap();
        assert!(tree.group(leaf).is_none());
        tree.rebound(root).unwrap();

        assert!(tree.groups().all(|g| !g.state().contains(GroupState::DIRTY)));
        let bounds = tree.group(mid).unwrap().bounds();
        assert_eq!(bounds.min, Vec3::splat(19.5));
        assert_eq!(bounds.max, Vec3::splat(20.5));
    }

    #[test]
    fn test_empty_pinned_child_adds_nothing_to_parent() {
        let mut tree = Octree::new(&config());
        tree.insert(cube(1, Vec3::splat(10.0), 0.5)).unwrap();
        let child = tree.insert(cube(2, Vec3::splat(20.0), 0.5)).unwrap();

        tree.pin(child).unwrap();
        tree.remove(ObjectId(2)).unwrap();
        let bounds = tree.rebound(tree.root()).unwrap();
        assert_eq!(bounds.max, Vec3::splat(10.5));
    }

    #[test]
    fn test_state_modes() {
        let mut tree = Octree::new(&config());
        tree.insert(cube(1, Vec3::splat(10.0), 0.5)).unwrap();
        let child = tree.insert(cube(2, Vec3::splat(12.0), 0.5)).unwrap();
        let root = tree.root();

        tree.set_state(root, GroupState::SKIP_FRUSTUM_CHECK, StateMode::Single).unwrap();
        assert!(!tree.group(child).unwrap().state().contains(GroupState::SKIP_FRUSTUM_CHECK));

        tree.set_state(root, GroupState::SKIP_FRUSTUM_CHECK, StateMode::Branch).unwrap();
        assert!(tree.group(child).unwrap().state().contains(GroupState::SKIP_FRUSTUM_CHECK));

        tree.set_occlusion_state(root, OcclusionState::OCCLUDED, OcclusionMode::AllCameras, CameraSlot::World)
            .unwrap();
        assert!(tree.group(root).unwrap().is_occluded(CameraSlot::Preview));
        assert!(!tree.group(child).unwrap().is_occluded(CameraSlot::World));

        tree.set_occlusion_state(root, OcclusionState::OCCLUDED, OcclusionMode::Diff, CameraSlot::World)
            .unwrap();
        assert!(tree.group(child).unwrap().is_occluded(CameraSlot::World));

        tree.clear_occlusion_state(root, OcclusionState::OCCLUDED, OcclusionMode::Branch, CameraSlot::World)
            .unwrap();
        assert!(!tree.group(child).unwrap().is_occluded(CameraSlot::World));
        assert!(tree.group(root).unwrap().is_occluded(CameraSlot::Preview));
    }

    #[test]
    fn test_shift_translates_everything() {
        let mut tree = Octree::new(&config());
        tree.insert(cube(1, Vec3::splat(10.0), 0.5)).unwrap();
        let root = tree.root();
        let before = tree.rebound(root).unwrap();

        tree.shift(Vec3::new(256.0, 0.0, 0.0));
        assert_eq!(tree.object(ObjectId(1)).unwrap().extents.center(), Vec3::new(266.0, 10.0, 10.0));
        assert_eq!(*tree.group(root).unwrap().bounds(), before.translated(Vec3::new(256.0, 0.0, 0.0)));
        assert!(tree.group(root).unwrap().state().contains(GroupState::GEOM_DIRTY));
    }
}
