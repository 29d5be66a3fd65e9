//! # Spatial Partition
//!
//! One octree of one kind of scene content plus the policy for turning it
//! into draw batches. Partition kinds differ only in their geometry manager
//! and default flags, so there is a single partition type.
//!
//! ## Cull
//!
//! ```text
//! rebound root
//!   └─► depth-first walk
//!         ├─ frustum test ──────────── Outside ──► skip subtree
//!         ├─ occlusion check ───────── Occluded ─► skip subtree, refresh query
//!         └─ mark visible, queue rebuild if GEOM_DIRTY, recurse
//! rebuild queued groups, nearest first
//! collect batches ──► render map (state sorted) + alpha list (back to front)
//! ```
//!
//! Occlusion answers arrive a frame late. A group whose query could not be
//! issued is drawn.

use std::sync::Arc;

use meridian_shared::{Aabb, Vec3, NUM_CAMERAS};
use tracing::{debug, trace};

use crate::arena::GroupId;
use crate::camera::{Camera, CameraSlot, Intersection};
use crate::config::SpatialConfig;
use crate::cull_result::CullResult;
use crate::draw_info::{sort_back_to_front, sort_by_state, AlphaBatch, RenderType};
use crate::error::{SpatialError, SpatialResult};
use crate::geometry::{
    GeometryManager, NullGeometryManager, ParticleGeometryManager, VolumeGeometryManager,
};
use crate::group::SpatialGroup;
use crate::object::{ObjectId, SceneObject};
use crate::occlusion::{OcclusionBackend, QueryResult};
use crate::octree::Octree;
use crate::state::{GroupState, OcclusionMode, OcclusionState, StateMode};

/// Slack around group bounds inside which the camera counts as inside the
/// group, so it never queries a box it is standing in.
const NEAR_MARGIN: f32 = 1.0;

/// Kind of content a partition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartitionType {
    /// Prims and meshes.
    Volume,
    /// Linked sets moving as one.
    Bridge,
    /// Attachments drawn in screen space.
    Hud,
    /// Terrain patches.
    Terrain,
    /// Water surfaces.
    Water,
    /// Trees.
    Tree,
    /// Particle systems.
    Particle,
    /// Grass.
    Grass,
}

impl PartitionType {
    /// Every kind.
    pub const ALL: [Self; 8] = [
        Self::Volume,
        Self::Bridge,
        Self::Hud,
        Self::Terrain,
        Self::Water,
        Self::Tree,
        Self::Particle,
        Self::Grass,
    ];

    /// Lowercase name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Bridge => "bridge",
            Self::Hud => "hud",
            Self::Terrain => "terrain",
            Self::Water => "water",
            Self::Tree => "tree",
            Self::Particle => "particle",
            Self::Grass => "grass",
        }
    }

    /// Geometry policy for this kind.
    #[must_use]
    pub fn geometry_manager(self) -> Box<dyn GeometryManager> {
        match self {
            Self::Volume | Self::Hud => Box::new(VolumeGeometryManager::new()),
            Self::Terrain => Box::new(VolumeGeometryManager::with_render_type(RenderType::Terrain)),
            Self::Grass => Box::new(VolumeGeometryManager::with_render_type(RenderType::Grass)),
            Self::Particle => Box::new(ParticleGeometryManager),
            Self::Bridge | Self::Water | Self::Tree => Box::new(NullGeometryManager),
        }
    }

    /// Whether this kind takes part in occlusion culling.
    #[must_use]
    pub const fn occludes(self) -> bool {
        matches!(self, Self::Volume | Self::Bridge | Self::Terrain | Self::Tree)
    }

    /// Whether this kind ignores the far clip plane.
    #[must_use]
    pub const fn infinite_far_clip(self) -> bool {
        matches!(self, Self::Terrain | Self::Water)
    }
}

/// Nearest object crossed by a line segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit {
    /// Object hit.
    pub object: ObjectId,
    /// Segment parameter in `[0, 1]` of the entry point.
    pub t: f32,
    /// Entry point.
    pub point: Vec3,
}

/// Octree partition with culling and batch generation.
#[derive(Debug)]
pub struct SpatialPartition {
    partition_type: PartitionType,
    octree: Octree,
    geometry: Box<dyn GeometryManager>,
    occlusion_enabled: bool,
    infinite_far_clip: bool,
    frames: [u64; NUM_CAMERAS],
    pinned: Vec<GroupId>,
}

impl SpatialPartition {
    /// Creates an empty partition of `partition_type`.
    #[must_use]
    pub fn new(partition_type: PartitionType, config: &SpatialConfig) -> Self {
        Self {
            partition_type,
            octree: Octree::new(config),
            geometry: partition_type.geometry_manager(),
            occlusion_enabled: config.occlusion_enabled && partition_type.occludes(),
            infinite_far_clip: partition_type.infinite_far_clip(),
            frames: [0; NUM_CAMERAS],
            pinned: Vec::new(),
        }
    }

    /// Replaces the geometry manager.
    #[must_use]
    pub fn with_geometry_manager(mut self, geometry: Box<dyn GeometryManager>) -> Self {
        self.geometry = geometry;
        self
    }

    /// Kind of content held.
    #[must_use]
    pub const fn partition_type(&self) -> PartitionType {
        self.partition_type
    }

    /// Whether culls consult the occlusion backend.
    #[must_use]
    pub const fn occlusion_enabled(&self) -> bool {
        self.occlusion_enabled
    }

    /// The underlying octree.
    #[must_use]
    pub const fn octree(&self) -> &Octree {
        &self.octree
    }

    /// The root group.
    #[must_use]
    pub const fn root(&self) -> GroupId {
        self.octree.root()
    }

    /// Looks up a group.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&SpatialGroup> {
        self.octree.group(id)
    }

    /// Looks up an object.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.octree.object(id)
    }

    /// Number of objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.octree.object_count()
    }

    /// Number of groups.
    #[must_use]
    pub const fn group_count(&self) -> usize {
        self.octree.group_count()
    }

    /// Frame counter of the last cull for `slot`.
    #[must_use]
    pub const fn frame(&self, slot: CameraSlot) -> u64 {
        self.frames[slot.index()]
    }

    /// True if the last cull for `slot` marked the group visible.
    #[must_use]
    pub fn is_group_visible(&self, id: GroupId, slot: CameraSlot) -> bool {
        let frame = self.frame(slot);
        frame > 0 && self.group(id).is_some_and(|g| g.visible_frame(slot) == frame)
    }

    /// Adds an object.
    ///
    /// # Errors
    ///
    /// As for [`Octree::insert`].
    pub fn put(&mut self, object: SceneObject) -> SpatialResult<GroupId> {
        self.octree.insert(object)
    }

    /// Removes an object.
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownObject`] if absent.
    pub fn remove(&mut self, id: ObjectId) -> SpatialResult<SceneObject> {
        self.octree.remove(id)
    }

    /// Moves an object to new extents.
    ///
    /// # Errors
    ///
    /// As for [`Octree::move_object`].
    pub fn move_object(&mut self, id: ObjectId, extents: Aabb) -> SpatialResult<GroupId> {
        self.octree.move_object(id, extents)
    }

    /// Rebases everything by `offset`, e.g. on a region crossing.
    pub fn shift(&mut self, offset: Vec3) {
        debug!(partition = self.partition_type.name(), ?offset, "Shifting partition");
        self.octree.shift(offset);
    }

    /// Recomputes dirty bounds. Returns the root bounds.
    pub fn rebound(&mut self) -> Option<Aabb> {
        let root = self.octree.root();
        self.octree.rebound(root)
    }

    /// Forces a group's batches to be regenerated at its next visible cull.
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownGroup`] for a stale handle.
    pub fn dirty_geom(&mut self, id: GroupId) -> SpatialResult<()> {
        self.octree.set_state(id, GroupState::GEOM_DIRTY, StateMode::Single)
    }

    /// Sets group state bits.
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownGroup`] for a stale handle.
    pub fn set_state(&mut self, id: GroupId, state: GroupState, mode: StateMode) -> SpatialResult<()> {
        self.octree.set_state(id, state, mode)
    }

    /// Clears group state bits.
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownGroup`] for a stale handle.
    pub fn clear_state(&mut self, id: GroupId, state: GroupState, mode: StateMode) -> SpatialResult<()> {
        self.octree.clear_state(id, state, mode)
    }

    /// Sets occlusion bits.
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
        self.octree.set_occlusion_state(id, state, mode, slot)
    }

    /// Clears occlusion bits.
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
        self.octree.clear_occlusion_state(id, state, mode, slot)
    }

    /// Holds a group alive across prunes.
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownGroup`] for a stale handle.
    pub fn pin_group(&mut self, id: GroupId) -> SpatialResult<u32> {
        self.octree.pin(id)
    }

    /// Releases a pin; an empty group is pruned at zero.
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownGroup`] for a stale handle.
    pub fn unpin_group(&mut self, id: GroupId) -> SpatialResult<u32> {
        self.octree.unpin(id)
    }

    /// Pins every drawable group of `result` until [`Self::end_render`].
    pub fn begin_render(&mut self, result: &CullResult) {
        for &gid in &result.drawable_groups {
            if self.octree.pin(gid).is_ok() {
                self.pinned.push(gid);
            }
        }
    }

    /// Releases the pins taken by [`Self::begin_render`].
    pub fn end_render(&mut self) {
        for gid in std::mem::take(&mut self.pinned) {
            // A group pinned by a render pass cannot have been pruned.
            self.octree.unpin(gid).ok();
        }
    }

    /// Regenerates a group's draw batches.
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownGroup`] for a stale handle.
    pub fn rebuild_geom(&mut self, id: GroupId) -> SpatialResult<()> {
        if self.octree.group(id).is_none() {
            return Err(SpatialError::UnknownGroup(id));
        }
        let geometry = self.geometry.rebuild_geom(&self.octree.group_objects(id));

        let group = self.octree.group_mut(id).ok_or(SpatialError::UnknownGroup(id))?;
        group.draw_map = geometry.draw_map;
        group.geometry = geometry.count;
        group.state.remove(
            GroupState::GEOM_DIRTY
                | GroupState::OBJECT_DIRTY
                | GroupState::ALPHA_DIRTY
                | GroupState::MESH_DIRTY
                | GroupState::IMAGE_DIRTY,
        );
        group.state.insert(GroupState::NEW_DRAWINFO);
        Ok(())
    }

    /// Recomputes every group's distance from `camera`.
    pub fn update_distance(&mut self, camera: &Camera) {
        let ids: Vec<GroupId> = self.octree.groups().map(SpatialGroup::id).collect();
        for id in ids {
            if let Some(group) = self.octree.group_mut(id) {
                group.distance = camera.origin.distance(group.bounds.center());
            }
        }
    }

    /// Culls the partition for one camera.
    pub fn cull(&mut self, camera: &Camera, occlusion: &mut dyn OcclusionBackend) -> CullResult {
        let slot = camera.slot;
        let i = slot.index();
        self.frames[i] += 1;
        let frame = self.frames[i];
        let mut result = CullResult::new(slot, frame);

        for handle in self.octree.take_orphaned_queries() {
            occlusion.release(handle);
        }

        let root = self.octree.root();
        self.octree.rebound(root);

        let mut rebuild: Vec<(f32, GroupId)> = Vec::new();
        let mut stack = vec![(root, false)];
        while let Some((gid, parent_inside)) = stack.pop() {
            let Some(group) = self.octree.group(gid) else {
                continue;
            };
            result.stats.groups_tested += 1;
            if group.is_empty() {
                continue;
            }

            let bounds = *group.bounds();
            let children_inside = if parent_inside {
                true
            } else if group.state().contains(GroupState::SKIP_FRUSTUM_CHECK) {
                false
            } else {
                match camera.frustum.test_aabb(&bounds, self.infinite_far_clip) {
                    Intersection::Outside => {
                        result.stats.frustum_culled += 1;
                        continue;
                    }
                    Intersection::Partial => false,
                    Intersection::Inside => true,
                }
            };

            if self.occlusion_enabled && self.check_occlusion(gid, &bounds, camera, occlusion, &mut result) {
                result.stats.occlusion_culled += 1;
                result.occluded_groups.push(gid);
                continue;
            }

            let Some(group) = self.octree.group_mut(gid) else {
                continue;
            };
            group.visible_frame[i] = frame;
            group.distance = camera.origin.distance(bounds.center());
            result.visible_groups.push(gid);
            result.visible_objects.extend_from_slice(&group.elements);

            let has_content = !group.elements.is_empty() || !group.draw_map.is_empty();
            if has_content && group.state.contains(GroupState::GEOM_DIRTY) {
                rebuild.push((group.distance, gid));
            }
            // Reversed so lower octants are visited first.
            stack.extend(group.children.iter().rev().flatten().map(|c| (*c, children_inside)));
        }

        rebuild.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (_, gid) in rebuild {
            if self.rebuild_geom(gid).is_ok() {
                result.rebuilt_groups.push(gid);
            }
        }

        self.collect_batches(camera, &mut result);

        result.stats.visible = result.visible_groups.len() as u32;
        result.stats.rebuilt = result.rebuilt_groups.len() as u32;
        result.stats.draw_batches = result.batch_count() as u32;
        trace!(
            partition = self.partition_type.name(),
            camera = ?slot,
            frame,
            visible = result.stats.visible,
            batches = result.stats.draw_batches,
            "Cull complete"
        );
        result
    }

    fn collect_batches(&mut self, camera: &Camera, result: &mut CullResult) {
        let visible = std::mem::take(&mut result.visible_groups);
        let mut alpha_groups: Vec<(f32, GroupId)> = Vec::new();

        for &gid in &visible {
            let Some(group) = self.octree.group_mut(gid) else {
                continue;
            };
            group.state.remove(GroupState::NEW_DRAWINFO);
            if group.draw_map.is_empty() {
                continue;
            }
            result.drawable_groups.push(gid);

            for (render_type, infos) in &group.draw_map {
                if render_type.is_alpha() {
                    result.alpha_batches.extend(infos.iter().map(|info| AlphaBatch {
                        distance: camera.origin.distance(info.extents().center()),
                        draw_info: Arc::clone(info),
                    }));
                    alpha_groups.push((group.distance, gid));
                } else {
                    result.batches_mut(*render_type).extend(infos.iter().cloned());
                }
            }
        }

        for render_type in RenderType::ALL {
            sort_by_state(result.batches_mut(render_type));
        }
        sort_back_to_front(&mut result.alpha_batches);
        alpha_groups.sort_by(|a, b| b.0.total_cmp(&a.0));
        result.alpha_groups = alpha_groups.into_iter().map(|(_, gid)| gid).collect();
        result.visible_groups = visible;
    }

    /// Reads back and reissues the group's query. Returns true if the
    /// group should be skipped as occluded.
    fn check_occlusion(
        &mut self,
        gid: GroupId,
        bounds: &Aabb,
        camera: &Camera,
        backend: &mut dyn OcclusionBackend,
        result: &mut CullResult,
    ) -> bool {
        let slot = camera.slot;
        let Some(group) = self.octree.group_mut(gid) else {
            return false;
        };
        let mut entry = group.occlusion[slot.index()];
        let mut revealed = false;

        if entry.state.contains(OcclusionState::QUERY_PENDING) {
            let answer = entry.query.map_or(QueryResult::Visible, |h| backend.poll(h));
            if answer != QueryResult::Pending {
                entry.query = None;
                entry.state.remove(OcclusionState::QUERY_PENDING);
                if entry.state.contains(OcclusionState::DISCARD_QUERY) {
                    entry.state.remove(OcclusionState::DISCARD_QUERY);
                } else if answer == QueryResult::Occluded {
                    entry.state.insert(OcclusionState::OCCLUDED);
                } else {
                    revealed = entry.state.contains(OcclusionState::OCCLUDED);
                    entry.state.remove(OcclusionState::OCCLUDED);
                }
            }
        }

        let near = Aabb::from_center_half_extents(
            bounds.center(),
            bounds.half_extents() + Vec3::splat(NEAR_MARGIN),
        );
        if near.contains_point(camera.origin) {
            revealed |= entry.state.contains(OcclusionState::OCCLUDED);
            entry.state.remove(OcclusionState::OCCLUDED);
            if entry.state.contains(OcclusionState::QUERY_PENDING) {
                entry.state.insert(OcclusionState::DISCARD_QUERY);
            }
        } else if !entry.state.contains(OcclusionState::QUERY_PENDING) {
            if let Some(handle) = backend.issue(gid, slot, bounds) {
                entry.query = Some(handle);
                entry.state.insert(OcclusionState::QUERY_PENDING | OcclusionState::ACTIVE_OCCLUSION);
                entry.state.remove(OcclusionState::EARLY_FAIL);
                result.occlusion_groups.push(gid);
                result.stats.queries_issued += 1;
            } else {
                revealed |= entry.state.contains(OcclusionState::OCCLUDED);
                entry.state.insert(OcclusionState::EARLY_FAIL);
                entry.state.remove(OcclusionState::OCCLUDED);
                result.stats.queries_failed += 1;
                debug!(group = %gid, camera = ?slot, "Occlusion query unavailable, drawing group");
            }
        }

        group.occlusion[slot.index()] = entry;
        if revealed {
            self.octree
                .clear_occlusion_state(gid, OcclusionState::OCCLUDED, OcclusionMode::Diff, slot)
                .ok();
        }
        entry.state.contains(OcclusionState::OCCLUDED)
    }

    /// Nearest object whose extents the segment `start -> end` crosses.
    pub fn line_segment_intersect(&mut self, start: Vec3, end: Vec3) -> Option<SegmentHit> {
        self.rebound();
        let mut best: Option<SegmentHit> = None;
        let mut stack = vec![self.octree.root()];

        while let Some(gid) = stack.pop() {
            let Some(group) = self.octree.group(gid) else {
                continue;
            };
            let Some(t) = group.bounds().segment_intersection(start, end) else {
                continue;
            };
            if best.is_some_and(|b| t > b.t) {
                continue;
            }

            for &id in group.elements() {
                let Some(object) = self.octree.object(id) else {
                    continue;
                };
                if let Some(t) = object.extents.segment_intersection(start, end) {
                    if best.map_or(true, |b| t < b.t) {
                        best = Some(SegmentHit { object: id, t, point: start + (end - start) * t });
                    }
                }
            }
            stack.extend(group.children());
        }

        best
    }

    /// Union of the extents of objects in groups the last cull for this
    /// camera marked visible, restricted to the frustum.
    #[must_use]
    pub fn visible_extents(&self, camera: &Camera) -> Option<Aabb> {
        let slot = camera.slot;
        let mut out: Option<Aabb> = None;
        for group in self.octree.groups() {
            if !self.is_group_visible(group.id(), slot) {
                continue;
            }
            for &id in group.elements() {
                let Some(object) = self.octree.object(id) else {
                    continue;
                };
                if camera.frustum.test_aabb(&object.extents, self.infinite_far_clip) != Intersection::Outside {
                    out = Some(out.map_or(object.extents, |b| b.union(&object.extents)));
                }
            }
        }
        out
    }

    /// Objects whose extents touch the frustum, ignoring occlusion.
    pub fn visible_objects_in_frustum(&mut self, camera: &Camera) -> Vec<ObjectId> {
        self.rebound();
        let mut out = Vec::new();
        let mut stack = vec![self.octree.root()];

        while let Some(gid) = stack.pop() {
            let Some(group) = self.octree.group(gid) else {
                continue;
            };
            if camera.frustum.test_aabb(group.bounds(), self.infinite_far_clip) == Intersection::Outside {
                continue;
            }
            out.extend(group.elements().iter().copied().filter(|id| {
                self.octree.object(*id).is_some_and(|o| {
                    camera.frustum.test_aabb(&o.extents, self.infinite_far_clip) != Intersection::Outside
                })
            }));
            stack.extend(group.children());
        }

        out
    }

    /// True if `point` is in the frustum and no group containing it is
    /// occluded for this camera.
    #[must_use]
    pub fn is_point_visible(&self, camera: &Camera, point: Vec3) -> bool {
        if !camera.frustum.contains_point(point) {
            return false;
        }
        if !self.occlusion_enabled {
            return true;
        }

        let mut next = Some(self.octree.root());
        while let Some(gid) = next {
            let Some(group) = self.octree.group(gid) else {
                break;
            };
            if !group.cell().contains_point(point) {
                break;
            }
            if group.is_occluded(camera.slot) {
                return false;
            }
            next = group.children[group.octant_of(point)];
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Face, TextureId};
    use crate::occlusion::ScriptedOcclusion;

    fn object(id: u32, center: Vec3) -> SceneObject {
        SceneObject::new(ObjectId(id), Aabb::from_center_half_extents(center, Vec3::splat(0.5)))
            .with_face(Face::new(Some(TextureId(id % 3)), 4, 6))
    }

    fn partition() -> SpatialPartition {
        SpatialPartition::new(PartitionType::Volume, &SpatialConfig::default())
    }

    #[test]
    fn test_partition_flags() {
        let config = SpatialConfig::default();
        assert!(SpatialPartition::new(PartitionType::Volume, &config).occlusion_enabled());
        assert!(!SpatialPartition::new(PartitionType::Particle, &config).occlusion_enabled());

        let off = SpatialConfig { occlusion_enabled: false, ..config };
        assert!(!SpatialPartition::new(PartitionType::Volume, &off).occlusion_enabled());
    }

    #[test]
    fn test_cull_rebuilds_dirty_groups_once() {
        let mut partition = partition();
        partition.put(object(1, Vec3::splat(5.0))).unwrap();
        let camera = Camera::from_box(CameraSlot::World, &Aabb::new(Vec3::ZERO, Vec3::splat(10.0)));
        let mut backend = ScriptedOcclusion::new(16);

        let first = partition.cull(&camera, &mut backend);
        assert_eq!(first.rebuilt_groups.len(), 1);
        assert_eq!(first.batches(RenderType::Simple).len(), 1);

        let second = partition.cull(&camera, &mut backend);
        assert!(second.rebuilt_groups.is_empty());
        assert_eq!(second.batches(RenderType::Simple).len(), 1);
        assert!(Arc::ptr_eq(
            &first.batches(RenderType::Simple)[0],
            &second.batches(RenderType::Simple)[0]
        ));
    }

    #[test]
    fn test_segment_picks_nearest() {
        let mut partition = partition();
        partition.put(object(1, Vec3::new(10.0, 0.0, 0.0))).unwrap();
        partition.put(object(2, Vec3::new(5.0, 0.0, 0.0))).unwrap();

        let hit = partition
            .line_segment_intersect(Vec3::ZERO, Vec3::new(20.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(hit.object, ObjectId(2));
        assert!((hit.point.x - 4.5).abs() < 1e-4);

        assert!(partition
            .line_segment_intersect(Vec3::new(0.0, 5.0, 0.0), Vec3::new(20.0, 5.0, 0.0))
            .is_none());
    }

    #[test]
    fn test_frustum_query_ignores_far_objects() {
        let mut partition = partition();
        partition.put(object(1, Vec3::splat(5.0))).unwrap();
        partition.put(object(2, Vec3::splat(50.0))).unwrap();
        let camera = Camera::from_box(CameraSlot::World, &Aabb::new(Vec3::ZERO, Vec3::splat(10.0)));

        assert_eq!(partition.visible_objects_in_frustum(&camera), vec![ObjectId(1)]);
        assert!(partition.is_point_visible(&camera, Vec3::splat(5.0)));
        assert!(!partition.is_point_visible(&camera, Vec3::splat(50.0)));
    }

    #[test]
    fn test_visible_extents_follow_last_cull() {
        let mut partition = partition();
        let camera = Camera::from_box(CameraSlot::World, &Aabb::new(Vec3::ZERO, Vec3::splat(10.0)));
        assert!(partition.visible_extents(&camera).is_none());

        partition.put(object(1, Vec3::splat(5.0))).unwrap();
        partition.cull(&camera, &mut ScriptedOcclusion::new(4));
        let extents = partition.visible_extents(&camera).unwrap();
        assert_eq!(extents.center(), Vec3::splat(5.0));
    }
}
