//! # Spatial Group
//!
//! One octree node. A group owns a cubic cell, the objects whose extents
//! fit that cell but no child cell, and up to eight children.
//!
//! ```text
//!            ┌──────── cell (loose, fixed) ────────┐
//!            │   ┌──── bounds (tight, rebound) ──┐ │
//!            │   │ own objects ∪ child bounds    │ │
//!            │   └───────────────────────────────┘ │
//!            └─────────────────────────────────────┘
//! ```
//!
//! Bounds are only meaningful once the group is clean (`DIRTY` unset).

use meridian_shared::{Aabb, Vec3, NUM_CAMERAS};

use crate::arena::GroupId;
use crate::camera::CameraSlot;
use crate::draw_info::DrawInfoRef;
use crate::geometry::{DrawMap, GeometryCount};
use crate::object::ObjectId;
use crate::occlusion::QueryHandle;
use crate::state::{GroupState, OcclusionState};

/// Occlusion state of a group for one camera.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OcclusionSlot {
    /// State bits.
    pub state: OcclusionState,
    /// In-flight query, if any.
    pub query: Option<QueryHandle>,
}

/// Parent data copied out before a child is allocated.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChildTemplate {
    parent: GroupId,
    center: Vec3,
    half_size: f32,
    occlusion: [OcclusionSlot; NUM_CAMERAS],
}

/// A node of the octree.
#[derive(Debug, Clone)]
pub struct SpatialGroup {
    id: GroupId,
    pub(crate) parent: Option<GroupId>,
    pub(crate) children: [Option<GroupId>; 8],
    pub(crate) center: Vec3,
    pub(crate) half_size: f32,
    pub(crate) bounds: Aabb,
    pub(crate) object_bounds: Option<Aabb>,
    /// Union of every object in the subtree; `None` when the subtree holds none.
    pub(crate) content_bounds: Option<Aabb>,
    pub(crate) elements: Vec<ObjectId>,
    pub(crate) state: GroupState,
    pub(crate) occlusion: [OcclusionSlot; NUM_CAMERAS],
    pub(crate) draw_map: DrawMap,
    pub(crate) geometry: GeometryCount,
    pub(crate) distance: f32,
    pub(crate) pin_count: u32,
    pub(crate) visible_frame: [u64; NUM_CAMERAS],
}

impl SpatialGroup {
    pub(crate) fn new(id: GroupId, parent: Option<GroupId>, center: Vec3, half_size: f32) -> Self {
        Self {
            id,
            parent,
            children: [None; 8],
            center,
            half_size,
            bounds: Aabb::point(center),
            object_bounds: None,
            content_bounds: None,
            elements: Vec::new(),
            state: GroupState::INITIAL,
            occlusion: [OcclusionSlot::default(); NUM_CAMERAS],
            draw_map: DrawMap::new(),
            geometry: GeometryCount::default(),
            distance: 0.0,
            pin_count: 0,
            visible_frame: [0; NUM_CAMERAS],
        }
    }

    /// Child cell of `parent`, inheriting the parent's occlusion bits.
    pub(crate) fn new_child(id: GroupId, parent: &ChildTemplate) -> Self {
        let mut child = Self::new(id, Some(parent.parent), parent.center, parent.half_size);
        for (slot, inherited) in child.occlusion.iter_mut().zip(parent.occlusion.iter()) {
            slot.state = inherited.state & OcclusionState::INHERIT_MASK;
        }
        child
    }

    /// What a new child in `octant` needs from this group.
    pub(crate) fn child_template(&self, octant: usize) -> ChildTemplate {
        let (center, half_size) = self.child_cell(octant);
        ChildTemplate { parent: self.id, center, half_size, occlusion: self.occlusion }
    }

    /// Handle of this group.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> GroupId {
        self.id
    }

    /// Parent group; `None` for the root.
    #[inline]
    #[must_use]
    pub const fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    /// Child handles by octant.
    pub fn children(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.children.iter().flatten().copied()
    }

    /// Number of children.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.iter().flatten().count()
    }

    /// The fixed cubic cell.
    #[must_use]
    pub fn cell(&self) -> Aabb {
        Aabb::from_center_half_extents(self.center, Vec3::splat(self.half_size))
    }

    /// Half the cell edge length.
    #[inline]
    #[must_use]
    pub const fn half_size(&self) -> f32 {
        self.half_size
    }

    /// Tight bounds of own objects and children.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Tight bounds of own objects only.
    #[inline]
    #[must_use]
    pub const fn object_bounds(&self) -> Option<&Aabb> {
        self.object_bounds.as_ref()
    }

    /// Objects held directly by this group.
    #[must_use]
    pub fn elements(&self) -> &[ObjectId] {
        &self.elements
    }

    /// State bits.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> GroupState {
        self.state
    }

    /// Occlusion state for one camera.
    #[inline]
    #[must_use]
    pub const fn occlusion(&self, slot: CameraSlot) -> OcclusionSlot {
        self.occlusion[slot.index()]
    }

    /// True if the last query for `slot` reported occluded.
    #[must_use]
    pub const fn is_occluded(&self, slot: CameraSlot) -> bool {
        self.occlusion[slot.index()].state.contains(OcclusionState::OCCLUDED)
    }

    /// Draw batches by render type.
    #[must_use]
    pub const fn draw_map(&self) -> &DrawMap {
        &self.draw_map
    }

    /// All draw batches, in render-type order.
    pub fn draw_infos(&self) -> impl Iterator<Item = &DrawInfoRef> {
        self.draw_map.values().flatten()
    }

    /// Buffer sizes from the last rebuild.
    #[must_use]
    pub const fn geometry(&self) -> GeometryCount {
        self.geometry
    }

    /// Distance from the last culling camera.
    #[must_use]
    pub const fn distance(&self) -> f32 {
        self.distance
    }

    /// Outstanding render-pass references.
    #[must_use]
    pub const fn pin_count(&self) -> u32 {
        self.pin_count
    }

    /// Frame on which `slot` last saw this group.
    #[must_use]
    pub const fn visible_frame(&self, slot: CameraSlot) -> u64 {
        self.visible_frame[slot.index()]
    }

    /// No objects and no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.child_count() == 0
    }

    /// Octant of a point relative to the cell center. Bit 0 is +x, bit 1
    /// is +y, bit 2 is +z.
    #[must_use]
    pub fn octant_of(&self, p: Vec3) -> usize {
        usize::from(p.x >= self.center.x)
            | usize::from(p.y >= self.center.y) << 1
            | usize::from(p.z >= self.center.z) << 2
    }

    /// Center and half size of the child cell in `octant`.
    #[must_use]
    pub fn child_cell(&self, octant: usize) -> (Vec3, f32) {
        let quarter = self.half_size * 0.5;
        let sign = |bit: usize| if octant & bit == 0 { -quarter } else { quarter };
        (self.center + Vec3::new(sign(1), sign(2), sign(4)), quarter)
    }

    /// Moves the cell and every bound by `offset`.
    pub(crate) fn translate(&mut self, offset: Vec3) {
        self.center += offset;
        self.bounds = self.bounds.translated(offset);
        self.object_bounds = self.object_bounds.map(|b| b.translated(offset));
        self.content_bounds = self.content_bounds.map(|b| b.translated(offset));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::GroupArena;

    fn root() -> SpatialGroup {
        let mut arena: GroupArena<()> = GroupArena::new();
        let id = arena.allocate_with(|_| ());
        SpatialGroup::new(id, None, Vec3::ZERO, 8.0)
    }

    #[test]
    fn test_child_cells_tile_parent() {
        let group = root();
        for octant in 0..8 {
            let (center, half) = group.child_cell(octant);
            assert_eq!(half, 4.0);
            assert_eq!(group.octant_of(center), octant);
            assert!(group.cell().contains(&Aabb::from_center_half_extents(center, Vec3::splat(half))));
        }
    }

    #[test]
    fn test_child_inherits_occlusion() {
        let mut parent = root();
        parent.occlusion[CameraSlot::World.index()].state =
            OcclusionState::OCCLUDED | OcclusionState::QUERY_PENDING;

        let child = SpatialGroup::new_child(parent.id(), &parent.child_template(0));
        assert!(child.is_occluded(CameraSlot::World));
        assert!(!child.occlusion(CameraSlot::World).state.contains(OcclusionState::QUERY_PENDING));
        assert!(!child.is_occluded(CameraSlot::Shadow0));
    }
}
