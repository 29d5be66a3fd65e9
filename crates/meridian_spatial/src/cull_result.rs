//! Per-frame culling output.
//!
//! A [`CullResult`] is built from scratch by every cull and read by the
//! renderer within that frame. It holds group handles and shared batch
//! references only; nothing in it outlives the frame.

use meridian_shared::Aabb;

use crate::arena::GroupId;
use crate::camera::CameraSlot;
use crate::draw_info::{AlphaBatch, DrawInfoRef, RenderType, NUM_RENDER_TYPES};
use crate::object::ObjectId;

/// Counters from one cull.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CullStats {
    /// Groups visited.
    pub groups_tested: u32,
    /// Groups rejected by the frustum.
    pub frustum_culled: u32,
    /// Groups skipped as occluded.
    pub occlusion_culled: u32,
    /// Groups marked visible.
    pub visible: u32,
    /// Groups whose geometry was regenerated.
    pub rebuilt: u32,
    /// Batches emitted, alpha included.
    pub draw_batches: u32,
    /// Occlusion queries started.
    pub queries_issued: u32,
    /// Occlusion queries that could not be started.
    pub queries_failed: u32,
}

/// Everything one camera sees in one partition this frame.
#[derive(Debug, Clone)]
pub struct CullResult {
    camera: CameraSlot,
    frame: u64,
    /// Visible groups, in traversal order.
    pub visible_groups: Vec<GroupId>,
    /// Visible groups with alpha content, farthest first.
    pub alpha_groups: Vec<GroupId>,
    /// Groups skipped because they were occluded.
    pub occluded_groups: Vec<GroupId>,
    /// Groups with a query issued this frame.
    pub occlusion_groups: Vec<GroupId>,
    /// Visible groups that have batches to draw.
    pub drawable_groups: Vec<GroupId>,
    /// Objects held by visible groups.
    pub visible_objects: Vec<ObjectId>,
    /// Groups rebuilt this frame, nearest first.
    pub rebuilt_groups: Vec<GroupId>,
    /// Opaque batches per render type, sorted by texture then matrix.
    render_map: [Vec<DrawInfoRef>; NUM_RENDER_TYPES],
    /// Alpha batches, farthest first.
    pub alpha_batches: Vec<AlphaBatch>,
    /// Counters.
    pub stats: CullStats,
}

impl CullResult {
    /// Empty result for `camera` on `frame`.
    #[must_use]
    pub fn new(camera: CameraSlot, frame: u64) -> Self {
        Self {
            camera,
            frame,
            visible_groups: Vec::new(),
            alpha_groups: Vec::new(),
            occluded_groups: Vec::new(),
            occlusion_groups: Vec::new(),
            drawable_groups: Vec::new(),
            visible_objects: Vec::new(),
            rebuilt_groups: Vec::new(),
            render_map: Default::default(),
            alpha_batches: Vec::new(),
            stats: CullStats::default(),
        }
    }

    /// Camera slot that produced this result.
    #[must_use]
    pub const fn camera(&self) -> CameraSlot {
        self.camera
    }

    /// Frame number of the producing cull.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Opaque batches of one render type. Empty for [`RenderType::Alpha`];
    /// see [`CullResult::alpha_batches`].
    #[must_use]
    pub fn batches(&self, render_type: RenderType) -> &[DrawInfoRef] {
        &self.render_map[render_type.index()]
    }

    pub(crate) fn batches_mut(&mut self, render_type: RenderType) -> &mut Vec<DrawInfoRef> {
        &mut self.render_map[render_type.index()]
    }

    /// Every batch in draw order: opaque passes by render type, then alpha
    /// back to front.
    pub fn draw_order(&self) -> impl Iterator<Item = &DrawInfoRef> {
        self.render_map
            .iter()
            .flatten()
            .chain(self.alpha_batches.iter().map(|a| &a.draw_info))
    }

    /// Total batches.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.render_map.iter().map(Vec::len).sum::<usize>() + self.alpha_batches.len()
    }

    /// Union of every emitted batch's extents.
    #[must_use]
    pub fn batch_extents(&self) -> Option<Aabb> {
        self.draw_order()
            .map(|d| *d.extents())
            .reduce(|a, b| a.union(&b))
    }

    /// True if nothing was visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visible_groups.is_empty()
    }
}
