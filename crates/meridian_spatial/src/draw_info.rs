//! # Draw Batches
//!
//! A [`DrawInfo`] is one contiguous range of a group's vertex buffer drawn
//! with one set of render state. It is immutable after construction and
//! shared by [`Arc`] between the group's draw map and every cull result
//! that references it; a rebuild replaces it instead of editing it.

use std::cmp::Ordering;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use meridian_shared::Aabb;

use crate::object::{MaterialParams, MatrixId, TextureId};

/// Render pass a batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderType {
    /// Plain lit geometry.
    Simple,
    /// Unlit geometry.
    Fullbright,
    /// Bump-mapped geometry.
    Bump,
    /// Geometry with a material.
    Materials,
    /// Glow pass.
    Glow,
    /// Alpha-masked (cutout) geometry.
    AlphaMask,
    /// Terrain patches.
    Terrain,
    /// Grass billboards.
    Grass,
    /// Alpha-blended geometry, drawn back to front.
    Alpha,
}

/// Number of render types.
pub const NUM_RENDER_TYPES: usize = 9;

impl RenderType {
    /// All render types in draw order.
    pub const ALL: [Self; NUM_RENDER_TYPES] = [
        Self::Simple,
        Self::Fullbright,
        Self::Bump,
        Self::Materials,
        Self::Glow,
        Self::AlphaMask,
        Self::Terrain,
        Self::Grass,
        Self::Alpha,
    ];

    /// Index into per-type arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Alpha batches are sorted by distance instead of by state.
    #[inline]
    #[must_use]
    pub const fn is_alpha(self) -> bool {
        matches!(self, Self::Alpha)
    }
}

/// Construction parameters for a [`DrawInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrawParams {
    /// First vertex.
    pub start: u32,
    /// One past the last vertex.
    pub end: u32,
    /// Index count.
    pub count: u32,
    /// First index.
    pub offset: u32,
    /// Diffuse texture.
    pub texture: Option<TextureId>,
    /// Model transform.
    pub model_matrix: Option<MatrixId>,
    /// Texture transform.
    pub texture_matrix: Option<MatrixId>,
    /// Unlit.
    pub fullbright: bool,
    /// Bump mode.
    pub bump: u8,
    /// Shininess.
    pub shiny: u8,
    /// Emits glow.
    pub glow: bool,
    /// Particle sprite.
    pub particle: bool,
    /// Material parameters.
    pub material: Option<MaterialParams>,
    /// World-space bounds of the batch.
    pub extents: Aabb,
}

/// Immutable draw batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawInfo {
    params: DrawParams,
    render_type: RenderType,
}

/// Shared handle to a draw batch.
pub type DrawInfoRef = Arc<DrawInfo>;

impl DrawInfo {
    /// Builds a batch.
    #[must_use]
    pub const fn new(render_type: RenderType, params: DrawParams) -> Self {
        Self { params, render_type }
    }

    /// Render pass.
    #[inline]
    #[must_use]
    pub const fn render_type(&self) -> RenderType {
        self.render_type
    }

    /// First vertex.
    #[inline]
    #[must_use]
    pub const fn start(&self) -> u32 {
        self.params.start
    }

    /// One past the last vertex.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> u32 {
        self.params.end
    }

    /// Index count.
    #[inline]
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.params.count
    }

    /// First index.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> u32 {
        self.params.offset
    }

    /// Diffuse texture.
    #[inline]
    #[must_use]
    pub const fn texture(&self) -> Option<TextureId> {
        self.params.texture
    }

    /// Model transform.
    #[inline]
    #[must_use]
    pub const fn model_matrix(&self) -> Option<MatrixId> {
        self.params.model_matrix
    }

    /// Texture transform.
    #[inline]
    #[must_use]
    pub const fn texture_matrix(&self) -> Option<MatrixId> {
        self.params.texture_matrix
    }

    /// Unlit.
    #[must_use]
    pub const fn fullbright(&self) -> bool {
        self.params.fullbright
    }

    /// Particle sprite.
    #[must_use]
    pub const fn particle(&self) -> bool {
        self.params.particle
    }

    /// Material parameters.
    #[must_use]
    pub const fn material(&self) -> Option<MaterialParams> {
        self.params.material
    }

    /// World-space bounds.
    #[must_use]
    pub const fn extents(&self) -> &Aabb {
        &self.params.extents
    }

    /// Sort key for opaque passes: texture, then model matrix. Batches with
    /// no texture go last.
    #[must_use]
    pub fn state_key(&self) -> (bool, u32, bool, u32) {
        let tex = self.params.texture;
        let mat = self.params.model_matrix;
        (
            tex.is_none(),
            tex.map_or(0, |t| t.0),
            mat.is_none(),
            mat.map_or(0, |m| m.0),
        )
    }

    /// Fixed-layout record for upload or hashing.
    #[must_use]
    pub fn to_raw(&self) -> DrawInfoRaw {
        let p = &self.params;
        let flags = u32::from(p.fullbright)
            | u32::from(p.glow) << 1
            | u32::from(p.particle) << 2
            | u32::from(p.material.is_some()) << 3;
        DrawInfoRaw {
            start: p.start,
            end: p.end,
            count: p.count,
            offset: p.offset,
            texture: p.texture.map_or(u32::MAX, |t| t.0),
            model_matrix: p.model_matrix.map_or(u32::MAX, |m| m.0),
            texture_matrix: p.texture_matrix.map_or(u32::MAX, |m| m.0),
            render_type: self.render_type.index() as u32,
            bump_shiny_flags: u32::from(p.bump) | u32::from(p.shiny) << 8 | flags << 16,
            _pad: [0; 3],
            extents: p.extents,
        }
    }
}

/// Plain-old-data image of a [`DrawInfo`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawInfoRaw {
    /// First vertex.
    pub start: u32,
    /// One past the last vertex.
    pub end: u32,
    /// Index count.
    pub count: u32,
    /// First index.
    pub offset: u32,
    /// Texture id or `u32::MAX`.
    pub texture: u32,
    /// Model matrix id or `u32::MAX`.
    pub model_matrix: u32,
    /// Texture matrix id or `u32::MAX`.
    pub texture_matrix: u32,
    /// Render type index.
    pub render_type: u32,
    /// Bump in bits 0-7, shiny in 8-15, flags from 16.
    pub bump_shiny_flags: u32,
    /// Padding.
    pub _pad: [u32; 3],
    /// World-space bounds.
    pub extents: Aabb,
}

/// Orders opaque batches by texture then matrix. Stable.
pub fn sort_by_state(batches: &mut [DrawInfoRef]) {
    batches.sort_by_key(|d| d.state_key());
}

/// Alpha batch with its distance from the camera this frame.
#[derive(Debug, Clone)]
pub struct AlphaBatch {
    /// Distance from the camera to the batch center.
    pub distance: f32,
    /// The batch.
    pub draw_info: DrawInfoRef,
}

/// Orders alpha batches farthest first.
pub fn sort_back_to_front(batches: &mut [AlphaBatch]) {
    batches.sort_by(|a, b| b.distance.partial_cmp(&a.distance).unwrap_or(Ordering::Equal));
}
