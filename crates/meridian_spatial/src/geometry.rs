//! # Geometry Managers
//!
//! A partition is parameterized by a geometry manager that turns the
//! objects of one group into draw batches. Partition kinds differ only in
//! which manager they use.
//!
//! ```text
//! group objects ──► add_geometry_count ──► GeometryCount
//!               └─► get_geometry       ──► [DrawInfo] ──► draw map
//! ```
//!
//! Output depends only on the objects and their order, so rebuilding an
//! unchanged group yields identical batches.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use meridian_shared::Aabb;

use crate::draw_info::{DrawInfo, DrawInfoRef, DrawParams, RenderType};
use crate::object::{Face, SceneObject};

/// Vertex and index totals of a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometryCount {
    /// Vertices.
    pub vertices: u32,
    /// Indices.
    pub indices: u32,
}

/// Draw batches of one group, keyed by render type.
pub type DrawMap = BTreeMap<RenderType, Vec<DrawInfoRef>>;

/// Output of a group rebuild.
#[derive(Debug, Clone, Default)]
pub struct GroupGeometry {
    /// Buffer sizes.
    pub count: GeometryCount,
    /// Batches by render type.
    pub draw_map: DrawMap,
}

/// Geometry generation policy for a partition.
pub trait GeometryManager: fmt::Debug {
    /// Adds the buffer space `object` needs to `count`.
    fn add_geometry_count(&self, object: &SceneObject, count: &mut GeometryCount);

    /// Generates the batches for a group's objects, in buffer order.
    fn get_geometry(&self, objects: &[&SceneObject]) -> Vec<DrawInfo>;

    /// Regenerates a group: counts, batches, and the draw map.
    fn rebuild_geom(&self, objects: &[&SceneObject]) -> GroupGeometry {
        let mut count = GeometryCount::default();
        for object in objects {
            self.add_geometry_count(object, &mut count);
        }

        let mut draw_map = DrawMap::new();
        for info in self.get_geometry(objects) {
            draw_map.entry(info.render_type()).or_default().push(Arc::new(info));
        }
        GroupGeometry { count, draw_map }
    }
}

/// Render pass of a face.
#[must_use]
pub fn face_render_type(face: &Face) -> RenderType {
    let masked = face.material.is_some_and(|m| m.alpha_mask_cutoff > 0);
    if face.alpha {
        if masked {
            RenderType::AlphaMask
        } else {
            RenderType::Alpha
        }
    } else if face.material.is_some() {
        RenderType::Materials
    } else if face.glow {
        RenderType::Glow
    } else if face.bump > 0 {
        RenderType::Bump
    } else if face.fullbright {
        RenderType::Fullbright
    } else {
        RenderType::Simple
    }
}

fn add_face_counts<'a>(faces: impl Iterator<Item = &'a Face>, count: &mut GeometryCount) {
    for face in faces {
        count.vertices = count.vertices.saturating_add(face.vertex_count);
        count.indices = count.indices.saturating_add(face.index_count);
    }
}

fn face_params(face: &Face, extents: Aabb, vertex: u32, index: u32) -> DrawParams {
    DrawParams {
        start: vertex,
        end: vertex.saturating_add(face.vertex_count),
        count: face.index_count,
        offset: index,
        texture: face.texture,
        model_matrix: face.model_matrix,
        texture_matrix: face.texture_matrix,
        fullbright: face.fullbright,
        bump: face.bump,
        shiny: face.shiny,
        glow: face.glow,
        particle: false,
        material: face.material,
        extents,
    }
}

/// True if two faces can share one batch.
fn same_state(a: &Face, b: &Face) -> bool {
    a.texture == b.texture
        && a.model_matrix == b.model_matrix
        && a.texture_matrix == b.texture_matrix
        && a.fullbright == b.fullbright
        && a.bump == b.bump
        && a.shiny == b.shiny
        && a.glow == b.glow
        && a.material == b.material
}

/// Batches object faces by render state. Opaque faces sharing state are
/// merged into one range; every alpha face gets its own batch so it can
/// be depth sorted.
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeGeometryManager {
    render_type: Option<RenderType>,
}

impl VolumeGeometryManager {
    /// Manager that derives the pass from each face.
    #[must_use]
    pub const fn new() -> Self {
        Self { render_type: None }
    }

    /// Manager that puts every opaque face in `render_type`.
    #[must_use]
    pub const fn with_render_type(render_type: RenderType) -> Self {
        Self { render_type: Some(render_type) }
    }

    fn render_type_of(&self, face: &Face) -> RenderType {
        let derived = face_render_type(face);
        match self.render_type {
            Some(forced) if !derived.is_alpha() => forced,
            _ => derived,
        }
    }
}

impl GeometryManager for VolumeGeometryManager {
    fn add_geometry_count(&self, object: &SceneObject, count: &mut GeometryCount) {
        add_face_counts(object.faces.iter(), count);
    }

    fn get_geometry(&self, objects: &[&SceneObject]) -> Vec<DrawInfo> {
        let mut opaque: Vec<(RenderType, &Face, Aabb)> = Vec::new();
        let mut alpha: Vec<(RenderType, &Face, Aabb)> = Vec::new();
        for object in objects {
            for face in &object.faces {
                let render_type = self.render_type_of(face);
                if render_type.is_alpha() {
                    alpha.push((render_type, face, object.extents));
                } else {
                    opaque.push((render_type, face, object.extents));
                }
            }
        }

        // Stable, so equal keys keep object order.
        opaque.sort_by_key(|(render_type, face, _)| {
            (
                *render_type,
                face.texture.is_none(),
                face.texture.map_or(0, |t| t.0),
                face.model_matrix.is_none(),
                face.model_matrix.map_or(0, |m| m.0),
            )
        });

        let mut out: Vec<DrawInfo> = Vec::new();
        let mut pending: Option<(RenderType, &Face, DrawParams)> = None;
        let (mut vertex, mut index) = (0_u32, 0_u32);

        for (render_type, face, extents) in opaque {
            let merges = matches!(
                &pending,
                Some((current_type, first, _)) if *current_type == render_type && same_state(first, face)
            );
            if merges {
                if let Some((_, _, params)) = &mut pending {
                    params.end = params.end.saturating_add(face.vertex_count);
                    params.count = params.count.saturating_add(face.index_count);
                    params.extents.expand_to_include(&extents);
                }
            } else {
                if let Some((current_type, _, params)) = pending.take() {
                    out.push(DrawInfo::new(current_type, params));
                }
                pending = Some((render_type, face, face_params(face, extents, vertex, index)));
            }
            vertex = vertex.saturating_add(face.vertex_count);
            index = index.saturating_add(face.index_count);
        }
        if let Some((current_type, _, params)) = pending {
            out.push(DrawInfo::new(current_type, params));
        }

        for (render_type, face, extents) in alpha {
            out.push(DrawInfo::new(render_type, face_params(face, extents, vertex, index)));
            vertex = vertex.saturating_add(face.vertex_count);
            index = index.saturating_add(face.index_count);
        }

        out
    }
}

/// One alpha sprite batch per particle face.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParticleGeometryManager;

impl GeometryManager for ParticleGeometryManager {
    fn add_geometry_count(&self, object: &SceneObject, count: &mut GeometryCount) {
        add_face_counts(object.faces.iter(), count);
    }

    fn get_geometry(&self, objects: &[&SceneObject]) -> Vec<DrawInfo> {
        let (mut vertex, mut index) = (0_u32, 0_u32);
        let mut out = Vec::new();
        for object in objects {
            for face in &object.faces {
                let mut params = face_params(face, object.extents, vertex, index);
                params.particle = true;
                out.push(DrawInfo::new(RenderType::Alpha, params));
                vertex = vertex.saturating_add(face.vertex_count);
                index = index.saturating_add(face.index_count);
            }
        }
        out
    }
}

/// Produces no geometry. Used by partitions whose content draws itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGeometryManager;

impl GeometryManager for NullGeometryManager {
    fn add_geometry_count(&self, _object: &SceneObject, _count: &mut GeometryCount) {}

    fn get_geometry(&self, _objects: &[&SceneObject]) -> Vec<DrawInfo> {
        Vec::new()
    }
}
