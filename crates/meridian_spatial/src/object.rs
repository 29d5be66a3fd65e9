//! Scene objects stored in a spatial partition.
//!
//! An object is an extent plus the faces the geometry managers turn into
//! draw batches. Identity is an [`ObjectId`]; the partition owns the data.

use std::fmt;

use meridian_shared::Aabb;

/// Scene object identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// Texture identity. Batches sharing a texture share a bind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Transform identity. Batches sharing a matrix share an upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatrixId(pub u32);

/// Surface material parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct MaterialParams {
    /// Normal map texture.
    pub normal_map: Option<TextureId>,
    /// Specular map texture.
    pub specular_map: Option<TextureId>,
    /// Specular exponent.
    pub specular_exponent: u8,
    /// Environment reflection intensity.
    pub env_intensity: u8,
    /// Alpha-mask cutoff; zero disables masking.
    pub alpha_mask_cutoff: u8,
}

/// One renderable face of an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Face {
    /// Diffuse texture.
    pub texture: Option<TextureId>,
    /// Vertices contributed.
    pub vertex_count: u32,
    /// Indices contributed.
    pub index_count: u32,
    /// Alpha-blended.
    pub alpha: bool,
    /// Unlit.
    pub fullbright: bool,
    /// Bump-map mode; zero for none.
    pub bump: u8,
    /// Shininess level.
    pub shiny: u8,
    /// Emits glow.
    pub glow: bool,
    /// Model transform.
    pub model_matrix: Option<MatrixId>,
    /// Texture transform.
    pub texture_matrix: Option<MatrixId>,
    /// Material parameters.
    pub material: Option<MaterialParams>,
}

impl Face {
    /// Opaque face with a texture and geometry counts.
    #[must_use]
    pub fn new(texture: Option<TextureId>, vertex_count: u32, index_count: u32) -> Self {
        Self { texture, vertex_count, index_count, ..Self::default() }
    }

    /// Marks the face alpha-blended.
    #[must_use]
    pub const fn with_alpha(mut self) -> Self {
        self.alpha = true;
        self
    }

    /// Sets the model matrix.
    #[must_use]
    pub const fn with_model_matrix(mut self, matrix: MatrixId) -> Self {
        self.model_matrix = Some(matrix);
        self
    }

    /// Marks the face fullbright.
    #[must_use]
    pub const fn with_fullbright(mut self) -> Self {
        self.fullbright = true;
        self
    }

    /// Sets the material.
    #[must_use]
    pub const fn with_material(mut self, material: MaterialParams) -> Self {
        self.material = Some(material);
        self
    }
}

/// An object placed in a spatial partition.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    /// Identity.
    pub id: ObjectId,
    /// World-space bounds.
    pub extents: Aabb,
    /// Renderable faces.
    pub faces: Vec<Face>,
}

impl SceneObject {
    /// Object with no faces.
    #[must_use]
    pub fn new(id: ObjectId, extents: Aabb) -> Self {
        Self { id, extents, faces: Vec::new() }
    }

    /// Adds a face.
    #[must_use]
    pub fn with_face(mut self, face: Face) -> Self {
        self.faces.push(face);
        self
    }
}
