//! Cameras and view frusta.
//!
//! Extracts frustum planes from a view-projection matrix (or builds them
//! from a box) and classifies bounding volumes against them.

use bytemuck::{Pod, Zeroable};
use meridian_shared::{Aabb, Vec3, NUM_CAMERAS};

/// A plane in 3D space (Ax + By + Cz + D = 0). Positive side is inside.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Plane {
    /// Normal X component.
    pub a: f32,
    /// Normal Y component.
    pub b: f32,
    /// Normal Z component.
    pub c: f32,
    /// Distance from origin.
    pub d: f32,
}

impl Plane {
    /// Creates a new plane.
    #[must_use]
    pub const fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self { a, b, c, d }
    }

    /// Normalizes the plane.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = (self.a * self.a + self.b * self.b + self.c * self.c).sqrt();
        if len > 0.0 {
            Self { a: self.a / len, b: self.b / len, c: self.c / len, d: self.d / len }
        } else {
            self
        }
    }

    /// Returns the signed distance from a point to the plane.
    #[inline]
    #[must_use]
    pub fn distance_to_point(&self, p: Vec3) -> f32 {
        self.a * p.x + self.b * p.y + self.c * p.z + self.d
    }
}

/// Result of classifying a volume against a frustum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intersection {
    /// Entirely outside at least one plane.
    Outside,
    /// Straddles at least one plane.
    Partial,
    /// Inside every plane.
    Inside,
}

/// View frustum for culling.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far planes.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Plane indices.
    pub const LEFT: usize = 0;
    /// Right plane index.
    pub const RIGHT: usize = 1;
    /// Bottom plane index.
    pub const BOTTOM: usize = 2;
    /// Top plane index.
    pub const TOP: usize = 3;
    /// Near plane index.
    pub const NEAR: usize = 4;
    /// Far plane index.
    pub const FAR: usize = 5;

    /// Extracts frustum planes from a view-projection matrix.
    ///
    /// The matrix should be in column-major order (OpenGL convention,
    /// clip-space z in `[-w, w]`).
    #[must_use]
    pub fn from_view_projection(m: &[[f32; 4]; 4]) -> Self {
        let row = |r: usize| [m[0][r], m[1][r], m[2][r], m[3][r]];
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        let combine = |a: [f32; 4], b: [f32; 4], sign: f32| {
            Plane::new(a[0] + sign * b[0], a[1] + sign * b[1], a[2] + sign * b[2], a[3] + sign * b[3])
                .normalized()
        };

        let mut planes = [Plane::default(); 6];
        planes[Self::LEFT] = combine(r3, r0, 1.0);
        planes[Self::RIGHT] = combine(r3, r0, -1.0);
        planes[Self::BOTTOM] = combine(r3, r1, 1.0);
        planes[Self::TOP] = combine(r3, r1, -1.0);
        planes[Self::NEAR] = combine(r3, r2, 1.0);
        planes[Self::FAR] = combine(r3, r2, -1.0);
        Self { planes }
    }

    /// Frustum whose inside is exactly `bounds` (an orthographic box).
    #[must_use]
    pub fn from_box(bounds: &Aabb) -> Self {
        let (min, max) = (bounds.min, bounds.max);
        let mut planes = [Plane::default(); 6];
        planes[Self::LEFT] = Plane::new(1.0, 0.0, 0.0, -min.x);
        planes[Self::RIGHT] = Plane::new(-1.0, 0.0, 0.0, max.x);
        planes[Self::BOTTOM] = Plane::new(0.0, 1.0, 0.0, -min.y);
        planes[Self::TOP] = Plane::new(0.0, -1.0, 0.0, max.y);
        planes[Self::NEAR] = Plane::new(0.0, 0.0, 1.0, -min.z);
        planes[Self::FAR] = Plane::new(0.0, 0.0, -1.0, max.z);
        Self { planes }
    }

    /// Classifies an AABB. With `skip_far` the far plane is ignored.
    #[must_use]
    pub fn test_aabb(&self, aabb: &Aabb, skip_far: bool) -> Intersection {
        let center = aabb.center();
        let half = aabb.half_extents();
        let mut result = Intersection::Inside;

        for (i, plane) in self.planes.iter().enumerate() {
            if skip_far && i == Self::FAR {
                continue;
            }

            // Projection interval radius of the box onto the plane normal.
            let r = half.x * plane.a.abs() + half.y * plane.b.abs() + half.z * plane.c.abs();
            let d = plane.distance_to_point(center);

            if d < -r {
                return Intersection::Outside;
            }
            if d < r {
                result = Intersection::Partial;
            }
        }

        result
    }

    /// Tests if a sphere intersects the frustum.
    #[must_use]
    pub fn test_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes.iter().all(|plane| plane.distance_to_point(center) >= -radius)
    }

    /// True if the point lies inside every plane.
    #[must_use]
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.test_sphere(p, 0.0)
    }
}

/// Per-group camera slot. Each slot carries independent occlusion state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CameraSlot {
    /// Main world view.
    World,
    /// First shadow cascade.
    Shadow0,
    /// Second shadow cascade.
    Shadow1,
    /// Third shadow cascade.
    Shadow2,
    /// Fourth shadow cascade.
    Shadow3,
    /// Water reflection.
    Reflection,
    /// Environment probe.
    Environment,
    /// Offscreen preview.
    Preview,
}

impl CameraSlot {
    /// All slots in index order.
    pub const ALL: [Self; NUM_CAMERAS] = [
        Self::World,
        Self::Shadow0,
        Self::Shadow1,
        Self::Shadow2,
        Self::Shadow3,
        Self::Reflection,
        Self::Environment,
        Self::Preview,
    ];

    /// Index into per-camera arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A culling camera: slot, eye position and frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Occlusion slot this camera reads and writes.
    pub slot: CameraSlot,
    /// Eye position; distances are measured from here.
    pub origin: Vec3,
    /// View frustum.
    pub frustum: Frustum,
}

impl Camera {
    /// Creates a camera from parts.
    #[must_use]
    pub const fn new(slot: CameraSlot, origin: Vec3, frustum: Frustum) -> Self {
        Self { slot, origin, frustum }
    }

    /// Orthographic camera seeing exactly `bounds`, eye at its center.
    #[must_use]
    pub fn from_box(slot: CameraSlot, bounds: &Aabb) -> Self {
        Self::new(slot, bounds.center(), Frustum::from_box(bounds))
    }

    /// Right-handed perspective camera looking from `eye` at `target`.
    #[must_use]
    pub fn look_at(slot: CameraSlot, eye: Vec3, target: Vec3, projection: Perspective) -> Self {
        let view = look_at_rh(eye, target, Vec3::Y);
        let proj = projection.matrix();
        let view_projection = mul_mat4(&proj, &view);
        Self::new(slot, eye, Frustum::from_view_projection(&view_projection))
    }
}

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perspective {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width / height.
    pub aspect: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Perspective {
    fn matrix(&self) -> [[f32; 4]; 4] {
        let f = 1.0 / (self.fov_y * 0.5).tan();
        let range = self.near - self.far;
        [
            [f / self.aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, (self.far + self.near) / range, -1.0],
            [0.0, 0.0, 2.0 * self.far * self.near / range, 0.0],
        ]
    }
}

impl Default for Perspective {
    fn default() -> Self {
        Self { fov_y: std::f32::consts::FRAC_PI_3, aspect: 16.0 / 9.0, near: 0.1, far: 512.0 }
    }
}

fn look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> [[f32; 4]; 4] {
    let f = (target - eye).normalize_or_zero();
    let s = f.cross(up).normalize_or_zero();
    let u = s.cross(f);
    [
        [s.x, u.x, -f.x, 0.0],
        [s.y, u.y, -f.y, 0.0],
        [s.z, u.z, -f.z, 0.0],
        [-s.dot(eye), -u.dot(eye), f.dot(eye), 1.0],
    ]
}

/// Column-major `a * b`.
fn mul_mat4(a: &[[f32; 4]; 4], b: &[[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut out = [[0.0; 4]; 4];
    for (c, column) in out.iter_mut().enumerate() {
        for (r, cell) in column.iter_mut().enumerate() {
            *cell = (0..4).map(|k| a[k][r] * b[c][k]).sum();
        }
    }
    out
}
