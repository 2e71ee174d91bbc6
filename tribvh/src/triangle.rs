use std::fmt;

use glam::{Vec2, Vec3};

use crate::{BoundingBox, Ray};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Triangle {
    vertices: [Vec3; 3],
    normals: [Vec3; 3],
    uvs: [Vec2; 3],
}

impl Triangle {
    /// Determinant (and hit distance) threshold used by [`Self::hit()`].
    pub const EPSILON: f32 = 1e-6;

    pub fn new(
        vertices: [Vec3; 3],
        normals: [Vec3; 3],
        uvs: [Vec2; 3],
    ) -> Self {
        Self {
            vertices,
            normals,
            uvs,
        }
    }

    pub fn with_vertices(mut self, vertices: [impl Into<Vec3>; 3]) -> Self {
        self.vertices = vertices.map(Into::into);
        self
    }

    pub fn with_normals(mut self, normals: [impl Into<Vec3>; 3]) -> Self {
        self.normals = normals.map(Into::into);
        self
    }

    pub fn with_uvs(mut self, uvs: [impl Into<Vec2>; 3]) -> Self {
        self.uvs = uvs.map(Into::into);
        self
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        self.vertices
    }

    pub fn normals(&self) -> [Vec3; 3] {
        self.normals
    }

    pub fn uvs(&self) -> [Vec2; 3] {
        self.uvs
    }

    pub fn center(&self) -> Vec3 {
        self.vertices.into_iter().sum::<Vec3>() / 3.0
    }

    pub fn bounds(&self) -> BoundingBox {
        self.vertices.into_iter().collect()
    }

    /// Returns the unit normal of the triangle's plane.
    ///
    /// Degenerate (zero-area) triangles have no such normal and yield `None`
    /// instead of a vector full of NaNs.
    pub fn face_normal(&self) -> Option<Vec3> {
        let [v0, v1, v2] = self.vertices;

        (v1 - v0).cross(v2 - v0).try_normalize()
    }

    /// Intersects `ray` with this triangle using the Möller–Trumbore
    /// algorithm and returns the distance to the hit point.
    pub fn hit(&self, ray: &Ray) -> Option<f32> {
        let [v0, v1, v2] = self.vertices;
        let v0v1 = v1 - v0;
        let v0v2 = v2 - v0;

        let pvec = ray.direction().cross(v0v2);
        let det = v0v1.dot(pvec);

        // Ray is parallel to the triangle's plane
        if det.abs() < Self::EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let tvec = ray.origin() - v0;
        let u = tvec.dot(pvec) * inv_det;

        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(v0v1);
        let v = ray.direction().dot(qvec) * inv_det;

        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let distance = v0v2.dot(qvec) * inv_det;

        if distance > Self::EPSILON {
            Some(distance)
        } else {
            None
        }
    }
}

/// Index of a triangle inside the array that owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriangleId(u32);

impl TriangleId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn offset(self, by: u32) -> Self {
        Self::new(self.0 + by)
    }
}

impl fmt::Display for TriangleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
