use glam::Vec3;

use crate::{Axis, BoundingBox, BvhNode, Hit, Triangle, TriangleId};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    inv_direction: Vec3,
}

impl Ray {
    /// Creates a new ray.
    ///
    /// `direction` doesn't have to be normalized; hit distances are then
    /// expressed in multiples of its length. Zero components are allowed and
    /// turn into infinities in the slab test.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: 1.0 / direction,
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Intersects this ray with given box using the slab method and returns
    /// the `(tmin, tmax)` parametric interval if it's a hit.
    ///
    /// Infinities and NaNs coming from zero direction components are
    /// deliberately kept; `f32::min()` and `f32::max()` skip NaN operands the
    /// same way C's `fminf()` / `fmaxf()` do.
    pub fn intersect_box(&self, bb: &BoundingBox) -> Option<(f32, f32)> {
        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;

        for axis in Axis::all() {
            let origin = self.origin[axis];
            let inv_direction = self.inv_direction[axis];

            let t1 = (bb.min()[axis] - origin) * inv_direction;
            let t2 = (bb.max()[axis] - origin) * inv_direction;

            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
        }

        if tmax >= tmin && tmax >= 0.0 {
            Some((tmin, tmax))
        } else {
            None
        }
    }

    pub fn hits_box(&self, bb: &BoundingBox) -> bool {
        self.intersect_box(bb).is_some()
    }

    /// Traverses the tree and returns the nearest triangle hit by this ray.
    ///
    /// Both children are visited whenever both of their boxes are hit - the
    /// traversal doesn't prune subtrees by the current best distance.
    ///
    /// # Panics
    ///
    /// `triangles` must be the array the tree was built over (or loaded
    /// against); panics if a leaf refers to a triangle past its end.
    pub fn trace_nearest(&self, root: &BvhNode, triangles: &[Triangle]) -> Hit {
        let mut hit = Hit::none();

        self.trace(root, triangles, &mut hit);

        hit
    }

    fn trace(&self, node: &BvhNode, triangles: &[Triangle], hit: &mut Hit) {
        if !self.hits_box(&node.bounds()) {
            return;
        }

        match node {
            BvhNode::Internal { left, right, .. } => {
                self.trace(left, triangles, hit);
                self.trace(right, triangles, hit);
            }

            BvhNode::Leaf {
                triangles: triangle_ids,
                ..
            } => {
                for &triangle_id in triangle_ids {
                    let triangle = &triangles[triangle_id.get() as usize];

                    if let Some(distance) = triangle.hit(self) {
                        hit.try_replace(distance, triangle_id);
                    }
                }
            }
        }
    }

    /// Tests this ray against every triangle, without any acceleration
    /// structure; used as a reference for [`Self::trace_nearest()`].
    pub fn trace_naive(&self, triangles: &[Triangle]) -> Hit {
        let mut hit = Hit::none();

        for (triangle_id, triangle) in triangles.iter().enumerate() {
            if let Some(distance) = triangle.hit(self) {
                hit.try_replace(distance, TriangleId::new(triangle_id as u32));
            }
        }

        hit
    }
}
