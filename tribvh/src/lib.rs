//! Bounding volume hierarchies over triangle meshes.
//!
//! Building, merging, persisting (`.bvh`) and ray-tracing binary trees of
//! axis-aligned bounding boxes.

pub mod bvh;
mod error;
mod hit;
mod mesh;
mod ray;
mod scene;
mod triangle;
mod utils;

pub use glam::{Vec2, Vec3};

pub use self::bvh::{BuildPolicy, BvhNode, LEAF_CAP, MAX_DEPTH};
pub use self::error::*;
pub use self::hit::*;
pub use self::mesh::*;
pub use self::ray::*;
pub use self::scene::*;
pub use self::triangle::*;
pub use self::utils::*;
