//! Building, merging and (de)serializing the tree.

mod builders;
mod bvh_deserializer;
mod bvh_merger;
mod bvh_node;
mod bvh_serializer;

pub use self::builders::*;
pub use self::bvh_deserializer::*;
pub use self::bvh_merger::*;
pub use self::bvh_node::*;
pub use self::bvh_serializer::*;

/// Maximum number of triangles referenced by a single leaf.
pub const LEAF_CAP: usize = 8;

/// Maximum depth of a tree accepted by [`read()`], counting the root as the
/// first level.
pub const MAX_DEPTH: usize = 1024;
