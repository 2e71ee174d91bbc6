mod median;
mod sah;

use std::ops::Range;

use glam::Vec3;

use crate::{BoundingBox, BvhNode, Triangle, TriangleId};

/// Strategy used to split nodes while building the tree.
///
/// Both policies are deterministic, but they produce different trees for the
/// same input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BuildPolicy {
    /// Sorts triangles by their centers along the longest axis of the node
    /// and splits them in half.
    #[default]
    Median,

    /// Sweeps every split position on every axis and picks the one with the
    /// lowest surface area heuristic cost.
    Sah,
}

/// Builds a tree over `triangles[range]` using [`BuildPolicy::Median`].
///
/// See: [`build_with()`].
pub fn build(triangles: &[Triangle], range: Range<usize>) -> Option<BvhNode> {
    build_with(BuildPolicy::default(), triangles, range)
}

/// Builds a tree over `triangles[range]`.
///
/// Returns `None` if there's no geometry to build the tree from, i.e. when
/// `triangles` is empty or `range` is empty or out of bounds, and also when
/// `range` reaches past the triangles addressable by [`TriangleId`].
///
/// `triangles` is left untouched; leaves refer to the triangles through
/// their absolute indices in that slice.
pub fn build_with(
    policy: BuildPolicy,
    triangles: &[Triangle],
    range: Range<usize>,
) -> Option<BvhNode> {
    if !accepts_range(triangles.len(), &range) {
        log::trace!(
            "Nothing to build (range={:?}, triangles={})",
            range,
            triangles.len()
        );

        return None;
    }

    #[cfg(feature = "metrics")]
    let tt = std::time::Instant::now();

    let mut items: Vec<_> = range
        .map(|id| {
            BvhTriangle::new(TriangleId::new(id as u32), &triangles[id])
        })
        .collect();

    let root = match policy {
        BuildPolicy::Median => median::build(&mut items),
        BuildPolicy::Sah => sah::build(&mut items),
    };

    #[cfg(debug_assertions)]
    root.validate();

    log::debug!(
        "Built tree ({:?}): triangles={}, nodes={}, depth={}",
        policy,
        items.len(),
        root.node_count(),
        root.depth(),
    );

    #[cfg(feature = "metrics")]
    log::debug!(
        "Building took {}",
        humantime::format_duration(tt.elapsed())
    );

    Some(root)
}

fn accepts_range(triangle_count: usize, range: &Range<usize>) -> bool {
    range.start < range.end
        && range.end <= triangle_count
        && u32::try_from(range.end - 1).is_ok()
}

/// Triangle as seen by the builders - just its bounds and center.
#[derive(Clone, Copy, Debug)]
struct BvhTriangle {
    triangle_id: TriangleId,
    bounds: BoundingBox,
    center: Vec3,
}

impl BvhTriangle {
    fn new(triangle_id: TriangleId, triangle: &Triangle) -> Self {
        Self {
            triangle_id,
            bounds: triangle.bounds(),
            center: triangle.center(),
        }
    }

    fn bounds(triangles: &[Self]) -> BoundingBox {
        triangles.iter().map(|triangle| triangle.bounds).collect()
    }

    fn leaf(triangles: &[Self]) -> BvhNode {
        BvhNode::Leaf {
            bounds: Self::bounds(triangles),
            triangles: triangles
                .iter()
                .map(|triangle| triangle.triangle_id)
                .collect(),
        }
    }
}
