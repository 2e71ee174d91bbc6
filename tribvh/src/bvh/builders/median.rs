use super::BvhTriangle;
use crate::bvh::LEAF_CAP;
use crate::BvhNode;

/// Builds the tree by recursively splitting triangles in half along the
/// longest axis of each node.
pub(super) fn build(triangles: &mut [BvhTriangle]) -> BvhNode {
    if triangles.len() <= LEAF_CAP {
        return BvhTriangle::leaf(triangles);
    }

    let split_by = BvhTriangle::bounds(triangles).longest_axis();

    // Stable, so triangles with equal centers keep their relative order
    triangles.sort_by(|a, b| {
        a.center[split_by].total_cmp(&b.center[split_by])
    });

    let (left, right) = triangles.split_at_mut(triangles.len() / 2);

    BvhNode::internal(build(left), build(right))
}
