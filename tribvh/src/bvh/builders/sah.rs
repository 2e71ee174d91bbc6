use super::BvhTriangle;
use crate::bvh::LEAF_CAP;
use crate::{Axis, BoundingBox, BvhNode};

/// Builds the tree using the surface area heuristic.
///
/// Contrary to the usual approach, nodes holding more than [`LEAF_CAP`]
/// triangles are always split, even if the split is estimated to be more
/// costly than keeping the node as-is.
///
/// Special thanks to:
/// - https://jacco.ompf2.com/2022/04/13/how-to-build-a-bvh-part-1-basics/.
pub(super) fn build(triangles: &mut [BvhTriangle]) -> BvhNode {
    if triangles.len() <= LEAF_CAP {
        return BvhTriangle::leaf(triangles);
    }

    let split_at = find_splitting_plane(triangles);
    let (left, right) = triangles.split_at_mut(split_at);

    BvhNode::internal(build(left), build(right))
}

/// Finds the cheapest split and reorders `triangles` so that the split
/// happens at the returned position.
///
/// On ties, the first axis (x, then y, then z) and the lowest position win.
fn find_splitting_plane(triangles: &mut [BvhTriangle]) -> usize {
    let len = triangles.len();
    let mut best: Option<SplittingPlane> = None;
    let mut right_areas = vec![0.0; len];

    for split_by in Axis::all() {
        let mut sorted = triangles.to_vec();

        sorted.sort_by(|a, b| {
            a.center[split_by].total_cmp(&b.center[split_by])
        });

        // right_areas[i] = area of triangles in `sorted[i..]`
        let mut right_bb = BoundingBox::default();

        for i in (1..len).rev() {
            right_bb += sorted[i].bounds;
            right_areas[i] = right_bb.surface_area();
        }

        let mut left_bb = BoundingBox::default();

        for split_at in 1..len {
            left_bb += sorted[split_at - 1].bounds;

            let split_cost = (split_at as f32) * left_bb.surface_area()
                + ((len - split_at) as f32) * right_areas[split_at];

            let is_current_split_better =
                best.map_or(true, |best| split_cost < best.split_cost);

            if is_current_split_better {
                best = Some(SplittingPlane {
                    split_by,
                    split_at,
                    split_cost,
                });
            }
        }
    }

    // There's always at least one candidate, since `len > LEAF_CAP`
    let plane = best.unwrap_or(SplittingPlane {
        split_by: Axis::X,
        split_at: len / 2,
        split_cost: f32::INFINITY,
    });

    triangles.sort_by(|a, b| {
        a.center[plane.split_by].total_cmp(&b.center[plane.split_by])
    });

    plane.split_at
}

#[derive(Clone, Copy, Debug)]
struct SplittingPlane {
    split_by: Axis,
    split_at: usize,
    split_cost: f32,
}
