use crate::{BvhNode, Triangle};

/// Merges per-object trees into a single tree spanning all of the objects.
///
/// Triangles are concatenated in the order of `objects` and each tree is
/// re-indexed to point into the concatenated array. Returns `None` if there
/// are no objects.
///
/// Roots are sorted by their boxes' minimum x and then combined by splitting
/// the sorted list in half, recursively - objects close to each other along
/// the x axis end up in the same subtrees.
pub fn merge(
    objects: Vec<(BvhNode, Vec<Triangle>)>,
) -> Option<(BvhNode, Vec<Triangle>)> {
    let object_count = objects.len();
    let mut triangles = Vec::new();
    let mut roots = Vec::with_capacity(object_count);

    for (root, object_triangles) in objects {
        roots.push(root.offset(triangles.len() as u32));
        triangles.extend(object_triangles);
    }

    roots.sort_by(|a, b| a.bounds().min().x.total_cmp(&b.bounds().min().x));

    let root = merge_sorted(roots)?;

    #[cfg(debug_assertions)]
    root.validate();

    log::debug!(
        "Merged {} objects: triangles={}, nodes={}, depth={}",
        object_count,
        triangles.len(),
        root.node_count(),
        root.depth(),
    );

    Some((root, triangles))
}

fn merge_sorted(mut roots: Vec<BvhNode>) -> Option<BvhNode> {
    if roots.len() <= 1 {
        return roots.pop();
    }

    let right = roots.split_off(roots.len() / 2);

    Some(BvhNode::internal(merge_sorted(roots)?, merge_sorted(right)?))
}
