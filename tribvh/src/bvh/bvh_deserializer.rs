use std::fs;
use std::path::Path;

use fxhash::FxHashMap;
use glam::Vec3;

use crate::bvh::{LEAF_CAP, MAX_DEPTH};
use crate::{BoundingBox, BvhNode, Error, Result, TriangleId};

/// Reads a tree written by [`super::write()`].
///
/// `triangle_count` is the number of triangles of the mesh the tree belongs
/// to; leaves referencing triangles past it are rejected.
///
/// Returns `Ok(None)` if the source contains no nodes at all, which is what
/// gets saved for meshes without any geometry. Leaves' boxes are taken as-is,
/// without checking them against the triangles, but each internal node's box
/// must be the union of its children's boxes.
///
/// Trees deeper than [`MAX_DEPTH`] are rejected.
pub fn read(source: &str, triangle_count: usize) -> Result<Option<BvhNode>> {
    let mut nodes = Vec::new();
    let mut links = Vec::new();

    for (line, record) in source.lines().enumerate() {
        let line = line + 1;

        if !matches!(record.chars().next(), Some('n' | 'l' | 't')) {
            continue;
        }

        let mut fields = record.split_whitespace();

        let Some(tag) = fields.next() else {
            continue;
        };

        match tag {
            "n" => {
                let bounds = read_bounds(line, &mut fields)?;

                expect_end(line, &mut fields)?;

                nodes.push(RawNode::internal(line, bounds));
            }

            "l" => {
                let bounds = read_bounds(line, &mut fields)?;
                let triangles = read_triangles(line, fields, triangle_count)?;

                nodes.push(RawNode::leaf(line, bounds, triangles));
            }

            "t" => {
                let id = read_id(line, &mut fields)?;
                let left_id = read_id(line, &mut fields)?;
                let right_id = read_id(line, &mut fields)?;

                expect_end(line, &mut fields)?;

                links.push(RawLink {
                    line,
                    id,
                    left_id,
                    right_id,
                });
            }

            tag => {
                return Err(Error::parse(
                    line,
                    format!("unknown record `{}`", tag),
                ));
            }
        }
    }

    if nodes.is_empty() {
        if let Some(link) = links.first() {
            return Err(Error::parse(link.line, "linkage without any nodes"));
        }

        return Ok(None);
    }

    apply_links(&mut nodes, links)?;

    let root = assemble(&mut nodes)?;

    log::trace!(
        "Read tree: nodes={}, leaves={}",
        root.node_count(),
        root.leaf_count()
    );

    Ok(Some(root))
}

/// Loads a tree saved by [`super::save()`].
///
/// See: [`read()`].
pub fn load_tree(
    path: impl AsRef<Path>,
    triangle_count: usize,
) -> Result<Option<BvhNode>> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
    let root = read(&source, triangle_count)?;

    if let Some(root) = &root {
        log::info!(
            "Loaded tree from {}: nodes={}, leaves={}",
            path.display(),
            root.node_count(),
            root.leaf_count(),
        );
    } else {
        log::info!("Loaded tree from {}: empty", path.display());
    }

    Ok(root)
}

#[derive(Debug)]
struct RawNode {
    line: usize,
    bounds: BoundingBox,
    triangles: Option<Vec<TriangleId>>,
    children: Option<(usize, usize)>,
    parent: Option<usize>,
}

impl RawNode {
    fn internal(line: usize, bounds: BoundingBox) -> Self {
        Self {
            line,
            bounds,
            triangles: None,
            children: None,
            parent: None,
        }
    }

    fn leaf(
        line: usize,
        bounds: BoundingBox,
        triangles: Vec<TriangleId>,
    ) -> Self {
        Self {
            triangles: Some(triangles),
            ..Self::internal(line, bounds)
        }
    }

    fn is_leaf(&self) -> bool {
        self.triangles.is_some()
    }
}

#[derive(Debug)]
struct RawLink {
    line: usize,
    id: Option<usize>,
    left_id: Option<usize>,
    right_id: Option<usize>,
}

fn read_field<'a>(
    line: usize,
    fields: &mut impl Iterator<Item = &'a str>,
) -> Result<&'a str> {
    fields
        .next()
        .ok_or_else(|| Error::parse(line, "record is too short"))
}

fn expect_end<'a>(
    line: usize,
    fields: &mut impl Iterator<Item = &'a str>,
) -> Result<()> {
    if fields.next().is_some() {
        Err(Error::parse(line, "record is too long"))
    } else {
        Ok(())
    }
}

fn read_bounds<'a>(
    line: usize,
    fields: &mut impl Iterator<Item = &'a str>,
) -> Result<BoundingBox> {
    let mut coords = [0.0; 6];

    for coord in &mut coords {
        let field = read_field(line, fields)?;

        *coord = field.parse().map_err(|_| {
            Error::parse(line, format!("invalid coordinate `{}`", field))
        })?;
    }

    let [min_x, min_y, min_z, max_x, max_y, max_z] = coords;

    Ok(BoundingBox::new(
        Vec3::new(min_x, min_y, min_z),
        Vec3::new(max_x, max_y, max_z),
    ))
}

fn read_triangles<'a>(
    line: usize,
    fields: impl Iterator<Item = &'a str>,
    triangle_count: usize,
) -> Result<Vec<TriangleId>> {
    let triangles = fields
        .map(|field| {
            let index: u32 = field.parse().map_err(|_| {
                Error::parse(line, format!("invalid triangle `{}`", field))
            })?;

            if index as usize >= triangle_count {
                return Err(Error::IndexOutOfRange {
                    line,
                    index,
                    triangle_count,
                });
            }

            Ok(TriangleId::new(index))
        })
        .collect::<Result<Vec<_>>>()?;

    if !(1..=LEAF_CAP).contains(&triangles.len()) {
        return Err(Error::parse(
            line,
            format!(
                "leaf holds {} triangles (expected 1..={})",
                triangles.len(),
                LEAF_CAP
            ),
        ));
    }

    Ok(triangles)
}

/// Reads a node id, returning it 0-based; `-1` stands for no node.
fn read_id<'a>(
    line: usize,
    fields: &mut impl Iterator<Item = &'a str>,
) -> Result<Option<usize>> {
    let field = read_field(line, fields)?;

    match field.parse::<i64>() {
        Ok(-1) => Ok(None),
        Ok(id) if id >= 1 => Ok(Some((id - 1) as usize)),
        _ => Err(Error::parse(line, format!("invalid node id `{}`", field))),
    }
}

fn apply_links(nodes: &mut [RawNode], links: Vec<RawLink>) -> Result<()> {
    let mut linked_at = FxHashMap::default();

    for link in links {
        let line = link.line;

        let Some(id) = link.id else {
            return Err(Error::parse(line, "linkage of a missing node"));
        };

        let node = nodes.get(id).ok_or_else(|| unknown_node(line, id))?;

        if let Some(prev_line) = linked_at.insert(id, line) {
            return Err(Error::parse(
                line,
                format!(
                    "node {} has already been linked at line {}",
                    id + 1,
                    prev_line
                ),
            ));
        }

        let children = match (node.is_leaf(), link.left_id, link.right_id) {
            (true, None, None) => None,

            (true, _, _) => {
                return Err(Error::parse(
                    line,
                    format!("leaf {} can't have children", id + 1),
                ));
            }

            (false, Some(left_id), Some(right_id)) => Some((left_id, right_id)),

            (false, _, _) => {
                return Err(Error::parse(
                    line,
                    format!("internal node {} is missing a child", id + 1),
                ));
            }
        };

        if let Some((left_id, right_id)) = children {
            for child_id in [left_id, right_id] {
                let child = nodes
                    .get_mut(child_id)
                    .ok_or_else(|| unknown_node(line, child_id))?;

                if child_id == 0 {
                    return Err(Error::parse(line, "root can't have a parent"));
                }

                if child.parent.is_some() {
                    return Err(Error::parse(
                        line,
                        format!("node {} has two parents", child_id + 1),
                    ));
                }

                child.parent = Some(id);
            }

            nodes[id].children = children;
        }
    }

    for (id, node) in nodes.iter().enumerate() {
        if !node.is_leaf() && node.children.is_none() {
            return Err(Error::parse(
                node.line,
                format!("internal node {} has no children", id + 1),
            ));
        }
    }

    Ok(())
}

fn unknown_node(line: usize, id: usize) -> Error {
    Error::parse(line, format!("unknown node {}", id + 1))
}

/// Turns linked nodes into the tree rooted at the first node.
fn assemble(nodes: &mut [RawNode]) -> Result<BvhNode> {
    // Every node has at most one parent and the root has none, so walking
    // from the root can't loop
    let mut reachable = vec![false; nodes.len()];
    let mut stack = vec![(0, 1)];

    while let Some((id, depth)) = stack.pop() {
        if depth > MAX_DEPTH {
            return Err(Error::parse(
                nodes[id].line,
                format!("tree is deeper than {} levels", MAX_DEPTH),
            ));
        }

        reachable[id] = true;

        if let Some((left_id, right_id)) = nodes[id].children {
            stack.push((left_id, depth + 1));
            stack.push((right_id, depth + 1));
        }
    }

    if let Some(id) = reachable.iter().position(|reachable| !reachable) {
        return Err(Error::parse(
            nodes[id].line,
            format!("node {} is unreachable from the root", id + 1),
        ));
    }

    assemble_node(nodes, 0)
}

fn assemble_node(nodes: &mut [RawNode], id: usize) -> Result<BvhNode> {
    let node = &mut nodes[id];
    let bounds = node.bounds;

    if let Some(triangles) = node.triangles.take() {
        return Ok(BvhNode::Leaf { bounds, triangles });
    }

    let Some((left_id, right_id)) = node.children else {
        return Err(Error::parse(
            node.line,
            format!("internal node {} has no children", id + 1),
        ));
    };

    let line = node.line;
    let left = assemble_node(nodes, left_id)?;
    let right = assemble_node(nodes, right_id)?;

    if bounds != left.bounds() + right.bounds() {
        return Err(Error::parse(
            line,
            format!(
                "bounds of internal node {} are not the union of its children",
                id + 1
            ),
        ));
    }

    Ok(BvhNode::Internal {
        bounds,
        left: Box::new(left),
        right: Box::new(right),
    })
}
