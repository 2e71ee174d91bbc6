use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::{BvhNode, Error, Result};

/// Writes the tree in the textual `.bvh` format.
///
/// Nodes are written depth-first, parents before children, as `n` (internal
/// node) and `l` (leaf) records; they are implicitly numbered from 1 in that
/// order. Linkage follows as one `t <id> <left> <right>` record per node,
/// with `-1` standing for no child:
///
/// ```text
/// n 0 0 0 2 2 2
/// l 0 0 0 1 1 1 0 1
/// l 1 1 1 2 2 2 2
/// t 1 2 3
/// t 2 -1 -1
/// t 3 -1 -1
/// ```
pub fn write(mut out: impl Write, root: &BvhNode) -> io::Result<()> {
    let mut links = Vec::new();

    write_node(&mut out, root, &mut links)?;

    for (idx, (left_id, right_id)) in links.into_iter().enumerate() {
        writeln!(out, "t {} {} {}", idx + 1, left_id, right_id)?;
    }

    Ok(())
}

/// Writes the tree into given file, replacing it if it already exists.
///
/// See: [`write()`].
pub fn save(path: impl AsRef<Path>, root: &BvhNode) -> Result<()> {
    let path = path.as_ref();

    let file = File::create(path).map_err(|err| Error::io(path, err))?;
    let mut file = BufWriter::new(file);

    write(&mut file, root)
        .and_then(|_| file.flush())
        .map_err(|err| Error::io(path, err))?;

    log::info!(
        "Saved tree to {}: nodes={}, leaves={}",
        path.display(),
        root.node_count(),
        root.leaf_count(),
    );

    Ok(())
}

fn write_node<W>(
    out: &mut W,
    node: &BvhNode,
    links: &mut Vec<(i64, i64)>,
) -> io::Result<i64>
where
    W: Write,
{
    let id = links.len() as i64 + 1;
    let bounds = node.bounds();
    let (min, max) = (bounds.min(), bounds.max());

    links.push((-1, -1));

    match node {
        BvhNode::Internal { left, right, .. } => {
            writeln!(
                out,
                "n {} {} {} {} {} {}",
                min.x, min.y, min.z, max.x, max.y, max.z
            )?;

            let left_id = write_node(out, left, links)?;
            let right_id = write_node(out, right, links)?;

            links[(id - 1) as usize] = (left_id, right_id);
        }

        BvhNode::Leaf { triangles, .. } => {
            write!(
                out,
                "l {} {} {} {} {} {}",
                min.x, min.y, min.z, max.x, max.y, max.z
            )?;

            for triangle_id in triangles {
                write!(out, " {}", triangle_id)?;
            }

            writeln!(out)?;
        }
    }

    Ok(id)
}
