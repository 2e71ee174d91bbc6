use std::fmt;

use super::LEAF_CAP;
use crate::{BoundingBox, TriangleId};

#[derive(Clone, Debug, PartialEq)]
pub enum BvhNode {
    Internal {
        bounds: BoundingBox,
        left: Box<Self>,
        right: Box<Self>,
    },

    Leaf {
        bounds: BoundingBox,
        triangles: Vec<TriangleId>,
    },
}

impl BvhNode {
    /// Creates an internal node spanning both children.
    pub fn internal(left: Self, right: Self) -> Self {
        Self::Internal {
            bounds: left.bounds() + right.bounds(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn bounds(&self) -> BoundingBox {
        match self {
            BvhNode::Internal { bounds, .. } => *bounds,
            BvhNode::Leaf { bounds, .. } => *bounds,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, BvhNode::Leaf { .. })
    }

    pub fn children(&self) -> Option<(&Self, &Self)> {
        if let BvhNode::Internal { left, right, .. } = self {
            Some((left.as_ref(), right.as_ref()))
        } else {
            None
        }
    }

    /// Returns all leaves, depth-first, left to right.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves { stack: vec![self] }
    }

    /// Returns all triangles referenced by the leaves, depth-first, left to
    /// right.
    pub fn triangle_ids(&self) -> impl Iterator<Item = TriangleId> + '_ {
        self.leaves()
            .flat_map(|(_, triangles)| triangles.iter().copied())
    }

    pub fn node_count(&self) -> usize {
        match self {
            BvhNode::Internal { left, right, .. } => {
                1 + left.node_count() + right.node_count()
            }
            BvhNode::Leaf { .. } => 1,
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    pub fn depth(&self) -> usize {
        match self {
            BvhNode::Internal { left, right, .. } => {
                1 + left.depth().max(right.depth())
            }
            BvhNode::Leaf { .. } => 1,
        }
    }

    /// Shifts every triangle referenced by this tree by `by`.
    ///
    /// Consumes the tree, so the shift can't be applied twice to the same
    /// instance by accident.
    pub fn offset(self, by: u32) -> Self {
        match self {
            BvhNode::Internal {
                bounds,
                left,
                right,
            } => BvhNode::Internal {
                bounds,
                left: Box::new(left.offset(by)),
                right: Box::new(right.offset(by)),
            },

            BvhNode::Leaf { bounds, triangles } => BvhNode::Leaf {
                bounds,
                triangles: triangles
                    .into_iter()
                    .map(|triangle_id| triangle_id.offset(by))
                    .collect(),
            },
        }
    }

    /// Panics if the tree is corrupted, i.e. if any internal node's bounds
    /// differ from the union of its children's bounds or if any leaf holds
    /// zero or more than [`LEAF_CAP`] triangles.
    pub fn validate(&self) {
        match self {
            BvhNode::Internal {
                bounds,
                left,
                right,
            } => {
                assert_eq!(
                    *bounds,
                    left.bounds() + right.bounds(),
                    "internal node's bounds are not the union of its children"
                );

                left.validate();
                right.validate();
            }

            BvhNode::Leaf { triangles, .. } => {
                assert!(
                    (1..=LEAF_CAP).contains(&triangles.len()),
                    "leaf holds {} triangles (expected 1..={})",
                    triangles.len(),
                    LEAF_CAP,
                );
            }
        }
    }

    /// Dumps the tree into the log, one line per entry.
    pub fn print(&self) {
        for line in self.to_string().lines() {
            log::debug!("{}", line);
        }
    }

    fn fmt_ex(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = depth * 2;
        let bounds = self.bounds();
        let (min, max) = (bounds.min(), bounds.max());

        let kind = if self.is_leaf() { "BvhLeaf" } else { "BvhNode" };

        writeln!(f, "{:indent$}{}", "", kind)?;
        writeln!(f, "{:indent$}min: {} {} {}", "", min.x, min.y, min.z)?;
        writeln!(f, "{:indent$}max: {} {} {}", "", max.x, max.y, max.z)?;

        match self {
            BvhNode::Internal { left, right, .. } => {
                left.fmt_ex(f, depth + 1)?;
                right.fmt_ex(f, depth + 1)?;
            }

            BvhNode::Leaf { triangles, .. } => {
                writeln!(
                    f,
                    "{:indent$}num_triangles: {}",
                    "",
                    triangles.len()
                )?;
                write!(f, "{:indent$}", "")?;

                for (idx, triangle_id) in triangles.iter().enumerate() {
                    if idx > 0 {
                        write!(f, " ")?;
                    }

                    write!(f, "{}", triangle_id)?;
                }

                writeln!(f)?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for BvhNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_ex(f, 0)
    }
}

pub struct Leaves<'a> {
    stack: Vec<&'a BvhNode>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = (BoundingBox, &'a [TriangleId]);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                BvhNode::Internal { left, right, .. } => {
                    self.stack.push(right);
                    self.stack.push(left);
                }

                BvhNode::Leaf { bounds, triangles } => {
                    return Some((*bounds, triangles.as_slice()));
                }
            }
        }

        None
    }
}
