use serde::{Deserialize, Serialize};

use crate::error::PathError;
use crate::tree::{Inline, ListStyle, Node, Tree};

pub type Path = Vec<usize>;

/// A caret: the path of a block plus a byte offset into its paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Path,
    #[serde(default)]
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self { path, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// Anchor and focus in document order.
    pub fn ordered(&self) -> (&Point, &Point) {
        let anchor_first = (&self.anchor.path, self.anchor.offset) <= (&self.focus.path, self.focus.offset);
        if anchor_first {
            (&self.anchor, &self.focus)
        } else {
            (&self.focus, &self.anchor)
        }
    }
}

/// Structural edits emitted by normalization passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    InsertNode {
        #[serde(default)]
        path: Path,
        node: Node,
    },
    RemoveNode {
        #[serde(default)]
        path: Path,
    },
    /// Removes the node at `path`, then inserts it at `to`, which is read
    /// against the tree after the removal.
    MoveNode {
        #[serde(default)]
        path: Path,
        to: Path,
    },
    SetInlines {
        #[serde(default)]
        path: Path,
        children: Vec<Inline>,
    },
    SetListStyle {
        #[serde(default)]
        path: Path,
        style: ListStyle,
    },
}

pub fn apply_op(tree: &mut Tree, op: Op) -> Result<(), PathError> {
    tracing::trace!(?op, "apply op");
    match op {
        Op::InsertNode { path, node } => insert_node(tree, &path, node),
        Op::RemoveNode { path } => remove_node(tree, &path).map(|_| ()),
        Op::MoveNode { path, to } => {
            let node = remove_node(tree, &path)?;
            insert_node(tree, &to, node)
        }
        Op::SetInlines { path, children } => match node_mut(tree, &path)? {
            Node::Paragraph(p) => {
                p.children = children;
                Ok(())
            }
            other => Err(PathError(format!("Expected paragraph, found {}", other.kind()))),
        },
        Op::SetListStyle { path, style } => match node_mut(tree, &path)? {
            Node::BlockList(list) => {
                list.style = style;
                Ok(())
            }
            other => Err(PathError(format!("Expected block list, found {}", other.kind()))),
        },
    }
}

pub fn node_ref<'a>(tree: &'a Tree, path: &[usize]) -> Option<&'a Node> {
    let (&first, rest) = path.split_first()?;
    let mut node = tree.children.get(first)?;
    for &ix in rest {
        node = node.children()?.get(ix)?;
    }
    Some(node)
}

pub fn node_mut<'a>(tree: &'a mut Tree, path: &[usize]) -> Result<&'a mut Node, PathError> {
    let Some((&first, rest)) = path.split_first() else {
        return Err(PathError("Empty path".into()));
    };

    let len = tree.children.len();
    let mut node = tree
        .children
        .get_mut(first)
        .ok_or_else(|| out_of_bounds(0, first, len))?;

    for (depth, &ix) in rest.iter().enumerate() {
        let children = node
            .children_mut()
            .ok_or_else(|| PathError(format!("Non-container node at depth {depth}")))?;
        let len = children.len();
        node = children
            .get_mut(ix)
            .ok_or_else(|| out_of_bounds(depth + 1, ix, len))?;
    }
    Ok(node)
}

/// The child vector addressed by `parent_path`; the empty path is the root.
pub fn children_mut<'a>(tree: &'a mut Tree, parent_path: &[usize]) -> Result<&'a mut Vec<Node>, PathError> {
    if parent_path.is_empty() {
        return Ok(&mut tree.children);
    }
    node_mut(tree, parent_path)?
        .children_mut()
        .ok_or_else(|| PathError("Parent is not a container".into()))
}

pub fn insert_node(tree: &mut Tree, path: &[usize], node: Node) -> Result<(), PathError> {
    let Some((&index, parent_path)) = path.split_last() else {
        return Err(PathError("Empty insert path".into()));
    };
    let children = children_mut(tree, parent_path)?;
    if index > children.len() {
        return Err(PathError(format!(
            "Insert index out of bounds: {index} > {}",
            children.len()
        )));
    }
    children.insert(index, node);
    Ok(())
}

pub fn remove_node(tree: &mut Tree, path: &[usize]) -> Result<Node, PathError> {
    let Some((&index, parent_path)) = path.split_last() else {
        return Err(PathError("Empty remove path".into()));
    };
    let children = children_mut(tree, parent_path)?;
    if index >= children.len() {
        return Err(PathError(format!(
            "Remove index out of bounds: {index} >= {}",
            children.len()
        )));
    }
    Ok(children.remove(index))
}

/// `path` with its last index replaced by `index`.
pub fn sibling(path: &[usize], index: usize) -> Path {
    let mut out = path.to_vec();
    if let Some(last) = out.last_mut() {
        *last = index;
    }
    out
}

pub fn child(path: &[usize], index: usize) -> Path {
    let mut out = path.to_vec();
    out.push(index);
    out
}

fn out_of_bounds(depth: usize, ix: usize, len: usize) -> PathError {
    PathError(format!("Path out of bounds at depth {depth}: {ix} >= {len}"))
}
