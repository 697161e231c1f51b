//! Repairs the structural invariants after edits and loads.
//!
//! Each pass inspects the tree and returns the ops for the first violation it
//! finds, walking bottom-up. The [`Normalizer`] applies them and restarts from
//! the first pass until every pass comes back empty.

use crate::ids::IdGenerator;
use crate::ops::{Op, Path, apply_op, child, sibling};
use crate::tree::{
    BlockListNode, BlockNode, Inline, LinkLeaf, ListStyle, Node, ParagraphNode, TextLeaf, Tree,
};

pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

pub trait NormalizePass: Send + Sync {
    fn id(&self) -> &'static str;
    fn run(&self, tree: &Tree, ids: &mut dyn IdGenerator) -> Vec<Op>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOutcome {
    pub ops_applied: usize,
    pub settled: bool,
}

pub struct Normalizer {
    passes: Vec<Box<dyn NormalizePass>>,
    max_iterations: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::core()
    }
}

impl Normalizer {
    pub fn empty() -> Self {
        Self {
            passes: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Structural passes first, so inline passes only see settled blocks.
    pub fn core() -> Self {
        let mut normalizer = Self::empty();
        normalizer.register(Box::new(MergeRootLists));
        normalizer.register(Box::new(WrapListChildren));
        normalizer.register(Box::new(RepairBlockShape));
        normalizer.register(Box::new(PruneEmptyLists));
        normalizer.register(Box::new(CanonicalInlines));
        normalizer
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn register(&mut self, pass: Box<dyn NormalizePass>) {
        self.passes.push(pass);
    }

    pub fn passes(&self) -> &[Box<dyn NormalizePass>] {
        &self.passes
    }

    /// Never fails: a tree that does not settle within the iteration budget
    /// is left as is and reported through `settled: false`.
    pub fn normalize(&self, tree: &mut Tree, ids: &mut dyn IdGenerator) -> NormalizeOutcome {
        let mut ops_applied = 0;
        for _ in 0..self.max_iterations {
            let Some((pass_id, ops)) = self
                .passes
                .iter()
                .map(|pass| (pass.id(), pass.run(tree, ids)))
                .find(|(_, ops)| !ops.is_empty())
            else {
                tracing::debug!(ops_applied, "tree settled");
                return NormalizeOutcome {
                    ops_applied,
                    settled: true,
                };
            };

            tracing::trace!(pass = pass_id, ops = ops.len(), "normalize pass fired");
            for op in ops {
                if let Err(err) = apply_op(tree, op) {
                    tracing::error!(pass = pass_id, %err, "normalize op failed");
                    return NormalizeOutcome {
                        ops_applied,
                        settled: false,
                    };
                }
                ops_applied += 1;
            }
        }

        tracing::error!(
            max_iterations = self.max_iterations,
            "normalization did not converge"
        );
        NormalizeOutcome {
            ops_applied,
            settled: false,
        }
    }
}

/// Post-order walk; stops at the first node for which `visit` yields ops.
fn first_bottom_up(
    children: &[Node],
    path: &mut Path,
    visit: &mut dyn FnMut(&Node, &[usize]) -> Option<Vec<Op>>,
) -> Option<Vec<Op>> {
    for (ix, node) in children.iter().enumerate() {
        path.push(ix);
        if let Some(grandchildren) = node.children() {
            if let Some(ops) = first_bottom_up(grandchildren, path, visit) {
                return Some(ops);
            }
        }
        if let Some(ops) = visit(node, path) {
            return Some(ops);
        }
        path.pop();
    }
    None
}

fn empty_block(ids: &mut dyn IdGenerator) -> Node {
    Node::Block(BlockNode::new(ids.block_id(), ParagraphNode::default()))
}

/// Ops that append every child of `list` to the list at `target`, which
/// currently holds `target_len` children.
fn append_children(list: &BlockListNode, target: &[usize], target_len: usize) -> Vec<Op> {
    list.children
        .iter()
        .enumerate()
        .map(|(n, node)| Op::InsertNode {
            path: child(target, target_len + n),
            node: node.clone(),
        })
        .collect()
}

/// The root holds exactly one block list; extras are merged into the first.
struct MergeRootLists;

impl NormalizePass for MergeRootLists {
    fn id(&self) -> &'static str {
        "core.merge_root_lists"
    }

    fn run(&self, tree: &Tree, ids: &mut dyn IdGenerator) -> Vec<Op> {
        let Some(first) = tree.children.first() else {
            return vec![Op::InsertNode {
                path: vec![0],
                node: Node::BlockList(BlockListNode {
                    id: ids.list_id(),
                    style: ListStyle::None,
                    children: vec![empty_block(ids)],
                }),
            }];
        };

        let Node::BlockList(root) = first else {
            return vec![
                Op::RemoveNode { path: vec![0] },
                Op::InsertNode {
                    path: vec![0],
                    node: Node::BlockList(BlockListNode {
                        id: ids.list_id(),
                        style: ListStyle::None,
                        children: vec![first.clone()],
                    }),
                },
            ];
        };

        match tree.children.get(1) {
            None => Vec::new(),
            Some(Node::BlockList(extra)) => {
                let mut ops = vec![Op::RemoveNode { path: vec![1] }];
                ops.extend(append_children(extra, &[0], root.children.len()));
                ops
            }
            Some(_) => vec![Op::MoveNode {
                path: vec![1],
                to: vec![0, root.children.len()],
            }],
        }
    }
}

/// A block list holds only blocks: stray paragraphs get wrapped, and a list
/// directly inside a list moves into the preceding block's nested slot.
struct WrapListChildren;

impl NormalizePass for WrapListChildren {
    fn id(&self) -> &'static str {
        "core.wrap_list_children"
    }

    fn run(&self, tree: &Tree, ids: &mut dyn IdGenerator) -> Vec<Op> {
        let mut visit = |node: &Node, path: &[usize]| -> Option<Vec<Op>> {
            let Node::BlockList(list) = node else {
                return None;
            };
            for (ix, entry) in list.children.iter().enumerate() {
                let at = child(path, ix);
                match entry {
                    Node::Block(_) => continue,
                    Node::Paragraph(p) => {
                        return Some(vec![
                            Op::RemoveNode { path: at.clone() },
                            Op::InsertNode {
                                path: at,
                                node: Node::Block(BlockNode::new(ids.block_id(), p.clone())),
                            },
                        ]);
                    }
                    Node::BlockList(inner) => {
                        let prev = ix.checked_sub(1).and_then(|p| list.children.get(p));
                        let Some(Node::Block(prev_block)) = prev else {
                            // Nothing to nest under: splice the items in place.
                            let mut ops = vec![Op::RemoveNode { path: at }];
                            ops.extend(inner.children.iter().enumerate().map(|(n, node)| {
                                Op::InsertNode {
                                    path: child(path, ix + n),
                                    node: node.clone(),
                                }
                            }));
                            return Some(ops);
                        };
                        let prev_path = child(path, ix - 1);
                        if let Some(nested) = prev_block.nested_list() {
                            let mut ops = vec![Op::RemoveNode { path: at }];
                            ops.extend(append_children(
                                inner,
                                &child(&prev_path, 1),
                                nested.children.len(),
                            ));
                            return Some(ops);
                        }
                        return Some(vec![Op::MoveNode {
                            path: at,
                            to: child(&prev_path, prev_block.children.len().min(1)),
                        }]);
                    }
                }
            }
            None
        };

        first_bottom_up(&tree.children, &mut Vec::new(), &mut visit).unwrap_or_default()
    }
}

/// Blocks are `[paragraph]` or `[paragraph, block_list]`. Anything else is
/// relocated into a sibling block right after the current one.
struct RepairBlockShape;

impl RepairBlockShape {
    fn relocate(node: &Node, ids: &mut dyn IdGenerator) -> Node {
        match node {
            Node::Block(block) => Node::Block(block.clone()),
            Node::Paragraph(p) => Node::Block(BlockNode::new(ids.block_id(), p.clone())),
            Node::BlockList(list) => Node::Block(BlockNode::with_list(
                ids.block_id(),
                ParagraphNode::default(),
                list.clone(),
            )),
        }
    }
}

impl NormalizePass for RepairBlockShape {
    fn id(&self) -> &'static str {
        "core.repair_block_shape"
    }

    fn run(&self, tree: &Tree, ids: &mut dyn IdGenerator) -> Vec<Op> {
        let mut visit = |node: &Node, path: &[usize]| -> Option<Vec<Op>> {
            let Node::Block(block) = node else {
                return None;
            };
            let Some(&block_ix) = path.last() else {
                return None;
            };
            let next_sibling = sibling(path, block_ix + 1);

            match block.children.as_slice() {
                [] | [Node::BlockList(_)] => {
                    return Some(vec![Op::InsertNode {
                        path: child(path, 0),
                        node: Node::Paragraph(ParagraphNode::default()),
                    }]);
                }
                [Node::Paragraph(_)] | [Node::Paragraph(_), Node::BlockList(_)] => return None,
                _ => {}
            }

            // Last offending child first, so repeated moves keep their order.
            let offending = block
                .children
                .iter()
                .enumerate()
                .rev()
                .find(|&(ix, node)| {
                    !matches!((ix, node), (0, Node::Paragraph(_)) | (1, Node::BlockList(_)))
                })
                .map(|(ix, _)| ix)?;

            let at = child(path, offending);
            Some(match &block.children[offending] {
                Node::Block(_) => vec![Op::MoveNode {
                    path: at,
                    to: next_sibling,
                }],
                other => vec![
                    Op::RemoveNode { path: at },
                    Op::InsertNode {
                        path: next_sibling,
                        node: Self::relocate(other, ids),
                    },
                ],
            })
        };

        first_bottom_up(&tree.children, &mut Vec::new(), &mut visit).unwrap_or_default()
    }
}

/// Nested lists never stay empty; the root list always keeps one block.
struct PruneEmptyLists;

impl NormalizePass for PruneEmptyLists {
    fn id(&self) -> &'static str {
        "core.prune_empty_lists"
    }

    fn run(&self, tree: &Tree, ids: &mut dyn IdGenerator) -> Vec<Op> {
        let mut visit = |node: &Node, path: &[usize]| -> Option<Vec<Op>> {
            match node {
                Node::BlockList(list) if list.children.is_empty() => {
                    if path.len() == 1 {
                        Some(vec![Op::InsertNode {
                            path: child(path, 0),
                            node: empty_block(ids),
                        }])
                    } else {
                        Some(vec![Op::RemoveNode {
                            path: path.to_vec(),
                        }])
                    }
                }
                _ => None,
            }
        };

        first_bottom_up(&tree.children, &mut Vec::new(), &mut visit).unwrap_or_default()
    }
}

/// Keeps paragraph leaves canonical: at least one leaf, no empty text next to
/// other content, adjacent equal-mark text merged, no empty links, and
/// adjacent links with the same id merged.
struct CanonicalInlines;

impl NormalizePass for CanonicalInlines {
    fn id(&self) -> &'static str {
        "core.canonical_inlines"
    }

    fn run(&self, tree: &Tree, _ids: &mut dyn IdGenerator) -> Vec<Op> {
        // SetInlines never shifts paths, so every paragraph is fixed at once.
        let mut ops = Vec::new();
        let mut visit = |node: &Node, path: &[usize]| -> Option<Vec<Op>> {
            if let Node::Paragraph(p) = node {
                let canonical = canonical_inlines(&p.children);
                if canonical != p.children {
                    ops.push(Op::SetInlines {
                        path: path.to_vec(),
                        children: canonical,
                    });
                }
            }
            None
        };
        first_bottom_up(&tree.children, &mut Vec::new(), &mut visit);
        ops
    }
}

fn canonical_text(leaves: Vec<TextLeaf>) -> Vec<TextLeaf> {
    let mut out: Vec<TextLeaf> = Vec::with_capacity(leaves.len());
    for leaf in leaves.into_iter().filter(|l| !l.text.is_empty()) {
        match out.last_mut() {
            Some(prev) if prev.marks == leaf.marks => prev.text.push_str(&leaf.text),
            _ => out.push(leaf),
        }
    }
    out
}

pub(crate) fn canonical_inlines(children: &[Inline]) -> Vec<Inline> {
    let all_empty_text = children
        .iter()
        .all(|c| matches!(c, Inline::Text(t) if t.text.is_empty()));
    // Marks on an empty paragraph have no run to be saved in.
    if all_empty_text {
        return vec![Inline::Text(TextLeaf::default())];
    }

    let mut out: Vec<Inline> = Vec::with_capacity(children.len());
    for inline in children {
        match inline {
            Inline::Text(t) if t.text.is_empty() => {}
            Inline::Text(t) => match out.last_mut() {
                Some(Inline::Text(prev)) if prev.marks == t.marks => prev.text.push_str(&t.text),
                _ => out.push(Inline::Text(t.clone())),
            },
            Inline::Link(link) => {
                let text = canonical_text(link.children.clone());
                if text.is_empty() {
                    continue;
                }
                match out.last_mut() {
                    Some(Inline::Link(prev)) if prev.id == link.id && prev.url == link.url => {
                        let mut merged = std::mem::take(&mut prev.children);
                        merged.extend(text);
                        prev.children = canonical_text(merged);
                    }
                    _ => out.push(Inline::Link(LinkLeaf {
                        id: link.id.clone(),
                        url: link.url.clone(),
                        children: text,
                    })),
                }
            }
            Inline::Quote(_) | Inline::Image(_) => out.push(inline.clone()),
        }
    }

    if out.is_empty() {
        out.push(Inline::Text(TextLeaf::default()));
    }
    out
}
