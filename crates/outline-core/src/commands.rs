//! Structural edit commands.
//!
//! Each command edits the tree in place and returns the caret after the edit.
//! Commands may leave the tree transiently malformed (an emptied nested list,
//! an empty paragraph); the normalizer is expected to run right after.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::EditError;
use crate::ids::IdGenerator;
use crate::ops::{
    Path, Point, Selection, child, insert_node, node_mut, node_ref, remove_node, sibling,
};
use crate::tree::{BlockListNode, BlockNode, ListStyle, Node, ParagraphNode, Tree};

/// Inbound edit command, as the editing surface sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Command {
    Split { cursor: Point },
    Outdent { cursor: Point },
    Indent { cursor: Point },
    MergeBackspace { cursor: Point },
    DeleteFragment { selection: Selection },
    InsertText { cursor: Point, text: String },
    /// The text between block start and cursor was typed as a list trigger.
    ListShortcut { cursor: Point },
}

impl Command {
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Split { .. } => "split",
            Command::Outdent { .. } => "outdent",
            Command::Indent { .. } => "indent",
            Command::MergeBackspace { .. } => "mergeBackspace",
            Command::DeleteFragment { .. } => "deleteFragment",
            Command::InsertText { .. } => "insertText",
            Command::ListShortcut { .. } => "listShortcut",
        }
    }
}

pub fn apply_command(
    tree: &mut Tree,
    command: &Command,
    ids: &mut dyn IdGenerator,
) -> Result<Point, EditError> {
    tracing::debug!(kind = command.kind(), "apply command");
    match command {
        Command::Split { cursor } => split(tree, cursor, ids),
        Command::Outdent { cursor } => outdent(tree, cursor, ids),
        Command::Indent { cursor } => indent(tree, cursor, ids),
        Command::MergeBackspace { cursor } => merge_backspace(tree, cursor, ids),
        Command::DeleteFragment { selection } => delete_fragment(tree, selection, ids),
        Command::InsertText { cursor, text } => insert_text(tree, cursor, text),
        Command::ListShortcut { cursor } => list_shortcut(tree, cursor, ids),
    }
}

fn block_ref<'a>(tree: &'a Tree, path: &[usize]) -> Result<&'a BlockNode, EditError> {
    match node_ref(tree, path) {
        Some(Node::Block(block)) => Ok(block),
        _ => Err(EditError::NotABlock {
            path: path.to_vec(),
        }),
    }
}

fn block_mut<'a>(tree: &'a mut Tree, path: &[usize]) -> Result<&'a mut BlockNode, EditError> {
    match node_mut(tree, path)? {
        Node::Block(block) => Ok(block),
        _ => Err(EditError::NotABlock {
            path: path.to_vec(),
        }),
    }
}

fn list_mut<'a>(tree: &'a mut Tree, path: &[usize]) -> Result<&'a mut BlockListNode, EditError> {
    match node_mut(tree, path)? {
        Node::BlockList(list) => Ok(list),
        _ => Err(EditError::NotAList {
            path: path.to_vec(),
        }),
    }
}

fn paragraph_mut<'a>(tree: &'a mut Tree, path: &[usize]) -> Result<&'a mut ParagraphNode, EditError> {
    block_mut(tree, path)?
        .paragraph_mut()
        .ok_or_else(|| EditError::NotABlock {
            path: path.to_vec(),
        })
}

/// Splits a block path into its list path and its index in that list.
fn list_position(path: &[usize]) -> Result<(&[usize], usize), EditError> {
    match path.split_last() {
        Some((&ix, list_path)) if !list_path.is_empty() => Ok((list_path, ix)),
        _ => Err(EditError::NotABlock {
            path: path.to_vec(),
        }),
    }
}

/// For a block inside a nested list, the list path and the owning block's
/// list path and index. `None` at the top level.
fn nesting(list_path: &[usize]) -> Option<(&[usize], usize)> {
    if list_path.len() < 3 {
        return None;
    }
    let parent_block = &list_path[..list_path.len() - 1];
    parent_block
        .split_last()
        .map(|(&parent_ix, grand_list)| (grand_list, parent_ix))
}

/// Enter. At the start a new empty block goes before, at the end one goes
/// after; in between the paragraph splits and the tail takes the nested list.
/// An empty block inside a nested list is outdented instead.
pub fn split(tree: &mut Tree, at: &Point, ids: &mut dyn IdGenerator) -> Result<Point, EditError> {
    let (list_path, ix) = list_position(&at.path)?;
    let block = block_mut(tree, &at.path)?;
    let Some(paragraph) = block.paragraph_mut() else {
        return Err(EditError::NotABlock {
            path: at.path.clone(),
        });
    };
    if paragraph.is_empty() && nesting(list_path).is_some() {
        return outdent(tree, at, ids);
    }
    let offset = paragraph.clamp_offset(at.offset);

    if offset == 0 {
        let empty = BlockNode::new(ids.block_id(), ParagraphNode::default());
        insert_node(tree, &at.path, Node::Block(empty))?;
        return Ok(Point::new(sibling(&at.path, ix + 1), 0));
    }

    let new_block = if offset == paragraph.len() {
        BlockNode::new(ids.block_id(), ParagraphNode::default())
    } else {
        let tail = paragraph.split_off(offset);
        let mut new_block = BlockNode::new(ids.block_id(), tail);
        if let Some(nested) = block.take_nested_list() {
            new_block.children.push(Node::BlockList(nested));
        }
        new_block
    };

    let next = sibling(&at.path, ix + 1);
    insert_node(tree, &next, Node::Block(new_block))?;
    Ok(Point::new(next, 0))
}

/// Promotes a block to follow its parent block. Later siblings become the
/// tail of the promoted block's nested list. No-op at the top level.
pub fn outdent(tree: &mut Tree, at: &Point, ids: &mut dyn IdGenerator) -> Result<Point, EditError> {
    block_ref(tree, &at.path)?;
    let (list_path, ix) = list_position(&at.path)?;
    let Some((grand_list, parent_ix)) = nesting(list_path) else {
        tracing::warn!(path = ?at.path, "outdent ignored at the top level");
        return Ok(at.clone());
    };

    let list = list_mut(tree, list_path)?;
    let style = list.style;
    let mut moved = list.children.split_off(ix);
    let Node::Block(mut block) = moved.remove(0) else {
        return Err(EditError::NotABlock {
            path: at.path.clone(),
        });
    };
    block.append_to_nested_list(moved, style, ids);

    let target = child(grand_list, parent_ix + 1);
    insert_node(tree, &target, Node::Block(block))?;
    Ok(Point::new(target, at.offset))
}

/// Moves a block to the end of its previous sibling's nested list. No-op for
/// the first block of a list.
pub fn indent(tree: &mut Tree, at: &Point, ids: &mut dyn IdGenerator) -> Result<Point, EditError> {
    block_ref(tree, &at.path)?;
    let (list_path, _) = list_position(&at.path)?;
    let style = list_mut(tree, list_path)?.style;
    nest_under_previous(tree, at, style, ids)
}

fn nest_under_previous(
    tree: &mut Tree,
    at: &Point,
    style: ListStyle,
    ids: &mut dyn IdGenerator,
) -> Result<Point, EditError> {
    let (list_path, ix) = list_position(&at.path)?;
    if ix == 0 {
        tracing::warn!(path = ?at.path, "nothing to nest under");
        return Ok(at.clone());
    }
    let prev_path = sibling(&at.path, ix - 1);
    block_ref(tree, &prev_path)?;

    let list = list_mut(tree, list_path)?;
    let node = list.children.remove(ix);
    let Some(Node::Block(prev)) = list.children.get_mut(ix - 1) else {
        return Err(EditError::NotABlock { path: prev_path });
    };
    let nested_len = prev.nested_list().map_or(0, |l| l.children.len());
    prev.append_to_nested_list(vec![node], style, ids);

    Ok(Point::new(
        child(&child(&prev_path, 1), nested_len),
        at.offset,
    ))
}

/// Backspace. Inside a paragraph it deletes one character. At the block
/// start it collapses a single-item nested list, outdents other nested
/// blocks, and merges top-level blocks into their previous sibling.
pub fn merge_backspace(
    tree: &mut Tree,
    at: &Point,
    ids: &mut dyn IdGenerator,
) -> Result<Point, EditError> {
    let paragraph = paragraph_mut(tree, &at.path)?;
    let offset = paragraph.clamp_offset(at.offset);
    if offset > 0 {
        let next = paragraph.delete_backward(offset);
        return Ok(Point::new(at.path.clone(), next));
    }

    let (list_path, ix) = list_position(&at.path)?;
    if let Some((grand_list, parent_ix)) = nesting(list_path) {
        if list_mut(tree, list_path)?.children.len() == 1 {
            let parent_path = child(grand_list, parent_ix);
            let Some(nested) = block_mut(tree, &parent_path)?.take_nested_list() else {
                return Err(EditError::NotAList {
                    path: list_path.to_vec(),
                });
            };
            let target = child(grand_list, parent_ix + 1);
            for (n, node) in nested.children.into_iter().enumerate() {
                insert_node(tree, &sibling(&target, parent_ix + 1 + n), node)?;
            }
            return Ok(Point::new(target, 0));
        }
        return outdent(tree, &Point::new(at.path.clone(), 0), ids);
    }

    if ix == 0 {
        return Ok(Point::new(at.path.clone(), 0));
    }

    let prev_path = sibling(&at.path, ix - 1);
    block_ref(tree, &prev_path)?;
    let list = list_mut(tree, list_path)?;
    let Node::Block(mut current) = list.children.remove(ix) else {
        return Err(EditError::NotABlock {
            path: at.path.clone(),
        });
    };
    let Some(Node::Block(prev)) = list.children.get_mut(ix - 1) else {
        return Err(EditError::NotABlock { path: prev_path });
    };

    let content = current.paragraph_mut().map(std::mem::take).unwrap_or_default();
    let Some(prev_paragraph) = prev.paragraph_mut() else {
        return Err(EditError::NotABlock { path: prev_path });
    };
    let join = prev_paragraph.len();
    prev_paragraph.append(content);

    if let Some(nested) = current.take_nested_list() {
        prev.append_to_nested_list(nested.children, nested.style, ids);
    }
    Ok(Point::new(prev_path, join))
}

fn parent_block_path(path: &[usize]) -> Option<&[usize]> {
    (path.len() >= 4).then(|| &path[..path.len() - 2])
}

/// Deletes a selection. Within one block this is a text delete. Across
/// blocks the start paragraph keeps its head, takes the end paragraph's
/// tail, and adopts the nested children of every deleted block.
pub fn delete_fragment(
    tree: &mut Tree,
    selection: &Selection,
    ids: &mut dyn IdGenerator,
) -> Result<Point, EditError> {
    let (start, end) = selection.ordered();

    if start.path == end.path {
        let paragraph = paragraph_mut(tree, &start.path)?;
        let from = paragraph.clamp_offset(start.offset);
        let to = paragraph.clamp_offset(end.offset);
        paragraph.delete_range(from, to);
        return Ok(Point::new(start.path.clone(), from));
    }

    let start_offset = block_ref(tree, &start.path)?
        .paragraph()
        .map_or(0, |p| p.clamp_offset(start.offset));
    let tail = {
        let mut end_paragraph = block_ref(tree, &end.path)?
            .paragraph()
            .cloned()
            .unwrap_or_default();
        let end_offset = end_paragraph.clamp_offset(end.offset);
        end_paragraph.split_off(end_offset)
    };

    let order: Vec<Path> = tree.blocks_in_order().into_iter().map(|(p, _)| p).collect();
    let (Some(s_ix), Some(e_ix)) = (
        order.iter().position(|p| *p == start.path),
        order.iter().position(|p| *p == end.path),
    ) else {
        return Err(EditError::NotABlock {
            path: end.path.clone(),
        });
    };

    let covered: HashSet<&[usize]> = order[s_ix + 1..=e_ix].iter().map(Vec::as_slice).collect();
    let deleted: Vec<&[usize]> = order[s_ix + 1..=e_ix]
        .iter()
        .map(Vec::as_slice)
        .filter(|p| {
            parent_block_path(p).is_none_or(|parent| !covered.contains(parent))
                || end.path.starts_with(p)
        })
        .collect();
    let deleted_set: HashSet<&[usize]> = deleted.iter().copied().collect();

    let mut survivors: Vec<(Path, Node, ListStyle)> = Vec::new();
    for path in &deleted {
        let Some(nested) = tree.block(path).and_then(BlockNode::nested_list) else {
            continue;
        };
        for (j, node) in nested.children.iter().enumerate() {
            let node_path = child(&child(path, 1), j);
            if !deleted_set.contains(node_path.as_slice()) {
                survivors.push((node_path, node.clone(), nested.style));
            }
        }
    }
    survivors.sort_by(|a, b| a.0.cmp(&b.0));

    let mut roots: Vec<Path> = deleted
        .iter()
        .filter(|p| parent_block_path(p).is_none_or(|parent| !deleted_set.contains(parent)))
        .map(|p| p.to_vec())
        .collect();
    roots.sort();
    tracing::debug!(
        deleted = deleted.len(),
        survivors = survivors.len(),
        "delete fragment"
    );
    for path in roots.iter().rev() {
        remove_node(tree, path)?;
    }

    let block = block_mut(tree, &start.path)?;
    let Some(paragraph) = block.paragraph_mut() else {
        return Err(EditError::NotABlock {
            path: start.path.clone(),
        });
    };
    paragraph.split_off(start_offset);
    paragraph.append(tail);

    let first_style = survivors.first().map(|(_, _, style)| *style);
    if let Some(style) = first_style {
        let adopted: Vec<Node> = survivors.into_iter().map(|(_, node, _)| node).collect();
        match block.nested_list_mut() {
            Some(list) => {
                let rest = std::mem::replace(&mut list.children, adopted);
                list.children.extend(rest);
            }
            None => block.append_to_nested_list(adopted, style, ids),
        }
    }

    Ok(Point::new(start.path.clone(), start_offset))
}

pub fn insert_text(tree: &mut Tree, at: &Point, text: &str) -> Result<Point, EditError> {
    let paragraph = paragraph_mut(tree, &at.path)?;
    let next = paragraph.insert_text(at.offset, text);
    Ok(Point::new(at.path.clone(), next))
}

fn shortcut_style(trigger: &str) -> Option<ListStyle> {
    match trigger {
        "-" | "*" | "+" => Some(ListStyle::Bullet),
        _ => {
            let digits = trigger.strip_suffix('.')?;
            (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
                .then_some(ListStyle::Number)
        }
    }
}

/// Markdown-style list trigger (`-`, `*`, `+`, `1.`) typed at a block start.
/// The trigger text goes away; the first block of a list restyles the list,
/// any other block nests under its previous sibling.
pub fn list_shortcut(
    tree: &mut Tree,
    at: &Point,
    ids: &mut dyn IdGenerator,
) -> Result<Point, EditError> {
    let paragraph = paragraph_mut(tree, &at.path)?;
    let offset = paragraph.clamp_offset(at.offset);
    let mut head = paragraph.clone();
    head.split_off(offset);
    let only_text = head.children.len() <= 1;

    let Some(style) = shortcut_style(head.text().trim_end()).filter(|_| only_text) else {
        return Ok(at.clone());
    };
    paragraph.delete_range(0, offset);

    let at = Point::new(at.path.clone(), 0);
    let (list_path, ix) = list_position(&at.path)?;
    if ix == 0 {
        list_mut(tree, list_path)?.style = style;
        return Ok(at);
    }
    nest_under_previous(tree, &at, style, ids)
}
