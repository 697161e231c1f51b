use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::InvariantViolation;
use crate::ids::IdGenerator;
use crate::ops::Path;

pub type BlockId = String;

/// Marker style of a block list. Serialized the way the document wire format
/// spells it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListStyle {
    #[default]
    None,
    Bullet,
    Number,
}

/// The editing representation. A settled tree has exactly one root child,
/// a [`BlockListNode`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tree {
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    BlockList(BlockListNode),
    Block(BlockNode),
    Paragraph(ParagraphNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockListNode {
    pub id: String,
    #[serde(default)]
    pub style: ListStyle,
    #[serde(default)]
    pub children: Vec<Node>,
}

/// One outline item: `[Paragraph]` or `[Paragraph, BlockList]` once settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockNode {
    pub id: BlockId,
    #[serde(default)]
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParagraphNode {
    #[serde(default)]
    pub children: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text(TextLeaf),
    Link(LinkLeaf),
    Quote(QuoteLeaf),
    Image(ImageLeaf),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Marks {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default)]
    pub blockquote: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextLeaf {
    pub text: String,
    #[serde(default)]
    pub marks: Marks,
}

/// Inline container. Owns its text children exclusively.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinkLeaf {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub children: Vec<TextLeaf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuoteLeaf {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageLeaf {
    pub url: String,
    #[serde(default)]
    pub alt_text: String,
}

impl Tree {
    pub fn new(root: BlockListNode) -> Self {
        Self {
            children: vec![Node::BlockList(root)],
        }
    }

    /// A fresh document: one root list holding one empty block.
    pub fn with_default_block(ids: &mut dyn IdGenerator) -> Self {
        let block = BlockNode::new(ids.block_id(), ParagraphNode::default());
        Self::new(BlockListNode::new(ids.list_id(), ListStyle::None, vec![block]))
    }

    pub fn root(&self) -> Option<&BlockListNode> {
        match self.children.first() {
            Some(Node::BlockList(list)) => Some(list),
            _ => None,
        }
    }

    pub fn block(&self, path: &[usize]) -> Option<&BlockNode> {
        match crate::ops::node_ref(self, path) {
            Some(Node::Block(block)) => Some(block),
            _ => None,
        }
    }

    /// Every block with its path, in document (pre-)order.
    pub fn blocks_in_order(&self) -> Vec<(Path, &BlockNode)> {
        fn walk<'a>(children: &'a [Node], path: &mut Path, out: &mut Vec<(Path, &'a BlockNode)>) {
            for (ix, node) in children.iter().enumerate() {
                path.push(ix);
                match node {
                    Node::Block(block) => {
                        out.push((path.clone(), block));
                        walk(&block.children, path, out);
                    }
                    Node::BlockList(list) => walk(&list.children, path, out),
                    Node::Paragraph(_) => {}
                }
                path.pop();
            }
        }

        let mut out = Vec::new();
        walk(&self.children, &mut Vec::new(), &mut out);
        out
    }

    /// Every block and list id in the tree.
    pub fn node_ids(&self) -> HashSet<String> {
        fn walk(children: &[Node], out: &mut HashSet<String>) {
            for node in children {
                match node {
                    Node::BlockList(list) => {
                        out.insert(list.id.clone());
                        walk(&list.children, out);
                    }
                    Node::Block(block) => {
                        out.insert(block.id.clone());
                        walk(&block.children, out);
                    }
                    Node::Paragraph(_) => {}
                }
            }
        }

        let mut out = HashSet::new();
        walk(&self.children, &mut out);
        out
    }

    /// A single root list, `[paragraph]` or `[paragraph, block_list]` blocks,
    /// only blocks inside lists, and unique block ids.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let [Node::BlockList(root)] = self.children.as_slice() else {
            return Err(InvariantViolation::RootShape {
                children: self.children.len(),
            });
        };

        fn check_list(
            list: &BlockListNode,
            path: &mut Path,
            seen: &mut HashSet<String>,
        ) -> Result<(), InvariantViolation> {
            for (ix, node) in list.children.iter().enumerate() {
                path.push(ix);
                let Node::Block(block) = node else {
                    return Err(InvariantViolation::ListChild { path: path.clone() });
                };
                if !seen.insert(block.id.clone()) {
                    return Err(InvariantViolation::DuplicateId {
                        id: block.id.clone(),
                    });
                }
                match block.children.as_slice() {
                    [Node::Paragraph(_)] => {}
                    [Node::Paragraph(_), Node::BlockList(nested)] => {
                        path.push(1);
                        check_list(nested, path, seen)?;
                        path.pop();
                    }
                    _ => {
                        return Err(InvariantViolation::BlockShape { path: path.clone() });
                    }
                }
                path.pop();
            }
            Ok(())
        }

        check_list(root, &mut vec![0], &mut HashSet::new())
    }
}

impl Node {
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::BlockList(list) => Some(&mut list.children),
            Node::Block(block) => Some(&mut block.children),
            Node::Paragraph(_) => None,
        }
    }

    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::BlockList(list) => Some(&list.children),
            Node::Block(block) => Some(&block.children),
            Node::Paragraph(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::BlockList(_) => "block_list",
            Node::Block(_) => "block",
            Node::Paragraph(_) => "paragraph",
        }
    }
}

impl BlockListNode {
    pub fn new(id: impl Into<String>, style: ListStyle, blocks: Vec<BlockNode>) -> Self {
        Self {
            id: id.into(),
            style,
            children: blocks.into_iter().map(Node::Block).collect(),
        }
    }
}

impl BlockNode {
    pub fn new(id: impl Into<BlockId>, paragraph: ParagraphNode) -> Self {
        Self {
            id: id.into(),
            children: vec![Node::Paragraph(paragraph)],
        }
    }

    pub fn with_list(id: impl Into<BlockId>, paragraph: ParagraphNode, list: BlockListNode) -> Self {
        Self {
            id: id.into(),
            children: vec![Node::Paragraph(paragraph), Node::BlockList(list)],
        }
    }

    pub fn paragraph(&self) -> Option<&ParagraphNode> {
        match self.children.first() {
            Some(Node::Paragraph(p)) => Some(p),
            _ => None,
        }
    }

    pub fn paragraph_mut(&mut self) -> Option<&mut ParagraphNode> {
        match self.children.first_mut() {
            Some(Node::Paragraph(p)) => Some(p),
            _ => None,
        }
    }

    pub fn nested_list(&self) -> Option<&BlockListNode> {
        match self.children.get(1) {
            Some(Node::BlockList(list)) => Some(list),
            _ => None,
        }
    }

    pub fn nested_list_mut(&mut self) -> Option<&mut BlockListNode> {
        match self.children.get_mut(1) {
            Some(Node::BlockList(list)) => Some(list),
            _ => None,
        }
    }

    pub fn take_nested_list(&mut self) -> Option<BlockListNode> {
        if !matches!(self.children.get(1), Some(Node::BlockList(_))) {
            return None;
        }
        match self.children.remove(1) {
            Node::BlockList(list) => Some(list),
            _ => None,
        }
    }

    /// Appends blocks to the nested list, creating it with `style` when the
    /// block has none.
    pub fn append_to_nested_list(
        &mut self,
        blocks: Vec<Node>,
        style: ListStyle,
        ids: &mut dyn IdGenerator,
    ) {
        if blocks.is_empty() {
            return;
        }
        match self.nested_list_mut() {
            Some(list) => list.children.extend(blocks),
            None => self.children.insert(
                1,
                Node::BlockList(BlockListNode {
                    id: ids.list_id(),
                    style,
                    children: blocks,
                }),
            ),
        }
    }
}

impl Inline {
    /// Width in the flattened paragraph offset space. Voids count as one.
    pub fn len(&self) -> usize {
        match self {
            Inline::Text(t) => t.text.len(),
            Inline::Link(l) => l.children.iter().map(|t| t.text.len()).sum(),
            Inline::Quote(_) | Inline::Image(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Inline::Text(_) => "text",
            Inline::Link(_) => "link",
            Inline::Quote(_) => "quote",
            Inline::Image(_) => "image",
        }
    }
}

impl TextLeaf {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    pub fn styled(text: impl Into<String>, marks: Marks) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }
}

impl ParagraphNode {
    pub fn new(children: Vec<Inline>) -> Self {
        Self { children }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            children: vec![Inline::Text(TextLeaf::plain(text))],
        }
    }

    pub fn len(&self) -> usize {
        self.children.iter().map(Inline::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Concatenated text of text and link leaves. Voids contribute nothing.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for inline in &self.children {
            match inline {
                Inline::Text(t) => out.push_str(&t.text),
                Inline::Link(l) => l.children.iter().for_each(|t| out.push_str(&t.text)),
                Inline::Quote(_) | Inline::Image(_) => {}
            }
        }
        out
    }

    /// Clamps `offset` to the paragraph length and to a char boundary of the
    /// leaf it lands in.
    pub fn clamp_offset(&self, offset: usize) -> usize {
        let mut pos = 0;
        for inline in &self.children {
            let len = inline.len();
            if offset < pos + len {
                return pos + clamp_in_inline(inline, offset - pos);
            }
            pos += len;
        }
        pos
    }

    /// Splits the leaves at `offset`, keeping the head and returning the tail.
    /// A link cut in two yields two links sharing the original id.
    pub fn split_off(&mut self, offset: usize) -> ParagraphNode {
        let mut pos = 0;
        for ix in 0..self.children.len() {
            if offset <= pos {
                return ParagraphNode::new(self.children.split_off(ix));
            }
            let len = self.children[ix].len();
            if offset < pos + len {
                let local = offset - pos;
                let tail_leaf = match &mut self.children[ix] {
                    Inline::Text(t) => {
                        let at = clamp_to_char_boundary(&t.text, local);
                        Some(Inline::Text(TextLeaf {
                            text: t.text.split_off(at),
                            marks: t.marks.clone(),
                        }))
                    }
                    Inline::Link(link) => Some(Inline::Link(LinkLeaf {
                        id: link.id.clone(),
                        url: link.url.clone(),
                        children: split_text_leaves(&mut link.children, local),
                    })),
                    Inline::Quote(_) | Inline::Image(_) => None,
                };
                let mut rest = self.children.split_off(ix + 1);
                if let Some(leaf) = tail_leaf {
                    rest.insert(0, leaf);
                }
                return ParagraphNode::new(rest);
            }
            pos += len;
        }
        ParagraphNode::default()
    }

    pub fn append(&mut self, mut other: ParagraphNode) {
        self.children.append(&mut other.children);
    }

    pub fn delete_range(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let tail = self.split_off(end);
        self.split_off(start);
        self.append(tail);
    }

    /// Inserts typed text, inheriting the marks of the text it lands in.
    /// Returns the offset just after the inserted text.
    pub fn insert_text(&mut self, offset: usize, text: &str) -> usize {
        let offset = self.clamp_offset(offset);
        let mut tail = self.split_off(offset);

        let inside_link = matches!(
            (self.children.last(), tail.children.first()),
            (Some(Inline::Link(a)), Some(Inline::Link(b))) if a.id == b.id
        );

        let head_takes_text = inside_link || matches!(self.children.last(), Some(Inline::Text(_)));

        if head_takes_text {
            match self.children.last_mut() {
                Some(Inline::Text(t)) => t.text.push_str(text),
                Some(Inline::Link(link)) => match link.children.last_mut() {
                    Some(t) => t.text.push_str(text),
                    None => link.children.push(TextLeaf::plain(text)),
                },
                _ => {}
            }
        } else if let Some(Inline::Text(t)) = tail.children.first_mut() {
            t.text.insert_str(0, text);
        } else {
            self.children.push(Inline::Text(TextLeaf::plain(text)));
        }

        self.children.append(&mut tail.children);
        offset + text.len()
    }

    /// Removes the character (or void leaf) before `offset` and returns the
    /// new offset.
    pub fn delete_backward(&mut self, offset: usize) -> usize {
        let offset = self.clamp_offset(offset);
        if offset == 0 {
            return 0;
        }
        let tail = self.split_off(offset);
        let mut removed = 0;
        while removed == 0 {
            let Some(last) = self.children.last_mut() else {
                break;
            };
            removed = match last {
                Inline::Text(t) => t.text.pop().map_or(0, char::len_utf8),
                Inline::Link(link) => {
                    let mut n = 0;
                    while n == 0 {
                        let Some(child) = link.children.last_mut() else {
                            break;
                        };
                        n = child.text.pop().map_or(0, char::len_utf8);
                        if child.text.is_empty() {
                            link.children.pop();
                        }
                    }
                    n
                }
                Inline::Quote(_) | Inline::Image(_) => 1,
            };
            if self.children.last().is_some_and(|l| {
                l.is_empty() || matches!(l, Inline::Quote(_) | Inline::Image(_)) && removed == 1
            }) {
                self.children.pop();
            }
        }
        self.append(tail);
        offset - removed
    }
}

fn clamp_in_inline(inline: &Inline, local: usize) -> usize {
    match inline {
        Inline::Text(t) => clamp_to_char_boundary(&t.text, local),
        Inline::Link(link) => {
            let mut pos = 0;
            for child in &link.children {
                if local < pos + child.text.len() {
                    return pos + clamp_to_char_boundary(&child.text, local - pos);
                }
                pos += child.text.len();
            }
            pos
        }
        Inline::Quote(_) | Inline::Image(_) => 0,
    }
}

fn split_text_leaves(children: &mut Vec<TextLeaf>, offset: usize) -> Vec<TextLeaf> {
    let mut pos = 0;
    for ix in 0..children.len() {
        if offset <= pos {
            return children.split_off(ix);
        }
        let len = children[ix].text.len();
        if offset < pos + len {
            let at = clamp_to_char_boundary(&children[ix].text, offset - pos);
            let tail = TextLeaf {
                text: children[ix].text.split_off(at),
                marks: children[ix].marks.clone(),
            };
            let mut rest = children.split_off(ix + 1);
            rest.insert(0, tail);
            return rest;
        }
        pos += len;
    }
    Vec::new()
}

pub(crate) fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}
