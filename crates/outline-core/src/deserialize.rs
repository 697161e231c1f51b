use std::collections::HashSet;

use crate::codec::text_leaf_from_run;
use crate::document::{Block, Document, InlineKind};
use crate::error::{ConvertError, ValidationError};
use crate::tree::{
    BlockId, BlockListNode, BlockNode, ImageLeaf, Inline, LinkLeaf, Node, ParagraphNode,
    QuoteLeaf, TextLeaf, Tree,
};

/// Id given to a loaded block's nested list. List ids are not persisted.
pub fn nested_list_id(block_id: &str) -> String {
    format!("{block_id}-list")
}

/// Rebuilds the tree strictly top-down from `Document.children`, following
/// each block's own `children` ids for nested lists. The root list takes the
/// document id.
pub fn deserialize(doc: &Document) -> Result<Tree, ConvertError> {
    let mut reader = Reader {
        doc,
        seen: HashSet::new(),
    };
    let children = reader.blocks(&doc.children)?;

    tracing::debug!(
        id = %doc.id,
        blocks = reader.seen.len(),
        "deserialized document"
    );

    Ok(Tree {
        children: vec![Node::BlockList(BlockListNode {
            id: doc.id.clone(),
            style: doc.children_list_style,
            children,
        })],
    })
}

struct Reader<'a> {
    doc: &'a Document,
    seen: HashSet<&'a str>,
}

impl<'a> Reader<'a> {
    fn blocks(&mut self, ids: &'a [BlockId]) -> Result<Vec<Node>, ConvertError> {
        ids.iter()
            .map(|id| self.block(id).map(Node::Block))
            .collect()
    }

    fn block(&mut self, id: &'a str) -> Result<BlockNode, ConvertError> {
        // Also stops cycles through the per-block child lists.
        if !self.seen.insert(id) {
            return Err(ConvertError::DuplicateBlock { id: id.to_string() });
        }
        let doc = self.doc;
        let Some(block) = doc.blocks.get(id) else {
            return Err(ConvertError::MissingBlock { id: id.to_string() });
        };

        let mut node = BlockNode::new(id, self.paragraph(block)?);
        if !block.children.is_empty() {
            let children = self.blocks(&block.children)?;
            node.children.push(Node::BlockList(BlockListNode {
                id: nested_list_id(id),
                style: block.child_list_style,
                children,
            }));
        }
        Ok(node)
    }

    fn paragraph(&self, block: &Block) -> Result<ParagraphNode, ConvertError> {
        let mut out: Vec<Inline> = Vec::with_capacity(block.elements.len());

        for element in &block.elements {
            match element.kind() {
                Some(InlineKind::TextRun(run)) => {
                    let leaf = text_leaf_from_run(run);
                    let Some(key) = &run.link_key else {
                        out.push(Inline::Text(leaf));
                        continue;
                    };
                    // Consecutive runs sharing a key form one link; a repeat
                    // after an interruption starts a new one.
                    if let Some(Inline::Link(link)) = out.last_mut() {
                        if link.id == *key {
                            link.children.push(leaf);
                            continue;
                        }
                    }
                    out.push(Inline::Link(LinkLeaf {
                        id: key.clone(),
                        url: self.uri(key)?,
                        children: vec![leaf],
                    }));
                }
                Some(InlineKind::Quote(quote)) => out.push(Inline::Quote(QuoteLeaf {
                    id: quote.link_key.clone(),
                    url: self.uri(&quote.link_key)?,
                })),
                Some(InlineKind::Image(image)) => out.push(Inline::Image(ImageLeaf {
                    url: self.uri(&image.link_key)?,
                    alt_text: image.alt_text.clone(),
                })),
                None if element.populated() == 0 => {
                    return Err(ConvertError::UnknownElement {
                        block: block.id.clone(),
                    });
                }
                None => {
                    return Err(ValidationError::new(format!(
                        "toInlineElement error: block {} has an element with {} variants set",
                        block.id,
                        element.populated()
                    ))
                    .into());
                }
            }
        }

        if out.is_empty() {
            out.push(Inline::Text(TextLeaf::default()));
        }
        Ok(ParagraphNode::new(out))
    }

    fn uri(&self, key: &str) -> Result<String, ConvertError> {
        self.doc
            .links
            .get(key)
            .map(|link| link.uri.clone())
            .ok_or_else(|| ConvertError::MissingLink {
                key: key.to_string(),
            })
    }
}
