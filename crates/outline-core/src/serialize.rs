use std::collections::{BTreeMap, HashSet};

use crate::codec::{quote_link, to_link, to_quote, to_text_run};
use crate::document::{Block, Document, DocumentHeader, InlineElement, Link, LinkId};
use crate::error::ConvertError;
use crate::tree::{BlockId, BlockListNode, BlockNode, Inline, ListStyle, Node, ParagraphNode, Tree};

/// Flattens a settled tree into the document graph in a single pre-order
/// pass. Fails without producing anything on the first unsupported leaf.
pub fn serialize(tree: &Tree, header: DocumentHeader) -> Result<Document, ConvertError> {
    let [Node::BlockList(root)] = tree.children.as_slice() else {
        return Err(ConvertError::Malformed {
            reason: format!(
                "root must hold exactly one block list, found {} children",
                tree.children.len()
            ),
        });
    };

    let mut writer = Writer::default();
    let children = writer.list(root, "")?;

    tracing::debug!(
        blocks = writer.blocks.len(),
        links = writer.links.len(),
        "serialized document"
    );

    let DocumentHeader {
        id,
        title,
        subtitle,
        author,
    } = header;
    Ok(Document {
        id,
        title,
        subtitle,
        author,
        children,
        children_list_style: root.style,
        blocks: writer.blocks,
        links: writer.links,
    })
}

#[derive(Default)]
struct Writer {
    blocks: BTreeMap<BlockId, Block>,
    links: BTreeMap<LinkId, Link>,
    seen: HashSet<BlockId>,
}

impl Writer {
    fn list(&mut self, list: &BlockListNode, parent: &str) -> Result<Vec<BlockId>, ConvertError> {
        let mut ids = Vec::with_capacity(list.children.len());
        for node in &list.children {
            let Node::Block(block) = node else {
                return Err(ConvertError::Malformed {
                    reason: format!("block list {} holds a {}", list.id, node.kind()),
                });
            };
            ids.push(self.block(block, parent)?);
        }
        Ok(ids)
    }

    fn block(&mut self, block: &BlockNode, parent: &str) -> Result<BlockId, ConvertError> {
        if !self.seen.insert(block.id.clone()) {
            return Err(ConvertError::DuplicateBlock {
                id: block.id.clone(),
            });
        }
        let Some(paragraph) = block.paragraph() else {
            return Err(ConvertError::Malformed {
                reason: format!("block {} does not start with a paragraph", block.id),
            });
        };

        let elements = self.elements(paragraph)?;
        let (child_list_style, children) = match block.nested_list() {
            Some(nested) => (nested.style, self.list(nested, &block.id)?),
            None => (ListStyle::None, Vec::new()),
        };

        self.blocks.insert(
            block.id.clone(),
            Block {
                id: block.id.clone(),
                parent: parent.to_string(),
                child_list_style,
                elements,
                children,
            },
        );
        Ok(block.id.clone())
    }

    fn elements(&mut self, paragraph: &ParagraphNode) -> Result<Vec<InlineElement>, ConvertError> {
        let mut out = Vec::with_capacity(paragraph.children.len());
        for inline in &paragraph.children {
            match inline {
                Inline::Text(leaf) => {
                    if !leaf.text.is_empty() {
                        out.push(InlineElement::text_run(to_text_run(leaf)));
                    }
                }
                Inline::Link(link) => {
                    self.links.insert(link.id.clone(), to_link(link)?);
                    for leaf in link.children.iter().filter(|l| !l.text.is_empty()) {
                        let mut run = to_text_run(leaf);
                        run.link_key = Some(link.id.clone());
                        out.push(InlineElement::text_run(run));
                    }
                }
                Inline::Quote(quote) => {
                    self.links.insert(quote.id.clone(), quote_link(quote)?);
                    out.push(InlineElement::quote(to_quote(quote)));
                }
                other => {
                    return Err(ConvertError::UnsupportedElement {
                        kind: other.kind().to_string(),
                    });
                }
            }
        }
        Ok(out)
    }
}
