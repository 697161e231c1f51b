//! The flat, persisted document graph.
//!
//! Field names and nesting follow the document wire format exactly:
//! `{id, title, subtitle, author, children, childrenListStyle, blocks, links}`.
//! Nested lists are encoded through each block's own `children` id list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tree::{BlockId, ListStyle};

pub type LinkId = String;

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub children: Vec<BlockId>,
    #[serde(default)]
    pub children_list_style: ListStyle,
    #[serde(default)]
    pub blocks: BTreeMap<BlockId, Block>,
    #[serde(default)]
    pub links: BTreeMap<LinkId, Link>,
}

/// Document-level fields that have no place in the editing tree.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentHeader {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub author: String,
}

impl DocumentHeader {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: BlockId,
    /// Id of the owning block; empty for top-level blocks.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent: BlockId,
    #[serde(default)]
    pub child_list_style: ListStyle,
    #[serde(default)]
    pub elements: Vec<InlineElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BlockId>,
}

/// One-of `{textRun}`, `{quote}`, `{image}`. The constructors always set
/// exactly one field; [`InlineElement::kind`] checks values that came from
/// elsewhere.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_run: Option<TextRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<Quote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
}

/// Borrowed view of the populated variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InlineKind<'a> {
    TextRun(&'a TextRun),
    Quote(&'a Quote),
    Image(&'a Image),
}

impl InlineElement {
    pub fn text_run(run: TextRun) -> Self {
        Self {
            text_run: Some(run),
            ..Self::default()
        }
    }

    pub fn quote(quote: Quote) -> Self {
        Self {
            quote: Some(quote),
            ..Self::default()
        }
    }

    pub fn image(image: Image) -> Self {
        Self {
            image: Some(image),
            ..Self::default()
        }
    }

    /// Number of populated variants. Anything other than one is malformed.
    pub fn populated(&self) -> usize {
        usize::from(self.text_run.is_some())
            + usize::from(self.quote.is_some())
            + usize::from(self.image.is_some())
    }

    /// The populated variant, or `None` unless exactly one is set.
    pub fn kind(&self) -> Option<InlineKind<'_>> {
        match (&self.text_run, &self.quote, &self.image) {
            (Some(run), None, None) => Some(InlineKind::TextRun(run)),
            (None, Some(quote), None) => Some(InlineKind::Quote(quote)),
            (None, None, Some(image)) => Some(InlineKind::Image(image)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub code: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub blockquote: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_key: Option<LinkId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub link_key: LinkId,
    #[serde(default)]
    pub start_offset: u32,
    #[serde(default)]
    pub end_offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub link_key: LinkId,
    #[serde(default)]
    pub alt_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub uri: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mime_type: String,
}

impl Link {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: String::new(),
        }
    }
}

impl Document {
    pub fn header(&self) -> DocumentHeader {
        DocumentHeader {
            id: self.id.clone(),
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            author: self.author.clone(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
