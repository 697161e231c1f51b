//! Leaf-level conversions between tree inlines and flat inline elements.

use serde_json::Value;

use crate::document::{InlineElement, Link, Quote, TextRun};
use crate::error::ValidationError;
use crate::tree::{LinkLeaf, Marks, QuoteLeaf, TextLeaf};

const INLINE_KEYS: [&str; 3] = ["textRun", "quote", "image"];

pub fn to_text_run(leaf: &TextLeaf) -> TextRun {
    let Marks {
        bold,
        italic,
        underline,
        strikethrough,
        code,
        blockquote,
    } = leaf.marks;
    TextRun {
        text: leaf.text.clone(),
        bold,
        italic,
        underline,
        strikethrough,
        code,
        blockquote,
        link_key: None,
    }
}

pub fn text_leaf_from_run(run: &TextRun) -> TextLeaf {
    TextLeaf {
        text: run.text.clone(),
        marks: Marks {
            bold: run.bold,
            italic: run.italic,
            underline: run.underline,
            strikethrough: run.strikethrough,
            code: run.code,
            blockquote: run.blockquote,
        },
    }
}

/// Empty `id` or `url` count as undefined.
pub fn to_link(leaf: &LinkLeaf) -> Result<Link, ValidationError> {
    link_entry(&leaf.id, &leaf.url)
}

pub fn quote_link(leaf: &QuoteLeaf) -> Result<Link, ValidationError> {
    link_entry(&leaf.id, &leaf.url)
}

fn link_entry(id: &str, url: &str) -> Result<Link, ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::new(r#"toLink error: "id" cannot be undefined"#));
    }
    if url.is_empty() {
        return Err(ValidationError::new(r#"toLink error: "url" cannot be undefined"#));
    }
    Ok(Link::new(url))
}

/// Range quoting is not produced anywhere yet, so offsets are always zero.
pub fn to_quote(leaf: &QuoteLeaf) -> Quote {
    Quote {
        link_key: leaf.id.clone(),
        start_offset: 0,
        end_offset: 0,
    }
}

/// Builds an [`InlineElement`] from a loose JSON object that must carry
/// exactly one of `textRun`, `quote` or `image`.
pub fn to_inline_element(entry: &Value) -> Result<InlineElement, ValidationError> {
    let Some(object) = entry.as_object() else {
        return Err(ValidationError::new(
            "toInlineElement error: entry must be an object",
        ));
    };

    if let Some(unknown) = object.keys().find(|k| !INLINE_KEYS.contains(&k.as_str())) {
        return Err(ValidationError::new(format!(
            r#"toInlineElement error: unknown key "{unknown}""#
        )));
    }

    if let Some((key, _)) = object.iter().find(|(_, v)| v.is_null()) {
        return Err(ValidationError::new(format!(
            r#"toInlineElement error: "{key}" cannot be null"#
        )));
    }

    let present: Vec<&str> = INLINE_KEYS
        .iter()
        .copied()
        .filter(|k| object.contains_key(*k))
        .collect();
    if present.len() != 1 {
        return Err(ValidationError::new(format!(
            "toInlineElement error: expected exactly one of {INLINE_KEYS:?}, found {}",
            present.len()
        )));
    }

    serde_json::from_value(entry.clone())
        .map_err(|err| ValidationError::new(format!("toInlineElement error: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_run_round_trips_marks() {
        let leaf = TextLeaf::styled(
            "x",
            Marks {
                italic: true,
                code: true,
                ..Marks::default()
            },
        );
        assert_eq!(text_leaf_from_run(&to_text_run(&leaf)), leaf);
    }

    #[test]
    fn missing_url_is_reported_after_id() {
        let leaf = LinkLeaf {
            id: "l1".into(),
            ..LinkLeaf::default()
        };
        assert_eq!(
            to_link(&leaf).unwrap_err().message(),
            r#"toLink error: "url" cannot be undefined"#
        );
    }
}
