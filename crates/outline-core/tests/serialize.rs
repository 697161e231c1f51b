use outline_core::{
    BlockListNode, BlockNode, ConvertError, DocumentHeader, ImageLeaf, Inline, LinkLeaf,
    ListStyle, Marks, ParagraphNode, QuoteLeaf, SequentialIds, TextLeaf, Tree, serialize,
};
use serde_json::json;

fn single_block(inlines: Vec<Inline>) -> Tree {
    Tree::new(BlockListNode::new(
        "doc-1",
        ListStyle::None,
        vec![BlockNode::new("block-1", ParagraphNode::new(inlines))],
    ))
}

#[test]
fn hello_world_serializes_to_one_block() {
    let tree = single_block(vec![Inline::Text(TextLeaf::plain("hello world"))]);

    let doc = serialize(&tree, DocumentHeader::new("doc-1")).unwrap();
    assert_eq!(
        serde_json::to_value(&doc).unwrap(),
        json!({
            "id": "doc-1",
            "title": "",
            "subtitle": "",
            "author": "",
            "children": ["block-1"],
            "childrenListStyle": "NONE",
            "blocks": {
                "block-1": {
                    "id": "block-1",
                    "childListStyle": "NONE",
                    "elements": [{"textRun": {"text": "hello world"}}]
                }
            },
            "links": {}
        })
    );
}

#[test]
fn default_block_tree_uses_generated_ids() {
    let mut ids = SequentialIds::new();
    let tree = Tree::with_default_block(&mut ids);
    let doc = serialize(&tree, DocumentHeader::new("doc")).unwrap();
    assert_eq!(doc.children, vec!["block-1".to_string()]);
    // Empty text leaves produce no runs.
    assert!(doc.blocks["block-1"].elements.is_empty());
}

#[test]
fn links_flatten_into_runs_sharing_one_key() {
    let italic = Marks {
        italic: true,
        ..Marks::default()
    };
    let tree = single_block(vec![
        Inline::Text(TextLeaf::plain("see ")),
        Inline::Link(LinkLeaf {
            id: "l1".to_string(),
            url: "https://example.com".to_string(),
            children: vec![TextLeaf::plain("the "), TextLeaf::styled("docs", italic)],
        }),
    ]);

    let doc = serialize(&tree, DocumentHeader::new("doc-1")).unwrap();
    assert_eq!(
        serde_json::to_value(&doc.blocks["block-1"].elements).unwrap(),
        json!([
            {"textRun": {"text": "see "}},
            {"textRun": {"text": "the ", "linkKey": "l1"}},
            {"textRun": {"text": "docs", "italic": true, "linkKey": "l1"}}
        ])
    );
    assert_eq!(
        serde_json::to_value(&doc.links).unwrap(),
        json!({"l1": {"uri": "https://example.com"}})
    );
}

#[test]
fn quotes_register_their_link() {
    let tree = single_block(vec![Inline::Quote(QuoteLeaf {
        id: "q1".to_string(),
        url: "mintter://doc-9/block-3".to_string(),
    })]);
    let doc = serialize(&tree, DocumentHeader::new("doc-1")).unwrap();
    assert_eq!(
        serde_json::to_value(&doc.blocks["block-1"].elements).unwrap(),
        json!([{"quote": {"linkKey": "q1", "startOffset": 0, "endOffset": 0}}])
    );
    assert_eq!(doc.links["q1"].uri, "mintter://doc-9/block-3");
}

#[test]
fn images_are_unsupported() {
    let tree = single_block(vec![Inline::Image(ImageLeaf {
        url: "https://example.com/cat.png".to_string(),
        alt_text: "cat".to_string(),
    })]);
    assert_eq!(
        serialize(&tree, DocumentHeader::new("doc-1")).unwrap_err(),
        ConvertError::UnsupportedElement {
            kind: "image".to_string()
        }
    );
}

#[test]
fn link_without_url_fails_the_whole_call() {
    let tree = single_block(vec![Inline::Link(LinkLeaf {
        id: "l1".to_string(),
        url: String::new(),
        children: vec![TextLeaf::plain("x")],
    })]);
    let err = serialize(&tree, DocumentHeader::new("doc-1")).unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"toLink error: "url" cannot be undefined"#
    );
}

#[test]
fn nested_lists_are_recorded_per_block() {
    let tree = Tree::new(BlockListNode::new(
        "doc-1",
        ListStyle::Bullet,
        vec![
            BlockNode::with_list(
                "a",
                ParagraphNode::from_text("a"),
                BlockListNode::new(
                    "a-list",
                    ListStyle::Number,
                    vec![
                        BlockNode::new("a1", ParagraphNode::from_text("a1")),
                        BlockNode::new("a2", ParagraphNode::from_text("a2")),
                    ],
                ),
            ),
            BlockNode::new("b", ParagraphNode::from_text("b")),
        ],
    ));

    let doc = serialize(&tree, DocumentHeader::new("doc-1")).unwrap();
    assert_eq!(doc.children, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(doc.children_list_style, ListStyle::Bullet);

    let a = &doc.blocks["a"];
    assert_eq!(a.child_list_style, ListStyle::Number);
    assert_eq!(a.children, vec!["a1".to_string(), "a2".to_string()]);
    assert_eq!(doc.blocks["a2"].parent, "a");
    assert!(doc.blocks["b"].parent.is_empty());
    assert_eq!(doc.blocks.len(), 4);
}

#[test]
fn duplicate_block_ids_are_rejected() {
    let tree = Tree::new(BlockListNode::new(
        "doc-1",
        ListStyle::None,
        vec![
            BlockNode::new("a", ParagraphNode::from_text("x")),
            BlockNode::new("a", ParagraphNode::from_text("y")),
        ],
    ));
    assert_eq!(
        serialize(&tree, DocumentHeader::new("doc-1")).unwrap_err(),
        ConvertError::DuplicateBlock {
            id: "a".to_string()
        }
    );
}

#[test]
fn unsettled_roots_are_malformed() {
    let tree = Tree::default();
    assert!(matches!(
        serialize(&tree, DocumentHeader::new("doc-1")),
        Err(ConvertError::Malformed { .. })
    ));
}
