use outline_core::{
    BlockListNode, BlockNode, Command, ListStyle, Normalizer, ParagraphNode, Point, SequentialIds,
    Tree, apply_command,
};

fn item(id: &str, text: &str, children: Vec<BlockNode>) -> BlockNode {
    if children.is_empty() {
        return BlockNode::new(id, ParagraphNode::from_text(text));
    }
    BlockNode::with_list(
        id,
        ParagraphNode::from_text(text),
        BlockListNode::new(format!("{id}-list"), ListStyle::Number, children),
    )
}

fn doc(blocks: Vec<BlockNode>) -> Tree {
    Tree::new(BlockListNode::new("doc", ListStyle::None, blocks))
}

fn outline(tree: &Tree) -> Vec<String> {
    tree.blocks_in_order()
        .into_iter()
        .map(|(path, block)| {
            let indent = "  ".repeat((path.len() - 2) / 2);
            let text = block.paragraph().map(|p| p.text()).unwrap_or_default();
            format!("{indent}{text}")
        })
        .collect()
}

fn outdent(tree: &mut Tree, path: Vec<usize>) -> Point {
    let mut ids = SequentialIds::with_prefix("t");
    let cursor = apply_command(
        tree,
        &Command::Outdent {
            cursor: Point::new(path, 1),
        },
        &mut ids,
    )
    .unwrap();
    assert!(Normalizer::core().normalize(tree, &mut ids).settled);
    tree.check_invariants().unwrap();
    cursor
}

#[test]
fn outdenting_the_only_grandchild_collapses_one_level() {
    let mut tree = doc(vec![item(
        "parent",
        "parent",
        vec![item("child", "child", vec![])],
    )]);
    let cursor = outdent(&mut tree, vec![0, 0, 1, 0]);

    assert_eq!(outline(&tree), vec!["parent", "child"]);
    assert_eq!(cursor, Point::new(vec![0, 1], 1));
    assert!(tree.block(&[0, 0]).unwrap().nested_list().is_none());
    assert_eq!(tree.block(&[0, 1]).unwrap().id, "child");
}

#[test]
fn later_siblings_follow_the_promoted_block() {
    let mut tree = doc(vec![
        item(
            "p",
            "p",
            vec![
                item("a", "a", vec![]),
                item("b", "b", vec![]),
                item("c", "c", vec![]),
            ],
        ),
        item("q", "q", vec![]),
    ]);
    outdent(&mut tree, vec![0, 0, 1, 1]);

    assert_eq!(outline(&tree), vec!["p", "  a", "b", "  c", "q"]);
    let b = tree.block(&[0, 1]).unwrap();
    let nested = b.nested_list().unwrap();
    assert_eq!(nested.id, "t/list-1");
    assert_eq!(nested.style, ListStyle::Number);
}

#[test]
fn later_siblings_join_an_existing_nested_list() {
    let mut tree = doc(vec![item(
        "p",
        "p",
        vec![
            item("a", "a", vec![]),
            item("b", "b", vec![item("b1", "b1", vec![])]),
            item("c", "c", vec![]),
        ],
    )]);
    outdent(&mut tree, vec![0, 0, 1, 1]);

    assert_eq!(outline(&tree), vec!["p", "  a", "b", "  b1", "  c"]);
    assert_eq!(tree.block(&[0, 1]).unwrap().nested_list().unwrap().id, "b-list");
}

#[test]
fn outdent_from_a_deeper_level_moves_up_one_level() {
    let mut tree = doc(vec![item(
        "p",
        "p",
        vec![item("q", "q", vec![item("r", "r", vec![])])],
    )]);
    let cursor = outdent(&mut tree, vec![0, 0, 1, 0, 1, 0]);

    assert_eq!(outline(&tree), vec!["p", "  q", "  r"]);
    assert_eq!(cursor.path, vec![0, 0, 1, 1]);
}

#[test]
fn top_level_outdent_is_a_no_op() {
    let mut tree = doc(vec![item("a", "a", vec![]), item("b", "b", vec![])]);
    let before = tree.clone();
    let cursor = outdent(&mut tree, vec![0, 1]);

    assert_eq!(tree, before);
    assert_eq!(cursor, Point::new(vec![0, 1], 1));
}
