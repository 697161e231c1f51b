use outline_core::{
    BlockListNode, BlockNode, Command, ListStyle, Normalizer, ParagraphNode, Point, Selection,
    SequentialIds, Tree, apply_command,
};

fn item(id: &str, text: &str, children: Vec<BlockNode>) -> BlockNode {
    if children.is_empty() {
        return BlockNode::new(id, ParagraphNode::from_text(text));
    }
    BlockNode::with_list(
        id,
        ParagraphNode::from_text(text),
        BlockListNode::new(format!("{id}-list"), ListStyle::Bullet, children),
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

fn delete(tree: &mut Tree, anchor: Point, focus: Point) -> Point {
    let mut ids = SequentialIds::with_prefix("t");
    let cursor = apply_command(
        tree,
        &Command::DeleteFragment {
            selection: Selection::new(anchor, focus),
        },
        &mut ids,
    )
    .unwrap();
    assert!(Normalizer::core().normalize(tree, &mut ids).settled);
    tree.check_invariants().unwrap();
    cursor
}

#[test]
fn three_siblings_merge_and_keep_the_middle_nested_list() {
    let mut tree = doc(vec![
        item("a", "hello", vec![]),
        item("b", "middle", vec![item("b1", "kid", vec![])]),
        item("c", "world", vec![]),
    ]);
    let cursor = delete(
        &mut tree,
        Point::new(vec![0, 0], 2),
        Point::new(vec![0, 2], 3),
    );

    assert_eq!(outline(&tree), vec!["held", "  kid"]);
    assert_eq!(tree.root().unwrap().children.len(), 1);
    assert_eq!(tree.block(&[0, 0]).unwrap().id, "a");
    assert_eq!(tree.block(&[0, 0, 1, 0]).unwrap().id, "b1");
    assert_eq!(cursor, Point::new(vec![0, 0], 2));
}

#[test]
fn backwards_selections_are_ordered_first() {
    let mut tree = doc(vec![item("a", "hello", vec![]), item("c", "world", vec![])]);
    let cursor = delete(
        &mut tree,
        Point::new(vec![0, 1], 3),
        Point::new(vec![0, 0], 2),
    );
    assert_eq!(outline(&tree), vec!["held"]);
    assert_eq!(cursor, Point::new(vec![0, 0], 2));
}

#[test]
fn selection_inside_one_block_deletes_text() {
    let mut tree = doc(vec![item("a", "hello world", vec![])]);
    let cursor = delete(
        &mut tree,
        Point::new(vec![0, 0], 8),
        Point::new(vec![0, 0], 2),
    );
    assert_eq!(outline(&tree), vec!["herld"]);
    assert_eq!(cursor, Point::new(vec![0, 0], 2));
}

#[test]
fn deleting_into_a_child_keeps_later_children() {
    let mut tree = doc(vec![item(
        "a",
        "abc",
        vec![item("a1", "def", vec![]), item("a2", "ghi", vec![])],
    )]);
    delete(
        &mut tree,
        Point::new(vec![0, 0], 1),
        Point::new(vec![0, 0, 1, 0], 1),
    );
    assert_eq!(outline(&tree), vec!["aef", "  ghi"]);
}

#[test]
fn deleting_into_a_grandchild_rehomes_its_subtree() {
    let mut tree = doc(vec![
        item("a", "abc", vec![]),
        item(
            "b",
            "bcd",
            vec![item("b1", "xyz", vec![item("b11", "deep", vec![])])],
        ),
        item("c", "tail", vec![]),
    ]);
    let cursor = delete(
        &mut tree,
        Point::new(vec![0, 0], 1),
        Point::new(vec![0, 1, 1, 0], 2),
    );

    assert_eq!(outline(&tree), vec!["az", "  deep", "tail"]);
    assert_eq!(cursor, Point::new(vec![0, 0], 1));
}

#[test]
fn survivors_go_in_front_of_the_existing_nested_list() {
    let mut tree = doc(vec![
        item("a", "one", vec![item("a1", "a1", vec![])]),
        item("b", "two", vec![item("b1", "b1", vec![]), item("b2", "b2", vec![])]),
    ]);
    delete(
        &mut tree,
        Point::new(vec![0, 0, 1, 0], 2),
        Point::new(vec![0, 1], 1),
    );
    // Start is a1, so b's children land in a1's new nested list.
    assert_eq!(outline(&tree), vec!["one", "  a1wo", "    b1", "    b2"]);
}
