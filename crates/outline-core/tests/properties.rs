//! Property tests: random command sequences keep the tree settled and
//! serializable.

use outline_core::{
    Command, DocumentHeader, Editor, Node, Normalizer, Point, Selection, SequentialIds, Tree,
    deserialize, serialize,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Step {
    kind: u8,
    first: usize,
    second: usize,
    offset: usize,
    text: String,
}

fn step() -> impl Strategy<Value = Step> {
    (0u8..7, any::<usize>(), any::<usize>(), 0usize..16, "[a-c é1.*-]{0,5}").prop_map(
        |(kind, first, second, offset, text)| Step {
            kind,
            first,
            second,
            offset,
            text,
        },
    )
}

fn block_paths(tree: &Tree) -> Vec<Vec<usize>> {
    tree.blocks_in_order().into_iter().map(|(p, _)| p).collect()
}

fn command(tree: &Tree, step: &Step) -> Command {
    let paths = block_paths(tree);
    let pick = |n: usize| paths[n % paths.len()].clone();
    let cursor = Point::new(pick(step.first), step.offset);
    match step.kind {
        0 => Command::Split { cursor },
        1 => Command::Outdent { cursor },
        2 => Command::Indent { cursor },
        3 => Command::MergeBackspace { cursor },
        4 => Command::DeleteFragment {
            selection: Selection::new(cursor, Point::new(pick(step.second), step.offset / 2)),
        },
        5 => Command::ListShortcut { cursor },
        _ => Command::InsertText {
            cursor,
            text: step.text.clone(),
        },
    }
}

fn block_ids(tree: &Tree) -> Vec<String> {
    tree.blocks_in_order()
        .into_iter()
        .map(|(_, b)| b.id.clone())
        .collect()
}

/// List ids are not saved, so a reloaded tree only matches with them blanked.
fn without_list_ids(tree: &Tree) -> Tree {
    fn blank(nodes: &mut [Node]) {
        for node in nodes {
            match node {
                Node::BlockList(list) => {
                    list.id.clear();
                    blank(&mut list.children);
                }
                Node::Block(block) => blank(&mut block.children),
                Node::Paragraph(_) => {}
            }
        }
    }

    let mut tree = tree.clone();
    blank(&mut tree.children);
    tree
}

proptest! {
    #[test]
    fn commands_keep_the_tree_settled(steps in prop::collection::vec(step(), 1..40)) {
        let mut editor = Editor::empty();
        for step in &steps {
            let cmd = command(editor.tree(), step);
            prop_assert!(editor.apply(cmd.clone()).is_ok(), "{:?} failed", cmd);
            prop_assert!(editor.tree().check_invariants().is_ok(), "after {:?}", cmd);
        }
    }

    #[test]
    fn normalization_is_idempotent(steps in prop::collection::vec(step(), 1..30)) {
        let mut editor = Editor::empty();
        for step in &steps {
            let cmd = command(editor.tree(), step);
            let _ = editor.apply(cmd);
        }

        let mut tree = editor.tree().clone();
        let outcome = Normalizer::core().normalize(&mut tree, &mut SequentialIds::with_prefix("x"));
        prop_assert!(outcome.settled);
        prop_assert_eq!(outcome.ops_applied, 0);
        prop_assert_eq!(&tree, editor.tree());
    }

    #[test]
    fn settled_trees_round_trip_through_documents(steps in prop::collection::vec(step(), 1..30)) {
        let mut editor = Editor::empty();
        for step in &steps {
            let cmd = command(editor.tree(), step);
            let _ = editor.apply(cmd);
        }

        let doc = serialize(editor.tree(), DocumentHeader::new("doc")).unwrap();
        let tree = deserialize(&doc).unwrap();
        tree.check_invariants().unwrap();
        prop_assert_eq!(block_ids(&tree), block_ids(editor.tree()));
        prop_assert_eq!(without_list_ids(&tree), without_list_ids(editor.tree()));
        prop_assert_eq!(serialize(&tree, DocumentHeader::new("doc")).unwrap(), doc);
    }

    #[test]
    fn undo_walks_back_to_the_empty_document(steps in prop::collection::vec(step(), 1..20)) {
        let mut editor = Editor::empty();
        let initial = editor.tree().clone();
        for step in &steps {
            let cmd = command(editor.tree(), step);
            let _ = editor.apply(cmd);
        }
        while editor.undo() {}
        prop_assert_eq!(editor.tree(), &initial);
    }
}
