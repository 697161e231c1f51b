//! Builds a small outline through edit commands, saves it as a document and
//! loads it back.
//!
//! `RUST_LOG=outline_core=trace cargo run -p outline-core --example roundtrip`

use outline_core::{Command, Editor, EditorConfig, Point, SequentialIds, deserialize};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut editor = Editor::empty();
    editor.apply(Command::InsertText {
        cursor: Point::new(vec![0, 0], 0),
        text: "- groceries".to_string(),
    })?;
    editor.apply(Command::ListShortcut {
        cursor: Point::new(vec![0, 0], 2),
    })?;
    let cursor = editor.apply(Command::Split {
        cursor: Point::new(vec![0, 0], 9),
    })?;
    editor.apply(Command::InsertText {
        cursor,
        text: "milk".to_string(),
    })?;
    editor.apply(Command::Indent {
        cursor: Point::new(vec![0, 1], 0),
    })?;

    let doc = editor.to_document()?;
    println!("{}", doc.to_json_pretty()?);

    let tree = deserialize(&doc)?;
    tree.check_invariants()?;
    let reloaded = Editor::from_document(
        &doc,
        Box::new(SequentialIds::with_prefix("reload")),
        EditorConfig::default(),
    )?;
    tracing::info!(
        blocks = tree.blocks_in_order().len(),
        same = reloaded.to_document()? == doc,
        "reloaded document"
    );
    Ok(())
}
