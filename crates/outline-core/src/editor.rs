use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::commands::{Command, apply_command};
use crate::deserialize::deserialize;
use crate::document::{Document, DocumentHeader};
use crate::error::{ConvertError, EditError};
use crate::ids::{IdGenerator, SequentialIds, UniqueIds};
use crate::normalize::{DEFAULT_MAX_ITERATIONS, NormalizeOutcome, Normalizer};
use crate::ops::{Point, Selection};
use crate::serialize::serialize;
use crate::tree::Tree;

const DEFAULT_MAX_UNDO: usize = 200;

/// Zero values mean "use the default"; see [`EditorConfig::with_defaults`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub max_undo: usize,
    pub max_normalize_iterations: usize,
}

impl EditorConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = DEFAULT_MAX_UNDO;
        }
        if self.max_normalize_iterations == 0 {
            self.max_normalize_iterations = DEFAULT_MAX_ITERATIONS;
        }
        self
    }
}

/// A settled tree plus the selection it had at that moment.
#[derive(Debug, Clone)]
struct Snapshot {
    tree: Tree,
    selection: Selection,
}

/// Owns one settled tree. Every command runs against a copy that is
/// normalized before it replaces the current tree, so a failing command
/// leaves the editor untouched.
pub struct Editor {
    tree: Tree,
    selection: Selection,
    header: DocumentHeader,
    normalizer: Normalizer,
    config: EditorConfig,
    ids: Box<dyn IdGenerator>,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
}

impl Editor {
    pub fn new(tree: Tree, ids: Box<dyn IdGenerator>) -> Self {
        Self::with_config(tree, ids, EditorConfig::default())
    }

    pub fn with_config(tree: Tree, ids: Box<dyn IdGenerator>, config: EditorConfig) -> Self {
        let config = config.with_defaults();
        let normalizer = Normalizer::core().with_max_iterations(config.max_normalize_iterations);
        let mut editor = Self {
            tree,
            selection: Selection::collapsed(Point::new(vec![0, 0], 0)),
            header: DocumentHeader::default(),
            normalizer,
            config,
            ids,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        };
        editor.normalize_in_place();
        editor.normalize_selection_in_place();
        editor
    }

    /// A fresh document holding one empty block, with sequential ids.
    pub fn empty() -> Self {
        let mut ids = SequentialIds::new();
        let tree = Tree::with_default_block(&mut ids);
        Self::new(tree, Box::new(ids))
    }

    /// Loads a document. The header is kept for [`Editor::to_document`].
    pub fn from_document(
        doc: &Document,
        ids: Box<dyn IdGenerator>,
        config: EditorConfig,
    ) -> Result<Self, ConvertError> {
        let tree = deserialize(doc)?;
        let mut editor = Self::with_config(tree, ids, config);
        editor.header = doc.header();
        Ok(editor)
    }

    pub fn to_document(&self) -> Result<Document, ConvertError> {
        serialize(&self.tree, self.header.clone())
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn header(&self) -> &DocumentHeader {
        &self.header
    }

    pub fn set_header(&mut self, header: DocumentHeader) {
        self.header = header;
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn normalizer_mut(&mut self) -> &mut Normalizer {
        &mut self.normalizer
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
        self.normalize_selection_in_place();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Runs one command and settles the result. Returns the caret after the
    /// edit; the selection collapses onto it. Commands that leave the tree
    /// unchanged record no history.
    pub fn apply(&mut self, command: Command) -> Result<Point, EditError> {
        let mut next = self.tree.clone();
        let mut ids = UniqueIds::new(&mut *self.ids, self.tree.node_ids());
        let point = apply_command(&mut next, &command, &mut ids)?;

        let outcome = self.normalizer.normalize(&mut next, &mut ids);
        if !outcome.settled {
            tracing::warn!(kind = command.kind(), ?outcome, "command left an unsettled tree");
        }
        next.check_invariants()?;

        if next == self.tree {
            self.selection = Selection::collapsed(point);
            self.normalize_selection_in_place();
            return Ok(self.selection.focus.clone());
        }

        let before = Snapshot {
            tree: std::mem::replace(&mut self.tree, next),
            selection: std::mem::replace(&mut self.selection, Selection::collapsed(point)),
        };
        self.normalize_selection_in_place();

        self.undo_stack.push(before);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.config.max_undo {
            self.undo_stack.remove(0);
        }

        Ok(self.selection.focus.clone())
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        let current = self.restore(snapshot);
        self.redo_stack.push(current);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = self.restore(snapshot);
        self.undo_stack.push(current);
        true
    }

    fn restore(&mut self, snapshot: Snapshot) -> Snapshot {
        Snapshot {
            tree: std::mem::replace(&mut self.tree, snapshot.tree),
            selection: std::mem::replace(&mut self.selection, snapshot.selection),
        }
    }

    pub fn tree_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.tree)
    }

    pub fn tree_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.tree)
    }

    /// Replaces the tree with a JSON snapshot and settles it. History is
    /// cleared.
    pub fn load_tree_json(&mut self, value: Value) -> Result<NormalizeOutcome, serde_json::Error> {
        self.tree = serde_json::from_value(value)?;
        self.undo_stack.clear();
        self.redo_stack.clear();
        let outcome = self.normalize_in_place();
        self.normalize_selection_in_place();
        Ok(outcome)
    }

    fn normalize_in_place(&mut self) -> NormalizeOutcome {
        let mut ids = UniqueIds::new(&mut *self.ids, self.tree.node_ids());
        self.normalizer.normalize(&mut self.tree, &mut ids)
    }

    fn normalize_selection_in_place(&mut self) {
        let anchor = settle_point(&self.tree, &self.selection.anchor);
        let focus = settle_point(&self.tree, &self.selection.focus);
        self.selection = Selection::new(anchor, focus);
    }
}

/// Keeps a point on an existing block with an in-range offset, falling back
/// to the start of the first block.
fn settle_point(tree: &Tree, point: &Point) -> Point {
    if let Some(paragraph) = tree.block(&point.path).and_then(|b| b.paragraph()) {
        return Point::new(point.path.clone(), paragraph.clamp_offset(point.offset));
    }
    match tree.blocks_in_order().first() {
        Some((path, _)) => Point::new(path.clone(), 0),
        None => Point::new(vec![0, 0], 0),
    }
}
