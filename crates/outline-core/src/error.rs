use thiserror::Error;

use crate::ops::Path;

/// Malformed input handed to one of the inline constructors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PathError(pub String);

/// Failure of a single serialize or deserialize call. Nothing is partially
/// produced when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("unsupported element: {kind}")]
    UnsupportedElement { kind: String },

    #[error("unknown element in block {block}")]
    UnknownElement { block: String },

    #[error("block {id} is referenced but missing from the blocks map")]
    MissingBlock { id: String },

    #[error("link key {key} is missing from the links map")]
    MissingLink { key: String },

    #[error("malformed tree: {reason}")]
    Malformed { reason: String },

    #[error("block id {id} appears more than once")]
    DuplicateBlock { id: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("node at {path:?} is not a block")]
    NotABlock { path: Path },

    #[error("node at {path:?} is not a block list")]
    NotAList { path: Path },

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error("edit would break the tree: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// A structural invariant a settled tree must satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("root must hold exactly one block list, found {children} children")]
    RootShape { children: usize },

    #[error("block list at {path:?} holds a non-block child")]
    ListChild { path: Path },

    #[error("block at {path:?} is not [paragraph] or [paragraph, block_list]")]
    BlockShape { path: Path },

    #[error("block id {id} is not unique")]
    DuplicateId { id: String },
}
