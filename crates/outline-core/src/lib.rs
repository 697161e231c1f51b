mod codec;
mod commands;
mod deserialize;
mod document;
mod editor;
mod error;
mod ids;
mod normalize;
mod ops;
mod serialize;
mod tree;

pub use crate::codec::*;
pub use crate::commands::*;
pub use crate::deserialize::*;
pub use crate::document::*;
pub use crate::editor::*;
pub use crate::error::*;
pub use crate::ids::*;
pub use crate::normalize::*;
pub use crate::ops::*;
pub use crate::serialize::*;
pub use crate::tree::*;
