//! Document model, editing commands and notebook storage for Codex.
//!
//! Documents are immutable node trees ([`model`]) constrained by a fixed
//! [`schema`]. Edits are [`transform`] steps collected into transactions
//! ([`state`]), produced by the commands in [`editing`]. Notebooks and pages
//! ([`models`]) persist as JSON through [`io`]; a [`session::Session`] ties
//! the library to the page being edited.

pub mod editing;
pub mod export;
pub mod io;
pub mod model;
pub mod models;
pub mod schema;
pub mod session;
pub mod state;
pub mod transform;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{Cmd, Editor, Key, Patch};
pub use io::{DataStore, IoError, Loaded};
pub use model::{Mark, Node, SchemaError};
pub use models::{Notebook, Page, PageRef, SaveData};
pub use session::{DragItem, DropTarget, Notice, Session};
pub use state::{EditorState, Selection, Transaction};
