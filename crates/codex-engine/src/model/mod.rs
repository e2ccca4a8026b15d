//! The document model: an immutable tree of nodes carrying marks, addressed by
//! flat integer positions.

pub mod json;
pub mod mark;
pub mod node;
pub mod resolved;
pub mod slice;

pub use json::*;
pub use mark::*;
pub use node::*;
pub use resolved::*;
pub use slice::*;

use crate::schema::NodeType;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Invalid content for {node:?}: expected `{expected}`, found `{found}`")]
    InvalidContent {
        node: NodeType,
        expected: String,
        found: String,
    },
    #[error("Marks are not allowed inside {0:?}")]
    MarksNotAllowed(NodeType),
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),
    #[error("Unknown mark type: {0}")]
    UnknownMarkType(String),
    #[error("Invalid attribute `{attr}` on {node}: {reason}")]
    InvalidAttribute {
        node: String,
        attr: &'static str,
        reason: String,
    },
    #[error("Malformed document: {0}")]
    Malformed(String),
    #[error("Text node without text")]
    MissingText,
}
