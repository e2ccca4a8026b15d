use super::query::{can_insert, is_in_table, selection_in_code_block};
use super::tables::create_table;
use crate::model::{Node, NodeKind};
use crate::schema::NodeType;
use crate::state::{EditorState, Selection, Transaction};

/// Insert an image at the selection, or update the selected image.
pub fn insert_image(
    state: &EditorState,
    src: &str,
    alt: Option<&str>,
    title: Option<&str>,
) -> Option<Transaction> {
    if src.is_empty() || selection_in_code_block(state) {
        return None;
    }
    let updating = state
        .selection()
        .selected_node(state.doc())
        .is_some_and(|n| n.node_type() == NodeType::Image);
    if !updating && !can_insert(state, NodeType::Image) {
        return None;
    }
    let image = Node::leaf(NodeKind::Image {
        src: src.to_string(),
        alt: alt.map(str::to_string),
        title: title.map(str::to_string),
    });
    let mut tr = state.tr();
    tr.replace_selection_with(image)?;
    Some(tr)
}

pub fn insert_horizontal_rule(state: &EditorState) -> Option<Transaction> {
    if is_in_table(state)
        || selection_in_code_block(state)
        || !can_insert(state, NodeType::HorizontalRule)
    {
        return None;
    }
    let mut tr = state.tr();
    tr.replace_selection_with(Node::leaf(NodeKind::HorizontalRule))?;
    Some(tr)
}

/// Insert an empty table and put the cursor in its first cell.
pub fn insert_table(state: &EditorState, rows: usize, cols: usize) -> Option<Transaction> {
    if is_in_table(state) || selection_in_code_block(state) || !can_insert(state, NodeType::Table) {
        return None;
    }
    let mut tr = state.tr();
    let pos = tr.replace_selection_with(create_table(rows, cols))?;
    // table, row, cell and paragraph openings
    tr.set_selection(Selection::cursor(pos + 4));
    Some(tr)
}

/// Insert an empty math node and select it for editing.
pub fn insert_math(state: &EditorState, display: bool) -> Option<Transaction> {
    let node_type = if display {
        NodeType::MathDisplay
    } else {
        NodeType::MathInline
    };
    if selection_in_code_block(state) || (display && is_in_table(state)) {
        return None;
    }
    if !can_insert(state, node_type) {
        return None;
    }
    let node = Node::element(NodeKind::with_defaults(node_type)?, vec![]);
    let mut tr = state.tr();
    let pos = tr.replace_selection_with(node)?;
    tr.set_selection(Selection::node(pos));
    Some(tr)
}
