//! Typing, deleting and splitting blocks.

use super::blocks::{BlockKind, set_block_type};
use super::lists::lift_list_item;
use crate::model::{Fragment, Node, NodeKind, Slice};
use crate::schema::NodeType;
use crate::state::{EditorState, Selection, Transaction};

/// Replace the selection with `text`.
pub fn insert_text(state: &EditorState, text: &str) -> Option<Transaction> {
    let (from, to) = state.selection().range(state.doc());
    let mut tr = state.tr();
    if !tr.insert_text(text, from, to) {
        return None;
    }
    tr.set_selection(Selection::cursor(from + text.chars().count()));
    Some(tr)
}

/// Delete the selection, or the character or inline node before the cursor.
///
/// At the start of a textblock the block is joined to the textblock before
/// it. The first paragraph of a list item is lifted out of the list instead,
/// and a heading or code block with nothing before it becomes a paragraph.
pub fn backspace(state: &EditorState) -> Option<Transaction> {
    let doc = state.doc();
    let selection = state.selection();
    let mut tr = state.tr();
    if !selection.empty() {
        let (from, to) = selection.range(doc);
        return tr.delete(from, to).then_some(tr);
    }

    let pos = selection.head();
    let rpos = doc.resolve(pos)?;
    if rpos.parent_offset > 0 {
        let size = rpos
            .node_before()
            .map_or(1, |n| if n.is_text() { 1 } else { n.node_size() });
        return tr.delete(pos - size, pos).then_some(tr);
    }

    let depth = rpos.depth();
    let container = rpos.node(depth.checked_sub(1)?);
    let index = rpos.index(depth - 1);
    if container.node_type() == NodeType::ListItem && index == 0 {
        return lift_list_item(state);
    }
    if index == 0 {
        if rpos.parent().node_type() == NodeType::Paragraph {
            return None;
        }
        return set_block_type(state, &BlockKind::Paragraph);
    }

    let before = container.child(index - 1);
    let block_start = rpos.before(depth);
    if before.is_textblock() && !before.is_atom() {
        return tr.delete(block_start - 1, pos).then_some(tr);
    }
    if before.is_atom() {
        return tr
            .delete(block_start - before.node_size(), block_start)
            .then_some(tr);
    }
    None
}

/// Split the textblock at the cursor, or insert a newline in code.
///
/// The first paragraph of a list item splits the item itself. Splitting at
/// the end of a heading continues with a paragraph. An empty list item is
/// lifted out of its list.
pub fn split_block(state: &EditorState) -> Option<Transaction> {
    let (from, to) = state.selection().range(state.doc());
    let rfrom = state.doc().resolve(from)?;
    let parent = rfrom.parent();
    if !parent.is_textblock() || parent.is_atom() {
        return None;
    }
    let depth = rfrom.depth();
    let in_item = depth >= 2
        && rfrom.node(depth - 1).node_type() == NodeType::ListItem
        && rfrom.index(depth - 1) == 0;
    if in_item
        && from == to
        && parent.content().size() == 0
        && rfrom.node(depth - 1).child_count() == 1
    {
        return lift_list_item(state);
    }

    let mut tr = state.tr();
    if parent.node_type().spec().code {
        return tr.insert_text("\n", from, to).then_some(tr);
    }
    let at_end = to == rfrom.end(depth);
    let right_kind = if at_end && parent.node_type() == NodeType::Heading {
        NodeKind::Paragraph {
            align: parent.kind().align().unwrap_or_default(),
        }
    } else {
        parent.kind().clone()
    };
    let left = parent.copy(Fragment::empty());
    let right = Node::element(right_kind, vec![]);
    let (nodes, open) = if in_item {
        let item = rfrom.node(depth - 1);
        (
            vec![item.copy(Fragment::from_node(left)), item.copy(Fragment::from_node(right))],
            2,
        )
    } else {
        (vec![left, right], 1)
    };
    if !tr.replace(from, to, Slice::new(Fragment::from_nodes(nodes), open, open)) {
        return None;
    }
    tr.set_selection(Selection::cursor(from + 2 * open));
    Some(tr)
}
