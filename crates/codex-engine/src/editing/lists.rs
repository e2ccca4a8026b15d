//! Indenting and outdenting list items.
//!
//! Both commands rebuild the affected list subtree and replace it in a single
//! step, then carry the selection over by textblock.

use super::query::follow_textblocks;
use crate::model::{Fragment, Node, NodeKind, NodeRange};
use crate::schema::NodeType;
use crate::state::{EditorState, Transaction};

/// The range of list items covered by the selection, inside their list.
fn list_item_range(state: &EditorState) -> Option<NodeRange<'_>> {
    let doc = state.doc();
    let (from, to) = state.selection().range(doc);
    let rfrom = doc.resolve(from)?;
    let rto = doc.resolve(to)?;
    rfrom.block_range(
        &rto,
        Some(&|node: &Node| {
            node.first_child()
                .is_some_and(|c| c.node_type() == NodeType::ListItem)
        }),
    )
}

fn finish(state: &EditorState, start: usize, end: usize, nodes: Vec<Node>) -> Option<Transaction> {
    let mut tr = state.tr();
    if !tr.replace_with(start, end, nodes) {
        return None;
    }
    if let Some(selection) = follow_textblocks(state.doc(), tr.doc(), *state.selection()) {
        tr.set_selection(selection);
    }
    Some(tr)
}

/// Move the selected items into a sublist of the item before them.
///
/// When that item already ends in a list of the same kind the items are
/// appended to it. Not applicable to the first item of a list.
pub fn sink_list_item(state: &EditorState) -> Option<Transaction> {
    let range = list_item_range(state)?;
    let start_index = range.start_index();
    if start_index == 0 {
        return None;
    }
    let list = range.parent();
    let prev = list.child(start_index - 1);
    if prev.node_type() != NodeType::ListItem {
        return None;
    }
    let moved: Vec<Node> = (start_index..range.end_index())
        .map(|i| list.child(i).clone())
        .collect();

    let new_prev = match prev.last_child() {
        Some(nested) if nested.node_type() == list.node_type() => {
            let nested = nested.copy(nested.content().append(&Fragment::from_nodes(moved)));
            prev.copy(prev.content().replace_child(prev.child_count() - 1, nested))
        }
        _ => {
            let sublist = Node::element(NodeKind::with_defaults(list.node_type())?, moved);
            prev.copy(prev.content().append(&Fragment::from_node(sublist)))
        }
    };
    let start = range.start() - prev.node_size();
    finish(state, start, range.end(), vec![new_prev])
}

/// Move the selected items one level out.
///
/// Nested items become siblings of their parent item, taking any items after
/// them along as their own sublist. Items of a top-level list are unwrapped
/// into plain blocks, splitting the list around them.
pub fn lift_list_item(state: &EditorState) -> Option<Transaction> {
    let range = list_item_range(state)?;
    let in_item = range.depth > 0
        && range.from.node(range.depth - 1).node_type() == NodeType::ListItem;
    if in_item {
        lift_to_outer_list(state, &range)
    } else {
        lift_out_of_list(state, &range)
    }
}

fn lift_to_outer_list(state: &EditorState, range: &NodeRange<'_>) -> Option<Transaction> {
    let list = range.parent();
    let (start_index, end_index) = (range.start_index(), range.end_index());
    let item_depth = range.depth - 1;
    let outer_item = range.from.node(item_depth);
    let list_index = range.from.index(item_depth);

    let mut lifted: Vec<Node> = (start_index..end_index)
        .map(|i| list.child(i).clone())
        .collect();
    if end_index < list.child_count() {
        let trailing = Node::element(
            list.kind().clone(),
            (end_index..list.child_count()).map(|i| list.child(i).clone()).collect(),
        );
        let last = lifted.pop()?;
        lifted.push(last.copy(last.content().append(&Fragment::from_node(trailing))));
    }

    let mut outer_children = outer_item.content().to_vec();
    if start_index > 0 {
        outer_children[list_index] = Node::element(
            list.kind().clone(),
            (0..start_index).map(|i| list.child(i).clone()).collect(),
        );
    } else {
        outer_children.remove(list_index);
    }
    let mut nodes = vec![outer_item.copy(Fragment::from_nodes(outer_children))];
    nodes.extend(lifted);

    let start = range.from.before(item_depth);
    let end = range.from.after(item_depth);
    finish(state, start, end, nodes)
}

fn lift_out_of_list(state: &EditorState, range: &NodeRange<'_>) -> Option<Transaction> {
    let list = range.parent();
    let (start_index, end_index) = (range.start_index(), range.end_index());
    let mut nodes = Vec::new();
    if start_index > 0 {
        nodes.push(Node::element(
            list.kind().clone(),
            (0..start_index).map(|i| list.child(i).clone()).collect(),
        ));
    }
    for i in start_index..end_index {
        nodes.extend(list.child(i).content().iter().cloned());
    }
    if end_index < list.child_count() {
        nodes.push(Node::element(
            list.kind().clone(),
            (end_index..list.child_count()).map(|i| list.child(i).clone()).collect(),
        ));
    }
    let start = range.from.before(range.depth);
    let end = range.from.after(range.depth);
    finish(state, start, end, nodes)
}
