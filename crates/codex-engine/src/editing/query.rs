//! Read-only questions commands ask about the current state.

use crate::model::Node;
use crate::schema::NodeType;
use crate::state::{EditorState, Selection, textblock_ranges};

/// Whether some ancestor of the selection start can take a `node_type` child
/// at the selection's index.
pub fn can_insert(state: &EditorState, node_type: NodeType) -> bool {
    let Some(rfrom) = state.doc().resolve(state.selection().from()) else {
        return false;
    };
    (0..=rfrom.depth()).rev().any(|d| {
        let index = rfrom.index(d);
        rfrom.node(d).can_replace_with(index, index, node_type)
    })
}

/// Whether the selection touches a code block.
pub fn selection_in_code_block(state: &EditorState) -> bool {
    let (from, to) = state.selection().range(state.doc());
    let mut found = false;
    state.doc().nodes_between(from, to, &mut |node, _, _, _| {
        if node.node_type() == NodeType::CodeBlock {
            found = true;
        }
        !found && !node.is_inline()
    });
    found
}

/// Whether the selection head sits inside a table cell.
pub fn is_in_table(state: &EditorState) -> bool {
    state
        .doc()
        .resolve(state.selection().head())
        .and_then(|r| r.find_ancestor(|n| n.node_type().is_table_cell()))
        .is_some()
}

/// The code block holding the whole selection, with the position where its
/// content starts.
pub fn enclosing_code_block(state: &EditorState) -> Option<(usize, &Node)> {
    let doc = state.doc();
    let (from, to) = state.selection().range(doc);
    let rfrom = doc.resolve(from)?;
    let depth = rfrom.depth();
    if rfrom.parent().node_type() != NodeType::CodeBlock || to > rfrom.end(depth) {
        return None;
    }
    Some((rfrom.start(depth), rfrom.parent()))
}

/// Non-atom textblocks overlapping `from..to`, with their positions.
pub fn touched_textblocks(doc: &Node, from: usize, to: usize) -> Vec<(usize, Node)> {
    let mut blocks = Vec::new();
    doc.nodes_between(from, to, &mut |node, pos, _, _| {
        if node.is_atom() || node.is_inline() {
            return false;
        }
        if node.is_textblock() {
            blocks.push((pos, node.clone()));
            return false;
        }
        true
    });
    blocks
}

/// Carry a text selection across an edit that moved textblocks around
/// without changing their order or content.
pub(crate) fn follow_textblocks(before: &Node, after: &Node, selection: Selection) -> Option<Selection> {
    let Selection::Text { anchor, head } = selection else {
        return None;
    };
    let old = textblock_ranges(before);
    let new = textblock_ranges(after);
    if old.len() != new.len() {
        return None;
    }
    let map = |pos: usize| {
        let i = old.iter().position(|&(s, e)| s <= pos && pos <= e)?;
        let (new_start, new_end) = new[i];
        Some((new_start + pos - old[i].0).min(new_end))
    };
    Some(Selection::text(map(anchor)?, map(head)?))
}
