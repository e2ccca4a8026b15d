use serde::{Deserialize, Serialize};

use super::query::{follow_textblocks, selection_in_code_block, touched_textblocks};
use crate::model::{Align, Node, NodeKind};
use crate::schema::NodeType;
use crate::state::{EditorState, Selection, Transaction};
use crate::transform::Assoc;

/// The two list flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Bullet,
    Ordered,
}

impl ListKind {
    pub fn node_kind(self) -> NodeKind {
        match self {
            ListKind::Bullet => NodeKind::BulletList,
            ListKind::Ordered => NodeKind::OrderedList { order: 1 },
        }
    }

    pub fn of(node: &Node) -> Option<Self> {
        match node.node_type() {
            NodeType::BulletList => Some(ListKind::Bullet),
            NodeType::OrderedList => Some(ListKind::Ordered),
            _ => None,
        }
    }
}

/// Textblock types a selection can be switched to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Heading { level: u8 },
    CodeBlock { params: String },
}

impl BlockKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            BlockKind::Paragraph => NodeType::Paragraph,
            BlockKind::Heading { .. } => NodeType::Heading,
            BlockKind::CodeBlock { .. } => NodeType::CodeBlock,
        }
    }

    /// The node kind to give a block, keeping its alignment where the new
    /// type has one.
    pub fn node_kind(&self, align: Option<Align>) -> NodeKind {
        let align = align.unwrap_or_default();
        match self {
            BlockKind::Paragraph => NodeKind::Paragraph { align },
            BlockKind::Heading { level } => NodeKind::Heading {
                level: (*level).clamp(1, 6),
                align,
            },
            BlockKind::CodeBlock { params } => NodeKind::code_block(params.clone()),
        }
    }

    /// Whether `node` already is a block of this kind.
    pub fn matches(&self, node: &Node) -> bool {
        match (self, node.kind()) {
            (BlockKind::Paragraph, NodeKind::Paragraph { .. }) => true,
            (BlockKind::Heading { level }, NodeKind::Heading { level: l, .. }) => level == l,
            (BlockKind::CodeBlock { params }, NodeKind::CodeBlock { params: p, .. }) => params == p,
            _ => false,
        }
    }
}

/// Wrap the selected blocks in a list, one item per paragraph. Blocks that
/// cannot start an item join the item before them.
///
/// Inside a list of the other flavour the list is retyped instead; inside a
/// list of the same flavour there is nothing to do.
pub fn wrap_in_list(state: &EditorState, list: ListKind) -> Option<Transaction> {
    let doc = state.doc();
    let (from, to) = state.selection().range(doc);
    let rfrom = doc.resolve(from)?;
    let rto = doc.resolve(to)?;

    if let Some(depth) = rfrom.find_ancestor(|n| n.node_type().is_list())
        && to <= rfrom.end(depth)
    {
        if ListKind::of(rfrom.node(depth)) == Some(list) {
            return None;
        }
        let mut tr = state.tr();
        let changed = tr.set_node_type(rfrom.before(depth), list.node_kind());
        return changed.then_some(tr);
    }

    let range = rfrom.block_range(&rto, None)?;
    let parent = range.parent();
    let (start, end) = (range.start_index(), range.end_index());
    if !parent.can_replace_with(start, end, list.node_kind().node_type()) {
        return None;
    }
    let mut items: Vec<Vec<Node>> = Vec::new();
    for i in start..end {
        let block = parent.child(i).clone();
        if block.node_type() == NodeType::Paragraph {
            items.push(vec![block]);
        } else {
            items.last_mut()?.push(block);
        }
    }
    let items = items
        .into_iter()
        .map(|children| Node::element(NodeKind::ListItem, children))
        .collect();
    let wrapped = Node::element(list.node_kind(), items);

    let mut tr = state.tr();
    if !tr.replace_with(range.start(), range.end(), vec![wrapped]) {
        return None;
    }
    if let Some(selection) = follow_textblocks(doc, tr.doc(), *state.selection()) {
        tr.set_selection(selection);
    }
    Some(tr)
}

pub fn wrap_in_blockquote(state: &EditorState) -> Option<Transaction> {
    let doc = state.doc();
    let (from, to) = state.selection().range(doc);
    let rfrom = doc.resolve(from)?;
    let rto = doc.resolve(to)?;
    let range = rfrom.block_range(&rto, None)?;
    let parent = range.parent();
    let (start, end) = (range.start_index(), range.end_index());
    if !parent.can_replace_with(start, end, NodeType::Blockquote) {
        return None;
    }
    let children = (start..end).map(|i| parent.child(i).clone()).collect();
    let quote = Node::element(NodeKind::Blockquote, children);

    let mut tr = state.tr();
    if !tr.replace_with(range.start(), range.end(), vec![quote]) {
        return None;
    }
    if let Some(selection) = follow_textblocks(doc, tr.doc(), *state.selection()) {
        tr.set_selection(selection);
    }
    Some(tr)
}

/// Retype every textblock touched by the selection.
///
/// Applicable when at least one block is not already of that kind and its
/// parent accepts the new type in its place.
pub fn set_block_type(state: &EditorState, kind: &BlockKind) -> Option<Transaction> {
    let doc = state.doc();
    let (from, to) = state.selection().range(doc);
    let target = kind.node_type();
    let mut targets = Vec::new();
    doc.nodes_between(from, to, &mut |node, pos, parent, index| {
        if node.is_inline() || node.is_atom() {
            return false;
        }
        if !node.is_textblock() {
            return true;
        }
        if !kind.matches(node)
            && (node.node_type() == target || parent.can_replace_with(index, index + 1, target))
        {
            targets.push((pos, kind.node_kind(node.kind().align())));
        }
        false
    });
    if targets.is_empty() {
        return None;
    }

    let mut tr = state.tr();
    let mut changed = false;
    for (pos, new_kind) in targets {
        let pos = tr.mapping().map(pos, Assoc::Right);
        changed |= tr.set_block_type(pos, new_kind);
    }
    changed.then_some(tr)
}

/// Turn the selection into a code block.
///
/// A cursor or a selection inside one textblock retypes that block. A
/// selection over several textblocks merges the text of every non-empty one,
/// newline separated, into a single code block replacing the whole range.
pub fn make_code_block(state: &EditorState, language: &str) -> Option<Transaction> {
    let doc = state.doc();
    let (from, to) = state.selection().range(doc);
    let blocks = touched_textblocks(doc, from, to);
    if blocks.len() <= 1 {
        return set_block_type(
            state,
            &BlockKind::CodeBlock {
                params: language.to_string(),
            },
        );
    }

    let rfrom = doc.resolve(from)?;
    let rto = doc.resolve(to)?;
    let range = rfrom.block_range(&rto, None)?;
    if !range
        .parent()
        .can_replace_with(range.start_index(), range.end_index(), NodeType::CodeBlock)
    {
        return None;
    }
    let text = blocks
        .iter()
        .map(|(_, block)| block.text_between(0, block.content().size(), ""))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if text.is_empty() {
        return None;
    }
    let code = Node::element(NodeKind::code_block(language), vec![Node::text(text)]);
    let code_end = range.start() + code.node_size() - 1;

    let mut tr = state.tr();
    if !tr.replace_with(range.start(), range.end(), vec![code]) {
        return None;
    }
    tr.set_selection(Selection::cursor(code_end));
    Some(tr)
}

/// Set the alignment of every paragraph and heading touched by the selection.
pub fn align_selection(state: &EditorState, align: Align) -> Option<Transaction> {
    if selection_in_code_block(state) {
        return None;
    }
    let doc = state.doc();
    let (from, to) = state.selection().range(doc);
    let mut alignable = false;
    let mut targets = Vec::new();
    doc.nodes_between(from, to, &mut |node, pos, _, _| {
        if let Some(kind) = node.kind().with_align(align) {
            alignable = true;
            if *node.kind() != kind {
                targets.push((pos, kind));
            }
            return false;
        }
        !node.is_inline()
    });
    if !alignable {
        return None;
    }
    let mut tr = state.tr();
    for (pos, kind) in targets {
        tr.set_node_type(pos, kind);
    }
    Some(tr)
}

/// Flip the `collapsed` flag of the code block at `pos`.
pub fn toggle_code_collapse(state: &EditorState, pos: usize) -> Option<Transaction> {
    let NodeKind::CodeBlock { params, collapsed } = state.doc().node_at(pos)?.kind() else {
        return None;
    };
    let kind = NodeKind::CodeBlock {
        params: params.clone(),
        collapsed: !collapsed,
    };
    let mut tr = state.tr();
    tr.set_node_type(pos, kind).then_some(tr)
}

/// Select the closest ancestor node that holds the whole selection.
pub fn select_parent_node(state: &EditorState) -> Option<Transaction> {
    let doc = state.doc();
    let (from, to) = state.selection().range(doc);
    let rfrom = doc.resolve(from)?;
    let depth = rfrom.shared_depth(to);
    if depth == 0 {
        return None;
    }
    let mut tr = state.tr();
    tr.set_selection(Selection::node(rfrom.before(depth)));
    Some(tr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_wrap_paragraphs_in_bullet_list() {
        let s = range_state(doc(vec![p(vec![t("a")]), p(vec![t("b")])]), 1, 5);
        let tr = wrap_in_list(&s, ListKind::Bullet).unwrap();
        assert_eq!(
            tr.doc(),
            &doc(vec![ul(vec![li(vec![p(vec![t("a")])]), li(vec![p(vec![t("b")])])])])
        );
        assert_eq!(tr.selection(), Selection::text(3, 9));
    }

    #[test]
    fn test_wrap_keeps_non_paragraphs_in_previous_item() {
        let s = range_state(doc(vec![p(vec![t("a")]), code("", "x")]), 1, 5);
        let tr = wrap_in_list(&s, ListKind::Ordered).unwrap();
        assert_eq!(tr.doc(), &doc(vec![ol(vec![li(vec![p(vec![t("a")]), code("", "x")])])]));
    }

    #[test]
    fn test_wrap_inside_other_list_swaps_type() {
        let s = cursor_state(doc(vec![ul(vec![li(vec![p(vec![t("a")])])])]), 3);
        let tr = wrap_in_list(&s, ListKind::Ordered).unwrap();
        assert_eq!(tr.doc(), &doc(vec![ol(vec![li(vec![p(vec![t("a")])])])]));
        assert!(wrap_in_list(&s, ListKind::Bullet).is_none());
    }

    #[test]
    fn test_wrap_in_blockquote() {
        let s = cursor_state(doc(vec![p(vec![t("quote")])]), 3);
        let tr = wrap_in_blockquote(&s).unwrap();
        assert_eq!(tr.doc(), &doc(vec![blockquote(vec![p(vec![t("quote")])])]));
        assert_eq!(tr.selection(), Selection::cursor(4));
    }

    #[rstest]
    #[case(BlockKind::Heading { level: 2 }, h(2, vec![t("ab")]))]
    #[case(BlockKind::Paragraph, p(vec![t("ab")]))]
    #[case(BlockKind::CodeBlock { params: "rust".into() }, code("rust", "ab"))]
    fn test_set_block_type(#[case] kind: BlockKind, #[case] expected: Node) {
        let s = cursor_state(doc(vec![h(1, vec![t("ab")])]), 2);
        let tr = set_block_type(&s, &kind).unwrap();
        assert_eq!(tr.doc(), &doc(vec![expected]));
    }

    #[test]
    fn test_set_block_type_not_applicable_when_unchanged() {
        let s = cursor_state(doc(vec![p(vec![t("ab")])]), 2);
        assert!(set_block_type(&s, &BlockKind::Paragraph).is_none());
    }

    #[test]
    fn test_heading_not_allowed_as_first_list_item_child() {
        let s = cursor_state(doc(vec![ul(vec![li(vec![p(vec![t("a")])])])]), 3);
        assert!(set_block_type(&s, &BlockKind::Heading { level: 1 }).is_none());
    }

    #[test]
    fn test_set_block_type_keeps_alignment() {
        let centered = Node::element(NodeKind::Paragraph { align: Align::Center }, vec![t("ab")]);
        let s = cursor_state(doc(vec![centered]), 2);
        let tr = set_block_type(&s, &BlockKind::Heading { level: 3 }).unwrap();
        assert_eq!(
            tr.doc().child(0).kind(),
            &NodeKind::Heading {
                level: 3,
                align: Align::Center
            }
        );
    }

    #[test]
    fn test_make_code_block_merges_paragraphs() {
        let d = doc(vec![p(vec![t("one")]), p(vec![]), p(vec![strong("two")])]);
        let end = d.content().size() - 1;
        let s = range_state(d, 1, end);
        let tr = make_code_block(&s, "py").unwrap();
        assert_eq!(tr.doc(), &doc(vec![code("py", "one\ntwo")]));
        assert_eq!(tr.selection(), Selection::cursor(8));
    }

    #[test]
    fn test_make_code_block_at_cursor_retypes() {
        let s = cursor_state(doc(vec![p(vec![em("x"), br(), t("y")])]), 1);
        let tr = make_code_block(&s, "").unwrap();
        assert_eq!(tr.doc(), &doc(vec![code("", "x\ny")]));
    }

    #[test]
    fn test_make_code_block_from_empty_blocks_is_not_applicable() {
        let s = range_state(doc(vec![p(vec![]), p(vec![])]), 1, 3);
        assert!(make_code_block(&s, "").is_none());
    }

    #[test]
    fn test_align_selection() {
        let s = range_state(doc(vec![p(vec![t("a")]), h(1, vec![t("b")])]), 1, 5);
        let tr = align_selection(&s, Align::Right).unwrap();
        assert_eq!(tr.doc().child(0).kind().align(), Some(Align::Right));
        assert_eq!(tr.doc().child(1).kind().align(), Some(Align::Right));
    }

    #[test]
    fn test_align_disabled_in_code_block() {
        let s = cursor_state(doc(vec![code("", "x")]), 1);
        assert!(align_selection(&s, Align::Center).is_none());
    }

    #[test]
    fn test_toggle_code_collapse() {
        let s = cursor_state(doc(vec![code("js", "x"), p(vec![])]), 4);
        let s = s.apply(toggle_code_collapse(&s, 0).unwrap());
        assert_eq!(
            s.doc().child(0).kind(),
            &NodeKind::CodeBlock {
                params: "js".into(),
                collapsed: true
            }
        );
        assert_eq!(s.doc().child(0).text_content(), "x");
        assert!(toggle_code_collapse(&s, 3).is_none());
    }

    #[test]
    fn test_select_parent_node() {
        let s = cursor_state(doc(vec![blockquote(vec![p(vec![t("a")])])]), 2);
        let s = s.apply(select_parent_node(&s).unwrap());
        assert_eq!(s.selection(), &Selection::node(1));
        let s = s.apply(select_parent_node(&s).unwrap());
        assert_eq!(s.selection(), &Selection::node(0));
        assert!(select_parent_node(&s).is_none());
    }
}
