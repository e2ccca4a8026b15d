use serde::{Deserialize, Serialize};

use crate::model::Node;
use crate::transform::{Assoc, Mapping};

/// The editor selection.
///
/// Text selections always have both ends inside textblocks; a node selection
/// selects the single non-text node starting at `pos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selection {
    Text { anchor: usize, head: usize },
    Node { pos: usize },
}

impl Selection {
    pub fn cursor(pos: usize) -> Self {
        Selection::Text {
            anchor: pos,
            head: pos,
        }
    }

    pub fn text(anchor: usize, head: usize) -> Self {
        Selection::Text { anchor, head }
    }

    pub fn node(pos: usize) -> Self {
        Selection::Node { pos }
    }

    pub fn anchor(&self) -> usize {
        match *self {
            Selection::Text { anchor, .. } => anchor,
            Selection::Node { pos } => pos,
        }
    }

    pub fn head(&self) -> usize {
        match *self {
            Selection::Text { head, .. } => head,
            Selection::Node { pos } => pos,
        }
    }

    pub fn from(&self) -> usize {
        self.anchor().min(self.head())
    }

    /// End of the selection. For a node selection this needs the node's size,
    /// so use [`Selection::range`] when a document is at hand.
    pub fn to(&self) -> usize {
        self.anchor().max(self.head())
    }

    /// The selected range `(from, to)` in `doc`.
    pub fn range(&self, doc: &Node) -> (usize, usize) {
        match *self {
            Selection::Text { .. } => (self.from(), self.to()),
            Selection::Node { pos } => {
                let size = doc.node_at(pos).map_or(0, Node::node_size);
                (pos, pos + size)
            }
        }
    }

    pub fn empty(&self) -> bool {
        matches!(self, Selection::Text { anchor, head } if anchor == head)
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Selection::Node { .. })
    }

    pub fn selected_node<'a>(&self, doc: &'a Node) -> Option<&'a Node> {
        match *self {
            Selection::Node { pos } => doc.node_at(pos),
            Selection::Text { .. } => None,
        }
    }

    /// Map the selection through document changes, keeping it valid in `doc`.
    pub fn map(&self, doc: &Node, mapping: &Mapping) -> Selection {
        match *self {
            Selection::Text { anchor, head } => {
                let size = doc.content().size();
                let anchor = mapping.map(anchor, Assoc::Right).min(size);
                let head = mapping.map(head, Assoc::Right).min(size);
                if is_cursor_pos(doc, anchor) && is_cursor_pos(doc, head) {
                    Selection::Text { anchor, head }
                } else {
                    let head = Selection::near(doc, head, true);
                    if anchor == head.head() || !is_cursor_pos(doc, anchor) {
                        head
                    } else {
                        Selection::Text {
                            anchor,
                            head: head.head(),
                        }
                    }
                }
            }
            Selection::Node { pos } => {
                let result = mapping.map_result(pos, Assoc::Right);
                let pos = result.pos.min(doc.content().size());
                if !result.deleted && doc.node_at(pos).is_some_and(|n| !n.is_text()) {
                    Selection::Node { pos }
                } else {
                    Selection::near(doc, pos, true)
                }
            }
        }
    }

    /// Whether this selection is valid in `doc`.
    pub fn is_valid(&self, doc: &Node) -> bool {
        match *self {
            Selection::Text { anchor, head } => is_cursor_pos(doc, anchor) && is_cursor_pos(doc, head),
            Selection::Node { pos } => doc.node_at(pos).is_some_and(|n| !n.is_text()),
        }
    }

    /// A cursor at the start of the document.
    pub fn at_start(doc: &Node) -> Selection {
        Selection::near(doc, 0, true)
    }

    pub fn at_end(doc: &Node) -> Selection {
        Selection::near(doc, doc.content().size(), false)
    }

    /// The valid selection nearest to `pos`, searching in the `forward`
    /// direction first.
    pub fn near(doc: &Node, pos: usize, forward: bool) -> Selection {
        let blocks = textblock_ranges(doc);
        if blocks.iter().any(|&(s, e)| s <= pos && pos <= e) {
            return Selection::cursor(pos);
        }
        let after = blocks.iter().find(|(s, _)| *s >= pos).map(|(s, _)| *s);
        let before = blocks.iter().rev().find(|(_, e)| *e <= pos).map(|(_, e)| *e);
        let found = if forward {
            after.or(before)
        } else {
            before.or(after)
        };
        match found {
            Some(p) => Selection::cursor(p),
            None => first_selectable_node(doc)
                .map(Selection::node)
                .unwrap_or_else(|| Selection::cursor(0)),
        }
    }
}

/// Whether `pos` lies inside the content of an editable textblock.
pub fn is_cursor_pos(doc: &Node, pos: usize) -> bool {
    doc.resolve(pos)
        .is_some_and(|r| r.parent().is_textblock() && !r.parent().is_atom())
}

/// Content ranges `(start, end)` of every textblock in document order.
pub fn textblock_ranges(doc: &Node) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    doc.descendants(&mut |node, pos, _, _| {
        if node.is_atom() {
            return false;
        }
        if node.is_textblock() {
            ranges.push((pos + 1, pos + 1 + node.content().size()));
            return false;
        }
        !node.is_inline()
    });
    ranges
}

fn first_selectable_node(doc: &Node) -> Option<usize> {
    let mut found = None;
    doc.descendants(&mut |node, pos, _, _| {
        if found.is_some() {
            return false;
        }
        if node.is_atom() && !node.is_inline() {
            found = Some(pos);
            return false;
        }
        true
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::StepMap;
    use crate::tests::*;

    #[test]
    fn test_from_to_and_empty() {
        let sel = Selection::text(7, 3);
        assert_eq!((sel.from(), sel.to()), (3, 7));
        assert!(!sel.empty());
        assert!(Selection::cursor(4).empty());
        assert!(!Selection::node(0).empty());
    }

    #[test]
    fn test_node_selection_range() {
        let d = doc(vec![p(vec![t("ab")]), hr()]);
        assert_eq!(Selection::node(4).range(&d), (4, 5));
    }

    #[test]
    fn test_near_snaps_into_textblocks() {
        let d = doc(vec![p(vec![t("ab")]), hr(), p(vec![t("cd")])]);
        assert_eq!(Selection::near(&d, 4, true), Selection::cursor(6));
        assert_eq!(Selection::near(&d, 4, false), Selection::cursor(3));
        assert_eq!(Selection::near(&d, 2, true), Selection::cursor(2));
        assert_eq!(Selection::at_start(&d), Selection::cursor(1));
        assert_eq!(Selection::at_end(&d), Selection::cursor(8));
    }

    #[test]
    fn test_near_falls_back_to_node_selection() {
        let d = doc(vec![hr()]);
        assert_eq!(Selection::at_start(&d), Selection::node(0));
    }

    #[test]
    fn test_map_is_clamped_into_document() {
        let d = doc(vec![p(vec![t("ab")])]);
        let mapping = Mapping::from_maps(vec![StepMap::new(0, 0, 10)]);
        assert_eq!(Selection::cursor(3).map(&d, &mapping), Selection::cursor(3));
    }

    #[test]
    fn test_map_deleted_node_selection_becomes_cursor() {
        let d = doc(vec![p(vec![t("ab")])]);
        let mapping = Mapping::from_maps(vec![StepMap::new(4, 1, 0)]);
        assert_eq!(Selection::node(4).map(&d, &mapping), Selection::cursor(3));
    }
}
