use crate::model::{Mark, Node};
use crate::schema::MarkType;
use crate::state::{EditorState, Transaction};

/// Toggle `mark` over the selection.
///
/// At a collapsed cursor this only flips the stored marks used for the next
/// typed text. Over a range the mark is removed when the entire range already
/// carries it and added everywhere otherwise, so a partially marked range
/// always ends up fully marked.
pub fn toggle_mark(state: &EditorState, mark: &Mark) -> Option<Transaction> {
    let doc = state.doc();
    let selection = state.selection();
    let (from, to) = selection.range(doc);
    let mark_type = mark.mark_type();
    if !mark_applies(doc, from, to, mark_type) {
        return None;
    }
    let mut tr = state.tr();
    if selection.empty() {
        let current = match state.stored_marks() {
            Some(stored) => stored.clone(),
            None => doc.resolve(from)?.marks(),
        };
        let next = if current.has_type(mark_type) {
            current.remove_type(mark_type)
        } else {
            current.add(mark)
        };
        tr.set_stored_marks(Some(next));
        return Some(tr);
    }
    if range_fully_marked(doc, from, to, mark_type) {
        tr.remove_mark(from, to, mark_type);
    } else {
        tr.add_mark(from, to, mark.clone());
    }
    Some(tr)
}

/// Whether the mark is on at the selection, for pressed toolbar buttons.
pub fn mark_active(state: &EditorState, mark_type: MarkType) -> bool {
    let doc = state.doc();
    let selection = state.selection();
    let (from, to) = selection.range(doc);
    if selection.empty() {
        match state.stored_marks() {
            Some(stored) => stored.has_type(mark_type),
            None => doc.resolve(from).is_some_and(|r| r.marks().has_type(mark_type)),
        }
    } else {
        doc.range_has_mark(from, to, mark_type)
    }
}

/// Whether some textblock in `from..to` accepts marks.
fn mark_applies(doc: &Node, from: usize, to: usize, mark_type: MarkType) -> bool {
    let mut applies = false;
    doc.nodes_between(from, to, &mut |node, _, _, _| {
        if applies {
            return false;
        }
        applies = node.is_textblock() && node.node_type().spec().marks_allowed;
        !node.is_inline()
    });
    log::trace!("{mark_type:?} applies to {from}..{to}: {applies}");
    applies
}

/// Whether every markable inline node in `from..to` carries `mark_type`.
fn range_fully_marked(doc: &Node, from: usize, to: usize, mark_type: MarkType) -> bool {
    let mut seen = false;
    let mut all = true;
    doc.nodes_between(from, to, &mut |node, _, parent, _| {
        if !node.is_inline() {
            return all;
        }
        if parent.node_type().spec().marks_allowed {
            seen = true;
            all &= node.marks().has_type(mark_type);
        }
        false
    });
    seen && all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MarkSet;
    use crate::tests::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_range_becomes_fully_marked() {
        let s = range_state(doc(vec![p(vec![strong("ab"), t("cd")])]), 1, 5);
        let tr = toggle_mark(&s, &Mark::Strong).unwrap();
        assert_eq!(tr.doc(), &doc(vec![p(vec![strong("abcd")])]));
    }

    #[test]
    fn test_toggle_twice_restores_document() {
        let original = doc(vec![p(vec![t("one "), em("two")]), p(vec![t("three")])]);
        let s = range_state(original.clone(), 2, 14);
        let s = s.apply(toggle_mark(&s, &Mark::Strong).unwrap());
        assert_ne!(s.doc(), &original);
        let s = s.apply(toggle_mark(&s, &Mark::Strong).unwrap());
        assert_eq!(s.doc(), &original);
    }

    #[test]
    fn test_collapsed_cursor_toggles_stored_marks() {
        let s = cursor_state(doc(vec![p(vec![t("ab")])]), 2);
        let s = s.apply(toggle_mark(&s, &Mark::Em).unwrap());
        assert_eq!(s.stored_marks(), Some(&MarkSet::from_marks([Mark::Em])));
        assert!(mark_active(&s, MarkType::Em));
        assert_eq!(s.doc(), &doc(vec![p(vec![t("ab")])]));

        let s = s.apply(toggle_mark(&s, &Mark::Em).unwrap());
        assert!(!mark_active(&s, MarkType::Em));
    }

    #[test]
    fn test_cursor_inside_marked_text_turns_mark_off() {
        let s = cursor_state(doc(vec![p(vec![strong("abc")])]), 2);
        assert!(mark_active(&s, MarkType::Strong));
        let s = s.apply(toggle_mark(&s, &Mark::Strong).unwrap());
        assert_eq!(s.stored_marks(), Some(&MarkSet::empty()));
    }

    #[test]
    fn test_not_applicable_in_code_block() {
        let s = range_state(doc(vec![code("", "let x")]), 1, 4);
        assert!(toggle_mark(&s, &Mark::Strong).is_none());
    }

    #[test]
    fn test_link_replaces_existing_link() {
        let s = range_state(doc(vec![p(vec![t("ab")])]), 1, 3);
        let s = s.apply(toggle_mark(&s, &Mark::link("https://a.example")).unwrap());
        assert!(mark_active(&s, MarkType::Link));
        let s = s.apply(toggle_mark(&s, &Mark::link("https://b.example")).unwrap());
        assert_eq!(s.doc(), &doc(vec![p(vec![t("ab")])]));
    }
}
