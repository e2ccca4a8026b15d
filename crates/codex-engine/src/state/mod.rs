//! Editor state: an immutable document, a selection, stored marks and the
//! undo history. States are replaced wholesale by applying transactions.

pub mod history;
pub mod selection;
pub mod transaction;

pub use history::*;
pub use selection::*;
pub use transaction::*;

use crate::model::{MarkSet, Node};

#[derive(Debug, Clone)]
pub struct EditorState {
    doc: Node,
    selection: Selection,
    stored_marks: Option<MarkSet>,
    history: History,
}

impl EditorState {
    /// A state for `doc` with the cursor at the start.
    pub fn new(doc: Node) -> Self {
        let selection = Selection::at_start(&doc);
        Self::with_selection(doc, selection)
    }

    pub fn with_selection(doc: Node, selection: Selection) -> Self {
        Self {
            doc,
            selection,
            stored_marks: None,
            history: History::default(),
        }
    }

    pub fn with_history(mut self, history: History) -> Self {
        self.history = history;
        self
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn stored_marks(&self) -> Option<&MarkSet> {
        self.stored_marks.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn tr(&self) -> Transaction {
        Transaction::new(self)
    }

    /// The state after `tr`. The current state is left untouched.
    pub fn apply(&self, tr: Transaction) -> EditorState {
        let doc = tr.doc().clone();
        let mut selection = tr.selection();
        if !selection.is_valid(&doc) {
            selection = Selection::near(&doc, selection.head(), true);
        }
        let stored_marks = if selection.empty() {
            tr.stored_marks().cloned()
        } else {
            None
        };
        let history = self.history.apply(&tr, self.selection);
        EditorState {
            doc,
            selection,
            stored_marks,
            history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mark;
    use crate::tests::*;

    #[test]
    fn test_apply_never_mutates_previous_state() {
        let before = EditorState::new(doc(vec![p(vec![t("ab")])]));
        let mut tr = before.tr();
        tr.insert_text("x", 1, 1);
        let after = before.apply(tr);
        assert_eq!(before.doc(), &doc(vec![p(vec![t("ab")])]));
        assert_eq!(after.doc(), &doc(vec![p(vec![t("xab")])]));
    }

    #[test]
    fn test_stored_marks_survive_only_at_cursor() {
        let s = EditorState::new(doc(vec![p(vec![t("ab")])]));
        let mut tr = s.tr();
        tr.set_stored_marks(Some(MarkSet::from_marks([Mark::Strong])));
        let s = s.apply(tr);
        assert!(s.stored_marks().is_some());

        let mut tr = s.tr();
        tr.set_selection(Selection::text(1, 3));
        let s = s.apply(tr);
        assert!(s.stored_marks().is_none());
    }

    #[test]
    fn test_typing_with_stored_marks() {
        let s = EditorState::new(doc(vec![p(vec![])]));
        let mut tr = s.tr();
        tr.set_stored_marks(Some(MarkSet::from_marks([Mark::Em])));
        let s = s.apply(tr);
        let mut tr = s.tr();
        tr.insert_text("hi", 1, 1);
        let s = s.apply(tr);
        assert_eq!(s.doc(), &doc(vec![p(vec![em("hi")])]));
        assert!(s.stored_marks().is_none());
    }
}
