use std::sync::Arc;

use super::{EditorState, HistoryAction, Selection, Transaction};
use crate::transform::Step;

pub const DEFAULT_MAX_DEPTH: usize = 100;
pub const DEFAULT_NEW_GROUP_DELAY_MS: u64 = 500;

/// A group of inverse steps undone or redone as one unit, with the selection
/// to restore afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryGroup {
    pub steps: Vec<Step>,
    pub selection: Selection,
}

/// Undo and redo stacks.
///
/// Changes arriving within `new_group_delay_ms` of the previous one and
/// touching the range it changed are merged into the same group, so a run of
/// typing undoes in one go.
#[derive(Debug, Clone)]
pub struct History {
    done: Vec<Arc<HistoryGroup>>,
    undone: Vec<Arc<HistoryGroup>>,
    prev_time: Option<u64>,
    prev_range: Option<(usize, usize)>,
    max_depth: usize,
    new_group_delay_ms: u64,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH, DEFAULT_NEW_GROUP_DELAY_MS)
    }
}

impl History {
    pub fn new(max_depth: usize, new_group_delay_ms: u64) -> Self {
        Self {
            done: Vec::new(),
            undone: Vec::new(),
            prev_time: None,
            prev_range: None,
            max_depth: max_depth.max(1),
            new_group_delay_ms,
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.done.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.undone.len()
    }

    /// Build the transaction that undoes the latest group.
    pub fn undo(&self, state: &EditorState) -> Option<Transaction> {
        let group = self.done.last()?;
        Some(replay(state, group, HistoryAction::Undo))
    }

    /// Build the transaction that redoes the latest undone group.
    pub fn redo(&self, state: &EditorState) -> Option<Transaction> {
        let group = self.undone.last()?;
        Some(replay(state, group, HistoryAction::Redo))
    }

    /// The history after `tr` was applied to a state whose selection was
    /// `selection_before`.
    pub fn apply(&self, tr: &Transaction, selection_before: Selection) -> History {
        let mut next = self.clone();
        match tr.history_action() {
            Some(HistoryAction::Undo) => {
                next.done.pop();
                next.undone.push(Arc::new(HistoryGroup {
                    steps: inverted(tr),
                    selection: selection_before,
                }));
                next.prev_time = None;
                next.prev_range = None;
            }
            Some(HistoryAction::Redo) => {
                next.undone.pop();
                next.done.push(Arc::new(HistoryGroup {
                    steps: inverted(tr),
                    selection: selection_before,
                }));
                next.prev_time = None;
                next.prev_range = None;
            }
            None if !tr.doc_changed() => {}
            None if !tr.add_to_history() => {
                log::debug!("untracked change, clearing history");
                next.done.clear();
                next.undone.clear();
                next.prev_time = None;
                next.prev_range = None;
            }
            None => {
                let steps = inverted(tr);
                let join = match (self.prev_time, self.done.last()) {
                    (Some(prev), Some(_)) => {
                        tr.time().saturating_sub(prev) < self.new_group_delay_ms
                            && is_adjacent(tr, self.prev_range)
                    }
                    _ => false,
                };
                if join && let Some(top) = next.done.pop() {
                    log::debug!("joining change into previous history group");
                    let mut merged = steps;
                    merged.extend(top.steps.iter().cloned());
                    next.done.push(Arc::new(HistoryGroup {
                        steps: merged,
                        selection: top.selection,
                    }));
                } else {
                    next.done.push(Arc::new(HistoryGroup {
                        steps,
                        selection: selection_before,
                    }));
                    if next.done.len() > next.max_depth {
                        let excess = next.done.len() - next.max_depth;
                        next.done.drain(..excess);
                    }
                }
                next.undone.clear();
                next.prev_time = Some(tr.time());
                next.prev_range = changed_range(tr);
            }
        }
        next
    }
}

/// Inverse steps of `tr` in the order they must be applied to undo it.
fn inverted(tr: &Transaction) -> Vec<Step> {
    tr.steps()
        .iter()
        .zip(tr.docs())
        .rev()
        .map(|(step, doc)| step.invert(doc))
        .collect()
}

fn replay(state: &EditorState, group: &HistoryGroup, action: HistoryAction) -> Transaction {
    let mut tr = state.tr();
    for step in &group.steps {
        tr.step(step.clone());
    }
    let selection = if group.selection.is_valid(tr.doc()) {
        group.selection
    } else {
        Selection::near(tr.doc(), group.selection.head(), true)
    };
    tr.set_selection(selection);
    tr.set_history_action(action);
    tr
}

/// Whether the first step of `tr` touches the range changed by the previous
/// transaction.
fn is_adjacent(tr: &Transaction, prev: Option<(usize, usize)>) -> bool {
    let Some((prev_from, prev_to)) = prev else {
        return false;
    };
    let Some(first) = tr.mapping().maps().first() else {
        return false;
    };
    let mut adjacent = false;
    first.for_each(|old_start, old_end, _, _| {
        if old_start <= prev_to && old_end >= prev_from {
            adjacent = true;
        }
    });
    adjacent
}

/// The range covered by the last step's new content, in final coordinates.
fn changed_range(tr: &Transaction) -> Option<(usize, usize)> {
    let last = tr.mapping().maps().last()?;
    let mut range = None;
    last.for_each(|_, _, new_start, new_end| range = Some((new_start, new_end)));
    range.or_else(|| match tr.steps().last()? {
        Step::AddMark { from, to, .. } | Step::RemoveMark { from, to, .. } => Some((*from, *to)),
        Step::SetNodeType { pos, .. } => Some((*pos, *pos)),
        Step::Replace { .. } => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use pretty_assertions::assert_eq;

    fn type_at(state: &EditorState, text: &str, time: u64) -> EditorState {
        let mut tr = state.tr();
        let pos = state.selection().head();
        tr.insert_text(text, pos, pos);
        tr.set_time(time);
        state.apply(tr)
    }

    #[test]
    fn test_typing_within_delay_coalesces() {
        let s = EditorState::with_selection(doc(vec![p(vec![])]), Selection::cursor(1));
        let s = type_at(&s, "a", 1_000);
        let s = type_at(&s, "b", 1_200);
        let s = type_at(&s, "c", 1_400);
        assert_eq!(s.history().undo_depth(), 1);

        let undo = s.history().undo(&s).unwrap();
        let s = s.apply(undo);
        assert_eq!(s.doc(), &doc(vec![p(vec![])]));
        assert_eq!(s.selection(), &Selection::cursor(1));
        assert_eq!(s.history().redo_depth(), 1);
    }

    #[test]
    fn test_pause_starts_new_group() {
        let s = EditorState::with_selection(doc(vec![p(vec![])]), Selection::cursor(1));
        let s = type_at(&s, "a", 1_000);
        let s = type_at(&s, "b", 2_000);
        assert_eq!(s.history().undo_depth(), 2);

        let s = s.apply(s.history().undo(&s).unwrap());
        assert_eq!(s.doc(), &doc(vec![p(vec![t("a")])]));
    }

    #[test]
    fn test_redo_restores_change() {
        let s = EditorState::with_selection(doc(vec![p(vec![])]), Selection::cursor(1));
        let s = type_at(&s, "hi", 1_000);
        let s = s.apply(s.history().undo(&s).unwrap());
        let s = s.apply(s.history().redo(&s).unwrap());
        assert_eq!(s.doc(), &doc(vec![p(vec![t("hi")])]));
        assert_eq!(s.selection(), &Selection::cursor(3));
        assert_eq!(s.history().undo_depth(), 1);
        assert_eq!(s.history().redo_depth(), 0);
    }

    #[test]
    fn test_new_change_clears_redo() {
        let s = EditorState::with_selection(doc(vec![p(vec![])]), Selection::cursor(1));
        let s = type_at(&s, "a", 1_000);
        let s = s.apply(s.history().undo(&s).unwrap());
        let s = type_at(&s, "b", 5_000);
        assert_eq!(s.history().redo_depth(), 0);
    }

    #[test]
    fn test_depth_is_capped() {
        let mut s = EditorState::with_selection(doc(vec![p(vec![])]), Selection::cursor(1));
        for i in 0..120u64 {
            s = type_at(&s, "x", i * 10_000);
        }
        assert_eq!(s.history().undo_depth(), DEFAULT_MAX_DEPTH);
    }
}
