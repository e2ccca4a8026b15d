use std::ops::Range;

use crate::state::{Selection, Transaction};
use crate::transform::{Assoc, Step};

/// Result of running a command
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// Ranges of the new document touched by the command, sorted and merged.
    pub changed: Vec<Range<usize>>,
    pub new_selection: Selection,
    pub version: u64,
}

/// The ranges of the transaction's final document its steps touched.
pub(crate) fn changed_ranges(tr: &Transaction) -> Vec<Range<usize>> {
    let mapping = tr.mapping();
    let mut ranges = Vec::new();
    for (i, step) in tr.steps().iter().enumerate() {
        let later = mapping.slice(i + 1);
        let mut touched = Vec::new();
        match step {
            Step::Replace { .. } => {
                if let Some(map) = mapping.maps().get(i) {
                    map.for_each(|_, _, start, end| touched.push((start, end)));
                }
            }
            Step::AddMark { from, to, .. } | Step::RemoveMark { from, to, .. } => {
                touched.push((*from, *to))
            }
            Step::SetNodeType { pos, .. } => touched.push((*pos, *pos + 1)),
        }
        ranges.extend(
            touched
                .into_iter()
                .map(|(start, end)| later.map(start, Assoc::Left)..later.map(end, Assoc::Right)),
        );
    }
    ranges.sort_by_key(|r| r.start);
    let mut merged: Vec<Range<usize>> = Vec::new();
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mark;
    use crate::tests::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_changed_ranges_follow_later_steps() {
        let s = cursor_state(doc(vec![p(vec![t("abcdef")])]), 1);
        let mut tr = s.tr();
        tr.insert_text("XY", 5, 5);
        tr.insert_text("Z", 1, 1);
        assert_eq!(changed_ranges(&tr), vec![1..2, 6..8]);
    }

    #[test]
    fn test_adjacent_ranges_merge() {
        let s = cursor_state(doc(vec![p(vec![t("abcdef")])]), 1);
        let mut tr = s.tr();
        tr.add_mark(1, 3, Mark::Strong);
        tr.insert_text("Q", 3, 3);
        assert_eq!(changed_ranges(&tr), vec![1..4]);
    }

    #[test]
    fn test_no_steps_no_ranges() {
        let s = cursor_state(doc(vec![p(vec![t("a")])]), 1);
        assert!(changed_ranges(&s.tr()).is_empty());
    }
}
