//! Line indentation inside code blocks.

use super::query::enclosing_code_block;
use crate::state::{EditorState, Transaction};

/// Character offsets where each line of `text` starts. The first line always
/// starts at offset 0, whether or not the text contains a newline.
fn line_starts(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    starts.extend(
        text.chars()
            .enumerate()
            .filter(|(_, c)| *c == '\n')
            .map(|(i, _)| i + 1),
    );
    starts
}

/// Starts of the lines overlapping the offsets `from..=to`.
fn touched_lines(text: &str, from: usize, to: usize) -> Vec<usize> {
    let starts = line_starts(text);
    let len = text.chars().count();
    starts
        .iter()
        .enumerate()
        .filter(|&(i, &start)| {
            let end = starts.get(i + 1).map_or(len, |next| next - 1);
            start <= to && end >= from
        })
        .map(|(_, &start)| start)
        .collect()
}

/// Indent every line touched by the selection by `tab_size` spaces.
pub fn indent_code_lines(state: &EditorState, tab_size: usize) -> Option<Transaction> {
    let (start, block) = enclosing_code_block(state)?;
    let text = block.text_content();
    let (from, to) = state.selection().range(state.doc());
    let indent = " ".repeat(tab_size);

    let mut tr = state.tr();
    for line in touched_lines(&text, from - start, to - start).into_iter().rev() {
        tr.insert_text(&indent, start + line, start + line);
    }
    Some(tr)
}

/// Remove up to `tab_size` leading spaces from every line touched by the
/// selection. Lines without leading spaces are left alone.
pub fn outdent_code_lines(state: &EditorState, tab_size: usize) -> Option<Transaction> {
    let (start, block) = enclosing_code_block(state)?;
    let text = block.text_content();
    let (from, to) = state.selection().range(state.doc());

    let mut tr = state.tr();
    for line in touched_lines(&text, from - start, to - start).into_iter().rev() {
        let spaces = text
            .chars()
            .skip(line)
            .take(tab_size)
            .take_while(|c| *c == ' ')
            .count();
        if spaces > 0 {
            tr.delete(start + line, start + line + spaces);
        }
    }
    Some(tr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Selection;
    use crate::tests::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("", vec![0])]
    #[case("abc", vec![0])]
    #[case("a\nb\n", vec![0, 2, 4])]
    fn test_line_starts(#[case] text: &str, #[case] expected: Vec<usize>) {
        assert_eq!(line_starts(text), expected);
    }

    #[test]
    fn test_tab_on_empty_line_inserts_four_spaces() {
        let s = cursor_state(doc(vec![code("", "")]), 1);
        let s = s.apply(indent_code_lines(&s, 4).unwrap());
        assert_eq!(s.doc(), &doc(vec![code("", "    ")]));
        assert_eq!(s.selection(), &Selection::cursor(5));
    }

    #[test]
    fn test_indent_indents_line_start_not_cursor() {
        // cursor after "fo" on the second line
        let s = cursor_state(doc(vec![code("", "x\nfoo")]), 5);
        let tr = indent_code_lines(&s, 2).unwrap();
        assert_eq!(tr.doc(), &doc(vec![code("", "x\n  foo")]));
        assert_eq!(tr.selection(), Selection::cursor(7));
    }

    #[test]
    fn test_indent_every_selected_line() {
        let s = range_state(doc(vec![code("", "a\nb\nc")]), 1, 4);
        let tr = indent_code_lines(&s, 2).unwrap();
        assert_eq!(tr.doc(), &doc(vec![code("", "  a\n  b\nc")]));
    }

    #[test]
    fn test_outdent_stops_at_non_space() {
        let s = cursor_state(doc(vec![code("", "  x")]), 4);
        let tr = outdent_code_lines(&s, 4).unwrap();
        assert_eq!(tr.doc(), &doc(vec![code("", "x")]));
        assert_eq!(tr.selection(), Selection::cursor(2));
    }

    #[test]
    fn test_outdent_first_line_uses_offset_zero() {
        let s = cursor_state(doc(vec![code("", "    a\n    b")]), 3);
        let tr = outdent_code_lines(&s, 4).unwrap();
        assert_eq!(tr.doc(), &doc(vec![code("", "a\n    b")]));
    }

    #[test]
    fn test_outdent_without_leading_spaces_changes_nothing() {
        let s = cursor_state(doc(vec![code("", "abc")]), 2);
        let tr = outdent_code_lines(&s, 4).unwrap();
        assert!(!tr.doc_changed());
    }
}
