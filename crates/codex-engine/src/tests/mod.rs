//! Shared builders for unit tests.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::model::{Mark, MarkSet, Node, NodeKind};
use crate::state::{EditorState, Selection};

pub fn doc(children: Vec<Node>) -> Node {
    Node::element(NodeKind::Doc, children)
}

pub fn p(children: Vec<Node>) -> Node {
    Node::element(NodeKind::paragraph(), children)
}

pub fn h(level: u8, children: Vec<Node>) -> Node {
    Node::element(NodeKind::heading(level), children)
}

pub fn t(text: &str) -> Node {
    Node::text(text)
}

/// Text with marks.
pub fn tm(text: &str, marks: Vec<Mark>) -> Node {
    Node::text_with_marks(text, MarkSet::from_marks(marks))
}

pub fn strong(text: &str) -> Node {
    tm(text, vec![Mark::Strong])
}

pub fn em(text: &str) -> Node {
    tm(text, vec![Mark::Em])
}

pub fn code(params: &str, text: &str) -> Node {
    let children = if text.is_empty() { vec![] } else { vec![t(text)] };
    Node::element(NodeKind::code_block(params), children)
}

pub fn hr() -> Node {
    Node::leaf(NodeKind::HorizontalRule)
}

pub fn br() -> Node {
    Node::leaf(NodeKind::HardBreak)
}

pub fn img(src: &str) -> Node {
    Node::leaf(NodeKind::Image {
        src: src.to_string(),
        alt: None,
        title: None,
    })
}

pub fn ul(items: Vec<Node>) -> Node {
    Node::element(NodeKind::BulletList, items)
}

pub fn ol(items: Vec<Node>) -> Node {
    Node::element(NodeKind::OrderedList { order: 1 }, items)
}

pub fn li(children: Vec<Node>) -> Node {
    Node::element(NodeKind::ListItem, children)
}

pub fn blockquote(children: Vec<Node>) -> Node {
    Node::element(NodeKind::Blockquote, children)
}

pub fn table(rows: Vec<Node>) -> Node {
    Node::element(NodeKind::Table, rows)
}

pub fn row(cells: Vec<Node>) -> Node {
    Node::element(NodeKind::TableRow, cells)
}

pub fn td(children: Vec<Node>) -> Node {
    Node::element(NodeKind::TableCell(Default::default()), children)
}

pub fn th(children: Vec<Node>) -> Node {
    Node::element(NodeKind::TableHeader(Default::default()), children)
}

pub fn math_inline(tex: &str) -> Node {
    Node::element(NodeKind::MathInline, vec![t(tex)])
}

pub fn math_display(tex: &str) -> Node {
    Node::element(NodeKind::MathDisplay, vec![t(tex)])
}

/// State with a collapsed cursor at `pos`.
pub fn cursor_state(d: Node, pos: usize) -> EditorState {
    EditorState::with_selection(d, Selection::cursor(pos))
}

/// State with a text selection from `anchor` to `head`.
pub fn range_state(d: Node, anchor: usize, head: usize) -> EditorState {
    EditorState::with_selection(d, Selection::text(anchor, head))
}

/// Create a temporary data directory
pub fn create_test_data_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a file with content inside a test data directory
pub fn create_test_file(data_dir: &TempDir, relative: &str, content: &str) -> PathBuf {
    let file_path = data_dir.path().join(relative);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&file_path, content).unwrap();
    file_path
}
