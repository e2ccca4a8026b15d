//! Turning documents into other formats: HTML for display, plain text, and
//! Markdown in both directions.

pub mod html;
pub mod markdown;

pub use html::render_html;
pub use markdown::{document_from_markdown, document_to_markdown};

use crate::model::{Mark, Node};

/// Syntax highlighting for code blocks.
///
/// Implementations receive the raw code and the block's language and return
/// HTML markup. They are called for every code block on every render, so they
/// should not keep per-block state.
pub trait Highlighter {
    fn highlight(&self, code: &str, language: &str) -> String;
}

/// Escapes the code without highlighting it.
#[derive(Debug, Default, Clone, Copy)]
pub struct EscapeHighlighter;

impl Highlighter for EscapeHighlighter {
    fn highlight(&self, code: &str, _language: &str) -> String {
        html_escape::encode_text(code).into_owned()
    }
}

/// The document as plain text, one line per textblock.
pub fn document_to_text(doc: &Node) -> String {
    doc.text_between(0, doc.content().size(), "\n")
}

/// Output formats that wrap marked text in opening and closing syntax.
pub(crate) trait InlineWriter {
    fn open(&mut self, mark: &Mark, out: &mut String);
    fn close(&mut self, mark: &Mark, out: &mut String);
    fn text(&mut self, text: &str, in_code: bool, out: &mut String);
    /// Non-text inline nodes.
    fn inline_node(&mut self, node: &Node, out: &mut String);
}

/// Serialise the inline children of `block`, opening and closing marks only
/// where they change between neighbouring nodes.
pub(crate) fn write_inline(block: &Node, writer: &mut impl InlineWriter, out: &mut String) {
    let mut open: Vec<Mark> = Vec::new();
    for child in block.content() {
        let marks: Vec<&Mark> = child.marks().iter().collect();
        let keep = open
            .iter()
            .zip(&marks)
            .take_while(|(a, b)| a == *b)
            .count();
        while open.len() > keep {
            if let Some(mark) = open.pop() {
                writer.close(&mark, out);
            }
        }
        for mark in &marks[keep..] {
            writer.open(mark, out);
            open.push((*mark).clone());
        }
        match child.text_str() {
            Some(text) => {
                let in_code = open.iter().any(|m| matches!(m, Mark::Code));
                writer.text(text, in_code, out);
            }
            None => writer.inline_node(child, out),
        }
    }
    while let Some(mark) = open.pop() {
        writer.close(&mark, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_document_to_text() {
        let d = doc(vec![
            h(1, vec![t("Title")]),
            p(vec![t("one"), br(), t("two")]),
            ul(vec![li(vec![p(vec![strong("item")])])]),
            code("rust", "let x;"),
        ]);
        assert_eq!(document_to_text(&d), "Title\none\ntwo\nitem\nlet x;");
    }

    #[test]
    fn test_escape_highlighter() {
        assert_eq!(EscapeHighlighter.highlight("a < b && c", "js"), "a &lt; b &amp;&amp; c");
    }
}
