use html_escape::{encode_double_quoted_attribute as attr, encode_text};

use super::{Highlighter, InlineWriter, write_inline};
use crate::model::{CellAttrs, Mark, Node, NodeKind};

/// Render `doc` as HTML, highlighting code blocks with `highlighter`.
pub fn render_html(doc: &Node, highlighter: &dyn Highlighter) -> String {
    let mut out = String::new();
    for block in doc.content() {
        render_block(block, highlighter, &mut out);
    }
    out
}

fn render_children(node: &Node, highlighter: &dyn Highlighter, out: &mut String) {
    for child in node.content() {
        render_block(child, highlighter, out);
    }
}

fn render_block(node: &Node, highlighter: &dyn Highlighter, out: &mut String) {
    match node.kind() {
        NodeKind::Paragraph { align } => {
            out.push_str(&format!("<p class=\"{}\">", align.class()));
            write_inline(node, &mut HtmlInline, out);
            out.push_str("</p>");
        }
        NodeKind::Heading { level, align } => {
            out.push_str(&format!("<h{level} class=\"{}\">", align.class()));
            write_inline(node, &mut HtmlInline, out);
            out.push_str(&format!("</h{level}>"));
        }
        NodeKind::Blockquote => {
            out.push_str("<blockquote>");
            render_children(node, highlighter, out);
            out.push_str("</blockquote>");
        }
        NodeKind::HorizontalRule => out.push_str("<hr>"),
        NodeKind::CodeBlock { params, collapsed } => {
            let escaped = attr(params);
            out.push_str(&format!(
                "<div class=\"codeSnippet hljs language-{escaped}{}\" data-params=\"{escaped}\" spellcheck=\"false\">",
                if *collapsed { " collapsed" } else { "" }
            ));
            out.push_str(&format!(
                "<span class=\"snippetCollapser\" title=\"Collapse\">{}</span>",
                if *collapsed { "∨" } else { "∧" }
            ));
            out.push_str("<div>");
            out.push_str(&highlighter.highlight(&node.text_content(), params));
            out.push_str("</div></div>");
        }
        NodeKind::MathDisplay => {
            out.push_str("<math-display class=\"math-node\">");
            out.push_str(&encode_text(&node.text_content()));
            out.push_str("</math-display>");
        }
        NodeKind::BulletList => {
            out.push_str("<ul>");
            render_children(node, highlighter, out);
            out.push_str("</ul>");
        }
        NodeKind::OrderedList { order } => {
            if *order == 1 {
                out.push_str("<ol>");
            } else {
                out.push_str(&format!("<ol start=\"{order}\">"));
            }
            render_children(node, highlighter, out);
            out.push_str("</ol>");
        }
        NodeKind::ListItem => {
            out.push_str("<li>");
            render_children(node, highlighter, out);
            out.push_str("</li>");
        }
        NodeKind::Table => {
            out.push_str("<table><tbody>");
            render_children(node, highlighter, out);
            out.push_str("</tbody></table>");
        }
        NodeKind::TableRow => {
            out.push_str("<tr>");
            render_children(node, highlighter, out);
            out.push_str("</tr>");
        }
        NodeKind::TableCell(cell) => render_cell("td", cell, node, highlighter, out),
        NodeKind::TableHeader(cell) => render_cell("th", cell, node, highlighter, out),
        _ => {
            log::warn!("{:?} cannot be rendered as a block", node.node_type());
        }
    }
}

fn render_cell(tag: &str, cell: &CellAttrs, node: &Node, highlighter: &dyn Highlighter, out: &mut String) {
    out.push('<');
    out.push_str(tag);
    if cell.colspan != 1 {
        out.push_str(&format!(" colspan=\"{}\"", cell.colspan));
    }
    if cell.rowspan != 1 {
        out.push_str(&format!(" rowspan=\"{}\"", cell.rowspan));
    }
    if let Some(widths) = &cell.colwidth {
        let widths: Vec<String> = widths.iter().map(u32::to_string).collect();
        out.push_str(&format!(" data-colwidth=\"{}\"", widths.join(",")));
    }
    if let Some(background) = &cell.background {
        out.push_str(&format!(" style=\"background-color: {};\"", attr(background)));
    }
    out.push('>');
    render_children(node, highlighter, out);
    out.push_str(&format!("</{tag}>"));
}

struct HtmlInline;

impl InlineWriter for HtmlInline {
    fn open(&mut self, mark: &Mark, out: &mut String) {
        match mark {
            Mark::Link { href, title } => {
                out.push_str(&format!("<a href=\"{}\"", attr(href)));
                if let Some(title) = title {
                    out.push_str(&format!(" title=\"{}\"", attr(title)));
                }
                out.push('>');
            }
            Mark::Em => out.push_str("<em>"),
            Mark::Strong => out.push_str("<strong>"),
            Mark::Underline => out.push_str("<u>"),
            Mark::Code => out.push_str("<span class=\"hljs inline-code\" spellcheck=\"false\">"),
        }
    }

    fn close(&mut self, mark: &Mark, out: &mut String) {
        out.push_str(match mark {
            Mark::Link { .. } => "</a>",
            Mark::Em => "</em>",
            Mark::Strong => "</strong>",
            Mark::Underline => "</u>",
            Mark::Code => "</span>",
        });
    }

    fn text(&mut self, text: &str, _in_code: bool, out: &mut String) {
        out.push_str(&encode_text(text));
    }

    fn inline_node(&mut self, node: &Node, out: &mut String) {
        match node.kind() {
            NodeKind::Image { src, alt, title } => {
                out.push_str(&format!("<img src=\"{}\"", attr(src)));
                if let Some(alt) = alt {
                    out.push_str(&format!(" alt=\"{}\"", attr(alt)));
                }
                if let Some(title) = title {
                    out.push_str(&format!(" title=\"{}\"", attr(title)));
                }
                out.push('>');
            }
            NodeKind::HardBreak => out.push_str("<br>"),
            NodeKind::MathInline => {
                out.push_str("<math-inline class=\"math-node\">");
                out.push_str(&encode_text(&node.text_content()));
                out.push_str("</math-inline>");
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::EscapeHighlighter;
    use crate::model::Align;
    use crate::tests::*;
    use std::cell::RefCell;

    #[test]
    fn test_paragraph_with_marks() {
        let d = doc(vec![p(vec![
            t("a "),
            strong("b"),
            tm("c", vec![Mark::Strong, Mark::Em]),
            t(" <d>"),
        ])]);
        insta::assert_snapshot!(
            render_html(&d, &EscapeHighlighter),
            @r#"<p class="pm-align--left">a <strong>b</strong><em><strong>c</strong></em> &lt;d&gt;</p>"#
        );
    }

    #[test]
    fn test_code_block() {
        let d = doc(vec![
            code("rust", "x < 1"),
            Node::element(
                NodeKind::CodeBlock {
                    params: "".into(),
                    collapsed: true,
                },
                vec![t("hidden")],
            ),
        ]);
        insta::assert_snapshot!(
            render_html(&d, &EscapeHighlighter),
            @r#"<div class="codeSnippet hljs language-rust" data-params="rust" spellcheck="false"><span class="snippetCollapser" title="Collapse">∧</span><div>x &lt; 1</div></div><div class="codeSnippet hljs language- collapsed" data-params="" spellcheck="false"><span class="snippetCollapser" title="Collapse">∨</span><div>hidden</div></div>"#
        );
    }

    #[test]
    fn test_structure() {
        let cell = NodeKind::TableCell(CellAttrs {
            background: Some("#ff0".into()),
            ..Default::default()
        });
        let d = doc(vec![
            h(2, vec![t("T")]).with_kind(NodeKind::Heading {
                level: 2,
                align: Align::Center,
            }),
            ul(vec![li(vec![p(vec![t("a"), br(), img("x.png")])])]),
            table(vec![row(vec![Node::element(cell, vec![p(vec![math_inline("x^2")])])])]),
        ]);
        insta::assert_snapshot!(
            render_html(&d, &EscapeHighlighter),
            @r#"<h2 class="pm-align--center">T</h2><ul><li><p class="pm-align--left">a<br><img src="x.png"></p></li></ul><table><tbody><tr><td style="background-color: #ff0;"><p class="pm-align--left"><math-inline class="math-node">x^2</math-inline></p></td></tr></tbody></table>"#
        );
    }

    struct Recording(RefCell<Vec<(String, String)>>);

    impl Highlighter for Recording {
        fn highlight(&self, code: &str, language: &str) -> String {
            self.0.borrow_mut().push((code.to_string(), language.to_string()));
            code.to_uppercase()
        }
    }

    #[test]
    fn test_highlighter_called_for_every_code_block() {
        let d = doc(vec![code("py", "a"), p(vec![]), code("js", "b")]);
        let highlighter = Recording(RefCell::new(Vec::new()));
        let html = render_html(&d, &highlighter);
        render_html(&d, &highlighter);
        assert!(html.contains("<div>A</div>"));
        assert_eq!(highlighter.0.borrow().len(), 4);
        assert_eq!(highlighter.0.borrow()[1], ("b".to_string(), "js".to_string()));
    }
}
