//! Markdown import and export.
//!
//! Export is lossy where Markdown has no syntax: alignment and cell colours
//! are dropped, underline becomes `<u>` HTML. Import accepts CommonMark with
//! tables and `$` math.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use super::{InlineWriter, write_inline};
use crate::model::{Mark, MarkSet, Node, NodeKind, SchemaError};
use crate::schema::{MarkType, NodeType};

/// Serialise `doc` as Markdown.
pub fn document_to_markdown(doc: &Node) -> String {
    let blocks: Vec<String> = doc.content().iter().map(block_to_markdown).collect();
    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

fn blocks_to_markdown(node: &Node) -> String {
    node.content()
        .iter()
        .map(block_to_markdown)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn inline_to_markdown(node: &Node) -> String {
    let mut out = String::new();
    write_inline(node, &mut MarkdownInline, &mut out);
    out
}

/// Prefix the first line with `first` and the rest with `rest`.
fn indent(text: &str, first: &str, rest: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            let prefix = if i == 0 { first } else { rest };
            if line.is_empty() {
                prefix.trim_end().to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn block_to_markdown(node: &Node) -> String {
    match node.kind() {
        NodeKind::Paragraph { .. } => inline_to_markdown(node),
        NodeKind::Heading { level, .. } => {
            format!("{} {}", "#".repeat(*level as usize), inline_to_markdown(node))
        }
        NodeKind::Blockquote => indent(&blocks_to_markdown(node), "> ", "> "),
        NodeKind::HorizontalRule => "---".to_string(),
        NodeKind::CodeBlock { params, .. } => {
            let code = node.text_content();
            let fence = if code.contains("```") { "~~~" } else { "```" };
            format!("{fence}{params}\n{code}\n{fence}")
        }
        NodeKind::MathDisplay => format!("$$\n{}\n$$", node.text_content()),
        NodeKind::BulletList => list_to_markdown(node, |_| "- ".to_string()),
        NodeKind::OrderedList { order } => {
            list_to_markdown(node, |i| format!("{}. ", *order as usize + i))
        }
        NodeKind::Table => table_to_markdown(node),
        _ => String::new(),
    }
}

fn list_to_markdown(list: &Node, marker: impl Fn(usize) -> String) -> String {
    list.content()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let marker = marker(i);
            let pad = " ".repeat(marker.len());
            indent(&blocks_to_markdown(item), &marker, &pad)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn table_to_markdown(table: &Node) -> String {
    let rows: Vec<Vec<String>> = table
        .content()
        .iter()
        .map(|row| {
            row.content()
                .iter()
                .map(|cell| {
                    cell.content()
                        .iter()
                        .map(|p| inline_to_markdown(p).replace('|', "\\|").replace('\n', " "))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect()
        })
        .collect();
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    let line = |cells: &[String]| {
        let mut cells = cells.to_vec();
        cells.resize(cols, String::new());
        format!("| {} |", cells.join(" | "))
    };
    let mut lines = Vec::new();
    if let Some((head, body)) = rows.split_first() {
        lines.push(line(head));
        lines.push(format!("|{}", " --- |".repeat(cols)));
        lines.extend(body.iter().map(|r| line(r)));
    }
    lines.join("\n")
}

struct MarkdownInline;

fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_' | '`' | '[' | ']' | '<' | '$') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl InlineWriter for MarkdownInline {
    fn open(&mut self, mark: &Mark, out: &mut String) {
        out.push_str(match mark {
            Mark::Link { .. } => "[",
            Mark::Em => "*",
            Mark::Strong => "**",
            Mark::Underline => "<u>",
            Mark::Code => "`",
        });
    }

    fn close(&mut self, mark: &Mark, out: &mut String) {
        match mark {
            Mark::Link { href, title: Some(title) } => {
                out.push_str(&format!("]({href} \"{}\")", title.replace('"', "\\\"")));
            }
            Mark::Link { href, title: None } => out.push_str(&format!("]({href})")),
            Mark::Em => out.push('*'),
            Mark::Strong => out.push_str("**"),
            Mark::Underline => out.push_str("</u>"),
            Mark::Code => out.push('`'),
        }
    }

    fn text(&mut self, text: &str, in_code: bool, out: &mut String) {
        if in_code {
            out.push_str(text);
        } else {
            out.push_str(&escape_markdown(text));
        }
    }

    fn inline_node(&mut self, node: &Node, out: &mut String) {
        match node.kind() {
            NodeKind::Image { src, alt, title } => {
                let alt = alt.as_deref().unwrap_or("");
                match title {
                    Some(title) => out.push_str(&format!("![{alt}]({src} \"{title}\")")),
                    None => out.push_str(&format!("![{alt}]({src})")),
                }
            }
            NodeKind::HardBreak => out.push_str("\\\n"),
            NodeKind::MathInline => out.push_str(&format!("${}$", node.text_content())),
            _ => {}
        }
    }
}

/// A node under construction.
struct Frame {
    kind: NodeKind,
    children: Vec<Node>,
    /// Opened for inline content that arrived outside a paragraph.
    implicit: bool,
    /// Display math seen as the first thing in a paragraph.
    display_math: Option<String>,
}

impl Frame {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            implicit: false,
            display_math: None,
        }
    }
}

struct MarkdownBuilder {
    stack: Vec<Frame>,
    marks: MarkSet,
    in_table_head: bool,
    /// Source, title and collected alt text of the image being read.
    image: Option<(String, Option<String>, String)>,
}

impl MarkdownBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Frame::new(NodeKind::Doc)],
            marks: MarkSet::empty(),
            in_table_head: false,
            image: None,
        }
    }

    fn top(&mut self) -> &mut Frame {
        if self.stack.is_empty() {
            self.stack.push(Frame::new(NodeKind::Doc));
        }
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn open(&mut self, kind: NodeKind) {
        self.close_implicit();
        self.stack.push(Frame::new(kind));
    }

    /// Make sure inline content has a textblock to land in.
    fn ensure_textblock(&mut self) {
        if !self.top().kind.node_type().is_textblock() {
            let mut frame = Frame::new(NodeKind::paragraph());
            frame.implicit = true;
            self.stack.push(frame);
        }
    }

    fn close_implicit(&mut self) {
        if self.stack.last().is_some_and(|f| f.implicit) {
            self.close();
        }
    }

    fn close(&mut self) {
        let Some(mut frame) = self.stack.pop() else {
            return;
        };
        if let Some(tex) = frame.display_math.take() {
            if frame.children.is_empty() {
                frame = Frame::new(NodeKind::MathDisplay);
                frame.children.push(Node::text(tex));
            } else {
                frame.children.insert(0, math_inline(&tex));
            }
        }
        let node = finish(frame);
        self.top().children.push(node);
    }

    fn push_inline(&mut self, node: Node) {
        self.ensure_textblock();
        let frame = self.top();
        if let Some(tex) = frame.display_math.take() {
            frame.children.push(math_inline(&tex));
        }
        frame.children.push(node);
    }

    fn text(&mut self, text: &str) {
        if let Some((_, _, alt)) = &mut self.image {
            alt.push_str(text);
            return;
        }
        if self.top().kind.node_type() == NodeType::CodeBlock {
            self.top().children.push(Node::text(text));
            return;
        }
        let marks = self.marks.clone();
        self.push_inline(Node::text_with_marks(text, marks));
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                let marks = self.marks.add(&Mark::Code);
                self.push_inline(Node::text_with_marks(code.to_string(), marks));
            }
            Event::InlineMath(tex) => self.push_inline(math_inline(&tex)),
            Event::DisplayMath(tex) => {
                self.ensure_textblock();
                let frame = self.top();
                if frame.children.is_empty() && frame.display_math.is_none() {
                    frame.display_math = Some(tex.to_string());
                } else {
                    self.push_inline(math_inline(&tex));
                }
            }
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.push_inline(Node::leaf(NodeKind::HardBreak)),
            Event::Rule => {
                self.close_implicit();
                self.top().children.push(Node::leaf(NodeKind::HorizontalRule));
            }
            Event::InlineHtml(html) => match html.trim() {
                "<u>" => self.marks = self.marks.add(&Mark::Underline),
                "</u>" => self.marks = self.marks.remove_type(MarkType::Underline),
                other => self.text(other),
            },
            Event::Html(html) => self.text(html.trim_end()),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open(NodeKind::paragraph()),
            Tag::Heading { level, .. } => self.open(NodeKind::heading(heading_level(level))),
            Tag::BlockQuote(_) => self.open(NodeKind::Blockquote),
            Tag::CodeBlock(kind) => {
                let params = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or("").to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                self.open(NodeKind::code_block(params));
            }
            Tag::List(Some(start)) => self.open(NodeKind::OrderedList {
                order: start as u32,
            }),
            Tag::List(None) => self.open(NodeKind::BulletList),
            Tag::Item => self.open(NodeKind::ListItem),
            Tag::Table(_) => self.open(NodeKind::Table),
            Tag::TableHead => {
                self.in_table_head = true;
                self.open(NodeKind::TableRow);
            }
            Tag::TableRow => self.open(NodeKind::TableRow),
            Tag::TableCell => {
                if self.in_table_head {
                    self.open(NodeKind::TableHeader(Default::default()));
                } else {
                    self.open(NodeKind::TableCell(Default::default()));
                }
            }
            Tag::Emphasis => self.marks = self.marks.add(&Mark::Em),
            Tag::Strong => self.marks = self.marks.add(&Mark::Strong),
            Tag::Link {
                dest_url, title, ..
            } => {
                let title = (!title.is_empty()).then(|| title.to_string());
                self.marks = self.marks.add(&Mark::Link {
                    href: dest_url.to_string(),
                    title,
                });
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let title = (!title.is_empty()).then(|| title.to_string());
                self.image = Some((dest_url.to_string(), title, String::new()));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Emphasis => self.marks = self.marks.remove_type(MarkType::Em),
            TagEnd::Strong => {
                self.marks = self.marks.remove_type(MarkType::Strong)
            }
            TagEnd::Link => self.marks = self.marks.remove_type(MarkType::Link),
            TagEnd::Image => {
                if let Some((src, title, alt)) = self.image.take() {
                    let alt = (!alt.is_empty()).then_some(alt);
                    self.push_inline(Node::leaf(NodeKind::Image { src, alt, title }));
                }
            }
            TagEnd::TableHead => {
                self.close_implicit();
                self.close();
                self.in_table_head = false;
            }
            TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote(_)
            | TagEnd::CodeBlock
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::Table
            | TagEnd::TableRow
            | TagEnd::TableCell => {
                self.close_implicit();
                self.close();
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Node {
        while self.stack.len() > 1 {
            self.close();
        }
        let frame = self.stack.pop().unwrap_or_else(|| Frame::new(NodeKind::Doc));
        finish(frame)
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn math_inline(tex: &str) -> Node {
    Node::element(NodeKind::MathInline, vec![Node::text(tex)])
}

/// Build the node for a finished frame, repairing content Markdown allows
/// but the schema does not.
fn finish(frame: Frame) -> Node {
    let Frame { kind, mut children, .. } = frame;
    match kind.node_type() {
        NodeType::CodeBlock => {
            let mut code: String = children.iter().map(Node::text_content).collect();
            if code.ends_with('\n') {
                code.pop();
            }
            children = if code.is_empty() { vec![] } else { vec![Node::text(code)] };
        }
        NodeType::ListItem if children.first().is_none_or(|c| c.node_type() != NodeType::Paragraph) => {
            children.insert(0, Node::element(NodeKind::paragraph(), vec![]));
        }
        NodeType::Doc | NodeType::Blockquote | NodeType::TableCell | NodeType::TableHeader
            if children.is_empty() =>
        {
            children.push(Node::element(NodeKind::paragraph(), vec![]));
        }
        NodeType::TableCell | NodeType::TableHeader => {
            // cells only hold paragraphs
            children = children
                .into_iter()
                .map(|c| {
                    if c.node_type() == NodeType::Paragraph {
                        c
                    } else {
                        Node::element(NodeKind::paragraph(), vec![Node::text(c.text_content())])
                    }
                })
                .collect();
        }
        _ => {}
    }
    Node::element(kind, children)
}

/// Parse Markdown into a document.
pub fn document_from_markdown(source: &str) -> Result<Node, SchemaError> {
    let options = Options::ENABLE_TABLES | Options::ENABLE_MATH;
    let mut builder = MarkdownBuilder::new();
    for event in Parser::new_ext(source, options) {
        builder.event(event);
    }
    let doc = builder.finish();
    doc.check()?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_export_blocks() {
        let d = doc(vec![
            h(1, vec![t("Notes")]),
            p(vec![t("plain "), strong("bold"), t(" and "), tm("link", vec![Mark::link("https://x.org")])]),
            ul(vec![
                li(vec![p(vec![t("one")]), ul(vec![li(vec![p(vec![t("nested")])])])]),
                li(vec![p(vec![t("two")])]),
            ]),
            code("rust", "fn main() {}"),
            blockquote(vec![p(vec![t("quoted")])]),
        ]);
        insta::assert_snapshot!(document_to_markdown(&d).trim_end(), @r"
        # Notes

        plain **bold** and [link](https://x.org)

        - one

          - nested
        - two

        ```rust
        fn main() {}
        ```

        > quoted
        ");
    }

    #[test]
    fn test_export_table_and_escapes() {
        let d = doc(vec![
            table(vec![
                row(vec![th(vec![p(vec![t("a|b")])]), th(vec![p(vec![t("c")])])]),
                row(vec![td(vec![p(vec![t("1*2")])]), td(vec![p(vec![])])]),
            ]),
        ]);
        insta::assert_snapshot!(document_to_markdown(&d).trim_end(), @r"
        | a\|b | c |
        | --- | --- |
        | 1\*2 |  |
        ");
    }

    #[test]
    fn test_import_basic_blocks() {
        let d = document_from_markdown("# Title\n\nSome *em* and **strong** `code`.\n\n---\n").unwrap();
        assert_eq!(
            d,
            doc(vec![
                h(1, vec![t("Title")]),
                p(vec![
                    t("Some "),
                    em("em"),
                    t(" and "),
                    strong("strong"),
                    t(" "),
                    tm("code", vec![Mark::Code]),
                    t("."),
                ]),
                hr(),
            ])
        );
    }

    #[test]
    fn test_import_tight_list_gets_paragraphs() {
        let d = document_from_markdown("- a\n- b\n").unwrap();
        assert_eq!(
            d,
            doc(vec![ul(vec![li(vec![p(vec![t("a")])]), li(vec![p(vec![t("b")])])])])
        );
    }

    #[test]
    fn test_import_code_block_language() {
        let d = document_from_markdown("```py extra\nprint(1)\n```\n").unwrap();
        assert_eq!(d, doc(vec![code("py", "print(1)")]));
    }

    #[test]
    fn test_import_table() {
        let d = document_from_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n").unwrap();
        assert_eq!(
            d,
            doc(vec![table(vec![
                row(vec![th(vec![p(vec![t("a")])]), th(vec![p(vec![t("b")])])]),
                row(vec![td(vec![p(vec![t("1")])]), td(vec![p(vec![t("2")])])]),
            ])])
        );
    }

    #[test]
    fn test_import_math() {
        let d = document_from_markdown("$$x^2$$\n\ninline $y$ here\n").unwrap();
        assert_eq!(
            d,
            doc(vec![
                math_display("x^2"),
                p(vec![t("inline "), super::math_inline("y"), t(" here")]),
            ])
        );
    }

    #[test]
    fn test_import_empty_source() {
        assert_eq!(document_from_markdown("").unwrap(), Node::empty_doc());
    }

    #[test]
    fn test_export_then_import_keeps_structure() {
        let d = doc(vec![
            h(2, vec![t("Plan")]),
            ol(vec![li(vec![p(vec![t("first")])]), li(vec![p(vec![em("second")])])]),
            p(vec![t("a"), br(), t("b")]),
        ]);
        let back = document_from_markdown(&document_to_markdown(&d)).unwrap();
        assert_eq!(back, d);
    }
}
