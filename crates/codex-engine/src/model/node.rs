use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Mark, MarkSet, SchemaError};
use crate::schema::{MarkType, NodeType};

/// Text alignment of paragraphs and headings, persisted as a CSS class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    pub fn class(self) -> &'static str {
        match self {
            Align::Left => "pm-align--left",
            Align::Center => "pm-align--center",
            Align::Right => "pm-align--right",
        }
    }

    pub fn from_class(class: &str) -> Option<Self> {
        match class {
            "pm-align--left" => Some(Align::Left),
            "pm-align--center" => Some(Align::Center),
            "pm-align--right" => Some(Align::Right),
            _ => None,
        }
    }
}

/// Attributes shared by table cells and header cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellAttrs {
    pub colspan: u32,
    pub rowspan: u32,
    pub colwidth: Option<Vec<u32>>,
    pub background: Option<String>,
}

impl Default for CellAttrs {
    fn default() -> Self {
        Self {
            colspan: 1,
            rowspan: 1,
            colwidth: None,
            background: None,
        }
    }
}

/// A node's type together with its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Doc,
    Paragraph {
        align: Align,
    },
    Blockquote,
    Heading {
        level: u8,
        align: Align,
    },
    HorizontalRule,
    CodeBlock {
        params: String,
        collapsed: bool,
    },
    MathDisplay,
    BulletList,
    OrderedList {
        order: u32,
    },
    ListItem,
    Table,
    TableRow,
    TableCell(CellAttrs),
    TableHeader(CellAttrs),
    Text(String),
    Image {
        src: String,
        alt: Option<String>,
        title: Option<String>,
    },
    HardBreak,
    MathInline,
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Doc => NodeType::Doc,
            NodeKind::Paragraph { .. } => NodeType::Paragraph,
            NodeKind::Blockquote => NodeType::Blockquote,
            NodeKind::Heading { .. } => NodeType::Heading,
            NodeKind::HorizontalRule => NodeType::HorizontalRule,
            NodeKind::CodeBlock { .. } => NodeType::CodeBlock,
            NodeKind::MathDisplay => NodeType::MathDisplay,
            NodeKind::BulletList => NodeType::BulletList,
            NodeKind::OrderedList { .. } => NodeType::OrderedList,
            NodeKind::ListItem => NodeType::ListItem,
            NodeKind::Table => NodeType::Table,
            NodeKind::TableRow => NodeType::TableRow,
            NodeKind::TableCell(_) => NodeType::TableCell,
            NodeKind::TableHeader(_) => NodeType::TableHeader,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Image { .. } => NodeType::Image,
            NodeKind::HardBreak => NodeType::HardBreak,
            NodeKind::MathInline => NodeType::MathInline,
        }
    }

    /// The kind for `node_type` with every attribute at its default.
    ///
    /// Returns `None` for types with required attributes (image).
    pub fn with_defaults(node_type: NodeType) -> Option<Self> {
        Some(match node_type {
            NodeType::Doc => NodeKind::Doc,
            NodeType::Paragraph => NodeKind::Paragraph {
                align: Align::Left,
            },
            NodeType::Blockquote => NodeKind::Blockquote,
            NodeType::Heading => NodeKind::Heading {
                level: 1,
                align: Align::Left,
            },
            NodeType::HorizontalRule => NodeKind::HorizontalRule,
            NodeType::CodeBlock => NodeKind::CodeBlock {
                params: String::new(),
                collapsed: false,
            },
            NodeType::MathDisplay => NodeKind::MathDisplay,
            NodeType::BulletList => NodeKind::BulletList,
            NodeType::OrderedList => NodeKind::OrderedList { order: 1 },
            NodeType::ListItem => NodeKind::ListItem,
            NodeType::Table => NodeKind::Table,
            NodeType::TableRow => NodeKind::TableRow,
            NodeType::TableCell => NodeKind::TableCell(CellAttrs::default()),
            NodeType::TableHeader => NodeKind::TableHeader(CellAttrs::default()),
            NodeType::Text => NodeKind::Text(String::new()),
            NodeType::Image => return None,
            NodeType::HardBreak => NodeKind::HardBreak,
            NodeType::MathInline => NodeKind::MathInline,
        })
    }

    pub fn paragraph() -> Self {
        NodeKind::Paragraph { align: Align::Left }
    }

    pub fn heading(level: u8) -> Self {
        NodeKind::Heading {
            level: level.clamp(1, 6),
            align: Align::Left,
        }
    }

    pub fn code_block(params: impl Into<String>) -> Self {
        NodeKind::CodeBlock {
            params: params.into(),
            collapsed: false,
        }
    }

    pub fn align(&self) -> Option<Align> {
        match self {
            NodeKind::Paragraph { align } | NodeKind::Heading { align, .. } => Some(*align),
            _ => None,
        }
    }

    pub fn with_align(&self, new_align: Align) -> Option<Self> {
        match self {
            NodeKind::Paragraph { .. } => Some(NodeKind::Paragraph { align: new_align }),
            NodeKind::Heading { level, .. } => Some(NodeKind::Heading {
                level: *level,
                align: new_align,
            }),
            _ => None,
        }
    }
}

/// An immutable, cheaply clonable sequence of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    nodes: Arc<[Node]>,
    size: usize,
}

impl Default for Fragment {
    fn default() -> Self {
        Self::empty()
    }
}

impl Fragment {
    pub fn empty() -> Self {
        Self {
            nodes: Arc::from(Vec::new()),
            size: 0,
        }
    }

    /// Build a fragment, joining adjacent text nodes with identical marks and
    /// dropping empty text nodes.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let mut joined: Vec<Node> = Vec::with_capacity(nodes.len());
        for node in nodes {
            push_joined(&mut joined, node);
        }
        let size = joined.iter().map(Node::node_size).sum();
        Self {
            nodes: Arc::from(joined),
            size,
        }
    }

    pub fn from_node(node: Node) -> Self {
        Self::from_nodes(vec![node])
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn child_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn child(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.nodes.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    pub fn to_vec(&self) -> Vec<Node> {
        self.nodes.to_vec()
    }

    pub fn types(&self) -> Vec<NodeType> {
        self.nodes.iter().map(Node::node_type).collect()
    }

    /// Concatenate, joining text at the boundary when marks agree.
    pub fn append(&self, other: &Fragment) -> Fragment {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut nodes = self.to_vec();
        nodes.extend(other.iter().cloned());
        Fragment::from_nodes(nodes)
    }

    /// The part of this fragment between two content positions.
    pub fn cut(&self, from: usize, to: usize) -> Fragment {
        let to = to.min(self.size);
        if from == 0 && to == self.size {
            return self.clone();
        }
        let mut result = Vec::new();
        if to > from {
            let mut pos = 0;
            for child in self.nodes.iter() {
                if pos >= to {
                    break;
                }
                let end = pos + child.node_size();
                if end > from {
                    let piece = if pos < from || end > to {
                        if child.is_text() {
                            child.cut(from.saturating_sub(pos), (to - pos).min(child.text_len()))
                        } else {
                            child.cut(
                                from.saturating_sub(pos + 1),
                                (to.saturating_sub(pos + 1)).min(child.content.size),
                            )
                        }
                    } else {
                        child.clone()
                    };
                    result.push(piece);
                }
                pos = end;
            }
        }
        Fragment::from_nodes(result)
    }

    pub fn replace_child(&self, index: usize, node: Node) -> Fragment {
        let mut nodes = self.to_vec();
        nodes[index] = node;
        Fragment::from_nodes(nodes)
    }

    /// Find the child index containing `pos` and the offset where it starts.
    ///
    /// With `round_up`, a position exactly at a child's end resolves after it.
    pub fn find_index(&self, pos: usize, round_up: bool) -> (usize, usize) {
        if pos == 0 {
            return (0, 0);
        }
        if pos >= self.size {
            return (self.nodes.len(), self.size);
        }
        let mut cur = 0;
        for (i, child) in self.nodes.iter().enumerate() {
            let end = cur + child.node_size();
            if end >= pos {
                if end == pos || round_up {
                    return (i + 1, end);
                }
                return (i, cur);
            }
            cur = end;
        }
        (self.nodes.len(), self.size)
    }

    pub(crate) fn nodes_between(
        &self,
        from: usize,
        to: usize,
        node_start: usize,
        parent: &Node,
        f: &mut dyn FnMut(&Node, usize, &Node, usize) -> bool,
    ) {
        let mut pos = 0;
        for (i, child) in self.nodes.iter().enumerate() {
            if pos >= to {
                break;
            }
            let end = pos + child.node_size();
            if end > from
                && f(child, node_start + pos, parent, i)
                && child.content.size > 0
            {
                let start = pos + 1;
                child.content.nodes_between(
                    from.saturating_sub(start),
                    child.content.size.min(to.saturating_sub(start)),
                    node_start + start,
                    child,
                    f,
                );
            }
            pos = end;
        }
    }
}

impl<'a> IntoIterator for &'a Fragment {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

fn push_joined(target: &mut Vec<Node>, node: Node) {
    if let NodeKind::Text(text) = &node.kind {
        if text.is_empty() {
            return;
        }
        if let Some(last) = target.last_mut()
            && let NodeKind::Text(prev) = &last.kind
            && last.marks == node.marks
        {
            let joined = format!("{prev}{text}");
            *last = Node::text_with_marks(joined, node.marks.clone());
            return;
        }
    }
    target.push(node);
}

/// A node in the document tree.
///
/// Nodes are immutable: every edit builds new nodes and shares untouched
/// children with the previous version.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: NodeKind,
    content: Fragment,
    marks: MarkSet,
    size: usize,
}

impl Node {
    /// Build a node without validating its content.
    pub fn new(kind: NodeKind, content: Fragment, marks: MarkSet) -> Self {
        let size = match &kind {
            NodeKind::Text(text) => text.chars().count(),
            _ if kind.node_type().is_leaf() => 1,
            _ => content.size() + 2,
        };
        Self {
            kind,
            content,
            marks,
            size,
        }
    }

    pub fn element(kind: NodeKind, children: Vec<Node>) -> Self {
        Self::new(kind, Fragment::from_nodes(children), MarkSet::empty())
    }

    pub fn leaf(kind: NodeKind) -> Self {
        Self::new(kind, Fragment::empty(), MarkSet::empty())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::text_with_marks(text, MarkSet::empty())
    }

    pub fn text_with_marks(text: impl Into<String>, marks: MarkSet) -> Self {
        Self::new(NodeKind::Text(text.into()), Fragment::empty(), marks)
    }

    /// Build a node and check its content against the schema.
    pub fn create_checked(
        kind: NodeKind,
        content: Fragment,
        marks: MarkSet,
    ) -> Result<Self, SchemaError> {
        let node = Self::new(kind, content, marks);
        node.check_content(&node.content)?;
        Ok(node)
    }

    /// Build a node of `kind`, filling required children with empty defaults.
    pub fn create_and_fill(kind: NodeKind) -> Self {
        let fill = kind
            .node_type()
            .spec()
            .content
            .default_fill()
            .into_iter()
            .filter_map(NodeKind::with_defaults)
            .map(Node::create_and_fill)
            .collect();
        Node::element(kind, fill)
    }

    /// The empty page content: a document holding one empty paragraph.
    pub fn empty_doc() -> Self {
        Node::element(NodeKind::Doc, vec![Node::element(NodeKind::paragraph(), vec![])])
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn content(&self) -> &Fragment {
        &self.content
    }

    pub fn marks(&self) -> &MarkSet {
        &self.marks
    }

    /// Size of the node in the flat position space.
    pub fn node_size(&self) -> usize {
        self.size
    }

    /// Size of the node's content.
    pub fn content_size(&self) -> usize {
        if self.is_text() {
            self.size
        } else {
            self.content.size()
        }
    }

    pub fn text_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    fn text_len(&self) -> usize {
        self.size
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }

    pub fn is_textblock(&self) -> bool {
        self.node_type().is_textblock()
    }

    pub fn is_leaf(&self) -> bool {
        self.node_type().is_leaf()
    }

    pub fn is_inline(&self) -> bool {
        self.node_type().is_inline()
    }

    pub fn is_block(&self) -> bool {
        self.node_type().is_block()
    }

    pub fn is_atom(&self) -> bool {
        self.is_leaf() || self.node_type().spec().atom
    }

    pub fn child_count(&self) -> usize {
        self.content.child_count()
    }

    pub fn child(&self, index: usize) -> &Node {
        self.content.child(index)
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.content.first_child()
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.content.last_child()
    }

    /// Same kind and marks, new content.
    pub fn copy(&self, content: Fragment) -> Node {
        Node::new(self.kind.clone(), content, self.marks.clone())
    }

    /// Same content, new kind.
    pub fn with_kind(&self, kind: NodeKind) -> Node {
        Node::new(kind, self.content.clone(), self.marks.clone())
    }

    pub fn with_marks(&self, marks: MarkSet) -> Node {
        Node::new(self.kind.clone(), self.content.clone(), marks)
    }

    pub fn same_markup(&self, other: &Node) -> bool {
        self.kind == other.kind && self.marks == other.marks
    }

    /// Cut the node's content to `from..to` (character offsets for text).
    pub fn cut(&self, from: usize, to: usize) -> Node {
        match &self.kind {
            NodeKind::Text(text) => {
                let to = to.min(self.size);
                if from == 0 && to == self.size {
                    return self.clone();
                }
                Node::text_with_marks(char_slice(text, from, to), self.marks.clone())
            }
            _ => {
                if from == 0 && to >= self.content.size() {
                    return self.clone();
                }
                self.copy(self.content.cut(from, to))
            }
        }
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        match &self.kind {
            NodeKind::Text(text) => text.clone(),
            _ => {
                let mut out = String::new();
                for child in &self.content {
                    out.push_str(&child.text_content());
                }
                out
            }
        }
    }

    /// Text between two positions, with `block_separator` between textblocks
    /// and hard breaks rendered as newlines.
    pub fn text_between(&self, from: usize, to: usize, block_separator: &str) -> String {
        let mut text = String::new();
        let mut first = true;
        self.nodes_between(from, to, &mut |node, pos, _, _| {
            let node_text = match node.kind() {
                NodeKind::Text(t) => {
                    let start = from.max(pos) - pos;
                    let end = (to - pos).min(node.node_size());
                    char_slice(t, start, end)
                }
                NodeKind::HardBreak => "\n".to_string(),
                _ => String::new(),
            };
            if node.is_block() && node.is_textblock() && !block_separator.is_empty() {
                if first {
                    first = false;
                } else {
                    text.push_str(block_separator);
                }
            }
            text.push_str(&node_text);
            true
        });
        text
    }

    /// Visit every node overlapping `from..to`, in document order.
    ///
    /// The callback receives the node, its start position, its parent and its
    /// index in the parent; returning `false` skips the node's children.
    pub fn nodes_between(
        &self,
        from: usize,
        to: usize,
        f: &mut dyn FnMut(&Node, usize, &Node, usize) -> bool,
    ) {
        self.content.nodes_between(from, to, 0, self, f);
    }

    /// Visit every descendant.
    pub fn descendants(&self, f: &mut dyn FnMut(&Node, usize, &Node, usize) -> bool) {
        self.nodes_between(0, self.content.size(), f);
    }

    /// The node starting at `pos`, if any.
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let mut node = self;
        let mut pos = pos;
        loop {
            let (index, offset) = node.content.find_index(pos, false);
            let child = node.content.get(index)?;
            if offset == pos || child.is_text() {
                return Some(child);
            }
            pos = pos.checked_sub(offset + 1)?;
            node = child;
        }
    }

    /// Whether any inline node in `from..to` carries a mark of `mark_type`.
    pub fn range_has_mark(&self, from: usize, to: usize, mark_type: MarkType) -> bool {
        let mut found = false;
        if to > from {
            self.nodes_between(from, to, &mut |node, _, _, _| {
                if node.marks.has_type(mark_type) {
                    found = true;
                }
                !found
            });
        }
        found
    }

    /// Whether children `from..to` could be replaced by a node of `node_type`.
    pub fn can_replace_with(&self, from: usize, to: usize, node_type: NodeType) -> bool {
        let children = self.content.types();
        self.node_type()
            .spec()
            .content
            .can_replace_with(&children, from, to, node_type)
            && (node_type.is_inline() || !self.is_textblock())
    }

    /// Whether `content` would be valid content for this node.
    pub fn check_content(&self, content: &Fragment) -> Result<(), SchemaError> {
        let node_type = self.node_type();
        let spec = node_type.spec();
        if !spec.content.matches(&content.types()) {
            return Err(SchemaError::InvalidContent {
                node: node_type,
                expected: spec.content.to_string(),
                found: content.types().iter().map(|t| t.name()).collect::<Vec<_>>().join(" "),
            });
        }
        if !spec.marks_allowed && content.iter().any(|child| !child.marks.is_empty()) {
            return Err(SchemaError::MarksNotAllowed(node_type));
        }
        Ok(())
    }

    /// Validate this node and all its descendants.
    pub fn check(&self) -> Result<(), SchemaError> {
        self.check_content(&self.content)?;
        for child in &self.content {
            child.check()?;
        }
        Ok(())
    }

    /// This node with `mark` added to its marks.
    pub fn mark(&self, mark: &Mark) -> Node {
        self.with_marks(self.marks.add(mark))
    }
}

/// Slice a string by character offsets.
pub(crate) fn char_slice(text: &str, from: usize, to: usize) -> String {
    text.chars().skip(from).take(to.saturating_sub(from)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;

    #[test]
    fn test_sizes() {
        let d = doc(vec![p(vec![t("hello")]), hr()]);
        assert_eq!(d.child(0).node_size(), 7);
        assert_eq!(d.child(1).node_size(), 1);
        assert_eq!(d.content().size(), 8);
        assert_eq!(d.node_size(), 10);
    }

    #[test]
    fn test_text_nodes_with_same_marks_join() {
        let para = p(vec![t("ab"), t("cd"), strong("ef")]);
        assert_eq!(para.child_count(), 2);
        assert_eq!(para.child(0).text_str(), Some("abcd"));
    }

    #[test]
    fn test_fragment_cut_splits_text() {
        let para = p(vec![t("hello"), strong("world")]);
        let cut = para.content().cut(3, 7);
        assert_eq!(cut.child_count(), 2);
        assert_eq!(cut.child(0).text_str(), Some("lo"));
        assert_eq!(cut.child(1).text_str(), Some("wo"));
    }

    #[test]
    fn test_text_between_uses_block_separator() {
        let d = doc(vec![p(vec![t("one")]), p(vec![t("two")])]);
        assert_eq!(d.text_between(0, d.content().size(), "\n"), "one\ntwo");
        assert_eq!(d.text_between(2, 7, "|"), "ne|t");
    }

    #[test]
    fn test_node_at() {
        let d = doc(vec![p(vec![t("ab")]), hr()]);
        assert_eq!(d.node_at(0).map(Node::node_type), Some(NodeType::Paragraph));
        assert_eq!(d.node_at(4).map(Node::node_type), Some(NodeType::HorizontalRule));
        assert_eq!(d.node_at(1).map(Node::node_type), Some(NodeType::Text));
    }

    #[test]
    fn test_check_rejects_invalid_content() {
        let bad = Node::element(NodeKind::Doc, vec![t("loose text")]);
        assert!(matches!(bad.check(), Err(SchemaError::InvalidContent { .. })));

        let marked_code = Node::element(NodeKind::code_block("rust"), vec![strong("fn")]);
        assert!(matches!(marked_code.check(), Err(SchemaError::MarksNotAllowed(_))));
    }

    #[test]
    fn test_create_and_fill_table() {
        let table = Node::create_and_fill(NodeKind::Table);
        assert!(table.check().is_ok());
        assert_eq!(table.child(0).child(0).node_type(), NodeType::TableCell);
    }

    #[test]
    fn test_range_has_mark() {
        let d = doc(vec![p(vec![t("plain "), strong("bold")])]);
        assert!(!d.range_has_mark(1, 4, MarkType::Strong));
        assert!(d.range_has_mark(1, 9, MarkType::Strong));
    }
}
