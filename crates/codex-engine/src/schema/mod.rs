//! Document schema: the closed set of node and mark types, their content
//! expressions and their behavioural flags.
//!
//! The node and mark vocabularies match the persisted page format, so the
//! `name()` of each type is also its JSON `type` string.

pub mod content;

pub use content::{ContentExpr, Quant, Target, Term};

use serde::{Deserialize, Serialize};

/// Named groups used by content expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Block,
    Inline,
    Cell,
    Math,
}

impl Group {
    pub fn name(self) -> &'static str {
        match self {
            Group::Block => "block",
            Group::Inline => "inline",
            Group::Cell => "cell",
            Group::Math => "math",
        }
    }
}

/// Every node type the editor knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Doc,
    Paragraph,
    Blockquote,
    Heading,
    HorizontalRule,
    CodeBlock,
    MathDisplay,
    BulletList,
    OrderedList,
    ListItem,
    Table,
    TableRow,
    TableCell,
    TableHeader,
    Text,
    Image,
    HardBreak,
    MathInline,
}

/// Static description of a node type.
#[derive(Debug, Clone, Copy)]
pub struct NodeSpec {
    pub content: ContentExpr,
    pub groups: &'static [Group],
    pub inline: bool,
    /// Treated as a single unit by selection and cursor motion.
    pub atom: bool,
    /// Content is code: no marks, whitespace kept verbatim.
    pub code: bool,
    /// Survives replacements that cover its whole content.
    pub defining: bool,
    /// Edits never join across its boundary.
    pub isolating: bool,
    pub marks_allowed: bool,
}

const BLOCK: &[Group] = &[Group::Block];
const INLINE: &[Group] = &[Group::Inline];
const CELL: &[Group] = &[Group::Cell];
const BLOCK_MATH: &[Group] = &[Group::Block, Group::Math];
const INLINE_MATH: &[Group] = &[Group::Inline, Group::Math];

const BLOCK_PLUS: ContentExpr = ContentExpr(&[Term {
    target: Target::Group(Group::Block),
    quant: Quant::OneOrMore,
}]);
const INLINE_STAR: ContentExpr = ContentExpr(&[Term {
    target: Target::Group(Group::Inline),
    quant: Quant::ZeroOrMore,
}]);
const TEXT_STAR: ContentExpr = ContentExpr(&[Term {
    target: Target::Type(NodeType::Text),
    quant: Quant::ZeroOrMore,
}]);
const LIST_ITEM_PLUS: ContentExpr = ContentExpr(&[Term {
    target: Target::Type(NodeType::ListItem),
    quant: Quant::OneOrMore,
}]);
const LIST_ITEM_CONTENT: ContentExpr = ContentExpr(&[
    Term {
        target: Target::Type(NodeType::Paragraph),
        quant: Quant::One,
    },
    Term {
        target: Target::Group(Group::Block),
        quant: Quant::ZeroOrMore,
    },
]);
const ROW_PLUS: ContentExpr = ContentExpr(&[Term {
    target: Target::Type(NodeType::TableRow),
    quant: Quant::OneOrMore,
}]);
const CELL_PLUS: ContentExpr = ContentExpr(&[Term {
    target: Target::Group(Group::Cell),
    quant: Quant::OneOrMore,
}]);
const PARAGRAPH_PLUS: ContentExpr = ContentExpr(&[Term {
    target: Target::Type(NodeType::Paragraph),
    quant: Quant::OneOrMore,
}]);

const fn spec(content: ContentExpr, groups: &'static [Group]) -> NodeSpec {
    NodeSpec {
        content,
        groups,
        inline: false,
        atom: false,
        code: false,
        defining: false,
        isolating: false,
        marks_allowed: true,
    }
}

impl NodeType {
    pub const ALL: [NodeType; 18] = [
        NodeType::Doc,
        NodeType::Paragraph,
        NodeType::Blockquote,
        NodeType::Heading,
        NodeType::HorizontalRule,
        NodeType::CodeBlock,
        NodeType::MathDisplay,
        NodeType::BulletList,
        NodeType::OrderedList,
        NodeType::ListItem,
        NodeType::Table,
        NodeType::TableRow,
        NodeType::TableCell,
        NodeType::TableHeader,
        NodeType::Text,
        NodeType::Image,
        NodeType::HardBreak,
        NodeType::MathInline,
    ];

    pub fn spec(self) -> NodeSpec {
        match self {
            NodeType::Doc => spec(BLOCK_PLUS, &[]),
            NodeType::Paragraph => spec(INLINE_STAR, BLOCK),
            NodeType::Blockquote => NodeSpec {
                defining: true,
                ..spec(BLOCK_PLUS, BLOCK)
            },
            NodeType::Heading => NodeSpec {
                defining: true,
                ..spec(INLINE_STAR, BLOCK)
            },
            NodeType::HorizontalRule => spec(ContentExpr::EMPTY, BLOCK),
            NodeType::CodeBlock => NodeSpec {
                code: true,
                defining: true,
                marks_allowed: false,
                ..spec(TEXT_STAR, BLOCK)
            },
            NodeType::MathDisplay => NodeSpec {
                atom: true,
                code: true,
                marks_allowed: false,
                ..spec(TEXT_STAR, BLOCK_MATH)
            },
            NodeType::BulletList | NodeType::OrderedList => spec(LIST_ITEM_PLUS, BLOCK),
            NodeType::ListItem => NodeSpec {
                defining: true,
                ..spec(LIST_ITEM_CONTENT, &[])
            },
            NodeType::Table => NodeSpec {
                isolating: true,
                ..spec(ROW_PLUS, BLOCK)
            },
            NodeType::TableRow => spec(CELL_PLUS, &[]),
            NodeType::TableCell | NodeType::TableHeader => NodeSpec {
                isolating: true,
                ..spec(PARAGRAPH_PLUS, CELL)
            },
            NodeType::Text => NodeSpec {
                inline: true,
                ..spec(ContentExpr::EMPTY, INLINE)
            },
            NodeType::Image | NodeType::HardBreak => NodeSpec {
                inline: true,
                ..spec(ContentExpr::EMPTY, INLINE)
            },
            NodeType::MathInline => NodeSpec {
                inline: true,
                atom: true,
                marks_allowed: false,
                ..spec(TEXT_STAR, INLINE_MATH)
            },
        }
    }

    /// The persisted type name.
    pub fn name(self) -> &'static str {
        match self {
            NodeType::Doc => "doc",
            NodeType::Paragraph => "paragraph",
            NodeType::Blockquote => "blockquote",
            NodeType::Heading => "heading",
            NodeType::HorizontalRule => "horizontal_rule",
            NodeType::CodeBlock => "code_block",
            NodeType::MathDisplay => "math_display",
            NodeType::BulletList => "bullet_list",
            NodeType::OrderedList => "ordered_list",
            NodeType::ListItem => "list_item",
            NodeType::Table => "table",
            NodeType::TableRow => "table_row",
            NodeType::TableCell => "table_cell",
            NodeType::TableHeader => "table_header",
            NodeType::Text => "text",
            NodeType::Image => "image",
            NodeType::HardBreak => "hard_break",
            NodeType::MathInline => "math_inline",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn is_text(self) -> bool {
        self == NodeType::Text
    }

    pub fn is_inline(self) -> bool {
        self.spec().inline
    }

    pub fn is_block(self) -> bool {
        !self.is_inline() && self != NodeType::Doc
    }

    /// Leaf nodes have no content at all (text is not a leaf).
    pub fn is_leaf(self) -> bool {
        !self.is_text() && self.spec().content.is_empty()
    }

    pub fn is_textblock(self) -> bool {
        !self.is_inline() && self.spec().content.is_inline()
    }

    pub fn is_list(self) -> bool {
        matches!(self, NodeType::BulletList | NodeType::OrderedList)
    }

    pub fn is_table_cell(self) -> bool {
        matches!(self, NodeType::TableCell | NodeType::TableHeader)
    }

    pub fn in_group(self, group: Group) -> bool {
        self.spec().groups.contains(&group)
    }
}

/// Every mark type, in rank order (the order marks are stored in a set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkType {
    Link,
    Em,
    Strong,
    Underline,
    Code,
}

#[derive(Debug, Clone, Copy)]
pub struct MarkSpec {
    /// Whether text typed at the end of the mark picks it up.
    pub inclusive: bool,
    pub excludes: &'static [MarkType],
}

impl MarkType {
    pub const ALL: [MarkType; 5] = [
        MarkType::Link,
        MarkType::Em,
        MarkType::Strong,
        MarkType::Underline,
        MarkType::Code,
    ];

    pub fn spec(self) -> MarkSpec {
        match self {
            MarkType::Link => MarkSpec {
                inclusive: false,
                excludes: &[MarkType::Link],
            },
            MarkType::Em => MarkSpec {
                inclusive: true,
                excludes: &[MarkType::Em],
            },
            MarkType::Strong => MarkSpec {
                inclusive: true,
                excludes: &[MarkType::Strong],
            },
            MarkType::Underline => MarkSpec {
                inclusive: true,
                excludes: &[MarkType::Underline],
            },
            MarkType::Code => MarkSpec {
                inclusive: true,
                excludes: &[MarkType::Code],
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MarkType::Link => "link",
            MarkType::Em => "em",
            MarkType::Strong => "strong",
            MarkType::Underline => "underline",
            MarkType::Code => "code",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn excludes(self, other: MarkType) -> bool {
        self.spec().excludes.contains(&other)
    }
}
