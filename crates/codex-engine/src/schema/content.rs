use std::fmt;

use super::{Group, NodeType};

/// How many times a content term may repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quant {
    One,
    ZeroOrMore,
    OneOrMore,
}

impl Quant {
    fn min(self) -> usize {
        match self {
            Quant::One | Quant::OneOrMore => 1,
            Quant::ZeroOrMore => 0,
        }
    }

    fn max(self) -> usize {
        match self {
            Quant::One => 1,
            Quant::ZeroOrMore | Quant::OneOrMore => usize::MAX,
        }
    }
}

/// What a single term of a content expression accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Type(NodeType),
    Group(Group),
}

impl Target {
    pub fn accepts(self, node_type: NodeType) -> bool {
        match self {
            Target::Type(t) => t == node_type,
            Target::Group(g) => node_type.spec().groups.contains(&g),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub target: Target,
    pub quant: Quant,
}

/// A content expression such as `paragraph block*`.
///
/// Expressions are a flat sequence of terms matched greedily, which is
/// unambiguous for every expression the schema declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentExpr(pub &'static [Term]);

impl ContentExpr {
    pub const EMPTY: ContentExpr = ContentExpr(&[]);

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `types`, in order, is a valid child sequence.
    pub fn matches(&self, types: &[NodeType]) -> bool {
        let mut i = 0;
        for term in self.0 {
            let mut count = 0;
            while i < types.len() && count < term.quant.max() && term.target.accepts(types[i]) {
                i += 1;
                count += 1;
            }
            if count < term.quant.min() {
                return false;
            }
        }
        i == types.len()
    }

    /// Whether replacing `children[from..to]` with a single `node_type` keeps
    /// the sequence valid.
    pub fn can_replace_with(
        &self,
        children: &[NodeType],
        from: usize,
        to: usize,
        node_type: NodeType,
    ) -> bool {
        let from = from.min(children.len());
        let to = to.clamp(from, children.len());
        let mut candidate = Vec::with_capacity(children.len() + 1);
        candidate.extend_from_slice(&children[..from]);
        candidate.push(node_type);
        candidate.extend_from_slice(&children[to..]);
        self.matches(&candidate)
    }

    /// Whether any term could ever accept `node_type`.
    pub fn allows(&self, node_type: NodeType) -> bool {
        self.0.iter().any(|term| term.target.accepts(node_type))
    }

    /// Whether the two expressions share at least one acceptable node type.
    pub fn compatible(&self, other: &ContentExpr) -> bool {
        NodeType::ALL
            .into_iter()
            .any(|t| self.allows(t) && other.allows(t))
    }

    /// Whether the expression holds inline content (text, images, breaks).
    pub fn is_inline(&self) -> bool {
        self.0.iter().any(|term| match term.target {
            Target::Group(g) => g == Group::Inline,
            Target::Type(t) => t == NodeType::Text,
        })
    }

    /// The smallest valid child sequence, used to fill freshly created nodes.
    pub fn default_fill(&self) -> Vec<NodeType> {
        let mut fill = Vec::new();
        for term in self.0 {
            if term.quant.min() == 0 {
                continue;
            }
            match term.target {
                Target::Type(t) => fill.push(t),
                Target::Group(Group::Block) => fill.push(NodeType::Paragraph),
                Target::Group(Group::Cell) => fill.push(NodeType::TableCell),
                // inline and math groups have no sensible default child
                Target::Group(_) => {}
            }
        }
        fill
    }
}

impl fmt::Display for ContentExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match term.target {
                Target::Type(t) => write!(f, "{}", t.name())?,
                Target::Group(g) => write!(f, "{}", g.name())?,
            }
            match term.quant {
                Quant::One => {}
                Quant::ZeroOrMore => write!(f, "*")?,
                Quant::OneOrMore => write!(f, "+")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use NodeType::*;

    #[test]
    fn test_block_plus_requires_one_block() {
        let expr = Doc.spec().content;
        assert!(!expr.matches(&[]));
        assert!(expr.matches(&[Paragraph]));
        assert!(expr.matches(&[Heading, CodeBlock, BulletList]));
        assert!(!expr.matches(&[Text]));
    }

    #[test]
    fn test_list_item_needs_leading_paragraph() {
        let expr = ListItem.spec().content;
        assert!(expr.matches(&[Paragraph]));
        assert!(expr.matches(&[Paragraph, BulletList]));
        assert!(expr.matches(&[Paragraph, Paragraph, CodeBlock]));
        assert!(!expr.matches(&[Heading]));
        assert!(!expr.matches(&[]));
    }

    #[test]
    fn test_code_block_accepts_only_text() {
        let expr = CodeBlock.spec().content;
        assert!(expr.matches(&[]));
        assert!(expr.matches(&[Text, Text]));
        assert!(!expr.matches(&[Image]));
        assert!(!expr.matches(&[HardBreak]));
    }

    #[test]
    fn test_can_replace_with() {
        let expr = Doc.spec().content;
        assert!(expr.can_replace_with(&[Paragraph], 1, 1, HorizontalRule));
        assert!(!expr.can_replace_with(&[Paragraph], 1, 1, Image));

        let cell = TableCell.spec().content;
        assert!(!cell.can_replace_with(&[Paragraph], 1, 1, Table));
    }

    #[test]
    fn test_display_round_trips_source_notation() {
        assert_eq!(ListItem.spec().content.to_string(), "paragraph block*");
        assert_eq!(Doc.spec().content.to_string(), "block+");
        assert_eq!(Paragraph.spec().content.to_string(), "inline*");
        assert_eq!(TableRow.spec().content.to_string(), "cell+");
    }

    #[test]
    fn test_default_fill() {
        assert_eq!(Table.spec().content.default_fill(), vec![TableRow]);
        assert_eq!(ListItem.spec().content.default_fill(), vec![Paragraph]);
        assert!(Paragraph.spec().content.default_fill().is_empty());
    }
}
