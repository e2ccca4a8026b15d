use super::{MarkSet, Node};

#[derive(Debug, Clone, Copy)]
struct PathEntry<'a> {
    node: &'a Node,
    index: usize,
    /// Absolute position where the child at `index` starts.
    offset: usize,
}

/// A position resolved against a document: the chain of ancestors containing
/// it, with the child index and offset at every depth.
#[derive(Debug, Clone)]
pub struct ResolvedPos<'a> {
    pub pos: usize,
    path: Vec<PathEntry<'a>>,
    pub parent_offset: usize,
}

impl<'a> ResolvedPos<'a> {
    /// Resolve `pos` in `doc`. Returns `None` when the position is outside the
    /// document's content.
    pub fn resolve(doc: &'a Node, pos: usize) -> Option<Self> {
        if pos > doc.content().size() {
            return None;
        }
        let mut path = Vec::new();
        let mut start = 0;
        let mut parent_offset = pos;
        let mut node = doc;
        loop {
            let (index, offset) = node.content().find_index(parent_offset, false);
            let rem = parent_offset - offset;
            path.push(PathEntry {
                node,
                index,
                offset: start + offset,
            });
            if rem == 0 {
                break;
            }
            node = node.child(index);
            if node.is_text() {
                break;
            }
            parent_offset = rem - 1;
            start += offset + 1;
        }
        Some(Self {
            pos,
            path,
            parent_offset,
        })
    }

    /// Depth of the innermost ancestor (0 is the document).
    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    pub fn node(&self, depth: usize) -> &'a Node {
        self.path[depth].node
    }

    pub fn parent(&self) -> &'a Node {
        self.node(self.depth())
    }

    pub fn doc(&self) -> &'a Node {
        self.node(0)
    }

    /// Index into the ancestor at `depth`.
    pub fn index(&self, depth: usize) -> usize {
        self.path[depth].index
    }

    /// Index pointing after this position into the ancestor at `depth`.
    pub fn index_after(&self, depth: usize) -> usize {
        let index = self.index(depth);
        if depth == self.depth() && self.text_offset() == 0 {
            index
        } else {
            index + 1
        }
    }

    /// Start of the content of the ancestor at `depth`.
    pub fn start(&self, depth: usize) -> usize {
        if depth == 0 {
            0
        } else {
            self.path[depth - 1].offset + 1
        }
    }

    pub fn end(&self, depth: usize) -> usize {
        self.start(depth) + self.node(depth).content().size()
    }

    /// Position before the ancestor at `depth` (must be at least 1).
    pub fn before(&self, depth: usize) -> usize {
        if depth == self.depth() + 1 {
            self.pos
        } else {
            self.path[depth - 1].offset
        }
    }

    /// Position after the ancestor at `depth` (must be at least 1).
    pub fn after(&self, depth: usize) -> usize {
        if depth == self.depth() + 1 {
            self.pos
        } else {
            self.path[depth - 1].offset + self.node(depth).node_size()
        }
    }

    /// Offset into the text node the position points into, 0 between nodes.
    pub fn text_offset(&self) -> usize {
        self.pos - self.path[self.depth()].offset
    }

    pub fn node_after(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        if index == parent.child_count() {
            return None;
        }
        let offset = self.text_offset();
        let child = parent.child(index);
        if offset > 0 {
            Some(child.cut(offset, child.node_size()))
        } else {
            Some(child.clone())
        }
    }

    pub fn node_before(&self) -> Option<Node> {
        let parent = self.parent();
        let index = self.index(self.depth());
        let offset = self.text_offset();
        if offset > 0 {
            return Some(parent.child(index).cut(0, offset));
        }
        if index == 0 {
            None
        } else {
            Some(parent.child(index - 1).clone())
        }
    }

    /// Marks that text inserted here would receive.
    ///
    /// Non-inclusive marks (links) only continue when the node after the
    /// position also carries them.
    pub fn marks(&self) -> MarkSet {
        let parent = self.parent();
        let index = self.index(self.depth());
        if parent.content().size() == 0 {
            return MarkSet::empty();
        }
        if self.text_offset() > 0 {
            return parent.child(index).marks().clone();
        }
        let before = index.checked_sub(1).and_then(|i| parent.content().get(i));
        let after = parent.content().get(index);
        let (main, other) = match before {
            Some(b) => (b, after),
            None => match after {
                Some(a) => (a, None),
                None => return MarkSet::empty(),
            },
        };
        let mut marks = main.marks().clone();
        for mark in main.marks() {
            let keep = mark.mark_type().spec().inclusive
                || other.is_some_and(|o| mark.is_in_set(o.marks()));
            if !keep {
                marks = marks.remove(mark);
            }
        }
        marks
    }

    /// Deepest depth whose content contains both this position and `pos`.
    pub fn shared_depth(&self, pos: usize) -> usize {
        for depth in (1..=self.depth()).rev() {
            if self.start(depth) <= pos && self.end(depth) >= pos {
                return depth;
            }
        }
        0
    }

    pub fn same_parent(&self, other: &ResolvedPos<'_>) -> bool {
        self.pos - self.parent_offset == other.pos - other.parent_offset
    }

    /// Position of the child at `index` of the ancestor at `depth`.
    pub fn pos_at_index(&self, index: usize, depth: usize) -> usize {
        let node = self.node(depth);
        let mut pos = self.start(depth);
        for i in 0..index.min(node.child_count()) {
            pos += node.child(i).node_size();
        }
        pos
    }

    /// The innermost ancestor satisfying `pred`, as a depth.
    pub fn find_ancestor(&self, pred: impl Fn(&Node) -> bool) -> Option<usize> {
        (0..=self.depth()).rev().find(|&d| pred(self.node(d)))
    }

    /// The range of whole block siblings spanning from here to `other`.
    ///
    /// When `pred` is given, the range's parent must satisfy it.
    pub fn block_range(
        &self,
        other: &ResolvedPos<'a>,
        pred: Option<&dyn Fn(&Node) -> bool>,
    ) -> Option<NodeRange<'a>> {
        if other.pos < self.pos {
            return other.block_range(self, pred);
        }
        let skip = usize::from(self.parent().is_textblock() || self.pos == other.pos);
        let top = self.depth().checked_sub(skip)?;
        for depth in (0..=top).rev() {
            if other.pos <= self.end(depth) && pred.is_none_or(|p| p(self.node(depth))) {
                return Some(NodeRange::new(self.clone(), other.clone(), depth));
            }
        }
        None
    }
}

/// A flat range of siblings inside one parent node.
#[derive(Debug, Clone)]
pub struct NodeRange<'a> {
    pub from: ResolvedPos<'a>,
    pub to: ResolvedPos<'a>,
    pub depth: usize,
}

impl<'a> NodeRange<'a> {
    pub fn new(from: ResolvedPos<'a>, to: ResolvedPos<'a>, depth: usize) -> Self {
        Self { from, to, depth }
    }

    pub fn start(&self) -> usize {
        self.from.before(self.depth + 1)
    }

    pub fn end(&self) -> usize {
        self.to.after(self.depth + 1)
    }

    pub fn parent(&self) -> &'a Node {
        self.from.node(self.depth)
    }

    pub fn start_index(&self) -> usize {
        self.from.index(self.depth)
    }

    pub fn end_index(&self) -> usize {
        self.to.index_after(self.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mark;
    use crate::schema::NodeType;
    use crate::tests::*;

    #[test]
    fn test_resolve_inside_nested_list() {
        // <ul><li><p>ab</p></li></ul>
        let d = doc(vec![ul(vec![li(vec![p(vec![t("ab")])])])]);
        let pos = ResolvedPos::resolve(&d, 4).unwrap();
        assert_eq!(pos.depth(), 3);
        assert_eq!(pos.parent().node_type(), NodeType::Paragraph);
        assert_eq!(pos.start(3), 3);
        assert_eq!(pos.end(3), 5);
        assert_eq!(pos.before(3), 2);
        assert_eq!(pos.after(3), 6);
        assert_eq!(pos.before(1), 0);
        assert_eq!(pos.after(1), 8);
        assert_eq!(pos.text_offset(), 1);
        assert_eq!(pos.parent_offset, 1);
    }

    #[test]
    fn test_resolve_out_of_range() {
        let d = doc(vec![p(vec![t("ab")])]);
        assert!(ResolvedPos::resolve(&d, 4).is_some());
        assert!(ResolvedPos::resolve(&d, 5).is_none());
    }

    #[test]
    fn test_node_before_and_after_split_text() {
        let d = doc(vec![p(vec![t("hello")])]);
        let pos = ResolvedPos::resolve(&d, 3).unwrap();
        assert_eq!(pos.node_before().unwrap().text_str(), Some("he"));
        assert_eq!(pos.node_after().unwrap().text_str(), Some("llo"));
    }

    #[test]
    fn test_marks_at_link_end_are_not_extended() {
        let d = doc(vec![p(vec![
            tm("site", vec![Mark::link("https://x")]),
            t(" after"),
        ])]);
        let at_end = ResolvedPos::resolve(&d, 5).unwrap();
        assert!(at_end.marks().is_empty());

        let bold = doc(vec![p(vec![strong("bold"), t(" after")])]);
        let at_end = ResolvedPos::resolve(&bold, 5).unwrap();
        assert_eq!(at_end.marks().len(), 1);
    }

    #[test]
    fn test_block_range_over_two_paragraphs() {
        let d = doc(vec![p(vec![t("one")]), p(vec![t("two")]), p(vec![t("three")])]);
        let from = ResolvedPos::resolve(&d, 2).unwrap();
        let to = ResolvedPos::resolve(&d, 7).unwrap();
        let range = from.block_range(&to, None).unwrap();
        assert_eq!(range.depth, 0);
        assert_eq!(range.start(), 0);
        assert_eq!(range.end(), 10);
        assert_eq!(range.start_index(), 0);
        assert_eq!(range.end_index(), 2);
    }

    #[test]
    fn test_block_range_with_predicate() {
        let d = doc(vec![ul(vec![li(vec![p(vec![t("a")])]), li(vec![p(vec![t("b")])])])]);
        let from = ResolvedPos::resolve(&d, 3).unwrap();
        let to = ResolvedPos::resolve(&d, 8).unwrap();
        let range = from
            .block_range(&to, Some(&|n: &Node| n.node_type().is_list()))
            .unwrap();
        assert_eq!(range.depth, 1);
        assert_eq!(range.parent().node_type(), NodeType::BulletList);
        assert_eq!(range.start_index(), 0);
        assert_eq!(range.end_index(), 2);
    }
}
