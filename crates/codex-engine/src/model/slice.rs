//! Slices and the replace algorithm.
//!
//! A slice is a fragment cut out of a document, possibly with partially
//! included nodes on either side (its open depths). Replacing a range with a
//! slice joins the open sides onto the nodes surrounding the range, which is
//! how a single step can split a paragraph or drop a block into the middle
//! of one.

use super::{Fragment, Node, ResolvedPos, SchemaError};
use crate::schema::NodeType;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReplaceError {
    #[error("Inserted content deeper than insertion position")]
    TooDeep,
    #[error("Inconsistent open depths")]
    InconsistentDepths,
    #[error("Cannot join {sub:?} onto {main:?}")]
    CannotJoin { main: NodeType, sub: NodeType },
    #[error("Position {0} out of range")]
    OutOfRange(usize),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Slice {
    pub content: Fragment,
    pub open_start: usize,
    pub open_end: usize,
}

impl Slice {
    pub fn new(content: Fragment, open_start: usize, open_end: usize) -> Self {
        Self {
            content,
            open_start,
            open_end,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A closed slice holding `nodes`.
    pub fn closed(nodes: Vec<Node>) -> Self {
        Self::new(Fragment::from_nodes(nodes), 0, 0)
    }

    /// The number of positions this slice adds when inserted.
    pub fn size(&self) -> usize {
        self.content
            .size()
            .saturating_sub(self.open_start + self.open_end)
    }

    /// Open the fragment as deep as its first and last non-leaf descendants.
    pub fn max_open(content: Fragment) -> Self {
        let mut open_start = 0;
        let mut node = content.first_child();
        while let Some(n) = node {
            if n.is_leaf() || n.is_text() || n.node_type().spec().isolating {
                break;
            }
            open_start += 1;
            node = n.first_child();
        }
        let mut open_end = 0;
        let mut node = content.last_child();
        while let Some(n) = node {
            if n.is_leaf() || n.is_text() || n.node_type().spec().isolating {
                break;
            }
            open_end += 1;
            node = n.last_child();
        }
        Self::new(content, open_start, open_end)
    }
}

impl Node {
    pub fn resolve(&self, pos: usize) -> Option<ResolvedPos<'_>> {
        ResolvedPos::resolve(self, pos)
    }

    /// Cut the content between two positions into a slice.
    pub fn slice(&self, from: usize, to: usize) -> Slice {
        if from >= to {
            return Slice::empty();
        }
        let (Some(rfrom), Some(rto)) = (self.resolve(from), self.resolve(to)) else {
            return Slice::empty();
        };
        let depth = rfrom.shared_depth(to);
        let start = rfrom.start(depth);
        let node = rfrom.node(depth);
        let content = node.content().cut(rfrom.pos - start, rto.pos - start);
        Slice::new(content, rfrom.depth() - depth, rto.depth() - depth)
    }

    /// Replace `from..to` with `slice`, returning the new document.
    pub fn replace(&self, from: usize, to: usize, slice: &Slice) -> Result<Node, ReplaceError> {
        let rfrom = self.resolve(from).ok_or(ReplaceError::OutOfRange(from))?;
        let rto = self.resolve(to).ok_or(ReplaceError::OutOfRange(to))?;
        if slice.open_start > rfrom.depth() {
            return Err(ReplaceError::TooDeep);
        }
        if rfrom.depth() as isize - slice.open_start as isize
            != rto.depth() as isize - slice.open_end as isize
        {
            return Err(ReplaceError::InconsistentDepths);
        }
        replace_outer(&rfrom, &rto, slice, 0)
    }
}

fn replace_outer(
    from: &ResolvedPos<'_>,
    to: &ResolvedPos<'_>,
    slice: &Slice,
    depth: usize,
) -> Result<Node, ReplaceError> {
    let index = from.index(depth);
    let node = from.node(depth);
    if index == to.index(depth) && depth < from.depth() - slice.open_start {
        let inner = replace_outer(from, to, slice, depth + 1)?;
        return Ok(node.copy(node.content().replace_child(index, inner)));
    }
    if slice.content.size() == 0 {
        let content = replace_two_way(from, to, depth)?;
        return close(node, content);
    }
    if slice.open_start == 0
        && slice.open_end == 0
        && from.depth() == depth
        && to.depth() == depth
    {
        let parent = from.parent();
        let content = parent.content();
        let joined = content
            .cut(0, from.parent_offset)
            .append(&slice.content)
            .append(&content.cut(to.parent_offset, content.size()));
        return close(parent, joined);
    }
    let along = prepare_slice_for_replace(slice, from);
    let start = along
        .resolve(slice.open_start + (from.depth() - slice.open_start))
        .ok_or(ReplaceError::InconsistentDepths)?;
    let end_pos = along.content().size() as isize
        - slice.open_end as isize
        - (from.depth() - slice.open_start) as isize;
    let end = usize::try_from(end_pos)
        .ok()
        .and_then(|p| along.resolve(p))
        .ok_or(ReplaceError::InconsistentDepths)?;
    let content = replace_three_way(from, &start, &end, to, depth)?;
    close(node, content)
}

/// Wrap the slice in copies of `along`'s ancestors so it can be resolved at
/// the same depths as the insertion point.
fn prepare_slice_for_replace(slice: &Slice, along: &ResolvedPos<'_>) -> Node {
    let extra = along.depth() - slice.open_start;
    let mut node = along.node(extra).copy(slice.content.clone());
    for depth in (0..extra).rev() {
        node = along.node(depth).copy(Fragment::from_node(node));
    }
    node
}

fn compatible_content(main: NodeType, sub: NodeType) -> bool {
    main == sub || main.spec().content.compatible(&sub.spec().content)
}

fn joinable<'a>(
    before: &ResolvedPos<'a>,
    after: &ResolvedPos<'_>,
    depth: usize,
) -> Result<&'a Node, ReplaceError> {
    let node = before.node(depth);
    let sub = after.node(depth);
    if !compatible_content(node.node_type(), sub.node_type()) {
        return Err(ReplaceError::CannotJoin {
            main: node.node_type(),
            sub: sub.node_type(),
        });
    }
    Ok(node)
}

fn add_node(child: Node, target: &mut Vec<Node>) {
    if let Some(last) = target.last_mut()
        && child.is_text()
        && child.same_markup_except_text(last)
    {
        let joined = format!(
            "{}{}",
            last.text_str().unwrap_or_default(),
            child.text_str().unwrap_or_default()
        );
        *last = Node::text_with_marks(joined, child.marks().clone());
        return;
    }
    target.push(child);
}

fn add_range(
    start: Option<&ResolvedPos<'_>>,
    end: Option<&ResolvedPos<'_>>,
    depth: usize,
    target: &mut Vec<Node>,
) {
    let Some(node) = end.or(start).map(|p| p.node(depth)) else {
        return;
    };
    let mut start_index = 0;
    let end_index = end.map_or(node.child_count(), |e| e.index(depth));
    if let Some(start) = start {
        start_index = start.index(depth);
        if start.depth() > depth {
            start_index += 1;
        } else if start.text_offset() > 0 {
            if let Some(after) = start.node_after() {
                add_node(after, target);
            }
            start_index += 1;
        }
    }
    for i in start_index..end_index {
        add_node(node.child(i).clone(), target);
    }
    if let Some(end) = end
        && end.depth() == depth
        && end.text_offset() > 0
        && let Some(before) = end.node_before()
    {
        add_node(before, target);
    }
}

fn close(node: &Node, content: Fragment) -> Result<Node, ReplaceError> {
    node.check_content(&content)?;
    Ok(node.copy(content))
}

fn replace_three_way(
    from: &ResolvedPos<'_>,
    start: &ResolvedPos<'_>,
    end: &ResolvedPos<'_>,
    to: &ResolvedPos<'_>,
    depth: usize,
) -> Result<Fragment, ReplaceError> {
    let open_start = if from.depth() > depth {
        Some(joinable(from, start, depth + 1)?)
    } else {
        None
    };
    let open_end = if to.depth() > depth {
        Some(joinable(end, to, depth + 1)?)
    } else {
        None
    };

    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);
    match (open_start, open_end) {
        (Some(os), Some(oe)) if start.index(depth) == end.index(depth) => {
            if !compatible_content(os.node_type(), oe.node_type()) {
                return Err(ReplaceError::CannotJoin {
                    main: os.node_type(),
                    sub: oe.node_type(),
                });
            }
            let inner = replace_three_way(from, start, end, to, depth + 1)?;
            add_node(close(os, inner)?, &mut content);
        }
        _ => {
            if let Some(os) = open_start {
                let inner = replace_two_way(from, start, depth + 1)?;
                add_node(close(os, inner)?, &mut content);
            }
            add_range(Some(start), Some(end), depth, &mut content);
            if let Some(oe) = open_end {
                let inner = replace_two_way(end, to, depth + 1)?;
                add_node(close(oe, inner)?, &mut content);
            }
        }
    }
    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_nodes(content))
}

fn replace_two_way(
    from: &ResolvedPos<'_>,
    to: &ResolvedPos<'_>,
    depth: usize,
) -> Result<Fragment, ReplaceError> {
    let mut content = Vec::new();
    add_range(None, Some(from), depth, &mut content);
    if from.depth() > depth {
        let node = joinable(from, to, depth + 1)?;
        let inner = replace_two_way(from, to, depth + 1)?;
        add_node(close(node, inner)?, &mut content);
    }
    add_range(Some(to), None, depth, &mut content);
    Ok(Fragment::from_nodes(content))
}

impl Node {
    fn same_markup_except_text(&self, other: &Node) -> bool {
        self.is_text() && other.is_text() && self.marks() == other.marks()
    }
}
