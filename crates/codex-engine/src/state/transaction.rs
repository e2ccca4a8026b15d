use std::time::{SystemTime, UNIX_EPOCH};

use super::{EditorState, Selection};
use crate::model::{Fragment, Mark, MarkSet, Node, NodeKind, Slice};
use crate::schema::{MarkType, NodeType};
use crate::transform::{Mapping, Step, StepError};

/// Marks a transaction produced by undo or redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Undo,
    Redo,
}

/// A batch of steps applied on top of an [`EditorState`].
///
/// Steps are applied eagerly, so `doc()` always reflects every successful step
/// so far. Failing steps are dropped and leave the document untouched.
#[derive(Debug, Clone)]
pub struct Transaction {
    before: Node,
    doc: Node,
    steps: Vec<Step>,
    docs: Vec<Node>,
    mapping: Mapping,
    selection_before: Selection,
    selection: Option<Selection>,
    stored_marks: Option<MarkSet>,
    stored_marks_set: bool,
    add_to_history: bool,
    time: u64,
    history_action: Option<HistoryAction>,
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl Transaction {
    pub fn new(state: &EditorState) -> Self {
        Self {
            before: state.doc().clone(),
            doc: state.doc().clone(),
            steps: Vec::new(),
            docs: Vec::new(),
            mapping: Mapping::new(),
            selection_before: *state.selection(),
            selection: None,
            stored_marks: state.stored_marks().cloned(),
            stored_marks_set: false,
            add_to_history: true,
            time: now_millis(),
            history_action: None,
        }
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    /// The document the transaction started from.
    pub fn before(&self) -> &Node {
        &self.before
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The document before each step.
    pub fn docs(&self) -> &[Node] {
        &self.docs
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// The explicitly set selection, or the starting selection mapped through
    /// every step.
    pub fn selection(&self) -> Selection {
        self.selection
            .unwrap_or_else(|| self.selection_before.map(&self.doc, &self.mapping))
    }

    pub fn selection_set(&self) -> bool {
        self.selection.is_some()
    }

    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = Some(selection);
        self.stored_marks = None;
        self
    }

    pub fn stored_marks(&self) -> Option<&MarkSet> {
        self.stored_marks.as_ref()
    }

    pub fn stored_marks_set(&self) -> bool {
        self.stored_marks_set
    }

    pub fn set_stored_marks(&mut self, marks: Option<MarkSet>) -> &mut Self {
        self.stored_marks = marks;
        self.stored_marks_set = true;
        self
    }

    pub fn add_to_history(&self) -> bool {
        self.add_to_history
    }

    pub fn set_add_to_history(&mut self, add: bool) -> &mut Self {
        self.add_to_history = add;
        self
    }

    /// Milliseconds since the epoch when the transaction was created.
    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn set_time(&mut self, time: u64) -> &mut Self {
        self.time = time;
        self
    }

    pub fn history_action(&self) -> Option<HistoryAction> {
        self.history_action
    }

    pub(crate) fn set_history_action(&mut self, action: HistoryAction) -> &mut Self {
        self.history_action = Some(action);
        self
    }

    /// Apply a step, returning the error if it does not fit the document.
    pub fn try_step(&mut self, step: Step) -> Result<(), StepError> {
        let doc = step.apply(&self.doc)?;
        self.mapping.push(step.get_map());
        self.docs.push(std::mem::replace(&mut self.doc, doc));
        self.steps.push(step);
        if !self.stored_marks_set {
            self.stored_marks = None;
        }
        Ok(())
    }

    /// Apply a step, dropping it when it fails.
    pub fn step(&mut self, step: Step) -> bool {
        match self.try_step(step) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("dropping step: {err}");
                false
            }
        }
    }

    pub fn replace(&mut self, from: usize, to: usize, slice: Slice) -> bool {
        if from == to && slice.size() == 0 {
            return true;
        }
        self.step(Step::Replace { from, to, slice })
    }

    pub fn replace_with(&mut self, from: usize, to: usize, nodes: Vec<Node>) -> bool {
        self.replace(from, to, Slice::closed(nodes))
    }

    pub fn delete(&mut self, from: usize, to: usize) -> bool {
        self.replace(from, to, Slice::empty())
    }

    pub fn insert(&mut self, pos: usize, nodes: Vec<Node>) -> bool {
        self.replace_with(pos, pos, nodes)
    }

    /// Replace `from..to` with `text`, carrying the stored marks or the marks
    /// at `from`.
    pub fn insert_text(&mut self, text: &str, from: usize, to: usize) -> bool {
        if text.is_empty() {
            return self.delete(from, to);
        }
        let Some(rfrom) = self.doc.resolve(from) else {
            return false;
        };
        let marks = if !rfrom.parent().node_type().spec().marks_allowed {
            MarkSet::empty()
        } else if let Some(stored) = &self.stored_marks {
            stored.clone()
        } else {
            rfrom.marks()
        };
        self.replace_with(from, to, vec![Node::text_with_marks(text, marks)])
    }

    /// Add `mark` to every inline node in `from..to` whose parent allows it.
    ///
    /// Only sub-ranges that actually change produce steps.
    pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> bool {
        let mut removed: Vec<(usize, usize, Mark)> = Vec::new();
        let mut added: Vec<(usize, usize)> = Vec::new();
        self.doc.nodes_between(from, to, &mut |node, pos, parent, _| {
            if !node.is_inline() {
                return true;
            }
            if mark.is_in_set(node.marks()) || !parent.node_type().spec().marks_allowed {
                return false;
            }
            let start = pos.max(from);
            let end = (pos + node.node_size()).min(to);
            let new_set = node.marks().add(&mark);
            for old in node.marks() {
                if old.is_in_set(&new_set) {
                    continue;
                }
                match removed.last_mut() {
                    Some(last) if last.1 == start && last.2 == *old => last.1 = end,
                    _ => removed.push((start, end, old.clone())),
                }
            }
            match added.last_mut() {
                Some(last) if last.1 == start => last.1 = end,
                _ => added.push((start, end)),
            }
            false
        });
        let mut changed = false;
        for (from, to, mark) in removed {
            changed |= self.step(Step::RemoveMark { from, to, mark });
        }
        for (from, to) in added {
            changed |= self.step(Step::AddMark {
                from,
                to,
                mark: mark.clone(),
            });
        }
        changed
    }

    /// Remove every mark of `mark_type` from `from..to`.
    pub fn remove_mark(&mut self, from: usize, to: usize, mark_type: MarkType) -> bool {
        let mut matched: Vec<(usize, usize, Mark)> = Vec::new();
        self.doc.nodes_between(from, to, &mut |node, pos, _, _| {
            if !node.is_inline() {
                return true;
            }
            if let Some(found) = node.marks().find(mark_type) {
                let start = pos.max(from);
                let end = (pos + node.node_size()).min(to);
                match matched.last_mut() {
                    Some(last) if last.1 == start && last.2 == *found => last.1 = end,
                    _ => matched.push((start, end, found.clone())),
                }
            }
            false
        });
        let mut changed = false;
        for (from, to, mark) in matched {
            changed |= self.step(Step::RemoveMark { from, to, mark });
        }
        changed
    }

    pub fn set_node_type(&mut self, pos: usize, kind: NodeKind) -> bool {
        if self.doc.node_at(pos).is_some_and(|n| *n.kind() == kind) {
            return true;
        }
        self.step(Step::SetNodeType { pos, kind })
    }

    /// Retype the textblock at `pos`, first clearing content the new type
    /// does not allow. Newlines become hard breaks when leaving code.
    pub fn set_block_type(&mut self, pos: usize, kind: NodeKind) -> bool {
        let target = kind.node_type();
        let from_code = self
            .doc
            .node_at(pos)
            .is_some_and(|n| n.node_type().spec().code);
        self.clear_incompatible(pos, target);
        if !self.set_node_type(pos, kind) {
            return false;
        }
        if from_code && !target.spec().code {
            self.replace_newlines(pos);
        }
        true
    }

    /// Strip content of the node at `pos` that would not be valid inside a
    /// node of `target`. Disallowed marks are removed and disallowed inline
    /// nodes deleted; hard breaks become newline characters in code.
    pub fn clear_incompatible(&mut self, pos: usize, target: NodeType) -> bool {
        let Some(node) = self.doc.node_at(pos).cloned() else {
            return false;
        };
        let spec = target.spec();
        let mut replacements: Vec<(usize, usize, Vec<Node>)> = Vec::new();
        let mut mark_removals: Vec<(usize, usize, Mark)> = Vec::new();
        let mut cur = pos + 1;
        for child in node.content() {
            let end = cur + child.node_size();
            if spec.code && child.node_type() == NodeType::HardBreak {
                replacements.push((cur, end, vec![Node::text("\n")]));
            } else if !spec.content.allows(child.node_type()) {
                replacements.push((cur, end, Vec::new()));
            } else {
                if !spec.marks_allowed {
                    for mark in child.marks() {
                        mark_removals.push((cur, end, mark.clone()));
                    }
                }
            }
            cur = end;
        }
        let mut changed = false;
        for (from, to, mark) in mark_removals {
            changed |= self.step(Step::RemoveMark { from, to, mark });
        }
        for (from, to, nodes) in replacements.into_iter().rev() {
            changed |= self.replace_with(from, to, nodes);
        }
        changed
    }

    /// Turn newline characters in the textblock at `pos` into hard breaks.
    pub fn replace_newlines(&mut self, pos: usize) -> bool {
        let Some(node) = self.doc.node_at(pos).cloned() else {
            return false;
        };
        let mut replacements = Vec::new();
        let mut cur = pos + 1;
        for child in node.content() {
            let end = cur + child.node_size();
            if let Some(text) = child.text_str()
                && text.contains('\n')
            {
                replacements.push((cur, end, split_newlines(text, child.marks())));
            }
            cur = end;
        }
        let mut changed = false;
        for (from, to, nodes) in replacements.into_iter().rev() {
            changed |= self.replace_with(from, to, nodes);
        }
        changed
    }

    /// Insert a block node at `pos`, splitting the surrounding blocks up to
    /// the nearest ancestor that can hold it. Returns where the node landed.
    ///
    /// At the very start or end of the enclosing block the node is placed
    /// before or after it instead of splitting. Isolating ancestors (table
    /// cells) are never split.
    pub fn insert_block(&mut self, pos: usize, node: Node) -> Option<usize> {
        let rpos = self.doc.resolve(pos)?;
        let node_type = node.node_type();
        let depth = rpos.depth();
        let mut target = None;
        for d in (0..=depth).rev() {
            let parent = rpos.node(d);
            let index = rpos.index(d);
            let children = parent.content().types();
            let accepts = if d == depth {
                parent.can_replace_with(index, index, node_type)
            } else {
                let mut candidate = children.clone();
                let split = candidate[index];
                candidate.splice(index..=index, [split, node_type, split]);
                parent.node_type().spec().content.matches(&candidate)
            };
            if accepts {
                target = Some(d);
                break;
            }
            if parent.node_type().spec().isolating {
                break;
            }
        }
        let Some(d) = target else {
            log::debug!("no ancestor at {pos} accepts {node_type:?}");
            return None;
        };
        let at = if d == depth {
            pos
        } else if (d + 1..=depth).all(|level| rpos.pos == rpos.start(level)) {
            rpos.before(d + 1)
        } else if (d + 1..=depth).all(|level| rpos.pos == rpos.end(level)) {
            rpos.after(d + 1)
        } else {
            return self.split_insert(pos, d, node);
        };
        self.insert(at, vec![node]).then_some(at)
    }

    fn split_insert(&mut self, pos: usize, d: usize, node: Node) -> Option<usize> {
        let rpos = self.doc.resolve(pos)?;
        let depth = rpos.depth();
        let open = depth - d;
        let mut left = rpos.node(depth).copy(Fragment::empty());
        let mut right = left.clone();
        for level in (d + 1..depth).rev() {
            left = rpos.node(level).copy(Fragment::from_node(left));
            right = rpos.node(level).copy(Fragment::from_node(right));
        }
        let slice = Slice::new(Fragment::from_nodes(vec![left, node, right]), open, open);
        self.replace(pos, pos, slice).then_some(pos + open)
    }

    /// Replace the selection with `node`: inline nodes go in place, block
    /// nodes through [`Transaction::insert_block`]. Returns the position of
    /// the inserted node.
    pub fn replace_selection_with(&mut self, node: Node) -> Option<usize> {
        let (from, to) = self.selection().range(&self.doc);
        if node.is_inline() {
            let marks = self
                .doc
                .resolve(from)
                .filter(|r| r.parent().node_type().spec().marks_allowed)
                .map(|r| r.marks())
                .unwrap_or_default();
            let node = if node.is_text() {
                node.with_marks(marks)
            } else {
                node
            };
            return self.replace_with(from, to, vec![node]).then_some(from);
        }
        if from != to && !self.delete(from, to) {
            return None;
        }
        self.insert_block(from, node)
    }
}

fn split_newlines(text: &str, marks: &MarkSet) -> Vec<Node> {
    let mut nodes = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            nodes.push(Node::leaf(NodeKind::HardBreak));
        }
        if !line.is_empty() {
            nodes.push(Node::text_with_marks(line, marks.clone()));
        }
    }
    nodes
}
