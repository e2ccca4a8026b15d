use super::{Assoc, Mapping, StepMap};
use crate::model::{Fragment, Mark, Node, NodeKind, ReplaceError, Slice};
use crate::schema::NodeType;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StepError {
    #[error("Schema violation: {0}")]
    SchemaViolation(String),
    #[error("Cannot turn {from:?} into {to:?}: {reason}")]
    IncompatibleNodeType {
        from: NodeType,
        to: NodeType,
        reason: String,
    },
    #[error("Position {0} is outside the document")]
    PositionOutOfRange(usize),
}

impl From<ReplaceError> for StepError {
    fn from(err: ReplaceError) -> Self {
        match err {
            ReplaceError::OutOfRange(pos) => StepError::PositionOutOfRange(pos),
            other => StepError::SchemaViolation(other.to_string()),
        }
    }
}

/// An atomic document change. Every step can be applied, inverted against the
/// document it was applied to, and describes how it moves positions.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Replace { from: usize, to: usize, slice: Slice },
    AddMark { from: usize, to: usize, mark: Mark },
    RemoveMark { from: usize, to: usize, mark: Mark },
    /// Change the type or attributes of the node starting at `pos`, keeping
    /// its content.
    SetNodeType { pos: usize, kind: NodeKind },
}

impl Step {
    pub fn apply(&self, doc: &Node) -> Result<Node, StepError> {
        match self {
            Step::Replace { from, to, slice } => {
                check_range(doc, *from, *to)?;
                Ok(doc.replace(*from, *to, slice)?)
            }
            Step::AddMark { from, to, mark } => {
                apply_mark(doc, *from, *to, &|node| node.mark(mark))
            }
            Step::RemoveMark { from, to, mark } => {
                apply_mark(doc, *from, *to, &|node| node.with_marks(node.marks().remove(mark)))
            }
            Step::SetNodeType { pos, kind } => apply_set_node_type(doc, *pos, kind),
        }
    }

    /// The step that undoes this one, given the document it applied to.
    pub fn invert(&self, doc_before: &Node) -> Step {
        match self {
            Step::Replace { from, to, slice } => Step::Replace {
                from: *from,
                to: from + slice.size(),
                slice: doc_before.slice(*from, *to),
            },
            Step::AddMark { from, to, mark } => Step::RemoveMark {
                from: *from,
                to: *to,
                mark: mark.clone(),
            },
            Step::RemoveMark { from, to, mark } => Step::AddMark {
                from: *from,
                to: *to,
                mark: mark.clone(),
            },
            Step::SetNodeType { pos, kind } => Step::SetNodeType {
                pos: *pos,
                kind: doc_before
                    .node_at(*pos)
                    .map(|n| n.kind().clone())
                    .unwrap_or_else(|| kind.clone()),
            },
        }
    }

    pub fn get_map(&self) -> StepMap {
        match self {
            Step::Replace { from, to, slice } => StepMap::new(*from, to - from, slice.size()),
            _ => StepMap::empty(),
        }
    }

    /// This step with its positions mapped through `mapping`, or `None` when
    /// the content it applied to was deleted.
    pub fn map(&self, mapping: &Mapping) -> Option<Step> {
        match self {
            Step::Replace { from, to, slice } => {
                let start = mapping.map_result(*from, Assoc::Right);
                let end = mapping.map_result(*to, Assoc::Left);
                if start.deleted && end.deleted {
                    return None;
                }
                Some(Step::Replace {
                    from: start.pos,
                    to: end.pos.max(start.pos),
                    slice: slice.clone(),
                })
            }
            Step::AddMark { from, to, mark } | Step::RemoveMark { from, to, mark } => {
                let from = mapping.map(*from, Assoc::Right);
                let to = mapping.map(*to, Assoc::Left);
                if from >= to {
                    return None;
                }
                let mark = mark.clone();
                Some(match self {
                    Step::AddMark { .. } => Step::AddMark { from, to, mark },
                    _ => Step::RemoveMark { from, to, mark },
                })
            }
            Step::SetNodeType { pos, kind } => {
                let result = mapping.map_result(*pos, Assoc::Right);
                (!result.deleted).then(|| Step::SetNodeType {
                    pos: result.pos,
                    kind: kind.clone(),
                })
            }
        }
    }
}

fn check_range(doc: &Node, from: usize, to: usize) -> Result<(), StepError> {
    let size = doc.content().size();
    if from > size {
        return Err(StepError::PositionOutOfRange(from));
    }
    if to > size || to < from {
        return Err(StepError::PositionOutOfRange(to));
    }
    Ok(())
}

/// Rebuild `from..to` with `f` applied to every inline node whose parent
/// allows marks.
fn apply_mark(
    doc: &Node,
    from: usize,
    to: usize,
    f: &dyn Fn(&Node) -> Node,
) -> Result<Node, StepError> {
    check_range(doc, from, to)?;
    let old = doc.slice(from, to);
    let rfrom = doc
        .resolve(from)
        .ok_or(StepError::PositionOutOfRange(from))?;
    let parent = rfrom.node(rfrom.shared_depth(to));
    let content = map_fragment(&old.content, parent, f);
    let slice = Slice::new(content, old.open_start, old.open_end);
    Ok(doc.replace(from, to, &slice)?)
}

fn map_fragment(fragment: &Fragment, parent: &Node, f: &dyn Fn(&Node) -> Node) -> Fragment {
    let nodes = fragment
        .iter()
        .map(|child| {
            let mut child = child.clone();
            if child.content().size() > 0 {
                child = child.copy(map_fragment(child.content(), &child, f));
            }
            if child.is_inline()
                && (child.is_text() || child.is_atom())
                && parent.node_type().spec().marks_allowed
            {
                child = f(&child);
            }
            child
        })
        .collect();
    Fragment::from_nodes(nodes)
}

fn apply_set_node_type(doc: &Node, pos: usize, kind: &NodeKind) -> Result<Node, StepError> {
    let node = doc
        .node_at(pos)
        .ok_or(StepError::PositionOutOfRange(pos))?;
    if node.is_text() || kind.node_type().is_text() {
        return Err(StepError::IncompatibleNodeType {
            from: node.node_type(),
            to: kind.node_type(),
            reason: "text nodes cannot be retyped".to_string(),
        });
    }
    let retyped = Node::create_checked(kind.clone(), node.content().clone(), node.marks().clone())
        .map_err(|e| StepError::IncompatibleNodeType {
            from: node.node_type(),
            to: kind.node_type(),
            reason: e.to_string(),
        })?;
    Ok(doc.replace(pos, pos + node.node_size(), &Slice::closed(vec![retyped]))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_replace_step_inverts() {
        let d = doc(vec![p(vec![t("hello")])]);
        let step = Step::Replace {
            from: 2,
            to: 4,
            slice: Slice::closed(vec![t("EY")]),
        };
        let after = step.apply(&d).unwrap();
        assert_eq!(after, doc(vec![p(vec![t("hEYlo")])]));
        let undone = step.invert(&d).apply(&after).unwrap();
        assert_eq!(undone, d);
    }

    #[test]
    fn test_add_mark_only_touches_inline_content() {
        let d = doc(vec![p(vec![t("one")]), p(vec![t("two")])]);
        let step = Step::AddMark {
            from: 0,
            to: d.content().size(),
            mark: Mark::Strong,
        };
        let after = step.apply(&d).unwrap();
        assert_eq!(after, doc(vec![p(vec![strong("one")]), p(vec![strong("two")])]));
        assert_eq!(step.invert(&d).apply(&after).unwrap(), d);
    }

    #[test]
    fn test_add_mark_skips_code_blocks() {
        let d = doc(vec![code("", "let x"), p(vec![t("y")])]);
        let step = Step::AddMark {
            from: 0,
            to: d.content().size(),
            mark: Mark::Em,
        };
        let after = step.apply(&d).unwrap();
        assert_eq!(after, doc(vec![code("", "let x"), p(vec![em("y")])]));
    }

    #[test]
    fn test_set_node_type_keeps_content() {
        let d = doc(vec![p(vec![t("title")])]);
        let step = Step::SetNodeType {
            pos: 0,
            kind: NodeKind::heading(2),
        };
        let after = step.apply(&d).unwrap();
        assert_eq!(after, doc(vec![h(2, vec![t("title")])]));
        assert_eq!(step.invert(&d).apply(&after).unwrap(), d);
    }

    #[test]
    fn test_set_node_type_rejects_marks_in_code() {
        let d = doc(vec![p(vec![strong("bold")])]);
        let step = Step::SetNodeType {
            pos: 0,
            kind: NodeKind::code_block(""),
        };
        assert!(matches!(
            step.apply(&d),
            Err(StepError::IncompatibleNodeType { .. })
        ));
    }

    #[test]
    fn test_out_of_range_positions() {
        let d = doc(vec![p(vec![t("x")])]);
        let step = Step::Replace {
            from: 2,
            to: 9,
            slice: Slice::empty(),
        };
        assert_eq!(step.apply(&d), Err(StepError::PositionOutOfRange(9)));
    }

    #[test]
    fn test_replace_map() {
        let step = Step::Replace {
            from: 3,
            to: 5,
            slice: Slice::closed(vec![t("abcd")]),
        };
        let map = step.get_map();
        assert_eq!(map.map(10, Assoc::Right), 12);
    }
}
