use serde::{Deserialize, Serialize};

use crate::schema::MarkType;

/// An inline formatting mark together with its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mark {
    Link {
        href: String,
        #[serde(default)]
        title: Option<String>,
    },
    Em,
    Strong,
    Underline,
    Code,
}

impl Mark {
    pub fn link(href: impl Into<String>) -> Self {
        Mark::Link {
            href: href.into(),
            title: None,
        }
    }

    pub fn mark_type(&self) -> MarkType {
        match self {
            Mark::Link { .. } => MarkType::Link,
            Mark::Em => MarkType::Em,
            Mark::Strong => MarkType::Strong,
            Mark::Underline => MarkType::Underline,
            Mark::Code => MarkType::Code,
        }
    }

    /// A mark of `mark_type` with default attributes, if it has no required ones.
    pub fn plain(mark_type: MarkType) -> Option<Self> {
        match mark_type {
            MarkType::Link => None,
            MarkType::Em => Some(Mark::Em),
            MarkType::Strong => Some(Mark::Strong),
            MarkType::Underline => Some(Mark::Underline),
            MarkType::Code => Some(Mark::Code),
        }
    }

    /// Add this mark to `set`, dropping any mark it excludes.
    pub fn add_to_set(&self, set: &MarkSet) -> MarkSet {
        let mut marks: Vec<Mark> = set
            .iter()
            .filter(|m| !self.mark_type().excludes(m.mark_type()) && *m != self)
            .cloned()
            .collect();
        let idx = marks
            .iter()
            .position(|m| m.mark_type() > self.mark_type())
            .unwrap_or(marks.len());
        marks.insert(idx, self.clone());
        MarkSet(marks)
    }

    pub fn is_in_set(&self, set: &MarkSet) -> bool {
        set.iter().any(|m| m == self)
    }
}

/// A sorted set of marks, at most one per mark type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from arbitrary marks, applying exclusion rules in order.
    pub fn from_marks(marks: impl IntoIterator<Item = Mark>) -> Self {
        marks
            .into_iter()
            .fold(MarkSet::empty(), |set, mark| mark.add_to_set(&set))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mark> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn has_type(&self, mark_type: MarkType) -> bool {
        self.find(mark_type).is_some()
    }

    pub fn find(&self, mark_type: MarkType) -> Option<&Mark> {
        self.0.iter().find(|m| m.mark_type() == mark_type)
    }

    pub fn add(&self, mark: &Mark) -> MarkSet {
        mark.add_to_set(self)
    }

    pub fn remove_type(&self, mark_type: MarkType) -> MarkSet {
        MarkSet(
            self.0
                .iter()
                .filter(|m| m.mark_type() != mark_type)
                .cloned()
                .collect(),
        )
    }

    pub fn remove(&self, mark: &Mark) -> MarkSet {
        MarkSet(self.0.iter().filter(|m| *m != mark).cloned().collect())
    }
}

impl<'a> IntoIterator for &'a MarkSet {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_kept_in_rank_order() {
        let set = MarkSet::from_marks([Mark::Code, Mark::Strong, Mark::link("a")]);
        let types: Vec<_> = set.iter().map(Mark::mark_type).collect();
        assert_eq!(types, vec![MarkType::Link, MarkType::Strong, MarkType::Code]);
    }

    #[test]
    fn test_adding_link_replaces_existing_link() {
        let set = MarkSet::from_marks([Mark::link("https://old"), Mark::Em]);
        let set = set.add(&Mark::link("https://new"));
        assert_eq!(set.len(), 2);
        assert_eq!(set.find(MarkType::Link), Some(&Mark::link("https://new")));
    }

    #[test]
    fn test_adding_same_mark_is_idempotent() {
        let set = MarkSet::from_marks([Mark::Strong]);
        assert_eq!(set.add(&Mark::Strong), set);
    }

    #[test]
    fn test_remove_type() {
        let set = MarkSet::from_marks([Mark::Strong, Mark::Em]);
        let set = set.remove_type(MarkType::Strong);
        assert!(!set.has_type(MarkType::Strong));
        assert!(set.has_type(MarkType::Em));
    }
}
