//! The persisted page format: a JSON tree of `{type, attrs, content, marks, text}`
//! objects.
//!
//! Nodes with attributes always serialise every attribute, missing attributes
//! load as their defaults, and empty `content`/`marks` arrays are omitted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{Align, CellAttrs, Fragment, Mark, MarkSet, Node, NodeKind, SchemaError};
use crate::schema::{MarkType, NodeType};

/// A node as it appears in a page file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<RawNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<RawMark>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMark {
    #[serde(rename = "type")]
    pub mark_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
}

impl From<&Mark> for RawMark {
    fn from(mark: &Mark) -> Self {
        let attrs = match mark {
            Mark::Link { href, title } => Some(object(json!({ "href": href, "title": title }))),
            _ => None,
        };
        RawMark {
            mark_type: mark.mark_type().name().to_string(),
            attrs,
        }
    }
}

impl TryFrom<&RawMark> for Mark {
    type Error = SchemaError;

    fn try_from(raw: &RawMark) -> Result<Self, Self::Error> {
        let mark_type = MarkType::from_name(&raw.mark_type)
            .ok_or_else(|| SchemaError::UnknownMarkType(raw.mark_type.clone()))?;
        let attrs = Attrs::new(&raw.mark_type, raw.attrs.as_ref());
        match mark_type {
            MarkType::Link => Ok(Mark::Link {
                href: attrs.string("href")?.ok_or_else(|| attrs.invalid("href", "required"))?,
                title: attrs.string("title")?,
            }),
            other => Mark::plain(other).ok_or_else(|| SchemaError::UnknownMarkType(raw.mark_type.clone())),
        }
    }
}

impl From<&Node> for RawNode {
    fn from(node: &Node) -> Self {
        let mut raw = RawNode {
            node_type: node.node_type().name().to_string(),
            attrs: kind_attrs(node.kind()),
            content: node.content().iter().map(RawNode::from).collect(),
            marks: node.marks().iter().map(RawMark::from).collect(),
            text: None,
        };
        if let NodeKind::Text(text) = node.kind() {
            raw.text = Some(text.clone());
        }
        raw
    }
}

impl TryFrom<&RawNode> for Node {
    type Error = SchemaError;

    fn try_from(raw: &RawNode) -> Result<Self, Self::Error> {
        let node_type = NodeType::from_name(&raw.node_type)
            .ok_or_else(|| SchemaError::UnknownNodeType(raw.node_type.clone()))?;
        let marks = raw
            .marks
            .iter()
            .map(Mark::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let marks = MarkSet::from_marks(marks);

        if node_type == NodeType::Text {
            let text = raw.text.clone().ok_or(SchemaError::MissingText)?;
            if text.is_empty() {
                return Err(SchemaError::MissingText);
            }
            return Ok(Node::text_with_marks(text, marks));
        }

        let kind = parse_kind(node_type, &Attrs::new(&raw.node_type, raw.attrs.as_ref()))?;
        let children = raw
            .content
            .iter()
            .map(Node::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Node::create_checked(kind, Fragment::from_nodes(children), marks)
    }
}

impl Node {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(RawNode::from(self)).unwrap_or(Value::Null)
    }

    pub fn from_json(value: &Value) -> Result<Node, SchemaError> {
        let raw: RawNode = serde_json::from_value(value.clone())
            .map_err(|e| SchemaError::Malformed(e.to_string()))?;
        Node::try_from(&raw)
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn kind_attrs(kind: &NodeKind) -> Option<Map<String, Value>> {
    let value = match kind {
        NodeKind::Paragraph { align } => json!({ "class": align.class() }),
        NodeKind::Heading { level, align } => json!({ "level": level, "class": align.class() }),
        NodeKind::CodeBlock { params, collapsed } => {
            json!({ "params": params, "collapsed": collapsed })
        }
        NodeKind::OrderedList { order } => json!({ "order": order }),
        NodeKind::TableCell(cell) | NodeKind::TableHeader(cell) => json!({
            "colspan": cell.colspan,
            "rowspan": cell.rowspan,
            "colwidth": cell.colwidth,
            "background": cell.background,
        }),
        NodeKind::Image { src, alt, title } => json!({ "src": src, "alt": alt, "title": title }),
        _ => return None,
    };
    Some(object(value))
}

fn parse_kind(node_type: NodeType, attrs: &Attrs<'_>) -> Result<NodeKind, SchemaError> {
    let align = || -> Result<Align, SchemaError> {
        Ok(attrs
            .string("class")?
            .and_then(|class| Align::from_class(&class))
            .unwrap_or_default())
    };
    let cell = || -> Result<CellAttrs, SchemaError> {
        Ok(CellAttrs {
            colspan: attrs.u32("colspan")?.unwrap_or(1),
            rowspan: attrs.u32("rowspan")?.unwrap_or(1),
            colwidth: attrs.u32_list("colwidth")?,
            background: attrs.string("background")?,
        })
    };
    let kind = match node_type {
        NodeType::Paragraph => NodeKind::Paragraph { align: align()? },
        NodeType::Heading => {
            let level = attrs.u32("level")?.unwrap_or(1);
            if !(1..=6).contains(&level) {
                return Err(attrs.invalid("level", "must be between 1 and 6"));
            }
            NodeKind::Heading {
                level: level as u8,
                align: align()?,
            }
        }
        NodeType::CodeBlock => NodeKind::CodeBlock {
            params: attrs.string("params")?.unwrap_or_default(),
            collapsed: attrs.bool("collapsed")?.unwrap_or(false),
        },
        NodeType::OrderedList => NodeKind::OrderedList {
            order: attrs.u32("order")?.unwrap_or(1),
        },
        NodeType::TableCell => NodeKind::TableCell(cell()?),
        NodeType::TableHeader => NodeKind::TableHeader(cell()?),
        NodeType::Image => NodeKind::Image {
            src: attrs
                .string("src")?
                .ok_or_else(|| attrs.invalid("src", "required"))?,
            alt: attrs.string("alt")?,
            title: attrs.string("title")?,
        },
        other => NodeKind::with_defaults(other)
            .ok_or_else(|| SchemaError::UnknownNodeType(other.name().to_string()))?,
    };
    Ok(kind)
}

/// Typed access to a raw attribute map. `null` reads as absent.
struct Attrs<'a> {
    owner: &'a str,
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Attrs<'a> {
    fn new(owner: &'a str, map: Option<&'a Map<String, Value>>) -> Self {
        Self { owner, map }
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.map
            .and_then(|m| m.get(name))
            .filter(|v| !v.is_null())
    }

    fn invalid(&self, attr: &'static str, reason: &str) -> SchemaError {
        SchemaError::InvalidAttribute {
            node: self.owner.to_string(),
            attr,
            reason: reason.to_string(),
        }
    }

    fn string(&self, name: &'static str) -> Result<Option<String>, SchemaError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.invalid(name, "expected a string")),
        }
    }

    fn u32(&self, name: &'static str) -> Result<Option<u32>, SchemaError> {
        match self.get(name) {
            None => Ok(None),
            Some(v) => v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.invalid(name, "expected a non-negative integer")),
        }
    }

    fn bool(&self, name: &'static str) -> Result<Option<bool>, SchemaError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(self.invalid(name, "expected a boolean")),
        }
    }

    fn u32_list(&self, name: &'static str) -> Result<Option<Vec<u32>>, SchemaError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| v.as_u64().and_then(|n| u32::try_from(n).ok()))
                .collect::<Option<Vec<_>>>()
                .map(Some)
                .ok_or_else(|| self.invalid(name, "expected a list of integers")),
            Some(_) => Err(self.invalid(name, "expected a list of integers")),
        }
    }
}
