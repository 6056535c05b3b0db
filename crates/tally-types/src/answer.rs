use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A nested answer mapping, keyed by question identifier (or by whatever
/// grouping keys the form nests questions under).
pub type AnswerTree = BTreeMap<String, AnswerNode>;

/// One node in an answer tree.
///
/// A node is exactly one of three shapes, so the merger's branching is
/// exhaustive and checked at compile time. Nodes serialize transparently
/// as the underlying JSON shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum AnswerNode {
    /// A leaf scalar: string, number, boolean, or null.
    Scalar(Value),
    /// A leaf list. Lists merge atomically, never element-wise.
    Sequence(Vec<Value>),
    /// A nested mapping, merged key by key.
    Mapping(AnswerTree),
}

impl AnswerNode {
    /// Returns `true` if this node is a mapping.
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping(_))
    }

    /// The mapping inside this node, if it is one.
    pub fn as_mapping(&self) -> Option<&AnswerTree> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Mutable access to the mapping inside this node, if it is one.
    pub fn as_mapping_mut(&mut self) -> Option<&mut AnswerTree> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// The node's value as plain JSON.
    pub fn to_value(&self) -> Value {
        self.clone().into()
    }
}

impl From<Value> for AnswerNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Mapping(
                map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
            Value::Array(items) => Self::Sequence(items),
            other => Self::Scalar(other),
        }
    }
}

impl From<AnswerNode> for Value {
    fn from(node: AnswerNode) -> Self {
        match node {
            AnswerNode::Scalar(v) => v,
            AnswerNode::Sequence(items) => Value::Array(items),
            AnswerNode::Mapping(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

/// The conventional answer leaf: a primary value plus an optional
/// free-text description.
///
/// Fields a contributor left out are absent from the tree entirely; they
/// are not defaults competing for a slot during merge.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AnswerEntry {
    /// An entry holding only a primary value.
    pub fn new(primary: impl Into<Value>) -> Self {
        Self {
            primary: Some(primary.into()),
            description: None,
        }
    }

    /// Attach a description to this entry.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl From<AnswerEntry> for AnswerNode {
    fn from(entry: AnswerEntry) -> Self {
        let mut map = AnswerTree::new();
        if let Some(primary) = entry.primary {
            map.insert("primary".into(), AnswerNode::Scalar(primary));
        }
        if let Some(description) = entry.description {
            map.insert(
                "description".into(),
                AnswerNode::Scalar(Value::String(description)),
            );
        }
        AnswerNode::Mapping(map)
    }
}
