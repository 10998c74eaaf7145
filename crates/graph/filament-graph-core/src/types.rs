//! Core data model: nodes, operation results, and the serde description
//! types of the JSON graph contract.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

pub type NodeId = String;

/// Operation name carried by every non-OPERATION node.
pub const IDENTITY_OP: &str = "identity";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Constant,
    Placeholder,
    Variable,
    Operation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Pending,
    Computed,
}

/// Result of one operation: a single string, or an ordered sequence of
/// strings consumed through `<id>:<index>` references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOutput {
    Single(String),
    Many(Vec<String>),
}

impl OpOutput {
    /// Number of addressable outputs.
    pub fn len(&self) -> usize {
        match self {
            OpOutput::Single(_) => 1,
            OpOutput::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A node in the computation graph.
///
/// Structure is fixed at construction; only `state` and `result` change,
/// and only while an executor owns the graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub op_name: String,
    pub input_ids: Vec<String>,
    pub constants: Vec<String>,
    pub initial_value: Option<String>,
    pub state: NodeState,
    pub result: Option<OpOutput>,
}

/// Parsed form of an input reference: `<node_id>` or `<node_id>:<index>`.
///
/// The split happens on the first colon; an empty or non-numeric index
/// tail is an [`GraphError::InvalidReference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRef<'a> {
    pub node_id: &'a str,
    pub output_index: Option<usize>,
}

impl<'a> InputRef<'a> {
    /// Parse a reference. `owner` labels the error with the consuming
    /// node's id (or the raw target string when parsing a target).
    pub fn parse(owner: &str, raw: &'a str) -> Result<Self, GraphError> {
        let invalid = || GraphError::InvalidReference {
            node: owner.to_string(),
            reference: raw.to_string(),
        };
        match raw.split_once(':') {
            None => Ok(InputRef {
                node_id: raw,
                output_index: None,
            }),
            Some((node_id, tail)) => {
                if node_id.is_empty() || tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit())
                {
                    return Err(invalid());
                }
                let index = tail.parse::<usize>().map_err(|_| invalid())?;
                Ok(InputRef {
                    node_id,
                    output_index: Some(index),
                })
            }
        }
    }
}

/// One node of the JSON graph description.
///
/// `type` may be omitted: a `value` implies a constant, an `op` implies an
/// operation. Unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constants: Vec<String>,
}

/// A full graph description, with the optional top-level target used by
/// the one-shot execute entry point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSpec {
    pub nodes: Vec<NodeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_reference_keeps_whole_id() {
        let r = InputRef::parse("n", "producer").expect("bare reference parses");
        assert_eq!(r.node_id, "producer");
        assert_eq!(r.output_index, None);
    }

    #[test]
    fn indexed_reference_splits_on_first_colon() {
        let r = InputRef::parse("n", "split:12").expect("indexed reference parses");
        assert_eq!(r.node_id, "split");
        assert_eq!(r.output_index, Some(12));
    }

    #[test]
    fn empty_and_non_numeric_tails_are_rejected() {
        for raw in ["p:", "p:x", "p:1a", ":3", "p:-1", "p: 1"] {
            let err = InputRef::parse("n", raw).expect_err("malformed reference");
            assert!(
                matches!(err, GraphError::InvalidReference { ref reference, .. } if reference == raw),
                "unexpected error for {raw}: {err:?}"
            );
        }
    }

    #[test]
    fn node_kind_uses_lowercase_names() {
        let kind: NodeKind = serde_json::from_str("\"placeholder\"").expect("kind parses");
        assert_eq!(kind, NodeKind::Placeholder);
        assert!(serde_json::from_str::<NodeKind>("\"Constant\"").is_err());
    }

    #[test]
    fn node_spec_tolerates_unknown_fields() {
        let spec: NodeSpec = serde_json::from_str(
            r#"{"id": "a", "value": "hello", "color": "green", "position": [1, 2]}"#,
        )
        .expect("unknown fields are ignored");
        assert_eq!(spec.id, "a");
        assert_eq!(spec.value.as_deref(), Some("hello"));
        assert_eq!(spec.kind, None);
    }
}
