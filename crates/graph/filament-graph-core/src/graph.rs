//! Keyed node collection with construction-time validation.

use hashbrown::HashMap;

use crate::error::GraphError;
use crate::types::{GraphSpec, Node, NodeId, NodeKind, NodeSpec, NodeState, IDENTITY_OP};

/// A validated collection of nodes, keyed by id.
///
/// Structurally immutable after construction; node state and results are
/// only touched through the crate-private mutable accessors the executor
/// uses.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: HashMap<NodeId, Node>,
}

impl Graph {
    /// Parse and validate a JSON graph description.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let spec: GraphSpec = serde_json::from_str(json)?;
        Self::from_spec(&spec)
    }

    /// Build a graph from an already-parsed description.
    pub fn from_spec(spec: &GraphSpec) -> Result<Self, GraphError> {
        let mut nodes: HashMap<NodeId, Node> = HashMap::with_capacity(spec.nodes.len());
        for node_spec in &spec.nodes {
            let node = build_node(node_spec)?;
            if nodes.insert(node_spec.id.clone(), node).is_some() {
                return Err(schema(format!("duplicate node id '{}'", node_spec.id)));
            }
        }
        Ok(Graph { nodes })
    }

    pub fn node(&self, id: &str) -> Result<&Node, GraphError> {
        self.nodes.get(id).ok_or_else(|| GraphError::NodeNotFound {
            id: id.to_string(),
        })
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Result<&mut Node, GraphError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound {
                id: id.to_string(),
            })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }
}

fn schema(reason: String) -> GraphError {
    GraphError::Schema { reason }
}

/// Resolve the node kind, explicit or inferred, and reject contradictory
/// shapes: a `value` implies CONSTANT, an `op` implies OPERATION, anything
/// else needs an explicit `type`.
fn build_node(spec: &NodeSpec) -> Result<Node, GraphError> {
    let kind = match spec.kind {
        Some(kind) => kind,
        None => match (&spec.value, &spec.op) {
            (Some(_), Some(_)) => {
                return Err(schema(format!(
                    "node '{}' has both 'value' and 'op' but no 'type'",
                    spec.id
                )))
            }
            (Some(_), None) => NodeKind::Constant,
            (None, Some(_)) => NodeKind::Operation,
            (None, None) => {
                return Err(schema(format!(
                    "node '{}' has neither 'value' nor 'op', and no 'type' specified",
                    spec.id
                )))
            }
        },
    };

    let op_name = match kind {
        NodeKind::Operation => match &spec.op {
            Some(op) => op.clone(),
            None => {
                return Err(schema(format!(
                    "operation node '{}' requires an 'op'",
                    spec.id
                )))
            }
        },
        _ => {
            if spec.op.is_some() {
                return Err(schema(format!(
                    "node '{}' of type '{kind:?}' cannot carry an 'op'",
                    spec.id
                )));
            }
            IDENTITY_OP.to_string()
        }
    };

    match kind {
        NodeKind::Constant if spec.value.is_none() => {
            return Err(schema(format!(
                "constant node '{}' must have a 'value'",
                spec.id
            )));
        }
        NodeKind::Placeholder if spec.value.is_some() => {
            return Err(schema(format!(
                "placeholder node '{}' must not have a 'value' (use the feed dictionary)",
                spec.id
            )));
        }
        NodeKind::Operation if spec.value.is_some() => {
            return Err(schema(format!(
                "operation node '{}' cannot carry a 'value'",
                spec.id
            )));
        }
        _ => {}
    }

    // Inputs and constants only mean something on operation nodes and are
    // dropped elsewhere.
    let (input_ids, constants) = match kind {
        NodeKind::Operation => (spec.inputs.clone(), spec.constants.clone()),
        _ => (Vec::new(), Vec::new()),
    };

    Ok(Node {
        id: spec.id.clone(),
        kind,
        op_name,
        input_ids,
        constants,
        initial_value: spec.value.clone(),
        state: NodeState::Pending,
        result: None,
    })
}
