//! Per-node evaluation shared by every strategy.

use crate::error::GraphError;
use crate::graph::Graph;
use crate::registry;
use crate::types::{InputRef, NodeKind, NodeState, OpOutput};

use super::FeedDict;

/// Evaluate `id` against an immutable graph view.
///
/// Returns `None` when the node is already computed. Every producer the
/// node references must already hold a result; all three strategies
/// schedule so that this holds.
pub(super) fn evaluate(
    graph: &Graph,
    id: &str,
    feed: &FeedDict,
) -> Result<Option<OpOutput>, GraphError> {
    let node = graph.node(id)?;
    if node.state == NodeState::Computed {
        return Ok(None);
    }
    match node.kind {
        NodeKind::Constant | NodeKind::Variable => match &node.initial_value {
            Some(value) => Ok(Some(OpOutput::Single(value.clone()))),
            None => Err(GraphError::Schema {
                reason: format!("node '{}' has no value to seed from", node.id),
            }),
        },
        NodeKind::Placeholder => match feed.get(id) {
            Some(value) => Ok(Some(OpOutput::Single(value.clone()))),
            None => Err(GraphError::MissingPlaceholder { id: id.to_string() }),
        },
        NodeKind::Operation => {
            let mut inputs: Vec<&str> = Vec::with_capacity(node.input_ids.len());
            for raw in &node.input_ids {
                let input = InputRef::parse(&node.id, raw)?;
                inputs.push(resolve_ref(graph, &node.id, raw, &input)?);
            }
            let constants: Vec<&str> = node.constants.iter().map(String::as_str).collect();
            let op = registry::get(&node.op_name)?;
            let out = op(&inputs, &constants).map_err(|source| GraphError::OperationFailure {
                node: node.id.clone(),
                op: node.op_name.clone(),
                source,
            })?;
            Ok(Some(out))
        }
    }
}

/// Evaluate and commit in one step. Used by the sequential paths.
pub(super) fn execute(graph: &mut Graph, id: &str, feed: &FeedDict) -> Result<(), GraphError> {
    if let Some(out) = evaluate(graph, id, feed)? {
        store(graph, id, out)?;
    }
    Ok(())
}

/// Commit a result, keeping `result` present iff the state is COMPUTED.
pub(super) fn store(graph: &mut Graph, id: &str, out: OpOutput) -> Result<(), GraphError> {
    let node = graph.node_mut(id)?;
    node.result = Some(out);
    node.state = NodeState::Computed;
    Ok(())
}

/// Resolve the target reference against a finished graph.
pub(super) fn resolve_output<'g>(
    graph: &'g Graph,
    raw: &str,
    target: &InputRef<'_>,
) -> Result<&'g str, GraphError> {
    resolve_ref(graph, target.node_id, raw, target)
}

/// Select one output of a producer according to a parsed reference. A
/// bare reference requires single-string output; an indexed reference
/// requires a sequence and an in-bounds index.
fn resolve_ref<'g>(
    graph: &'g Graph,
    owner: &str,
    raw: &str,
    reference: &InputRef<'_>,
) -> Result<&'g str, GraphError> {
    let producer = graph.node(reference.node_id)?;
    let result = producer.result.as_ref().ok_or_else(|| GraphError::Schema {
        reason: format!("input node '{}' has no computed result", producer.id),
    })?;
    match (result, reference.output_index) {
        (OpOutput::Single(value), None) => Ok(value.as_str()),
        (OpOutput::Many(values), Some(index)) => {
            values
                .get(index)
                .map(String::as_str)
                .ok_or_else(|| GraphError::IndexOutOfBounds {
                    node: owner.to_string(),
                    reference: raw.to_string(),
                    index,
                    len: values.len(),
                })
        }
        (OpOutput::Single(_), Some(_)) => Err(GraphError::TypeMismatch {
            node: owner.to_string(),
            reference: raw.to_string(),
            reason: "indexed reference into a single-output producer".to_string(),
        }),
        (OpOutput::Many(_), None) => Err(GraphError::TypeMismatch {
            node: owner.to_string(),
            reference: raw.to_string(),
            reason: "bare reference to a multi-output producer".to_string(),
        }),
    }
}
