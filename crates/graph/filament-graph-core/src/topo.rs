//! Dependency ordering: reachable sets, Kahn's algorithm, and the layer
//! partitioning the parallel strategy runs on.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::GraphError;
use crate::graph::Graph;
use crate::types::{InputRef, NodeId};

/// All nodes transitively reachable from `target` via input references.
pub(crate) fn reachable_from(graph: &Graph, target: &str) -> Result<HashSet<NodeId>, GraphError> {
    let mut seen: HashSet<NodeId> = HashSet::new();
    let mut stack: Vec<NodeId> = vec![target.to_string()];
    while let Some(id) = stack.pop() {
        if !seen.insert(id.clone()) {
            continue;
        }
        let node = graph.node(&id)?;
        for raw in &node.input_ids {
            let input = InputRef::parse(&node.id, raw)?;
            if !seen.contains(input.node_id) {
                stack.push(input.node_id.to_string());
            }
        }
    }
    Ok(seen)
}

/// Kahn's algorithm restricted to `scope` (which must be input-closed).
/// An order shorter than the scope means a cycle; the reported id is the
/// lexicographically smallest node left unprocessed, so the error is
/// stable across runs.
pub(crate) fn order_within(graph: &Graph, scope: &HashSet<NodeId>) -> Result<Vec<NodeId>, GraphError> {
    let mut indegree: HashMap<&str, usize> = HashMap::with_capacity(scope.len());
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for id in scope {
        let node = graph.node(id)?;
        indegree.entry(node.id.as_str()).or_insert(0);
        for raw in &node.input_ids {
            let input = InputRef::parse(&node.id, raw)?;
            if !scope.contains(input.node_id) {
                continue;
            }
            dependents
                .entry(input.node_id)
                .or_default()
                .push(node.id.as_str());
            *indegree.entry(node.id.as_str()).or_default() += 1;
        }
    }

    let mut queue: VecDeque<&str> = indegree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut order: Vec<NodeId> = Vec::with_capacity(scope.len());
    while let Some(id) = queue.pop_front() {
        order.push(id.to_string());
        if let Some(consumers) = dependents.get(id) {
            for &consumer in consumers {
                if let Some(degree) = indegree.get_mut(consumer) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(consumer);
                    }
                }
            }
        }
    }

    if order.len() != scope.len() {
        let mut stuck: Vec<&str> = indegree
            .iter()
            .filter(|(_, &degree)| degree > 0)
            .map(|(&id, _)| id)
            .collect();
        stuck.sort_unstable();
        return Err(GraphError::CycleDetected {
            id: stuck.first().map(|id| id.to_string()).unwrap_or_default(),
        });
    }
    Ok(order)
}

/// Whole-graph topological order, exposed through the executor for tools.
pub(crate) fn order_all(graph: &Graph) -> Result<Vec<NodeId>, GraphError> {
    let scope: HashSet<NodeId> = graph.iter().map(|node| node.id.clone()).collect();
    order_within(graph, &scope)
}

/// Partition a topological order into layers: a node's level is one plus
/// the maximum level among its input producers, and producers outside the
/// order count as level zero.
pub(crate) fn layers_of(graph: &Graph, order: &[NodeId]) -> Result<Vec<Vec<NodeId>>, GraphError> {
    let mut level: HashMap<&str, usize> = HashMap::with_capacity(order.len());
    let mut layers: Vec<Vec<NodeId>> = Vec::new();
    for id in order {
        let node = graph.node(id)?;
        let mut this_level = 0;
        for raw in &node.input_ids {
            let input = InputRef::parse(&node.id, raw)?;
            let producer_level = level.get(input.node_id).copied().unwrap_or(0);
            this_level = this_level.max(producer_level + 1);
        }
        level.insert(node.id.as_str(), this_level);
        if layers.len() <= this_level {
            layers.resize_with(this_level + 1, Vec::new);
        }
        layers[this_level].push(id.clone());
    }
    Ok(layers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GraphSpec, NodeSpec};

    fn constant(id: &str) -> NodeSpec {
        NodeSpec {
            id: id.to_string(),
            kind: None,
            value: Some("x".to_string()),
            op: None,
            inputs: vec![],
            constants: vec![],
        }
    }

    fn op(id: &str, inputs: &[&str]) -> NodeSpec {
        NodeSpec {
            id: id.to_string(),
            kind: None,
            value: None,
            op: Some("concat".to_string()),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            constants: vec![],
        }
    }

    fn graph(nodes: Vec<NodeSpec>) -> Graph {
        Graph::from_spec(&GraphSpec {
            nodes,
            target_node: None,
        })
        .expect("valid graph")
    }

    fn position(order: &[NodeId], id: &str) -> usize {
        order
            .iter()
            .position(|n| n == id)
            .unwrap_or_else(|| panic!("{id} missing from order"))
    }

    #[test]
    fn order_respects_edges() {
        let g = graph(vec![
            constant("a"),
            op("b", &["a"]),
            op("c", &["a", "b"]),
            op("d", &["c"]),
        ]);
        let order = order_all(&g).expect("acyclic");
        assert_eq!(order.len(), 4);
        assert!(position(&order, "a") < position(&order, "b"));
        assert!(position(&order, "b") < position(&order, "c"));
        assert!(position(&order, "c") < position(&order, "d"));
    }

    #[test]
    fn reachable_set_is_restricted_to_the_target() {
        let g = graph(vec![
            constant("a"),
            op("b", &["a"]),
            constant("elsewhere"),
            op("unrelated", &["elsewhere"]),
        ]);
        let scope = reachable_from(&g, "b").expect("reachable");
        assert_eq!(scope.len(), 2);
        assert!(scope.contains("a") && scope.contains("b"));
    }

    #[test]
    fn indexed_references_strip_to_the_producer_id() {
        let g = graph(vec![constant("src"), op("s", &["src"]), op("use", &["s:1"])]);
        let scope = reachable_from(&g, "use").expect("reachable");
        assert!(scope.contains("s"));
        let order = order_within(&g, &scope).expect("acyclic");
        assert!(position(&order, "s") < position(&order, "use"));
    }

    #[test]
    fn cycles_shorten_the_order() {
        let g = graph(vec![op("a", &["b"]), op("b", &["a"])]);
        let err = order_all(&g).expect_err("cycle");
        assert!(matches!(err, GraphError::CycleDetected { ref id } if id == "a"));
    }

    #[test]
    fn layers_group_independent_nodes() {
        let g = graph(vec![
            constant("a"),
            constant("b"),
            op("c", &["a"]),
            op("d", &["b"]),
            op("e", &["c", "d"]),
        ]);
        let scope = reachable_from(&g, "e").expect("reachable");
        let order = order_within(&g, &scope).expect("acyclic");
        let layers = layers_of(&g, &order).expect("layered");
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[0].len(), 2);
        assert_eq!(layers[1].len(), 2);
        assert_eq!(layers[2], vec!["e".to_string()]);
    }

    #[test]
    fn missing_input_ids_surface_node_not_found() {
        let g = graph(vec![op("b", &["ghost"])]);
        let err = reachable_from(&g, "b").expect_err("missing producer");
        assert!(matches!(err, GraphError::NodeNotFound { ref id } if id == "ghost"));
    }
}
