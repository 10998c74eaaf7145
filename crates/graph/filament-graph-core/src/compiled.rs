//! Parse-once / execute-many handle, plus the one-shot document entry
//! points.

use crate::error::GraphError;
use crate::exec::{Executor, FeedDict};
use crate::graph::Graph;
use crate::types::GraphSpec;

/// A parsed graph ready for repeated execution without re-parsing.
///
/// Construction through [`CompiledGraph::from_json`] never fails; a bad
/// document yields an invalid handle whose `run` calls fail with
/// [`GraphError::InvalidGraph`]. Use [`CompiledGraph::compile`] when the
/// underlying error matters.
#[derive(Debug, Default)]
pub struct CompiledGraph {
    graph: Option<Graph>,
}

impl CompiledGraph {
    /// Compile a JSON document, surfacing the construction error.
    pub fn compile(json: &str) -> Result<Self, GraphError> {
        Ok(CompiledGraph {
            graph: Some(Graph::from_json(json)?),
        })
    }

    /// Compile a JSON document into a handle probed with
    /// [`CompiledGraph::is_valid`].
    pub fn from_json(json: &str) -> Self {
        CompiledGraph {
            graph: Graph::from_json(json).ok(),
        }
    }

    /// Wrap an already-built graph.
    pub fn new(graph: Graph) -> Self {
        CompiledGraph { graph: Some(graph) }
    }

    pub fn is_valid(&self) -> bool {
        self.graph.is_some()
    }

    /// The compiled graph, when valid.
    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    /// Execute with the default (recursive) strategy.
    pub fn run(&mut self, target: &str, feed: &FeedDict) -> Result<String, GraphError> {
        let graph = self.graph.as_mut().ok_or(GraphError::InvalidGraph)?;
        Executor::new(graph)
            .compute(target, feed)
            .map(str::to_string)
    }

    /// Execute with automatic strategy selection.
    pub fn run_auto(&mut self, target: &str, feed: &FeedDict) -> Result<String, GraphError> {
        let graph = self.graph.as_mut().ok_or(GraphError::InvalidGraph)?;
        Executor::new(graph)
            .compute_auto(target, feed)
            .map(str::to_string)
    }
}

/// Execute a self-contained document of the form
/// `{ "nodes": [...], "target_node": "..." }` with an empty feed.
pub fn execute(json: &str) -> Result<String, GraphError> {
    execute_with_feed(json, &FeedDict::new())
}

/// Execute a self-contained document with runtime placeholder values.
pub fn execute_with_feed(json: &str, feed: &FeedDict) -> Result<String, GraphError> {
    let spec: GraphSpec = serde_json::from_str(json)?;
    let target = spec.target_node.clone().ok_or_else(|| GraphError::Schema {
        reason: "document missing 'target_node'".to_string(),
    })?;
    let mut graph = Graph::from_spec(&spec)?;
    Executor::new(&mut graph)
        .compute(&target, feed)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry;
    use crate::types::OpOutput;
    use serde_json::json;

    fn register_upper() {
        registry::register_fn("compiled-test-upper", |inputs, _constants| {
            Ok(OpOutput::Single(inputs.concat().to_uppercase()))
        });
    }

    #[test]
    fn compiled_graph_runs_repeatedly_without_reparsing() {
        register_upper();
        let doc = json!({
            "nodes": [
                {"id": "a", "value": "hi"},
                {"id": "b", "op": "compiled-test-upper", "inputs": ["a"]},
            ]
        })
        .to_string();
        let mut compiled = CompiledGraph::from_json(&doc);
        assert!(compiled.is_valid());
        for _ in 0..3 {
            let out = compiled.run("b", &FeedDict::new()).expect("run succeeds");
            assert_eq!(out, "HI");
        }
        let out = compiled
            .run_auto("b", &FeedDict::new())
            .expect("auto run succeeds");
        assert_eq!(out, "HI");
    }

    #[test]
    fn invalid_documents_yield_invalid_handles() {
        let mut compiled = CompiledGraph::from_json("{ not json");
        assert!(!compiled.is_valid());
        assert!(compiled.graph().is_none());
        let err = compiled
            .run("a", &FeedDict::new())
            .expect_err("invalid handle cannot run");
        assert!(matches!(err, GraphError::InvalidGraph));
        let err = compiled
            .run_auto("a", &FeedDict::new())
            .expect_err("invalid handle cannot run");
        assert!(matches!(err, GraphError::InvalidGraph));
    }

    #[test]
    fn compile_surfaces_the_underlying_error() {
        let err = CompiledGraph::compile(&json!({"nodes": [{"id": "c", "type": "constant"}]}).to_string())
            .expect_err("constant without value");
        assert!(matches!(err, GraphError::Schema { .. }));
    }

    #[test]
    fn execute_requires_a_target_node() {
        register_upper();
        let doc = json!({
            "nodes": [{"id": "a", "value": "x"}]
        })
        .to_string();
        let err = execute(&doc).expect_err("target_node is required");
        assert!(
            matches!(err, GraphError::Schema { ref reason } if reason.contains("target_node"))
        );
    }

    #[test]
    fn execute_resolves_the_document_target() {
        register_upper();
        let doc = json!({
            "nodes": [
                {"id": "a", "value": "hello"},
                {"id": "b", "op": "compiled-test-upper", "inputs": ["a"]},
            ],
            "target_node": "b"
        })
        .to_string();
        assert_eq!(execute(&doc).expect("document runs"), "HELLO");
    }

    #[test]
    fn execute_with_feed_reaches_placeholders() {
        register_upper();
        let doc = json!({
            "nodes": [
                {"id": "t", "type": "placeholder"},
                {"id": "u", "op": "compiled-test-upper", "inputs": ["t"]},
            ],
            "target_node": "u"
        })
        .to_string();
        let mut feed = FeedDict::new();
        feed.insert("t".to_string(), "ping".to_string());
        assert_eq!(execute_with_feed(&doc, &feed).expect("runs"), "PING");
    }
}
