//! filament-graph-core: a string computation graph engine.
//!
//! Callers describe a directed acyclic graph whose nodes apply named
//! string operations to the results of other nodes and to constants; the
//! engine computes a target node's value, reusing shared subresults.
//! Operations are pluggable through a process-wide [`registry`]; the
//! engine ships none of its own.

pub mod compiled;
pub mod error;
pub mod exec;
pub mod graph;
pub mod registry;
mod topo;
pub mod types;

pub use compiled::{execute, execute_with_feed, CompiledGraph};
pub use error::{GraphError, OpError};
pub use exec::{Executor, FeedDict, Strategy};
pub use graph::Graph;
pub use registry::StringOperation;
pub use types::{
    GraphSpec, InputRef, Node, NodeId, NodeKind, NodeSpec, NodeState, OpOutput, IDENTITY_OP,
};
