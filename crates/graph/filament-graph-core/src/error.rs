//! Error types for graph construction and execution.

use serde::{Deserialize, Serialize};

/// Failure signalled by an operation through the plug-in ABI.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpError {
    /// The inputs or constants handed to the operation have the wrong shape.
    #[error("bad arguments: {0}")]
    BadArgs(String),

    /// The operation's own computation failed.
    #[error("{0}")]
    Internal(String),
}

/// Errors surfaced by graph construction and the `compute*` family.
///
/// Every variant carries enough context to localize the problem: the
/// offending node id and, for reference errors, the original reference
/// string. Nothing is recovered internally; all of these propagate to the
/// caller unchanged.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum GraphError {
    /// Malformed description or contradictory node shape.
    #[error("schema error: {reason}")]
    Schema { reason: String },

    /// Reference to an id the graph does not contain.
    #[error("node '{id}' not found in graph")]
    NodeNotFound { id: String },

    /// Operation name absent from the registry.
    #[error("unknown operation '{name}'")]
    UnknownOperation { name: String },

    /// Malformed input reference (empty or non-numeric index tail).
    #[error("invalid input reference '{reference}' on node '{node}'")]
    InvalidReference { node: String, reference: String },

    /// Single-vs-multi-output mismatch between a reference and its producer.
    #[error("reference '{reference}' on node '{node}': {reason}")]
    TypeMismatch {
        node: String,
        reference: String,
        reason: String,
    },

    /// Indexed reference beyond the producer's result sequence.
    #[error("reference '{reference}' on node '{node}': index {index} out of bounds for {len} outputs")]
    IndexOutOfBounds {
        node: String,
        reference: String,
        index: usize,
        len: usize,
    },

    /// A placeholder was reached with no entry in the feed dictionary.
    #[error("placeholder '{id}' has no entry in the feed dictionary")]
    MissingPlaceholder { id: String },

    /// Back-edge discovered while descending, or a topological order came
    /// up shorter than the reachable set.
    #[error("cycle detected involving node '{id}'")]
    CycleDetected { id: String },

    /// A user operation signalled failure.
    #[error("operation '{op}' failed on node '{node}': {source}")]
    OperationFailure {
        node: String,
        op: String,
        source: OpError,
    },

    /// The compiled graph never became runnable.
    #[error("compiled graph is not valid")]
    InvalidGraph,
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Schema {
            reason: err.to_string(),
        }
    }
}
