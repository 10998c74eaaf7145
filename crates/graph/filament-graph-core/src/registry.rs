//! Process-wide registry of pluggable string operations.
//!
//! The registry starts empty; hosts populate it during startup (the
//! default catalogue lives in `filament-ops` and is installed with one
//! call). Registration takes a write lock and is expected to be rare;
//! lookups take the read lock and hand out a cloned handle, so execution
//! never holds the lock while an operation runs. Lock poisoning is
//! recovered with [`PoisonError::into_inner`]: no registry call inserts
//! partial state under the lock, so the map stays usable after a
//! panicked caller.

use std::sync::{Arc, PoisonError, RwLock};

use hashbrown::HashMap;
use once_cell::sync::Lazy;

use crate::error::{GraphError, OpError};
use crate::types::OpOutput;

/// Signature every pluggable operation implements: borrowed input views
/// (already output-indexed) and borrowed constants in, an owned result or
/// a failure out.
pub type StringOperation =
    Arc<dyn Fn(&[&str], &[&str]) -> Result<OpOutput, OpError> + Send + Sync>;

static OPERATIONS: Lazy<RwLock<HashMap<String, StringOperation>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Associate `name` with `op`, replacing any prior binding.
pub fn register(name: impl Into<String>, op: StringOperation) {
    let mut ops = OPERATIONS.write().unwrap_or_else(PoisonError::into_inner);
    ops.insert(name.into(), op);
}

/// Register a plain function or closure without wrapping it yourself.
pub fn register_fn<F>(name: impl Into<String>, op: F)
where
    F: Fn(&[&str], &[&str]) -> Result<OpOutput, OpError> + Send + Sync + 'static,
{
    register(name, Arc::new(op));
}

/// Retrieve the operation bound to `name`.
pub fn get(name: &str) -> Result<StringOperation, GraphError> {
    let ops = OPERATIONS.read().unwrap_or_else(PoisonError::into_inner);
    ops.get(name)
        .cloned()
        .ok_or_else(|| GraphError::UnknownOperation {
            name: name.to_string(),
        })
}

/// Whether `name` is currently bound.
pub fn contains(name: &str) -> bool {
    let ops = OPERATIONS.read().unwrap_or_else(PoisonError::into_inner);
    ops.contains_key(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_operations_can_be_looked_up() {
        register_fn("registry-test-echo", |inputs, _constants| {
            Ok(OpOutput::Single(inputs.join("")))
        });
        assert!(contains("registry-test-echo"));
        let op = get("registry-test-echo").expect("operation is bound");
        let out = op(&["a", "b"], &[]).expect("echo succeeds");
        assert_eq!(out, OpOutput::Single("ab".to_string()));
    }

    #[test]
    fn missing_names_fail_with_unknown_operation() {
        let err = match get("registry-test-absent") {
            Err(err) => err,
            Ok(_) => panic!("name is unbound"),
        };
        assert!(matches!(
            err,
            GraphError::UnknownOperation { ref name } if name == "registry-test-absent"
        ));
        assert!(!contains("registry-test-absent"));
    }

    #[test]
    fn re_registration_replaces_the_binding() {
        register_fn("registry-test-flip", |_inputs, _constants| {
            Ok(OpOutput::Single("first".to_string()))
        });
        register_fn("registry-test-flip", |_inputs, _constants| {
            Ok(OpOutput::Single("second".to_string()))
        });
        let op = get("registry-test-flip").expect("operation is bound");
        assert_eq!(
            op(&[], &[]).expect("flip succeeds"),
            OpOutput::Single("second".to_string())
        );
    }
}
