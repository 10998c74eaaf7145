//! Execution strategies over a validated graph.
//!
//! The executor borrows its graph mutably for the duration of a run and
//! offers three interchangeable strategies plus an automatic selector:
//!
//! - [`Executor::compute`] descends depth-first from the target with a
//!   visiting set for cycle detection; right for small, shallow graphs.
//! - [`Executor::compute_iterative`] walks a topological order of the
//!   reachable subgraph and never recurses; always safe.
//! - [`Executor::compute_parallel`] partitions that order into levels and
//!   fans large layers out across threads, joining at each layer boundary.
//! - [`Executor::compute_auto`] picks among the three from the estimated
//!   depth, the reachable size, and the widest layer.
//!
//! All strategies share the same per-node semantics and produce identical
//! results; a failed run leaves no observable partial state because every
//! run begins by resetting non-variable nodes.

mod node_exec;


use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crate::error::GraphError;
use crate::graph::Graph;
use crate::topo;
use crate::types::{InputRef, NodeId, NodeKind, NodeState, OpOutput};

/// Per-call mapping from PLACEHOLDER id to its runtime value.
pub type FeedDict = HashMap<String, String>;

/// Deepest dependency chain the recursive strategy will accept.
pub const MAX_RECURSION_DEPTH: usize = 100;
/// Largest reachable subgraph the recursive strategy will accept.
pub const MAX_RECURSION_NODES: usize = 500;
/// Smallest reachable subgraph considered for the parallel strategy.
pub const MIN_PARALLEL_NODES: usize = 500;
/// Widest layer required before the parallel strategy pays off.
pub const MIN_PARALLEL_WIDTH: usize = 100;
/// Layers below this cardinality always run sequentially.
pub const MIN_PARALLEL_LAYER_SIZE: usize = 200;

/// Strategy picked by [`Executor::select_strategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Recursive,
    Iterative,
    Parallel,
}

/// Executes compute requests against a borrowed graph.
///
/// Concurrent `compute*` calls on one executor are impossible by
/// construction (`&mut self`); executors over different graphs are
/// independent. Variable results live in the graph's nodes, so they
/// persist for as long as the graph does.
#[derive(Debug)]
pub struct Executor<'g> {
    graph: &'g mut Graph,
    visiting: HashSet<NodeId>,
}

impl<'g> Executor<'g> {
    pub fn new(graph: &'g mut Graph) -> Self {
        Executor {
            graph,
            visiting: HashSet::new(),
        }
    }

    /// Read-only view of the graph being executed.
    pub fn graph(&self) -> &Graph {
        self.graph
    }

    /// Depth-first recursive strategy.
    pub fn compute(&mut self, target: &str, feed: &FeedDict) -> Result<&str, GraphError> {
        let target_ref = InputRef::parse(target, target)?;
        self.prepare();
        self.visiting.clear();
        self.compute_recursive(target_ref.node_id, feed)?;
        node_exec::resolve_output(self.graph, target, &target_ref)
    }

    /// Forward topological walk of the subgraph reachable from `target`.
    pub fn compute_iterative(&mut self, target: &str, feed: &FeedDict) -> Result<&str, GraphError> {
        let target_ref = InputRef::parse(target, target)?;
        self.prepare();
        let scope = topo::reachable_from(self.graph, target_ref.node_id)?;
        let order = topo::order_within(self.graph, &scope)?;
        for id in &order {
            node_exec::execute(self.graph, id, feed)?;
        }
        node_exec::resolve_output(self.graph, target, &target_ref)
    }

    /// Layered forward walk; layers at or above
    /// [`MIN_PARALLEL_LAYER_SIZE`] run concurrently when more than one
    /// worker is available. Layers execute to completion before the next
    /// begins; that barrier is the only cross-layer ordering guarantee.
    pub fn compute_parallel(&mut self, target: &str, feed: &FeedDict) -> Result<&str, GraphError> {
        let target_ref = InputRef::parse(target, target)?;
        self.prepare();
        let scope = topo::reachable_from(self.graph, target_ref.node_id)?;
        let order = topo::order_within(self.graph, &scope)?;
        let layers = topo::layers_of(self.graph, &order)?;
        for layer in &layers {
            if layer.len() >= MIN_PARALLEL_LAYER_SIZE && parallel_workers() > 1 {
                run_layer_parallel(self.graph, layer, feed)?;
            } else {
                for id in layer {
                    node_exec::execute(self.graph, id, feed)?;
                }
            }
        }
        node_exec::resolve_output(self.graph, target, &target_ref)
    }

    /// Run with the strategy [`Executor::select_strategy`] picks.
    pub fn compute_auto(&mut self, target: &str, feed: &FeedDict) -> Result<&str, GraphError> {
        match self.select_strategy(target)? {
            Strategy::Recursive => self.compute(target, feed),
            Strategy::Iterative => self.compute_iterative(target, feed),
            Strategy::Parallel => self.compute_parallel(target, feed),
        }
    }

    /// Pick a strategy for `target`: recursion for shallow small graphs,
    /// parallel layers for wide large ones, the iterative walk otherwise.
    pub fn select_strategy(&self, target: &str) -> Result<Strategy, GraphError> {
        let target_ref = InputRef::parse(target, target)?;
        let depth = estimate_depth(self.graph, target_ref.node_id)?;
        let scope = topo::reachable_from(self.graph, target_ref.node_id)?;

        if depth <= MAX_RECURSION_DEPTH {
            if scope.len() <= MAX_RECURSION_NODES {
                return Ok(Strategy::Recursive);
            }
            if self.parallel_suits(&scope)? {
                return Ok(Strategy::Parallel);
            }
            return Ok(Strategy::Iterative);
        }
        if self.parallel_suits(&scope)? {
            return Ok(Strategy::Parallel);
        }
        Ok(Strategy::Iterative)
    }

    /// Whole-graph topological order, exposed for tooling.
    pub fn topological_sort(&self) -> Result<Vec<NodeId>, GraphError> {
        topo::order_all(self.graph)
    }

    /// Store a value on a VARIABLE node. The value persists across runs
    /// until overwritten; assigning to any other kind is a type mismatch.
    pub fn set_variable(
        &mut self,
        id: &str,
        value: impl Into<String>,
    ) -> Result<(), GraphError> {
        let node = self.graph.node_mut(id)?;
        if node.kind != NodeKind::Variable {
            return Err(GraphError::TypeMismatch {
                node: id.to_string(),
                reference: id.to_string(),
                reason: "set_variable targets a non-variable node".to_string(),
            });
        }
        node.result = Some(OpOutput::Single(value.into()));
        node.state = NodeState::Computed;
        Ok(())
    }

    /// Reset per-run state: non-VARIABLE nodes go back to PENDING with
    /// results cleared, CONSTANTs are reseeded, VARIABLEs keep whatever
    /// they already hold and are seeded only when empty.
    fn prepare(&mut self) {
        for node in self.graph.iter_mut() {
            match node.kind {
                NodeKind::Variable => {
                    if node.result.is_none() {
                        if let Some(init) = &node.initial_value {
                            node.result = Some(OpOutput::Single(init.clone()));
                            node.state = NodeState::Computed;
                        } else {
                            node.state = NodeState::Pending;
                        }
                    }
                }
                NodeKind::Constant => match &node.initial_value {
                    Some(value) => {
                        node.result = Some(OpOutput::Single(value.clone()));
                        node.state = NodeState::Computed;
                    }
                    None => {
                        node.result = None;
                        node.state = NodeState::Pending;
                    }
                },
                NodeKind::Placeholder | NodeKind::Operation => {
                    node.result = None;
                    node.state = NodeState::Pending;
                }
            }
        }
    }

    fn compute_recursive(&mut self, id: &str, feed: &FeedDict) -> Result<(), GraphError> {
        if self.graph.node(id)?.state == NodeState::Computed {
            return Ok(());
        }
        if self.visiting.contains(id) {
            return Err(GraphError::CycleDetected { id: id.to_string() });
        }
        self.visiting.insert(id.to_string());

        let pending_inputs: Vec<String> = {
            let node = self.graph.node(id)?;
            match node.kind {
                NodeKind::Operation => node.input_ids.clone(),
                _ => Vec::new(),
            }
        };
        for raw in &pending_inputs {
            let input = InputRef::parse(id, raw)?;
            self.compute_recursive(input.node_id, feed)?;
        }

        node_exec::execute(self.graph, id, feed)?;
        self.visiting.remove(id);
        Ok(())
    }

    fn parallel_suits(&self, scope: &HashSet<NodeId>) -> Result<bool, GraphError> {
        if parallel_workers() <= 1 || scope.len() < MIN_PARALLEL_NODES {
            return Ok(false);
        }
        let order = topo::order_within(self.graph, scope)?;
        let layers = topo::layers_of(self.graph, &order)?;
        let widest = layers.iter().map(Vec::len).max().unwrap_or(0);
        Ok(widest >= MIN_PARALLEL_WIDTH)
    }
}

/// Workers the parallel strategy may use; 1 means no parallel runtime.
fn parallel_workers() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Evaluate one layer concurrently, then commit results in a sequential
/// pass after the scope joins (the layer barrier). Within the layer every
/// node reads only results from earlier layers, so evaluation runs
/// against a shared borrow; workers pull indices from a shared cursor so
/// uneven nodes do not idle a thread. The earliest failure in layer order
/// wins, and nothing is committed on failure.
fn run_layer_parallel(
    graph: &mut Graph,
    layer: &[NodeId],
    feed: &FeedDict,
) -> Result<(), GraphError> {
    let workers = parallel_workers().min(layer.len());
    let cursor = AtomicUsize::new(0);
    let mut outcomes: Vec<(usize, Result<Option<OpOutput>, GraphError>)> =
        Vec::with_capacity(layer.len());
    {
        let shared: &Graph = graph;
        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let cursor = &cursor;
                    scope.spawn(move || {
                        let mut produced = Vec::new();
                        loop {
                            let index = cursor.fetch_add(1, Ordering::Relaxed);
                            let Some(id) = layer.get(index) else { break };
                            produced.push((index, node_exec::evaluate(shared, id, feed)));
                        }
                        produced
                    })
                })
                .collect();
            for handle in handles {
                outcomes.extend(handle.join().expect("layer worker panicked"));
            }
        });
    }
    outcomes.sort_unstable_by_key(|(index, _)| *index);

    let mut computed = Vec::with_capacity(outcomes.len());
    for (index, outcome) in outcomes {
        computed.push((index, outcome?));
    }
    for (index, out) in computed {
        if let Some(out) = out {
            node_exec::store(graph, &layer[index], out)?;
        }
    }
    Ok(())
}

/// Longest input chain below `target`, saturated at
/// `MAX_RECURSION_DEPTH + 1`. Runs on an explicit stack so the estimate
/// itself cannot overflow, and treats back-edges as saturating so cyclic
/// graphs are steered to the iterative strategy, which reports the cycle.
fn estimate_depth(graph: &Graph, target: &str) -> Result<usize, GraphError> {
    const DEEP: usize = MAX_RECURSION_DEPTH + 1;

    enum Visit<'a> {
        Enter(&'a str),
        Exit(&'a str),
    }

    let mut depth: HashMap<String, usize> = HashMap::new();
    let mut on_path: HashSet<String> = HashSet::new();
    let mut stack: Vec<Visit<'_>> = vec![Visit::Enter(target)];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(id) => {
                if depth.contains_key(id) || on_path.contains(id) {
                    continue;
                }
                let node = graph.node(id)?;
                on_path.insert(id.to_string());
                stack.push(Visit::Exit(id));
                for raw in &node.input_ids {
                    let input = InputRef::parse(id, raw)?;
                    stack.push(Visit::Enter(input.node_id));
                }
            }
            Visit::Exit(id) => {
                let node = graph.node(id)?;
                let mut deepest_input = 0;
                for raw in &node.input_ids {
                    let input = InputRef::parse(id, raw)?;
                    // A missing entry here can only be an input still on
                    // the path, i.e. a back-edge.
                    deepest_input =
                        deepest_input.max(depth.get(input.node_id).copied().unwrap_or(DEEP));
                }
                depth.insert(id.to_string(), (deepest_input + 1).min(DEEP));
                on_path.remove(id);
            }
        }
    }

    Ok(depth.get(target).copied().unwrap_or(DEEP))
}
