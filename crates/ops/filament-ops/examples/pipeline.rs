use filament_graph_core::{CompiledGraph, Executor, FeedDict, Graph};
use filament_ops::register_builtins;
use serde_json::json;

fn main() -> anyhow::Result<()> {
    register_builtins();

    let doc = json!({
        "nodes": [
            {"id": "raw", "type": "placeholder"},
            {"id": "clean", "op": "trim", "inputs": ["raw"]},
            {"id": "headline", "op": "title", "inputs": ["clean"]},
            {"id": "words", "op": "split", "inputs": ["headline"], "constants": [" "]},
            {"id": "banner", "op": "concat", "inputs": ["words:0", "words:1"], "constants": ["!"]},
        ]
    })
    .to_string();

    let mut feed = FeedDict::new();
    feed.insert("raw".to_string(), "  hello graph  ".to_string());

    // One-off execution against a freshly parsed graph.
    let mut graph = Graph::from_json(&doc)?;
    let mut executor = Executor::new(&mut graph);
    println!("banner     = {}", executor.compute("banner", &feed)?);
    println!("first word = {}", executor.compute("words:0", &feed)?);
    println!("strategy   = {:?}", executor.select_strategy("banner")?);

    // Parse once, run many.
    let mut compiled = CompiledGraph::from_json(&doc);
    for raw in ["  one more  ", "\tand another\n"] {
        let mut feed = FeedDict::new();
        feed.insert("raw".to_string(), raw.to_string());
        println!("compiled   = {}", compiled.run_auto("banner", &feed)?);
    }
    Ok(())
}
