use pregel_bsp::{
    tab_separated_edge, AdjacencyGraph, ComputeContext, Computation, Graph, InitContext,
    Messages, MinCombiner, NodeSchema, Pregel, PregelConfig, PregelError, ValueType,
};

use std::path::PathBuf;

use clap::Parser;
use rustc_hash::FxHashMap;
use tracing::info;

/// Weakly connected components by minimum label propagation.
#[derive(Parser, Debug)]
#[command(name = "wcc", about)]
struct Cli {
    /// Edge list, one `source<TAB>target` pair per line.
    edges: PathBuf,

    /// How many of the largest components to print.
    #[arg(long, default_value_t = 10)]
    top: usize,

    #[arg(long)]
    concurrency: Option<usize>,
}

struct Wcc;

impl Computation<i64> for Wcc {
    fn schema(&self) -> NodeSchema {
        NodeSchema::new().add("component", ValueType::Long)
    }

    fn init(&self, context: &mut InitContext<'_>) {
        context.set_long_node_value("component", context.node_id() as i64);
    }

    fn compute(&self, context: &mut ComputeContext<'_, i64>, messages: Messages<i64>) {
        let current = context.long_node_value("component");
        let smallest = messages.fold(current, i64::min);

        if smallest < current {
            context.set_long_node_value("component", smallest);
        }
        if smallest < current || context.is_initial_superstep() {
            context.send_to_neighbors(smallest);
        }
        context.vote_to_halt();
    }
}

/// Adds the reverse of every relationship.
fn undirected(graph: &AdjacencyGraph) -> AdjacencyGraph {
    let mut edges = Vec::with_capacity(2 * graph.relationship_count());
    for source in 0..graph.node_count() {
        for &target in graph.neighbors(source) {
            edges.push((source, target));
            edges.push((target, source));
        }
    }
    AdjacencyGraph::from_edges(graph.node_count(), &edges)
}

fn main() -> Result<(), PregelError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let graph = undirected(&AdjacencyGraph::load_edges(&cli.edges, tab_separated_edge)?);

    let mut config = PregelConfig::default();
    config.set_max_supersteps(graph.node_count().max(1));
    if let Some(concurrency) = cli.concurrency {
        config.set_concurrency(concurrency);
    }

    let result = Pregel::with_combiner(&graph, config, Wcc, MinCombiner)?.run();

    let mut sizes: FxHashMap<i64, usize> = FxHashMap::default();
    for component in result.node_values.long_values("component") {
        *sizes.entry(component).or_default() += 1;
    }
    info!(
        supersteps = result.ran_supersteps,
        components = sizes.len(),
        "Components finished"
    );

    let mut sizes: Vec<_> = sizes.into_iter().collect();
    sizes.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    for (component, size) in sizes.into_iter().take(cli.top) {
        println!("{}\t{}", component, size);
    }

    Ok(())
}
