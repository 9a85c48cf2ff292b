use pregel_bsp::{
    tab_separated_edge, AdjacencyGraph, ComputeContext, Computation, InitContext, Messages,
    MinCombiner, NodeSchema, Pregel, PregelConfig, PregelError, ValueType,
};

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

/// Unit-weight shortest paths from a single source.
#[derive(Parser, Debug)]
#[command(name = "sssp", about)]
struct Cli {
    /// Edge list, one `source<TAB>target` pair per line.
    edges: PathBuf,

    #[arg(long, default_value_t = 0)]
    source: usize,

    /// Where to write `node<TAB>distance` lines.
    #[arg(long, default_value = "sssp.tsv")]
    output: PathBuf,

    #[arg(long, default_value_t = 100)]
    max_supersteps: usize,

    #[arg(long)]
    concurrency: Option<usize>,
}

struct ShortestPaths {
    source: usize,
}

impl Computation<f64> for ShortestPaths {
    fn schema(&self) -> NodeSchema {
        NodeSchema::new().add("distance", ValueType::Double)
    }

    fn init(&self, context: &mut InitContext<'_>) {
        let distance = if context.node_id() == self.source {
            0.0
        } else {
            f64::INFINITY
        };
        context.set_double_node_value("distance", distance);
    }

    fn compute(&self, context: &mut ComputeContext<'_, f64>, messages: Messages<f64>) {
        let current = context.double_node_value("distance");
        let shortest = messages.fold(current, f64::min);

        if shortest < current {
            context.set_double_node_value("distance", shortest);
        }

        // the source announces itself once, everyone else only on improvement
        let improved = shortest < current || (context.is_initial_superstep() && current == 0.0);
        if improved {
            context.send_to_neighbors(shortest + 1.0);
        }
        context.vote_to_halt();
    }
}

fn main() -> Result<(), PregelError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let graph = AdjacencyGraph::load_edges(&cli.edges, tab_separated_edge)?;

    let mut config = PregelConfig::default();
    config.set_max_supersteps(cli.max_supersteps);
    if let Some(concurrency) = cli.concurrency {
        config.set_concurrency(concurrency);
    }

    let computation = ShortestPaths { source: cli.source };
    let result = Pregel::with_combiner(&graph, config, computation, MinCombiner)?.run();

    let distances = result.node_values.double_values("distance");
    let reached = distances.iter().filter(|d| d.is_finite()).count();
    info!(
        supersteps = result.ran_supersteps,
        converged = result.did_converge(),
        reached,
        "Shortest paths finished"
    );

    let mut writer = io::BufWriter::new(File::create(&cli.output)?);
    for (node, distance) in distances.iter().enumerate() {
        if distance.is_finite() {
            writeln!(writer, "{}\t{}", node, distance)?;
        }
    }
    writer.flush()?;

    Ok(())
}
