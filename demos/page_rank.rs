use pregel_bsp::{
    tab_separated_edge, AdjacencyGraph, Aggregator, ComputeContext, Computation, Graph,
    InitContext, MasterContext, MaxCombiner, Messages, NodeSchema, Partitioning, Pregel,
    PregelConfig, PregelError, SumCombiner, ValueType,
};

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

const DAMPING: f64 = 0.85;

/// Ranks the nodes of a tab separated edge list.
#[derive(Parser, Debug)]
#[command(name = "page-rank", about)]
struct Cli {
    /// Edge list, one `source<TAB>target` pair per line.
    edges: PathBuf,

    /// Where to write `node<TAB>rank` lines.
    #[arg(long, default_value = "page_rank.tsv")]
    output: PathBuf,

    #[arg(long, default_value_t = 30)]
    max_iterations: usize,

    /// Stop once no rank moves by more than this.
    #[arg(long, default_value_t = 1e-7)]
    tolerance: f64,

    #[arg(long)]
    concurrency: Option<usize>,

    #[arg(long, value_enum, default_value = "auto")]
    partitioning: PartitioningArg,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PartitioningArg {
    Range,
    Degree,
    Auto,
}

impl From<PartitioningArg> for Partitioning {
    fn from(arg: PartitioningArg) -> Self {
        match arg {
            PartitioningArg::Range => Partitioning::Range,
            PartitioningArg::Degree => Partitioning::Degree,
            PartitioningArg::Auto => Partitioning::Auto,
        }
    }
}

struct PageRank {
    tolerance: f64,
}

impl Computation<f64> for PageRank {
    fn schema(&self) -> NodeSchema {
        NodeSchema::new().add("rank", ValueType::Double)
    }

    fn init(&self, context: &mut InitContext<'_>) {
        context.set_double_node_value("rank", 1.0 / context.node_count() as f64);
    }

    fn compute(&self, context: &mut ComputeContext<'_, f64>, messages: Messages<f64>) {
        let mut rank = context.double_node_value("rank");

        if !context.is_initial_superstep() {
            let sum: f64 = messages.sum();
            let next = (1.0 - DAMPING) / context.node_count() as f64 + DAMPING * sum;
            context.aggregate("delta", (next - rank).abs());
            context.set_double_node_value("rank", next);
            rank = next;
        }

        let degree = context.degree();
        if degree > 0 {
            context.send_to_neighbors(rank / degree as f64);
        }
        context.aggregate("rank_sum", rank);
    }

    fn master_compute(&self, context: &MasterContext<'_>) -> bool {
        match context.aggregated_value("delta") {
            Some(delta) => delta < self.tolerance,
            None => false,
        }
    }

    fn aggregators(&self) -> Vec<Aggregator> {
        vec![
            Aggregator::new("delta", MaxCombiner),
            Aggregator::new("rank_sum", SumCombiner),
        ]
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
    info!(
        nodes = graph.node_count(),
        relationships = graph.relationship_count(),
        "Loaded graph"
    );

    let mut config = PregelConfig::default();
    config
        .set_max_supersteps(cli.max_iterations)
        .set_partitioning(cli.partitioning.into());
    if let Some(concurrency) = cli.concurrency {
        config.set_concurrency(concurrency);
    }

    let computation = PageRank {
        tolerance: cli.tolerance,
    };
    let result = Pregel::with_combiner(&graph, config, computation, SumCombiner)?.run();
    info!(
        supersteps = result.ran_supersteps,
        status = ?result.status,
        rank_sum = result.aggregates.get("rank_sum").copied().unwrap_or_default(),
        "PageRank finished"
    );

    let ranks = result.node_values.double_values("rank");
    let mut writer = io::BufWriter::new(File::create(&cli.output)?);
    for (node, rank) in ranks.iter().enumerate() {
        writeln!(writer, "{}\t{}", node, rank)?;
    }
    writer.flush()?;

    if let Some((node, rank)) = ranks
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
    {
        println!("Max node: {}, rank: {}", node, rank);
    }

    Ok(())
}
