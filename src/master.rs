use crate::aggregate::Aggregators;
use crate::combine::Combine;
use crate::computation::Computation;
use crate::config::PregelConfig;
use crate::context::MasterContext;
use crate::executor::{build_pool, ExecutionStrategy, PartitionedStrategy, WorkStealingStrategy};
use crate::graph::Graph;
use crate::halt::HaltBits;
use crate::messenger::{CombiningMessenger, Messenger, QueueMessenger};
use crate::node_value::NodeValueStore;
use crate::partition::{degree_partitions, range_partitions, Partitioning};
use crate::state::{RunState, SuperstepStats, TerminationFlag, TerminationStatus};
use crate::worker::ComputeStep;
use crate::PregelError;

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use rustc_hash::FxHashMap;
use tracing::{debug, info};

#[derive(Debug)]
pub struct PregelResult {
    pub node_values: NodeValueStore,
    pub ran_supersteps: usize,
    pub status: TerminationStatus,
    /// Aggregates of the last executed superstep.
    pub aggregates: FxHashMap<String, f64>,
    pub superstep_stats: Vec<SuperstepStats>,
}

impl PregelResult {
    pub fn did_converge(&self) -> bool {
        self.status == TerminationStatus::Converged
    }

    pub fn was_cancelled(&self) -> bool {
        self.status == TerminationStatus::Cancelled
    }
}

/// Drives a [`Computation`] over a graph in supersteps.
///
/// Construction allocates every per-node buffer and the worker pool, so resource problems are
/// reported before the first superstep. Each superstep runs the computation for the active
/// nodes, waits for all workers, swaps the message buffers and then checks for convergence,
/// the superstep cap and cancellation, in that order.
pub struct Pregel<'g, G: ?Sized, C, M> {
    graph: &'g G,
    config: PregelConfig,
    computation: C,
    values: NodeValueStore,
    halt_bits: HaltBits,
    messenger: Box<dyn Messenger<M>>,
    executor: Box<dyn ExecutionStrategy>,
    aggregators: Aggregators,
    termination: TerminationFlag,
}

impl<'g, G, C, M> Pregel<'g, G, C, M>
where
    G: Graph + ?Sized,
    C: Computation<M>,
    M: Send + 'static,
{
    /// Creates an engine delivering every message individually.
    pub fn new(graph: &'g G, config: PregelConfig, computation: C) -> Result<Self, PregelError> {
        Self::create(graph, config, computation, None)
    }

    /// Creates an engine folding messages to the same node through `combiner`.
    pub fn with_combiner<K>(
        graph: &'g G,
        config: PregelConfig,
        computation: C,
        combiner: K,
    ) -> Result<Self, PregelError>
    where
        K: Combine<M> + 'static,
    {
        Self::create(graph, config, computation, Some(Arc::new(combiner)))
    }

    fn create(
        graph: &'g G,
        config: PregelConfig,
        computation: C,
        combiner: Option<Arc<dyn Combine<M>>>,
    ) -> Result<Self, PregelError> {
        config.validate()?;

        let node_count = graph.node_count();
        let values = NodeValueStore::new(&computation.schema(), node_count)?;
        let halt_bits = HaltBits::new(node_count)?;

        let messenger: Box<dyn Messenger<M>> = match combiner {
            Some(combiner) => Box::new(CombiningMessenger::new(node_count, combiner)?),
            None => Box::new(QueueMessenger::new(node_count)?),
        };

        let pool = build_pool(config.concurrency)?;
        let executor: Box<dyn ExecutionStrategy> = match config.partitioning {
            Partitioning::Auto => Box::new(WorkStealingStrategy::new(
                pool,
                config.partition_threshold,
            )),
            Partitioning::Range => Box::new(PartitionedStrategy::new(
                pool,
                range_partitions(config.concurrency, node_count),
            )),
            Partitioning::Degree => Box::new(PartitionedStrategy::new(
                pool,
                degree_partitions(graph, config.concurrency),
            )),
        };

        let aggregators = Aggregators::new(computation.aggregators());

        Ok(Pregel {
            graph,
            config,
            computation,
            values,
            halt_bits,
            messenger,
            executor,
            aggregators,
            termination: TerminationFlag::new(),
        })
    }

    /// A handle that cancels the run at the next superstep boundary.
    pub fn termination_flag(&self) -> TerminationFlag {
        self.termination.clone()
    }

    /// Replaces the engine's flag, e.g. with one the computation itself holds.
    pub fn set_termination_flag(&mut self, flag: TerminationFlag) -> &mut Self {
        self.termination = flag;
        self
    }

    pub fn config(&self) -> &PregelConfig {
        &self.config
    }

    pub fn run(mut self) -> PregelResult {
        let node_count = self.graph.node_count();
        let started = Instant::now();

        info!(
            node_count,
            relationship_count = self.graph.relationship_count(),
            concurrency = self.executor.concurrency(),
            strategy = self.executor.name(),
            messenger = self.messenger.kind(),
            max_supersteps = self.config.max_supersteps,
            "Starting Pregel computation"
        );

        let close_guard = CloseGuard::<C, M>::new(&self.computation);
        let mut superstep_stats = Vec::new();
        let mut ran_supersteps = 0;

        let status = loop {
            if self.termination.is_terminated() {
                debug!(superstep = ran_supersteps, "Cancellation requested");
                break TerminationStatus::Cancelled;
            }

            let mut run_state = RunState::start(ran_supersteps);
            let step_started = Instant::now();
            self.messenger.init_superstep(run_state.superstep);

            let step = ComputeStep::new(
                run_state.superstep,
                self.graph,
                &self.computation,
                &self.values,
                &self.halt_bits,
                &*self.messenger,
                &self.aggregators,
            );
            self.executor.run_superstep(&step, node_count);

            let stats = SuperstepStats {
                superstep: run_state.superstep,
                computed_nodes: step.computed_nodes(),
                messages_sent: step.messages_sent(),
                elapsed: step_started.elapsed(),
            };
            ran_supersteps += 1;

            run_state.has_sent_message = stats.messages_sent > 0;
            run_state.has_active_node = !self.halt_bits.all_halted();
            self.aggregators.advance();

            debug!(
                superstep = stats.superstep,
                computed_nodes = stats.computed_nodes,
                messages_sent = stats.messages_sent,
                elapsed_ms = stats.elapsed.as_millis() as u64,
                "Finished superstep"
            );
            superstep_stats.push(stats);

            let master_halted = self.computation.master_compute(&MasterContext::new(
                run_state.superstep,
                &self.values,
                &self.aggregators,
            ));

            if master_halted || run_state.converged() {
                break TerminationStatus::Converged;
            }

            if ran_supersteps >= self.config.max_supersteps {
                break TerminationStatus::MaxSuperstepsReached;
            }
        };

        drop(close_guard);
        self.messenger.release();

        info!(
            ran_supersteps,
            status = ?status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Finished Pregel computation"
        );

        PregelResult {
            node_values: self.values,
            ran_supersteps,
            status,
            aggregates: self.aggregators.values(),
            superstep_stats,
        }
    }

    /// Tears down buffers and the worker pool without running.
    pub fn release(mut self) {
        self.messenger.release();
        debug!(
            node_count = self.values.node_count(),
            "Released Pregel resources"
        );
    }
}

/// Calls [`Computation::close`] when dropped, also while unwinding out of a panicking superstep.
struct CloseGuard<'c, C: Computation<M>, M> {
    computation: &'c C,
    message: PhantomData<fn(M)>,
}

impl<'c, C: Computation<M>, M> CloseGuard<'c, C, M> {
    fn new(computation: &'c C) -> Self {
        CloseGuard {
            computation,
            message: PhantomData,
        }
    }
}

impl<'c, C: Computation<M>, M> Drop for CloseGuard<'c, C, M> {
    fn drop(&mut self) {
        self.computation.close();
    }
}

/// Builds an engine for `computation` and runs it to completion.
pub fn run<G, C, M>(
    graph: &G,
    config: PregelConfig,
    computation: C,
) -> Result<PregelResult, PregelError>
where
    G: Graph + ?Sized,
    C: Computation<M>,
    M: Send + 'static,
{
    Ok(Pregel::new(graph, config, computation)?.run())
}
