use crate::aggregate::Aggregators;
use crate::computation::Computation;
use crate::context::ComputeContext;
use crate::executor::PartitionTask;
use crate::graph::Graph;
use crate::halt::HaltBits;
use crate::messenger::Messenger;
use crate::node_value::NodeValueStore;
use crate::partition::Partition;

use std::sync::atomic::{AtomicUsize, Ordering};

/// Everything a worker needs to run one superstep over a node range.
pub(crate) struct ComputeStep<'a, G: ?Sized, C, M> {
    superstep: usize,
    graph: &'a G,
    computation: &'a C,
    values: &'a NodeValueStore,
    halt_bits: &'a HaltBits,
    messenger: &'a dyn Messenger<M>,
    aggregators: &'a Aggregators,
    computed_nodes: AtomicUsize,
    messages_sent: AtomicUsize,
}

impl<'a, G, C, M> ComputeStep<'a, G, C, M>
where
    G: Graph + ?Sized,
    C: Computation<M>,
{
    pub(crate) fn new(
        superstep: usize,
        graph: &'a G,
        computation: &'a C,
        values: &'a NodeValueStore,
        halt_bits: &'a HaltBits,
        messenger: &'a dyn Messenger<M>,
        aggregators: &'a Aggregators,
    ) -> Self {
        ComputeStep {
            superstep,
            graph,
            computation,
            values,
            halt_bits,
            messenger,
            aggregators,
            computed_nodes: AtomicUsize::new(0),
            messages_sent: AtomicUsize::new(0),
        }
    }

    pub(crate) fn computed_nodes(&self) -> usize {
        self.computed_nodes.load(Ordering::Relaxed)
    }

    pub(crate) fn messages_sent(&self) -> usize {
        self.messages_sent.load(Ordering::Relaxed)
    }
}

impl<'a, G, C, M> PartitionTask for ComputeStep<'a, G, C, M>
where
    G: Graph + ?Sized,
    C: Computation<M>,
{
    fn run(&self, partition: Partition) {
        let mut context = ComputeContext::new(
            self.superstep,
            self.values,
            self.halt_bits,
            self.messenger,
            self.graph.traversal(),
            self.aggregators,
        );

        let mut computed = 0;
        for node in partition.nodes() {
            let messages = self.messenger.take_messages(node);

            // A halted node only wakes up for incoming messages.
            if self.superstep > 0 && self.halt_bits.is_halted(node) && messages.is_empty() {
                continue;
            }

            self.halt_bits.clear_halted(node);
            context.set_node(node);

            if self.superstep == 0 {
                self.computation.init(&mut context.init_context());
            }

            self.computation.compute(&mut context, messages);
            computed += 1;
        }

        self.computed_nodes.fetch_add(computed, Ordering::Relaxed);
        self.messages_sent
            .fetch_add(context.messages_sent(), Ordering::Relaxed);
        self.aggregators.merge(context.into_local_aggregates());
    }
}
