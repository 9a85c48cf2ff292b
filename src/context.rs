use crate::aggregate::Aggregators;
use crate::graph::Traversal;
use crate::halt::HaltBits;
use crate::messenger::Messenger;
use crate::node_value::NodeValueStore;

macro_rules! node_value_accessors {
    () => {
        pub fn long_node_value(&self, key: &str) -> i64 {
            self.values.long_value(key, self.node_id)
        }

        pub fn double_node_value(&self, key: &str) -> f64 {
            self.values.double_value(key, self.node_id)
        }

        pub fn long_array_node_value(&self, key: &str) -> Vec<i64> {
            self.values.long_array_value(key, self.node_id)
        }

        pub fn double_array_node_value(&self, key: &str) -> Vec<f64> {
            self.values.double_array_value(key, self.node_id)
        }

        pub fn set_long_node_value(&self, key: &str, value: i64) {
            self.values.set_long(key, self.node_id, value)
        }

        pub fn set_double_node_value(&self, key: &str, value: f64) {
            self.values.set_double(key, self.node_id, value)
        }

        pub fn set_long_array_node_value(&self, key: &str, value: &[i64]) {
            self.values.set_long_array(key, self.node_id, value)
        }

        pub fn set_double_array_node_value(&self, key: &str, value: &[f64]) {
            self.values.set_double_array(key, self.node_id, value)
        }
    };
}

/// Handed to [`crate::Computation::init`] once per node before its first `compute`.
pub struct InitContext<'a> {
    node_id: usize,
    node_count: usize,
    values: &'a NodeValueStore,
    traversal: &'a dyn Traversal,
}

impl<'a> InitContext<'a> {
    pub fn node_id(&self) -> usize {
        self.node_id
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn degree(&self) -> usize {
        self.traversal.degree(self.node_id)
    }

    node_value_accessors!();
}

/// The per-node view a computation works through during a superstep.
///
/// A worker creates one context per partition and moves it from node to node.
pub struct ComputeContext<'a, M> {
    node_id: usize,
    superstep: usize,
    node_count: usize,
    values: &'a NodeValueStore,
    halt_bits: &'a HaltBits,
    messenger: &'a dyn Messenger<M>,
    traversal: Box<dyn Traversal + 'a>,
    aggregators: &'a Aggregators,
    local_aggregates: Vec<Option<f64>>,
    messages_sent: usize,
}

impl<'a, M> ComputeContext<'a, M> {
    pub(crate) fn new(
        superstep: usize,
        values: &'a NodeValueStore,
        halt_bits: &'a HaltBits,
        messenger: &'a dyn Messenger<M>,
        traversal: Box<dyn Traversal + 'a>,
        aggregators: &'a Aggregators,
    ) -> Self {
        ComputeContext {
            node_id: 0,
            superstep,
            node_count: values.node_count(),
            values,
            halt_bits,
            messenger,
            traversal,
            aggregators,
            local_aggregates: aggregators.local_values(),
            messages_sent: 0,
        }
    }

    pub(crate) fn set_node(&mut self, node_id: usize) {
        self.node_id = node_id;
    }

    pub(crate) fn init_context(&self) -> InitContext<'_> {
        InitContext {
            node_id: self.node_id,
            node_count: self.node_count,
            values: self.values,
            traversal: &*self.traversal,
        }
    }

    pub(crate) fn messages_sent(&self) -> usize {
        self.messages_sent
    }

    pub(crate) fn into_local_aggregates(self) -> Vec<Option<f64>> {
        self.local_aggregates
    }

    pub fn node_id(&self) -> usize {
        self.node_id
    }

    pub fn superstep(&self) -> usize {
        self.superstep
    }

    pub fn is_initial_superstep(&self) -> bool {
        self.superstep == 0
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn degree(&self) -> usize {
        self.traversal.degree(self.node_id)
    }

    node_value_accessors!();

    /// Reads another node's value. Only values written in earlier supersteps are stable.
    pub fn double_value_of(&self, key: &str, node: usize) -> f64 {
        self.values.double_value(key, node)
    }

    pub fn long_value_of(&self, key: &str, node: usize) -> i64 {
        self.values.long_value(key, node)
    }

    pub fn send_to(&mut self, target: usize, message: M) {
        self.messenger.send_to(target, message);
        self.messages_sent += 1;
    }

    pub fn send_to_neighbors(&mut self, message: M)
    where
        M: Clone,
    {
        let messenger = self.messenger;
        let mut sent = 0;
        self.traversal.for_each_neighbor(self.node_id, &mut |target| {
            messenger.send_to(target, message.clone());
            sent += 1;
        });
        self.messages_sent += sent;
    }

    pub fn for_each_neighbor(&mut self, mut consumer: impl FnMut(usize)) {
        self.traversal
            .for_each_neighbor(self.node_id, &mut consumer);
    }

    /// Stops computing this node until a message arrives for it.
    pub fn vote_to_halt(&self) {
        self.halt_bits.set_halted(self.node_id);
    }

    pub fn aggregate(&mut self, key: &str, value: f64) {
        self.aggregators
            .fold(&mut self.local_aggregates, key, value);
    }

    /// The aggregate produced by the previous superstep.
    pub fn aggregated_value(&self, key: &str) -> Option<f64> {
        self.aggregators.value(key)
    }
}

/// Global view handed to [`crate::Computation::master_compute`] between supersteps.
pub struct MasterContext<'a> {
    superstep: usize,
    values: &'a NodeValueStore,
    aggregators: &'a Aggregators,
}

impl<'a> MasterContext<'a> {
    pub(crate) fn new(
        superstep: usize,
        values: &'a NodeValueStore,
        aggregators: &'a Aggregators,
    ) -> Self {
        MasterContext {
            superstep,
            values,
            aggregators,
        }
    }

    /// The superstep that just finished.
    pub fn superstep(&self) -> usize {
        self.superstep
    }

    pub fn is_initial_superstep(&self) -> bool {
        self.superstep == 0
    }

    pub fn node_count(&self) -> usize {
        self.values.node_count()
    }

    pub fn node_values(&self) -> &NodeValueStore {
        self.values
    }

    pub fn aggregated_value(&self, key: &str) -> Option<f64> {
        self.aggregators.value(key)
    }
}
