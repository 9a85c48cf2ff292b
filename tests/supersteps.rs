use pregel_bsp::{
    AdjacencyGraph, Aggregator, ComputeContext, Computation, InitContext, MasterContext,
    Messages, NodeSchema, Partitioning, Pregel, PregelConfig, PregelError, SumCombiner,
    TerminationFlag, TerminationStatus, ValueType,
};

use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn config(partitioning: Partitioning) -> PregelConfig {
    let mut config = PregelConfig::default();
    config
        .set_concurrency(4)
        .set_max_supersteps(50)
        .set_partition_threshold(2)
        .set_partitioning(partitioning);
    config
}

const ALL_PARTITIONINGS: [Partitioning; 3] =
    [Partitioning::Range, Partitioning::Degree, Partitioning::Auto];

struct HaltAtOnce;

impl Computation<()> for HaltAtOnce {
    fn schema(&self) -> NodeSchema {
        NodeSchema::new()
    }

    fn compute(&self, context: &mut ComputeContext<'_, ()>, _messages: Messages<()>) {
        context.vote_to_halt();
    }
}

#[test]
fn isolated_node_halting_immediately_converges_after_one_superstep() {
    let graph = AdjacencyGraph::from_edges(1, &[]);
    for partitioning in ALL_PARTITIONINGS {
        let result = Pregel::new(&graph, config(partitioning), HaltAtOnce)
            .unwrap()
            .run();

        assert_eq!(result.ran_supersteps, 1);
        assert!(result.did_converge());
        assert_eq!(result.superstep_stats[0].computed_nodes, 1);
        assert_eq!(result.superstep_stats[0].messages_sent, 0);
    }
}

#[test]
fn empty_graph_converges() {
    let graph = AdjacencyGraph::from_edges(0, &[]);
    let result = pregel_bsp::run(&graph, config(Partitioning::Auto), HaltAtOnce).unwrap();
    assert_eq!(result.ran_supersteps, 1);
    assert!(result.did_converge());
}

/// Counts its own invocations and never halts.
struct CountForever;

impl Computation<()> for CountForever {
    fn schema(&self) -> NodeSchema {
        NodeSchema::new().add("count", ValueType::Long)
    }

    fn compute(&self, context: &mut ComputeContext<'_, ()>, _messages: Messages<()>) {
        let count = context.long_node_value("count");
        context.set_long_node_value("count", count + 1);
    }
}

#[test]
fn superstep_cap_stops_without_convergence() {
    let graph = AdjacencyGraph::from_edges(5, &[(0, 1), (1, 2)]);
    let mut config = config(Partitioning::Range);
    config.set_max_supersteps(3);

    let result = Pregel::new(&graph, config, CountForever).unwrap().run();

    assert_eq!(result.ran_supersteps, 3);
    assert!(!result.did_converge());
    assert_eq!(result.status, TerminationStatus::MaxSuperstepsReached);
    assert_eq!(result.node_values.long_values("count"), vec![3; 5]);
}

const PING: u8 = 1;
const REPLY: u8 = 2;

/// Node 0 pings node 1 every superstep until node 1 replies after `exchange_length` pings.
struct PingUntilReply {
    exchange_length: i64,
}

impl Computation<u8> for PingUntilReply {
    fn schema(&self) -> NodeSchema {
        NodeSchema::new().add("pings", ValueType::Long)
    }

    fn compute(&self, context: &mut ComputeContext<'_, u8>, messages: Messages<u8>) {
        if context.node_id() == 0 {
            if messages.into_iter().any(|m| m == REPLY) {
                context.vote_to_halt();
            } else {
                context.send_to(1, PING);
            }
            return;
        }

        let pings = messages.filter(|m| *m == PING).count() as i64;
        let total = context.long_node_value("pings") + pings;
        context.set_long_node_value("pings", total);
        if pings > 0 && total == self.exchange_length {
            context.send_to(0, REPLY);
        }
        context.vote_to_halt();
    }
}

#[test]
fn ping_exchange_converges_after_the_exchange_not_the_cap() {
    let graph = AdjacencyGraph::from_edges(2, &[(0, 1), (1, 0)]);
    for partitioning in ALL_PARTITIONINGS {
        let result = Pregel::new(
            &graph,
            config(partitioning),
            PingUntilReply { exchange_length: 4 },
        )
        .unwrap()
        .run();

        // pings in supersteps 0..=4, the reply lands in superstep 5
        assert_eq!(result.ran_supersteps, 6);
        assert!(result.did_converge());
        assert_eq!(result.node_values.long_value("pings", 1), 5);
    }
}

/// Sends along every relationship and votes to halt in the same invocation.
struct SendAndHalt {
    rounds: usize,
}

impl Computation<u32> for SendAndHalt {
    fn schema(&self) -> NodeSchema {
        NodeSchema::new().add("received", ValueType::Long)
    }

    fn compute(&self, context: &mut ComputeContext<'_, u32>, messages: Messages<u32>) {
        let received = context.long_node_value("received") + messages.len() as i64;
        context.set_long_node_value("received", received);
        if context.superstep() < self.rounds {
            context.send_to_neighbors(1);
        }
        context.vote_to_halt();
    }
}

#[test]
fn halted_sender_does_not_converge_while_its_messages_wake_the_receiver() {
    let graph = AdjacencyGraph::from_edges(2, &[(0, 1)]);
    let result = Pregel::new(&graph, config(Partitioning::Range), SendAndHalt { rounds: 1 })
        .unwrap()
        .run();

    // everyone halted after superstep 0, but the message keeps the run alive
    assert_eq!(result.ran_supersteps, 2);
    assert!(result.did_converge());
    assert_eq!(result.node_values.long_values("received"), vec![0, 1]);
    assert_eq!(result.superstep_stats[1].computed_nodes, 1);
}

#[test]
fn mutual_senders_never_converge() {
    let graph = AdjacencyGraph::from_edges(2, &[(0, 1), (1, 0)]);
    let mut config = config(Partitioning::Auto);
    config.set_max_supersteps(7);

    let result = Pregel::new(&graph, config, SendAndHalt { rounds: usize::MAX })
        .unwrap()
        .run();

    assert_eq!(result.ran_supersteps, 7);
    assert_eq!(result.status, TerminationStatus::MaxSuperstepsReached);
    assert_eq!(result.node_values.long_values("received"), vec![6, 6]);
}

/// Sends the current superstep number and checks what arrives.
struct StampedMessages {
    violations: Arc<AtomicUsize>,
    rounds: usize,
}

impl Computation<usize> for StampedMessages {
    fn schema(&self) -> NodeSchema {
        NodeSchema::new().add("received", ValueType::Long)
    }

    fn compute(&self, context: &mut ComputeContext<'_, usize>, messages: Messages<usize>) {
        let superstep = context.superstep();
        let mut received = 0;
        for stamp in messages {
            received += 1;
            if superstep == 0 || stamp != superstep - 1 {
                self.violations.fetch_add(1, Ordering::Relaxed);
            }
        }

        let total = context.long_node_value("received") + received;
        context.set_long_node_value("received", total);

        if superstep < self.rounds {
            context.send_to_neighbors(superstep);
        } else {
            context.vote_to_halt();
        }
    }
}

#[test]
fn messages_are_visible_exactly_one_superstep_later() {
    // a ring plus chords so nodes have several senders
    let node_count = 40;
    let mut edges: Vec<_> = (0..node_count).map(|n| (n, (n + 1) % node_count)).collect();
    edges.extend((0..node_count).map(|n| (n, (n + 7) % node_count)));
    let graph = AdjacencyGraph::from_edges(node_count, &edges);

    for partitioning in ALL_PARTITIONINGS {
        let violations = Arc::new(AtomicUsize::new(0));
        let computation = StampedMessages {
            violations: violations.clone(),
            rounds: 5,
        };
        let result = Pregel::new(&graph, config(partitioning), computation)
            .unwrap()
            .run();

        assert_eq!(violations.load(Ordering::Relaxed), 0);
        // supersteps 0..=5 compute, the last one halts everyone without sending
        assert_eq!(result.ran_supersteps, 6);
        assert!(result.did_converge());
        // two in-relationships, five sending rounds
        assert_eq!(result.node_values.long_values("received"), vec![10; node_count]);
        assert_eq!(result.superstep_stats[0].messages_sent, 2 * node_count);
    }
}

/// Counts forever but trips the termination flag during superstep 1.
struct CancelDuringSecondSuperstep {
    flag: TerminationFlag,
}

impl Computation<()> for CancelDuringSecondSuperstep {
    fn schema(&self) -> NodeSchema {
        NodeSchema::new().add("count", ValueType::Long)
    }

    fn compute(&self, context: &mut ComputeContext<'_, ()>, _messages: Messages<()>) {
        if context.superstep() == 1 && context.node_id() == 0 {
            self.flag.terminate();
        }
        let count = context.long_node_value("count");
        context.set_long_node_value("count", count + 1);
    }
}

#[test]
fn cancellation_lets_the_current_superstep_finish() {
    let graph = AdjacencyGraph::from_edges(100, &[]);
    for partitioning in ALL_PARTITIONINGS {
        let flag = TerminationFlag::new();
        let computation = CancelDuringSecondSuperstep { flag: flag.clone() };

        let mut pregel = Pregel::new(&graph, config(partitioning), computation).unwrap();
        pregel.set_termination_flag(flag);
        let result = pregel.run();

        assert!(result.was_cancelled());
        assert!(!result.did_converge());
        assert_eq!(result.ran_supersteps, 2);
        assert_eq!(result.node_values.long_values("count"), vec![2; 100]);
    }
}

#[test]
fn cancelling_before_the_run_executes_nothing() {
    let graph = AdjacencyGraph::from_edges(3, &[]);
    let pregel = Pregel::new(&graph, config(Partitioning::Range), CountForever).unwrap();
    pregel.termination_flag().terminate();

    let result = pregel.run();
    assert_eq!(result.status, TerminationStatus::Cancelled);
    assert_eq!(result.ran_supersteps, 0);
    assert_eq!(result.node_values.long_values("count"), vec![0; 3]);
}

/// Seeds values in `init`, sums them through an aggregator and lets the master stop the run.
struct DegreeSum {
    closed: Arc<AtomicUsize>,
}

impl Computation<()> for DegreeSum {
    fn schema(&self) -> NodeSchema {
        NodeSchema::new().add("degree", ValueType::Double)
    }

    fn init(&self, context: &mut InitContext<'_>) {
        context.set_double_node_value("degree", context.degree() as f64);
    }

    fn compute(&self, context: &mut ComputeContext<'_, ()>, _messages: Messages<()>) {
        let degree = context.double_node_value("degree");
        context.aggregate("degree_sum", degree);

        if let Some(sum) = context.aggregated_value("degree_sum") {
            context.set_double_node_value("degree", sum);
        }
    }

    fn master_compute(&self, context: &MasterContext<'_>) -> bool {
        context.superstep() == 2
    }

    fn aggregators(&self) -> Vec<Aggregator> {
        vec![Aggregator::new("degree_sum", SumCombiner)]
    }

    fn close(&self) {
        self.closed.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn aggregates_and_master_compute() {
    let graph = AdjacencyGraph::from_edges(4, &[(0, 1), (0, 2), (0, 3), (1, 2)]);
    let closed = Arc::new(AtomicUsize::new(0));

    let result = Pregel::new(
        &graph,
        config(Partitioning::Degree),
        DegreeSum {
            closed: closed.clone(),
        },
    )
    .unwrap()
    .run();

    assert!(result.did_converge());
    assert_eq!(result.ran_supersteps, 3);
    assert_eq!(closed.load(Ordering::Relaxed), 1);
    // out-degrees sum to 4 in supersteps 0 and 1, every node holds 4 in superstep 2
    assert_eq!(result.node_values.double_values("degree"), vec![4.0; 4]);
    assert_eq!(result.aggregates.get("degree_sum"), Some(&16.0));
}

#[test]
fn invalid_config_is_reported_before_running() {
    let graph = AdjacencyGraph::from_edges(3, &[]);
    let mut config = config(Partitioning::Range);
    config.set_concurrency(0);

    match Pregel::new(&graph, config, CountForever) {
        Err(PregelError::InvalidConfig { field, .. }) => assert_eq!(field, "concurrency"),
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("expected an invalid configuration"),
    }
}

#[test]
fn release_without_running() {
    let graph = AdjacencyGraph::from_edges(10, &[(0, 1)]);
    let pregel = Pregel::new(&graph, config(Partitioning::Auto), CountForever).unwrap();
    assert_eq!(pregel.config().max_supersteps, 50);
    pregel.release();
}

/// Panics in superstep 1 and counts `close` calls.
struct PanicInSecondSuperstep {
    closed: Arc<AtomicUsize>,
}

impl Computation<()> for PanicInSecondSuperstep {
    fn schema(&self) -> NodeSchema {
        NodeSchema::new()
    }

    fn compute(&self, context: &mut ComputeContext<'_, ()>, _messages: Messages<()>) {
        if context.superstep() == 1 && context.node_id() == 3 {
            panic!("compute failed");
        }
    }

    fn close(&self) {
        self.closed.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn close_runs_when_compute_panics() {
    let graph = AdjacencyGraph::from_edges(8, &[]);
    for partitioning in ALL_PARTITIONINGS {
        let closed = Arc::new(AtomicUsize::new(0));
        let computation = PanicInSecondSuperstep {
            closed: closed.clone(),
        };
        let pregel = Pregel::new(&graph, config(partitioning), computation).unwrap();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| pregel.run()));

        assert!(outcome.is_err());
        assert_eq!(closed.load(Ordering::Relaxed), 1);
    }
}
