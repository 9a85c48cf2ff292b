use crate::partition::Partition;
use crate::PregelError;

use rayon::{ThreadPool, ThreadPoolBuilder};

/// Work executed for every node range of a superstep.
pub trait PartitionTask: Sync {
    fn run(&self, partition: Partition);
}

/// How the partitions of one superstep are spread over the worker threads.
///
/// `run_superstep` returns only after every node in `0..node_count` was handed to `task`
/// exactly once, which is the superstep barrier.
pub trait ExecutionStrategy: Send + Sync {
    fn run_superstep(&self, task: &dyn PartitionTask, node_count: usize);

    fn name(&self) -> &'static str;

    fn concurrency(&self) -> usize;
}

pub fn build_pool(concurrency: usize) -> Result<ThreadPool, PregelError> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .thread_name(|i| format!("pregel-worker-{}", i))
        .build()?;
    Ok(pool)
}

/// Recursively halves the node range into a fork/join tree; idle threads steal halves.
pub struct WorkStealingStrategy {
    pool: ThreadPool,
    threshold: usize,
}

impl WorkStealingStrategy {
    pub fn new(pool: ThreadPool, threshold: usize) -> Self {
        WorkStealingStrategy {
            pool,
            threshold: threshold.max(1),
        }
    }
}

fn fork_join(task: &dyn PartitionTask, partition: Partition, threshold: usize) {
    if partition.len() <= threshold {
        task.run(partition);
        return;
    }

    let (left, right) = partition.split();
    rayon::join(
        || fork_join(task, left, threshold),
        || fork_join(task, right, threshold),
    );
}

impl ExecutionStrategy for WorkStealingStrategy {
    fn run_superstep(&self, task: &dyn PartitionTask, node_count: usize) {
        if node_count == 0 {
            return;
        }
        self.pool
            .install(|| fork_join(task, Partition::of(node_count), self.threshold));
    }

    fn name(&self) -> &'static str {
        "work-stealing"
    }

    fn concurrency(&self) -> usize {
        self.pool.current_num_threads()
    }
}

/// Runs a fixed list of partitions, each submitted as one task to the pool.
pub struct PartitionedStrategy {
    pool: ThreadPool,
    partitions: Vec<Partition>,
}

impl PartitionedStrategy {
    pub fn new(pool: ThreadPool, partitions: Vec<Partition>) -> Self {
        PartitionedStrategy { pool, partitions }
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }
}

impl ExecutionStrategy for PartitionedStrategy {
    fn run_superstep(&self, task: &dyn PartitionTask, node_count: usize) {
        debug_assert_eq!(
            self.partitions.last().map_or(0, Partition::end),
            node_count,
            "partitions do not cover the graph"
        );

        self.pool.scope(|scope| {
            for &partition in &self.partitions {
                scope.spawn(move |_| task.run(partition));
            }
        });
    }

    fn name(&self) -> &'static str {
        "partitioned"
    }

    fn concurrency(&self) -> usize {
        self.pool.current_num_threads()
    }
}
