use crate::graph::Graph;

use serde::{Deserialize, Serialize};

/// How node ids are divided among workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Partitioning {
    /// `concurrency` ranges with the same number of nodes, one task each.
    Range,
    /// `concurrency` ranges with roughly the same number of relationships, one task each.
    Degree,
    /// One range recursively halved down to `partition_threshold`, balanced by work stealing.
    Auto,
}

/// The half-open node range `[start, start + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    start: usize,
    length: usize,
}

impl Partition {
    pub fn new(start: usize, length: usize) -> Self {
        Partition { start, length }
    }

    pub fn of(node_count: usize) -> Self {
        Partition::new(0, node_count)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn nodes(&self) -> std::ops::Range<usize> {
        self.start..self.end()
    }

    /// Halves the range; the left part gets the smaller half.
    pub fn split(&self) -> (Partition, Partition) {
        let half = self.length / 2;
        (
            Partition::new(self.start, half),
            Partition::new(self.start + half, self.length - half),
        )
    }
}

/// Splits `0..node_count` into `min(concurrency, node_count)` ranges whose sizes differ by at
/// most one node.
pub fn range_partitions(concurrency: usize, node_count: usize) -> Vec<Partition> {
    let count = concurrency.max(1).min(node_count);
    if count == 0 {
        return Vec::new();
    }

    let base = node_count / count;
    let extra = node_count % count;

    let mut partitions = Vec::with_capacity(count);
    let mut start = 0;
    for i in 0..count {
        let length = base + usize::from(i < extra);
        partitions.push(Partition::new(start, length));
        start += length;
    }
    partitions
}

/// Splits the nodes into ranges carrying roughly the same `degree + 1` weight.
pub fn degree_partitions<G: Graph + ?Sized>(graph: &G, concurrency: usize) -> Vec<Partition> {
    let node_count = graph.node_count();
    if node_count == 0 {
        return Vec::new();
    }

    let total = graph.relationship_count() + node_count;
    let target = total.div_ceil(concurrency.max(1));

    let mut partitions = Vec::with_capacity(concurrency);
    let mut start = 0;
    let mut weight = 0;
    for node in 0..node_count {
        weight += graph.degree(node) + 1;
        if weight >= target {
            partitions.push(Partition::new(start, node + 1 - start));
            start = node + 1;
            weight = 0;
        }
    }

    if start < node_count {
        partitions.push(Partition::new(start, node_count - start));
    }

    partitions
}
