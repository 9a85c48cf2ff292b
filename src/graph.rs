use crate::PregelError;

use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

use tracing::warn;

/// Read-only view of the input graph. Node ids are dense in `0..node_count()`.
pub trait Graph: Send + Sync {
    fn node_count(&self) -> usize;

    fn relationship_count(&self) -> usize;

    fn degree(&self, node: usize) -> usize;

    /// Returns a traversal handle that does not share iteration state with any other handle,
    /// so every worker can walk relationships without contention.
    fn traversal(&self) -> Box<dyn Traversal + '_>;
}

pub trait Traversal {
    fn degree(&self, node: usize) -> usize;

    fn for_each_neighbor(&mut self, node: usize, consumer: &mut dyn FnMut(usize));
}

/// Directed graph stored as an offset array plus a flat target array.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    offsets: Vec<usize>,
    targets: Vec<usize>,
}

impl AdjacencyGraph {
    pub fn from_edges(node_count: usize, edges: &[(usize, usize)]) -> Self {
        let mut offsets = vec![0_usize; node_count + 1];
        for &(source, target) in edges {
            assert!(
                source < node_count && target < node_count,
                "edge ({}, {}) out of range for {} nodes",
                source,
                target,
                node_count
            );
            offsets[source + 1] += 1;
        }

        for i in 0..node_count {
            offsets[i + 1] += offsets[i];
        }

        let mut cursor = offsets.clone();
        let mut targets = vec![0_usize; edges.len()];
        for &(source, target) in edges {
            targets[cursor[source]] = target;
            cursor[source] += 1;
        }

        AdjacencyGraph { offsets, targets }
    }

    /// Loads a text edge list, one relationship per line. Lines rejected by `parser` are skipped.
    pub fn load_edges<P>(path: &Path, parser: P) -> Result<Self, PregelError>
    where
        P: Fn(&str) -> Option<(usize, usize)>,
    {
        let reader = io::BufReader::new(File::open(path)?);
        let mut edges = Vec::new();
        let mut node_count = 0;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            match parser(&line).and_then(with_node_count) {
                Some((edge, required)) => {
                    node_count = node_count.max(required);
                    edges.push(edge);
                }
                None => warn!(line = index + 1, content = %line, "Skipping malformed edge"),
            }
        }

        Ok(Self::from_edges(node_count, &edges))
    }

    /// Like [`AdjacencyGraph::load_edges`], but fails on the first line the parser rejects.
    pub fn load_edges_strict<P>(path: &Path, parser: P) -> Result<Self, PregelError>
    where
        P: Fn(&str) -> Option<(usize, usize)>,
    {
        let reader = io::BufReader::new(File::open(path)?);
        let mut edges = Vec::new();
        let mut node_count = 0;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let (edge, required) = parser(&line)
                .and_then(with_node_count)
                .ok_or_else(|| PregelError::MalformedEdge {
                    line: index + 1,
                    content: line.clone(),
                })?;
            node_count = node_count.max(required);
            edges.push(edge);
        }

        Ok(Self::from_edges(node_count, &edges))
    }

    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.targets[self.offsets[node]..self.offsets[node + 1]]
    }
}

/// Pairs an edge with the node count it needs; ids too large to count are rejected.
fn with_node_count(edge: (usize, usize)) -> Option<((usize, usize), usize)> {
    let required = edge.0.max(edge.1).checked_add(1)?;
    Some((edge, required))
}

/// Parses `source<TAB>target` lines, the format of the SNAP edge lists.
pub fn tab_separated_edge(line: &str) -> Option<(usize, usize)> {
    let mut parts = line.split('\t');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(source), Some(target), None) => {
            match (source.trim().parse(), target.trim().parse()) {
                (Ok(s), Ok(t)) => Some((s, t)),
                _ => None,
            }
        }
        _ => None,
    }
}

impl Graph for AdjacencyGraph {
    fn node_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    fn relationship_count(&self) -> usize {
        self.targets.len()
    }

    fn degree(&self, node: usize) -> usize {
        self.offsets[node + 1] - self.offsets[node]
    }

    fn traversal(&self) -> Box<dyn Traversal + '_> {
        Box::new(AdjacencyTraversal { graph: self })
    }
}

struct AdjacencyTraversal<'a> {
    graph: &'a AdjacencyGraph,
}

impl<'a> Traversal for AdjacencyTraversal<'a> {
    fn degree(&self, node: usize) -> usize {
        self.graph.degree(node)
    }

    fn for_each_neighbor(&mut self, node: usize, consumer: &mut dyn FnMut(usize)) {
        for &target in self.graph.neighbors(node) {
            consumer(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn from_edges_groups_by_source() {
        let graph = AdjacencyGraph::from_edges(4, &[(2, 0), (0, 1), (2, 3), (0, 2)]);

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.relationship_count(), 4);
        assert_eq!(graph.neighbors(0), &[1, 2]);
        assert_eq!(graph.neighbors(1), &[] as &[usize]);
        assert_eq!(graph.neighbors(2), &[0, 3]);
        assert_eq!(graph.degree(3), 0);

        let mut seen = Vec::new();
        graph
            .traversal()
            .for_each_neighbor(2, &mut |target| seen.push(target));
        assert_eq!(seen, vec![0, 3]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn from_edges_rejects_unknown_nodes() {
        AdjacencyGraph::from_edges(2, &[(0, 2)]);
    }

    #[test]
    fn load_edges_skips_bad_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "0\t1").unwrap();
        writeln!(file, "garbage").unwrap();
        writeln!(file, "1\t5").unwrap();
        file.flush().unwrap();

        let graph = AdjacencyGraph::load_edges(file.path(), tab_separated_edge).unwrap();
        assert_eq!(graph.node_count(), 6);
        assert_eq!(graph.relationship_count(), 2);
        assert_eq!(graph.neighbors(1), &[5]);

        match AdjacencyGraph::load_edges_strict(file.path(), tab_separated_edge) {
            Err(PregelError::MalformedEdge { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected a malformed edge error, got {:?}", other),
        }
    }

    #[test]
    fn ids_without_a_successor_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0\t1").unwrap();
        writeln!(file, "{}\t0", usize::MAX).unwrap();
        writeln!(file, "2\t1").unwrap();
        file.flush().unwrap();

        let graph = AdjacencyGraph::load_edges(file.path(), tab_separated_edge).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.relationship_count(), 2);

        match AdjacencyGraph::load_edges_strict(file.path(), tab_separated_edge) {
            Err(PregelError::MalformedEdge { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected a malformed edge error, got {:?}", other),
        }
    }
}
