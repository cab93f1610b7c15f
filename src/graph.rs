//! Dependency graph assembled from the normalized trace and extracted edges
//!
//! Nodes are the normalized operations in id order. Edges are stored in
//! canonical form (`from <= to`) in the order the extractors produced them;
//! duplicate edges are kept, since independent causes may license the same
//! pair.

use crate::extract::{Edge, EdgeSource};
use crate::operation::Operation;
use std::collections::BTreeMap;
use std::fmt;

/// Happens-before graph over one analyzed trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    nodes: Vec<Operation>,
    edges: Vec<Edge>,
}

impl DependencyGraph {
    /// Build a graph, canonicalizing every edge
    pub fn new(nodes: Vec<Operation>, edges: Vec<Edge>) -> Self {
        let edges = edges.into_iter().map(Edge::canonical).collect();
        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[Operation] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edge counts per extractor
    pub fn summary(&self) -> EdgeSummary {
        let mut by_source = BTreeMap::new();
        for edge in &self.edges {
            *by_source.entry(edge.source).or_insert(0) += 1;
        }
        EdgeSummary {
            nodes: self.nodes.len(),
            by_source,
        }
    }
}

/// Per-extractor edge statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSummary {
    pub nodes: usize,
    pub by_source: BTreeMap<EdgeSource, usize>,
}

impl EdgeSummary {
    pub fn count(&self, source: EdgeSource) -> usize {
        self.by_source.get(&source).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.by_source.values().sum()
    }
}

impl fmt::Display for EdgeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "operations: {}", self.nodes)?;
        writeln!(f, "edges:      {}", self.total())?;
        for source in [
            EdgeSource::Mutex,
            EdgeSource::Barrier,
            EdgeSource::Thread,
            EdgeSource::Stream,
        ] {
            writeln!(f, "  {:<8}  {}", source.to_string(), self.count(source))?;
        }
        Ok(())
    }
}
