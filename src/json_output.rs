//! JSON output format for dependency graphs
//!
//! `--format json` carries the same nodes and canonical edges as the text
//! artifact, plus the raw arguments and the extractor of each edge.

use crate::extract::{Edge, EdgeSource};
use crate::graph::DependencyGraph;
use crate::operation::Operation;
use serde::{Deserialize, Serialize};

/// A single operation node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonNode {
    pub id: usize,
    pub pid: u32,
    pub tid: u32,
    /// Canonical kind code (e.g., "M_L", "READ_S")
    pub kind: String,
    /// Sequence number assigned by the recording layer
    pub turn: u64,
    /// Raw argument text
    pub args: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

/// A happens-before edge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonEdge {
    pub from: usize,
    pub to: usize,
    pub label: String,
    pub source: EdgeSource,
}

/// Root JSON output structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonGraph {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes: Vec<JsonNode>,
    pub edges: Vec<JsonEdge>,
}

impl From<&Operation> for JsonNode {
    fn from(op: &Operation) -> Self {
        Self {
            id: op.id,
            pid: op.pid,
            tid: op.tid,
            kind: op.kind().code().to_string(),
            turn: op.turn,
            args: op.args.clone(),
            info: op.info.clone(),
        }
    }
}

impl From<&Edge> for JsonEdge {
    fn from(edge: &Edge) -> Self {
        Self {
            from: edge.from,
            to: edge.to,
            label: edge.label.clone(),
            source: edge.source,
        }
    }
}

impl From<&DependencyGraph> for JsonGraph {
    fn from(graph: &DependencyGraph) -> Self {
        Self {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            nodes: graph.nodes().iter().map(JsonNode::from).collect(),
            edges: graph.edges().iter().map(JsonEdge::from).collect(),
        }
    }
}

/// Serialize a graph as pretty-printed JSON
pub fn to_json(graph: &DependencyGraph) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonGraph::from(graph))
}
