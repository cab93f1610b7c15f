//! Plain-text graph artifact
//!
//! The layout is the schedule-printer protocol read by the visualizer and
//! replay tools:
//!
//! ```text
//! <nodeCount> <edgeCount>
//! <id> <pid> <tid> <kind> <turn> [info]      one line per node, id order
//! <fromId> <toId> [label]                   one line per edge, from <= to
//! ```

use crate::extract::Edge;
use crate::graph::DependencyGraph;
use crate::operation::Operation;
use std::io::{self, Write};

fn format_node(node: &Operation) -> String {
    let mut line = format!(
        "{} {} {} {} {}",
        node.id,
        node.pid,
        node.tid,
        node.kind().code(),
        node.turn
    );
    if let Some(info) = &node.info {
        line.push(' ');
        line.push_str(info);
    }
    line
}

fn format_edge(edge: &Edge) -> String {
    if edge.label.is_empty() {
        format!("{} {}", edge.from, edge.to)
    } else {
        format!("{} {} {}", edge.from, edge.to, edge.label)
    }
}

/// Serialize the graph to a writer
pub fn write_text<W: Write>(graph: &DependencyGraph, out: &mut W) -> io::Result<()> {
    writeln!(out, "{} {}", graph.node_count(), graph.edge_count())?;
    for node in graph.nodes() {
        writeln!(out, "{}", format_node(node))?;
    }
    for edge in graph.edges() {
        writeln!(out, "{}", format_edge(edge))?;
    }
    Ok(())
}

/// Serialize the graph to a string
pub fn to_text(graph: &DependencyGraph) -> io::Result<String> {
    let mut buffer = Vec::new();
    write_text(graph, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
