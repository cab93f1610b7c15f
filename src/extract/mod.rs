//! Happens-before edge extraction
//!
//! Four independent extractors walk the same normalized operation sequence
//! and each infer edges for one synchronization discipline:
//!
//! ```text
//!                    ┌──────────────────────┐
//!                    │ normalized operations│
//!                    └──────────┬───────────┘
//!        ┌───────────────┬──────┴────────┬────────────────┐
//!        ▼               ▼               ▼                ▼
//!   MutexExtractor  BarrierExtractor  ThreadExtractor  StreamExtractor
//!   (lock chains)   (rendezvous)      (create/join)    (byte streams)
//!        └───────────────┴──────┬────────┴────────────────┘
//!                               ▼
//!                     edges, concatenated in
//!                     mutex/barrier/thread/stream order
//! ```
//!
//! Extractors own all of their bookkeeping state for the duration of one
//! pass and share nothing, so they may run on separate threads. The merged
//! result is identical either way.

mod barrier;
mod mutex;
mod stream;
mod thread;

pub use barrier::BarrierExtractor;
pub use mutex::MutexExtractor;
pub use stream::StreamExtractor;
pub use thread::ThreadExtractor;

use crate::error::Result;
use crate::operation::Operation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which extractor inferred an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeSource {
    Mutex,
    Barrier,
    Thread,
    Stream,
}

impl fmt::Display for EdgeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdgeSource::Mutex => "mutex",
            EdgeSource::Barrier => "barrier",
            EdgeSource::Thread => "thread",
            EdgeSource::Stream => "stream",
        };
        f.write_str(name)
    }
}

/// A happens-before fact between two operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub label: String,
    pub source: EdgeSource,
}

impl Edge {
    pub fn new(from: usize, to: usize, label: impl Into<String>, source: EdgeSource) -> Self {
        Self {
            from,
            to,
            label: label.into(),
            source,
        }
    }

    /// The same edge with endpoints ordered so that `from <= to`
    pub fn canonical(self) -> Self {
        if self.from > self.to {
            Self {
                from: self.to,
                to: self.from,
                ..self
            }
        } else {
            self
        }
    }
}

/// One synchronization discipline's edge inference
pub trait Extractor: Sync {
    fn source(&self) -> EdgeSource;

    /// Infer edges from the globally ordered operations
    fn extract(&self, operations: &[Operation]) -> Result<Vec<Edge>>;
}

/// The four extractors in output order
pub fn all_extractors() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(MutexExtractor),
        Box::new(BarrierExtractor),
        Box::new(ThreadExtractor),
        Box::new(StreamExtractor),
    ]
}

/// Run every extractor and concatenate their edges in a fixed order
///
/// With `parallel` set, each extractor runs on its own scoped thread. When
/// several extractors fail, the error of the first one in output order wins.
pub fn extract_all(operations: &[Operation], parallel: bool) -> Result<Vec<Edge>> {
    let extractors = all_extractors();

    let results: Vec<Result<Vec<Edge>>> = if parallel {
        crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = extractors
                .iter()
                .map(|extractor| scope.spawn(move |_| extractor.extract(operations)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
    } else {
        extractors
            .iter()
            .map(|extractor| extractor.extract(operations))
            .collect()
    };

    let mut edges = Vec::new();
    for (extractor, result) in extractors.iter().zip(results) {
        let found = result?;
        tracing::info!("{} extractor: {} edges", extractor.source(), found.len());
        for edge in &found {
            tracing::trace!("{} -> {} [{}] {}", edge.from, edge.to, edge.source, edge.label);
        }
        edges.extend(found);
    }
    Ok(edges)
}
