//! Mutex ordering
//!
//! Every lock and unlock of a mutex is chained after the previous touch of
//! the same mutex in the same process. Lock and unlock interleave into one
//! total order per mutex; the chain never fans out.

use super::{Edge, EdgeSource, Extractor};
use crate::error::Result;
use crate::operation::{Op, Operation};
use std::collections::HashMap;

#[derive(Debug, Default, Clone, Copy)]
pub struct MutexExtractor;

impl Extractor for MutexExtractor {
    fn source(&self) -> EdgeSource {
        EdgeSource::Mutex
    }

    fn extract(&self, operations: &[Operation]) -> Result<Vec<Edge>> {
        // process-scoped mutex name -> last operation that touched it
        let mut last_touch: HashMap<String, usize> = HashMap::new();
        let mut edges = Vec::new();

        for op in operations {
            let mutex = match &op.op {
                Op::MutexLock { mutex } | Op::MutexUnlock { mutex } => mutex,
                _ => continue,
            };

            let key = op.scoped(mutex);
            if let Some(prev) = last_touch.insert(key.clone(), op.id) {
                edges.push(Edge::new(
                    prev,
                    op.id,
                    format!("mutex={}", key),
                    EdgeSource::Mutex,
                ));
            }
        }

        Ok(edges)
    }
}
