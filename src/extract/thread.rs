//! Thread lifecycle ordering
//!
//! `pthread_create` happens before the child's first operation, and the
//! child's last operation happens before the `pthread_join` that reaps it.
//! Creates and ends are matched to the next begin/join of the same thread
//! handle within a process. Unmatched begins and joins are not errors: the
//! partner may lie outside the recorded window.

use super::{Edge, EdgeSource, Extractor};
use crate::error::Result;
use crate::operation::{Op, Operation};
use std::collections::HashMap;

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadExtractor;

impl Extractor for ThreadExtractor {
    fn source(&self) -> EdgeSource {
        EdgeSource::Thread
    }

    fn extract(&self, operations: &[Operation]) -> Result<Vec<Edge>> {
        let mut pending_create: HashMap<String, usize> = HashMap::new();
        let mut pending_end: HashMap<String, usize> = HashMap::new();
        let mut edges = Vec::new();

        for op in operations {
            match &op.op {
                Op::ThreadCreate { thread, .. } => {
                    pending_create.insert(op.scoped(thread), op.id);
                }
                Op::ThreadBegin { thread } => {
                    let key = op.scoped(thread);
                    if let Some(create) = pending_create.remove(&key) {
                        edges.push(Edge::new(create, op.id, key, EdgeSource::Thread));
                    }
                }
                Op::ThreadEnd { thread } => {
                    pending_end.insert(op.scoped(thread), op.id);
                }
                Op::ThreadJoin { thread } => {
                    let key = op.scoped(thread);
                    if let Some(end) = pending_end.remove(&key) {
                        edges.push(Edge::new(end, op.id, key, EdgeSource::Thread));
                    }
                }
                _ => {}
            }
        }

        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tests::{op, ops};

    #[test]
    fn test_create_begin_end_join() {
        let trace = ops(vec![
            op(0, 1, "pthread_create", "0x7f01 0"),
            op(0, 2, "tern_thread_begin", "0x7f01"),
            op(0, 2, "tern_thread_end", "0x7f01"),
            op(0, 1, "pthread_join", "0x7f01"),
        ]);
        let edges = ThreadExtractor.extract(&trace).unwrap();
        let triples: Vec<(usize, usize, &str)> = edges
            .iter()
            .map(|e| (e.from, e.to, e.label.as_str()))
            .collect();
        assert_eq!(triples, vec![(0, 1, "0_0x7f01"), (2, 3, "0_0x7f01")]);
    }

    #[test]
    fn test_begin_without_create_is_ignored() {
        let trace = ops(vec![
            op(0, 2, "tern_thread_begin", "0x7f01"),
            op(0, 1, "pthread_join", "0x7f01"),
        ]);
        assert!(ThreadExtractor.extract(&trace).unwrap().is_empty());
    }

    #[test]
    fn test_pending_create_consumed_once() {
        let trace = ops(vec![
            op(0, 1, "pthread_create", "t 0"),
            op(0, 2, "tern_thread_begin", "t"),
            op(0, 3, "tern_thread_begin", "t"),
        ]);
        assert_eq!(ThreadExtractor.extract(&trace).unwrap().len(), 1);
    }

    #[test]
    fn test_handle_reuse_matches_latest_create() {
        let trace = ops(vec![
            op(0, 1, "pthread_create", "t 0"),
            op(0, 2, "tern_thread_begin", "t"),
            op(0, 2, "tern_thread_end", "t"),
            op(0, 1, "pthread_join", "t"),
            op(0, 1, "pthread_create", "t 0"),
            op(0, 3, "tern_thread_begin", "t"),
        ]);
        let edges = ThreadExtractor.extract(&trace).unwrap();
        let pairs: Vec<(usize, usize)> = edges.iter().map(|e| (e.from, e.to)).collect();
        assert_eq!(pairs, vec![(0, 1), (2, 3), (4, 5)]);
    }

    #[test]
    fn test_handles_scoped_by_process() {
        let trace = ops(vec![
            op(1, 1, "pthread_create", "t 0"),
            op(2, 2, "tern_thread_begin", "t"),
        ]);
        assert!(ThreadExtractor.extract(&trace).unwrap().is_empty());
    }
}
