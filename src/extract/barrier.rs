//! Barrier rendezvous
//!
//! A barrier wait is recorded in two phases. First-phase arrivals collect
//! until the participant count is reached; the barrier then releases and
//! every participant remembers the whole group as its pending predecessors.
//! A participant's second phase depends on every first-phase arrival of its
//! group.
//!
//! ```text
//! count = 2
//!
//!   T1: B_W_F(5) ─────┬──────────► B_W_S(9)
//!                     ╳
//!   T2: B_W_F(6) ─────┴──────────► B_W_S(10)
//!
//!   edges: 5→9, 6→9, 5→10, 6→10
//! ```
//!
//! Barriers are reusable: each release empties the arrival list for the next
//! round. Barrier state lives until the end of the pass.

use super::{Edge, EdgeSource, Extractor};
use crate::error::{AnalysisError, Result};
use crate::operation::{Op, Operation};
use std::collections::HashMap;

#[derive(Debug, Default, Clone, Copy)]
pub struct BarrierExtractor;

#[derive(Debug)]
struct BarrierState {
    count: usize,
    /// First-phase arrivals of the current round
    arrived: Vec<(usize, u32)>,
    /// Released group each thread still has to depend on
    pending: HashMap<u32, Vec<usize>>,
}

impl BarrierState {
    fn new(count: usize) -> Self {
        Self {
            count,
            arrived: Vec::new(),
            pending: HashMap::new(),
        }
    }

    fn arrive_first(&mut self, id: usize, tid: u32) {
        self.arrived.push((id, tid));
        // a zero-count barrier never releases
        if self.arrived.len() != self.count {
            return;
        }

        let group: Vec<usize> = self.arrived.iter().map(|(id, _)| *id).collect();
        tracing::trace!("barrier released group {:?}", group);
        for (_, tid) in self.arrived.drain(..) {
            self.pending.insert(tid, group.clone());
        }
    }

    fn arrive_second(&mut self, tid: u32) -> Option<Vec<usize>> {
        self.pending.remove(&tid).filter(|group| !group.is_empty())
    }
}

impl Extractor for BarrierExtractor {
    fn source(&self) -> EdgeSource {
        EdgeSource::Barrier
    }

    fn extract(&self, operations: &[Operation]) -> Result<Vec<Edge>> {
        let mut barriers: HashMap<String, BarrierState> = HashMap::new();
        let mut edges = Vec::new();

        for op in operations {
            match &op.op {
                Op::BarrierInit { barrier, count } => {
                    barriers.insert(op.scoped(barrier), BarrierState::new(*count));
                }
                Op::BarrierArriveFirst { barrier } => {
                    let key = op.scoped(barrier);
                    let state = barriers
                        .get_mut(&key)
                        .ok_or_else(|| uninitialized(op.id, &key))?;
                    state.arrive_first(op.id, op.tid);
                }
                Op::BarrierArriveSecond { barrier } => {
                    let key = op.scoped(barrier);
                    let state = barriers
                        .get_mut(&key)
                        .ok_or_else(|| uninitialized(op.id, &key))?;
                    let group = state.arrive_second(op.tid).ok_or_else(|| {
                        AnalysisError::protocol(
                            op.id,
                            format!(
                                "thread {} reached the second phase of barrier={} without a released first phase",
                                op.tid, key
                            ),
                        )
                    })?;
                    edges.extend(group.into_iter().map(|from| {
                        Edge::new(from, op.id, format!("barrier={}", key), EdgeSource::Barrier)
                    }));
                }
                _ => {}
            }
        }

        Ok(edges)
    }
}

fn uninitialized(id: usize, key: &str) -> AnalysisError {
    AnalysisError::protocol(id, format!("barrier={} used before pthread_barrier_init", key))
}
