//! Operation name normalization and thread exclusion

use crate::assembler::TraceRecord;
use crate::error::Result;
use crate::operation::{Op, OpKind, Operation};
use std::collections::{BTreeSet, HashSet};

/// Normalized trace plus the distinct raw names that were not recognized
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub operations: Vec<Operation>,
    pub unrecognized: BTreeSet<String>,
}

/// Map every record onto the canonical vocabulary and decode its arguments
///
/// Unrecognized names become [`Op::Opaque`] and are reported once, as a
/// summary, after the whole trace has been processed.
pub fn normalize(records: Vec<TraceRecord>) -> Result<Normalized> {
    let mut unrecognized = BTreeSet::new();
    let mut operations = Vec::with_capacity(records.len());

    for record in records {
        let op = match OpKind::from_raw_name(&record.name) {
            Some(kind) => Op::decode(kind, &record.args, record.id)?,
            None => {
                unrecognized.insert(record.name.clone());
                Op::Opaque { name: record.name }
            }
        };

        operations.push(Operation {
            id: record.id,
            pid: record.pid,
            tid: record.tid,
            turn: record.turn,
            op,
            args: record.args,
            info: record.info,
        });
    }

    if !unrecognized.is_empty() {
        let names: Vec<&str> = unrecognized.iter().map(String::as_str).collect();
        tracing::warn!(
            "{} unhandled opname(s): {}",
            unrecognized.len(),
            names.join(", ")
        );
    }

    Ok(Normalized {
        operations,
        unrecognized,
    })
}

/// Drop every operation of the excluded threads and re-densify ids
pub fn exclude_threads(operations: Vec<Operation>, excluded: &HashSet<u32>) -> Vec<Operation> {
    if excluded.is_empty() {
        return operations;
    }

    let before = operations.len();
    let kept: Vec<Operation> = operations
        .into_iter()
        .filter(|op| !excluded.contains(&op.tid))
        .enumerate()
        .map(|(id, op)| Operation { id, ..op })
        .collect();

    tracing::info!(
        "excluded {} operations from threads {:?}",
        before - kept.len(),
        excluded
    );
    kept
}
