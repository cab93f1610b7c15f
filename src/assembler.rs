//! Global ordering of per-thread records
//!
//! All per-file record sequences are concatenated and sorted by their
//! recorded sequence number (`turn`). The sequence numbers must be unique
//! across the whole trace; a duplicate means the file set is corrupt and
//! the run is aborted. After sorting every record receives a dense 0-based
//! id equal to its position.

use crate::error::{AnalysisError, Result};
use crate::log_reader::{RawRecord, TAIL_COLUMN};

/// A record in the global order, before its name is normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub id: usize,
    pub pid: u32,
    pub tid: u32,
    pub turn: u64,
    /// Raw operation name as recorded
    pub name: String,
    pub args: String,
    pub info: Option<String>,
}

impl TraceRecord {
    /// Extract the typed fields of a raw record
    ///
    /// The id is left at 0 until the record is placed in the global order.
    pub fn from_raw(raw: &RawRecord) -> Result<Self> {
        Ok(Self {
            id: 0,
            pid: raw.require_number("pid")?,
            tid: raw.require_number("tid")?,
            turn: raw.require_number("turn")?,
            name: raw.require("op")?.to_string(),
            args: raw.get(TAIL_COLUMN).unwrap_or_default().to_string(),
            info: raw
                .get("info")
                .filter(|info| !info.is_empty())
                .map(str::to_string),
        })
    }
}

/// Merge raw records from every log file into one globally ordered trace
pub fn assemble<I>(raw: I) -> Result<Vec<TraceRecord>>
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut records = raw
        .into_iter()
        .map(|record| TraceRecord::from_raw(&record))
        .collect::<Result<Vec<_>>>()?;

    records.sort_by_key(|record| record.turn);

    if let Some(pair) = records.windows(2).find(|pair| pair[0].turn == pair[1].turn) {
        return Err(AnalysisError::DuplicateTurn { turn: pair[0].turn });
    }

    for (id, record) in records.iter_mut().enumerate() {
        record.id = id;
    }

    tracing::info!("assembled {} operations", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn raw(turn: &str, tid: &str, op: &str, args: &str) -> RawRecord {
        let fields: HashMap<String, String> = [
            ("pid", "0"),
            ("tid", tid),
            ("turn", turn),
            ("op", op),
            ("args", args),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        RawRecord::new(2, fields)
    }

    #[test]
    fn test_assemble_sorts_numerically_and_assigns_ids() {
        let records = assemble(vec![
            raw("10", "1", "a", ""),
            raw("9", "2", "b", ""),
            raw("100", "1", "c", ""),
        ])
        .unwrap();

        let turns: Vec<u64> = records.iter().map(|r| r.turn).collect();
        assert_eq!(turns, vec![9, 10, 100]);
        let ids: Vec<usize> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(records[0].name, "b");
    }

    #[test]
    fn test_assemble_rejects_duplicate_turn() {
        let err = assemble(vec![raw("3", "1", "a", ""), raw("3", "2", "b", "")]).unwrap_err();
        assert!(matches!(err, AnalysisError::DuplicateTurn { turn: 3 }));
    }

    #[test]
    fn test_assemble_requires_numeric_turn() {
        let err = assemble(vec![raw("x", "1", "a", "")]).unwrap_err();
        assert!(matches!(err, AnalysisError::BadNumber { .. }));
    }

    #[test]
    fn test_assemble_empty_trace() {
        let records = assemble(Vec::new()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_from_raw_reads_optional_info() {
        let mut record = raw("1", "1", "a", "x y");
        let mut fields: HashMap<String, String> = HashMap::new();
        for key in ["pid", "tid", "turn", "op", "args"] {
            fields.insert(key.to_string(), record.get(key).unwrap().to_string());
        }
        fields.insert("info".to_string(), "main.c:12".to_string());
        record = RawRecord::new(2, fields);

        let parsed = TraceRecord::from_raw(&record).unwrap();
        assert_eq!(parsed.args, "x y");
        assert_eq!(parsed.info.as_deref(), Some("main.c:12"));
    }
}
