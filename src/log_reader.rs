//! Per-thread log file parsing
//!
//! A log file is a whitespace-separated table. The first line names the
//! columns; the last column is always `args`, a free-text tail that receives
//! every remaining token of the line joined by single spaces.
//!
//! ```text
//! op turn args
//! pthread_mutex_lock 12 0x601040
//! pthread_mutex_unlock 15 0x601040
//! tern_idle 16
//! ```
//!
//! Lines with fewer than `columns - 1` tokens, blank lines included, are
//! skipped with a warning.
//! When the file name carries a process/thread context, missing `pid`/`tid`
//! columns are filled in from it and present ones must agree with it.

use crate::error::{AnalysisError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Name of the mandatory free-text tail column
pub const TAIL_COLUMN: &str = "args";

/// Process/thread identity derived from a log file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogContext {
    pub pid: u32,
    pub tid: u32,
}

fn pid_tid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^.*-(\d+)-(\d+)(\.[^.]*)?$").expect("static pattern is valid")
    })
}

fn tid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^.*-(\d+)(\.[^.]*)?$").expect("static pattern is valid"))
}

impl LogContext {
    /// Derive the context from `<prefix>-<pid>-<tid>.txt`, or from
    /// `<prefix>-<tid>.txt` with pid 0 when `track_pid` is false
    pub fn from_file_name(name: &str, track_pid: bool) -> Result<Self> {
        let bad_name = || AnalysisError::BadFileName {
            name: name.to_string(),
        };

        if track_pid {
            let caps = pid_tid_pattern().captures(name).ok_or_else(bad_name)?;
            Ok(Self {
                pid: caps[1].parse().map_err(|_| bad_name())?,
                tid: caps[2].parse().map_err(|_| bad_name())?,
            })
        } else {
            let caps = tid_pattern().captures(name).ok_or_else(bad_name)?;
            Ok(Self {
                pid: 0,
                tid: caps[1].parse().map_err(|_| bad_name())?,
            })
        }
    }
}

/// One parsed log line: column name → value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Log file the line came from, shared by every record of the file
    pub source: Option<Arc<Path>>,
    /// 1-based line number in the source file
    pub line: usize,
    fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn new(line: usize, fields: HashMap<String, String>) -> Self {
        Self {
            source: None,
            line,
            fields,
        }
    }

    pub fn with_source(mut self, source: Arc<Path>) -> Self {
        self.source = Some(source);
        self
    }

    /// Where the record came from, for error reports
    pub fn location(&self) -> String {
        match &self.source {
            Some(path) => format!("line {} of {}", self.line, path.display()),
            None => format!("line {}", self.line),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Value of a column that must be present
    pub fn require(&self, column: &str) -> Result<&str> {
        self.get(column).ok_or_else(|| AnalysisError::MissingField {
            location: self.location(),
            field: column.to_string(),
        })
    }

    /// Decimal integer value of a column that must be present
    pub fn require_number<T: std::str::FromStr>(&self, column: &str) -> Result<T> {
        let value = self.require(column)?;
        value.parse().map_err(|_| AnalysisError::BadNumber {
            location: self.location(),
            field: column.to_string(),
            value: value.to_string(),
        })
    }
}

/// Parse the text of one log file
///
/// `source` only names the file in diagnostics and errors.
pub fn parse_log(text: &str, source: &Path, context: Option<LogContext>) -> Result<Vec<RawRecord>> {
    let mut lines = text.lines();
    let columns: Vec<&str> = lines
        .next()
        .map(|header| header.split_whitespace().collect())
        .unwrap_or_default();

    let Some(&tail) = columns.last() else {
        return Err(AnalysisError::MissingHeader {
            path: source.to_path_buf(),
        });
    };
    if tail != TAIL_COLUMN {
        return Err(AnalysisError::BadTailColumn {
            path: source.to_path_buf(),
            found: tail.to_string(),
        });
    }
    let fixed = columns.len() - 1;
    let shared: Arc<Path> = Arc::from(source);

    let mut records = Vec::new();
    for (index, line) in lines.enumerate() {
        let line_no = index + 2;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() || tokens.len() < fixed {
            tracing::warn!(
                "token number inconsistent, line {} of {}: {}",
                line_no,
                source.display(),
                line
            );
            continue;
        }

        let mut fields: HashMap<String, String> = columns[..fixed]
            .iter()
            .zip(&tokens)
            .map(|(column, value)| (column.to_string(), value.to_string()))
            .collect();
        fields.insert(TAIL_COLUMN.to_string(), tokens[fixed..].join(" "));

        if let Some(ctx) = context {
            inject_context(&mut fields, "pid", ctx.pid, source, line_no)?;
            inject_context(&mut fields, "tid", ctx.tid, source, line_no)?;
        }

        records.push(RawRecord::new(line_no, fields).with_source(Arc::clone(&shared)));
    }

    Ok(records)
}

fn inject_context(
    fields: &mut HashMap<String, String>,
    field: &'static str,
    expected: u32,
    source: &Path,
    line: usize,
) -> Result<()> {
    match fields.get(field) {
        None => {
            fields.insert(field.to_string(), expected.to_string());
            Ok(())
        }
        Some(found) if *found == expected.to_string() => Ok(()),
        Some(found) => Err(AnalysisError::ContextMismatch {
            path: source.to_path_buf(),
            line,
            field,
            expected: expected.to_string(),
            found: found.clone(),
        }),
    }
}

/// Read and parse one log file
///
/// The file is read in full and closed before parsing begins.
pub fn read_log_file(path: &Path, context: Option<LogContext>) -> Result<Vec<RawRecord>> {
    let text = fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
    let records = parse_log(&text, path, context)?;
    tracing::debug!("{}: {} records", path.display(), records.len());
    Ok(records)
}
