//! Error taxonomy for trace analysis
//!
//! Only fatal conditions are represented here. Recoverable conditions
//! (a malformed log line, an unrecognized operation name) are reported
//! through `tracing` at the point where they occur and never become errors.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort an analysis run
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No log files found in trace directory {}", dir.display())]
    EmptyTrace { dir: PathBuf },

    #[error("Log file name does not follow the <prefix>-[<pid>-]<tid> convention: {name}")]
    BadFileName { name: String },

    #[error("Log file {} has no header line", path.display())]
    MissingHeader { path: PathBuf },

    #[error("Log file {} header must end with the 'args' column, found '{found}'", path.display())]
    BadTailColumn { path: PathBuf, found: String },

    #[error(
        "{} line {line}: {field} column is {found} but the file name says {expected}",
        path.display()
    )]
    ContextMismatch {
        path: PathBuf,
        line: usize,
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("Record at {location} is missing required field '{field}'")]
    MissingField { location: String, field: String },

    #[error("Field '{field}' at {location} is not a valid number: '{value}'")]
    BadNumber {
        location: String,
        field: String,
        value: String,
    },

    #[error("Duplicate sequence number {turn} in assembled trace")]
    DuplicateTurn { turn: u64 },

    #[error("Operation {id} ({kind}) has malformed arguments: '{args}'")]
    MalformedArgs {
        id: usize,
        kind: &'static str,
        args: String,
    },

    #[error("Protocol violation at operation {id}: {reason}")]
    Protocol { id: usize, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for trace analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl AnalysisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn protocol(id: usize, reason: impl Into<String>) -> Self {
        Self::Protocol {
            id,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_turn_message() {
        let err = AnalysisError::DuplicateTurn { turn: 42 };
        assert_eq!(
            err.to_string(),
            "Duplicate sequence number 42 in assembled trace"
        );
    }

    #[test]
    fn test_protocol_message_names_operation() {
        let err = AnalysisError::protocol(7, "barrier=0_b has no pending predecessors");
        let msg = err.to_string();
        assert!(msg.contains("operation 7"));
        assert!(msg.contains("barrier=0_b"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = AnalysisError::io("/tmp/trace/tid-0-1.txt", io);
        assert!(err.to_string().contains("tid-0-1.txt"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
