//! hbgraph - happens-before graph reconstruction for recorded executions
//!
//! A record/replay layer writes one log per thread while a multithreaded
//! (possibly multi-process) program runs. Every intercepted operation gets a
//! globally unique turn number. This library merges those logs into a single
//! turn-ordered trace, normalizes each operation to a closed vocabulary, and
//! infers happens-before edges from mutexes, barriers, thread lifecycles and
//! byte streams. The resulting graph is emitted as text or JSON.

pub mod assembler;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod graph;
pub mod json_output;
pub mod log_reader;
pub mod normalizer;
pub mod operation;
pub mod pipeline;
pub mod text_output;

pub use config::AnalyzerConfig;
pub use error::{AnalysisError, Result};
pub use graph::DependencyGraph;
pub use pipeline::analyze_dir;
