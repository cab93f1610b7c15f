//! CLI argument parsing for hbgraph

use crate::config::AnalyzerConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the dependency graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Schedule-printer text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "hbgraph")]
#[command(version)]
#[command(
    about = "Reconstruct the happens-before graph of a recorded multithreaded execution",
    long_about = None
)]
pub struct Cli {
    /// Directory holding one log file per recorded thread
    #[arg(value_name = "TRACE_DIR", default_value = "out")]
    pub trace_dir: PathBuf,

    /// Log file names carry no process id (<prefix>-<tid>.txt)
    #[arg(long = "nopid")]
    pub nopid: bool,

    /// Drop all operations of this thread before extraction (repeatable)
    #[arg(long = "exclude-tid", value_name = "TID")]
    pub exclude_tid: Vec<u32>,

    /// Keep the idle-notification thread (tid 1) in the graph
    #[arg(long = "keep-idle-thread")]
    pub keep_idle_thread: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write the graph to FILE instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Parse files and run extractors on a single thread
    #[arg(long = "sequential")]
    pub sequential: bool,

    /// Print per-extractor edge counts to stderr
    #[arg(long = "summary")]
    pub summary: bool,

    /// Load analyzer settings from a TOML file
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report progress on stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Enable trace-level diagnostics on stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Apply command-line overrides on top of a base configuration
    pub fn apply(&self, mut config: AnalyzerConfig) -> AnalyzerConfig {
        if self.nopid {
            config.track_pid = false;
        }
        if self.keep_idle_thread {
            config
                .excluded_tids
                .retain(|&tid| tid != crate::config::IDLE_THREAD_TID);
        }
        for &tid in &self.exclude_tid {
            if !config.excluded_tids.contains(&tid) {
                config.excluded_tids.push(tid);
            }
        }
        if self.sequential {
            config.parallel = false;
        }
        config
    }
}
