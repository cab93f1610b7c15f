//! End-to-end analysis of a trace directory
//!
//! ```text
//! trace dir ──► read_trace_dir ──► assemble ──► normalize ──► exclude_threads
//!                (per file)        (turn sort)   (vocabulary)  (re-densify ids)
//!                                                                   │
//!                        DependencyGraph ◄── extract_all ◄──────────┘
//! ```
//!
//! Nothing is written anywhere: callers receive the finished graph, or the
//! first fatal error, and decide how to emit it.

use crate::assembler::assemble;
use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, Result};
use crate::extract::extract_all;
use crate::graph::DependencyGraph;
use crate::log_reader::{read_log_file, LogContext, RawRecord};
use crate::normalizer::{exclude_threads, normalize};
use std::fs;
use std::path::{Path, PathBuf};

/// List the log files of a trace directory, sorted by name
pub fn discover_log_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| AnalysisError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AnalysisError::io(dir, e))?;
        let path = entry.path();
        let is_log = path.extension().is_some_and(|ext| ext == extension);
        if is_log && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(AnalysisError::EmptyTrace {
            dir: dir.to_path_buf(),
        });
    }
    tracing::info!("found {} log files in {}", files.len(), dir.display());
    Ok(files)
}

fn read_one(path: &Path, track_pid: bool) -> Result<Vec<RawRecord>> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let context = LogContext::from_file_name(&name, track_pid)?;
    read_log_file(path, Some(context))
}

/// Parse every log file of a trace directory
///
/// Records come back grouped by file in name order. With `config.parallel`
/// the files are split across scoped worker threads.
pub fn read_trace_dir(dir: &Path, config: &AnalyzerConfig) -> Result<Vec<RawRecord>> {
    let files = discover_log_files(dir, &config.log_extension)?;

    let per_file: Vec<Result<Vec<RawRecord>>> = if config.parallel && files.len() > 1 {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(files.len());
        let chunk_size = files.len().div_ceil(workers);

        crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = files
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move |_| {
                        chunk
                            .iter()
                            .map(|path| read_one(path, config.track_pid))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
    } else {
        files
            .iter()
            .map(|path| read_one(path, config.track_pid))
            .collect()
    };

    let mut records = Vec::new();
    for result in per_file {
        records.extend(result?);
    }
    Ok(records)
}

/// Analyze already-parsed records
pub fn analyze_records(records: Vec<RawRecord>, config: &AnalyzerConfig) -> Result<DependencyGraph> {
    let trace = assemble(records)?;
    let normalized = normalize(trace)?;
    let operations = exclude_threads(normalized.operations, &config.excluded_set());
    let edges = extract_all(&operations, config.parallel)?;
    Ok(DependencyGraph::new(operations, edges))
}

/// Analyze a closed trace directory
pub fn analyze_dir(dir: &Path, config: &AnalyzerConfig) -> Result<DependencyGraph> {
    config.validate()?;
    let records = read_trace_dir(dir, config)?;
    analyze_records(records, config)
}
