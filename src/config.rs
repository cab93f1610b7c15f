//! Analyzer configuration
//!
//! Settings can come from an `hbgraph.toml` file and are overridden by
//! command-line flags.
//!
//! # Example hbgraph.toml
//!
//! ```toml
//! # log files are named tid-<pid>-<tid>.txt
//! track_pid = true
//! log_extension = "txt"
//!
//! # thread 1 only receives idle notifications
//! excluded_tids = [1]
//!
//! parallel = true
//! ```

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Thread that exists only to receive idle notifications from the recorder
pub const IDLE_THREAD_TID: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// File names carry a process id (`<prefix>-<pid>-<tid>`); when false
    /// they are `<prefix>-<tid>` and every operation gets pid 0
    pub track_pid: bool,

    /// Extension of log files inside the trace directory
    pub log_extension: String,

    /// Threads dropped before dependency extraction
    pub excluded_tids: Vec<u32>,

    /// Parse files and run extractors on worker threads
    pub parallel: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            track_pid: true,
            log_extension: "txt".to_string(),
            excluded_tids: vec![IDLE_THREAD_TID],
            parallel: true,
        }
    }
}

impl AnalyzerConfig {
    /// Load a configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Load a configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| AnalysisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_extension.is_empty() {
            return Err(AnalysisError::Config(
                "log_extension must not be empty".to_string(),
            ));
        }
        if self.log_extension.contains(['.', '/']) {
            return Err(AnalysisError::Config(format!(
                "log_extension must be a bare extension, got '{}'",
                self.log_extension
            )));
        }
        Ok(())
    }

    pub fn excluded_set(&self) -> HashSet<u32> {
        self.excluded_tids.iter().copied().collect()
    }
}
