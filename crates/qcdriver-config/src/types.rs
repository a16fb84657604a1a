//! Configuration types

use qcdriver_options::{OptionValue, DEFAULT_MEMORY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Driver configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverConfig {
    /// Memory budget in bytes
    #[serde(default = "default_memory")]
    pub memory: u64,

    /// Threads handed to computation modules
    #[serde(default = "default_n_threads")]
    pub n_threads: usize,

    /// Scratch directory
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Prefix of every scratch file
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Checkpoint file (default: `<scratch_dir>/<namespace>.chk`)
    #[serde(default)]
    pub checkpoint: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Plugins loaded before the script runs
    #[serde(default)]
    pub plugins: Vec<PathBuf>,

    /// Global option overrides applied before the script runs
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
}

impl DriverConfig {
    /// Checkpoint path, falling back to the scratch directory
    pub fn checkpoint_path(&self) -> PathBuf {
        self.checkpoint.clone().unwrap_or_else(|| {
            self.scratch_dir.join(format!("{}.chk", self.namespace))
        })
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            memory: default_memory(),
            n_threads: default_n_threads(),
            scratch_dir: default_scratch_dir(),
            namespace: default_namespace(),
            checkpoint: None,
            log_level: default_log_level(),
            plugins: Vec::new(),
            options: BTreeMap::new(),
        }
    }
}

fn default_memory() -> u64 {
    DEFAULT_MEMORY
}

fn default_n_threads() -> usize {
    1
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_namespace() -> String {
    "qcdriver".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
