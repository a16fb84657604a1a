//! Process environment shared by every module

use crate::options::Options;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Default memory budget (500 MiB)
pub const DEFAULT_MEMORY: u64 = 524_288_000;

/// Shared configuration and results for one driver run
#[derive(Debug, Clone)]
pub struct Environment {
    options: Options,
    results: BTreeMap<String, f64>,
    memory: u64,
    n_threads: usize,
}

/// Serializable view of the published results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsSnapshot {
    /// Result keys and values
    pub variables: BTreeMap<String, f64>,
}

impl Environment {
    /// Create an environment with default budgets and an empty store
    pub fn new() -> Self {
        Self {
            options: Options::new(),
            results: BTreeMap::new(),
            memory: DEFAULT_MEMORY,
            n_threads: 1,
        }
    }

    /// The option store
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Mutable access to the option store
    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// Publish a named scalar result; keys are case-insensitive
    pub fn set_variable(&mut self, key: &str, value: f64) {
        self.results.insert(key.trim().to_uppercase(), value);
    }

    /// Look up a published result; keys are case-insensitive
    pub fn variable(&self, key: &str) -> Option<f64> {
        self.results.get(&key.trim().to_uppercase()).copied()
    }

    /// Whether a result key has been published
    pub fn has_variable(&self, key: &str) -> bool {
        self.variable(key).is_some()
    }

    /// Remove every published result
    pub fn clear_variables(&mut self) {
        self.results.clear();
    }

    /// Copy of the published results
    pub fn snapshot(&self) -> ResultsSnapshot {
        ResultsSnapshot {
            variables: self.results.clone(),
        }
    }

    /// Memory budget in bytes
    pub fn memory(&self) -> u64 {
        self.memory
    }

    /// Set the memory budget in bytes
    pub fn set_memory(&mut self, bytes: u64) {
        self.memory = bytes;
        let (amount, unit) = if bytes > 1_000_000_000 {
            (bytes as f64 / 1.0e9, "GiB")
        } else {
            (bytes as f64 / 1.0e6, "MiB")
        };
        info!("Memory set to {amount:7.3} {unit}");
    }

    /// Thread count handed to computation modules
    pub fn n_threads(&self) -> usize {
        self.n_threads
    }

    /// Set the thread count; zero is raised to one
    pub fn set_n_threads(&mut self, n_threads: usize) {
        self.n_threads = n_threads.max(1);
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
