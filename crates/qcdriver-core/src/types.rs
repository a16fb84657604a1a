//! Status codes and outcome types shared across the runtime

use serde::{Deserialize, Serialize};
use std::fmt;

/// Return status of a computation entry point (built-in or plugin)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Computation finished normally
    Success,
    /// Computation failed
    Failure,
    /// Computation declined to run for the current options
    Balk,
    /// Computation asked the driver to leave an enclosing loop
    EndLoop,
}

impl Status {
    /// Integer code reported to driver scripts
    pub fn code(self) -> i64 {
        match self {
            Status::Success => 0,
            Status::Failure => 1,
            Status::Balk => 2,
            Status::EndLoop => 3,
        }
    }

    /// Parse a status from its integer code; unknown codes are failures
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Status::Success,
            2 => Status::Balk,
            3 => Status::EndLoop,
            _ => Status::Failure,
        }
    }

    /// Whether the computation succeeded
    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => write!(f, "success"),
            Status::Failure => write!(f, "failure"),
            Status::Balk => write!(f, "balk"),
            Status::EndLoop => write!(f, "end-loop"),
        }
    }
}

/// Result of asking the registry to load a plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadStatus {
    /// No plugin is loaded under this name
    NotLoaded,
    /// The plugin was loaded by this call
    Loaded,
    /// A plugin with the same canonical name was already loaded
    AlreadyLoaded,
}

impl LoadStatus {
    /// Integer code reported to driver scripts
    pub fn code(self) -> i64 {
        match self {
            LoadStatus::NotLoaded => 0,
            LoadStatus::Loaded => 1,
            LoadStatus::AlreadyLoaded => 2,
        }
    }
}

/// Outcome of running a built-in module
///
/// Keeps "ran but has no numeric result" apart from "failed".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModuleOutcome {
    /// Module succeeded and published a result key
    Published {
        /// Result key read from the environment
        key: String,
        /// Published value
        value: f64,
    },
    /// Module succeeded without a numeric result
    Completed,
    /// Module reported a non-success status
    Failed(Status),
}

impl ModuleOutcome {
    /// Value handed back to driver scripts: the published result, or `0.0`
    pub fn value_or_zero(&self) -> f64 {
        match self {
            ModuleOutcome::Published { value, .. } => *value,
            ModuleOutcome::Completed | ModuleOutcome::Failed(_) => 0.0,
        }
    }

    /// Whether the module failed
    pub fn is_failure(&self) -> bool {
        matches!(self, ModuleOutcome::Failed(_))
    }
}

/// Lifecycle state of a module name as seen by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleState {
    /// Nothing is known about the name yet
    Unknown,
    /// The module's options are registered in the store
    OptionsRegistered,
    /// The plugin received the shared resources
    Initialized,
    /// The module ran at least once
    Invoked,
    /// The plugin was closed
    Unloaded,
}
