//! # qcdriver Runtime
//!
//! Module dispatch and orchestration:
//! - Immutable dispatch table of built-in modules
//! - Plugin lifecycle driven through an owned registry
//! - The façade a driver script calls (options, results, modules, plugins)

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod builtins;
pub mod dispatch;
pub mod orchestrator;

pub use builtins::{register_driver_options, Clean};
pub use dispatch::{BuiltinModule, DispatchTable, DispatchTableBuilder, FnModule};
pub use orchestrator::{Orchestrator, OrchestratorBuilder, OUTPUT_TARGET};

/// Orchestrator loading plugins from shared libraries
pub type DynamicOrchestrator = Orchestrator<qcdriver_plugin_runtime::DynamicLoader>;

/// Runtime version reported to driver scripts
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::dispatch::{BuiltinModule, DispatchTable, FnModule};
    pub use crate::orchestrator::{Orchestrator, OrchestratorBuilder};
    pub use qcdriver_core::{Error, LoadStatus, ModuleOutcome, ModuleState, Result, Status};
    pub use qcdriver_options::{Environment, OptionValue, Options};
    pub use qcdriver_plugin_api::ProcessResources;
}
