//! # qcdriver Scripting
//!
//! Driver scripts written in Rhai. The engine exposes the orchestrator
//! façade as script functions:
//!
//! - **Plugins**: `plugin_load`, `plugin`, `plugin_close`, `plugin_close_all`, `plugin_status`
//! - **Options**: `set_option`, `set_global_option`, `get_option`, `get_global_option`,
//!   `set_default_options_for_module`, `print_options`, `print_global_options`
//! - **Results**: `get_variable`, `set_variable`
//! - **Environment**: `set_memory`, `get_memory`, `set_n_threads`, `get_n_threads`,
//!   `print_out`, `version`
//! - **Modules**: `call_module(name)` and one function per built-in (`clean()`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use qcdriver_runtime::Orchestrator;
//! use qcdriver_scripting::ScriptEngine;
//!
//! # fn example() -> qcdriver_scripting::Result<()> {
//! let engine = ScriptEngine::new(Orchestrator::builder().build());
//! let result = engine.run(r#"
//!     set_global_option("REFERENCE", "uhf");
//!     plugin("plugins/libmp2.so");
//!     get_variable("CURRENT ENERGY")
//! "#);
//! engine.finish();
//! println!("energy = {}", result?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod engine;
pub mod error;

pub use engine::ScriptEngine;
pub use error::{Result, ScriptError};

/// Prelude with commonly used types
pub mod prelude {
    pub use crate::engine::ScriptEngine;
    pub use crate::error::{Result, ScriptError};
}
