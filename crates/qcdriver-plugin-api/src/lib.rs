//! # qcdriver Plugin API
//!
//! SDK for writing computation modules that the qcdriver runtime loads from
//! shared libraries at run time.
//!
//! A plugin provides four capabilities:
//!
//! - **read_options**: declare its configuration keys and defaults
//! - **init**: receive the shared process resources before each invocation
//! - **invoke**: run against the current environment and return a [`Status`]
//! - **close**: release its resources when unloaded
//!
//! ## Example
//!
//! ```rust,ignore
//! use qcdriver_plugin_api::prelude::*;
//!
//! fn read_options(name: &str, options: &mut Options) -> Status {
//!     options.set_current_module(name);
//!     options.add_int("MAXITER", 50);
//!     Status::Success
//! }
//!
//! fn init(_resources: &SharedResources<'_>) {}
//!
//! fn invoke(env: &mut Environment) -> Status {
//!     env.set_variable("CURRENT ENERGY", -1.0);
//!     Status::Success
//! }
//!
//! fn close() {}
//!
//! qcdriver_plugin_api::declare_plugin! {
//!     read_options: read_options,
//!     init: init,
//!     invoke: invoke,
//!     close: close,
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod abi;
pub mod capabilities;
pub mod export;
pub mod resources;

#[cfg(feature = "testing")]
pub mod testing;

pub use abi::{AbiVersionFn, CloseFn, InitPluginFn, InvokeFn, ReadOptionsFn, ABI_VERSION};
pub use capabilities::{CapabilityTable, PluginCapabilities};
pub use resources::{CheckpointBackend, Communicator, IoBackend, ProcessResources, SharedResources};

pub use qcdriver_core::Status;
pub use qcdriver_options::{Data, Environment, OptionValue, Options};

/// Prelude module with commonly used types
pub mod prelude {
    pub use crate::capabilities::{CapabilityTable, PluginCapabilities};
    pub use crate::resources::{
        CheckpointBackend, Communicator, IoBackend, ProcessResources, SharedResources,
    };
    pub use qcdriver_core::Status;
    pub use qcdriver_options::{Data, Environment, OptionValue, Options};
}
