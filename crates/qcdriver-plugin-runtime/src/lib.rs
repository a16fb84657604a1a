//! # qcdriver Plugin Runtime
//!
//! Loading and lifecycle management for computation plugins.
//!
//! ## Features
//!
//! - **Plugin Registry**: one record per canonical plugin name
//! - **Lifecycle Management**: load, register options, init, invoke, close
//! - **Dynamic Loading**: shared libraries resolved through `libloading`,
//!   isolated behind the [`PluginLoader`] trait
//!
//! ## Example
//!
//! ```rust,no_run
//! use qcdriver_plugin_runtime::*;
//! use qcdriver_plugin_api::ProcessResources;
//! use qcdriver_options::Environment;
//!
//! # fn example() -> Result<()> {
//! let mut registry = PluginRegistry::new();
//! let mut env = Environment::new();
//! let resources = ProcessResources::local("/tmp", "qcdriver");
//!
//! registry.load("plugins/libmp2.so")?;
//! let status = registry.invoke("plugins/libmp2.so", &mut env, &resources)?;
//! println!("plugin returned {status}");
//!
//! registry.close_all();
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod error;
#[allow(unsafe_code)]
pub mod loader;
pub mod registry;

#[cfg(feature = "testing")]
pub mod testing;

pub use error::{PluginRuntimeError, Result};
pub use loader::{DynamicLoader, DynamicPlugin, PluginLoader};
pub use registry::{canonical_name, PluginRecord, PluginRegistry};

/// Prelude module with commonly used types
pub mod prelude {
    pub use crate::error::{PluginRuntimeError, Result};
    pub use crate::loader::{DynamicLoader, PluginLoader};
    pub use crate::registry::{canonical_name, PluginRecord, PluginRegistry};
    pub use qcdriver_plugin_api::prelude::*;
}
