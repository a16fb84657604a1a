//! # qcdriver Core
//!
//! Core types and error handling shared by every qcdriver crate:
//! - Error taxonomy ([`Error`], [`Result`])
//! - Module return status ([`Status`])
//! - Plugin load status codes ([`LoadStatus`])
//! - Built-in module outcomes and lifecycle states

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{LoadStatus, ModuleOutcome, ModuleState, Status};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{LoadStatus, ModuleOutcome, ModuleState, Status};
}
