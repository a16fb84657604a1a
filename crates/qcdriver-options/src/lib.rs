//! # qcdriver Options
//!
//! The process-wide configuration and results store shared by every
//! computation module:
//! - Typed option declarations (string, boolean, integer, double, array)
//! - Global and per-module local scopes with change tracking
//! - Case-insensitive scalar results published by modules
//! - Memory and thread budgets

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod data;
pub mod environment;
pub mod options;
pub mod value;

pub use data::Data;
pub use environment::{Environment, ResultsSnapshot, DEFAULT_MEMORY};
pub use options::Options;
pub use value::{OptionKind, OptionValue};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::data::Data;
    pub use crate::environment::Environment;
    pub use crate::options::Options;
    pub use crate::value::{OptionKind, OptionValue};
}
