//! Testing utilities for plugin and runtime developers
//!
//! This module provides a recording mock plugin so registry and
//! orchestrator behavior can be tested without building a shared library.

pub mod mocks;

pub use mocks::{MockCall, MockPlugin};
