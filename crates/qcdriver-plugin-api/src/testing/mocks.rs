//! Mock implementations for testing

use crate::capabilities::PluginCapabilities;
use crate::resources::SharedResources;
use parking_lot::Mutex;
use qcdriver_core::Status;
use qcdriver_options::{Data, Environment, Options};
use std::sync::Arc;

/// A capability call recorded by [`MockPlugin`]
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// `read_options` with the name it was given
    ReadOptions(String),
    /// `init` with the thread count seen in the environment snapshot
    Init {
        /// Thread count at init time
        n_threads: usize,
    },
    /// `invoke`
    Invoke,
    /// `close`
    Close,
}

/// Mock plugin that records every capability call
///
/// Clones share the call log, so a test can keep one handle while the
/// registry owns another.
#[derive(Debug, Clone)]
pub struct MockPlugin {
    options: Vec<(String, Data)>,
    publishes: Option<(String, f64)>,
    status: Status,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockPlugin {
    /// Create a mock that declares nothing and succeeds
    pub fn new() -> Self {
        Self {
            options: Vec::new(),
            publishes: None,
            status: Status::Success,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Declare `key` when `read_options` is called
    pub fn with_option(mut self, key: impl Into<String>, data: Data) -> Self {
        self.options.push((key.into(), data));
        self
    }

    /// Publish `key = value` on every successful invocation
    pub fn publishing(mut self, key: impl Into<String>, value: f64) -> Self {
        self.publishes = Some((key.into(), value));
        self
    }

    /// Return `status` from `invoke`
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Every call recorded so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Number of recorded calls matching `predicate`
    pub fn count(&self, predicate: impl Fn(&MockCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    /// Number of `init` calls
    pub fn init_call_count(&self) -> usize {
        self.count(|call| matches!(call, MockCall::Init { .. }))
    }

    /// Number of `invoke` calls
    pub fn invoke_call_count(&self) -> usize {
        self.count(|call| matches!(call, MockCall::Invoke))
    }

    /// Number of `close` calls
    pub fn close_call_count(&self) -> usize {
        self.count(|call| matches!(call, MockCall::Close))
    }

    /// Number of `read_options` calls
    pub fn read_options_call_count(&self) -> usize {
        self.count(|call| matches!(call, MockCall::ReadOptions(_)))
    }
}

impl Default for MockPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginCapabilities for MockPlugin {
    fn read_options(&self, name: &str, options: &mut Options) -> Status {
        self.calls.lock().push(MockCall::ReadOptions(name.to_string()));
        for (key, data) in &self.options {
            options.declare(key, data.clone());
        }
        Status::Success
    }

    fn init(&self, resources: &SharedResources<'_>) {
        self.calls.lock().push(MockCall::Init {
            n_threads: resources.environment.n_threads(),
        });
    }

    fn invoke(&self, environment: &mut Environment) -> Status {
        self.calls.lock().push(MockCall::Invoke);
        if self.status.is_success() {
            if let Some((key, value)) = &self.publishes {
                environment.set_variable(key, *value);
            }
        }
        self.status
    }

    fn close(&mut self) {
        self.calls.lock().push(MockCall::Close);
    }
}
