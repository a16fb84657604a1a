//! Dispatch table of built-in computation modules
//!
//! The table is assembled once through [`DispatchTableBuilder`] and is
//! immutable afterwards. Lookups match the registered name exactly; unlike
//! plugin names, built-in names are not case-normalized.

use qcdriver_core::{Error, Result, Status};
use qcdriver_options::{Environment, Options};
use qcdriver_plugin_api::ProcessResources;
use std::collections::BTreeMap;
use std::fmt;

/// A computation entry point compiled into the runtime
pub trait BuiltinModule: Send + Sync + fmt::Debug {
    /// Name the module is dispatched under
    fn name(&self) -> &str;

    /// Result key published on success, `None` for status-only modules
    fn result_key(&self) -> Option<&str> {
        None
    }

    /// Declare the module's options
    ///
    /// Called with the store in global declaration mode.
    fn register_options(&self, _options: &mut Options) {}

    /// Run the module against the shared store
    fn run(&self, environment: &mut Environment, resources: &ProcessResources) -> Status;
}

type RunFn = dyn Fn(&mut Environment, &ProcessResources) -> Status + Send + Sync;
type RegisterFn = dyn Fn(&mut Options) + Send + Sync;

/// Built-in module assembled from closures
pub struct FnModule {
    name: String,
    result_key: Option<String>,
    register: Box<RegisterFn>,
    run: Box<RunFn>,
}

impl FnModule {
    /// Module `name` running `run`, with no options and no result key
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut Environment, &ProcessResources) -> Status + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            result_key: None,
            register: Box::new(|_| {}),
            run: Box::new(run),
        }
    }

    /// Publish `key` on success
    pub fn publishes(mut self, key: impl Into<String>) -> Self {
        self.result_key = Some(key.into());
        self
    }

    /// Declare options with `register`
    pub fn with_options<F>(mut self, register: F) -> Self
    where
        F: Fn(&mut Options) + Send + Sync + 'static,
    {
        self.register = Box::new(register);
        self
    }
}

impl fmt::Debug for FnModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnModule")
            .field("name", &self.name)
            .field("result_key", &self.result_key)
            .finish_non_exhaustive()
    }
}

impl BuiltinModule for FnModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn result_key(&self) -> Option<&str> {
        self.result_key.as_deref()
    }

    fn register_options(&self, options: &mut Options) {
        (self.register)(options)
    }

    fn run(&self, environment: &mut Environment, resources: &ProcessResources) -> Status {
        (self.run)(environment, resources)
    }
}

/// Immutable mapping from module name to built-in entry point
#[derive(Debug, Default)]
pub struct DispatchTable {
    modules: BTreeMap<String, Box<dyn BuiltinModule>>,
}

impl DispatchTable {
    /// Create a new dispatch table builder
    pub fn builder() -> DispatchTableBuilder {
        DispatchTableBuilder::new()
    }

    /// Table holding only the modules shipped with the runtime
    pub fn standard() -> Self {
        Self::builder().with_standard_modules().build_unchecked()
    }

    /// Module registered under exactly `name`
    pub fn get(&self, name: &str) -> Option<&dyn BuiltinModule> {
        self.modules.get(name).map(|module| module.as_ref())
    }

    /// Whether a module is registered under exactly `name`
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Every registered module, sorted by name
    pub fn modules(&self) -> impl Iterator<Item = &dyn BuiltinModule> {
        self.modules.values().map(|module| module.as_ref())
    }

    /// Number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Builder for [`DispatchTable`]
#[derive(Debug, Default)]
pub struct DispatchTableBuilder {
    modules: Vec<Box<dyn BuiltinModule>>,
}

impl DispatchTableBuilder {
    /// Create a new, empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module
    pub fn module(mut self, module: impl BuiltinModule + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    /// Add the modules shipped with the runtime
    pub fn with_standard_modules(self) -> Self {
        self.module(crate::builtins::Clean)
    }

    /// Build the table, rejecting empty and duplicate names
    pub fn build(self) -> Result<DispatchTable> {
        let mut modules = BTreeMap::new();
        for module in self.modules {
            let name = module.name().to_string();
            if name.is_empty() {
                return Err(Error::Config("built-in module name is empty".to_string()));
            }
            if modules.contains_key(&name) {
                return Err(Error::Config(format!(
                    "built-in module '{name}' registered twice"
                )));
            }
            modules.insert(name, module);
        }
        Ok(DispatchTable { modules })
    }

    // Later registrations win; only used for the fixed standard set.
    fn build_unchecked(self) -> DispatchTable {
        let modules = self
            .modules
            .into_iter()
            .map(|module| (module.name().to_string(), module))
            .collect();
        DispatchTable { modules }
    }
}
