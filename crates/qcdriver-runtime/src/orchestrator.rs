//! Orchestrator façade
//!
//! Owns the environment, the dispatch table, and the plugin registry, and
//! exposes the entry points a driver script calls. A module name resolves
//! to a built-in through the dispatch table (exact match) or to a plugin
//! through the registry (upper-cased file stem).

use crate::builtins::register_driver_options;
use crate::dispatch::{BuiltinModule, DispatchTable};
use crate::VERSION;
use qcdriver_core::{Error, LoadStatus, ModuleOutcome, ModuleState, Result, Status};
use qcdriver_options::{Environment, OptionValue, Options};
use qcdriver_plugin_api::ProcessResources;
use qcdriver_plugin_runtime::{canonical_name, DynamicLoader, PluginLoader, PluginRegistry};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Log target for text a driver script prints
pub const OUTPUT_TARGET: &str = "qcdriver::output";

/// Driver-facing façade over the option store, built-ins, and plugins
///
/// Every method takes `&mut self`; one call runs at a time.
#[derive(Debug)]
pub struct Orchestrator<L: PluginLoader = DynamicLoader> {
    environment: Environment,
    dispatch: DispatchTable,
    registry: PluginRegistry<L>,
    resources: ProcessResources,
    states: BTreeMap<String, ModuleState>,
}

impl Orchestrator<DynamicLoader> {
    /// Create a new orchestrator builder
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }
}

impl<L: PluginLoader> Orchestrator<L> {
    /// The shared environment
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Mutable access to the shared environment
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.environment
    }

    /// The built-in dispatch table
    pub fn dispatch(&self) -> &DispatchTable {
        &self.dispatch
    }

    /// The plugin registry
    pub fn registry(&self) -> &PluginRegistry<L> {
        &self.registry
    }

    /// Process resources handed to plugins
    pub fn resources(&self) -> &ProcessResources {
        &self.resources
    }

    /// Lifecycle state of a module or plugin name
    pub fn module_state(&self, name: &str) -> ModuleState {
        self.states
            .get(name)
            .copied()
            .unwrap_or(ModuleState::Unknown)
    }

    // ---- Plugins ----

    /// Load a plugin and register its options
    pub fn plugin_load(&mut self, path: impl AsRef<Path>) -> Result<LoadStatus> {
        let path = path.as_ref();
        let status = self.registry.load(path)?;

        if status == LoadStatus::Loaded {
            let name = canonical_name(path)?;
            self.registry
                .register_options(&name, self.environment.options_mut());
            self.states.insert(name, ModuleState::OptionsRegistered);
        }
        Ok(status)
    }

    /// Invoke a plugin, loading it first if needed
    pub fn plugin(&mut self, path: impl AsRef<Path>) -> Result<Status> {
        let path = path.as_ref();
        let name = canonical_name(path)?;
        let status = self
            .registry
            .invoke(path, &mut self.environment, &self.resources)?;
        self.states.insert(name, ModuleState::Invoked);
        Ok(status)
    }

    /// Close a plugin; closing one that is not loaded does nothing
    pub fn plugin_close(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        let closed = self.registry.close(path)?;
        if closed {
            self.states
                .insert(canonical_name(path)?, ModuleState::Unloaded);
        }
        Ok(closed)
    }

    /// Close every loaded plugin, returning how many were closed
    pub fn plugin_close_all(&mut self) -> usize {
        for name in self.registry.names() {
            self.states.insert(name, ModuleState::Unloaded);
        }
        self.registry.close_all()
    }

    /// Whether the plugin at `path` is loaded
    pub fn plugin_status(&self, path: impl AsRef<Path>) -> Result<LoadStatus> {
        Ok(self.registry.status(path)?)
    }

    // ---- Built-in modules ----

    /// Run a built-in module and report what it produced
    pub fn run_module(&mut self, name: &str) -> Result<ModuleOutcome> {
        let module = self
            .dispatch
            .get(name)
            .ok_or_else(|| Error::ModuleNotFound(name.to_string()))?;

        let options = self.environment.options_mut();
        options.set_current_module(name);
        let state = self.states.entry(name.to_string()).or_insert(ModuleState::Unknown);
        if *state == ModuleState::Unknown {
            register_builtin_options(module, options);
            *state = ModuleState::OptionsRegistered;
        }

        info!(module = name, "Calling module");
        let status = module.run(&mut self.environment, &self.resources);
        *state = ModuleState::Invoked;

        if !status.is_success() {
            return Ok(ModuleOutcome::Failed(status));
        }

        Ok(match module.result_key() {
            Some(key) => match self.environment.variable(key) {
                Some(value) => ModuleOutcome::Published {
                    key: key.to_string(),
                    value,
                },
                None => {
                    warn!(module = name, key, "Module succeeded without publishing its result");
                    ModuleOutcome::Completed
                }
            },
            None => ModuleOutcome::Completed,
        })
    }

    /// Run a built-in module, returning its published value or `0.0`
    ///
    /// A failing module yields `0.0` rather than an error; use
    /// [`run_module`](Self::run_module) to tell failure apart.
    pub fn call_module(&mut self, name: &str) -> Result<f64> {
        let outcome = self.run_module(name)?;
        if let ModuleOutcome::Failed(status) = &outcome {
            warn!(module = name, %status, "Module failed, returning 0.0");
        }
        Ok(outcome.value_or_zero())
    }

    /// Make `name` the current module and register its options
    ///
    /// Built-in options go to the global scope. A loaded plugin whose
    /// canonical name is exactly `name` also registers its own options.
    pub fn set_default_options_for_module(&mut self, name: &str) -> Result<()> {
        let builtin = self.dispatch.get(name);
        let is_plugin = self.registry.contains(name);
        if builtin.is_none() && !is_plugin {
            return Err(Error::ModuleNotFound(name.to_string()));
        }

        let options = self.environment.options_mut();
        options.set_current_module(name);
        if let Some(module) = builtin {
            register_builtin_options(module, options);
        }
        if is_plugin {
            self.registry.register_options(name, options);
        }

        let state = self.states.entry(name.to_string()).or_insert(ModuleState::Unknown);
        if *state == ModuleState::Unknown {
            *state = ModuleState::OptionsRegistered;
        }
        debug!(module = name, builtin = builtin.is_some(), plugin = is_plugin, "Default options set");
        Ok(())
    }

    // ---- Options and results ----

    /// Set an option in the current module's scope
    pub fn set_option(&mut self, key: &str, value: impl Into<OptionValue>) -> Result<()> {
        self.environment.options_mut().set_local(key, value)
    }

    /// Set an option in the global scope
    pub fn set_global_option(&mut self, key: &str, value: impl Into<OptionValue>) -> Result<()> {
        self.environment.options_mut().set_global(key, value)
    }

    /// Value an option resolves to for the current module
    pub fn get_option(&self, key: &str) -> Result<OptionValue> {
        Ok(self.environment.options().get(key)?.exported())
    }

    /// Value of an option in the global scope
    pub fn get_global_option(&self, key: &str) -> Result<OptionValue> {
        Ok(self.environment.options().get_global(key)?.exported())
    }

    /// Published result, `0.0` when absent
    pub fn get_variable(&self, key: &str) -> f64 {
        self.environment.variable(key).unwrap_or(0.0)
    }

    /// Publish a result
    pub fn set_variable(&mut self, key: &str, value: f64) {
        self.environment.set_variable(key, value);
    }

    /// The option store
    pub fn options(&self) -> &Options {
        self.environment.options()
    }

    // ---- Environment ----

    /// Set the memory budget in bytes
    pub fn set_memory(&mut self, bytes: u64) {
        self.environment.set_memory(bytes);
    }

    /// Memory budget in bytes
    pub fn memory(&self) -> u64 {
        self.environment.memory()
    }

    /// Set the thread count
    pub fn set_n_threads(&mut self, n_threads: usize) {
        self.environment.set_n_threads(n_threads);
    }

    /// Thread count
    pub fn n_threads(&self) -> usize {
        self.environment.n_threads()
    }

    /// Print the current module's options to the output log
    pub fn print_options(&self) -> String {
        let text = self.environment.options().print();
        self.print_out(&text);
        text
    }

    /// Print the global options to the output log
    pub fn print_global_options(&self) -> String {
        let text = self.environment.options().print_globals();
        self.print_out(&text);
        text
    }

    /// Write script output
    pub fn print_out(&self, text: &str) {
        info!(target: OUTPUT_TARGET, "{}", text.trim_end());
    }

    /// Runtime version
    pub fn version(&self) -> &'static str {
        VERSION
    }

    /// Close every plugin; called at the end of every driver run
    pub fn finish(&mut self) -> usize {
        let closed = self.plugin_close_all();
        info!(closed, "Driver run finished");
        closed
    }
}

impl<L: PluginLoader> Drop for Orchestrator<L> {
    fn drop(&mut self) {
        if !self.registry.is_empty() {
            self.finish();
        }
    }
}

fn register_builtin_options(module: &dyn BuiltinModule, options: &mut Options) {
    let read_globals = options.read_globals();
    options.set_read_globals(true);
    module.register_options(options);
    options.set_read_globals(read_globals);
}

/// Builder for [`Orchestrator`]
#[derive(Debug, Default)]
pub struct OrchestratorBuilder {
    dispatch: Option<DispatchTable>,
    resources: Option<ProcessResources>,
    memory: Option<u64>,
    n_threads: Option<usize>,
}

impl OrchestratorBuilder {
    /// Create a new orchestrator builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dispatch table (default: [`DispatchTable::standard`])
    pub fn dispatch(mut self, dispatch: DispatchTable) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Set the process resources (default: system temp dir, `qcdriver` namespace)
    pub fn resources(mut self, resources: ProcessResources) -> Self {
        self.resources = Some(resources);
        self
    }

    /// Set the memory budget in bytes
    pub fn memory(mut self, bytes: u64) -> Self {
        self.memory = Some(bytes);
        self
    }

    /// Set the thread count
    pub fn n_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = Some(n_threads);
        self
    }

    /// Build an orchestrator loading plugins from shared libraries
    pub fn build(self) -> Orchestrator<DynamicLoader> {
        self.build_with_loader(DynamicLoader::new())
    }

    /// Build an orchestrator using `loader` for plugins
    pub fn build_with_loader<L: PluginLoader>(self, loader: L) -> Orchestrator<L> {
        let mut environment = Environment::new();
        register_driver_options(environment.options_mut());
        if let Some(bytes) = self.memory {
            environment.set_memory(bytes);
        }
        if let Some(n_threads) = self.n_threads {
            environment.set_n_threads(n_threads);
        }

        let resources = self
            .resources
            .unwrap_or_else(|| ProcessResources::local(std::env::temp_dir(), "qcdriver"));

        Orchestrator {
            environment,
            dispatch: self.dispatch.unwrap_or_else(DispatchTable::standard),
            registry: PluginRegistry::with_loader(loader),
            resources,
            states: BTreeMap::new(),
        }
    }
}
