//! Plugin registry for managing plugin lifecycle
//!
//! The registry owns one [`PluginRecord`] per canonical plugin name and
//! drives its lifecycle: load, option registration, init, invoke, close.

use crate::error::{PluginRuntimeError, Result};
use crate::loader::{DynamicLoader, PluginLoader};
use chrono::{DateTime, Utc};
use qcdriver_core::{LoadStatus, ModuleState, Status};
use qcdriver_options::{Environment, Options};
use qcdriver_plugin_api::{PluginCapabilities, ProcessResources};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Canonical registry key for a plugin path: the upper-cased file stem
///
/// `plugins/foo.so` and `other/FOO.so` both map to `FOO`.
pub fn canonical_name(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_uppercase)
        .ok_or_else(|| PluginRuntimeError::invalid_path(path.display()))
}

/// One loaded plugin
#[derive(Debug)]
pub struct PluginRecord {
    canonical_name: String,
    path: PathBuf,
    capabilities: Box<dyn PluginCapabilities>,
    state: ModuleState,
    loaded_at: DateTime<Utc>,
    invocations: u64,
    closed: bool,
}

impl PluginRecord {
    fn new(canonical_name: String, path: PathBuf, capabilities: Box<dyn PluginCapabilities>) -> Self {
        Self {
            canonical_name,
            path,
            capabilities,
            state: ModuleState::Unknown,
            loaded_at: Utc::now(),
            invocations: 0,
            closed: false,
        }
    }

    /// Registry key
    pub fn canonical_name(&self) -> &str {
        &self.canonical_name
    }

    /// Path the plugin was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lifecycle state; `Unknown` until the plugin's options are registered
    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// When the plugin was loaded
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// How many times the plugin was invoked
    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    fn read_options(&mut self, options: &mut Options) -> Status {
        options.set_current_module(self.canonical_name.clone());
        let status = self.capabilities.read_options(&self.canonical_name, options);
        if self.state == ModuleState::Unknown {
            self.state = ModuleState::OptionsRegistered;
        }
        debug!(plugin = %self.canonical_name, %status, "Plugin options registered");
        status
    }

    fn close(&mut self) {
        if !self.closed {
            self.capabilities.close();
            self.closed = true;
            self.state = ModuleState::Unloaded;
        }
    }
}

/// Plugin registry keyed by canonical name
///
/// Not synchronized: callers issue one operation at a time.
#[derive(Debug)]
pub struct PluginRegistry<L: PluginLoader = DynamicLoader> {
    loader: L,
    plugins: BTreeMap<String, PluginRecord>,
}

impl PluginRegistry<DynamicLoader> {
    /// Create a registry loading shared libraries from disk
    pub fn new() -> Self {
        Self::with_loader(DynamicLoader::new())
    }
}

impl Default for PluginRegistry<DynamicLoader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: PluginLoader> PluginRegistry<L> {
    /// Create a registry using `loader`
    pub fn with_loader(loader: L) -> Self {
        Self {
            loader,
            plugins: BTreeMap::new(),
        }
    }

    /// The loader in use
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Load the plugin at `path` unless one with the same canonical name is loaded
    ///
    /// A failed load leaves the registry unchanged.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<LoadStatus> {
        let path = path.as_ref();
        let name = canonical_name(path)?;

        if self.plugins.contains_key(&name) {
            debug!(plugin = %name, "Plugin already loaded");
            return Ok(LoadStatus::AlreadyLoaded);
        }

        self.insert_new(name, path)?;
        Ok(LoadStatus::Loaded)
    }

    /// Run a loaded plugin's option registration by exact canonical name
    ///
    /// Returns `None` when no plugin of that name is loaded.
    pub fn register_options(&mut self, name: &str, options: &mut Options) -> Option<Status> {
        self.plugins
            .get_mut(name)
            .map(|record| record.read_options(options))
    }

    /// Invoke the plugin at `path`
    ///
    /// An unloaded plugin is loaded first and its options registered. Every
    /// invocation, repeat calls included, is preceded by exactly one `init`
    /// with the current shared resources.
    pub fn invoke(
        &mut self,
        path: impl AsRef<Path>,
        environment: &mut Environment,
        resources: &ProcessResources,
    ) -> Result<Status> {
        let path = path.as_ref();
        let name = canonical_name(path)?;

        if !self.plugins.contains_key(&name) {
            self.insert_new(name.clone(), path)?;
            if let Some(record) = self.plugins.get_mut(&name) {
                record.read_options(environment.options_mut());
            }
        }

        let record = self
            .plugins
            .get_mut(&name)
            .ok_or_else(|| PluginRuntimeError::other(format!("plugin {name} vanished")))?;

        info!(plugin = %name, path = %path.display(), "Calling plugin");

        environment.options_mut().set_current_module(name.clone());
        record.capabilities.init(&resources.share(environment));
        record.state = ModuleState::Initialized;

        let status = record.capabilities.invoke(environment);
        record.state = ModuleState::Invoked;
        record.invocations += 1;

        info!(plugin = %name, %status, "Plugin returned");
        Ok(status)
    }

    /// Close and remove the plugin at `path`; `false` if it was not loaded
    pub fn close(&mut self, path: impl AsRef<Path>) -> Result<bool> {
        let name = canonical_name(path)?;
        match self.plugins.remove(&name) {
            Some(mut record) => {
                record.close();
                info!(plugin = %name, "Plugin closed");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Close every plugin once and empty the registry, returning how many were closed
    pub fn close_all(&mut self) -> usize {
        let count = self.plugins.len();
        for (name, mut record) in std::mem::take(&mut self.plugins) {
            record.close();
            info!(plugin = %name, "Plugin closed");
        }
        count
    }

    /// Whether the plugin at `path` is loaded
    pub fn status(&self, path: impl AsRef<Path>) -> Result<LoadStatus> {
        let name = canonical_name(path)?;
        Ok(if self.plugins.contains_key(&name) {
            LoadStatus::Loaded
        } else {
            LoadStatus::NotLoaded
        })
    }

    /// Whether a plugin with this exact canonical name is loaded
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Record for an exact canonical name
    pub fn get(&self, name: &str) -> Option<&PluginRecord> {
        self.plugins.get(name)
    }

    /// Canonical names of every loaded plugin, sorted
    pub fn names(&self) -> Vec<String> {
        self.plugins.keys().cloned().collect()
    }

    /// Number of loaded plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is loaded
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn insert_new(&mut self, name: String, path: &Path) -> Result<()> {
        let capabilities = self.loader.load(path)?;
        info!(plugin = %name, path = %path.display(), "Plugin loaded");
        self.plugins.insert(
            name.clone(),
            PluginRecord::new(name, path.to_path_buf(), capabilities),
        );
        Ok(())
    }
}

impl<L: PluginLoader> Drop for PluginRegistry<L> {
    fn drop(&mut self) {
        if !self.plugins.is_empty() {
            self.close_all();
        }
    }
}
