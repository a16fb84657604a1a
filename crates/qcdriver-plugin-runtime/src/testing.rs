//! Test loader that hands out mock plugins instead of opening libraries

use crate::error::{PluginRuntimeError, Result};
use crate::loader::PluginLoader;
use crate::registry::canonical_name;
use parking_lot::Mutex;
use qcdriver_plugin_api::testing::MockPlugin;
use qcdriver_plugin_api::PluginCapabilities;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Loader resolving paths to pre-registered [`MockPlugin`]s by canonical name
///
/// Paths whose canonical name was never registered fail with
/// [`PluginRuntimeError::LibraryNotFound`], like a missing file would.
#[derive(Debug, Clone, Default)]
pub struct MockLoader {
    plugins: HashMap<String, MockPlugin>,
    loads: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockLoader {
    /// Create a loader that knows no plugins
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `plugin` for any path whose canonical name is `name`
    pub fn with_plugin(mut self, name: &str, plugin: MockPlugin) -> Self {
        self.plugins.insert(name.to_uppercase(), plugin);
        self
    }

    /// Paths passed to `load`, in order
    pub fn loads(&self) -> Vec<PathBuf> {
        self.loads.lock().clone()
    }
}

impl PluginLoader for MockLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn PluginCapabilities>> {
        self.loads.lock().push(path.to_path_buf());
        let name = canonical_name(path)?;
        match self.plugins.get(&name) {
            Some(plugin) => Ok(Box::new(plugin.clone())),
            None => Err(PluginRuntimeError::not_found(path.display())),
        }
    }
}
