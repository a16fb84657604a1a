//! Plugin loaders
//!
//! The registry never touches shared libraries itself; it asks a
//! [`PluginLoader`] for a capability table. [`DynamicLoader`] is the only
//! platform-specific piece.

use crate::error::{PluginRuntimeError, Result};
use libloading::Library;
use qcdriver_core::Status;
use qcdriver_options::{Environment, Options};
use qcdriver_plugin_api::abi::{
    symbol_name, AbiVersionFn, ABI_VERSION, ABI_VERSION_SYMBOL, CLOSE_SYMBOL, INIT_SYMBOL,
    INVOKE_SYMBOL, READ_OPTIONS_SYMBOL,
};
use qcdriver_plugin_api::{CapabilityTable, PluginCapabilities, SharedResources};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Source of plugin capability tables
pub trait PluginLoader: Send + fmt::Debug {
    /// Load the plugin stored at `path`
    fn load(&self, path: &Path) -> Result<Box<dyn PluginCapabilities>>;
}

/// Loader for shared libraries following the `qcd_*` symbol convention
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicLoader;

impl DynamicLoader {
    /// Create a new dynamic loader
    pub fn new() -> Self {
        Self
    }
}

impl PluginLoader for DynamicLoader {
    /// Load a plugin from a dynamic library
    ///
    /// # Safety
    ///
    /// Loading dynamic libraries is inherently unsafe. The library must:
    /// - Export the `qcd_*` functions generated by `declare_plugin!`
    /// - Be compiled with the same Rust toolchain as the host
    /// - Not violate memory safety in its initializers
    fn load(&self, path: &Path) -> Result<Box<dyn PluginCapabilities>> {
        if !path.is_file() {
            return Err(PluginRuntimeError::not_found(path.display()));
        }

        // SAFETY: see the contract above; running library initializers is the
        // accepted cost of loading plugins.
        let library = unsafe { Library::new(path) }.map_err(|e| PluginRuntimeError::LibraryOpen {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let abi_version: AbiVersionFn = resolve(&library, path, ABI_VERSION_SYMBOL)?;
        let found = abi_version();
        if found != ABI_VERSION {
            return Err(PluginRuntimeError::AbiMismatch {
                path: path.display().to_string(),
                found,
                expected: ABI_VERSION,
            });
        }

        let table = CapabilityTable {
            read_options: resolve(&library, path, READ_OPTIONS_SYMBOL)?,
            init: resolve(&library, path, INIT_SYMBOL)?,
            invoke: resolve(&library, path, INVOKE_SYMBOL)?,
            close: resolve(&library, path, CLOSE_SYMBOL)?,
        };

        debug!(path = %path.display(), "Plugin symbols resolved");

        Ok(Box::new(DynamicPlugin {
            table,
            _library: library,
        }))
    }
}

/// Copy a function pointer out of `library`
fn resolve<T: Copy>(library: &Library, path: &Path, symbol: &[u8]) -> Result<T> {
    // SAFETY: the symbol convention in `qcdriver_plugin_api::abi` fixes the
    // type of each exported function, and the caller keeps `library` alive
    // for as long as the copied pointer is used.
    let resolved = unsafe { library.get::<T>(symbol) }
        .map_err(|_| PluginRuntimeError::missing_symbol(path.display(), symbol_name(symbol)))?;
    Ok(*resolved)
}

/// Plugin backed by a loaded shared library
///
/// The function pointers in `table` point into `_library`, which is
/// unloaded only when this value is dropped.
pub struct DynamicPlugin {
    table: CapabilityTable,
    _library: Library,
}

impl fmt::Debug for DynamicPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicPlugin")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl PluginCapabilities for DynamicPlugin {
    fn read_options(&self, name: &str, options: &mut Options) -> Status {
        self.table.read_options(name, options)
    }

    fn init(&self, resources: &SharedResources<'_>) {
        self.table.init(resources)
    }

    fn invoke(&self, environment: &mut Environment) -> Status {
        self.table.invoke(environment)
    }

    fn close(&mut self) {
        self.table.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file() {
        let loader = DynamicLoader::new();
        let err = loader.load(Path::new("/path/to/missing.so")).unwrap_err();
        assert!(matches!(err, PluginRuntimeError::LibraryNotFound(_)));
    }

    #[test]
    fn test_not_a_library() {
        let mut file = tempfile::Builder::new().suffix(".so").tempfile().unwrap();
        file.write_all(b"definitely not an ELF file").unwrap();

        let loader = DynamicLoader::new();
        let err = loader.load(file.path()).unwrap_err();
        assert!(matches!(err, PluginRuntimeError::LibraryOpen { .. }));
    }
}
