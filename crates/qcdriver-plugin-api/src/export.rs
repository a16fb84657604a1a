//! Macro generating a plugin library's exported symbols

/// Export the plugin capabilities under the fixed symbol names
///
/// Expands to the five `#[no_mangle]` functions the runtime resolves
/// (`qcd_plugin_abi_version`, `qcd_read_options`, `qcd_init_plugin`,
/// `qcd_plugin`, `qcd_close_plugin`) plus a `capability_table()` function
/// for linking the same plugin statically.
#[macro_export]
macro_rules! declare_plugin {
    (
        read_options: $read_options:path,
        init: $init:path,
        invoke: $invoke:path,
        close: $close:path $(,)?
    ) => {
        #[no_mangle]
        pub fn qcd_plugin_abi_version() -> u32 {
            $crate::ABI_VERSION
        }

        #[no_mangle]
        pub fn qcd_read_options(name: &str, options: &mut $crate::Options) -> $crate::Status {
            $read_options(name, options)
        }

        #[no_mangle]
        pub fn qcd_init_plugin(resources: &$crate::SharedResources<'_>) {
            $init(resources)
        }

        #[no_mangle]
        pub fn qcd_plugin(environment: &mut $crate::Environment) -> $crate::Status {
            $invoke(environment)
        }

        #[no_mangle]
        pub fn qcd_close_plugin() {
            $close()
        }

        /// Capability table of this plugin, for static linking
        pub fn capability_table() -> $crate::CapabilityTable {
            $crate::CapabilityTable {
                read_options: qcd_read_options,
                init: qcd_init_plugin,
                invoke: qcd_plugin,
                close: qcd_close_plugin,
            }
        }
    };
}
