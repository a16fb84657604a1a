//! Symbol convention shared by the host and plugin libraries
//!
//! Plugins export five functions with fixed names. The signatures use the
//! Rust ABI, so a plugin must be built with the same toolchain and the same
//! version of this crate as the host; [`ABI_VERSION`] guards the latter.

use crate::resources::SharedResources;
use qcdriver_core::Status;
use qcdriver_options::{Environment, Options};

/// Version of the plugin contract; bumped whenever a signature below changes
pub const ABI_VERSION: u32 = 1;

/// Exported symbol returning the plugin's [`ABI_VERSION`]
pub const ABI_VERSION_SYMBOL: &[u8] = b"qcd_plugin_abi_version\0";

/// Exported symbol registering the plugin's options
pub const READ_OPTIONS_SYMBOL: &[u8] = b"qcd_read_options\0";

/// Exported symbol handing the plugin the shared process resources
pub const INIT_SYMBOL: &[u8] = b"qcd_init_plugin\0";

/// Exported symbol running the plugin
pub const INVOKE_SYMBOL: &[u8] = b"qcd_plugin\0";

/// Exported symbol releasing the plugin's resources
pub const CLOSE_SYMBOL: &[u8] = b"qcd_close_plugin\0";

/// `qcd_plugin_abi_version`
pub type AbiVersionFn = fn() -> u32;

/// `qcd_read_options`: canonical plugin name and the store to declare into
pub type ReadOptionsFn = fn(&str, &mut Options) -> Status;

/// `qcd_init_plugin`
pub type InitPluginFn = fn(&SharedResources<'_>);

/// `qcd_plugin`
pub type InvokeFn = fn(&mut Environment) -> Status;

/// `qcd_close_plugin`
pub type CloseFn = fn();

/// Printable form of a symbol name, without the trailing NUL
pub fn symbol_name(symbol: &[u8]) -> &str {
    let trimmed = symbol.strip_suffix(b"\0").unwrap_or(symbol);
    std::str::from_utf8(trimmed).unwrap_or("<non-utf8 symbol>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_are_nul_terminated() {
        for symbol in [
            ABI_VERSION_SYMBOL,
            READ_OPTIONS_SYMBOL,
            INIT_SYMBOL,
            INVOKE_SYMBOL,
            CLOSE_SYMBOL,
        ] {
            assert_eq!(symbol.last(), Some(&0));
        }
    }

    #[test]
    fn test_symbol_name() {
        assert_eq!(symbol_name(INVOKE_SYMBOL), "qcd_plugin");
        assert_eq!(symbol_name(b"plain"), "plain");
    }
}
