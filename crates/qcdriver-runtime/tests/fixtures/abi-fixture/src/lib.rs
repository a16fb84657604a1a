//! Plugin library exporting only `qcd_plugin_abi_version`
//!
//! Built as is, it claims a newer ABI than the host. With `current-abi` it
//! passes the version check and then lacks every other plugin symbol.

use qcdriver_plugin_api::ABI_VERSION;

#[no_mangle]
pub fn qcd_plugin_abi_version() -> u32 {
    if cfg!(feature = "current-abi") {
        ABI_VERSION
    } else {
        ABI_VERSION + 1
    }
}
