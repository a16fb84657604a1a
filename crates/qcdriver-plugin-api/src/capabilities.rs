//! The capability interface every loaded plugin is driven through

use crate::abi::{CloseFn, InitPluginFn, InvokeFn, ReadOptionsFn};
use crate::resources::SharedResources;
use qcdriver_core::Status;
use qcdriver_options::{Environment, Options};
use std::fmt;

/// The four capabilities of a plugin, independent of how it was loaded
pub trait PluginCapabilities: Send + fmt::Debug {
    /// Declare the plugin's configuration keys and defaults
    fn read_options(&self, name: &str, options: &mut Options) -> Status;

    /// Hand the plugin the current shared resources
    fn init(&self, resources: &SharedResources<'_>);

    /// Run the plugin against the environment
    fn invoke(&self, environment: &mut Environment) -> Status;

    /// Release the plugin's resources
    ///
    /// The registry calls this at most once per successful load.
    fn close(&mut self);
}

/// Capability table built from plain function pointers
///
/// This is what a dynamically loaded library resolves to, and also what a
/// plugin crate exposes through `capability_table()` for static linking.
#[derive(Clone, Copy)]
pub struct CapabilityTable {
    /// `qcd_read_options`
    pub read_options: ReadOptionsFn,
    /// `qcd_init_plugin`
    pub init: InitPluginFn,
    /// `qcd_plugin`
    pub invoke: InvokeFn,
    /// `qcd_close_plugin`
    pub close: CloseFn,
}

impl fmt::Debug for CapabilityTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityTable")
            .field("read_options", &(self.read_options as *const ()))
            .field("init", &(self.init as *const ()))
            .field("invoke", &(self.invoke as *const ()))
            .field("close", &(self.close as *const ()))
            .finish()
    }
}

impl PluginCapabilities for CapabilityTable {
    fn read_options(&self, name: &str, options: &mut Options) -> Status {
        (self.read_options)(name, options)
    }

    fn init(&self, resources: &SharedResources<'_>) {
        (self.init)(resources)
    }

    fn invoke(&self, environment: &mut Environment) -> Status {
        (self.invoke)(environment)
    }

    fn close(&mut self) {
        (self.close)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{CheckpointBackend, Communicator, IoBackend};

    fn read_options(_name: &str, options: &mut Options) -> Status {
        options.add_int("ROOTS", 3);
        Status::Success
    }

    fn init(resources: &SharedResources<'_>) {
        assert!(resources.communicator.is_root());
    }

    fn invoke(environment: &mut Environment) -> Status {
        let roots = environment.options().get_int("ROOTS").unwrap_or(0);
        environment.set_variable("ROOT COUNT", roots as f64);
        Status::Success
    }

    fn close() {}

    #[test]
    fn test_table_dispatches_to_functions() {
        let mut table = CapabilityTable {
            read_options,
            init,
            invoke,
            close,
        };
        let mut env = Environment::new();
        env.options_mut().set_current_module("ROOTS");
        assert_eq!(
            table.read_options("ROOTS", env.options_mut()),
            Status::Success
        );

        let communicator = Communicator::world();
        let checkpoint = CheckpointBackend::new("/tmp/test.chk");
        let io = IoBackend::new("/tmp", "test");
        let snapshot = env.clone();
        table.init(&SharedResources {
            communicator: &communicator,
            environment: &snapshot,
            checkpoint: &checkpoint,
            io: &io,
        });

        assert_eq!(table.invoke(&mut env), Status::Success);
        assert_eq!(env.variable("root count"), Some(3.0));
        table.close();
        assert!(format!("{table:?}").contains("CapabilityTable"));
    }
}
