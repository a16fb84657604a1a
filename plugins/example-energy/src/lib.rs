//! # Example Energy Plugin
//!
//! Demonstrates how to build a dynamically loaded computation plugin with
//! `declare_plugin!`. It publishes the closed-form energy of a one-electron
//! hydrogen-like ion, `E = -Z² / (2n²)` hartree.
//!
//! ## Options
//!
//! - `CHARGE` (integer, default 1): nuclear charge `Z`
//! - `LEVEL` (integer, default 1): principal quantum number `n`
//! - `UNITS` (`HARTREE` | `EV`, default `HARTREE`)
//!
//! ## Results
//!
//! - `CURRENT ENERGY`
//! - `HYDROGENIC ENERGY`
//!
//! ## Example driver script
//!
//! ```text
//! plugin_load("target/release/libexample_energy.so");
//! set_option("CHARGE", 2);
//! plugin("target/release/libexample_energy.so");
//! print_out(`E = ${get_variable("CURRENT ENERGY")}`);
//! ```

use parking_lot::Mutex;
use qcdriver_plugin_api::prelude::*;
use tracing::{debug, info, warn};

const HARTREE_TO_EV: f64 = 27.211_386_245_988;

/// What the plugin remembers between `init` and `invoke`
#[derive(Debug, Clone, PartialEq)]
struct InitState {
    n_threads: usize,
    is_root: bool,
}

static STATE: Mutex<Option<InitState>> = parking_lot::const_mutex(None);

/// Declare the plugin's options
pub fn read_options(name: &str, options: &mut Options) -> Status {
    debug!(plugin = name, "Declaring example-energy options");
    options.add_int("CHARGE", 1);
    options.add_int("LEVEL", 1);
    options.add_str("UNITS", "HARTREE", "HARTREE EV");
    Status::Success
}

/// Remember the shared resources of the coming invocation
pub fn init(resources: &SharedResources<'_>) {
    *STATE.lock() = Some(InitState {
        n_threads: resources.environment.n_threads(),
        is_root: resources.communicator.is_root(),
    });
}

/// Compute and publish the energy
pub fn invoke(environment: &mut Environment) -> Status {
    let Some(state) = STATE.lock().take() else {
        warn!("example-energy invoked without init");
        return Status::Failure;
    };

    let options = environment.options();
    let (charge, level) = match (options.get_int("CHARGE"), options.get_int("LEVEL")) {
        (Ok(charge), Ok(level)) => (charge, level),
        _ => {
            warn!("example-energy options are not registered");
            return Status::Failure;
        }
    };
    if charge < 1 || level < 1 {
        warn!(charge, level, "CHARGE and LEVEL must be positive");
        return Status::Failure;
    }

    let mut energy = hydrogenic_energy(charge, level);
    if options.get_str("UNITS").is_ok_and(|units| units == "EV") {
        energy *= HARTREE_TO_EV;
    }

    if state.is_root {
        info!(charge, level, energy, threads = state.n_threads, "Hydrogenic energy computed");
    }

    environment.set_variable("HYDROGENIC ENERGY", energy);
    environment.set_variable("CURRENT ENERGY", energy);
    Status::Success
}

/// Release plugin state
pub fn close() {
    STATE.lock().take();
}

/// Energy in hartree of a one-electron ion of charge `charge` in shell `level`
pub fn hydrogenic_energy(charge: i64, level: i64) -> f64 {
    let z = charge as f64;
    let n = level as f64;
    -(z * z) / (2.0 * n * n)
}

qcdriver_plugin_api::declare_plugin! {
    read_options: read_options,
    init: init,
    invoke: invoke,
    close: close,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared_environment() -> Environment {
        let mut env = Environment::new();
        env.options_mut().set_current_module("LIBEXAMPLE_ENERGY");
        assert_eq!(
            read_options("LIBEXAMPLE_ENERGY", env.options_mut()),
            Status::Success
        );
        env
    }

    #[test]
    fn test_hydrogenic_energy() {
        assert_eq!(hydrogenic_energy(1, 1), -0.5);
        assert_eq!(hydrogenic_energy(2, 1), -2.0);
        assert_eq!(hydrogenic_energy(1, 2), -0.125);
    }

    #[test]
    fn test_capability_table_round() {
        let table = capability_table();
        let mut env = declared_environment();
        env.options_mut().set_local("CHARGE", 2).unwrap();

        let resources = ProcessResources::local(std::env::temp_dir(), "example-energy");
        table.init(&resources.share(&env));
        assert_eq!(table.invoke(&mut env), Status::Success);
        assert_eq!(env.variable("current energy"), Some(-2.0));
        assert_eq!(env.variable("HYDROGENIC ENERGY"), Some(-2.0));

        // Each invocation needs a fresh init.
        assert_eq!(table.invoke(&mut env), Status::Failure);

        env.options_mut().set_local("UNITS", "ev").unwrap();
        env.options_mut().set_local("LEVEL", 0).unwrap();
        table.init(&resources.share(&env));
        assert_eq!(table.invoke(&mut env), Status::Failure);

        env.options_mut().set_local("LEVEL", 1).unwrap();
        table.init(&resources.share(&env));
        assert_eq!(table.invoke(&mut env), Status::Success);
        let ev = env.variable("CURRENT ENERGY").unwrap();
        assert!((ev + 2.0 * HARTREE_TO_EV).abs() < 1e-9);

        let mut table = table;
        table.close();
    }
}
