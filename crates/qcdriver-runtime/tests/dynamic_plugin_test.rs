//! Plugins loaded from real shared libraries
//!
//! The libraries are built once per test run into cargo's per-test temp dir.

use qcdriver_core::{Error, LoadStatus, ModuleState, Status};
use qcdriver_options::OptionValue;
use qcdriver_plugin_api::{ProcessResources, ABI_VERSION};
use qcdriver_plugin_runtime::{DynamicLoader, PluginLoader, PluginRuntimeError};
use qcdriver_runtime::{DynamicOrchestrator, Orchestrator};
use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

struct Libraries {
    energy: PathBuf,
    stale_abi: PathBuf,
    missing_symbols: PathBuf,
}

fn libraries() -> &'static Libraries {
    static LIBRARIES: OnceLock<Libraries> = OnceLock::new();
    LIBRARIES.get_or_init(|| {
        let dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("plugin-libraries");
        fs::create_dir_all(&dir).unwrap();
        let install = |built: PathBuf, name: &str| {
            let installed = dir.join(format!("{name}{DLL_SUFFIX}"));
            fs::copy(&built, &installed).unwrap();
            installed
        };

        // Fields are built in order; both fixture builds share one artifact path.
        Libraries {
            energy: install(cargo_build("example-energy", &[]), "example_energy"),
            stale_abi: install(cargo_build("qcdriver-abi-fixture", &[]), "stale_abi"),
            missing_symbols: install(
                cargo_build("qcdriver-abi-fixture", &["current-abi"]),
                "missing_symbols",
            ),
        }
    })
}

fn cargo_build(package: &str, features: &[&str]) -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../Cargo.toml");
    let target_dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("plugin-build");

    let mut command = Command::new(env!("CARGO"));
    command
        .arg("build")
        .arg("--manifest-path")
        .arg(&manifest)
        .args(["-p", package])
        .arg("--target-dir")
        .arg(&target_dir);
    if !features.is_empty() {
        command.args(["--features", &features.join(",")]);
    }

    let status = command.status().unwrap();
    assert!(status.success(), "cargo build -p {package} failed");

    let file = format!("{DLL_PREFIX}{}{DLL_SUFFIX}", package.replace('-', "_"));
    target_dir.join("debug").join(file)
}

fn orchestrator(scratch: &Path) -> DynamicOrchestrator {
    Orchestrator::builder()
        .resources(ProcessResources::local(scratch, "dynamic-test"))
        .build()
}

#[test]
fn energy_plugin_lifecycle() {
    let scratch = tempfile::tempdir().unwrap();
    let mut orch = orchestrator(scratch.path());
    let path = &libraries().energy;

    assert_eq!(orch.plugin_load(path).unwrap(), LoadStatus::Loaded);
    assert_eq!(orch.module_state("EXAMPLE_ENERGY"), ModuleState::OptionsRegistered);
    assert_eq!(orch.get_option("CHARGE").unwrap(), OptionValue::Int(1));

    orch.set_option("CHARGE", 2).unwrap();
    assert_eq!(orch.plugin(path).unwrap(), Status::Success);
    assert!((orch.get_variable("CURRENT ENERGY") + 2.0).abs() < 1e-12);
    assert_eq!(
        orch.get_variable("hydrogenic energy"),
        orch.get_variable("CURRENT ENERGY")
    );

    orch.set_option("UNITS", "ev").unwrap();
    assert_eq!(orch.plugin(path).unwrap(), Status::Success);
    assert!((orch.get_variable("CURRENT ENERGY") + 54.422_772_491_976).abs() < 1e-9);

    assert_eq!(orch.finish(), 1);
    assert!(orch.registry().is_empty());
    assert_eq!(orch.plugin_status(path).unwrap(), LoadStatus::NotLoaded);
}

#[test]
fn newer_abi_is_rejected() {
    let path = &libraries().stale_abi;

    match DynamicLoader::new().load(path) {
        Err(PluginRuntimeError::AbiMismatch { found, expected, .. }) => {
            assert_eq!(found, ABI_VERSION + 1);
            assert_eq!(expected, ABI_VERSION);
        }
        other => panic!("expected an ABI mismatch, got {other:?}"),
    }

    let scratch = tempfile::tempdir().unwrap();
    let mut orch = orchestrator(scratch.path());
    assert!(matches!(orch.plugin_load(path), Err(Error::PluginLoad { .. })));
    assert!(orch.registry().is_empty());
}

#[test]
fn missing_symbols_are_rejected() {
    let path = &libraries().missing_symbols;

    match DynamicLoader::new().load(path) {
        Err(PluginRuntimeError::MissingSymbol { symbol, .. }) => {
            assert_eq!(symbol, "qcd_read_options");
        }
        other => panic!("expected a missing symbol, got {other:?}"),
    }

    let scratch = tempfile::tempdir().unwrap();
    let mut orch = orchestrator(scratch.path());
    assert!(orch.plugin(path).is_err());
    assert!(orch.registry().is_empty());
}
