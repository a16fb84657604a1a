//! Modules and options shipped with the runtime

use crate::dispatch::BuiltinModule;
use qcdriver_core::Status;
use qcdriver_options::{Environment, Options};
use qcdriver_plugin_api::ProcessResources;
use tracing::{info, warn};

/// Removes the scratch files of the current job namespace, keeping the checkpoint
#[derive(Debug, Clone, Copy, Default)]
pub struct Clean;

impl BuiltinModule for Clean {
    fn name(&self) -> &str {
        "CLEAN"
    }

    fn run(&self, _environment: &mut Environment, resources: &ProcessResources) -> Status {
        match resources.clean_scratch() {
            Ok(removed) => {
                info!(
                    removed,
                    scratch = %resources.io.scratch_dir().display(),
                    namespace = resources.io.namespace(),
                    "Scratch files cleaned"
                );
                Status::Success
            }
            Err(e) => {
                warn!(error = %e, "Failed to clean scratch files");
                Status::Failure
            }
        }
    }
}

/// Declare the driver-level options every job starts with
///
/// Declarations go to the global scope regardless of the store's mode,
/// which is restored afterwards.
pub fn register_driver_options(options: &mut Options) {
    let read_globals = options.read_globals();
    options.set_read_globals(true);

    options.add_str("JOBTYPE", "SP", "SP OPT");
    options.add_str("WFN", "SCF", "CCSD CCSD_T MP2 SCF");
    options.add_str("REFERENCE", "RHF", "RHF ROHF MCSCF TCSCF UHF");
    options.add_str("DERTYPE", "ENERGY", "NONE ENERGY FIRST SECOND");
    options.add_int("PRINT", 1);

    options.set_read_globals(read_globals);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_driver_options() {
        let mut options = Options::new();
        register_driver_options(&mut options);

        assert!(!options.read_globals());
        assert_eq!(options.get_global("WFN").unwrap().to_str(), Some("SCF"));
        assert_eq!(options.get_global("PRINT").unwrap().to_integer(), Some(1));
        assert!(options.set_global("REFERENCE", "uhf").is_ok());
        assert_eq!(options.get_str("REFERENCE").unwrap(), "UHF");
        assert!(options.set_global("DERTYPE", "THIRD").is_err());
        assert_eq!(options.get_str("DERTYPE").unwrap(), "ENERGY");
    }

    #[test]
    fn test_clean_module() {
        let dir = tempfile::tempdir().unwrap();
        let resources = ProcessResources::local(dir.path(), "h2o");
        fs::write(resources.io.file_path("32"), b"scratch").unwrap();
        fs::write(resources.checkpoint.path(), b"checkpoint").unwrap();
        fs::write(dir.path().join("keep.txt"), b"keep").unwrap();

        let mut env = Environment::new();
        assert_eq!(Clean.run(&mut env, &resources), Status::Success);
        assert!(!resources.io.file_path("32").exists());
        assert!(dir.path().join("keep.txt").exists());
        assert!(resources.checkpoint.path().exists());
        assert_eq!(Clean.result_key(), None);
    }
}
