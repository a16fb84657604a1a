//! Configuration loading

use crate::{ConfigFormat, DriverConfig};
use qcdriver_core::{Error, Result};
use regex::{Captures, Regex};
use std::env;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Load configuration from a file without validating it
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<DriverConfig> {
    let path = path.as_ref();

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;

    let format = ConfigFormat::from_path(path)?;
    debug!(path = %path.display(), ?format, "Loading driver config");

    load_from_str(&content, format)
}

/// Expand `${VAR}` and `${VAR:-default}` references
fn expand_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(:-([^}]*))?\}")
        .map_err(|e| Error::Config(format!("Invalid regex: {e}")))?;

    let mut missing = None;
    let expanded = re.replace_all(content, |cap: &Captures<'_>| {
        let var_name = &cap[1];
        match (env::var(var_name), cap.get(3)) {
            (Ok(value), _) => value,
            (Err(_), Some(default)) => default.as_str().to_string(),
            (Err(_), None) => {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var_name) => Err(Error::Config(format!(
            "Environment variable '{var_name}' not set and no default provided"
        ))),
        None => Ok(expanded.into_owned()),
    }
}

/// Load configuration from a string without validating it
pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<DriverConfig> {
    let expanded_content = expand_env_vars(content)?;

    let config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse YAML: {e}")))?,
        ConfigFormat::Toml => toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {e}")))?,
        ConfigFormat::Json => serde_json::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse JSON: {e}")))?,
    };

    Ok(config)
}

/// Load configuration from a file and validate it
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DriverConfig> {
    let config = load_from_file(path)?;
    crate::validator::validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcdriver_options::OptionValue;
    use std::io::Write;
    use std::path::PathBuf;

    const YAML_CONFIG: &str = r#"
memory: 2000000000
n_threads: 4
scratch_dir: /scratch/job
namespace: water
plugins:
  - plugins/libmp2.so
options:
  REFERENCE: uhf
  MAXITER: 60
"#;

    #[test]
    fn test_load_yaml() {
        let config = load_from_str(YAML_CONFIG, ConfigFormat::Yaml).unwrap();

        assert_eq!(config.memory, 2_000_000_000);
        assert_eq!(config.n_threads, 4);
        assert_eq!(config.plugins, vec![PathBuf::from("plugins/libmp2.so")]);
        assert_eq!(config.checkpoint_path(), PathBuf::from("/scratch/job/water.chk"));
        assert_eq!(config.options["MAXITER"], OptionValue::Int(60));
    }

    #[test]
    fn test_load_toml() {
        let toml = r#"
n_threads = 2
log_level = "debug"

[options]
SCS = true
"#;
        let config = load_from_str(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.n_threads, 2);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.options["SCS"], OptionValue::Bool(true));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = load_from_str("memory: [yaml", ConfigFormat::Yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        env::set_var("QCDRIVER_TEST_THREADS", "8");
        env::set_var("QCDRIVER_TEST_NS", "benzene");

        let config = load_from_str(
            "n_threads: ${QCDRIVER_TEST_THREADS}\nnamespace: ${QCDRIVER_TEST_NS}\n",
            ConfigFormat::Yaml,
        )
        .unwrap();
        assert_eq!(config.n_threads, 8);
        assert_eq!(config.namespace, "benzene");
    }

    #[test]
    fn test_env_var_with_default() {
        env::remove_var("QCDRIVER_UNDEFINED_VAR");

        let config = load_from_str(
            "log_level: ${QCDRIVER_UNDEFINED_VAR:-warn}\n",
            ConfigFormat::Yaml,
        )
        .unwrap();
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_env_var_missing() {
        env::remove_var("QCDRIVER_MISSING_VAR");

        let result = load_from_str("namespace: ${QCDRIVER_MISSING_VAR}\n", ConfigFormat::Yaml);
        assert!(matches!(result, Err(Error::Config(ref msg)) if msg.contains("QCDRIVER_MISSING_VAR")));
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"{"n_threads": 3, "namespace": "h2"}"#).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.n_threads, 3);
        assert_eq!(config.namespace, "h2");
    }

    #[test]
    fn test_load_config_validates() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(b"n_threads: 0\n").unwrap();

        assert!(load_from_file(file.path()).is_ok());
        assert!(load_config(file.path()).is_err());
    }
}
