//! Configuration validation

use crate::DriverConfig;
use qcdriver_core::{Error, Result};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate configuration
pub fn validate_config(config: &DriverConfig) -> Result<()> {
    validate_environment(config)?;
    validate_scratch(config)?;
    validate_plugins(config)?;
    validate_options(config)?;
    Ok(())
}

fn validate_environment(config: &DriverConfig) -> Result<()> {
    if config.n_threads == 0 {
        return Err(Error::Config("n_threads must be >= 1".to_string()));
    }

    if config.memory == 0 {
        return Err(Error::Config("memory must be > 0".to_string()));
    }

    if config.memory < 32 * 1024 * 1024 {
        tracing::warn!(memory = config.memory, "memory is very low (<32 MiB)");
    }

    if !LOG_LEVELS.contains(&config.log_level.to_lowercase().as_str()) {
        return Err(Error::Config(format!(
            "Invalid log_level: {} (must be one of {})",
            config.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    Ok(())
}

fn validate_scratch(config: &DriverConfig) -> Result<()> {
    if config.namespace.is_empty() {
        return Err(Error::Config("namespace cannot be empty".to_string()));
    }

    if config.namespace.contains(['/', '\\']) {
        return Err(Error::Config(format!(
            "namespace '{}' must not contain path separators",
            config.namespace
        )));
    }

    if !config.scratch_dir.is_dir() {
        tracing::warn!(
            scratch_dir = %config.scratch_dir.display(),
            "Scratch directory does not exist"
        );
    }

    Ok(())
}

fn validate_plugins(config: &DriverConfig) -> Result<()> {
    for plugin in &config.plugins {
        if plugin.file_stem().is_none() {
            return Err(Error::Config(format!(
                "plugin path '{}' has no file name",
                plugin.display()
            )));
        }
    }
    Ok(())
}

fn validate_options(config: &DriverConfig) -> Result<()> {
    if config.options.keys().any(|key| key.trim().is_empty()) {
        return Err(Error::Config("option names cannot be empty".to_string()));
    }
    Ok(())
}
