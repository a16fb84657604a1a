//! Plugin runtime error types

use std::fmt;

/// Plugin runtime error type
#[derive(Debug, thiserror::Error)]
pub enum PluginRuntimeError {
    /// Plugin file does not exist
    #[error("Plugin library not found: {0}")]
    LibraryNotFound(String),

    /// The dynamic linker rejected the file
    #[error("Failed to open plugin library {path}: {message}")]
    LibraryOpen {
        /// Library path
        path: String,
        /// Linker message
        message: String,
    },

    /// A required capability symbol is not exported
    #[error("Plugin library {path} does not export '{symbol}'")]
    MissingSymbol {
        /// Library path
        path: String,
        /// Symbol name
        symbol: String,
    },

    /// The plugin was built against a different plugin contract
    #[error("Plugin library {path} has ABI version {found}, host expects {expected}")]
    AbiMismatch {
        /// Library path
        path: String,
        /// Version reported by the plugin
        found: u32,
        /// Host version
        expected: u32,
    },

    /// Path has no file stem to derive a canonical name from
    #[error("Invalid plugin path: {0}")]
    InvalidPath(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Result type for plugin runtime operations
pub type Result<T> = std::result::Result<T, PluginRuntimeError>;

impl PluginRuntimeError {
    /// Create a new library not found error
    pub fn not_found(path: impl fmt::Display) -> Self {
        Self::LibraryNotFound(path.to_string())
    }

    /// Create a new invalid path error
    pub fn invalid_path(path: impl fmt::Display) -> Self {
        Self::InvalidPath(path.to_string())
    }

    /// Create a new missing symbol error
    pub fn missing_symbol(path: impl fmt::Display, symbol: impl fmt::Display) -> Self {
        Self::MissingSymbol {
            path: path.to_string(),
            symbol: symbol.to_string(),
        }
    }

    /// Create a new other error
    pub fn other(msg: impl fmt::Display) -> Self {
        Self::Other(msg.to_string())
    }

    /// Library path the error refers to, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::LibraryNotFound(path) | Self::InvalidPath(path) => Some(path),
            Self::LibraryOpen { path, .. }
            | Self::MissingSymbol { path, .. }
            | Self::AbiMismatch { path, .. } => Some(path),
            Self::IoError(_) | Self::Other(_) => None,
        }
    }
}

impl From<PluginRuntimeError> for qcdriver_core::Error {
    fn from(err: PluginRuntimeError) -> Self {
        match err {
            PluginRuntimeError::InvalidPath(path) => qcdriver_core::Error::InvalidPluginPath(path),
            other => {
                let path = other.path().unwrap_or("<unknown>").to_string();
                qcdriver_core::Error::plugin_load(path, other.to_string())
            }
        }
    }
}
