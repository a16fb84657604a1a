//! Error types for qcdriver

/// Result type alias using [`Error`]
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Main error type for qcdriver
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A plugin library could not be loaded
    #[error("Failed to load plugin '{path}': {message}")]
    PluginLoad {
        /// Path the load was attempted from
        path: String,
        /// Error message
        message: String,
    },

    /// Plugin path has no usable file stem
    #[error("Invalid plugin path: {0}")]
    InvalidPluginPath(String),

    /// Option key is not declared in any scope
    #[error("Option not found: {0}")]
    OptionNotFound(String),

    /// Value does not match the option's declared type
    #[error("Option '{key}' type mismatch: {message}")]
    OptionType {
        /// Option key
        key: String,
        /// Error message
        message: String,
    },

    /// String value outside the option's allowed choices
    #[error("Option '{key}' does not accept '{value}' (allowed: {choices})")]
    InvalidChoice {
        /// Option key
        key: String,
        /// Rejected value
        value: String,
        /// Allowed values, space separated
        choices: String,
    },

    /// No built-in module or loaded plugin with this name
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Driver script error
    #[error("Script error: {0}")]
    Script(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a plugin load error
    pub fn plugin_load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::PluginLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an option type error
    pub fn option_type(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::OptionType {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from the option store rather than from loading or dispatch
    pub fn is_option_error(&self) -> bool {
        matches!(
            self,
            Error::OptionNotFound(_) | Error::OptionType { .. } | Error::InvalidChoice { .. }
        )
    }
}
