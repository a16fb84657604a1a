//! Driver script error types

use std::fmt;

/// Driver script result type
pub type Result<T> = std::result::Result<T, ScriptError>;

/// Driver script error
#[derive(Debug, Clone)]
pub enum ScriptError {
    /// Script compilation/parsing error
    CompilationError {
        /// Error message
        message: String,
        /// Line number if available
        line: Option<usize>,
        /// Column number if available
        column: Option<usize>,
    },

    /// Script runtime error, including errors raised by driver functions
    RuntimeError {
        /// Error message
        message: String,
        /// Script line where error occurred
        line: Option<usize>,
    },

    /// IO error (reading script files)
    IoError {
        /// Error message
        message: String,
    },
}

impl ScriptError {
    /// Create a compilation error
    pub fn compilation<S: Into<String>>(message: S) -> Self {
        Self::CompilationError {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Create a runtime error
    pub fn runtime<S: Into<String>>(message: S) -> Self {
        Self::RuntimeError {
            message: message.into(),
            line: None,
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CompilationError {
                message,
                line,
                column,
            } => {
                write!(f, "Script compilation error: {}", message)?;
                if let Some(line) = line {
                    write!(f, " at line {}", line)?;
                    if let Some(col) = column {
                        write!(f, ", column {}", col)?;
                    }
                }
                Ok(())
            }
            Self::RuntimeError { message, line } => {
                write!(f, "Script runtime error: {}", message)?;
                if let Some(line) = line {
                    write!(f, " at line {}", line)?;
                }
                Ok(())
            }
            Self::IoError { message } => write!(f, "Script IO error: {}", message),
        }
    }
}

impl std::error::Error for ScriptError {}

impl From<std::io::Error> for ScriptError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            message: err.to_string(),
        }
    }
}

impl From<rhai::ParseError> for ScriptError {
    fn from(err: rhai::ParseError) -> Self {
        Self::CompilationError {
            message: err.0.to_string(),
            line: err.1.line(),
            column: err.1.position(),
        }
    }
}

impl From<Box<rhai::EvalAltResult>> for ScriptError {
    fn from(err: Box<rhai::EvalAltResult>) -> Self {
        let line = err.position().line();
        let message = match *err {
            rhai::EvalAltResult::ErrorRuntime(ref value, _) => value.to_string(),
            ref other => other.to_string(),
        };
        Self::RuntimeError { message, line }
    }
}

impl From<ScriptError> for qcdriver_core::Error {
    fn from(err: ScriptError) -> Self {
        qcdriver_core::Error::Script(err.to_string())
    }
}
