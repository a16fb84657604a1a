//! Option kinds and values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of an option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    /// Upper-cased string, optionally restricted to a set of choices
    String,
    /// Boolean flag
    Boolean,
    /// Signed integer
    Integer,
    /// Double-precision float
    Double,
    /// Array of doubles
    Array,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::String => write!(f, "string"),
            OptionKind::Boolean => write!(f, "boolean"),
            OptionKind::Integer => write!(f, "integer"),
            OptionKind::Double => write!(f, "double"),
            OptionKind::Array => write!(f, "array"),
        }
    }
}

/// A value written to or read from the option store
///
/// Deserializes untagged, so configuration files can write plain
/// `true`, `10`, `1.0e-8`, `"RHF"` or `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    Str(String),
    /// Array of doubles
    Array(Vec<f64>),
}

impl OptionValue {
    /// Short name of the value's shape, used in error messages
    pub fn shape(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "boolean",
            OptionValue::Int(_) => "integer",
            OptionValue::Float(_) => "double",
            OptionValue::Str(_) => "string",
            OptionValue::Array(_) => "array",
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Float(x) => write!(f, "{x:e}"),
            OptionValue::Str(s) => write!(f, "{s}"),
            OptionValue::Array(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

impl From<Vec<f64>> for OptionValue {
    fn from(value: Vec<f64>) -> Self {
        OptionValue::Array(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_deserialize() {
        let values: Vec<OptionValue> =
            serde_json::from_str(r#"[true, 10, 1.5e-8, "rhf", [0.0, 1.0]]"#).unwrap();
        assert_eq!(values[0], OptionValue::Bool(true));
        assert_eq!(values[1], OptionValue::Int(10));
        assert_eq!(values[2], OptionValue::Float(1.5e-8));
        assert_eq!(values[3], OptionValue::Str("rhf".to_string()));
        assert_eq!(values[4], OptionValue::Array(vec![0.0, 1.0]));
    }

    #[test]
    fn test_display() {
        assert_eq!(OptionValue::Bool(true).to_string(), "TRUE");
        assert_eq!(OptionValue::Int(3).to_string(), "3");
        assert_eq!(OptionValue::Array(vec![1.0, 2.5]).to_string(), "[1, 2.5]");
    }
}
