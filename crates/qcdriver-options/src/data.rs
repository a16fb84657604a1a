//! A single declared option: its type, default, current value and change flag

use crate::value::{OptionKind, OptionValue};
use qcdriver_core::{Error, Result};
use serde::Serialize;

/// A declared option slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Data {
    kind: OptionKind,
    value: OptionValue,
    default: OptionValue,
    choices: Vec<String>,
    changed: bool,
}

impl Data {
    /// Declare a string option; `choices` is a space separated list, empty for free text
    pub fn string(default: &str, choices: &str) -> Self {
        let default = OptionValue::Str(default.to_uppercase());
        Self {
            kind: OptionKind::String,
            value: default.clone(),
            default,
            choices: choices.split_whitespace().map(str::to_uppercase).collect(),
            changed: false,
        }
    }

    /// Declare a boolean option
    pub fn boolean(default: bool) -> Self {
        Self::with_default(OptionKind::Boolean, OptionValue::Bool(default))
    }

    /// Declare an integer option
    pub fn integer(default: i64) -> Self {
        Self::with_default(OptionKind::Integer, OptionValue::Int(default))
    }

    /// Declare a double option
    pub fn double(default: f64) -> Self {
        Self::with_default(OptionKind::Double, OptionValue::Float(default))
    }

    /// Declare an array option, empty by default
    pub fn array() -> Self {
        Self::with_default(OptionKind::Array, OptionValue::Array(Vec::new()))
    }

    fn with_default(kind: OptionKind, default: OptionValue) -> Self {
        Self {
            kind,
            value: default.clone(),
            default,
            choices: Vec::new(),
            changed: false,
        }
    }

    /// Declared type
    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    /// Current value
    pub fn value(&self) -> &OptionValue {
        &self.value
    }

    /// Declared default
    pub fn default_value(&self) -> &OptionValue {
        &self.default
    }

    /// Allowed string values (empty when unrestricted)
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// Whether the value was assigned since declaration
    pub fn has_changed(&self) -> bool {
        self.changed
    }

    /// Assign a new value, converting it to the declared type
    ///
    /// On error the slot is left untouched.
    pub fn assign(&mut self, key: &str, input: &OptionValue) -> Result<()> {
        let converted = self.convert(key, input)?;
        self.value = converted;
        self.changed = true;
        Ok(())
    }

    /// Restore the default and clear the change flag
    pub fn reset(&mut self) {
        self.value = self.default.clone();
        self.changed = false;
    }

    /// Value as exposed to driver scripts: booleans read back as integers
    pub fn exported(&self) -> OptionValue {
        match &self.value {
            OptionValue::Bool(b) => OptionValue::Int(i64::from(*b)),
            other => other.clone(),
        }
    }

    /// Boolean view; integers count as true when non-zero
    pub fn to_bool(&self) -> Option<bool> {
        match self.value {
            OptionValue::Bool(b) => Some(b),
            OptionValue::Int(i) => Some(i != 0),
            _ => None,
        }
    }

    /// Integer view
    pub fn to_integer(&self) -> Option<i64> {
        match self.value {
            OptionValue::Int(i) => Some(i),
            OptionValue::Bool(b) => Some(i64::from(b)),
            _ => None,
        }
    }

    /// Double view
    pub fn to_double(&self) -> Option<f64> {
        match self.value {
            OptionValue::Float(x) => Some(x),
            OptionValue::Int(i) => Some(i as f64),
            _ => None,
        }
    }

    /// String view
    pub fn to_str(&self) -> Option<&str> {
        match &self.value {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Array view
    pub fn to_array(&self) -> Option<&[f64]> {
        match &self.value {
            OptionValue::Array(values) => Some(values),
            _ => None,
        }
    }

    fn convert(&self, key: &str, input: &OptionValue) -> Result<OptionValue> {
        match (self.kind, input) {
            (OptionKind::String, OptionValue::Str(s)) => {
                let upper = s.to_uppercase();
                if !self.choices.is_empty() && !self.choices.contains(&upper) {
                    return Err(Error::InvalidChoice {
                        key: key.to_string(),
                        value: upper,
                        choices: self.choices.join(" "),
                    });
                }
                Ok(OptionValue::Str(upper))
            }
            (OptionKind::Boolean, OptionValue::Str(s)) => parse_bool(s)
                .map(OptionValue::Bool)
                .ok_or_else(|| {
                    Error::option_type(key, "Required option type is boolean, no boolean specified")
                }),
            (OptionKind::Boolean, OptionValue::Bool(b)) => Ok(OptionValue::Bool(*b)),
            (OptionKind::Boolean, OptionValue::Int(i)) => Ok(OptionValue::Bool(*i != 0)),
            (OptionKind::Integer, OptionValue::Int(i)) => Ok(OptionValue::Int(*i)),
            (OptionKind::Integer, OptionValue::Bool(b)) => Ok(OptionValue::Int(i64::from(*b))),
            (OptionKind::Double, OptionValue::Float(x)) => Ok(OptionValue::Float(*x)),
            (OptionKind::Double, OptionValue::Int(i)) => Ok(OptionValue::Float(*i as f64)),
            (OptionKind::Array, OptionValue::Array(values)) => Ok(OptionValue::Array(values.clone())),
            (kind, other) => Err(Error::option_type(
                key,
                format!("Required option type is {kind}, got {}", other.shape()),
            )),
        }
    }
}

/// Parse a boolean literal: yes/on/true and no/off/false, any case
pub fn parse_bool(literal: &str) -> Option<bool> {
    match literal.trim().to_uppercase().as_str() {
        "TRUE" | "YES" | "ON" => Some(true),
        "FALSE" | "NO" | "OFF" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_literals() {
        for literal in ["yes", "On", "TRUE", "true"] {
            assert_eq!(parse_bool(literal), Some(true), "{literal}");
        }
        for literal in ["no", "OFF", "False"] {
            assert_eq!(parse_bool(literal), Some(false), "{literal}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool("1"), None);
    }

    #[test]
    fn test_bad_boolean_leaves_value() {
        let mut data = Data::boolean(false);
        data.assign("DIIS", &OptionValue::from("on")).unwrap();
        assert_eq!(data.to_bool(), Some(true));

        let err = data.assign("DIIS", &OptionValue::from("sometimes")).unwrap_err();
        assert!(matches!(err, Error::OptionType { .. }));
        assert_eq!(data.to_bool(), Some(true));
        assert!(data.has_changed());
    }

    #[test]
    fn test_string_choices() {
        let mut data = Data::string("RHF", "RHF ROHF UHF");
        data.assign("REFERENCE", &OptionValue::from("uhf")).unwrap();
        assert_eq!(data.to_str(), Some("UHF"));

        let err = data.assign("REFERENCE", &OptionValue::from("khf")).unwrap_err();
        assert!(matches!(err, Error::InvalidChoice { .. }));
        assert_eq!(data.to_str(), Some("UHF"));
    }

    #[test]
    fn test_numeric_conversion() {
        let mut data = Data::double(1.0e-6);
        data.assign("E_CONVERGENCE", &OptionValue::Int(0)).unwrap();
        assert_eq!(data.to_double(), Some(0.0));

        let mut data = Data::integer(50);
        assert!(data.assign("MAXITER", &OptionValue::Float(2.5)).is_err());
        assert_eq!(data.to_integer(), Some(50));
        assert!(!data.has_changed());
    }

    #[test]
    fn test_exported_and_reset() {
        let mut data = Data::boolean(true);
        assert_eq!(data.exported(), OptionValue::Int(1));
        data.assign("PUREAM", &OptionValue::Bool(false)).unwrap();
        assert_eq!(data.exported(), OptionValue::Int(0));
        data.reset();
        assert_eq!(data.to_bool(), Some(true));
        assert!(!data.has_changed());
    }

    #[test]
    fn test_array_replaces_contents() {
        let mut data = Data::array();
        data.assign("DOCC", &OptionValue::Array(vec![3.0, 0.0, 1.0, 1.0]))
            .unwrap();
        data.assign("DOCC", &OptionValue::Array(vec![5.0])).unwrap();
        assert_eq!(data.to_array(), Some(&[5.0][..]));
        assert!(data.assign("DOCC", &OptionValue::from("5")).is_err());
    }
}
