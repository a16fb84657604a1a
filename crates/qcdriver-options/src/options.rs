//! Scoped option store
//!
//! Options live in two scopes. The global scope holds cross-module defaults;
//! every module additionally owns a local scope. Reads go through
//! [`Options::get`], which resolves a key against the current module's local
//! scope and the global scope:
//!
//! 1. declared in neither scope: error
//! 2. only global: the global slot
//! 3. both: the local slot if it changed, else the global slot if it changed,
//!    else the local slot
//! 4. only local: the local slot
//!
//! Keys are case-insensitive and stored upper-cased.

use crate::data::Data;
use crate::value::OptionValue;
use qcdriver_core::{Error, Result};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::debug;

type Scope = BTreeMap<String, Data>;

/// Option store with global and per-module scopes
#[derive(Debug, Clone, Default)]
pub struct Options {
    globals: Scope,
    locals: BTreeMap<String, Scope>,
    current_module: String,
    read_globals: bool,
}

impl Options {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Module whose local scope reads and `set_local` target
    pub fn current_module(&self) -> &str {
        &self.current_module
    }

    /// Switch the active module
    pub fn set_current_module(&mut self, name: impl Into<String>) {
        self.current_module = name.into();
    }

    /// Whether declarations currently go to the global scope
    pub fn read_globals(&self) -> bool {
        self.read_globals
    }

    /// Route subsequent declarations to the global scope (`true`) or the current module (`false`)
    pub fn set_read_globals(&mut self, read_globals: bool) {
        self.read_globals = read_globals;
    }

    /// Declare a string option; `choices` is a space separated list, empty for free text
    pub fn add_str(&mut self, key: &str, default: &str, choices: &str) {
        self.declare(key, Data::string(default, choices));
    }

    /// Declare a boolean option
    pub fn add_bool(&mut self, key: &str, default: bool) {
        self.declare(key, Data::boolean(default));
    }

    /// Declare an integer option
    pub fn add_int(&mut self, key: &str, default: i64) {
        self.declare(key, Data::integer(default));
    }

    /// Declare a double option
    pub fn add_double(&mut self, key: &str, default: f64) {
        self.declare(key, Data::double(default));
    }

    /// Declare an array option
    pub fn add_array(&mut self, key: &str) {
        self.declare(key, Data::array());
    }

    /// Declare `data` under `key` in the active declaration scope
    ///
    /// Re-declaring a key whose value was already changed keeps that value.
    pub fn declare(&mut self, key: &str, data: Data) {
        let key = normalize(key);
        let scope = if self.read_globals {
            &mut self.globals
        } else {
            self.locals.entry(self.current_module.clone()).or_default()
        };
        if scope.get(&key).is_some_and(Data::has_changed) {
            return;
        }
        debug!(option = %key, kind = %data.kind(), global = self.read_globals, "Option declared");
        scope.insert(key, data);
    }

    /// Assign a value in the current module's local scope
    ///
    /// A key declared only globally gets a local copy of its declaration first.
    pub fn set_local(&mut self, key: &str, value: impl Into<OptionValue>) -> Result<()> {
        let key = normalize(key);
        let value = value.into();
        let declared_globally = self.globals.get(&key).cloned();
        let scope = self.locals.entry(self.current_module.clone()).or_default();

        if let Some(data) = scope.get_mut(&key) {
            return data.assign(&key, &value);
        }

        let mut data = declared_globally.ok_or_else(|| Error::OptionNotFound(key.clone()))?;
        data.reset();
        data.assign(&key, &value)?;
        scope.insert(key, data);
        Ok(())
    }

    /// Assign a value in the global scope
    ///
    /// A key declared only in the current module gets a global copy of its declaration first.
    pub fn set_global(&mut self, key: &str, value: impl Into<OptionValue>) -> Result<()> {
        let key = normalize(key);
        let value = value.into();

        if let Some(data) = self.globals.get_mut(&key) {
            return data.assign(&key, &value);
        }

        let mut data = self
            .active_locals()
            .and_then(|scope| scope.get(&key))
            .cloned()
            .ok_or_else(|| Error::OptionNotFound(key.clone()))?;
        data.reset();
        data.assign(&key, &value)?;
        self.globals.insert(key, data);
        Ok(())
    }

    /// Resolve a key for the current module (see the module docs for the rule)
    pub fn get(&self, key: &str) -> Result<&Data> {
        let key = normalize(key);
        let local = self.active_locals().and_then(|scope| scope.get(&key));
        let global = self.globals.get(&key);

        match (local, global) {
            (None, None) => Err(Error::OptionNotFound(key)),
            (None, Some(global)) => Ok(global),
            (Some(local), Some(global)) => {
                if local.has_changed() || !global.has_changed() {
                    Ok(local)
                } else {
                    Ok(global)
                }
            }
            (Some(local), None) => Ok(local),
        }
    }

    /// Read a key from the global scope only
    pub fn get_global(&self, key: &str) -> Result<&Data> {
        let key = normalize(key);
        self.globals.get(&key).ok_or(Error::OptionNotFound(key))
    }

    /// Read a key from a module's local scope only
    pub fn get_local(&self, module: &str, key: &str) -> Option<&Data> {
        self.locals.get(module)?.get(&normalize(key))
    }

    /// Whether the key resolves for the current module
    pub fn exists(&self, key: &str) -> bool {
        self.get(key).is_ok()
    }

    /// Boolean value of a resolved key
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        let data = self.get(key)?;
        data.to_bool()
            .ok_or_else(|| Error::option_type(normalize(key), "option is not a boolean"))
    }

    /// Integer value of a resolved key
    pub fn get_int(&self, key: &str) -> Result<i64> {
        let data = self.get(key)?;
        data.to_integer()
            .ok_or_else(|| Error::option_type(normalize(key), "option is not an integer"))
    }

    /// Double value of a resolved key
    pub fn get_double(&self, key: &str) -> Result<f64> {
        let data = self.get(key)?;
        data.to_double()
            .ok_or_else(|| Error::option_type(normalize(key), "option is not a double"))
    }

    /// String value of a resolved key
    pub fn get_str(&self, key: &str) -> Result<&str> {
        let data = self.get(key)?;
        data.to_str()
            .ok_or_else(|| Error::option_type(normalize(key), "option is not a string"))
    }

    /// Keys declared in the global scope
    pub fn global_keys(&self) -> impl Iterator<Item = &str> {
        self.globals.keys().map(String::as_str)
    }

    /// Keys declared in a module's local scope
    pub fn module_keys<'a>(&'a self, module: &str) -> impl Iterator<Item = &'a str> {
        self.locals
            .get(module)
            .into_iter()
            .flat_map(|scope| scope.keys().map(String::as_str))
    }

    /// Render the current module's local options
    pub fn print(&self) -> String {
        let title = format!("Options for module {}", self.current_module);
        match self.active_locals() {
            Some(scope) => render(&title, scope),
            None => render(&title, &Scope::new()),
        }
    }

    /// Render the global options
    pub fn print_globals(&self) -> String {
        render("Global options", &self.globals)
    }

    fn active_locals(&self) -> Option<&Scope> {
        self.locals.get(&self.current_module)
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_uppercase()
}

fn render(title: &str, scope: &Scope) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  {title}:");
    let _ = writeln!(out, "  {}", "-".repeat(title.len() + 1));
    for (key, data) in scope {
        let marker = if data.has_changed() { " !" } else { "" };
        let _ = writeln!(out, "  {key:<28} => {}{marker}", data.value());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Options {
        let mut options = Options::new();
        options.set_read_globals(true);
        options.add_str("REFERENCE", "RHF", "RHF ROHF UHF");
        options.add_int("PRINT", 1);
        options.add_bool("DIIS", true);
        options.set_read_globals(false);

        options.set_current_module("SCF");
        options.add_int("MAXITER", 100);
        options.add_int("PRINT", 1);
        options
    }

    #[test]
    fn test_unknown_key() {
        let options = store();
        assert!(matches!(
            options.get("nope"),
            Err(Error::OptionNotFound(key)) if key == "NOPE"
        ));
    }

    #[test]
    fn test_keys_are_case_insensitive() {
        let mut options = store();
        options.set_local("maxiter", 40).unwrap();
        assert_eq!(options.get_int("MaxIter").unwrap(), 40);
    }

    #[test]
    fn test_global_only_key() {
        let options = store();
        assert_eq!(options.get_str("reference").unwrap(), "RHF");
    }

    #[test]
    fn test_resolution_prefers_changed_scope() {
        let mut options = store();

        // Neither changed: local wins.
        assert!(std::ptr::eq(
            options.get("PRINT").unwrap(),
            options.get_local("SCF", "PRINT").unwrap()
        ));

        // Global changed, local untouched: global wins.
        options.set_global("PRINT", 3).unwrap();
        assert_eq!(options.get_int("PRINT").unwrap(), 3);

        // Local changed: local wins.
        options.set_local("PRINT", 5).unwrap();
        assert_eq!(options.get_int("PRINT").unwrap(), 5);
        assert_eq!(options.get_global("PRINT").unwrap().to_integer(), Some(3));
    }

    #[test]
    fn test_local_scope_is_per_module() {
        let mut options = store();
        options.set_local("MAXITER", 7).unwrap();

        options.set_current_module("CCENERGY");
        assert!(options.get("MAXITER").is_err());

        options.set_current_module("SCF");
        assert_eq!(options.get_int("MAXITER").unwrap(), 7);
    }

    #[test]
    fn test_set_local_copies_global_declaration() {
        let mut options = store();
        options.set_local("reference", "uhf").unwrap();
        assert_eq!(options.get_str("REFERENCE").unwrap(), "UHF");
        assert_eq!(options.get_global("REFERENCE").unwrap().to_str(), Some("RHF"));

        let err = options.set_local("REFERENCE", "xhf").unwrap_err();
        assert!(matches!(err, Error::InvalidChoice { .. }));
        assert_eq!(options.get_str("REFERENCE").unwrap(), "UHF");
    }

    #[test]
    fn test_set_global_copies_local_declaration() {
        let mut options = store();
        options.set_global("MAXITER", 12).unwrap();
        assert_eq!(options.get_global("MAXITER").unwrap().to_integer(), Some(12));
        assert!(options.set_global("UNDECLARED", 1).is_err());
    }

    #[test]
    fn test_failed_boolean_write_leaves_prior_value() {
        let mut options = store();
        options.set_global("DIIS", "off").unwrap();
        assert!(options.set_global("DIIS", "perhaps").is_err());
        assert!(!options.get_bool("DIIS").unwrap());

        // The failed local write must not create a local slot either.
        assert!(options.set_local("DIIS", "perhaps").is_err());
        assert!(options.get_local("SCF", "DIIS").is_none());
    }

    #[test]
    fn test_redeclare_keeps_changed_value() {
        let mut options = store();
        options.set_local("MAXITER", 9).unwrap();
        options.add_int("MAXITER", 100);
        assert_eq!(options.get_int("MAXITER").unwrap(), 9);

        options.add_int("PRINT", 2);
        assert_eq!(
            options.get_local("SCF", "PRINT").unwrap().default_value(),
            &OptionValue::Int(2)
        );
    }

    #[test]
    fn test_print() {
        let mut options = store();
        options.set_local("MAXITER", 9).unwrap();
        let printed = options.print();
        assert!(printed.contains("Options for module SCF"));
        assert!(printed.contains("MAXITER"));
        assert!(options.print_globals().contains("REFERENCE"));
    }
}
