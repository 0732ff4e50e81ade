use crate::error::{BasicError, ExecResult};
use std::collections::HashMap;

/// Integer type of every BASIC variable and expression.
pub type Value = i64;

/// Variable storage for one interpreter session.
///
/// The environment contains:
/// - `vars`: the integer value bound to each variable name.
/// - `should_exit`: a flag that a REPL loop can check to know when to terminate.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, Value>,
    /// Set by `QUIT`; the command loop stops once it sees this.
    pub should_exit: bool,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value of a variable, failing when it was never assigned.
    pub fn get(&self, name: &str) -> ExecResult<Value> {
        self.vars
            .get(name)
            .copied()
            .ok_or_else(|| BasicError::UndefinedVariable(name.to_string()))
    }

    /// Set or override a variable.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Forget every variable. The exit flag is left alone.
    pub fn clear(&mut self) {
        self.vars.clear();
    }
}
