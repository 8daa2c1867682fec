//! Per-session variable store bridging one rule's output to a later
//! rule's input.

use std::collections::BTreeMap;

use saep_domain::Value;
use saep_expr::Bindings;

use crate::error::EvalError;

/// Maps each variable name to the last value computed for it.
///
/// A context belongs to exactly one scoring session. It is mutated in
/// place by every evaluation and must not be shared between sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    variables: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    /// A context pre-seeded with externally supplied inputs.
    pub fn with_variables<I, K>(variables: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Context {
            variables: variables.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Binds `name`, replacing any value an earlier rule produced.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        tracing::trace!(variable = %name, value = %value, "context updated");
        self.variables.insert(name, value);
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Bindings for exactly `names`, failing on the first one not yet
    /// computed.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Bindings, EvalError> {
        let mut bindings = Bindings::new();
        for name in names {
            let name = name.as_ref();
            let value = self
                .variables
                .get(name)
                .ok_or_else(|| EvalError::UnresolvedDependency {
                    name: name.to_string(),
                })?;
            bindings.insert(name.to_string(), value.clone());
        }
        Ok(bindings)
    }

    /// Bindings for every variable currently in the context.
    pub fn snapshot(&self) -> Bindings {
        self.variables.clone()
    }
}
