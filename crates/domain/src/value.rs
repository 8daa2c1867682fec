//! The tagged scalar every score, record attribute and context variable holds.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A scalar produced or consumed by scoring.
///
/// Numbers are `rust_decimal::Decimal` -- never `f64` -- so that point
/// totals chained across many rules do not accumulate binary rounding
/// error. There is no implicit coercion between variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Number(Decimal),
    Boolean(bool),
    Text(String),
}

impl Value {
    /// Returns a human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Boolean(_) => "Boolean",
            Value::Text(_) => "Text",
        }
    }

    /// Extracts the number or returns a type error.
    pub fn as_number(&self) -> Result<Decimal, DomainError> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(other.mismatch("Number")),
        }
    }

    /// Extracts the boolean or returns a type error.
    pub fn as_bool(&self) -> Result<bool, DomainError> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(other.mismatch("Boolean")),
        }
    }

    /// Borrows the text or returns a type error.
    pub fn as_text(&self) -> Result<&str, DomainError> {
        match self {
            Value::Text(t) => Ok(t),
            other => Err(other.mismatch("Text")),
        }
    }

    /// Truthiness used by conditional branching: a number is true when
    /// nonzero, a boolean is itself. Text has no truth value.
    pub fn is_truthy(&self) -> Result<bool, DomainError> {
        match self {
            Value::Number(n) => Ok(!n.is_zero()),
            Value::Boolean(b) => Ok(*b),
            Value::Text(_) => Err(self.mismatch("Number or Boolean")),
        }
    }

    /// Interprets command-line or form input: `true`/`false` become
    /// booleans, anything that parses as a decimal becomes a number, and
    /// everything else is kept as text.
    pub fn parse_literal(input: &str) -> Value {
        let trimmed = input.trim();
        match trimmed {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => match Decimal::from_str(trimmed) {
                Ok(n) => Value::Number(n),
                Err(_) => Value::Text(input.to_string()),
            },
        }
    }

    fn mismatch(&self, expected: &'static str) -> DomainError {
        DomainError::TypeMismatch {
            expected,
            got: self.type_name(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n.normalize()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Text(t) => f.write_str(t),
        }
    }
}

impl From<Decimal> for Value {
    fn from(n: Decimal) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Decimal::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}
