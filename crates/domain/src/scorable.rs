//! Uniform named-attribute lookup over evidence records and single scores.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value::Value;

/// Anything that can be probed for a named attribute.
///
/// An unknown name is `None`, never an error: callers distinguish
/// "absent" from "present but of the wrong type" by calling the typed
/// accessors on the returned [`Value`].
pub trait Scorable {
    fn get(&self, name: &str) -> Option<&Value>;
}

// ──────────────────────────────────────────────
// Record
// ──────────────────────────────────────────────

/// One piece of evidence: a bag of named values tagged with the kind of
/// report it came from (for example a class taught or an article
/// published). Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    kind: String,
    attributes: BTreeMap<String, Value>,
}

impl Record {
    pub fn new<I, K>(kind: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Record {
            kind: kind.into(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        }
    }

    /// The report-kind code classifying this record's evidence source.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }
}

impl Scorable for Record {
    fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

// ──────────────────────────────────────────────
// Score
// ──────────────────────────────────────────────

/// A single named result, such as the points a dossier earned for one rule.
///
/// Construction is the only validation point: a `Score` always has a
/// non-empty name and a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawScore")]
pub struct Score {
    name: String,
    value: Value,
}

impl Score {
    /// Builds a score, failing with `RequiredFieldMissing("nome")` for an
    /// empty name and `RequiredFieldMissing("valor")` for a missing value.
    pub fn new(name: impl Into<String>, value: impl Into<Option<Value>>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::required("nome"));
        }
        let value = value.into().ok_or_else(|| DomainError::required("valor"))?;
        Ok(Score { name, value })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl Scorable for Score {
    fn get(&self, name: &str) -> Option<&Value> {
        (self.name == name).then_some(&self.value)
    }
}

#[derive(Deserialize)]
struct RawScore {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: Option<Value>,
}

impl TryFrom<RawScore> for Score {
    type Error = DomainError;

    fn try_from(raw: RawScore) -> Result<Self, Self::Error> {
        Score::new(raw.name.unwrap_or_default(), raw.value)
    }
}
