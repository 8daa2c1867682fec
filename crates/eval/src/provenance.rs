//! Provenance records for evaluation tracing.
//!
//! Each evaluated rule yields a [`RuleTrace`] recording what kind of rule
//! ran, which context variables it read, which branch a conditional took
//! and the value it stored.

use saep_domain::Value;
use serde::Serialize;

/// Provenance record for a single rule evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleTrace {
    /// Code of the rule that produced the result.
    pub rule: String,
    pub kind: &'static str,
    /// Context variable the result was stored under.
    pub variable: String,
    /// Context variables read while evaluating.
    pub variables_used: Vec<String>,
    /// Number of records counted (fixed points per item only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records_counted: Option<usize>,
    /// Code of the rule a conditional dispatched to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub result: Value,
}

/// Collector that tracks context reads during one rule evaluation.
#[derive(Debug, Clone, Default)]
pub struct ProvenanceCollector {
    pub variables_used: Vec<String>,
    pub records_counted: Option<usize>,
    pub branch: Option<String>,
}

impl ProvenanceCollector {
    pub fn new() -> Self {
        ProvenanceCollector::default()
    }

    /// Record a context variable read.
    pub fn record_variable(&mut self, name: &str) {
        if !self.variables_used.iter().any(|v| v == name) {
            self.variables_used.push(name.to_string());
        }
    }

    pub fn record_count(&mut self, count: usize) {
        self.records_counted = Some(count);
    }

    pub fn record_branch(&mut self, code: &str) {
        self.branch = Some(code.to_string());
    }

    /// Finalize into a RuleTrace.
    pub fn into_trace(
        self,
        rule: &str,
        kind: &'static str,
        variable: &str,
        result: Value,
    ) -> RuleTrace {
        RuleTrace {
            rule: rule.to_string(),
            kind,
            variable: variable.to_string(),
            variables_used: self.variables_used,
            records_counted: self.records_counted,
            branch: self.branch,
            result,
        }
    }
}
