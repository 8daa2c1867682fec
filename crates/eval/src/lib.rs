//! SAEP scoring engine -- applies a catalog of named rules to evidence
//! records, threading intermediate results through a per-session
//! context.
//!
//! Three rule kinds exist: fixed points per evidence item, formulas over
//! context variables, and conditionals that dispatch to another rule.
//! The engine never evaluates a producer rule on its own; callers run
//! rules in dependency order, usually through a [`ScoringSession`].

pub mod catalog;
pub mod context;
pub mod engine;
pub mod error;
pub mod expression;
pub mod numeric;
pub mod provenance;
pub mod rule;
pub mod session;

pub use catalog::{CatalogError, Resolution, RuleCatalog};
pub use context::Context;
pub use engine::{Engine, EngineOptions, DEFAULT_MAX_BRANCH_DEPTH};
pub use error::EvalError;
pub use expression::{ExpressionEvaluator, StandardEvaluator};
pub use provenance::RuleTrace;
pub use rule::{Rule, RuleKind};
pub use session::ScoringSession;

use saep_domain::{Record, Score};

/// Evaluate one rule with the standard expression language.
///
/// Shorthand for `Engine::new().evaluate(..)`.
pub fn evaluate<C: RuleCatalog + ?Sized>(
    catalog: &C,
    context: &mut Context,
    code: &str,
    records: Option<&[Record]>,
) -> Result<Score, EvalError> {
    Engine::new().evaluate(catalog, context, code, records)
}
