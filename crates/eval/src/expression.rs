//! Expression evaluator capability consumed by formula and conditional
//! rules.

use saep_domain::Value;
use saep_expr::{Bindings, ExprError, Expression};

// ──────────────────────────────────────────────
// Trait
// ──────────────────────────────────────────────

/// Evaluates textual expressions against named bindings.
///
/// Errors are returned as `ExprError` and surfaced by the engine
/// unchanged.
pub trait ExpressionEvaluator {
    fn evaluate(&self, expression: &str, bindings: &Bindings) -> Result<Value, ExprError>;

    /// Names the expression reads, used to bind a conditional test that
    /// declares no dependencies of its own.
    fn variables(&self, expression: &str) -> Result<Vec<String>, ExprError>;
}

impl<E: ExpressionEvaluator + ?Sized> ExpressionEvaluator for &E {
    fn evaluate(&self, expression: &str, bindings: &Bindings) -> Result<Value, ExprError> {
        (**self).evaluate(expression, bindings)
    }

    fn variables(&self, expression: &str) -> Result<Vec<String>, ExprError> {
        (**self).variables(expression)
    }
}

// ──────────────────────────────────────────────
// StandardEvaluator
// ──────────────────────────────────────────────

/// The decimal expression language from `saep-expr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEvaluator;

impl ExpressionEvaluator for StandardEvaluator {
    fn evaluate(&self, expression: &str, bindings: &Bindings) -> Result<Value, ExprError> {
        Expression::parse(expression)?.evaluate(bindings)
    }

    fn variables(&self, expression: &str) -> Result<Vec<String>, ExprError> {
        Ok(Expression::parse(expression)?
            .variables()
            .into_iter()
            .map(str::to_string)
            .collect())
    }
}
