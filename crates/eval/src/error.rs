use saep_domain::DomainError;
use saep_expr::ExprError;

/// Errors that can occur while evaluating a rule.
///
/// Evaluation stops at the first error. Context writes made before the
/// failure are kept; the session that produced them should be discarded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// A fixed-points-per-item rule was evaluated without records.
    #[error("rule '{rule}' counts evidence records but none were supplied")]
    MissingInput { rule: String },

    /// A declared dependency has no value in the context yet. The engine
    /// never evaluates producer rules on its own.
    #[error("unresolved dependency: {name}")]
    UnresolvedDependency { name: String },

    /// No rule with this code exists in the catalog.
    #[error("unknown rule code: {code}")]
    UnknownRuleCode { code: String },

    /// A conditional rule's branches lead back to a rule already being
    /// evaluated.
    #[error("conditional rule '{code}' branches back into itself")]
    CyclicBranch { code: String },

    /// Conditional branches nest deeper than the configured limit.
    #[error("branch depth limit {limit} exceeded at rule '{code}'")]
    BranchDepthExceeded { code: String, limit: usize },

    /// A computed point total does not fit the decimal type.
    #[error("numeric overflow in rule '{rule}'")]
    Overflow { rule: String },

    /// Raised by the expression evaluator; passed through unchanged.
    #[error(transparent)]
    Expression(#[from] ExprError),

    /// A value had the wrong type, or a score could not be built.
    #[error(transparent)]
    Value(#[from] DomainError),
}
