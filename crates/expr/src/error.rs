use saep_domain::DomainError;

/// Errors surfaced by parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    /// The expression text is malformed. `position` is a character offset.
    #[error("parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// The expression references a name absent from the bindings.
    #[error("undefined variable: {name}")]
    UndefinedVariable { name: String },

    /// The expression is well formed but cannot be computed (division by
    /// zero, overflow, operator applied to the wrong type, ...).
    #[error("evaluation error: {message}")]
    Evaluation { message: String },
}

impl ExprError {
    pub(crate) fn parse(position: usize, message: impl Into<String>) -> Self {
        ExprError::Parse {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn eval(message: impl Into<String>) -> Self {
        ExprError::Evaluation {
            message: message.into(),
        }
    }
}

impl From<DomainError> for ExprError {
    fn from(e: DomainError) -> Self {
        ExprError::eval(e.to_string())
    }
}
