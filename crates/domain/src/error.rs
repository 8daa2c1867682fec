/// Errors raised while constructing or reading domain values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A mandatory field was absent or empty at construction time.
    ///
    /// `field` carries the field's name as it appears in SAEP documents
    /// (`nome`, `valor`, `origem`, `destino`, `justificativa`, ...).
    #[error("required field not provided: {field}")]
    RequiredFieldMissing { field: &'static str },

    /// A typed accessor was used on a value holding a different variant.
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },
}

impl DomainError {
    pub(crate) fn required(field: &'static str) -> Self {
        DomainError::RequiredFieldMissing { field }
    }
}
