//! Audited score corrections.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::scorable::Score;

/// A documented replacement of one score by another.
///
/// Notes are immutable. All three parts are mandatory: a note without an
/// original, a replacement or a justification cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNote")]
pub struct Note {
    original: Score,
    replacement: Score,
    justification: String,
}

impl Note {
    pub fn new(
        original: impl Into<Option<Score>>,
        replacement: impl Into<Option<Score>>,
        justification: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let original = original
            .into()
            .ok_or_else(|| DomainError::required("origem"))?;
        let replacement = replacement
            .into()
            .ok_or_else(|| DomainError::required("destino"))?;
        let justification = justification.into();
        if justification.trim().is_empty() {
            return Err(DomainError::required("justificativa"));
        }
        Ok(Note {
            original,
            replacement,
            justification,
        })
    }

    pub fn original(&self) -> &Score {
        &self.original
    }

    pub fn replacement(&self) -> &Score {
        &self.replacement
    }

    pub fn justification(&self) -> &str {
        &self.justification
    }

    /// Whether this note corrects exactly `score` (same name and value).
    pub fn corrects(&self, score: &Score) -> bool {
        &self.original == score
    }
}

#[derive(Deserialize)]
struct RawNote {
    #[serde(default)]
    original: Option<Score>,
    #[serde(default)]
    replacement: Option<Score>,
    #[serde(default)]
    justification: Option<String>,
}

impl TryFrom<RawNote> for Note {
    type Error = DomainError;

    fn try_from(raw: RawNote) -> Result<Self, Self::Error> {
        Note::new(
            raw.original,
            raw.replacement,
            raw.justification.unwrap_or_default(),
        )
    }
}
