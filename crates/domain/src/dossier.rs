//! The dossier (parecer): scores for one evaluation plus their correction
//! history.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::note::Note;
use crate::scorable::Score;

/// Aggregate owning the scores computed under one resolution, the
/// activity reports they were computed from, free-text grounds and the
/// append-only list of corrections.
///
/// Corrections never rewrite `scores`; they are kept as an audit log and
/// overlaid on demand by [`Dossier::effective_scores`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDossier")]
pub struct Dossier {
    id: String,
    resolution_id: String,
    report_ids: Vec<String>,
    scores: Vec<Score>,
    grounds: String,
    notes: Vec<Note>,
}

impl Dossier {
    pub fn new(
        id: impl Into<String>,
        resolution_id: impl Into<String>,
        report_ids: Vec<String>,
        scores: Vec<Score>,
        grounds: impl Into<String>,
        notes: Vec<Note>,
    ) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::required("id"));
        }
        let resolution_id = resolution_id.into();
        if resolution_id.trim().is_empty() {
            return Err(DomainError::required("resolucao"));
        }
        Ok(Dossier {
            id,
            resolution_id,
            report_ids,
            scores,
            grounds: grounds.into(),
            notes,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn resolution_id(&self) -> &str {
        &self.resolution_id
    }

    pub fn report_ids(&self) -> &[String] {
        &self.report_ids
    }

    /// Scores in the order their rules were evaluated.
    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    pub fn grounds(&self) -> &str {
        &self.grounds
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// The stored score with the given name, ignoring corrections.
    pub fn score(&self, name: &str) -> Option<&Score> {
        self.scores.iter().find(|s| s.name() == name)
    }

    pub fn references_report(&self, report_id: &str) -> bool {
        self.report_ids.iter().any(|r| r == report_id)
    }

    pub fn update_grounds(&mut self, grounds: impl Into<String>) {
        self.grounds = grounds.into();
    }

    /// Appends a correction. The score list is left untouched.
    pub fn apply_correction(&mut self, note: Note) {
        tracing::debug!(
            dossier = %self.id,
            score = note.original().name(),
            from = %note.original().value(),
            to = %note.replacement().value(),
            "correction applied"
        );
        self.notes.push(note);
    }

    /// Removes the first correction whose original equals `original`.
    ///
    /// Returns the removed note, or `None` (leaving the list unchanged)
    /// when nothing matches.
    pub fn remove_correction(&mut self, original: &Score) -> Option<Note> {
        match self.notes.iter().position(|n| n.corrects(original)) {
            Some(index) => Some(self.notes.remove(index)),
            None => {
                tracing::warn!(
                    dossier = %self.id,
                    score = original.name(),
                    "no correction matches the given original score"
                );
                None
            }
        }
    }

    /// Scores as they read after corrections: each stored score is
    /// replaced by the replacement of the most recent note correcting it.
    pub fn effective_scores(&self) -> Vec<Score> {
        self.scores
            .iter()
            .map(|score| {
                self.notes
                    .iter()
                    .rev()
                    .find(|n| n.corrects(score))
                    .map(|n| n.replacement().clone())
                    .unwrap_or_else(|| score.clone())
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct RawDossier {
    #[serde(default)]
    id: String,
    #[serde(default)]
    resolution_id: String,
    #[serde(default)]
    report_ids: Vec<String>,
    #[serde(default)]
    scores: Vec<Score>,
    #[serde(default)]
    grounds: String,
    #[serde(default)]
    notes: Vec<Note>,
}

impl TryFrom<RawDossier> for Dossier {
    type Error = DomainError;

    fn try_from(raw: RawDossier) -> Result<Self, Self::Error> {
        Dossier::new(
            raw.id,
            raw.resolution_id,
            raw.report_ids,
            raw.scores,
            raw.grounds,
            raw.notes,
        )
    }
}
