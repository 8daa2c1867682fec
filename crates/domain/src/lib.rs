//! SAEP domain model: tagged values, evidence records, scores, activity
//! reports, dossiers and their score-correction audit trail.
//!
//! Everything here validates at construction time. A `Score`, `Note` or
//! `Dossier` that exists in memory is well formed, whether it was built
//! directly or deserialized.

pub mod dossier;
pub mod error;
pub mod note;
pub mod report;
pub mod scorable;
pub mod value;

pub use dossier::Dossier;
pub use error::DomainError;
pub use note::Note;
pub use report::ActivityReport;
pub use scorable::{Record, Scorable, Score};
pub use value::Value;
