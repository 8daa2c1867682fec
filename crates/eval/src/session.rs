//! Scoring sessions: one context, one catalog, one evidence set.

use saep_domain::{DomainError, Dossier, Record, Score};

use crate::catalog::RuleCatalog;
use crate::context::Context;
use crate::engine::Engine;
use crate::error::EvalError;
use crate::expression::{ExpressionEvaluator, StandardEvaluator};
use crate::provenance::RuleTrace;

/// Owns the context for one dossier's worth of rule evaluations.
///
/// Scores are kept in evaluation order. Re-evaluating a rule that writes
/// an existing score name replaces that score in place. After a failed
/// evaluation the session's context may hold partial results and the
/// session should be dropped.
pub struct ScoringSession<'c, C: RuleCatalog + ?Sized, E = StandardEvaluator> {
    catalog: &'c C,
    engine: Engine<E>,
    context: Context,
    scores: Vec<Score>,
    trace: Vec<RuleTrace>,
}

impl<'c, C: RuleCatalog + ?Sized> ScoringSession<'c, C, StandardEvaluator> {
    pub fn new(catalog: &'c C) -> Self {
        ScoringSession::with_engine(catalog, Engine::new())
    }
}

impl<'c, C: RuleCatalog + ?Sized, E: ExpressionEvaluator> ScoringSession<'c, C, E> {
    pub fn with_engine(catalog: &'c C, engine: Engine<E>) -> Self {
        ScoringSession {
            catalog,
            engine,
            context: Context::new(),
            scores: Vec::new(),
            trace: Vec::new(),
        }
    }

    /// Seed the session with externally supplied variables.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn evaluate(&mut self, code: &str, records: Option<&[Record]>) -> Result<Score, EvalError> {
        let (score, trace) =
            self.engine
                .evaluate_traced(self.catalog, &mut self.context, code, records)?;
        self.trace.extend(trace);
        match self.scores.iter_mut().find(|s| s.name() == score.name()) {
            Some(existing) => *existing = score.clone(),
            None => self.scores.push(score.clone()),
        }
        Ok(score)
    }

    /// Evaluate `codes` in the given order, stopping at the first failure.
    pub fn evaluate_sequence<I, S>(
        &mut self,
        codes: I,
        records: Option<&[Record]>,
    ) -> Result<&[Score], EvalError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for code in codes {
            let code = code.as_ref();
            if let Err(err) = self.evaluate(code, records) {
                tracing::debug!(rule = %code, error = %err, "evaluation aborted");
                return Err(err);
            }
        }
        Ok(&self.scores)
    }

    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Every rule evaluated so far, including conditional branches.
    pub fn trace(&self) -> &[RuleTrace] {
        &self.trace
    }

    /// Build a dossier holding this session's scores and no corrections.
    pub fn into_dossier(
        self,
        id: impl Into<String>,
        resolution_id: impl Into<String>,
        report_ids: Vec<String>,
        grounds: impl Into<String>,
    ) -> Result<Dossier, DomainError> {
        Dossier::new(id, resolution_id, report_ids, self.scores, grounds, Vec::new())
    }
}
