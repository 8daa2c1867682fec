//! End-to-end scoring scenarios over JSON catalogs.
//!
//! 1. Fixed points per item over a report's records
//! 2. Formula over a seeded context variable, and its unresolved case
//! 3. Conditional dispatch on zero / nonzero tests
//! 4. Failed sessions keep earlier context writes
//! 5. Dossier built from a session, then corrected

use rust_decimal::Decimal;
use saep_domain::{ActivityReport, Note, Record, Score, Value};
use saep_eval::{Context, Engine, EvalError, Resolution, RuleCatalog, ScoringSession};
use serde_json::json;

// ──────────────────────────────────────────────
// Fixtures
// ──────────────────────────────────────────────

fn resolution() -> Resolution {
    serde_json::from_value(json!({
        "id": "CONSUNI-32/2017",
        "name": "Resolução 32/2017",
        "description": "Critérios de progressão e promoção docente",
        "approved_on": "2017-06-30",
        "rules": [
            {
                "code": "AULAS",
                "variable": "pontosAula",
                "kind": "fixed_points_per_item",
                "points_per_item": "10",
                "report_kind": "aula"
            },
            {
                "code": "ARTIGOS",
                "variable": "pontosArtigo",
                "kind": "fixed_points_per_item",
                "points_per_item": "15.5",
                "report_kind": "artigo"
            },
            {
                "code": "CHA",
                "variable": "pontosCHA",
                "kind": "formula",
                "expression": "10 * (cha / 32)",
                "depends_on": ["cha"]
            },
            {
                "code": "TOTAL",
                "variable": "total",
                "kind": "formula",
                "expression": "pontosAula + pontosArtigo",
                "depends_on": ["pontosAula", "pontosArtigo"],
                "max": "40"
            },
            {
                "code": "BONUS",
                "variable": "bonus",
                "kind": "formula",
                "expression": "5",
                "depends_on": []
            },
            {
                "code": "SEM_BONUS",
                "variable": "bonus",
                "kind": "formula",
                "expression": "0",
                "depends_on": []
            },
            {
                "code": "FINAL",
                "variable": "pontosFinal",
                "kind": "conditional",
                "test": "pontosArtigo",
                "then_rule": "BONUS",
                "else_rule": "SEM_BONUS"
            }
        ]
    }))
    .unwrap()
}

fn report(aulas: usize, artigos: usize) -> ActivityReport {
    let mut records = Vec::new();
    for i in 0..aulas {
        records.push(Record::new(
            "aula",
            [("cha", Value::from(60)), ("turma", Value::from(format!("T{}", i)))],
        ));
    }
    for _ in 0..artigos {
        records.push(Record::new("artigo", [("qualis", Value::from("A2"))]));
    }
    ActivityReport::new("radoc-2016", 2016, records)
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// ──────────────────────────────────────────────
// Scenarios
// ──────────────────────────────────────────────

#[test]
fn catalog_is_valid() {
    let r = resolution();
    assert!(r.validate().is_ok());
    assert_eq!(r.rules().len(), 7);
    assert!(r.rule("FINAL").is_some());
}

#[test]
fn fixed_points_three_items() {
    let r = resolution();
    let radoc = report(3, 0);
    let mut ctx = Context::new();
    let score = Engine::new()
        .evaluate(&r, &mut ctx, "AULAS", Some(radoc.records.as_slice()))
        .unwrap();
    assert_eq!(score, Score::new("pontosAula", Value::from(30)).unwrap());
    assert_eq!(ctx.get("pontosAula"), Some(&Value::from(30)));
}

#[test]
fn fractional_points_stay_exact() {
    let r = resolution();
    let radoc = report(0, 3);
    let score = saep_eval::evaluate(&r, &mut Context::new(), "ARTIGOS", Some(radoc.records.as_slice()))
        .unwrap();
    assert_eq!(score.value(), &Value::Number(dec("46.5")));
}

#[test]
fn formula_over_seeded_context() {
    let r = resolution();
    let mut ctx = Context::with_variables([("cha", Value::from(64))]);
    let score = Engine::new().evaluate(&r, &mut ctx, "CHA", None).unwrap();
    assert_eq!(score.value(), &Value::from(20));

    let err = Engine::new()
        .evaluate(&r, &mut Context::new(), "CHA", None)
        .unwrap_err();
    assert_eq!(err, EvalError::UnresolvedDependency { name: "cha".into() });
    assert_eq!(err.to_string(), "unresolved dependency: cha");
}

#[test]
fn conditional_dispatch() {
    let r = resolution();

    let none = report(1, 0);
    let mut session = ScoringSession::new(&r);
    session
        .evaluate_sequence(["ARTIGOS", "FINAL"], Some(none.records.as_slice()))
        .unwrap();
    assert_eq!(session.context().get("pontosFinal"), Some(&Value::from(0)));
    assert_eq!(session.context().get("bonus"), Some(&Value::from(0)));

    let some = report(0, 2);
    let mut session = ScoringSession::new(&r);
    session
        .evaluate_sequence(["ARTIGOS", "FINAL"], Some(some.records.as_slice()))
        .unwrap();
    assert_eq!(session.context().get("pontosFinal"), Some(&Value::from(5)));
    assert_eq!(session.context().get("bonus"), Some(&Value::from(5)));
}

#[test]
fn total_is_capped() {
    let r = resolution();
    let radoc = report(3, 2);
    let mut session = ScoringSession::new(&r);
    let scores = session
        .evaluate_sequence(["AULAS", "ARTIGOS", "TOTAL"], Some(radoc.records.as_slice()))
        .unwrap();
    assert_eq!(scores[2].value(), &Value::from(40));
}

#[test]
fn failed_session_keeps_partial_context() {
    let r = resolution();
    let radoc = report(2, 0);
    let mut session = ScoringSession::new(&r);
    let err = session
        .evaluate_sequence(["AULAS", "TOTAL"], Some(radoc.records.as_slice()))
        .unwrap_err();
    assert_eq!(
        err,
        EvalError::UnresolvedDependency {
            name: "pontosArtigo".into()
        }
    );
    assert_eq!(session.context().get("pontosAula"), Some(&Value::from(20)));
}

#[test]
fn unknown_code_and_missing_records() {
    let r = resolution();
    let engine = Engine::new();
    assert_eq!(
        engine
            .evaluate(&r, &mut Context::new(), "XYZ", None)
            .unwrap_err(),
        EvalError::UnknownRuleCode { code: "XYZ".into() }
    );
    assert_eq!(
        engine
            .evaluate(&r, &mut Context::new(), "AULAS", None)
            .unwrap_err(),
        EvalError::MissingInput {
            rule: "AULAS".into()
        }
    );
}

#[test]
fn dossier_from_session_then_corrected() {
    let r = resolution();
    let radoc = report(2, 1);
    let mut session = ScoringSession::new(&r);
    session
        .evaluate_sequence(["AULAS", "ARTIGOS", "TOTAL"], Some(radoc.records.as_slice()))
        .unwrap();
    let mut dossier = session
        .into_dossier("parecer-7", r.id(), vec![radoc.id.clone()], "Progressão nível II")
        .unwrap();
    assert!(dossier.references_report("radoc-2016"));

    let original = dossier.score("total").cloned().unwrap();
    assert_eq!(original.value(), &Value::Number(dec("35.5")));
    let replacement = Score::new("total", Value::from(36)).unwrap();
    dossier.apply_correction(Note::new(original.clone(), replacement, "artigo em dobro").unwrap());

    assert_eq!(dossier.score("total"), Some(&original));
    let effective = dossier.effective_scores();
    assert_eq!(effective[2].value(), &Value::from(36));
}
