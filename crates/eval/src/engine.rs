//! Rule dispatch.
//!
//! Evaluating a rule computes its value, clamps it into the rule's
//! bounds, writes it to the context under the rule's variable and returns
//! it as a [`Score`]. Formula and conditional rules read only variables
//! already present in the context; producer rules are never evaluated
//! implicitly, so the caller orders evaluations.

use saep_domain::{Record, Score, Value};

use crate::catalog::RuleCatalog;
use crate::context::Context;
use crate::error::EvalError;
use crate::expression::{ExpressionEvaluator, StandardEvaluator};
use crate::numeric;
use crate::provenance::{ProvenanceCollector, RuleTrace};
use crate::rule::{Rule, RuleKind};

pub const DEFAULT_MAX_BRANCH_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// How many conditional dispatches may nest below the rule the caller
    /// asked for.
    pub max_branch_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            max_branch_depth: DEFAULT_MAX_BRANCH_DEPTH,
        }
    }
}

/// Stateless rule dispatcher. All per-session state lives in the
/// [`Context`] passed to each call.
#[derive(Debug, Clone, Default)]
pub struct Engine<E = StandardEvaluator> {
    evaluator: E,
    options: EngineOptions,
}

impl Engine<StandardEvaluator> {
    pub fn new() -> Self {
        Engine::default()
    }
}

/// Rules currently being evaluated, outermost first.
type CallStack<'r> = Vec<&'r str>;

impl<E: ExpressionEvaluator> Engine<E> {
    pub fn with_evaluator(evaluator: E) -> Self {
        Engine {
            evaluator,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Evaluate the rule `code` from `catalog`.
    ///
    /// `records` is required by fixed-points-per-item rules, including
    /// those reached through a conditional branch. On failure, context
    /// writes already made by nested rules are kept.
    pub fn evaluate<C: RuleCatalog + ?Sized>(
        &self,
        catalog: &C,
        context: &mut Context,
        code: &str,
        records: Option<&[Record]>,
    ) -> Result<Score, EvalError> {
        self.evaluate_traced(catalog, context, code, records)
            .map(|(score, _)| score)
    }

    /// Like [`Engine::evaluate`], also returning one trace per rule run.
    /// Branch rules appear before the conditional that dispatched to them.
    pub fn evaluate_traced<C: RuleCatalog + ?Sized>(
        &self,
        catalog: &C,
        context: &mut Context,
        code: &str,
        records: Option<&[Record]>,
    ) -> Result<(Score, Vec<RuleTrace>), EvalError> {
        let mut traces = Vec::new();
        let mut stack = CallStack::new();
        let score = self.dispatch(catalog, context, code, records, &mut stack, &mut traces)?;
        Ok((score, traces))
    }

    fn dispatch<'r, C: RuleCatalog + ?Sized>(
        &self,
        catalog: &'r C,
        context: &mut Context,
        code: &str,
        records: Option<&[Record]>,
        stack: &mut CallStack<'r>,
        traces: &mut Vec<RuleTrace>,
    ) -> Result<Score, EvalError> {
        let rule = catalog
            .rule(code)
            .ok_or_else(|| EvalError::UnknownRuleCode {
                code: code.to_string(),
            })?;
        if stack.contains(&rule.code.as_str()) {
            return Err(EvalError::CyclicBranch {
                code: rule.code.clone(),
            });
        }
        if stack.len() > self.options.max_branch_depth {
            return Err(EvalError::BranchDepthExceeded {
                code: rule.code.clone(),
                limit: self.options.max_branch_depth,
            });
        }

        let mut collector = ProvenanceCollector::new();
        stack.push(rule.code.as_str());
        let computed = self.compute(rule, catalog, context, records, stack, traces, &mut collector);
        stack.pop();

        let value = numeric::clamp(computed?, rule.min, rule.max);
        tracing::debug!(
            rule = %rule.code,
            kind = rule.kind_name(),
            variable = %rule.variable,
            result = %value,
            "rule evaluated"
        );
        context.set(rule.variable.as_str(), value.clone());
        traces.push(collector.into_trace(&rule.code, rule.kind_name(), &rule.variable, value.clone()));
        Ok(Score::new(rule.variable.as_str(), value)?)
    }

    #[allow(clippy::too_many_arguments)]
    fn compute<'r, C: RuleCatalog + ?Sized>(
        &self,
        rule: &'r Rule,
        catalog: &'r C,
        context: &mut Context,
        records: Option<&[Record]>,
        stack: &mut CallStack<'r>,
        traces: &mut Vec<RuleTrace>,
        collector: &mut ProvenanceCollector,
    ) -> Result<Value, EvalError> {
        match &rule.kind {
            RuleKind::FixedPointsPerItem {
                points_per_item,
                report_kind,
            } => {
                let records = records.ok_or_else(|| EvalError::MissingInput {
                    rule: rule.code.clone(),
                })?;
                let count = match report_kind {
                    Some(kind) => records.iter().filter(|r| r.kind() == kind.as_str()).count(),
                    None => records.len(),
                };
                collector.record_count(count);
                let points = numeric::points_for(&rule.code, *points_per_item, count)?;
                Ok(Value::Number(points))
            }

            RuleKind::Formula {
                expression,
                depends_on,
            } => {
                let bindings = context.resolve(depends_on)?;
                for name in depends_on {
                    collector.record_variable(name);
                }
                Ok(self.evaluator.evaluate(expression, &bindings)?)
            }

            RuleKind::Conditional {
                test,
                depends_on,
                then_rule,
                else_rule,
            } => {
                let names = if depends_on.is_empty() {
                    self.evaluator.variables(test)?
                } else {
                    depends_on.clone()
                };
                let bindings = context.resolve(&names)?;
                for name in &names {
                    collector.record_variable(name);
                }

                let outcome = self.evaluator.evaluate(test, &bindings)?;
                let target = if outcome.is_truthy()? {
                    then_rule
                } else {
                    else_rule
                };
                tracing::trace!(rule = %rule.code, test = %outcome, branch = %target, "branch selected");
                collector.record_branch(target);

                let branch = self.dispatch(catalog, context, target, records, stack, traces)?;
                Ok(branch.into_value())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use saep_domain::DomainError;
    use saep_expr::ExprError;

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record::new("aula", [("turma", Value::from(i as i64))]))
            .collect()
    }

    #[test]
    fn fixed_points_multiplies_by_record_count() {
        let catalog = vec![Rule::fixed_points("R1", "pontosAula", Decimal::from(10))];
        let mut ctx = Context::new();
        let score = Engine::new()
            .evaluate(&catalog, &mut ctx, "R1", Some(records(3).as_slice()))
            .unwrap();
        assert_eq!(score.name(), "pontosAula");
        assert_eq!(score.value(), &Value::from(30));
        assert_eq!(ctx.get("pontosAula"), Some(&Value::from(30)));
    }

    #[test]
    fn fixed_points_without_records_is_missing_input() {
        let catalog = vec![Rule::fixed_points("R1", "p", Decimal::ONE)];
        let err = Engine::new()
            .evaluate(&catalog, &mut Context::new(), "R1", None)
            .unwrap_err();
        assert_eq!(err, EvalError::MissingInput { rule: "R1".into() });
    }

    #[test]
    fn fixed_points_with_empty_records_is_zero() {
        let catalog = vec![Rule::fixed_points("R1", "p", Decimal::TEN)];
        let score = Engine::new()
            .evaluate(&catalog, &mut Context::new(), "R1", Some(&[][..]))
            .unwrap();
        assert_eq!(score.value(), &Value::from(0));
    }

    #[test]
    fn fixed_points_filters_by_report_kind() {
        let catalog = vec![Rule::fixed_points_for_kind("R1", "p", Decimal::TEN, "artigo")];
        let mut input = records(2);
        input.push(Record::new("artigo", [("qualis", Value::from("A1"))]));
        let score = Engine::new()
            .evaluate(&catalog, &mut Context::new(), "R1", Some(input.as_slice()))
            .unwrap();
        assert_eq!(score.value(), &Value::from(10));
    }

    #[test]
    fn formula_reads_declared_dependencies() {
        let catalog = vec![Rule::formula("R2", "pontosCHA", "10 * (cha / 32)", ["cha"])];
        let mut ctx = Context::with_variables([("cha", Value::from(64))]);
        let score = Engine::new().evaluate(&catalog, &mut ctx, "R2", None).unwrap();
        assert_eq!(score.value(), &Value::from(20));
        assert_eq!(ctx.get("pontosCHA"), Some(&Value::from(20)));
    }

    #[test]
    fn formula_with_unbound_dependency() {
        let catalog = vec![Rule::formula("R2", "pontosCHA", "10 * (cha / 32)", ["cha"])];
        let err = Engine::new()
            .evaluate(&catalog, &mut Context::new(), "R2", None)
            .unwrap_err();
        assert_eq!(err, EvalError::UnresolvedDependency { name: "cha".into() });
    }

    #[test]
    fn formula_referencing_undeclared_name_surfaces_expression_error() {
        let catalog = vec![Rule::formula("R2", "p", "cha + extra", ["cha"])];
        let mut ctx =
            Context::with_variables([("cha", Value::from(1)), ("extra", Value::from(2))]);
        let err = Engine::new().evaluate(&catalog, &mut ctx, "R2", None).unwrap_err();
        assert_eq!(
            err,
            EvalError::Expression(ExprError::UndefinedVariable {
                name: "extra".into()
            })
        );
    }

    #[test]
    fn unknown_rule_code() {
        let catalog: Vec<Rule> = Vec::new();
        let err = Engine::new()
            .evaluate(&catalog, &mut Context::new(), "NOPE", None)
            .unwrap_err();
        assert_eq!(err, EvalError::UnknownRuleCode { code: "NOPE".into() });
    }

    fn branching_catalog() -> Vec<Rule> {
        vec![
            Rule::formula("THEN", "alto", "x * 2", ["x"]),
            Rule::formula("ELSE", "baixo", "100", Vec::<String>::new()),
            Rule::conditional("COND", "resultado", "x", "THEN", "ELSE"),
        ]
    }

    #[test]
    fn conditional_zero_takes_else_branch() {
        let mut ctx = Context::with_variables([("x", Value::from(0))]);
        let score = Engine::new()
            .evaluate(&branching_catalog(), &mut ctx, "COND", None)
            .unwrap();
        assert_eq!(score.value(), &Value::from(100));
        assert_eq!(ctx.get("resultado"), Some(&Value::from(100)));
        assert_eq!(ctx.get("baixo"), Some(&Value::from(100)));
        assert!(!ctx.contains("alto"));
    }

    #[test]
    fn conditional_nonzero_takes_then_branch() {
        let mut ctx = Context::with_variables([("x", Value::from(-4))]);
        let (score, traces) = Engine::new()
            .evaluate_traced(&branching_catalog(), &mut ctx, "COND", None)
            .unwrap();
        assert_eq!(score.name(), "resultado");
        assert_eq!(score.value(), &Value::from(-8));
        assert_eq!(ctx.get("alto"), Some(&Value::from(-8)));
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].rule, "THEN");
        assert_eq!(traces[1].rule, "COND");
        assert_eq!(traces[1].branch.as_deref(), Some("THEN"));
        assert_eq!(traces[1].variables_used, vec!["x"]);
    }

    #[test]
    fn conditional_boolean_test() {
        let catalog = vec![
            Rule::formula("SIM", "v", "1", Vec::<String>::new()),
            Rule::formula("NAO", "v", "0", Vec::<String>::new()),
            Rule::conditional("C", "aprovado", "nota >= 7", "SIM", "NAO"),
        ];
        let mut ctx = Context::with_variables([("nota", Value::from(7))]);
        let score = Engine::new().evaluate(&catalog, &mut ctx, "C", None).unwrap();
        assert_eq!(score.value(), &Value::from(1));
    }

    #[test]
    fn conditional_test_with_unbound_variable() {
        let err = Engine::new()
            .evaluate(&branching_catalog(), &mut Context::new(), "COND", None)
            .unwrap_err();
        assert_eq!(err, EvalError::UnresolvedDependency { name: "x".into() });
    }

    fn declared_conditional(test: &str, depends_on: &[&str]) -> Vec<Rule> {
        let cond: Rule = serde_json::from_value(serde_json::json!({
            "code": "COND",
            "variable": "resultado",
            "kind": "conditional",
            "test": test,
            "depends_on": depends_on,
            "then_rule": "THEN",
            "else_rule": "ELSE"
        }))
        .unwrap();
        let mut catalog = branching_catalog();
        catalog[2] = cond;
        catalog
    }

    #[test]
    fn conditional_declared_dependency_must_be_bound() {
        let catalog = declared_conditional("x + y > 0", &["x", "y"]);
        let mut ctx = Context::with_variables([("y", Value::from(1))]);
        let err = Engine::new()
            .evaluate(&catalog, &mut ctx, "COND", None)
            .unwrap_err();
        assert_eq!(err, EvalError::UnresolvedDependency { name: "x".into() });
        assert!(!ctx.contains("resultado"));
    }

    #[test]
    fn conditional_test_sees_only_declared_names() {
        let catalog = declared_conditional("x + y > 0", &["x"]);
        let mut ctx = Context::with_variables([("x", Value::from(1)), ("y", Value::from(1))]);
        let err = Engine::new()
            .evaluate(&catalog, &mut ctx, "COND", None)
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::Expression(ExprError::UndefinedVariable { name: "y".into() })
        );
    }

    #[test]
    fn conditional_declared_dependencies_are_traced() {
        let catalog = declared_conditional("x > 0", &["x"]);
        let mut ctx = Context::with_variables([("x", Value::from(3)), ("y", Value::from(9))]);
        let (score, traces) = Engine::new()
            .evaluate_traced(&catalog, &mut ctx, "COND", None)
            .unwrap();
        assert_eq!(score.value(), &Value::from(6));
        assert_eq!(traces[1].variables_used, vec!["x"]);
    }

    #[test]
    fn conditional_text_test_is_type_mismatch() {
        let mut ctx = Context::with_variables([("x", Value::from("sim"))]);
        let err = Engine::new()
            .evaluate(&branching_catalog(), &mut ctx, "COND", None)
            .unwrap_err();
        assert!(matches!(
            err,
            EvalError::Value(DomainError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn conditional_branch_passes_records_through() {
        let catalog = vec![
            Rule::fixed_points("AULAS", "pontosAula", Decimal::from(5)),
            Rule::formula("ZERO", "nada", "0", Vec::<String>::new()),
            Rule::conditional("C", "final", "ativo", "AULAS", "ZERO"),
        ];
        let mut ctx = Context::with_variables([("ativo", Value::from(true))]);
        let score = Engine::new()
            .evaluate(&catalog, &mut ctx, "C", Some(records(4).as_slice()))
            .unwrap();
        assert_eq!(score.value(), &Value::from(20));
    }

    #[test]
    fn cyclic_branch_is_detected() {
        let catalog = vec![
            Rule::conditional("A", "a", "1", "B", "B"),
            Rule::conditional("B", "b", "1", "A", "A"),
        ];
        let err = Engine::new()
            .evaluate(&catalog, &mut Context::new(), "A", None)
            .unwrap_err();
        assert_eq!(err, EvalError::CyclicBranch { code: "A".into() });
    }

    #[test]
    fn branch_depth_is_limited() {
        let catalog = vec![
            Rule::conditional("A", "a", "1", "B", "B"),
            Rule::conditional("B", "b", "1", "C", "C"),
            Rule::formula("C", "c", "1", Vec::<String>::new()),
        ];
        let engine = Engine::new().with_options(EngineOptions {
            max_branch_depth: 1,
        });
        let err = engine
            .evaluate(&catalog, &mut Context::new(), "A", None)
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::BranchDepthExceeded {
                code: "C".into(),
                limit: 1
            }
        );
        let engine = Engine::new().with_options(EngineOptions {
            max_branch_depth: 2,
        });
        assert_eq!(engine.options().max_branch_depth, 2);
        assert_eq!(Engine::new().options(), EngineOptions::default());
        assert!(engine.evaluate(&catalog, &mut Context::new(), "A", None).is_ok());
    }

    #[test]
    fn results_are_clamped_to_bounds() {
        let catalog = vec![Rule::fixed_points("R1", "p", Decimal::from(10))
            .with_bounds(None, Some(Decimal::from(25)))];
        let mut ctx = Context::new();
        let score = Engine::new()
            .evaluate(&catalog, &mut ctx, "R1", Some(records(3).as_slice()))
            .unwrap();
        assert_eq!(score.value(), &Value::from(25));
        assert_eq!(ctx.get("p"), Some(&Value::from(25)));
    }

    #[test]
    fn custom_evaluator_is_used() {
        struct Constant;
        impl ExpressionEvaluator for Constant {
            fn evaluate(&self, _: &str, _: &saep_expr::Bindings) -> Result<Value, ExprError> {
                Ok(Value::from(7))
            }
            fn variables(&self, _: &str) -> Result<Vec<String>, ExprError> {
                Ok(Vec::new())
            }
        }
        let catalog = vec![Rule::formula("F", "f", "anything", Vec::<String>::new())];
        let score = Engine::with_evaluator(Constant)
            .evaluate(&catalog, &mut Context::new(), "F", None)
            .unwrap();
        assert_eq!(score.value(), &Value::from(7));
    }
}
