//! Scoring rule definitions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A named computation recipe. Its result is stored in the evaluation
/// context under `variable`.
///
/// `min` and `max` optionally bound numeric results; boolean and text
/// results pass through unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub code: String,
    pub variable: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Decimal>,
    #[serde(flatten)]
    pub kind: RuleKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// `points_per_item * count(records)`. With `report_kind` set, only
    /// records carrying that tag are counted.
    FixedPointsPerItem {
        points_per_item: Decimal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        report_kind: Option<String>,
    },
    /// Evaluates `expression` with each name in `depends_on` bound from
    /// the context.
    Formula {
        expression: String,
        #[serde(default)]
        depends_on: Vec<String>,
    },
    /// Evaluates `test` and adopts the result of `then_rule` when it is
    /// true/nonzero, else the result of `else_rule`.
    ///
    /// With an empty `depends_on` the test is bound to exactly the names it
    /// references; any of them missing from the context is an unresolved
    /// dependency. A non-empty `depends_on` binds only the listed names.
    Conditional {
        test: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        depends_on: Vec<String>,
        then_rule: String,
        else_rule: String,
    },
}

impl Rule {
    pub fn fixed_points(
        code: impl Into<String>,
        variable: impl Into<String>,
        points_per_item: Decimal,
    ) -> Self {
        Rule::with_kind(
            code,
            variable,
            RuleKind::FixedPointsPerItem {
                points_per_item,
                report_kind: None,
            },
        )
    }

    /// Fixed points counted only over records of `report_kind`.
    pub fn fixed_points_for_kind(
        code: impl Into<String>,
        variable: impl Into<String>,
        points_per_item: Decimal,
        report_kind: impl Into<String>,
    ) -> Self {
        Rule::with_kind(
            code,
            variable,
            RuleKind::FixedPointsPerItem {
                points_per_item,
                report_kind: Some(report_kind.into()),
            },
        )
    }

    pub fn formula<I, S>(
        code: impl Into<String>,
        variable: impl Into<String>,
        expression: impl Into<String>,
        depends_on: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rule::with_kind(
            code,
            variable,
            RuleKind::Formula {
                expression: expression.into(),
                depends_on: depends_on.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn conditional(
        code: impl Into<String>,
        variable: impl Into<String>,
        test: impl Into<String>,
        then_rule: impl Into<String>,
        else_rule: impl Into<String>,
    ) -> Self {
        Rule::with_kind(
            code,
            variable,
            RuleKind::Conditional {
                test: test.into(),
                depends_on: Vec::new(),
                then_rule: then_rule.into(),
                else_rule: else_rule.into(),
            },
        )
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_bounds(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    fn with_kind(code: impl Into<String>, variable: impl Into<String>, kind: RuleKind) -> Self {
        Rule {
            code: code.into(),
            variable: variable.into(),
            description: None,
            min: None,
            max: None,
            kind,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Codes of the rules this rule may dispatch to.
    pub fn branch_targets(&self) -> Vec<&str> {
        match &self.kind {
            RuleKind::Conditional {
                then_rule,
                else_rule,
                ..
            } => vec![then_rule.as_str(), else_rule.as_str()],
            _ => Vec::new(),
        }
    }

    /// The report kind a fixed-points rule restricts itself to, if any.
    pub fn report_kind(&self) -> Option<&str> {
        match &self.kind {
            RuleKind::FixedPointsPerItem { report_kind, .. } => report_kind.as_deref(),
            _ => None,
        }
    }
}

impl RuleKind {
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::FixedPointsPerItem { .. } => "fixed_points_per_item",
            RuleKind::Formula { .. } => "formula",
            RuleKind::Conditional { .. } => "conditional",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_each_kind() {
        let rules: Vec<Rule> = serde_json::from_value(serde_json::json!([
            {
                "code": "R1",
                "variable": "pontosAula",
                "kind": "fixed_points_per_item",
                "points_per_item": "10",
                "report_kind": "aula"
            },
            {
                "code": "R2",
                "variable": "pontosCHA",
                "kind": "formula",
                "expression": "10 * (cha / 32)",
                "depends_on": ["cha"],
                "description": "Carga horária anual",
                "max": "40"
            },
            {
                "code": "R3",
                "variable": "pontosFinal",
                "kind": "conditional",
                "test": "pontosCHA > 0",
                "then_rule": "R2",
                "else_rule": "R1"
            }
        ]))
        .unwrap();

        assert_eq!(
            rules[0],
            Rule::fixed_points_for_kind("R1", "pontosAula", Decimal::from(10), "aula")
        );
        assert_eq!(
            rules[1],
            Rule::formula("R2", "pontosCHA", "10 * (cha / 32)", ["cha"])
                .with_description("Carga horária anual")
                .with_bounds(None, Some(Decimal::from(40)))
        );
        assert_eq!(
            rules[2],
            Rule::conditional("R3", "pontosFinal", "pontosCHA > 0", "R2", "R1")
        );
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(Rule::fixed_points("R1", "p", Decimal::from(5))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "code": "R1",
                "variable": "p",
                "kind": "fixed_points_per_item",
                "points_per_item": "5"
            })
        );
    }

    #[test]
    fn branch_targets_only_for_conditionals() {
        let c = Rule::conditional("C", "v", "x", "A", "B");
        assert_eq!(c.branch_targets(), vec!["A", "B"]);
        assert!(Rule::fixed_points("F", "v", Decimal::ONE)
            .branch_targets()
            .is_empty());
        assert_eq!(c.kind_name(), "conditional");
    }
}
