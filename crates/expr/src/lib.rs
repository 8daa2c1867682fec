//! Arithmetic/boolean expression evaluator used by formula and
//! conditional scoring rules.
//!
//! Expressions are plain text such as `10 * (cha / 32)` or
//! `MIN(pontos, 120) >= 40 && aprovado`. They are evaluated against a map
//! of named [`Value`]s; all arithmetic uses `rust_decimal::Decimal`.

pub mod ast;
pub mod error;
pub mod interpret;
pub mod lexer;
pub mod parser;

use std::collections::BTreeSet;

use saep_domain::Value;

pub use error::ExprError;
pub use interpret::Bindings;

/// A parsed expression, reusable across evaluations.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: ast::Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        Ok(Expression {
            source: source.to_string(),
            root: parser::parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, bindings: &Bindings) -> Result<Value, ExprError> {
        interpret::eval(&self.root, bindings)
    }

    /// Names of all variables the expression references, sorted.
    pub fn variables(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        collect_variables(&self.root, &mut names);
        names
    }
}

fn collect_variables<'a>(expr: &'a ast::Expr, names: &mut BTreeSet<&'a str>) {
    match expr {
        ast::Expr::Var { name, .. } => {
            names.insert(name.as_str());
        }
        ast::Expr::Unary { operand, .. } => collect_variables(operand, names),
        ast::Expr::Binary { left, right, .. } => {
            collect_variables(left, names);
            collect_variables(right, names);
        }
        ast::Expr::Call { args, .. } => {
            for arg in args {
                collect_variables(arg, names);
            }
        }
        ast::Expr::Number(_) | ast::Expr::Bool(_) | ast::Expr::Text(_) => {}
    }
}

/// Parse and evaluate `source` in one step.
pub fn evaluate(source: &str, bindings: &Bindings) -> Result<Value, ExprError> {
    Expression::parse(source)?.evaluate(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_referenced_variables() {
        let e = Expression::parse("IF(a > b, MAX(a, c), 0) + a").unwrap();
        assert_eq!(e.variables().into_iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn parsed_expression_is_reusable() {
        let e = Expression::parse("x * 2").unwrap();
        let mut bindings = Bindings::new();
        bindings.insert("x".to_string(), Value::from(3));
        assert_eq!(e.evaluate(&bindings).unwrap(), Value::from(6));
        bindings.insert("x".to_string(), Value::from(5));
        assert_eq!(e.evaluate(&bindings).unwrap(), Value::from(10));
        assert_eq!(e.source(), "x * 2");
    }
}
