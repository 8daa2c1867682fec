//! Tree-walking interpreter over `rust_decimal::Decimal`.
//!
//! No `f64` anywhere in the evaluation path. Division keeps the full
//! precision of the decimal type; explicit rounding is `ROUND(x, places)`.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use saep_domain::Value;

use crate::ast::{BinaryOp, Expr, Function, UnaryOp};
use crate::error::ExprError;

/// Variable bindings visible to an expression.
pub type Bindings = BTreeMap<String, Value>;

pub fn eval(expr: &Expr, bindings: &Bindings) -> Result<Value, ExprError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Bool(b) => Ok(Value::Boolean(*b)),
        Expr::Text(s) => Ok(Value::Text(s.clone())),
        Expr::Var { name, .. } => {
            bindings
                .get(name)
                .cloned()
                .ok_or_else(|| ExprError::UndefinedVariable { name: name.clone() })
        }
        Expr::Unary { op, operand } => {
            let v = eval(operand, bindings)?;
            match op {
                UnaryOp::Neg => Ok(Value::Number(-number(&v, "-")?)),
                UnaryOp::Not => Ok(Value::Boolean(!v.is_truthy()?)),
            }
        }
        Expr::Binary { op, left, right } => eval_binary(*op, left, right, bindings),
        Expr::Call { func, args } => eval_call(*func, args, bindings),
    }
}

fn eval_binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    bindings: &Bindings,
) -> Result<Value, ExprError> {
    // Short-circuit logical operators before evaluating the right side.
    match op {
        BinaryOp::And => {
            if !eval(left, bindings)?.is_truthy()? {
                return Ok(Value::Boolean(false));
            }
            return Ok(Value::Boolean(eval(right, bindings)?.is_truthy()?));
        }
        BinaryOp::Or => {
            if eval(left, bindings)?.is_truthy()? {
                return Ok(Value::Boolean(true));
            }
            return Ok(Value::Boolean(eval(right, bindings)?.is_truthy()?));
        }
        _ => {}
    }

    let l = eval(left, bindings)?;
    let r = eval(right, bindings)?;

    match op {
        BinaryOp::Eq | BinaryOp::Neq => {
            let equal = values_equal(&l, &r, op)?;
            Ok(Value::Boolean(if op == BinaryOp::Eq { equal } else { !equal }))
        }
        BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
            let (a, b) = (number(&l, op.symbol())?, number(&r, op.symbol())?);
            let result = match op {
                BinaryOp::Lt => a < b,
                BinaryOp::Lte => a <= b,
                BinaryOp::Gt => a > b,
                _ => a >= b,
            };
            Ok(Value::Boolean(result))
        }
        _ => {
            let (a, b) = (number(&l, op.symbol())?, number(&r, op.symbol())?);
            arithmetic(op, a, b).map(Value::Number)
        }
    }
}

fn arithmetic(op: BinaryOp, a: Decimal, b: Decimal) -> Result<Decimal, ExprError> {
    let overflow = || ExprError::eval(format!("numeric overflow in {} {} {}", a, op.symbol(), b));
    match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow),
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow),
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow),
        BinaryOp::Div => {
            if b.is_zero() {
                return Err(ExprError::eval("division by zero"));
            }
            a.checked_div(b).ok_or_else(overflow)
        }
        BinaryOp::Rem => {
            if b.is_zero() {
                return Err(ExprError::eval("division by zero"));
            }
            a.checked_rem(b).ok_or_else(overflow)
        }
        BinaryOp::Pow => pow(a, b),
        other => Err(ExprError::eval(format!(
            "operator '{}' is not arithmetic",
            other.symbol()
        ))),
    }
}

/// Integer exponentiation by squaring; negative exponents invert.
fn pow(base: Decimal, exponent: Decimal) -> Result<Decimal, ExprError> {
    if !exponent.fract().is_zero() {
        return Err(ExprError::eval(format!(
            "exponent must be an integer, got {}",
            exponent
        )));
    }
    let overflow = || ExprError::eval(format!("numeric overflow in {} ^ {}", base, exponent));
    let mut n = exponent.abs().to_u64().ok_or_else(overflow)?;

    let mut result = Decimal::ONE;
    let mut factor = base;
    while n > 0 {
        if n & 1 == 1 {
            result = result.checked_mul(factor).ok_or_else(overflow)?;
        }
        n >>= 1;
        if n > 0 {
            factor = factor.checked_mul(factor).ok_or_else(overflow)?;
        }
    }

    if exponent.is_sign_negative() && !exponent.is_zero() {
        if result.is_zero() {
            return Err(ExprError::eval("division by zero"));
        }
        return Decimal::ONE.checked_div(result).ok_or_else(overflow);
    }
    Ok(result)
}

fn values_equal(l: &Value, r: &Value, op: BinaryOp) -> Result<bool, ExprError> {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => Ok(a == b),
        (Value::Boolean(a), Value::Boolean(b)) => Ok(a == b),
        (Value::Text(a), Value::Text(b)) => Ok(a == b),
        _ => Err(ExprError::eval(format!(
            "cannot compare {} with {} using '{}'",
            l.type_name(),
            r.type_name(),
            op.symbol()
        ))),
    }
}

fn eval_call(func: Function, args: &[Expr], bindings: &Bindings) -> Result<Value, ExprError> {
    if func == Function::If {
        // Only the selected branch is evaluated.
        let branch = if eval(&args[0], bindings)?.is_truthy()? {
            &args[1]
        } else {
            &args[2]
        };
        return eval(branch, bindings);
    }

    let mut numbers = Vec::with_capacity(args.len());
    for arg in args {
        numbers.push(number(&eval(arg, bindings)?, func.name())?);
    }

    let result = match func {
        Function::Min => numbers.iter().copied().min(),
        Function::Max => numbers.iter().copied().max(),
        Function::Abs => Some(numbers[0].abs()),
        Function::Floor => Some(numbers[0].floor()),
        Function::Ceiling => Some(numbers[0].ceil()),
        Function::Round => {
            let places = numbers[1];
            if !places.fract().is_zero() || places.is_sign_negative() || places > Decimal::from(28) {
                return Err(ExprError::eval(format!(
                    "ROUND places must be an integer between 0 and 28, got {}",
                    places
                )));
            }
            let dp = places
                .to_u32()
                .ok_or_else(|| ExprError::eval(format!("invalid ROUND places {}", places)))?;
            Some(numbers[0].round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
        }
        Function::If => None,
    };
    result
        .map(Value::Number)
        .ok_or_else(|| ExprError::eval(format!("{} produced no value", func.name())))
}

fn number(v: &Value, context: &str) -> Result<Decimal, ExprError> {
    match v {
        Value::Number(n) => Ok(*n),
        other => Err(ExprError::eval(format!(
            "'{}' requires a Number, got {}",
            context,
            other.type_name()
        ))),
    }
}
