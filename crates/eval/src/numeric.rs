//! Point arithmetic using `rust_decimal`.
//!
//! All point totals are `Decimal`; no `f64` anywhere in the evaluation
//! path, so totals chained across many rules never pick up binary
//! rounding error.

use rust_decimal::Decimal;
use saep_domain::Value;

use crate::error::EvalError;

/// `points_per_item * count`, failing on overflow instead of wrapping.
pub fn points_for(rule: &str, points_per_item: Decimal, count: usize) -> Result<Decimal, EvalError> {
    let overflow = || EvalError::Overflow {
        rule: rule.to_string(),
    };
    let count = u64::try_from(count).map_err(|_| overflow())?;
    points_per_item
        .checked_mul(Decimal::from(count))
        .ok_or_else(overflow)
}

/// Clamp a numeric result into `[min, max]`. Non-numeric values pass
/// through untouched. An inverted range clamps to `min` first, then `max`.
pub fn clamp(value: Value, min: Option<Decimal>, max: Option<Decimal>) -> Value {
    match value {
        Value::Number(mut n) => {
            if let Some(lo) = min {
                if n < lo {
                    n = lo;
                }
            }
            if let Some(hi) = max {
                if n > hi {
                    n = hi;
                }
            }
            Value::Number(n)
        }
        other => other,
    }
}
