//! Math functions
//!
//! Arguments are coerced with [`Value::to_number`], so text that does not parse
//! yields NaN rather than an error, matching how price formulas have always
//! behaved.

use crate::error::FormulaResult;
use crate::evaluator::EvaluationContext;
use crate::value::Value;

/// Nearest integer, halves rounded towards positive infinity
///
/// `f64::round` rounds halves away from zero, which differs for negative
/// inputs: `round_half_up(-1.5)` is `-1`.
pub fn round_half_up(n: f64) -> f64 {
    let floor = n.floor();
    if n - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Nearest odd integer as `2*round(n/2)+1`
pub fn nearest_odd(n: f64) -> f64 {
    2.0 * round_half_up(n / 2.0) + 1.0
}

/// Nearest even integer as `2*round(n/2)`
pub fn nearest_even(n: f64) -> f64 {
    2.0 * round_half_up(n / 2.0)
}

fn first(args: &[Value]) -> f64 {
    args.first().map_or(f64::NAN, Value::to_number)
}

/// ROUND(number)
pub fn fn_round(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(round_half_up(first(args))))
}

/// CEIL(number)
pub fn fn_ceil(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(first(args).ceil()))
}

/// FLOOR(number)
pub fn fn_floor(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(first(args).floor()))
}

/// SQRT(number) - NaN for negative input
pub fn fn_sqrt(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(first(args).sqrt()))
}

/// CBRT(number)
pub fn fn_cbrt(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(first(args).cbrt()))
}

/// ABS(number)
pub fn fn_abs(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(first(args).abs()))
}

/// TRUNC(number) - drops the fractional part
pub fn fn_trunc(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(first(args).trunc()))
}

/// SIGN(number) - -1, 0 or 1 (NaN stays NaN)
pub fn fn_sign(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let n = first(args);
    let sign = if n.is_nan() || n == 0.0 { n } else { n.signum() };
    Ok(Value::Number(sign))
}

/// POW(base, exponent)
pub fn fn_pow(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    let base = first(args);
    let exponent = args.get(1).map_or(f64::NAN, Value::to_number);
    Ok(Value::Number(base.powf(exponent)))
}

/// MIN(values...) - NaN if any argument is NaN
pub fn fn_min(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(fold_extreme(args, f64::INFINITY, f64::min)))
}

/// MAX(values...) - NaN if any argument is NaN
pub fn fn_max(args: &[Value], _ctx: &EvaluationContext) -> FormulaResult<Value> {
    Ok(Value::Number(fold_extreme(args, f64::NEG_INFINITY, f64::max)))
}

fn fold_extreme(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    let mut acc = init;
    for n in args.iter().map(Value::to_number) {
        if n.is_nan() {
            return f64::NAN;
        }
        acc = pick(acc, n);
    }
    acc
}
