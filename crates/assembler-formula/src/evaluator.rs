//! Formula evaluator
//!
//! Evaluates formula ASTs to produce values.

use crate::ast::{BinaryOperator, FormulaExpr, Glyph, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::{math, FunctionRegistry};
use crate::value::Value;
use crate::variables::Variables;
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

fn get_function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Context for formula evaluation
pub struct EvaluationContext<'a> {
    /// Bindings for `{NAME}` references
    pub variables: &'a Variables,
    /// Remove '.' from required reference names before lookup
    pub strip_variable_dots: bool,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(variables: &'a Variables, strip_variable_dots: bool) -> Self {
        Self {
            variables,
            strip_variable_dots,
        }
    }

    /// Context with default lookup rules
    pub fn simple(variables: &'a Variables) -> Self {
        Self::new(variables, true)
    }

    /// Name actually looked up for a required reference
    pub fn lookup_name<'n>(&self, name: &'n str) -> std::borrow::Cow<'n, str> {
        if self.strip_variable_dots && name.contains('.') {
            name.replace('.', "").into()
        } else {
            name.into()
        }
    }

    /// Resolve `{NAME}` or `{^NAME}`
    pub fn resolve_variable(&self, name: &str, optional: bool) -> FormulaResult<Value> {
        if optional {
            return Ok(self
                .variables
                .get(name)
                .cloned()
                .unwrap_or(Value::Number(0.0)));
        }

        self.variables
            .get(&self.lookup_name(name))
            .cloned()
            .ok_or_else(|| FormulaError::MissingVariable(name.to_string()))
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<Value> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(Value::Number(*n)),
        FormulaExpr::String(s) => Ok(Value::Text(s.clone())),
        FormulaExpr::Boolean(b) => Ok(Value::Boolean(*b)),

        // === References ===
        FormulaExpr::Variable { name, optional } => ctx.resolve_variable(name, *optional),

        FormulaExpr::Between { operand, min, max } => {
            let value = evaluate(operand, ctx)?;
            let min = evaluate(min, ctx)?;
            let max = evaluate(max, ctx)?;
            // Exclusive on both ends
            Ok(Value::Boolean(
                compare(&value, &min) == Some(Ordering::Greater)
                    && compare(&value, &max) == Some(Ordering::Less),
            ))
        }

        // === Glyphs ===
        FormulaExpr::Glyph { glyph, operand } => {
            let n = evaluate(operand, ctx)?.to_number();
            Ok(Value::Number(apply_glyph(*glyph, n)))
        }

        FormulaExpr::Exponent { base, power } => {
            let n = evaluate(base, ctx)?.to_number();
            Ok(Value::Number(n.powi(i32::from(*power))))
        }

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        FormulaExpr::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            if evaluate(condition, ctx)?.is_truthy() {
                evaluate(then_branch, ctx)
            } else {
                evaluate(else_branch, ctx)
            }
        }

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

fn apply_glyph(glyph: Glyph, n: f64) -> f64 {
    match glyph {
        Glyph::Round => math::round_half_up(n),
        Glyph::Ceil => n.ceil(),
        Glyph::Floor => n.floor(),
        Glyph::NearestOdd => math::nearest_odd(n),
        Glyph::NearestEven => math::nearest_even(n),
        Glyph::SquareRoot => n.sqrt(),
        Glyph::CubeRoot => n.cbrt(),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<Value> {
    let left_val = evaluate(left, ctx)?;

    // Logical operators short-circuit and yield the deciding operand
    match op {
        BinaryOperator::And => {
            return if left_val.is_truthy() {
                evaluate(right, ctx)
            } else {
                Ok(left_val)
            };
        }
        BinaryOperator::Or => {
            return if left_val.is_truthy() {
                Ok(left_val)
            } else {
                evaluate(right, ctx)
            };
        }
        _ => {}
    }

    let right_val = evaluate(right, ctx)?;

    let result = match op {
        // Arithmetic operators
        BinaryOperator::Add => {
            if left_val.is_text() || right_val.is_text() {
                Value::Text(format!("{}{}", left_val, right_val))
            } else {
                Value::Number(left_val.to_number() + right_val.to_number())
            }
        }
        BinaryOperator::Subtract => Value::Number(left_val.to_number() - right_val.to_number()),
        BinaryOperator::Multiply => Value::Number(left_val.to_number() * right_val.to_number()),
        BinaryOperator::Divide => Value::Number(left_val.to_number() / right_val.to_number()),
        BinaryOperator::Modulo => Value::Number(left_val.to_number() % right_val.to_number()),

        // Comparison operators
        BinaryOperator::Equal => Value::Boolean(loose_equals(&left_val, &right_val)),
        BinaryOperator::NotEqual => Value::Boolean(!loose_equals(&left_val, &right_val)),
        BinaryOperator::StrictEqual => Value::Boolean(strict_equals(&left_val, &right_val)),
        BinaryOperator::StrictNotEqual => Value::Boolean(!strict_equals(&left_val, &right_val)),
        BinaryOperator::LessThan => Value::Boolean(matches!(
            compare(&left_val, &right_val),
            Some(Ordering::Less)
        )),
        BinaryOperator::LessEqual => Value::Boolean(matches!(
            compare(&left_val, &right_val),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOperator::GreaterThan => Value::Boolean(matches!(
            compare(&left_val, &right_val),
            Some(Ordering::Greater)
        )),
        BinaryOperator::GreaterEqual => Value::Boolean(matches!(
            compare(&left_val, &right_val),
            Some(Ordering::Greater | Ordering::Equal)
        )),

        BinaryOperator::And | BinaryOperator::Or => unreachable!("handled above"),
    };

    Ok(result)
}

/// Relational comparison; text against text compares lexically, anything
/// else numerically. `None` when either side is NaN.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Text(l), Value::Text(r)) => Some(l.cmp(r)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Text(l), Value::Text(r)) => l == r,
        _ => left.to_number() == right.to_number(),
    }
}

fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l == r,
        (Value::Boolean(l), Value::Boolean(r)) => l == r,
        (Value::Text(l), Value::Text(r)) => l == r,
        _ => false,
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<Value> {
    let val = evaluate(operand, ctx)?;

    Ok(match op {
        UnaryOperator::Negate => Value::Number(-val.to_number()),
        UnaryOperator::Plus => Value::Number(val.to_number()),
        UnaryOperator::Not => Value::Boolean(!val.is_truthy()),
    })
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<Value> {
    let registry = get_function_registry();

    let func = registry
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // Check argument count
    if args.len() < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: func.name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: func.name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    // Evaluate arguments
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, ctx)?);
    }

    // Call the function
    (func.implementation)(&evaluated_args, ctx)
}
