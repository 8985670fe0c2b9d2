//! Formula calculation
//!
//! Runs a whole formula: a `;`-separated list of statements made of comments
//! (`// ...`), assignments (`[NAME] = expr`) and one return statement
//! (`=expr`, or `=#text` for a literal string). Statements run in order;
//! assignments write into the caller's [`Variables`] and the first return
//! statement ends the calculation.
//!
//! # Example
//!
//! ```rust
//! use assembler_formula::{calculate, Value, Variables};
//!
//! let mut vars: Variables = [("LARGURA", 1.2), ("ALTURA", 2.1)].into_iter().collect();
//! let result = calculate("[AREA] = {LARGURA} * {ALTURA}; =²({AREA})", &mut vars);
//!
//! assert_eq!(result.code, 0);
//! assert_eq!(result.result, Some(Value::Number(3.0)));
//! assert!(vars.contains("AREA"));
//! ```

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{evaluate, EvaluationContext};
use crate::hints::bracket_hints;
use crate::parser::{parse_expression_with_limit, DEFAULT_MAX_DEPTH};
use crate::value::Value;
use crate::variables::Variables;
use lazy_regex::{regex, regex_captures};

/// Options for formula calculation
#[derive(Debug, Clone)]
pub struct CalculationOptions {
    /// Maximum expression nesting depth per statement (default: 128)
    pub max_depth: usize,
    /// Drop '.' from `{NAME}` before lookup (default: true)
    pub strip_variable_dots: bool,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strip_variable_dots: true,
        }
    }
}

/// Outcome of a calculation
///
/// Failures are reported here rather than as `Err`: `code` is non-zero,
/// `result` is `None`, `message` is suitable for showing to the formula
/// author and `hints` lists bracket-balance diagnostics.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CalculationResult {
    /// 0 on success, otherwise [`FormulaError::code`]
    pub code: u32,
    /// Normalised formula text with comments removed
    pub formula: String,
    /// Snapshot of the environment when the calculation stopped
    pub variables: Variables,
    pub message: String,
    pub result: Option<Value>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub hints: Option<Vec<String>>,
}

impl CalculationResult {
    fn success(formula: String, variables: &Variables, result: Option<Value>) -> Self {
        Self {
            code: 0,
            formula,
            variables: variables.clone(),
            message: String::new(),
            result,
            hints: None,
        }
    }

    fn failure(formula: String, variables: &Variables, error: &FormulaError) -> Self {
        let hints = bracket_hints(&formula);
        Self {
            code: error.code(),
            formula,
            variables: variables.clone(),
            message: error.to_string(),
            result: None,
            hints: Some(hints),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    /// Numeric result, if the formula returned a number
    pub fn number(&self) -> Option<f64> {
        match self.result {
            Some(Value::Number(n)) => Some(n),
            _ => None,
        }
    }
}

/// Calculate `formula` with default options
///
/// Assignments mutate `variables` in place, including those executed before
/// a failing statement.
pub fn calculate(formula: &str, variables: &mut Variables) -> CalculationResult {
    calculate_with_options(formula, variables, &CalculationOptions::default())
}

/// Calculate `formula` with explicit options
pub fn calculate_with_options(
    formula: &str,
    variables: &mut Variables,
    options: &CalculationOptions,
) -> CalculationResult {
    if formula.trim().is_empty() {
        log::warn!("Calculation failed: empty formula");
        return CalculationResult::failure(String::new(), variables, &FormulaError::EmptyFormula);
    }

    let source = strip_comments(&normalize(formula));

    match run(&source, variables, options) {
        Ok(result) => CalculationResult::success(source, variables, result),
        Err(err) => {
            log::warn!("Calculation failed (code {}): {}", err.code(), err);
            CalculationResult::failure(source, variables, &err)
        }
    }
}

/// Trim every statement and join them on one line
pub fn normalize(formula: &str) -> String {
    formula
        .trim()
        .split(';')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(";")
        .replace(['\n', '\r'], "")
}

/// Drop statements starting with `//`
pub fn strip_comments(text: &str) -> String {
    text.split(';')
        .filter(|statement| !statement.trim_start().starts_with("//"))
        .collect::<Vec<_>>()
        .join(";")
}

fn run(
    source: &str,
    variables: &mut Variables,
    options: &CalculationOptions,
) -> FormulaResult<Option<Value>> {
    let statements: Vec<&str> = source.split(';').collect();
    let return_index = statements.iter().position(|s| s.starts_with('='));

    for (index, &statement) in statements.iter().enumerate() {
        let line = index + 1;

        // Every reached statement must have its required references bound,
        // even one that turns out to be neither an assignment nor a return
        check_references(statement, line, variables, options)?;

        if Some(index) == return_index {
            log::debug!("Statement {}: return", line);
            return evaluate_return(statement, line, variables, options).map(Some);
        }

        if let Some((_, name, expression)) =
            regex_captures!(r"^\[([^\]]+)\]\s*=\s*(.+)$", statement)
        {
            let value = evaluate_statement(expression, line, variables, options)?;
            log::trace!("Statement {}: [{}] = {}", line, name, value);
            variables.set(name, value);
        } else {
            log::debug!("Statement {}: skipped", line);
        }
    }

    Ok(None)
}

fn check_references(
    statement: &str,
    line: usize,
    variables: &Variables,
    options: &CalculationOptions,
) -> FormulaResult<()> {
    let ctx = EvaluationContext::new(variables, options.strip_variable_dots);

    for (_, [name]) in regex!(r"\{([^}]+)\}")
        .captures_iter(statement)
        .map(|caps| caps.extract())
    {
        if !name.starts_with('^') {
            ctx.resolve_variable(name, false)
                .map_err(|err| err.at_line(line))?;
        }
    }

    Ok(())
}

fn evaluate_return(
    statement: &str,
    line: usize,
    variables: &Variables,
    options: &CalculationOptions,
) -> FormulaResult<Value> {
    match statement.strip_prefix("=#") {
        Some(text) => {
            let ctx = EvaluationContext::new(variables, options.strip_variable_dots);
            interpolate(text, &ctx)
                .map(Value::Text)
                .map_err(|err| err.at_line(line))
        }
        None => {
            let expression = statement.strip_prefix('=').unwrap_or(statement);
            evaluate_statement(expression, line, variables, options)
        }
    }
}

fn evaluate_statement(
    expression: &str,
    line: usize,
    variables: &Variables,
    options: &CalculationOptions,
) -> FormulaResult<Value> {
    let expr =
        parse_expression_with_limit(expression, options.max_depth).map_err(|e| e.at_line(line))?;
    let ctx = EvaluationContext::new(variables, options.strip_variable_dots);
    evaluate(&expr, &ctx).map_err(|e| e.at_line(line))
}

/// Replace `{NAME}` / `{^NAME}` in a string return with the bound values
fn interpolate(text: &str, ctx: &EvaluationContext) -> FormulaResult<String> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in regex!(r"\{(\^?)([^}]+)\}").captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let optional = caps.get(1).is_some_and(|m| !m.is_empty());

        out.push_str(&text[last..whole.start()]);
        out.push_str(&ctx.resolve_variable(name.as_str(), optional)?.to_string());
        last = whole.end();
    }

    out.push_str(&text[last..]);
    Ok(out)
}
