//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while calculating a formula
///
/// The first group is what [`calculate`](crate::calculate) reports to callers.
/// The second group is raised by the parser and evaluator, which have no notion
/// of statement numbers; the calculation driver tags them with the line through
/// [`FormulaError::at_line`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula text is empty or whitespace
    #[error("Empty formula")]
    EmptyFormula,

    /// A required `{NAME}` reference has no binding
    #[error("Variable '{name}' not found at line {line}")]
    UnresolvedVariable { name: String, line: usize },

    /// Statement could not be parsed or evaluated
    #[error("Syntax error at line {line}: {detail}")]
    Syntax { line: usize, detail: String },

    /// Statement nests deeper than the configured limit
    #[error("Expression at line {line} exceeds the nesting limit of {limit}")]
    NestingLimit { line: usize, limit: usize },

    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Formula evaluation error
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Reference to an unbound variable
    #[error("Variable '{0}' not found")]
    MissingVariable(String),

    /// Parser recursion went past the limit
    #[error("Nesting limit of {0} exceeded")]
    DepthExceeded(usize),
}

impl FormulaError {
    /// Numeric code reported in [`CalculationResult::code`](crate::CalculationResult)
    pub fn code(&self) -> u32 {
        match self {
            FormulaError::EmptyFormula => 1,
            FormulaError::UnresolvedVariable { .. } | FormulaError::MissingVariable(_) => 2,
            FormulaError::NestingLimit { .. } | FormulaError::DepthExceeded(_) => 5,
            _ => 4,
        }
    }

    /// Attach a 1-based statement number to a parser or evaluator error
    pub fn at_line(self, line: usize) -> Self {
        match self {
            FormulaError::MissingVariable(name) => FormulaError::UnresolvedVariable { name, line },
            FormulaError::DepthExceeded(limit) => FormulaError::NestingLimit { line, limit },
            err @ (FormulaError::Parse(_)
            | FormulaError::Evaluation(_)
            | FormulaError::UnknownFunction(_)
            | FormulaError::ArgumentCount { .. }) => FormulaError::Syntax {
                line,
                detail: err.to_string(),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(FormulaError::EmptyFormula.code(), 1);
        assert_eq!(FormulaError::MissingVariable("X".into()).code(), 2);
        assert_eq!(FormulaError::Parse("bad".into()).code(), 4);
        assert_eq!(FormulaError::DepthExceeded(8).code(), 5);
    }

    #[test]
    fn test_at_line() {
        let err = FormulaError::MissingVariable("X".into()).at_line(3);
        assert_eq!(
            err,
            FormulaError::UnresolvedVariable {
                name: "X".into(),
                line: 3
            }
        );
        assert_eq!(err.to_string(), "Variable 'X' not found at line 3");

        let err = FormulaError::Parse("Unexpected token".into()).at_line(2);
        assert_eq!(err.code(), 4);
        assert_eq!(
            err.to_string(),
            "Syntax error at line 2: Parse error: Unexpected token"
        );

        // Already tagged errors pass through untouched
        assert_eq!(
            FormulaError::EmptyFormula.at_line(7),
            FormulaError::EmptyFormula
        );
    }
}
