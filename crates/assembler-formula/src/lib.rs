//! # assembler-formula
//!
//! Formula engine for the product assembler: prices, consumption, weights and
//! predefined-value ranges of configurable products are written as small
//! formulas over product measurements.
//!
//! This crate provides:
//! - Formula parsing (statement text → AST), including the configurator
//!   glyphs (`¹ ² ³ ª º √ ³√`), range tests and `SE(...)` conditionals
//! - Formula evaluation against a mutable variable environment
//! - Whole-formula calculation with structured, never-panicking results
//! - A presentation tokenizer for formula editors
//!
//! ## Example
//!
//! ```rust
//! use assembler_formula::{calculate, Variables};
//!
//! let mut vars: Variables = [("LARGURA", 0.8)].into_iter().collect();
//! let result = calculate(
//!     "// folha simples;\n[AREA] = {LARGURA} * 2.1;\n=SE({AREA}[1,2], 150, 180)",
//!     &mut vars,
//! );
//! assert_eq!(result.number(), Some(150.0));
//! ```

pub mod ast;
pub mod calculation;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod highlight;
pub mod hints;
pub mod parser;
pub mod value;
pub mod variables;

pub use ast::{BinaryOperator, FormulaExpr, Glyph, UnaryOperator};
pub use calculation::{calculate, calculate_with_options, CalculationOptions, CalculationResult};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, EvaluationContext};
pub use highlight::{highlight, HighlightToken, TokenKind};
pub use hints::bracket_hints;
pub use parser::{parse_expression, parse_expression_with_limit};
pub use value::Value;
pub use variables::Variables;
