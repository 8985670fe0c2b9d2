//! Built-in functions
//!
//! Formula authors historically called the host's `Math` object directly
//! (`Math.max(...)`), and the rounding/root glyphs were sugar for those calls.
//! The registry exposes the same set; a leading `Math.` is accepted and ignored.

pub mod math;

use crate::error::FormulaResult;
use crate::evaluator::EvaluationContext;
use crate::value::Value;
use std::collections::HashMap;

/// Function implementation signature
pub type FunctionImpl = fn(&[Value], &EvaluationContext) -> FormulaResult<Value>;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

/// Function registry
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };

        registry.register_math_functions();

        registry
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&canonical_name(name))
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    fn register_math_functions(&mut self) {
        let unary: [(&'static str, FunctionImpl); 8] = [
            ("ROUND", math::fn_round),
            ("CEIL", math::fn_ceil),
            ("FLOOR", math::fn_floor),
            ("SQRT", math::fn_sqrt),
            ("CBRT", math::fn_cbrt),
            ("ABS", math::fn_abs),
            ("TRUNC", math::fn_trunc),
            ("SIGN", math::fn_sign),
        ];
        for (name, implementation) in unary {
            self.register(FunctionDef {
                name,
                min_args: 1,
                max_args: Some(1),
                implementation,
            });
        }

        // POW
        self.register(FunctionDef {
            name: "POW",
            min_args: 2,
            max_args: Some(2),
            implementation: math::fn_pow,
        });

        // MIN / MAX
        self.register(FunctionDef {
            name: "MIN",
            min_args: 1,
            max_args: None,
            implementation: math::fn_min,
        });
        self.register(FunctionDef {
            name: "MAX",
            min_args: 1,
            max_args: None,
            implementation: math::fn_max,
        });
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry key for a call site name: `Math.round` and `ROUND` are the same
pub fn canonical_name(name: &str) -> String {
    name.strip_prefix("Math.").unwrap_or(name).to_uppercase()
}

/// Named numeric constants usable without a call
pub fn constant(name: &str) -> Option<f64> {
    match name {
        "Infinity" => Some(f64::INFINITY),
        "NaN" => Some(f64::NAN),
        "Math.PI" => Some(std::f64::consts::PI),
        "Math.E" => Some(std::f64::consts::E),
        _ => None,
    }
}
