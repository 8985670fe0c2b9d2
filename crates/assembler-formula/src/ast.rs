//! Formula Abstract Syntax Tree types

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// Quoted string literal
    String(String),
    /// `true` / `false`
    Boolean(bool),

    // === References ===
    /// `{NAME}` (required) or `{^NAME}` (optional, defaults to 0)
    Variable { name: String, optional: bool },

    /// `{NAME}[min,max]`: true when `min < NAME < max`
    Between {
        operand: Box<FormulaExpr>,
        min: Box<FormulaExpr>,
        max: Box<FormulaExpr>,
    },

    // === Glyphs ===
    /// Prefix glyph applied to a parenthesised operand, e.g. `²(x)`
    Glyph {
        glyph: Glyph,
        operand: Box<FormulaExpr>,
    },
    /// Postfix superscript exponent, e.g. `(x)²`
    Exponent { base: Box<FormulaExpr>, power: u8 },

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },
    /// `cond ? a : b` and `SE(cond, a, b)`
    Conditional {
        condition: Box<FormulaExpr>,
        then_branch: Box<FormulaExpr>,
        else_branch: Box<FormulaExpr>,
    },

    // === Function call ===
    Function {
        name: String,
        args: Vec<FormulaExpr>,
    },
}

/// Prefix glyphs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    /// `¹(x)` nearest integer
    Round,
    /// `²(x)` ceiling
    Ceil,
    /// `³(x)` floor
    Floor,
    /// `ª(x)` = `2*round(x/2)+1`
    NearestOdd,
    /// `º(x)` = `2*round(x/2)`
    NearestEven,
    /// `√(x)`
    SquareRoot,
    /// `³√(x)`
    CubeRoot,
}

impl Glyph {
    pub fn symbol(&self) -> &'static str {
        match self {
            Glyph::Round => "¹",
            Glyph::Ceil => "²",
            Glyph::Floor => "³",
            Glyph::NearestOdd => "ª",
            Glyph::NearestEven => "º",
            Glyph::SquareRoot => "√",
            Glyph::CubeRoot => "³√",
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,

    // Comparison
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Logical (short-circuit)
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Plus,
    Not,
}
