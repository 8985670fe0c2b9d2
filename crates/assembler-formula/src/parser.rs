//! Formula parser
//!
//! A recursive descent parser for a single formula statement. The configurator
//! notation (superscript rounding and exponent glyphs, roots, `{VAR}[min,max]`
//! range tests, `SE(...)`) is part of the grammar rather than a textual
//! pre-pass, so every construct has a fixed precedence and a bounded cost.

use crate::ast::{BinaryOperator, FormulaExpr, Glyph, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions;

/// Nesting depth accepted by [`parse_expression`]
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Parse one statement's expression (no leading `=`) into an AST
///
/// # Example
/// ```rust
/// use assembler_formula::parse_expression;
///
/// let ast = parse_expression("{LARGURA} * 2").unwrap();
/// let ast = parse_expression("²({AREA} / 3)").unwrap();
/// let ast = parse_expression("SE({A} > 1, 10, 20)").unwrap();
/// ```
pub fn parse_expression(input: &str) -> FormulaResult<FormulaExpr> {
    parse_expression_with_limit(input, DEFAULT_MAX_DEPTH)
}

/// Parse with an explicit nesting limit
pub fn parse_expression_with_limit(input: &str, max_depth: usize) -> FormulaResult<FormulaExpr> {
    let mut parser = FormulaParser::new(input, max_depth);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected {} after expression",
            parser.current_token().describe()
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    // Literals
    Number(f64),
    String(String),

    // Names
    Identifier(String),
    Variable { name: String, optional: bool },

    // Glyphs; `call` is set when '(' follows immediately
    Superscript { power: u8, call: bool },
    Glyph { glyph: Glyph, call: bool },

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    And,
    Or,
    Question,
    Colon,
    Comma,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,

    /// Lexing failure, reported when the parser reaches it
    Invalid(String),

    // End of input
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => format!("number {}", n),
            Token::String(s) => format!("string \"{}\"", s),
            Token::Identifier(name) => format!("name '{}'", name),
            Token::Variable { name, optional } => {
                format!("'{{{}{}}}'", if *optional { "^" } else { "" }, name)
            }
            Token::Superscript { power, .. } => format!("'{}'", superscript_symbol(*power)),
            Token::Glyph { glyph, .. } => format!("'{}'", glyph.symbol()),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Star => "'*'".into(),
            Token::Slash => "'/'".into(),
            Token::Percent => "'%'".into(),
            Token::Bang => "'!'".into(),
            Token::And => "'&&'".into(),
            Token::Or => "'||'".into(),
            Token::Question => "'?'".into(),
            Token::Colon => "':'".into(),
            Token::Comma => "','".into(),
            Token::Equal => "'=='".into(),
            Token::NotEqual => "'!='".into(),
            Token::StrictEqual => "'==='".into(),
            Token::StrictNotEqual => "'!=='".into(),
            Token::LessThan => "'<'".into(),
            Token::LessEqual => "'<='".into(),
            Token::GreaterThan => "'>'".into(),
            Token::GreaterEqual => "'>='".into(),
            Token::LeftParen => "'('".into(),
            Token::RightParen => "')'".into(),
            Token::LeftBracket => "'['".into(),
            Token::RightBracket => "']'".into(),
            Token::Invalid(msg) => msg.clone(),
            Token::Eof => "end of input".into(),
        }
    }
}

fn superscript_symbol(power: u8) -> &'static str {
    match power {
        1 => "¹",
        2 => "²",
        _ => "³",
    }
}

fn superscript_power(c: char) -> Option<u8> {
    match c {
        '¹' => Some(1),
        '²' => Some(2),
        '³' => Some(3),
        _ => None,
    }
}

/// Formula parser
struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    current_token: Option<Token>,
    depth: usize,
    max_depth: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str, max_depth: usize) -> Self {
        let mut parser = Self {
            input,
            pos: 0,
            current_token: None,
            depth: 0,
            max_depth,
        };
        parser.advance_token();
        parser
    }

    // === Token scanning ===

    fn advance_token(&mut self) {
        self.skip_whitespace();
        self.current_token = Some(self.scan_token());
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Token::Eof,
        };

        // Single-character tokens
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '%' => Some(Token::Percent),
            '?' => Some(Token::Question),
            ':' => Some(Token::Colon),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LeftParen),
            ')' => Some(Token::RightParen),
            '[' => Some(Token::LeftBracket),
            ']' => Some(Token::RightBracket),
            _ => None,
        };
        if let Some(token) = single {
            self.advance();
            return token;
        }

        // Glyphs. '³' directly followed by '√' is the cube root.
        if let Some(power) = superscript_power(c) {
            self.advance();
            if power == 3 && self.peek_char() == Some('√') {
                self.advance();
                return self.glyph(Glyph::CubeRoot);
            }
            return Token::Superscript {
                power,
                call: self.peek_char() == Some('('),
            };
        }
        match c {
            'ª' => {
                self.advance();
                return self.glyph(Glyph::NearestOdd);
            }
            'º' => {
                self.advance();
                return self.glyph(Glyph::NearestEven);
            }
            '√' => {
                self.advance();
                return self.glyph(Glyph::SquareRoot);
            }
            _ => {}
        }

        // Operators that may span several characters
        match c {
            '=' => {
                self.advance();
                if self.eat('=') {
                    return if self.eat('=') {
                        Token::StrictEqual
                    } else {
                        Token::Equal
                    };
                }
                return Token::Invalid("unexpected '=' (use '==' to compare)".into());
            }
            '!' => {
                self.advance();
                if self.eat('=') {
                    return if self.eat('=') {
                        Token::StrictNotEqual
                    } else {
                        Token::NotEqual
                    };
                }
                return Token::Bang;
            }
            '<' => {
                self.advance();
                return if self.eat('=') {
                    Token::LessEqual
                } else {
                    Token::LessThan
                };
            }
            '>' => {
                self.advance();
                return if self.eat('=') {
                    Token::GreaterEqual
                } else {
                    Token::GreaterThan
                };
            }
            '&' => {
                self.advance();
                if self.eat('&') {
                    return Token::And;
                }
                return Token::Invalid("unexpected '&' (use '&&')".into());
            }
            '|' => {
                self.advance();
                if self.eat('|') {
                    return Token::Or;
                }
                return Token::Invalid("unexpected '|' (use '||')".into());
            }
            _ => {}
        }

        if c == '{' {
            return self.scan_variable();
        }

        if c == '"' || c == '\'' {
            return self.scan_string(c);
        }

        // Number
        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c.is_ascii_alphabetic() || c == '_' || c == '$' {
            return self.scan_identifier();
        }

        // Unknown character
        self.advance();
        Token::Invalid(format!("unexpected character '{}'", c))
    }

    fn glyph(&self, glyph: Glyph) -> Token {
        Token::Glyph {
            glyph,
            call: self.peek_char() == Some('('),
        }
    }

    fn scan_variable(&mut self) -> Token {
        self.advance(); // Skip '{'

        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == '}' {
                break;
            }
            self.advance();
        }

        if self.peek_char() != Some('}') {
            return Token::Invalid("unterminated '{'".into());
        }
        let raw = &self.input[start..self.pos];
        self.advance(); // Skip '}'

        let (name, optional) = match raw.strip_prefix('^') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        if name.is_empty() {
            return Token::Invalid("empty variable reference".into());
        }

        Token::Variable {
            name: name.to_string(),
            optional,
        }
    }

    fn scan_string(&mut self, quote: char) -> Token {
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                None => return Token::Invalid("unterminated string".into()),
                Some(c) if c == quote => {
                    self.advance();
                    return Token::String(s);
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('n') => s.push('\n'),
                        Some('t') => s.push('\t'),
                        Some(other) => s.push(other),
                        None => return Token::Invalid("unterminated string".into()),
                    }
                    self.advance();
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        match num_str.parse() {
            Ok(num) => Token::Number(num),
            Err(_) => Token::Invalid(format!("invalid number '{}'", num_str)),
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;

        while self.peek_char().map_or(false, |c| {
            c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
        }) {
            self.advance();
        }

        Token::Identifier(self.input[start..self.pos].to_string())
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        self.current_token.as_ref().unwrap_or(&Token::Eof)
    }

    fn consume(&mut self) -> Token {
        let token = self.current_token.take().unwrap_or(Token::Eof);
        self.advance_token();
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {}, found {}",
                expected.describe(),
                self.current_token().describe()
            )))
        }
    }

    fn enter(&mut self) -> FormulaResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(FormulaError::DepthExceeded(self.max_depth));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Each operator in a flat chain (`1+1+1`, `2²²`) nests the tree one level
    /// deeper, so it counts toward the limit like a parenthesis does
    fn enter_chained(&mut self, chained: &mut usize) -> FormulaResult<()> {
        *chained += 1;
        self.enter()
    }

    fn leave_chained(&mut self, chained: usize) {
        self.depth -= chained;
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Ternary: ? :
    // 2. Logical or: ||
    // 3. Logical and: &&
    // 4. Equality: ==, !=, ===, !==
    // 5. Relational: <, <=, >, >=
    // 6. Addition/Subtraction: +, -
    // 7. Multiplication/Division/Remainder: *, /, %
    // 8. Unary: -, +, !
    // 9. Postfix exponent glyphs: ¹ ² ³
    // 10. Primary: literals, variables, glyph calls, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.enter()?;
        let expr = self.parse_ternary();
        self.leave();
        expr
    }

    fn parse_ternary(&mut self) -> FormulaResult<FormulaExpr> {
        let condition = self.parse_or()?;

        if !matches!(self.current_token(), Token::Question) {
            return Ok(condition);
        }

        self.consume();
        let then_branch = self.parse_expression()?;
        self.expect(&Token::Colon)?;
        let else_branch = self.parse_expression()?; // Right associative

        Ok(FormulaExpr::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn parse_or(&mut self) -> FormulaResult<FormulaExpr> {
        let mut chained = 0;
        let mut left = self.parse_and()?;

        while matches!(self.current_token(), Token::Or) {
            self.consume();
            self.enter_chained(&mut chained)?;
            let right = self.parse_and()?;
            left = binary(BinaryOperator::Or, left, right);
        }

        self.leave_chained(chained);
        Ok(left)
    }

    fn parse_and(&mut self) -> FormulaResult<FormulaExpr> {
        let mut chained = 0;
        let mut left = self.parse_equality()?;

        while matches!(self.current_token(), Token::And) {
            self.consume();
            self.enter_chained(&mut chained)?;
            let right = self.parse_equality()?;
            left = binary(BinaryOperator::And, left, right);
        }

        self.leave_chained(chained);
        Ok(left)
    }

    fn parse_equality(&mut self) -> FormulaResult<FormulaExpr> {
        let mut chained = 0;
        let mut left = self.parse_relational()?;

        loop {
            let op = match self.current_token() {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::StrictEqual => BinaryOperator::StrictEqual,
                Token::StrictNotEqual => BinaryOperator::StrictNotEqual,
                _ => break,
            };

            self.consume();
            self.enter_chained(&mut chained)?;
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }

        self.leave_chained(chained);
        Ok(left)
    }

    fn parse_relational(&mut self) -> FormulaResult<FormulaExpr> {
        let mut chained = 0;
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current_token() {
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume();
            self.enter_chained(&mut chained)?;
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }

        self.leave_chained(chained);
        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        let mut chained = 0;
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            self.enter_chained(&mut chained)?;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }

        self.leave_chained(chained);
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        let mut chained = 0;
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                Token::Percent => BinaryOperator::Modulo,
                _ => break,
            };

            self.consume();
            self.enter_chained(&mut chained)?;
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }

        self.leave_chained(chained);
        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<FormulaExpr> {
        let op = match self.current_token() {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            Token::Bang => UnaryOperator::Not,
            _ => return self.parse_postfix(),
        };

        self.consume();
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();

        Ok(FormulaExpr::UnaryOp {
            op,
            operand: Box::new(operand?),
        })
    }

    fn parse_postfix(&mut self) -> FormulaResult<FormulaExpr> {
        let mut expr = self.parse_primary()?;

        // `2²³` is (2²)³; a superscript glyph glued to '(' is a prefix call and
        // cannot follow an operand
        let mut chained = 0;
        loop {
            let power = match self.current_token() {
                Token::Superscript { power, call: false } => *power,
                _ => break,
            };
            self.consume();
            self.enter_chained(&mut chained)?;
            expr = FormulaExpr::Exponent {
                base: Box::new(expr),
                power,
            };
        }

        self.leave_chained(chained);
        Ok(expr)
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume();
                Ok(FormulaExpr::Number(n))
            }

            Token::String(s) => {
                self.consume();
                Ok(FormulaExpr::String(s))
            }

            Token::Variable { name, optional } => {
                self.consume();
                let variable = FormulaExpr::Variable { name, optional };
                if matches!(self.current_token(), Token::LeftBracket) {
                    self.parse_between(variable)
                } else {
                    Ok(variable)
                }
            }

            Token::LeftParen => {
                self.consume();
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::Superscript { power, call: true } => {
                self.consume();
                let glyph = match power {
                    1 => Glyph::Round,
                    2 => Glyph::Ceil,
                    _ => Glyph::Floor,
                };
                self.parse_glyph_call(glyph)
            }

            Token::Glyph { glyph, call: true } => {
                self.consume();
                self.parse_glyph_call(glyph)
            }

            token @ (Token::Superscript { .. } | Token::Glyph { .. }) => Err(FormulaError::Parse(
                format!("Glyph {} must be followed by '('", token.describe()),
            )),

            Token::Identifier(name) => {
                self.consume();
                self.parse_identifier(name)
            }

            Token::Invalid(msg) => Err(FormulaError::Parse(msg)),

            token => Err(FormulaError::Parse(format!(
                "Unexpected {}",
                token.describe()
            ))),
        }
    }

    fn parse_between(&mut self, operand: FormulaExpr) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftBracket)?;
        let min = self.parse_expression()?;
        self.expect(&Token::Comma)?;
        let max = self.parse_expression()?;
        self.expect(&Token::RightBracket)?;

        Ok(FormulaExpr::Between {
            operand: Box::new(operand),
            min: Box::new(min),
            max: Box::new(max),
        })
    }

    fn parse_glyph_call(&mut self, glyph: Glyph) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;
        let operand = self.parse_expression()?;
        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Glyph {
            glyph,
            operand: Box::new(operand),
        })
    }

    fn parse_identifier(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        let is_call = matches!(self.current_token(), Token::LeftParen);

        if is_call && name == "SE" {
            return self.parse_se();
        }
        if is_call {
            return self.parse_function_call(&name);
        }

        match name.as_str() {
            "true" => Ok(FormulaExpr::Boolean(true)),
            "false" => Ok(FormulaExpr::Boolean(false)),
            _ => functions::constant(&name)
                .map(FormulaExpr::Number)
                .ok_or_else(|| FormulaError::Parse(format!("Unknown name '{}'", name))),
        }
    }

    /// `SE(expr)` groups; `SE(cond, a, b)` is a conditional
    fn parse_se(&mut self) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;
        let first = self.parse_expression()?;

        if matches!(self.current_token(), Token::RightParen) {
            self.consume();
            return Ok(first);
        }

        self.expect(&Token::Comma)?;
        let then_branch = self.parse_expression()?;
        self.expect(&Token::Comma)?;
        let else_branch = self.parse_expression()?;
        if !matches!(self.current_token(), Token::RightParen) {
            return Err(FormulaError::Parse(
                "SE expects a single expression or (condition, then, else)".into(),
            ));
        }
        self.consume();

        Ok(FormulaExpr::Conditional {
            condition: Box::new(first),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn parse_function_call(&mut self, name: &str) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        // Parse arguments
        if !matches!(self.current_token(), Token::RightParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current_token(), Token::Comma) {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Function {
            name: functions::canonical_name(name),
            args,
        })
    }
}

fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
    FormulaExpr::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn var(name: &str) -> FormulaExpr {
        FormulaExpr::Variable {
            name: name.into(),
            optional: false,
        }
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_expression("42").unwrap(), FormulaExpr::Number(42.0));
        assert_eq!(parse_expression("3.14").unwrap(), FormulaExpr::Number(3.14));
        assert_eq!(parse_expression(".5").unwrap(), FormulaExpr::Number(0.5));
        assert_eq!(parse_expression("1e3").unwrap(), FormulaExpr::Number(1000.0));
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(
            parse_expression("\"porta\"").unwrap(),
            FormulaExpr::String("porta".into())
        );
        assert_eq!(
            parse_expression("'it\\'s'").unwrap(),
            FormulaExpr::String("it's".into())
        );
        assert!(parse_expression("\"open").is_err());
    }

    #[test]
    fn test_parse_variables() {
        assert_eq!(parse_expression("{A}").unwrap(), var("A"));
        assert_eq!(
            parse_expression("{^ALTURA}").unwrap(),
            FormulaExpr::Variable {
                name: "ALTURA".into(),
                optional: true
            }
        );
        // Names are taken verbatim, spaces and dots included
        assert_eq!(parse_expression("{MAX WIDTH.1}").unwrap(), var("MAX WIDTH.1"));

        assert!(parse_expression("{}").is_err());
        assert!(parse_expression("{A").is_err());
    }

    #[test]
    fn test_parse_arithmetic_precedence() {
        let ast = parse_expression("1+2*3").unwrap();
        assert_eq!(
            ast,
            binary(
                BinaryOperator::Add,
                FormulaExpr::Number(1.0),
                binary(
                    BinaryOperator::Multiply,
                    FormulaExpr::Number(2.0),
                    FormulaExpr::Number(3.0)
                )
            )
        );
    }

    #[test]
    fn test_parse_logical_precedence() {
        // && binds tighter than ||
        let ast = parse_expression("1 || 0 && 0").unwrap();
        if let FormulaExpr::BinaryOp { op, right, .. } = ast {
            assert_eq!(op, BinaryOperator::Or);
            assert!(matches!(
                *right,
                FormulaExpr::BinaryOp {
                    op: BinaryOperator::And,
                    ..
                }
            ));
        } else {
            panic!("Expected BinaryOp");
        }
    }

    #[test]
    fn test_parse_comparisons() {
        for (text, op) in [
            ("1 == 1", BinaryOperator::Equal),
            ("1 != 1", BinaryOperator::NotEqual),
            ("1 === 1", BinaryOperator::StrictEqual),
            ("1 !== 1", BinaryOperator::StrictNotEqual),
            ("1 <= 1", BinaryOperator::LessEqual),
            ("1 >= 1", BinaryOperator::GreaterEqual),
        ] {
            assert!(
                matches!(parse_expression(text).unwrap(), FormulaExpr::BinaryOp { op: o, .. } if o == op),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_single_equals_is_rejected() {
        let err = parse_expression("1 = 1").unwrap_err();
        assert!(err.to_string().contains("'=='"));
    }

    #[test]
    fn test_parse_ternary_is_right_associative() {
        let ast = parse_expression("{A} ? 1 : {B} ? 2 : 3").unwrap();
        if let FormulaExpr::Conditional { else_branch, .. } = ast {
            assert!(matches!(*else_branch, FormulaExpr::Conditional { .. }));
        } else {
            panic!("Expected Conditional");
        }
    }

    #[test]
    fn test_parse_between() {
        let ast = parse_expression("{A}[0,10]").unwrap();
        assert_eq!(
            ast,
            FormulaExpr::Between {
                operand: Box::new(var("A")),
                min: Box::new(FormulaExpr::Number(0.0)),
                max: Box::new(FormulaExpr::Number(10.0)),
            }
        );

        // Bounds may be expressions
        let ast = parse_expression("{A}[{MIN} - 1, {MAX} * 2]").unwrap();
        assert!(matches!(ast, FormulaExpr::Between { .. }));

        assert!(parse_expression("{A}[0]").is_err());
    }

    #[test]
    fn test_parse_prefix_glyphs() {
        for (text, glyph) in [
            ("¹(1.5)", Glyph::Round),
            ("²(1.2)", Glyph::Ceil),
            ("³(1.8)", Glyph::Floor),
            ("ª(4)", Glyph::NearestOdd),
            ("º(5)", Glyph::NearestEven),
            ("√(9)", Glyph::SquareRoot),
            ("³√(27)", Glyph::CubeRoot),
        ] {
            assert!(
                matches!(parse_expression(text).unwrap(), FormulaExpr::Glyph { glyph: g, .. } if g == glyph),
                "{}",
                text
            );
        }
    }

    #[test]
    fn test_glyph_requires_adjacent_paren() {
        assert!(parse_expression("√ (9)").is_err());
        assert!(parse_expression("ª4").is_err());
    }

    #[test]
    fn test_parse_exponent_glyphs() {
        assert_eq!(
            parse_expression("2²").unwrap(),
            FormulaExpr::Exponent {
                base: Box::new(FormulaExpr::Number(2.0)),
                power: 2
            }
        );

        // Chained glyphs nest left to right
        let ast = parse_expression("(1+1)²³").unwrap();
        if let FormulaExpr::Exponent { base, power } = ast {
            assert_eq!(power, 3);
            assert!(matches!(*base, FormulaExpr::Exponent { power: 2, .. }));
        } else {
            panic!("Expected Exponent");
        }

        // Binds tighter than unary minus
        let ast = parse_expression("-{A}²").unwrap();
        assert!(matches!(
            ast,
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                ..
            }
        ));
    }

    #[test]
    fn test_exponent_then_call_is_error() {
        // '²(' after an operand would be a rounding call, not an exponent
        assert!(parse_expression("2²(3)").is_err());
    }

    #[test]
    fn test_parse_se() {
        // Grouping form
        assert_eq!(parse_expression("SE(1)").unwrap(), FormulaExpr::Number(1.0));

        let ast = parse_expression("SE({A} > 1 ? 2 : 3)").unwrap();
        assert!(matches!(ast, FormulaExpr::Conditional { .. }));

        let ast = parse_expression("SE({A} > 1, 2, 3)").unwrap();
        assert!(matches!(ast, FormulaExpr::Conditional { .. }));

        assert!(parse_expression("SE(1, 2)").is_err());
        assert!(parse_expression("SE(1, 2, 3, 4)").is_err());
    }

    #[test]
    fn test_parse_function() {
        let ast = parse_expression("Math.max(1, {A}, 3)").unwrap();
        if let FormulaExpr::Function { name, args } = ast {
            assert_eq!(name, "MAX");
            assert_eq!(args.len(), 3);
        } else {
            panic!("Expected Function");
        }
    }

    #[test]
    fn test_parse_constants() {
        assert_eq!(parse_expression("true").unwrap(), FormulaExpr::Boolean(true));
        assert_eq!(
            parse_expression("Math.PI").unwrap(),
            FormulaExpr::Number(std::f64::consts::PI)
        );
        assert!(parse_expression("window").is_err());
    }

    #[test]
    fn test_unbalanced_parentheses() {
        let err = parse_expression("(5+5").unwrap_err();
        assert_eq!(
            err,
            FormulaError::Parse("Expected ')', found end of input".into())
        );
        assert!(parse_expression("5+5)").is_err());
    }

    #[test]
    fn test_depth_limit() {
        let nested = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert!(parse_expression_with_limit(&nested, 32).is_ok());
        assert_eq!(
            parse_expression_with_limit(&nested, 8),
            Err(FormulaError::DepthExceeded(8))
        );

        let sum = format!("1{}", "+1".repeat(40));
        assert!(parse_expression_with_limit(&sum, 64).is_ok());
        assert_eq!(
            parse_expression_with_limit(&sum, 16),
            Err(FormulaError::DepthExceeded(16))
        );

        let powers = format!("2{}", "²".repeat(40));
        assert_eq!(
            parse_expression_with_limit(&powers, 16),
            Err(FormulaError::DepthExceeded(16))
        );

        // Chains inside a group release their depth when the group closes
        let short = vec!["(1+1+1+1)"; 8].join("*");
        assert!(parse_expression_with_limit(&short, 16).is_ok());

        let negations = format!("{}1", "-".repeat(50));
        assert_eq!(
            parse_expression_with_limit(&negations, 16),
            Err(FormulaError::DepthExceeded(16))
        );
    }
}
