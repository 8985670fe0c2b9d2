//! Runtime values
//!
//! Formulas were historically evaluated by a browser, so coercions mirror the
//! loose numeric rules authors rely on: booleans count as 1/0, text is parsed
//! as a number (or becomes NaN), and `+` concatenates when either side is text.

use std::fmt;

/// Value produced while evaluating a formula
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum Value {
    Number(f64),
    Boolean(bool),
    Text(String),
}

impl Value {
    /// Convert to number, if possible
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Boolean(true) => Some(1.0),
            Value::Boolean(false) => Some(0.0),
            Value::Text(s) => parse_text_number(s),
        }
    }

    /// Numeric coercion for arithmetic; unparseable text becomes NaN
    pub fn to_number(&self) -> f64 {
        self.as_number().unwrap_or(f64::NAN)
    }

    /// Truthiness used by conditionals and logical operators
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Boolean(b) => *b,
            Value::Text(s) => !s.is_empty(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Value::Text(_))
    }
}

/// Parse text the way the browser's `Number()` did
///
/// Empty text is 0. The only spelled-out non-finite value accepted is
/// `Infinity` (optionally signed); `inf`, `nan` and friends are not numbers.
fn parse_text_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    let unsigned = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if unsigned.starts_with(|c: char| c.is_ascii_alphabetic()) && unsigned != "Infinity" {
        return None;
    }

    trimmed.parse().ok()
}

/// Format a number the way formula authors see it in price tables
///
/// Magnitudes from 1e21 up and below 1e-6 switch to exponent notation with an
/// explicit sign (`1e+21`, `1.5e-7`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        // Avoid "-0"
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let text = format!("{:e}", n);
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => text,
        }
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Boolean(true).to_number(), 1.0);
        assert_eq!(Value::Text(" 2.5 ".into()).to_number(), 2.5);
        assert_eq!(Value::Text(String::new()).to_number(), 0.0);
        assert!(Value::Text("abc".into()).to_number().is_nan());
    }

    #[test]
    fn test_text_non_finite_spellings() {
        assert_eq!(Value::Text("Infinity".into()).to_number(), f64::INFINITY);
        assert_eq!(Value::Text(" -Infinity".into()).to_number(), f64::NEG_INFINITY);
        assert_eq!(Value::Text("+Infinity".into()).to_number(), f64::INFINITY);

        for text in ["inf", "INF", "-inf", "infinity", "INFINITY", "nan", "NaN", "+nan"] {
            assert_eq!(Value::Text(text.into()).as_number(), None, "{}", text);
            assert!(Value::Text(text.into()).to_number().is_nan(), "{}", text);
        }

        assert_eq!(Value::Text("1e3".into()).to_number(), 1000.0);
        assert_eq!(Value::Text("-.5".into()).to_number(), -0.5);
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Number(-1.0).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::Text(String::new()).is_truthy());
        assert!(Value::Text("0".into()).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Number(10.0).to_string(), "10");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Boolean(false).to_string(), "false");
    }

    #[test]
    fn test_display_exponent_notation() {
        assert_eq!(Value::Number(1e21).to_string(), "1e+21");
        assert_eq!(Value::Number(1.23e22).to_string(), "1.23e+22");
        assert_eq!(Value::Number(-1e21).to_string(), "-1e+21");
        assert_eq!(Value::Number(1e-7).to_string(), "1e-7");
        assert_eq!(Value::Number(1.5e-7).to_string(), "1.5e-7");

        // Still plain decimals just inside the thresholds
        assert_eq!(Value::Number(1e20).to_string(), "100000000000000000000");
        assert_eq!(Value::Number(0.000001).to_string(), "0.000001");
    }
}
