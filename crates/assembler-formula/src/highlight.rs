//! Presentation tokenizer for formula editors
//!
//! Splits raw formula text (line breaks and comments included) into spans an
//! editor can colour. It never fails: anything it does not recognise becomes
//! [`TokenKind::Text`], and concatenating every token's text reproduces the
//! input exactly.

/// Category of a highlighted span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `// ...` statement
    Comment,
    Number,
    /// `{NAME}` / `{^NAME}`
    Replacement,
    /// `[NAME]`
    Variable,
    /// Arithmetic, comparison and logical operators, glyphs, brackets, `=`, `=#`
    Operator,
    /// `SE`
    Keyword,
    /// `;`
    Separator,
    Whitespace,
    Text,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Comment => "comment",
            TokenKind::Number => "number",
            TokenKind::Replacement => "replacement",
            TokenKind::Variable => "variable",
            TokenKind::Operator => "operator",
            TokenKind::Keyword => "keyword",
            TokenKind::Separator => "separator",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Text => "text",
        }
    }
}

/// A highlighted span of the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightToken<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset into the source
    pub start: usize,
}

impl HighlightToken<'_> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

const OPERATOR_CHARS: &str = "+-*/%<>=!&|?:(),¹²³ªº√";

/// Tokenize `source` for display
pub fn highlight(source: &str) -> Vec<HighlightToken<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut statement_start = true;

    while let Some(c) = source[pos..].chars().next() {
        let rest = &source[pos..];

        let (kind, len) = if c.is_whitespace() {
            (TokenKind::Whitespace, span_while(rest, char::is_whitespace))
        } else if c == ';' {
            (TokenKind::Separator, 1)
        } else if statement_start && rest.starts_with("//") {
            (TokenKind::Comment, until_separator(rest))
        } else if statement_start && rest.starts_with("=#") {
            // The string payload follows as a single Text token
            (TokenKind::Operator, 2)
        } else if c == '{' {
            (TokenKind::Replacement, closing(rest, '}'))
        } else if c == '[' && is_variable_bracket(rest) {
            (TokenKind::Variable, closing(rest, ']'))
        } else if c.is_ascii_digit() || (c == '.' && rest[1..].starts_with(|n: char| n.is_ascii_digit())) {
            (
                TokenKind::Number,
                span_while(rest, |n| n.is_ascii_digit() || n == '.'),
            )
        } else if rest.starts_with("SE(") {
            (TokenKind::Keyword, 2)
        } else if "<>=!&|".contains(c) {
            (TokenKind::Operator, span_while(rest, |n| "<>=!&|".contains(n)))
        } else if OPERATOR_CHARS.contains(c) || c == '[' || c == ']' {
            (TokenKind::Operator, c.len_utf8())
        } else if c.is_ascii_alphanumeric() || c == '_' {
            (
                TokenKind::Text,
                span_while(rest, |n| n.is_ascii_alphanumeric() || n == '_' || n == '.'),
            )
        } else {
            (TokenKind::Text, c.len_utf8())
        };

        let text = &rest[..len];
        let string_return = statement_start && text == "=#";

        tokens.push(HighlightToken {
            kind,
            text,
            start: pos,
        });
        pos += len;

        if kind == TokenKind::Separator {
            statement_start = true;
        } else if kind != TokenKind::Whitespace {
            statement_start = false;
        }

        if string_return {
            let payload = until_separator(&source[pos..]);
            if payload > 0 {
                tokens.push(HighlightToken {
                    kind: TokenKind::Text,
                    text: &source[pos..pos + payload],
                    start: pos,
                });
                pos += payload;
            }
        }
    }

    tokens
}

fn span_while(text: &str, pred: impl Fn(char) -> bool) -> usize {
    text.char_indices()
        .find(|&(_, c)| !pred(c))
        .map_or(text.len(), |(i, _)| i)
}

fn until_separator(text: &str) -> usize {
    text.find(';').unwrap_or(text.len())
}

/// Length up to and including `close`, or to the end of the statement
fn closing(text: &str, close: char) -> usize {
    let limit = until_separator(text);
    text[..limit]
        .find(close)
        .map_or(limit, |i| i + close.len_utf8())
}

/// `[NAME]` names a variable; `[min,max]` is a range test
fn is_variable_bracket(text: &str) -> bool {
    let end = closing(text, ']');
    !text[..end].contains(',')
}
