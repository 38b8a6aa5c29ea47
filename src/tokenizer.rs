//! Tokenizer for when-clause expressions
//!
//! Produces a flat token stream from a source string. The lexer is
//! deliberately lenient: bytes that fit no rule are skipped, so malformed
//! input degrades to fewer tokens instead of an error.

/// Characters accepted as regex flags after the closing `/`
const REGEX_FLAGS: &str = "gimsuvy";

/// A single lexed token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier or context key; dots are part of the name
    Ident(String),
    /// Quoted string literal, escapes already applied
    Str(String),
    Number(f64),
    /// Operator, normalized (`===` arrives as `==`, `!==`/`!===` as `!=`)
    Op(&'static str),
    LParen,
    RParen,
    In,
    NotIn,
    /// Regex literal `/pattern/flags`, pattern kept verbatim
    Regex { pattern: String, flags: String },
}

/// Multi-character operators before shorter ones; first match at the
/// current position wins. Triple/quadruple equality forms collapse to the
/// two-character operators the evaluator understands.
const OPERATORS: &[(&str, &str)] = &[
    ("!===", "!="),
    ("!==", "!="),
    ("===", "=="),
    ("&&", "&&"),
    ("||", "||"),
    ("==", "=="),
    ("!=", "!="),
    ("<=", "<="),
    (">=", ">="),
    ("=~", "=~"),
    ("!", "!"),
    ("=", "="),
    ("<", "<"),
    (">", ">"),
];

/// Turn a when-clause source string into a token stream
pub fn tokenize(source: &str) -> Vec<Token> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        match c {
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
                continue;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
                continue;
            }
            '\'' | '"' => {
                if let Some((value, next)) = scan_string(&chars, i) {
                    tokens.push(Token::Str(value));
                    i = next;
                } else {
                    // unterminated: drop the quote and keep lexing
                    i += 1;
                }
                continue;
            }
            '/' => {
                if let Some((pattern, flags, next)) = scan_regex(&chars, i) {
                    tokens.push(Token::Regex { pattern, flags });
                    i = next;
                } else {
                    i += 1;
                }
                continue;
            }
            _ => {}
        }

        // `not in` needs a following word boundary so identifiers that
        // merely start with "not" still lex as identifiers
        if let Some(next) = match_keyword(&chars, i, "not in") {
            tokens.push(Token::NotIn);
            i = next;
            continue;
        }

        // `in` additionally needs a preceding boundary
        if i == 0 || chars[i - 1].is_whitespace() {
            if let Some(next) = match_keyword(&chars, i, "in") {
                tokens.push(Token::In);
                i = next;
                continue;
            }
        }

        if let Some((op, next)) = scan_operator(&chars, i) {
            tokens.push(Token::Op(op));
            i = next;
            continue;
        }

        let leading_dot_number =
            c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit());
        if c.is_ascii_digit() || leading_dot_number {
            let (value, next) = scan_number(&chars, i);
            tokens.push(Token::Number(value));
            i = next;
            continue;
        }

        if is_ident_start(c) {
            let (name, next) = scan_ident(&chars, i);
            tokens.push(Token::Ident(name));
            i = next;
            continue;
        }

        // not part of the language
        i += 1;
    }

    tokens
}

/// Match `keyword` at position `start`, requiring end-of-input or
/// whitespace right after it. Returns the position past the keyword.
fn match_keyword(chars: &[char], start: usize, keyword: &str) -> Option<usize> {
    let mut pos = start;
    for expected in keyword.chars() {
        if chars.get(pos) != Some(&expected) {
            return None;
        }
        pos += 1;
    }
    match chars.get(pos) {
        None => Some(pos),
        Some(c) if c.is_whitespace() => Some(pos),
        Some(_) => None,
    }
}

/// Scan a quoted literal. A backslash escapes the following character,
/// which is taken literally. Returns None when the quote never closes.
fn scan_string(chars: &[char], start: usize) -> Option<(String, usize)> {
    let quote = chars[start];
    let mut value = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() {
            value.push(chars[i + 1]);
            i += 2;
        } else if c == quote {
            return Some((value, i + 1));
        } else {
            value.push(c);
            i += 1;
        }
    }
    None
}

/// Scan `/pattern/flags`. Escapes inside the pattern are preserved
/// verbatim (including `\/`). Returns None when the pattern never closes.
fn scan_regex(chars: &[char], start: usize) -> Option<(String, String, usize)> {
    let mut pattern = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && i + 1 < chars.len() {
            pattern.push('\\');
            pattern.push(chars[i + 1]);
            i += 2;
        } else if c == '/' {
            let mut flags = String::new();
            let mut j = i + 1;
            while j < chars.len() && REGEX_FLAGS.contains(chars[j]) {
                flags.push(chars[j]);
                j += 1;
            }
            return Some((pattern, flags, j));
        } else {
            pattern.push(c);
            i += 1;
        }
    }
    None
}

fn scan_operator(chars: &[char], start: usize) -> Option<(&'static str, usize)> {
    for &(literal, normalized) in OPERATORS {
        let len = literal.chars().count();
        if start + len <= chars.len()
            && literal.chars().zip(&chars[start..]).all(|(a, b)| a == *b)
        {
            return Some((normalized, start + len));
        }
    }
    None
}

/// Decimal literal: `\d+(\.\d+)?` or a leading-dot form like `.5`
fn scan_number(chars: &[char], start: usize) -> (f64, usize) {
    let mut text = String::new();
    let mut i = start;
    if chars[i] == '.' {
        text.push('0');
    }
    while i < chars.len() && chars[i].is_ascii_digit() {
        text.push(chars[i]);
        i += 1;
    }
    if i < chars.len()
        && chars[i] == '.'
        && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())
    {
        text.push('.');
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            text.push(chars[i]);
            i += 1;
        }
    }
    (text.parse().unwrap_or(0.0), i)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
}

fn scan_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut name = String::new();
    let mut i = start;
    while i < chars.len() && is_ident_continue(chars[i]) {
        name.push(chars[i]);
        i += 1;
    }
    (name, i)
}
