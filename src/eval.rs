//! Recursive-descent evaluator for when-clause expressions
//!
//! Parses the token stream and evaluates it directly against a context
//! snapshot; no AST is built or kept. Every fault degrades to a falsy
//! value instead of an error, so a broken clause disables its binding
//! without disturbing anything else.
//!
//! Precedence, loosest to tightest:
//!
//! ```text
//! ||  <  &&  <  in / not in  <  comparisons  <  == / !=  <  =~  <  !
//! ```

use regex::Regex;

use crate::context::{Context, ContextValue};
use crate::tokenizer::{tokenize, Token};

/// Evaluate a when-clause against a context snapshot.
///
/// An empty or whitespace-only expression is vacuously true (an absent
/// clause always matches). This function never panics or returns an
/// error; malformed input evaluates to `false`.
pub fn evaluate(expr: &str, context: &Context) -> bool {
    if expr.trim().is_empty() {
        return true;
    }
    let tokens = tokenize(expr);
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        context,
    };
    parser.or_level().truthy()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    context: &'a Context,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn or_level(&mut self) -> ContextValue {
        let mut left = self.and_level();
        while matches!(self.peek(), Some(Token::Op("||"))) {
            self.pos += 1;
            // no short-circuit: operands are side-effect free and both
            // sides always evaluate
            let right = self.and_level();
            left = ContextValue::Bool(left.truthy() || right.truthy());
        }
        left
    }

    fn and_level(&mut self) -> ContextValue {
        let mut left = self.in_level();
        while matches!(self.peek(), Some(Token::Op("&&"))) {
            self.pos += 1;
            let right = self.in_level();
            left = ContextValue::Bool(left.truthy() && right.truthy());
        }
        left
    }

    /// `in` / `not in` membership. The left side is stringified; the
    /// right side must be a list (element equality) or a map (own-key
    /// test). Any other right-hand type makes the whole construct false,
    /// negated or not.
    fn in_level(&mut self) -> ContextValue {
        let left = self.comparison_level();
        let negate = match self.peek() {
            Some(Token::In) => false,
            Some(Token::NotIn) => true,
            _ => return left,
        };
        self.pos += 1;
        let container = self.primary();
        let needle = left.stringify();
        let held = match &container {
            ContextValue::List(items) => items.iter().any(|item| item.stringify() == needle),
            ContextValue::Map(entries) => entries.contains_key(&needle),
            _ => return ContextValue::Bool(false),
        };
        ContextValue::Bool(held != negate)
    }

    /// Ordered comparison over numeric coercions; a NaN on either side
    /// makes the comparison false.
    fn comparison_level(&mut self) -> ContextValue {
        let left = self.equality_level();
        let op = match self.peek() {
            Some(Token::Op(op)) if matches!(*op, "<" | "<=" | ">" | ">=") => *op,
            _ => return left,
        };
        self.pos += 1;
        let right = self.equality_level();
        let (a, b) = (left.as_number(), right.as_number());
        if a.is_nan() || b.is_nan() {
            return ContextValue::Bool(false);
        }
        ContextValue::Bool(match op {
            "<" => a < b,
            "<=" => a <= b,
            ">" => a > b,
            _ => a >= b,
        })
    }

    /// Equality compares canonical string forms, never types. A single
    /// `=` is accepted as a synonym for `==`.
    fn equality_level(&mut self) -> ContextValue {
        let left = self.match_level();
        let negate = match self.peek() {
            Some(Token::Op("==")) | Some(Token::Op("=")) => false,
            Some(Token::Op("!=")) => true,
            _ => return left,
        };
        self.pos += 1;
        let right = self.match_level();
        ContextValue::Bool((left.stringify() == right.stringify()) != negate)
    }

    fn match_level(&mut self) -> ContextValue {
        let left = self.unary_level();
        if !matches!(self.peek(), Some(Token::Op("=~"))) {
            return left;
        }
        self.pos += 1;
        let (pattern, flags) = match self.peek() {
            Some(Token::Regex { pattern, flags }) => {
                let pair = (pattern.clone(), flags.clone());
                self.pos += 1;
                pair
            }
            _ => {
                // right side is not a regex literal: consume the operand
                // to keep the stream aligned, and fail the match
                let _ = self.primary();
                tracing::debug!("`=~` used without a regex literal operand");
                return ContextValue::Bool(false);
            }
        };
        ContextValue::Bool(regex_matches(&left.stringify(), &pattern, &flags))
    }

    fn unary_level(&mut self) -> ContextValue {
        if matches!(self.peek(), Some(Token::Op("!"))) {
            self.pos += 1;
            let value = self.unary_level();
            return ContextValue::Bool(!value.truthy());
        }
        self.primary()
    }

    fn primary(&mut self) -> ContextValue {
        match self.peek() {
            Some(Token::LParen) => {
                self.pos += 1;
                let value = self.or_level();
                // a missing close paren is tolerated
                if matches!(self.peek(), Some(Token::RParen)) {
                    self.pos += 1;
                }
                value
            }
            Some(Token::Ident(name)) => {
                let value = match name.as_str() {
                    "true" => ContextValue::Bool(true),
                    "false" => ContextValue::Bool(false),
                    _ => self
                        .context
                        .get(name)
                        .cloned()
                        .unwrap_or(ContextValue::Null),
                };
                self.pos += 1;
                value
            }
            Some(Token::Str(s)) => {
                let value = ContextValue::Str(s.clone());
                self.pos += 1;
                value
            }
            Some(Token::Number(n)) => {
                let value = ContextValue::Number(*n);
                self.pos += 1;
                value
            }
            Some(Token::Regex { .. }) => {
                // a regex literal is only meaningful to the right of `=~`
                self.pos += 1;
                ContextValue::Null
            }
            // missing operand: treat as absent and let the enclosing
            // expression keep evaluating
            _ => ContextValue::Null,
        }
    }
}

/// Compile the pattern and test the subject. The stateful `g`/`y` flags
/// are stripped; `i`/`m`/`s` map to inline flags; `u`/`v` select unicode
/// matching, already the default here. Invalid patterns log and fail the
/// match.
fn regex_matches(subject: &str, pattern: &str, flags: &str) -> bool {
    let inline: String = flags.chars().filter(|f| matches!(f, 'i' | 'm' | 's')).collect();
    let full = if inline.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{}){}", inline, pattern)
    };
    match Regex::new(&full) {
        Ok(re) => re.is_match(subject),
        Err(err) => {
            tracing::warn!("invalid regex /{}/ in when clause: {}", pattern, err);
            false
        }
    }
}
