//! Recursive-descent parser/evaluator for reduced arithmetic.
//!
//! By the time text reaches this module every function call and cell
//! reference has been substituted by a number, so the grammar is just:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := number | '(' expr ')' | '-' factor | '+' factor
//! number := digits ('.' digits)?
//! ```
//!
//! Whitespace separates tokens but never joins them: `1 2` is an error.

use super::error::{FormulaError, FormulaResult};

/// Parse and evaluate `text` in one pass.
pub fn parse_arithmetic(text: &str) -> FormulaResult<f64> {
    Parser::new(text).parse()
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser { text, pos: 0 }
    }

    fn parse(mut self) -> FormulaResult<f64> {
        if self.peek().is_none() {
            return Err(FormulaError::Syntax("empty expression".to_string()));
        }
        let value = self.expr()?;
        match self.peek() {
            None => Ok(value),
            Some(ch) => Err(FormulaError::Syntax(format!(
                "unexpected '{}' at position {}",
                ch as char, self.pos
            ))),
        }
    }

    /// Next non-whitespace byte, without consuming it.
    fn peek(&mut self) -> Option<u8> {
        let bytes = self.text.as_bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        bytes.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn expect(&mut self, expected: u8) -> FormulaResult<()> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.bump();
                Ok(())
            }
            Some(ch) => Err(FormulaError::Syntax(format!(
                "expected '{}', found '{}'",
                expected as char, ch as char
            ))),
            None => Err(FormulaError::Syntax(format!(
                "expected '{}', found end of expression",
                expected as char
            ))),
        }
    }

    fn expr(&mut self) -> FormulaResult<f64> {
        let mut left = self.term()?;
        while let Some(op @ (b'+' | b'-')) = self.peek() {
            self.bump();
            let right = self.term()?;
            if op == b'+' {
                left += right;
            } else {
                left -= right;
            }
        }
        Ok(left)
    }

    fn term(&mut self) -> FormulaResult<f64> {
        let mut left = self.factor()?;
        while let Some(op @ (b'*' | b'/')) = self.peek() {
            self.bump();
            let right = self.factor()?;
            if op == b'*' {
                left *= right;
            } else {
                if right == 0.0 {
                    return Err(FormulaError::DivisionByZero);
                }
                left /= right;
            }
        }
        Ok(left)
    }

    fn factor(&mut self) -> FormulaResult<f64> {
        match self.peek() {
            Some(b'(') => {
                self.bump();
                let value = self.expr()?;
                self.expect(b')')?;
                Ok(value)
            }
            Some(b'-') => {
                self.bump();
                Ok(-self.factor()?)
            }
            Some(b'+') => {
                self.bump();
                self.factor()
            }
            _ => self.number(),
        }
    }

    fn number(&mut self) -> FormulaResult<f64> {
        // `peek` has already skipped leading whitespace.
        let start = self.pos;
        let bytes = self.text.as_bytes();
        let mut dots = 0;
        while self.pos < bytes.len() && (bytes[self.pos].is_ascii_digit() || bytes[self.pos] == b'.') {
            if bytes[self.pos] == b'.' {
                dots += 1;
                if dots > 1 {
                    return Err(FormulaError::Syntax(format!("invalid number at position {}", start)));
                }
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(match bytes.get(self.pos) {
                Some(ch) => FormulaError::Syntax(format!(
                    "expected number at position {}, found '{}'",
                    start, *ch as char
                )),
                None => FormulaError::Syntax("unexpected end of expression".to_string()),
            });
        }
        self.text[start..self.pos]
            .parse::<f64>()
            .map_err(|_| FormulaError::Syntax(format!("invalid number at position {}", start)))
    }
}
