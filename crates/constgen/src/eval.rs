//! Integer expression evaluation
//!
//! Evaluates the fully substituted value of a definition. Supports decimal,
//! hexadecimal and octal literals, parentheses, and the C arithmetic,
//! bitwise, relational and logical operators with C precedence. Arithmetic
//! runs on `i128` with overflow checks; the result must fit in 64 bits.
//! Negative results wrap to their 64-bit two's complement, like an
//! `unsigned long` would.

use crate::error::EvalError;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

// Integer literal followed by a U/L suffix: 0x80000000UL, 1L, 7ULL
static RE_LITERAL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(0[xX][0-9A-Fa-f]+|[0-9]+)(?:[uU](?:ll|LL|[lL])?|(?:ll|LL|[lL])[uU]?)\b")
        .expect("literal suffix pattern is valid")
});

/// Remove `U`/`L` suffixes from every integer literal in `expr`.
pub fn strip_literal_suffixes(expr: &str) -> Cow<'_, str> {
    RE_LITERAL_SUFFIX.replace_all(expr, "$1")
}

/// Evaluate a numeric expression to a 64-bit value.
pub fn evaluate(expr: &str) -> Result<u64, EvalError> {
    let stripped = strip_literal_suffixes(expr);
    let tokens = tokenize(&stripped)?;
    if tokens.is_empty() {
        return Err(malformed(expr, "empty expression"));
    }

    let mut parser = ExprParser::new(&tokens, expr);
    let value = parser.parse_logical_or()?;
    if let Some(token) = parser.peek() {
        return Err(malformed(expr, format!("unexpected trailing {token:?}")));
    }

    if value < 0 {
        if value < i64::MIN as i128 {
            return Err(malformed(expr, "value does not fit in 64 bits"));
        }
        return Ok(value as i64 as u64);
    }
    u64::try_from(value).map_err(|_| malformed(expr, "value does not fit in 64 bits"))
}

fn malformed(expr: &str, reason: impl Into<String>) -> EvalError {
    EvalError::MalformedExpression {
        expression: expr.to_string(),
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i128),
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Shl,
    Shr,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Not,
    AndAnd,
    OrOr,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let literal: String = chars[start..i].iter().collect();
            tokens.push(Token::Int(parse_literal(&literal).ok_or_else(|| {
                malformed(expr, format!("invalid integer literal '{literal}'"))
            })?));
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            return Err(EvalError::UnresolvedSymbol {
                symbol: chars[start..i].iter().collect(),
            });
        }

        let next = chars.get(i + 1).copied();
        let (token, width) = match (c, next) {
            ('<', Some('<')) => (Token::Shl, 2),
            ('>', Some('>')) => (Token::Shr, 2),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            ('=', Some('=')) => (Token::Eq, 2),
            ('!', Some('=')) => (Token::Ne, 2),
            ('<', Some('=')) => (Token::Le, 2),
            ('>', Some('=')) => (Token::Ge, 2),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('&', _) => (Token::Amp, 1),
            ('|', _) => (Token::Pipe, 1),
            ('^', _) => (Token::Caret, 1),
            ('~', _) => (Token::Tilde, 1),
            ('!', _) => (Token::Not, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            _ => return Err(malformed(expr, format!("unsupported character '{c}'"))),
        };
        tokens.push(token);
        i += width;
    }

    Ok(tokens)
}

fn parse_literal(literal: &str) -> Option<i128> {
    if let Some(hex) = literal
        .strip_prefix("0x")
        .or_else(|| literal.strip_prefix("0X"))
    {
        i128::from_str_radix(hex, 16).ok()
    } else if literal.len() > 1 && literal.starts_with('0') {
        i128::from_str_radix(&literal[1..], 8).ok()
    } else {
        literal.parse().ok()
    }
}

/// Recursive descent parser, one method per C precedence level
struct ExprParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    source: &'a str,
}

impl<'a> ExprParser<'a> {
    fn new(tokens: &'a [Token], source: &'a str) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, reason: impl Into<String>) -> EvalError {
        malformed(self.source, reason)
    }

    fn checked(&self, value: Option<i128>, op: &str) -> Result<i128, EvalError> {
        value.ok_or_else(|| self.error(format!("overflow in '{op}'")))
    }

    fn parse_logical_or(&mut self) -> Result<i128, EvalError> {
        let mut left = self.parse_logical_and()?;
        while self.eat(&Token::OrOr) {
            let right = self.parse_logical_and()?;
            left = i128::from(left != 0 || right != 0);
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<i128, EvalError> {
        let mut left = self.parse_bit_or()?;
        while self.eat(&Token::AndAnd) {
            let right = self.parse_bit_or()?;
            left = i128::from(left != 0 && right != 0);
        }
        Ok(left)
    }

    fn parse_bit_or(&mut self) -> Result<i128, EvalError> {
        let mut left = self.parse_bit_xor()?;
        while self.eat(&Token::Pipe) {
            left |= self.parse_bit_xor()?;
        }
        Ok(left)
    }

    fn parse_bit_xor(&mut self) -> Result<i128, EvalError> {
        let mut left = self.parse_bit_and()?;
        while self.eat(&Token::Caret) {
            left ^= self.parse_bit_and()?;
        }
        Ok(left)
    }

    fn parse_bit_and(&mut self) -> Result<i128, EvalError> {
        let mut left = self.parse_equality()?;
        while self.eat(&Token::Amp) {
            left &= self.parse_equality()?;
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<i128, EvalError> {
        let mut left = self.parse_relational()?;
        loop {
            if self.eat(&Token::Eq) {
                let right = self.parse_relational()?;
                left = i128::from(left == right);
            } else if self.eat(&Token::Ne) {
                let right = self.parse_relational()?;
                left = i128::from(left != right);
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_relational(&mut self) -> Result<i128, EvalError> {
        let mut left = self.parse_shift()?;
        loop {
            let compare: fn(&i128, &i128) -> bool = match self.peek() {
                Some(Token::Lt) => i128::lt,
                Some(Token::Gt) => i128::gt,
                Some(Token::Le) => i128::le,
                Some(Token::Ge) => i128::ge,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_shift()?;
            left = i128::from(compare(&left, &right));
        }
    }

    fn parse_shift(&mut self) -> Result<i128, EvalError> {
        let mut left = self.parse_additive()?;
        loop {
            let shift_left = if self.eat(&Token::Shl) {
                true
            } else if self.eat(&Token::Shr) {
                false
            } else {
                return Ok(left);
            };
            let right = self.parse_additive()?;
            let amount = u32::try_from(right)
                .ok()
                .filter(|amount| *amount < 64)
                .ok_or_else(|| self.error(format!("invalid shift amount {right}")))?;
            left = if shift_left {
                self.checked(left.checked_shl(amount), "<<")?
            } else {
                left >> amount
            };
        }
    }

    fn parse_additive(&mut self) -> Result<i128, EvalError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            if self.eat(&Token::Plus) {
                let right = self.parse_multiplicative()?;
                left = self.checked(left.checked_add(right), "+")?;
            } else if self.eat(&Token::Minus) {
                let right = self.parse_multiplicative()?;
                left = self.checked(left.checked_sub(right), "-")?;
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_multiplicative(&mut self) -> Result<i128, EvalError> {
        let mut left = self.parse_unary()?;
        loop {
            if self.eat(&Token::Star) {
                let right = self.parse_unary()?;
                left = self.checked(left.checked_mul(right), "*")?;
            } else if self.eat(&Token::Slash) {
                let right = self.parse_unary()?;
                if right == 0 {
                    return Err(self.error("division by zero"));
                }
                left = self.checked(left.checked_div(right), "/")?;
            } else if self.eat(&Token::Percent) {
                let right = self.parse_unary()?;
                if right == 0 {
                    return Err(self.error("modulo by zero"));
                }
                left = self.checked(left.checked_rem(right), "%")?;
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_unary(&mut self) -> Result<i128, EvalError> {
        if self.eat(&Token::Minus) {
            let value = self.parse_unary()?;
            return self.checked(value.checked_neg(), "-");
        }
        if self.eat(&Token::Plus) {
            return self.parse_unary();
        }
        if self.eat(&Token::Tilde) {
            // Complement within 64 bits so ~0 stays an all-ones unsigned long
            let value = self.parse_unary()?;
            return Ok(i128::from(!(value as u64)));
        }
        if self.eat(&Token::Not) {
            let value = self.parse_unary()?;
            return Ok(i128::from(value == 0));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<i128, EvalError> {
        match self.advance().cloned() {
            Some(Token::Int(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.parse_logical_or()?;
                if !self.eat(&Token::RParen) {
                    return Err(self.error("expected ')'"));
                }
                Ok(value)
            }
            Some(token) => Err(self.error(format!("unexpected {token:?}"))),
            None => Err(self.error("unexpected end of expression")),
        }
    }
}
