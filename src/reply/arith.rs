//! Arithmetic evaluation for spoken math questions
//!
//! A recursive-descent parser over numeric literals, `+ - * /`, unary sign and
//! parentheses. There are no identifiers in the grammar, so the only thing an
//! expression can ever produce is a number.

use thiserror::Error;

/// Nesting beyond this is rejected rather than recursed into
const MAX_DEPTH: usize = 64;

/// Why an expression could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected {0}")]
    UnexpectedToken(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NotFinite,

    #[error("expression nested too deeply")]
    TooDeep,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Open,
    Close,
}

impl Token {
    fn describe(self) -> String {
        match self {
            Self::Number(n) => format!("number {n}"),
            Self::Plus => "'+'".to_string(),
            Self::Minus => "'-'".to_string(),
            Self::Star => "'*'".to_string(),
            Self::Slash => "'/'".to_string(),
            Self::Open => "'('".to_string(),
            Self::Close => "')'".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ArithError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' | '-' | '*' | '/' | '(' | ')' => {
                chars.next();
                tokens.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '(' => Token::Open,
                    _ => Token::Close,
                });
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let literal = &input[start..end];
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| ArithError::InvalidNumber(literal.to_string()))?;
                tokens.push(Token::Number(value));
            }
            other => return Err(ArithError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<f64, ArithError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.advance();
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ArithError> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.advance();
            let rhs = self.unary()?;
            value = if op == Token::Star {
                value * rhs
            } else {
                if rhs == 0.0 {
                    return Err(ArithError::DivisionByZero);
                }
                value / rhs
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, ArithError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                self.nested(Self::unary).map(|v| -v)
            }
            Some(Token::Plus) => {
                self.advance();
                self.nested(Self::unary)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, ArithError> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Open) => {
                let value = self.nested(Self::expr)?;
                match self.advance() {
                    Some(Token::Close) => Ok(value),
                    Some(other) => Err(ArithError::UnexpectedToken(other.describe())),
                    None => Err(ArithError::UnexpectedEnd),
                }
            }
            Some(other) => Err(ArithError::UnexpectedToken(other.describe())),
            None => Err(ArithError::UnexpectedEnd),
        }
    }

    fn nested(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<f64, ArithError>,
    ) -> Result<f64, ArithError> {
        if self.depth >= MAX_DEPTH {
            return Err(ArithError::TooDeep);
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

/// Evaluate an arithmetic expression
///
/// # Errors
///
/// Returns an error for malformed input, division by zero, or a result that
/// overflows to infinity.
pub fn evaluate(input: &str) -> Result<f64, ArithError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ArithError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;

    if let Some(extra) = parser.peek() {
        return Err(ArithError::UnexpectedToken(extra.describe()));
    }
    if !value.is_finite() {
        return Err(ArithError::NotFinite);
    }

    Ok(value)
}

/// Render a result the way a person would say it: `4`, not `4.0`
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let whole = value as i64;
        whole.to_string()
    } else {
        value.to_string()
    }
}
