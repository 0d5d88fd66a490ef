//! A restricted expression language over operator matrices.
//!
//! Expressions combine named operator matrices `M0`, `M1`, ... with integer literals using
//! `+`, `-`, `*` and parentheses, for example `M1 - M3*M2` or `2*(M0 + M0)`. Between
//! matrices `*` is the matrix product. Any character outside of this alphabet rejects the
//! expression before anything is evaluated.
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor ('*' factor)*
//! factor := '-' factor | '(' expr ')' | matrix | integer
//! ```
use crate::Error;
use nalgebra::DMatrix;
use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

/// Names of the operator matrices derived for every element basis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    M0,
    M1,
    M2,
    M3,
    M4,
    M5,
    M6,
    M7,
    M8,
    M9,
    M10,
}

impl Operator {
    pub const COUNT: usize = 11;

    pub const ALL: [Operator; Operator::COUNT] = [
        Self::M0,
        Self::M1,
        Self::M2,
        Self::M3,
        Self::M4,
        Self::M5,
        Self::M6,
        Self::M7,
        Self::M8,
        Self::M9,
        Self::M10,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.index())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix('M')
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            // One spelling per operator, so `M01` is not `M1`
            .filter(|digits| *digits == "0" || !digits.starts_with('0'))
            .and_then(|digits| digits.parse::<usize>().ok())
            .and_then(|index| Self::ALL.get(index).copied())
            .ok_or_else(|| Error::expression(format!("unknown operator matrix {:?}", s)))
    }
}

fn is_allowed(c: char) -> bool {
    matches!(c, 'M' | '0'..='9' | '(' | ')' | '+' | '-' | '*' | ' ')
}

/// Checks that an expression only uses the characters of the operator language.
pub fn validate(expr: &str) -> Result<(), Error> {
    if expr.is_empty() {
        return Err(Error::expression("empty expression"));
    }
    match expr.chars().find(|&c| !is_allowed(c)) {
        Some(c) => Err(Error::expression(format!("disallowed character {:?} in {:?}", c, expr))),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Scalar(f64),
    Matrix(DMatrix<f64>),
}

fn shape_mismatch(op: &str, a: &DMatrix<f64>, b: &DMatrix<f64>) -> Error {
    Error::expression(format!(
        "incompatible shapes for {}: {}x{} and {}x{}",
        op,
        a.nrows(),
        a.ncols(),
        b.nrows(),
        b.ncols()
    ))
}

impl Value {
    fn add(self, rhs: Value, sign: f64) -> Result<Value, Error> {
        match (self, rhs) {
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(a + sign * b)),
            (Value::Matrix(a), Value::Matrix(b)) => {
                if a.shape() != b.shape() {
                    return Err(shape_mismatch(if sign > 0.0 { "+" } else { "-" }, &a, &b));
                }
                Ok(Value::Matrix(a + b * sign))
            }
            _ => Err(Error::expression("cannot add a scalar to a matrix")),
        }
    }

    fn mul(self, rhs: Value) -> Result<Value, Error> {
        match (self, rhs) {
            (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(a * b)),
            (Value::Scalar(a), Value::Matrix(b)) | (Value::Matrix(b), Value::Scalar(a)) => Ok(Value::Matrix(b * a)),
            (Value::Matrix(a), Value::Matrix(b)) => {
                if a.ncols() != b.nrows() {
                    return Err(shape_mismatch("*", &a, &b));
                }
                Ok(Value::Matrix(a * b))
            }
        }
    }

    fn neg(self) -> Value {
        match self {
            Value::Scalar(a) => Value::Scalar(-a),
            Value::Matrix(a) => Value::Matrix(-a),
        }
    }
}

/// Maximum nesting of parentheses and unary minus signs.
const MAX_DEPTH: usize = 64;

struct Parser<'e, F> {
    expr: &'e str,
    chars: Peekable<CharIndices<'e>>,
    lookup: F,
    depth: usize,
}

impl<'e, 'm, F> Parser<'e, F>
where
    F: Fn(Operator) -> Result<&'m DMatrix<f64>, Error>,
{
    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|&(_, c)| c == ' ').is_some() {}
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.peek().map(|&(_, c)| c)
    }

    fn unexpected(&mut self) -> Error {
        match self.chars.peek() {
            Some(&(pos, c)) => Error::expression(format!("unexpected {:?} at position {} in {:?}", c, pos, self.expr)),
            None => Error::expression(format!("unexpected end of {:?}", self.expr)),
        }
    }

    fn digits(&mut self) -> &'e str {
        let start = self.chars.peek().map(|&(pos, _)| pos).unwrap_or(self.expr.len());
        let mut end = start;
        while let Some((pos, c)) = self.chars.next_if(|&(_, c)| c.is_ascii_digit()) {
            end = pos + c.len_utf8();
        }
        &self.expr[start..end]
    }

    fn expr(&mut self) -> Result<Value, Error> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some('+') => {
                    self.chars.next();
                    value = value.add(self.term()?, 1.0)?;
                }
                Some('-') => {
                    self.chars.next();
                    value = value.add(self.term()?, -1.0)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<Value, Error> {
        let mut value = self.factor()?;
        while self.peek() == Some('*') {
            self.chars.next();
            value = value.mul(self.factor()?)?;
        }
        Ok(value)
    }

    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, Error>) -> Result<T, Error> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::expression(format!(
                "expression nested deeper than {} levels",
                MAX_DEPTH
            )));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn factor(&mut self) -> Result<Value, Error> {
        match self.peek() {
            Some('-') => {
                self.chars.next();
                Ok(self.nested(Self::factor)?.neg())
            }
            Some('(') => {
                self.chars.next();
                let value = self.nested(Self::expr)?;
                if self.peek() != Some(')') {
                    return Err(self.unexpected());
                }
                self.chars.next();
                Ok(value)
            }
            Some('M') => {
                self.chars.next();
                let digits = self.digits();
                let op: Operator = format!("M{}", digits).parse()?;
                Ok(Value::Matrix((self.lookup)(op)?.clone()))
            }
            Some(c) if c.is_ascii_digit() => {
                let digits = self.digits();
                let literal = digits
                    .parse::<u32>()
                    .map_err(|_| Error::expression(format!("integer literal {} is too large", digits)))?;
                Ok(Value::Scalar(f64::from(literal)))
            }
            _ => Err(self.unexpected()),
        }
    }
}

/// Evaluates an operator expression, resolving matrix names with `lookup`.
///
/// The expression is validated in full before any matrix is looked up.
pub fn evaluate<'m, F>(expr: &str, lookup: F) -> Result<DMatrix<f64>, Error>
where
    F: Fn(Operator) -> Result<&'m DMatrix<f64>, Error>,
{
    validate(expr)?;

    let mut parser = Parser {
        expr,
        chars: expr.char_indices().peekable(),
        lookup,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.peek().is_some() {
        return Err(parser.unexpected());
    }

    match value {
        Value::Matrix(matrix) => Ok(matrix),
        Value::Scalar(_) => Err(Error::expression(format!("{:?} does not evaluate to a matrix", expr))),
    }
}
