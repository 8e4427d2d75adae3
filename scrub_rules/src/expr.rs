//! Restricted boolean expression interpreter for rule documents.
//!
//! Expressions reference dataset columns as `df['name']` and combine
//! comparisons with `&`/`|`/`~` (or the word forms `and`/`or`/`not`). Column
//! comparisons produce a boolean series that must be reduced with `.all()` or
//! `.any()` before it can decide a rule. Aggregations (`.count()`, `.sum()`,
//! `.min()`, `.max()`, `.mean()`) reduce a column to a number.
//!
//! The interpreter evaluates a fixed AST over the dataset snapshot and nothing
//! else: no function calls beyond the method whitelist, no assignment, no host
//! interaction.
//!
//! ```text
//! (df['year'] >= 2000).all()
//! (df['value'] > 0).any() & (df['value'].max() <= 200)
//! df['category'].count() == 365
//! ```

use scrub_core::{DataSet, DataValue};
use std::fmt;
use thiserror::Error;

/// Errors from parsing or evaluating a rule expression.
#[derive(Debug, Error, PartialEq)]
pub enum ExpressionError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("unknown method '.{0}()'")]
    UnknownMethod(String),

    #[error("cannot apply '{op}' to {lhs} and {rhs}")]
    TypeMismatch {
        op: String,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("expression yields a {0}, not a boolean; reduce with .all() or .any()")]
    NotBoolean(&'static str),
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Column(String),
    Number(f64),
    Str(String),
    Ident(String),
    Op(CmpOp),
    And,
    Or,
    Not,
    Dot,
    LParen,
    RParen,
    True,
    False,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        };
        write!(f, "{s}")
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, ExpressionError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '&' => {
                tokens.push(Token::And);
                i += if chars.get(i + 1) == Some(&'&') { 2 } else { 1 };
            }
            '|' => {
                tokens.push(Token::Or);
                i += if chars.get(i + 1) == Some(&'|') { 2 } else { 1 };
            }
            '~' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '=' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Op(CmpOp::Eq));
                i += 2;
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Op(CmpOp::Ne));
                    i += 2;
                } else {
                    tokens.push(Token::Not);
                    i += 1;
                }
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Op(CmpOp::Le));
                    i += 2;
                } else {
                    tokens.push(Token::Op(CmpOp::Lt));
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Op(CmpOp::Ge));
                    i += 2;
                } else {
                    tokens.push(Token::Op(CmpOp::Gt));
                    i += 1;
                }
            }
            '\'' | '"' => {
                let quote = c;
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && chars[j] != quote {
                    j += 1;
                }
                if j >= chars.len() {
                    return Err(ExpressionError::UnexpectedEnd);
                }
                tokens.push(Token::Str(chars[start..j].iter().collect()));
                i = j + 1;
            }
            '-' | '0'..='9' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    // a dot followed by a letter starts a method call, not a decimal
                    if chars[i] == '.' && chars.get(i + 1).is_some_and(|n| n.is_alphabetic()) {
                        break;
                    }
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let number = text
                    .parse::<f64>()
                    .map_err(|_| ExpressionError::UnexpectedToken(text.clone()))?;
                tokens.push(Token::Number(number));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match word.as_str() {
                    "and" => tokens.push(Token::And),
                    "or" => tokens.push(Token::Or),
                    "not" => tokens.push(Token::Not),
                    "True" | "true" => tokens.push(Token::True),
                    "False" | "false" => tokens.push(Token::False),
                    "df" => {
                        // expect ['column']
                        if chars.get(i) != Some(&'[') {
                            return Err(ExpressionError::UnexpectedToken("df".into()));
                        }
                        i += 1;
                        let quote = match chars.get(i) {
                            Some(&q @ ('\'' | '"')) => q,
                            Some(&other) => {
                                return Err(ExpressionError::UnexpectedChar(other, i));
                            }
                            None => return Err(ExpressionError::UnexpectedEnd),
                        };
                        i += 1;
                        let name_start = i;
                        while i < chars.len() && chars[i] != quote {
                            i += 1;
                        }
                        if i >= chars.len() {
                            return Err(ExpressionError::UnexpectedEnd);
                        }
                        let name: String = chars[name_start..i].iter().collect();
                        i += 1;
                        if chars.get(i) != Some(&']') {
                            return Err(ExpressionError::UnexpectedToken(name));
                        }
                        i += 1;
                        tokens.push(Token::Column(name));
                    }
                    _ => tokens.push(Token::Ident(word)),
                }
            }
            other => return Err(ExpressionError::UnexpectedChar(other, i)),
        }
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Expr {
    Column(String),
    Number(f64),
    Str(String),
    Bool(bool),
    Compare(Box<Expr>, CmpOp, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Method(Box<Expr>, String),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, ExpressionError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(ExpressionError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ExpressionError> {
        let token = self.next()?;
        if &token == expected {
            Ok(())
        } else {
            Err(ExpressionError::UnexpectedToken(format!("{token:?}")))
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ExpressionError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ExpressionError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExpressionError> {
        let left = self.parse_postfix()?;
        if let Some(Token::Op(op)) = self.peek().cloned() {
            self.pos += 1;
            let right = self.parse_postfix()?;
            return Ok(Expr::Compare(Box::new(left), op, Box::new(right)));
        }
        Ok(left)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExpressionError> {
        let mut expr = self.parse_primary()?;
        while self.peek() == Some(&Token::Dot) {
            self.pos += 1;
            let name = match self.next()? {
                Token::Ident(name) => name,
                other => return Err(ExpressionError::UnexpectedToken(format!("{other:?}"))),
            };
            self.expect(&Token::LParen)?;
            self.expect(&Token::RParen)?;
            expr = Expr::Method(Box::new(expr), name);
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        match self.next()? {
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Column(name) => Ok(Expr::Column(name)),
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::True => Ok(Expr::Bool(true)),
            Token::False => Ok(Expr::Bool(false)),
            other => Err(ExpressionError::UnexpectedToken(format!("{other:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Value<'a> {
    Bool(bool),
    Num(f64),
    Str(String),
    Column(Vec<&'a DataValue>),
    BoolSeries(Vec<bool>),
}

impl Value<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::Str(_) => "string",
            Value::Column(_) => "column",
            Value::BoolSeries(_) => "boolean series",
        }
    }
}

fn compare_scalar(value: &DataValue, op: CmpOp, rhs: &Value<'_>) -> bool {
    // null never satisfies a comparison
    if value.is_null() {
        return false;
    }
    match rhs {
        Value::Num(n) => value
            .as_float()
            .is_some_and(|v| apply_num(v, op, *n)),
        Value::Str(s) => value
            .as_string()
            .is_some_and(|v| apply_ord(v, op, s.as_str())),
        _ => false,
    }
}

fn apply_num(lhs: f64, op: CmpOp, rhs: f64) -> bool {
    match op {
        CmpOp::Eq => lhs == rhs,
        CmpOp::Ne => lhs != rhs,
        CmpOp::Lt => lhs < rhs,
        CmpOp::Le => lhs <= rhs,
        CmpOp::Gt => lhs > rhs,
        CmpOp::Ge => lhs >= rhs,
    }
}

fn apply_ord<T: PartialOrd>(lhs: T, op: CmpOp, rhs: T) -> bool {
    match op {
        CmpOp::Eq => lhs == rhs,
        CmpOp::Ne => lhs != rhs,
        CmpOp::Lt => lhs < rhs,
        CmpOp::Le => lhs <= rhs,
        CmpOp::Gt => lhs > rhs,
        CmpOp::Ge => lhs >= rhs,
    }
}

fn eval<'a>(expr: &Expr, ds: &'a DataSet) -> Result<Value<'a>, ExpressionError> {
    match expr {
        Expr::Column(name) => {
            let column = ds
                .column(name)
                .ok_or_else(|| ExpressionError::UnknownColumn(name.clone()))?;
            Ok(Value::Column(column.collect()))
        }
        Expr::Number(n) => Ok(Value::Num(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Compare(lhs, op, rhs) => {
            let left = eval(lhs, ds)?;
            let right = eval(rhs, ds)?;
            compare(left, *op, right)
        }
        Expr::And(lhs, rhs) => {
            combine(eval(lhs, ds)?, eval(rhs, ds)?, "&", |a, b| a && b)
        }
        Expr::Or(lhs, rhs) => {
            combine(eval(lhs, ds)?, eval(rhs, ds)?, "|", |a, b| a || b)
        }
        Expr::Not(inner) => match eval(inner, ds)? {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            Value::BoolSeries(series) => {
                Ok(Value::BoolSeries(series.into_iter().map(|b| !b).collect()))
            }
            other => Err(ExpressionError::TypeMismatch {
                op: "~".into(),
                lhs: other.kind(),
                rhs: "",
            }),
        },
        Expr::Method(target, name) => method(eval(target, ds)?, name),
    }
}

fn compare<'a>(left: Value<'a>, op: CmpOp, right: Value<'a>) -> Result<Value<'a>, ExpressionError> {
    match (&left, &right) {
        (Value::Column(values), Value::Num(_) | Value::Str(_)) => Ok(Value::BoolSeries(
            values
                .iter()
                .map(|v| compare_scalar(v, op, &right))
                .collect::<Vec<bool>>(),
        )),
        (Value::Num(_) | Value::Str(_), Value::Column(values)) => Ok(Value::BoolSeries(
            values
                .iter()
                .map(|v| compare_scalar(v, op.flip(), &left))
                .collect::<Vec<bool>>(),
        )),
        (Value::Column(a), Value::Column(b)) => {
            if a.len() != b.len() {
                return Err(ExpressionError::TypeMismatch {
                    op: op.to_string(),
                    lhs: "column",
                    rhs: "column",
                });
            }
            Ok(Value::BoolSeries(
                a.iter()
                    .zip(b.iter())
                    .map(|(x, y)| {
                        if x.is_null() || y.is_null() {
                            false
                        } else {
                            match (x.as_float(), y.as_float()) {
                                (Some(xf), Some(yf)) => apply_num(xf, op, yf),
                                _ => match (x.as_string(), y.as_string()) {
                                    (Some(xs), Some(ys)) => apply_ord(xs, op, ys),
                                    _ => false,
                                },
                            }
                        }
                    })
                    .collect(),
            ))
        }
        (Value::Num(a), Value::Num(b)) => Ok(Value::Bool(apply_num(*a, op, *b))),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Bool(apply_ord(a.as_str(), op, b.as_str()))),
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(apply_ord(a, op, b))),
        _ => Err(ExpressionError::TypeMismatch {
            op: op.to_string(),
            lhs: left.kind(),
            rhs: right.kind(),
        }),
    }
}

impl CmpOp {
    /// Mirror for swapped operands: `5 < col` becomes `col > 5`.
    fn flip(self) -> Self {
        match self {
            CmpOp::Lt => CmpOp::Gt,
            CmpOp::Le => CmpOp::Ge,
            CmpOp::Gt => CmpOp::Lt,
            CmpOp::Ge => CmpOp::Le,
            other => other,
        }
    }
}

fn combine<'a>(
    left: Value<'a>,
    right: Value<'a>,
    op: &str,
    f: impl Fn(bool, bool) -> bool,
) -> Result<Value<'a>, ExpressionError> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(f(a, b))),
        (Value::BoolSeries(a), Value::BoolSeries(b)) if a.len() == b.len() => Ok(
            Value::BoolSeries(a.into_iter().zip(b).map(|(x, y)| f(x, y)).collect()),
        ),
        (left, right) => Err(ExpressionError::TypeMismatch {
            op: op.into(),
            lhs: left.kind(),
            rhs: right.kind(),
        }),
    }
}

fn method<'a>(target: Value<'a>, name: &str) -> Result<Value<'a>, ExpressionError> {
    match (target, name) {
        (Value::BoolSeries(series), "all") => Ok(Value::Bool(series.iter().all(|&b| b))),
        (Value::BoolSeries(series), "any") => Ok(Value::Bool(series.iter().any(|&b| b))),
        (Value::BoolSeries(series), "sum") => {
            Ok(Value::Num(series.iter().filter(|&&b| b).count() as f64))
        }
        (Value::Column(values), "count") => Ok(Value::Num(
            values.iter().filter(|v| !v.is_null()).count() as f64,
        )),
        (Value::Column(values), "sum") => Ok(Value::Num(
            values.iter().filter_map(|v| v.as_float()).sum(),
        )),
        (Value::Column(values), "min") => Ok(Value::Num(
            values
                .iter()
                .filter_map(|v| v.as_float())
                .fold(f64::INFINITY, f64::min),
        )),
        (Value::Column(values), "max") => Ok(Value::Num(
            values
                .iter()
                .filter_map(|v| v.as_float())
                .fold(f64::NEG_INFINITY, f64::max),
        )),
        (Value::Column(values), "mean") => {
            let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_float()).collect();
            let mean = if numbers.is_empty() {
                f64::NAN
            } else {
                numbers.iter().sum::<f64>() / numbers.len() as f64
            };
            Ok(Value::Num(mean))
        }
        (_, other) => Err(ExpressionError::UnknownMethod(other.to_string())),
    }
}

/// Parses and evaluates `source` against `ds`, requiring a boolean result.
pub fn evaluate(ds: &DataSet, source: &str) -> Result<bool, ExpressionError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let ast = parser.parse_expr()?;
    if let Some(extra) = parser.peek() {
        return Err(ExpressionError::UnexpectedToken(format!("{extra:?}")));
    }
    match eval(&ast, ds)? {
        Value::Bool(b) => Ok(b),
        other => Err(ExpressionError::NotBoolean(other.kind())),
    }
}
