//! Row predicate expressions used by mapping filters.
//!
//! The language is a small Python-flavoured expression syntax: literals, column
//! references, arithmetic, (chained) comparisons, `in`/`not in` lists and
//! `and`/`or`/`not` (also spelled `&`/`|`/`~`).
//!
//! The bare identifier `value` refers to the column the filter is attached to. Other
//! identifiers name columns of the dataset being filtered; names that are not plain
//! identifiers can be written in backticks.

mod lexer;

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

use crate::types::Value;

use lexer::{tokenize, unquote, Lexeme, Token};

/// Identifier bound to the filtered column.
pub const SUBJECT_IDENT: &str = "value";

/// Error produced while compiling or evaluating a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ExprError {
    pub message: String,
}

impl ExprError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

type ExprResult<T> = Result<T, ExprError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
        })
    }
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

#[derive(Debug, Clone, PartialEq)]
enum Comparison {
    Binary(CmpOp, Expr),
    Member { negated: bool, items: Vec<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Column(usize),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    Arith(ArithOp, Box<Expr>, Box<Expr>),
    Compare(Box<Expr>, Vec<Comparison>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// A compiled predicate bound to a dataset's column layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    expr: Expr,
}

impl Predicate {
    /// Compile `expression` against `columns`, binding `value` to `columns[subject]`.
    pub fn compile(expression: &str, subject: usize, columns: &[String]) -> ExprResult<Self> {
        let lexemes = tokenize(expression).map_err(ExprError::new)?;
        let mut parser = Parser {
            lexemes,
            pos: 0,
            subject,
            columns,
        };
        let expr = parser.parse_or()?;
        if let Some(extra) = parser.peek_lexeme() {
            return Err(ExprError::new(format!(
                "unexpected '{}' at offset {}",
                extra.text, extra.span.start
            )));
        }
        Ok(Self { expr })
    }

    /// Evaluate against one row. The expression must produce a boolean.
    pub fn matches(&self, row: &[Value]) -> ExprResult<bool> {
        match eval(&self.expr, row)? {
            Value::Bool(b) => Ok(b),
            other => Err(ExprError::new(format!(
                "expression produced {} instead of a boolean",
                type_name(&other)
            ))),
        }
    }
}

struct Parser<'a, 'c> {
    lexemes: Vec<Lexeme<'a>>,
    pos: usize,
    subject: usize,
    columns: &'c [String],
}

impl<'a> Parser<'a, '_> {
    fn peek_lexeme(&self) -> Option<&Lexeme<'a>> {
        self.lexemes.get(self.pos)
    }

    fn peek(&self) -> Option<Token> {
        self.peek_lexeme().map(|l| l.token)
    }

    fn peek_second(&self) -> Option<Token> {
        self.lexemes.get(self.pos + 1).map(|l| l.token)
    }

    fn bump(&mut self) -> ExprResult<Lexeme<'a>> {
        let lexeme = self
            .lexemes
            .get(self.pos)
            .cloned()
            .ok_or_else(|| ExprError::new("unexpected end of expression"))?;
        self.pos += 1;
        Ok(lexeme)
    }

    fn expect(&mut self, token: Token, what: &str) -> ExprResult<()> {
        let lexeme = self.bump()?;
        if lexeme.token == token {
            Ok(())
        } else {
            Err(ExprError::new(format!(
                "expected {what} but found '{}' at offset {}",
                lexeme.text, lexeme.span.start
            )))
        }
    }

    fn parse_or(&mut self) -> ExprResult<Expr> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(Token::Or) {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> ExprResult<Expr> {
        let mut lhs = self.parse_not()?;
        while self.peek() == Some(Token::And) {
            self.pos += 1;
            let rhs = self.parse_not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> ExprResult<Expr> {
        if self.peek() == Some(Token::Not) {
            self.pos += 1;
            return Ok(Expr::Not(Box::new(self.parse_not()?)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ExprResult<Expr> {
        let first = self.parse_additive()?;
        let mut chain = Vec::new();

        loop {
            let op = match self.peek() {
                Some(Token::Eq) => CmpOp::Eq,
                Some(Token::Ne) => CmpOp::Ne,
                Some(Token::Lt) => CmpOp::Lt,
                Some(Token::Le) => CmpOp::Le,
                Some(Token::Gt) => CmpOp::Gt,
                Some(Token::Ge) => CmpOp::Ge,
                Some(Token::In) => {
                    self.pos += 1;
                    chain.push(Comparison::Member {
                        negated: false,
                        items: self.parse_list()?,
                    });
                    break;
                }
                Some(Token::Not) if self.peek_second() == Some(Token::In) => {
                    self.pos += 2;
                    chain.push(Comparison::Member {
                        negated: true,
                        items: self.parse_list()?,
                    });
                    break;
                }
                _ => break,
            };
            self.pos += 1;
            chain.push(Comparison::Binary(op, self.parse_additive()?));
        }

        if chain.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), chain))
        }
    }

    fn parse_list(&mut self) -> ExprResult<Vec<Expr>> {
        self.expect(Token::LBracket, "'[' after 'in'")?;
        let mut items = Vec::new();
        if self.peek() == Some(Token::RBracket) {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.parse_additive()?);
            match self.bump()? {
                Lexeme { token: Token::Comma, .. } => {
                    // Trailing comma.
                    if self.peek() == Some(Token::RBracket) {
                        self.pos += 1;
                        return Ok(items);
                    }
                }
                Lexeme { token: Token::RBracket, .. } => return Ok(items),
                other => {
                    return Err(ExprError::new(format!(
                        "expected ',' or ']' but found '{}' at offset {}",
                        other.text, other.span.start
                    )));
                }
            }
        }
    }

    fn parse_additive(&mut self) -> ExprResult<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_term()?;
            lhs = Expr::Arith(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_term(&mut self) -> ExprResult<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => ArithOp::Mul,
                Some(Token::Slash) => ArithOp::Div,
                Some(Token::Percent) => ArithOp::Mod,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Arith(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_unary(&mut self) -> ExprResult<Expr> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> ExprResult<Expr> {
        let lexeme = self.bump()?;
        match lexeme.token {
            Token::Int => lexeme
                .text
                .parse::<i64>()
                .map(|v| Expr::Literal(Value::Int64(v)))
                .map_err(|e| ExprError::new(format!("invalid integer '{}': {e}", lexeme.text))),
            Token::Float => lexeme
                .text
                .parse::<f64>()
                .map(|v| Expr::Literal(Value::Float64(v)))
                .map_err(|e| ExprError::new(format!("invalid number '{}': {e}", lexeme.text))),
            Token::Str => Ok(Expr::Literal(Value::Utf8(unquote(lexeme.text)))),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Null => Ok(Expr::Literal(Value::Null)),
            Token::Ident if lexeme.text == SUBJECT_IDENT => Ok(Expr::Column(self.subject)),
            Token::Ident => self.column(lexeme.text),
            Token::QuotedIdent => self.column(&lexeme.text[1..lexeme.text.len() - 1]),
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            _ => Err(ExprError::new(format!(
                "unexpected '{}' at offset {}",
                lexeme.text, lexeme.span.start
            ))),
        }
    }

    fn column(&self, name: &str) -> ExprResult<Expr> {
        self.columns
            .iter()
            .rposition(|c| c == name)
            .map(Expr::Column)
            .ok_or_else(|| ExprError::new(format!("unknown column '{name}'")))
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Int64(_) => "int",
        Value::Float64(_) => "float",
        Value::Bool(_) => "bool",
        Value::Utf8(_) => "string",
    }
}

fn eval(expr: &Expr, row: &[Value]) -> ExprResult<Value> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Column(idx) => Ok(row.get(*idx).cloned().unwrap_or(Value::Null)),
        Expr::Neg(inner) => negate(eval(inner, row)?),
        Expr::Not(inner) => Ok(Value::Bool(!expect_bool(eval(inner, row)?, "not")?)),
        Expr::Arith(op, lhs, rhs) => arith(*op, eval(lhs, row)?, eval(rhs, row)?),
        Expr::And(lhs, rhs) => {
            if !expect_bool(eval(lhs, row)?, "and")? {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(expect_bool(eval(rhs, row)?, "and")?))
        }
        Expr::Or(lhs, rhs) => {
            if expect_bool(eval(lhs, row)?, "or")? {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(expect_bool(eval(rhs, row)?, "or")?))
        }
        Expr::Compare(first, chain) => {
            let mut lhs = eval(first, row)?;
            for link in chain {
                match link {
                    Comparison::Binary(op, rhs) => {
                        let rhs = eval(rhs, row)?;
                        if !compare(*op, &lhs, &rhs)? {
                            return Ok(Value::Bool(false));
                        }
                        lhs = rhs;
                    }
                    Comparison::Member { negated, items } => {
                        let mut found = false;
                        for item in items {
                            if compare(CmpOp::Eq, &lhs, &eval(item, row)?)? {
                                found = true;
                                break;
                            }
                        }
                        if found == *negated {
                            return Ok(Value::Bool(false));
                        }
                    }
                }
            }
            Ok(Value::Bool(true))
        }
    }
}

fn expect_bool(v: Value, op: &str) -> ExprResult<bool> {
    match v {
        Value::Bool(b) => Ok(b),
        other => Err(ExprError::new(format!(
            "'{op}' expects boolean operands, got {}",
            type_name(&other)
        ))),
    }
}

enum Numeric {
    Int(i64),
    Float(f64),
}

fn numeric(v: &Value) -> Option<Numeric> {
    match v {
        Value::Int64(i) => Some(Numeric::Int(*i)),
        Value::Float64(f) => Some(Numeric::Float(*f)),
        Value::Bool(b) => Some(Numeric::Int(i64::from(*b))),
        _ => None,
    }
}

fn as_f64(n: &Numeric) -> f64 {
    match n {
        Numeric::Int(i) => *i as f64,
        Numeric::Float(f) => *f,
    }
}

/// Ordering between two cell values.
enum Relation {
    Ordered(Ordering),
    /// Null or NaN involved: only `!=` holds.
    Unordered,
    /// Values of kinds that can be tested for equality but not ordered.
    Incomparable,
}

fn relate(lhs: &Value, rhs: &Value) -> Relation {
    if matches!(lhs, Value::Null) || matches!(rhs, Value::Null) {
        return Relation::Unordered;
    }
    if let (Value::Utf8(a), Value::Utf8(b)) = (lhs, rhs) {
        return Relation::Ordered(a.cmp(b));
    }
    match (numeric(lhs), numeric(rhs)) {
        (Some(Numeric::Int(a)), Some(Numeric::Int(b))) => Relation::Ordered(a.cmp(&b)),
        (Some(a), Some(b)) => match as_f64(&a).partial_cmp(&as_f64(&b)) {
            Some(ord) => Relation::Ordered(ord),
            None => Relation::Unordered,
        },
        _ => Relation::Incomparable,
    }
}

fn compare(op: CmpOp, lhs: &Value, rhs: &Value) -> ExprResult<bool> {
    match relate(lhs, rhs) {
        Relation::Ordered(ord) => Ok(match op {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
        }),
        Relation::Unordered => Ok(op == CmpOp::Ne),
        Relation::Incomparable => match op {
            CmpOp::Eq => Ok(false),
            CmpOp::Ne => Ok(true),
            _ => Err(ExprError::new(format!(
                "cannot order {} against {}",
                type_name(lhs),
                type_name(rhs)
            ))),
        },
    }
}

fn negate(v: Value) -> ExprResult<Value> {
    match v {
        Value::Null => Ok(Value::Null),
        Value::Int64(i) => i
            .checked_neg()
            .map(Value::Int64)
            .ok_or_else(|| ExprError::new("integer overflow")),
        Value::Float64(f) => Ok(Value::Float64(-f)),
        Value::Bool(b) => Ok(Value::Int64(-i64::from(b))),
        Value::Utf8(_) => Err(ExprError::new("cannot negate a string")),
    }
}

/// Python-style modulo: the result takes the sign of the divisor.
fn floor_mod_i64(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) { r + b } else { r }
}

fn floor_mod_f64(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }
}

fn arith(op: ArithOp, lhs: Value, rhs: Value) -> ExprResult<Value> {
    if matches!(lhs, Value::Null) || matches!(rhs, Value::Null) {
        return Ok(Value::Null);
    }
    if let (ArithOp::Add, Value::Utf8(a), Value::Utf8(b)) = (op, &lhs, &rhs) {
        return Ok(Value::Utf8(format!("{a}{b}")));
    }

    let (a, b) = match (numeric(&lhs), numeric(&rhs)) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(ExprError::new(format!(
                "unsupported operand types for {op}: {} and {}",
                type_name(&lhs),
                type_name(&rhs)
            )));
        }
    };

    let overflow = || ExprError::new("integer overflow");
    match (a, b) {
        (Numeric::Int(a), Numeric::Int(b)) => match op {
            ArithOp::Add => a.checked_add(b).map(Value::Int64).ok_or_else(overflow),
            ArithOp::Sub => a.checked_sub(b).map(Value::Int64).ok_or_else(overflow),
            ArithOp::Mul => a.checked_mul(b).map(Value::Int64).ok_or_else(overflow),
            ArithOp::Div => Ok(Value::Float64(a as f64 / b as f64)),
            ArithOp::Mod if b == 0 => Ok(Value::Null),
            ArithOp::Mod => Ok(Value::Int64(floor_mod_i64(a, b))),
        },
        (a, b) => {
            let (a, b) = (as_f64(&a), as_f64(&b));
            Ok(Value::Float64(match op {
                ArithOp::Add => a + b,
                ArithOp::Sub => a - b,
                ArithOp::Mul => a * b,
                ArithOp::Div => a / b,
                ArithOp::Mod => floor_mod_f64(a, b),
            }))
        }
    }
}
