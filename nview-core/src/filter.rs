//! Row filter expressions
//!
//! A small boolean expression language over column names:
//!
//! ```text
//! status == "open" and (protocol == 'tcp' or port in [53, 161])
//! not banner == "" & port >= 1024
//! ```
//!
//! Supported: `==` (or `=`), `!=`, `<`, `<=`, `>`, `>=`, `in [..]`,
//! `not in [..]`, `and`/`&`, `or`/`|`, `not`/`~` and parentheses. Strings
//! are single or double quoted; numbers are decimal.
//!
//! Cells are text. When one side of a comparison is a number, the cell is
//! read as a number too; a cell that is not numeric never equals a number
//! and fails every ordering comparison against one.

use crate::error::{Error, Result};
use crate::types::{Column, FlatRow};
use std::cmp::Ordering;
use std::fmt;

/// Maximum nesting of `not` and parentheses
const MAX_DEPTH: usize = 256;

/// A parsed filter bound to a column schema
#[derive(Debug, Clone)]
pub struct Filter {
    expr: Expr,
}

impl Filter {
    /// Parses `text`, resolving column names against `columns`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Filter`] if the expression is malformed or names a
    /// column that is not in `columns`.
    ///
    /// # Examples
    ///
    /// ```
    /// use nview_core::filter::Filter;
    /// use nview_core::types::{Column, FlatRow};
    ///
    /// let filter = Filter::parse(r#"status == "open" and port < 1024"#, &Column::ALL).unwrap();
    /// let row: FlatRow = ["10.0.0.1", "22", "tcp", "open", "ssh"].into_iter().collect();
    /// assert!(filter.matches(&row));
    /// ```
    pub fn parse(text: &str, columns: &[Column]) -> Result<Self> {
        let tokens = lex(text)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
            columns,
        };
        let expr = parser.parse()?;
        Ok(Self { expr })
    }

    /// True if `row` (ordered like the parse-time schema) satisfies the filter
    pub fn matches(&self, row: &FlatRow) -> bool {
        self.expr.eval(row.values())
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

impl CmpOp {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            CmpOp::Eq => ordering == Ordering::Equal,
            CmpOp::Ne => ordering != Ordering::Equal,
            CmpOp::Lt => ordering == Ordering::Less,
            CmpOp::Le => ordering != Ordering::Greater,
            CmpOp::Gt => ordering == Ordering::Greater,
            CmpOp::Ge => ordering != Ordering::Less,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(f64),
    Cmp(CmpOp),
    And,
    Or,
    Not,
    In,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "{}", name),
            Token::Str(s) => write!(f, "{:?}", s),
            Token::Num(n) => write!(f, "{}", n),
            Token::Cmp(op) => f.write_str(match op {
                CmpOp::Eq => "==",
                CmpOp::Ne => "!=",
                CmpOp::Lt => "<",
                CmpOp::Le => "<=",
                CmpOp::Gt => ">",
                CmpOp::Ge => ">=",
            }),
            Token::And => f.write_str("and"),
            Token::Or => f.write_str("or"),
            Token::Not => f.write_str("not"),
            Token::In => f.write_str("in"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::LBracket => f.write_str("["),
            Token::RBracket => f.write_str("]"),
            Token::Comma => f.write_str(","),
        }
    }
}

fn filter_error(message: impl Into<String>) -> Error {
    Error::Filter(message.into())
}

fn lex(text: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '&' => {
                tokens.push(Token::And);
                i += 1;
            }
            '|' => {
                tokens.push(Token::Or);
                i += 1;
            }
            '~' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Cmp(CmpOp::Eq));
                i += if next == Some('=') { 2 } else { 1 };
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Cmp(CmpOp::Ne));
                i += 2;
            }
            '<' | '>' => {
                let inclusive = next == Some('=');
                tokens.push(Token::Cmp(match (c, inclusive) {
                    ('<', false) => CmpOp::Lt,
                    ('<', true) => CmpOp::Le,
                    ('>', false) => CmpOp::Gt,
                    _ => CmpOp::Ge,
                }));
                i += if inclusive { 2 } else { 1 };
            }
            '"' | '\'' => {
                let (value, end) = lex_string(&chars, i)?;
                tokens.push(Token::Str(value));
                i = end;
            }
            c if c.is_ascii_digit()
                || (c == '-' && next.is_some_and(|n| n.is_ascii_digit() || n == '.'))
                || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) =>
            {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse()
                    .map_err(|_| filter_error(format!("invalid number '{}'", literal)))?;
                tokens.push(Token::Num(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "in" => Token::In,
                    _ => Token::Ident(word),
                });
            }
            other => {
                return Err(filter_error(format!(
                    "unexpected character '{}' at position {}",
                    other, i
                )))
            }
        }
    }

    Ok(tokens)
}

/// Lexes a quoted string starting at `start`; returns the value and the
/// index just past the closing quote
fn lex_string(chars: &[char], start: usize) -> Result<(String, usize)> {
    let quote = chars[start];
    let mut value = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                value.push(match chars[i + 1] {
                    'n' => '\n',
                    't' => '\t',
                    other => other,
                });
                i += 2;
            }
            c if c == quote => return Ok((value, i + 1)),
            c => {
                value.push(c);
                i += 1;
            }
        }
    }

    Err(filter_error(format!(
        "unterminated string starting at position {}",
        start
    )))
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Column(usize),
    Str(String),
    Num(f64),
}

#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Str(String),
    Num(f64),
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Or(Vec<Expr>),
    And(Vec<Expr>),
    Not(Box<Expr>),
    Compare(Operand, CmpOp, Operand),
    In(Operand, Vec<Literal>),
}

/// Value of an operand for one row
enum Value<'a> {
    Str(&'a str),
    Num(f64),
}

impl Operand {
    fn value<'a>(&'a self, row: &'a [String]) -> Value<'a> {
        match self {
            Operand::Column(index) => {
                Value::Str(row.get(*index).map(String::as_str).unwrap_or(""))
            }
            Operand::Str(s) => Value::Str(s),
            Operand::Num(n) => Value::Num(*n),
        }
    }
}

impl Literal {
    fn as_operand(&self) -> Operand {
        match self {
            Literal::Str(s) => Operand::Str(s.clone()),
            Literal::Num(n) => Operand::Num(*n),
        }
    }
}

fn compare(lhs: &Value<'_>, op: CmpOp, rhs: &Value<'_>) -> bool {
    let ordering = match (lhs, rhs) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Num(a), Value::Num(b)) => a.partial_cmp(b),
        (Value::Str(a), Value::Num(b)) => {
            a.trim().parse::<f64>().ok().and_then(|a| a.partial_cmp(b))
        }
        (Value::Num(a), Value::Str(b)) => {
            b.trim().parse::<f64>().ok().and_then(|b| a.partial_cmp(&b))
        }
    };

    match ordering {
        Some(ordering) => op.holds(ordering),
        None => op == CmpOp::Ne,
    }
}

impl Expr {
    fn eval(&self, row: &[String]) -> bool {
        match self {
            Expr::Or(terms) => terms.iter().any(|t| t.eval(row)),
            Expr::And(terms) => terms.iter().all(|t| t.eval(row)),
            Expr::Not(inner) => !inner.eval(row),
            Expr::Compare(lhs, op, rhs) => compare(&lhs.value(row), *op, &rhs.value(row)),
            Expr::In(operand, list) => {
                let value = operand.value(row);
                list.iter()
                    .any(|item| compare(&value, CmpOp::Eq, &item.as_operand().value(row)))
            }
        }
    }
}

struct Parser<'c> {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    columns: &'c [Column],
}

impl Parser<'_> {
    fn parse(&mut self) -> Result<Expr> {
        if self.tokens.is_empty() {
            return Err(filter_error("empty expression"));
        }
        let expr = self.parse_or()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(filter_error(format!("unexpected '{}'", token))),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.advance() {
            Some(ref token) if *token == expected => Ok(()),
            Some(token) => Err(filter_error(format!(
                "expected '{}', found '{}'",
                expected, token
            ))),
            None => Err(filter_error(format!(
                "expected '{}' at end of expression",
                expected
            ))),
        }
    }

    // Chains stay flat; only `not` and parentheses add depth
    fn parse_or(&mut self) -> Result<Expr> {
        let mut terms = vec![self.parse_and()?];
        while self.eat(&Token::Or) {
            terms.push(self.parse_and()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::Or(terms)
        })
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut terms = vec![self.parse_not()?];
        while self.eat(&Token::And) {
            terms.push(self.parse_not()?);
        }
        Ok(if terms.len() == 1 {
            terms.remove(0)
        } else {
            Expr::And(terms)
        })
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.eat(&Token::Not) {
            self.descend()?;
            let inner = self.parse_not();
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner?)));
        }
        if self.eat(&Token::LParen) {
            self.descend()?;
            let expr = self.parse_or();
            self.depth -= 1;
            let expr = expr?;
            self.expect(Token::RParen)?;
            return Ok(expr);
        }
        self.parse_comparison()
    }

    fn descend(&mut self) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(filter_error("expression nested too deeply"));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let lhs = self.parse_operand()?;

        match self.advance() {
            Some(Token::Cmp(op)) => {
                let rhs = self.parse_operand()?;
                Ok(Expr::Compare(lhs, op, rhs))
            }
            Some(Token::In) => Ok(Expr::In(lhs, self.parse_list()?)),
            Some(Token::Not) => {
                self.expect(Token::In)?;
                Ok(Expr::Not(Box::new(Expr::In(lhs, self.parse_list()?))))
            }
            Some(token) => Err(filter_error(format!(
                "expected a comparison, found '{}'",
                token
            ))),
            None => Err(filter_error("expected a comparison at end of expression")),
        }
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        match self.advance() {
            Some(Token::Ident(name)) => self.resolve(&name).map(Operand::Column),
            Some(Token::Str(s)) => Ok(Operand::Str(s)),
            Some(Token::Num(n)) => Ok(Operand::Num(n)),
            Some(token) => Err(filter_error(format!(
                "expected a column or value, found '{}'",
                token
            ))),
            None => Err(filter_error("expected a column or value at end of expression")),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<Literal>> {
        self.expect(Token::LBracket)?;
        let mut items = Vec::new();
        if self.eat(&Token::RBracket) {
            return Ok(items);
        }
        loop {
            match self.advance() {
                Some(Token::Str(s)) => items.push(Literal::Str(s)),
                Some(Token::Num(n)) => items.push(Literal::Num(n)),
                Some(token) => {
                    return Err(filter_error(format!(
                        "expected a value in list, found '{}'",
                        token
                    )))
                }
                None => return Err(filter_error("unterminated list")),
            }
            if self.eat(&Token::RBracket) {
                return Ok(items);
            }
            self.expect(Token::Comma)?;
        }
    }

    fn resolve(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| filter_error(format!("unknown column '{}'", name)))
    }
}
