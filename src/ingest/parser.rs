// src/ingest/parser.rs

//! Recursive-descent parser for binary arithmetic expressions.
//!
//! Grammar:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := NUMBER | '(' expr ')'
//! ```
//!
//! Operators are left associative. Unary operators are rejected.

use std::fmt;

use crate::errors::{CalcdagError, Result};
use crate::ingest::lexer::{Token, TokenKind, tokenize};
use crate::types::Operator;

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(f64),
    Binary {
        operator: Operator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// Number of binary nodes, i.e. operations this expression turns into.
    pub fn operation_count(&self) -> usize {
        match self {
            Expr::Literal(_) => 0,
            Expr::Binary { left, right, .. } => {
                1 + left.operation_count() + right.operation_count()
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::Binary {
                operator,
                left,
                right,
            } => write!(f, "({left} {operator} {right})"),
        }
    }
}

/// Deepest allowed nesting, counting both parentheses and the height of the
/// resulting tree. Keeps parsing, storing and dropping an `Expr` within a
/// bounded recursion depth.
pub const MAX_DEPTH: usize = 256;

/// Parse an expression string into a tree.
pub fn parse_expression(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(CalcdagError::ParseError("empty expression".to_string()));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        open_parens: 0,
    };
    let (expr, _) = parser.expr()?;

    if let Some(token) = parser.peek() {
        return Err(unexpected(token));
    }

    Ok(expr)
}

/// A subtree together with its height (0 for a literal).
type Node = (Expr, usize);

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    open_parens: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<Node> {
        let mut left = self.term()?;
        while let Some(operator) = self.peek_operator(&[Operator::Add, Operator::Subtract]) {
            let offset = self.tokens[self.pos].offset;
            self.pos += 1;
            let right = self.term()?;
            left = binary(operator, left, right, offset)?;
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Node> {
        let mut left = self.factor()?;
        while let Some(operator) = self.peek_operator(&[Operator::Multiply, Operator::Divide]) {
            let offset = self.tokens[self.pos].offset;
            self.pos += 1;
            let right = self.factor()?;
            left = binary(operator, left, right, offset)?;
        }
        Ok(left)
    }

    fn factor(&mut self) -> Result<Node> {
        let Some(token) = self.next() else {
            return Err(CalcdagError::ParseError(
                "unexpected end of expression".to_string(),
            ));
        };

        match token.kind {
            TokenKind::Number(v) => Ok((Expr::Literal(v), 0)),
            TokenKind::LeftParen => {
                if self.open_parens >= MAX_DEPTH {
                    return Err(too_deep(token.offset));
                }
                self.open_parens += 1;
                let inner = self.expr()?;
                self.open_parens -= 1;

                match self.next() {
                    Some(Token {
                        kind: TokenKind::RightParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(unexpected(other)),
                    None => Err(CalcdagError::ParseError(format!(
                        "unclosed parenthesis at offset {}",
                        token.offset
                    ))),
                }
            }
            TokenKind::Operator(op) => Err(CalcdagError::ParseError(format!(
                "unary operator '{op}' at offset {} is not supported",
                token.offset
            ))),
            TokenKind::RightParen => Err(unexpected(token)),
        }
    }

    fn peek_operator(&self, accepted: &[Operator]) -> Option<Operator> {
        match self.peek()?.kind {
            TokenKind::Operator(op) if accepted.contains(&op) => Some(op),
            _ => None,
        }
    }
}

fn binary(operator: Operator, left: Node, right: Node, offset: usize) -> Result<Node> {
    let height = 1 + left.1.max(right.1);
    if height > MAX_DEPTH {
        return Err(too_deep(offset));
    }
    Ok((
        Expr::Binary {
            operator,
            left: Box::new(left.0),
            right: Box::new(right.0),
        },
        height,
    ))
}

fn too_deep(offset: usize) -> CalcdagError {
    CalcdagError::ParseError(format!(
        "expression nests deeper than {MAX_DEPTH} levels at offset {offset}"
    ))
}

fn unexpected(token: Token) -> CalcdagError {
    let text = match token.kind {
        TokenKind::Number(v) => v.to_string(),
        TokenKind::Operator(op) => op.to_string(),
        TokenKind::LeftParen => "(".to_string(),
        TokenKind::RightParen => ")".to_string(),
    };
    CalcdagError::ParseError(format!(
        "unexpected '{text}' at offset {}",
        token.offset
    ))
}
