// src/ingest/lexer.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{CalcdagError, Result};
use crate::types::Operator;

/// One lexical token with its byte offset in the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Operator(Operator),
    LeftParen,
    RightParen,
}

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:(?P<num>\d+(?:\.\d*)?|\.\d+)|(?P<op>[-+*/])|(?P<open>\()|(?P<close>\)))")
        .expect("token regex is valid")
});

static TRAILING_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*$").expect("whitespace regex is valid"));

/// Split an expression into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while !TRAILING_SPACE.is_match(&source[pos..]) {
        let rest = &source[pos..];
        let caps = TOKEN.captures(rest).ok_or_else(|| {
            let skipped = rest.len() - rest.trim_start().len();
            let bad = rest.trim_start().chars().next().unwrap_or(' ');
            CalcdagError::ParseError(format!(
                "unexpected character '{bad}' at offset {}",
                pos + skipped
            ))
        })?;

        let whole = caps.get(0).map(|m| m.end()).unwrap_or(0);

        let (kind, start) = if let Some(m) = caps.name("num") {
            let value: f64 = m.as_str().parse().map_err(|e| {
                CalcdagError::ParseError(format!("invalid number '{}': {e}", m.as_str()))
            })?;
            (TokenKind::Number(value), m.start())
        } else if let Some(m) = caps.name("op") {
            let operator = m
                .as_str()
                .parse::<Operator>()
                .map_err(|e| CalcdagError::ParseError(e.to_string()))?;
            (TokenKind::Operator(operator), m.start())
        } else if let Some(m) = caps.name("open") {
            (TokenKind::LeftParen, m.start())
        } else if let Some(m) = caps.name("close") {
            (TokenKind::RightParen, m.start())
        } else {
            return Err(CalcdagError::ParseError(format!(
                "unrecognised token at offset {pos}"
            )));
        };

        tokens.push(Token {
            kind,
            offset: pos + start,
        });
        pos += whole;
    }

    Ok(tokens)
}
