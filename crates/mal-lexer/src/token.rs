//! Token types for the mal lexer.

use mal_types::Span;
use std::fmt;

/// A single token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `(`
    LParen,
    /// `)`
    RParen,

    /// Integer literal, optionally negative: `42`, `-7`
    Int(i64),
    /// String literal with escapes already resolved
    Str(String),
    /// `nil`
    Nil,
    /// `true`
    True,
    /// `false`
    False,
    /// Any other atom: `def!`, `let*`, `+`, `empty?`
    Symbol(String),

    /// End of input. Always the last token.
    Eof,
}

impl TokenKind {
    /// Map reserved atom names to their literal token.
    pub fn from_atom(s: &str) -> TokenKind {
        match s {
            "nil" => TokenKind::Nil,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => TokenKind::Symbol(s.to_string()),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Int(n) => write!(f, "{n}"),
            TokenKind::Str(s) => write!(f, "{s:?}"),
            TokenKind::Nil => write!(f, "nil"),
            TokenKind::True => write!(f, "true"),
            TokenKind::False => write!(f, "false"),
            TokenKind::Symbol(s) => write!(f, "{s}"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}
