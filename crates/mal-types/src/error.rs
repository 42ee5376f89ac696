use crate::{SourceFile, Span};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum number of read errors kept before the rest are only counted.
pub const MAX_ERRORS: usize = 20;

// ──────────────────────────────────────────────────────────────────────────────
// Evaluation errors
// ──────────────────────────────────────────────────────────────────────────────

/// Evaluation error. Every variant aborts only the current top-level `eval`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Lookup reached the root environment without a binding.
    #[error("'{0}' not found")]
    UnboundSymbol(String),

    /// Wrong argument count to a special form, closure, or native.
    #[error("{callee}: expected {expected} argument(s), got {got}")]
    Arity {
        callee: String,
        expected: String,
        got: usize,
    },

    /// Operand of an unexpected variant.
    #[error("{callee}: expected {expected}, got {got}")]
    Type {
        callee: String,
        expected: &'static str,
        got: &'static str,
    },

    /// Structurally invalid special-form arguments.
    #[error("malformed {form}: {reason}")]
    MalformedSpecialForm { form: &'static str, reason: String },

    /// Application head did not evaluate to a function.
    #[error("{0} is not callable")]
    NotCallable(String),

    /// Division by zero or integer overflow.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// Non-tail evaluation nested deeper than the configured limit.
    #[error("recursion depth limit of {0} exceeded")]
    RecursionLimit(usize),

    /// A list built at runtime would nest deeper than the limit.
    #[error("list nesting limit of {0} exceeded")]
    NestingLimit(usize),

    /// The output sink used by `prn` failed.
    #[error("output error: {0}")]
    Output(String),
}

impl EvalError {
    pub fn arity(callee: impl Into<String>, expected: impl Into<String>, got: usize) -> Self {
        Self::Arity {
            callee: callee.into(),
            expected: expected.into(),
            got,
        }
    }

    pub fn type_error(callee: impl Into<String>, expected: &'static str, got: &'static str) -> Self {
        Self::Type {
            callee: callee.into(),
            expected,
            got,
        }
    }

    pub fn malformed(form: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedSpecialForm {
            form,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnboundSymbol(_) => "unbound-symbol",
            Self::Arity { .. } => "arity",
            Self::Type { .. } => "type",
            Self::MalformedSpecialForm { .. } => "malformed-special-form",
            Self::NotCallable(_) => "not-callable",
            Self::Arithmetic(_) => "arithmetic",
            Self::RecursionLimit(_) => "recursion-limit",
            Self::NestingLimit(_) => "nesting-limit",
            Self::Output(_) => "output",
        }
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

// ──────────────────────────────────────────────────────────────────────────────
// Read errors
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadErrorKind {
    UnterminatedString,
    InvalidEscape,
    IntegerOverflow,
    UnbalancedParen,
    UnexpectedCloseParen,
    UnexpectedEof,
    TooDeeplyNested,
}

impl fmt::Display for ReadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnterminatedString => "unterminated-string",
            Self::InvalidEscape => "invalid-escape",
            Self::IntegerOverflow => "integer-overflow",
            Self::UnbalancedParen => "unbalanced-paren",
            Self::UnexpectedCloseParen => "unexpected-close-paren",
            Self::UnexpectedEof => "unexpected-eof",
            Self::TooDeeplyNested => "too-deeply-nested",
        };
        f.write_str(name)
    }
}

/// Malformed source text, reported by the lexer or the reader.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{span}: {message}")]
pub struct ReadError {
    pub kind: ReadErrorKind,
    pub message: String,
    pub span: Span,
}

impl ReadError {
    pub fn new(kind: ReadErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    /// Render the error with the offending source line and a caret marker.
    pub fn render(&self, source: &SourceFile) -> String {
        let header = format!("{}:{}: {}", source.name, self.span, self.message);
        let Some(line) = source.line(self.span.start_line) else {
            return header;
        };
        let col = self.span.start_col.max(1) as usize;
        let width = if self.span.end_line == self.span.start_line {
            (self.span.end_col as usize + 1).saturating_sub(col).max(1)
        } else {
            1
        };
        format!("{header}\n{line}\n{}{}", " ".repeat(col - 1), "^".repeat(width))
    }
}

/// Read errors collected across one lexing or parsing pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadErrors {
    pub errors: Vec<ReadError>,
    pub total_errors: usize,
}

impl ReadErrors {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error, keeping at most [`MAX_ERRORS`].
    pub fn push_error(&mut self, error: ReadError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Append another collection, preserving order.
    pub fn extend(&mut self, other: ReadErrors) {
        let dropped = other.total_errors - other.errors.len();
        for err in other.errors {
            self.push_error(err);
        }
        self.total_errors += dropped;
    }

    pub fn first(&self) -> Option<&ReadError> {
        self.errors.first()
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Diagnostics
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Read,
    Eval,
}

/// A structured error report, serialised by the REPL's JSON mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl From<&ReadError> for Diagnostic {
    fn from(err: &ReadError) -> Self {
        Self {
            stage: Stage::Read,
            kind: err.kind.to_string(),
            message: err.message.clone(),
            span: Some(err.span),
        }
    }
}

impl From<&EvalError> for Diagnostic {
    fn from(err: &EvalError) -> Self {
        Self {
            stage: Stage::Eval,
            kind: err.kind().to_string(),
            message: err.to_string(),
            span: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.stage, self.span) {
            (Stage::Read, Some(span)) => write!(f, "read error at {span}: {}", self.message),
            (Stage::Read, None) => write!(f, "read error: {}", self.message),
            (Stage::Eval, _) => write!(f, "error: {}", self.message),
        }
    }
}
