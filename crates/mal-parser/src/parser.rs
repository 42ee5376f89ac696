//! Recursive-descent reader over the lexer's token stream.

use mal_lexer::{Lexer, Token, TokenKind};
use mal_types::{ReadError, ReadErrorKind, ReadErrors, SourceFile, Span, Value, MAX_NESTING};

/// The mal reader.
///
/// Consumes a token stream produced by the lexer and builds one [`Value`]
/// per top-level form. Collects errors and recovers where it can.
pub struct Parser {
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    errors: ReadErrors,
    /// Current list nesting depth.
    depth: usize,
}

/// Result of parsing.
pub struct ParseResult {
    pub forms: Vec<Value>,
    pub errors: ReadErrors,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: ReadErrors::empty(),
            depth: 0,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).or_else(|| self.tokens.last())
    }

    fn peek_kind(&self) -> &TokenKind {
        self.peek().map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    fn current_span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or(Span::point(1, 1))
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek().cloned();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn error(&mut self, kind: ReadErrorKind, message: impl Into<String>, span: Span) {
        self.errors.push_error(ReadError::new(kind, message, span));
    }

    // ── Forms ─────────────────────────────────────────────────────────────────

    /// Parse every top-level form.
    pub fn parse(mut self) -> ParseResult {
        let mut forms = Vec::new();
        while !self.at_end() && self.errors.total_errors < mal_types::MAX_ERRORS {
            if let Some(form) = self.parse_form() {
                forms.push(form);
            }
        }
        ParseResult {
            forms,
            errors: self.errors,
        }
    }

    /// Parse one form. Returns `None` after reporting an error.
    fn parse_form(&mut self) -> Option<Value> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::LParen => self.parse_list(token.span),
            TokenKind::RParen => {
                self.error(
                    ReadErrorKind::UnexpectedCloseParen,
                    "unexpected ')'",
                    token.span,
                );
                None
            }
            TokenKind::Int(n) => Some(Value::Int(n)),
            TokenKind::Str(s) => Some(Value::string(&s)),
            TokenKind::Nil => Some(Value::Nil),
            TokenKind::True => Some(Value::Bool(true)),
            TokenKind::False => Some(Value::Bool(false)),
            TokenKind::Symbol(name) => Some(Value::symbol(&name)),
            TokenKind::Eof => {
                self.error(ReadErrorKind::UnexpectedEof, "expected a form", token.span);
                None
            }
        }
    }

    /// Parse list items after the opening `(` up to the matching `)`.
    fn parse_list(&mut self, open: Span) -> Option<Value> {
        if self.depth >= MAX_NESTING {
            self.error(
                ReadErrorKind::TooDeeplyNested,
                format!("lists nested deeper than {MAX_NESTING} levels"),
                open,
            );
            self.skip_to_end();
            return None;
        }

        self.depth += 1;
        let mut items = Vec::new();
        let mut ok = true;
        loop {
            match self.peek_kind() {
                TokenKind::RParen => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    let span = open.merge(self.current_span());
                    self.error(
                        ReadErrorKind::UnbalancedParen,
                        "expected ')', got end of input",
                        span,
                    );
                    ok = false;
                    break;
                }
                _ => match self.parse_form() {
                    Some(item) => items.push(item),
                    None => ok = false,
                },
            }
        }
        self.depth -= 1;

        ok.then(|| Value::list(items))
    }

    fn skip_to_end(&mut self) {
        while !self.at_end() {
            self.advance();
        }
    }
}

fn parse_source(source: &str) -> ParseResult {
    let sf = SourceFile::repl(source);
    let lexed = Lexer::new(&sf).lex();
    let mut result = Parser::new(lexed.tokens).parse();
    let mut errors = lexed.errors;
    errors.extend(result.errors);
    result.errors = errors;
    result
}

/// Read the first form of `source`. Trailing forms are ignored.
pub fn read_str(source: &str) -> Result<Value, ReadError> {
    let result = parse_source(source);
    if let Some(err) = result.errors.first() {
        return Err(err.clone());
    }
    result.forms.into_iter().next().ok_or_else(|| {
        ReadError::new(
            ReadErrorKind::UnexpectedEof,
            "no form to read",
            Span::point(1, 1),
        )
    })
}

/// Read every form of `source`, in order.
pub fn read_all(source: &str) -> Result<Vec<Value>, ReadError> {
    let result = parse_source(source);
    match result.errors.first() {
        Some(err) => Err(err.clone()),
        None => Ok(result.forms),
    }
}
