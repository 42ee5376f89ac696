//! Core mal lexer: converts source text to a token stream.
//!
//! Features:
//! - Parentheses, integer literals, string literals, `nil`/`true`/`false`, symbols
//! - Whitespace and commas are insignificant
//! - Line comments start with `;`
//! - Error recovery: collects up to [`mal_types::MAX_ERRORS`] errors instead
//!   of stopping at the first

use mal_types::{ReadError, ReadErrorKind, ReadErrors, SourceFile, Span};

use crate::token::{Token, TokenKind};

/// The mal lexer.
pub struct Lexer<'src> {
    /// The full source text as bytes.
    source: &'src [u8],
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    col: u32,
    errors: ReadErrors,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    pub errors: ReadErrors,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self::from_source(&source_file.source)
    }

    pub fn from_source(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            errors: ReadErrors::empty(),
        }
    }

    /// Lex the entire input into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            if self.errors.total_errors >= mal_types::MAX_ERRORS {
                break;
            }
            let token = self.scan_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn emit_error(&mut self, kind: ReadErrorKind, message: impl Into<String>, span: Span) {
        self.errors.push_error(ReadError::new(kind, message, span));
    }

    /// Bytes that end an atom.
    fn is_delimiter(ch: u8) -> bool {
        matches!(ch, b'(' | b')' | b'"' | b';' | b',') || ch.is_ascii_whitespace()
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                b' ' | b'\t' | b'\r' | b'\n' | b',' => {
                    self.advance();
                }
                b';' => {
                    while let Some(ch) = self.peek() {
                        if ch == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Token scanning
    // ─────────────────────────────────────────────────────────────

    fn scan_token(&mut self) -> Token {
        self.skip_trivia();

        let start_line = self.line;
        let start_col = self.col;
        let start_pos = self.pos;

        let Some(ch) = self.advance() else {
            return Token::new(TokenKind::Eof, self.current_span());
        };

        match ch {
            b'(' => Token::new(TokenKind::LParen, self.span_from(start_line, start_col)),
            b')' => Token::new(TokenKind::RParen, self.span_from(start_line, start_col)),
            b'"' => self.scan_string(start_line, start_col),
            _ => self.scan_atom(start_pos, start_line, start_col),
        }
    }

    /// Scan an integer, a literal name, or a symbol. The first byte is
    /// already consumed.
    fn scan_atom(&mut self, start_pos: usize, start_line: u32, start_col: u32) -> Token {
        while let Some(ch) = self.peek() {
            if Self::is_delimiter(ch) {
                break;
            }
            self.advance();
        }

        let span = self.span_from(start_line, start_col);
        // Atoms only end at ASCII delimiters, so the slice is valid UTF-8.
        let source = self.source;
        let text = String::from_utf8_lossy(&source[start_pos..self.pos]);

        if !is_integer_literal(&text) {
            return Token::new(TokenKind::from_atom(&text), span);
        }

        match text.parse::<i64>() {
            Ok(n) => Token::new(TokenKind::Int(n), span),
            Err(_) => {
                self.emit_error(
                    ReadErrorKind::IntegerOverflow,
                    format!("integer literal '{text}' does not fit in 64 bits"),
                    span,
                );
                Token::new(TokenKind::Int(0), span)
            }
        }
    }

    /// Scan a string literal starting after the opening `"`.
    fn scan_string(&mut self, start_line: u32, start_col: u32) -> Token {
        let mut buf: Vec<u8> = Vec::new();

        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ReadErrorKind::UnterminatedString,
                        "unterminated string literal",
                        span,
                    );
                    return Token::new(
                        TokenKind::Str(String::from_utf8_lossy(&buf).into_owned()),
                        span,
                    );
                }
                Some(b'"') => {
                    self.advance();
                    return Token::new(
                        TokenKind::Str(String::from_utf8_lossy(&buf).into_owned()),
                        self.span_from(start_line, start_col),
                    );
                }
                Some(b'\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
    }

    /// Scan an escape sequence starting at the `\`.
    /// Returns the unescaped byte, or `None` at end of input.
    fn scan_escape_sequence(&mut self) -> Option<u8> {
        let start_line = self.line;
        let start_col = self.col;
        self.advance();

        match self.peek() {
            Some(b'"') | Some(b'\\') => self.advance(),
            Some(b'n') => self.advance().map(|_| b'\n'),
            Some(b't') => self.advance().map(|_| b'\t'),
            Some(b'r') => self.advance().map(|_| b'\r'),
            Some(ch) => {
                self.advance();
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ReadErrorKind::InvalidEscape,
                    format!("invalid escape sequence '\\{}'", ch as char),
                    span,
                );
                Some(ch)
            }
            // The caller reports the unterminated string.
            None => None,
        }
    }
}

/// `-?[0-9]+`
fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
