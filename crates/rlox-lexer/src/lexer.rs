//! Core Lox lexer: converts source text to a token stream.
//!
//! - Single-line comments stripped (`//`)
//! - Strings may span lines and have no escape sequences
//! - Error recovery: bad characters and unterminated strings are reported
//!   and scanning continues, up to [`MAX_ERRORS`]

use rlox_types::{CompileErrors, ErrorCode, LoxError, SourceFile, Span, MAX_ERRORS};
use tracing::trace;

use crate::token::{Token, TokenKind};

/// The Lox lexer.
///
/// Converts source text into a vector of [`Token`]s, collecting errors
/// along the way.
pub struct Lexer<'src> {
    /// The full source text.
    text: &'src str,
    /// `text` as bytes, for cheap peeking.
    source: &'src [u8],
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// Byte offset of the first character of the token being scanned.
    start: usize,
    start_line: u32,
    start_col: u32,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based, in characters).
    col: u32,
    errors: CompileErrors,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    pub errors: CompileErrors,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            text: &source_file.source,
            source: source_file.source.as_bytes(),
            source_file,
            start: 0,
            start_line: 1,
            start_col: 1,
            pos: 0,
            line: 1,
            col: 1,
            errors: CompileErrors::empty(),
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        loop {
            let token = self.scan_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        trace!(
            file = %self.source_file.name,
            tokens = tokens.len(),
            errors = self.errors.total_errors,
            "lexed"
        );

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

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else if ch & 0xC0 != 0x80 {
            // UTF-8 continuation bytes don't start a new column.
            self.col += 1;
        }
        Some(ch)
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn lexeme(&self) -> &'src str {
        &self.text[self.start..self.pos]
    }

    fn token_span(&self) -> Span {
        Span::new(
            self.start_line,
            self.start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn make(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.lexeme(), self.token_span())
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.line).unwrap_or("");
        let err = LoxError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace, newlines and `//` comments.
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.advance();
                }
                b'/' if self.peek_at(1) == Some(b'/') => {
                    while self.peek().is_some_and(|c| c != b'\n') {
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

    /// Scan the next token, skipping (and reporting) anything that
    /// doesn't form one.
    fn scan_token(&mut self) -> Token {
        loop {
            self.skip_trivia();
            self.start = self.pos;
            self.start_line = self.line;
            self.start_col = self.col;

            if self.at_end() || self.errors.total_errors >= MAX_ERRORS {
                return Token::new(TokenKind::Eof, "", Span::at(self.line, self.col));
            }

            if let Some(token) = self.scan_lexeme() {
                return token;
            }
        }
    }

    /// Scan one lexeme starting at `self.start`. Returns `None` after
    /// reporting an error.
    fn scan_lexeme(&mut self) -> Option<Token> {
        let ch = self.advance()?;

        let kind = match ch {
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b',' => TokenKind::Comma,
            b'.' => TokenKind::Dot,
            b'-' => TokenKind::Minus,
            b'+' => TokenKind::Plus,
            b';' => TokenKind::Semicolon,
            b'/' => TokenKind::Slash,
            b'*' => TokenKind::Star,
            b'?' => TokenKind::Question,
            b':' => TokenKind::Colon,

            b'!' if self.eat(b'=') => TokenKind::BangEq,
            b'!' => TokenKind::Bang,
            b'=' if self.eat(b'=') => TokenKind::EqEq,
            b'=' => TokenKind::Eq,
            b'<' if self.eat(b'=') => TokenKind::LessEq,
            b'<' => TokenKind::Less,
            b'>' if self.eat(b'=') => TokenKind::GreaterEq,
            b'>' => TokenKind::Greater,

            b'"' => return self.scan_string(),
            b'0'..=b'9' => return Some(self.scan_number()),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => return Some(self.scan_identifier()),

            _ => {
                // Swallow the rest of a multi-byte character.
                while self.peek().is_some_and(|c| c & 0xC0 == 0x80) {
                    self.advance();
                }
                let span = self.token_span();
                let message = format!("Unexpected character '{}'.", self.lexeme());
                self.emit_error(ErrorCode::UNEXPECTED_CHARACTER, message, span);
                return None;
            }
        };

        Some(self.make(kind))
    }

    // ─────────────────────────────────────────────────────────────
    // Literals & identifiers
    // ─────────────────────────────────────────────────────────────

    /// Scan a string literal after its opening `"`.
    fn scan_string(&mut self) -> Option<Token> {
        while self.peek().is_some_and(|c| c != b'"') {
            self.advance();
        }

        if self.at_end() {
            let span = Span::at(self.start_line, self.start_col);
            self.emit_error(ErrorCode::UNTERMINATED_STRING, "Unterminated string.", span);
            return None;
        }

        self.advance(); // closing '"'
        let value = &self.text[self.start + 1..self.pos - 1];
        Some(self.make(TokenKind::StringLit(value.to_string())))
    }

    fn scan_number(&mut self) -> Token {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        // A '.' only belongs to the number when digits follow it.
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let value: f64 = self.lexeme().parse().unwrap_or(0.0);
        self.make(TokenKind::NumberLit(value))
    }

    fn scan_identifier(&mut self) -> Token {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.advance();
        }

        let text = self.lexeme();
        let kind =
            TokenKind::from_keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()));
        self.make(kind)
    }
}
