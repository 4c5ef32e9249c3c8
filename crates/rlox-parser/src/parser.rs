//! Core parser infrastructure: token cursor, error reporting, recovery.

use rlox_lexer::token::{Token, TokenKind};
use rlox_types::ast::{Expr, ExprId, ExprKind, Ident, Stmt};
use rlox_types::{CompileErrors, ErrorCode, LoxError, SourceFile, Span, MAX_ERRORS};
use tracing::{debug, trace};

/// Most arguments a call (or parameters a function) may have.
pub const MAX_ARGUMENTS: usize = 255;

/// The Lox parser.
///
/// Consumes a token stream produced by the lexer and builds a list of
/// statements. Collects errors and recovers at statement boundaries.
pub struct Parser<'src> {
    /// The token stream, always terminated by `Eof`.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Source file for error context.
    source_file: &'src SourceFile,
    errors: CompileErrors,
    /// Id handed to the next expression node.
    next_id: ExprId,
}

/// Result of parsing.
pub struct ParseResult {
    /// Every statement that parsed cleanly, in source order.
    pub program: Vec<Stmt>,
    pub errors: CompileErrors,
    /// First id not used by this parse.
    pub next_id: ExprId,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source file.
    pub fn new(mut tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let span = tokens.last().map_or(Span::at(1, 1), |t| t.span);
            tokens.push(Token::new(TokenKind::Eof, "", span));
        }
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: CompileErrors::empty(),
            next_id: ExprId(0),
        }
    }

    /// Start numbering expression nodes at `first` instead of zero.
    ///
    /// A session that parses several sources (the REPL) passes the previous
    /// parse's `next_id` so ids stay unique across all of them.
    pub fn with_first_id(mut self, first: ExprId) -> Self {
        self.next_id = first;
        self
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// The most recently consumed token.
    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    pub(crate) fn previous_span(&self) -> Span {
        self.previous().span
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.at_end() {
            self.pos += 1;
        }
        token
    }

    /// Current index into the token stream.
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// Check if the current token matches the given kind exactly.
    pub(crate) fn check_exact(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check_exact(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind. Returns the token if matched, or emits
    /// `message` at the current token.
    pub(crate) fn expect(&mut self, expected: &TokenKind, message: &str) -> Option<Token> {
        if self.check_exact(expected) {
            Some(self.advance())
        } else {
            self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
            None
        }
    }

    /// Expect an identifier token. Returns the name and span.
    pub(crate) fn expect_identifier(&mut self, message: &str) -> Option<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            _ => {
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                None
            }
        }
    }

    // ── Node Construction ─────────────────────────────────────────────────────

    /// Build an expression node with a fresh id.
    pub(crate) fn make_expr(&mut self, kind: ExprKind, span: Span) -> Expr {
        let id = self.next_id;
        self.next_id = id.next();
        Expr::new(id, kind, span)
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report an error at the current token position.
    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let token = self.peek().clone();
        self.error_at(code, message, &token);
    }

    /// Report an error at a specific token.
    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, token: &Token) {
        let source_line = self.source_file.line(token.span.line).unwrap_or("");
        let error = LoxError::new(
            &self.source_file.name,
            code,
            message,
            token.span,
            source_line,
        )
        .at_lexeme(token.lexeme.as_str());
        self.errors.push_error(error);
    }

    /// Returns `true` if we've hit the error limit and should stop.
    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.total_errors >= MAX_ERRORS
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip tokens until just after a `;` or just before a keyword that
    /// starts a statement. `start` is where the failed declaration began;
    /// at least one token is always consumed past it.
    pub(crate) fn synchronize(&mut self, start: usize) {
        if self.pos == start {
            self.advance();
        }
        let from = self.pos;
        while !self.at_end() {
            if self.previous().kind == TokenKind::Semicolon
                || self.peek_kind().starts_statement()
            {
                break;
            }
            self.advance();
        }
        trace!(
            skipped = self.pos - from,
            resume = %self.peek().span,
            "synchronized after parse error"
        );
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a list of statements.
    pub fn parse(mut self) -> ParseResult {
        let mut program = Vec::new();
        while !self.at_end() && !self.too_many_errors() {
            if let Some(stmt) = self.parse_declaration() {
                program.push(stmt);
            }
        }
        debug!(
            file = %self.source_file.name,
            statements = program.len(),
            errors = self.errors.total_errors,
            "parsed"
        );
        ParseResult {
            program,
            errors: self.errors,
            next_id: self.next_id,
        }
    }
}
