use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of diagnostics kept per run. Later ones are only counted.
pub const MAX_ERRORS: usize = 20;

/// Which static stage family a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Lexical and grammar errors.
    Syntax,
    /// Resolution errors: declarations and scoping.
    Scope,
}

/// Numeric diagnostic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax errors (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const UNEXPECTED_CHARACTER: Self = Self(102);
    pub const INVALID_ASSIGNMENT_TARGET: Self = Self(103);
    pub const TOO_MANY_ARGUMENTS: Self = Self(104);

    // ── Scope errors (E500–E599) ──
    pub const ALREADY_DECLARED: Self = Self(500);
    pub const READ_IN_OWN_INITIALIZER: Self = Self(501);
    pub const RETURN_AT_TOP_LEVEL: Self = Self(502);

    pub fn category(self) -> ErrorCategory {
        match self.0 {
            500..=599 => ErrorCategory::Scope,
            _ => ErrorCategory::Syntax,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => f.write_str("syntax"),
            Self::Scope => f.write_str("scope"),
        }
    }
}

/// A static (lexical, parse or resolution) diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoxError {
    /// Source file name.
    pub file: String,
    pub code: ErrorCode,
    /// Derived from `code`.
    pub category: ErrorCategory,
    pub message: String,
    /// The offending lexeme, or `None` for errors reported at end of input
    /// or at a position without a token (lexer errors).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexeme: Option<String>,
    #[serde(flatten)]
    pub span: Span,
    /// The full source line, for context.
    pub source_line: String,
}

impl LoxError {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            lexeme: None,
            span,
            source_line: source_line.into(),
        }
    }

    /// Record the lexeme the error was reported at.
    pub fn at_lexeme(mut self, lexeme: impl Into<String>) -> Self {
        self.lexeme = Some(lexeme.into());
        self
    }

    pub fn line(&self) -> u32 {
        self.span.line
    }
}

impl fmt::Display for LoxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lexeme {
            Some(lexeme) if lexeme.is_empty() => write!(
                f,
                "[line {}] Error at end: {} ({})",
                self.span.line, self.message, self.code
            ),
            Some(lexeme) => write!(
                f,
                "[line {}] Error at '{}': {} ({})",
                self.span.line, lexeme, self.message, self.code
            ),
            None => write!(
                f,
                "[line {}] Error: {} ({})",
                self.span.line, self.message, self.code
            ),
        }
    }
}

impl std::error::Error for LoxError {}

/// The diagnostics collected by one pass over a source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompileErrors {
    pub errors: Vec<LoxError>,
    pub total_errors: usize,
}

impl CompileErrors {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error, keeping at most [`MAX_ERRORS`].
    pub fn push_error(&mut self, error: LoxError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Append another stage's diagnostics after this one's.
    pub fn extend(&mut self, other: CompileErrors) {
        let dropped = other.total_errors - other.errors.len();
        for error in other.errors {
            self.push_error(error);
        }
        self.total_errors += dropped;
    }

    /// Codes of the stored errors, in report order.
    pub fn codes(&self) -> Vec<ErrorCode> {
        self.errors.iter().map(|e| e.code).collect()
    }
}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "{error}")?;
        }
        let hidden = self.total_errors - self.errors.len();
        if hidden > 0 {
            writeln!(f, "... and {hidden} more")?;
        }
        Ok(())
    }
}
