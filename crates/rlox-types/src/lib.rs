//! Shared types for the rlox interpreter.
//!
//! This crate defines the AST node types, source spans, diagnostics, and
//! the debug AST printer used across the lexer, parser, resolver and
//! evaluator.

mod error;
mod span;
pub mod ast;
pub mod printer;

pub use error::{CompileErrors, ErrorCategory, ErrorCode, LoxError, MAX_ERRORS};
pub use span::{SourceFile, Span};
