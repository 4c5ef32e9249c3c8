//! rlox compiler: orchestrates the static pipeline.
//!
//! ```text
//! Lox source → Lexer → Parser → Resolver → program + hop-count table
//! ```
//!
//! Resolution only runs on a program that lexed and parsed cleanly, so a
//! [`CompileResult`] with errors never carries a partial table.

pub mod resolver;
pub mod scope;

pub use resolver::{Resolution, Resolver};

use rlox_lexer::Lexer;
use rlox_parser::Parser;
use rlox_types::ast::{ExprId, Locals, Stmt};
use rlox_types::{CompileErrors, SourceFile};
use tracing::info;

/// Knobs for one run of the static pipeline.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Id for the first expression node, so ids stay unique across a
    /// session that compiles several sources.
    pub first_expr_id: ExprId,
    /// Names already bound in the global environment.
    pub known_globals: Vec<String>,
}

/// Everything the static pipeline produced for one source.
#[derive(Debug)]
pub struct CompileResult {
    pub program: Vec<Stmt>,
    pub locals: Locals,
    /// Lexer, parser and resolver diagnostics, in that order.
    pub errors: CompileErrors,
    /// First id the next compile in this session should use.
    pub next_expr_id: ExprId,
}

impl CompileResult {
    /// `true` when the program may be executed.
    pub fn success(&self) -> bool {
        !self.errors.has_errors()
    }
}

/// Lex, parse and resolve `source` with default options.
pub fn compile(source: &str, filename: &str) -> CompileResult {
    let source_file = SourceFile::new(filename, source);
    compile_with(&source_file, &CompileOptions::default())
}

/// Lex, parse and resolve a source file.
pub fn compile_with(source_file: &SourceFile, options: &CompileOptions) -> CompileResult {
    let lexed = Lexer::new(source_file).lex();
    let mut errors = lexed.errors;

    let parsed = Parser::new(lexed.tokens, source_file)
        .with_first_id(options.first_expr_id)
        .parse();
    errors.extend(parsed.errors);

    let locals = if errors.has_errors() {
        Locals::new()
    } else {
        Resolver::new(&mut errors, source_file)
            .with_known_globals(options.known_globals.iter().cloned())
            .resolve(&parsed.program)
            .locals
    };

    info!(
        file = %source_file.name,
        statements = parsed.program.len(),
        errors = errors.total_errors,
        "compiled"
    );

    CompileResult {
        program: parsed.program,
        locals,
        errors,
        next_expr_id: parsed.next_id,
    }
}
