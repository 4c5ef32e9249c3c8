//! Lox session driver.
//!
//! A [`Lox`] owns one interpreter and feeds it source through the static
//! pipeline. Globals persist from one [`Lox::run`] to the next, which is
//! how the REPL works; diagnostics never do.
//!
//! ```text
//! source → rlox_compiler::compile_with → Interpreter::resolve → Interpreter::interpret
//! ```

use rlox_compiler::{compile_with, CompileOptions, CompileResult};
use rlox_eval::{EvalConfig, Interpreter, RuntimeError};
use rlox_types::ast::ExprId;
use rlox_types::{CompileErrors, SourceFile};
use thiserror::Error;
use tracing::info;

/// Command-line usage error.
pub const EXIT_USAGE: u8 = 64;
/// Lexical, syntax or resolution error.
pub const EXIT_STATIC: u8 = 65;
/// Uncaught runtime fault.
pub const EXIT_RUNTIME: u8 = 70;
/// The script could not be read.
pub const EXIT_IO: u8 = 74;

/// Why a run did not complete.
#[derive(Debug, Error)]
pub enum RunError {
    /// The source did not lex, parse or resolve; nothing was executed.
    #[error("{0}")]
    Static(CompileErrors),

    /// Execution started and faulted.
    #[error("{0}\n[line {line}]", line = .0.line())]
    Runtime(#[from] RuntimeError),
}

impl RunError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Static(_) => EXIT_STATIC,
            RunError::Runtime(_) => EXIT_RUNTIME,
        }
    }
}

/// One interpreter session.
pub struct Lox {
    interpreter: Interpreter,
    next_expr_id: ExprId,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    pub fn with_config(config: EvalConfig) -> Self {
        Self::with_interpreter(Interpreter::with_config(config))
    }

    /// Use a preconfigured interpreter, e.g. one capturing its output.
    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            next_expr_id: ExprId(0),
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Compile and execute one source.
    pub fn run(&mut self, source: &str, name: &str) -> Result<(), RunError> {
        let compiled = self.compile(&SourceFile::new(name, source))?;
        self.execute(compiled)
    }

    /// Run the static pipeline against this session's globals.
    ///
    /// Expression ids keep counting across calls, so tables from earlier
    /// runs never collide with this one.
    pub fn compile(&mut self, source: &SourceFile) -> Result<CompileResult, RunError> {
        let options = CompileOptions {
            first_expr_id: self.next_expr_id,
            known_globals: self.interpreter.global_names(),
        };
        let result = compile_with(source, &options);
        self.next_expr_id = result.next_expr_id;
        if result.success() {
            Ok(result)
        } else {
            info!(file = %source.name, errors = result.errors.total_errors, "static errors");
            Err(RunError::Static(result.errors))
        }
    }

    /// Execute a program returned by [`Lox::compile`].
    pub fn execute(&mut self, compiled: CompileResult) -> Result<(), RunError> {
        self.interpreter.resolve(compiled.locals);
        self.interpreter.interpret(&compiled.program)?;
        Ok(())
    }
}

/// Static diagnostics as JSON, for `--json`.
pub fn diagnostics_json(errors: &CompileErrors) -> String {
    serde_json::to_string_pretty(errors).unwrap_or_else(|e| {
        format!(
            r#"{{"errors":[{{"message":"Serialization error: {}"}}],"total_errors":1}}"#,
            e
        )
    })
}
