//! Lox resolver: computes how far up the environment chain each local
//! variable reference lives.
//!
//! Entry point: [`Resolver::resolve`].
//!
//! Error codes emitted:
//! - E500: variable already declared in this scope
//! - E501: local variable read in its own initializer
//! - E502: `return` outside a function

use std::collections::HashSet;

use rlox_stack::ensure_sufficient_stack;
use rlox_types::ast::*;
use rlox_types::{CompileErrors, ErrorCode, LoxError, SourceFile, Span};
use tracing::{debug, trace};

use crate::scope::{FunctionKind, Lookup, ScopeStack};

/// Output of a resolver pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Hop counts for every `Variable`/`Assign` bound in a local scope.
    pub locals: Locals,
}

// ══════════════════════════════════════════════════════════════════════════════
// Resolver
// ══════════════════════════════════════════════════════════════════════════════

/// Walks a parsed program and records a hop count for each local
/// variable reference. Globals are left out of the table.
pub struct Resolver<'a> {
    scopes: ScopeStack,
    function: FunctionKind,
    /// Names known to be bound in the global environment: supplied by the
    /// caller plus top-level declarations seen so far.
    globals: HashSet<String>,
    locals: Locals,
    errors: &'a mut CompileErrors,
    source: &'a SourceFile,
}

impl<'a> Resolver<'a> {
    pub fn new(errors: &'a mut CompileErrors, source: &'a SourceFile) -> Self {
        Self {
            scopes: ScopeStack::new(),
            function: FunctionKind::None,
            globals: HashSet::new(),
            locals: Locals::new(),
            errors,
            source,
        }
    }

    /// Names already bound globally before this program runs (natives,
    /// earlier REPL lines).
    pub fn with_known_globals<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.globals.extend(names.into_iter().map(Into::into));
        self
    }

    /// Resolve a complete program.
    pub fn resolve(mut self, program: &[Stmt]) -> Resolution {
        let before = self.errors.total_errors;
        self.resolve_stmts(program);
        debug!(
            file = %self.source.name,
            locals = self.locals.len(),
            errors = self.errors.total_errors - before,
            "resolved"
        );
        Resolution {
            locals: self.locals,
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    fn resolve_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.resolve_stmt(stmt);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        ensure_sufficient_stack(|| self.resolve_stmt_kind(stmt));
    }

    fn resolve_stmt_kind(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(init) = initializer {
                    self.resolve_expr(init);
                }
                self.scopes.define(&name.name);
            }
            Stmt::Block(stmts) => {
                self.scopes.push();
                self.resolve_stmts(stmts);
                self.scopes.pop();
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
            Stmt::Function(decl) => {
                // Defined before the body so the function can recurse.
                self.declare(&decl.name);
                self.scopes.define(&decl.name.name);
                self.resolve_function(decl, FunctionKind::Function);
            }
            Stmt::Return { keyword, value } => {
                if self.function == FunctionKind::None {
                    self.error(
                        ErrorCode::RETURN_AT_TOP_LEVEL,
                        "Can't return from top-level code.",
                        *keyword,
                        "return",
                    );
                }
                if let Some(value) = value {
                    self.resolve_expr(value);
                }
            }
            Stmt::Class(decl) => {
                self.declare(&decl.name);
                self.scopes.define(&decl.name.name);
            }
        }
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionKind) {
        let enclosing = std::mem::replace(&mut self.function, kind);

        self.scopes.push();
        for param in &decl.params {
            self.declare(param);
            self.scopes.define(&param.name);
        }
        self.resolve_stmts(&decl.body);
        self.scopes.pop();

        self.function = enclosing;
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    fn resolve_expr(&mut self, expr: &Expr) {
        ensure_sufficient_stack(|| self.resolve_expr_kind(expr));
    }

    fn resolve_expr_kind(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(_) => {}
            ExprKind::Grouping(inner) => self.resolve_expr(inner),
            ExprKind::Unary { operand, .. } => self.resolve_expr(operand),
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_expr(then_branch);
                self.resolve_expr(else_branch);
            }
            ExprKind::Call { callee, args, .. } => {
                self.resolve_expr(callee);
                for arg in args {
                    self.resolve_expr(arg);
                }
            }
            ExprKind::Variable(name) => match self.scopes.lookup(&name.name) {
                Lookup::Local(hops) => self.record(expr.id, name, hops),
                Lookup::Global => {}
                Lookup::OwnInitializer => {
                    if !self.globals.contains(&name.name) {
                        self.error(
                            ErrorCode::READ_IN_OWN_INITIALIZER,
                            "Can't read local variable in its own initializer.",
                            name.span,
                            &name.name,
                        );
                    }
                }
            },
            ExprKind::Assign { name, value } => {
                self.resolve_expr(value);
                if let Lookup::Local(hops) = self.scopes.lookup(&name.name) {
                    self.record(expr.id, name, hops);
                }
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Helpers
    // ══════════════════════════════════════════════════════════════════════

    fn declare(&mut self, name: &Ident) {
        if self.scopes.is_global() {
            self.globals.insert(name.name.clone());
            return;
        }
        if !self.scopes.declare(&name.name) {
            self.error(
                ErrorCode::ALREADY_DECLARED,
                format!("Already a variable named '{}' in this scope.", name.name),
                name.span,
                &name.name,
            );
        }
    }

    fn record(&mut self, id: ExprId, name: &Ident, hops: usize) {
        trace!(name = %name.name, at = %name.span, hops, "resolved local");
        self.locals.insert(id, hops);
    }

    fn error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span, lexeme: &str) {
        let message = message.into();
        debug!(%code, at = %span, %message, "resolve error");
        let source_line = self.source.line(span.line).unwrap_or("");
        self.errors.push_error(
            LoxError::new(&self.source.name, code, message, span, source_line).at_lexeme(lexeme),
        );
    }
}
