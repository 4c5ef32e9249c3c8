//! Statement executor and expression evaluator.

use std::io::{self, Write};
use std::rc::Rc;

use rlox_stack::ensure_sufficient_stack;
use rlox_types::ast::*;
use rlox_types::Span;
use tracing::{debug, trace};

use crate::control_flow::ControlFlow;
use crate::environment::{self, EnvRef, Environment};
use crate::error::{EvalResult, RuntimeError};
use crate::natives::define_natives;
use crate::value::{LoxClass, LoxFunction, Value};

/// Call depth allowed before a [`RuntimeError::StackOverflow`]. The host
/// stack grows on demand, so this only stops runaway recursion.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 4096;

/// Interpreter limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalConfig {
    /// Maximum number of nested user-function calls.
    pub max_call_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Where `print` writes.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Stdout,
    /// Printed lines are kept for [`Interpreter::take_output`].
    Capture(Vec<String>),
}

/// Tree-walking interpreter. Globals and resolved hop counts persist
/// across calls to [`Interpreter::interpret`], which is what lets a REPL
/// build on earlier lines.
pub struct Interpreter {
    globals: EnvRef,
    /// Environment of the innermost block or call being executed.
    environment: EnvRef,
    locals: Locals,
    config: EvalConfig,
    output: Output,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(EvalConfig::default())
    }

    pub fn with_config(config: EvalConfig) -> Self {
        let mut globals = Environment::new();
        define_natives(&mut globals);
        let globals = globals.into_ref();
        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
            config,
            output: Output::Stdout,
            call_depth: 0,
        }
    }

    /// Collect printed lines instead of writing them to stdout.
    pub fn capture_output(mut self) -> Self {
        self.output = Output::Capture(Vec::new());
        self
    }

    /// Drain lines printed since the last call. Always empty when writing
    /// to stdout.
    pub fn take_output(&mut self) -> Vec<String> {
        match &mut self.output {
            Output::Stdout => Vec::new(),
            Output::Capture(lines) => std::mem::take(lines),
        }
    }

    /// Merge a resolver pass into the hop-count table.
    pub fn resolve(&mut self, locals: Locals) {
        self.locals.extend(locals);
    }

    /// Names currently bound in the global environment, sorted.
    pub fn global_names(&self) -> Vec<String> {
        self.globals.borrow().names()
    }

    /// Execute a program. Stops at the first fault.
    pub fn interpret(&mut self, program: &[Stmt]) -> EvalResult<()> {
        debug!(statements = program.len(), "interpret");
        for stmt in program {
            if let Err(err) = self.execute(stmt) {
                debug!(line = err.line(), error = %err, "runtime fault");
                return Err(err);
            }
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    fn execute(&mut self, stmt: &Stmt) -> EvalResult<ControlFlow> {
        ensure_sufficient_stack(|| self.exec_stmt(stmt))
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<ControlFlow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                self.emit(value.to_string(), expr.span)?;
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(init) => self.evaluate(init)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(name.name.clone(), value);
            }
            Stmt::Block(stmts) => {
                let env = Environment::with_enclosing(Rc::clone(&self.environment));
                return self.execute_block(stmts, env.into_ref());
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                }
                if let Some(else_branch) = else_branch {
                    return self.execute(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let ControlFlow::Return(value) = self.execute(body)? {
                        return Ok(ControlFlow::Return(value));
                    }
                }
            }
            Stmt::Function(decl) => {
                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment));
                self.environment
                    .borrow_mut()
                    .define(decl.name.name.clone(), Value::Function(Rc::new(function)));
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                return Ok(ControlFlow::Return(value));
            }
            Stmt::Class(decl) => {
                let class = LoxClass {
                    name: decl.name.name.clone(),
                };
                self.environment
                    .borrow_mut()
                    .define(decl.name.name.clone(), Value::Class(Rc::new(class)));
            }
        }
        Ok(ControlFlow::Normal)
    }

    /// Run `stmts` inside `env`, restoring the current environment on
    /// every exit path.
    fn execute_block(&mut self, stmts: &[Stmt], env: EnvRef) -> EvalResult<ControlFlow> {
        let previous = std::mem::replace(&mut self.environment, env);
        let result = self.execute_stmts(stmts);
        self.environment = previous;
        result
    }

    fn execute_stmts(&mut self, stmts: &[Stmt]) -> EvalResult<ControlFlow> {
        for stmt in stmts {
            if let ControlFlow::Return(value) = self.execute(stmt)? {
                return Ok(ControlFlow::Return(value));
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn emit(&mut self, line: String, span: Span) -> EvalResult<()> {
        match &mut self.output {
            Output::Stdout => write_line(&mut io::stdout().lock(), &line, span),
            Output::Capture(lines) => {
                lines.push(line);
                Ok(())
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    fn evaluate(&mut self, expr: &Expr) -> EvalResult<Value> {
        ensure_sufficient_stack(|| self.eval_expr(expr))
    }

    fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(Value::from(literal)),
            ExprKind::Grouping(inner) => self.evaluate(inner),
            ExprKind::Unary {
                op,
                op_span,
                operand,
            } => {
                let value = self.evaluate(operand)?;
                eval_unary(*op, value, *op_span)
            }
            ExprKind::Binary {
                left,
                op,
                op_span,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                eval_binary(*op, left, right, *op_span)
            }
            ExprKind::Logical { left, op, right } => {
                let left = self.evaluate(left)?;
                let decided = match op {
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::And => !left.is_truthy(),
                };
                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }
            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }
            ExprKind::Call {
                callee,
                args,
                paren,
            } => {
                let callee = self.evaluate(callee)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate(arg)?);
                }
                self.call(callee, values, *paren)
            }
            ExprKind::Variable(name) => self.look_up_variable(name, expr.id),
            ExprKind::Assign { name, value } => {
                let value = self.evaluate(value)?;
                let assigned = match self.locals.get(&expr.id) {
                    Some(&hops) => {
                        environment::assign_at(&self.environment, hops, &name.name, value.clone())
                    }
                    None => self.globals.borrow_mut().assign(&name.name, value.clone()),
                };
                if !assigned {
                    return Err(undefined(name));
                }
                Ok(value)
            }
        }
    }

    fn look_up_variable(&self, name: &Ident, id: ExprId) -> EvalResult<Value> {
        let found = match self.locals.get(&id) {
            Some(&hops) => environment::get_at(&self.environment, hops, &name.name),
            None => self.globals.borrow().get(&name.name),
        };
        found.ok_or_else(|| undefined(name))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Calls
    // ══════════════════════════════════════════════════════════════════════

    fn call(&mut self, callee: Value, args: Vec<Value>, paren: Span) -> EvalResult<Value> {
        match callee {
            Value::Function(function) => {
                check_arity(function.arity(), args.len(), paren)?;
                self.call_function(&function, args, paren)
            }
            Value::Native(native) => {
                check_arity(native.arity, args.len(), paren)?;
                trace!(name = native.name, "native call");
                Ok((native.func)(&args))
            }
            other => {
                trace!(kind = other.type_name(), at = %paren, "not callable");
                Err(RuntimeError::NotCallable { span: paren })
            }
        }
    }

    fn call_function(
        &mut self,
        function: &LoxFunction,
        args: Vec<Value>,
        paren: Span,
    ) -> EvalResult<Value> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(RuntimeError::StackOverflow { span: paren });
        }

        // Parameters live in a child of the closure, not of the caller.
        let mut env = Environment::with_enclosing(Rc::clone(&function.closure));
        for (param, arg) in function.decl.params.iter().zip(args) {
            env.define(param.name.clone(), arg);
        }

        self.call_depth += 1;
        trace!(name = function.name(), depth = self.call_depth, "call");
        let result = self.execute_block(&function.decl.body, env.into_ref());
        self.call_depth -= 1;

        match result? {
            ControlFlow::Return(value) => Ok(value),
            ControlFlow::Normal => Ok(Value::Nil),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Operators
// ══════════════════════════════════════════════════════════════════════════════

fn eval_unary(op: UnaryOp, value: Value, span: Span) -> EvalResult<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Neg => match value {
            Value::Number(n) => Ok(Value::Number(-n)),
            _ => Err(RuntimeError::type_mismatch("Operand must be a number.", span)),
        },
    }
}

fn eval_binary(op: BinOp, left: Value, right: Value, span: Span) -> EvalResult<Value> {
    use Value::{Bool, Number};

    match (op, &left, &right) {
        (BinOp::Eq, _, _) => Ok(Bool(left == right)),
        (BinOp::NotEq, _, _) => Ok(Bool(left != right)),
        (BinOp::Add, Number(a), Number(b)) => Ok(Number(a + b)),
        (BinOp::Add, Value::String(a), Value::String(b)) => {
            Ok(Value::String(Rc::from(format!("{a}{b}"))))
        }
        (BinOp::Add, _, _) => Err(RuntimeError::type_mismatch(
            "Operands must be two numbers or two strings.",
            span,
        )),
        (BinOp::Sub, Number(a), Number(b)) => Ok(Number(a - b)),
        (BinOp::Mul, Number(a), Number(b)) => Ok(Number(a * b)),
        (BinOp::Div, Number(a), Number(b)) => Ok(Number(a / b)),
        (BinOp::Less, Number(a), Number(b)) => Ok(Bool(a < b)),
        (BinOp::LessEq, Number(a), Number(b)) => Ok(Bool(a <= b)),
        (BinOp::Greater, Number(a), Number(b)) => Ok(Bool(a > b)),
        (BinOp::GreaterEq, Number(a), Number(b)) => Ok(Bool(a >= b)),
        _ => Err(RuntimeError::type_mismatch("Operands must be numbers.", span)),
    }
}

fn write_line(out: &mut impl Write, line: &str, span: Span) -> EvalResult<()> {
    writeln!(out, "{line}").map_err(|e| RuntimeError::Output {
        message: e.to_string(),
        span,
    })
}

fn check_arity(expected: usize, got: usize, span: Span) -> EvalResult<()> {
    if expected == got {
        Ok(())
    } else {
        Err(RuntimeError::ArityMismatch {
            expected,
            got,
            span,
        })
    }
}

fn undefined(name: &Ident) -> RuntimeError {
    RuntimeError::UndefinedVariable {
        name: name.name.clone(),
        span: name.span,
    }
}
