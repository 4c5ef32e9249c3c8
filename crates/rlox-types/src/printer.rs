//! Parenthesized (Lisp-style) rendering of the AST.
//!
//! Debug output only: the driver's `--print-ast` flag and the parser tests
//! use it to compare tree shapes without spelling out node structs.
//!
//! ```text
//! -123 * (45.67)        =>  (* (- 123) (group 45.67))
//! for (;;) print i;     =>  (while true (print i))
//! ```

use rlox_stack::ensure_sufficient_stack;

use crate::ast::*;

/// Render a single expression.
pub fn print_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

/// Render a single statement.
pub fn print_stmt(stmt: &Stmt) -> String {
    let mut out = String::new();
    write_stmt(&mut out, stmt);
    out
}

/// Render a program, one top-level statement per line.
pub fn print_program(program: &[Stmt]) -> String {
    program
        .iter()
        .map(print_stmt)
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_expr(out: &mut String, expr: &Expr) {
    ensure_sufficient_stack(|| write_expr_node(out, expr));
}

fn write_expr_node(out: &mut String, expr: &Expr) {
    match &expr.kind {
        ExprKind::Literal(Literal::String(s)) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        ExprKind::Literal(lit) => out.push_str(&lit.to_string()),
        ExprKind::Grouping(inner) => parenthesize(out, "group", &[inner]),
        ExprKind::Unary { op, operand, .. } => parenthesize(out, op.symbol(), &[operand]),
        ExprKind::Binary {
            left, op, right, ..
        } => parenthesize(out, op.symbol(), &[left, right]),
        ExprKind::Logical { left, op, right } => {
            parenthesize(out, op.symbol(), &[left, right])
        }
        ExprKind::Ternary {
            condition,
            then_branch,
            else_branch,
        } => parenthesize(out, "?", &[condition, then_branch, else_branch]),
        ExprKind::Call { callee, args, .. } => {
            out.push_str("(call ");
            write_expr(out, callee);
            for arg in args {
                out.push(' ');
                write_expr(out, arg);
            }
            out.push(')');
        }
        ExprKind::Variable(name) => out.push_str(&name.name),
        ExprKind::Assign { name, value } => {
            out.push_str("(= ");
            out.push_str(&name.name);
            out.push(' ');
            write_expr(out, value);
            out.push(')');
        }
    }
}

fn parenthesize(out: &mut String, name: &str, exprs: &[&Expr]) {
    out.push('(');
    out.push_str(name);
    for expr in exprs {
        out.push(' ');
        write_expr(out, expr);
    }
    out.push(')');
}

fn write_stmt(out: &mut String, stmt: &Stmt) {
    ensure_sufficient_stack(|| write_stmt_node(out, stmt));
}

fn write_stmt_node(out: &mut String, stmt: &Stmt) {
    match stmt {
        Stmt::Expression(expr) => {
            out.push_str("(; ");
            write_expr(out, expr);
            out.push(')');
        }
        Stmt::Print(expr) => {
            out.push_str("(print ");
            write_expr(out, expr);
            out.push(')');
        }
        Stmt::Var { name, initializer } => {
            out.push_str("(var ");
            out.push_str(&name.name);
            if let Some(init) = initializer {
                out.push(' ');
                write_expr(out, init);
            }
            out.push(')');
        }
        Stmt::Block(stmts) => {
            out.push_str("(block");
            write_body(out, stmts);
            out.push(')');
        }
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            out.push_str("(if ");
            write_expr(out, condition);
            out.push(' ');
            write_stmt(out, then_branch);
            if let Some(else_branch) = else_branch {
                out.push(' ');
                write_stmt(out, else_branch);
            }
            out.push(')');
        }
        Stmt::While { condition, body } => {
            out.push_str("(while ");
            write_expr(out, condition);
            out.push(' ');
            write_stmt(out, body);
            out.push(')');
        }
        Stmt::Function(decl) => {
            out.push_str("(fun ");
            out.push_str(&decl.name.name);
            out.push_str(" (");
            let params: Vec<&str> = decl.params.iter().map(|p| p.name.as_str()).collect();
            out.push_str(&params.join(" "));
            out.push(')');
            write_body(out, &decl.body);
            out.push(')');
        }
        Stmt::Return { value, .. } => {
            out.push_str("(return");
            if let Some(value) = value {
                out.push(' ');
                write_expr(out, value);
            }
            out.push(')');
        }
        Stmt::Class(decl) => {
            out.push_str("(class ");
            out.push_str(&decl.name.name);
            out.push(')');
        }
    }
}

fn write_body(out: &mut String, stmts: &[Stmt]) {
    for stmt in stmts {
        out.push(' ');
        write_stmt(out, stmt);
    }
}
