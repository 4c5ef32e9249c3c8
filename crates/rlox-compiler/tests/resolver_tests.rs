//! Resolver tests: hop counts, scope diagnostics, idempotence.

use pretty_assertions::assert_eq;
use rlox_compiler::{compile, compile_with, CompileOptions, Resolver};
use rlox_types::ast::{Expr, ExprId, ExprKind, Locals, Stmt};
use rlox_types::{CompileErrors, ErrorCode, SourceFile};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Every variable reference and assignment in source order, with its
/// recorded hop count (`None` = global).
fn resolved(source: &str) -> Vec<(String, Option<usize>)> {
    let result = compile(source, "test.lox");
    assert!(result.success(), "errors: {}", result.errors);
    let mut refs = Vec::new();
    collect_refs(&result.program, &mut refs);
    refs.into_iter()
        .map(|(name, id)| (name, result.locals.get(&id).copied()))
        .collect()
}

fn refs(pairs: &[(&str, Option<usize>)]) -> Vec<(String, Option<usize>)> {
    pairs.iter().map(|(n, h)| (n.to_string(), *h)).collect()
}

fn codes(source: &str) -> Vec<ErrorCode> {
    compile(source, "test.lox").errors.codes()
}

fn collect_expr(expr: &Expr, out: &mut Vec<(String, ExprId)>) {
    match &expr.kind {
        ExprKind::Literal(_) => {}
        ExprKind::Variable(name) => out.push((name.name.clone(), expr.id)),
        ExprKind::Assign { name, value } => {
            out.push((name.name.clone(), expr.id));
            collect_expr(value, out);
        }
        ExprKind::Grouping(inner) => collect_expr(inner, out),
        ExprKind::Unary { operand, .. } => collect_expr(operand, out),
        ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
            collect_expr(left, out);
            collect_expr(right, out);
        }
        ExprKind::Ternary {
            condition,
            then_branch,
            else_branch,
        } => {
            collect_expr(condition, out);
            collect_expr(then_branch, out);
            collect_expr(else_branch, out);
        }
        ExprKind::Call { callee, args, .. } => {
            collect_expr(callee, out);
            for arg in args {
                collect_expr(arg, out);
            }
        }
    }
}

fn collect_refs(stmts: &[Stmt], out: &mut Vec<(String, ExprId)>) {
    for stmt in stmts {
        match stmt {
            Stmt::Expression(e) | Stmt::Print(e) => collect_expr(e, out),
            Stmt::Var { initializer, .. } => {
                if let Some(e) = initializer {
                    collect_expr(e, out);
                }
            }
            Stmt::Block(body) => collect_refs(body, out),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                collect_expr(condition, out);
                collect_refs(std::slice::from_ref(then_branch), out);
                if let Some(e) = else_branch {
                    collect_refs(std::slice::from_ref(e), out);
                }
            }
            Stmt::While { condition, body } => {
                collect_expr(condition, out);
                collect_refs(std::slice::from_ref(body), out);
            }
            Stmt::Function(decl) => collect_refs(&decl.body, out),
            Stmt::Return { value, .. } => {
                if let Some(e) = value {
                    collect_expr(e, out);
                }
            }
            Stmt::Class(_) => {}
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Hop counts
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_globals_stay_unresolved() {
    assert_eq!(
        resolved("var a = 1; print a; a = 2;"),
        refs(&[("a", None), ("a", None)])
    );
}

#[test]
fn test_block_local_is_zero_hops() {
    assert_eq!(
        resolved("{ var a = 1; print a; }"),
        refs(&[("a", Some(0))])
    );
}

#[test]
fn test_nested_blocks_count_hops() {
    assert_eq!(
        resolved("{ var a = 1; { { print a; } } }"),
        refs(&[("a", Some(2))])
    );
}

#[test]
fn test_parameters_are_local() {
    assert_eq!(
        resolved("fun f(a) { return a; }"),
        refs(&[("a", Some(0))])
    );
}

#[test]
fn test_closure_reaches_enclosing_function() {
    assert_eq!(
        resolved("fun outer() { var x = 1; fun inner() { return x; } return inner; }"),
        refs(&[("x", Some(1)), ("inner", Some(0))])
    );
}

#[test]
fn test_recursive_global_function() {
    assert_eq!(
        resolved("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }"),
        refs(&[
            ("n", Some(0)),
            ("n", Some(0)),
            ("fib", None),
            ("n", Some(0)),
            ("fib", None),
            ("n", Some(0)),
        ])
    );
}

#[test]
fn test_local_function_can_recurse() {
    assert_eq!(
        resolved("{ fun f() { f(); } }"),
        refs(&[("f", Some(1))])
    );
}

#[test]
fn test_assignment_hops() {
    assert_eq!(
        resolved("{ var a; { a = 2; } }"),
        refs(&[("a", Some(1))])
    );
}

#[test]
fn test_for_loop_variable() {
    // { var i; while (i < 3) { print i; i = i + 1; } }
    assert_eq!(
        resolved("for (var i = 0; i < 3; i = i + 1) print i;"),
        refs(&[
            ("i", Some(0)),
            ("i", Some(1)),
            ("i", Some(1)),
            ("i", Some(1)),
        ])
    );
}

#[test]
fn test_shadowing_inner_scope() {
    assert_eq!(
        resolved("{ var x = 1; { var x = 2; print x; } print x; }"),
        refs(&[("x", Some(0)), ("x", Some(0))])
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Own initializer
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_initializer_reads_outer_global() {
    assert_eq!(
        resolved("var a = 1; { var a = a + 1; print a; }"),
        refs(&[("a", None), ("a", Some(0))])
    );
}

#[test]
fn test_initializer_reads_outer_local() {
    assert_eq!(
        resolved("{ var a = 1; { var a = a + 1; print a; } }"),
        refs(&[("a", Some(1)), ("a", Some(0))])
    );
}

#[test]
fn test_initializer_reads_enclosing_parameter() {
    assert_eq!(
        resolved("fun f(a) { { var a = a * 2; return a; } }"),
        refs(&[("a", Some(1)), ("a", Some(0))])
    );
}

#[test]
fn test_own_initializer_without_outer_binding() {
    assert_eq!(codes("{ var a = a; }"), vec![ErrorCode::READ_IN_OWN_INITIALIZER]);
}

#[test]
fn test_global_declared_later_does_not_count() {
    assert_eq!(
        codes("{ var b = b; }\nvar b = 1;"),
        vec![ErrorCode::READ_IN_OWN_INITIALIZER]
    );
}

#[test]
fn test_own_initializer_with_known_global() {
    let source = SourceFile::new("test.lox", "{ var a = a; print a; }");
    let options = CompileOptions {
        known_globals: vec!["a".to_string()],
        ..CompileOptions::default()
    };
    let result = compile_with(&source, &options);
    assert!(result.success(), "errors: {}", result.errors);
    // Only the `print a` reference is local.
    assert_eq!(result.locals.len(), 1);
}

#[test]
fn test_top_level_self_reference_is_allowed() {
    assert_eq!(codes("var a = a;"), vec![]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Diagnostics
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_duplicate_local_exactly_one_diagnostic() {
    let result = compile("{ var x = 1; var x = 2; }", "test.lox");
    assert_eq!(result.errors.codes(), vec![ErrorCode::ALREADY_DECLARED]);
    let err = &result.errors.errors[0];
    assert!(err.message.contains("'x'"));
    assert_eq!(err.lexeme.as_deref(), Some("x"));
    assert_eq!(err.span.col, 18);
}

#[test]
fn test_duplicate_parameter() {
    assert_eq!(codes("fun f(a, a) {}"), vec![ErrorCode::ALREADY_DECLARED]);
}

#[test]
fn test_local_redeclaring_parameter() {
    assert_eq!(
        codes("fun f(a) { var a = 1; }"),
        vec![ErrorCode::ALREADY_DECLARED]
    );
}

#[test]
fn test_duplicate_function_and_class_in_block() {
    assert_eq!(
        codes("{ fun f() {} class f {} }"),
        vec![ErrorCode::ALREADY_DECLARED]
    );
}

#[test]
fn test_shadowing_across_scopes_is_allowed() {
    assert_eq!(codes("{ var x = 1; { var x = 2; } }"), vec![]);
    assert_eq!(codes("var a; fun f(a) { { var a; } }"), vec![]);
}

#[test]
fn test_top_level_redeclaration_is_allowed() {
    assert_eq!(codes("var a = 1; var a = 2; fun a() {}"), vec![]);
}

#[test]
fn test_return_at_top_level() {
    assert_eq!(codes("return 1;"), vec![ErrorCode::RETURN_AT_TOP_LEVEL]);
    assert_eq!(codes("{ return; }"), vec![ErrorCode::RETURN_AT_TOP_LEVEL]);
    assert_eq!(codes("fun f() { { return; } }"), vec![]);
}

#[test]
fn test_return_after_function_body_is_top_level_again() {
    assert_eq!(
        codes("fun f() { return 1; }\nreturn 2;"),
        vec![ErrorCode::RETURN_AT_TOP_LEVEL]
    );
}

#[test]
fn test_diagnostics_do_not_stop_the_pass() {
    assert_eq!(
        codes("{ var x; var x; }\nreturn;\n{ var y = y; }"),
        vec![
            ErrorCode::ALREADY_DECLARED,
            ErrorCode::RETURN_AT_TOP_LEVEL,
            ErrorCode::READ_IN_OWN_INITIALIZER,
        ]
    );
}

#[test]
fn test_diagnostic_display() {
    let result = compile("\nreturn 1;", "test.lox");
    assert_eq!(
        result.errors.errors[0].to_string(),
        "[line 2] Error at 'return': Can't return from top-level code. (E502)"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Idempotence
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_resolving_twice_gives_same_locals() {
    let source = SourceFile::new(
        "test.lox",
        "fun counter() { var i = 0; fun inc() { i = i + 1; return i; } return inc; }\n\
         { var a = 1; { var a = a + 1; print a; } }",
    );
    let result = compile_with(&source, &CompileOptions::default());
    assert!(result.success());

    let run = |program: &[Stmt]| -> Locals {
        let mut errors = CompileErrors::empty();
        let locals = Resolver::new(&mut errors, &source).resolve(program).locals;
        assert!(!errors.has_errors());
        locals
    };
    let first = run(&result.program);
    let second = run(&result.program);
    assert_eq!(first, second);
    assert_eq!(first, result.locals);
}
