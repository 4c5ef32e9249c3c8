//! Interpreter tests: compile with the static pipeline, run, compare the
//! printed lines.

use pretty_assertions::assert_eq;
use rlox_compiler::{compile_with, CompileOptions};
use rlox_eval::{EvalConfig, Interpreter, RuntimeError};
use rlox_types::ast::ExprId;
use rlox_types::SourceFile;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Several programs run against one interpreter, the way a REPL does.
struct Session {
    interpreter: Interpreter,
    next_id: ExprId,
}

impl Session {
    fn new() -> Self {
        Self::with_config(EvalConfig::default())
    }

    fn with_config(config: EvalConfig) -> Self {
        Self {
            interpreter: Interpreter::with_config(config).capture_output(),
            next_id: ExprId(0),
        }
    }

    fn run(&mut self, source: &str) -> (Vec<String>, Result<(), RuntimeError>) {
        let options = CompileOptions {
            first_expr_id: self.next_id,
            known_globals: self.interpreter.global_names(),
        };
        let result = compile_with(&SourceFile::new("test.lox", source), &options);
        assert!(result.success(), "errors: {}", result.errors);
        self.next_id = result.next_expr_id;
        self.interpreter.resolve(result.locals);
        let outcome = self.interpreter.interpret(&result.program);
        (self.interpreter.take_output(), outcome)
    }
}

fn output(source: &str) -> Vec<String> {
    let (lines, outcome) = Session::new().run(source);
    if let Err(err) = outcome {
        panic!("runtime fault: {err} [line {}]", err.line());
    }
    lines
}

fn fault(source: &str) -> (Vec<String>, RuntimeError) {
    let (lines, outcome) = Session::new().run(source);
    match outcome {
        Err(err) => (lines, err),
        Ok(()) => panic!("expected a runtime fault, got output {lines:?}"),
    }
}

fn lines(expected: &[&str]) -> Vec<String> {
    expected.iter().map(|s| s.to_string()).collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_arithmetic_and_precedence() {
    assert_eq!(
        output("print 1 + 2 * 3; print (1 + 2) * 3; print 7 / 2; print -3 - -1;"),
        lines(&["7", "9", "3.5", "-2"])
    );
}

#[test]
fn test_integral_numbers_print_without_fraction() {
    assert_eq!(output("print 3.0; print 0.5 + 0.5;"), lines(&["3", "1"]));
}

#[test]
fn test_division_by_zero_is_ieee() {
    assert_eq!(
        output("print 1 / 0; print -1 / 0; var nan = 0 / 0; print nan == nan;"),
        lines(&["inf", "-inf", "false"])
    );
}

#[test]
fn test_string_concatenation() {
    assert_eq!(
        output("var a = \"foo\"; print a + \"bar\";"),
        lines(&["foobar"])
    );
}

#[test]
fn test_truthiness() {
    assert_eq!(
        output("print !nil; print !0; print !\"\"; print !false; print 0 ? \"t\" : \"f\";"),
        lines(&["true", "false", "false", "true", "t"])
    );
}

#[test]
fn test_equality() {
    assert_eq!(
        output(
            "print nil == nil; print 1 == \"1\"; print \"a\" == \"a\"; \
             print true != false; print nil == false;"
        ),
        lines(&["true", "false", "true", "true", "false"])
    );
}

#[test]
fn test_callables_compare_by_identity() {
    assert_eq!(
        output("fun f() {} fun g() {} var h = f; print f == h; print f == g; print clock == clock;"),
        lines(&["true", "false", "true"])
    );
}

#[test]
fn test_logical_operators_return_deciding_operand() {
    assert_eq!(
        output("print nil or \"x\"; print \"\" and 1; print 1 or missing; print false and missing;"),
        lines(&["x", "1", "1", "false"])
    );
}

#[test]
fn test_ternary_picks_branch() {
    assert_eq!(
        output("print 1 < 2 ? \"yes\" : \"no\"; print 1 > 2 ? \"yes\" : \"no\";"),
        lines(&["yes", "no"])
    );
}

#[test]
fn test_ternary_untaken_branch_has_no_effect() {
    let source = "var fired = false;\n\
                  fun mark() { fired = true; return \"no\"; }\n\
                  print 1 < 2 ? \"yes\" : mark();\n\
                  print fired;";
    assert_eq!(output(source), lines(&["yes", "false"]));
}

#[test]
fn test_nested_ternary_is_right_associative() {
    assert_eq!(
        output("var n = 5; print n < 0 ? \"neg\" : n == 0 ? \"zero\" : \"pos\";"),
        lines(&["pos"])
    );
}

#[test]
fn test_assignment_is_an_expression() {
    assert_eq!(
        output("var a; var b; a = b = 3; print a; print b;"),
        lines(&["3", "3"])
    );
}

#[test]
fn test_value_display() {
    assert_eq!(
        output("fun f() {} class Point {} print f; print Point; print clock; print nil;"),
        lines(&["<fn f>", "Point", "<native fn>", "nil"])
    );
}

#[test]
fn test_clock_native() {
    assert_eq!(output("print clock() > 0;"), lines(&["true"]));
}

// ══════════════════════════════════════════════════════════════════════════════
// Variables & scope
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_initializer_reads_outer_binding() {
    assert_eq!(
        output("var a = 1; { var a = a + 1; print a; } print a;"),
        lines(&["2", "1"])
    );
}

#[test]
fn test_uninitialized_variable_is_nil() {
    assert_eq!(output("var a; print a;"), lines(&["nil"]));
}

#[test]
fn test_block_shadowing() {
    let source = "var a = \"global\";\n\
                  { var a = \"outer\"; { var a = \"inner\"; print a; } print a; }\n\
                  print a;";
    assert_eq!(output(source), lines(&["inner", "outer", "global"]));
}

#[test]
fn test_assignment_reaches_enclosing_scope() {
    assert_eq!(
        output("{ var a = 1; { a = 2; } print a; }"),
        lines(&["2"])
    );
}

#[test]
fn test_global_redeclaration_replaces() {
    assert_eq!(output("var a = 1; var a = 2; print a;"), lines(&["2"]));
}

#[test]
fn test_control_flow_statements() {
    let source = "var i = 0; while (i < 3) { if (i == 1) print \"one\"; else print i; i = i + 1; }";
    assert_eq!(output(source), lines(&["0", "one", "2"]));
}

#[test]
fn test_for_loop_prints_in_order() {
    assert_eq!(
        output("for (var i = 0; i < 3; i = i + 1) print i;"),
        lines(&["0", "1", "2"])
    );
}

#[test]
fn test_for_loop_variable_does_not_leak() {
    let (printed, err) = fault("for (var i = 0; i < 3; i = i + 1) print i;\nprint i;");
    assert_eq!(printed, lines(&["0", "1", "2"]));
    assert_eq!(
        err,
        RuntimeError::UndefinedVariable {
            name: "i".into(),
            span: err.span(),
        }
    );
    assert_eq!(err.line(), 2);
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions & closures
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_counter_closure_shares_state() {
    let source = "fun counter() { var i = 0; fun inc() { i = i + 1; return i; } return inc; }\n\
                  var c = counter();\n\
                  print c();\n\
                  print c();";
    assert_eq!(output(source), lines(&["1", "2"]));
}

#[test]
fn test_independent_closures() {
    let source = "fun counter() { var i = 0; fun inc() { i = i + 1; return i; } return inc; }\n\
                  var a = counter(); var b = counter();\n\
                  print a(); print a(); print b();";
    assert_eq!(output(source), lines(&["1", "2", "1"]));
}

#[test]
fn test_closure_binds_at_declaration() {
    let source = "var a = \"global\";\n\
                  { fun show() { print a; } show(); var a = \"block\"; show(); }";
    assert_eq!(output(source), lines(&["global", "global"]));
}

#[test]
fn test_recursion() {
    let source = "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\n\
                  print fib(15);";
    assert_eq!(output(source), lines(&["610"]));
}

#[test]
fn test_return_unwinds_loops_and_blocks() {
    let source = "fun f() { while (true) { { return \"out\"; } } }\n\
                  print f();\n\
                  fun g() { for (var i = 0; ; i = i + 1) if (i == 4) return i; }\n\
                  print g();";
    assert_eq!(output(source), lines(&["out", "4"]));
}

#[test]
fn test_function_without_return_yields_nil() {
    assert_eq!(
        output("fun f() {} print f(); fun g() { return; } print g();"),
        lines(&["nil", "nil"])
    );
}

#[test]
fn test_arguments_evaluate_left_to_right() {
    let source = "fun show(x) { print x; return x; }\n\
                  fun pair(a, b) { return a + b; }\n\
                  print pair(show(1), show(2));";
    assert_eq!(output(source), lines(&["1", "2", "3"]));
}

// ══════════════════════════════════════════════════════════════════════════════
// Faults
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_fault_stops_run_and_reports_line() {
    let (printed, err) = fault("print 1;\nprint -\"x\";\nprint 2;");
    assert_eq!(printed, lines(&["1"]));
    assert!(matches!(err, RuntimeError::TypeMismatch { .. }));
    assert_eq!(err.line(), 2);
    assert_eq!(err.to_string(), "Operand must be a number.");
}

#[test]
fn test_mixed_addition_faults() {
    let (_, err) = fault("print \"a\" + 1;");
    assert_eq!(
        err.to_string(),
        "Operands must be two numbers or two strings."
    );
}

#[test]
fn test_string_comparison_faults() {
    let (_, err) = fault("print \"a\" < \"b\";");
    assert!(matches!(err, RuntimeError::TypeMismatch { .. }));
}

#[test]
fn test_undefined_variable() {
    let (_, err) = fault("print missing;");
    assert_eq!(err.to_string(), "Undefined variable 'missing'.");
    let (_, err) = fault("missing = 1;");
    assert!(matches!(err, RuntimeError::UndefinedVariable { .. }));
}

#[test]
fn test_arity_mismatch() {
    let (_, err) = fault("fun f(a, b) {}\nf(1);");
    assert!(matches!(
        err,
        RuntimeError::ArityMismatch {
            expected: 2,
            got: 1,
            ..
        }
    ));
    assert_eq!(err.line(), 2);

    let (_, err) = fault("clock(1);");
    assert!(matches!(
        err,
        RuntimeError::ArityMismatch {
            expected: 0,
            got: 1,
            ..
        }
    ));
}

#[test]
fn test_calling_non_callables() {
    let (_, err) = fault("\"str\"();");
    assert!(matches!(err, RuntimeError::NotCallable { .. }));
    let (_, err) = fault("class A {}\nA();");
    assert!(matches!(err, RuntimeError::NotCallable { .. }));
    assert_eq!(err.line(), 2);
}

#[test]
fn test_deep_recursion_returns_normally() {
    let source = "fun count(n) { if (n > 0) return count(n - 1); return n; }\n\
                  print count(2000);";
    assert_eq!(output(source), lines(&["0"]));
}

#[test]
fn test_runaway_recursion_is_a_fault() {
    let (_, err) = fault("fun f() { f(); }\nf();");
    assert!(matches!(err, RuntimeError::StackOverflow { .. }));
    assert_eq!(err.line(), 1);
}

#[test]
fn test_call_depth_limit_is_configurable() {
    let mut session = Session::with_config(EvalConfig { max_call_depth: 32 });
    let (_, outcome) = session.run("fun f(n) { f(n + 1); }\nf(0);");
    assert!(matches!(outcome, Err(RuntimeError::StackOverflow { .. })));

    // The depth counter unwinds with the fault.
    let (printed, outcome) =
        session.run("fun g(n) { if (n > 0) g(n - 1); }\ng(20);\nprint \"ok\";");
    assert_eq!(outcome, Ok(()));
    assert_eq!(printed, lines(&["ok"]));
}

#[test]
fn test_deeply_nested_expression_evaluates() {
    let grouped = format!("print {}1{};", "(".repeat(3000), ")".repeat(3000));
    assert_eq!(output(&grouped), lines(&["1"]));
    let negated = format!("print {}1;", "-".repeat(3000));
    assert_eq!(output(&negated), lines(&["1"]));
}

#[test]
fn test_environment_restored_after_fault() {
    let mut session = Session::new();
    let (_, outcome) = session.run("{ var a = \"local\"; print -a; }");
    assert!(outcome.is_err());

    // `b` must land in the globals, not in the abandoned block.
    let (printed, outcome) = session.run("var b = 1; print b;");
    assert_eq!(outcome, Ok(()));
    assert_eq!(printed, lines(&["1"]));
}

#[test]
fn test_fault_inside_call_restores_environment() {
    let mut session = Session::new();
    let (_, outcome) = session.run("fun f(x) { return -x; } f(\"s\");");
    assert!(matches!(outcome, Err(RuntimeError::TypeMismatch { .. })));
    let (printed, _) = session.run("var x = \"global\"; print x;");
    assert_eq!(printed, lines(&["global"]));
}

// ══════════════════════════════════════════════════════════════════════════════
// Sessions
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_globals_persist_across_runs() {
    let mut session = Session::new();
    session.run("var a = 1; fun inc() { a = a + 1; }");
    session.run("inc();");
    let (printed, _) = session.run("print a;");
    assert_eq!(printed, lines(&["2"]));
}

#[test]
fn test_later_run_shadows_earlier_global_in_initializer() {
    let mut session = Session::new();
    session.run("var a = 10;");
    let (printed, outcome) = session.run("{ var a = a * 2; print a; }");
    assert_eq!(outcome, Ok(()));
    assert_eq!(printed, lines(&["20"]));
}

#[test]
fn test_global_names() {
    let mut session = Session::new();
    session.run("var b; fun a() {} class C {}");
    assert_eq!(
        session.interpreter.global_names(),
        lines(&["C", "a", "b", "clock"])
    );
}

#[test]
fn test_determinism_100_iterations() {
    let source = "fun fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); }\n\
                  for (var i = 0; i < 8; i = i + 1) print fib(i);";
    let first = output(source);
    assert_eq!(first, lines(&["0", "1", "1", "2", "3", "5", "8", "13"]));
    for _ in 0..100 {
        assert_eq!(output(source), first);
    }
}
