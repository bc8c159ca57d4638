//! Integration tests for compiling and running programs with no debugger
//! attached: plain language semantics through the public `Runtime` surface.

use thorn_runtime::api::RuntimeConfig;
use thorn_runtime::runtime::{Runtime, RuntimeOutcome};
use thorn_runtime::Value;

fn run(source: &str) -> Value {
    Runtime::new(RuntimeConfig::new())
        .run(source)
        .unwrap_or_else(|e| panic!("expected {source:?} to run, got {e}"))
}

#[test]
fn arithmetic_follows_operator_precedence() {
    assert_eq!(run("2 + 3 * 4;"), Value::Number(14.0));
    assert_eq!(run("(2 + 3) * 4;"), Value::Number(20.0));
    assert_eq!(run("10 - 2 - 3;"), Value::Number(5.0));
}

#[test]
fn variables_and_reassignment() {
    let result = run("let x = 1;\nx = x + 41;\nx;");
    assert_eq!(result, Value::Number(42.0));
}

#[test]
fn if_else_picks_the_right_branch() {
    assert_eq!(
        run("let x = 10;\nlet y = 0;\nif (x > 5) { y = 1; } else { y = 2; }\ny;"),
        Value::Number(1.0)
    );
    assert_eq!(
        run("let x = 1;\nlet y = 0;\nif (x > 5) { y = 1; } else { y = 2; }\ny;"),
        Value::Number(2.0)
    );
}

#[test]
fn while_loop_accumulates() {
    let source = "let i = 0;\nlet sum = 0;\nwhile (i < 5) {\n  sum = sum + i;\n  i = i + 1;\n}\nsum;";
    assert_eq!(run(source), Value::Number(10.0));
}

#[test]
fn function_calls_and_recursion() {
    let source = "\
function fib(n) {
  if (n < 2) { return n; }
  return fib(n - 1) + fib(n - 2);
}
fib(10);";
    assert_eq!(run(source), Value::Number(55.0));
}

#[test]
fn closures_capture_their_enclosing_scope() {
    let source = "\
function makeCounter() {
  let count = 0;
  function increment() {
    count = count + 1;
    return count;
  }
  return increment;
}
let counter = makeCounter();
counter();
counter();
counter();";
    assert_eq!(run(source), Value::Number(3.0));
}

#[test]
fn arrays_and_len() {
    assert_eq!(run("let a = [1, 2, 3];\nlen(a);"), Value::Number(3.0));
    assert_eq!(run("let a = [10, 20, 30];\na[1];"), Value::Number(20.0));
}

#[test]
fn objects_and_member_access() {
    let source = "let point = { x: 1, y: 2 };\npoint.x + point.y;";
    assert_eq!(run(source), Value::Number(3.0));
}

#[test]
fn str_and_len_on_strings() {
    assert_eq!(run("len(\"hello\");"), Value::Number(5.0));
    assert_eq!(run("str(42);"), Value::string("42"));
}

#[test]
fn matches_checks_a_regex_pattern() {
    assert_eq!(run("matches(\"^[0-9]+$\", \"12345\");"), Value::Bool(true));
    assert_eq!(run("matches(\"^[0-9]+$\", \"abc\");"), Value::Bool(false));
}

#[test]
fn division_by_zero_is_a_runtime_error_not_a_panic() {
    let runtime = Runtime::new(RuntimeConfig::new());
    let outcome = runtime.run("1 / 0;").unwrap_err();
    assert!(matches!(outcome, RuntimeOutcome::RuntimeError(_)));
}

#[test]
fn referencing_an_undefined_variable_is_a_runtime_error() {
    let runtime = Runtime::new(RuntimeConfig::new());
    let outcome = runtime.run("doesNotExist;").unwrap_err();
    assert!(matches!(outcome, RuntimeOutcome::RuntimeError(_)));
}

#[test]
fn a_syntax_error_is_reported_as_a_compile_error_with_diagnostics() {
    let runtime = Runtime::new(RuntimeConfig::new());
    match runtime.run("let x = ;") {
        Err(RuntimeOutcome::CompileError(diagnostics)) => assert!(!diagnostics.is_empty()),
        other => panic!("expected a CompileError, got {other:?}"),
    }
}

#[test]
fn prepare_lets_an_embedder_drive_the_vm_directly() {
    let runtime = Runtime::new(RuntimeConfig::new());
    let mut vm = runtime.prepare("1 + 1;").unwrap();
    assert_eq!(vm.run().unwrap(), Value::Number(2.0));
}
