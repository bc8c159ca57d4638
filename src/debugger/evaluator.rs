//! Expression Evaluator (§4.6).
//!
//! Two entry points:
//! - [`evaluate`] runs an expression exactly as free-standing top-level
//!   code: only globals are visible, matching a REPL-style "run this
//!   snippet" evaluation.
//! - [`evaluate_in_frame`] additionally makes the chosen frame's locals
//!   (and, transitively, its captured upvalues, surfaced as locals under
//!   the Debug-Mode Compile Switch) visible by name, by temporarily
//!   shadowing the VM's real globals with those bindings for the duration
//!   of the evaluation and restoring them afterward.
//!
//! Both compile the expression in isolation with `Compiler::compile_standalone_expr`
//! and hand the resulting chunk to `VM::eval_snippet`, which appends it to
//! the running program rather than standing up a second interpreter.

use crate::ast::{Expr, StmtKind};
use crate::compiler::Compiler;
use crate::debugger::errors::DebuggerError;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::Value;
use crate::vm::VM;

/// Result of an expression evaluation, already formatted for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalOutcome {
    pub value: String,
    pub type_name: String,
}

/// Evaluate `expression` as top-level code: only globals are visible.
pub fn evaluate(vm: &mut VM, expression: &str) -> Result<EvalOutcome, DebuggerError> {
    let expr = parse_expression(expression)?;
    let chunk = Compiler::new()
        .compile_standalone_expr(&expr)
        .map_err(|diags| DebuggerError::EvaluationFailed(describe(&diags)))?;
    let value = vm
        .eval_snippet(chunk)
        .map_err(|e| DebuggerError::EvaluationFailed(e.to_string()))?;
    Ok(describe_value(&value))
}

/// Evaluate `expression` with the locals (and debug-mode-visible upvalues)
/// of `frame_index` shadowing the VM's globals for the duration of the call.
pub fn evaluate_in_frame(
    vm: &mut VM,
    frame_index: usize,
    expression: &str,
) -> Result<EvalOutcome, DebuggerError> {
    let bindings = vm.get_locals_for_frame(frame_index);

    let mut shadowed = Vec::with_capacity(bindings.len());
    for (name, cell) in &bindings {
        shadowed.push((name.clone(), vm.remove_global(name)));
        vm.set_global_cell(name.clone(), cell.clone());
    }

    let result = evaluate(vm, expression);

    for (name, previous) in shadowed {
        vm.remove_global(&name);
        if let Some(cell) = previous {
            vm.set_global_cell(name, cell);
        }
    }

    result
}

fn parse_expression(source: &str) -> Result<Expr, DebuggerError> {
    let trimmed = source.trim();
    let snippet = if trimmed.ends_with(';') {
        trimmed.to_string()
    } else {
        format!("{trimmed};")
    };

    let (tokens, lex_errors) = Lexer::new(&snippet).tokenize();
    if !lex_errors.is_empty() {
        return Err(DebuggerError::EvaluationFailed(describe(&lex_errors)));
    }

    let program = Parser::new(tokens)
        .parse()
        .map_err(|diags| DebuggerError::EvaluationFailed(describe(&diags)))?;

    match program.statements.as_slice() {
        [stmt] => match &stmt.kind {
            StmtKind::Expr(expr) => Ok(expr.clone()),
            _ => Err(DebuggerError::EvaluationFailed(
                "expression evaluator only accepts a single expression".to_string(),
            )),
        },
        _ => Err(DebuggerError::EvaluationFailed(
            "expected exactly one expression".to_string(),
        )),
    }
}

fn describe(diagnostics: &[crate::diagnostic::Diagnostic]) -> String {
    diagnostics
        .first()
        .map(|d| d.message.clone())
        .unwrap_or_else(|| "parse error".to_string())
}

fn describe_value(value: &Value) -> EvalOutcome {
    EvalOutcome {
        value: value.to_display_string(),
        type_name: value.type_tag().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Bytecode;

    #[test]
    fn evaluates_arithmetic_as_top_level() {
        let mut vm = VM::new(Bytecode::new(), false);
        let outcome = evaluate(&mut vm, "1 + 2").unwrap();
        assert_eq!(outcome.value, "3");
        assert_eq!(outcome.type_name, "number");
    }

    #[test]
    fn sees_globals_defined_before_the_pause() {
        let mut vm = VM::new(Bytecode::new(), false);
        vm.set_global("x", Value::Number(41.0));
        let outcome = evaluate(&mut vm, "x + 1").unwrap();
        assert_eq!(outcome.value, "42");
    }

    #[test]
    fn evaluate_in_frame_sees_shadowed_local_and_restores_global_after() {
        let mut vm = VM::new(Bytecode::new(), false);
        vm.set_global("x", Value::Number(1.0));
        let outcome = evaluate_in_frame(&mut vm, 0, "x").unwrap();
        // frame 0 (the main frame) has no named locals without debug mode,
        // so this falls through to the real global.
        assert_eq!(outcome.value, "1");
        assert_eq!(vm.get_global("x").unwrap().borrow().to_display_string(), "1");
    }

    #[test]
    fn invalid_expression_reports_an_error() {
        let mut vm = VM::new(Bytecode::new(), false);
        assert!(evaluate(&mut vm, "let").is_err());
    }
}
