//! Integration tests for the pause-point protocol end to end: compile a
//! program with the Debug-Mode Compile Switch on, drive it through a
//! `DebuggerSession`, and check breakpoints/stepping/inspection behave the
//! way a client would observe them.

use thorn_runtime::api::RuntimeConfig;
use thorn_runtime::debugger::protocol::{DebugRequest, DebugResponse, SourceLocation};
use thorn_runtime::runtime::Runtime;
use thorn_runtime::vm::VmRunResult;
use thorn_runtime::Value;

const PROGRAM: &str = "let x = 1;\nlet y = 2;\nlet z = x + y;\nprint(z);\n";

fn debug_session(source: &str) -> (thorn_runtime::VM, thorn_runtime::DebuggerSession) {
    let runtime = Runtime::new(RuntimeConfig::new());
    runtime.enable_debugger("test.th", source).expect("compiles")
}

#[test]
fn breakpoint_on_a_line_pauses_execution_there() {
    let (mut vm, mut session) = debug_session(PROGRAM);
    let response = session.process_request(
        &mut vm,
        DebugRequest::SetBreakpoint {
            location: SourceLocation::new("test.th", 3, 1),
        },
    );
    let id = match response {
        DebugResponse::BreakpointSet { breakpoint } => {
            assert!(breakpoint.verified, "line 3 should resolve to an instruction");
            breakpoint.id
        }
        other => panic!("expected BreakpointSet, got {other:?}"),
    };

    let result = vm.run_with_hook(&mut session).unwrap();
    assert_eq!(result, VmRunResult::Paused);
    assert!(session.is_paused());

    let frames = session.stack_trace(&vm);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].location.as_ref().unwrap().line, 3);

    match session.pause_reason() {
        Some(thorn_runtime::debugger::protocol::PauseReason::Breakpoint { id: hit }) => {
            assert_eq!(*hit, id);
        }
        other => panic!("expected a Breakpoint pause reason, got {other:?}"),
    }
}

#[test]
fn continue_after_a_breakpoint_runs_to_completion() {
    let (mut vm, mut session) = debug_session(PROGRAM);
    session.process_request(
        &mut vm,
        DebugRequest::SetBreakpoint {
            location: SourceLocation::new("test.th", 1, 1),
        },
    );
    assert_eq!(vm.run_with_hook(&mut session).unwrap(), VmRunResult::Paused);

    session.process_request(&mut vm, DebugRequest::Continue);
    let result = vm.run_with_hook(&mut session).unwrap();
    assert_eq!(result, VmRunResult::Complete(Value::Undefined));
}

#[test]
fn step_over_stops_at_the_next_source_line() {
    let (mut vm, mut session) = debug_session(PROGRAM);
    session.process_request(
        &mut vm,
        DebugRequest::SetBreakpoint {
            location: SourceLocation::new("test.th", 1, 1),
        },
    );
    assert_eq!(vm.run_with_hook(&mut session).unwrap(), VmRunResult::Paused);
    let first_line = session.pause_location().unwrap().line;

    session.process_request(&mut vm, DebugRequest::StepOver);
    let result = vm.run_with_hook(&mut session).unwrap();
    assert_eq!(result, VmRunResult::Paused);
    let second_line = session.pause_location().unwrap().line;
    assert!(second_line > first_line);
}

// `z` has to live inside a function body to become a frame-env local at all:
// `compile_var_decl` only emits `DefineEnvName` for non-top-level
// declarations (scope_depth > 0) — a top-level `let z` compiles to a VM
// global via `DefineGlobal` regardless of debug mode, so it would never
// show up in a frame's Local scope.
const FRAME_LOCAL_PROGRAM: &str = "\
function compute(x, y) {
  let z = x + y;
  debugger;
  return z;
}
compute(1, 2);
";

#[test]
fn get_variables_then_get_children_resolves_a_local() {
    let (mut vm, mut session) = debug_session(FRAME_LOCAL_PROGRAM);
    assert_eq!(vm.run_with_hook(&mut session).unwrap(), VmRunResult::Paused);

    let scopes = match session.process_request(&mut vm, DebugRequest::GetVariables { frame_index: 0 }) {
        DebugResponse::Variables { variables, .. } => variables,
        other => panic!("expected Variables, got {other:?}"),
    };
    let local_scope = scopes.iter().find(|v| v.name == "Local").unwrap();

    let locals = match session.process_request(
        &mut vm,
        DebugRequest::GetChildren {
            handle: local_scope.variables_reference,
        },
    ) {
        DebugResponse::Children { variables, .. } => variables,
        other => panic!("expected Children, got {other:?}"),
    };
    let z = locals.iter().find(|v| v.name == "z").expect("z should be visible");
    assert_eq!(z.value, "3");
}

#[test]
fn evaluate_sees_the_paused_frame_local() {
    let (mut vm, mut session) = debug_session(FRAME_LOCAL_PROGRAM);
    assert_eq!(vm.run_with_hook(&mut session).unwrap(), VmRunResult::Paused);

    let response = session.process_request(
        &mut vm,
        DebugRequest::Evaluate {
            expression: "z + 1".to_string(),
            frame_index: 0,
        },
    );
    match response {
        DebugResponse::EvalResult { value, type_name } => {
            assert_eq!(value, "4");
            assert_eq!(type_name, "number");
        }
        other => panic!("expected EvalResult, got {other:?}"),
    }
}

#[test]
fn removed_breakpoint_no_longer_fires() {
    let (mut vm, mut session) = debug_session(PROGRAM);
    let id = match session.process_request(
        &mut vm,
        DebugRequest::SetBreakpoint {
            location: SourceLocation::new("test.th", 1, 1),
        },
    ) {
        DebugResponse::BreakpointSet { breakpoint } => breakpoint.id,
        other => panic!("expected BreakpointSet, got {other:?}"),
    };
    session.process_request(&mut vm, DebugRequest::RemoveBreakpoint { id });

    let result = vm.run_with_hook(&mut session).unwrap();
    assert_eq!(result, VmRunResult::Complete(Value::Undefined));
}
