//! Interactive debugger session.
//!
//! `DebuggerSession` is the single type an embedder needs: it implements
//! `vm::DebugHook` so a `VM` can drive it, and exposes `process_request` for
//! turning wire-level `DebugRequest`s into `DebugResponse`s while paused.
//! Everything else in this module is a focused piece it composes:
//! breakpoint storage, stepping, the source map, the handle registry, frame
//! snapshotting, variable materialization, and expression evaluation.

pub mod breakpoints;
pub mod errors;
pub mod evaluator;
pub mod materializer;
pub mod predicate;
pub mod protocol;
pub mod registry;
pub mod snapshot;
pub mod source_map;
pub mod state;
pub mod stepping;

use crate::bytecode::Bytecode;
use crate::debugger::breakpoints::BreakpointManager;
use crate::debugger::errors::DebuggerError;
use crate::debugger::protocol::{
    DebugRequest, DebugResponse, DebugStackFrame, PauseReason, SourceLocation, Variable,
};
use crate::debugger::registry::{decode_scope_handle, encode_scope_handle, HandleRegistry, ScopeKind};
use crate::debugger::source_map::SourceMap;
use crate::debugger::state::{DebuggerState, ExecutionMode};
use crate::debugger::stepping::{StepRequest, StepTracker};
use crate::vm::{DebugHook, VM};

/// Ties breakpoints, stepping, variable handles, and expression evaluation
/// to one running `VM` and drives the pause-point protocol (§4.2-§4.6).
pub struct DebuggerSession {
    state: DebuggerState,
    breakpoints: BreakpointManager,
    stepping: StepTracker,
    registry: HandleRegistry,
    source_map: SourceMap,
    /// Reason computed by `should_pause`, consumed by `on_pause` — the two
    /// calls happen on the same instruction, so this is never observed by
    /// anything else.
    pending_reason: Option<PauseReason>,
    /// Set on resume to the instruction offset execution paused at, so the
    /// very next `should_pause` check doesn't immediately re-fire on the
    /// breakpoint or `debugger;` statement the client just continued past.
    suppress_offset: Option<usize>,
    /// Set by a `Pause` request; makes the next instruction pause
    /// unconditionally even with no breakpoint or active step.
    force_pause: bool,
}

impl DebuggerSession {
    /// Build a session for a compiled program. `file`/`source` feed the
    /// source map; `source` may be omitted (all locations resolve to
    /// line 1, column 1) when source text isn't available to the embedder.
    pub fn new(bytecode: &Bytecode, file: impl Into<String>, source: Option<&str>) -> Self {
        Self {
            state: DebuggerState::new(),
            breakpoints: BreakpointManager::new(),
            stepping: StepTracker::new(),
            registry: HandleRegistry::new(),
            source_map: SourceMap::from_debug_spans(&bytecode.debug_info, &file.into(), source),
            pending_reason: None,
            suppress_offset: None,
            force_pause: false,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_paused()
    }

    pub fn is_stopped(&self) -> bool {
        self.state.is_stopped()
    }

    /// Record that the program has finished running (`VmRunResult::Complete`).
    pub fn mark_stopped(&mut self) {
        self.state.stop();
    }

    pub fn pause_reason(&self) -> Option<&PauseReason> {
        self.state.pause_reason.as_ref()
    }

    pub fn pause_location(&self) -> Option<&SourceLocation> {
        self.state.pause_location.as_ref()
    }

    /// Handle one request, mutating session/VM state as needed.
    pub fn process_request(&mut self, vm: &mut VM, request: DebugRequest) -> DebugResponse {
        match request {
            DebugRequest::SetBreakpoint { location } => self.handle_set_breakpoint(location),
            DebugRequest::RemoveBreakpoint { id } => match self.breakpoints.remove(id) {
                Some(_) => DebugResponse::BreakpointRemoved { id },
                None => DebugResponse::error(DebuggerError::UnknownBreakpoint(id).to_string()),
            },
            DebugRequest::ListBreakpoints => DebugResponse::Breakpoints {
                breakpoints: self.breakpoints.all_breakpoints(),
            },
            DebugRequest::ClearBreakpoints => {
                self.breakpoints.clear();
                DebugResponse::BreakpointsCleared
            }
            DebugRequest::Continue => {
                self.resume(vm, None);
                DebugResponse::Resumed
            }
            DebugRequest::StepOver => {
                self.resume(vm, Some(StepRequest::Over));
                DebugResponse::Resumed
            }
            DebugRequest::StepInto => {
                self.resume(vm, Some(StepRequest::Into));
                DebugResponse::Resumed
            }
            DebugRequest::StepOut => {
                self.resume(vm, Some(StepRequest::Out));
                DebugResponse::Resumed
            }
            DebugRequest::Pause => {
                self.force_pause = true;
                DebugResponse::Resumed
            }
            DebugRequest::GetVariables { frame_index } => self.handle_get_variables(vm, frame_index),
            DebugRequest::GetStack => DebugResponse::StackTrace {
                frames: self.stack_trace(vm),
            },
            DebugRequest::Evaluate {
                expression,
                frame_index,
            } => match crate::debugger::evaluator::evaluate_in_frame(vm, frame_index, &expression) {
                Ok(outcome) => DebugResponse::EvalResult {
                    value: outcome.value,
                    type_name: outcome.type_name,
                },
                Err(e) => DebugResponse::error(e.to_string()),
            },
            DebugRequest::GetLocation => DebugResponse::Location {
                location: self.source_map.location_for_offset(vm.current_ip()).cloned(),
                ip: vm.current_ip(),
            },
            DebugRequest::GetChildren { handle } => self.handle_get_children(vm, handle),
        }
    }

    /// Build the current call stack. Exposed separately from `process_request`
    /// so `DebugEvent::Paused` producers can attach a trace without round-
    /// tripping through the request/response enum.
    pub fn stack_trace(&self, vm: &VM) -> Vec<DebugStackFrame> {
        crate::debugger::snapshot::snapshot_stack(vm, &self.source_map)
    }

    fn handle_set_breakpoint(&mut self, location: SourceLocation) -> DebugResponse {
        let id = self.breakpoints.add(location.clone());
        if let Some(offset) = self.source_map.first_offset_for_line(&location.file, location.line) {
            self.breakpoints.verify(id, offset);
        }
        let breakpoint = self
            .breakpoints
            .get(id)
            .expect("just inserted")
            .breakpoint
            .clone();
        DebugResponse::BreakpointSet { breakpoint }
    }

    fn handle_get_variables(&mut self, vm: &VM, frame_index: usize) -> DebugResponse {
        if vm.frame_at(frame_index).is_none() {
            return DebugResponse::error(DebuggerError::InvalidFrameIndex(frame_index).to_string());
        }
        let mut variables = vec![scope_placeholder("Local", frame_index, ScopeKind::Local)];
        if frame_index == 0 {
            variables.push(scope_placeholder("Global", frame_index, ScopeKind::Global));
        }
        DebugResponse::Variables {
            frame_index,
            variables,
        }
    }

    fn handle_get_children(&mut self, vm: &VM, handle: i64) -> DebugResponse {
        if let Some((frame_index, kind)) = decode_scope_handle(handle) {
            let variables =
                crate::debugger::materializer::materialize_scope(vm, &mut self.registry, frame_index, kind);
            return DebugResponse::Children { handle, variables };
        }
        match crate::debugger::materializer::materialize_children(&mut self.registry, handle) {
            Some(variables) => DebugResponse::Children { handle, variables },
            None => DebugResponse::error(DebuggerError::UnknownHandle(handle).to_string()),
        }
    }

    fn resume(&mut self, vm: &VM, step_request: Option<StepRequest>) {
        let ip = vm.current_ip();
        self.suppress_offset = Some(ip);
        match step_request {
            Some(request) => {
                let location = self.source_map.location_for_offset(ip).cloned();
                self.stepping.begin_step(request, vm.frame_depth(), location.as_ref());
            }
            None => self.stepping.cancel(),
        }
        self.state.resume();
    }
}

fn scope_placeholder(name: &str, frame_index: usize, kind: ScopeKind) -> Variable {
    Variable::with_reference(name, "", "scope", encode_scope_handle(frame_index, kind))
}

impl DebugHook for DebuggerSession {
    fn should_pause(&mut self, vm: &VM) -> bool {
        let ip = vm.current_ip();

        if let Some(suppressed) = self.suppress_offset {
            if suppressed == ip {
                self.suppress_offset = None;
                return false;
            }
            self.suppress_offset = None;
        }

        if self.state.mode == ExecutionMode::Paused {
            return true;
        }

        if self.force_pause {
            self.force_pause = false;
            self.pending_reason = Some(PauseReason::ManualPause);
            return true;
        }

        match crate::debugger::predicate::check(vm, &mut self.breakpoints, &mut self.stepping, &self.source_map) {
            Some(reason) => {
                self.pending_reason = Some(reason);
                true
            }
            None => false,
        }
    }

    fn on_pause(&mut self, vm: &mut VM) -> bool {
        if let Some(reason) = self.pending_reason.take() {
            self.registry.clear();
            let location = self.source_map.location_for_offset(vm.current_ip()).cloned();
            self.state.pause(reason, location, vm.current_ip());
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Opcode;
    use crate::span::Span;
    use crate::vm::VmRunResult;

    fn program_with_debugger_stmt() -> Bytecode {
        let mut bc = Bytecode::new();
        bc.emit(Opcode::DebuggerStmt, Span::new(0, 1));
        let idx = bc.add_constant(crate::value::Value::Number(1.0));
        bc.emit(Opcode::Constant, Span::new(1, 2));
        bc.emit_u16(idx);
        bc.emit(Opcode::Halt, Span::new(1, 2));
        bc
    }

    #[test]
    fn pauses_on_debugger_statement_then_resumes_to_completion() {
        let bytecode = program_with_debugger_stmt();
        let mut session = DebuggerSession::new(&bytecode, "test.th", None);
        let mut vm = VM::new(bytecode, false);

        let result = vm.run_with_hook(&mut session).unwrap();
        assert_eq!(result, VmRunResult::Paused);
        assert!(session.is_paused());
        assert_eq!(session.pause_reason(), Some(&PauseReason::ManualPause));

        session.process_request(&mut vm, DebugRequest::Continue);
        let result = vm.run_with_hook(&mut session).unwrap();
        assert_eq!(result, VmRunResult::Complete(crate::value::Value::Number(1.0)));
    }

    #[test]
    fn breakpoint_set_and_hit() {
        let bytecode = program_with_debugger_stmt();
        // This program has a DebuggerStmt first, so set a breakpoint on the
        // Halt's line instead to exercise offset resolution independently.
        let mut session = DebuggerSession::new(&bytecode, "test.th", None);
        let response = session.process_request(
            &mut VM::new(bytecode.clone(), false),
            DebugRequest::SetBreakpoint {
                location: SourceLocation::new("test.th", 1, 1),
            },
        );
        match response {
            DebugResponse::BreakpointSet { breakpoint } => assert!(breakpoint.verified),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn get_variables_returns_scope_placeholders() {
        let bytecode = Bytecode::new();
        let mut session = DebuggerSession::new(&bytecode, "test.th", None);
        let mut vm = VM::new(bytecode, false);
        let response = session.process_request(&mut vm, DebugRequest::GetVariables { frame_index: 0 });
        match response {
            DebugResponse::Variables { variables, .. } => {
                assert_eq!(variables.len(), 2);
                assert_eq!(variables[0].name, "Local");
                assert_eq!(variables[1].name, "Global");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    /// §4.4: the Global scope is only ever emitted for frame 0; every other
    /// frame in a nested call gets Local only.
    #[test]
    fn get_variables_omits_global_scope_for_non_zero_frames() {
        use crate::compiler::Compiler;
        use crate::lexer::Lexer;
        use crate::parser::Parser;

        let source = "\
function outer() {
  function inner() {
    debugger;
  }
  inner();
}
outer();";
        let (tokens, lex_errors) = Lexer::new(source).tokenize();
        assert!(lex_errors.is_empty());
        let program = Parser::new(tokens).parse().expect("parses");
        let bytecode = Compiler::with_debug_mode(true).compile(&program).expect("compiles");

        let mut session = DebuggerSession::new(&bytecode, "test.th", Some(source));
        let mut vm = VM::new(bytecode, true);
        assert_eq!(vm.run_with_hook(&mut session).unwrap(), VmRunResult::Paused);
        assert!(vm.frame_depth() >= 2, "expected nested call frames at the pause point");

        let response = session.process_request(&mut vm, DebugRequest::GetVariables { frame_index: 1 });
        match response {
            DebugResponse::Variables { variables, .. } => {
                assert_eq!(variables.len(), 1);
                assert_eq!(variables[0].name, "Local");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
