//! Pause Predicate (§4.2).
//!
//! The hot-path check the VM runs before every instruction when a debugger
//! is attached. Must stay cheap: a handful of hash lookups and an opcode
//! comparison, no allocation on the non-pausing path.
//!
//! Checked in priority order: a literal `debugger;` statement always wins
//! (it's an explicit ask from the script author), then a bound breakpoint at
//! the current offset, then the active step request.

use crate::bytecode::Opcode;
use crate::debugger::breakpoints::{BreakpointManager, ShouldFire};
use crate::debugger::protocol::PauseReason;
use crate::debugger::source_map::SourceMap;
use crate::debugger::stepping::StepTracker;
use crate::vm::VM;

/// Evaluate the Pause Predicate for the instruction about to execute.
///
/// Returns the reason to pause, or `None` to keep running. `breakpoints`
/// and `stepping` are taken `&mut` because checking a breakpoint condition
/// advances its hit count, and a step check may conclude the step and clear
/// the active request — both are side effects of *asking*, not of pausing.
pub fn check(
    vm: &VM,
    breakpoints: &mut BreakpointManager,
    stepping: &mut StepTracker,
    source_map: &SourceMap,
) -> Option<PauseReason> {
    let ip = vm.current_ip();

    if is_debugger_statement(vm, ip) {
        return Some(PauseReason::ManualPause);
    }

    let (should_fire, id) = breakpoints.check_offset_verbose(ip);
    match should_fire {
        ShouldFire::Pause => return Some(PauseReason::Breakpoint { id: id? }),
        ShouldFire::Skip => {}
    }

    stepping.should_pause(ip, vm.frame_depth(), source_map)
}

fn is_debugger_statement(vm: &VM, ip: usize) -> bool {
    vm.bytecode()
        .instructions
        .get(ip)
        .is_some_and(|&byte| byte == Opcode::DebuggerStmt as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Bytecode;
    use crate::span::Span;
    use crate::vm::VM;

    #[test]
    fn debugger_statement_pauses_unconditionally() {
        let mut bc = Bytecode::new();
        bc.emit(Opcode::DebuggerStmt, Span::dummy());
        bc.emit(Opcode::Halt, Span::dummy());
        let vm = VM::new(bc, false);
        let mut breakpoints = BreakpointManager::new();
        let mut stepping = StepTracker::new();
        let source_map = SourceMap::new();
        assert_eq!(
            check(&vm, &mut breakpoints, &mut stepping, &source_map),
            Some(PauseReason::ManualPause)
        );
    }

    #[test]
    fn no_trigger_keeps_running() {
        let mut bc = Bytecode::new();
        bc.emit(Opcode::Halt, Span::dummy());
        let vm = VM::new(bc, false);
        let mut breakpoints = BreakpointManager::new();
        let mut stepping = StepTracker::new();
        let source_map = SourceMap::new();
        assert_eq!(check(&vm, &mut breakpoints, &mut stepping, &source_map), None);
    }
}
