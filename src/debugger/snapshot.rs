//! Frame Snapshotter (§4.4).
//!
//! Turns the VM's live call-frame stack into the wire-level `DebugStackFrame`
//! list used for `GetStack`/`Paused` responses. This is a read-only view:
//! it never mutates the VM, so it's safe to call repeatedly from inside the
//! synchronous pause handler without disturbing stepping state.

use crate::debugger::protocol::DebugStackFrame;
use crate::debugger::source_map::SourceMap;
use crate::vm::VM;

/// Build a stack trace for every non-native frame, innermost first.
///
/// Native-call frames (§3's "in-native-call ⇔ no compiled program") have no
/// instruction pointer to resolve a location for and are omitted, matching
/// the Pause Predicate's own native short-circuit.
pub fn snapshot_stack(vm: &VM, source_map: &SourceMap) -> Vec<DebugStackFrame> {
    (0..vm.frame_depth())
        .filter(|&i| !vm.is_frame_native(i))
        .filter_map(|i| snapshot_frame(vm, source_map, i))
        .collect()
}

/// Snapshot a single frame by its debugger-facing index (0 = innermost).
pub fn snapshot_frame(vm: &VM, source_map: &SourceMap, index: usize) -> Option<DebugStackFrame> {
    let function_name = vm.frame_function_name(index)?.to_string();
    let ip = vm.frame_ip(index)?;
    let location = source_map.location_for_offset(ip).cloned();
    Some(DebugStackFrame {
        index,
        function_name,
        location,
        stack_base: 0,
        local_count: vm.get_locals_for_frame(index).len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Bytecode;
    use crate::vm::VM;

    #[test]
    fn empty_program_has_one_frame() {
        let vm = VM::new(Bytecode::new(), false);
        let source_map = SourceMap::from_debug_spans(&[], "test.th", None);
        let frames = snapshot_stack(&vm, &source_map);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].function_name, "<script>");
    }
}
