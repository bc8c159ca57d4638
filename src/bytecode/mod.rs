//! Bytecode container: instructions, constants, and the source map the
//! debugger's `SourceMap` is built from.

mod opcode;
mod serialize;

pub use opcode::Opcode;
use serialize::{deserialize_span, deserialize_value, serialize_span, serialize_value};

use crate::span::Span;
use crate::value::Value;

/// Current bytecode format version.
pub const BYTECODE_VERSION: u16 = 1;

/// Maps an instruction offset to the source span that produced it.
///
/// This is the raw material the debugger's `SourceMap` indexes: one entry
/// per emitted instruction, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugSpan {
    pub instruction_offset: usize,
    pub span: Span,
}

/// Compiled program: raw instruction bytes, constant pool, and debug info.
#[derive(Debug, Clone)]
pub struct Bytecode {
    pub instructions: Vec<u8>,
    pub constants: Vec<Value>,
    pub debug_info: Vec<DebugSpan>,
    /// Local slot count required by top-level code (the implicit `<main>` frame).
    pub top_level_local_count: usize,
}

impl Bytecode {
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
            constants: Vec::new(),
            debug_info: Vec::new(),
            top_level_local_count: 0,
        }
    }

    pub fn emit(&mut self, opcode: Opcode, span: Span) {
        self.debug_info.push(DebugSpan {
            instruction_offset: self.instructions.len(),
            span,
        });
        self.instructions.push(opcode as u8);
    }

    pub fn emit_u8(&mut self, byte: u8) {
        self.instructions.push(byte);
    }

    pub fn emit_u16(&mut self, value: u16) {
        self.instructions.push((value >> 8) as u8);
        self.instructions.push((value & 0xFF) as u8);
    }

    pub fn emit_i16(&mut self, value: i16) {
        self.emit_u16(value as u16);
    }

    pub fn add_constant(&mut self, value: Value) -> u16 {
        self.constants.push(value);
        (self.constants.len() - 1) as u16
    }

    pub fn current_offset(&self) -> usize {
        self.instructions.len()
    }

    /// Patch a forward jump at `offset` (the position of its i16 operand) to
    /// land at the current end of the instruction stream.
    pub fn patch_jump(&mut self, offset: usize) {
        let jump = (self.instructions.len() - offset - 2) as i16;
        self.instructions[offset] = ((jump >> 8) & 0xFF) as u8;
        self.instructions[offset + 1] = (jump & 0xFF) as u8;
    }

    /// Look up the source span for the instruction at or immediately before
    /// `offset`. Used for error reporting and is the basis of `SourceMap`.
    pub fn get_span_for_offset(&self, offset: usize) -> Option<Span> {
        self.debug_info
            .iter()
            .rev()
            .find(|debug_span| debug_span.instruction_offset <= offset)
            .map(|debug_span| debug_span.span)
    }

    /// Serialize to the binary `.thb` format: header, constants, instructions,
    /// optional debug info.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();

        bytes.extend_from_slice(b"THB\0");
        bytes.extend_from_slice(&BYTECODE_VERSION.to_be_bytes());
        let flags = if self.debug_info.is_empty() { 0u16 } else { 1u16 };
        bytes.extend_from_slice(&flags.to_be_bytes());

        bytes.extend_from_slice(&(self.constants.len() as u32).to_be_bytes());
        for value in &self.constants {
            serialize_value(value, &mut bytes);
        }

        bytes.extend_from_slice(&(self.instructions.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.instructions);

        if !self.debug_info.is_empty() {
            bytes.extend_from_slice(&(self.debug_info.len() as u32).to_be_bytes());
            for debug_span in &self.debug_info {
                bytes.extend_from_slice(&(debug_span.instruction_offset as u32).to_be_bytes());
                serialize_span(&debug_span.span, &mut bytes);
            }
        }

        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, String> {
        if bytes.len() < 8 {
            return Err("invalid bytecode: too short".to_string());
        }
        if &bytes[0..4] != b"THB\0" {
            return Err("invalid bytecode: bad magic number".to_string());
        }
        let version = u16::from_be_bytes([bytes[4], bytes[5]]);
        if version != BYTECODE_VERSION {
            return Err(format!(
                "bytecode version mismatch: file has version {version}, VM supports {BYTECODE_VERSION}"
            ));
        }
        let flags = u16::from_be_bytes([bytes[6], bytes[7]]);
        let has_debug_info = (flags & 1) != 0;

        let mut offset = 8;

        let const_count = read_u32(bytes, offset)? as usize;
        offset += 4;
        let mut constants = Vec::with_capacity(const_count);
        for _ in 0..const_count {
            let (value, consumed) = deserialize_value(&bytes[offset..])?;
            constants.push(value);
            offset += consumed;
        }

        let instr_len = read_u32(bytes, offset)? as usize;
        offset += 4;
        if offset + instr_len > bytes.len() {
            return Err("invalid bytecode: instructions truncated".to_string());
        }
        let instructions = bytes[offset..offset + instr_len].to_vec();
        offset += instr_len;

        let mut debug_info = Vec::new();
        if has_debug_info {
            let debug_count = read_u32(bytes, offset)? as usize;
            offset += 4;
            for _ in 0..debug_count {
                let instruction_offset = read_u32(bytes, offset)? as usize;
                offset += 4;
                let (span, consumed) = deserialize_span(&bytes[offset..])?;
                debug_info.push(DebugSpan {
                    instruction_offset,
                    span,
                });
                offset += consumed;
            }
        }

        if offset != bytes.len() {
            return Err(format!(
                "invalid bytecode: expected {} bytes, consumed {}",
                bytes.len(),
                offset
            ));
        }

        Ok(Bytecode {
            instructions,
            constants,
            debug_info,
            top_level_local_count: 0,
        })
    }

    /// Append another bytecode chunk, adjusting constant indices and function
    /// offsets so both chunks can share one instruction stream.
    ///
    /// This is how the Expression Evaluator (`debugger::evaluator`) runs an
    /// ad-hoc expression: compile it in isolation, then append and jump in,
    /// rather than standing up a second interpreter.
    pub fn append(&mut self, other: Bytecode) {
        let instruction_offset = self.instructions.len();
        let constant_offset = self.constants.len() as u16;

        for constant in other.constants {
            match constant {
                Value::Closure(closure) if closure.proto.bytecode_offset > 0 => {
                    let mut proto = (*closure.proto).clone();
                    proto.bytecode_offset += instruction_offset;
                    self.constants.push(Value::Closure(std::rc::Rc::new(
                        crate::value::Closure {
                            proto: std::rc::Rc::new(proto),
                            upvalues: closure.upvalues.clone(),
                        },
                    )));
                }
                other_value => self.constants.push(other_value),
            }
        }

        let mut i = 0;
        while i < other.instructions.len() {
            let opcode_byte = other.instructions[i];
            self.instructions.push(opcode_byte);
            i += 1;

            let uses_constant = matches!(
                opcode_byte,
                x if x == Opcode::Constant as u8
                    || x == Opcode::GetGlobal as u8
                    || x == Opcode::SetGlobal as u8
                    || x == Opcode::DefineGlobal as u8
                    || x == Opcode::DefineEnvName as u8
            );

            if uses_constant && i + 1 < other.instructions.len() {
                let high = other.instructions[i] as u16;
                let low = other.instructions[i + 1] as u16;
                let old_index = (high << 8) | low;
                let new_index = old_index + constant_offset;
                self.instructions.push((new_index >> 8) as u8);
                self.instructions.push((new_index & 0xFF) as u8);
                i += 2;
            } else if opcode_byte == Opcode::MakeClosure as u8 {
                let high = other.instructions[i] as u16;
                let low = other.instructions[i + 1] as u16;
                let new_index = ((high << 8) | low) + constant_offset;
                self.instructions.push((new_index >> 8) as u8);
                self.instructions.push((new_index & 0xFF) as u8);
                i += 2;
                let upvalue_count = other.instructions[i];
                self.instructions.push(upvalue_count);
                i += 1;
                for _ in 0..upvalue_count {
                    self.instructions.push(other.instructions[i]); // is_local
                    self.instructions.push(other.instructions[i + 1]); // index high
                    self.instructions.push(other.instructions[i + 2]); // index low
                    i += 3;
                }
            } else {
                let operand_size: usize = match opcode_byte {
                    x if x == Opcode::Jump as u8
                        || x == Opcode::JumpIfFalse as u8
                        || x == Opcode::GetLocal as u8
                        || x == Opcode::SetLocal as u8
                        || x == Opcode::GetUpvalue as u8
                        || x == Opcode::SetUpvalue as u8
                        || x == Opcode::NewArray as u8 =>
                    {
                        2
                    }
                    x if x == Opcode::Call as u8 => 1,
                    _ => 0,
                };
                for _ in 0..operand_size {
                    if i < other.instructions.len() {
                        self.instructions.push(other.instructions[i]);
                        i += 1;
                    }
                }
            }
        }

        for mut debug_span in other.debug_info {
            debug_span.instruction_offset += instruction_offset;
            self.debug_info.push(debug_span);
        }
    }
}

impl Default for Bytecode {
    fn default() -> Self {
        Self::new()
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, String> {
    bytes
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_be_bytes)
        .ok_or_else(|| "truncated length prefix".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_binary_format() {
        let mut bc = Bytecode::new();
        let idx = bc.add_constant(Value::Number(42.0));
        bc.emit(Opcode::Constant, Span::new(0, 1));
        bc.emit_u16(idx);
        bc.emit(Opcode::Halt, Span::new(1, 2));

        let bytes = bc.to_bytes();
        let restored = Bytecode::from_bytes(&bytes).unwrap();
        assert_eq!(restored.instructions, bc.instructions);
        assert_eq!(restored.constants.len(), 1);
    }

    #[test]
    fn patch_jump_computes_relative_offset() {
        let mut bc = Bytecode::new();
        bc.emit(Opcode::Jump, Span::dummy());
        let placeholder = bc.current_offset();
        bc.emit_u16(0xFFFF);
        bc.emit(Opcode::Halt, Span::dummy());
        bc.patch_jump(placeholder);
        let jump = i16::from_be_bytes([bc.instructions[placeholder], bc.instructions[placeholder + 1]]);
        assert_eq!(jump, 1); // one Halt byte between the operand and the target
    }
}
