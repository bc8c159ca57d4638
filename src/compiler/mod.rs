//! AST to bytecode compiler
//!
//! Compiles AST directly to stack-based bytecode.
//! - Expressions leave their result on the stack
//! - Statements may or may not leave values on the stack
//! - Every local lives in an `Rc<RefCell<Value>>` cell addressed by slot index;
//!   the Debug-Mode Compile Switch (§4.8) only controls whether each cell is
//!   *also* registered under its name in the frame's heap environment.

mod expr;
mod stmt;

use crate::ast::*;
use crate::bytecode::{Bytecode, Opcode};
use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::value::{FunctionProto, Value};
use std::collections::HashMap;

/// Local variable information.
#[derive(Debug, Clone)]
pub(super) struct Local {
    pub(super) name: String,
    /// Scope depth of this local (for shadowing resolution).
    pub(super) depth: usize,
    /// Whether this local is mutable (`let`/`var` vs `const`).
    pub(super) mutable: bool,
}

/// Loop context for break/continue.
#[derive(Debug, Clone)]
pub(super) struct LoopContext {
    pub(super) start_offset: usize,
    pub(super) break_jumps: Vec<usize>,
}

/// How an upvalue is sourced when building a closure.
///
/// - `Local(abs_idx)`: captured directly from the immediate parent function's locals.
///   At the closure definition site, emit `GetLocal(abs_idx - parent_base)`.
/// - `Upvalue(parent_idx)`: the variable lives in a grandparent (or deeper) scope and
///   was already registered in the parent function's own upvalue list at `parent_idx`.
///   At the closure definition site, emit `GetUpvalue(parent_idx)`.
#[derive(Debug, Clone)]
pub(super) enum UpvalueCapture {
    Local(usize),
    Upvalue(usize),
}

/// Per-nesting-level upvalue context, pushed when entering a nested function compilation.
#[derive(Debug, Clone)]
pub(super) struct UpvalueContext {
    /// `current_function_base` of the *parent* function at the time this context was pushed.
    /// Any `abs_local_idx >= parent_base` belongs to the immediate parent; anything smaller
    /// belongs to a grandparent and requires upvalue chaining.
    pub(super) parent_base: usize,
    /// Captured variables for this level, in insertion order.
    pub(super) captures: Vec<(String, UpvalueCapture)>,
}

/// Compiler state.
pub struct Compiler {
    pub(super) bytecode: Bytecode,
    pub(super) locals: Vec<Local>,
    pub(super) scope_depth: usize,
    pub(super) loops: Vec<LoopContext>,
    /// Base index for the current function's locals (for nested functions).
    pub(super) current_function_base: usize,
    /// Global variable mutability tracking (true = mutable).
    pub(super) global_mutability: HashMap<String, bool>,
    /// High-water mark: maximum `self.locals.len()` seen within the current
    /// function, used to compute `local_count` even after scope truncation.
    pub(super) locals_watermark: usize,
    /// Stack of upvalue contexts, one entry per active nested function compilation.
    pub(super) upvalue_stack: Vec<UpvalueContext>,
    /// The Debug-Mode Compile Switch (§4.8). When set, every declared name is
    /// additionally registered in the frame's heap environment via
    /// `DefineEnvName`, so the debugger can enumerate and mutate locals that
    /// would otherwise only be reachable through upvalue capture.
    pub(super) debug_mode: bool,
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_debug_mode(false)
    }

    /// Create a compiler with the Debug-Mode Compile Switch enabled.
    pub fn with_debug_mode(debug_mode: bool) -> Self {
        Self {
            bytecode: Bytecode::new(),
            locals: Vec::new(),
            scope_depth: 0,
            loops: Vec::new(),
            current_function_base: 0,
            global_mutability: HashMap::new(),
            locals_watermark: 0,
            upvalue_stack: Vec::new(),
            debug_mode,
        }
    }

    /// Compile a full program to bytecode.
    pub fn compile(&mut self, program: &Program) -> Result<Bytecode, Vec<Diagnostic>> {
        for stmt in &program.statements {
            self.compile_stmt(stmt)?;
        }

        self.bytecode.emit(Opcode::Halt, Span::dummy());

        let mut bytecode = std::mem::take(&mut self.bytecode);
        bytecode.top_level_local_count = self.locals_watermark;
        Ok(bytecode)
    }

    /// Compile a single expression in isolation, for the Expression Evaluator
    /// (`debugger::evaluator`). The result is left on the stack; no `Halt` is
    /// emitted since the caller appends this chunk into a running program via
    /// `Bytecode::append` and jumps back out itself.
    pub fn compile_standalone_expr(&mut self, expr: &Expr) -> Result<Bytecode, Vec<Diagnostic>> {
        self.compile_expr(expr)?;
        Ok(std::mem::take(&mut self.bytecode))
    }

    /// Compile a function declaration (or function literal) into the bytecode
    /// stream, returning its `FunctionProto`. The body is preceded by a jump
    /// so it is skipped during normal top-to-bottom execution and only
    /// entered via `Call`.
    pub(super) fn compile_function_body(
        &mut self,
        params: &[Param],
        body: &[Stmt],
        name: &str,
        span: Span,
    ) -> Result<(FunctionProto, Vec<(String, UpvalueCapture)>), Vec<Diagnostic>> {
        self.bytecode.emit(Opcode::Jump, span);
        let skip_jump = self.bytecode.current_offset();
        self.bytecode.emit_u16(0xFFFF);

        let function_offset = self.bytecode.current_offset();

        let old_locals_len = self.locals.len();
        let old_scope = self.scope_depth;
        self.scope_depth += 1;
        let prev_watermark = std::mem::replace(&mut self.locals_watermark, old_locals_len);

        self.upvalue_stack.push(UpvalueContext {
            parent_base: self.current_function_base,
            captures: Vec::new(),
        });
        let prev_function_base = std::mem::replace(&mut self.current_function_base, old_locals_len);

        for param in params {
            self.push_local(Local {
                name: param.name.clone(),
                depth: self.scope_depth,
                mutable: true,
            });
            if self.debug_mode {
                self.emit_define_env_name(&param.name, self.locals.len() - 1, span);
            }
        }

        for stmt in body {
            self.compile_stmt(stmt)?;
        }

        self.current_function_base = prev_function_base;
        let captures = self.upvalue_stack.pop().expect("pushed above").captures;

        let total_local_count = self.locals_watermark - old_locals_len;
        self.locals_watermark = prev_watermark;

        self.bytecode.emit(Opcode::Undefined, span);
        self.bytecode.emit(Opcode::Return, span);

        self.scope_depth = old_scope;
        self.locals.truncate(old_locals_len);

        self.bytecode.patch_jump(skip_jump);

        let upvalue_names = captures.iter().map(|(n, _)| n.clone()).collect();

        Ok((
            FunctionProto {
                name: name.to_string(),
                arity: params.len(),
                bytecode_offset: function_offset,
                local_count: total_local_count,
                upvalue_names,
            },
            captures,
        ))
    }

    /// Emit the `MakeClosure` instruction for a freshly compiled `proto`,
    /// encoding each upvalue capture as `(is_local: u8, index: u16)`.
    pub(super) fn emit_make_closure(
        &mut self,
        proto: FunctionProto,
        captures: &[(String, UpvalueCapture)],
        span: Span,
    ) {
        let const_idx = self.bytecode.add_constant(Value::Closure(std::rc::Rc::new(
            crate::value::Closure {
                proto: std::rc::Rc::new(proto),
                upvalues: Vec::new(),
            },
        )));
        self.bytecode.emit(Opcode::MakeClosure, span);
        self.bytecode.emit_u16(const_idx);
        self.bytecode.emit_u8(captures.len() as u8);
        for (_, capture) in captures {
            match capture {
                UpvalueCapture::Local(abs_idx) => {
                    let relative = (abs_idx - self.current_function_base) as u16;
                    self.bytecode.emit_u8(1);
                    self.bytecode.emit_u16(relative);
                }
                UpvalueCapture::Upvalue(parent_idx) => {
                    self.bytecode.emit_u8(0);
                    self.bytecode.emit_u16(*parent_idx as u16);
                }
            }
        }
    }

    /// Emit `DefineEnvName` for the local at absolute slot `local_idx`,
    /// relative to the current function's base.
    pub(super) fn emit_define_env_name(&mut self, name: &str, local_idx: usize, span: Span) {
        let relative_slot = (local_idx - self.current_function_base) as u16;
        let name_idx = self.bytecode.add_constant(Value::string(name));
        self.bytecode.emit(Opcode::DefineEnvName, span);
        self.bytecode.emit_u16(relative_slot);
        self.bytecode.emit_u16(name_idx);
    }

    pub(super) fn push_local(&mut self, local: Local) {
        self.locals.push(local);
        if self.locals.len() > self.locals_watermark {
            self.locals_watermark = self.locals.len();
        }
    }

    pub(super) fn resolve_local(&self, name: &str) -> Option<usize> {
        self.locals
            .iter()
            .enumerate()
            .rev()
            .find(|(_, local)| local.name == name)
            .map(|(idx, _)| idx)
    }

    pub(super) fn resolve_local_with_mutability(&self, name: &str) -> Option<(usize, bool)> {
        self.locals
            .iter()
            .enumerate()
            .rev()
            .find(|(_, local)| local.name == name)
            .map(|(idx, local)| (idx, local.mutable))
    }

    pub(super) fn is_global_mutable(&self, name: &str) -> Option<bool> {
        self.global_mutability.get(name).copied()
    }

    /// Register an upvalue capture for the current (innermost) nested function.
    pub(super) fn register_upvalue(&mut self, name: &str, abs_local_idx: usize) -> usize {
        self.register_upvalue_at_depth(name, abs_local_idx, 0)
    }

    fn register_upvalue_at_depth(&mut self, name: &str, abs_local_idx: usize, depth: usize) -> usize {
        let stack_len = self.upvalue_stack.len();
        let stack_idx = stack_len - 1 - depth;

        if let Some(pos) = self.upvalue_stack[stack_idx]
            .captures
            .iter()
            .position(|(n, _)| n == name)
        {
            return pos;
        }

        let parent_base = self.upvalue_stack[stack_idx].parent_base;

        let capture = if abs_local_idx >= parent_base {
            UpvalueCapture::Local(abs_local_idx)
        } else {
            let parent_upvalue_idx = self.register_upvalue_at_depth(name, abs_local_idx, depth + 1);
            UpvalueCapture::Upvalue(parent_upvalue_idx)
        };

        let idx = self.upvalue_stack[stack_idx].captures.len();
        self.upvalue_stack[stack_idx]
            .captures
            .push((name.to_string(), capture));
        idx
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn compile(src: &str, debug_mode: bool) -> Bytecode {
        let (tokens, _diags) = Lexer::new(src).tokenize();
        let program = Parser::new(tokens).parse().expect("parse");
        Compiler::with_debug_mode(debug_mode)
            .compile(&program)
            .expect("compile")
    }

    #[test]
    fn compiles_top_level_var_decl() {
        let bc = compile("let x = 1 + 2;", false);
        assert!(bc.instructions.contains(&(Opcode::Add as u8)));
    }

    #[test]
    fn debug_mode_emits_define_env_name_for_params() {
        let bc = compile("function f(a) { return a; }", true);
        assert!(bc.instructions.contains(&(Opcode::DefineEnvName as u8)));
    }

    #[test]
    fn non_debug_mode_never_emits_define_env_name() {
        let bc = compile("function f(a) { return a; }", false);
        assert!(!bc.instructions.contains(&(Opcode::DefineEnvName as u8)));
    }
}
