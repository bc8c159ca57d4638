//! Statement compilation.

use super::{Compiler, Local, LoopContext};
use crate::ast::{DeclKind, FunctionDecl, Stmt, StmtKind};
use crate::bytecode::Opcode;
use crate::diagnostic::Diagnostic;
use crate::value::Value;

impl Compiler {
    pub(super) fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), Vec<Diagnostic>> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.compile_expr(expr)?;
                self.bytecode.emit(Opcode::Pop, stmt.span);
            }
            StmtKind::VarDecl {
                kind,
                name,
                initializer,
            } => self.compile_var_decl(*kind, name, initializer.as_ref(), stmt)?,
            StmtKind::Function(func) => self.compile_function_decl(func)?,
            StmtKind::Return(value) => {
                match value {
                    Some(expr) => self.compile_expr(expr)?,
                    None => self.bytecode.emit(Opcode::Undefined, stmt.span),
                }
                self.bytecode.emit(Opcode::Return, stmt.span);
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.compile_expr(condition)?;
                self.bytecode.emit(Opcode::JumpIfFalse, stmt.span);
                let else_jump = self.bytecode.current_offset();
                self.bytecode.emit_u16(0xFFFF);

                self.compile_scoped_block(then_branch)?;

                self.bytecode.emit(Opcode::Jump, stmt.span);
                let end_jump = self.bytecode.current_offset();
                self.bytecode.emit_u16(0xFFFF);

                self.bytecode.patch_jump(else_jump);
                if let Some(else_branch) = else_branch {
                    self.compile_scoped_block(else_branch)?;
                }
                self.bytecode.patch_jump(end_jump);
            }
            StmtKind::While { condition, body } => {
                let loop_start = self.bytecode.current_offset();
                self.compile_expr(condition)?;
                self.bytecode.emit(Opcode::JumpIfFalse, stmt.span);
                let exit_jump = self.bytecode.current_offset();
                self.bytecode.emit_u16(0xFFFF);

                self.loops.push(LoopContext {
                    start_offset: loop_start,
                    break_jumps: Vec::new(),
                });

                self.compile_scoped_block(body)?;

                self.bytecode.emit(Opcode::Jump, stmt.span);
                let back_jump = self.bytecode.current_offset();
                self.bytecode.emit_u16(0xFFFF);
                // `patch_jump` only computes forward offsets; a loop-back jump
                // needs the negative distance to `loop_start` instead.
                let distance = (self.bytecode.current_offset() - loop_start) as i16;
                self.bytecode.instructions[back_jump] = ((-distance >> 8) & 0xFF) as u8;
                self.bytecode.instructions[back_jump + 1] = ((-distance) & 0xFF) as u8;

                self.bytecode.patch_jump(exit_jump);

                let loop_ctx = self.loops.pop().expect("pushed above");
                for break_jump in loop_ctx.break_jumps {
                    self.bytecode.patch_jump(break_jump);
                }
            }
            StmtKind::Block(statements) => self.compile_scoped_block(statements)?,
            StmtKind::Break => {
                self.bytecode.emit(Opcode::Jump, stmt.span);
                let jump = self.bytecode.current_offset();
                self.bytecode.emit_u16(0xFFFF);
                if let Some(loop_ctx) = self.loops.last_mut() {
                    loop_ctx.break_jumps.push(jump);
                }
            }
            StmtKind::Continue => {
                if let Some(loop_ctx) = self.loops.last() {
                    let start = loop_ctx.start_offset;
                    self.bytecode.emit(Opcode::Jump, stmt.span);
                    let jump = self.bytecode.current_offset();
                    self.bytecode.emit_u16(0xFFFF);
                    let distance = (self.bytecode.current_offset() - start) as i16;
                    self.bytecode.instructions[jump] = ((-distance >> 8) & 0xFF) as u8;
                    self.bytecode.instructions[jump + 1] = ((-distance) & 0xFF) as u8;
                }
            }
            StmtKind::Debugger => {
                self.bytecode.emit(Opcode::DebuggerStmt, stmt.span);
            }
        }
        Ok(())
    }

    fn compile_var_decl(
        &mut self,
        kind: DeclKind,
        name: &str,
        initializer: Option<&crate::ast::Expr>,
        stmt: &Stmt,
    ) -> Result<(), Vec<Diagnostic>> {
        match initializer {
            Some(expr) => self.compile_expr(expr)?,
            None => self.bytecode.emit(Opcode::Undefined, stmt.span),
        }

        let mutable = kind != DeclKind::Const;

        if self.scope_depth == 0 {
            self.global_mutability.insert(name.to_string(), mutable);
            let name_idx = self.bytecode.add_constant(Value::string(name));
            self.bytecode.emit(Opcode::DefineGlobal, stmt.span);
            self.bytecode.emit_u16(name_idx);
        } else {
            self.push_local(Local {
                name: name.to_string(),
                depth: self.scope_depth,
                mutable,
            });
            let slot = (self.locals.len() - 1 - self.current_function_base) as u16;
            self.bytecode.emit(Opcode::SetLocal, stmt.span);
            self.bytecode.emit_u16(slot);
            self.bytecode.emit(Opcode::Pop, stmt.span);
            if self.debug_mode {
                self.emit_define_env_name(name, self.locals.len() - 1, stmt.span);
            }
        }
        Ok(())
    }

    fn compile_function_decl(&mut self, func: &FunctionDecl) -> Result<(), Vec<Diagnostic>> {
        let (proto, captures) =
            self.compile_function_body(&func.params, &func.body, &func.name, func.span)?;
        self.emit_make_closure(proto, &captures, func.span);

        if self.scope_depth == 0 {
            self.global_mutability.insert(func.name.clone(), true);
            let name_idx = self.bytecode.add_constant(Value::string(&func.name));
            self.bytecode.emit(Opcode::DefineGlobal, func.span);
            self.bytecode.emit_u16(name_idx);
        } else {
            self.push_local(Local {
                name: func.name.clone(),
                depth: self.scope_depth,
                mutable: true,
            });
            let slot = (self.locals.len() - 1 - self.current_function_base) as u16;
            self.bytecode.emit(Opcode::SetLocal, func.span);
            self.bytecode.emit_u16(slot);
            self.bytecode.emit(Opcode::Pop, func.span);
            if self.debug_mode {
                self.emit_define_env_name(&func.name, self.locals.len() - 1, func.span);
            }
        }
        Ok(())
    }

    /// Compile a `{ ... }` block in its own lexical scope. Locals are
    /// pre-allocated cells in the frame (see `compile_function_body`), not
    /// operand-stack slots, so leaving the scope only needs to drop the
    /// compiler's own bookkeeping — nothing is popped at runtime.
    pub(super) fn compile_scoped_block(&mut self, statements: &[Stmt]) -> Result<(), Vec<Diagnostic>> {
        self.scope_depth += 1;
        let locals_before = self.locals.len();

        for stmt in statements {
            self.compile_stmt(stmt)?;
        }

        self.locals.truncate(locals_before);
        self.scope_depth -= 1;
        Ok(())
    }
}
