//! Expression compilation.
//!
//! Every expression leaves exactly one value on the operand stack. Locals
//! live in per-frame `Rc<RefCell<Value>>` cells (see `compile_function_body`
//! in `mod.rs`), so `GetLocal`/`SetLocal` address those cells rather than
//! stack slots — the operand stack here is purely for intermediate values.

use super::Compiler;
use crate::ast::{BinaryOp, Expr, ExprKind, LogicalOp, UnaryOp};
use crate::bytecode::Opcode;
use crate::diagnostic::Diagnostic;
use crate::value::Value;

impl Compiler {
    pub(super) fn compile_expr(&mut self, expr: &Expr) -> Result<(), Vec<Diagnostic>> {
        match &expr.kind {
            ExprKind::Number(n) => {
                let idx = self.bytecode.add_constant(Value::Number(*n));
                self.bytecode.emit(Opcode::Constant, expr.span);
                self.bytecode.emit_u16(idx);
            }
            ExprKind::String(s) => {
                let idx = self.bytecode.add_constant(Value::string(s.clone()));
                self.bytecode.emit(Opcode::Constant, expr.span);
                self.bytecode.emit_u16(idx);
            }
            ExprKind::Bool(true) => self.bytecode.emit(Opcode::True, expr.span),
            ExprKind::Bool(false) => self.bytecode.emit(Opcode::False, expr.span),
            ExprKind::Null => self.bytecode.emit(Opcode::Null, expr.span),
            ExprKind::Undefined => self.bytecode.emit(Opcode::Undefined, expr.span),
            ExprKind::This => self.compile_ident("this", expr.span)?,
            ExprKind::Ident(name) => self.compile_ident(name, expr.span)?,
            ExprKind::Unary(op, operand) => {
                self.compile_expr(operand)?;
                match op {
                    UnaryOp::Neg => self.bytecode.emit(Opcode::Neg, expr.span),
                    UnaryOp::Not => self.bytecode.emit(Opcode::Not, expr.span),
                }
            }
            ExprKind::Binary(op, lhs, rhs) => {
                self.compile_expr(lhs)?;
                self.compile_expr(rhs)?;
                let opcode = match op {
                    BinaryOp::Add => Opcode::Add,
                    BinaryOp::Sub => Opcode::Sub,
                    BinaryOp::Mul => Opcode::Mul,
                    BinaryOp::Div => Opcode::Div,
                    BinaryOp::Rem => Opcode::Rem,
                    BinaryOp::Eq => Opcode::Eq,
                    BinaryOp::NotEq => Opcode::NotEq,
                    BinaryOp::Less => Opcode::Less,
                    BinaryOp::LessEq => Opcode::LessEq,
                    BinaryOp::Greater => Opcode::Greater,
                    BinaryOp::GreaterEq => Opcode::GreaterEq,
                };
                self.bytecode.emit(opcode, expr.span);
            }
            ExprKind::Logical(op, lhs, rhs) => self.compile_logical(*op, lhs, rhs, expr.span)?,
            ExprKind::Assign(target, value) => self.compile_assign(target, value, expr.span)?,
            ExprKind::Call(callee, args) => {
                self.compile_expr(callee)?;
                for arg in args {
                    self.compile_expr(arg)?;
                }
                self.bytecode.emit(Opcode::Call, expr.span);
                self.bytecode.emit_u8(args.len() as u8);
            }
            ExprKind::Member {
                object,
                property,
                computed: _,
            } => {
                self.compile_expr(object)?;
                self.compile_expr(property)?;
                self.bytecode.emit(Opcode::GetProperty, expr.span);
            }
            ExprKind::Array(elements) => {
                for element in elements {
                    self.compile_expr(element)?;
                }
                self.bytecode.emit(Opcode::NewArray, expr.span);
                self.bytecode.emit_u16(elements.len() as u16);
            }
            ExprKind::Object(fields) => {
                self.bytecode.emit(Opcode::NewObject, expr.span);
                for (key, value) in fields {
                    self.bytecode.emit(Opcode::Dup, expr.span);
                    let key_idx = self.bytecode.add_constant(Value::string(key.clone()));
                    self.bytecode.emit(Opcode::Constant, expr.span);
                    self.bytecode.emit_u16(key_idx);
                    self.compile_expr(value)?;
                    self.bytecode.emit(Opcode::SetProperty, expr.span);
                    self.bytecode.emit(Opcode::Pop, expr.span);
                }
            }
            ExprKind::Function { name, params, body } => {
                let proto_name = name.clone().unwrap_or_else(|| "<anonymous>".to_string());
                let (proto, captures) =
                    self.compile_function_body(params, body, &proto_name, expr.span)?;
                self.emit_make_closure(proto, &captures, expr.span);
            }
        }
        Ok(())
    }

    /// Resolve `name` to a local, upvalue, or global and emit the matching
    /// read instruction.
    fn compile_ident(&mut self, name: &str, span: crate::span::Span) -> Result<(), Vec<Diagnostic>> {
        if let Some(idx) = self.resolve_local(name) {
            if idx >= self.current_function_base {
                let relative = (idx - self.current_function_base) as u16;
                self.bytecode.emit(Opcode::GetLocal, span);
                self.bytecode.emit_u16(relative);
            } else {
                let upvalue_idx = self.register_upvalue(name, idx) as u16;
                self.bytecode.emit(Opcode::GetUpvalue, span);
                self.bytecode.emit_u16(upvalue_idx);
            }
        } else {
            let name_idx = self.bytecode.add_constant(Value::string(name));
            self.bytecode.emit(Opcode::GetGlobal, span);
            self.bytecode.emit_u16(name_idx);
        }
        Ok(())
    }

    fn compile_logical(
        &mut self,
        op: LogicalOp,
        lhs: &Expr,
        rhs: &Expr,
        span: crate::span::Span,
    ) -> Result<(), Vec<Diagnostic>> {
        self.compile_expr(lhs)?;
        self.bytecode.emit(Opcode::Dup, span);
        self.bytecode.emit(Opcode::JumpIfFalse, span);
        let branch_jump = self.bytecode.current_offset();
        self.bytecode.emit_u16(0xFFFF);

        match op {
            LogicalOp::And => {
                // lhs was truthy: discard it and evaluate rhs.
                self.bytecode.emit(Opcode::Pop, span);
                self.compile_expr(rhs)?;
                self.bytecode.emit(Opcode::Jump, span);
                let end_jump = self.bytecode.current_offset();
                self.bytecode.emit_u16(0xFFFF);
                self.bytecode.patch_jump(branch_jump);
                self.bytecode.patch_jump(end_jump);
            }
            LogicalOp::Or => {
                self.bytecode.emit(Opcode::Jump, span);
                let end_jump = self.bytecode.current_offset();
                self.bytecode.emit_u16(0xFFFF);
                self.bytecode.patch_jump(branch_jump);
                self.bytecode.emit(Opcode::Pop, span);
                self.compile_expr(rhs)?;
                self.bytecode.patch_jump(end_jump);
            }
        }
        Ok(())
    }

    fn compile_assign(
        &mut self,
        target: &Expr,
        value: &Expr,
        span: crate::span::Span,
    ) -> Result<(), Vec<Diagnostic>> {
        match &target.kind {
            ExprKind::Ident(name) => {
                if let Some((idx, mutable)) = self.resolve_local_with_mutability(name) {
                    if !mutable {
                        return Err(vec![Diagnostic::error_with_code(
                            "TH3001",
                            format!("cannot assign to const variable `{name}`"),
                            target.span,
                        )]);
                    }
                    self.compile_expr(value)?;
                    if idx >= self.current_function_base {
                        let relative = (idx - self.current_function_base) as u16;
                        self.bytecode.emit(Opcode::SetLocal, span);
                        self.bytecode.emit_u16(relative);
                    } else {
                        let upvalue_idx = self.register_upvalue(name, idx) as u16;
                        self.bytecode.emit(Opcode::SetUpvalue, span);
                        self.bytecode.emit_u16(upvalue_idx);
                    }
                } else {
                    if self.is_global_mutable(name) == Some(false) {
                        return Err(vec![Diagnostic::error_with_code(
                            "TH3001",
                            format!("cannot assign to const variable `{name}`"),
                            target.span,
                        )]);
                    }
                    self.compile_expr(value)?;
                    let name_idx = self.bytecode.add_constant(Value::string(name.clone()));
                    self.bytecode.emit(Opcode::SetGlobal, span);
                    self.bytecode.emit_u16(name_idx);
                }
            }
            ExprKind::Member {
                object, property, ..
            } => {
                self.compile_expr(object)?;
                self.compile_expr(property)?;
                self.compile_expr(value)?;
                self.bytecode.emit(Opcode::SetProperty, span);
            }
            _ => {
                return Err(vec![Diagnostic::error_with_code(
                    "TH3002",
                    "invalid assignment target".to_string(),
                    target.span,
                )]);
            }
        }
        Ok(())
    }
}
