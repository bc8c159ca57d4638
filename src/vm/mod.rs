//! Stack-based bytecode interpreter.
//!
//! Locals live in per-frame `Rc<RefCell<Value>>` cells rather than directly
//! on the operand stack. That single representation is what lets the
//! debugger's upvalue capture, the Debug-Mode Compile Switch (§4.8 heap
//! environment), and ordinary `GetLocal`/`SetLocal` access all share one
//! storage mechanism instead of three.

use crate::bytecode::{Bytecode, Opcode};
use crate::value::{Closure, NativeFunction, ObjectData, RuntimeError, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One activation record. `env` is only populated under the Debug-Mode
/// Compile Switch; it aliases the same cells as `locals`/`upvalues` — it
/// never owns a second copy of a value.
pub struct CallFrame {
    pub ip: usize,
    pub locals: Vec<Rc<RefCell<Value>>>,
    pub upvalues: Vec<Rc<RefCell<Value>>>,
    pub env: Option<Rc<RefCell<HashMap<String, Rc<RefCell<Value>>>>>>,
    pub function_name: String,
    /// True for the synthetic frame pushed around a native call. Per the
    /// pause-point protocol, a native-call frame never has a compiled
    /// program backing it, so the Pause Predicate always skips it.
    pub is_native: bool,
}

/// Outcome of driving the VM with a `DebugHook` attached.
#[derive(Debug, Clone, PartialEq)]
pub enum VmRunResult {
    Complete(Value),
    /// Execution paused; the instruction at the top frame's `ip` has not
    /// executed yet.
    Paused,
}

/// Implemented by the debugger session; called once per instruction when a
/// hook is attached. `should_pause` is the hot-path Pause Predicate — keep it
/// cheap. `on_pause` runs the synchronous command loop; it returns `false` to
/// ask the VM to stop entirely (e.g. a `terminate` request).
pub trait DebugHook {
    fn should_pause(&mut self, vm: &VM) -> bool;
    fn on_pause(&mut self, vm: &mut VM) -> bool;
}

pub struct VM {
    bytecode: Bytecode,
    stack: Vec<Value>,
    frames: Vec<CallFrame>,
    globals: HashMap<String, Rc<RefCell<Value>>>,
    debug_mode: bool,
}

impl VM {
    pub fn new(bytecode: Bytecode, debug_mode: bool) -> Self {
        let main_env = if debug_mode {
            Some(Rc::new(RefCell::new(HashMap::new())))
        } else {
            None
        };
        let main_frame = CallFrame {
            ip: 0,
            locals: (0..bytecode.top_level_local_count)
                .map(|_| Rc::new(RefCell::new(Value::Undefined)))
                .collect(),
            upvalues: Vec::new(),
            env: main_env,
            function_name: "<script>".to_string(),
            is_native: false,
        };
        Self {
            bytecode,
            stack: Vec::new(),
            frames: vec![main_frame],
            globals: HashMap::new(),
            debug_mode,
        }
    }

    pub fn register_native(&mut self, name: impl Into<String>, native: NativeFunction) {
        let name = name.into();
        self.globals
            .insert(name, Rc::new(RefCell::new(Value::Native(Rc::new(native)))));
    }

    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }

    pub fn is_debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current_ip(&self) -> usize {
        self.frames.last().map(|f| f.ip).unwrap_or(0)
    }

    /// Frame 0 is the innermost (current) frame, matching the stack-trace
    /// convention the debugger presents; `self.frames` stores outermost-first.
    pub fn frame_at(&self, index: usize) -> Option<&CallFrame> {
        let len = self.frames.len();
        if index >= len {
            return None;
        }
        self.frames.get(len - 1 - index)
    }

    pub fn is_frame_native(&self, index: usize) -> bool {
        self.frame_at(index).map(|f| f.is_native).unwrap_or(false)
    }

    pub fn frame_function_name(&self, index: usize) -> Option<&str> {
        self.frame_at(index).map(|f| f.function_name.as_str())
    }

    pub fn frame_ip(&self, index: usize) -> Option<usize> {
        self.frame_at(index).map(|f| f.ip)
    }

    /// Named bindings visible in the given frame. Under the Debug-Mode
    /// Compile Switch, this is every declared local plus upvalues (the
    /// frame's heap environment). Otherwise it's empty — names aren't
    /// tracked at runtime without the switch, which is the entire point of
    /// making it opt-in.
    pub fn get_locals_for_frame(&self, index: usize) -> Vec<(String, Rc<RefCell<Value>>)> {
        let Some(frame) = self.frame_at(index) else {
            return Vec::new();
        };
        if let Some(env) = &frame.env {
            env.borrow()
                .iter()
                .map(|(name, cell)| (name.clone(), cell.clone()))
                .collect()
        } else {
            Vec::new()
        }
    }

    pub fn get_global_variables(&self) -> Vec<(String, Rc<RefCell<Value>>)> {
        self.globals
            .iter()
            .filter(|(_, cell)| !matches!(&*cell.borrow(), Value::Native(_)))
            .map(|(name, cell)| (name.clone(), cell.clone()))
            .collect()
    }

    pub fn get_global(&self, name: &str) -> Option<Rc<RefCell<Value>>> {
        self.globals.get(name).cloned()
    }

    /// Inject a binding directly into the global scope. Used by the
    /// Expression Evaluator (§4.6) to bind `this` and snapshot-sourced names
    /// before running an appended `evaluateInFrame` expression.
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), Rc::new(RefCell::new(value)));
    }

    /// Like [`set_global`](Self::set_global), but shares an existing cell
    /// rather than wrapping a fresh copy. Used to temporarily shadow a name
    /// with a frame-local binding during `evaluateInFrame`.
    pub fn set_global_cell(&mut self, name: impl Into<String>, cell: Rc<RefCell<Value>>) {
        self.globals.insert(name.into(), cell);
    }

    /// Remove a global binding, returning its cell if one existed. Used to
    /// undo a temporary shadow installed for `evaluateInFrame`.
    pub fn remove_global(&mut self, name: &str) -> Option<Rc<RefCell<Value>>> {
        self.globals.remove(name)
    }

    pub fn push_stack(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop_stack(&mut self) -> Option<Value> {
        self.stack.pop()
    }

    /// Run to completion with no debugger attached.
    pub fn run(&mut self) -> Result<Value, RuntimeError> {
        loop {
            if self.step()? {
                return Ok(self.stack.pop().unwrap_or(Value::Undefined));
            }
        }
    }

    /// Run with a debugger hook. Returns `Paused` the instant the hook asks
    /// to stop; the caller can resume by invoking this again on the same
    /// `VM`, since all interpreter state lives here, not on the Rust stack.
    ///
    /// `on_pause` runs once per pause for bookkeeping (recording pause
    /// state, clearing per-pause resources) and returns `true` to actually
    /// yield control back to the caller as `Paused`, or `false` to treat the
    /// pause as a request to terminate the program entirely.
    pub fn run_with_hook(&mut self, hook: &mut dyn DebugHook) -> Result<VmRunResult, RuntimeError> {
        loop {
            let in_native = self.frames.last().map(|f| f.is_native).unwrap_or(false);
            if !in_native && hook.should_pause(self) {
                if !hook.on_pause(self) {
                    let value = self.stack.pop().unwrap_or(Value::Undefined);
                    return Ok(VmRunResult::Complete(value));
                }
                return Ok(VmRunResult::Paused);
            }
            if self.step()? {
                return Ok(VmRunResult::Complete(self.stack.pop().unwrap_or(Value::Undefined)));
            }
        }
    }

    /// Run an isolated, already-compiled expression chunk to completion and
    /// return its value, leaving the rest of the VM's state untouched
    /// afterward. This is how the Expression Evaluator (§4.6) runs ad-hoc
    /// code without a second interpreter: append the chunk to the tail of
    /// the program, push a throwaway frame pointed at it, run until the
    /// `Halt` this method appends, then discard both the frame and the
    /// appended bytes.
    pub fn eval_snippet(&mut self, mut chunk: Bytecode) -> Result<Value, RuntimeError> {
        chunk.emit(Opcode::Halt, crate::span::Span::dummy());

        let saved_instr_len = self.bytecode.instructions.len();
        let saved_const_len = self.bytecode.constants.len();
        let saved_debug_len = self.bytecode.debug_info.len();
        let append_at = saved_instr_len;
        self.bytecode.append(chunk);

        self.frames.push(CallFrame {
            ip: append_at,
            locals: Vec::new(),
            upvalues: Vec::new(),
            env: None,
            function_name: "<eval>".to_string(),
            is_native: false,
        });

        let run_result = loop {
            match self.step() {
                Ok(true) => break Ok(()),
                Ok(false) => continue,
                Err(e) => break Err(e),
            }
        };

        self.frames.pop();
        let value = self.stack.pop().unwrap_or(Value::Undefined);
        self.bytecode.instructions.truncate(saved_instr_len);
        self.bytecode.constants.truncate(saved_const_len);
        self.bytecode.debug_info.truncate(saved_debug_len);

        run_result.map(|()| value)
    }

    /// Execute exactly one instruction. Returns `true` if the program has
    /// finished (`Halt` reached, or `Return` unwound past the outermost frame).
    fn step(&mut self) -> Result<bool, RuntimeError> {
        let opcode_byte = {
            let frame = self.frames.last_mut().expect("at least the main frame");
            let byte = self.bytecode.instructions[frame.ip];
            frame.ip += 1;
            byte
        };
        let opcode = Opcode::from_u8(opcode_byte);

        match opcode {
            Opcode::Constant => {
                let idx = self.read_u16();
                self.stack.push(self.bytecode.constants[idx as usize].clone());
            }
            Opcode::Null => self.stack.push(Value::Null),
            Opcode::Undefined => self.stack.push(Value::Undefined),
            Opcode::True => self.stack.push(Value::Bool(true)),
            Opcode::False => self.stack.push(Value::Bool(false)),
            Opcode::Pop => {
                self.stack.pop();
            }
            Opcode::Dup => {
                let top = self.stack.last().cloned().unwrap_or(Value::Undefined);
                self.stack.push(top);
            }
            Opcode::GetLocal => {
                let slot = self.read_u16() as usize;
                let cell = self.frames.last().unwrap().locals[slot].clone();
                self.stack.push(cell.borrow().clone());
            }
            Opcode::SetLocal => {
                let slot = self.read_u16() as usize;
                let value = self.stack.last().cloned().unwrap_or(Value::Undefined);
                let cell = self.frames.last().unwrap().locals[slot].clone();
                *cell.borrow_mut() = value;
            }
            Opcode::DefineEnvName => {
                let slot = self.read_u16() as usize;
                let name_idx = self.read_u16() as usize;
                let name = self.constant_name(name_idx);
                let frame = self.frames.last().unwrap();
                if let Some(env) = &frame.env {
                    let cell = frame.locals[slot].clone();
                    env.borrow_mut().insert(name, cell);
                }
            }
            Opcode::GetGlobal => {
                let name_idx = self.read_u16() as usize;
                let name = self.constant_name(name_idx);
                let cell = self
                    .globals
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone()))?;
                let value = cell.borrow().clone();
                self.stack.push(value);
            }
            Opcode::SetGlobal => {
                let name_idx = self.read_u16() as usize;
                let name = self.constant_name(name_idx);
                let value = self.stack.last().cloned().unwrap_or(Value::Undefined);
                let cell = self
                    .globals
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone()))?;
                *cell.borrow_mut() = value;
            }
            Opcode::DefineGlobal => {
                let name_idx = self.read_u16() as usize;
                let name = self.constant_name(name_idx);
                let value = self.stack.pop().unwrap_or(Value::Undefined);
                self.globals.insert(name, Rc::new(RefCell::new(value)));
            }
            Opcode::GetUpvalue => {
                let idx = self.read_u16() as usize;
                let cell = self.frames.last().unwrap().upvalues[idx].clone();
                self.stack.push(cell.borrow().clone());
            }
            Opcode::SetUpvalue => {
                let idx = self.read_u16() as usize;
                let value = self.stack.last().cloned().unwrap_or(Value::Undefined);
                let cell = self.frames.last().unwrap().upvalues[idx].clone();
                *cell.borrow_mut() = value;
            }
            Opcode::Add => self.binary_add()?,
            Opcode::Sub => self.binary_numeric(|a, b| a - b)?,
            Opcode::Mul => self.binary_numeric(|a, b| a * b)?,
            Opcode::Div => self.binary_divide()?,
            Opcode::Rem => self.binary_numeric(|a, b| a % b)?,
            Opcode::Neg => {
                let value = self.pop_number()?;
                self.stack.push(Value::Number(-value));
            }
            Opcode::Not => {
                let value = self.stack.pop().unwrap_or(Value::Undefined);
                self.stack.push(Value::Bool(!value.is_truthy()));
            }
            Opcode::Eq => {
                let b = self.stack.pop().unwrap_or(Value::Undefined);
                let a = self.stack.pop().unwrap_or(Value::Undefined);
                self.stack.push(Value::Bool(a == b));
            }
            Opcode::NotEq => {
                let b = self.stack.pop().unwrap_or(Value::Undefined);
                let a = self.stack.pop().unwrap_or(Value::Undefined);
                self.stack.push(Value::Bool(a != b));
            }
            Opcode::Less => self.binary_compare(|a, b| a < b)?,
            Opcode::LessEq => self.binary_compare(|a, b| a <= b)?,
            Opcode::Greater => self.binary_compare(|a, b| a > b)?,
            Opcode::GreaterEq => self.binary_compare(|a, b| a >= b)?,
            Opcode::Jump => {
                let offset = self.read_i16();
                let frame = self.frames.last_mut().unwrap();
                frame.ip = (frame.ip as isize + offset as isize) as usize;
            }
            Opcode::JumpIfFalse => {
                let offset = self.read_i16();
                let cond = self.stack.pop().unwrap_or(Value::Undefined);
                if !cond.is_truthy() {
                    let frame = self.frames.last_mut().unwrap();
                    frame.ip = (frame.ip as isize + offset as isize) as usize;
                }
            }
            Opcode::Call => {
                let arg_count = self.read_u8() as usize;
                self.call_value(arg_count)?;
            }
            Opcode::Return => {
                let result = self.stack.pop().unwrap_or(Value::Undefined);
                if self.frames.len() <= 1 {
                    self.stack.push(result);
                    return Ok(true);
                }
                self.frames.pop();
                self.stack.push(result);
            }
            Opcode::NewArray => {
                let count = self.read_u16() as usize;
                let start = self.stack.len() - count;
                let items = self.stack.split_off(start);
                self.stack.push(Value::array(items));
            }
            Opcode::NewObject => {
                self.stack.push(Value::object(ObjectData::new()));
            }
            Opcode::GetProperty => {
                let key = self.stack.pop().unwrap_or(Value::Undefined);
                let object = self.stack.pop().unwrap_or(Value::Undefined);
                let result = self.get_property(&object, &key)?;
                self.stack.push(result);
            }
            Opcode::SetProperty => {
                let value = self.stack.pop().unwrap_or(Value::Undefined);
                let key = self.stack.pop().unwrap_or(Value::Undefined);
                let object = self.stack.pop().unwrap_or(Value::Undefined);
                self.set_property(&object, &key, value.clone())?;
                self.stack.push(value);
            }
            Opcode::MakeClosure => self.make_closure()?,
            Opcode::DebuggerStmt => {
                // Observed by the Pause Predicate as an instruction boundary
                // like any other; no runtime effect of its own.
            }
            Opcode::Halt => return Ok(true),
        }
        Ok(false)
    }

    fn read_u16(&mut self) -> u16 {
        let frame = self.frames.last_mut().unwrap();
        let high = self.bytecode.instructions[frame.ip] as u16;
        let low = self.bytecode.instructions[frame.ip + 1] as u16;
        frame.ip += 2;
        (high << 8) | low
    }

    fn read_i16(&mut self) -> i16 {
        self.read_u16() as i16
    }

    fn read_u8(&mut self) -> u8 {
        let frame = self.frames.last_mut().unwrap();
        let byte = self.bytecode.instructions[frame.ip];
        frame.ip += 1;
        byte
    }

    fn constant_name(&self, idx: usize) -> String {
        match &self.bytecode.constants[idx] {
            Value::String(s) => s.to_string(),
            _ => unreachable!("name operand is always a string constant"),
        }
    }

    fn pop_number(&mut self) -> Result<f64, RuntimeError> {
        match self.stack.pop().unwrap_or(Value::Undefined) {
            Value::Number(n) => Ok(n),
            other => Err(RuntimeError::TypeError(format!(
                "expected number, got {}",
                other.type_tag()
            ))),
        }
    }

    fn binary_numeric(&mut self, f: impl Fn(f64, f64) -> f64) -> Result<(), RuntimeError> {
        let b = self.pop_number()?;
        let a = self.pop_number()?;
        self.stack.push(Value::Number(f(a, b)));
        Ok(())
    }

    /// `+` also concatenates when either operand is a string, matching the
    /// host language family's usual coercion.
    fn binary_add(&mut self) -> Result<(), RuntimeError> {
        let b = self.stack.pop().unwrap_or(Value::Undefined);
        let a = self.stack.pop().unwrap_or(Value::Undefined);
        match (&a, &b) {
            (Value::Number(x), Value::Number(y)) => self.stack.push(Value::Number(x + y)),
            (Value::String(_), _) | (_, Value::String(_)) => self.stack.push(Value::string(format!(
                "{}{}",
                a.to_display_string(),
                b.to_display_string()
            ))),
            _ => {
                return Err(RuntimeError::TypeError(format!(
                    "cannot add {} and {}",
                    a.type_tag(),
                    b.type_tag()
                )))
            }
        }
        Ok(())
    }

    fn binary_divide(&mut self) -> Result<(), RuntimeError> {
        let b = self.pop_number()?;
        let a = self.pop_number()?;
        if b == 0.0 {
            return Err(RuntimeError::DivisionByZero);
        }
        self.stack.push(Value::Number(a / b));
        Ok(())
    }

    fn binary_compare(&mut self, f: impl Fn(f64, f64) -> bool) -> Result<(), RuntimeError> {
        let b = self.pop_number()?;
        let a = self.pop_number()?;
        self.stack.push(Value::Bool(f(a, b)));
        Ok(())
    }

    fn get_property(&self, object: &Value, key: &Value) -> Result<Value, RuntimeError> {
        match object {
            Value::Object(data) => {
                let key = key.to_display_string();
                Ok(data.borrow().get(&key).cloned().unwrap_or(Value::Undefined))
            }
            Value::Array(items) => match key {
                Value::Number(n) => Ok(items.borrow().get(*n as usize).cloned().unwrap_or(Value::Undefined)),
                Value::String(s) if s.as_str() == "length" => Ok(Value::Number(items.borrow().len() as f64)),
                _ => Ok(Value::Undefined),
            },
            Value::String(s) => match key {
                Value::String(k) if k.as_str() == "length" => Ok(Value::Number(s.chars().count() as f64)),
                _ => Ok(Value::Undefined),
            },
            _ => Ok(Value::Undefined),
        }
    }

    fn set_property(&self, object: &Value, key: &Value, value: Value) -> Result<(), RuntimeError> {
        match object {
            Value::Object(data) => {
                data.borrow_mut().set(key.to_display_string(), value);
                Ok(())
            }
            Value::Array(items) => {
                if let Value::Number(n) = key {
                    let idx = *n as usize;
                    let mut items = items.borrow_mut();
                    while items.len() <= idx {
                        items.push(Value::Undefined);
                    }
                    items[idx] = value;
                    Ok(())
                } else {
                    Err(RuntimeError::TypeError("array index must be a number".to_string()))
                }
            }
            other => Err(RuntimeError::TypeError(format!(
                "cannot set property on {}",
                other.type_tag()
            ))),
        }
    }

    fn make_closure(&mut self) -> Result<(), RuntimeError> {
        let const_idx = self.read_u16() as usize;
        let proto = match &self.bytecode.constants[const_idx] {
            Value::Closure(closure) => closure.proto.clone(),
            _ => unreachable!("MakeClosure constant is always a FunctionProto"),
        };
        let upvalue_count = self.read_u8() as usize;
        let mut upvalues = Vec::with_capacity(upvalue_count);
        for _ in 0..upvalue_count {
            let is_local = self.read_u8();
            let index = self.read_u16() as usize;
            let current_frame = self.frames.last().unwrap();
            if is_local == 1 {
                upvalues.push(current_frame.locals[index].clone());
            } else {
                upvalues.push(current_frame.upvalues[index].clone());
            }
        }
        self.stack.push(Value::Closure(Rc::new(Closure { proto, upvalues })));
        Ok(())
    }

    fn call_value(&mut self, arg_count: usize) -> Result<(), RuntimeError> {
        let callee_index = self.stack.len() - arg_count - 1;
        let callee = self.stack[callee_index].clone();
        match callee {
            Value::Closure(closure) => {
                if arg_count != closure.proto.arity {
                    return Err(RuntimeError::ArityMismatch {
                        expected: closure.proto.arity,
                        got: arg_count,
                    });
                }
                let args = self.stack.split_off(callee_index + 1);
                self.stack.pop(); // the callee value itself

                let mut locals: Vec<Rc<RefCell<Value>>> =
                    args.into_iter().map(|v| Rc::new(RefCell::new(v))).collect();
                locals.resize_with(closure.proto.local_count.max(locals.len()), || {
                    Rc::new(RefCell::new(Value::Undefined))
                });

                let env = if self.debug_mode {
                    let mut map = HashMap::new();
                    for (name, cell) in closure.proto.upvalue_names.iter().zip(closure.upvalues.iter()) {
                        map.insert(name.clone(), cell.clone());
                    }
                    Some(Rc::new(RefCell::new(map)))
                } else {
                    None
                };

                self.frames.push(CallFrame {
                    ip: closure.proto.bytecode_offset,
                    locals,
                    upvalues: closure.upvalues.clone(),
                    env,
                    function_name: closure.proto.name.clone(),
                    is_native: false,
                });
                Ok(())
            }
            Value::Native(native) => {
                let args = self.stack.split_off(callee_index + 1);
                self.stack.pop(); // the callee value

                if let Some(expected) = native.arity {
                    if expected != arg_count {
                        return Err(RuntimeError::ArityMismatch {
                            expected,
                            got: arg_count,
                        });
                    }
                }

                // Native calls are atomic: no compiled program backs this
                // frame, so the Pause Predicate never fires while it's on top.
                self.frames.push(CallFrame {
                    ip: 0,
                    locals: Vec::new(),
                    upvalues: Vec::new(),
                    env: None,
                    function_name: native.name.clone(),
                    is_native: true,
                });
                let result = (native.func)(&args);
                self.frames.pop();
                self.stack.push(result?);
                Ok(())
            }
            other => Err(RuntimeError::NotCallable(other.type_tag().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(src: &str) -> Value {
        let (tokens, _diags) = Lexer::new(src).tokenize();
        let program = Parser::new(tokens).parse().expect("parse");
        let bytecode = Compiler::new().compile(&program).expect("compile");
        VM::new(bytecode, false).run().expect("run")
    }

    #[test]
    fn evaluates_arithmetic() {
        assert_eq!(run("1 + 2 * 3;"), Value::Number(7.0));
    }

    #[test]
    fn calls_functions_and_returns() {
        assert_eq!(run("function add(a, b) { return a + b; } add(2, 3);"), Value::Number(5.0));
    }

    #[test]
    fn closures_capture_outer_locals_by_reference() {
        let value = run(
            "let counter = 0;
             function makeIncrementer() {
                 function inc() { counter = counter + 1; return counter; }
                 return inc;
             }
             let inc = makeIncrementer();
             inc();
             inc();",
        );
        assert_eq!(value, Value::Number(2.0));
    }

    #[test]
    fn while_loop_with_break_and_continue() {
        let value = run(
            "let i = 0;
             let sum = 0;
             while (i < 10) {
                 i = i + 1;
                 if (i == 5) { continue; }
                 if (i == 8) { break; }
                 sum = sum + i;
             }
             sum;",
        );
        // 1+2+3+4 (5 skipped) +6+7 = 23, stop before adding 8
        assert_eq!(value, Value::Number(23.0));
    }

    #[test]
    fn object_and_array_property_access() {
        let value = run("let obj = { x: 1, y: 2 }; obj.x + obj.y;");
        assert_eq!(value, Value::Number(3.0));
    }
}
