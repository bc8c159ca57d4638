//! Standard library natives registered into a fresh `VM`.
//!
//! Kept intentionally small: this crate's scope is the bytecode VM and its
//! debugger, not a full standard library. `console.log`/`print` are enough
//! to write and observe S1-S6-style debugging sessions; `len`/`str` are
//! carried over because the compiler's test programs lean on them.

use crate::value::{NativeFunction, ObjectData, RuntimeError, Value};
use crate::vm::VM;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

/// Where `print`/`console.log` send their output. Defaults to stdout;
/// swap in a `Arc<Mutex<Vec<u8>>>`-backed writer to capture output in tests
/// or in an embedder that wants to redirect it.
pub type OutputWriter = Arc<Mutex<dyn Write + Send>>;

/// An `OutputWriter` that writes to the process's stdout.
pub fn stdout_writer() -> OutputWriter {
    Arc::new(Mutex::new(io::stdout()))
}

/// Register the standard library into `vm`, writing `print`/`console.log`
/// output through `output`.
pub fn install(vm: &mut VM, output: OutputWriter) {
    vm.register_native("print", print_native(output.clone()));
    vm.register_native("len", len_native());
    vm.register_native("str", str_native());
    vm.register_native("matches", matches_native());

    let mut console = ObjectData::with_class("Object");
    console.set("log", Value::Native(Rc::new(print_native(output))));
    vm.set_global("console", Value::object(console));
}

fn print_native(output: OutputWriter) -> NativeFunction {
    NativeFunction {
        name: "print".to_string(),
        arity: Some(1),
        func: Box::new(move |args| {
            let value = args.first().ok_or(RuntimeError::ArityMismatch {
                expected: 1,
                got: 0,
            })?;
            let mut out = output.lock().expect("output writer poisoned");
            let _ = writeln!(out, "{}", value.to_display_string());
            Ok(Value::Undefined)
        }),
    }
}

fn len_native() -> NativeFunction {
    NativeFunction {
        name: "len".to_string(),
        arity: Some(1),
        func: Box::new(|args| {
            let value = args.first().ok_or(RuntimeError::ArityMismatch {
                expected: 1,
                got: 0,
            })?;
            match value {
                Value::String(s) => Ok(Value::Number(s.len() as f64)),
                Value::Array(arr) => Ok(Value::Number(arr.borrow().len() as f64)),
                other => Err(RuntimeError::TypeError(format!(
                    "len() requires a string or array, got {}",
                    other.type_tag()
                ))),
            }
        }),
    }
}

fn str_native() -> NativeFunction {
    NativeFunction {
        name: "str".to_string(),
        arity: Some(1),
        func: Box::new(|args| {
            let value = args.first().ok_or(RuntimeError::ArityMismatch {
                expected: 1,
                got: 0,
            })?;
            Ok(Value::string(value.to_display_string()))
        }),
    }
}

/// `matches(pattern, text) -> bool`. Compiles `pattern` fresh on every call;
/// there's no regex value type to cache a compiled `Regex` in, so this is
/// only meant for occasional use (log filters, breakpoint conditions), not
/// a hot loop.
fn matches_native() -> NativeFunction {
    NativeFunction {
        name: "matches".to_string(),
        arity: Some(2),
        func: Box::new(|args| {
            let (pattern, text) = match args {
                [Value::String(pattern), Value::String(text)] => (pattern, text),
                _ => {
                    return Err(RuntimeError::TypeError(
                        "matches(pattern, text) requires two strings".to_string(),
                    ))
                }
            };
            let re = regex::Regex::new(pattern)
                .map_err(|e| RuntimeError::Custom(format!("invalid pattern: {e}")))?;
            Ok(Value::Bool(re.is_match(text)))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Bytecode;

    fn vm_with_stdlib(output: OutputWriter) -> VM {
        let mut vm = VM::new(Bytecode::new(), false);
        install(&mut vm, output);
        vm
    }

    #[test]
    fn print_writes_display_string_to_output() {
        let buf: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let vm = vm_with_stdlib(buf.clone());
        let print = vm.get_global("print").unwrap();
        if let Value::Native(native) = &*print.borrow() {
            (native.func)(&[Value::Number(42.0)]).unwrap();
        } else {
            panic!("print should be a native function");
        }
        assert_eq!(String::from_utf8(buf.lock().unwrap().clone()).unwrap(), "42\n");
    }

    #[test]
    fn console_log_is_reachable_as_a_property() {
        let buf: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let vm = vm_with_stdlib(buf);
        let console = vm.get_global("console").unwrap();
        match &*console.borrow() {
            Value::Object(data) => assert!(data.borrow().get("log").is_some()),
            other => panic!("console should be an object, got {other:?}"),
        }
    }

    #[test]
    fn len_reports_string_and_array_length() {
        let buf = stdout_writer();
        let vm = vm_with_stdlib(buf);
        let len = vm.get_global("len").unwrap();
        if let Value::Native(native) = &*len.borrow() {
            let result = (native.func)(&[Value::string("hello")]).unwrap();
            assert_eq!(result, Value::Number(5.0));
        } else {
            panic!("len should be a native function");
        }
    }
}
