//! Binary (de)serialization helpers for constant-pool values and spans.
//!
//! Only the value shapes that can legally appear in a constant pool are
//! supported: primitives and function prototypes. Arrays and objects are
//! always built at runtime via `NewArray`/`NewObject` and never baked in.

use crate::span::Span;
use crate::value::{FunctionProto, Value};
use std::rc::Rc;

const TAG_UNDEFINED: u8 = 0;
const TAG_NULL: u8 = 1;
const TAG_BOOL_FALSE: u8 = 2;
const TAG_BOOL_TRUE: u8 = 3;
const TAG_NUMBER: u8 = 4;
const TAG_STRING: u8 = 5;
const TAG_FUNCTION: u8 = 6;

pub fn serialize_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Undefined => out.push(TAG_UNDEFINED),
        Value::Null => out.push(TAG_NULL),
        Value::Bool(false) => out.push(TAG_BOOL_FALSE),
        Value::Bool(true) => out.push(TAG_BOOL_TRUE),
        Value::Number(n) => {
            out.push(TAG_NUMBER);
            out.extend_from_slice(&n.to_be_bytes());
        }
        Value::String(s) => {
            out.push(TAG_STRING);
            let bytes = s.as_bytes();
            out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            out.extend_from_slice(bytes);
        }
        Value::Closure(closure) => {
            out.push(TAG_FUNCTION);
            serialize_function_proto(&closure.proto, out);
        }
        Value::Array(_) | Value::Object(_) | Value::Native(_) => {
            unreachable!("compiler never places this value kind in the constant pool")
        }
    }
}

fn serialize_function_proto(proto: &FunctionProto, out: &mut Vec<u8>) {
    let name_bytes = proto.name.as_bytes();
    out.extend_from_slice(&(name_bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(name_bytes);
    out.extend_from_slice(&(proto.arity as u32).to_be_bytes());
    out.extend_from_slice(&(proto.bytecode_offset as u32).to_be_bytes());
    out.extend_from_slice(&(proto.local_count as u32).to_be_bytes());
    out.extend_from_slice(&(proto.upvalue_names.len() as u32).to_be_bytes());
    for name in &proto.upvalue_names {
        let bytes = name.as_bytes();
        out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        out.extend_from_slice(bytes);
    }
}

pub fn deserialize_value(bytes: &[u8]) -> Result<(Value, usize), String> {
    if bytes.is_empty() {
        return Err("unexpected end of constant pool".to_string());
    }
    match bytes[0] {
        TAG_UNDEFINED => Ok((Value::Undefined, 1)),
        TAG_NULL => Ok((Value::Null, 1)),
        TAG_BOOL_FALSE => Ok((Value::Bool(false), 1)),
        TAG_BOOL_TRUE => Ok((Value::Bool(true), 1)),
        TAG_NUMBER => {
            let n = f64::from_be_bytes(bytes[1..9].try_into().map_err(|_| "truncated number")?);
            Ok((Value::Number(n), 9))
        }
        TAG_STRING => {
            let len = read_u32(bytes, 1)? as usize;
            let s = String::from_utf8(bytes[5..5 + len].to_vec())
                .map_err(|_| "invalid utf8 in string constant")?;
            Ok((Value::string(s), 5 + len))
        }
        TAG_FUNCTION => {
            let (proto, consumed) = deserialize_function_proto(&bytes[1..])?;
            Ok((
                Value::Closure(Rc::new(crate::value::Closure {
                    proto: Rc::new(proto),
                    upvalues: Vec::new(),
                })),
                1 + consumed,
            ))
        }
        other => Err(format!("unknown constant tag {other}")),
    }
}

fn deserialize_function_proto(bytes: &[u8]) -> Result<(FunctionProto, usize), String> {
    let mut offset = 0;
    let name_len = read_u32(bytes, offset)? as usize;
    offset += 4;
    let name = String::from_utf8(bytes[offset..offset + name_len].to_vec())
        .map_err(|_| "invalid utf8 in function name")?;
    offset += name_len;
    let arity = read_u32(bytes, offset)? as usize;
    offset += 4;
    let bytecode_offset = read_u32(bytes, offset)? as usize;
    offset += 4;
    let local_count = read_u32(bytes, offset)? as usize;
    offset += 4;
    let upvalue_count = read_u32(bytes, offset)? as usize;
    offset += 4;
    let mut upvalue_names = Vec::with_capacity(upvalue_count);
    for _ in 0..upvalue_count {
        let len = read_u32(bytes, offset)? as usize;
        offset += 4;
        let name = String::from_utf8(bytes[offset..offset + len].to_vec())
            .map_err(|_| "invalid utf8 in upvalue name")?;
        offset += len;
        upvalue_names.push(name);
    }
    Ok((
        FunctionProto {
            name,
            arity,
            bytecode_offset,
            local_count,
            upvalue_names,
        },
        offset,
    ))
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, String> {
    bytes
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_be_bytes)
        .ok_or_else(|| "truncated length prefix".to_string())
}

pub fn serialize_span(span: &Span, out: &mut Vec<u8>) {
    out.extend_from_slice(&(span.start as u32).to_be_bytes());
    out.extend_from_slice(&(span.end as u32).to_be_bytes());
}

pub fn deserialize_span(bytes: &[u8]) -> Result<(Span, usize), String> {
    let start = read_u32(bytes, 0)? as usize;
    let end = read_u32(bytes, 4)? as usize;
    Ok((Span::new(start, end), 8))
}
