//! Reference handle registry.
//!
//! Variables handed to a debugger client carry an integer "reference handle"
//! instead of their full value, so a client can lazily ask for a compound
//! value's children (`GetChildren`) without the session eagerly walking the
//! whole object graph up front.
//!
//! Two handle spaces share one `i64`:
//! - Positive handles are arena slots: each points at a specific
//!   `Rc<RefCell<Value>>` cell, appended the first time that value is
//!   surfaced. They're append-only for the lifetime of a pause.
//! - Negative handles are *lazily encoded* scopes and never touch the arena:
//!   `-(frame_index * 10 + scope_kind)` names "the locals of frame N" or
//!   "the globals" without allocating anything until the client actually
//!   asks for that scope's children.

use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Which kind of scope a negative handle names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Local = 1,
    Global = 2,
}

/// Encode "the locals (or globals) of frame `frame_index`" as a negative handle.
pub fn encode_scope_handle(frame_index: usize, kind: ScopeKind) -> i64 {
    -((frame_index as i64) * 10 + kind as i64)
}

/// Inverse of [`encode_scope_handle`]. Returns `None` for positive/zero handles.
pub fn decode_scope_handle(handle: i64) -> Option<(usize, ScopeKind)> {
    if handle >= 0 {
        return None;
    }
    let n = -handle;
    let kind = match n % 10 {
        1 => ScopeKind::Local,
        2 => ScopeKind::Global,
        _ => return None,
    };
    Some(((n / 10) as usize, kind))
}

/// Append-only arena mapping positive handles to value cells.
///
/// Cleared at the start of each pause: handles are only meaningful for the
/// duration of the pause that produced them, matching the single-threaded
/// cooperative pausing model (there is never a second pause whose handles
/// could be confused with the first).
#[derive(Debug, Default)]
pub struct HandleRegistry {
    entries: Vec<Rc<RefCell<Value>>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Register `cell`, returning a positive handle valid until the next `clear`.
    pub fn register(&mut self, cell: Rc<RefCell<Value>>) -> i64 {
        self.entries.push(cell);
        self.entries.len() as i64
    }

    /// Register a cell only if `value` is a compound type (`Array`/`Object`)
    /// that can have children; returns `0` for anything else, matching the
    /// `Variable::variables_reference` convention of "0 means no children".
    pub fn register_if_compound(&mut self, cell: &Rc<RefCell<Value>>) -> i64 {
        match &*cell.borrow() {
            Value::Array(_) | Value::Object(_) => self.register(cell.clone()),
            _ => 0,
        }
    }

    pub fn resolve(&self, handle: i64) -> Option<Rc<RefCell<Value>>> {
        if handle <= 0 {
            return None;
        }
        self.entries.get((handle - 1) as usize).cloned()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_handles_round_trip() {
        let handle = encode_scope_handle(2, ScopeKind::Local);
        assert_eq!(decode_scope_handle(handle), Some((2, ScopeKind::Local)));
        let handle = encode_scope_handle(0, ScopeKind::Global);
        assert_eq!(decode_scope_handle(handle), Some((0, ScopeKind::Global)));
    }

    #[test]
    fn positive_handles_are_not_scope_handles() {
        assert_eq!(decode_scope_handle(5), None);
    }

    #[test]
    fn registry_resolves_registered_cells() {
        let mut registry = HandleRegistry::new();
        let cell = Rc::new(RefCell::new(Value::array(vec![Value::Number(1.0)])));
        let handle = registry.register_if_compound(&cell);
        assert!(handle > 0);
        assert!(Rc::ptr_eq(&registry.resolve(handle).unwrap(), &cell));
    }

    #[test]
    fn primitives_get_zero_handle() {
        let mut registry = HandleRegistry::new();
        let cell = Rc::new(RefCell::new(Value::Number(1.0)));
        assert_eq!(registry.register_if_compound(&cell), 0);
    }
}
