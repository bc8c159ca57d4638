//! Variable Materializer (§4.5).
//!
//! Turns a scope or a compound value behind a reference handle into the
//! flat `{name, value, type-tag, child-ref}` list the protocol sends over
//! the wire. Object properties are enumerated in insertion order (the order
//! `ObjectData` already preserves), never sorted — a client diffing two
//! snapshots of the same object should see stable ordering.

use crate::debugger::protocol::Variable;
use crate::debugger::registry::{HandleRegistry, ScopeKind};
use crate::value::Value;
use crate::vm::VM;
use std::cell::RefCell;
use std::rc::Rc;

/// Materialize the locals or globals scope for a frame into `Variable`s,
/// registering any compound values so the client can later request their
/// children via the handle left in `variables_reference`.
pub fn materialize_scope(
    vm: &VM,
    registry: &mut HandleRegistry,
    frame_index: usize,
    kind: ScopeKind,
) -> Vec<Variable> {
    let bindings = match kind {
        ScopeKind::Local => vm.get_locals_for_frame(frame_index),
        ScopeKind::Global => vm.get_global_variables(),
    };
    let mut variables: Vec<Variable> = bindings
        .into_iter()
        .map(|(name, cell)| variable_for_cell(registry, name, &cell))
        .collect();
    variables.sort_by(|a, b| a.name.cmp(&b.name));
    variables
}

/// Materialize the children of the compound value behind `handle`.
///
/// Returns `None` if `handle` doesn't resolve to a live compound value.
pub fn materialize_children(registry: &mut HandleRegistry, handle: i64) -> Option<Vec<Variable>> {
    let cell = registry.resolve(handle)?;
    let value = cell.borrow();
    Some(match &*value {
        Value::Array(items) => items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, v)| variable_for_value(registry, i.to_string(), v))
            .collect(),
        Value::Object(data) => data
            .borrow()
            .entries()
            .iter()
            .map(|(k, v)| variable_for_value(registry, k.clone(), v))
            .collect(),
        _ => Vec::new(),
    })
}

fn variable_for_cell(registry: &mut HandleRegistry, name: String, cell: &Rc<RefCell<Value>>) -> Variable {
    let value = cell.borrow();
    let handle = registry.register_if_compound(cell);
    Variable::with_reference(name, value.to_display_string(), value.type_tag(), handle)
}

fn variable_for_value(registry: &mut HandleRegistry, name: String, value: &Value) -> Variable {
    let cell = Rc::new(RefCell::new(value.clone()));
    let handle = registry.register_if_compound(&cell);
    Variable::with_reference(name, value.to_display_string(), value.type_tag(), handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Bytecode;
    use crate::vm::VM;

    #[test]
    fn scope_with_no_bindings_is_empty() {
        let vm = VM::new(Bytecode::new(), false);
        let mut registry = HandleRegistry::new();
        let vars = materialize_scope(&vm, &mut registry, 0, ScopeKind::Local);
        assert!(vars.is_empty());
    }

    #[test]
    fn array_children_are_index_named_and_ordered() {
        let mut registry = HandleRegistry::new();
        let arr = Rc::new(RefCell::new(Value::array(vec![
            Value::Number(10.0),
            Value::Number(20.0),
        ])));
        let handle = registry.register_if_compound(&arr);
        let children = materialize_children(&mut registry, handle).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name, "0");
        assert_eq!(children[1].name, "1");
        assert_eq!(children[0].value, "10");
    }

    #[test]
    fn object_children_preserve_insertion_order() {
        let mut registry = HandleRegistry::new();
        let mut data = crate::value::ObjectData::new();
        data.set("b", Value::Number(2.0));
        data.set("a", Value::Number(1.0));
        let obj = Rc::new(RefCell::new(Value::object(data)));
        let handle = registry.register_if_compound(&obj);
        let children = materialize_children(&mut registry, handle).unwrap();
        assert_eq!(children[0].name, "b");
        assert_eq!(children[1].name, "a");
    }

    #[test]
    fn unknown_handle_resolves_to_none() {
        let mut registry = HandleRegistry::new();
        assert!(materialize_children(&mut registry, 99).is_none());
    }
}
