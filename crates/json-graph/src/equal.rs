use crate::value::{Identity, Slot, Value};
use std::collections::HashSet;

/// Performs a structural equality check between two value graphs.
///
/// Composites are compared by content, not identity, and the shape of
/// sharing is not compared. A pair of composites that is already being
/// compared higher up the stack is assumed equal, which makes the check
/// terminate on cyclic graphs.
///
/// Numbers compare by value with `NaN` equal to itself. Symbols compare by
/// description and functions by source, since a reconstructed graph holds
/// fresh ones.
///
/// # Examples
///
/// ```
/// use json_graph::{deep_equal, Value};
///
/// let a = Value::object([("foo", Value::array([Value::from(1), Value::from(2)]))]);
/// let b = Value::object([("foo", Value::array([Value::from(1), Value::from(2)]))]);
/// let c = Value::object([("foo", Value::array([Value::from(1)]))]);
///
/// assert!(deep_equal(&a, &b));
/// assert!(!deep_equal(&a, &c));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    let mut visiting = HashSet::new();
    equal(a, b, &mut visiting)
}

fn equal(a: &Value, b: &Value, visiting: &mut HashSet<(Identity, Identity)>) -> bool {
    if let (Some(ia), Some(ib)) = (a.identity(), b.identity()) {
        if !visiting.insert((ia, ib)) {
            return true;
        }
    }
    match (a, b) {
        (Value::Undefined, Value::Undefined) => true,
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Symbol(a), Value::Symbol(b)) => a.description() == b.description(),
        (Value::Function(a), Value::Function(b)) => a.source() == b.source(),

        (Value::Array(arr_a), Value::Array(arr_b)) => {
            let items_a = arr_a.to_vec();
            let items_b = arr_b.to_vec();
            equal_seq(&items_a, &items_b, visiting)
        }

        (Value::Object(obj_a), Value::Object(obj_b)) => {
            equal_fields(&obj_a.entries(), &obj_b.entries(), visiting)
        }

        (Value::Instance(inst_a), Value::Instance(inst_b)) => {
            if inst_a.type_id() != inst_b.type_id() {
                return false;
            }
            if !equal_fields(&inst_a.properties(), &inst_b.properties(), visiting) {
                return false;
            }
            match (inst_a.slot(), inst_b.slot()) {
                (Slot::None, Slot::None) => true,
                (Slot::Primitive(a), Slot::Primitive(b)) => equal(&a, &b, visiting),
                (Slot::Items(a), Slot::Items(b)) => equal_seq(&a, &b, visiting),
                (Slot::Entries(a), Slot::Entries(b)) => {
                    a.len() == b.len()
                        && a.iter().zip(b.iter()).all(|((ka, va), (kb, vb))| {
                            equal(ka, kb, visiting) && equal(va, vb, visiting)
                        })
                }
                _ => false,
            }
        }

        _ => false,
    }
}

fn equal_seq(a: &[Value], b: &[Value], visiting: &mut HashSet<(Identity, Identity)>) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| equal(x, y, visiting))
}

fn equal_fields(
    a: &[(String, Value)],
    b: &[(String, Value)],
    visiting: &mut HashSet<(Identity, Identity)>,
) -> bool {
    if a.len() != b.len() {
        return false;
    }
    for (key, val_a) in a {
        match b.iter().find(|(k, _)| k == key) {
            Some((_, val_b)) => {
                if !equal(val_a, val_b, visiting) {
                    return false;
                }
            }
            None => return false,
        }
    }
    true
}
