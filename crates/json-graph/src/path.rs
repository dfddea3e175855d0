//! Path addressing inside a live value graph.
//!
//! Arrays are addressed by index and plain objects by key. Instances are
//! addressed by property key first, then through their internal slot: set
//! items by index, map entries by index followed by `0` (key) or `1`
//! (value). This is the same layout the standard converters use for the
//! extracted state, so a path taken in a state tree stays valid once the
//! state has been turned back into an instance.

use crate::error::GraphError;
use crate::value::{Instance, Slot, Value};
use json_graph_pointer::{format_json_pointer, parse_index, split_last};

/// A position reached while walking a path.
enum Cursor {
    Value(Value),
    /// Entry `index` of a map instance, which is not a value on its own.
    Entry(Instance, usize),
}

/// Reads the value at `path` below `root`.
///
/// # Errors
///
/// Returns [`GraphError::MalformedItem`] if any step does not resolve.
pub fn get(root: &Value, path: &[String]) -> Result<Value, GraphError> {
    match walk(root, path)? {
        Cursor::Value(value) => Ok(value),
        Cursor::Entry(..) => Err(unresolved(path)),
    }
}

/// Writes `value` into the slot at `path` below `root`.
///
/// The parent of the slot must exist. Array elements, map entries and
/// instance properties must already exist as well; only plain object keys
/// are created on demand.
///
/// # Errors
///
/// Returns [`GraphError::MalformedItem`] if `path` is the root or does not
/// resolve.
pub fn set(root: &Value, path: &[String], value: Value) -> Result<(), GraphError> {
    let (parent, step) = split_last(path)?;
    let container = walk(root, parent)?;
    if assign(&container, step, value) {
        Ok(())
    } else {
        Err(unresolved(path))
    }
}

fn walk(root: &Value, path: &[String]) -> Result<Cursor, GraphError> {
    let mut cursor = Cursor::Value(root.clone());
    for step in path {
        cursor = descend(&cursor, step).ok_or_else(|| unresolved(path))?;
    }
    Ok(cursor)
}

fn descend(cursor: &Cursor, step: &str) -> Option<Cursor> {
    match cursor {
        Cursor::Value(Value::Array(arr)) => arr.get(parse_index(step).ok()?).map(Cursor::Value),
        Cursor::Value(Value::Object(obj)) => obj.get(step).map(Cursor::Value),
        Cursor::Value(Value::Instance(inst)) => {
            if let Some(prop) = inst.property(step) {
                return Some(Cursor::Value(prop));
            }
            let index = parse_index(step).ok()?;
            match &inst.borrow().slot {
                Slot::Items(items) => items.get(index).cloned().map(Cursor::Value),
                Slot::Entries(entries) if index < entries.len() => {
                    Some(Cursor::Entry(inst.clone(), index))
                }
                _ => None,
            }
        }
        Cursor::Entry(inst, index) => {
            let data = inst.borrow();
            let Slot::Entries(entries) = &data.slot else {
                return None;
            };
            let (key, val) = entries.get(*index)?;
            match step {
                "0" => Some(Cursor::Value(key.clone())),
                "1" => Some(Cursor::Value(val.clone())),
                _ => None,
            }
        }
        Cursor::Value(_) => None,
    }
}

fn assign(cursor: &Cursor, step: &str, value: Value) -> bool {
    match cursor {
        Cursor::Value(Value::Array(arr)) => match parse_index(step) {
            Ok(index) => arr.set(index, value),
            Err(_) => false,
        },
        Cursor::Value(Value::Object(obj)) => {
            obj.insert(step, value);
            true
        }
        // Only slots that already exist are replaced; an instance never grows
        // a property its converter did not produce.
        Cursor::Value(Value::Instance(inst)) => inst.with_data_mut(|data| {
            if let Some(slot) = data.properties.get_mut(step) {
                *slot = value;
                return true;
            }
            let (Ok(index), Slot::Items(items)) = (parse_index(step), &mut data.slot) else {
                return false;
            };
            match items.get_mut(index) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            }
        }),
        Cursor::Entry(inst, index) => inst.with_data_mut(|data| {
            let Slot::Entries(entries) = &mut data.slot else {
                return false;
            };
            let Some(entry) = entries.get_mut(*index) else {
                return false;
            };
            match step {
                "0" => entry.0 = value,
                "1" => entry.1 = value,
                _ => return false,
            }
            true
        }),
        Cursor::Value(_) => false,
    }
}

fn unresolved(path: &[String]) -> GraphError {
    GraphError::malformed(format!(
        "path \"{}\" does not resolve",
        format_json_pointer(path)
    ))
}
