//! The intermediate tree produced by normalization.

use crate::value::Value;
use indexmap::IndexMap;
use json_graph_pointer::Path;

/// A primitive carried verbatim in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl Scalar {
    /// Returns the scalar view of a primitive value.
    pub fn from_value(value: &Value) -> Option<Scalar> {
        match value {
            Value::Undefined => Some(Scalar::Undefined),
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(Scalar::Number(*n)),
            Value::String(s) => Some(Scalar::String(s.clone())),
            _ => None,
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Undefined => Value::Undefined,
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Number(n) => Value::Number(n),
            Scalar::String(s) => Value::String(s),
        }
    }
}

/// A node of the intermediate tree.
///
/// The tree has no sharing: every composite of the source graph is spelled
/// out once, at its canonical path, and every other occurrence is a
/// [`Item::Reference`] to that path.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Value(Scalar),
    /// Canonical path of an already serialized composite.
    Reference(Path),
    Object(IndexMap<String, Item>),
    Array(Vec<Item>),
    /// Normalized state produced by the function converter.
    Function(Box<Item>),
    /// Descriptor produced by the symbol converter.
    Symbol(String),
    /// State extracted by the converter registered for `type_id`.
    TypedState { type_id: String, state: Box<Item> },
}

impl Item {
    /// Number of items in this subtree, including `self`.
    pub fn size(&self) -> usize {
        1 + match self {
            Item::Value(_) | Item::Reference(_) | Item::Symbol(_) => 0,
            Item::Object(fields) => fields.values().map(Item::size).sum(),
            Item::Array(items) => items.iter().map(Item::size).sum(),
            Item::Function(inner) => inner.size(),
            Item::TypedState { state, .. } => state.size(),
        }
    }
}

impl From<Scalar> for Item {
    fn from(scalar: Scalar) -> Self {
        Item::Value(scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_view_of_values() {
        assert_eq!(Scalar::from_value(&Value::from(2)), Some(Scalar::Number(2.0)));
        assert_eq!(Scalar::from_value(&Value::Undefined), Some(Scalar::Undefined));
        assert_eq!(Scalar::from_value(&Value::array([])), None);
    }

    #[test]
    fn size_counts_every_node() {
        let item = Item::Array(vec![
            Item::Value(Scalar::Null),
            Item::TypedState {
                type_id: "Set".into(),
                state: Box::new(Item::Array(vec![Item::Reference(vec!["0".into()])])),
            },
        ]);
        assert_eq!(item.size(), 5);
    }
}
