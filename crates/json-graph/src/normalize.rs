//! Value graph → intermediate tree.

use crate::error::GraphError;
use crate::item::{Item, Scalar};
use crate::options::Options;
use crate::registry::ConverterRegistry;
use crate::value::{Identity, Value};
use indexmap::IndexMap;
use json_graph_pointer::{format_json_pointer, Path};
use std::collections::HashMap;

struct Visit {
    path: Path,
    // Keeps the composite alive for the whole call: converter states are
    // fresh allocations, and a freed address must not be reused as a key.
    _retain: Value,
}

/// Single-use walker for one normalize call.
pub(crate) struct Normalizer<'a> {
    registry: &'a ConverterRegistry,
    options: &'a Options,
    seen: HashMap<Identity, Visit>,
}

impl<'a> Normalizer<'a> {
    pub(crate) fn new(registry: &'a ConverterRegistry, options: &'a Options) -> Self {
        Normalizer {
            registry,
            options,
            seen: HashMap::new(),
        }
    }

    pub(crate) fn run(mut self, value: &Value) -> Result<Item, GraphError> {
        let mut path = Vec::new();
        let item = self.normalize(value, &mut path)?;
        tracing::trace!(composites = self.seen.len(), "normalized graph");
        Ok(item)
    }

    fn normalize(&mut self, value: &Value, path: &mut Path) -> Result<Item, GraphError> {
        if let Value::Function(function) = value {
            let state = self.options.function_converter.extract_state(function)?;
            return Ok(Item::Function(Box::new(self.normalize(&state, path)?)));
        }
        if let Some(scalar) = Scalar::from_value(value) {
            return Ok(Item::Value(scalar));
        }
        if let Value::Symbol(symbol) = value {
            return Ok(Item::Symbol(self.options.symbol_converter.extract_state(symbol)?));
        }

        let Some(identity) = value.identity() else {
            return Err(GraphError::malformed(format!("cannot normalize {}", value.kind())));
        };
        if let Some(visit) = self.seen.get(&identity) {
            if self.options.no_refs {
                return Err(GraphError::CircularReference {
                    pointer: format_json_pointer(path),
                    canonical: format_json_pointer(&visit.path),
                });
            }
            return Ok(Item::Reference(visit.path.clone()));
        }
        self.seen.insert(
            identity,
            Visit {
                path: path.clone(),
                _retain: value.clone(),
            },
        );

        match value {
            Value::Array(arr) => {
                let items = arr.to_vec();
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    path.push(index.to_string());
                    out.push(self.normalize(item, path)?);
                    path.pop();
                }
                Ok(Item::Array(out))
            }
            Value::Object(obj) => {
                let mut fields = IndexMap::with_capacity(obj.len());
                for (key, field) in obj.entries() {
                    path.push(key.clone());
                    let item = self.normalize(&field, path)?;
                    path.pop();
                    fields.insert(key, item);
                }
                Ok(Item::Object(fields))
            }
            Value::Instance(instance) => {
                let type_id = instance.type_id();
                let converter = self.registry.resolve(&type_id)?;
                let state = converter.extract_state(instance)?;
                // The state shares the instance's canonical path.
                let state = self.normalize(&state, path)?;
                Ok(Item::TypedState {
                    type_id,
                    state: Box::new(state),
                })
            }
            other => Err(GraphError::malformed(format!("cannot normalize {}", other.kind()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::default_registry;
    use crate::value::{Function, Instance, Object, Symbol};

    fn normalize(value: &Value) -> Result<Item, GraphError> {
        let registry = default_registry();
        let options = Options::default();
        Normalizer::new(&registry, &options).run(value)
    }

    fn p(steps: &[&str]) -> Path {
        steps.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn primitives() {
        assert_eq!(normalize(&Value::from(1)).unwrap(), Item::Value(Scalar::Number(1.0)));
        assert_eq!(normalize(&Value::Undefined).unwrap(), Item::Value(Scalar::Undefined));
        assert_eq!(
            normalize(&Value::from("s")).unwrap(),
            Item::Value(Scalar::String("s".into()))
        );
    }

    #[test]
    fn symbol_and_function() {
        assert_eq!(
            normalize(&Value::Symbol(Symbol::new("id"))).unwrap(),
            Item::Symbol("id".into())
        );
        let f = Value::Function(Function::stand_in("() => 1"));
        assert_eq!(
            normalize(&f).unwrap(),
            Item::Function(Box::new(Item::Value(Scalar::String("() => 1".into()))))
        );
    }

    #[test]
    fn shared_object_becomes_reference() {
        let shared = Value::object([("x", Value::from(1))]);
        let root = Value::array([shared.clone(), Value::object([("inner", shared)])]);
        let Item::Array(items) = normalize(&root).unwrap() else {
            panic!("expected array");
        };
        assert!(matches!(items[0], Item::Object(_)));
        let Item::Object(fields) = &items[1] else {
            panic!("expected object");
        };
        assert_eq!(fields["inner"], Item::Reference(p(&["0"])));
    }

    #[test]
    fn cycle_references_root() {
        let obj = Object::new();
        obj.insert("self", Value::Object(obj.clone()));
        let Item::Object(fields) = normalize(&Value::Object(obj)).unwrap() else {
            panic!("expected object");
        };
        assert_eq!(fields["self"], Item::Reference(vec![]));
    }

    #[test]
    fn equal_but_distinct_composites_are_not_merged() {
        let root = Value::array([Value::array([]), Value::array([])]);
        let Item::Array(items) = normalize(&root).unwrap() else {
            panic!("expected array");
        };
        assert_eq!(items, vec![Item::Array(vec![]), Item::Array(vec![])]);
    }

    #[test]
    fn no_refs_rejects_shared() {
        let registry = default_registry();
        let options = Options {
            no_refs: true,
            ..Options::default()
        };
        let shared = Value::array([]);
        let root = Value::array([shared.clone(), shared]);
        let err = Normalizer::new(&registry, &options).run(&root).unwrap_err();
        assert_eq!(
            err,
            GraphError::CircularReference {
                pointer: "/1".into(),
                canonical: "/0".into()
            }
        );
    }

    #[test]
    fn typed_state_shares_instance_path() {
        let shared = Value::object([("x", Value::from(1))]);
        let map = Instance::map([(Value::from(1), shared.clone())]);
        let root = Value::array([Value::Instance(map), shared]);
        let Item::Array(items) = normalize(&root).unwrap() else {
            panic!("expected array");
        };
        assert!(matches!(&items[0], Item::TypedState { type_id, .. } if type_id == "Map"));
        assert_eq!(items[1], Item::Reference(p(&["0", "0", "1"])));
    }

    #[test]
    fn unregistered_type_fails() {
        let root = Value::array([Value::Instance(Instance::new("Point"))]);
        assert_eq!(
            normalize(&root),
            Err(GraphError::UnregisteredType("Point".into()))
        );
    }
}
