//! Intermediate tree → value graph.
//!
//! The walk builds an owned skeleton in one pass. References are left as
//! `Undefined` placeholders and typed states are placed as-is; both are
//! recorded as [`Action`]s addressed by path. The actions then run deepest
//! first unless their paths say otherwise: a reference writing into a typed
//! state runs before that state is converted, and a reference reading a
//! typed instance runs after it.

use crate::action::{sort_actions, Action};
use crate::error::GraphError;
use crate::item::Item;
use crate::options::Options;
use crate::path;
use crate::registry::ConverterRegistry;
use crate::value::{Array, Object, Value};
use json_graph_pointer::{format_json_pointer, is_root, Path};

/// Single-use walker for one denormalize call.
pub(crate) struct Denormalizer<'a> {
    registry: &'a ConverterRegistry,
    options: &'a Options,
    actions: Vec<Action>,
}

impl<'a> Denormalizer<'a> {
    pub(crate) fn new(registry: &'a ConverterRegistry, options: &'a Options) -> Self {
        Denormalizer {
            registry,
            options,
            actions: Vec::new(),
        }
    }

    pub(crate) fn run(mut self, item: &Item) -> Result<Value, GraphError> {
        let mut path = Vec::new();
        let root = self.build(item, &mut path)?;
        self.resolve(root)
    }

    fn build(&mut self, item: &Item, path: &mut Path) -> Result<Value, GraphError> {
        match item {
            Item::Value(scalar) => Ok(Value::from(scalar.clone())),
            Item::Function(inner) => {
                let recorded = self.actions.len();
                let state = self.build(inner, path)?;
                if self.actions.len() != recorded {
                    return Err(GraphError::malformed(format!(
                        "function state at \"{}\" contains references or typed states",
                        format_json_pointer(path)
                    )));
                }
                Ok(Value::Function(
                    self.options.function_converter.instantiate(state)?,
                ))
            }
            Item::Symbol(description) => Ok(Value::Symbol(
                self.options.symbol_converter.instantiate(description)?,
            )),
            Item::Reference(source) => {
                self.actions.push(Action::Reference {
                    target: path.clone(),
                    source: source.clone(),
                });
                Ok(Value::Undefined)
            }
            Item::Object(fields) => {
                let obj = Object::new();
                for (key, field) in fields {
                    path.push(key.clone());
                    let value = self.build(field, path)?;
                    path.pop();
                    obj.insert(key.clone(), value);
                }
                Ok(Value::Object(obj))
            }
            Item::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    path.push(index.to_string());
                    out.push(self.build(item, path)?);
                    path.pop();
                }
                Ok(Value::Array(Array::new(out)))
            }
            Item::TypedState { type_id, state } => {
                self.actions.push(Action::Conversion {
                    type_id: type_id.clone(),
                    path: path.clone(),
                });
                self.build(state, path)
            }
        }
    }

    fn resolve(mut self, mut root: Value) -> Result<Value, GraphError> {
        sort_actions(&mut self.actions);
        tracing::trace!(actions = self.actions.len(), "applying fixups");

        for action in &self.actions {
            tracing::trace!(%action, "fixup");
            match action {
                Action::Reference { target, source } => {
                    let value = path::get(&root, source).map_err(|_| {
                        GraphError::malformed(format!(
                            "reference source \"{}\" does not resolve",
                            format_json_pointer(source)
                        ))
                    })?;
                    if is_root(target) {
                        root = value;
                    } else {
                        path::set(&root, target, value)?;
                    }
                }
                Action::Conversion { type_id, path: at } => {
                    let converter = self.registry.resolve(type_id)?;
                    let state = path::get(&root, at)?;
                    let instance = converter.instantiate(state)?;
                    if is_root(at) {
                        root = instance;
                    } else {
                        path::set(&root, at, instance)?;
                    }
                }
            }
        }
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::default_registry;
    use crate::item::Scalar;
    use crate::value::Instance;
    use indexmap::IndexMap;

    fn denormalize(item: &Item) -> Result<Value, GraphError> {
        let registry = default_registry();
        let options = Options::default();
        Denormalizer::new(&registry, &options).run(item)
    }

    fn p(steps: &[&str]) -> Path {
        steps.iter().map(|s| s.to_string()).collect()
    }

    fn num(n: f64) -> Item {
        Item::Value(Scalar::Number(n))
    }

    #[test]
    fn reference_shares_identity() {
        let mut shared = IndexMap::new();
        shared.insert("x".to_string(), num(1.0));
        let mut holder = IndexMap::new();
        holder.insert("inner".to_string(), Item::Reference(p(&["0"])));
        let item = Item::Array(vec![Item::Object(shared), Item::Object(holder)]);

        let root = denormalize(&item).unwrap();
        let first = path::get(&root, &p(&["0"])).unwrap();
        let inner = path::get(&root, &p(&["1", "inner"])).unwrap();
        assert!(first.ptr_eq(&inner));
    }

    #[test]
    fn root_cycle() {
        let mut fields = IndexMap::new();
        fields.insert("self".to_string(), Item::Reference(vec![]));
        let root = denormalize(&Item::Object(fields)).unwrap();
        let me = root.as_object().unwrap().get("self").unwrap();
        assert!(me.ptr_eq(&root));
    }

    #[test]
    fn typed_root_cycle() {
        // A map that contains itself as a value.
        let item = Item::TypedState {
            type_id: "Map".into(),
            state: Box::new(Item::Array(vec![Item::Array(vec![
                Item::Value(Scalar::String("me".into())),
                Item::Reference(vec![]),
            ])])),
        };
        let root = denormalize(&item).unwrap();
        let map = root.as_instance().unwrap();
        assert_eq!(map.type_id(), "Map");
        assert!(map.map_get(&Value::from("me")).unwrap().ptr_eq(&root));
    }

    #[test]
    fn reference_to_typed_instance_copies_the_instance() {
        let date = Item::TypedState {
            type_id: "Date".into(),
            state: Box::new(num(0.0)),
        };
        let item = Item::Array(vec![date, Item::Reference(p(&["0"]))]);
        let root = denormalize(&item).unwrap();
        let a = path::get(&root, &p(&["0"])).unwrap();
        let b = path::get(&root, &p(&["1"])).unwrap();
        assert!(a.as_instance().is_some());
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn typed_state_that_is_a_reference() {
        let boxed = crate::registry::converter(
            |inst: &Instance| Ok(inst.property("inner").unwrap_or_default()),
            |state: Value| {
                let inst = Instance::new("Box");
                inst.set_property("inner", state);
                Ok(Value::Instance(inst))
            },
        );
        let registry = ConverterRegistry::builder()
            .register("Box", boxed)
            .unwrap()
            .build();
        let options = Options::default();
        let item = Item::Array(vec![
            Item::Array(vec![]),
            Item::TypedState {
                type_id: "Box".into(),
                state: Box::new(Item::Reference(p(&["0"]))),
            },
        ]);

        let root = Denormalizer::new(&registry, &options).run(&item).unwrap();
        let rebuilt = path::get(&root, &p(&["1"])).unwrap();
        let inner = rebuilt.as_instance().unwrap().property("inner").unwrap();
        assert!(inner.ptr_eq(&path::get(&root, &p(&["0"])).unwrap()));
    }

    #[test]
    fn nested_typed_instances() {
        // Set { Map { 1 => Date(5) } }
        let item = Item::TypedState {
            type_id: "Set".into(),
            state: Box::new(Item::Array(vec![Item::TypedState {
                type_id: "Map".into(),
                state: Box::new(Item::Array(vec![Item::Array(vec![
                    num(1.0),
                    Item::TypedState {
                        type_id: "Date".into(),
                        state: Box::new(num(5.0)),
                    },
                ])])),
            }])),
        };
        let root = denormalize(&item).unwrap();
        let set = root.as_instance().unwrap();
        let crate::value::Slot::Items(items) = set.slot() else {
            panic!("expected set items");
        };
        let map = items[0].as_instance().unwrap();
        let date = map.map_get(&Value::from(1)).unwrap();
        let date = date.as_instance().unwrap();
        assert_eq!(date.type_id(), "Date");
    }

    #[test]
    fn dangling_reference_is_malformed() {
        let item = Item::Array(vec![Item::Reference(p(&["5"]))]);
        assert!(matches!(
            denormalize(&item),
            Err(GraphError::MalformedItem(_))
        ));
    }

    #[test]
    fn unknown_type_fails() {
        let item = Item::TypedState {
            type_id: "Point".into(),
            state: Box::new(Item::Object(IndexMap::new())),
        };
        assert_eq!(
            denormalize(&item).unwrap_err(),
            GraphError::UnregisteredType("Point".into())
        );
    }

    #[test]
    fn function_state_must_be_self_contained() {
        let item = Item::Function(Box::new(Item::Reference(vec![])));
        assert!(matches!(
            denormalize(&item),
            Err(GraphError::MalformedItem(_))
        ));
    }

    #[test]
    fn error_instance_rebuilt() {
        let mut fields = IndexMap::new();
        fields.insert("name".to_string(), Item::Value(Scalar::String("TypeError".into())));
        fields.insert("message".to_string(), Item::Value(Scalar::String("bad".into())));
        let item = Item::TypedState {
            type_id: "TypeError".into(),
            state: Box::new(Item::Object(fields)),
        };
        let root = denormalize(&item).unwrap();
        let err = root.as_instance().unwrap();
        let expected = Instance::error("TypeError", "bad");
        assert!(crate::equal::deep_equal(&root, &Value::Instance(expected)));
        assert_eq!(err.property("message").unwrap().as_str(), Some("bad"));
    }
}
