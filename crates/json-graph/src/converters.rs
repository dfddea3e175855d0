//! Standard converter shapes and the default catalog.
//!
//! Each shape is a factory taking the type identifier it will be registered
//! under, so one shape can serve many types through [`converters_for`].

use crate::error::GraphError;
use crate::registry::{Converter, ConverterRegistry};
use crate::value::{type_id, Array, Instance, Slot, Value};
use std::sync::Arc;

/// Unwraps a boxed scalar (or a date's time value) and reboxes it.
pub fn value_accessor(type_id: &str) -> Arc<dyn Converter> {
    Arc::new(ValueAccessor {
        type_id: type_id.to_string(),
    })
}

/// Materializes set items or map entries to an array and back.
///
/// Map entries become `[key, value]` pairs.
pub fn iterable(type_id: &str, kind: IterableKind) -> Arc<dyn Converter> {
    Arc::new(Iterable {
        type_id: type_id.to_string(),
        kind,
    })
}

/// Shallow-copies all own properties to a plain object; rebuilds by
/// allocating a default instance and assigning the object onto it.
pub fn all_properties(type_id: &str) -> Arc<dyn Converter> {
    Arc::new(Properties {
        type_id: type_id.to_string(),
        allow: None,
    })
}

/// Like [`all_properties`], restricted to the `names` allow list.
pub fn selected_properties(type_id: &str, names: &[&str]) -> Arc<dyn Converter> {
    Arc::new(Properties {
        type_id: type_id.to_string(),
        allow: Some(names.iter().map(|n| n.to_string()).collect()),
    })
}

/// Applies `shape` to every identifier in `type_ids` and collects the
/// results into one registry fragment.
///
/// # Errors
///
/// Returns [`GraphError::DuplicateConverter`] if `type_ids` repeats an
/// identifier.
///
/// # Example
///
/// ```
/// use json_graph::converters::{all_properties, converters_for};
///
/// let fragment = converters_for(&["Point", "Line"], all_properties).unwrap();
/// assert_eq!(fragment.len(), 2);
/// ```
pub fn converters_for<F>(type_ids: &[&str], shape: F) -> Result<ConverterRegistry, GraphError>
where
    F: Fn(&str) -> Arc<dyn Converter>,
{
    type_ids
        .iter()
        .try_fold(ConverterRegistry::builder(), |builder, id| {
            builder.register(*id, shape(id))
        })
        .map(|builder| builder.build())
}

/// Converters for every builtin typed instance of the value model.
pub fn default_registry() -> ConverterRegistry {
    let mut error_types = vec![type_id::ERROR];
    error_types.extend_from_slice(type_id::ERROR_SUBTYPES);

    let boxed = [type_id::NUMBER, type_id::STRING, type_id::BOOLEAN, type_id::DATE];
    let fragments = [
        converters_for(&boxed, value_accessor),
        converters_for(&[type_id::SET], |id| iterable(id, IterableKind::Items)),
        converters_for(&[type_id::MAP], |id| iterable(id, IterableKind::Entries)),
        converters_for(&error_types, |id| {
            selected_properties(id, &["name", "message", "stack"])
        }),
    ];
    fragments
        .into_iter()
        // The identifier lists above are static and disjoint.
        .flatten()
        .fold(ConverterRegistry::default(), |acc, fragment| acc.merge(&fragment))
}

/// Internal layout targeted by [`iterable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterableKind {
    Items,
    Entries,
}

struct ValueAccessor {
    type_id: String,
}

impl Converter for ValueAccessor {
    fn extract_state(&self, instance: &Instance) -> Result<Value, GraphError> {
        match instance.slot() {
            Slot::Primitive(value) => Ok(value),
            _ => Err(GraphError::converter(&self.type_id, "instance holds no boxed value")),
        }
    }

    fn instantiate(&self, state: Value) -> Result<Value, GraphError> {
        Ok(Value::Instance(Instance::with_slot(
            self.type_id.clone(),
            Slot::Primitive(state),
        )))
    }
}

struct Iterable {
    type_id: String,
    kind: IterableKind,
}

impl Converter for Iterable {
    fn extract_state(&self, instance: &Instance) -> Result<Value, GraphError> {
        match (self.kind, instance.slot()) {
            (IterableKind::Items, Slot::Items(items)) => Ok(Value::array(items)),
            (IterableKind::Entries, Slot::Entries(entries)) => Ok(Value::array(
                entries.into_iter().map(|(k, v)| Value::array([k, v])),
            )),
            _ => Err(GraphError::converter(
                &self.type_id,
                format!("instance holds no {:?}", self.kind),
            )),
        }
    }

    fn instantiate(&self, state: Value) -> Result<Value, GraphError> {
        let items = match &state {
            Value::Array(arr) => arr.to_vec(),
            other => {
                return Err(GraphError::converter(
                    &self.type_id,
                    format!("expected array state, got {}", other.kind()),
                ))
            }
        };
        let slot = match self.kind {
            IterableKind::Items => Slot::Items(items),
            IterableKind::Entries => Slot::Entries(
                items
                    .iter()
                    .map(|pair| entry(&self.type_id, pair))
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(Value::Instance(Instance::with_slot(self.type_id.clone(), slot)))
    }
}

fn entry(type_id: &str, pair: &Value) -> Result<(Value, Value), GraphError> {
    let items = pair.as_array().map(Array::to_vec).unwrap_or_default();
    match <[Value; 2]>::try_from(items) {
        Ok([key, value]) => Ok((key, value)),
        Err(_) => Err(GraphError::converter(type_id, "map entry is not a [key, value] pair")),
    }
}

struct Properties {
    type_id: String,
    allow: Option<Vec<String>>,
}

impl Properties {
    fn allows(&self, key: &str) -> bool {
        match &self.allow {
            Some(names) => names.iter().any(|n| n == key),
            None => true,
        }
    }
}

impl Converter for Properties {
    fn extract_state(&self, instance: &Instance) -> Result<Value, GraphError> {
        Ok(Value::object(
            instance
                .properties()
                .into_iter()
                .filter(|(key, _)| self.allows(key)),
        ))
    }

    fn instantiate(&self, state: Value) -> Result<Value, GraphError> {
        let record = match state {
            Value::Object(record) => record,
            other => {
                return Err(GraphError::converter(
                    &self.type_id,
                    format!("expected object state, got {}", other.kind()),
                ))
            }
        };
        let instance = Instance::new(self.type_id.clone());
        for (key, value) in record.entries() {
            if self.allows(&key) {
                instance.set_property(key, value);
            }
        }
        Ok(Value::Instance(instance))
    }
}
