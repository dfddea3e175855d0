//! Converter protocol and the immutable converter registry.

use crate::error::GraphError;
use crate::value::{Instance, Value};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Two-way conversion between a typed instance and a plain state value.
///
/// `extract_state` must return something normalizable without this
/// converter (typically a fresh plain object or array); `instantiate` gets
/// that state back, already denormalized, and builds the instance.
pub trait Converter: Send + Sync {
    fn extract_state(&self, instance: &Instance) -> Result<Value, GraphError>;
    fn instantiate(&self, state: Value) -> Result<Value, GraphError>;
}

/// A [`Converter`] made of two closures.
pub struct FnConverter<E, I> {
    extract: E,
    instantiate: I,
}

impl<E, I> Converter for FnConverter<E, I>
where
    E: Fn(&Instance) -> Result<Value, GraphError> + Send + Sync,
    I: Fn(Value) -> Result<Value, GraphError> + Send + Sync,
{
    fn extract_state(&self, instance: &Instance) -> Result<Value, GraphError> {
        (self.extract)(instance)
    }

    fn instantiate(&self, state: Value) -> Result<Value, GraphError> {
        (self.instantiate)(state)
    }
}

/// Wraps a pair of closures into a shareable converter.
///
/// # Example
///
/// ```
/// use json_graph::{converter, Instance, Value};
///
/// let point = converter(
///     |inst: &Instance| Ok(inst.property("x").unwrap_or_default()),
///     |state: Value| {
///         let inst = Instance::new("Point");
///         inst.set_property("x", state);
///         Ok(Value::Instance(inst))
///     },
/// );
/// # let _ = point;
/// ```
pub fn converter<E, I>(extract: E, instantiate: I) -> Arc<dyn Converter>
where
    E: Fn(&Instance) -> Result<Value, GraphError> + Send + Sync + 'static,
    I: Fn(Value) -> Result<Value, GraphError> + Send + Sync + 'static,
{
    Arc::new(FnConverter {
        extract,
        instantiate,
    })
}

/// Immutable mapping from type identifier to converter.
///
/// Cloning is cheap and shares the table. Nothing mutates a registry once
/// built; [`ConverterRegistry::merge`] returns a new one.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: Arc<IndexMap<String, Arc<dyn Converter>>>,
}

impl ConverterRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, type_id: &str) -> Option<&Arc<dyn Converter>> {
        self.converters.get(type_id)
    }

    /// Looks up a converter, failing with [`GraphError::UnregisteredType`].
    pub fn resolve(&self, type_id: &str) -> Result<&dyn Converter, GraphError> {
        self.converters
            .get(type_id)
            .map(|c| &**c)
            .ok_or_else(|| GraphError::UnregisteredType(type_id.to_string()))
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.converters.contains_key(type_id)
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    pub fn type_ids(&self) -> impl Iterator<Item = &str> {
        self.converters.keys().map(String::as_str)
    }

    /// Layers `other` over `self` into a new registry.
    ///
    /// Entries of `other` replace entries of `self` with the same type
    /// identifier; both inputs stay untouched.
    pub fn merge(&self, other: &ConverterRegistry) -> ConverterRegistry {
        if other.is_empty() {
            return self.clone();
        }
        let mut converters = (*self.converters).clone();
        for (type_id, conv) in other.converters.iter() {
            if converters.insert(type_id.clone(), Arc::clone(conv)).is_some() {
                tracing::debug!(type_id = %type_id, "converter overridden by later layer");
            }
        }
        ConverterRegistry {
            converters: Arc::new(converters),
        }
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.type_ids()).finish()
    }
}

/// Collects converters for one registry fragment.
#[derive(Default)]
pub struct RegistryBuilder {
    converters: IndexMap<String, Arc<dyn Converter>>,
}

impl RegistryBuilder {
    /// Registers `conv` under `type_id`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateConverter`] if `type_id` is already
    /// registered in this fragment.
    pub fn register(
        mut self,
        type_id: impl Into<String>,
        conv: Arc<dyn Converter>,
    ) -> Result<Self, GraphError> {
        let type_id = type_id.into();
        if self.converters.contains_key(&type_id) {
            return Err(GraphError::DuplicateConverter(type_id));
        }
        self.converters.insert(type_id, conv);
        Ok(self)
    }

    pub fn build(self) -> ConverterRegistry {
        ConverterRegistry {
            converters: Arc::new(self.converters),
        }
    }
}
