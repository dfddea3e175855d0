//! The public entry point: normalize, denormalize and clone through one
//! configured engine.

use crate::converters::default_registry;
use crate::denormalize::Denormalizer;
use crate::error::GraphError;
use crate::item::Item;
use crate::normalize::Normalizer;
use crate::options::{Options, OptionsPatch};
use crate::registry::ConverterRegistry;
use crate::value::Value;
use std::sync::Arc;

/// Normalize/denormalize engine over an immutable registry and options.
///
/// Cloning is cheap. [`Engine::with_converters`] and
/// [`Engine::with_options`] return new engines and never touch `self`, so
/// one engine can be shared freely between threads.
///
/// # Example
///
/// ```
/// use json_graph::{Engine, Object, Value};
///
/// let obj = Object::new();
/// obj.insert("self", Value::Object(obj.clone()));
///
/// let engine = Engine::default();
/// let copy = engine.clone_value(&Value::Object(obj.clone())).unwrap();
/// let me = copy.as_object().unwrap().get("self").unwrap();
/// assert!(me.ptr_eq(&copy));
/// assert!(!copy.ptr_eq(&Value::Object(obj)));
/// ```
#[derive(Clone, Debug)]
pub struct Engine {
    registry: ConverterRegistry,
    options: Arc<Options>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(default_registry(), Options::default())
    }
}

impl Engine {
    /// Creates an engine with exactly `registry` and `options`.
    pub fn new(registry: ConverterRegistry, options: Options) -> Self {
        Engine {
            registry,
            options: Arc::new(options),
        }
    }

    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Converts a value graph into an intermediate tree.
    ///
    /// # Errors
    ///
    /// - [`GraphError::UnregisteredType`] for an instance with no converter.
    /// - [`GraphError::CircularReference`] for a revisited composite when
    ///   `no_refs` is set.
    /// - Any error a converter returns.
    pub fn normalize(&self, value: &Value) -> Result<Item, GraphError> {
        let item = Normalizer::new(&self.registry, &self.options).run(value)?;
        tracing::debug!(items = item.size(), "normalize");
        Ok(item)
    }

    /// Rebuilds a value graph from an intermediate tree.
    ///
    /// # Errors
    ///
    /// - [`GraphError::UnregisteredType`] for a typed state with no converter.
    /// - [`GraphError::MalformedItem`] for a reference that does not resolve.
    /// - Any error a converter returns.
    pub fn denormalize(&self, item: &Item) -> Result<Value, GraphError> {
        tracing::debug!(items = item.size(), "denormalize");
        Denormalizer::new(&self.registry, &self.options).run(item)
    }

    /// Deep copy preserving cycles and sharing, without a text round trip.
    pub fn clone_value(&self, value: &Value) -> Result<Value, GraphError> {
        let item = self.normalize(value)?;
        self.denormalize(&item)
    }

    /// Normalizes `value` and encodes it with the configured text codec.
    pub fn serialize(&self, value: &Value) -> Result<String, GraphError> {
        let item = self.normalize(value)?;
        let text = self.options.text_codec.encode(&item)?;
        tracing::debug!(bytes = text.len(), "serialize");
        Ok(text)
    }

    /// Decodes `text` with the configured text codec and denormalizes it.
    pub fn deserialize(&self, text: &str) -> Result<Value, GraphError> {
        tracing::debug!(bytes = text.len(), "deserialize");
        let item = self.options.text_codec.decode(text)?;
        self.denormalize(&item)
    }

    /// Returns a new engine whose registry layers `fragments` over this
    /// one's, later fragments winning on identical type identifiers.
    ///
    /// # Example
    ///
    /// ```
    /// use json_graph::converters::{all_properties, converters_for};
    /// use json_graph::{Engine, Instance, Value};
    ///
    /// let point = Instance::new("Point");
    /// point.set_property("x", Value::from(1));
    /// let value = Value::Instance(point);
    ///
    /// let engine = Engine::default();
    /// assert!(engine.clone_value(&value).is_err());
    ///
    /// let extended = engine.with_converters([converters_for(&["Point"], all_properties).unwrap()]);
    /// let copy = extended.clone_value(&value).unwrap();
    /// assert_eq!(copy.as_instance().unwrap().type_id(), "Point");
    /// ```
    pub fn with_converters(
        &self,
        fragments: impl IntoIterator<Item = ConverterRegistry>,
    ) -> Engine {
        let registry = fragments
            .into_iter()
            .fold(self.registry.clone(), |acc, fragment| acc.merge(&fragment));
        tracing::debug!(converters = registry.len(), "extended engine registry");
        Engine {
            registry,
            options: Arc::clone(&self.options),
        }
    }

    /// Returns a new engine with `patch` applied over this one's options.
    pub fn with_options(&self, patch: OptionsPatch) -> Engine {
        tracing::debug!(?patch, "patched engine options");
        Engine {
            registry: self.registry.clone(),
            options: Arc::new(self.options.apply(patch)),
        }
    }
}
