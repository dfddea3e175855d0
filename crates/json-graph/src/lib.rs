//! Identity-preserving normalize/denormalize for cyclic value graphs.
//!
//! [`Engine::normalize`] turns a [`Value`] graph (cycles, shared
//! composites, boxed primitives, maps, sets, dates, errors and custom typed
//! instances) into a tagged intermediate [`Item`] tree in which every
//! revisited composite is a [`Item::Reference`] to the path where it was
//! first seen. [`Engine::denormalize`] rebuilds one physical instance per
//! canonical path and points every reference at it.
//!
//! # Example
//!
//! ```
//! use json_graph::{Engine, Instance, Value};
//!
//! let shared = Value::object([("x", Value::from(1))]);
//! let map = Instance::map([(Value::from(1), shared.clone())]);
//! let graph = Value::array([Value::Instance(map), shared]);
//!
//! let engine = Engine::default();
//! let text = engine.serialize(&graph).unwrap();
//! let copy = engine.deserialize(&text).unwrap();
//!
//! let arr = copy.as_array().unwrap();
//! let map = arr.get(0).unwrap();
//! let entry = map.as_instance().unwrap().map_get(&Value::from(1)).unwrap();
//! assert!(entry.ptr_eq(&arr.get(1).unwrap()));
//! ```

pub mod action;
pub mod codec;
pub mod converters;
mod denormalize;
mod engine;
pub mod equal;
mod error;
pub mod item;
mod normalize;
pub mod options;
pub mod path;
pub mod registry;
pub mod value;

pub use action::{sort_actions, Action};
pub use codec::{JsonCodec, TextCodec};
pub use converters::{default_registry, IterableKind};
pub use engine::Engine;
pub use equal::deep_equal;
pub use error::GraphError;
pub use item::{Item, Scalar};
pub use options::{
    DescriptionSymbolConverter, FunctionConverter, Options, OptionsPatch,
    SourceFunctionConverter, SymbolConverter,
};
pub use registry::{converter, Converter, ConverterRegistry, FnConverter, RegistryBuilder};
pub use value::{
    type_id, Array, Function, Identity, Instance, InstanceData, Object, Slot, Symbol, Value,
};

pub use json_graph_pointer::{format_json_pointer, parse_json_pointer, Path, PathStep};
