//! In-memory value graph.
//!
//! Composite values (arrays, plain objects and typed instances) live behind
//! `Rc<RefCell<_>>` handles, so a graph may share sub-values and contain
//! cycles. Cloning a [`Value`] copies the handle, never the composite; use
//! [`Value::ptr_eq`] to compare identities and
//! [`deep_equal`](crate::equal::deep_equal) to compare structure.

use indexmap::IndexMap;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

/// Type identifiers of the builtin typed instances.
pub mod type_id {
    pub const NUMBER: &str = "Number";
    pub const STRING: &str = "String";
    pub const BOOLEAN: &str = "Boolean";
    pub const DATE: &str = "Date";
    pub const MAP: &str = "Map";
    pub const SET: &str = "Set";
    pub const ERROR: &str = "Error";

    /// The standard error subtypes, all shaped like [`ERROR`].
    pub const ERROR_SUBTYPES: &[&str] = &[
        "EvalError",
        "RangeError",
        "ReferenceError",
        "SyntaxError",
        "TypeError",
        "URIError",
    ];
}

/// A node of an in-memory value graph.
#[derive(Clone, Default)]
pub enum Value {
    /// The absent-value marker.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Symbol(Symbol),
    Function(Function),
    Array(Array),
    Object(Object),
    Instance(Instance),
}

/// Address of a composite, stable for as long as the composite is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(usize);

impl Identity {
    fn of<T: ?Sized>(rc: &Rc<T>) -> Self {
        Identity(Rc::as_ptr(rc) as *const () as usize)
    }
}

impl Value {
    /// Builds a fresh array.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Array(Array::new(items.into_iter().collect()))
    }

    /// Builds a fresh plain object.
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Object(Object::from_fields(fields))
    }

    /// Returns `true` for arrays, plain objects and typed instances.
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_) | Value::Instance(_))
    }

    /// Returns `true` for undefined, null, booleans, numbers and strings.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
        )
    }

    /// Identity of a composite; `None` for every other value.
    pub fn identity(&self) -> Option<Identity> {
        match self {
            Value::Array(a) => Some(Identity::of(&a.0)),
            Value::Object(o) => Some(Identity::of(&o.0)),
            Value::Instance(i) => Some(Identity::of(&i.0)),
            _ => None,
        }
    }

    /// Identity comparison for composites, symbols and functions.
    ///
    /// Primitives never share identity, so this returns `false` for them.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(&a.0, &b.0),
            _ => match (self.identity(), other.identity()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Key equality as used by map entries: primitives compare by value (NaN
    /// equals NaN, `0` equals `-0`), everything else by identity.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            _ => self.ptr_eq(other),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(i) => Some(i),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Function(_) => "function",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Instance(_) => "instance",
        }
    }
}

// Composites print shallowly: a derived impl would not terminate on cycles.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Symbol(s) => write!(f, "Symbol({:?})", s.description()),
            Value::Function(func) => write!(f, "Function({:?})", func.name()),
            Value::Array(a) => write!(f, "Array(len={}, {:?})", a.len(), self.identity()),
            Value::Object(o) => write!(f, "Object(keys={:?}, {:?})", o.keys(), self.identity()),
            Value::Instance(i) => write!(f, "Instance({}, {:?})", i.type_id(), self.identity()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Instance> for Value {
    fn from(i: Instance) -> Self {
        Value::Instance(i)
    }
}

/// An opaque unique identifier. Two symbols are equal only if they are the
/// same symbol, regardless of description.
#[derive(Clone)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn new(description: impl Into<String>) -> Self {
        Symbol(Rc::from(description.into()))
    }

    pub fn description(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.description())
    }
}

/// Native body of a [`Function`].
pub type NativeFn = dyn Fn(&[Value]) -> Value;

struct FunctionData {
    name: String,
    source: String,
    body: Box<NativeFn>,
}

/// A callable value with a name and a textual source.
#[derive(Clone)]
pub struct Function(Rc<FunctionData>);

impl Function {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        body: impl Fn(&[Value]) -> Value + 'static,
    ) -> Self {
        Function(Rc::new(FunctionData {
            name: name.into(),
            source: source.into(),
            body: Box::new(body),
        }))
    }

    /// A function that only remembers its source and returns `Undefined`
    /// when called.
    pub fn stand_in(source: impl Into<String>) -> Self {
        Function::new("", source, |_| Value::Undefined)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn source(&self) -> &str {
        &self.0.source
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0.body)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("source", &self.source())
            .finish()
    }
}

/// Shared handle to an ordered sequence.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
    pub fn new(items: Vec<Value>) -> Self {
        Array(Rc::new(RefCell::new(items)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    /// Overwrites an existing element. Returns `false` if out of bounds.
    pub fn set(&self, index: usize, value: Value) -> bool {
        match self.0.borrow_mut().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    /// Snapshot of the elements (handles, not deep copies).
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }
}

/// Shared handle to a plain keyed structure.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<IndexMap<String, Value>>>);

impl Object {
    pub fn new() -> Self {
        Object::default()
    }

    pub fn from_fields<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        let map = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Object(Rc::new(RefCell::new(map)))
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.0.borrow_mut().insert(key.into(), value);
    }

    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Snapshot of the own properties, in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn borrow(&self) -> Ref<'_, IndexMap<String, Value>> {
        self.0.borrow()
    }
}

/// Internal slot of a typed instance, for state that is not an own
/// property.
#[derive(Clone, Debug, Default)]
pub enum Slot {
    #[default]
    None,
    /// A boxed scalar or a date's time value.
    Primitive(Value),
    /// Set members, in insertion order.
    Items(Vec<Value>),
    /// Map entries, in insertion order.
    Entries(Vec<(Value, Value)>),
}

/// Contents of a typed instance.
#[derive(Clone, Debug, Default)]
pub struct InstanceData {
    pub type_id: String,
    pub properties: IndexMap<String, Value>,
    pub slot: Slot,
}

/// Shared handle to a custom-typed instance.
///
/// The type identifier is chosen by the application and selects the
/// converter used to (de)normalize the instance.
#[derive(Clone, Default)]
pub struct Instance(Rc<RefCell<InstanceData>>);

impl Instance {
    /// Allocates a default instance: no properties, empty slot.
    pub fn new(type_id: impl Into<String>) -> Self {
        Instance::from_data(InstanceData {
            type_id: type_id.into(),
            ..InstanceData::default()
        })
    }

    pub fn from_data(data: InstanceData) -> Self {
        Instance(Rc::new(RefCell::new(data)))
    }

    pub fn with_slot(type_id: impl Into<String>, slot: Slot) -> Self {
        Instance::from_data(InstanceData {
            type_id: type_id.into(),
            properties: IndexMap::new(),
            slot,
        })
    }

    pub fn boxed_number(n: f64) -> Self {
        Instance::with_slot(type_id::NUMBER, Slot::Primitive(Value::Number(n)))
    }

    pub fn boxed_string(s: impl Into<String>) -> Self {
        Instance::with_slot(type_id::STRING, Slot::Primitive(Value::String(s.into())))
    }

    pub fn boxed_bool(b: bool) -> Self {
        Instance::with_slot(type_id::BOOLEAN, Slot::Primitive(Value::Bool(b)))
    }

    /// A date holding milliseconds since the Unix epoch.
    pub fn date(millis: f64) -> Self {
        Instance::with_slot(type_id::DATE, Slot::Primitive(Value::Number(millis)))
    }

    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Instance::with_slot(type_id::MAP, Slot::Entries(entries.into_iter().collect()))
    }

    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Instance::with_slot(type_id::SET, Slot::Items(items.into_iter().collect()))
    }

    /// An error object; `kind` is `"Error"` or one of
    /// [`type_id::ERROR_SUBTYPES`].
    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        let instance = Instance::new(kind);
        instance.set_property("name", Value::from(kind));
        instance.set_property("message", Value::String(message.into()));
        instance
    }

    pub fn type_id(&self) -> String {
        self.0.borrow().type_id.clone()
    }

    pub fn property(&self, key: &str) -> Option<Value> {
        self.0.borrow().properties.get(key).cloned()
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.0.borrow().properties.contains_key(key)
    }

    pub fn set_property(&self, key: impl Into<String>, value: Value) {
        self.0.borrow_mut().properties.insert(key.into(), value);
    }

    /// Snapshot of the own properties, in insertion order.
    pub fn properties(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Snapshot of the internal slot.
    pub fn slot(&self) -> Slot {
        self.0.borrow().slot.clone()
    }

    pub fn set_slot(&self, slot: Slot) {
        self.0.borrow_mut().slot = slot;
    }

    /// Looks up a map entry by key (see [`Value::same_value_zero`]).
    pub fn map_get(&self, key: &Value) -> Option<Value> {
        match &self.0.borrow().slot {
            Slot::Entries(entries) => entries
                .iter()
                .find(|(k, _)| k.same_value_zero(key))
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    pub fn borrow(&self) -> Ref<'_, InstanceData> {
        self.0.borrow()
    }

    pub(crate) fn with_data_mut<R>(&self, f: impl FnOnce(&mut InstanceData) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_identity() {
        let obj = Value::object([("x", Value::from(1))]);
        let copy = obj.clone();
        assert!(obj.ptr_eq(&copy));
        assert_eq!(obj.identity(), copy.identity());
    }

    #[test]
    fn structurally_equal_objects_are_distinct() {
        let a = Value::object([("x", Value::from(1))]);
        let b = Value::object([("x", Value::from(1))]);
        assert!(!a.ptr_eq(&b));
        assert_ne!(a.identity(), b.identity());
    }

    #[test]
    fn primitives_have_no_identity() {
        assert_eq!(Value::from("a").identity(), None);
        assert!(!Value::Null.ptr_eq(&Value::Null));
        assert!(Value::Null.is_primitive());
        assert!(!Value::Symbol(Symbol::new("s")).is_primitive());
    }

    #[test]
    fn symbols_compare_by_identity() {
        let a = Symbol::new("tag");
        let b = Symbol::new("tag");
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn self_referencing_object() {
        let obj = Object::new();
        obj.insert("self", Value::Object(obj.clone()));
        let me = obj.get("self").unwrap();
        assert!(me.ptr_eq(&Value::Object(obj.clone())));
        // Debug must not recurse into the cycle.
        let _ = format!("{:?}", me);
    }

    #[test]
    fn map_get_uses_same_value_zero() {
        let key = Value::object(Vec::<(String, Value)>::new());
        let map = Instance::map([
            (Value::from(1), Value::from("one")),
            (Value::Number(f64::NAN), Value::from("nan")),
            (key.clone(), Value::from("obj")),
        ]);
        assert_eq!(map.map_get(&Value::Number(1.0)).unwrap().as_str(), Some("one"));
        assert_eq!(map.map_get(&Value::Number(f64::NAN)).unwrap().as_str(), Some("nan"));
        assert_eq!(map.map_get(&key).unwrap().as_str(), Some("obj"));
        assert!(map.map_get(&Value::object(Vec::<(String, Value)>::new())).is_none());
    }

    #[test]
    fn error_instance_has_name_and_message() {
        let err = Instance::error("TypeError", "bad");
        assert_eq!(err.type_id(), "TypeError");
        assert_eq!(err.property("name").unwrap().as_str(), Some("TypeError"));
        assert_eq!(err.property("message").unwrap().as_str(), Some("bad"));
    }

    #[test]
    fn array_set_out_of_bounds() {
        let arr = Array::new(vec![Value::Null]);
        assert!(arr.set(0, Value::from(true)));
        assert!(!arr.set(1, Value::Null));
        assert_eq!(arr.len(), 1);
    }

    #[test]
    fn function_stand_in_returns_undefined() {
        let f = Function::stand_in("x => x");
        assert_eq!(f.source(), "x => x");
        assert!(matches!(f.call(&[Value::from(1)]), Value::Undefined));
    }
}
