use json_graph::{converter, deep_equal, ConverterRegistry, Engine, GraphError, Instance, Value};
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Thread-safe description of a graph; `Shared(n)` reuses the n-th
/// composite built so far, which is how sharing enters generated graphs.
///
/// `Wrapper(n)` boxes such a reused composite in an instance whose state is
/// the composite itself, and `Pair` is an instance whose state is laid out
/// differently from its properties.
#[derive(Debug, Clone)]
enum Shape {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    Array(Vec<Shape>),
    Object(BTreeMap<String, Shape>),
    Set(Vec<Shape>),
    Map(Vec<(Shape, Shape)>),
    Date(f64),
    Shared(usize),
    Wrapper(usize),
    Pair(Box<Shape>, Box<Shape>),
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        Just(Shape::Null),
        any::<bool>().prop_map(Shape::Bool),
        (-1.0e9f64..1.0e9).prop_map(Shape::Num),
        "[a-z]{0,6}".prop_map(Shape::Str),
        (0.0f64..4.0e12).prop_map(|ms| Shape::Date(ms.trunc())),
        (0usize..8).prop_map(Shape::Shared),
        (0usize..8).prop_map(Shape::Wrapper),
    ];
    leaf.prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Shape::Array),
            prop::collection::btree_map("[a-c]{1,2}", inner.clone(), 0..5).prop_map(Shape::Object),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Shape::Set),
            prop::collection::vec((inner.clone(), inner.clone()), 0..3).prop_map(Shape::Map),
            (inner.clone(), inner)
                .prop_map(|(first, second)| Shape::Pair(Box::new(first), Box::new(second))),
        ]
    })
}

fn reuse(n: usize, pool: &[Value]) -> Value {
    match pool.len() {
        0 => Value::Null,
        len => pool[n % len].clone(),
    }
}

fn build(shape: &Shape, pool: &mut Vec<Value>) -> Value {
    let value = match shape {
        Shape::Null => return Value::Null,
        Shape::Bool(b) => return Value::from(*b),
        Shape::Num(n) => return Value::from(*n),
        Shape::Str(s) => return Value::from(s.as_str()),
        Shape::Shared(n) => return reuse(*n, pool),
        Shape::Date(ms) => Value::Instance(Instance::date(*ms)),
        Shape::Array(items) => Value::array(items.iter().map(|s| build(s, pool)).collect::<Vec<_>>()),
        Shape::Object(fields) => Value::object(
            fields
                .iter()
                .map(|(k, s)| (k.clone(), build(s, pool)))
                .collect::<Vec<_>>(),
        ),
        Shape::Set(items) => Value::Instance(Instance::set(
            items.iter().map(|s| build(s, pool)).collect::<Vec<_>>(),
        )),
        Shape::Map(entries) => Value::Instance(Instance::map(
            entries
                .iter()
                .map(|(k, v)| (build(k, pool), build(v, pool)))
                .collect::<Vec<_>>(),
        )),
        Shape::Wrapper(n) => {
            let inst = Instance::new("Wrapper");
            inst.set_property("inner", reuse(*n, pool));
            Value::Instance(inst)
        }
        Shape::Pair(first, second) => {
            let inst = Instance::new("Pair");
            inst.set_property("first", build(first, pool));
            inst.set_property("second", build(second, pool));
            Value::Instance(inst)
        }
    };
    pool.push(value.clone());
    value
}

fn engine() -> Engine {
    let wrapper = converter(
        |inst: &Instance| Ok(inst.property("inner").unwrap_or_default()),
        |state: Value| {
            let inst = Instance::new("Wrapper");
            inst.set_property("inner", state);
            Ok(Value::Instance(inst))
        },
    );
    let pair = converter(
        |inst: &Instance| {
            Ok(Value::array([
                inst.property("first").unwrap_or_default(),
                inst.property("second").unwrap_or_default(),
            ]))
        },
        |state: Value| {
            let items = state
                .as_array()
                .map(|arr| arr.to_vec())
                .filter(|items| items.len() == 2)
                .ok_or_else(|| GraphError::Converter {
                    type_id: "Pair".into(),
                    reason: "expected [first, second]".into(),
                })?;
            let inst = Instance::new("Pair");
            inst.set_property("first", items[0].clone());
            inst.set_property("second", items[1].clone());
            Ok(Value::Instance(inst))
        },
    );
    let fragment = ConverterRegistry::builder()
        .register("Wrapper", wrapper)
        .expect("single registration")
        .register("Pair", pair)
        .expect("single registration")
        .build();
    Engine::default().with_converters([fragment])
}

proptest! {
    #[test]
    fn clone_preserves_structure_and_sharing(shape in arb_shape()) {
        let value = build(&shape, &mut Vec::new());
        let engine = engine();

        let item = engine.normalize(&value).expect("normalize must succeed");
        let copy = engine.denormalize(&item).expect("denormalize must succeed");
        prop_assert!(deep_equal(&copy, &value));

        // Same tree again means the same sharing pattern.
        let again = engine.normalize(&copy).expect("normalize must succeed");
        prop_assert_eq!(item, again);
    }

    #[test]
    fn text_roundtrip_equals_clone(shape in arb_shape()) {
        let value = build(&shape, &mut Vec::new());
        let engine = engine();

        let text = engine.serialize(&value).expect("serialize must succeed");
        let back = engine.deserialize(&text).expect("deserialize must succeed");
        let cloned = engine.clone_value(&value).expect("clone must succeed");
        prop_assert!(deep_equal(&back, &cloned));
        prop_assert_eq!(
            engine.normalize(&back).expect("normalize must succeed"),
            engine.normalize(&cloned).expect("normalize must succeed")
        );
    }
}
