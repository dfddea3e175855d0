//! Text codecs for the intermediate tree.
//!
//! The default [`JsonCodec`] writes every item as a JSON object tagged by
//! `"type"`:
//!
//! | item            | JSON                                                  |
//! |-----------------|-------------------------------------------------------|
//! | value           | `{"type":"value","value":1}`                          |
//! | undefined       | `{"type":"value"}`                                    |
//! | NaN / ±Infinity | `{"type":"value","number":"NaN"}`                     |
//! | reference       | `{"type":"ref","path":"/0/inner"}`                    |
//! | object          | `{"type":"object","fields":{"k":<item>}}`             |
//! | array           | `{"type":"array","items":[<item>]}`                   |
//! | function        | `{"type":"function","inner":<item>}`                  |
//! | symbol          | `{"type":"symbol","description":"tag"}`               |
//! | typed state     | `{"type":"typed","typeId":"Map","state":<item>}`      |

use crate::error::GraphError;
use crate::item::{Item, Scalar};
use indexmap::IndexMap;
use json_graph_pointer::{format_json_pointer, parse_json_pointer};
use serde::Deserialize;
use serde_json::{json, Map, Number, Value as Json};

/// Encodes the intermediate tree to text and back.
pub trait TextCodec: Send + Sync {
    fn encode(&self, item: &Item) -> Result<String, GraphError>;
    fn decode(&self, text: &str) -> Result<Item, GraphError>;
}

/// The default codec, backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pub pretty: bool,
}

impl JsonCodec {
    pub fn pretty() -> Self {
        JsonCodec { pretty: true }
    }
}

impl TextCodec for JsonCodec {
    fn encode(&self, item: &Item) -> Result<String, GraphError> {
        let json = to_json(item);
        let text = if self.pretty {
            serde_json::to_string_pretty(&json)?
        } else {
            serde_json::to_string(&json)?
        };
        Ok(text)
    }

    fn decode(&self, text: &str) -> Result<Item, GraphError> {
        // Items nest two JSON levels deep per graph level, which the default
        // limit of 128 would cap at shallow graphs.
        let mut de = serde_json::Deserializer::from_str(text);
        de.disable_recursion_limit();
        let json = Json::deserialize(&mut de)?;
        de.end()?;
        from_json(&json)
    }
}

/// Converts an item to its tagged JSON form.
pub fn to_json(item: &Item) -> Json {
    match item {
        Item::Value(scalar) => scalar_to_json(scalar),
        Item::Reference(path) => json!({"type": "ref", "path": format_json_pointer(path)}),
        Item::Object(fields) => {
            let fields: Map<String, Json> = fields
                .iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect();
            json!({"type": "object", "fields": fields})
        }
        Item::Array(items) => {
            let items: Vec<Json> = items.iter().map(to_json).collect();
            json!({"type": "array", "items": items})
        }
        Item::Function(inner) => json!({"type": "function", "inner": to_json(inner)}),
        Item::Symbol(description) => json!({"type": "symbol", "description": description}),
        Item::TypedState { type_id, state } => {
            json!({"type": "typed", "typeId": type_id, "state": to_json(state)})
        }
    }
}

fn scalar_to_json(scalar: &Scalar) -> Json {
    match scalar {
        Scalar::Undefined => json!({"type": "value"}),
        Scalar::Null => json!({"type": "value", "value": null}),
        Scalar::Bool(b) => json!({"type": "value", "value": b}),
        Scalar::String(s) => json!({"type": "value", "value": s}),
        Scalar::Number(n) => match number_to_json(*n) {
            Some(num) => json!({"type": "value", "value": num}),
            None => json!({"type": "value", "number": non_finite_name(*n)}),
        },
    }
}

// Integral values are written without a fraction; -0 keeps its sign.
fn number_to_json(n: f64) -> Option<Number> {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE && !(n == 0.0 && n.is_sign_negative()) {
        return Some(Number::from(n as i64));
    }
    Number::from_f64(n)
}

fn non_finite_name(n: f64) -> &'static str {
    if n.is_nan() {
        "NaN"
    } else if n > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    }
}

/// Parses an item from its tagged JSON form.
///
/// # Errors
///
/// Returns [`GraphError::MalformedItem`] for any shape that is not one of
/// the tagged forms, including invalid reference pointers.
pub fn from_json(json: &Json) -> Result<Item, GraphError> {
    let obj = json
        .as_object()
        .ok_or_else(|| GraphError::malformed(format!("expected tagged object, got {json}")))?;
    let tag = obj
        .get("type")
        .and_then(Json::as_str)
        .ok_or_else(|| GraphError::malformed("missing \"type\" tag"))?;

    match tag {
        "value" => scalar_from_json(obj),
        "ref" => {
            let pointer = field(obj, "path")?
                .as_str()
                .ok_or_else(|| GraphError::malformed("reference path must be a string"))?;
            Ok(Item::Reference(parse_json_pointer(pointer)?))
        }
        "object" => {
            let fields = field(obj, "fields")?
                .as_object()
                .ok_or_else(|| GraphError::malformed("object fields must be an object"))?;
            let fields = fields
                .iter()
                .map(|(k, v)| -> Result<(String, Item), GraphError> {
                    Ok((k.clone(), from_json(v)?))
                })
                .collect::<Result<IndexMap<_, _>, _>>()?;
            Ok(Item::Object(fields))
        }
        "array" => {
            let items = field(obj, "items")?
                .as_array()
                .ok_or_else(|| GraphError::malformed("array items must be an array"))?;
            let items = items.iter().map(from_json).collect::<Result<_, _>>()?;
            Ok(Item::Array(items))
        }
        "function" => Ok(Item::Function(Box::new(from_json(field(obj, "inner")?)?))),
        "symbol" => {
            let description = field(obj, "description")?
                .as_str()
                .ok_or_else(|| GraphError::malformed("symbol description must be a string"))?;
            Ok(Item::Symbol(description.to_string()))
        }
        "typed" => {
            let type_id = field(obj, "typeId")?
                .as_str()
                .ok_or_else(|| GraphError::malformed("typeId must be a string"))?;
            let state = from_json(field(obj, "state")?)?;
            Ok(Item::TypedState {
                type_id: type_id.to_string(),
                state: Box::new(state),
            })
        }
        other => Err(GraphError::malformed(format!("unknown item type \"{other}\""))),
    }
}

fn scalar_from_json(obj: &Map<String, Json>) -> Result<Item, GraphError> {
    if let Some(name) = obj.get("number") {
        let n = match name.as_str() {
            Some("NaN") => f64::NAN,
            Some("Infinity") => f64::INFINITY,
            Some("-Infinity") => f64::NEG_INFINITY,
            _ => return Err(GraphError::malformed(format!("unknown number {name}"))),
        };
        return Ok(Item::Value(Scalar::Number(n)));
    }
    let scalar = match obj.get("value") {
        None => Scalar::Undefined,
        Some(Json::Null) => Scalar::Null,
        Some(Json::Bool(b)) => Scalar::Bool(*b),
        Some(Json::String(s)) => Scalar::String(s.clone()),
        Some(Json::Number(n)) => Scalar::Number(
            n.as_f64()
                .ok_or_else(|| GraphError::malformed(format!("number out of range: {n}")))?,
        ),
        Some(other) => {
            return Err(GraphError::malformed(format!(
                "value must be a primitive, got {other}"
            )))
        }
    };
    Ok(Item::Value(scalar))
}

fn field<'a>(obj: &'a Map<String, Json>, key: &str) -> Result<&'a Json, GraphError> {
    obj.get(key)
        .ok_or_else(|| GraphError::malformed(format!("missing \"{key}\"")))
}
