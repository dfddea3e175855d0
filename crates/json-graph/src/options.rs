//! Engine options and the pluggable function/symbol converters.

use crate::codec::{JsonCodec, TextCodec};
use crate::error::GraphError;
use crate::value::{Function, Symbol, Value};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Reduces callables to a normalizable state and back.
pub trait FunctionConverter: Send + Sync {
    fn extract_state(&self, function: &Function) -> Result<Value, GraphError>;
    fn instantiate(&self, state: Value) -> Result<Function, GraphError>;
}

/// Reduces symbols to a descriptor string and back.
pub trait SymbolConverter: Send + Sync {
    fn extract_state(&self, symbol: &Symbol) -> Result<String, GraphError>;
    fn instantiate(&self, description: &str) -> Result<Symbol, GraphError>;
}

/// Default function converter: keeps the source text only.
///
/// Rebuilt functions are stand-ins that return `Undefined`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceFunctionConverter;

impl FunctionConverter for SourceFunctionConverter {
    fn extract_state(&self, function: &Function) -> Result<Value, GraphError> {
        Ok(Value::String(function.source().to_string()))
    }

    fn instantiate(&self, state: Value) -> Result<Function, GraphError> {
        match state {
            Value::String(source) => Ok(Function::stand_in(source)),
            other => Err(GraphError::converter(
                "function",
                format!("expected source string, got {}", other.kind()),
            )),
        }
    }
}

/// Default symbol converter: keeps the description; every rebuilt symbol is
/// a fresh one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptionSymbolConverter;

impl SymbolConverter for DescriptionSymbolConverter {
    fn extract_state(&self, symbol: &Symbol) -> Result<String, GraphError> {
        Ok(symbol.description().to_string())
    }

    fn instantiate(&self, description: &str) -> Result<Symbol, GraphError> {
        Ok(Symbol::new(description))
    }
}

/// Options held by an [`Engine`](crate::Engine).
#[derive(Clone)]
pub struct Options {
    /// Fail on any cycle or shared composite instead of emitting references.
    pub no_refs: bool,
    pub function_converter: Arc<dyn FunctionConverter>,
    pub symbol_converter: Arc<dyn SymbolConverter>,
    pub text_codec: Arc<dyn TextCodec>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            no_refs: false,
            function_converter: Arc::new(SourceFunctionConverter),
            symbol_converter: Arc::new(DescriptionSymbolConverter),
            text_codec: Arc::new(JsonCodec::default()),
        }
    }
}

impl Options {
    /// Returns a copy of `self` with every field set in `patch` replaced.
    pub fn apply(&self, patch: OptionsPatch) -> Options {
        Options {
            no_refs: patch.no_refs.unwrap_or(self.no_refs),
            function_converter: patch
                .function_converter
                .unwrap_or_else(|| Arc::clone(&self.function_converter)),
            symbol_converter: patch
                .symbol_converter
                .unwrap_or_else(|| Arc::clone(&self.symbol_converter)),
            text_codec: patch
                .text_codec
                .unwrap_or_else(|| Arc::clone(&self.text_codec)),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("no_refs", &self.no_refs)
            .finish_non_exhaustive()
    }
}

/// A partial update of [`Options`]; omitted fields keep their value.
///
/// Deserializes from camelCase JSON, ignoring unknown keys:
///
/// ```
/// use json_graph::OptionsPatch;
///
/// let patch: OptionsPatch = serde_json::from_str(r#"{"noRefs": true, "other": 1}"#).unwrap();
/// assert_eq!(patch.no_refs, Some(true));
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsPatch {
    pub no_refs: Option<bool>,
    #[serde(skip)]
    pub function_converter: Option<Arc<dyn FunctionConverter>>,
    #[serde(skip)]
    pub symbol_converter: Option<Arc<dyn SymbolConverter>>,
    #[serde(skip)]
    pub text_codec: Option<Arc<dyn TextCodec>>,
}

impl OptionsPatch {
    pub fn new() -> Self {
        OptionsPatch::default()
    }

    pub fn no_refs(mut self, no_refs: bool) -> Self {
        self.no_refs = Some(no_refs);
        self
    }

    pub fn function_converter(mut self, conv: impl FunctionConverter + 'static) -> Self {
        self.function_converter = Some(Arc::new(conv));
        self
    }

    pub fn symbol_converter(mut self, conv: impl SymbolConverter + 'static) -> Self {
        self.symbol_converter = Some(Arc::new(conv));
        self
    }

    pub fn text_codec(mut self, codec: impl TextCodec + 'static) -> Self {
        self.text_codec = Some(Arc::new(codec));
        self
    }
}

impl fmt::Debug for OptionsPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionsPatch")
            .field("no_refs", &self.no_refs)
            .field("function_converter", &self.function_converter.is_some())
            .field("symbol_converter", &self.symbol_converter.is_some())
            .field("text_codec", &self.text_codec.is_some())
            .finish()
    }
}
