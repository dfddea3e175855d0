use json_graph_pointer::PointerError;
use thiserror::Error;

/// Errors raised by the normalize/denormalize engine.
///
/// Every error aborts the whole top-level call; no partial tree or graph is
/// ever returned alongside one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A composite was visited twice while references are disabled.
    #[error("circular or shared reference at \"{pointer}\" (first seen at \"{canonical}\")")]
    CircularReference { pointer: String, canonical: String },

    #[error("unregistered type: {0}")]
    UnregisteredType(String),

    #[error("malformed item: {0}")]
    MalformedItem(String),

    #[error("duplicate converter for type: {0}")]
    DuplicateConverter(String),

    #[error("converter for {type_id} failed: {reason}")]
    Converter { type_id: String, reason: String },

    #[error("codec: {0}")]
    Codec(String),
}

impl GraphError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        GraphError::MalformedItem(reason.into())
    }

    pub(crate) fn converter(type_id: &str, reason: impl Into<String>) -> Self {
        GraphError::Converter {
            type_id: type_id.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<PointerError> for GraphError {
    fn from(err: PointerError) -> Self {
        GraphError::MalformedItem(err.to_string())
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(err: serde_json::Error) -> Self {
        GraphError::Codec(err.to_string())
    }
}
