//! Paths and JSON Pointer (RFC 6901) utilities for json-graph.
//!
//! A canonical path is an ordered list of steps (property names or
//! stringified array indices). Paths travel over the wire and show up in
//! error messages as [JSON Pointers](https://tools.ietf.org/html/rfc6901).
//!
//! # Example
//!
//! ```
//! use json_graph_pointer::{parse_json_pointer, format_json_pointer};
//!
//! let path = parse_json_pointer("/0/inner").unwrap();
//! assert_eq!(path, vec!["0".to_string(), "inner".to_string()]);
//! assert_eq!(format_json_pointer(&path), "/0/inner");
//! ```

use thiserror::Error;

pub mod types;
pub use types::{depth, Path, PathStep};

pub mod validate;
pub use validate::{validate_json_pointer, ValidationError};

/// Unescapes a JSON Pointer path component.
///
/// Per RFC 6901, `~1` is replaced with `/` and `~0` is replaced with `~`.
///
/// # Example
///
/// ```
/// use json_graph_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // Order matters: ~1 must be replaced before ~0
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a JSON Pointer path component.
///
/// Per RFC 6901, `/` is replaced with `~1` and `~` is replaced with `~0`.
///
/// # Example
///
/// ```
/// use json_graph_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    // Order matters: ~ must be escaped before /
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse a JSON Pointer string into a path.
///
/// The pointer is validated first; the empty string is the root path.
///
/// # Errors
///
/// Returns [`PointerError::Invalid`] if the pointer is not well formed.
pub fn parse_json_pointer(pointer: &str) -> Result<Path, PointerError> {
    validate_json_pointer(pointer)?;
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    Ok(pointer[1..].split('/').map(unescape_component).collect())
}

/// Format a path into a JSON Pointer string.
///
/// Returns an empty string for the root path.
///
/// # Example
///
/// ```
/// use json_graph_pointer::format_json_pointer;
///
/// assert_eq!(format_json_pointer(&[]), "");
/// assert_eq!(format_json_pointer(&["a/b".to_string(), "0".to_string()]), "/a~1b/0");
/// ```
pub fn format_json_pointer(path: &[String]) -> String {
    let mut out = String::new();
    for component in path {
        out.push('/');
        out.push_str(&escape_component(component));
    }
    out
}

/// Check if a path points to the root value.
pub fn is_root(path: &[String]) -> bool {
    path.is_empty()
}

/// Split a path into its parent path and final step.
///
/// # Errors
///
/// Returns [`PointerError::NoParent`] for the root path.
///
/// # Example
///
/// ```
/// use json_graph_pointer::split_last;
///
/// let path = vec!["a".to_string(), "b".to_string()];
/// let (parent, key) = split_last(&path).unwrap();
/// assert_eq!(parent, ["a".to_string()]);
/// assert_eq!(key, "b");
/// assert!(split_last(&[]).is_err());
/// ```
pub fn split_last(path: &[String]) -> Result<(&[String], &str), PointerError> {
    match path.split_last() {
        Some((last, parent)) => Ok((parent, last.as_str())),
        None => Err(PointerError::NoParent),
    }
}

/// Check if a string represents a valid non-negative integer array index.
///
/// Leading zeros are rejected, so every index has exactly one spelling.
///
/// # Example
///
/// ```
/// use json_graph_pointer::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("123"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("-1"));
/// ```
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

/// Parse an array index step.
///
/// # Errors
///
/// Returns [`PointerError::InvalidIndex`] if `step` is not a canonical index.
pub fn parse_index(step: &str) -> Result<usize, PointerError> {
    if !is_valid_index(step) {
        return Err(PointerError::InvalidIndex(step.to_string()));
    }
    step.parse()
        .map_err(|_| PointerError::InvalidIndex(step.to_string()))
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("INVALID_INDEX: {0}")]
    InvalidIndex(String),
    #[error("NO_PARENT")]
    NoParent,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}
