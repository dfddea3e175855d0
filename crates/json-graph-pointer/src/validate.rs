//! Validation functions for pointers received from the wire.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("POINTER_INVALID")]
    PointerInvalid,
    #[error("INVALID_ESCAPE at byte {0}")]
    InvalidEscape(usize),
}

/// Validate a JSON Pointer string.
///
/// There is no length limit: canonical paths are as deep as the graph they
/// were taken from.
///
/// # Errors
///
/// Returns an error if:
/// - The pointer is non-empty but doesn't start with `/`
/// - The pointer contains a `~` not followed by `0` or `1`
///
/// # Example
///
/// ```
/// use json_graph_pointer::validate_json_pointer;
///
/// validate_json_pointer("").unwrap();  // Root is valid
/// validate_json_pointer("/foo/0").unwrap();
/// validate_json_pointer("foo").unwrap_err();  // Missing leading /
/// validate_json_pointer("/a~2").unwrap_err();  // Bad escape
/// ```
pub fn validate_json_pointer(pointer: &str) -> Result<(), ValidationError> {
    if pointer.is_empty() {
        return Ok(());
    }
    if !pointer.starts_with('/') {
        return Err(ValidationError::PointerInvalid);
    }
    let bytes = pointer.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'~' && !matches!(bytes.get(i + 1), Some(b'0') | Some(b'1')) {
            return Err(ValidationError::InvalidEscape(i));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_pointer() {
        assert!(validate_json_pointer("").is_ok());
    }

    #[test]
    fn test_validate_absolute_pointer() {
        assert!(validate_json_pointer("/").is_ok());
        assert!(validate_json_pointer("/foo").is_ok());
        assert!(validate_json_pointer("/foo/~0~1").is_ok());
    }

    #[test]
    fn test_validate_relative_pointer() {
        assert_eq!(
            validate_json_pointer("foo/bar"),
            Err(ValidationError::PointerInvalid)
        );
    }

    #[test]
    fn test_validate_dangling_tilde() {
        assert_eq!(
            validate_json_pointer("/a~"),
            Err(ValidationError::InvalidEscape(2))
        );
        assert_eq!(
            validate_json_pointer("/a~x"),
            Err(ValidationError::InvalidEscape(2))
        );
    }

    #[test]
    fn test_validate_deep_pointer() {
        let deep = "/0".repeat(5000);
        assert!(validate_json_pointer(&deep).is_ok());
    }
}
