//! Type definitions for graph paths.

/// A step in a path.
///
/// Either a property name or a stringified array index.
pub type PathStep = String;

/// A path from the root of a tree to one of its slots.
pub type Path = Vec<PathStep>;

/// Depth of a path, i.e. the number of steps from the root.
///
/// # Example
///
/// ```
/// use json_graph_pointer::depth;
///
/// assert_eq!(depth(&[]), 0);
/// assert_eq!(depth(&["a".to_string(), "0".to_string()]), 2);
/// ```
pub fn depth(path: &[PathStep]) -> usize {
    path.len()
}
