//! Deferred fixups recorded while denormalizing.

use json_graph_pointer::{depth, format_json_pointer, Path};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

/// A fixup to run once the skeleton graph has been built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Copy the value found at `source` into the slot at `target`.
    Reference { target: Path, source: Path },
    /// Replace the value at `path` with the instance the converter for
    /// `type_id` builds from it.
    Conversion { type_id: String, path: Path },
}

impl Action {
    /// Depth used for ordering: the source path of a reference, the
    /// converted path of a conversion.
    pub fn depth(&self) -> usize {
        match self {
            Action::Reference { source, .. } => depth(source),
            Action::Conversion { path, .. } => depth(path),
        }
    }

    // Preference only; `sort_actions` overrides it where paths overlap.
    fn rank(&self) -> u8 {
        match self {
            Action::Conversion { .. } => 0,
            Action::Reference { .. } => 1,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Reference { target, source } => write!(
                f,
                "ref \"{}\" <- \"{}\"",
                format_json_pointer(target),
                format_json_pointer(source)
            ),
            Action::Conversion { type_id, path } => {
                write!(f, "convert {} at \"{}\"", type_id, format_json_pointer(path))
            }
        }
    }
}

/// Base application order: deepest first, conversions ahead of references
/// at equal depth, otherwise recording order.
pub fn compare(a: &Action, b: &Action) -> Ordering {
    b.depth()
        .cmp(&a.depth())
        .then_with(|| a.rank().cmp(&b.rank()))
}

fn conversions_at<'a>(
    by_path: &'a HashMap<&[String], Vec<usize>>,
    path: &[String],
) -> &'a [usize] {
    by_path.get(path).map(Vec::as_slice).unwrap_or_default()
}

/// Sorts `actions` in application order.
///
/// Actions follow [`compare`] except where their paths overlap:
///
/// - A conversion runs after the conversions nested below its path. Two
///   conversions at the same path run in reverse recording order, inner
///   state first.
/// - A reference runs after the conversion at its source, so it copies the
///   instance rather than its state.
/// - A reference runs before a conversion whose path contains its target,
///   so the converter reads the filled-in state. A conversion at or below
///   the source is exempt; that target is a cycle and is reached through
///   the converted instance.
/// - A reference runs before a conversion strictly above its source, so
///   the source is still read from the unconverted state.
///
/// Actions caught in a cycle of these constraints keep the base order.
pub fn sort_actions(actions: &mut [Action]) {
    let count = actions.len();
    let mut base: Vec<usize> = (0..count).collect();
    base.sort_by(|&a, &b| compare(&actions[a], &actions[b]));
    let mut position = vec![0; count];
    for (at, &index) in base.iter().enumerate() {
        position[index] = at;
    }

    let mut by_path: HashMap<&[String], Vec<usize>> = HashMap::new();
    for (index, action) in actions.iter().enumerate() {
        if let Action::Conversion { path, .. } = action {
            by_path.entry(path.as_slice()).or_default().push(index);
        }
    }

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut blockers = vec![0usize; count];
    let mut link = |before: usize, after: usize| {
        successors[before].push(after);
        blockers[after] += 1;
    };
    for (index, action) in actions.iter().enumerate() {
        match action {
            Action::Conversion { path, .. } => {
                for &other in conversions_at(&by_path, path) {
                    if other > index {
                        link(other, index);
                    }
                }
                for len in 0..path.len() {
                    for &outer in conversions_at(&by_path, &path[..len]) {
                        link(index, outer);
                    }
                }
            }
            Action::Reference { target, source } => {
                for &conversion in conversions_at(&by_path, source) {
                    link(conversion, index);
                }
                for len in 0..source.len() {
                    for &outer in conversions_at(&by_path, &source[..len]) {
                        link(index, outer);
                    }
                }
                for len in 0..=target.len() {
                    let prefix = &target[..len];
                    if prefix.starts_with(source) {
                        continue;
                    }
                    for &outer in conversions_at(&by_path, prefix) {
                        link(index, outer);
                    }
                }
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..count)
        .filter(|&index| blockers[index] == 0)
        .map(|index| Reverse(position[index]))
        .collect();
    let mut placed = vec![false; count];
    let mut order = Vec::with_capacity(count);
    while let Some(Reverse(at)) = ready.pop() {
        let index = base[at];
        placed[index] = true;
        order.push(index);
        for &next in &successors[index] {
            blockers[next] -= 1;
            if blockers[next] == 0 {
                ready.push(Reverse(position[next]));
            }
        }
    }
    if order.len() < count {
        tracing::debug!(
            unordered = count - order.len(),
            "fixup constraints form a cycle; keeping depth order"
        );
        order.extend(base.iter().copied().filter(|&index| !placed[index]));
    }

    let ordered: Vec<Action> = order.iter().map(|&index| actions[index].clone()).collect();
    actions.clone_from_slice(&ordered);
}
