//! Dependency Diffing
//!
//! Given the paths a subscriber declared and the values they resolved to
//! last time, decide whether anything changed. The comparison is shallow:
//! scalars by value, containers by identity (see [`Value::strict_eq`]).
//! A container that was copied on write counts as changed even if its
//! contents happen to match.

use crate::state::{DependencyPath, Value};

use super::tracker::Snapshot;

/// Outcome of one diff.
#[derive(Debug, Clone, PartialEq)]
pub struct Diff {
    /// At least one path resolved to a different value.
    pub changed: bool,
    /// Freshly resolved values for every path, to become the new baseline.
    pub values: Snapshot,
}

/// Resolve `paths` against `state` and compare with `last`.
///
/// A missing baseline (`None`) always counts as changed. Positions beyond
/// the end of a shorter baseline compare as undefined, so a path that still
/// resolves to undefined is not a change.
pub fn compute_diff(
    last: Option<&[Option<Value>]>,
    paths: &[DependencyPath],
    state: &Value,
) -> Diff {
    debug_assert!(!paths.is_empty(), "subscribers without paths skip diffing");

    let mut changed = last.is_none();
    let mut values = Snapshot::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        let current = path.resolve(state);
        let previous = last.and_then(|last| last.get(index)).and_then(Option::as_ref);
        if !same(current.as_ref(), previous) {
            changed = true;
        }
        values.push(current);
    }
    Diff { changed, values }
}

/// Resolve `paths` without comparing, for seeding a baseline.
pub fn resolve_all(paths: &[DependencyPath], state: &Value) -> Snapshot {
    paths.iter().map(|path| path.resolve(state)).collect()
}

fn same(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.strict_eq(b),
        _ => false,
    }
}
