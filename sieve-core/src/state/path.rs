//! Dependency Paths
//!
//! A dependency path is a dot-separated list of keys (`"todos.0.done"`)
//! naming one location in the state tree. Subscribers declare the paths they
//! care about and are only notified when the value at one of them changes.
//!
//! # Resolution
//!
//! Resolution walks the keys one at a time. If the value reached at any
//! intermediate step is missing, falsy, or a scalar, the walk stops and the
//! path resolves to `None` ("undefined"). It never fails: a path into a
//! `0` or a `null` is simply undefined.

use std::fmt;
use std::str::FromStr;

use super::Value;

/// A parsed dot-separated path into the state tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyPath {
    raw: String,
    segments: Vec<String>,
}

impl DependencyPath {
    /// Parse a dotted path. Every segment is kept verbatim, empty ones
    /// included.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = raw.split('.').map(str::to_owned).collect();
        Self { raw, segments }
    }

    /// The path as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The individual keys.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolve this path against a state tree.
    ///
    /// The returned value is a cheap clone that shares identity with the
    /// node in `root`.
    ///
    /// Only falsy *intermediate* nodes short-circuit to `None`; a falsy leaf
    /// such as `0` or `false` resolves to itself. Lookups that test
    /// `!obj[key]` at every step, as `getDepValue`-style helpers do, drop
    /// falsy leaves too; under those `0 -> false` or `null -> 0` is not a
    /// change, while here it is.
    pub fn resolve(&self, root: &Value) -> Option<Value> {
        let mut current = root;
        for segment in &self.segments {
            if !current.is_truthy() {
                return None;
            }
            current = current.get(segment)?;
        }
        Some(current.clone())
    }
}

impl fmt::Display for DependencyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for DependencyPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for DependencyPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for DependencyPath {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}

impl From<&String> for DependencyPath {
    fn from(raw: &String) -> Self {
        Self::parse(raw.as_str())
    }
}

impl From<&DependencyPath> for DependencyPath {
    fn from(path: &DependencyPath) -> Self {
        path.clone()
    }
}

/// Parse a list of paths.
pub fn paths<I, P>(raw: I) -> Vec<DependencyPath>
where
    I: IntoIterator<Item = P>,
    P: Into<DependencyPath>,
{
    raw.into_iter().map(Into::into).collect()
}
