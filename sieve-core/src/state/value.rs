//! State Tree Values
//!
//! A [`Value`] is a persistent, immutable tree. Containers (maps and lists)
//! live behind an `Arc`, so cloning a value is O(1) and two clones of the
//! same container are *the same node*. That identity is what change
//! detection compares: containers are equal only when they are literally the
//! same allocation, scalars are equal when their contents match.
//!
//! # Structural Sharing
//!
//! Mutation goes through [`Draft`](super::Draft), which uses
//! `Arc::make_mut` to clone only the nodes along a written path. Every
//! subtree the write did not touch keeps its allocation, and therefore its
//! identity, in the new tree.
//!
//! # Undefined
//!
//! There is no `Undefined` variant. Anything that may fail to resolve
//! returns `Option<Value>`, with `None` standing in for "undefined".

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Ordered string-keyed map used for object nodes.
pub type Map = IndexMap<String, Value>;

/// A node in the state tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Explicit null. Also the initial state of a store created without one.
    #[default]
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Numeric scalar.
    Number(f64),
    /// String scalar. Compared by content, never by identity.
    String(Arc<str>),
    /// Ordered list of values.
    List(Arc<Vec<Value>>),
    /// Ordered mapping from string keys to values.
    Map(Arc<Map>),
}

impl Value {
    /// An empty map node.
    pub fn empty_map() -> Self {
        Value::Map(Arc::new(Map::new()))
    }

    /// An empty list node.
    pub fn empty_list() -> Self {
        Value::List(Arc::new(Vec::new()))
    }

    /// Short name of the variant, for logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Strict equality: scalars by value, containers by identity.
    ///
    /// `NaN` is never strictly equal to anything, itself included.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether this value counts as true in a boolean context.
    ///
    /// `null`, `false`, `0`, `NaN` and the empty string are falsy. Containers
    /// are always truthy, even when empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(_) | Value::Map(_) => true,
        }
    }

    /// Look up a direct child by key.
    ///
    /// Map nodes use the key as-is; list nodes parse it as an index. Scalars
    /// have no children.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            Value::List(list) => key.parse::<usize>().ok().and_then(|i| list.get(i)),
            _ => None,
        }
    }

    /// Mutable access to a direct child, cloning this node first if it is
    /// shared.
    pub(crate) fn child_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self {
            Value::Map(map) => Arc::make_mut(map).get_mut(key),
            Value::List(list) => {
                let index = key.parse::<usize>().ok()?;
                Arc::make_mut(list).get_mut(index)
            }
            _ => None,
        }
    }

    /// Returns the numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the numeric value truncated to `i64`, if this is a number.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_f64().map(|n| n as i64)
    }

    /// Returns the boolean value, if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Returns the map, if this is a map node.
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map.as_ref()),
            _ => None,
        }
    }

    /// Returns the list, if this is a list node.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(list) => Some(list.as_slice()),
            _ => None,
        }
    }

    /// Whether this is `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert to a `serde_json::Value`. Non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) if is_integral(*n) => serde_json::Value::from(*n as i64),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::List(list) => serde_json::Value::Array(list.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// Whole numbers that fit an `i64` are written as integers.
fn is_integral(n: f64) -> bool {
    n.fract() == 0.0 && n.abs() < i64::MAX as f64
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

// ----------------------------------------------------------------------------
// Conversions
// ----------------------------------------------------------------------------

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.into()),
            serde_json::Value::Array(items) => {
                Value::List(Arc::new(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(entries) => Value::Map(Arc::new(
                entries.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            )),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(Arc::new(map))
    }
}

impl From<Vec<Value>> for Value {
    fn from(list: Vec<Value>) -> Self {
        Value::List(Arc::new(list))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(Arc::new(
            iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ))
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::List(Arc::new(iter.into_iter().collect()))
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if is_integral(*n) => serializer.serialize_i64(*n as i64),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for item in list.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clone_shares_container_identity() {
        let a = Value::from(json!({ "x": { "y": 1 } }));
        let b = a.clone();
        assert!(a.strict_eq(&b));
    }

    #[test]
    fn structurally_equal_containers_are_not_strictly_equal() {
        let a = Value::from(json!({ "x": 1 }));
        let b = Value::from(json!({ "x": 1 }));
        assert_eq!(a, b);
        assert!(!a.strict_eq(&b));
    }

    #[test]
    fn scalars_compare_by_value() {
        assert!(Value::from(3).strict_eq(&Value::from(3.0)));
        assert!(Value::from("hi").strict_eq(&Value::from(String::from("hi"))));
        assert!(!Value::from(0).strict_eq(&Value::from(false)));
        assert!(Value::Null.strict_eq(&Value::Null));
    }

    #[test]
    fn nan_is_never_strictly_equal() {
        let nan = Value::Number(f64::NAN);
        assert!(!nan.strict_eq(&nan.clone()));
    }

    #[test]
    fn truthiness() {
        for falsy in [
            Value::Null,
            Value::from(false),
            Value::from(0),
            Value::Number(f64::NAN),
            Value::from(""),
        ] {
            assert!(!falsy.is_truthy(), "{falsy:?} should be falsy");
        }
        for truthy in [
            Value::from(true),
            Value::from(-1),
            Value::from("0"),
            Value::empty_map(),
            Value::empty_list(),
        ] {
            assert!(truthy.is_truthy(), "{truthy:?} should be truthy");
        }
    }

    #[test]
    fn get_indexes_maps_and_lists() {
        let v = Value::from(json!({ "items": [10, 20, 30] }));
        let items = v.get("items").unwrap();
        assert_eq!(items.get("1"), Some(&Value::from(20)));
        assert_eq!(items.get("3"), None);
        assert_eq!(items.get("x"), None);
        assert_eq!(Value::from(5).get("a"), None);
    }

    #[test]
    fn json_round_trip_preserves_key_order() {
        let v = Value::from(json!({ "b": 1, "a": [true, null, "s"] }));
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"b":1,"a":[true,null,"s"]}"#);
        let back: Value = serde_json::from_str(r#"{"b":1.5}"#).unwrap();
        assert_eq!(back.get("b").and_then(Value::as_f64), Some(1.5));
    }

    #[test]
    fn from_iterator_builds_maps() {
        let v: Value = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(v.get("b").and_then(Value::as_i64), Some(2));
        assert_eq!(v.kind(), "map");
    }
}
