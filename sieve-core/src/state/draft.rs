//! Copy-on-Write Drafts
//!
//! A [`Draft`] is the mutable view an updater works on. It starts out as a
//! clone of the current root, which costs one reference count. Writes
//! descend with `Arc::make_mut`: a node that is still shared with the
//! committed state is cloned (shallowly) before it is modified, a node that
//! was already cloned by an earlier write is modified in place.
//!
//! The result is a new tree in which only the nodes on written paths are new
//! allocations. Everything else is shared with the previous state, which is
//! exactly what identity-based change detection relies on.

use std::sync::Arc;

use super::{DependencyPath, Map, Value};

/// Mutable, copy-on-write view over a state tree.
#[derive(Debug, Clone)]
pub struct Draft {
    base: Value,
    root: Value,
}

impl Draft {
    /// Start a draft from `base`.
    pub fn new(base: &Value) -> Self {
        Self {
            base: base.clone(),
            root: base.clone(),
        }
    }

    /// The current root, including any writes made so far.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Direct mutable access to the root.
    ///
    /// Writing through this reference skips the no-op detection that
    /// [`set`](Self::set) performs.
    pub fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    /// Replace the whole tree.
    pub fn replace(&mut self, value: impl Into<Value>) {
        self.root = value.into();
    }

    /// Whether the root differs (by identity) from the base.
    pub fn is_modified(&self) -> bool {
        !self.root.strict_eq(&self.base)
    }

    /// Read the value at `path` without copying anything.
    ///
    /// Unlike dependency resolution this is a plain structural walk: it only
    /// fails where a key is actually missing.
    pub fn get(&self, path: impl Into<DependencyPath>) -> Option<&Value> {
        let path = path.into();
        path.segments()
            .iter()
            .try_fold(&self.root, |node, segment| node.get(segment))
    }

    /// Mutable access to an existing value.
    ///
    /// Every node on the path is detached from the committed state, so only
    /// call this when you intend to write.
    pub fn get_mut(&mut self, path: impl Into<DependencyPath>) -> Option<&mut Value> {
        let path = path.into();
        self.get(&path)?;
        let mut current = &mut self.root;
        for segment in path.segments() {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }

    /// Write `value` at `path`, creating intermediate maps as needed.
    ///
    /// Intermediate scalars are replaced by empty maps. A numeric segment
    /// into a list writes that index, padding the list with nulls when the
    /// index is past the end. A non-numeric segment turns the list into a map
    /// keyed by index, keeping its elements. Writing a value strictly equal to the current one is
    /// a no-op and keeps the tree's identity.
    pub fn set(&mut self, path: impl Into<DependencyPath>, value: impl Into<Value>) {
        let path = path.into();
        let value = value.into();
        if self.get(&path).is_some_and(|current| current.strict_eq(&value)) {
            return;
        }
        let mut current = &mut self.root;
        for segment in path.segments() {
            current = descend_or_create(current, segment);
        }
        *current = value;
    }

    /// Apply `f` to the value at `path`. Returns `false` if the path is
    /// missing, in which case nothing is copied.
    pub fn update<F>(&mut self, path: impl Into<DependencyPath>, f: F) -> bool
    where
        F: FnOnce(&mut Value),
    {
        match self.get_mut(path) {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }

    /// Remove and return the value at `path`.
    pub fn remove(&mut self, path: impl Into<DependencyPath>) -> Option<Value> {
        let path = path.into();
        self.get(&path)?;
        let (last, parents) = path.segments().split_last()?;
        let mut parent = &mut self.root;
        for segment in parents {
            parent = parent.child_mut(segment)?;
        }
        match parent {
            Value::Map(map) => Arc::make_mut(map).shift_remove(last.as_str()),
            Value::List(list) => {
                let index = last.parse::<usize>().ok()?;
                Some(Arc::make_mut(list).remove(index))
            }
            _ => None,
        }
    }

    /// Append to the list at `path`. A missing or non-list target becomes a
    /// one-element list.
    pub fn push(&mut self, path: impl Into<DependencyPath>, value: impl Into<Value>) {
        let path = path.into();
        let value = value.into();
        let mut current = &mut self.root;
        for segment in path.segments() {
            current = descend_or_create(current, segment);
        }
        match current {
            Value::List(list) => Arc::make_mut(list).push(value),
            other => *other = Value::List(Arc::new(vec![value])),
        }
    }

    /// Consume the draft and return the new root.
    pub fn finish(self) -> Value {
        self.root
    }
}

/// Step into `key` below `node`, making room for it if necessary.
fn descend_or_create<'a>(node: &'a mut Value, key: &str) -> &'a mut Value {
    let list_slot = match &*node {
        Value::List(_) => key.parse::<usize>().ok(),
        _ => None,
    };
    match (node, list_slot) {
        (Value::List(list), Some(index)) => {
            let list = Arc::make_mut(list);
            if index >= list.len() {
                list.resize(index + 1, Value::Null);
            }
            &mut list[index]
        }
        (node, _) => ensure_map(node)
            .entry(key.to_owned())
            .or_insert(Value::Null),
    }
}

/// Make `node` a map. Lists keep their elements under their index keys;
/// scalars are dropped.
fn ensure_map(node: &mut Value) -> &mut Map {
    match node {
        Value::Map(_) => {}
        Value::List(list) => {
            let map: Map = list
                .iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item.clone()))
                .collect();
            *node = Value::from(map);
        }
        _ => *node = Value::empty_map(),
    }
    match node {
        Value::Map(map) => Arc::make_mut(map),
        _ => unreachable!("non-map node was replaced above"),
    }
}
