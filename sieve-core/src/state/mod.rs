//! State Tree
//!
//! The state a store holds is a persistent tree of [`Value`]s. Containers are
//! reference counted and never mutated in place once committed; updates go
//! through a copy-on-write [`Draft`] that produces a new root sharing every
//! untouched subtree with the old one.
//!
//! Subscribers point into the tree with [`DependencyPath`]s.

mod value;
mod path;
mod draft;

pub use value::{Map, Value};
pub use path::{paths, DependencyPath};
pub use draft::Draft;
