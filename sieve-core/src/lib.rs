//! Sieve Core
//!
//! A small state container that only wakes the subscribers whose data
//! actually changed. It provides:
//!
//! - A persistent state tree with copy-on-write drafts
//! - A reducer that applies draft-style updaters
//! - A store with synchronous, ordered listener notification
//! - Dependency-scoped subscriptions diffed by shallow identity
//! - Mount/unmount hooks for view layers
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `state`: The value tree, dependency paths, and drafts
//! - `store`: Actions, the reducer, the store, and dependency tracking
//! - `view`: Hooks that adapt a store to a render lifecycle
//! - `config`: Store configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use sieve_core::Store;
//!
//! let store = Store::new(json!({ "a": { "b": 1 }, "c": 0 }));
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let calls_clone = calls.clone();
//! let _sub = store.subscribe_with_deps(
//!     move |_| {
//!         calls_clone.fetch_add(1, Ordering::SeqCst);
//!     },
//!     ["a.b"],
//! );
//!
//! store.dispatch(|draft| draft.set("c", 1)).unwrap();
//! assert_eq!(calls.load(Ordering::SeqCst), 0);
//!
//! store.dispatch(|draft| draft.set("a.b", 2)).unwrap();
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//! ```

pub mod config;
pub mod error;
pub mod state;
pub mod store;
pub mod view;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult, UpdaterError};
pub use state::{DependencyPath, Draft, Map, Value};
pub use store::{create_store, Action, Store, Subscription, SubscriptionGuard, UpdateOutcome};
pub use view::{Dispatcher, StateHook};
