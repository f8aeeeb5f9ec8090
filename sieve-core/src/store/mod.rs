//! Store and Subscriptions
//!
//! This module holds the state container and the machinery that decides who
//! hears about a change.
//!
//! # Concepts
//!
//! ## Actions and the reducer
//!
//! State only changes through [`dispatch`](Store::dispatch). The dispatched
//! updater is wrapped in an [`Action`] and handed to [`reduce`], which runs it
//! against a copy-on-write [`Draft`](crate::Draft) and returns the next tree.
//!
//! ## Subscribers
//!
//! A subscriber is a callback plus, optionally, a list of dependency paths.
//! Without paths it hears about every dispatch. With paths it hears about a
//! dispatch only if one of those paths now resolves to a different value.
//!
//! ## Dependency tracking
//!
//! The [`DependencyTracker`] keeps each scoped subscriber's last observed
//! values. After every cycle the snapshot is overwritten with what was just
//! observed, whether or not the subscriber was called, so the baseline is
//! always the latest state rather than the last state that triggered a call.

mod action;
mod reducer;
mod subscriber;
mod tracker;
mod diff;
#[allow(clippy::module_inception)]
mod store;

pub use action::{Action, UpdateOutcome, Updater};
pub use reducer::reduce;
pub use subscriber::{SharedPaths, Subscriber, SubscriberId, Subscription, SubscriptionGuard};
pub use tracker::{DependencyTracker, Snapshot};
pub use diff::{compute_diff, resolve_all, Diff};
pub use store::{create_store, Store};
pub(crate) use store::StoreInner;
