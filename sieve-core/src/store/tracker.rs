//! Dependency Tracker
//!
//! The tracker remembers, for every dependency-scoped subscriber, the values
//! its paths resolved to the last time it was considered. That snapshot is
//! the baseline for the next diff.
//!
//! # Ownership
//!
//! Each store owns exactly one tracker. Entries are keyed by
//! [`SubscriberId`] and hold only a `Weak` reference to the subscriber: the
//! store's listener list is what keeps a subscriber alive, never the
//! tracker. Entries whose subscriber is gone are swept by [`prune`].
//!
//! [`prune`]: DependencyTracker::prune

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use smallvec::SmallVec;

use crate::state::Value;

use super::subscriber::{Subscriber, SubscriberId};

/// Resolved dependency values, one per declared path, in path order.
/// `None` marks a path that resolved to undefined.
pub type Snapshot = SmallVec<[Option<Value>; 4]>;

struct TrackedEntry {
    subscriber: Weak<Subscriber>,
    snapshot: Option<Snapshot>,
}

/// Per-store map from subscriber to its last dependency snapshot.
#[derive(Default)]
pub struct DependencyTracker {
    entries: DashMap<SubscriberId, TrackedEntry>,
}

impl DependencyTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `subscriber` with an initial baseline.
    pub fn track(&self, subscriber: &Arc<Subscriber>, seed: Option<Snapshot>) {
        self.entries.insert(
            subscriber.id(),
            TrackedEntry {
                subscriber: Arc::downgrade(subscriber),
                snapshot: seed,
            },
        );
    }

    /// The last recorded snapshot for `id`, if any.
    pub fn snapshot(&self, id: SubscriberId) -> Option<Snapshot> {
        self.entries.get(&id).and_then(|entry| entry.snapshot.clone())
    }

    /// Overwrite the snapshot for `id`. Untracked IDs are ignored, so a
    /// subscriber that was removed mid-cycle is not brought back.
    pub fn record(&self, id: SubscriberId, snapshot: Snapshot) {
        if let Some(mut entry) = self.entries.get_mut(&id) {
            entry.snapshot = Some(snapshot);
        }
    }

    /// Stop tracking `id`.
    pub fn remove(&self, id: SubscriberId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Drop entries whose subscriber no longer exists. Returns how many were
    /// removed.
    pub fn prune(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.subscriber.strong_count() > 0);
        before - self.entries.len()
    }

    /// Whether `id` has an entry.
    pub fn is_tracked(&self, id: SubscriberId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of tracked subscribers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
