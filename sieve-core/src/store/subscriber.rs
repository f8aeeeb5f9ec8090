//! Subscriber types for the store.
//!
//! A Subscriber is one registration of a change handler: the callback, a
//! unique identity, and the dependency paths (if any) that scope it. The
//! caller gets back a [`Subscription`] handle to end the registration.

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::state::{DependencyPath, Value};

use super::store::StoreInner;

/// Dependency paths that can be swapped out while a subscription is live.
pub type SharedPaths = Arc<RwLock<Vec<DependencyPath>>>;

/// Identity of one registration in a store's listener list.
///
/// Every registration gets a fresh ID, even when the same closure is
/// subscribed twice. The ID is the key of its dependency snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Issue the next registration ID. IDs are process-wide, so they never
    /// collide between stores.
    pub(crate) fn next() -> Self {
        static NEXT_REGISTRATION: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_REGISTRATION.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which paths scope a subscriber.
pub(crate) enum Dependencies {
    /// Notified on every dispatch.
    Always,
    /// Fixed when subscribing.
    Fixed(Vec<DependencyPath>),
    /// Re-read on every dispatch.
    Shared(SharedPaths),
}

/// A registered change handler.
pub struct Subscriber {
    id: SubscriberId,
    /// The callback to invoke with the new state.
    notify: Box<dyn Fn(&Value) + Send + Sync>,
    deps: Dependencies,
}

impl Subscriber {
    pub(crate) fn new<F>(notify: F, deps: Dependencies) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        Self {
            id: SubscriberId::next(),
            notify: Box::new(notify),
            deps,
        }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Invoke the callback.
    pub fn notify(&self, state: &Value) {
        (self.notify)(state);
    }

    /// The paths to diff on this cycle. `None` or an empty list means the
    /// subscriber is notified unconditionally.
    pub(crate) fn paths(&self) -> Option<Cow<'_, [DependencyPath]>> {
        match &self.deps {
            Dependencies::Always => None,
            Dependencies::Fixed(paths) => Some(Cow::Borrowed(paths.as_slice())),
            Dependencies::Shared(paths) => Some(Cow::Owned(paths.read().clone())),
        }
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

/// Handle to a registration.
///
/// Dropping a `Subscription` does *not* unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe), or convert it with
/// [`into_guard`](Self::into_guard) to tie the registration to a scope.
#[derive(Clone)]
#[must_use = "the listener stays registered until `unsubscribe` is called"]
pub struct Subscription {
    id: SubscriberId,
    store: Weak<StoreInner>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriberId, store: Weak<StoreInner>) -> Self {
        Self { id, store }
    }

    /// ID of the underlying subscriber.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove the listener. Only the first call has an effect; later calls
    /// and calls after the store is gone return `false`.
    ///
    /// A notification cycle already in progress still reaches the listener.
    pub fn unsubscribe(&self) -> bool {
        self.store
            .upgrade()
            .is_some_and(|store| store.unsubscribe(self.id))
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        self.store
            .upgrade()
            .is_some_and(|store| store.is_subscribed(self.id))
    }

    /// Unsubscribe automatically when the returned guard is dropped.
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard { subscription: self }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Scope guard that unsubscribes when dropped.
#[derive(Debug)]
pub struct SubscriptionGuard {
    subscription: Subscription,
}

impl SubscriptionGuard {
    /// The guarded subscription.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}
