//! Store Implementation
//!
//! A [`Store`] holds the current state tree, applies dispatched updaters
//! through [`reduce`](super::reduce), and fans the new state out to its
//! subscribers.
//!
//! # Dispatch Cycle
//!
//! 1. The updater runs against a draft of the current state. No lock is
//!    held while it runs.
//!
//! 2. The resulting tree replaces the state.
//!
//! 3. Every subscriber registered when the cycle starts is considered, in
//!    registration order. Plain subscribers are always called. Scoped
//!    subscribers are diffed against their last snapshot and only called
//!    when a dependency changed; the snapshot is overwritten either way.
//!
//! # Reentrancy
//!
//! A dispatch issued from inside a listener, on the thread running the
//! cycle, does not nest. It is queued and applied, with its own full
//! notification cycle, once the running cycle completes. The queue is drained
//! by the outermost `dispatch` call, which also reports the first error any
//! queued updater produced. `max_queued_dispatches` bounds a single drain so
//! that listeners which keep dispatching cannot loop forever.
//!
//! A dispatch from any other thread waits until the running cycle and its
//! queue are done, then runs its own cycle. Its updater has been applied and
//! its error, if any, returned by the time `dispatch` returns.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, trace, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::state::{DependencyPath, Draft, Value};

use super::diff::{compute_diff, resolve_all};
use super::subscriber::{Dependencies, SharedPaths, Subscriber, SubscriberId, Subscription};
use super::tracker::{DependencyTracker, Snapshot};
use super::{reduce, Action, UpdateOutcome};

#[derive(Default)]
struct DispatchQueue {
    /// Thread running the current cycle, if any.
    owner: Option<ThreadId>,
    pending: VecDeque<Action>,
}

/// Shared store internals. Handles hold it strongly, subscriptions and
/// dispatchers weakly.
pub(crate) struct StoreInner {
    config: StoreConfig,
    state: RwLock<Value>,
    subscribers: RwLock<Vec<Arc<Subscriber>>>,
    tracker: DependencyTracker,
    queue: Mutex<DispatchQueue>,
    idle: Condvar,
}

/// A state container with dependency-scoped subscriptions.
///
/// `Store` is a cheap handle; clones refer to the same state. Every call to
/// [`Store::new`] creates an independent instance with its own subscribers
/// and tracker.
///
/// # Example
///
/// ```rust
/// use sieve_core::{Store, Value};
/// use serde_json::json;
///
/// let store = Store::new(json!({ "a": { "b": 1 }, "c": 0 }));
///
/// let sub = store.subscribe_with_deps(|state: &Value| println!("a.b is now {}", state), ["a.b"]);
///
/// store.dispatch(|draft| draft.set("c", 1)).unwrap();   // not notified
/// store.dispatch(|draft| draft.set("a.b", 2)).unwrap(); // notified
/// sub.unsubscribe();
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Create a store holding `preloaded`.
    pub fn new(preloaded: impl Into<Value>) -> Self {
        Self::with_config(preloaded, StoreConfig::default())
    }

    /// Create a store with explicit configuration.
    pub fn with_config(preloaded: impl Into<Value>, config: StoreConfig) -> Self {
        let preloaded = preloaded.into();
        // Reducing the init action has no updater to fail on.
        let state = reduce(&preloaded, Action::bare(config.init_action.clone()))
            .unwrap_or(preloaded);
        debug!(init_action = %config.init_action, root = state.kind(), "store created");

        Self {
            inner: Arc::new(StoreInner {
                config,
                state: RwLock::new(state),
                subscribers: RwLock::new(Vec::new()),
                tracker: DependencyTracker::new(),
                queue: Mutex::new(DispatchQueue::default()),
                idle: Condvar::new(),
            }),
        }
    }

    /// The current state.
    ///
    /// This is a reference-counted handle to the committed tree, not a deep
    /// copy.
    pub fn state(&self) -> Value {
        self.inner.state.read().clone()
    }

    /// Borrow the current state for the duration of `f`.
    ///
    /// `f` must not dispatch.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Value) -> R,
    {
        f(&self.inner.state.read())
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Apply `updater` under the default action type.
    pub fn dispatch<F, R>(&self, updater: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Draft) -> R + Send + 'static,
        R: UpdateOutcome,
    {
        let kind = self.inner.config.update_action.clone();
        self.dispatch_action(Action::new(kind, updater))
    }

    /// Apply `updater` under an explicit action type.
    pub fn dispatch_as<F, R>(&self, kind: impl Into<String>, updater: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Draft) -> R + Send + 'static,
        R: UpdateOutcome,
    {
        self.dispatch_action(Action::new(kind, updater))
    }

    /// Dispatch a prebuilt action.
    pub fn dispatch_action(&self, action: Action) -> StoreResult<()> {
        self.inner.dispatch(action)
    }

    /// Subscribe to every state change.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.register(Subscriber::new(handler, Dependencies::Always), None)
    }

    /// Subscribe to changes of the values at `deps`.
    ///
    /// With no paths this is the same as [`subscribe`](Self::subscribe).
    /// The baseline is taken from the state at the time of the call.
    pub fn subscribe_with_deps<F, I, P>(&self, handler: F, deps: I) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
        I: IntoIterator<Item = P>,
        P: Into<DependencyPath>,
    {
        let deps: Vec<DependencyPath> = deps.into_iter().map(Into::into).collect();
        if deps.is_empty() {
            return self.subscribe(handler);
        }
        let seed = self.read(|state| resolve_all(&deps, state));
        self.inner
            .register(Subscriber::new(handler, Dependencies::Fixed(deps)), Some(seed))
    }

    /// Subscribe with a path list that may be replaced at any time.
    ///
    /// The list is re-read on every dispatch, so the caller can change which
    /// values it cares about without resubscribing. While it is empty the
    /// handler is called on every dispatch.
    pub fn subscribe_with_shared_deps<F>(&self, handler: F, deps: SharedPaths) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let seed = {
            let paths = deps.read();
            self.read(|state| resolve_all(&paths, state))
        };
        self.inner
            .register(Subscriber::new(handler, Dependencies::Shared(deps)), Some(seed))
    }

    /// Number of registered subscribers.
    pub fn listener_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Number of subscribers with a dependency snapshot.
    pub fn tracked_count(&self) -> usize {
        self.inner.tracker.len()
    }

    pub(crate) fn downgrade(&self) -> Weak<StoreInner> {
        Arc::downgrade(&self.inner)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.inner.state.read())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Create an isolated store. `None` starts from `Value::Null`.
pub fn create_store(preloaded: Option<Value>) -> Store {
    Store::new(preloaded.unwrap_or_default())
}

// ----------------------------------------------------------------------------
// Internals
// ----------------------------------------------------------------------------

/// Releases cycle ownership when the outermost dispatch returns or unwinds,
/// and wakes dispatchers waiting on other threads.
struct RunningGuard<'a> {
    store: &'a StoreInner,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        let mut queue = self.store.queue.lock();
        queue.owner = None;
        queue.pending.clear();
        drop(queue);
        self.store.idle.notify_all();
    }
}

impl StoreInner {
    pub(crate) fn update_action(&self) -> &str {
        &self.config.update_action
    }

    pub(crate) fn dispatch(&self, action: Action) -> StoreResult<()> {
        let current = thread::current().id();
        {
            let mut queue = self.queue.lock();
            loop {
                let owner = queue.owner;
                match owner {
                    Some(owner) if owner == current => {
                        trace!(action = %action.kind(), queued = queue.pending.len() + 1, "dispatch queued");
                        queue.pending.push_back(action);
                        return Ok(());
                    }
                    Some(_) => self.idle.wait(&mut queue),
                    None => break,
                }
            }
            queue.owner = Some(current);
        }
        let _guard = RunningGuard { store: self };

        let mut outcome = self.apply(action);
        let limit = self.config.max_queued_dispatches;
        let mut drained = 0usize;
        loop {
            let next = {
                let mut queue = self.queue.lock();
                match queue.pending.pop_front() {
                    Some(next) if drained < limit => next,
                    Some(_) => {
                        let discarded = queue.pending.len() + 1;
                        warn!(limit, discarded, "dispatch queue overflow");
                        if let Err(err) = &outcome {
                            warn!(error = %err, "dispatch failed before the queue overflowed");
                        }
                        return Err(StoreError::DispatchOverflow { limit });
                    }
                    None => break,
                }
            };
            drained += 1;
            if let Err(err) = self.apply(next) {
                if outcome.is_ok() {
                    outcome = Err(err);
                } else {
                    warn!(error = %err, "queued dispatch failed after an earlier failure");
                }
            }
        }
        outcome
    }

    /// Reduce one action and notify. Caller owns the cycle.
    fn apply(&self, action: Action) -> StoreResult<()> {
        let kind = action.kind().to_owned();
        let current = self.state.read().clone();
        let next = reduce(&current, action)?;
        *self.state.write() = next.clone();

        let subscribers: Vec<Arc<Subscriber>> = self.subscribers.read().clone();
        debug!(
            action = %kind,
            changed = !next.strict_eq(&current),
            listeners = subscribers.len(),
            "dispatch"
        );
        for subscriber in &subscribers {
            self.deliver(subscriber, &next);
        }
        drop(subscribers);
        self.tracker.prune();
        Ok(())
    }

    fn deliver(&self, subscriber: &Subscriber, state: &Value) {
        let paths = match subscriber.paths() {
            Some(paths) if !paths.is_empty() => paths,
            _ => {
                subscriber.notify(state);
                return;
            }
        };

        let id = subscriber.id();
        let last = self.tracker.snapshot(id);
        let diff = compute_diff(last.as_deref(), &paths, state);
        trace!(subscriber = %id, changed = diff.changed, "dependency diff");
        if diff.changed {
            subscriber.notify(state);
        }
        self.tracker.record(id, diff.values);
    }

    fn register(self: &Arc<Self>, subscriber: Subscriber, seed: Option<Snapshot>) -> Subscription {
        let subscriber = Arc::new(subscriber);
        let id = subscriber.id();
        if let Some(seed) = seed {
            self.tracker.track(&subscriber, Some(seed));
        }
        self.subscribers.write().push(subscriber);
        trace!(subscriber = %id, "subscribed");
        Subscription::new(id, Arc::downgrade(self))
    }

    pub(crate) fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = {
            let mut subscribers = self.subscribers.write();
            let before = subscribers.len();
            subscribers.retain(|subscriber| subscriber.id() != id);
            before != subscribers.len()
        };
        if removed {
            // A cycle in progress may still hold the subscriber; its entry
            // then goes at the end of that cycle.
            self.tracker.prune();
            trace!(subscriber = %id, "unsubscribed");
        }
        removed
    }

    pub(crate) fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.subscribers
            .read()
            .iter()
            .any(|subscriber| subscriber.id() == id)
    }
}
