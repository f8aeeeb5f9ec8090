//! Store hooks for view layers.
//!
//! These adapt a [`Store`] to the lifecycle most UI layers share: subscribe
//! when a view mounts, re-render when the state it reads changes, and
//! unsubscribe when it unmounts. Nothing here diffs anything itself; the
//! store's dependency-scoped subscriptions do the work.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::state::{DependencyPath, Draft, Value};
use crate::store::{Action, SharedPaths, Store, StoreInner, SubscriptionGuard, UpdateOutcome};

/// Per-view state accessor.
///
/// Holds the state the view last rendered with and the dependency paths the
/// view currently reads. The paths can be replaced between renders with
/// [`set_deps`](Self::set_deps); the next dispatch diffs against the new
/// list without resubscribing.
pub struct StateHook {
    store: Store,
    deps: SharedPaths,
    state: Arc<RwLock<Value>>,
    subscription: Option<SubscriptionGuard>,
}

impl StateHook {
    fn new(store: &Store, deps: Vec<DependencyPath>) -> Self {
        Self {
            store: store.clone(),
            deps: Arc::new(RwLock::new(deps)),
            state: Arc::new(RwLock::new(store.state())),
            subscription: None,
        }
    }

    /// Subscribe and start calling `on_render` with each relevant state.
    ///
    /// The hook's state is refreshed from the store first, so the
    /// dependency baseline and the rendered state agree. Mounting an already
    /// mounted hook does nothing.
    pub fn mount<F>(&mut self, on_render: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        if self.subscription.is_some() {
            return;
        }
        *self.state.write() = self.store.state();

        let state = Arc::clone(&self.state);
        let subscription = self.store.subscribe_with_shared_deps(
            move |next: &Value| {
                *state.write() = next.clone();
                on_render(next);
            },
            Arc::clone(&self.deps),
        );
        trace!(subscriber = %subscription.id(), "state hook mounted");
        self.subscription = Some(subscription.into_guard());
    }

    /// Unsubscribe. The last rendered state stays readable.
    pub fn unmount(&mut self) {
        if let Some(guard) = self.subscription.take() {
            trace!(subscriber = %guard.subscription().id(), "state hook unmounted");
        }
    }

    /// Whether the hook is currently subscribed.
    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// The state as of the last render.
    pub fn state(&self) -> Value {
        self.state.read().clone()
    }

    /// Replace the dependency paths. Takes effect on the next dispatch.
    pub fn set_deps<I, P>(&self, deps: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<DependencyPath>,
    {
        *self.deps.write() = deps.into_iter().map(Into::into).collect();
    }

    /// The dependency paths currently declared.
    pub fn deps(&self) -> Vec<DependencyPath> {
        self.deps.read().clone()
    }
}

impl std::fmt::Debug for StateHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateHook")
            .field("deps", &*self.deps.read())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

/// Stable dispatch handle.
///
/// Every dispatcher obtained from the same store is interchangeable and
/// compares equal under [`ptr_eq`](Self::ptr_eq). It does not keep the store
/// alive.
#[derive(Clone)]
pub struct Dispatcher {
    store: Weak<StoreInner>,
}

impl Dispatcher {
    /// Apply `updater` under the store's default action type.
    pub fn dispatch<F, R>(&self, updater: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Draft) -> R + Send + 'static,
        R: UpdateOutcome,
    {
        let store = self.store.upgrade().ok_or(StoreError::StoreDropped)?;
        let kind = store.update_action().to_owned();
        store.dispatch(Action::new(kind, updater))
    }

    /// Apply `updater` under an explicit action type.
    pub fn dispatch_as<F, R>(&self, kind: impl Into<String>, updater: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Draft) -> R + Send + 'static,
        R: UpdateOutcome,
    {
        let store = self.store.upgrade().ok_or(StoreError::StoreDropped)?;
        store.dispatch(Action::new(kind, updater))
    }

    /// Whether both handles dispatch into the same store.
    pub fn ptr_eq(&self, other: &Dispatcher) -> bool {
        Weak::ptr_eq(&self.store, &other.store)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("alive", &(self.store.strong_count() > 0))
            .finish()
    }
}

impl Store {
    /// A state accessor scoped to `deps`. Call [`StateHook::mount`] to start
    /// receiving updates.
    pub fn use_store_state<I, P>(&self, deps: I) -> StateHook
    where
        I: IntoIterator<Item = P>,
        P: Into<DependencyPath>,
    {
        StateHook::new(self, deps.into_iter().map(Into::into).collect())
    }

    /// A dispatch handle that is stable for the life of the store.
    pub fn use_store_dispatch(&self) -> Dispatcher {
        Dispatcher {
            store: self.downgrade(),
        }
    }

    /// Both accessors at once.
    pub fn use_store<I, P>(&self, deps: I) -> (StateHook, Dispatcher)
    where
        I: IntoIterator<Item = P>,
        P: Into<DependencyPath>,
    {
        (self.use_store_state(deps), self.use_store_dispatch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn renders() -> (Arc<AtomicUsize>, impl Fn(&Value) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        (count, move |_: &Value| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn hook_renders_only_on_dependency_change() {
        let store = Store::new(json!({ "a": 1, "b": 1 }));
        let mut hook = store.use_store_state(["a"]);
        let (count, on_render) = renders();
        hook.mount(on_render);

        store.dispatch(|d| d.set("b", 2)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(hook.state().get("b"), Some(&Value::from(1)));

        store.dispatch(|d| d.set("a", 2)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(hook.state().to_json(), json!({ "a": 2, "b": 2 }));
    }

    #[test]
    fn hook_without_deps_renders_every_dispatch() {
        let store = Store::new(json!({ "a": 1 }));
        let mut hook = store.use_store_state(Vec::<&str>::new());
        let (count, on_render) = renders();
        hook.mount(on_render);

        store.dispatch(|_| ()).unwrap();
        store.dispatch(|_| ()).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn changed_deps_apply_on_next_dispatch() {
        let store = Store::new(json!({ "a": 1, "b": 1 }));
        let mut hook = store.use_store_state(["a"]);
        let (count, on_render) = renders();
        hook.mount(on_render);

        hook.set_deps(["b"]);
        assert_eq!(hook.deps(), vec![DependencyPath::from("b")]);

        // The baseline slot still holds a's value (1); b is 1 as well.
        store.dispatch(|d| d.set("a", 5)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);

        store.dispatch(|d| d.set("b", 2)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unmount_stops_renders() {
        let store = Store::new(json!({ "a": 1 }));
        let mut hook = store.use_store_state(["a"]);
        let (count, on_render) = renders();
        hook.mount(on_render);
        assert!(hook.is_mounted());
        assert_eq!(store.listener_count(), 1);

        hook.unmount();
        assert!(!hook.is_mounted());
        assert_eq!(store.listener_count(), 0);

        store.dispatch(|d| d.set("a", 2)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dropping_hook_unsubscribes() {
        let store = Store::new(Value::Null);
        {
            let mut hook = store.use_store_state(["x"]);
            hook.mount(|_| {});
            hook.mount(|_| {});
            assert_eq!(store.listener_count(), 1);
        }
        assert_eq!(store.listener_count(), 0);
        assert_eq!(store.tracked_count(), 0);
    }

    #[test]
    fn mount_refreshes_stale_state() {
        let store = Store::new(json!({ "a": 1 }));
        let mut hook = store.use_store_state(["a"]);
        store.dispatch(|d| d.set("a", 2)).unwrap();
        assert_eq!(hook.state().get("a"), Some(&Value::from(1)));

        hook.mount(|_| {});
        assert_eq!(hook.state().get("a"), Some(&Value::from(2)));
    }

    #[test]
    fn dispatchers_are_stable() {
        let store = Store::new(json!({ "n": 0 }));
        let first = store.use_store_dispatch();
        let second = store.use_store_dispatch();
        assert!(first.ptr_eq(&second));
        assert!(!first.ptr_eq(&Store::new(Value::Null).use_store_dispatch()));

        first.dispatch(|d| d.set("n", 1)).unwrap();
        second.dispatch_as("custom", |d| d.set("n", 2)).unwrap();
        assert_eq!(store.state().get("n"), Some(&Value::from(2)));
    }

    #[test]
    fn dispatcher_outliving_store_errors() {
        let dispatcher = Store::new(Value::Null).use_store_dispatch();
        let err = dispatcher.dispatch(|_| ()).unwrap_err();
        assert!(matches!(err, StoreError::StoreDropped));
    }

    #[test]
    fn use_store_returns_both() {
        let store = Store::new(json!({ "a": 0 }));
        let (mut hook, dispatch) = store.use_store(["a"]);
        let (count, on_render) = renders();
        hook.mount(on_render);

        dispatch.dispatch(|d| d.set("a", 1)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(hook.state().get("a"), Some(&Value::from(1)));
    }
}
