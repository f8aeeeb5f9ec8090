//! Error types for the store.
//!
//! Only two things can go wrong during a dispatch: the updater itself
//! reports a failure, or a chain of queued dispatches never settles. Path
//! resolution and updater-less actions are never errors.

use thiserror::Error;

/// Error type an updater may return to abort a dispatch.
pub type UpdaterError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by [`Store`](crate::Store) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The updater returned an error. The store state was left unchanged.
    #[error("updater for action `{action}` failed: {source}")]
    Updater {
        /// Type of the action whose updater failed.
        action: String,
        /// The error returned by the updater.
        #[source]
        source: UpdaterError,
    },

    /// Dispatches issued from listeners kept feeding the queue past the
    /// configured limit. The remaining queue was discarded.
    #[error("more than {limit} dispatches were queued during a single notification cycle")]
    DispatchOverflow {
        /// The configured `max_queued_dispatches`.
        limit: usize,
    },

    /// A detached handle was used after its store was dropped.
    #[error("store has been dropped")]
    StoreDropped,
}

impl StoreError {
    /// Build an updater failure from any error type.
    pub fn updater(action: impl Into<String>, source: impl Into<UpdaterError>) -> Self {
        Self::Updater {
            action: action.into(),
            source: source.into(),
        }
    }
}
