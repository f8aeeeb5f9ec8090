//! Store configuration.
//!
//! The defaults match what most callers want; override them with the
//! `with_*` setters or deserialize a [`StoreConfig`] from JSON.

use serde::{Deserialize, Serialize};

/// Action type used by [`Store::dispatch`](crate::Store::dispatch) when the
/// caller does not name one.
pub const DEFAULT_UPDATE_ACTION: &str = "@@Update";

/// Action type reduced once when a store is created.
pub const DEFAULT_INIT_ACTION: &str = "@@sieve/INIT";

/// Default bound on dispatches queued from inside listeners.
pub const DEFAULT_MAX_QUEUED_DISPATCHES: usize = 1024;

/// Tunables for a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Action type for dispatches that don't specify one.
    pub update_action: String,

    /// Action type of the updater-less action reduced at construction.
    pub init_action: String,

    /// Maximum number of dispatches a single drain of the reentrancy queue
    /// will apply before giving up with
    /// [`StoreError::DispatchOverflow`](crate::StoreError::DispatchOverflow).
    pub max_queued_dispatches: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            update_action: DEFAULT_UPDATE_ACTION.to_string(),
            init_action: DEFAULT_INIT_ACTION.to_string(),
            max_queued_dispatches: DEFAULT_MAX_QUEUED_DISPATCHES,
        }
    }
}

impl StoreConfig {
    /// Set the default action type for dispatches.
    pub fn with_update_action(mut self, action: impl Into<String>) -> Self {
        self.update_action = action.into();
        self
    }

    /// Set the action type reduced at construction.
    pub fn with_init_action(mut self, action: impl Into<String>) -> Self {
        self.init_action = action.into();
        self
    }

    /// Set the reentrancy queue bound.
    pub fn with_max_queued_dispatches(mut self, limit: usize) -> Self {
        self.max_queued_dispatches = limit;
        self
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
