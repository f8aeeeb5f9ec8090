//! The draft reducer.
//!
//! `reduce` is a pure function from `(state, action)` to the next state. If
//! the action carries an updater it runs against a copy-on-write draft of
//! `state`; otherwise `state` comes back unchanged, identity included.

use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::state::{Draft, Value};

use super::Action;

/// Compute the state that follows `state` under `action`.
///
/// An updater error is wrapped in [`StoreError::Updater`]; since the draft
/// is discarded, `state` itself is never touched.
pub fn reduce(state: &Value, action: Action) -> StoreResult<Value> {
    let (kind, updater) = action.into_parts();
    let Some(updater) = updater else {
        trace!(action = %kind, "action without updater, state unchanged");
        return Ok(state.clone());
    };

    let mut draft = Draft::new(state);
    match updater.apply(&mut draft) {
        Ok(Some(replacement)) => Ok(replacement),
        Ok(None) => Ok(draft.finish()),
        Err(source) => Err(StoreError::Updater { action: kind, source }),
    }
}
