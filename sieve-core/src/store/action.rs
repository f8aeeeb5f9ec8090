//! Actions and Updaters
//!
//! An [`Action`] is what travels from `dispatch` to the reducer: a type tag
//! plus an optional [`Updater`]. Actions without an updater are legal and
//! reduce to the unchanged state; the store uses one at construction.

use std::fmt;

use crate::error::UpdaterError;
use crate::state::{Draft, Value};

type UpdaterFn = Box<dyn FnOnce(&mut Draft) -> Result<Option<Value>, UpdaterError> + Send>;

/// What an updater closure may return.
///
/// - `()`: the draft's mutations become the next state.
/// - `Value`: the returned value replaces the state outright.
/// - `Result<T, E>`: `Err` aborts the dispatch and leaves the state as it was.
pub trait UpdateOutcome {
    /// Normalize into an optional replacement root.
    fn into_replacement(self) -> Result<Option<Value>, UpdaterError>;
}

impl UpdateOutcome for () {
    fn into_replacement(self) -> Result<Option<Value>, UpdaterError> {
        Ok(None)
    }
}

impl UpdateOutcome for Value {
    fn into_replacement(self) -> Result<Option<Value>, UpdaterError> {
        Ok(Some(self))
    }
}

impl<T, E> UpdateOutcome for Result<T, E>
where
    T: UpdateOutcome,
    E: Into<UpdaterError>,
{
    fn into_replacement(self) -> Result<Option<Value>, UpdaterError> {
        match self {
            Ok(outcome) => outcome.into_replacement(),
            Err(err) => Err(err.into()),
        }
    }
}

/// A boxed, one-shot draft mutation.
pub struct Updater(UpdaterFn);

impl Updater {
    /// Wrap a closure.
    pub fn new<F, R>(f: F) -> Self
    where
        F: FnOnce(&mut Draft) -> R + Send + 'static,
        R: UpdateOutcome,
    {
        Self(Box::new(move |draft: &mut Draft| f(draft).into_replacement()))
    }

    /// Run the updater against a draft.
    pub fn apply(self, draft: &mut Draft) -> Result<Option<Value>, UpdaterError> {
        (self.0)(draft)
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Updater(..)")
    }
}

/// A typed request to change the state.
#[derive(Debug)]
pub struct Action {
    kind: String,
    updater: Option<Updater>,
}

impl Action {
    /// An action carrying an updater.
    pub fn new<F, R>(kind: impl Into<String>, updater: F) -> Self
    where
        F: FnOnce(&mut Draft) -> R + Send + 'static,
        R: UpdateOutcome,
    {
        Self {
            kind: kind.into(),
            updater: Some(Updater::new(updater)),
        }
    }

    /// An action with no updater. Reducing it leaves the state unchanged.
    pub fn bare(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            updater: None,
        }
    }

    /// The action type.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Whether this action carries an updater.
    pub fn has_updater(&self) -> bool {
        self.updater.is_some()
    }

    pub(crate) fn into_parts(self) -> (String, Option<Updater>) {
        (self.kind, self.updater)
    }
}
