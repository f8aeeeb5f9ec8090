//! View Bindings
//!
//! Glue between a store and whatever renders it. A view asks the store for
//! a [`StateHook`] scoped to the paths it reads and a [`Dispatcher`] to send
//! updates, mounts the hook with a re-render callback, and drops it when the
//! view goes away.

mod hooks;

pub use hooks::{Dispatcher, StateHook};
