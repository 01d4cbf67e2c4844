//! Paper adapters
//!
//! Used by the binary's paper mode and as fakes in tests.

mod broker;
mod feed;
mod session;

pub use broker::{FillMode, PaperBroker, PaperBrokerConfig, ScriptedFailure};
pub use feed::{RandomWalkConfig, RandomWalkFeed, StaticFeed};
pub use session::StaticSessionProvider;

use std::sync::{Mutex, MutexGuard};

/// Lock that survives a poisoned mutex (a panicking test thread)
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
