//! Per-key serialization for multi-key write sequences.
//!
//! The store offers single-key atomicity only, so every multi-key sequence
//! (clean-up + apply, dequeue + enroll, bulk evict) runs inside a keyed
//! async mutex. Lock order is owner before participant everywhere in the
//! coordinator; no coordinator operation holds more than one owner lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of named async mutexes.
///
/// One entry is retained per distinct key seen; entries are a single `Arc`
/// each and the population is bounded by the set of participants and owners
/// this process has touched.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, waiting if another task holds it.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let entry = {
            // Recover the map from a poisoned mutex: the map itself cannot
            // be left in a torn state by a panicking holder.
            let mut map = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            Arc::clone(
                map.entry(key.to_string())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        entry.lock_owned().await
    }
}
