//! In-memory store mock for coordinator testing.
//!
//! Implements the full store capability contract over plain maps:
//! - scalars, object maps, unordered sets
//! - ordered sets kept sorted by score with insertion-order tie-break
//!
//! Extras for assertions:
//! - `write_count()` counts mutating operations, so tests can assert that a
//!   rejected operation performed zero writes
//! - `fail_after_writes(n)` makes every mutating operation past the n-th
//!   fail, for partial-failure/retry convergence tests
//!
//! # Example
//!
//! ```rust,ignore
//! use oh_test_utils::MockStore;
//!
//! let store = MockStore::new().with_scalar("oh:200:status", "active");
//! assert_eq!(store.scalar("oh:200:status").as_deref(), Some("active"));
//! assert_eq!(store.write_count(), 0);
//! ```

use async_trait::async_trait;
use oh_service::store::{StateStore, StoreError};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

/// Mock state store backed by in-process maps.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    inner: Arc<Mutex<MockStoreInner>>,
}

#[derive(Debug, Default)]
struct MockStoreInner {
    scalars: HashMap<String, String>,
    hashes: HashMap<String, HashMap<String, String>>,
    sets: HashMap<String, BTreeSet<String>>,
    /// Sorted by score; equal scores keep insertion order.
    zsets: HashMap<String, Vec<(i64, String)>>,
    writes: u64,
    fail_after: Option<u64>,
    ping_healthy: bool,
}

impl MockStore {
    /// Create an empty mock store.
    #[must_use]
    pub fn new() -> Self {
        let store = Self::default();
        store.inner.lock().unwrap().ping_healthy = true;
        store
    }

    /// Seed a scalar value.
    #[must_use]
    pub fn with_scalar(self, key: &str, value: &str) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.scalars.insert(key.to_string(), value.to_string());
        }
        self
    }

    /// Seed an object-map field.
    #[must_use]
    pub fn with_hash_field(self, key: &str, field: &str, value: &str) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner
                .hashes
                .entry(key.to_string())
                .or_default()
                .insert(field.to_string(), value.to_string());
        }
        self
    }

    /// Make every mutating operation past the `n`-th fail with a store
    /// error. Reads stay healthy.
    pub fn fail_after_writes(&self, n: u64) {
        self.inner.lock().unwrap().fail_after = Some(n);
    }

    /// Clear a previously injected write failure.
    pub fn heal(&self) {
        self.inner.lock().unwrap().fail_after = None;
    }

    /// Make `ping` fail (readiness testing).
    pub fn set_ping_healthy(&self, healthy: bool) {
        self.inner.lock().unwrap().ping_healthy = healthy;
    }

    /// Number of mutating operations performed so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.inner.lock().unwrap().writes
    }

    /// Read a scalar directly (assertion helper).
    #[must_use]
    pub fn scalar(&self, key: &str) -> Option<String> {
        self.inner.lock().unwrap().scalars.get(key).cloned()
    }

    /// Read an object-map field directly (assertion helper).
    #[must_use]
    pub fn hash_field(&self, key: &str, field: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .hashes
            .get(key)
            .and_then(|fields| fields.get(field))
            .cloned()
    }

    /// Whether an unordered set contains a member (assertion helper).
    #[must_use]
    pub fn set_contains(&self, key: &str, member: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .sets
            .get(key)
            .is_some_and(|set| set.contains(member))
    }

    /// Ordered-set members in rank order (assertion helper).
    #[must_use]
    pub fn zset_members(&self, key: &str) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .zsets
            .get(key)
            .map(|entries| entries.iter().map(|(_, m)| m.clone()).collect())
            .unwrap_or_default()
    }

    /// Score of one ordered-set member (assertion helper).
    #[must_use]
    pub fn zset_score(&self, key: &str, member: &str) -> Option<i64> {
        self.inner.lock().unwrap().zsets.get(key).and_then(|entries| {
            entries
                .iter()
                .find(|(_, m)| m == member)
                .map(|(score, _)| *score)
        })
    }

    fn check_write(inner: &mut MockStoreInner) -> Result<(), StoreError> {
        if let Some(limit) = inner.fail_after {
            if inner.writes >= limit {
                return Err(StoreError::Io("injected write failure".to_string()));
            }
        }
        inner.writes += 1;
        Ok(())
    }
}

#[async_trait]
impl StateStore for MockStore {
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .hashes
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn hash_set(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_write(&mut inner)?;
        let entry = inner.hashes.entry(key.to_string()).or_default();
        for (field, value) in fields {
            entry.insert((*field).to_string(), value.clone());
        }
        Ok(())
    }

    async fn hash_delete_fields(&self, key: &str, fields: &[&str]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_write(&mut inner)?;
        if let Some(entry) = inner.hashes.get_mut(key) {
            for field in fields {
                entry.remove(*field);
            }
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.lock().unwrap().scalars.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_write(&mut inner)?;
        inner.scalars.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_write(&mut inner)?;
        inner.scalars.remove(key);
        inner.hashes.remove(key);
        inner.sets.remove(key);
        inner.zsets.remove(key);
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_write(&mut inner)?;
        inner
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_write(&mut inner)?;
        if let Some(set) = inner.sets.get_mut(key) {
            set.remove(member);
        }
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn zset_add(&self, key: &str, score: i64, member: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_write(&mut inner)?;
        let entries = inner.zsets.entry(key.to_string()).or_default();
        entries.retain(|(_, m)| m != member);
        // Insert after the last entry with score <= new score: sorted by
        // score, insertion order within equal scores.
        let position = entries
            .iter()
            .rposition(|(s, _)| *s <= score)
            .map_or(0, |i| i + 1);
        entries.insert(position, (score, member.to_string()));
        Ok(())
    }

    async fn zset_remove(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_write(&mut inner)?;
        if let Some(entries) = inner.zsets.get_mut(key) {
            entries.retain(|(_, m)| m != member);
        }
        Ok(())
    }

    async fn zset_range(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let Some(entries) = inner.zsets.get(key) else {
            return Ok(Vec::new());
        };
        let len = entries.len() as isize;
        let clamp = |idx: isize| -> isize {
            let resolved = if idx < 0 { len + idx } else { idx };
            resolved.clamp(0, len)
        };
        let from = clamp(start);
        // Rank ranges are inclusive; `stop = -1` means the last element.
        let to = (clamp(stop) + 1).min(len);
        if from >= to {
            return Ok(Vec::new());
        }
        Ok(entries[from as usize..to as usize]
            .iter()
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.inner.lock().unwrap().ping_healthy {
            Ok(())
        } else {
            Err(StoreError::Io("mock store marked unhealthy".to_string()))
        }
    }
}
