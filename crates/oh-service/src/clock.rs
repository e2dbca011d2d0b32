//! Timestamp source for enqueue ordering.
//!
//! Queue entries are ordered by their enqueue timestamp, and the ordered
//! store's tie-break for equal scores is lexical rather than insertion-order.
//! [`MonotonicClock`] sidesteps the question: it never issues the same
//! millisecond twice within a process, so scores in one owner's queue never
//! collide and FIFO order is exact.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of millisecond timestamps.
pub trait Clock: Send + Sync + 'static {
    /// Current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall-clock time via chrono.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Strictly monotonic wrapper over another clock.
///
/// Returns `max(inner.now_millis(), last + 1)`, so consecutive reads are
/// strictly increasing even when the wall clock stalls within a millisecond
/// or steps backwards.
#[derive(Debug)]
pub struct MonotonicClock<C> {
    inner: C,
    last: AtomicI64,
}

impl<C: Clock> MonotonicClock<C> {
    /// Wrap `inner` with strict monotonicity.
    #[must_use]
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            last: AtomicI64::new(0),
        }
    }
}

impl Default for MonotonicClock<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> Clock for MonotonicClock<C> {
    fn now_millis(&self) -> i64 {
        let now = self.inner.now_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(observed) => last = observed,
            }
        }
    }
}
