//! # Fibonacci Backoff
//!
//! Requeue delays for failed reconciliations. Delays grow along the Fibonacci
//! sequence (min, min, 2*min, 3*min, 5*min, ...) and are capped at a maximum,
//! which backs off more gently than doubling.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Fibonacci backoff calculator
///
/// Each call to `next_backoff` returns the current delay and advances to the
/// sum of the previous two, capped at `max`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_secs: u64,
    prev_secs: u64,
    current_secs: u64,
    max_secs: u64,
}

impl FibonacciBackoff {
    /// Create a new Fibonacci backoff with the given bounds.
    ///
    /// Sub-second bounds are rounded down to whole seconds, with a floor of one second.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        let min_secs = min.as_secs().max(1);
        let max_secs = max.as_secs().max(min_secs);
        Self {
            min_secs,
            prev_secs: 0,
            current_secs: min_secs,
            max_secs,
        }
    }

    /// Get the next backoff duration and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = Duration::from_secs(self.current_secs);

        let next_secs = self.prev_secs.saturating_add(self.current_secs);
        self.prev_secs = self.current_secs;
        self.current_secs = next_secs.min(self.max_secs);

        result
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.prev_secs = 0;
        self.current_secs = self.min_secs;
    }

    /// Smallest delay this backoff hands out
    #[must_use]
    pub fn min(&self) -> Duration {
        Duration::from_secs(self.min_secs)
    }
}

/// Per-object backoff state, keyed by `namespace/name`.
///
/// This belongs to the scheduling side of the controller: the reconciler
/// itself keeps no state between invocations.
///
/// An object deleted while backing off is never reconciled again, so its
/// entry is never reset. Entries untouched for twice the maximum delay are
/// evicted instead; any pending requeue has fired by then.
#[derive(Debug)]
pub struct RequeueBackoff {
    template: FibonacciBackoff,
    idle_ttl: Duration,
    states: Mutex<HashMap<String, Tracked>>,
}

#[derive(Debug)]
struct Tracked {
    backoff: FibonacciBackoff,
    touched: Instant,
}

impl RequeueBackoff {
    /// Create a tracker whose per-object sequences use the given bounds
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        let template = FibonacciBackoff::new(min, max);
        let idle_ttl = Duration::from_secs(template.max_secs.saturating_mul(2));
        Self {
            template,
            idle_ttl,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Next requeue delay for `key`, advancing its sequence
    pub fn next_for(&self, key: &str) -> Duration {
        self.next_for_at(key, Instant::now())
    }

    fn next_for_at(&self, key: &str, now: Instant) -> Duration {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        evict_idle(&mut states, now, self.idle_ttl);
        let tracked = states.entry(key.to_string()).or_insert_with(|| Tracked {
            backoff: self.template.clone(),
            touched: now,
        });
        tracked.touched = now;
        tracked.backoff.next_backoff()
    }

    /// Forget the error history of `key` after a successful reconciliation
    pub fn reset(&self, key: &str) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    /// Smallest delay, used for errors that are expected to clear on the next attempt
    #[must_use]
    pub fn min(&self) -> Duration {
        self.template.min()
    }

    /// Number of objects with an error history
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.states.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

fn evict_idle(states: &mut HashMap<String, Tracked>, now: Instant, ttl: Duration) {
    states.retain(|_, tracked| now.saturating_duration_since(tracked.touched) < ttl);
}
