//! Bounded slot counter for background evaluations

use std::sync::{Arc, Condvar, Mutex, PoisonError};

#[derive(Debug, Default)]
struct PoolShared {
    active: Mutex<usize>,
    freed: Condvar,
}

/// Counts running background evaluations and blocks new ones at capacity
#[derive(Debug, Default, Clone)]
pub(crate) struct WorkerPool {
    shared: Arc<PoolShared>,
}

/// Held by a running background evaluation; frees its slot on drop
#[derive(Debug)]
pub(crate) struct PoolPermit {
    shared: Arc<PoolShared>,
}

impl WorkerPool {
    /// Take a slot, waiting while `limit` slots are busy. `None` is unbounded.
    pub(crate) fn acquire(&self, limit: Option<usize>) -> PoolPermit {
        let mut active = self
            .shared
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(limit) = limit {
            while *active >= limit.max(1) {
                active = self
                    .shared
                    .freed
                    .wait(active)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
        *active += 1;

        PoolPermit {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Number of slots currently taken
    pub(crate) fn active(&self) -> usize {
        *self
            .shared
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PoolPermit {
    fn drop(&mut self) {
        let mut active = self
            .shared
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *active = active.saturating_sub(1);
        self.shared.freed.notify_one();
    }
}
