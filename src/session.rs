//! session.rs — transient per-session state for the dashboard: the single
//! memoized fetch result and the latest selected event. One value, fixed
//! TTL, cleared by the user-facing refresh action. Passed into handlers as
//! an explicit shared object rather than living in a module-level global.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::ingest::types::EventBatch;

#[derive(Debug)]
pub struct SessionState {
    last_fetch: Mutex<Option<CachedBatch>>,
    selected: Mutex<Option<u32>>,
    ttl: Duration,
}

#[derive(Debug, Clone)]
struct CachedBatch {
    stored_at: Instant,
    batch: EventBatch,
}

impl SessionState {
    pub fn new(ttl: Duration) -> Self {
        Self {
            last_fetch: Mutex::new(None),
            selected: Mutex::new(None),
            ttl,
        }
    }

    /// The memoized batch, fresh-only. `None` means "not yet fetched or
    /// expired" — distinct from a stored batch with zero events.
    pub fn cached(&self) -> Option<EventBatch> {
        let guard = self.last_fetch.lock().expect("session mutex poisoned");
        guard
            .as_ref()
            .filter(|c| c.stored_at.elapsed() < self.ttl)
            .map(|c| c.batch.clone())
    }

    pub fn store(&self, batch: EventBatch) {
        let mut guard = self.last_fetch.lock().expect("session mutex poisoned");
        *guard = Some(CachedBatch {
            stored_at: Instant::now(),
            batch,
        });
    }

    /// Drop the memoized batch and the selection. Returns whether a batch
    /// was actually present.
    pub fn clear(&self) -> bool {
        let dropped = self
            .last_fetch
            .lock()
            .expect("session mutex poisoned")
            .take()
            .is_some();
        *self.selected.lock().expect("session mutex poisoned") = None;
        dropped
    }

    /// Latest-wins selection mailbox for the globe collaborator. At-most-once
    /// delivery; earlier selections are simply overwritten.
    pub fn select(&self, id: u32) {
        *self.selected.lock().expect("session mutex poisoned") = Some(id);
    }

    pub fn selected(&self) -> Option<u32> {
        *self.selected.lock().expect("session mutex poisoned")
    }
}
