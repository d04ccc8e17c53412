//! Per-user draft sessions for the two-step booking flow.
//!
//! Step one of the booking form parks its fields here until step two
//! completes. Unlike the usual grow-forever map, entries carry a TTL: the bot
//! loop sweeps expired drafts periodically, and expired entries are also
//! refused at access time so a sweep race cannot resurrect a stale draft.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::booking::Draft;
use crate::gateway::UserId;

struct Entry {
    draft: Draft,
    created_at: Instant,
}

/// Session store holding one in-flight draft per user.
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    inner: Mutex<HashMap<UserId, Entry>>,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a session store whose drafts expire after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Store a draft for a user, replacing any previous one.
    pub fn insert(&self, user: UserId, draft: Draft) {
        let mut map = self.lock();
        map.insert(
            user,
            Entry {
                draft,
                created_at: Instant::now(),
            },
        );
    }

    /// Check whether a live (non-expired) draft exists for a user.
    #[must_use]
    pub fn contains(&self, user: UserId) -> bool {
        let map = self.lock();
        map.get(&user)
            .is_some_and(|entry| entry.created_at.elapsed() < self.ttl)
    }

    /// Remove and return the draft for a user.
    ///
    /// Returns `None` if no draft exists or the draft has expired (an expired
    /// draft is removed but not returned).
    pub fn take(&self, user: UserId) -> Option<Draft> {
        let mut map = self.lock();
        let entry = map.remove(&user)?;
        if entry.created_at.elapsed() < self.ttl {
            Some(entry.draft)
        } else {
            debug!(%user, "discarding expired draft on access");
            None
        }
    }

    /// Remove every expired draft. Returns the number evicted.
    pub fn evict_expired(&self) -> usize {
        let mut map = self.lock();
        let before = map.len();
        map.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        before - map.len()
    }

    /// Number of stored drafts, including any not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the store holds no drafts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, Entry>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
