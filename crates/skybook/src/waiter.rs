//! Follow-up reply routing.
//!
//! Several commands ask the invoking user a question and then wait for that
//! user's next plain message (`lookup`, `cancel`, and the menu commands).
//! This registry parks a oneshot sender per user; the bot loop offers every
//! non-command message here before discarding it. All waits are bounded, so a
//! forgetful user never pins a task forever.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::debug;

use crate::gateway::UserId;

/// Registry of users whose next message is claimed by a waiting command.
#[derive(Debug, Default)]
pub struct ReplyWaiters {
    inner: Mutex<HashMap<UserId, oneshot::Sender<String>>>,
}

impl ReplyWaiters {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in the next message from `user`.
    ///
    /// A second registration for the same user replaces the first; the
    /// superseded waiter resolves as if it had timed out.
    pub fn register(&self, user: UserId) -> oneshot::Receiver<String> {
        let (tx, rx) = oneshot::channel();
        if self.lock().insert(user, tx).is_some() {
            debug!(%user, "replacing existing reply waiter");
        }
        rx
    }

    /// Offer a message to a waiting command.
    ///
    /// Returns `true` if a waiter claimed it, `false` if nobody was waiting
    /// for this user (or the waiter had already given up).
    pub fn deliver(&self, user: UserId, text: String) -> bool {
        match self.lock().remove(&user) {
            Some(tx) => tx.send(text).is_ok(),
            None => false,
        }
    }

    /// Drop any waiter registered for `user`.
    pub fn cancel(&self, user: UserId) {
        self.lock().remove(&user);
    }

    /// Number of users currently being waited on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nobody is being waited on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Wait up to `timeout` for the next message from `user`.
    ///
    /// Returns `None` on timeout (the registration is removed) or if the
    /// waiter was superseded by a newer registration for the same user.
    pub async fn await_reply(&self, user: UserId, timeout: Duration) -> Option<String> {
        let rx = self.register(user);
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(text)) => Some(text),
            Ok(Err(_)) => None,
            Err(_) => {
                self.cancel(user);
                None
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, oneshot::Sender<String>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
