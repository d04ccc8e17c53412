//! Bot core.
//!
//! Owns the event loop: receives gateway events, dispatches each one to a
//! handler on its own task, and sweeps expired booking drafts on a timer.
//! Handler failures are logged and never take down the loop.

pub mod handlers;

use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::gateway::{ChatGateway, Event};
use crate::session::SessionStore;
use crate::storage::Store;
use crate::waiter::ReplyWaiters;

/// A recognized bot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start the two-step booking flow.
    Purchase,
    /// Look up a booking by ticket ID.
    Lookup,
    /// Cancel a booking by ticket ID.
    Cancel,
    /// Flight status menu.
    Inquiry,
    /// Customer support menu.
    Support,
    /// List every stored booking.
    ShowDatabase,
    /// Command overview.
    Help,
}

impl Command {
    /// Parse a command from message text.
    ///
    /// Returns `None` if the text does not start with `prefix`. Returns
    /// `Some(Err(name))` for a prefixed but unrecognized command so the
    /// caller can answer instead of staying silent.
    pub fn parse<'a>(text: &'a str, prefix: &str) -> Option<std::result::Result<Self, &'a str>> {
        let rest = text.strip_prefix(prefix)?;
        let name = rest.split_whitespace().next().unwrap_or("");
        let command = match name {
            "purchase" => Self::Purchase,
            "lookup" => Self::Lookup,
            "cancel" => Self::Cancel,
            "inquiry" => Self::Inquiry,
            "support" => Self::Support,
            "show_database" => Self::ShowDatabase,
            "help" => Self::Help,
            _ => return Some(Err(name)),
        };
        Some(Ok(command))
    }
}

/// Shared state handed to every handler invocation.
#[derive(Clone)]
pub struct Context {
    /// The chat platform.
    pub gateway: Arc<dyn ChatGateway>,
    /// The booking record store.
    pub store: Arc<Mutex<Store>>,
    /// In-flight booking drafts.
    pub sessions: Arc<SessionStore>,
    /// Commands waiting on a follow-up message.
    pub waiters: Arc<ReplyWaiters>,
    /// Application configuration.
    pub config: Arc<Config>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("gateway", &self.gateway.name())
            .field("sessions", &self.sessions)
            .field("waiters", &self.waiters)
            .finish_non_exhaustive()
    }
}

/// The bot event loop.
#[derive(Debug)]
pub struct Bot {
    ctx: Context,
}

impl Bot {
    /// Create a bot over a gateway, store, and configuration.
    #[must_use]
    pub fn new(gateway: Arc<dyn ChatGateway>, store: Store, config: Arc<Config>) -> Self {
        let ctx = Context {
            gateway,
            store: Arc::new(Mutex::new(store)),
            sessions: Arc::new(SessionStore::new(config.draft_ttl())),
            waiters: Arc::new(ReplyWaiters::new()),
            config,
        };
        Self { ctx }
    }

    /// Access the shared context.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Run until the event channel closes.
    ///
    /// Each event is handled on its own task so a slow follow-up wait never
    /// blocks other users.
    pub async fn run(&self, mut rx: mpsc::Receiver<Event>) {
        let mut sweep = tokio::time::interval(self.ctx.config.sweep_interval());
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!("bot event loop started");
        loop {
            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else {
                        info!("event channel closed, shutting down");
                        break;
                    };
                    let ctx = self.ctx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handlers::handle_event(&ctx, event).await {
                            error!(error = %e, "event handler failed");
                        }
                    });
                }
                _ = sweep.tick() => {
                    let evicted = self.ctx.sessions.evict_expired();
                    if evicted > 0 {
                        debug!(evicted, "swept expired booking drafts");
                    }
                }
            }
        }
    }
}
