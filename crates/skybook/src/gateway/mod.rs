//! Chat-platform gateway abstraction.
//!
//! The chat platform is an external collaborator: it sends messages, renders
//! interactive buttons and modal forms, and produces an event stream of user
//! activity. This module defines the trait and event types that gateway
//! implementations must fulfill; the bundled [`console`] implementation runs
//! the bot over stdin/stdout.

pub mod console;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::render::{Button, FormRequest, Reply};

/// Errors that can occur in a chat gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway failed to start.
    #[error("failed to start gateway: {0}")]
    StartFailed(String),

    /// The gateway failed to stop.
    #[error("failed to stop gateway: {0}")]
    StopFailed(String),

    /// An outgoing message could not be delivered.
    #[error("failed to send: {0}")]
    SendFailed(String),

    /// The gateway is already running.
    #[error("gateway already running")]
    AlreadyRunning,

    /// The gateway is not running.
    #[error("gateway not running")]
    NotRunning,

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Platform identity of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

/// Platform identity of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel:{}", self.0)
    }
}

/// Identifier of an interactive button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonId {
    /// Open the step-one booking form.
    StartBooking,
    /// Abandon the booking flow at the entry prompt.
    AbortBooking,
    /// Open the step-two booking form.
    ProceedToTravelDetails,
}

/// Identifier of a modal form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormKind {
    /// Step one: basic passenger details.
    BasicDetails,
    /// Step two: additional booking details.
    TravelDetails,
}

/// An event produced by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A plain message from a user.
    Message {
        /// The author.
        user: UserId,
        /// Where the message was sent.
        channel: ChannelId,
        /// Raw message text.
        text: String,
    },

    /// A button attached to an earlier reply was pressed.
    ButtonPressed {
        /// Who pressed it.
        user: UserId,
        /// The channel of the originating reply.
        channel: ChannelId,
        /// Which button.
        button: ButtonId,
    },

    /// A modal form was submitted.
    FormSubmitted {
        /// Who submitted it.
        user: UserId,
        /// The channel the flow started in.
        channel: ChannelId,
        /// Which form.
        form: FormKind,
        /// Field values in form order.
        values: Vec<String>,
    },
}

/// A trait for chat-platform gateways.
///
/// Implementors translate between the platform's wire protocol and the bot's
/// [`Event`]/[`Reply`] types. All interaction with the platform goes through
/// this trait so the bot logic can be tested against a recording fake.
#[async_trait::async_trait]
pub trait ChatGateway: Send + Sync + fmt::Debug {
    /// Name of this gateway (for logging).
    fn name(&self) -> &'static str;

    /// Check if the gateway is currently running.
    fn is_running(&self) -> bool;

    /// Connect to the platform and begin emitting events.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway fails to start.
    async fn start(&mut self, tx: mpsc::Sender<Event>) -> Result<()>;

    /// Disconnect from the platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway fails to stop cleanly.
    fn stop(&self) -> Result<()>;

    /// Send a reply to a channel.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails.
    async fn send(&self, channel: ChannelId, reply: Reply) -> Result<()>;

    /// Send a reply with interactive buttons attached.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails.
    async fn send_with_buttons(
        &self,
        channel: ChannelId,
        reply: Reply,
        buttons: Vec<Button>,
    ) -> Result<()>;

    /// Present a modal form to one user.
    ///
    /// # Errors
    ///
    /// Returns an error if the form cannot be presented.
    async fn open_form(&self, user: UserId, channel: ChannelId, form: FormRequest) -> Result<()>;
}
