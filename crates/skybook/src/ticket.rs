//! Ticket ID generation and validation.
//!
//! Ticket IDs are short, human-typeable tokens handed to the passenger after
//! a booking completes. The format is fixed: four decimal digits, two
//! uppercase letters, one decimal digit, one uppercase letter (`1234AB5C`).
//! There is no checksum; uniqueness is the caller's responsibility (the
//! booking workflow retries generation against the store before inserting).

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Length of a ticket ID in characters.
pub const TICKET_ID_LEN: usize = 8;

/// Error returned when a string does not match the ticket ID format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid ticket ID: expected 4 digits, 2 letters, 1 digit, 1 letter")]
pub struct InvalidTicketId;

/// A generated booking identifier.
///
/// Guaranteed to match the fixed 8-character pattern when constructed via
/// [`TicketId::generate`] or [`TicketId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    /// Generate a fresh ticket ID using the thread-local RNG.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Generate a fresh ticket ID from the given RNG.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut id = String::with_capacity(TICKET_ID_LEN);
        for _ in 0..4 {
            id.push(random_digit(rng));
        }
        id.push(random_letter(rng));
        id.push(random_letter(rng));
        id.push(random_digit(rng));
        id.push(random_letter(rng));
        Self(id)
    }

    /// Parse a user-supplied string as a ticket ID.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTicketId`] if the string does not match the fixed
    /// pattern.
    pub fn parse(s: &str) -> Result<Self, InvalidTicketId> {
        if Self::is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidTicketId)
        }
    }

    /// Check whether a string matches the ticket ID pattern.
    #[must_use]
    pub fn is_valid(s: &str) -> bool {
        let bytes = s.as_bytes();
        if bytes.len() != TICKET_ID_LEN {
            return false;
        }
        bytes.iter().enumerate().all(|(i, b)| match i {
            0..=3 | 6 => b.is_ascii_digit(),
            _ => b.is_ascii_uppercase(),
        })
    }

    /// Reconstruct a ticket ID from a stored database value.
    ///
    /// Stored IDs are always generated, so a pattern mismatch indicates the
    /// database was edited by hand; the value is kept as-is and a warning
    /// logged.
    pub(crate) fn from_stored(s: String) -> Self {
        if !Self::is_valid(&s) {
            warn!("stored ticket ID {s:?} does not match the expected pattern");
        }
        Self(s)
    }

    /// Get the ticket ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TicketId {
    type Err = InvalidTicketId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn random_digit<R: Rng + ?Sized>(rng: &mut R) -> char {
    char::from(b'0' + rng.gen_range(0..10))
}

fn random_letter<R: Rng + ?Sized>(rng: &mut R) -> char {
    char::from(b'A' + rng.gen_range(0..26))
}
