//! `skybook` - A flight booking assistant bot
//!
//! This library provides the core functionality for a chat bot that books
//! flight tickets through a two-step modal form, looks up and cancels
//! bookings by ticket ID, and stores every record in a local SQLite database.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod booking;
pub mod bot;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod render;
pub mod session;
pub mod storage;
pub mod ticket;
pub mod waiter;

pub use booking::{Booking, Draft};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use storage::{Store, StoreStats};
pub use ticket::TicketId;
