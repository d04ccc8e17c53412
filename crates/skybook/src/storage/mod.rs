//! Storage layer for skybook.
//!
//! This module provides `SQLite`-based persistent storage for booking
//! records. Every operation is a single auto-committed statement; no use
//! case touches more than one row.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::booking::Booking;
use crate::error::{Error, Result};
use crate::ticket::TicketId;

/// Storage engine for booking records.
///
/// Provides persistent storage using `SQLite` with support for:
/// - Single-row insert keyed by generated ticket ID
/// - Lookup and delete by ticket ID
/// - Full listing in insertion order
#[derive(Debug)]
pub struct Store {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Store {
    /// Open or create a booking database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        // Initialize schema
        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a new booking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateTicket`] if a booking with this ticket ID
    /// already exists, or another error if the database operation fails.
    pub fn create(&self, booking: &Booking) -> Result<()> {
        let created_at = Utc::now().to_rfc3339();

        let result = self.conn.execute(
            r"
            INSERT INTO bookings (
                ticket_id, name, age, passport, from_country, to_country,
                category, price, departure_date, arrival_date, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
            params![
                booking.ticket_id.as_str(),
                booking.name,
                booking.age,
                booking.passport,
                booking.from_country,
                booking.to_country,
                booking.category,
                booking.price,
                booking.departure_date,
                booking.arrival_date,
                created_at,
            ],
        );

        match result {
            Ok(_) => {
                debug!("Inserted booking {}", booking.ticket_id);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::DuplicateTicket {
                    ticket_id: booking.ticket_id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a booking with the given ticket ID exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn exists(&self, ticket_id: &TicketId) -> Result<bool> {
        let count: i32 = self.conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE ticket_id = ?1",
            [ticket_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get a booking by its ticket ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find(&self, ticket_id: &TicketId) -> Result<Option<Booking>> {
        let result = self
            .conn
            .query_row(
                r"
                SELECT ticket_id, name, age, passport, from_country, to_country,
                       category, price, departure_date, arrival_date
                FROM bookings WHERE ticket_id = ?1
                ",
                [ticket_id.as_str()],
                Self::row_to_booking,
            )
            .optional()?;
        Ok(result)
    }

    /// Delete a booking by ticket ID.
    ///
    /// Returns `true` if a booking was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete(&self, ticket_id: &TicketId) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM bookings WHERE ticket_id = ?1",
            [ticket_id.as_str()],
        )?;
        Ok(affected > 0)
    }

    /// Get every booking in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_all(&self) -> Result<Vec<Booking>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT ticket_id, name, age, passport, from_country, to_country,
                   category, price, departure_date, arrival_date
            FROM bookings ORDER BY rowid ASC
            ",
        )?;

        let bookings = stmt
            .query_map([], Self::row_to_booking)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(bookings)
    }

    /// Count total bookings in storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let total_bookings = self.count()?;

        let oldest: Option<String> = self
            .conn
            .query_row(
                "SELECT created_at FROM bookings ORDER BY created_at ASC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let newest: Option<String> = self
            .conn
            .query_row(
                "SELECT created_at FROM bookings ORDER BY created_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let oldest_booking = oldest
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let newest_booking = newest
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        // Get database file size
        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStats {
            total_bookings,
            oldest_booking,
            newest_booking,
            db_size_bytes,
        })
    }

    /// Convert a database row to a Booking struct.
    fn row_to_booking(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
        let ticket_id: String = row.get(0)?;

        Ok(Booking {
            ticket_id: TicketId::from_stored(ticket_id),
            name: row.get(1)?,
            age: row.get(2)?,
            passport: row.get(3)?,
            from_country: row.get(4)?,
            to_country: row.get(5)?,
            category: row.get(6)?,
            price: row.get(7)?,
            departure_date: row.get(8)?,
            arrival_date: row.get(9)?,
        })
    }
}

/// Statistics about the booking store.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    /// Total number of bookings stored.
    pub total_bookings: i64,
    /// Creation time of the oldest booking.
    pub oldest_booking: Option<DateTime<Utc>>,
    /// Creation time of the newest booking.
    pub newest_booking: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
