//! `SQLite` schema definitions for skybook.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the bookings table.
pub const CREATE_BOOKINGS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS bookings (
    ticket_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    age INTEGER NOT NULL,
    passport TEXT NOT NULL,
    from_country TEXT NOT NULL,
    to_country TEXT NOT NULL,
    category TEXT NOT NULL,
    price INTEGER NOT NULL,
    departure_date TEXT NOT NULL,
    arrival_date TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create an index on `created_at` for stats queries.
pub const CREATE_CREATED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_bookings_created_at ON bookings(created_at)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_BOOKINGS_TABLE,
    CREATE_CREATED_AT_INDEX,
    CREATE_METADATA_TABLE,
];
