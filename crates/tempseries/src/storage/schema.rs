//! `SQLite` schema definitions for tempseries.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the records table.
///
/// `AUTOINCREMENT` keeps ids of deleted rows from being handed out again.
pub const CREATE_RECORDS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS temperature_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    person_name TEXT NOT NULL,
    temperature_series TEXT NOT NULL,
    closest_to_zero REAL NOT NULL,
    recorded_at TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create an index on `created_at` for newest-first listing.
pub const CREATE_CREATED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_records_created_at ON temperature_records(created_at DESC)
";

/// SQL statement to create an index on `person_name` for summaries and filtering.
pub const CREATE_PERSON_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_records_person_name ON temperature_records(person_name)
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
    CREATE_RECORDS_TABLE,
    CREATE_CREATED_INDEX,
    CREATE_PERSON_INDEX,
    CREATE_METADATA_TABLE,
];

/// Columns selected for every record read, in `row_to_record` order.
pub const RECORD_COLUMNS: &str = "id, person_name, temperature_series, closest_to_zero, \
     recorded_at, created_at, updated_at";
