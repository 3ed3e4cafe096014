//! Error types for tempseries.
//!
//! This module defines all error types used throughout the tempseries crate.
//! Validation and lifecycle errors are caller mistakes and are raised before
//! any write; everything else is a server-side fault.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

use crate::record::RecordId;

/// The main error type for tempseries operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Input Errors ===
    /// A field required by the operation was absent or empty.
    #[error("{}", required_message(.field))]
    MissingField {
        /// External (camelCase) name of the field.
        field: &'static str,
    },

    /// A field was present but had the wrong JSON type.
    #[error("{field} {reason}")]
    InvalidField {
        /// External (camelCase) name of the field.
        field: &'static str,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// An update supplied a person name that is blank after trimming.
    #[error("Person name cannot be empty")]
    EmptyName,

    /// A temperature series failed validation.
    #[error("invalid temperature series: {reason}")]
    InvalidSeries {
        /// Description of the first violation found.
        reason: String,
    },

    /// An update supplied none of the updatable fields.
    #[error("No valid fields to update")]
    NoOpUpdate,

    // === Lifecycle Errors ===
    /// The record does not exist or has been deleted.
    #[error("temperature record {id} not found")]
    NotFound {
        /// The requested record id.
        id: RecordId,
    },

    /// The closest-to-zero selector was handed an empty series.
    #[error("cannot select closest-to-zero value from an empty series")]
    EmptySeries,

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Server Errors ===
    /// The HTTP listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address we tried to listen on.
        addr: SocketAddr,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for tempseries operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

fn required_message(field: &str) -> String {
    match field {
        "personName" => "Person name is required".to_string(),
        "temperatureSeries" => {
            "Temperature series is required and must be a non-empty array".to_string()
        }
        other => format!("{other} is required"),
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a series validation error.
    #[must_use]
    pub fn invalid_series(reason: impl Into<String>) -> Self {
        Self::InvalidSeries {
            reason: reason.into(),
        }
    }

    /// Check if this error was caused by the caller's input.
    ///
    /// Client errors are never retried and map to a 400 response.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::InvalidField { .. }
                | Self::EmptyName
                | Self::InvalidSeries { .. }
                | Self::NoOpUpdate
        )
    }

    /// Check if this error means the record is not active.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MissingField {
            field: "personName",
        };
        assert_eq!(err.to_string(), "Person name is required");

        let err = Error::MissingField {
            field: "temperatureSeries",
        };
        assert_eq!(
            err.to_string(),
            "Temperature series is required and must be a non-empty array"
        );

        let err = Error::NotFound { id: 42 };
        assert_eq!(err.to_string(), "temperature record 42 not found");
    }

    #[test]
    fn test_client_messages() {
        assert_eq!(Error::EmptyName.to_string(), "Person name cannot be empty");
        assert_eq!(Error::NoOpUpdate.to_string(), "No valid fields to update");
        assert_eq!(
            Error::MissingField { field: "limit" }.to_string(),
            "limit is required"
        );
    }

    #[test]
    fn test_invalid_series_display() {
        let err = Error::invalid_series("invalid value at index 1");
        assert_eq!(
            err.to_string(),
            "invalid temperature series: invalid value at index 1"
        );
    }

    #[test]
    fn test_client_errors() {
        assert!(Error::EmptyName.is_client_error());
        assert!(Error::NoOpUpdate.is_client_error());
        assert!(Error::invalid_series("empty series").is_client_error());
        assert!(Error::MissingField {
            field: "temperatureSeries"
        }
        .is_client_error());
        assert!(Error::InvalidField {
            field: "personName",
            reason: "must be a string"
        }
        .is_client_error());
    }

    #[test]
    fn test_server_errors_are_not_client_errors() {
        assert!(!Error::NotFound { id: 1 }.is_client_error());
        assert!(!Error::EmptySeries.is_client_error());
        assert!(!Error::internal("boom").is_client_error());
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound { id: 7 }.is_not_found());
        assert!(!Error::NoOpUpdate.is_not_found());
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
            assert!(!err.is_client_error());
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<Vec<f64>, serde_json::Error> =
            serde_json::from_str("[1.0,");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "max_limit must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("max_limit"));
    }

    #[test]
    fn test_bind_error_display() {
        let err = Error::Bind {
            addr: "127.0.0.1:5000".parse().unwrap(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        };
        let msg = err.to_string();
        assert!(msg.contains("127.0.0.1:5000"));
        assert!(msg.contains("address in use"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
