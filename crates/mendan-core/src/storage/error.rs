//! Storage error handling
//!
//! Provides typed errors for storage operations with descriptive messages
//! and recovery suggestions.

use rusqlite::ErrorCode;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to create data directory
    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Permission denied accessing path
    #[error("Permission denied: cannot access '{path}'")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stored value could not be decoded
    #[error("Invalid value stored under '{namespace}/{key}': {details}")]
    InvalidValue {
        namespace: String,
        key: String,
        details: String,
    },

    /// SQLite database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Value could not be encoded or decoded as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The database handle was poisoned by a panicking writer
    #[error("Storage backend is unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Classify a failure to create the data directory
    pub fn from_create_dir(error: io::Error, path: PathBuf) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            _ => StorageError::CreateDirectory {
                path,
                source: error,
            },
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::PermissionDenied { .. } => {
                Some("Check file and directory permissions of the data directory.")
            }
            StorageError::CreateDirectory { .. } => {
                Some("Check that the parent directory exists and you have write permissions.")
            }
            StorageError::InvalidValue { .. } => Some(
                "Restore the records from a backup file, or delete all records to start fresh.",
            ),
            StorageError::Database(e) => match e.sqlite_error_code() {
                Some(ErrorCode::DiskFull) => Some("Free up disk space and try again."),
                Some(ErrorCode::ReadOnly)
                | Some(ErrorCode::CannotOpen)
                | Some(ErrorCode::PermissionDenied) => Some(
                    "Check that the database file is writable, or point data_dir elsewhere.",
                ),
                Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                    Some("Close other mendan instances using the same database and try again.")
                }
                _ => None,
            },
            StorageError::Unavailable(_) => Some("Restart mendan; unsaved edits may be lost."),
            StorageError::Serialization(_) => None,
        }
    }

    /// Render the error followed by its recovery suggestion, if any
    pub fn with_suggestion(&self) -> String {
        match self.recovery_suggestion() {
            Some(hint) => format!("{} ({})", self, hint),
            None => self.to_string(),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: i32) -> StorageError {
        StorageError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(code),
            None,
        ))
    }

    #[test]
    fn test_create_dir_permission_denied_classification() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = StorageError::from_create_dir(io_err, PathBuf::from("/test/path"));

        assert!(matches!(err, StorageError::PermissionDenied { .. }));
        assert!(err.recovery_suggestion().unwrap().contains("permissions"));
    }

    #[test]
    fn test_create_dir_other_failure_classification() {
        let io_err = io::Error::new(io::ErrorKind::AlreadyExists, "is a file");
        let err = StorageError::from_create_dir(io_err, PathBuf::from("/test/path"));

        assert!(matches!(err, StorageError::CreateDirectory { .. }));
        assert!(err.to_string().contains("/test/path"));
    }

    #[test]
    fn test_invalid_value_display() {
        let err = StorageError::InvalidValue {
            namespace: "interviews".to_string(),
            key: "all-interviews".to_string(),
            details: "expected an array".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("interviews/all-interviews"));
        assert!(msg.contains("expected an array"));
        assert!(err.recovery_suggestion().unwrap().contains("backup"));
    }

    #[test]
    fn test_sqlite_codes_map_to_suggestions() {
        // SQLITE_FULL
        assert!(sqlite_failure(13)
            .recovery_suggestion()
            .unwrap()
            .contains("disk space"));
        // SQLITE_BUSY
        assert!(sqlite_failure(5)
            .recovery_suggestion()
            .unwrap()
            .contains("other mendan instances"));
        // SQLITE_READONLY
        assert!(sqlite_failure(8)
            .recovery_suggestion()
            .unwrap()
            .contains("writable"));
        // SQLITE_MISMATCH
        assert!(sqlite_failure(20).recovery_suggestion().is_none());
    }

    #[test]
    fn test_with_suggestion_appends_hint() {
        let err = StorageError::Unavailable("poisoned".to_string());
        let text = err.with_suggestion();
        assert!(text.starts_with("Storage backend is unavailable: poisoned"));
        assert!(text.contains("Restart mendan"));

        let plain = sqlite_failure(20).with_suggestion();
        assert_eq!(plain, sqlite_failure(20).to_string());
    }
}
