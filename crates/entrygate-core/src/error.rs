//! Core error types for entrygate-core.
//!
//! Degradable failures (network, persistence, reminder permission) have their
//! own types so each component can decide whether to absorb them or surface
//! them. Only `SubmissionRejected` and `Blocked` are meant to reach the user.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Core error type for entrygate-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Network fetch failed; callers degrade to the cached tier.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Persistent store read/write failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Local reminder could not be scheduled or cancelled.
    #[error("Reminder error: {0}")]
    Reminder(#[from] ReminderError),

    /// Override state machine refused a transition.
    #[error("Override error: {0}")]
    Override(#[from] OverrideError),

    /// The backend refused the submission.
    #[error("Submission rejected: {reason}")]
    SubmissionRejected { reason: String },

    /// Submitting is not allowed right now.
    #[error("Submissions are blocked{}", blocked_suffix(.unlock_at))]
    Blocked { unlock_at: Option<DateTime<Utc>> },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

fn blocked_suffix(unlock_at: &Option<DateTime<Utc>>) -> String {
    match unlock_at {
        Some(at) => format!(" until {}", at.to_rfc3339()),
        None => " until pending entries are resolved".to_string(),
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Connection mutex was poisoned by a panicking writer
    #[error("Database connection lock poisoned")]
    Poisoned,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Could not determine the data directory
    #[error("Cannot determine data directory: {0}")]
    DataDir(String),
}

/// A fetch against the submission backend failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("request timed out")]
    Timeout,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

/// The persistent key-value store failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("read of '{key}' failed: {message}")]
    Read { key: String, message: String },

    #[error("write of '{key}' failed: {message}")]
    Write { key: String, message: String },

    #[error("remove of '{key}' failed: {message}")]
    Remove { key: String, message: String },
}

/// Outcome of a failed submit call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The backend refused the entry; `reason` is shown to the user as-is.
    #[error("rejected: {reason}")]
    Rejected { reason: String },
}

/// Local reminder scheduling errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReminderError {
    /// The platform refused permission to post local reminders.
    #[error("reminder permission denied")]
    PermissionDenied,

    #[error("reminder scheduler unavailable: {0}")]
    Unavailable(String),
}

/// Override controller errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OverrideError {
    #[error("no override needed: submissions are not blocked")]
    NotBlocked,

    #[error("rewarded ad is not ready")]
    AdNotReady,

    #[error("event '{event}' is not valid in state '{state}'")]
    InvalidTransition { state: String, event: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

impl From<SubmitError> for CoreError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Network(e) => CoreError::Network(e),
            SubmitError::Rejected { reason } => CoreError::SubmissionRejected { reason },
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_decode() {
            NetworkError::Decode(err.to_string())
        } else {
            NetworkError::Transport(err.to_string())
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_message_names_unlock_time() {
        let at = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let err = CoreError::Blocked { unlock_at: Some(at) };
        assert_eq!(
            err.to_string(),
            "Submissions are blocked until 2026-03-01T10:00:00+00:00"
        );

        let err = CoreError::Blocked { unlock_at: None };
        assert!(err.to_string().contains("pending"));
    }

    #[test]
    fn rejection_carries_backend_reason() {
        let err = CoreError::SubmissionRejected {
            reason: "duplicate title".into(),
        };
        assert_eq!(err.to_string(), "Submission rejected: duplicate title");
    }
}
