//! Core error types for companion-core.
//!
//! Each concern gets its own thiserror enum; [`CoreError`] wraps them all for
//! callers that just want to propagate with `?`.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Core error type for companion-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Check-in engine errors
    #[error(transparent)]
    CheckIn(#[from] CheckInError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Point ledger errors
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Group accountability errors
    #[error(transparent)]
    Group(#[from] GroupError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the streak engine.
#[derive(Error, Debug)]
pub enum CheckInError {
    /// A record for this goal and day already exists. Expected, not a failure.
    #[error("goal '{goal_id}' is already checked in for {date}")]
    AlreadyCheckedIn { goal_id: String, date: NaiveDate },

    /// No check-in exists for this goal and day yet.
    #[error("no check-in for goal '{goal_id}' on {date}; check in first")]
    NotFound { goal_id: String, date: NaiveDate },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CheckInError {
    pub fn is_already_checked_in(&self) -> bool {
        matches!(self, Self::AlreadyCheckedIn { .. })
    }
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Unique `(goal_id, date)` constraint rejected an insert
    #[error("duplicate check-in for goal '{goal_id}' on {date}")]
    Duplicate { goal_id: String, date: NaiveDate },

    /// Update targeted a record that does not exist
    #[error("check-in record {0} not found")]
    RecordNotFound(Uuid),

    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The data directory could not be created or reached
    #[error("Data directory unavailable: {0}")]
    DataDirUnavailable(#[source] std::io::Error),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database (or in-memory store) is locked
    #[error("Store is locked")]
    Locked,

    /// A stored value could not be decoded
    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
}

/// Reward point ledger errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("user '{user_id}' has {balance} points, {required} required")]
    InsufficientPoints {
        user_id: String,
        balance: i64,
        required: i64,
    },

    #[error("point amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Group accountability errors.
#[derive(Error, Debug)]
pub enum GroupError {
    #[error("user '{user_id}' is not a member of group '{group}'")]
    MemberNotFound { group: String, user_id: String },

    #[error("user '{user_id}' already belongs to group '{group}'")]
    AlreadyMember { group: String, user_id: String },

    #[error("group '{0}' not found")]
    GroupNotFound(String),

    /// Likes and reminders must target another member
    #[error("members cannot like or remind themselves")]
    SelfTarget,

    /// Reminders are pointless once the target has checked in
    #[error("'{user_id}' has already checked in today")]
    TargetAlreadyCheckedIn { user_id: String },

    #[error(transparent)]
    CheckIn(#[from] CheckInError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("text is {len} characters, at most {max} allowed")]
    TextTooLong { len: usize, max: usize },

    #[error("'{0}' must not be empty")]
    EmptyField(&'static str),

    /// Rewards need at least one threshold
    #[error("reward requires a consecutive or cumulative day threshold")]
    MissingRequirement,

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if matches!(
                    e.code,
                    rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy
                ) =>
            {
                StorageError::Locked
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for StorageError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StorageError::Locked
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        LedgerError::Storage(err.into())
    }
}

impl From<rusqlite::Error> for GroupError {
    fn from(err: rusqlite::Error) -> Self {
        GroupError::Storage(err.into())
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
