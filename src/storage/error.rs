//! Sink error types.
//!
//! Every engine operation returns [`SinkError`] on failure. Database errors
//! (connectivity, authentication, statement failures) are surfaced unmodified
//! and never retried here; retry policy belongs to the caller.

use thiserror::Error;

use crate::column::DbType;

/// Errors that can occur while persisting log events.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Database operation failed (sqlx error).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid options (empty table name, retention without a timestamp column, ...).
    #[error("configuration error: {0}")]
    Config(String),

    /// A value was requested from a column the database fills itself.
    #[error("auto-increment column cannot supply a value")]
    NotInsertable,

    /// A column's declared type has no DDL mapping.
    #[error("column `{column}` declares type {db_type}, which has no DDL mapping")]
    UnmappedType { column: String, db_type: DbType },

    /// A cell could not be converted to its column's native type.
    #[error("column `{column}`: {reason}")]
    ValueConversion { column: String, reason: String },

    /// The batching task is gone.
    #[error("failed to send event to the batching task")]
    ChannelSend,

    /// Internal error (e.g., task join failure).
    #[error("internal error: {0}")]
    Internal(String),
}
