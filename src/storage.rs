//! Storage Layer
//!
//! Relational persistence of log events through sqlx's `Any` driver
//! (MySQL / MariaDB in production, file-backed SQLite embedded and in tests).
//!
//! # Components
//!
//! - [`PersistenceEngine`]: Table creation, row-by-row / bulk inserts, retention purge, heartbeat
//! - [`SinkOptions`] / [`SinkOptionsBuilder`]: Immutable configuration and its builder
//! - [`TableCreator`] / [`create_table_sql`]: Idempotent DDL from a schema
//! - [`StagingBuffer`]: Typed rows for bulk transfer
//! - [`db`]: Pool wrapper and connection-target handling
//! - [`SinkError`]: Error type for every storage operation

mod bulk;
pub mod db;
mod engine;
mod error;
mod options;
pub mod statement;
mod table;

pub use bulk::{StagingBuffer, StagingColumn};
pub use engine::PersistenceEngine;
pub use error::SinkError;
pub use options::{
    CreateTableEvent, DEFAULT_BATCH_SIZE_LIMIT, DEFAULT_PERIOD, DEFAULT_QUEUE_LIMIT, InsertMode,
    SinkOptions, SinkOptionsBuilder,
};
pub use table::{TableCreator, create_table_sql};
