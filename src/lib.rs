//! Logsink - Relational Log Event Sink
//!
//! Persists structured log events into a relational table (MySQL / MariaDB,
//! or SQLite for embedded use). It can be used as a library by logging
//! pipelines, or run as a standalone binary with the `logsink` executable,
//! which reads newline-delimited JSON events.
//!
//! # Architecture
//!
//! - **Event**: Log events, property values, message-template rendering
//! - **Column**: Column writers, declared SQL types, native cell values
//! - **Schema**: Named, ordered column set
//! - **Storage**: Table creation, row-by-row and bulk inserts, retention purge
//! - **Sink**: Batching and audit front-ends over the storage engine
//! - **Config**: YAML configuration for the binary
//!
//! # Example
//!
//! ```rust,no_run
//! use logsink::{BatchingSink, Level, LogEvent, SinkOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), logsink::SinkError> {
//!     let options = SinkOptions::builder("mysql://root@localhost/app", "logs")
//!         .auto_create_table(true)
//!         .build()?;
//!     let sink = BatchingSink::spawn(options)?;
//!
//!     sink.emit(
//!         LogEvent::new(Level::Information, "User {UserId} signed in").with_property("UserId", 7),
//!     )?;
//!
//!     sink.shutdown().await
//! }
//! ```

pub mod column;
pub mod config;
pub mod event;
pub mod notify;
pub mod schema;
pub mod sink;
pub mod storage;

pub use column::{ColumnWriter, DbType, PropertyWriteMethod};
pub use event::{FormatProvider, Level, LogEvent, PropertyValue, Scalar};
pub use schema::Schema;
pub use sink::{AuditSink, BatchingSink};
pub use storage::{InsertMode, PersistenceEngine, SinkError, SinkOptions, SinkOptionsBuilder};
