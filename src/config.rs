//! Configuration
//!
//! YAML configuration for the sink binary, converted into
//! [`SinkOptions`](crate::storage::SinkOptions).
//!
//! # Example
//!
//! ```yaml
//! connection: "${LOG_DB_URL:-mysql://root@localhost/logs}"
//! table_name: logs
//! insert_mode: bulk
//! auto_create_table: true
//! retention: 7d
//! batch: { size_limit: 30, period: 5s }
//! columns:
//!   message: { writer: rendered_message }
//!   level: { writer: level_as_text }
//!   timestamp: { writer: timestamp }
//! ```

mod app;
mod columns;
mod connection;
mod validation;

pub use app::{BatchConfig, SinkConfig};
pub use columns::{ColumnConfig, WriterName, build_schema};
pub use connection::{ConnectionStringProvider, resolve_connection};
pub use validation::{ConfigError, expand_env_vars, parse_duration};
