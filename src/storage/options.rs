//! Sink options and their builder.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::event::FormatProvider;
use crate::notify::{AsyncEvent, HandlerError};
use crate::schema::{Schema, normalize_identifier};
use crate::storage::SinkError;

/// Default number of events per batch.
pub const DEFAULT_BATCH_SIZE_LIMIT: usize = 30;

/// Default capacity of the batching queue.
///
/// Events offered while the queue is full are dropped and counted.
pub const DEFAULT_QUEUE_LIMIT: usize = 100_000;

/// Upper bound accepted for the queue capacity.
const MAX_QUEUE_LIMIT: usize = 1 << 30;

/// Default interval between batches.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(5);

/// How a batch is written.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum InsertMode {
    /// One parameterized insert per event, in declaration order.
    RowByRow,
    /// One staged transfer per batch, in effective column order.
    #[default]
    Bulk,
}

/// Arguments passed to table-creation overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableEvent {
    pub table_name: String,
    /// Column names in effective order.
    pub columns: Vec<String>,
}

/// Immutable sink configuration.
#[derive(Clone)]
pub struct SinkOptions {
    pub(crate) target: String,
    pub(crate) table_name: String,
    pub(crate) schema: Schema,
    pub(crate) batch_size_limit: usize,
    pub(crate) queue_limit: usize,
    pub(crate) period: Duration,
    pub(crate) insert_mode: InsertMode,
    pub(crate) auto_create_table: bool,
    pub(crate) on_create_table: Arc<AsyncEvent<CreateTableEvent>>,
    pub(crate) retention: Option<Duration>,
    pub(crate) emit_bulk_warnings: bool,
    pub(crate) format_provider: Option<Arc<dyn FormatProvider>>,
}

impl std::fmt::Debug for SinkOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkOptions")
            .field("table_name", &self.table_name)
            .field("columns", &self.schema.len())
            .field("batch_size_limit", &self.batch_size_limit)
            .field("queue_limit", &self.queue_limit)
            .field("period", &self.period)
            .field("insert_mode", &self.insert_mode)
            .field("auto_create_table", &self.auto_create_table)
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

impl SinkOptions {
    pub fn builder(target: impl Into<String>, table_name: impl Into<String>) -> SinkOptionsBuilder {
        SinkOptionsBuilder::new(target, table_name)
    }

    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[inline]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[inline]
    pub fn batch_size_limit(&self) -> usize {
        self.batch_size_limit
    }

    #[inline]
    pub fn queue_limit(&self) -> usize {
        self.queue_limit
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }

    #[inline]
    pub fn insert_mode(&self) -> InsertMode {
        self.insert_mode
    }

    #[inline]
    pub fn auto_create_table(&self) -> bool {
        self.auto_create_table
    }

    /// Retention window; `None` disables purging.
    #[inline]
    pub fn retention(&self) -> Option<Duration> {
        self.retention
    }

    #[inline]
    pub fn emit_bulk_warnings(&self) -> bool {
        self.emit_bulk_warnings
    }

    /// Copy with a different insert mode.
    pub(crate) fn with_insert_mode(mut self, mode: InsertMode) -> Self {
        self.insert_mode = mode;
        self
    }
}

/// Builder for [`SinkOptions`].
pub struct SinkOptionsBuilder {
    target: String,
    table_name: String,
    schema: Option<Schema>,
    batch_size_limit: usize,
    queue_limit: usize,
    period: Duration,
    insert_mode: InsertMode,
    auto_create_table: bool,
    on_create_table: AsyncEvent<CreateTableEvent>,
    retention: Option<Duration>,
    emit_bulk_warnings: bool,
    format_provider: Option<Arc<dyn FormatProvider>>,
}

impl SinkOptionsBuilder {
    /// Create a builder for `table_name` at `target`.
    ///
    /// Defaults: default column set, batches of 30 every 5s, bulk inserts,
    /// no table auto-creation, no retention.
    pub fn new(target: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            table_name: table_name.into(),
            schema: None,
            batch_size_limit: DEFAULT_BATCH_SIZE_LIMIT,
            queue_limit: DEFAULT_QUEUE_LIMIT,
            period: DEFAULT_PERIOD,
            insert_mode: InsertMode::default(),
            auto_create_table: false,
            on_create_table: AsyncEvent::new(),
            retention: None,
            emit_bulk_warnings: false,
            format_provider: None,
        }
    }

    /// Replace the default column set.
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn batch_size_limit(mut self, limit: usize) -> Self {
        self.batch_size_limit = limit;
        self
    }

    pub fn queue_limit(mut self, limit: usize) -> Self {
        self.queue_limit = limit;
        self
    }

    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn insert_mode(mut self, mode: InsertMode) -> Self {
        self.insert_mode = mode;
        self
    }

    pub fn auto_create_table(mut self, enabled: bool) -> Self {
        self.auto_create_table = enabled;
        self
    }

    /// Replace table creation with `handler`. The generated DDL is not executed
    /// when at least one handler is registered.
    pub fn on_create_table<F>(self, handler: F) -> Self
    where
        F: Fn(&CreateTableEvent) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.on_create_table.add_handler(handler);
        self
    }

    /// Async form of [`on_create_table`](Self::on_create_table).
    pub fn on_create_table_async<F, Fut>(self, handler: F) -> Self
    where
        F: Fn(CreateTableEvent) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.on_create_table.add_async_handler(handler);
        self
    }

    /// Delete rows older than `retention` after each batch. Zero disables purging.
    pub fn retention(mut self, retention: Duration) -> Self {
        self.retention = (!retention.is_zero()).then_some(retention);
        self
    }

    /// Log diagnostics when a bulk transfer inserts fewer rows than submitted.
    pub fn emit_bulk_warnings(mut self, enabled: bool) -> Self {
        self.emit_bulk_warnings = enabled;
        self
    }

    pub fn format_provider(mut self, provider: Arc<dyn FormatProvider>) -> Self {
        self.format_provider = Some(provider);
        self
    }

    /// Validate and freeze the options.
    pub fn build(self) -> Result<SinkOptions, SinkError> {
        if self.target.trim().is_empty() {
            return Err(SinkError::Config("connection target is empty".into()));
        }

        let table_name = normalize_identifier(self.table_name.trim());
        if table_name.is_empty() {
            return Err(SinkError::Config("table name is empty".into()));
        }

        let schema = self.schema.unwrap_or_else(Schema::default_columns);
        schema.validate()?;

        if self.batch_size_limit == 0 {
            return Err(SinkError::Config("batch size limit must be positive".into()));
        }
        if self.queue_limit == 0 {
            return Err(SinkError::Config("queue limit must be positive".into()));
        }
        if self.period.is_zero() {
            return Err(SinkError::Config("batch period must be positive".into()));
        }
        if self.retention.is_some() && schema.timestamp_column().is_none() {
            return Err(SinkError::Config(
                "retention requires a timestamp column".into(),
            ));
        }

        Ok(SinkOptions {
            target: self.target,
            table_name,
            schema,
            batch_size_limit: self.batch_size_limit,
            queue_limit: self.queue_limit.min(MAX_QUEUE_LIMIT),
            period: self.period,
            insert_mode: self.insert_mode,
            auto_create_table: self.auto_create_table,
            on_create_table: Arc::new(self.on_create_table),
            retention: self.retention,
            emit_bulk_warnings: self.emit_bulk_warnings,
            format_provider: self.format_provider,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnWriter;
    use std::str::FromStr;

    const TARGET: &str = "mysql://localhost/logs";

    #[test]
    fn test_defaults() {
        let options = SinkOptions::builder(TARGET, "logs").build().unwrap();
        assert_eq!(options.batch_size_limit(), 30);
        assert_eq!(options.queue_limit(), DEFAULT_QUEUE_LIMIT);
        assert_eq!(options.period(), Duration::from_secs(5));
        assert_eq!(options.insert_mode(), InsertMode::Bulk);
        assert!(!options.auto_create_table());
        assert_eq!(options.retention(), None);
        assert_eq!(options.schema(), &Schema::default_columns());
    }

    #[test]
    fn test_table_name_is_normalized() {
        let options = SinkOptions::builder(TARGET, "`app_logs`").build().unwrap();
        assert_eq!(options.table_name(), "app_logs");
    }

    #[test]
    fn test_rejects_empty_names() {
        assert!(matches!(
            SinkOptions::builder(TARGET, "``").build(),
            Err(SinkError::Config(_))
        ));
        assert!(matches!(
            SinkOptions::builder("  ", "logs").build(),
            Err(SinkError::Config(_))
        ));
    }

    #[test]
    fn test_retention_requires_timestamp_column() {
        let schema = Schema::new().with_column("message", ColumnWriter::rendered_message());
        let result = SinkOptions::builder(TARGET, "logs")
            .schema(schema.clone())
            .retention(Duration::from_secs(3600))
            .build();
        assert!(matches!(result, Err(SinkError::Config(_))));

        // Zero retention disables purging, so no timestamp column is needed.
        let options = SinkOptions::builder(TARGET, "logs")
            .schema(schema)
            .retention(Duration::ZERO)
            .build()
            .unwrap();
        assert_eq!(options.retention(), None);
    }

    #[test]
    fn test_rejects_zero_limits() {
        assert!(SinkOptions::builder(TARGET, "logs").batch_size_limit(0).build().is_err());
        assert!(SinkOptions::builder(TARGET, "logs").queue_limit(0).build().is_err());
        assert!(SinkOptions::builder(TARGET, "logs").period(Duration::ZERO).build().is_err());
    }

    #[test]
    fn test_create_table_handlers_registered() {
        let options = SinkOptions::builder(TARGET, "logs")
            .on_create_table(|_| Ok(()))
            .on_create_table_async(|_| async { Ok(()) })
            .build()
            .unwrap();
        assert_eq!(options.on_create_table.handler_count(), 2);
    }

    #[test]
    fn test_insert_mode_parse() {
        assert_eq!(InsertMode::from_str("row_by_row").unwrap(), InsertMode::RowByRow);
        assert_eq!(InsertMode::from_str("BULK").unwrap(), InsertMode::Bulk);
    }
}
