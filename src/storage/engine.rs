//! Persistence engine.
//!
//! Turns a batch of events into rows of the configured table:
//!
//! 1. Ensure the table exists (once, when auto-creation is enabled)
//! 2. Write the batch row-by-row or as one staged bulk transfer
//! 3. Purge rows older than the retention window, if one is set
//!
//! Each step runs on its own pooled connection, released on every exit path.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Duration;

use chrono::Utc;
use sqlx::{Any, Executor, Row, Transaction};

use crate::column::format_timestamp;
use crate::event::LogEvent;
use crate::storage::SinkError;
use crate::storage::bulk::StagingBuffer;
use crate::storage::db::{Backend, DbPool, with_local_infile};
use crate::storage::options::{CreateTableEvent, InsertMode, SinkOptions};
use crate::storage::statement::{
    bind_value, bulk_insert_sql, insert_sql, purge_sql, rows_per_statement,
};
use crate::storage::table::TableCreator;

const HEARTBEAT_UNKNOWN: u8 = 0;
const HEARTBEAT_OK: u8 = 1;
const HEARTBEAT_FAILED: u8 = 2;

/// Writes batches of log events into one table.
///
/// Safe to share across tasks. Table creation is guarded by a plain
/// check-then-set flag: two batches racing on first use may both run the
/// creation step, which is harmless because the DDL is idempotent.
pub struct PersistenceEngine {
    options: SinkOptions,
    pool: DbPool,
    table_created: AtomicBool,
    heartbeat: AtomicU8,
}

impl std::fmt::Debug for PersistenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceEngine")
            .field("table_name", &self.options.table_name)
            .field("insert_mode", &self.options.insert_mode)
            .field("table_created", &self.is_table_created())
            .finish_non_exhaustive()
    }
}

impl PersistenceEngine {
    /// Create an engine. No connection is opened until the first batch.
    ///
    /// In bulk mode, MySQL-family targets get the bulk-transfer flag enabled.
    pub fn new(options: SinkOptions) -> Result<Self, SinkError> {
        let target = match (options.insert_mode, Backend::from_target(&options.target)) {
            (InsertMode::Bulk, Backend::MySql) => with_local_infile(&options.target),
            _ => options.target.clone(),
        };
        let pool = DbPool::connect_lazy(&target)?;

        Ok(Self {
            table_created: AtomicBool::new(!options.auto_create_table),
            options,
            pool,
            heartbeat: AtomicU8::new(HEARTBEAT_UNKNOWN),
        })
    }

    #[inline]
    pub fn options(&self) -> &SinkOptions {
        &self.options
    }

    /// Whether this engine has completed its table-creation step.
    ///
    /// Starts `true` when auto-creation is disabled.
    pub fn is_table_created(&self) -> bool {
        self.table_created.load(Ordering::Acquire)
    }

    /// Result of the most recent heartbeat; `None` before the first one.
    pub fn heartbeat_status(&self) -> Option<bool> {
        match self.heartbeat.load(Ordering::Relaxed) {
            HEARTBEAT_OK => Some(true),
            HEARTBEAT_FAILED => Some(false),
            _ => None,
        }
    }

    // ========================================================================
    // Batch emission
    // ========================================================================

    /// Persist `events`. An empty slice is a no-op.
    ///
    /// # Errors
    ///
    /// Any failure (connect, create, write, purge) aborts the call and is
    /// returned as-is. A failed bulk transfer leaves no rows from the batch.
    pub async fn emit_batch(&self, events: &[LogEvent]) -> Result<(), SinkError> {
        if events.is_empty() {
            return Ok(());
        }

        self.ensure_table().await?;

        let inserted = match self.options.insert_mode {
            InsertMode::RowByRow => self.insert_rows(events).await?,
            InsertMode::Bulk => self.bulk_insert(events).await?,
        };
        tracing::debug!(
            table = %self.options.table_name,
            mode = %self.options.insert_mode,
            events = events.len(),
            inserted,
            "Batch written"
        );

        if let Some(retention) = self.options.retention {
            self.purge_expired(retention).await?;
        }
        Ok(())
    }

    /// Connectivity probe for periods without events. Never fails; the
    /// outcome is recorded for [`heartbeat_status`](Self::heartbeat_status).
    pub async fn on_empty_batch(&self) {
        let state = match self.heartbeat().await {
            Ok(()) => HEARTBEAT_OK,
            Err(e) => {
                tracing::debug!(error = %e, "Heartbeat failed");
                HEARTBEAT_FAILED
            }
        };
        self.heartbeat.store(state, Ordering::Relaxed);
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ========================================================================
    // Steps
    // ========================================================================

    async fn ensure_table(&self) -> Result<(), SinkError> {
        if !self.options.auto_create_table || self.table_created.load(Ordering::Acquire) {
            return Ok(());
        }

        if self.options.on_create_table.has_handlers() {
            let args = CreateTableEvent {
                table_name: self.options.table_name.clone(),
                columns: self
                    .options
                    .schema
                    .effective_columns()
                    .into_iter()
                    .map(|(name, _)| name.to_string())
                    .collect(),
            };
            self.options.on_create_table.try_invoke(args).await;
        } else {
            let mut conn = self.pool.inner().acquire().await?;
            TableCreator::create(&mut conn, &self.options.table_name, &self.options.schema).await?;
        }

        self.table_created.store(true, Ordering::Release);
        Ok(())
    }

    /// One parameterized insert per event, columns in declaration order.
    ///
    /// Every row is extracted before the first statement runs, so a bad value
    /// writes nothing.
    async fn insert_rows(&self, events: &[LogEvent]) -> Result<u64, SinkError> {
        let (sql, rows) = {
            let provider = self.options.format_provider.as_deref();
            let columns: Vec<_> = self.options.schema.insertable_columns().collect();
            let sql = insert_sql(
                &self.options.table_name,
                columns.iter().map(|(name, _)| *name),
            );
            let rows = events
                .iter()
                .map(|event| {
                    columns
                        .iter()
                        .map(|(_, writer)| writer.extract(event, provider))
                        .collect::<Result<Vec<_>, _>>()
                })
                .collect::<Result<Vec<_>, _>>()?;
            (sql, rows)
        };

        let mut conn = self.pool.inner().acquire().await?;
        let mut inserted = 0;
        for row in rows {
            let mut query = sqlx::query(&sql);
            for cell in row {
                query = bind_value(query, cell);
            }
            inserted += query.execute(&mut *conn).await?.rows_affected();
        }
        Ok(inserted)
    }

    /// Stage the whole batch, then transfer it inside one transaction.
    ///
    /// Rows the server rejects are skipped, not fatal; the shortfall is
    /// reported when `emit_bulk_warnings` is set.
    async fn bulk_insert(&self, events: &[LogEvent]) -> Result<u64, SinkError> {
        let buffer = {
            let columns: Vec<_> = self
                .options
                .schema
                .effective_columns()
                .into_iter()
                .filter(|(_, writer)| !writer.skip_on_insert())
                .collect();
            StagingBuffer::build(&columns, events, self.options.format_provider.as_deref())?
        };
        let submitted = buffer.len() as u64;
        let (columns, mut rows) = buffer.into_parts();
        let names: Vec<String> = columns.into_iter().map(|c| c.name).collect();
        let per_statement = rows_per_statement(names.len());
        let backend = self.pool.backend();

        let mut tx = self.pool.inner().begin().await?;
        let mut inserted = 0;
        while !rows.is_empty() {
            let chunk: Vec<_> = rows.drain(..per_statement.min(rows.len())).collect();
            let sql = bulk_insert_sql(
                backend,
                &self.options.table_name,
                names.iter().map(String::as_str),
                chunk.len(),
            );
            let mut query = sqlx::query(&sql);
            for cell in chunk.into_iter().flatten() {
                query = bind_value(query, cell);
            }
            inserted += query.execute(&mut *tx).await?.rows_affected();
        }

        if self.options.emit_bulk_warnings && inserted < submitted {
            self.report_bulk_warnings(&mut tx, inserted, submitted).await;
        }
        tx.commit().await?;
        Ok(inserted)
    }

    /// Best-effort diagnostics for a partial bulk transfer.
    async fn report_bulk_warnings(
        &self,
        tx: &mut Transaction<'static, Any>,
        inserted: u64,
        submitted: u64,
    ) {
        tracing::warn!(
            table = %self.options.table_name,
            inserted,
            submitted,
            "Bulk transfer inserted fewer rows than submitted"
        );
        if self.pool.backend() != Backend::MySql {
            return;
        }

        match (&mut **tx).fetch_all(sqlx::raw_sql("SHOW WARNINGS")).await {
            Ok(rows) => {
                for row in rows {
                    let code: i64 = row.try_get("Code").unwrap_or_default();
                    let message: String = row.try_get("Message").unwrap_or_default();
                    tracing::warn!(code, message = %message, "Bulk transfer warning");
                }
            }
            Err(e) => tracing::debug!(error = %e, "Could not read bulk transfer warnings"),
        }
    }

    /// Delete rows whose first timestamp column is older than `retention`.
    async fn purge_expired(&self, retention: Duration) -> Result<u64, SinkError> {
        let column = self.options.schema.timestamp_column().ok_or_else(|| {
            SinkError::Config("retention requires a timestamp column".into())
        })?;
        let window = chrono::Duration::from_std(retention)
            .map_err(|e| SinkError::Config(format!("retention out of range: {e}")))?;
        let Some(cutoff) = Utc::now().checked_sub_signed(window) else {
            return Ok(0);
        };

        let sql = purge_sql(&self.options.table_name, column);
        let mut conn = self.pool.inner().acquire().await?;
        let deleted = sqlx::query(&sql)
            .bind(format_timestamp(&cutoff))
            .execute(&mut *conn)
            .await?
            .rows_affected();

        if deleted > 0 {
            tracing::info!(
                table = %self.options.table_name,
                deleted,
                cutoff = %cutoff,
                "Expired log rows purged"
            );
        }
        Ok(deleted)
    }

    async fn heartbeat(&self) -> Result<(), SinkError> {
        let mut conn = self.pool.inner().acquire().await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::column::ColumnWriter;

    fn sqlite_target(dir: &tempfile::TempDir) -> String {
        format!("sqlite://{}?mode=rwc", dir.path().join("engine.db").display())
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let options = SinkOptions::builder(sqlite_target(&dir), "logs")
            .auto_create_table(true)
            .build()
            .unwrap();
        let engine = PersistenceEngine::new(options).unwrap();

        engine.emit_batch(&[]).await.unwrap();
        assert!(!engine.is_table_created());
    }

    #[tokio::test]
    async fn test_heartbeat_records_status() {
        let dir = tempfile::tempdir().unwrap();
        let options = SinkOptions::builder(sqlite_target(&dir), "logs").build().unwrap();
        let engine = PersistenceEngine::new(options).unwrap();
        assert_eq!(engine.heartbeat_status(), None);

        engine.on_empty_batch().await;
        assert_eq!(engine.heartbeat_status(), Some(true));
    }

    #[tokio::test]
    async fn test_heartbeat_failure_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing").join("x.db");
        let options = SinkOptions::builder(format!("sqlite://{}", missing.display()), "logs")
            .build()
            .unwrap();
        let engine = PersistenceEngine::new(options).unwrap();

        engine.on_empty_batch().await;
        assert_eq!(engine.heartbeat_status(), Some(false));
    }

    #[tokio::test]
    async fn test_unmapped_type_fails_before_insert() {
        let dir = tempfile::tempdir().unwrap();
        let schema = Schema::new()
            .with_column("message", ColumnWriter::rendered_message())
            .with_column(
                "shape",
                ColumnWriter::property("Shape").with_db_type(crate::column::DbType::Geometry),
            );
        let options = SinkOptions::builder(sqlite_target(&dir), "logs")
            .schema(schema)
            .auto_create_table(true)
            .build()
            .unwrap();
        let engine = PersistenceEngine::new(options).unwrap();

        let err = engine
            .emit_batch(&[LogEvent::new(crate::event::Level::Information, "x")])
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::UnmappedType { .. }));
        assert!(!engine.is_table_created());
    }

    #[tokio::test]
    async fn test_table_created_starts_true_without_auto_create() {
        let dir = tempfile::tempdir().unwrap();
        let manual = SinkOptions::builder(sqlite_target(&dir), "logs").build().unwrap();
        assert!(PersistenceEngine::new(manual).unwrap().is_table_created());

        let automatic = SinkOptions::builder(sqlite_target(&dir), "logs")
            .auto_create_table(true)
            .build()
            .unwrap();
        assert!(!PersistenceEngine::new(automatic).unwrap().is_table_created());
    }

    #[tokio::test]
    async fn test_emit_batch_runs_on_spawned_task() {
        let dir = tempfile::tempdir().unwrap();
        for mode in [InsertMode::RowByRow, InsertMode::Bulk] {
            let options = SinkOptions::builder(sqlite_target(&dir), format!("logs_{mode}"))
                .insert_mode(mode)
                .auto_create_table(true)
                .build()
                .unwrap();
            let engine = std::sync::Arc::new(PersistenceEngine::new(options).unwrap());
            let events = vec![LogEvent::new(crate::event::Level::Information, "spawned")];

            let task_engine = std::sync::Arc::clone(&engine);
            tokio::spawn(async move { task_engine.emit_batch(&events).await })
                .await
                .unwrap()
                .unwrap();
            assert!(engine.is_table_created());
        }
    }
}
