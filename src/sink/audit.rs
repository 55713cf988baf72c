//! Audit sink: synchronous, one event per call.

use crate::event::LogEvent;
use crate::storage::{InsertMode, PersistenceEngine, SinkError, SinkOptions};

/// Writes each event immediately with a row insert and returns every error.
///
/// For logs that must not be lost silently: the caller sees connectivity,
/// creation and insert failures and decides what to do.
#[derive(Debug)]
pub struct AuditSink {
    engine: PersistenceEngine,
}

impl AuditSink {
    /// Build the sink. The insert mode is forced to row-by-row.
    pub fn new(options: SinkOptions) -> Result<Self, SinkError> {
        let engine = PersistenceEngine::new(options.with_insert_mode(InsertMode::RowByRow))?;
        Ok(Self { engine })
    }

    pub async fn emit(&self, event: &LogEvent) -> Result<(), SinkError> {
        self.engine.emit_batch(std::slice::from_ref(event)).await
    }

    pub fn engine(&self) -> &PersistenceEngine {
        &self.engine
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.engine.close().await;
    }
}
