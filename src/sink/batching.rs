//! Batching sink: bounded queue plus a writer task.
//!
//! Events are offered with a non-blocking `try_send`. The writer task owns
//! the buffer and emits a batch when it reaches the size limit or when the
//! period elapses. Periods without events run the engine's heartbeat.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::event::LogEvent;
use crate::storage::{PersistenceEngine, SinkError, SinkOptions};

// =============================================================================
// Commands
// =============================================================================

/// Commands sent to the writer task.
#[derive(Debug)]
enum Command {
    /// Buffer one event.
    Emit(LogEvent),
    /// Emit whatever is buffered, then acknowledge.
    Flush(oneshot::Sender<()>),
    /// Emit whatever is buffered and stop.
    Shutdown,
}

// =============================================================================
// Sink
// =============================================================================

/// Queue-backed sink that writes in batches.
pub struct BatchingSink {
    tx: mpsc::Sender<Command>,
    engine: Arc<PersistenceEngine>,
    dropped_events: Arc<AtomicU64>,
    handle: JoinHandle<()>,
}

impl std::fmt::Debug for BatchingSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchingSink")
            .field("dropped_events", &self.dropped_events())
            .finish_non_exhaustive()
    }
}

impl BatchingSink {
    /// Build an engine from `options` and start the writer task.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn spawn(options: SinkOptions) -> Result<Self, SinkError> {
        Ok(Self::with_engine(PersistenceEngine::new(options)?))
    }

    /// Start the writer task over an existing engine.
    pub fn with_engine(engine: PersistenceEngine) -> Self {
        let options = engine.options();
        let (tx, rx) = mpsc::channel(options.queue_limit());
        let worker = BatchWorker {
            batch_size_limit: options.batch_size_limit(),
            period: options.period(),
            buffer: Vec::with_capacity(options.batch_size_limit()),
            engine: Arc::new(engine),
            rx,
        };
        let engine = Arc::clone(&worker.engine);
        let handle = tokio::spawn(worker.run());

        Self {
            tx,
            engine,
            dropped_events: Arc::new(AtomicU64::new(0)),
            handle,
        }
    }

    /// Offer an event without blocking.
    ///
    /// When the queue is full the event is dropped and counted.
    pub fn emit(&self, event: LogEvent) -> Result<(), SinkError> {
        match self.tx.try_send(Command::Emit(event)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Queue full, dropping log event");
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                Err(SinkError::ChannelSend)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SinkError::ChannelSend),
        }
    }

    /// Total events dropped because the queue was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// The engine the writer task feeds.
    pub fn engine(&self) -> &PersistenceEngine {
        &self.engine
    }

    /// Emit everything queued so far and wait for it to be written.
    pub async fn flush(&self) -> Result<(), SinkError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(Command::Flush(ack_tx))
            .await
            .map_err(|_| SinkError::ChannelSend)?;
        ack_rx.await.map_err(|_| SinkError::ChannelSend)
    }

    /// Flush, stop the writer task and close the connection pool.
    pub async fn shutdown(self) -> Result<(), SinkError> {
        // A closed channel means the task already stopped.
        let _ = self.tx.send(Command::Shutdown).await;
        self.handle
            .await
            .map_err(|e| SinkError::Internal(format!("batching task failed: {e}")))?;
        self.engine.close().await;
        Ok(())
    }
}

// =============================================================================
// Writer Task
// =============================================================================

struct BatchWorker {
    engine: Arc<PersistenceEngine>,
    rx: mpsc::Receiver<Command>,
    buffer: Vec<LogEvent>,
    batch_size_limit: usize,
    period: Duration,
}

impl BatchWorker {
    async fn run(mut self) {
        tracing::info!(
            table = %self.engine.options().table_name(),
            batch_size_limit = self.batch_size_limit,
            period = ?self.period,
            "Batching sink started"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(Command::Emit(event)) => {
                        self.buffer.push(event);
                        if self.buffer.len() >= self.batch_size_limit {
                            self.flush().await;
                        }
                    }
                    Some(Command::Flush(ack)) => {
                        self.flush().await;
                        let _ = ack.send(());
                    }
                    Some(Command::Shutdown) | None => {
                        self.flush().await;
                        break;
                    }
                },
                _ = ticker.tick() => {
                    if self.buffer.is_empty() {
                        self.engine.on_empty_batch().await;
                    } else {
                        self.flush().await;
                    }
                }
            }
        }

        tracing::info!("Batching sink stopped");
    }

    async fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let batch = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.batch_size_limit));
        if let Err(e) = self.engine.emit_batch(&batch).await {
            tracing::error!(error = %e, count = batch.len(), "Batch emission failed, events discarded");
        }
    }
}
