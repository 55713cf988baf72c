//! Pipeline Adapters
//!
//! Front-ends that feed a [`PersistenceEngine`](crate::storage::PersistenceEngine):
//!
//! - [`BatchingSink`]: Non-blocking enqueue; a background task emits batches by size or period
//! - [`AuditSink`]: One event per call, written immediately, every error returned to the caller

mod audit;
mod batching;

pub use audit::AuditSink;
pub use batching::BatchingSink;
