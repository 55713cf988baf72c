//! Batching sink tests against file-backed SQLite.

use std::time::Duration;

use logsink::{BatchingSink, Level, LogEvent, SinkOptions};
use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;

fn sqlite_url(dir: &TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("logs.db").display())
}

async fn count_rows(url: &str) -> i64 {
    let pool = SqlitePool::connect(url).await.unwrap();
    let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM logs")
        .fetch_one(&pool)
        .await
        .map(|row| row.get("n"))
        .unwrap_or(0);
    pool.close().await;
    count
}

/// Poll until the table holds `expected` rows or the deadline passes.
async fn wait_for_rows(url: &str, expected: i64) -> i64 {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let count = count_rows(url).await;
        if count >= expected || tokio::time::Instant::now() >= deadline {
            return count;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

fn event(n: i64) -> LogEvent {
    LogEvent::new(Level::Information, "Event {N}").with_property("N", n)
}

#[tokio::test]
async fn test_flush_writes_buffered_events() {
    let dir = tempfile::tempdir().unwrap();
    let url = sqlite_url(&dir);
    let options = SinkOptions::builder(url.as_str(), "logs")
        .auto_create_table(true)
        .period(Duration::from_secs(3600))
        .build()
        .unwrap();
    let sink = BatchingSink::spawn(options).unwrap();

    sink.emit(event(1)).unwrap();
    sink.emit(event(2)).unwrap();
    sink.flush().await.unwrap();

    assert_eq!(count_rows(&url).await, 2);
    assert_eq!(sink.dropped_events(), 0);
    sink.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_size_limit_triggers_batch() {
    let dir = tempfile::tempdir().unwrap();
    let url = sqlite_url(&dir);
    let options = SinkOptions::builder(url.as_str(), "logs")
        .auto_create_table(true)
        .batch_size_limit(3)
        .period(Duration::from_secs(3600))
        .build()
        .unwrap();
    let sink = BatchingSink::spawn(options).unwrap();

    for n in 0..3 {
        sink.emit(event(n)).unwrap();
    }

    assert_eq!(wait_for_rows(&url, 3).await, 3);
    sink.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_period_triggers_batch() {
    let dir = tempfile::tempdir().unwrap();
    let url = sqlite_url(&dir);
    let options = SinkOptions::builder(url.as_str(), "logs")
        .auto_create_table(true)
        .period(Duration::from_millis(50))
        .build()
        .unwrap();
    let sink = BatchingSink::spawn(options).unwrap();

    sink.emit(event(1)).unwrap();

    assert_eq!(wait_for_rows(&url, 1).await, 1);
    sink.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_flushes_remaining_events() {
    let dir = tempfile::tempdir().unwrap();
    let url = sqlite_url(&dir);
    let options = SinkOptions::builder(url.as_str(), "logs")
        .auto_create_table(true)
        .period(Duration::from_secs(3600))
        .build()
        .unwrap();
    let sink = BatchingSink::spawn(options).unwrap();

    for n in 0..5 {
        sink.emit(event(n)).unwrap();
    }
    sink.shutdown().await.unwrap();

    assert_eq!(count_rows(&url).await, 5);
}

#[tokio::test]
async fn test_idle_period_runs_heartbeat() {
    let dir = tempfile::tempdir().unwrap();
    let options = SinkOptions::builder(sqlite_url(&dir), "logs")
        .period(Duration::from_millis(20))
        .build()
        .unwrap();
    let sink = BatchingSink::spawn(options).unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while sink.engine().heartbeat_status().is_none() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(sink.engine().heartbeat_status(), Some(true));
    sink.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failed_batch_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let url = sqlite_url(&dir);
    // No auto-creation and no table: every batch fails.
    let options = SinkOptions::builder(url.as_str(), "logs")
        .period(Duration::from_secs(3600))
        .build()
        .unwrap();
    let sink = BatchingSink::spawn(options).unwrap();

    sink.emit(event(1)).unwrap();
    sink.flush().await.unwrap();

    // The sink keeps accepting events after a failed batch.
    sink.emit(event(2)).unwrap();
    sink.shutdown().await.unwrap();
}
