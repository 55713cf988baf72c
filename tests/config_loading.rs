//! Configuration file loading through to a working sink.

use std::io::Write;
use std::time::Duration;

use logsink::config::{ConfigError, SinkConfig};
use logsink::{AuditSink, InsertMode, Level, LogEvent};
use sqlx::Row;
use sqlx::sqlite::SqlitePool;

fn write_config(dir: &tempfile::TempDir, yaml: &str) -> std::path::PathBuf {
    let path = dir.path().join("logsink.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    path
}

#[test]
fn test_load_missing_file() {
    let err = SinkConfig::load("/nonexistent/logsink.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::IoError(_)));
}

#[test]
fn test_load_invalid_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "connection: [unterminated");
    let err = SinkConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn test_load_rejects_unknown_writer() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
connection: sqlite://logs.db
table_name: logs
columns:
  message: { writer: stack_trace }
"#,
    );
    assert!(matches!(
        SinkConfig::load(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn test_sample_config_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/configs/logsink.yaml");
    let config = SinkConfig::load(path).unwrap();
    assert_eq!(config.table_name, "logs");
    assert_eq!(config.insert_mode, InsertMode::Bulk);
    assert_eq!(config.retention, Some(Duration::from_secs(7 * 86_400)));

    let schema = config.schema().unwrap();
    assert_eq!(schema.len(), 7);
    assert_eq!(schema.timestamp_column(), Some("timestamp"));
}

#[tokio::test]
async fn test_named_connection_drives_sink() {
    let dir = tempfile::tempdir().unwrap();
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("audit.db").display());
    let path = write_config(
        &dir,
        &format!(
            r#"
connection: audit
connection_strings:
  audit: "{db_url}"
table_name: "`audit_log`"
auto_create_table: true
columns:
  ts: {{ writer: timestamp, order: 1 }}
  message: {{ writer: rendered_message, order: 2 }}
  amount: {{ writer: property, property: Amount, format: F2, order: 3 }}
"#
        ),
    );

    let config = SinkConfig::load(&path).unwrap();
    let sink = AuditSink::new(config.into_options().unwrap()).unwrap();
    sink.emit(&LogEvent::new(Level::Information, "Charged {Amount}").with_property("Amount", 12.5))
        .await
        .unwrap();
    sink.close().await;

    let pool = SqlitePool::connect(&db_url).await.unwrap();
    let row = sqlx::query("SELECT message, amount FROM audit_log")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.get::<String, _>("message"), "Charged 12.5");
    assert_eq!(row.get::<String, _>("amount"), "12.50");
}
