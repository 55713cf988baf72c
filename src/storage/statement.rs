//! SQL text and parameter binding for inserts and purges.

use sqlx::Any;
use sqlx::any::AnyArguments;
use sqlx::query::Query;

use crate::column::{SqlValue, format_timestamp};
use crate::storage::db::Backend;

/// Upper bound on bound parameters per statement (SQLite's historical default).
pub const MAX_BIND_PARAMS: usize = 999;

pub(crate) type AnyQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

fn column_list<'a>(columns: impl IntoIterator<Item = &'a str>) -> String {
    columns
        .into_iter()
        .map(|name| format!("`{name}`"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn placeholders(count: usize) -> String {
    format!("({})", vec!["?"; count].join(", "))
}

/// `INSERT INTO `t` (`a`, `b`) VALUES (?, ?)`
pub fn insert_sql<'a>(table: &str, columns: impl IntoIterator<Item = &'a str>) -> String {
    multi_row_insert_sql(table, columns, 1)
}

/// Multi-row insert with `rows` value tuples.
pub fn multi_row_insert_sql<'a>(
    table: &str,
    columns: impl IntoIterator<Item = &'a str>,
    rows: usize,
) -> String {
    insert_statement("INSERT", table, columns, rows)
}

/// Multi-row insert for bulk transfer.
///
/// Rows the server rejects (duplicate keys, bad values) are skipped with a
/// warning instead of failing the statement, so the affected-row count can
/// fall short of `rows`. Backends without such a form get a plain insert.
pub fn bulk_insert_sql<'a>(
    backend: Backend,
    table: &str,
    columns: impl IntoIterator<Item = &'a str>,
    rows: usize,
) -> String {
    let verb = match backend {
        Backend::MySql => "INSERT IGNORE",
        Backend::Sqlite => "INSERT OR IGNORE",
        Backend::Other => "INSERT",
    };
    insert_statement(verb, table, columns, rows)
}

fn insert_statement<'a>(
    verb: &str,
    table: &str,
    columns: impl IntoIterator<Item = &'a str>,
    rows: usize,
) -> String {
    let columns: Vec<&str> = columns.into_iter().collect();
    let tuple = placeholders(columns.len());
    let values = vec![tuple.as_str(); rows].join(", ");
    format!(
        "{verb} INTO `{table}` ({}) VALUES {values}",
        column_list(columns.iter().copied())
    )
}

/// `DELETE FROM `t` WHERE `ts` < ?`
pub fn purge_sql(table: &str, timestamp_column: &str) -> String {
    format!("DELETE FROM `{table}` WHERE `{timestamp_column}` < ?")
}

/// Rows per multi-row statement so that `columns * rows <= MAX_BIND_PARAMS`.
pub fn rows_per_statement(columns: usize) -> usize {
    (MAX_BIND_PARAMS / columns.max(1)).max(1)
}

/// Bind one cell using the portable types of the `Any` driver.
///
/// Unsigned values beyond `i64::MAX`, timestamps and UUIDs are sent as text.
pub(crate) fn bind_value(query: AnyQuery<'_>, value: SqlValue) -> AnyQuery<'_> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::UInt(u) => match i64::try_from(u) {
            Ok(i) => query.bind(i),
            Err(_) => query.bind(u.to_string()),
        },
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Bytes(b) => query.bind(b),
        SqlValue::DateTime(ts) => query.bind(format_timestamp(&ts)),
        SqlValue::Uuid(u) => query.bind(u.hyphenated().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sql() {
        assert_eq!(
            insert_sql("logs", ["message", "level"]),
            "INSERT INTO `logs` (`message`, `level`) VALUES (?, ?)"
        );
    }

    #[test]
    fn test_multi_row_insert_sql() {
        assert_eq!(
            multi_row_insert_sql("logs", ["a", "b"], 3),
            "INSERT INTO `logs` (`a`, `b`) VALUES (?, ?), (?, ?), (?, ?)"
        );
    }

    #[test]
    fn test_bulk_insert_sql_skips_rejected_rows() {
        assert_eq!(
            bulk_insert_sql(Backend::MySql, "logs", ["a"], 2),
            "INSERT IGNORE INTO `logs` (`a`) VALUES (?), (?)"
        );
        assert_eq!(
            bulk_insert_sql(Backend::Sqlite, "logs", ["a"], 1),
            "INSERT OR IGNORE INTO `logs` (`a`) VALUES (?)"
        );
        assert_eq!(
            bulk_insert_sql(Backend::Other, "logs", ["a"], 1),
            "INSERT INTO `logs` (`a`) VALUES (?)"
        );
    }

    #[test]
    fn test_purge_sql() {
        assert_eq!(
            purge_sql("logs", "ts"),
            "DELETE FROM `logs` WHERE `ts` < ?"
        );
    }

    #[test]
    fn test_rows_per_statement() {
        assert_eq!(rows_per_statement(6), 166);
        assert_eq!(rows_per_statement(1), MAX_BIND_PARAMS);
        assert_eq!(rows_per_statement(2000), 1);
    }
}
