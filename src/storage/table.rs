//! Table DDL generation and creation.

use sqlx::{AnyConnection, Executor};

use crate::column::ColumnWriter;
use crate::schema::Schema;
use crate::storage::SinkError;

/// Build an idempotent `CREATE TABLE IF NOT EXISTS` statement.
///
/// Columns appear in the order given; identifiers are expected to be
/// normalized already.
///
/// # Errors
///
/// [`SinkError::UnmappedType`] when a column's declared type has no DDL mapping.
pub fn create_table_sql<'a, I>(table_name: &str, columns: I) -> Result<String, SinkError>
where
    I: IntoIterator<Item = (&'a str, &'a ColumnWriter)>,
{
    let definitions = columns
        .into_iter()
        .map(|(name, writer)| {
            writer
                .ddl_fragment()
                .map(|fragment| format!(" `{name}` {fragment}"))
                .ok_or_else(|| SinkError::UnmappedType {
                    column: name.to_string(),
                    db_type: writer.db_type(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS `{table_name}` (\n{}\n);",
        definitions.join(",\n")
    ))
}

/// Creates the log table on a borrowed connection.
pub struct TableCreator;

impl TableCreator {
    /// Execute the DDL for `schema` in effective column order. A no-op on the
    /// server if the table exists.
    pub async fn create(
        conn: &mut AnyConnection,
        table_name: &str,
        schema: &Schema,
    ) -> Result<(), SinkError> {
        let ddl = create_table_sql(table_name, schema.effective_columns())?;
        conn.execute(sqlx::raw_sql(&ddl)).await?;
        tracing::info!(table = %table_name, "Log table ensured");
        Ok(())
    }
}
