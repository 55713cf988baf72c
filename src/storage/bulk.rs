//! In-memory staging buffer for bulk transfer.

use crate::column::{ColumnWriter, NativeType, SqlValue};
use crate::event::{FormatProvider, LogEvent};
use crate::storage::SinkError;

/// A staging column: destination name plus the native type cells are coerced to.
#[derive(Debug, Clone, PartialEq)]
pub struct StagingColumn {
    pub name: String,
    pub native_type: Option<NativeType>,
}

/// Typed rows ready for a bulk transfer.
///
/// Staging column `i` maps to destination column `columns[i].name`.
#[derive(Debug, Clone, Default)]
pub struct StagingBuffer {
    columns: Vec<StagingColumn>,
    rows: Vec<Vec<SqlValue>>,
}

impl StagingBuffer {
    /// Extract and coerce one row per event.
    ///
    /// `columns` must already be in effective order and exclude skipped columns.
    pub fn build(
        columns: &[(&str, &ColumnWriter)],
        events: &[LogEvent],
        provider: Option<&dyn FormatProvider>,
    ) -> Result<Self, SinkError> {
        let staging: Vec<StagingColumn> = columns
            .iter()
            .map(|(name, writer)| StagingColumn {
                name: name.to_string(),
                native_type: writer.native_type(),
            })
            .collect();

        let mut rows = Vec::with_capacity(events.len());
        for event in events {
            let mut row = Vec::with_capacity(columns.len());
            for ((_, writer), column) in columns.iter().zip(&staging) {
                let value = writer.extract(event, provider)?;
                let value = match column.native_type {
                    Some(native) => {
                        value
                            .coerce(native)
                            .map_err(|reason| SinkError::ValueConversion {
                                column: column.name.clone(),
                                reason,
                            })?
                    }
                    None => value,
                };
                row.push(value);
            }
            rows.push(row);
        }

        Ok(Self {
            columns: staging,
            rows,
        })
    }

    #[inline]
    pub fn columns(&self) -> &[StagingColumn] {
        &self.columns
    }

    #[inline]
    pub fn rows(&self) -> &[Vec<SqlValue>] {
        &self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Destination column names in ordinal order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Take ownership of the columns and rows.
    pub fn into_parts(self) -> (Vec<StagingColumn>, Vec<Vec<SqlValue>>) {
        (self.columns, self.rows)
    }
}
