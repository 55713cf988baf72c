//! Table Schema
//!
//! An ordered mapping from column name to [`ColumnWriter`]. Declaration order
//! drives inserts; the ordering policy below drives table creation and bulk
//! staging.
//!
//! # Ordering Policy
//!
//! When *every* writer carries an `order`, the effective order is ascending by
//! order (stable for ties). If even one writer lacks an order, declaration
//! order is used for all columns.

use indexmap::IndexMap;

use crate::column::{ColumnKind, ColumnWriter};
use crate::storage::SinkError;

/// Quote characters stripped from table and column identifiers.
const QUOTE_CHARS: [char; 3] = ['`', '"', '\''];

/// Column names of the default schema.
pub mod column_names {
    pub const RENDERED_MESSAGE: &str = "message";
    pub const MESSAGE_TEMPLATE: &str = "message_template";
    pub const LEVEL: &str = "level";
    pub const TIMESTAMP: &str = "timestamp";
    pub const EXCEPTION: &str = "exception";
    pub const LOG_EVENT: &str = "log_event";
}

/// Strip quoting characters so identifiers can be safely backtick-quoted.
///
/// Idempotent.
pub fn normalize_identifier(name: &str) -> String {
    name.chars().filter(|c| !QUOTE_CHARS.contains(c)).collect()
}

/// Ordered set of named column writers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    columns: IndexMap<String, ColumnWriter>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default column set: message, message_template, level, timestamp,
    /// exception, log_event.
    pub fn default_columns() -> Self {
        use column_names::*;

        Self::new()
            .with_column(RENDERED_MESSAGE, ColumnWriter::rendered_message())
            .with_column(MESSAGE_TEMPLATE, ColumnWriter::message_template())
            .with_column(LEVEL, ColumnWriter::level())
            .with_column(TIMESTAMP, ColumnWriter::timestamp())
            .with_column(EXCEPTION, ColumnWriter::exception())
            .with_column(LOG_EVENT, ColumnWriter::serialized_event())
    }

    /// Builder form of [`Schema::insert`].
    pub fn with_column(mut self, name: &str, writer: ColumnWriter) -> Self {
        self.insert(name, writer);
        self
    }

    /// Add a column under its normalized name.
    ///
    /// If the normalized name already exists the writer is replaced in place
    /// (the column keeps its original position) and the old writer returned.
    pub fn insert(&mut self, name: &str, writer: ColumnWriter) -> Option<ColumnWriter> {
        let key = normalize_identifier(name);
        let previous = self.columns.insert(key.clone(), writer);
        if previous.is_some() {
            tracing::warn!(column = %key, raw_name = %name, "Column name collision, last definition wins");
        }
        previous
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnWriter> {
        self.columns.get(&normalize_identifier(name))
    }

    /// Columns in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnWriter)> {
        self.columns.iter().map(|(name, writer)| (name.as_str(), writer))
    }

    /// Whether every column carries an explicit order.
    pub fn is_fully_ordered(&self) -> bool {
        self.columns.values().all(|writer| writer.order().is_some())
    }

    /// Columns in effective order (see the module docs).
    pub fn effective_columns(&self) -> Vec<(&str, &ColumnWriter)> {
        let mut columns: Vec<_> = self.iter().collect();
        if self.is_fully_ordered() {
            // Stable sort keeps declaration order for equal orders.
            columns.sort_by_key(|(_, writer)| writer.order());
        }
        columns
    }

    /// Columns that receive values on insert, in declaration order.
    pub fn insertable_columns(&self) -> impl Iterator<Item = (&str, &ColumnWriter)> {
        self.iter().filter(|(_, writer)| !writer.skip_on_insert())
    }

    /// First timestamp column in declaration order.
    pub fn timestamp_column(&self) -> Option<&str> {
        self.iter()
            .find(|(_, writer)| writer.is_timestamp())
            .map(|(name, _)| name)
    }

    /// Reject empty schemas, empty column names and schemas with nothing to insert.
    pub fn validate(&self) -> Result<(), SinkError> {
        if self.is_empty() {
            return Err(SinkError::Config("schema has no columns".into()));
        }
        if self.columns.keys().any(|name| name.trim().is_empty()) {
            return Err(SinkError::Config(
                "column name is empty after normalization".into(),
            ));
        }
        if let Some((name, _)) = self.columns.iter().find(|(_, writer)| {
            matches!(writer.kind(), ColumnKind::AutoIncrementId) && !writer.skip_on_insert()
        }) {
            return Err(SinkError::Config(format!(
                "auto-increment column `{name}` must be skipped on insert"
            )));
        }
        if self.insertable_columns().next().is_none() {
            return Err(SinkError::Config(
                "schema has no insertable columns".into(),
            ));
        }
        Ok(())
    }
}

impl<'a> FromIterator<(&'a str, ColumnWriter)> for Schema {
    fn from_iter<I: IntoIterator<Item = (&'a str, ColumnWriter)>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for (name, writer) in iter {
            schema.insert(name, writer);
        }
        schema
    }
}
