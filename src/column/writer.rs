//! Column writer variants.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::{DbType, NativeType, SqlValue};
use crate::event::{FormatProvider, LogEvent, PropertyValue};
use crate::storage::SinkError;

/// DDL suffix appended to an auto-increment column's type.
const AUTO_INCREMENT_SUFFIX: &str = " AUTO_INCREMENT PRIMARY KEY";

/// How a single-property column renders the property value.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PropertyWriteMethod {
    /// The scalar itself (enums as their integral value); JSON text for non-scalars.
    Raw,
    /// Text rendering with the column's format and the configured format provider.
    #[default]
    #[serde(alias = "to_string")]
    #[strum(serialize = "to_string")]
    ToStringFormatted,
    /// JSON text of the value.
    Json,
}

/// What a column writes.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    /// Event level, numeric or textual.
    Level { as_text: bool },
    /// Event timestamp, normalized to UTC.
    Timestamp,
    MessageTemplate,
    RenderedMessage,
    /// Exception text or null.
    Exception,
    /// The whole event as JSON.
    SerializedEvent,
    /// All properties as one JSON object.
    PropertiesAsJson,
    /// Database-generated identity. Never supplies a value.
    AutoIncrementId,
    /// A single named property.
    Property {
        name: String,
        write_method: PropertyWriteMethod,
        format: Option<String>,
    },
}

/// Extracts one column's value from an event and declares its SQL type.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnWriter {
    kind: ColumnKind,
    db_type: DbType,
    order: Option<i32>,
    skip_on_insert: bool,
}

impl ColumnWriter {
    fn new(kind: ColumnKind, db_type: DbType) -> Self {
        Self {
            kind,
            db_type,
            order: None,
            skip_on_insert: false,
        }
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    /// Numeric level (`INT`).
    pub fn level() -> Self {
        Self::new(ColumnKind::Level { as_text: false }, DbType::Int32)
    }

    /// Level name (`TEXT`).
    pub fn level_as_text() -> Self {
        Self::new(ColumnKind::Level { as_text: true }, DbType::Text)
    }

    /// Event timestamp. Always declared as `TIMESTAMP`.
    pub fn timestamp() -> Self {
        Self::new(ColumnKind::Timestamp, DbType::Timestamp)
    }

    pub fn message_template() -> Self {
        Self::new(ColumnKind::MessageTemplate, DbType::Text)
    }

    pub fn rendered_message() -> Self {
        Self::new(ColumnKind::RenderedMessage, DbType::Text)
    }

    pub fn exception() -> Self {
        Self::new(ColumnKind::Exception, DbType::Text)
    }

    pub fn serialized_event() -> Self {
        Self::new(ColumnKind::SerializedEvent, DbType::Json)
    }

    pub fn properties_as_json() -> Self {
        Self::new(ColumnKind::PropertiesAsJson, DbType::Json)
    }

    /// `BIGINT AUTO_INCREMENT PRIMARY KEY`, skipped on insert.
    pub fn auto_increment_id() -> Self {
        let mut writer = Self::new(ColumnKind::AutoIncrementId, DbType::Int64);
        writer.skip_on_insert = true;
        writer
    }

    /// A single property rendered with [`PropertyWriteMethod::ToStringFormatted`] into `TEXT`.
    pub fn property(name: impl Into<String>) -> Self {
        Self::new(
            ColumnKind::Property {
                name: name.into(),
                write_method: PropertyWriteMethod::default(),
                format: None,
            },
            DbType::Text,
        )
    }

    // ========================================================================
    // Modifiers
    // ========================================================================

    /// Override the declared type. Ignored for timestamp columns.
    pub fn with_db_type(mut self, db_type: DbType) -> Self {
        if self.kind != ColumnKind::Timestamp {
            self.db_type = db_type;
        }
        self
    }

    /// Position in the table definition; applies only when every column has one.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_skip_on_insert(mut self, skip: bool) -> Self {
        self.skip_on_insert = skip;
        self
    }

    /// Write method of a property column. No effect on other kinds.
    pub fn with_write_method(mut self, method: PropertyWriteMethod) -> Self {
        if let ColumnKind::Property { write_method, .. } = &mut self.kind {
            *write_method = method;
        }
        self
    }

    /// Format of a property column. No effect on other kinds.
    pub fn with_format(mut self, fmt: impl Into<String>) -> Self {
        if let ColumnKind::Property { format, .. } = &mut self.kind {
            *format = Some(fmt.into());
        }
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    #[inline]
    pub fn db_type(&self) -> DbType {
        self.db_type
    }

    #[inline]
    pub fn order(&self) -> Option<i32> {
        self.order
    }

    #[inline]
    pub fn skip_on_insert(&self) -> bool {
        self.skip_on_insert
    }

    pub fn is_timestamp(&self) -> bool {
        self.kind == ColumnKind::Timestamp
    }

    /// Column type in `CREATE TABLE`, or `None` if the declared type has no mapping.
    pub fn ddl_fragment(&self) -> Option<String> {
        let base = self.db_type.ddl_fragment()?;
        Some(match self.kind {
            ColumnKind::AutoIncrementId => format!("{base}{AUTO_INCREMENT_SUFFIX}"),
            _ => base.to_string(),
        })
    }

    pub fn native_type(&self) -> Option<NativeType> {
        self.db_type.native_type()
    }

    // ========================================================================
    // Extraction
    // ========================================================================

    /// Compute this column's value for `event`.
    ///
    /// # Errors
    ///
    /// [`SinkError::NotInsertable`] for auto-increment columns, which are
    /// filled by the database.
    pub fn extract(
        &self,
        event: &LogEvent,
        provider: Option<&dyn FormatProvider>,
    ) -> Result<SqlValue, SinkError> {
        let value = match &self.kind {
            ColumnKind::Level { as_text: true } => SqlValue::Text(event.level().to_string()),
            ColumnKind::Level { as_text: false } => SqlValue::Int(event.level().as_i32().into()),
            ColumnKind::Timestamp => SqlValue::DateTime(event.timestamp().with_timezone(&Utc)),
            ColumnKind::MessageTemplate => SqlValue::Text(event.message_template().to_string()),
            ColumnKind::RenderedMessage => SqlValue::Text(event.render_message(provider)),
            ColumnKind::Exception => event
                .exception()
                .map_or(SqlValue::Null, |e| SqlValue::Text(e.to_string())),
            ColumnKind::SerializedEvent => {
                SqlValue::Text(serde_json::to_string(&event.to_json(provider))?)
            }
            ColumnKind::PropertiesAsJson => {
                SqlValue::Text(serde_json::to_string(&event.properties_json())?)
            }
            ColumnKind::AutoIncrementId => return Err(SinkError::NotInsertable),
            ColumnKind::Property {
                name,
                write_method,
                format,
            } => match event.property(name) {
                None => SqlValue::Null,
                Some(value) => property_value(value, *write_method, format.as_deref(), provider)?,
            },
        };
        Ok(value)
    }
}

fn property_value(
    value: &PropertyValue,
    method: PropertyWriteMethod,
    format: Option<&str>,
    provider: Option<&dyn FormatProvider>,
) -> Result<SqlValue, SinkError> {
    let value = match method {
        PropertyWriteMethod::Raw => match value.as_scalar() {
            Some(scalar) => SqlValue::from(scalar),
            None => SqlValue::Text(serde_json::to_string(&value.to_json())?),
        },
        PropertyWriteMethod::ToStringFormatted => SqlValue::Text(value.render(format, provider)),
        PropertyWriteMethod::Json => SqlValue::Text(serde_json::to_string(&value.to_json())?),
    };
    Ok(value)
}
