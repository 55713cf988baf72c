//! Column declarations in the configuration file.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::column::{ColumnWriter, DbType, PropertyWriteMethod};
use crate::schema::Schema;

use super::validation::ConfigError;

/// Writer selected by a column entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriterName {
    Level,
    LevelAsText,
    Timestamp,
    MessageTemplate,
    RenderedMessage,
    Exception,
    /// The whole event as JSON.
    LogEvent,
    /// All properties as one JSON object.
    Properties,
    IdAutoIncrement,
    /// A single named property; requires `property`.
    Property,
}

/// One column entry.
///
/// ```yaml
/// user_id: { writer: property, property: UserId, write_method: raw, db_type: int32 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnConfig {
    pub writer: WriterName,

    /// Position when every column is ordered.
    #[serde(default)]
    pub order: Option<i32>,

    /// Declared type; the writer's default when omitted.
    #[serde(default)]
    pub db_type: Option<DbType>,

    /// Property name for `writer: property`.
    #[serde(default)]
    pub property: Option<String>,

    #[serde(default)]
    pub write_method: Option<PropertyWriteMethod>,

    /// Format string for `to_string` property rendering.
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub skip_on_insert: Option<bool>,
}

impl ColumnConfig {
    /// Check that the entry's options fit its writer.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` naming `column`.
    pub fn validate(&self, column: &str) -> Result<(), ConfigError> {
        let is_property = self.writer == WriterName::Property;
        let property = self.property.as_deref().map(str::trim);

        if is_property && property.is_none_or(str::is_empty) {
            return Err(ConfigError::ValidationError(format!(
                "column '{column}': property writer requires 'property'"
            )));
        }
        if !is_property
            && (self.property.is_some() || self.write_method.is_some() || self.format.is_some())
        {
            return Err(ConfigError::ValidationError(format!(
                "column '{column}': property, write_method and format only apply to property columns"
            )));
        }
        Ok(())
    }

    /// Build the column writer this entry describes.
    pub fn to_writer(&self, column: &str) -> Result<ColumnWriter, ConfigError> {
        self.validate(column)?;

        let mut writer = match self.writer {
            WriterName::Level => ColumnWriter::level(),
            WriterName::LevelAsText => ColumnWriter::level_as_text(),
            WriterName::Timestamp => ColumnWriter::timestamp(),
            WriterName::MessageTemplate => ColumnWriter::message_template(),
            WriterName::RenderedMessage => ColumnWriter::rendered_message(),
            WriterName::Exception => ColumnWriter::exception(),
            WriterName::LogEvent => ColumnWriter::serialized_event(),
            WriterName::Properties => ColumnWriter::properties_as_json(),
            WriterName::IdAutoIncrement => ColumnWriter::auto_increment_id(),
            WriterName::Property => {
                let name = self.property.as_deref().unwrap_or_default().trim();
                let mut writer = ColumnWriter::property(name);
                if let Some(method) = self.write_method {
                    writer = writer.with_write_method(method);
                }
                if let Some(format) = &self.format {
                    writer = writer.with_format(format.clone());
                }
                writer
            }
        };

        if let Some(db_type) = self.db_type {
            writer = writer.with_db_type(db_type);
        }
        if let Some(order) = self.order {
            writer = writer.with_order(order);
        }
        if let Some(skip) = self.skip_on_insert {
            writer = writer.with_skip_on_insert(skip);
        }
        Ok(writer)
    }
}

/// Build a schema from column entries, in file order.
pub fn build_schema(columns: &IndexMap<String, ColumnConfig>) -> Result<Schema, ConfigError> {
    let mut schema = Schema::new();
    for (name, column) in columns {
        schema.insert(name, column.to_writer(name)?);
    }
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnKind;

    fn parse(yaml: &str) -> IndexMap<String, ColumnConfig> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_build_schema_keeps_file_order() {
        let columns = parse(
            r#"
id: { writer: id_auto_increment }
message: { writer: rendered_message }
level: { writer: level_as_text }
user_id: { writer: property, property: UserId, write_method: raw, db_type: int32 }
"#,
        );
        let schema = build_schema(&columns).unwrap();

        let names: Vec<_> = schema.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["id", "message", "level", "user_id"]);

        let id = schema.get("id").unwrap();
        assert!(id.skip_on_insert());
        assert_eq!(id.db_type(), DbType::Int64);

        let user_id = schema.get("user_id").unwrap();
        assert_eq!(user_id.db_type(), DbType::Int32);
        assert!(matches!(
            user_id.kind(),
            ColumnKind::Property { name, write_method: PropertyWriteMethod::Raw, .. } if name == "UserId"
        ));
    }

    #[test]
    fn test_order_and_skip_are_applied() {
        let columns = parse("ts: { writer: timestamp, order: 3, skip_on_insert: true }");
        let schema = build_schema(&columns).unwrap();
        let ts = schema.get("ts").unwrap();
        assert_eq!(ts.order(), Some(3));
        assert!(ts.skip_on_insert());
        assert!(ts.is_timestamp());
    }

    #[test]
    fn test_property_writer_requires_name() {
        let columns = parse("user_id: { writer: property }");
        let err = build_schema(&columns).unwrap_err();
        assert!(err.to_string().contains("requires 'property'"));
    }

    #[test]
    fn test_format_rejected_on_non_property_writer() {
        let columns = parse("message: { writer: rendered_message, format: l }");
        assert!(build_schema(&columns).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<IndexMap<String, ColumnConfig>, _> =
            serde_yaml::from_str("message: { writer: rendered_message, nullable: true }");
        assert!(result.is_err());
    }

    #[test]
    fn test_identifiers_are_normalized() {
        let columns = parse("\"`message`\": { writer: rendered_message }");
        let schema = build_schema(&columns).unwrap();
        assert!(schema.get("message").is_some());
    }
}
