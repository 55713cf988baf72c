//! The log event record.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{FormatProvider, Level, PropertyValue, render_template};

/// A structured log event. Immutable once built.
///
/// # Example
///
/// ```
/// use logsink::event::{Level, LogEvent};
///
/// let event = LogEvent::new(Level::Information, "User {UserId} signed in")
///     .with_property("UserId", 7);
/// assert_eq!(event.render_message(None), "User 7 signed in");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "LogEventRecord")]
pub struct LogEvent {
    timestamp: DateTime<FixedOffset>,
    level: Level,
    message_template: String,
    exception: Option<String>,
    properties: IndexMap<String, PropertyValue>,
}

impl LogEvent {
    /// Create an event stamped with the current time.
    pub fn new(level: Level, message_template: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now().fixed_offset(),
            level,
            message_template: message_template.into(),
            exception: None,
            properties: IndexMap::new(),
        }
    }

    pub fn at<Tz: TimeZone>(mut self, timestamp: DateTime<Tz>) -> Self {
        self.timestamp = timestamp.fixed_offset();
        self
    }

    /// Attach exception text (message and stack trace).
    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    /// Add or replace a property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }

    #[inline]
    pub fn level(&self) -> Level {
        self.level
    }

    #[inline]
    pub fn message_template(&self) -> &str {
        &self.message_template
    }

    #[inline]
    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    #[inline]
    pub fn properties(&self) -> &IndexMap<String, PropertyValue> {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    // ========================================================================
    // Renderings
    // ========================================================================

    /// Message template with property values substituted.
    pub fn render_message(&self, provider: Option<&dyn FormatProvider>) -> String {
        render_template(&self.message_template, &self.properties, provider)
    }

    /// All properties as one JSON object (`{}` when there are none).
    pub fn properties_json(&self) -> Value {
        Value::Object(
            self.properties
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }

    /// The whole event as JSON.
    pub fn to_json(&self, provider: Option<&dyn FormatProvider>) -> Value {
        let mut map = Map::new();
        map.insert(
            "Timestamp".to_string(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
        );
        map.insert("Level".to_string(), Value::String(self.level.to_string()));
        map.insert(
            "MessageTemplate".to_string(),
            Value::String(self.message_template.clone()),
        );
        map.insert(
            "RenderedMessage".to_string(),
            Value::String(self.render_message(provider)),
        );
        if let Some(exception) = &self.exception {
            map.insert("Exception".to_string(), Value::String(exception.clone()));
        }
        map.insert("Properties".to_string(), self.properties_json());
        Value::Object(map)
    }
}

/// Wire form accepted when deserializing events (e.g. newline-delimited JSON).
#[derive(Deserialize)]
struct LogEventRecord {
    #[serde(default = "now", alias = "Timestamp", alias = "@t")]
    timestamp: DateTime<FixedOffset>,
    #[serde(default = "default_level", alias = "Level", alias = "@l")]
    level: Level,
    #[serde(default, alias = "MessageTemplate", alias = "@mt")]
    message_template: String,
    #[serde(default, alias = "Exception", alias = "@x")]
    exception: Option<String>,
    #[serde(default, alias = "Properties")]
    properties: IndexMap<String, Value>,
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

fn default_level() -> Level {
    Level::Information
}

impl From<LogEventRecord> for LogEvent {
    fn from(record: LogEventRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            level: record.level,
            message_template: record.message_template,
            exception: record.exception,
            properties: record
                .properties
                .into_iter()
                .map(|(name, value)| (name, PropertyValue::from(value)))
                .collect(),
        }
    }
}
