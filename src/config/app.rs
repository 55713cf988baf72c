//! Sink configuration file.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::{Schema, normalize_identifier};
use crate::storage::{
    DEFAULT_BATCH_SIZE_LIMIT, DEFAULT_PERIOD, DEFAULT_QUEUE_LIMIT, InsertMode, SinkOptions,
    SinkOptionsBuilder,
};

use super::columns::{ColumnConfig, build_schema};
use super::connection::resolve_connection;
use super::validation::{ConfigError, expand_env_vars};

// =============================================================================
// Batch Configuration
// =============================================================================

/// Queue and batch sizing for the batching sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Events per batch (default: 30).
    pub size_limit: usize,

    /// Events held in the queue before new ones are dropped (default: 100000).
    pub queue_limit: usize,

    /// Maximum time between batches (default: 5s).
    #[serde(with = "humantime_serde")]
    pub period: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size_limit: DEFAULT_BATCH_SIZE_LIMIT,
            queue_limit: DEFAULT_QUEUE_LIMIT,
            period: DEFAULT_PERIOD,
        }
    }
}

// =============================================================================
// Sink Configuration
// =============================================================================

/// Top-level sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Connection URL, or the name of an entry in `connection_strings`.
    /// `${VAR}` and `${VAR:-default}` are expanded on load.
    pub connection: String,

    /// Named connection targets.
    #[serde(default)]
    pub connection_strings: BTreeMap<String, String>,

    pub table_name: String,

    #[serde(default)]
    pub insert_mode: InsertMode,

    #[serde(default)]
    pub auto_create_table: bool,

    #[serde(default)]
    pub emit_bulk_warnings: bool,

    /// Rows older than this are purged after each batch.
    #[serde(default, with = "humantime_serde")]
    pub retention: Option<Duration>,

    #[serde(default)]
    pub batch: BatchConfig,

    /// Column set; the default columns when omitted.
    #[serde(default)]
    pub columns: Option<IndexMap<String, ColumnConfig>>,
}

impl SinkConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yaml::from_str(content)?;
        config.connection = expand_env_vars(&config.connection);
        for target in config.connection_strings.values_mut() {
            *target = expand_env_vars(target);
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "connection must not be empty".to_string(),
            ));
        }

        if normalize_identifier(self.table_name.trim()).is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "invalid table_name: '{}'",
                self.table_name
            )));
        }

        if self.batch.size_limit == 0 {
            return Err(ConfigError::ValidationError(
                "batch size_limit must be positive".to_string(),
            ));
        }
        if self.batch.queue_limit == 0 {
            return Err(ConfigError::ValidationError(
                "batch queue_limit must be positive".to_string(),
            ));
        }
        if self.batch.period.is_zero() {
            return Err(ConfigError::ValidationError(
                "batch period must be positive".to_string(),
            ));
        }

        if let Some(columns) = &self.columns {
            if columns.is_empty() {
                return Err(ConfigError::ValidationError(
                    "columns must not be empty when given".to_string(),
                ));
            }
            for (name, column) in columns {
                column.validate(name)?;
            }
        }

        Ok(())
    }

    /// The effective connection target after name lookup.
    pub fn resolved_connection(&self) -> String {
        resolve_connection(&self.connection, &self.connection_strings)
    }

    /// The configured column set, or the default one.
    pub fn schema(&self) -> Result<Schema, ConfigError> {
        match &self.columns {
            Some(columns) => build_schema(columns),
            None => Ok(Schema::default_columns()),
        }
    }

    /// A builder carrying every configured option.
    ///
    /// Use this to register creation handlers or a format provider before
    /// building.
    pub fn options_builder(&self) -> Result<SinkOptionsBuilder, ConfigError> {
        let mut builder = SinkOptions::builder(self.resolved_connection(), self.table_name.as_str())
            .schema(self.schema()?)
            .batch_size_limit(self.batch.size_limit)
            .queue_limit(self.batch.queue_limit)
            .period(self.batch.period)
            .insert_mode(self.insert_mode)
            .auto_create_table(self.auto_create_table)
            .emit_bulk_warnings(self.emit_bulk_warnings);
        if let Some(retention) = self.retention {
            builder = builder.retention(retention);
        }
        Ok(builder)
    }

    /// Build validated sink options.
    pub fn into_options(self) -> Result<SinkOptions, ConfigError> {
        Ok(self.options_builder()?.build()?)
    }
}
