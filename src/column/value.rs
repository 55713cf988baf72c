//! Client-side cell values.

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use super::NativeType;
use crate::event::Scalar;

/// Text layout for timestamps sent to the database.
///
/// Fixed-width and zero-padded so that text ordering matches chronological ordering.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Format a UTC instant the way timestamp cells and retention cutoffs are bound.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// One extracted cell value. `Null` is the database null marker.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
}

impl SqlValue {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::Int(_) => "integer",
            SqlValue::UInt(_) => "unsigned integer",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Bytes(_) => "bytes",
            SqlValue::DateTime(_) => "datetime",
            SqlValue::Uuid(_) => "uuid",
        }
    }

    /// Text form of a non-null value.
    pub fn to_text(&self) -> Option<String> {
        let text = match self {
            SqlValue::Null => return None,
            SqlValue::Bool(b) => b.to_string(),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::UInt(u) => u.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Text(s) => s.clone(),
            SqlValue::Bytes(b) => hex::encode(b),
            SqlValue::DateTime(ts) => format_timestamp(ts),
            SqlValue::Uuid(u) => u.hyphenated().to_string(),
        };
        Some(text)
    }

    /// Convert to the representation expected for `native`.
    ///
    /// Null stays null. Integers are range-checked; text is parsed where the
    /// target is numeric, boolean, temporal or a UUID.
    pub fn coerce(self, native: NativeType) -> Result<SqlValue, String> {
        if self.is_null() {
            return Ok(SqlValue::Null);
        }
        match native {
            NativeType::Bool => self.to_bool().map(SqlValue::Bool),
            NativeType::Int8 => self.integer_in(i8::MIN.into(), i8::MAX.into(), native),
            NativeType::UInt8 => self.integer_in(0, u8::MAX.into(), native),
            NativeType::Int16 => self.integer_in(i16::MIN.into(), i16::MAX.into(), native),
            NativeType::UInt16 => self.integer_in(0, u16::MAX.into(), native),
            NativeType::Int32 => self.integer_in(i32::MIN.into(), i32::MAX.into(), native),
            NativeType::UInt32 => self.integer_in(0, u32::MAX.into(), native),
            NativeType::Int64 => self.integer_in(i64::MIN.into(), i64::MAX.into(), native),
            NativeType::UInt64 => self.integer_in(0, u64::MAX.into(), native),
            NativeType::Float32 | NativeType::Float64 => self.to_f64().map(SqlValue::Float),
            NativeType::Decimal => self.to_decimal(),
            NativeType::DateTime => self.to_datetime().map(SqlValue::DateTime),
            NativeType::Text => match self {
                SqlValue::Text(_) => Ok(self),
                other => Ok(SqlValue::Text(other.to_text().unwrap_or_default())),
            },
            NativeType::Bytes => match self {
                SqlValue::Bytes(_) => Ok(self),
                SqlValue::Text(s) => Ok(SqlValue::Bytes(s.into_bytes())),
                other => Err(other.mismatch("bytes")),
            },
            NativeType::Uuid => match self {
                SqlValue::Uuid(_) => Ok(self),
                SqlValue::Text(s) => Uuid::parse_str(s.trim())
                    .map(SqlValue::Uuid)
                    .map_err(|e| format!("invalid uuid '{s}': {e}")),
                other => Err(other.mismatch("uuid")),
            },
        }
    }

    fn mismatch(&self, target: &str) -> String {
        format!("cannot convert {} to {target}", self.kind())
    }

    fn to_bool(&self) -> Result<bool, String> {
        match self {
            SqlValue::Bool(b) => Ok(*b),
            SqlValue::Int(i) => Ok(*i != 0),
            SqlValue::UInt(u) => Ok(*u != 0),
            SqlValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(format!("invalid boolean '{s}'")),
            },
            other => Err(other.mismatch("bool")),
        }
    }

    fn to_i128(&self) -> Result<i128, String> {
        match self {
            SqlValue::Bool(b) => Ok(i128::from(*b)),
            SqlValue::Int(i) => Ok(i128::from(*i)),
            SqlValue::UInt(u) => Ok(i128::from(*u)),
            SqlValue::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(*f as i128),
            SqlValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| format!("invalid integer '{s}'")),
            other => Err(other.mismatch("integer")),
        }
    }

    fn integer_in(&self, min: i128, max: i128, native: NativeType) -> Result<SqlValue, String> {
        let value = self.to_i128()?;
        if value < min || value > max {
            return Err(format!("{value} is out of range for {native}"));
        }
        // Bounds above make both casts lossless.
        Ok(if native == NativeType::UInt64 {
            SqlValue::UInt(value as u64)
        } else {
            SqlValue::Int(value as i64)
        })
    }

    fn to_f64(&self) -> Result<f64, String> {
        match self {
            SqlValue::Int(i) => Ok(*i as f64),
            SqlValue::UInt(u) => Ok(*u as f64),
            SqlValue::Float(f) => Ok(*f),
            SqlValue::Text(s) => s.trim().parse().map_err(|_| format!("invalid number '{s}'")),
            other => Err(other.mismatch("float")),
        }
    }

    fn to_decimal(self) -> Result<SqlValue, String> {
        match self {
            SqlValue::Int(_) | SqlValue::UInt(_) | SqlValue::Float(_) => Ok(self),
            SqlValue::Bool(b) => Ok(SqlValue::Int(i64::from(b))),
            SqlValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.parse::<f64>().is_ok() {
                    Ok(SqlValue::Text(trimmed.to_string()))
                } else {
                    Err(format!("invalid decimal '{s}'"))
                }
            }
            other => Err(other.mismatch("decimal")),
        }
    }

    fn to_datetime(&self) -> Result<DateTime<Utc>, String> {
        match self {
            SqlValue::DateTime(ts) => Ok(*ts),
            SqlValue::Text(s) => {
                let s = s.trim();
                DateTime::parse_from_rfc3339(s)
                    .map(|ts| ts.with_timezone(&Utc))
                    .or_else(|_| {
                        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                            .map(|naive| naive.and_utc())
                    })
                    .map_err(|_| format!("invalid datetime '{s}'"))
            }
            other => Err(other.mismatch("datetime")),
        }
    }
}

impl From<&Scalar> for SqlValue {
    fn from(scalar: &Scalar) -> Self {
        match scalar {
            Scalar::Null => SqlValue::Null,
            Scalar::Bool(b) => SqlValue::Bool(*b),
            Scalar::Int(i) => SqlValue::Int(*i),
            Scalar::UInt(u) => SqlValue::UInt(*u),
            Scalar::Float(f) => SqlValue::Float(*f),
            Scalar::Text(s) => SqlValue::Text(s.clone()),
            Scalar::DateTime(ts) => SqlValue::DateTime(ts.with_timezone(&Utc)),
            Scalar::Uuid(u) => SqlValue::Uuid(*u),
            Scalar::Bytes(b) => SqlValue::Bytes(b.clone()),
            Scalar::Enum { value, .. } => SqlValue::Int(*value),
        }
    }
}
