//! Declared SQL types and the type mapping table.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// SQL type a column declares.
///
/// Every variant maps to an optional DDL fragment ([`DbType::ddl_fragment`])
/// and an optional client-side type ([`DbType::native_type`]).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DbType {
    Bool,
    Bit,
    Byte,
    UByte,
    Int16,
    UInt16,
    Int24,
    UInt24,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
    Decimal,
    Year,
    Date,
    Time,
    DateTime,
    Timestamp,
    String,
    VarChar,
    TinyText,
    Text,
    MediumText,
    LongText,
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,
    Binary,
    VarBinary,
    Json,
    Guid,
    Enum,
    Set,
    Geometry,
    Null,
}

/// Client-side value types a bulk staging buffer column can be typed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum NativeType {
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    Decimal,
    DateTime,
    Text,
    Bytes,
    Uuid,
}

impl DbType {
    /// DDL fragment used in `CREATE TABLE`, or `None` when the type has no mapping.
    pub fn ddl_fragment(self) -> Option<&'static str> {
        let fragment = match self {
            DbType::Bool => "BOOLEAN",
            DbType::Bit => "BIT",
            DbType::Byte => "TINYINT",
            DbType::UByte => "TINYINT UNSIGNED",
            DbType::Int16 => "SMALLINT",
            DbType::UInt16 => "SMALLINT UNSIGNED",
            DbType::Int24 => "MEDIUMINT",
            DbType::UInt24 => "MEDIUMINT UNSIGNED",
            DbType::Int32 => "INT",
            DbType::UInt32 => "INT UNSIGNED",
            DbType::Int64 => "BIGINT",
            DbType::UInt64 => "BIGINT UNSIGNED",
            DbType::Float => "FLOAT",
            DbType::Double => "DOUBLE",
            DbType::Decimal => "DECIMAL",
            DbType::Year => "YEAR",
            DbType::Date => "DATE",
            DbType::Time => "TIME",
            DbType::DateTime => "DATETIME",
            DbType::Timestamp => "TIMESTAMP",
            DbType::String | DbType::VarChar => "VARCHAR(255)",
            DbType::TinyText => "TINYTEXT",
            DbType::Text => "TEXT",
            DbType::MediumText => "MEDIUMTEXT",
            DbType::LongText => "LONGTEXT",
            DbType::TinyBlob => "TINYBLOB",
            DbType::Blob => "BLOB",
            DbType::MediumBlob => "MEDIUMBLOB",
            DbType::LongBlob => "LONGBLOB",
            DbType::Binary => "BINARY(255)",
            DbType::VarBinary => "VARBINARY(255)",
            DbType::Json => "JSON",
            DbType::Guid => "VARCHAR(36)",
            DbType::Enum | DbType::Set | DbType::Geometry | DbType::Null => return None,
        };
        Some(fragment)
    }

    /// Client-side type for bulk staging, or `None` to pass values through as-is.
    pub fn native_type(self) -> Option<NativeType> {
        let native = match self {
            DbType::Bool => NativeType::Bool,
            DbType::Bit | DbType::UInt64 => NativeType::UInt64,
            DbType::Byte => NativeType::Int8,
            DbType::UByte => NativeType::UInt8,
            DbType::Int16 | DbType::Year => NativeType::Int16,
            DbType::UInt16 => NativeType::UInt16,
            DbType::Int24 | DbType::Int32 => NativeType::Int32,
            DbType::UInt24 | DbType::UInt32 => NativeType::UInt32,
            DbType::Int64 => NativeType::Int64,
            DbType::Float => NativeType::Float32,
            DbType::Double => NativeType::Float64,
            DbType::Decimal => NativeType::Decimal,
            DbType::Date | DbType::DateTime | DbType::Timestamp => NativeType::DateTime,
            DbType::Time
            | DbType::String
            | DbType::VarChar
            | DbType::TinyText
            | DbType::Text
            | DbType::MediumText
            | DbType::LongText
            | DbType::Json
            | DbType::Enum
            | DbType::Set => NativeType::Text,
            DbType::TinyBlob
            | DbType::Blob
            | DbType::MediumBlob
            | DbType::LongBlob
            | DbType::Binary
            | DbType::VarBinary => NativeType::Bytes,
            DbType::Guid => NativeType::Uuid,
            DbType::Geometry | DbType::Null => return None,
        };
        Some(native)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_ddl_fragments() {
        assert_eq!(DbType::Int32.ddl_fragment(), Some("INT"));
        assert_eq!(DbType::UInt64.ddl_fragment(), Some("BIGINT UNSIGNED"));
        assert_eq!(DbType::VarChar.ddl_fragment(), Some("VARCHAR(255)"));
        assert_eq!(DbType::String.ddl_fragment(), Some("VARCHAR(255)"));
        assert_eq!(DbType::Guid.ddl_fragment(), Some("VARCHAR(36)"));
        assert_eq!(DbType::Json.ddl_fragment(), Some("JSON"));
        assert_eq!(DbType::Geometry.ddl_fragment(), None);
        assert_eq!(DbType::Enum.ddl_fragment(), None);
    }

    #[test]
    fn test_native_types() {
        assert_eq!(DbType::Timestamp.native_type(), Some(NativeType::DateTime));
        assert_eq!(DbType::Json.native_type(), Some(NativeType::Text));
        assert_eq!(DbType::Guid.native_type(), Some(NativeType::Uuid));
        assert_eq!(DbType::Set.native_type(), Some(NativeType::Text));
        assert_eq!(DbType::Null.native_type(), None);
    }

    #[test]
    fn test_db_type_parse() {
        assert_eq!(DbType::from_str("varchar").unwrap(), DbType::VarChar);
        assert_eq!(DbType::from_str("Int32").unwrap(), DbType::Int32);
        assert_eq!(DbType::Timestamp.to_string(), "timestamp");
        let parsed: DbType = serde_yaml::from_str("uint16").unwrap();
        assert_eq!(parsed, DbType::UInt16);
    }
}
