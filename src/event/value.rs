//! Structured property values and their text/JSON renderings.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use super::FormatProvider;

/// Format specifier that renders text scalars without surrounding quotes.
const LITERAL_FORMAT: &str = "l";

/// Default number of decimals for `F`/`N` number formats.
const DEFAULT_DECIMALS: usize = 2;

/// Key under which a structure's type tag is written in JSON.
pub(crate) const TYPE_TAG_KEY: &str = "_typeTag";

/// A single atomic property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    DateTime(DateTime<FixedOffset>),
    Uuid(Uuid),
    Bytes(Vec<u8>),
    /// Enumeration member; `value` is its integral representation.
    Enum { name: String, value: i64 },
}

impl Scalar {
    /// Render as text, consulting `provider` first.
    pub fn render(&self, format: Option<&str>, provider: Option<&dyn FormatProvider>) -> String {
        if let Some(provider) = provider
            && let Some(text) = provider.format_scalar(self, format)
        {
            return text;
        }
        self.render_invariant(format)
    }

    fn render_invariant(&self, format: Option<&str>) -> String {
        match self {
            Scalar::Null => "null".to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => format_integer(i128::from(*i), format),
            Scalar::UInt(u) => format_integer(i128::from(*u), format),
            Scalar::Float(f) => format_float(*f, format),
            Scalar::Text(s) if format == Some(LITERAL_FORMAT) => s.clone(),
            Scalar::Text(s) => format!("\"{}\"", s.replace('"', "\\\"")),
            Scalar::DateTime(dt) => format_datetime(dt, format),
            Scalar::Uuid(u) => u.hyphenated().to_string(),
            Scalar::Bytes(b) => hex::encode(b),
            Scalar::Enum { name, .. } => name.clone(),
        }
    }

    /// JSON rendering.
    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Int(i) => Value::from(*i),
            Scalar::UInt(u) => Value::from(*u),
            Scalar::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(f.to_string())),
            Scalar::Text(s) => Value::String(s.clone()),
            Scalar::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            Scalar::Uuid(u) => Value::String(u.hyphenated().to_string()),
            Scalar::Bytes(b) => Value::String(hex::encode(b)),
            Scalar::Enum { name, .. } => Value::String(name.clone()),
        }
    }

    /// Text used when this scalar keys a JSON object.
    fn key_text(&self) -> String {
        match self {
            Scalar::Text(s) => s.clone(),
            other => other.render_invariant(None),
        }
    }
}

/// A structured property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(Scalar),
    Sequence(Vec<PropertyValue>),
    Structure {
        type_tag: Option<String>,
        properties: Vec<(String, PropertyValue)>,
    },
    Dictionary(Vec<(Scalar, PropertyValue)>),
}

impl PropertyValue {
    pub fn null() -> Self {
        PropertyValue::Scalar(Scalar::Null)
    }

    /// Enumeration member with its name and integral value.
    pub fn enumeration(name: impl Into<String>, value: i64) -> Self {
        PropertyValue::Scalar(Scalar::Enum {
            name: name.into(),
            value,
        })
    }

    pub fn structure<I, K>(type_tag: Option<&str>, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, PropertyValue)>,
        K: Into<String>,
    {
        PropertyValue::Structure {
            type_tag: type_tag.map(str::to_string),
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            PropertyValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Text rendering. `format` applies to every scalar reached.
    pub fn render(&self, format: Option<&str>, provider: Option<&dyn FormatProvider>) -> String {
        match self {
            PropertyValue::Scalar(s) => s.render(format, provider),
            PropertyValue::Sequence(items) => {
                let body: Vec<String> = items.iter().map(|v| v.render(format, provider)).collect();
                format!("[{}]", body.join(", "))
            }
            PropertyValue::Structure {
                type_tag,
                properties,
            } => {
                let body: Vec<String> = properties
                    .iter()
                    .map(|(name, v)| format!("{}: {}", name, v.render(format, provider)))
                    .collect();
                let braces = if body.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{ {} }}", body.join(", "))
                };
                match type_tag {
                    Some(tag) => format!("{tag} {braces}"),
                    None => braces,
                }
            }
            PropertyValue::Dictionary(entries) => {
                let body: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| {
                        format!("({}: {})", k.render(None, provider), v.render(format, provider))
                    })
                    .collect();
                format!("[{}]", body.join(", "))
            }
        }
    }

    /// JSON rendering: structures become objects, sequences arrays,
    /// dictionaries objects keyed by the key's text.
    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Scalar(s) => s.to_json(),
            PropertyValue::Sequence(items) => {
                Value::Array(items.iter().map(PropertyValue::to_json).collect())
            }
            PropertyValue::Structure {
                type_tag,
                properties,
            } => {
                let mut map = Map::new();
                if let Some(tag) = type_tag {
                    map.insert(TYPE_TAG_KEY.to_string(), Value::String(tag.clone()));
                }
                for (name, v) in properties {
                    map.insert(name.clone(), v.to_json());
                }
                Value::Object(map)
            }
            PropertyValue::Dictionary(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.key_text(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<Scalar> for PropertyValue {
    fn from(value: Scalar) -> Self {
        PropertyValue::Scalar(value)
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident via $conv:expr),* $(,)?) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    PropertyValue::Scalar(Scalar::$variant($conv(value)))
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool via std::convert::identity,
    i8 => Int via i64::from,
    i16 => Int via i64::from,
    i32 => Int via i64::from,
    i64 => Int via std::convert::identity,
    u8 => UInt via u64::from,
    u16 => UInt via u64::from,
    u32 => UInt via u64::from,
    u64 => UInt via std::convert::identity,
    f32 => Float via f64::from,
    f64 => Float via std::convert::identity,
    String => Text via std::convert::identity,
    DateTime<FixedOffset> => DateTime via std::convert::identity,
    Uuid => Uuid via std::convert::identity,
    Vec<u8> => Bytes via std::convert::identity,
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Scalar(Scalar::Text(value.to_string()))
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        PropertyValue::Scalar(Scalar::DateTime(value.fixed_offset()))
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(value: Vec<PropertyValue>) -> Self {
        PropertyValue::Sequence(value)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_else(PropertyValue::null)
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => PropertyValue::null(),
            Value::Bool(b) => b.into(),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i.into()
                } else if let Some(u) = n.as_u64() {
                    u.into()
                } else {
                    n.as_f64().unwrap_or(f64::NAN).into()
                }
            }
            Value::String(s) => s.into(),
            Value::Array(items) => {
                PropertyValue::Sequence(items.into_iter().map(PropertyValue::from).collect())
            }
            Value::Object(mut map) => {
                let type_tag = match map.get(TYPE_TAG_KEY) {
                    Some(Value::String(tag)) => Some(tag.clone()),
                    _ => None,
                };
                if type_tag.is_some() {
                    map.shift_remove(TYPE_TAG_KEY);
                }
                PropertyValue::Structure {
                    type_tag,
                    properties: map
                        .into_iter()
                        .map(|(k, v)| (k, PropertyValue::from(v)))
                        .collect(),
                }
            }
        }
    }
}

// ============================================================================
// Invariant formatting
// ============================================================================

/// Split a .NET-style numeric format (`F2`, `x8`, `D4`) into its kind and precision.
///
/// Precisions above `u16::MAX` are rejected; the formatter cannot honour them.
fn numeric_format(format: Option<&str>) -> Option<(char, Option<usize>)> {
    let format = format?;
    let mut chars = format.chars();
    let kind = chars.next()?;
    let rest = chars.as_str();
    if rest.is_empty() {
        return Some((kind, None));
    }
    rest.parse::<u16>()
        .ok()
        .map(|precision| (kind, Some(usize::from(precision))))
}

fn format_integer(value: i128, format: Option<&str>) -> String {
    match numeric_format(format) {
        Some(('D' | 'd', width)) => {
            let digits = value.unsigned_abs().to_string();
            let padded = format!("{:0>width$}", digits, width = width.unwrap_or(0));
            if value < 0 { format!("-{padded}") } else { padded }
        }
        Some((kind @ ('X' | 'x'), width)) => {
            let hex = if value < 0 {
                // Two's complement at 64-bit width.
                format!("{:x}", value as i64)
            } else {
                format!("{value:x}")
            };
            let hex = if kind == 'X' { hex.to_uppercase() } else { hex };
            format!("{:0>width$}", hex, width = width.unwrap_or(0))
        }
        Some(('F' | 'f' | 'N' | 'n', _)) => format_float(value as f64, format),
        _ => value.to_string(),
    }
}

fn format_float(value: f64, format: Option<&str>) -> String {
    match numeric_format(format) {
        Some(('F' | 'f', precision)) => {
            format!("{:.*}", precision.unwrap_or(DEFAULT_DECIMALS), value)
        }
        Some(('N' | 'n', precision)) => {
            group_thousands(&format!("{:.*}", precision.unwrap_or(DEFAULT_DECIMALS), value))
        }
        _ => value.to_string(),
    }
}

/// Insert `,` separators into the integral part of a fixed-point number.
fn group_thousands(fixed: &str) -> String {
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    if !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return fixed.to_string();
    }

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

fn format_datetime(value: &DateTime<FixedOffset>, format: Option<&str>) -> String {
    match format {
        Some(pattern)
            if !pattern.is_empty()
                && !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) =>
        {
            value.format(pattern).to_string()
        }
        _ => value.to_rfc3339_opts(SecondsFormat::AutoSi, false),
    }
}
