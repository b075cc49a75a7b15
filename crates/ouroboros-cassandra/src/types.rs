//! Value model shared by the builder, the grammar and result rows.
//!
//! `CqlValue` is the single currency for bound parameters and row cells.
//! Collection cells carry a [`CollectionValue`] which knows its own element types.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use uuid::Uuid;

use crate::collection::CollectionValue;
use crate::query::Grammar;
use crate::{DataBridgeError, Result};

/// Native CQL types that may appear as collection elements or key casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CqlType {
    Ascii,
    BigInt,
    Blob,
    Boolean,
    Date,
    Decimal,
    Double,
    Float,
    Inet,
    Int,
    SmallInt,
    Text,
    Time,
    Timestamp,
    TimeUuid,
    TinyInt,
    Uuid,
    Varchar,
}

impl CqlType {
    /// Returns the CQL type name.
    pub fn name(&self) -> &'static str {
        match self {
            CqlType::Ascii => "ascii",
            CqlType::BigInt => "bigint",
            CqlType::Blob => "blob",
            CqlType::Boolean => "boolean",
            CqlType::Date => "date",
            CqlType::Decimal => "decimal",
            CqlType::Double => "double",
            CqlType::Float => "float",
            CqlType::Inet => "inet",
            CqlType::Int => "int",
            CqlType::SmallInt => "smallint",
            CqlType::Text => "text",
            CqlType::Time => "time",
            CqlType::Timestamp => "timestamp",
            CqlType::TimeUuid => "timeuuid",
            CqlType::TinyInt => "tinyint",
            CqlType::Uuid => "uuid",
            CqlType::Varchar => "varchar",
        }
    }

    /// Types whose literals must be written as quoted strings.
    pub fn is_string_type(&self) -> bool {
        matches!(
            self,
            CqlType::Varchar | CqlType::Ascii | CqlType::Inet | CqlType::Text
        )
    }
}

impl fmt::Display for CqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CqlType {
    type Err = DataBridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let ty = match s.trim().to_ascii_lowercase().as_str() {
            "ascii" => CqlType::Ascii,
            "bigint" => CqlType::BigInt,
            "blob" => CqlType::Blob,
            "boolean" => CqlType::Boolean,
            "date" => CqlType::Date,
            "decimal" => CqlType::Decimal,
            "double" => CqlType::Double,
            "float" => CqlType::Float,
            "inet" => CqlType::Inet,
            "int" => CqlType::Int,
            "smallint" => CqlType::SmallInt,
            "text" => CqlType::Text,
            "time" => CqlType::Time,
            "timestamp" => CqlType::Timestamp,
            "timeuuid" => CqlType::TimeUuid,
            "tinyint" => CqlType::TinyInt,
            "uuid" => CqlType::Uuid,
            "varchar" => CqlType::Varchar,
            other => {
                return Err(DataBridgeError::Validation(format!(
                    "Unknown CQL type '{}'",
                    other
                )))
            }
        };
        Ok(ty)
    }
}

/// A value bound to a statement or read back from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum CqlValue {
    /// NULL value
    Null,
    /// BOOLEAN
    Boolean(bool),
    /// TINYINT
    TinyInt(i8),
    /// SMALLINT
    SmallInt(i16),
    /// INT
    Int(i32),
    /// BIGINT
    BigInt(i64),
    /// FLOAT
    Float(f32),
    /// DOUBLE
    Double(f64),
    /// DECIMAL
    Decimal(Decimal),
    /// TEXT / VARCHAR / ASCII
    Text(String),
    /// BLOB
    Blob(Vec<u8>),
    /// INET
    Inet(IpAddr),
    /// UUID
    Uuid(Uuid),
    /// TIMEUUID
    TimeUuid(Uuid),
    /// DATE
    Date(NaiveDate),
    /// TIME
    Time(NaiveTime),
    /// TIMESTAMP (millisecond precision on the wire)
    Timestamp(DateTime<Utc>),
    /// MAP / SET / LIST
    Collection(CollectionValue),
}

impl CqlValue {
    /// Returns the CQL type name of this value.
    pub fn cql_type_name(&self) -> &'static str {
        match self {
            CqlValue::Null => "null",
            CqlValue::Boolean(_) => "boolean",
            CqlValue::TinyInt(_) => "tinyint",
            CqlValue::SmallInt(_) => "smallint",
            CqlValue::Int(_) => "int",
            CqlValue::BigInt(_) => "bigint",
            CqlValue::Float(_) => "float",
            CqlValue::Double(_) => "double",
            CqlValue::Decimal(_) => "decimal",
            CqlValue::Text(_) => "text",
            CqlValue::Blob(_) => "blob",
            CqlValue::Inet(_) => "inet",
            CqlValue::Uuid(_) => "uuid",
            CqlValue::TimeUuid(_) => "timeuuid",
            CqlValue::Date(_) => "date",
            CqlValue::Time(_) => "time",
            CqlValue::Timestamp(_) => "timestamp",
            CqlValue::Collection(c) => c.kind().name(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CqlValue::Null)
    }

    /// Returns the collection payload if this is a map, set or list.
    pub fn as_collection(&self) -> Option<&CollectionValue> {
        match self {
            CqlValue::Collection(c) => Some(c),
            _ => None,
        }
    }

    /// Whether this value can be stored in a column (or collection slot) of type `ty`.
    pub fn is_compatible_with(&self, ty: CqlType) -> bool {
        match (self, ty) {
            (CqlValue::Text(s), CqlType::Ascii) => s.is_ascii(),
            (CqlValue::Text(_), CqlType::Text | CqlType::Varchar) => true,
            (CqlValue::Boolean(_), CqlType::Boolean) => true,
            (CqlValue::TinyInt(_), CqlType::TinyInt) => true,
            (CqlValue::SmallInt(_), CqlType::SmallInt) => true,
            (CqlValue::Int(_), CqlType::Int) => true,
            (CqlValue::BigInt(_), CqlType::BigInt) => true,
            (CqlValue::Float(_), CqlType::Float) => true,
            (CqlValue::Double(_), CqlType::Double) => true,
            (CqlValue::Decimal(_), CqlType::Decimal) => true,
            (CqlValue::Blob(_), CqlType::Blob) => true,
            (CqlValue::Inet(_), CqlType::Inet) => true,
            (CqlValue::Uuid(_), CqlType::Uuid) => true,
            // A time-based uuid is still a valid uuid
            (CqlValue::TimeUuid(_), CqlType::Uuid | CqlType::TimeUuid) => true,
            (CqlValue::Date(_), CqlType::Date) => true,
            (CqlValue::Time(_), CqlType::Time) => true,
            (CqlValue::Timestamp(_), CqlType::Timestamp) => true,
            _ => false,
        }
    }

    /// Renders the value as a CQL literal.
    pub fn to_cql_literal(&self) -> String {
        match self {
            CqlValue::Null => "null".to_string(),
            CqlValue::Boolean(b) => b.to_string(),
            CqlValue::TinyInt(v) => v.to_string(),
            CqlValue::SmallInt(v) => v.to_string(),
            CqlValue::Int(v) => v.to_string(),
            CqlValue::BigInt(v) => v.to_string(),
            CqlValue::Float(v) => non_finite_literal(f64::from(*v)).unwrap_or_else(|| v.to_string()),
            CqlValue::Double(v) => non_finite_literal(*v).unwrap_or_else(|| v.to_string()),
            CqlValue::Decimal(v) => v.to_string(),
            CqlValue::Text(s) => quote_string(s),
            CqlValue::Blob(bytes) => {
                let mut out = String::with_capacity(2 + bytes.len() * 2);
                out.push_str("0x");
                for b in bytes {
                    out.push_str(&format!("{:02x}", b));
                }
                out
            }
            CqlValue::Inet(ip) => quote_string(&ip.to_string()),
            CqlValue::Uuid(u) | CqlValue::TimeUuid(u) => u.hyphenated().to_string(),
            CqlValue::Date(d) => quote_string(&d.format("%Y-%m-%d").to_string()),
            CqlValue::Time(t) => quote_string(&t.format("%H:%M:%S%.f").to_string()),
            CqlValue::Timestamp(ts) => ts.timestamp_millis().to_string(),
            CqlValue::Collection(c) => Grammar::compile_collection_values(c),
        }
    }

    /// Raw textual form, without literal quoting.
    pub(crate) fn to_raw_string(&self) -> String {
        match self {
            CqlValue::Text(s) => s.clone(),
            CqlValue::Inet(ip) => ip.to_string(),
            CqlValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CqlValue::Time(t) => t.format("%H:%M:%S%.f").to_string(),
            other => other.to_cql_literal(),
        }
    }

    /// Converts the value to JSON. Maps become objects keyed by the key's raw text.
    pub fn to_json(&self) -> JsonValue {
        match self {
            CqlValue::Null => JsonValue::Null,
            CqlValue::Boolean(b) => JsonValue::Bool(*b),
            CqlValue::TinyInt(v) => JsonValue::from(*v),
            CqlValue::SmallInt(v) => JsonValue::from(*v),
            CqlValue::Int(v) => JsonValue::from(*v),
            CqlValue::BigInt(v) => JsonValue::from(*v),
            CqlValue::Float(v) => serde_json::Number::from_f64(*v as f64)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            CqlValue::Double(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            CqlValue::Decimal(d) => JsonValue::String(d.to_string()),
            CqlValue::Text(s) => JsonValue::String(s.clone()),
            CqlValue::Blob(_) => JsonValue::String(self.to_cql_literal()),
            CqlValue::Inet(ip) => JsonValue::String(ip.to_string()),
            CqlValue::Uuid(u) | CqlValue::TimeUuid(u) => JsonValue::String(u.to_string()),
            CqlValue::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            CqlValue::Time(t) => JsonValue::String(t.format("%H:%M:%S%.f").to_string()),
            CqlValue::Timestamp(ts) => {
                JsonValue::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            CqlValue::Collection(c) => c.to_json(),
        }
    }
}

/// CQL spelling of NaN and the infinities; None for finite values.
fn non_finite_literal(v: f64) -> Option<String> {
    if v.is_nan() {
        Some("NaN".to_string())
    } else if v.is_infinite() {
        let literal = if v > 0.0 { "Infinity" } else { "-Infinity" };
        Some(literal.to_string())
    } else {
        None
    }
}

/// Wraps a string in single quotes, doubling embedded quotes.
pub fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

macro_rules! impl_from_for_cql_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for CqlValue {
                fn from(v: $ty) -> Self {
                    CqlValue::$variant(v)
                }
            }
        )*
    };
}

impl_from_for_cql_value! {
    bool => Boolean,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
    Decimal => Decimal,
    String => Text,
    Vec<u8> => Blob,
    IpAddr => Inet,
    Uuid => Uuid,
    NaiveDate => Date,
    NaiveTime => Time,
    DateTime<Utc> => Timestamp,
    CollectionValue => Collection,
}

impl From<&str> for CqlValue {
    fn from(v: &str) -> Self {
        CqlValue::Text(v.to_string())
    }
}

impl<T: Into<CqlValue>> From<Option<T>> for CqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CqlValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_string_literal_escaping() {
        assert_eq!(CqlValue::from("it's").to_cql_literal(), "'it''s'");
        assert_eq!(quote_string(""), "''");
    }

    #[test]
    fn test_numeric_literals_are_verbatim() {
        assert_eq!(CqlValue::Int(42).to_cql_literal(), "42");
        assert_eq!(CqlValue::BigInt(-7).to_cql_literal(), "-7");
        assert_eq!(CqlValue::Double(1.5).to_cql_literal(), "1.5");
        assert_eq!(CqlValue::Double(f64::NAN).to_cql_literal(), "NaN");
        assert_eq!(CqlValue::Float(f32::NEG_INFINITY).to_cql_literal(), "-Infinity");
        assert_eq!(CqlValue::Float(f32::NAN).to_cql_literal(), "NaN");
        assert_eq!(CqlValue::Float(0.1).to_cql_literal(), "0.1");
        assert_eq!(CqlValue::Float(2.5).to_cql_literal(), "2.5");
        assert_eq!(CqlValue::Boolean(true).to_cql_literal(), "true");
    }

    #[test]
    fn test_blob_and_uuid_literals() {
        assert_eq!(CqlValue::Blob(vec![0xca, 0xfe]).to_cql_literal(), "0xcafe");
        let id = Uuid::parse_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap();
        assert_eq!(
            CqlValue::Uuid(id).to_cql_literal(),
            "6ba7b810-9dad-11d1-80b4-00c04fd430c8"
        );
    }

    #[test]
    fn test_temporal_literals() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(CqlValue::Date(date).to_cql_literal(), "'2024-02-29'");

        let ts = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(CqlValue::Timestamp(ts).to_cql_literal(), "1700000000123");
    }

    #[test]
    fn test_compatibility() {
        assert!(CqlValue::from("abc").is_compatible_with(CqlType::Ascii));
        assert!(!CqlValue::from("é").is_compatible_with(CqlType::Ascii));
        assert!(CqlValue::from("é").is_compatible_with(CqlType::Varchar));
        assert!(CqlValue::Int(1).is_compatible_with(CqlType::Int));
        assert!(!CqlValue::Int(1).is_compatible_with(CqlType::BigInt));
        assert!(CqlValue::TimeUuid(Uuid::nil()).is_compatible_with(CqlType::Uuid));
        assert!(!CqlValue::Uuid(Uuid::nil()).is_compatible_with(CqlType::TimeUuid));
    }

    #[test]
    fn test_string_types() {
        assert!(CqlType::Text.is_string_type());
        assert!(CqlType::Inet.is_string_type());
        assert!(!CqlType::Uuid.is_string_type());
        assert!(!CqlType::Int.is_string_type());
    }

    #[test]
    fn test_type_from_str() {
        assert_eq!("TEXT".parse::<CqlType>().unwrap(), CqlType::Text);
        assert_eq!("timeuuid".parse::<CqlType>().unwrap(), CqlType::TimeUuid);
        assert!(matches!(
            "jsonb".parse::<CqlType>(),
            Err(DataBridgeError::Validation(_))
        ));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(CqlValue::from(None::<i32>), CqlValue::Null);
        assert_eq!(CqlValue::from(Some(3)), CqlValue::Int(3));
    }

    #[test]
    fn test_to_json() {
        assert_eq!(CqlValue::Int(5).to_json(), serde_json::json!(5));
        assert_eq!(CqlValue::from("a").to_json(), serde_json::json!("a"));
        assert_eq!(CqlValue::Double(f64::NAN).to_json(), JsonValue::Null);
        assert_eq!(CqlValue::Null.to_json(), JsonValue::Null);
    }
}
