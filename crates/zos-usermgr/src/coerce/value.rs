//! Resolved property values held by a property view.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use zos_principal::{Binary, Value};

use super::{Requested, TargetType};
use crate::stream::LazyStream;

/// A property value after conversion out of store cells.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    String(String),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    Bool(bool),
    Date(DateTime<Utc>),
    Binary(Binary),
    Stream(LazyStream),
    /// Store cell passed through untouched
    Cell(Value),
    /// Multi-value property, every element of the same category
    Array(Vec<PropertyValue>),
}

impl PropertyValue {
    /// Array of strings.
    pub fn strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropertyValue::Array(
            items
                .into_iter()
                .map(|s| PropertyValue::String(s.into()))
                .collect(),
        )
    }

    /// Category of a scalar value, `None` for arrays.
    pub fn target_type(&self) -> Option<TargetType> {
        Some(match self {
            PropertyValue::String(_) => TargetType::String,
            PropertyValue::I8(_) => TargetType::I8,
            PropertyValue::I16(_) => TargetType::I16,
            PropertyValue::I32(_) => TargetType::I32,
            PropertyValue::I64(_) => TargetType::I64,
            PropertyValue::U8(_) => TargetType::U8,
            PropertyValue::U16(_) => TargetType::U16,
            PropertyValue::U32(_) => TargetType::U32,
            PropertyValue::U64(_) => TargetType::U64,
            PropertyValue::F32(_) => TargetType::F32,
            PropertyValue::F64(_) => TargetType::F64,
            PropertyValue::Decimal(_) => TargetType::Decimal,
            PropertyValue::Bool(_) => TargetType::Bool,
            PropertyValue::Date(_) => TargetType::Date,
            PropertyValue::Binary(_) => TargetType::Binary,
            PropertyValue::Stream(_) => TargetType::Stream,
            PropertyValue::Cell(_) => TargetType::Cell,
            PropertyValue::Array(_) => return None,
        })
    }

    /// The request shape this value normalizes to when used as a default.
    /// An empty array requests strings.
    pub fn requested(&self) -> Requested {
        match self {
            PropertyValue::Array(items) => Requested::Many(
                items
                    .first()
                    .and_then(PropertyValue::target_type)
                    .unwrap_or(TargetType::String),
            ),
            scalar => Requested::One(scalar.target_type().unwrap_or(TargetType::String)),
        }
    }

    /// Borrow as text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as array elements.
    pub fn as_array(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Array elements as text, skipping non-text elements.
    pub fn string_items(&self) -> Vec<&str> {
        self.as_array()
            .unwrap_or_default()
            .iter()
            .filter_map(PropertyValue::as_str)
            .collect()
    }

    /// Store cell form of a scalar, used to re-convert computed values.
    pub(crate) fn to_cell(&self) -> Option<Value> {
        Some(match self {
            PropertyValue::String(s) => Value::String(s.clone()),
            PropertyValue::I8(n) => Value::Long(i64::from(*n)),
            PropertyValue::I16(n) => Value::Long(i64::from(*n)),
            PropertyValue::I32(n) => Value::Long(i64::from(*n)),
            PropertyValue::I64(n) => Value::Long(*n),
            PropertyValue::U8(n) => Value::Long(i64::from(*n)),
            PropertyValue::U16(n) => Value::Long(i64::from(*n)),
            PropertyValue::U32(n) => Value::Long(i64::from(*n)),
            PropertyValue::U64(n) => Value::Long(i64::try_from(*n).ok()?),
            PropertyValue::F32(d) => Value::Double(f64::from(*d)),
            PropertyValue::F64(d) => Value::Double(*d),
            PropertyValue::Decimal(d) => Value::Decimal(*d),
            PropertyValue::Bool(b) => Value::Boolean(*b),
            PropertyValue::Date(d) => Value::Date(*d),
            PropertyValue::Binary(b) => Value::Binary(b.clone()),
            PropertyValue::Cell(v) => v.clone(),
            PropertyValue::Stream(_) | PropertyValue::Array(_) => return None,
        })
    }

    /// JSON rendering. Dates render as ISO-8601, decimals as strings,
    /// binaries and streams as their length.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            PropertyValue::String(s) => Json::from(s.as_str()),
            PropertyValue::I8(n) => Json::from(*n),
            PropertyValue::I16(n) => Json::from(*n),
            PropertyValue::I32(n) => Json::from(*n),
            PropertyValue::I64(n) => Json::from(*n),
            PropertyValue::U8(n) => Json::from(*n),
            PropertyValue::U16(n) => Json::from(*n),
            PropertyValue::U32(n) => Json::from(*n),
            PropertyValue::U64(n) => Json::from(*n),
            PropertyValue::F32(d) => Json::from(f64::from(*d)),
            PropertyValue::F64(d) => Json::from(*d),
            PropertyValue::Decimal(d) => Json::from(d.to_string()),
            PropertyValue::Bool(b) => Json::from(*b),
            PropertyValue::Date(d) => Json::from(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            PropertyValue::Binary(b) => Json::from(b.len()),
            PropertyValue::Stream(s) => s.len().map(Json::from).unwrap_or(Json::Null),
            PropertyValue::Cell(v) => v.get_string().map(Json::from).unwrap_or(Json::Null),
            PropertyValue::Array(items) => Json::Array(items.iter().map(|v| v.to_json()).collect()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(String::from(s))
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::I64(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(d: DateTime<Utc>) -> Self {
        PropertyValue::Date(d)
    }
}
