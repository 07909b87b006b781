//! Store-native value cells.
//!
//! A [`Value`] is what the principal store hands out for one property
//! value. Cells know how to read themselves as each of the store's native
//! types; a cell that cannot be read as the requested type reports
//! [`StoreError::ValueFormat`].

use std::fmt;
use std::io::{Cursor, Read};
use std::rc::Rc;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::error::StoreError;

/// Something that can produce binary content on demand.
///
/// Opening is assumed to be expensive, so callers should defer it.
pub trait BinarySource: fmt::Debug {
    /// Content length in bytes.
    fn len(&self) -> u64;

    /// Open a fresh reader over the content.
    fn open(&self) -> Result<Box<dyn Read>, StoreError>;
}

#[derive(Debug)]
struct MemorySource {
    data: Rc<[u8]>,
}

impl BinarySource for MemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn open(&self) -> Result<Box<dyn Read>, StoreError> {
        Ok(Box::new(Cursor::new(self.data.to_vec())))
    }
}

/// Shared handle to binary content held by the store.
#[derive(Clone, Debug)]
pub struct Binary {
    source: Rc<dyn BinarySource>,
}

impl Binary {
    /// Wrap an arbitrary binary source.
    pub fn new(source: impl BinarySource + 'static) -> Self {
        Self {
            source: Rc::new(source),
        }
    }

    /// Binary content backed by an in-memory buffer.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let data: Vec<u8> = bytes.into();
        Self::new(MemorySource { data: data.into() })
    }

    /// Content length in bytes.
    pub fn len(&self) -> u64 {
        self.source.len()
    }

    /// True if the content is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Open a reader over the content.
    pub fn open(&self) -> Result<Box<dyn Read>, StoreError> {
        self.source.open()
    }

    /// Read the whole content into memory.
    pub fn read_all(&self) -> Result<Vec<u8>, StoreError> {
        let mut reader = self.open()?;
        let mut buf = Vec::with_capacity(self.len() as usize);
        reader
            .read_to_end(&mut buf)
            .map_err(|e| StoreError::repository(e.to_string()))?;
        Ok(buf)
    }
}

impl PartialEq for Binary {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.source, &other.source)
    }
}

/// A single store-native property value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Text
    String(String),
    /// 64-bit signed integer
    Long(i64),
    /// Double precision float
    Double(f64),
    /// Arbitrary precision decimal
    Decimal(Decimal),
    /// Boolean
    Boolean(bool),
    /// Point in time
    Date(DateTime<Utc>),
    /// Binary content
    Binary(Binary),
    /// Qualified name
    Name(String),
    /// Repository path
    Path(String),
}

impl Value {
    /// Native type name of this cell.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "String",
            Value::Long(_) => "Long",
            Value::Double(_) => "Double",
            Value::Decimal(_) => "Decimal",
            Value::Boolean(_) => "Boolean",
            Value::Date(_) => "Date",
            Value::Binary(_) => "Binary",
            Value::Name(_) => "Name",
            Value::Path(_) => "Path",
        }
    }

    fn mismatch<T>(&self, to: &'static str) -> Result<T, StoreError> {
        Err(StoreError::value_format(self.type_name(), to))
    }

    /// Read the cell as text. Every cell has a text form.
    pub fn get_string(&self) -> Result<String, StoreError> {
        Ok(match self {
            Value::String(s) | Value::Name(s) | Value::Path(s) => s.clone(),
            Value::Long(n) => n.to_string(),
            Value::Double(d) => d.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
            Value::Binary(b) => String::from_utf8(b.read_all()?)
                .map_err(|_| StoreError::value_format("Binary", "String"))?,
        })
    }

    /// Read the cell as a long. Dates read as epoch milliseconds.
    pub fn get_long(&self) -> Result<i64, StoreError> {
        match self {
            Value::Long(n) => Ok(*n),
            Value::Double(d) => Ok(*d as i64),
            Value::Decimal(d) => d
                .trunc()
                .to_i64()
                .ok_or(StoreError::value_format("Decimal", "Long")),
            Value::Date(d) => Ok(d.timestamp_millis()),
            Value::String(s) => s
                .parse()
                .map_err(|_| StoreError::value_format("String", "Long")),
            Value::Binary(_) => Value::String(self.get_string()?).get_long(),
            _ => self.mismatch("Long"),
        }
    }

    /// Read the cell as a double.
    pub fn get_double(&self) -> Result<f64, StoreError> {
        match self {
            Value::Double(d) => Ok(*d),
            Value::Long(n) => Ok(*n as f64),
            Value::Decimal(d) => d.to_f64().ok_or(StoreError::value_format("Decimal", "Double")),
            Value::Date(d) => Ok(d.timestamp_millis() as f64),
            Value::String(s) => s
                .parse()
                .map_err(|_| StoreError::value_format("String", "Double")),
            Value::Binary(_) => Value::String(self.get_string()?).get_double(),
            _ => self.mismatch("Double"),
        }
    }

    /// Read the cell as a decimal.
    pub fn get_decimal(&self) -> Result<Decimal, StoreError> {
        match self {
            Value::Decimal(d) => Ok(*d),
            Value::Long(n) => Ok(Decimal::from(*n)),
            Value::Double(d) => {
                Decimal::from_f64(*d).ok_or(StoreError::value_format("Double", "Decimal"))
            }
            Value::Date(d) => Ok(Decimal::from(d.timestamp_millis())),
            Value::String(s) => {
                Decimal::from_str(s).map_err(|_| StoreError::value_format("String", "Decimal"))
            }
            Value::Binary(_) => Value::String(self.get_string()?).get_decimal(),
            _ => self.mismatch("Decimal"),
        }
    }

    /// Read the cell as a boolean. Text reads as `true` only when it equals
    /// `true` ignoring case.
    pub fn get_boolean(&self) -> Result<bool, StoreError> {
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::String(s) => Ok(s.eq_ignore_ascii_case("true")),
            Value::Binary(_) => Value::String(self.get_string()?).get_boolean(),
            _ => self.mismatch("Boolean"),
        }
    }

    /// Read the cell as a date. Numbers read as epoch milliseconds, text as
    /// ISO-8601.
    pub fn get_date(&self) -> Result<DateTime<Utc>, StoreError> {
        let from_millis = |ms: i64| {
            Utc.timestamp_millis_opt(ms)
                .single()
                .ok_or(StoreError::value_format(self.type_name(), "Date"))
        };
        match self {
            Value::Date(d) => Ok(*d),
            Value::Long(n) => from_millis(*n),
            Value::Double(d) => from_millis(*d as i64),
            Value::Decimal(d) => from_millis(
                d.trunc()
                    .to_i64()
                    .ok_or(StoreError::value_format("Decimal", "Date"))?,
            ),
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|_| StoreError::value_format("String", "Date")),
            Value::Binary(_) => Value::String(self.get_string()?).get_date(),
            _ => self.mismatch("Date"),
        }
    }

    /// Read the cell as binary content. Non-binary cells expose their text form.
    pub fn get_binary(&self) -> Result<Binary, StoreError> {
        match self {
            Value::Binary(b) => Ok(b.clone()),
            _ => Ok(Binary::from_bytes(self.get_string()?.into_bytes())),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(String::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<Binary> for Value {
    fn from(b: Binary) -> Self {
        Value::Binary(b)
    }
}
