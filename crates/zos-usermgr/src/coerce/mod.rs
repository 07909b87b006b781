//! Type coercion between store cells and requested types.
//!
//! Requested types form a closed set ([`TargetType`]); each category has
//! one conversion function. Conversion failures are never errors: the
//! result is simply absent.
//!
//! Multi-value rules:
//! - a single-value request over several cells converts the first cell only
//! - an array request converts every cell on its own and silently drops the
//!   ones that fail; only when every cell fails is the result absent
//! - an array request over a single cell yields a one-element array

mod from_property;
mod value;

pub use from_property::{FromProperty, ScalarProperty};
pub use value::PropertyValue;

use tracing::trace;
use zos_principal::{StoreError, Value};

use crate::stream::LazyStream;

/// Supported conversion targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetType {
    String,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    Bool,
    /// Date or timestamp
    Date,
    /// Raw binary handle
    Binary,
    /// Lazily opened input stream
    Stream,
    /// Store cell passthrough
    Cell,
}

/// A conversion request: one value, or an array of values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Requested {
    One(TargetType),
    Many(TargetType),
}

fn narrow<T: TryFrom<i64>>(value: &Value) -> Result<Option<T>, StoreError> {
    Ok(T::try_from(value.get_long()?).ok())
}

fn narrow_unsigned<T: TryFrom<u64>>(value: &Value) -> Result<Option<T>, StoreError> {
    Ok(u64::try_from(value.get_long()?)
        .ok()
        .and_then(|n| T::try_from(n).ok()))
}

fn convert_checked(value: &Value, target: TargetType) -> Result<Option<PropertyValue>, StoreError> {
    Ok(match target {
        TargetType::String => Some(PropertyValue::String(value.get_string()?)),
        TargetType::I8 => narrow(value)?.map(PropertyValue::I8),
        TargetType::I16 => narrow(value)?.map(PropertyValue::I16),
        TargetType::I32 => narrow(value)?.map(PropertyValue::I32),
        TargetType::I64 => Some(PropertyValue::I64(value.get_long()?)),
        TargetType::U8 => narrow_unsigned(value)?.map(PropertyValue::U8),
        TargetType::U16 => narrow_unsigned(value)?.map(PropertyValue::U16),
        TargetType::U32 => narrow_unsigned(value)?.map(PropertyValue::U32),
        TargetType::U64 => narrow_unsigned(value)?.map(PropertyValue::U64),
        TargetType::F32 => Some(PropertyValue::F32(value.get_double()? as f32)),
        TargetType::F64 => Some(PropertyValue::F64(value.get_double()?)),
        TargetType::Decimal => Some(PropertyValue::Decimal(value.get_decimal()?)),
        TargetType::Bool => Some(PropertyValue::Bool(value.get_boolean()?)),
        TargetType::Date => Some(PropertyValue::Date(value.get_date()?)),
        TargetType::Binary => Some(PropertyValue::Binary(value.get_binary()?)),
        TargetType::Stream => Some(PropertyValue::Stream(LazyStream::new(value.clone()))),
        TargetType::Cell => Some(PropertyValue::Cell(value.clone())),
    })
}

/// Convert one cell to the target category, `None` if it cannot be.
pub fn convert_value(value: &Value, target: TargetType) -> Option<PropertyValue> {
    match convert_checked(value, target) {
        Ok(converted) => converted,
        Err(e) => {
            trace!(from = value.type_name(), ?target, error = %e, "value not convertible");
            None
        }
    }
}

/// Convert the cells of one property as requested.
pub fn coerce(values: &[Value], requested: Requested) -> Option<PropertyValue> {
    match requested {
        Requested::One(target) => values.first().and_then(|v| convert_value(v, target)),
        Requested::Many(target) => {
            let converted: Vec<PropertyValue> = values
                .iter()
                .filter_map(|v| convert_value(v, target))
                .collect();
            if converted.is_empty() && !values.is_empty() {
                None
            } else {
                Some(PropertyValue::Array(converted))
            }
        }
    }
}

fn natural_value(value: &Value) -> PropertyValue {
    match value {
        Value::String(s) | Value::Name(s) | Value::Path(s) => PropertyValue::String(s.clone()),
        Value::Long(n) => PropertyValue::I64(*n),
        Value::Double(d) => PropertyValue::F64(*d),
        Value::Decimal(d) => PropertyValue::Decimal(*d),
        Value::Boolean(b) => PropertyValue::Bool(*b),
        Value::Date(d) => PropertyValue::Date(*d),
        Value::Binary(_) => PropertyValue::Stream(LazyStream::new(value.clone())),
    }
}

/// Generic form of a property: each cell in its natural category, an array
/// unless the property holds exactly one value. Binary cells become lazy
/// streams.
pub fn natural(values: &[Value]) -> PropertyValue {
    match values {
        [single] => natural_value(single),
        many => PropertyValue::Array(many.iter().map(natural_value).collect()),
    }
}

/// Re-convert an already computed value to a requested type.
pub fn recoerce(value: &PropertyValue, requested: Requested) -> Option<PropertyValue> {
    let cells: Vec<Value> = match value {
        PropertyValue::Array(items) => items.iter().filter_map(PropertyValue::to_cell).collect(),
        scalar => scalar.to_cell().into_iter().collect(),
    };
    coerce(&cells, requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::io::Read;
    use zos_principal::Binary;

    fn strings(items: &[&str]) -> Vec<Value> {
        items.iter().map(|s| Value::from(*s)).collect()
    }

    #[test]
    fn test_partial_array_conversion() {
        let values = strings(&["1", "x", "3"]);
        assert_eq!(
            coerce(&values, Requested::Many(TargetType::I32)),
            Some(PropertyValue::Array(vec![
                PropertyValue::I32(1),
                PropertyValue::I32(3)
            ]))
        );
    }

    #[test]
    fn test_all_failing_array_is_absent() {
        let values = strings(&["a", "b"]);
        assert_eq!(coerce(&values, Requested::Many(TargetType::I64)), None);
        assert_eq!(
            coerce(&[], Requested::Many(TargetType::I64)),
            Some(PropertyValue::Array(Vec::new()))
        );
    }

    #[test]
    fn test_scalar_request_uses_first_value() {
        let values = strings(&["10", "20"]);
        assert_eq!(
            coerce(&values, Requested::One(TargetType::I64)),
            Some(PropertyValue::I64(10))
        );
        assert_eq!(coerce(&strings(&["x", "20"]), Requested::One(TargetType::I64)), None);
        assert_eq!(coerce(&[], Requested::One(TargetType::String)), None);
    }

    #[test]
    fn test_single_value_wrapped_for_array_request() {
        assert_eq!(
            coerce(&strings(&["7"]), Requested::Many(TargetType::U8)),
            Some(PropertyValue::Array(vec![PropertyValue::U8(7)]))
        );
    }

    #[test]
    fn test_integer_widths_are_checked() {
        let big = Value::Long(300);
        assert_eq!(convert_value(&big, TargetType::I8), None);
        assert_eq!(convert_value(&big, TargetType::U8), None);
        assert_eq!(convert_value(&big, TargetType::I16), Some(PropertyValue::I16(300)));
        assert_eq!(convert_value(&Value::Long(-1), TargetType::U32), None);
        assert_eq!(convert_value(&Value::Long(-1), TargetType::I32), Some(PropertyValue::I32(-1)));
    }

    #[test]
    fn test_other_categories() {
        let v = Value::from("2.5");
        assert_eq!(convert_value(&v, TargetType::F64), Some(PropertyValue::F64(2.5)));
        assert_eq!(convert_value(&v, TargetType::F32), Some(PropertyValue::F32(2.5)));
        assert_eq!(
            convert_value(&v, TargetType::Decimal),
            Some(PropertyValue::Decimal(Decimal::new(25, 1)))
        );
        assert_eq!(
            convert_value(&Value::from("True"), TargetType::Bool),
            Some(PropertyValue::Bool(true))
        );
        assert_eq!(convert_value(&Value::Long(1), TargetType::Bool), None);

        let date = Utc.timestamp_millis_opt(86_400_000).unwrap();
        assert_eq!(
            convert_value(&Value::Long(86_400_000), TargetType::Date),
            Some(PropertyValue::Date(date))
        );
        assert_eq!(
            convert_value(&Value::Date(date), TargetType::String),
            Some(PropertyValue::from("1970-01-02T00:00:00.000Z"))
        );
        assert_eq!(
            convert_value(&v, TargetType::Cell),
            Some(PropertyValue::Cell(v.clone()))
        );
    }

    #[test]
    fn test_stream_and_binary_targets() {
        let bin = Binary::from_bytes(b"raw".to_vec());
        let cell = Value::Binary(bin.clone());
        assert_eq!(
            convert_value(&cell, TargetType::Binary),
            Some(PropertyValue::Binary(bin))
        );
        match convert_value(&cell, TargetType::Stream) {
            Some(PropertyValue::Stream(mut s)) => {
                assert!(!s.is_opened());
                let mut out = Vec::new();
                s.read_to_end(&mut out).unwrap();
                assert_eq!(out, b"raw");
            }
            other => panic!("Expected stream, got {:?}", other),
        }
    }

    #[test]
    fn test_natural_forms() {
        assert_eq!(natural(&strings(&["a"])), PropertyValue::from("a"));
        assert_eq!(
            natural(&[Value::Long(1), Value::Long(2)]),
            PropertyValue::Array(vec![PropertyValue::I64(1), PropertyValue::I64(2)])
        );
        assert_eq!(natural(&[]), PropertyValue::Array(Vec::new()));
        assert!(matches!(
            natural(&[Value::Binary(Binary::from_bytes(vec![0]))]),
            PropertyValue::Stream(_)
        ));
    }

    #[test]
    fn test_recoerce_computed_values() {
        let paths = PropertyValue::strings(["/a", "/b"]);
        assert_eq!(
            recoerce(&paths, Requested::One(TargetType::String)),
            Some(PropertyValue::from("/a"))
        );
        assert_eq!(recoerce(&paths, Requested::Many(TargetType::I64)), None);
    }
}
