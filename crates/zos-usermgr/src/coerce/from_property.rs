//! Typed extraction of property values.
//!
//! Every Rust type that can be requested from a property view maps to one
//! [`Requested`] shape. Several Rust types share a category: all date-like
//! types request [`TargetType::Date`], stream-like ones
//! [`TargetType::Stream`].

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use zos_principal::{Binary, Value};

use super::{PropertyValue, Requested, TargetType};
use crate::stream::LazyStream;

/// A type that can be read out of a property view.
pub trait FromProperty: Sized {
    /// Shape of the conversion request for this type.
    const REQUESTED: Requested;

    /// Extract from a value converted per [`Self::REQUESTED`].
    fn from_property(value: PropertyValue) -> Option<Self>;
}

/// A single-valued [`FromProperty`] type, usable as an array element.
pub trait ScalarProperty: FromProperty {
    /// Conversion category of this type.
    const TARGET: TargetType;
}

macro_rules! scalar_property {
    ($ty:ty, $target:ident, $pattern:pat => $out:expr) => {
        impl FromProperty for $ty {
            const REQUESTED: Requested = Requested::One(TargetType::$target);

            fn from_property(value: PropertyValue) -> Option<Self> {
                match value {
                    $pattern => Some($out),
                    _ => None,
                }
            }
        }

        impl ScalarProperty for $ty {
            const TARGET: TargetType = TargetType::$target;
        }
    };
}

scalar_property!(String, String, PropertyValue::String(v) => v);
scalar_property!(i8, I8, PropertyValue::I8(v) => v);
scalar_property!(i16, I16, PropertyValue::I16(v) => v);
scalar_property!(i32, I32, PropertyValue::I32(v) => v);
scalar_property!(i64, I64, PropertyValue::I64(v) => v);
scalar_property!(u8, U8, PropertyValue::U8(v) => v);
scalar_property!(u16, U16, PropertyValue::U16(v) => v);
scalar_property!(u32, U32, PropertyValue::U32(v) => v);
scalar_property!(u64, U64, PropertyValue::U64(v) => v);
scalar_property!(f32, F32, PropertyValue::F32(v) => v);
scalar_property!(f64, F64, PropertyValue::F64(v) => v);
scalar_property!(Decimal, Decimal, PropertyValue::Decimal(v) => v);
scalar_property!(bool, Bool, PropertyValue::Bool(v) => v);
scalar_property!(DateTime<Utc>, Date, PropertyValue::Date(v) => v);
scalar_property!(DateTime<FixedOffset>, Date, PropertyValue::Date(v) => v.fixed_offset());
scalar_property!(NaiveDateTime, Date, PropertyValue::Date(v) => v.naive_utc());
scalar_property!(Binary, Binary, PropertyValue::Binary(v) => v);
scalar_property!(LazyStream, Stream, PropertyValue::Stream(v) => v);
scalar_property!(Value, Cell, PropertyValue::Cell(v) => v);

impl<T: ScalarProperty> FromProperty for Vec<T> {
    const REQUESTED: Requested = Requested::Many(T::TARGET);

    fn from_property(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Array(items) => Some(items.into_iter().filter_map(T::from_property).collect()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::coerce;
    use chrono::TimeZone;

    fn extract<T: FromProperty>(values: &[Value]) -> Option<T> {
        coerce(values, T::REQUESTED).and_then(T::from_property)
    }

    #[test]
    fn test_scalar_extraction() {
        assert_eq!(extract::<i32>(&[Value::from("42")]), Some(42));
        assert_eq!(extract::<String>(&[Value::Long(42)]), Some(String::from("42")));
        assert_eq!(extract::<bool>(&[Value::Long(1)]), None);
    }

    #[test]
    fn test_date_like_types_share_category() {
        let cells = [Value::Long(0)];
        let utc = extract::<DateTime<Utc>>(&cells).unwrap();
        let fixed = extract::<DateTime<FixedOffset>>(&cells).unwrap();
        let naive = extract::<NaiveDateTime>(&cells).unwrap();
        assert_eq!(utc, Utc.timestamp_millis_opt(0).unwrap());
        assert_eq!(fixed.timestamp(), 0);
        assert_eq!(naive.and_utc().timestamp(), 0);
        assert_eq!(<NaiveDateTime as FromProperty>::REQUESTED, Requested::One(TargetType::Date));
    }

    #[test]
    fn test_vec_extraction() {
        let cells = [Value::from("1"), Value::from("x"), Value::from("3")];
        assert_eq!(extract::<Vec<i64>>(&cells), Some(vec![1, 3]));
        assert_eq!(extract::<Vec<String>>(&cells).map(|v| v.len()), Some(3));
        assert_eq!(
            <Vec<u16> as FromProperty>::REQUESTED,
            Requested::Many(TargetType::U16)
        );
    }
}
