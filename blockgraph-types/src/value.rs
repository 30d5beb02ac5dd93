use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::data_type::DataType;
use crate::error::TypesError;

/// A tagged scalar value: a [`DataType`] plus the matching native storage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Value {
    /// The zero/default value of `dt`.
    pub fn make_default(dt: DataType) -> Self {
        match dt {
            DataType::NONE => Value::None,
            DataType::BOOL => Value::Bool(false),
            DataType::U8 => Value::U8(0),
            DataType::I8 => Value::I8(0),
            DataType::U16 => Value::U16(0),
            DataType::I16 => Value::I16(0),
            DataType::U32 => Value::U32(0),
            DataType::I32 => Value::I32(0),
            DataType::U64 => Value::U64(0),
            DataType::I64 => Value::I64(0),
            DataType::F32 => Value::F32(0.0),
            DataType::F64 => Value::F64(0.0),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::None => DataType::NONE,
            Value::Bool(_) => DataType::BOOL,
            Value::U8(_) => DataType::U8,
            Value::I8(_) => DataType::I8,
            Value::U16(_) => DataType::U16,
            Value::I16(_) => DataType::I16,
            Value::U32(_) => DataType::U32,
            Value::I32(_) => DataType::I32,
            Value::U64(_) => DataType::U64,
            Value::I64(_) => DataType::I64,
            Value::F32(_) => DataType::F32,
            Value::F64(_) => DataType::F64,
        }
    }

    /// Parses `s` as a value of `dt`.
    ///
    /// Integer types accept decimal literals, float types accept decimal
    /// literals with an optional exponent, and `BOOL` accepts any integer
    /// literal (`0` is false, anything else is true).
    pub fn from_string(s: &str, dt: DataType) -> Result<Self, TypesError> {
        let parse_err = |reason: String| TypesError::ParseError {
            input: s.to_string(),
            dtype: dt.to_string(),
            reason,
        };

        Ok(match dt {
            DataType::NONE => Value::None,
            DataType::BOOL => {
                let n: i64 = s.parse().map_err(|e: core::num::ParseIntError| parse_err(e.to_string()))?;
                Value::Bool(n != 0)
            }
            DataType::U8 => Value::U8(s.parse().map_err(|e: core::num::ParseIntError| parse_err(e.to_string()))?),
            DataType::I8 => Value::I8(s.parse().map_err(|e: core::num::ParseIntError| parse_err(e.to_string()))?),
            DataType::U16 => Value::U16(s.parse().map_err(|e: core::num::ParseIntError| parse_err(e.to_string()))?),
            DataType::I16 => Value::I16(s.parse().map_err(|e: core::num::ParseIntError| parse_err(e.to_string()))?),
            DataType::U32 => Value::U32(s.parse().map_err(|e: core::num::ParseIntError| parse_err(e.to_string()))?),
            DataType::I32 => Value::I32(s.parse().map_err(|e: core::num::ParseIntError| parse_err(e.to_string()))?),
            DataType::U64 => Value::U64(s.parse().map_err(|e: core::num::ParseIntError| parse_err(e.to_string()))?),
            DataType::I64 => Value::I64(s.parse().map_err(|e: core::num::ParseIntError| parse_err(e.to_string()))?),
            DataType::F32 => Value::F32(s.parse().map_err(|e: core::num::ParseFloatError| parse_err(e.to_string()))?),
            DataType::F64 => Value::F64(s.parse().map_err(|e: core::num::ParseFloatError| parse_err(e.to_string()))?),
        })
    }

    /// Renders this value to a string. Integers and booleans round-trip
    /// through [`Value::from_string`]; floats render with full precision.
    pub fn render(&self) -> String {
        match self {
            Value::None => "none".to_string(),
            Value::Bool(b) => {
                if *b {
                    "1".to_string()
                } else {
                    "0".to_string()
                }
            }
            Value::U8(v) => v.to_string(),
            Value::I8(v) => v.to_string(),
            Value::U16(v) => v.to_string(),
            Value::I16(v) => v.to_string(),
            Value::U32(v) => v.to_string(),
            Value::I32(v) => v.to_string(),
            Value::U64(v) => v.to_string(),
            Value::I64(v) => v.to_string(),
            Value::F32(v) => v.to_string(),
            Value::F64(v) => v.to_string(),
        }
    }

    /// Overwrites this value in place with `other`'s contents. Fails unless
    /// both values share a data type.
    pub fn copy_from(&mut self, other: &Value) -> Result<(), TypesError> {
        if self.data_type() != other.data_type() {
            return Err(TypesError::TypeMismatch {
                expected: self.data_type().to_string(),
                found: other.data_type().to_string(),
            });
        }
        *self = *other;
        Ok(())
    }

    /// Converts this value to another numeric type using the host language's
    /// standard (possibly narrowing) numeric conversion. `bool -> numeric` is
    /// `0`/`1`; `numeric -> bool` is "not equal to zero".
    pub fn convert_type(&self, dt: DataType) -> Self {
        if dt == self.data_type() {
            return *self;
        }

        // First reduce self to an f64 (for floats/bools) and an i128 (for
        // integers) so every destination type has a well-defined source to
        // cast from, mirroring the host numeric-conversion rules per type.
        match (*self, dt) {
            (_, DataType::NONE) => Value::None,
            (Value::None, _) => Value::make_default(dt),

            (Value::Bool(b), _) => {
                let n: u8 = b as u8;
                Self::from_i128(n as i128, dt)
            }
            (_, DataType::BOOL) => Value::Bool(self.as_f64() != 0.0),

            (Value::F32(v), _) => Self::from_f64(v as f64, dt),
            (Value::F64(v), _) => Self::from_f64(v, dt),

            _ => Self::from_i128(self.as_i128(), dt),
        }
    }

    /// This value's closest `f64` approximation. Used by numeric blocks
    /// that need to do arithmetic generically across data types.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::None => 0.0,
            Value::Bool(b) => b as u8 as f64,
            Value::U8(v) => v as f64,
            Value::I8(v) => v as f64,
            Value::U16(v) => v as f64,
            Value::I16(v) => v as f64,
            Value::U32(v) => v as f64,
            Value::I32(v) => v as f64,
            Value::U64(v) => v as f64,
            Value::I64(v) => v as f64,
            Value::F32(v) => v as f64,
            Value::F64(v) => v,
        }
    }

    fn as_i128(&self) -> i128 {
        match *self {
            Value::None => 0,
            Value::Bool(b) => b as i128,
            Value::U8(v) => v as i128,
            Value::I8(v) => v as i128,
            Value::U16(v) => v as i128,
            Value::I16(v) => v as i128,
            Value::U32(v) => v as i128,
            Value::I32(v) => v as i128,
            Value::U64(v) => v as i128,
            Value::I64(v) => v as i128,
            Value::F32(v) => v as i128,
            Value::F64(v) => v as i128,
        }
    }

    fn from_i128(v: i128, dt: DataType) -> Self {
        match dt {
            DataType::NONE => Value::None,
            DataType::BOOL => Value::Bool(v != 0),
            DataType::U8 => Value::U8(v as u8),
            DataType::I8 => Value::I8(v as i8),
            DataType::U16 => Value::U16(v as u16),
            DataType::I16 => Value::I16(v as i16),
            DataType::U32 => Value::U32(v as u32),
            DataType::I32 => Value::I32(v as i32),
            DataType::U64 => Value::U64(v as u64),
            DataType::I64 => Value::I64(v as i64),
            DataType::F32 => Value::F32(v as f32),
            DataType::F64 => Value::F64(v as f64),
        }
    }

    /// Builds a value of `dt` from an `f64`, using the host language's
    /// standard (possibly narrowing) numeric conversion.
    pub fn from_f64(v: f64, dt: DataType) -> Self {
        match dt {
            DataType::NONE => Value::None,
            DataType::BOOL => Value::Bool(v != 0.0),
            DataType::U8 => Value::U8(v as u8),
            DataType::I8 => Value::I8(v as i8),
            DataType::U16 => Value::U16(v as u16),
            DataType::I16 => Value::I16(v as i16),
            DataType::U32 => Value::U32(v as u32),
            DataType::I32 => Value::I32(v as i32),
            DataType::U64 => Value::U64(v as u64),
            DataType::I64 => Value::I64(v as i64),
            DataType::F32 => Value::F32(v as f32),
            DataType::F64 => Value::F64(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// On-disk shape for a value in the model file format: `{"value": "...", "dtype": "..."}`.
#[derive(Serialize, Deserialize)]
struct ValueRecord {
    value: String,
    dtype: String,
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        ValueRecord {
            value: self.render(),
            dtype: self.data_type().to_string(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let record = ValueRecord::deserialize(deserializer)?;
        let dtype: DataType = record
            .dtype
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("unknown data type '{}'", record.dtype)))?;
        Value::from_string(&record.value, dtype).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_zeroed() {
        assert_eq!(Value::make_default(DataType::F64), Value::F64(0.0));
        assert_eq!(Value::make_default(DataType::BOOL), Value::Bool(false));
        assert_eq!(Value::make_default(DataType::NONE), Value::None);
    }

    #[test]
    fn integer_and_bool_round_trip() {
        for (dt, text) in [
            (DataType::I32, "-42"),
            (DataType::U64, "9999999999"),
            (DataType::BOOL, "1"),
            (DataType::BOOL, "0"),
        ] {
            let v = Value::from_string(text, dt).unwrap();
            let rendered = v.render();
            let back = Value::from_string(&rendered, dt).unwrap();
            assert_eq!(v, back);
        }
    }

    #[test]
    fn float_parses_with_exponent() {
        let v = Value::from_string("1.5e3", DataType::F64).unwrap();
        assert_eq!(v, Value::F64(1500.0));
    }

    #[test]
    fn parse_error_on_invalid_input() {
        assert!(Value::from_string("not-a-number", DataType::I32).is_err());
        assert!(Value::from_string("99999", DataType::U8).is_err());
    }

    #[test]
    fn scalar_parsing_does_not_trim_surrounding_whitespace() {
        assert!(Value::from_string(" 5 ", DataType::I32).is_err());
        assert!(Value::from_string(" 1.5 ", DataType::F64).is_err());
    }

    #[test]
    fn copy_from_requires_same_type() {
        let mut a = Value::F64(1.0);
        let b = Value::F64(2.0);
        a.copy_from(&b).unwrap();
        assert_eq!(a, Value::F64(2.0));

        let mut c = Value::I32(1);
        assert!(c.copy_from(&b).is_err());
    }

    #[test]
    fn convert_type_bool_is_zero_or_one() {
        assert_eq!(Value::Bool(true).convert_type(DataType::I32), Value::I32(1));
        assert_eq!(Value::Bool(false).convert_type(DataType::F64), Value::F64(0.0));
        assert_eq!(Value::I32(0).convert_type(DataType::BOOL), Value::Bool(false));
        assert_eq!(Value::I32(5).convert_type(DataType::BOOL), Value::Bool(true));
    }

    #[test]
    fn convert_type_narrows_like_host_cast() {
        assert_eq!(Value::I32(300).convert_type(DataType::U8), Value::U8(300u32 as u8));
        assert_eq!(Value::F64(3.9).convert_type(DataType::I32), Value::I32(3));
    }

    #[test]
    fn serde_round_trips_through_value_dtype_record() {
        let v = Value::F64(2.5);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"value":"2.5","dtype":"F64"}"#);
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}
