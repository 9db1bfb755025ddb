use std::{fmt, str::FromStr};

use ndarray::ArrayD;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::{AnyArray, JDataError};

/// Enum of all dtypes that can be carried by the `_ArrayType_` annotation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[schemars(extend("enum" = [
    "uint8", "uint16", "uint32", "uint64",
    "int8", "int16", "int32", "int64",
    "single", "double", "logical"
]))]
#[non_exhaustive]
#[expect(missing_docs)]
pub enum JDataDType {
    #[serde(rename = "uint8", alias = "u8")]
    U8,
    #[serde(rename = "uint16", alias = "u16")]
    U16,
    #[serde(rename = "uint32", alias = "u32")]
    U32,
    #[serde(rename = "uint64", alias = "u64")]
    U64,
    #[serde(rename = "int8", alias = "i8")]
    I8,
    #[serde(rename = "int16", alias = "i16")]
    I16,
    #[serde(rename = "int32", alias = "i32")]
    I32,
    #[serde(rename = "int64", alias = "i64")]
    I64,
    #[serde(rename = "single", alias = "float32", alias = "f32")]
    F32,
    #[serde(rename = "double", alias = "float64", alias = "f64")]
    F64,
    #[serde(rename = "logical", alias = "bool")]
    Bool,
}

impl JDataDType {
    #[must_use]
    /// Returns the dtype of the element type `T`
    pub const fn of<T: Element>() -> Self {
        T::DTYPE
    }

    #[must_use]
    /// Returns the name under which the dtype is written into `_ArrayType_`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::U64 => "uint64",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::F32 => "single",
            Self::F64 => "double",
            Self::Bool => "logical",
        }
    }

    #[must_use]
    /// Returns the size of one element of the dtype in bytes, as laid out in
    /// a compressed byte run.
    pub const fn size(self) -> usize {
        match self {
            Self::U8 | Self::I8 | Self::Bool => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }
}

impl fmt::Display for JDataDType {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.name())
    }
}

impl FromStr for JDataDType {
    type Err = JDataError;

    fn from_str(dtype: &str) -> Result<Self, Self::Err> {
        match dtype {
            "uint8" | "u8" => Ok(Self::U8),
            "uint16" | "u16" => Ok(Self::U16),
            "uint32" | "u32" => Ok(Self::U32),
            "uint64" | "u64" => Ok(Self::U64),
            "int8" | "i8" => Ok(Self::I8),
            "int16" | "i16" => Ok(Self::I16),
            "int32" | "i32" => Ok(Self::I32),
            "int64" | "i64" => Ok(Self::I64),
            "single" | "float32" | "f32" => Ok(Self::F32),
            "double" | "float64" | "f64" => Ok(Self::F64),
            "logical" | "bool" => Ok(Self::Bool),
            dtype => Err(JDataError::TypeCastError {
                dtype: String::from(dtype),
            }),
        }
    }
}

/// Rendering and parsing rules for individual JSON numbers.
#[derive(Copy, Clone, Debug)]
pub struct NumberFormat<'a> {
    /// Render logical values as `true`/`false` instead of `1`/`0`
    pub parse_logical: bool,
    /// Round floating point values to this many significant digits
    pub float_digits: Option<u8>,
    /// Token that stands in for NaN
    pub nan_token: &'a str,
    /// Token that stands in for positive infinity, negated with a `-` prefix
    pub inf_token: &'a str,
}

/// Element types which are included in [`JDataDType`]
pub trait Element:
    crate::sealed::Sealed + Copy + PartialEq + Default + fmt::Debug + Send + Sync + 'static
{
    /// [`JDataDType`] representation of this type
    const DTYPE: JDataDType;

    /// Wraps a typed array into an [`AnyArray`].
    fn into_any(array: ArrayD<Self>) -> AnyArray;

    /// Returns the typed array iff `array` has this element type.
    fn as_typed(array: &AnyArray) -> Option<&ArrayD<Self>>;

    /// Returns whether the element is zero, i.e. not stored in sparse form.
    fn is_zero(self) -> bool {
        self == Self::default()
    }

    /// Appends the little-endian bytes of the element to `bytes`.
    fn extend_le_bytes(self, bytes: &mut Vec<u8>);

    /// Reads an element from exactly [`JDataDType::size`] little-endian bytes.
    fn from_le_bytes(bytes: &[u8]) -> Option<Self>;

    /// Renders the element as a JSON value.
    fn to_json(self, format: &NumberFormat) -> Value;

    /// Parses the element from a JSON value, returning `None` if the value
    /// cannot be represented losslessly.
    fn from_json(value: &Value, format: &NumberFormat) -> Option<Self>;
}

fn integer_from_number<T: TryFrom<i128>>(number: &Number) -> Option<T> {
    let integer = if let Some(x) = number.as_u64() {
        i128::from(x)
    } else if let Some(x) = number.as_i64() {
        i128::from(x)
    } else {
        // integral floats, e.g. `3.0`, are written by some encoders
        let x = number.as_f64()?;
        if !x.is_finite() || x.fract() != 0.0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let x = x as i128;
        x
    };

    T::try_from(integer).ok()
}

fn round_significant(x: f64, digits: u8) -> f64 {
    let precision = usize::from(digits.max(1) - 1);
    format!("{x:.precision$e}").parse().unwrap_or(x)
}

fn float_to_json(x: f64, format: &NumberFormat) -> Value {
    if x.is_nan() {
        return Value::String(String::from(format.nan_token));
    }

    if x.is_infinite() {
        return Value::String(if x > 0.0 {
            String::from(format.inf_token)
        } else {
            format!("-{}", format.inf_token)
        });
    }

    let x = format
        .float_digits
        .map_or(x, |digits| round_significant(x, digits));

    Number::from_f64(x).map_or(Value::Null, Value::Number)
}

fn float_from_json(value: &Value, format: &NumberFormat) -> Option<f64> {
    match value {
        Value::Number(x) => x.as_f64(),
        Value::Bool(x) => Some(if *x { 1.0 } else { 0.0 }),
        Value::String(x) if x == format.nan_token => Some(f64::NAN),
        Value::String(x) if x == format.inf_token => Some(f64::INFINITY),
        Value::String(x) if x.strip_prefix('-') == Some(format.inf_token) => {
            Some(f64::NEG_INFINITY)
        }
        _ => None,
    }
}

macro_rules! integer_element {
    ($($dtype:ident($ty:ty)),*) => {
        $(
            impl crate::sealed::Sealed for $ty {}

            impl Element for $ty {
                const DTYPE: JDataDType = JDataDType::$dtype;

                fn into_any(array: ArrayD<Self>) -> AnyArray {
                    AnyArray::$dtype(array)
                }

                fn as_typed(array: &AnyArray) -> Option<&ArrayD<Self>> {
                    match array {
                        AnyArray::$dtype(array) => Some(array),
                        _ => None,
                    }
                }

                fn extend_le_bytes(self, bytes: &mut Vec<u8>) {
                    bytes.extend_from_slice(&self.to_le_bytes());
                }

                fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
                    bytes.try_into().ok().map(<$ty>::from_le_bytes)
                }

                fn to_json(self, _format: &NumberFormat) -> Value {
                    Value::from(self)
                }

                fn from_json(value: &Value, _format: &NumberFormat) -> Option<Self> {
                    match value {
                        Value::Number(x) => integer_from_number(x),
                        Value::Bool(x) => Some(Self::from(*x)),
                        _ => None,
                    }
                }
            }
        )*
    };
}

integer_element! {
    U8(u8), U16(u16), U32(u32), U64(u64),
    I8(i8), I16(i16), I32(i32), I64(i64)
}

impl crate::sealed::Sealed for f32 {}

impl Element for f32 {
    const DTYPE: JDataDType = JDataDType::F32;

    fn into_any(array: ArrayD<Self>) -> AnyArray {
        AnyArray::F32(array)
    }

    fn as_typed(array: &AnyArray) -> Option<&ArrayD<Self>> {
        match array {
            AnyArray::F32(array) => Some(array),
            _ => None,
        }
    }

    fn extend_le_bytes(self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&self.to_le_bytes());
    }

    fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self::from_le_bytes)
    }

    fn to_json(self, format: &NumberFormat) -> Value {
        // widen via the shortest decimal representation so that e.g. 0.1f32
        // is written as 0.1 and not as 0.10000000149011612
        let x = self.to_string().parse().unwrap_or_else(|_| f64::from(self));
        float_to_json(x, format)
    }

    fn from_json(value: &Value, format: &NumberFormat) -> Option<Self> {
        #[allow(clippy::cast_possible_truncation)]
        float_from_json(value, format).map(|x| x as Self)
    }
}

impl crate::sealed::Sealed for f64 {}

impl Element for f64 {
    const DTYPE: JDataDType = JDataDType::F64;

    fn into_any(array: ArrayD<Self>) -> AnyArray {
        AnyArray::F64(array)
    }

    fn as_typed(array: &AnyArray) -> Option<&ArrayD<Self>> {
        match array {
            AnyArray::F64(array) => Some(array),
            _ => None,
        }
    }

    fn extend_le_bytes(self, bytes: &mut Vec<u8>) {
        bytes.extend_from_slice(&self.to_le_bytes());
    }

    fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self::from_le_bytes)
    }

    fn to_json(self, format: &NumberFormat) -> Value {
        float_to_json(self, format)
    }

    fn from_json(value: &Value, format: &NumberFormat) -> Option<Self> {
        float_from_json(value, format)
    }
}

impl crate::sealed::Sealed for bool {}

impl Element for bool {
    const DTYPE: JDataDType = JDataDType::Bool;

    fn into_any(array: ArrayD<Self>) -> AnyArray {
        AnyArray::Bool(array)
    }

    fn as_typed(array: &AnyArray) -> Option<&ArrayD<Self>> {
        match array {
            AnyArray::Bool(array) => Some(array),
            _ => None,
        }
    }

    fn extend_le_bytes(self, bytes: &mut Vec<u8>) {
        bytes.push(u8::from(self));
    }

    fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [byte] => Some(*byte != 0),
            _ => None,
        }
    }

    fn to_json(self, format: &NumberFormat) -> Value {
        if format.parse_logical {
            Value::Bool(self)
        } else {
            Value::from(u8::from(self))
        }
    }

    fn from_json(value: &Value, _format: &NumberFormat) -> Option<Self> {
        match value {
            Value::Bool(x) => Some(*x),
            Value::Number(x) => x.as_f64().map(|x| x != 0.0),
            _ => None,
        }
    }
}
