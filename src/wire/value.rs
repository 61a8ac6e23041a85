// Token values.
//
// `Value` is the typed payload of a token. The variant decides the wire
// type, so callers state the type directly; the `From` impls give the usual
// shape-based inference (integers by sign, text, bytes, bools, floats).

use std::fmt;

use super::header::{TYPE_MASK, ValueType};

/// Typed token payload.
///
/// Numbers keep the wire representation: an unsigned magnitude plus the
/// sign carried by the variant. `as_i64` / `as_i128` give the signed view.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Positive(u64),
    /// Magnitude of a negative number; `Negative(42)` is -42.
    Negative(u64),
    String(String),
    Bytes(Vec<u8>),
    Bool(bool),
    Double(f64),
    /// Decode-only marker for a type pattern outside the known seven.
    /// Holds the raw 3-bit type.
    Unsupported(u8),
}

impl Value {
    /// Wire type of this value, `None` for `Unsupported`.
    pub fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            Value::Positive(_) => ValueType::PositiveNumber,
            Value::Negative(_) => ValueType::NegativeNumber,
            Value::String(_) => ValueType::String,
            Value::Bytes(_) => ValueType::ByteArray,
            Value::Bool(true) => ValueType::BoolTrue,
            Value::Bool(false) => ValueType::BoolFalse,
            Value::Double(_) => ValueType::Double,
            Value::Unsupported(_) => return None,
        })
    }

    /// Raw 3-bit wire type.
    pub fn wire_type(&self) -> u8 {
        match *self {
            Value::Unsupported(raw) => raw & TYPE_MASK,
            _ => self.value_type().map_or(TYPE_MASK, |t| t as u8),
        }
    }

    /// Infer a value from a dynamically-typed number: integral values that
    /// fit in 64 bits become `Positive`/`Negative`, everything else `Double`.
    pub fn from_number(n: f64) -> Self {
        // 2^64 is exactly representable; anything below it in magnitude
        // converts to u64 without saturation.
        const LIMIT: f64 = 18_446_744_073_709_551_616.0;
        if n.is_finite() && n.fract() == 0.0 && n.abs() < LIMIT {
            if n.is_sign_negative() && n != 0.0 {
                Value::Negative((-n) as u64)
            } else {
                Value::Positive(n as u64)
            }
        } else {
            Value::Double(n)
        }
    }

    /// Signed integer view of `Positive`/`Negative`, if it fits in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Positive(m) => i64::try_from(m).ok(),
            Value::Negative(m) => 0i64.checked_sub_unsigned(m),
            _ => None,
        }
    }

    /// Signed integer view of `Positive`/`Negative`. Every magnitude fits.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::Positive(m) => Some(i128::from(m)),
            Value::Negative(m) => Some(-i128::from(m)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Double(d) => Some(d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Positive(m) => write!(f, "{m}"),
            Value::Negative(m) => write!(f, "-{m}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => {
                f.write_str("0x")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Value::Bool(b) => write!(f, "{b}"),
            Value::Double(d) => write!(f, "{d:?}"),
            Value::Unsupported(t) => write!(f, "<unsupported type {t}>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Inference from native shapes
// ---------------------------------------------------------------------------

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Positive(v as u64)
            }
        }
    )*};
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                if v < 0 {
                    Value::Negative(v.unsigned_abs() as u64)
                } else {
                    Value::Positive(v as u64)
                }
            }
        }
    )*};
}

from_unsigned!(u8, u16, u32, u64, usize);
from_signed!(i8, i16, i32, i64, isize);

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Double(f64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Value {
    fn from(v: &[u8; N]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// One `(tag, type, value)` triple. The type is carried by `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tag: u64,
    pub value: Value,
}

impl Token {
    pub fn new(tag: u64, value: impl Into<Value>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    pub fn value_type(&self) -> Option<ValueType> {
        self.value.value_type()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value_type() {
            Some(t) => write!(f, "tag={} type={t} value={}", self.tag, self.value),
            None => write!(f, "tag={} type=Unsupported value={}", self.tag, self.value),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
