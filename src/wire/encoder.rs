// CMF encoder: appends tokens to a growing byte buffer.
//
// The buffer is append-only. Each `add` validates the value before writing,
// so a failed call leaves the buffer exactly as it was.

use std::io::Write;

use thiserror::Error;

use super::header::{Header, ValueType};
use super::value::{Token, Value};
use super::varint;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum EncodeError {
    /// The decode-only `Unsupported` marker cannot be written.
    #[error("cannot encode unsupported value (wire type {0})")]
    Unsupported(u8),
    /// An absent value has no shape to infer a type from.
    #[error("cannot infer a type for an absent value")]
    NoValue,
    /// An explicit type was requested that the value cannot be coerced to.
    #[error("value of type {found} cannot be encoded as {expected}")]
    TypeMismatch {
        expected: ValueType,
        found: &'static str,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// MessageBuilder
// ---------------------------------------------------------------------------

/// Builds a CMF byte sequence one token at a time.
///
/// Not synchronized: share a builder across threads only behind external
/// locking, or use one builder per thread.
///
/// # Example
/// ```
/// use cmf::wire::MessageBuilder;
///
/// let mut builder = MessageBuilder::new();
/// builder.add(1, 150u32)?.add(2, "hello")?.add(40, -3)?;
/// let bytes = builder.into_bytes();
/// assert_eq!(bytes[0], 0x08);
/// # Ok::<(), cmf::wire::EncodeError>(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct MessageBuilder {
    buffer: Vec<u8>,
    tokens: usize,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with a pre-allocated output buffer.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            tokens: 0,
        }
    }

    /// Append one token, inferring its wire type from the value.
    pub fn add(&mut self, tag: u64, value: impl Into<Value>) -> Result<&mut Self, EncodeError> {
        self.add_value(tag, &value.into())
    }

    /// Append a possibly-absent value. `None` has no inferable type.
    pub fn add_opt<V: Into<Value>>(
        &mut self,
        tag: u64,
        value: Option<V>,
    ) -> Result<&mut Self, EncodeError> {
        match value {
            Some(v) => self.add(tag, v),
            None => Err(EncodeError::NoValue),
        }
    }

    /// Append one token with an explicitly chosen wire type.
    ///
    /// Numbers are coerced between the numeric types: an integer requested
    /// as `NegativeNumber` is written as a negative magnitude and any number
    /// requested as `Double` is widened. Strings may be written as
    /// `ByteArray`. Anything else must already match `value_type`.
    pub fn add_typed(
        &mut self,
        tag: u64,
        value: impl Into<Value>,
        value_type: ValueType,
    ) -> Result<&mut Self, EncodeError> {
        let value = coerce(value.into(), value_type)?;
        self.add_value(tag, &value)
    }

    /// Append a token.
    pub fn add_token(&mut self, token: &Token) -> Result<&mut Self, EncodeError> {
        self.add_value(token.tag, &token.value)
    }

    fn add_value(&mut self, tag: u64, value: &Value) -> Result<&mut Self, EncodeError> {
        let value_type = match value.value_type() {
            Some(t) => t,
            None => return Err(EncodeError::Unsupported(value.wire_type())),
        };

        Header::new(tag, value_type).write(&mut self.buffer);
        match value {
            Value::Positive(m) | Value::Negative(m) => varint::write_u64(&mut self.buffer, *m),
            Value::String(s) => self.write_length_prefixed(s.as_bytes()),
            Value::Bytes(b) => self.write_length_prefixed(b),
            Value::Double(d) => self.buffer.extend_from_slice(&d.to_le_bytes()),
            Value::Bool(_) | Value::Unsupported(_) => {}
        }
        self.tokens += 1;
        Ok(self)
    }

    #[inline]
    fn write_length_prefixed(&mut self, bytes: &[u8]) {
        varint::write_u64(&mut self.buffer, bytes.len() as u64);
        self.buffer.extend_from_slice(bytes);
    }

    /// Encoded bytes so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Finish and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Write the encoded bytes to a sink.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), EncodeError> {
        w.write_all(&self.buffer)?;
        Ok(())
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of tokens added.
    pub fn token_count(&self) -> usize {
        self.tokens
    }
}

/// Coerce `value` to the requested wire type.
fn coerce(value: Value, expected: ValueType) -> Result<Value, EncodeError> {
    let mismatch = |value: &Value| EncodeError::TypeMismatch {
        expected,
        found: value.value_type().map_or("Unsupported", ValueType::name),
    };

    let coerced = match (expected, value) {
        (_, Value::Unsupported(raw)) => return Err(EncodeError::Unsupported(raw)),
        (ValueType::PositiveNumber, v @ Value::Positive(_)) => v,
        (ValueType::PositiveNumber, Value::Negative(0)) => Value::Positive(0),
        (ValueType::NegativeNumber, Value::Positive(m) | Value::Negative(m)) => Value::Negative(m),
        (ValueType::Double, Value::Positive(m)) => Value::Double(m as f64),
        (ValueType::Double, Value::Negative(m)) => Value::Double(-(m as f64)),
        (ValueType::Double, v @ Value::Double(_)) => v,
        (ValueType::String, v @ Value::String(_)) => v,
        (ValueType::ByteArray, v @ Value::Bytes(_)) => v,
        (ValueType::ByteArray, Value::String(s)) => Value::Bytes(s.into_bytes()),
        (ValueType::BoolTrue, v @ Value::Bool(true)) => v,
        (ValueType::BoolFalse, v @ Value::Bool(false)) => v,
        (_, v) => return Err(mismatch(&v)),
    };
    Ok(coerced)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
