// CMF decoder: sequential token parsing over a complete buffer.
//
// The parser owns a forward-only cursor into a borrowed slice. Every read is
// bounds-checked; a truncated token is an error, never a partial token.
// Unknown type patterns decode to `Value::Unsupported` and consume no
// payload bytes, so the cursor lands directly on the next header.

use thiserror::Error;

use super::header::{Header, ValueType};
use super::value::{Token, Value};
use super::varint::{self, VarIntError};

/// Size of a `Double` payload.
const DOUBLE_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Decoder error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A fixed-size or length-prefixed read ran past the end of the input.
    #[error("truncated input at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// A tag, magnitude or length varint was malformed.
    #[error("invalid varint at offset {offset}: {source}")]
    VarInt {
        offset: usize,
        #[source]
        source: VarIntError,
    },
    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },
}

impl DecodeError {
    /// Byte offset in the input where the failing read started.
    pub fn offset(&self) -> usize {
        match *self {
            Self::Truncated { offset, .. }
            | Self::VarInt { offset, .. }
            | Self::InvalidUtf8 { offset } => offset,
        }
    }
}

// ---------------------------------------------------------------------------
// MessageParser
// ---------------------------------------------------------------------------

/// Lazily decodes tokens from a complete CMF buffer.
///
/// One pass, forward only. As an iterator it yields `Result<Token, _>` and
/// stops after the first error.
///
/// Not synchronized: use one parser per thread.
///
/// # Example
/// ```
/// use cmf::wire::{MessageParser, Value};
///
/// let data = [0x08, 0x80, 0x16, 0x14];
/// let mut parser = MessageParser::new(&data);
/// let first = parser.next_token()?.unwrap();
/// assert_eq!((first.tag, first.value), (1, Value::Positive(150)));
/// let second = parser.next_token()?.unwrap();
/// assert_eq!((second.tag, second.value), (2, Value::Bool(true)));
/// assert!(parser.next_token()?.is_none());
/// # Ok::<(), cmf::wire::DecodeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MessageParser<'a> {
    data: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> MessageParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            failed: false,
        }
    }

    /// Current cursor offset into the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Decode the next token. Returns `Ok(None)` once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Option<Token>, DecodeError> {
        if self.pos >= self.data.len() {
            return Ok(None);
        }
        let start = self.pos;

        let (header, consumed) =
            Header::read(&self.data[self.pos..]).map_err(|source| DecodeError::VarInt {
                offset: start,
                source,
            })?;
        self.pos += consumed;

        let value = match header.value_type() {
            Some(ValueType::PositiveNumber) => Value::Positive(self.read_varint()?),
            Some(ValueType::NegativeNumber) => Value::Negative(self.read_varint()?),
            Some(ValueType::String) => {
                let offset = self.pos;
                let bytes = self.read_length_prefixed()?;
                let s = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { offset })?;
                Value::String(s.to_owned())
            }
            Some(ValueType::ByteArray) => Value::Bytes(self.read_length_prefixed()?.to_vec()),
            Some(ValueType::BoolTrue) => Value::Bool(true),
            Some(ValueType::BoolFalse) => Value::Bool(false),
            Some(ValueType::Double) => {
                let bytes = self.take(DOUBLE_LEN)?;
                let mut raw = [0u8; DOUBLE_LEN];
                raw.copy_from_slice(bytes);
                Value::Double(f64::from_le_bytes(raw))
            }
            None => {
                log::debug!(
                    "cmf: unsupported wire type {} for tag {} at offset {start}",
                    header.wire_type,
                    header.tag
                );
                Value::Unsupported(header.wire_type)
            }
        };

        log::trace!("cmf: token tag={} at {start}..{}", header.tag, self.pos);
        Ok(Some(Token {
            tag: header.tag,
            value,
        }))
    }

    fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let (val, consumed) =
            varint::read_u64(&self.data[self.pos..]).map_err(|source| DecodeError::VarInt {
                offset: self.pos,
                source,
            })?;
        self.pos += consumed;
        Ok(val)
    }

    fn read_length_prefixed(&mut self) -> Result<&'a [u8], DecodeError> {
        let offset = self.pos;
        let (len, consumed) =
            varint::read_usize(&self.data[self.pos..])
                .map_err(|source| DecodeError::VarInt { offset, source })?;
        self.pos += consumed;
        self.take(len)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let available = self.remaining();
        if len > available {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: len,
                available,
            });
        }
        let data: &'a [u8] = self.data;
        let bytes = &data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }
}

impl Iterator for MessageParser<'_> {
    type Item = Result<Token, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for MessageParser<'_> {}

// ---------------------------------------------------------------------------
// Convenience function
// ---------------------------------------------------------------------------

/// Decode every token in `data`.
pub fn decode_all(data: &[u8]) -> Result<Vec<Token>, DecodeError> {
    MessageParser::new(data).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
