// CMF per-token header: value type and tag.
//
// One byte carries the 3-bit value type in its low bits and the tag in the
// high five bits. Tags that do not fit (>= 31) set all five tag bits and
// follow the header byte with the tag as a varint.

use std::fmt;
use std::str::FromStr;

use super::varint::{self, VarIntError};

// ---------------------------------------------------------------------------
// Bit layout
// ---------------------------------------------------------------------------

/// Mask selecting the value type from a header byte.
pub const TYPE_MASK: u8 = 0x07;

/// Tag field value that signals an extended (varint) tag.
pub const ESCAPE_TAG: u8 = 0x1F;

/// Number of bits the tag field is shifted by.
const TAG_SHIFT: u8 = 3;

// ---------------------------------------------------------------------------
// Value type
// ---------------------------------------------------------------------------

/// Wire-level value type of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    /// Varint magnitude, non-negative.
    PositiveNumber = 0,
    /// Varint magnitude of a negative number.
    NegativeNumber = 1,
    /// Varint byte length, then UTF-8 bytes. No terminator.
    String = 2,
    /// Varint byte length, then raw bytes.
    ByteArray = 3,
    /// No payload.
    BoolTrue = 4,
    /// No payload.
    BoolFalse = 5,
    /// 8-byte little-endian IEEE-754 double.
    Double = 6,
}

impl ValueType {
    pub const ALL: [ValueType; 7] = [
        ValueType::PositiveNumber,
        ValueType::NegativeNumber,
        ValueType::String,
        ValueType::ByteArray,
        ValueType::BoolTrue,
        ValueType::BoolFalse,
        ValueType::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ValueType::PositiveNumber => "PositiveNumber",
            ValueType::NegativeNumber => "NegativeNumber",
            ValueType::String => "String",
            ValueType::ByteArray => "ByteArray",
            ValueType::BoolTrue => "BoolTrue",
            ValueType::BoolFalse => "BoolFalse",
            ValueType::Double => "Double",
        }
    }
}

impl TryFrom<u8> for ValueType {
    type Error = u8;

    /// Map a raw 3-bit type to a `ValueType`; unknown patterns are returned
    /// as the error.
    fn try_from(raw: u8) -> Result<Self, u8> {
        ValueType::ALL.get(raw as usize).copied().ok_or(raw)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown value type '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Decoded token header.
///
/// `wire_type` is kept raw so readers can report type patterns they do not
/// recognise instead of failing on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub tag: u64,
    pub wire_type: u8,
}

impl Header {
    pub fn new(tag: u64, value_type: ValueType) -> Self {
        Self {
            tag,
            wire_type: value_type as u8,
        }
    }

    /// The value type, if the wire pattern is one of the known seven.
    pub fn value_type(&self) -> Option<ValueType> {
        ValueType::try_from(self.wire_type).ok()
    }

    /// Append the header to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        let wire_type = self.wire_type & TYPE_MASK;
        if self.tag < u64::from(ESCAPE_TAG) {
            out.push(((self.tag as u8) << TAG_SHIFT) | wire_type);
        } else {
            out.push((ESCAPE_TAG << TAG_SHIFT) | wire_type);
            varint::write_u64(out, self.tag);
        }
    }

    /// Decode a header from the front of `data`.
    /// Returns `(header, bytes_consumed)`.
    pub fn read(data: &[u8]) -> Result<(Self, usize), VarIntError> {
        let &byte = data.first().ok_or(VarIntError::Truncated)?;
        let wire_type = byte & TYPE_MASK;
        let short_tag = byte >> TAG_SHIFT;
        if short_tag != ESCAPE_TAG {
            return Ok((
                Self {
                    tag: u64::from(short_tag),
                    wire_type,
                },
                1,
            ));
        }
        let (tag, consumed) = varint::read_u64(&data[1..])?;
        Ok((Self { tag, wire_type }, 1 + consumed))
    }

    /// Encoded size of a header carrying `tag`.
    #[inline]
    pub fn encoded_len(tag: u64) -> usize {
        if tag < u64::from(ESCAPE_TAG) {
            1
        } else {
            1 + varint::encoded_len(tag)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(tag: u64, value_type: ValueType) -> Vec<u8> {
        let mut out = Vec::new();
        Header::new(tag, value_type).write(&mut out);
        out
    }

    #[test]
    fn value_type_discriminants() {
        for (i, t) in ValueType::ALL.into_iter().enumerate() {
            assert_eq!(t as u8, i as u8);
            assert_eq!(ValueType::try_from(i as u8), Ok(t));
        }
        assert_eq!(ValueType::try_from(7), Err(7));
    }

    #[test]
    fn value_type_names_parse_back() {
        for t in ValueType::ALL {
            assert_eq!(t.to_string().parse::<ValueType>(), Ok(t));
        }
        assert_eq!("bytearray".parse::<ValueType>(), Ok(ValueType::ByteArray));
        assert!("Map".parse::<ValueType>().is_err());
    }

    #[test]
    fn short_tags_fit_in_one_byte() {
        assert_eq!(encode(0, ValueType::PositiveNumber), vec![0x00]);
        assert_eq!(encode(1, ValueType::String), vec![0x0A]);
        assert_eq!(encode(30, ValueType::Double), vec![(30 << 3) | 6]);
    }

    #[test]
    fn tag_31_uses_escape() {
        let bytes = encode(31, ValueType::BoolTrue);
        assert_eq!(bytes, vec![0xF8 | 4, 31]);
        let bytes = encode(32, ValueType::NegativeNumber);
        assert_eq!(bytes, vec![0xF9, 32]);
    }

    #[test]
    fn escape_boundary_roundtrip() {
        for tag in [0u64, 1, 30, 31, 32, 127, 128, 1 << 20, u64::MAX] {
            for t in ValueType::ALL {
                let bytes = encode(tag, t);
                assert_eq!(bytes.len(), Header::encoded_len(tag), "tag {tag}");
                let (hdr, consumed) = Header::read(&bytes).unwrap();
                assert_eq!(consumed, bytes.len());
                assert_eq!(hdr.tag, tag);
                assert_eq!(hdr.value_type(), Some(t));
            }
        }
    }

    #[test]
    fn unknown_type_pattern_is_preserved() {
        let (hdr, consumed) = Header::read(&[(5 << 3) | 7]).unwrap();
        assert_eq!(consumed, 1);
        assert_eq!(hdr.tag, 5);
        assert_eq!(hdr.wire_type, 7);
        assert_eq!(hdr.value_type(), None);
    }

    #[test]
    fn truncated_header() {
        assert_eq!(Header::read(&[]), Err(VarIntError::Truncated));
        // Escape marker with no extended tag.
        assert_eq!(Header::read(&[0xF8]), Err(VarIntError::Truncated));
    }
}
