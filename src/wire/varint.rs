// CMF variable-length integer encoding.
//
// Bijective base-128, most-significant group first. Every byte except the
// last has bit 7 set. Unlike plain big-endian base-128, each non-final group
// is stored minus one, so no value has two encodings and leading zero groups
// never occur: one byte holds 0..=127, two bytes 128..=16511, and so on.

use std::io::{self, Write};

use thiserror::Error;

/// Maximum encoded length of a `u64`.
///
/// Nine groups reach 9_295_997_013_522_923_647, so the top of the `u64`
/// range takes a tenth.
pub const MAX_VARINT_LEN: usize = 10;

/// Overflow guard: if these bits are set before a shift, the next `<< 7`
/// would overflow.
const U64_OVERFLOW_MASK: u64 = 0xFE00_0000_0000_0000;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a `u64` into the tail of `buf`.
/// Returns the number of bytes written (1..=10); the encoding occupies
/// `buf[MAX_VARINT_LEN - len..]`.
///
/// Groups are produced least-significant first, filling the scratch buffer
/// from the end, which leaves them in stream order without a reverse pass.
#[inline]
pub fn encode_u64(mut num: u64, buf: &mut [u8; MAX_VARINT_LEN]) -> usize {
    let mut i = MAX_VARINT_LEN - 1;
    buf[i] = num as u8 & 0x7F;
    while num > 0x7F {
        num = (num >> 7) - 1;
        i -= 1;
        buf[i] = (num as u8 & 0x7F) | 0x80;
    }
    MAX_VARINT_LEN - i
}

/// Append the encoding of `num` to `out`.
pub fn write_u64(out: &mut Vec<u8>, num: u64) {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let len = encode_u64(num, &mut buf);
    out.extend_from_slice(&buf[MAX_VARINT_LEN - len..]);
}

/// Encode a `u64` and write it to a `Write` sink.
pub fn write_u64_to<W: Write>(w: &mut W, num: u64) -> io::Result<()> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let len = encode_u64(num, &mut buf);
    w.write_all(&buf[MAX_VARINT_LEN - len..])
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a `u64` from the front of `data`.
/// Returns `(value, bytes_consumed)` or an error.
pub fn read_u64(data: &[u8]) -> Result<(u64, usize), VarIntError> {
    let mut val: u64 = 0;
    for (i, &byte) in data.iter().enumerate() {
        if i == MAX_VARINT_LEN {
            return Err(VarIntError::Overrun);
        }
        if val & U64_OVERFLOW_MASK != 0 {
            return Err(VarIntError::Overflow);
        }
        val = (val << 7) | u64::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((val, i + 1));
        }
        val = val.checked_add(1).ok_or(VarIntError::Overflow)?;
    }
    if data.len() >= MAX_VARINT_LEN {
        Err(VarIntError::Overrun)
    } else {
        Err(VarIntError::Truncated)
    }
}

/// Decode a length or count, narrowing to `usize`.
pub fn read_usize(data: &[u8]) -> Result<(usize, usize), VarIntError> {
    let (val, len) = read_u64(data)?;
    let val = usize::try_from(val).map_err(|_| VarIntError::Overflow)?;
    Ok((val, len))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Return the encoded byte-length of `num`.
#[inline]
pub fn encoded_len(mut num: u64) -> usize {
    let mut len = 1;
    while num > 0x7F {
        num = (num >> 7) - 1;
        len += 1;
    }
    len
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VarIntError {
    /// Input ended before the terminal group.
    #[error("varint truncated (input ended mid-integer)")]
    Truncated,
    /// More than `MAX_VARINT_LEN` groups without a terminal group.
    #[error("varint overrun (no terminal group within {MAX_VARINT_LEN} bytes)")]
    Overrun,
    /// Value does not fit in the target integer type.
    #[error("varint overflow")]
    Overflow,
}

impl From<VarIntError> for io::Error {
    fn from(e: VarIntError) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, e)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
