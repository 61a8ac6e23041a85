// CMF wire format.
//
// # Modules
//
// - `varint`:  Bijective base-128 integers (most-significant group first)
// - `header`:  Value type enumeration and the per-token header byte
// - `value`:   Typed token payloads and shape-based inference
// - `encoder`: MessageBuilder: append-only token encoding
// - `decoder`: MessageParser: forward-only token decoding

pub mod decoder;
pub mod encoder;
pub mod header;
pub mod value;
pub mod varint;

// Re-export key types for convenience.
pub use decoder::{DecodeError, MessageParser, decode_all};
pub use encoder::{EncodeError, MessageBuilder};
pub use header::{ESCAPE_TAG, Header, ValueType};
pub use value::{Token, Value};
pub use varint::{MAX_VARINT_LEN, VarIntError};
