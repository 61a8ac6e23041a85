//! CMF: a compact, self-describing tag-value binary message format.
//!
//! Every encoded field carries its own type marker, so a CMF buffer can be
//! parsed without a schema. Field order is preserved and duplicate tags are
//! kept as they appear.
//!
//! The crate provides:
//! - The wire format: varints, headers, builder and parser (`wire`)
//! - An ordered token collection with buffer round-tripping (`message`)
//! - An optional `cmf` CLI for dumping and encoding buffers (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use cmf::Message;
//! use cmf::wire::Value;
//!
//! let mut message = Message::new();
//! message.add(1, "hello").add(2, -42).add(31, true);
//!
//! let bytes = message.to_bytes().unwrap();
//! let decoded = Message::from_bytes(&bytes).unwrap();
//! assert_eq!(decoded, message);
//! assert_eq!(decoded.get(2).map(|t| &t.value), Some(&Value::Negative(42)));
//! ```

pub mod message;
pub mod wire;

#[cfg(feature = "cli")]
pub mod cli;

pub use message::Message;
pub use wire::{DecodeError, EncodeError, Token, Value, ValueType};
