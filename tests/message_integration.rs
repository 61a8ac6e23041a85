// Integration tests for CMF encode/decode.
//
// These tests verify:
//   - End-to-end roundtrip for every value shape
//   - Varint and tag-escape boundaries
//   - Sign and UTF-8 length semantics
//   - Lenient handling of unknown type patterns
//   - Decoder robustness against malformed input

use cmf::Message;
use cmf::wire::{
    DecodeError, EncodeError, MessageBuilder, MessageParser, Token, Value, ValueType, VarIntError,
    decode_all, varint,
};

// ===========================================================================
// Helpers
// ===========================================================================

fn roundtrip(message: &Message) -> Message {
    let bytes = message.to_bytes().unwrap();
    let decoded = Message::from_bytes(&bytes).unwrap();
    assert_eq!(&decoded, message, "roundtrip mismatch");
    decoded
}

fn single(tag: u64, value: impl Into<Value>) -> Vec<u8> {
    let mut builder = MessageBuilder::new();
    builder.add(tag, value).unwrap();
    builder.into_bytes()
}

// ===========================================================================
// Roundtrip
// ===========================================================================

#[test]
fn every_value_shape_roundtrips() {
    let mut message = Message::new();
    message
        .add(1, 0u64)
        .add(2, 123_456_789u64)
        .add(3, -1)
        .add(4, "")
        .add(5, "plain")
        .add(6, Vec::<u8>::new())
        .add(7, vec![0xFFu8; 300])
        .add(8, true)
        .add(9, false)
        .add(10, 0.0)
        .add(11, f64::MAX)
        .add(12, f64::MIN_POSITIVE)
        .add(13, f64::NEG_INFINITY);
    roundtrip(&message);
}

#[test]
fn empty_message_is_empty_buffer() {
    assert!(Message::new().to_bytes().unwrap().is_empty());
    assert!(MessageBuilder::new().into_bytes().is_empty());
    assert!(Message::from_bytes(&[]).unwrap().is_empty());
    assert!(MessageParser::new(&[]).next().is_none());
}

#[test]
fn nan_double_keeps_its_bits() {
    let nan = f64::from_bits(0x7FF8_0000_0000_1234);
    let decoded = decode_all(&single(1, nan)).unwrap();
    let Value::Double(d) = decoded[0].value else {
        panic!("expected a double, got {:?}", decoded[0].value);
    };
    assert_eq!(d.to_bits(), nan.to_bits());
}

// ===========================================================================
// Varint boundaries
// ===========================================================================

#[test]
fn varint_boundaries_roundtrip() {
    let cases = [
        0u64,
        127,
        128,
        16383,
        16384,
        2_097_151,
        2_097_152,
        u64::MAX,
    ];
    for &val in &cases {
        let bytes = single(1, val);
        assert_eq!(bytes.len(), 1 + varint::encoded_len(val), "value {val}");
        let decoded = decode_all(&bytes).unwrap();
        assert_eq!(decoded, vec![Token::new(1, val)], "value {val}");
    }
    assert_eq!(varint::encoded_len(u64::MAX), varint::MAX_VARINT_LEN);
}

#[test]
fn varint_group_counts() {
    assert_eq!(varint::encoded_len(127), 1);
    assert_eq!(varint::encoded_len(128), 2);
    assert_eq!(varint::encoded_len(2_097_151), 3);
    assert_eq!(varint::encoded_len(1 << 21), 3);
}

// ===========================================================================
// Tags
// ===========================================================================

#[test]
fn tag_escape_boundary() {
    for tag in [0u64, 30, 31, 32] {
        let bytes = single(tag, true);
        let escaped = bytes[0] >> 3 == 0x1F;
        assert_eq!(escaped, tag >= 31, "tag {tag}");
        assert_eq!(bytes.len(), if tag >= 31 { 2 } else { 1 }, "tag {tag}");
        assert_eq!(decode_all(&bytes).unwrap()[0].tag, tag);
    }
}

#[test]
fn huge_tags_roundtrip() {
    let mut message = Message::new();
    message.add(u64::MAX, "max").add(1 << 40, 1u8).add(0, 0u8);
    roundtrip(&message);
}

#[test]
fn duplicate_tags_are_preserved_in_order() {
    let mut message = Message::new();
    for i in 0..10u64 {
        message.add(7, i);
    }
    let decoded = roundtrip(&message);
    let values: Vec<u64> = decoded
        .get_all(7)
        .map(|t| match t.value {
            Value::Positive(v) => v,
            ref other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(values, (0..10).collect::<Vec<_>>());
}

// ===========================================================================
// Semantics
// ===========================================================================

#[test]
fn negative_numbers_carry_sign_in_type() {
    let bytes = single(1, -42);
    assert_eq!(bytes, vec![0x09, 42]);
    let token = decode_all(&bytes).unwrap().remove(0);
    assert_eq!(token.value_type(), Some(ValueType::NegativeNumber));
    assert_eq!(token.value, Value::Negative(42));
    assert_eq!(token.value.as_i128(), Some(-42));
}

#[test]
fn string_length_is_in_bytes() {
    let text = "日本語 ✓ ünïcödé";
    assert!(text.len() > text.chars().count());
    let bytes = single(2, text);
    let (len, consumed) = varint::read_u64(&bytes[1..]).unwrap();
    assert_eq!(len as usize, text.len());
    assert_eq!(bytes.len(), 1 + consumed + text.len());
    assert_eq!(
        decode_all(&bytes).unwrap()[0].value.as_str(),
        Some(text)
    );
}

#[test]
fn explicit_type_matches_inferred_encoding() {
    let mut explicit = MessageBuilder::new();
    explicit
        .add_typed(1, 42u32, ValueType::PositiveNumber)
        .unwrap()
        .add_typed(2, "s", ValueType::String)
        .unwrap()
        .add_typed(3, true, ValueType::BoolTrue)
        .unwrap();
    let mut inferred = MessageBuilder::new();
    inferred.add(1, 42u32).unwrap().add(2, "s").unwrap().add(3, true).unwrap();
    assert_eq!(explicit.into_bytes(), inferred.into_bytes());
}

#[test]
fn dynamic_number_inference_picks_wire_type() {
    let mut builder = MessageBuilder::new();
    for n in [3.0, -3.0, 3.5] {
        builder.add(1, Value::from_number(n)).unwrap();
    }
    let types: Vec<_> = decode_all(builder.as_bytes())
        .unwrap()
        .iter()
        .map(Token::value_type)
        .collect();
    assert_eq!(
        types,
        [
            Some(ValueType::PositiveNumber),
            Some(ValueType::NegativeNumber),
            Some(ValueType::Double)
        ]
    );
}

// ===========================================================================
// Unknown types
// ===========================================================================

#[test]
fn unknown_type_is_lenient_and_positions_cursor() {
    let mut data = vec![(1 << 3) | 7];
    data.extend(single(2, "after"));
    let mut parser = MessageParser::new(&data);

    let token = parser.next_token().unwrap().unwrap();
    assert_eq!(token.tag, 1);
    assert_eq!(token.value, Value::Unsupported(7));
    assert_eq!(parser.position(), 1);

    let token = parser.next_token().unwrap().unwrap();
    assert_eq!(token, Token::new(2, "after"));
    assert!(parser.next_token().unwrap().is_none());
}

#[test]
fn unsupported_value_cannot_be_encoded() {
    let mut builder = MessageBuilder::new();
    let err = builder.add(1, Value::Unsupported(7)).unwrap_err();
    assert!(matches!(err, EncodeError::Unsupported(7)));
    assert!(builder.is_empty());
}

// ===========================================================================
// Malformed input
// ===========================================================================

#[test]
fn truncation_at_every_offset_fails_or_stops_on_boundary() {
    let mut message = Message::new();
    message
        .add(40, "string payload")
        .add(1, 1.25)
        .add(2, u64::MAX)
        .add(3, vec![1u8, 2, 3]);
    let bytes = message.to_bytes().unwrap();

    let boundaries = {
        let mut parser = MessageParser::new(&bytes);
        let mut offsets = vec![0];
        while parser.next_token().unwrap().is_some() {
            offsets.push(parser.position());
        }
        offsets
    };

    for cut in 0..bytes.len() {
        let result = Message::from_bytes(&bytes[..cut]);
        if boundaries.contains(&cut) {
            assert!(result.is_ok(), "cut {cut} is a token boundary");
        } else {
            assert!(result.is_err(), "cut {cut} is mid-token");
        }
    }
}

#[test]
fn overlong_varint_is_rejected() {
    let mut data = vec![0x08];
    data.extend_from_slice(&[0xFF; 16]);
    let err = decode_all(&data).unwrap_err();
    assert_eq!(
        err,
        DecodeError::VarInt {
            offset: 1,
            source: VarIntError::Overflow
        }
    );

    let mut data = vec![0x08];
    data.extend_from_slice(&[0x80; 16]);
    let err = decode_all(&data).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::VarInt {
            source: VarIntError::Overrun,
            ..
        }
    ));
}

#[test]
fn length_prefix_beyond_input_is_truncation() {
    // ByteArray claiming 1 MiB.
    let mut data = vec![0x03];
    varint::write_u64(&mut data, 1 << 20);
    let err = decode_all(&data).unwrap_err();
    assert!(matches!(err, DecodeError::Truncated { .. }), "{err}");
}
