#![no_main]
use cmf::Message;
use cmf::wire::{MessageBuilder, Value};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Carve the input into (selector, tag, payload) chunks.
    let mut builder = MessageBuilder::new();
    let mut expected = Message::new();

    for chunk in data.chunks(10) {
        let (&selector, rest) = match chunk.split_first() {
            Some(split) => split,
            None => continue,
        };
        let mut word = [0u8; 8];
        let n = rest.len().min(8);
        word[..n].copy_from_slice(&rest[..n]);
        let num = u64::from_le_bytes(word);
        let tag = num >> (selector % 64);

        let value = match selector % 6 {
            0 => Value::Positive(num),
            1 => Value::Negative(num),
            2 => Value::String(String::from_utf8_lossy(rest).into_owned()),
            3 => Value::Bytes(rest.to_vec()),
            4 => Value::Bool(selector & 0x80 != 0),
            _ => Value::Double(f64::from_bits(num)),
        };
        builder.add(tag, value.clone()).unwrap();
        expected.add(tag, value);
    }

    let bytes = builder.into_bytes();
    assert_eq!(bytes.len(), expected.encoded_len());
    let decoded = Message::from_bytes(&bytes).unwrap();
    assert_eq!(decoded.len(), expected.len());
    for (got, want) in decoded.iter().zip(expected.iter()) {
        assert_eq!(got.tag, want.tag);
        match (&got.value, &want.value) {
            // NaN payloads are compared by bit pattern.
            (Value::Double(a), Value::Double(b)) => assert_eq!(a.to_bits(), b.to_bits()),
            (a, b) => assert_eq!(a, b),
        }
    }
});
