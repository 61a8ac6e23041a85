use cmf::Message;
use cmf::wire::{MessageParser, Token, Value};

#[test]
fn large_byte_array_roundtrip() {
    let payload: Vec<u8> = (0..4 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    let mut message = Message::new();
    message.add(1, payload.clone()).add(2, "trailer");

    let bytes = message.to_bytes().unwrap();
    assert_eq!(bytes.len(), message.encoded_len());

    let decoded = Message::from_bytes(&bytes).unwrap();
    assert_eq!(decoded[0].value.as_bytes(), Some(payload.as_slice()));
    assert_eq!(decoded[1].value.as_str(), Some("trailer"));
}

#[test]
fn many_small_tokens_stream_lazily() {
    let count = 200_000u64;
    let message: Message = (0..count).map(|i| Token::new(i % 64, i)).collect();
    let bytes = message.to_bytes().unwrap();

    let mut parser = MessageParser::new(&bytes);
    let mut seen = 0u64;
    while let Some(token) = parser.next_token().unwrap() {
        assert_eq!(token.tag, seen % 64);
        assert_eq!(token.value, Value::Positive(seen));
        seen += 1;
    }
    assert_eq!(seen, count);
    assert_eq!(parser.remaining(), 0);
}

#[test]
#[ignore = "multi-hundred-MB test is opt-in due to memory requirements"]
fn very_large_string_roundtrip() {
    let text = "cmf ".repeat(64 * 1024 * 1024);
    let mut message = Message::new();
    message.add(u64::MAX, text.as_str());
    let decoded = Message::from_bytes(&message.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded[0].value.as_str().map(str::len), Some(text.len()));
}
