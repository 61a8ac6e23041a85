#![no_main]
use cmf::Message;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The parser must never panic, only return errors.
    let Ok(message) = Message::from_bytes(data) else {
        return;
    };

    // Input may use non-canonical forms (escaped short tags), so compare
    // canonical re-encodings. Unknown types have no encoding.
    let Ok(bytes) = message.to_bytes() else {
        return;
    };
    let again = Message::from_bytes(&bytes).unwrap().to_bytes().unwrap();
    assert_eq!(again, bytes);
});
