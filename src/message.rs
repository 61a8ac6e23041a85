// Ordered token collection.
//
// A Message is a plain sequence of tokens: insertion order is kept and
// repeated tags are allowed. It converts to and from CMF bytes through
// MessageBuilder and MessageParser.

use std::ops::Index;

use crate::wire::decoder::{DecodeError, MessageParser};
use crate::wire::encoder::{EncodeError, MessageBuilder};
use crate::wire::header::Header;
use crate::wire::value::{Token, Value};
use crate::wire::varint;

/// An ordered list of tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    tokens: Vec<Token>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every token in `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DecodeError> {
        MessageParser::new(data).collect()
    }

    /// Encode all tokens, in order.
    ///
    /// Fails if any token holds `Value::Unsupported`.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut builder = MessageBuilder::with_capacity(self.encoded_len());
        for token in &self.tokens {
            builder.add_token(token)?;
        }
        Ok(builder.into_bytes())
    }

    /// Append a token.
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Append a value under `tag`.
    pub fn add(&mut self, tag: u64, value: impl Into<Value>) -> &mut Self {
        self.tokens.push(Token::new(tag, value));
        self
    }

    /// First token with `tag`.
    pub fn get(&self, tag: u64) -> Option<&Token> {
        self.tokens.iter().find(|t| t.tag == tag)
    }

    /// Every token with `tag`, in order.
    pub fn get_all(&self, tag: u64) -> impl Iterator<Item = &Token> + '_ {
        self.tokens.iter().filter(move |t| t.tag == tag)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    /// Exact encoded size of the message, ignoring unsupported tokens.
    pub fn encoded_len(&self) -> usize {
        self.tokens
            .iter()
            .map(|t| {
                let payload = match &t.value {
                    Value::Positive(m) | Value::Negative(m) => varint::encoded_len(*m),
                    Value::String(s) => varint::encoded_len(s.len() as u64) + s.len(),
                    Value::Bytes(b) => varint::encoded_len(b.len() as u64) + b.len(),
                    Value::Double(_) => 8,
                    Value::Bool(_) => 0,
                    Value::Unsupported(_) => return 0,
                };
                Header::encoded_len(t.tag) + payload
            })
            .sum()
    }
}

impl From<Vec<Token>> for Message {
    fn from(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }
}

impl FromIterator<Token> for Message {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

impl Extend<Token> for Message {
    fn extend<I: IntoIterator<Item = Token>>(&mut self, iter: I) {
        self.tokens.extend(iter);
    }
}

impl IntoIterator for Message {
    type Item = Token;
    type IntoIter = std::vec::IntoIter<Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.into_iter()
    }
}

impl<'a> IntoIterator for &'a Message {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

impl Index<usize> for Message {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
