//! Turning one complete top-level value into a caller-facing type.
//!
//! The reader hands a [`Decoder`] a [`Document`]: the raw bytes of exactly one
//! top-level value together with the tokens the tokenizer produced for it.
//! Decoders are chosen per read rather than through a type hierarchy; any
//! `FnMut(Document<'_>) -> Result<T, DecodeError>` closure is a decoder too.

use alloc::{
    borrow::Cow,
    string::{String, ToString},
    vec::Vec,
};
use core::{fmt, marker::PhantomData};

use thiserror::Error;

use crate::{
    tokenizer::{Span, Token, TokenKind, unescape},
    value::{Map, Value},
};

/// Errors raised by a [`Decoder`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DecodeError {
    /// The token sequence does not describe a single value.
    #[error("unexpected {0:?} token")]
    UnexpectedToken(TokenKind),
    #[error("document ended before the value was complete")]
    Truncated,
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    /// Deserialization into the target type failed.
    #[cfg(feature = "serde")]
    #[error("{0}")]
    Serde(serde_json::Error),
    #[error("{0}")]
    Custom(String),
}

impl DecodeError {
    /// Wraps an arbitrary message, for decoders written as closures.
    pub fn custom(msg: impl fmt::Display) -> Self {
        Self::Custom(msg.to_string())
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err)
    }
}

/// One complete top-level value, as bytes and tokens.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    bytes: &'a [u8],
    tokens: &'a [Token],
    start: usize,
}

impl<'a> Document<'a> {
    pub(crate) fn new(bytes: &'a [u8], tokens: &'a [Token], start: usize) -> Self {
        Self {
            bytes,
            tokens,
            start,
        }
    }

    /// The raw bytes of the value, without surrounding whitespace.
    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// The tokens of the value, in order.
    #[must_use]
    pub fn tokens(&self) -> &'a [Token] {
        self.tokens
    }

    /// Absolute offsets of the value in the logical input.
    #[must_use]
    pub fn span(&self) -> Span {
        Span {
            start: self.start,
            end: self.start + self.bytes.len(),
        }
    }

    /// Raw bytes of one of this document's tokens.
    #[must_use]
    pub fn token_bytes(&self, token: &Token) -> &'a [u8] {
        &self.bytes[token.span.start - self.start..token.span.end - self.start]
    }

    /// Unescaped content of a `String` or `PropertyName` token.
    #[must_use]
    pub fn str_value(&self, token: &Token) -> Cow<'a, str> {
        let raw = self.token_bytes(token);
        unescape(&raw[1..raw.len() - 1])
    }

    /// Source text of a `Number` token.
    #[must_use]
    pub fn number_text(&self, token: &Token) -> &'a str {
        // Number tokens are ASCII by construction.
        core::str::from_utf8(self.token_bytes(token)).unwrap_or_default()
    }
}

/// Materializes one top-level value.
pub trait Decoder {
    type Output;

    /// Decodes `doc`, which always holds exactly one complete value.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the value cannot be represented as
    /// [`Self::Output`].
    fn decode(&mut self, doc: Document<'_>) -> Result<Self::Output, DecodeError>;
}

impl<T, F> Decoder for F
where
    F: FnMut(Document<'_>) -> Result<T, DecodeError>,
{
    type Output = T;

    fn decode(&mut self, doc: Document<'_>) -> Result<T, DecodeError> {
        self(doc)
    }
}

/// Decodes into the crate's generic [`Value`] tree, straight from the tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeDecoder;

enum Open {
    Array(Vec<Value>),
    Object(Map, Option<String>),
}

impl Decoder for TreeDecoder {
    type Output = Value;

    fn decode(&mut self, doc: Document<'_>) -> Result<Value, DecodeError> {
        let mut stack = Vec::<Open>::new();
        let mut tokens = doc.tokens().iter();
        while let Some(token) = tokens.next() {
            let value = match token.kind {
                TokenKind::ObjectStart => {
                    stack.push(Open::Object(Map::new(), None));
                    continue;
                }
                TokenKind::ArrayStart => {
                    stack.push(Open::Array(Vec::new()));
                    continue;
                }
                TokenKind::PropertyName => {
                    let Some(Open::Object(_, key @ None)) = stack.last_mut() else {
                        return Err(DecodeError::UnexpectedToken(token.kind));
                    };
                    *key = Some(doc.str_value(token).into_owned());
                    continue;
                }
                TokenKind::ObjectEnd => match stack.pop() {
                    Some(Open::Object(map, None)) => Value::Object(map),
                    _ => return Err(DecodeError::UnexpectedToken(token.kind)),
                },
                TokenKind::ArrayEnd => match stack.pop() {
                    Some(Open::Array(items)) => Value::Array(items),
                    _ => return Err(DecodeError::UnexpectedToken(token.kind)),
                },
                TokenKind::String => Value::String(doc.str_value(token).into_owned()),
                TokenKind::Number => {
                    let text = doc.number_text(token);
                    Value::Number(
                        text.parse()
                            .map_err(|_| DecodeError::InvalidNumber(text.into()))?,
                    )
                }
                TokenKind::True => Value::Boolean(true),
                TokenKind::False => Value::Boolean(false),
                TokenKind::Null => Value::Null,
            };

            match stack.last_mut() {
                None => {
                    return match tokens.next() {
                        None => Ok(value),
                        Some(extra) => Err(DecodeError::UnexpectedToken(extra.kind)),
                    };
                }
                Some(Open::Array(items)) => items.push(value),
                Some(Open::Object(map, key)) => {
                    let key = key.take().ok_or(DecodeError::UnexpectedToken(token.kind))?;
                    map.insert(key, value);
                }
            }
        }
        Err(DecodeError::Truncated)
    }
}

/// Decodes into any `T: DeserializeOwned` through `serde_json`.
///
/// `TypedDecoder<serde_json::Value>` yields serde's own tree type.
#[cfg(feature = "serde")]
pub struct TypedDecoder<T> {
    _marker: PhantomData<fn() -> T>,
}

#[cfg(feature = "serde")]
impl<T> TypedDecoder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<T> Default for TypedDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "serde")]
impl<T> Clone for TypedDecoder<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

#[cfg(feature = "serde")]
impl<T> fmt::Debug for TypedDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypedDecoder<")?;
        f.write_str(core::any::type_name::<T>())?;
        f.write_str(">")
    }
}

#[cfg(feature = "serde")]
impl<T: serde::de::DeserializeOwned> Decoder for TypedDecoder<T> {
    type Output = T;

    fn decode(&mut self, doc: Document<'_>) -> Result<T, DecodeError> {
        Ok(serde_json::from_slice(doc.as_bytes())?)
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec, vec::Vec};

    use super::{DecodeError, Decoder, Document, TreeDecoder};
    use crate::{
        tokenizer::{Token, Tokenizer},
        value::Value,
    };

    fn tokens_of(input: &str) -> (Tokenizer, Vec<Token>) {
        let mut tokenizer = Tokenizer::default();
        tokenizer.feed(input.as_bytes());
        tokenizer.end_of_input();
        let mut tokens = Vec::new();
        while let Some(token) = tokenizer.next_token().unwrap() {
            tokens.push(token);
        }
        (tokenizer, tokens)
    }

    fn decode_with<D: Decoder>(decoder: &mut D, input: &str) -> Result<D::Output, DecodeError> {
        let (tokenizer, tokens) = tokens_of(input);
        let span = crate::tokenizer::Span {
            start: tokens[0].span.start,
            end: tokens[tokens.len() - 1].span.end,
        };
        decoder.decode(Document::new(tokenizer.bytes(span), &tokens, span.start))
    }

    #[test]
    fn tree_decoder_builds_nested_values() {
        let value = decode_with(
            &mut TreeDecoder,
            r#" {"a": [1, -2.5e1, "x\ny"], "b": {"c": null, "d": [true, false]}} "#,
        )
        .unwrap();
        let expected = Value::Object(
            [
                (
                    "a".into(),
                    Value::Array(vec![
                        Value::Number(1.0),
                        Value::Number(-25.0),
                        Value::String("x\ny".into()),
                    ]),
                ),
                (
                    "b".into(),
                    Value::Object(
                        [
                            ("c".into(), Value::Null),
                            (
                                "d".into(),
                                Value::Array(vec![Value::Boolean(true), Value::Boolean(false)]),
                            ),
                        ]
                        .into(),
                    ),
                ),
            ]
            .into(),
        );
        assert_eq!(value, expected);
    }

    #[test]
    fn tree_decoder_last_duplicate_key_wins() {
        let value = decode_with(&mut TreeDecoder, r#"{"k":1,"k":2}"#).unwrap();
        assert_eq!(value.get("k"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn tree_decoder_unescapes_keys() {
        let value = decode_with(&mut TreeDecoder, "{\"\\u00e9\\t\":\"\\ud83d\\ude00\"}").unwrap();
        assert_eq!(value.get("\u{e9}\t"), Some(&Value::String("\u{1F600}".into())));
    }

    #[test]
    fn closures_are_decoders() {
        let mut lengths = |doc: Document<'_>| -> Result<usize, DecodeError> { Ok(doc.as_bytes().len()) };
        assert_eq!(decode_with(&mut lengths, "[1, 2]").unwrap(), 6);

        let mut failing = |_: Document<'_>| -> Result<String, DecodeError> {
            Err(DecodeError::custom("nope"))
        };
        let err = decode_with(&mut failing, "null").unwrap_err();
        assert_eq!(alloc::string::ToString::to_string(&err), "nope");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn typed_decoder_deserializes() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Point {
            x: i32,
            y: i32,
        }

        let mut decoder = super::TypedDecoder::<Point>::new();
        assert_eq!(
            decode_with(&mut decoder, r#"{"y": 2, "x": 1}"#).unwrap(),
            Point { x: 1, y: 2 }
        );
        let err = decode_with(&mut decoder, r#"{"x": "one"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::Serde(_)));
    }
}
