//! Non-blocking, resumable JSON tokenizer over raw bytes.
//!
//! Overview
//! - [`Tokenizer::feed`] appends bytes; [`Tokenizer::next_token`] returns the
//!   next complete token or `Ok(None)` when it needs more bytes. It never
//!   waits and never rescans: a token interrupted by the end of the buffered
//!   bytes is resumed from the exact byte where lexing stopped. String
//!   contents are validated as UTF-8 one byte at a time as they arrive.
//! - The grammar is strict RFC 8259. `:` and `,` are checked but not emitted.
//! - Any number of top-level values may follow each other. Deciding whether
//!   that is acceptable is the caller's job (see `IncrementalReader`).
//!
//! Buffering
//! - The tokenizer owns every byte fed to it until the caller releases a
//!   prefix with [`Tokenizer::discard_through`]. Token spans are absolute
//!   offsets into the logical input, so they stay valid across discards of
//!   earlier bytes.
//! - [`Tokenizer::retain_from`] is the earliest offset an in-progress token
//!   still needs.
//!
//! Numbers are the one token whose end cannot be seen in its own bytes: a
//! trailing top-level `123` only completes once a delimiter arrives or
//! [`Tokenizer::end_of_input`] is called.

mod error;
mod escape;

use alloc::vec::Vec;

pub use error::{SyntaxError, SyntaxErrorKind};
pub(crate) use escape::unescape;
use escape::hex_val;

/// Lexical token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    /// An object key, quotes included in the span.
    PropertyName,
    /// A string value, quotes included in the span.
    String,
    Number,
    True,
    False,
    Null,
}

/// Half-open range `[start, end)` of absolute byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A complete token and where it sits in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Object,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Between top-level values.
    Start,
    ObjectOpen,
    BeforePropertyName,
    AfterPropertyName,
    BeforePropertyValue,
    AfterPropertyValue,
    ArrayOpen,
    BeforeArrayValue,
    AfterArrayValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape {
    None,
    Backslash,
    Unicode { digits: u8, code: u16 },
    /// Inside a multi-byte UTF-8 sequence; the next byte must lie in
    /// `lower..=upper`.
    Utf8 { remaining: u8, lower: u8, upper: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberState {
    Sign,
    Zero,
    Integer,
    Point,
    Fraction,
    Exponent,
    ExponentSign,
    ExponentInteger,
}

impl NumberState {
    /// States in which the digits seen so far already form a number.
    fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Zero | Self::Integer | Self::Fraction | Self::ExponentInteger
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Default,
    /// A number or literal just ended; the next byte must delimit it.
    Delimiter,
    String {
        property_name: bool,
        escape: Escape,
        high_surrogate: Option<u16>,
    },
    Number(NumberState),
    Literal {
        kind: TokenKind,
        matched: u8,
    },
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[inline]
fn is_delimiter(b: u8) -> bool {
    is_whitespace(b) || matches!(b, b',' | b']' | b'}')
}

fn literal_text(kind: TokenKind) -> &'static [u8] {
    match kind {
        TokenKind::True => b"true",
        TokenKind::False => b"false",
        _ => b"null",
    }
}

/// Incremental byte tokenizer. See the [module docs](self).
#[derive(Debug)]
pub struct Tokenizer {
    buf: Vec<u8>,
    /// Absolute offset of `buf[0]`.
    base: usize,
    /// Absolute offset of the next unread byte.
    pos: usize,
    line: usize,
    column: usize,
    token_start: usize,
    lex: LexState,
    parse: ParseState,
    frames: Vec<Frame>,
    max_depth: Option<usize>,
    end_of_input: bool,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Tokenizer {
    /// Creates a tokenizer. `max_depth` bounds object/array nesting.
    #[must_use]
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            buf: Vec::new(),
            base: 0,
            pos: 0,
            line: 1,
            column: 1,
            token_start: 0,
            lex: LexState::Default,
            parse: ParseState::Start,
            frames: Vec::new(),
            max_depth,
            end_of_input: false,
        }
    }

    /// Appends bytes to the input.
    pub fn feed(&mut self, bytes: &[u8]) {
        debug_assert!(!self.end_of_input, "feed after end of input");
        self.buf.extend_from_slice(bytes);
    }

    /// Declares that no further bytes will be fed.
    pub fn end_of_input(&mut self) {
        self.end_of_input = true;
    }

    /// Number of currently open objects and arrays.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` when the tokenizer sits between top-level values, with
    /// no token in progress.
    #[must_use]
    pub fn is_between_values(&self) -> bool {
        self.parse == ParseState::Start
            && matches!(self.lex, LexState::Default | LexState::Delimiter)
    }

    /// Number of bytes currently held.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Earliest absolute offset still needed to finish the current token.
    #[must_use]
    pub fn retain_from(&self) -> usize {
        match self.lex {
            LexState::String { .. } | LexState::Number(_) | LexState::Literal { .. } => {
                self.token_start
            }
            LexState::Default | LexState::Delimiter => self.pos,
        }
    }

    /// Releases every byte before the absolute offset `offset`.
    pub fn discard_through(&mut self, offset: usize) {
        debug_assert!(offset <= self.retain_from(), "discarding bytes still in use");
        let n = offset.saturating_sub(self.base).min(self.buf.len());
        self.buf.drain(..n);
        self.base += n;
    }

    /// Drops every buffered byte and open frame. The tokenizer must not be
    /// used afterwards.
    pub fn release(&mut self) {
        self.buf = Vec::new();
        self.frames = Vec::new();
        self.base = self.pos;
    }

    /// Bytes covered by `span`.
    ///
    /// # Panics
    ///
    /// Panics if any part of `span` was already discarded or not yet fed.
    #[must_use]
    pub fn bytes(&self, span: Span) -> &[u8] {
        &self.buf[span.start - self.base..span.end - self.base]
    }

    /// Builds an error located at the current position.
    #[must_use]
    pub fn error(&self, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError {
            kind,
            offset: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    /// Returns the next complete token.
    ///
    /// `Ok(None)` means more bytes are needed, or, after
    /// [`end_of_input`](Self::end_of_input), that the input ended cleanly
    /// between top-level values.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] on the first byte that violates the grammar,
    /// or with [`SyntaxErrorKind::UnexpectedEndOfInput`] when the input ended
    /// inside a value.
    pub fn next_token(&mut self) -> Result<Option<Token>, SyntaxError> {
        loop {
            let Some(byte) = self.peek() else {
                return self.at_end();
            };
            match self.lex {
                LexState::Default => {
                    if is_whitespace(byte) {
                        self.advance(byte);
                    } else if let Some(token) = self.structural(byte)? {
                        return Ok(Some(token));
                    }
                }
                LexState::Delimiter => {
                    if !is_delimiter(byte) {
                        return Err(self.unexpected());
                    }
                    self.lex = LexState::Default;
                }
                LexState::String {
                    property_name,
                    escape,
                    high_surrogate,
                } => {
                    if let Some(token) =
                        self.lex_string(byte, property_name, escape, high_surrogate)?
                    {
                        return Ok(Some(token));
                    }
                }
                LexState::Number(state) => {
                    if let Some(token) = self.lex_number(byte, state)? {
                        return Ok(Some(token));
                    }
                }
                LexState::Literal { kind, matched } => {
                    let text = literal_text(kind);
                    if byte != text[usize::from(matched)] {
                        return Err(self.unexpected());
                    }
                    self.advance(byte);
                    let matched = matched + 1;
                    if usize::from(matched) == text.len() {
                        self.lex = LexState::Delimiter;
                        return Ok(Some(self.complete_value(kind)));
                    }
                    self.lex = LexState::Literal { kind, matched };
                }
            }
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos - self.base).copied()
    }

    #[inline]
    fn advance(&mut self, byte: u8) {
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else if byte & 0xC0 != 0x80 {
            self.column += 1;
        }
    }

    /// Error for the character at the current position.
    fn unexpected(&self) -> SyntaxError {
        self.unexpected_as(SyntaxErrorKind::InvalidCharacter)
    }

    fn unexpected_as(&self, kind: fn(char) -> SyntaxErrorKind) -> SyntaxError {
        let rest = &self.buf[self.pos - self.base..];
        match bstr::decode_utf8(rest) {
            (Some(ch), _) => self.error(kind(ch)),
            (None, _) => self.error(SyntaxErrorKind::InvalidByte(rest[0])),
        }
    }

    fn at_end(&mut self) -> Result<Option<Token>, SyntaxError> {
        if !self.end_of_input {
            return Ok(None);
        }
        match self.lex {
            LexState::Number(state) if state.is_terminal() => {
                self.lex = LexState::Default;
                Ok(Some(self.complete_value(TokenKind::Number)))
            }
            LexState::Default | LexState::Delimiter if self.parse == ParseState::Start => Ok(None),
            _ => Err(self.error(SyntaxErrorKind::UnexpectedEndOfInput)),
        }
    }

    /// Handles a non-whitespace byte outside of any token.
    fn structural(&mut self, byte: u8) -> Result<Option<Token>, SyntaxError> {
        match (self.parse, byte) {
            (ParseState::ObjectOpen | ParseState::AfterPropertyValue, b'}') => {
                Ok(Some(self.close(TokenKind::ObjectEnd)))
            }
            (ParseState::ArrayOpen | ParseState::AfterArrayValue, b']') => {
                Ok(Some(self.close(TokenKind::ArrayEnd)))
            }
            (ParseState::ObjectOpen | ParseState::BeforePropertyName, b'"') => {
                self.begin(byte, LexState::String {
                    property_name: true,
                    escape: Escape::None,
                    high_surrogate: None,
                });
                Ok(None)
            }
            (ParseState::AfterPropertyName, b':') => {
                self.advance(byte);
                self.parse = ParseState::BeforePropertyValue;
                Ok(None)
            }
            (ParseState::AfterPropertyValue, b',') => {
                self.advance(byte);
                self.parse = ParseState::BeforePropertyName;
                Ok(None)
            }
            (ParseState::AfterArrayValue, b',') => {
                self.advance(byte);
                self.parse = ParseState::BeforeArrayValue;
                Ok(None)
            }
            (
                ParseState::Start
                | ParseState::BeforePropertyValue
                | ParseState::ArrayOpen
                | ParseState::BeforeArrayValue,
                _,
            ) => self.begin_value(byte),
            _ => Err(self.unexpected()),
        }
    }

    fn begin_value(&mut self, byte: u8) -> Result<Option<Token>, SyntaxError> {
        match byte {
            b'{' => self.open(Frame::Object).map(Some),
            b'[' => self.open(Frame::Array).map(Some),
            b'"' => {
                self.begin(byte, LexState::String {
                    property_name: false,
                    escape: Escape::None,
                    high_surrogate: None,
                });
                Ok(None)
            }
            b'-' => {
                self.begin(byte, LexState::Number(NumberState::Sign));
                Ok(None)
            }
            b'0' => {
                self.begin(byte, LexState::Number(NumberState::Zero));
                Ok(None)
            }
            b'1'..=b'9' => {
                self.begin(byte, LexState::Number(NumberState::Integer));
                Ok(None)
            }
            b't' | b'f' | b'n' => {
                let kind = match byte {
                    b't' => TokenKind::True,
                    b'f' => TokenKind::False,
                    _ => TokenKind::Null,
                };
                self.begin(byte, LexState::Literal { kind, matched: 1 });
                Ok(None)
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Starts a multi-byte token at the current byte.
    fn begin(&mut self, byte: u8, lex: LexState) {
        self.token_start = self.pos;
        self.advance(byte);
        self.lex = lex;
    }

    fn open(&mut self, frame: Frame) -> Result<Token, SyntaxError> {
        if let Some(limit) = self.max_depth {
            if self.frames.len() >= limit {
                return Err(self.error(SyntaxErrorKind::DepthLimitExceeded(limit)));
            }
        }
        let start = self.pos;
        self.pos += 1;
        self.column += 1;
        self.frames.push(frame);
        let kind = match frame {
            Frame::Object => {
                self.parse = ParseState::ObjectOpen;
                TokenKind::ObjectStart
            }
            Frame::Array => {
                self.parse = ParseState::ArrayOpen;
                TokenKind::ArrayStart
            }
        };
        Ok(Token {
            kind,
            span: Span {
                start,
                end: self.pos,
            },
        })
    }

    fn close(&mut self, kind: TokenKind) -> Token {
        let start = self.pos;
        self.pos += 1;
        self.column += 1;
        self.frames.pop();
        self.after_value();
        Token {
            kind,
            span: Span {
                start,
                end: self.pos,
            },
        }
    }

    /// Moves the grammar past a completed value.
    fn after_value(&mut self) {
        self.parse = match self.frames.last() {
            None => ParseState::Start,
            Some(Frame::Object) => ParseState::AfterPropertyValue,
            Some(Frame::Array) => ParseState::AfterArrayValue,
        };
    }

    fn complete_value(&mut self, kind: TokenKind) -> Token {
        self.after_value();
        Token {
            kind,
            span: Span {
                start: self.token_start,
                end: self.pos,
            },
        }
    }

    fn lex_string(
        &mut self,
        byte: u8,
        property_name: bool,
        escape: Escape,
        high_surrogate: Option<u16>,
    ) -> Result<Option<Token>, SyntaxError> {
        let lone_high = |this: &Self, high: u16| {
            this.error(SyntaxErrorKind::InvalidUnicodeEscapeSequence(u32::from(high)))
        };
        let mut escape = escape;
        let mut high_surrogate = high_surrogate;
        match escape {
            Escape::None => match byte {
                b'"' => {
                    if let Some(high) = high_surrogate {
                        return Err(lone_high(self, high));
                    }
                    self.advance(byte);
                    self.lex = LexState::Default;
                    return Ok(Some(if property_name {
                        self.parse = ParseState::AfterPropertyName;
                        Token {
                            kind: TokenKind::PropertyName,
                            span: Span {
                                start: self.token_start,
                                end: self.pos,
                            },
                        }
                    } else {
                        self.complete_value(TokenKind::String)
                    }));
                }
                b'\\' => {
                    self.advance(byte);
                    escape = Escape::Backslash;
                }
                0x00..=0x1F => return Err(self.unexpected()),
                0x80..=0xFF => {
                    if let Some(high) = high_surrogate {
                        return Err(lone_high(self, high));
                    }
                    let (remaining, lower, upper) = match byte {
                        0xC2..=0xDF => (1, 0x80, 0xBF),
                        0xE0 => (2, 0xA0, 0xBF),
                        0xE1..=0xEC | 0xEE..=0xEF => (2, 0x80, 0xBF),
                        // No UTF-16 surrogates.
                        0xED => (2, 0x80, 0x9F),
                        0xF0 => (3, 0x90, 0xBF),
                        0xF1..=0xF3 => (3, 0x80, 0xBF),
                        0xF4 => (3, 0x80, 0x8F),
                        _ => return Err(self.error(SyntaxErrorKind::InvalidUtf8)),
                    };
                    self.advance(byte);
                    escape = Escape::Utf8 {
                        remaining,
                        lower,
                        upper,
                    };
                }
                _ => {
                    if let Some(high) = high_surrogate {
                        return Err(lone_high(self, high));
                    }
                    self.advance(byte);
                }
            },
            Escape::Backslash => match byte {
                b'u' => {
                    self.advance(byte);
                    escape = Escape::Unicode { digits: 0, code: 0 };
                }
                b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => {
                    if let Some(high) = high_surrogate {
                        return Err(lone_high(self, high));
                    }
                    self.advance(byte);
                    escape = Escape::None;
                }
                _ => return Err(self.unexpected_as(SyntaxErrorKind::InvalidEscape)),
            },
            Escape::Utf8 {
                remaining,
                lower,
                upper,
            } => {
                if !(lower..=upper).contains(&byte) {
                    return Err(self.error(SyntaxErrorKind::InvalidUtf8));
                }
                self.advance(byte);
                escape = if remaining > 1 {
                    Escape::Utf8 {
                        remaining: remaining - 1,
                        lower: 0x80,
                        upper: 0xBF,
                    }
                } else {
                    Escape::None
                };
            }
            Escape::Unicode { digits, code } => {
                let Some(d) = hex_val(byte) else {
                    return Err(self.unexpected_as(SyntaxErrorKind::InvalidUnicodeEscapeChar));
                };
                self.advance(byte);
                let code = (code << 4) | d;
                if digits < 3 {
                    escape = Escape::Unicode {
                        digits: digits + 1,
                        code,
                    };
                } else {
                    escape = Escape::None;
                    high_surrogate = match (high_surrogate, code) {
                        (Some(_), 0xDC00..=0xDFFF) => None,
                        (Some(high), _) => return Err(lone_high(self, high)),
                        (None, 0xD800..=0xDBFF) => Some(code),
                        (None, 0xDC00..=0xDFFF) => {
                            return Err(self.error(
                                SyntaxErrorKind::InvalidUnicodeEscapeSequence(u32::from(code)),
                            ));
                        }
                        (None, _) => None,
                    };
                }
            }
        }
        self.lex = LexState::String {
            property_name,
            escape,
            high_surrogate,
        };
        Ok(None)
    }

    fn lex_number(&mut self, byte: u8, state: NumberState) -> Result<Option<Token>, SyntaxError> {
        use NumberState::{
            Exponent, ExponentInteger, ExponentSign, Fraction, Integer, Point, Sign, Zero,
        };
        let next = match (state, byte) {
            (Sign, b'0') => Zero,
            (Sign, b'1'..=b'9') | (Integer, b'0'..=b'9') => Integer,
            (Zero | Integer, b'.') => Point,
            (Point | Fraction, b'0'..=b'9') => Fraction,
            (Zero | Integer | Fraction, b'e' | b'E') => Exponent,
            (Exponent, b'+' | b'-') => ExponentSign,
            (Exponent | ExponentSign | ExponentInteger, b'0'..=b'9') => ExponentInteger,
            (state, byte) if state.is_terminal() && is_delimiter(byte) => {
                self.lex = LexState::Default;
                return Ok(Some(self.complete_value(TokenKind::Number)));
            }
            _ => return Err(self.unexpected()),
        };
        self.advance(byte);
        self.lex = LexState::Number(next);
        Ok(None)
    }
}
