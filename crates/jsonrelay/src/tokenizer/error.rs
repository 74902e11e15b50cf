use thiserror::Error;

/// A syntax error raised by the [`Tokenizer`](super::Tokenizer), with the
/// position of the offending byte.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{kind} at {line}:{column}")]
pub struct SyntaxError {
    /// What went wrong.
    pub kind: SyntaxErrorKind,
    /// Absolute byte offset into the logical input.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyntaxErrorKind {
    /// A character that cannot appear at this point of the grammar.
    #[error("invalid character {0:?}")]
    InvalidCharacter(char),
    /// A byte that does not start a valid UTF-8 character.
    #[error("invalid byte 0x{0:02X}")]
    InvalidByte(u8),
    /// An unknown escape such as `\x`.
    #[error("invalid escape character {0:?}")]
    InvalidEscape(char),
    #[error("invalid unicode escape sequence at character: {0:?}")]
    InvalidUnicodeEscapeChar(char),
    /// A lone or mismatched UTF-16 surrogate escape.
    #[error("invalid unicode escape sequence \\u{0:04X}")]
    InvalidUnicodeEscapeSequence(u32),
    #[error("invalid UTF-8 in string")]
    InvalidUtf8,
    #[error("nesting depth exceeds limit of {0}")]
    DepthLimitExceeded(usize),
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
}

impl SyntaxError {
    /// Returns `true` if the input ended in the middle of a value.
    #[must_use]
    pub fn is_end_of_input(&self) -> bool {
        matches!(self.kind, SyntaxErrorKind::UnexpectedEndOfInput)
    }
}
