use thiserror::Error;

use crate::{decoder::DecodeError, reader::Lifecycle, tokenizer::SyntaxError};

/// Errors raised by [`IncrementalReader`](crate::IncrementalReader).
///
/// Every error is terminal: the reader that produced it moves to
/// [`Lifecycle::Failed`] and rejects further calls.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// The bytes are not valid JSON.
    #[error("malformed input: {0}")]
    MalformedInput(SyntaxError),

    /// The input ended inside a value.
    #[error("incomplete input: {0}")]
    IncompleteInput(SyntaxError),

    /// A single-document read found more than one top-level value.
    #[error("expected a single top-level value but found more than one")]
    UnexpectedMultipleValues,

    /// `feed` or `finish` was called on a finished or failed reader.
    #[error("cannot {operation} a reader that is {state}")]
    ReaderMisuse {
        operation: &'static str,
        state: Lifecycle,
    },

    /// The value is well formed but the decoder rejected it.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl ReaderError {
    pub(crate) fn from_syntax(err: SyntaxError) -> Self {
        if err.is_end_of_input() {
            Self::IncompleteInput(err)
        } else {
            Self::MalformedInput(err)
        }
    }

    /// Returns `true` for [`ReaderError::MalformedInput`].
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedInput(_))
    }

    /// Returns `true` for [`ReaderError::IncompleteInput`].
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::IncompleteInput(_))
    }

    /// The syntax error behind a malformed or incomplete input, if any.
    #[must_use]
    pub fn syntax_error(&self) -> Option<&SyntaxError> {
        match self {
            Self::MalformedInput(err) | Self::IncompleteInput(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors yielded by the stream adapters.
///
/// Failures of the chunk source are passed through untouched as
/// [`StreamError::Source`].
#[derive(Error, Debug)]
pub enum StreamError<E> {
    #[error(transparent)]
    Reader(#[from] ReaderError),
    #[error("source failed: {0}")]
    Source(E),
}

impl<E> StreamError<E> {
    /// Returns the reader error, if this is one.
    #[must_use]
    pub fn as_reader_error(&self) -> Option<&ReaderError> {
        match self {
            Self::Reader(err) => Some(err),
            Self::Source(_) => None,
        }
    }

    /// Returns the source error, if this is one.
    pub fn into_source_error(self) -> Option<E> {
        match self {
            Self::Reader(_) => None,
            Self::Source(err) => Some(err),
        }
    }
}
