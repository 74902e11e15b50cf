//! The incremental reader: bytes in, decoded top-level values out.
//!
//! An [`IncrementalReader`] owns a [`Tokenizer`] and a [`Decoder`] for one
//! logical input stream. Each [`feed`](IncrementalReader::feed) appends a
//! chunk and, under [`CompletionPolicy::Streaming`], returns every top-level
//! value whose last byte has now been seen. [`finish`](IncrementalReader::finish)
//! flushes what is left.
//!
//! Lifecycle: `Created -> Accumulating -> Finished`, or `Failed` from any
//! state on the first error. A finished or failed reader rejects every call.
//!
//! Retention: bytes of emitted values are released before `feed` returns.
//! Only the undecoded suffix (an unfinished value, or under
//! `SingleDocument` the whole document) stays buffered.

use alloc::vec::Vec;
use core::fmt;

use log::{debug, trace};

use crate::{
    decoder::{Decoder, Document},
    error::ReaderError,
    options::{CompletionPolicy, ReaderOptions},
    tokenizer::{Span, SyntaxErrorKind, Token, Tokenizer},
};

/// Where a reader is in its single-use life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No bytes fed yet.
    Created,
    /// At least one `feed` call made.
    Accumulating,
    /// `finish` returned successfully.
    Finished,
    /// An operation failed; the reader cannot be used again.
    Failed,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Accumulating => "accumulating",
            Self::Finished => "finished",
            Self::Failed => "failed",
        })
    }
}

/// Cross-call reader that decodes top-level JSON values from byte chunks.
///
/// # Examples
///
/// ```rust
/// use jsonrelay::{IncrementalReader, TreeDecoder, Value};
///
/// let mut reader = IncrementalReader::streaming(TreeDecoder);
/// assert!(reader.feed(br#"{"a":"#).unwrap().is_empty());
/// let values = reader.feed(br#"1}{"b":2}"#).unwrap();
/// assert_eq!(values.len(), 2);
/// assert_eq!(values[0].get("a"), Some(&Value::Number(1.0)));
/// assert!(reader.finish().unwrap().is_empty());
/// ```
#[derive(Debug)]
pub struct IncrementalReader<D> {
    tokenizer: Tokenizer,
    decoder: D,
    policy: CompletionPolicy,
    lifecycle: Lifecycle,
    /// Tokens of the value being assembled (or, for `SingleDocument`, of the
    /// first value).
    pending: Vec<Token>,
    /// `SingleDocument` only: span of the first complete value.
    document: Option<Span>,
    /// `SingleDocument` only: a token was seen after the document ended.
    extra_value: bool,
    values_emitted: usize,
}

impl<D: Decoder> IncrementalReader<D> {
    /// Creates a reader with the given options.
    #[must_use]
    pub fn with_options(decoder: D, options: ReaderOptions) -> Self {
        Self {
            tokenizer: Tokenizer::new(options.max_depth),
            decoder,
            policy: options.policy,
            lifecycle: Lifecycle::Created,
            pending: Vec::new(),
            document: None,
            extra_value: false,
            values_emitted: 0,
        }
    }

    /// Creates a reader that emits each value as soon as it is complete.
    #[must_use]
    pub fn streaming(decoder: D) -> Self {
        Self::with_options(decoder, ReaderOptions::default())
    }

    /// Creates a reader that expects exactly one value over the whole input.
    #[must_use]
    pub fn single_document(decoder: D) -> Self {
        Self::with_options(
            decoder,
            ReaderOptions {
                policy: CompletionPolicy::SingleDocument,
                ..ReaderOptions::default()
            },
        )
    }

    /// The policy this reader was created with.
    #[must_use]
    pub fn policy(&self) -> CompletionPolicy {
        self.policy
    }

    /// Current state; see the [module docs](self).
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Bytes fed but not yet released.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.tokenizer.buffered_len()
    }

    /// Number of values handed out so far.
    #[must_use]
    pub fn values_emitted(&self) -> usize {
        self.values_emitted
    }

    /// Appends `chunk` and returns the values it completed, in input order.
    ///
    /// Under [`CompletionPolicy::SingleDocument`] this always returns an
    /// empty vector; the bytes are still tokenized so syntax errors surface
    /// here rather than at `finish`.
    ///
    /// # Errors
    ///
    /// - [`ReaderError::MalformedInput`] if the bytes are not valid JSON.
    /// - [`ReaderError::Decode`] if the decoder rejects a value.
    /// - [`ReaderError::ReaderMisuse`] if the reader is finished or failed.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<D::Output>, ReaderError> {
        self.ensure_open("feed")?;
        self.lifecycle = Lifecycle::Accumulating;
        self.tokenizer.feed(chunk);
        let result = self.drain_tokens();
        if let Ok(values) = &result {
            trace!(
                "fed {} bytes: {} values, {} bytes buffered",
                chunk.len(),
                values.len(),
                self.tokenizer.buffered_len()
            );
        }
        self.settle(result)
    }

    /// Ends the input and returns whatever is left to emit.
    ///
    /// Under `Streaming` this is at most one value (a trailing top-level
    /// number has no terminator until the input ends). Under
    /// `SingleDocument` it is the document, or nothing if the input held no
    /// value at all.
    ///
    /// # Errors
    ///
    /// - [`ReaderError::IncompleteInput`] if the input stops inside a value.
    /// - [`ReaderError::UnexpectedMultipleValues`] if a `SingleDocument`
    ///   input holds more than one value.
    /// - [`ReaderError::MalformedInput`], [`ReaderError::Decode`],
    ///   [`ReaderError::ReaderMisuse`] as for [`feed`](Self::feed).
    pub fn finish(&mut self) -> Result<Vec<D::Output>, ReaderError> {
        self.ensure_open("finish")?;
        self.tokenizer.end_of_input();
        let result = self.finish_values();
        let result = self.settle(result);
        if result.is_ok() {
            self.lifecycle = Lifecycle::Finished;
            debug!("reader finished after {} values", self.values_emitted);
        }
        self.release();
        result
    }

    /// Feeds every chunk, then finishes.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`feed`](Self::feed) or
    /// [`finish`](Self::finish).
    pub fn read_all<I>(mut self, chunks: I) -> Result<Vec<D::Output>, ReaderError>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(self.feed(chunk.as_ref())?);
        }
        out.extend(self.finish()?);
        Ok(out)
    }

    pub(crate) fn incomplete_input(&self) -> ReaderError {
        ReaderError::IncompleteInput(self.tokenizer.error(SyntaxErrorKind::UnexpectedEndOfInput))
    }

    fn ensure_open(&self, operation: &'static str) -> Result<(), ReaderError> {
        match self.lifecycle {
            Lifecycle::Created | Lifecycle::Accumulating => Ok(()),
            state @ (Lifecycle::Finished | Lifecycle::Failed) => {
                Err(ReaderError::ReaderMisuse { operation, state })
            }
        }
    }

    fn settle<T>(&mut self, result: Result<T, ReaderError>) -> Result<T, ReaderError> {
        if let Err(err) = &result {
            debug!("reader failed: {err}");
            self.lifecycle = Lifecycle::Failed;
            self.release();
        }
        result
    }

    fn release(&mut self) {
        self.pending = Vec::new();
        self.document = None;
        self.tokenizer.release();
    }

    fn finish_values(&mut self) -> Result<Vec<D::Output>, ReaderError> {
        if self.document.is_some() && !self.tokenizer.is_between_values() {
            // A second value was started but has not produced a token yet.
            self.extra_value = true;
        }
        let drained = self.drain_tokens();
        // A second value outranks whatever went wrong inside it.
        if self.extra_value {
            return Err(ReaderError::UnexpectedMultipleValues);
        }
        let mut out = drained?;
        if self.policy == CompletionPolicy::SingleDocument {
            if let Some(span) = self.document {
                out.push(self.decode(span)?);
            }
        }
        Ok(out)
    }

    /// Pulls every available token, emitting values the policy allows.
    fn drain_tokens(&mut self) -> Result<Vec<D::Output>, ReaderError> {
        let mut out = Vec::new();
        while let Some(token) = self
            .tokenizer
            .next_token()
            .map_err(ReaderError::from_syntax)?
        {
            if self.document.is_some() {
                // Tokens after a single document are noted, never stored.
                self.extra_value = true;
                continue;
            }
            self.pending.push(token);
            if self.tokenizer.depth() != 0 {
                continue;
            }
            let span = Span {
                start: self.pending[0].span.start,
                end: token.span.end,
            };
            match self.policy {
                CompletionPolicy::Streaming => {
                    out.push(self.decode(span)?);
                    self.pending.clear();
                }
                CompletionPolicy::SingleDocument => self.document = Some(span),
            }
        }

        // One discard per call: emitted values are released together.
        let keep = match (self.document, self.pending.first()) {
            (Some(span), _) => span.start,
            (None, Some(first)) => first.span.start,
            (None, None) => self.tokenizer.retain_from(),
        };
        self.tokenizer.discard_through(keep);
        Ok(out)
    }

    fn decode(&mut self, span: Span) -> Result<D::Output, ReaderError> {
        let doc = Document::new(self.tokenizer.bytes(span), &self.pending, span.start);
        let value = self.decoder.decode(doc)?;
        self.values_emitted += 1;
        trace!(
            "decoded value #{} from bytes {}..{}",
            self.values_emitted, span.start, span.end
        );
        Ok(value)
    }
}
