/// When an [`IncrementalReader`](crate::IncrementalReader) decodes values.
///
/// The policy is fixed when the reader is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionPolicy {
    /// Decode and emit every top-level value as soon as its last byte has
    /// been fed. Any number of values may appear in the input, with or
    /// without whitespace between them.
    ///
    /// ```json
    /// {"a":1}{"b":2} [3] "four" 5
    /// ```
    #[default]
    Streaming,

    /// Accumulate the whole input and decode it as exactly one top-level
    /// value when the input ends. A second top-level value is an error.
    SingleDocument,
}

/// Configuration options for [`IncrementalReader`](crate::IncrementalReader)
/// and the stream adapters.
///
/// # Examples
///
/// ```rust
/// use jsonrelay::{CompletionPolicy, IncrementalReader, ReaderOptions, TreeDecoder};
///
/// let reader = IncrementalReader::with_options(
///     TreeDecoder,
///     ReaderOptions {
///         policy: CompletionPolicy::SingleDocument,
///         max_depth: Some(64),
///     },
/// );
/// assert_eq!(reader.policy(), CompletionPolicy::SingleDocument);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ReaderOptions {
    /// Whether values are emitted as they complete or once at the end.
    ///
    /// The stream adapters override this with the policy they implement.
    ///
    /// # Default
    ///
    /// [`CompletionPolicy::Streaming`]
    pub policy: CompletionPolicy,

    /// Maximum nesting of objects and arrays.
    ///
    /// Opening a container beyond this depth is a syntax error. This bounds
    /// the tokenizer's frame stack, not the number of buffered bytes.
    ///
    /// # Default
    ///
    /// `None` (unbounded)
    pub max_depth: Option<usize>,
}
