//! Async adapters over a chunk source.
//!
//! A source is any [`Stream`] of `Result<B, E>` where `B: AsRef<[u8]>`. The
//! adapters pull chunks on demand and never spawn work: nothing happens
//! unless the returned stream or future is polled.
//!
//! - [`read_elements`]: every top-level value, as a [`Stream`].
//! - [`read`]: the single top-level value of the whole source.
//! - [`read_tree`]: one value from the first chunk only.

use alloc::collections::VecDeque;
use core::{
    fmt,
    pin::Pin,
    task::{Context, Poll, ready},
};

use futures::{Stream, StreamExt, stream::FusedStream};
use log::{debug, trace};

use crate::{
    decoder::Decoder,
    error::{ReaderError, StreamError},
    options::{CompletionPolicy, ReaderOptions},
    reader::IncrementalReader,
};

/// Stream of decoded values returned by [`read_elements`].
///
/// The source is polled only when every value decoded from the previous
/// chunk has been taken. After the first error, or after the trailing flush,
/// the stream yields `None` forever.
///
/// Dropping a `ReadElements` drops the source and the reader along with any
/// bytes it still buffers.
#[must_use = "streams do nothing unless polled"]
pub struct ReadElements<S, D: Decoder> {
    source: Option<S>,
    reader: Option<IncrementalReader<D>>,
    ready: VecDeque<D::Output>,
}

// No field is ever pinned.
impl<S: Unpin, D: Decoder> Unpin for ReadElements<S, D> {}

impl<S, D: Decoder> ReadElements<S, D> {
    fn new(source: S, reader: IncrementalReader<D>) -> Self {
        Self {
            source: Some(source),
            reader: Some(reader),
            ready: VecDeque::new(),
        }
    }

    /// The reader driving this stream, until it finishes or fails.
    #[must_use]
    pub fn reader(&self) -> Option<&IncrementalReader<D>> {
        self.reader.as_ref()
    }

    fn terminate(&mut self) {
        self.source = None;
        self.reader = None;
        self.ready.clear();
    }
}

impl<S, D: Decoder> fmt::Debug for ReadElements<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadElements")
            .field("source_open", &self.source.is_some())
            .field("lifecycle", &self.reader.as_ref().map(IncrementalReader::lifecycle))
            .field("ready", &self.ready.len())
            .finish()
    }
}

impl<S, B, E, D> Stream for ReadElements<S, D>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    D: Decoder,
{
    type Item = Result<D::Output, StreamError<E>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(value) = this.ready.pop_front() {
                return Poll::Ready(Some(Ok(value)));
            }
            let Some(reader) = this.reader.as_mut() else {
                return Poll::Ready(None);
            };
            let Some(source) = this.source.as_mut() else {
                this.reader = None;
                return Poll::Ready(None);
            };

            let step = match ready!(source.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => reader.feed(chunk.as_ref()).map_err(StreamError::Reader),
                Some(Err(err)) => {
                    debug!("chunk source failed; stopping");
                    Err(StreamError::Source(err))
                }
                None => {
                    trace!("chunk source exhausted; flushing reader");
                    this.source = None;
                    reader.finish().map_err(StreamError::Reader)
                }
            };

            match step {
                Ok(values) => {
                    this.ready.extend(values);
                    if this.source.is_none() {
                        this.reader = None;
                    }
                }
                Err(err) => {
                    this.terminate();
                    return Poll::Ready(Some(Err(err)));
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.reader.is_none() {
            (self.ready.len(), Some(self.ready.len()))
        } else {
            (self.ready.len(), None)
        }
    }
}

impl<S, B, E, D> FusedStream for ReadElements<S, D>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    D: Decoder,
{
    fn is_terminated(&self) -> bool {
        self.reader.is_none() && self.ready.is_empty()
    }
}

impl<S, D: Decoder> Drop for ReadElements<S, D> {
    fn drop(&mut self) {
        if let Some(reader) = &self.reader {
            debug!(
                "read_elements cancelled after {} values, releasing {} buffered bytes",
                reader.values_emitted(),
                reader.buffered_len()
            );
        }
    }
}

/// Decodes every top-level value of `source`, in order.
///
/// # Examples
///
/// ```rust
/// use futures::{StreamExt, executor::block_on, stream};
/// use jsonrelay::{TreeDecoder, Value, read_elements};
///
/// let chunks = stream::iter([br#"{"a":1}{"#.as_slice(), br#""b":2} 3"#.as_slice()])
///     .map(Ok::<_, core::convert::Infallible>);
/// let values: Vec<Value> = block_on(
///     read_elements(chunks, TreeDecoder).map(Result::unwrap).collect(),
/// );
/// assert_eq!(values.len(), 3);
/// assert_eq!(values[2], Value::Number(3.0));
/// ```
pub fn read_elements<S, D: Decoder>(source: S, decoder: D) -> ReadElements<S, D> {
    read_elements_with(source, decoder, ReaderOptions::default())
}

/// [`read_elements`] with explicit options. The policy is always
/// [`CompletionPolicy::Streaming`].
pub fn read_elements_with<S, D: Decoder>(
    source: S,
    decoder: D,
    options: ReaderOptions,
) -> ReadElements<S, D> {
    let options = ReaderOptions {
        policy: CompletionPolicy::Streaming,
        ..options
    };
    ReadElements::new(source, IncrementalReader::with_options(decoder, options))
}

/// Decodes the single top-level value of `source`.
///
/// Returns `Ok(None)` if the source holds no value at all.
///
/// # Errors
///
/// Fails with [`ReaderError::UnexpectedMultipleValues`] if the source holds
/// more than one value, and with any other [`ReaderError`] or source error
/// as [`read_elements`] would.
pub async fn read<S, B, E, D>(source: S, decoder: D) -> Result<Option<D::Output>, StreamError<E>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    D: Decoder,
{
    read_with(source, decoder, ReaderOptions::default()).await
}

/// [`read`] with explicit options. The policy is always
/// [`CompletionPolicy::SingleDocument`].
///
/// # Errors
///
/// See [`read`].
pub async fn read_with<S, B, E, D>(
    source: S,
    decoder: D,
    options: ReaderOptions,
) -> Result<Option<D::Output>, StreamError<E>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    D: Decoder,
{
    let options = ReaderOptions {
        policy: CompletionPolicy::SingleDocument,
        ..options
    };
    let mut values = ReadElements::new(source, IncrementalReader::with_options(decoder, options));
    let Some(first) = values.next().await.transpose()? else {
        return Ok(None);
    };
    if values.next().await.transpose()?.is_some() {
        return Err(ReaderError::UnexpectedMultipleValues.into());
    }
    Ok(Some(first))
}

/// Decodes one value from the first chunk of `source`, ignoring the rest.
///
/// The first chunk must hold a complete document on its own; later chunks
/// are never requested and the source is dropped once the first chunk has
/// arrived. Use [`read`] for documents that span chunks.
///
/// Returns `Ok(None)` if the source produces no chunk.
///
/// # Errors
///
/// - [`ReaderError::IncompleteInput`] if the first chunk holds only part of
///   a document, or only whitespace.
/// - [`ReaderError::UnexpectedMultipleValues`] if the first chunk holds more
///   than one value.
/// - [`ReaderError::MalformedInput`] or [`ReaderError::Decode`] as for
///   [`read`], and [`StreamError::Source`] if producing the first chunk
///   failed.
///
/// # Examples
///
/// ```rust
/// use futures::{executor::block_on, stream};
/// use jsonrelay::{TreeDecoder, read_tree};
///
/// let chunks = stream::iter([Ok::<_, ()>(b"[1, 2]".as_slice()), Ok(b"ignored".as_slice())]);
/// let tree = block_on(read_tree(chunks, TreeDecoder)).unwrap().unwrap();
/// assert_eq!(tree.to_string(), "[1,2]");
/// ```
pub async fn read_tree<S, B, E, D>(
    mut source: S,
    decoder: D,
) -> Result<Option<D::Output>, StreamError<E>>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    D: Decoder,
{
    let chunk = match source.next().await {
        None => return Ok(None),
        Some(chunk) => chunk.map_err(StreamError::Source)?,
    };
    drop(source);

    let mut reader = IncrementalReader::single_document(decoder);
    reader.feed(chunk.as_ref())?;
    let mut values = reader.finish()?;
    match values.pop() {
        Some(value) => Ok(Some(value)),
        None => Err(reader.incomplete_input().into()),
    }
}
