//! Incremental JSON reader for byte streams that arrive in arbitrary chunks.
//!
//! [`IncrementalReader`] keeps tokenizer state across calls, so a value may
//! be split at any byte: inside a string, a number, a `\uXXXX` escape or a
//! multi-byte UTF-8 sequence. Under [`CompletionPolicy::Streaming`] each
//! top-level value is decoded as soon as its last byte arrives and its bytes
//! are released; under [`CompletionPolicy::SingleDocument`] the input must
//! hold exactly one value, decoded once the input ends.
//!
//! The async adapters in [`read_elements`], [`read`] and [`read_tree`] drive
//! a reader from any [`futures::Stream`] of byte chunks.
//!
//! ```rust
//! use jsonrelay::{IncrementalReader, TreeDecoder};
//!
//! let mut reader = IncrementalReader::streaming(TreeDecoder);
//! let mut seen = Vec::new();
//! for chunk in [&b"[1, \"sn"[..], "ö\"] {\"k\":".as_bytes(), b"null} 4"] {
//!     seen.extend(reader.feed(chunk).unwrap());
//! }
//! seen.extend(reader.finish().unwrap());
//! let rendered: Vec<String> = seen.iter().map(ToString::to_string).collect();
//! assert_eq!(rendered, ["[1,\"snö\"]", "{\"k\":null}", "4"]);
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(test)]
extern crate std;

mod decoder;
mod error;
mod options;
mod reader;
mod stream;
mod value;

pub mod tokenizer;


#[cfg(any(test, feature = "fuzzing"))]
#[doc(hidden)]
pub mod chunk_utils;

#[cfg(feature = "serde")]
pub use decoder::TypedDecoder;
pub use decoder::{DecodeError, Decoder, Document, TreeDecoder};
pub use error::{ReaderError, StreamError};
pub use options::{CompletionPolicy, ReaderOptions};
pub use reader::{IncrementalReader, Lifecycle};
pub use stream::{ReadElements, read, read_elements, read_elements_with, read_tree, read_with};
pub use tokenizer::{Span, SyntaxError, SyntaxErrorKind, Token, TokenKind};
pub use value::{Array, Map, Value};
