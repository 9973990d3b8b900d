//! Streaming JSON text reader and writer.
//!
//! [`JsonTextReader`] tokenizes character input incrementally, tracking the
//! line, column and a human-readable path for every token, and offers typed
//! on-demand conversions that leave the reader recoverable when they fail.
//! [`JsonTextWriter`] is its mirror image: a state-machine validated token
//! emitter with configurable formatting, quoting and escaping. Both accept a
//! relaxed superset of JSON (comments, single quotes, unquoted property
//! names, constructor syntax, non-finite float literals).
//!
//! # Examples
//!
//! ```rust
//! use jsontext::{JsonTextReader, JsonTextWriter};
//!
//! // Tokenize, then re-serialize.
//! let mut reader = JsonTextReader::new(r#"{"items": [1, 2.5, null]}"#.as_bytes());
//! let mut out = Vec::new();
//! let mut writer = JsonTextWriter::new(&mut out);
//!
//! reader.read().unwrap();
//! writer.write_token_from(&mut reader, true).unwrap();
//! writer.close().unwrap();
//! drop(writer);
//!
//! assert_eq!(out, br#"{"items":[1,2.5,null]}"#);
//! ```

mod base64_stream;
mod cancel;
mod error;
mod escape;
mod options;
mod pool;
mod position;
mod reader;
mod source;
mod token;
mod writer;

pub use base64_stream::Base64Encoder;
pub use cancel::CancelToken;
pub use error::{ReaderError, WriterError};
pub use options::{
    DateFormatHandling, DateParseHandling, FloatFormatHandling, FloatParseHandling, Formatting,
    ReaderOptions, StringEscapeHandling, WriterOptions,
};
pub use pool::{BufferPool, SharedBufferPool};
pub use reader::JsonTextReader;
pub use token::{JsonDate, JsonToken, JsonValue};
pub use writer::{DefaultEmitter, EmitContext, JsonTextWriter, TokenEmitter, WriteState};
