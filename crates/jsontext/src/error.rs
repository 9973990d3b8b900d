//! Error types for the reader and writer.
//!
//! Reader diagnostics carry a fixed, human-readable shape that downstream
//! tooling matches on:
//!
//! ```text
//! <Problem description>. Path '<path>', line <N>, position <P>.
//! ```
//!
//! Writer validation errors use the positionless variant
//! `"<Problem description>. Path '<path>'."`. I/O faults from the underlying
//! source or sink are passed through unchanged so callers can inspect and
//! retry them.

use std::io;

use thiserror::Error;

/// Error raised while reading JSON text.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// Syntax, structural or conversion failure at a known document position.
    #[error("{message} Path '{path}', line {line}, position {position}.")]
    Parse {
        /// Problem description, ending with a period.
        message: String,
        /// Path of the current position when the error was raised.
        path: String,
        line: usize,
        position: usize,
    },

    /// Transient fault from the underlying character source. The reader state
    /// is untouched; retrying the same call resumes where the fault hit.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The operation's cancellation token was already triggered. No state was
    /// mutated.
    #[error("operation canceled")]
    Canceled,
}

impl ReaderError {
    pub(crate) fn parse(
        message: impl Into<String>,
        path: impl Into<String>,
        line: usize,
        position: usize,
    ) -> Self {
        let err = ReaderError::Parse {
            message: message.into(),
            path: path.into(),
            line,
            position,
        };
        tracing::debug!(error = %err, "reader error raised");
        err
    }
}

/// Error raised while writing JSON text.
#[derive(Error, Debug)]
pub enum WriterError {
    /// An operation that is illegal for the writer's current state.
    #[error("{message} Path '{path}'.")]
    State {
        /// Problem description, ending with a period.
        message: String,
        /// Writer path when the error was raised.
        path: String,
    },

    /// A `write_token` payload that cannot be coerced to the requested token
    /// type.
    #[error("Input string was not in a correct format.")]
    Format,

    /// A `write_token` call missing a payload the token type requires.
    #[error("Value cannot be null. Parameter name: {parameter}")]
    MissingValue { parameter: &'static str },

    /// Fault from the underlying sink. Output already emitted stays in the
    /// sink.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Failure of the source reader while copying tokens from it.
    #[error(transparent)]
    Read(#[from] ReaderError),

    /// The operation's cancellation token was already triggered. No state was
    /// mutated and nothing was written.
    #[error("operation canceled")]
    Canceled,
}

impl WriterError {
    pub(crate) fn state(message: impl Into<String>, path: impl Into<String>) -> Self {
        let err = WriterError::State {
            message: message.into(),
            path: path.into(),
        };
        tracing::debug!(error = %err, "writer error raised");
        err
    }
}
