//! Configuration for readers and writers.

use crate::cancel::CancelToken;
use crate::pool::SharedBufferPool;

/// How the reader materializes floating point literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatParseHandling {
    /// Parse into `f64` (the default).
    #[default]
    Double,
    /// Parse into `rust_decimal::Decimal`, preserving scale exactly.
    Decimal,
}

/// Whether string values that look like dates are surfaced as `Date` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateParseHandling {
    /// Leave date-shaped strings as `String` tokens.
    None,
    /// Convert to a date, preserving the offset information present in the
    /// text (the default).
    #[default]
    DateTime,
}

/// Configuration options for [`JsonTextReader`].
///
/// # Examples
///
/// ```rust
/// use jsontext::{JsonTextReader, ReaderOptions};
///
/// let options = ReaderOptions {
///     max_depth: Some(64),
///     ..Default::default()
/// };
/// let reader = JsonTextReader::with_options("[1, 2]".as_bytes(), options);
/// ```
///
/// [`JsonTextReader`]: crate::JsonTextReader
#[derive(Debug, Clone, Default)]
pub struct ReaderOptions {
    /// Maximum container nesting depth. Exceeding it raises an error once per
    /// offending container start, not once per read inside it.
    ///
    /// # Default
    ///
    /// `None` (unlimited)
    pub max_depth: Option<usize>,

    /// Whether to keep reading additional whitespace-delimited root values
    /// after the first one completes, for JSON Lines style streams.
    ///
    /// # Default
    ///
    /// `false`
    pub support_multiple_content: bool,

    /// How floating point literals are represented.
    pub float_parse_handling: FloatParseHandling,

    /// Whether date-shaped strings become `Date` tokens.
    pub date_parse_handling: DateParseHandling,

    /// Cooperative cancellation signal, checked before each read operation
    /// touches the reader state.
    pub cancel: Option<CancelToken>,
}

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Formatting {
    /// No extra whitespace (the default).
    #[default]
    None,
    /// Child tokens are indented on their own lines.
    Indented,
}

/// How non-finite floating point values (`NaN`, `Infinity`, `-Infinity`)
/// are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatFormatHandling {
    /// Quoted strings: `"NaN"` (the default).
    #[default]
    String,
    /// Bare symbols: `NaN`. Not valid strict JSON.
    Symbol,
    /// `0.0`, or `null` on the nullable write path.
    DefaultValue,
}

/// Which characters are `\u`-escaped in string output beyond the mandatory
/// set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringEscapeHandling {
    /// Only control characters, the backslash and the active quote char.
    #[default]
    Default,
    /// Additionally escape every character outside ASCII.
    EscapeNonAscii,
    /// Additionally escape HTML-sensitive characters (`<`, `>`, `&`, `'`,
    /// `"`).
    EscapeHtml,
    /// Both of the above.
    EscapeNonAsciiOrHtml,
}

/// How dates are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormatHandling {
    /// ISO 8601, e.g. `2000-01-01T01:01:01Z` (the default).
    #[default]
    IsoDateFormat,
    /// Epoch milliseconds, e.g. `\/Date(946688461000)\/`.
    MicrosoftDateFormat,
}

/// Configuration options for [`JsonTextWriter`].
///
/// The formatting-related fields can also be changed mid-stream through the
/// writer's setters; the options struct only provides the starting values.
///
/// # Examples
///
/// ```rust
/// use jsontext::{Formatting, JsonTextWriter, WriterOptions};
///
/// let options = WriterOptions {
///     formatting: Formatting::Indented,
///     ..Default::default()
/// };
/// let writer = JsonTextWriter::with_options(Vec::new(), options);
/// ```
///
/// [`JsonTextWriter`]: crate::JsonTextWriter
#[derive(Debug, Clone)]
pub struct WriterOptions {
    pub formatting: Formatting,

    /// Number of [`indent_char`](Self::indent_char) repetitions per depth
    /// level when indented.
    ///
    /// # Default
    ///
    /// `2`
    pub indentation: usize,

    /// # Default
    ///
    /// `' '`
    pub indent_char: char,

    /// Delimiter used for strings and property names.
    ///
    /// # Default
    ///
    /// `'"'`
    pub quote_char: char,

    /// Whether property names are quoted at all.
    ///
    /// # Default
    ///
    /// `true`
    pub quote_name: bool,

    pub float_format_handling: FloatFormatHandling,
    pub string_escape_handling: StringEscapeHandling,
    pub date_format_handling: DateFormatHandling,

    /// Optional chrono `strftime` pattern overriding
    /// [`date_format_handling`](Self::date_format_handling).
    pub date_format_string: Option<String>,

    /// Whether `close` flushes the underlying sink.
    ///
    /// # Default
    ///
    /// `true`
    pub close_output: bool,

    /// Cooperative cancellation signal, checked before each write operation
    /// touches the writer state.
    pub cancel: Option<CancelToken>,

    /// Optional provider of reusable scratch buffers for the binary-value
    /// path. Every borrowed buffer is returned before the writer is dropped,
    /// including on error exits.
    pub buffer_pool: Option<SharedBufferPool>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            formatting: Formatting::None,
            indentation: 2,
            indent_char: ' ',
            quote_char: '"',
            quote_name: true,
            float_format_handling: FloatFormatHandling::default(),
            string_escape_handling: StringEscapeHandling::default(),
            date_format_handling: DateFormatHandling::default(),
            date_format_string: None,
            close_output: true,
            cancel: None,
            buffer_pool: None,
        }
    }
}
