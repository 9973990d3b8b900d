//! The streaming JSON text writer.

use std::io::{self, Read, Write};

use num_bigint::BigInt;
use rust_decimal::Decimal;

use crate::base64_stream::Base64Encoder;
use crate::error::WriterError;
use crate::escape;
use crate::options::{
    DateFormatHandling, FloatFormatHandling, Formatting, StringEscapeHandling, WriterOptions,
};
use crate::pool::Lease;
use crate::position::{ContainerKind, JsonPosition, build_path};
use crate::reader::JsonTextReader;
use crate::token::{JsonDate, JsonToken, JsonValue};

/// Writer-side state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    /// Nothing open; ready for a root value.
    Start,
    /// A property name was written; its value must follow.
    Property,
    /// Inside an object, ready for a property name.
    Object,
    /// Inside an array, ready for an element.
    Array,
    /// Inside a constructor, ready for an argument.
    Constructor,
    Closed,
    Error,
}

impl WriteState {
    fn name(self) -> &'static str {
        match self {
            WriteState::Start => "Start",
            WriteState::Property => "Property",
            WriteState::Object => "Object",
            WriteState::Array => "Array",
            WriteState::Constructor => "Constructor",
            WriteState::Closed => "Closed",
            WriteState::Error => "Error",
        }
    }
}

/// Formatting facts an emitter needs when rendering names and strings.
#[derive(Debug, Clone, Copy)]
pub struct EmitContext {
    pub quote_char: char,
    pub quote_name: bool,
    pub escape_handling: StringEscapeHandling,
    pub indented: bool,
}

/// Override points for the characters each token emits.
///
/// The writer keeps all state-machine bookkeeping (separators, indentation,
/// nesting validation) to itself and funnels every primitive emission
/// through this trait, so an implementation can transform the output of a
/// single token kind without re-implementing any writer logic.
pub trait TokenEmitter {
    fn start_object(&mut self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"{")
    }

    fn end_object(&mut self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"}")
    }

    fn start_array(&mut self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"[")
    }

    fn end_array(&mut self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"]")
    }

    fn start_constructor(&mut self, out: &mut dyn Write, name: &str) -> io::Result<()> {
        write!(out, "new {name}(")
    }

    fn end_constructor(&mut self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b")")
    }

    /// Emit a property name including its `:` separator.
    fn property_name(&mut self, out: &mut dyn Write, name: &str, ctx: &EmitContext) -> io::Result<()> {
        if ctx.quote_name {
            out.write_all(escape::quoted(name, ctx.quote_char, ctx.escape_handling).as_bytes())?;
        } else {
            let mut text = String::with_capacity(name.len());
            escape::escape_into(&mut text, name, ctx.quote_char, ctx.escape_handling);
            out.write_all(text.as_bytes())?;
        }
        out.write_all(if ctx.indented { b": " } else { b":" })
    }

    fn null(&mut self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"null")
    }

    fn undefined(&mut self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(b"undefined")
    }

    fn boolean(&mut self, out: &mut dyn Write, value: bool) -> io::Result<()> {
        out.write_all(if value { b"true" } else { b"false" })
    }

    /// Emit pre-formatted numeric text (integers, floats, decimals, and the
    /// bare non-finite symbols).
    fn number(&mut self, out: &mut dyn Write, text: &str) -> io::Result<()> {
        out.write_all(text.as_bytes())
    }

    fn string(&mut self, out: &mut dyn Write, value: &str, ctx: &EmitContext) -> io::Result<()> {
        out.write_all(escape::quoted(value, ctx.quote_char, ctx.escape_handling).as_bytes())
    }

    /// Emit already-escaped text inside quotes (dates, base64 data).
    fn quoted_text(&mut self, out: &mut dyn Write, text: &str, quote: char) -> io::Result<()> {
        let mut qbuf = [0u8; 4];
        out.write_all(quote.encode_utf8(&mut qbuf).as_bytes())?;
        out.write_all(text.as_bytes())?;
        out.write_all(quote.encode_utf8(&mut qbuf).as_bytes())
    }

    fn comment(&mut self, out: &mut dyn Write, text: &str) -> io::Result<()> {
        write!(out, "/*{text}*/")
    }

    fn raw(&mut self, out: &mut dyn Write, text: &str) -> io::Result<()> {
        out.write_all(text.as_bytes())
    }
}

/// The stock emitter: plain JSON text with no transformation.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEmitter;

impl TokenEmitter for DefaultEmitter {}

#[derive(Debug)]
struct Frame {
    pos: JsonPosition,
    has_items: bool,
}

/// Streaming writer producing JSON text into any [`Write`] sink.
///
/// The writer mirrors the reader's container state machine on the output
/// side: every call is validated against the current [`WriteState`], and
/// separators, indentation, quoting and escaping are applied per the
/// configured [`WriterOptions`].
///
/// # Examples
///
/// ```rust
/// use jsontext::JsonTextWriter;
///
/// let mut out = Vec::new();
/// let mut writer = JsonTextWriter::new(&mut out);
/// writer.write_start_object().unwrap();
/// writer.write_property_name("answer").unwrap();
/// writer.write_value(42).unwrap();
/// writer.write_end_object().unwrap();
/// writer.close().unwrap();
/// drop(writer);
/// assert_eq!(out, br#"{"answer":42}"#);
/// ```
pub struct JsonTextWriter<W: Write, E: TokenEmitter = DefaultEmitter> {
    out: W,
    emitter: E,
    state: WriteState,
    current: Option<Frame>,
    stack: Vec<Frame>,
    /// A comment was written where a property value belongs; the value gets
    /// one separating space.
    space_before_value: bool,
    options: WriterOptions,
}

impl<W: Write> JsonTextWriter<W> {
    pub fn new(out: W) -> Self {
        Self::with_options(out, WriterOptions::default())
    }

    pub fn with_options(out: W, options: WriterOptions) -> Self {
        Self::with_emitter(out, options, DefaultEmitter)
    }
}

impl<W: Write, E: TokenEmitter> JsonTextWriter<W, E> {
    /// Construct with a custom [`TokenEmitter`] transforming the emitted
    /// characters.
    pub fn with_emitter(out: W, options: WriterOptions, emitter: E) -> Self {
        Self {
            out,
            emitter,
            state: WriteState::Start,
            current: None,
            stack: Vec::new(),
            space_before_value: false,
            options,
        }
    }

    #[must_use]
    pub fn write_state(&self) -> WriteState {
        self.state
    }

    /// Breadcrumb of the current write position.
    #[must_use]
    pub fn path(&self) -> String {
        build_path(
            self.stack
                .iter()
                .map(|f| &f.pos)
                .chain(self.current.iter().map(|f| &f.pos)),
        )
    }

    // ------------------------------------------------- formatting properties

    pub fn set_formatting(&mut self, formatting: Formatting) {
        self.options.formatting = formatting;
    }

    pub fn set_indentation(&mut self, count: usize) {
        self.options.indentation = count;
    }

    pub fn set_indent_char(&mut self, c: char) {
        self.options.indent_char = c;
    }

    pub fn set_quote_char(&mut self, c: char) {
        self.options.quote_char = c;
    }

    pub fn set_quote_name(&mut self, quote: bool) {
        self.options.quote_name = quote;
    }

    pub fn set_float_format_handling(&mut self, handling: FloatFormatHandling) {
        self.options.float_format_handling = handling;
    }

    pub fn set_string_escape_handling(&mut self, handling: StringEscapeHandling) {
        self.options.string_escape_handling = handling;
    }

    pub fn set_date_format_handling(&mut self, handling: DateFormatHandling) {
        self.options.date_format_handling = handling;
    }

    pub fn set_date_format_string(&mut self, format: Option<String>) {
        self.options.date_format_string = format;
    }

    // ------------------------------------------------------------ containers

    pub fn write_start_object(&mut self) -> Result<(), WriterError> {
        self.check_cancel()?;
        self.auto_complete(JsonToken::StartObject)?;
        self.push_frame(ContainerKind::Object);
        self.emitter.start_object(&mut self.out)?;
        self.state = WriteState::Object;
        Ok(())
    }

    pub fn write_start_array(&mut self) -> Result<(), WriterError> {
        self.check_cancel()?;
        self.auto_complete(JsonToken::StartArray)?;
        self.push_frame(ContainerKind::Array);
        self.emitter.start_array(&mut self.out)?;
        self.state = WriteState::Array;
        Ok(())
    }

    pub fn write_start_constructor(&mut self, name: &str) -> Result<(), WriterError> {
        self.check_cancel()?;
        self.auto_complete(JsonToken::StartConstructor)?;
        self.push_frame(ContainerKind::Constructor);
        self.emitter.start_constructor(&mut self.out, name)?;
        self.state = WriteState::Constructor;
        Ok(())
    }

    /// Close the innermost open container.
    pub fn write_end(&mut self) -> Result<(), WriterError> {
        self.check_cancel()?;
        if self.current.is_none() {
            return Err(WriterError::state("No token to close.", self.path()));
        }
        self.close_one()
    }

    /// Close containers until an object closes.
    pub fn write_end_object(&mut self) -> Result<(), WriterError> {
        self.write_end_kind(ContainerKind::Object)
    }

    /// Close containers until an array closes.
    pub fn write_end_array(&mut self) -> Result<(), WriterError> {
        self.write_end_kind(ContainerKind::Array)
    }

    /// Close containers until a constructor closes.
    pub fn write_end_constructor(&mut self) -> Result<(), WriterError> {
        self.write_end_kind(ContainerKind::Constructor)
    }

    fn write_end_kind(&mut self, kind: ContainerKind) -> Result<(), WriterError> {
        self.check_cancel()?;
        let open = self
            .current
            .iter()
            .chain(self.stack.iter())
            .any(|f| f.pos.kind == kind);
        if !open {
            return Err(WriterError::state("No token to close.", self.path()));
        }
        loop {
            let closing = self.current.as_ref().expect("checked above").pos.kind;
            self.close_one()?;
            if closing == kind {
                return Ok(());
            }
        }
    }

    fn close_one(&mut self) -> Result<(), WriterError> {
        if self.state == WriteState::Property {
            // A dangling property name is completed with null.
            self.auto_complete(JsonToken::Null)?;
            self.emitter.null(&mut self.out)?;
            self.after_value();
        }
        let frame = self.current.take().expect("close_one requires a frame");
        if frame.has_items && self.options.formatting == Formatting::Indented {
            let depth = self.stack.len();
            self.write_indent(depth)?;
        }
        match frame.pos.kind {
            ContainerKind::Object => self.emitter.end_object(&mut self.out)?,
            ContainerKind::Array => self.emitter.end_array(&mut self.out)?,
            ContainerKind::Constructor => self.emitter.end_constructor(&mut self.out)?,
        }
        self.current = self.stack.pop();
        self.state = self.container_state();
        Ok(())
    }

    // ------------------------------------------------------------ properties

    pub fn write_property_name(&mut self, name: &str) -> Result<(), WriterError> {
        self.check_cancel()?;
        self.auto_complete(JsonToken::PropertyName)?;
        if let Some(frame) = &mut self.current {
            frame.pos.property_name = Some(name.to_string());
            frame.has_items = true;
        }
        let ctx = self.emit_context();
        self.emitter.property_name(&mut self.out, name, &ctx)?;
        self.state = WriteState::Property;
        Ok(())
    }

    // ----------------------------------------------------------------- values

    /// Write any supported value.
    pub fn write_value(&mut self, value: impl Into<JsonValue>) -> Result<(), WriterError> {
        self.write_json_value(&value.into())
    }

    fn write_json_value(&mut self, value: &JsonValue) -> Result<(), WriterError> {
        match value {
            JsonValue::Null => self.write_null(),
            JsonValue::Undefined => self.write_undefined(),
            JsonValue::Bool(b) => self.write_bool(*b),
            JsonValue::Int(i) => self.write_i64(*i),
            JsonValue::BigInt(b) => self.write_bigint(b),
            JsonValue::Float(f) => self.write_f64(*f),
            JsonValue::Decimal(d) => self.write_decimal(*d),
            JsonValue::Str(s) => self.write_string(s),
            JsonValue::Bytes(b) => self.write_bytes(b),
            JsonValue::Date(d) => self.write_date(*d),
            JsonValue::Raw(r) => self.write_raw_value(r),
        }
    }

    pub fn write_null(&mut self) -> Result<(), WriterError> {
        self.check_cancel()?;
        self.auto_complete(JsonToken::Null)?;
        self.emitter.null(&mut self.out)?;
        self.after_value();
        Ok(())
    }

    pub fn write_undefined(&mut self) -> Result<(), WriterError> {
        self.check_cancel()?;
        self.auto_complete(JsonToken::Undefined)?;
        self.emitter.undefined(&mut self.out)?;
        self.after_value();
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), WriterError> {
        self.check_cancel()?;
        self.auto_complete(JsonToken::Boolean)?;
        self.emitter.boolean(&mut self.out, value)?;
        self.after_value();
        Ok(())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<(), WriterError> {
        self.write_number_text(&value.to_string())
    }

    /// The full unsigned range is preserved; `u64::MAX` never passes through
    /// a signed representation.
    pub fn write_u64(&mut self, value: u64) -> Result<(), WriterError> {
        self.write_number_text(&value.to_string())
    }

    pub fn write_bigint(&mut self, value: &BigInt) -> Result<(), WriterError> {
        self.write_number_text(&value.to_string())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<(), WriterError> {
        self.write_f64_inner(value, false)
    }

    /// Nullable double: under [`FloatFormatHandling::DefaultValue`] a
    /// non-finite value becomes `null` instead of `0.0`.
    pub fn write_f64_option(&mut self, value: Option<f64>) -> Result<(), WriterError> {
        match value {
            None => self.write_null(),
            Some(v) => self.write_f64_inner(v, true),
        }
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), WriterError> {
        if value.is_finite() {
            let mut text = value.to_string();
            ensure_decimal_place(&mut text);
            self.write_number_text(&text)
        } else {
            self.write_f64_inner(f64::from(value), false)
        }
    }

    pub fn write_f32_option(&mut self, value: Option<f32>) -> Result<(), WriterError> {
        match value {
            None => self.write_null(),
            Some(v) if v.is_finite() => self.write_f32(v),
            Some(v) => self.write_f64_inner(f64::from(v), true),
        }
    }

    fn write_f64_inner(&mut self, value: f64, nullable: bool) -> Result<(), WriterError> {
        if value.is_finite() {
            let mut text = value.to_string();
            ensure_decimal_place(&mut text);
            return self.write_number_text(&text);
        }
        let symbol = if value.is_nan() {
            "NaN"
        } else if value > 0.0 {
            "Infinity"
        } else {
            "-Infinity"
        };
        match self.options.float_format_handling {
            FloatFormatHandling::Symbol => self.write_number_text(symbol),
            FloatFormatHandling::String => {
                self.check_cancel()?;
                self.auto_complete(JsonToken::Float)?;
                let quote = self.options.quote_char;
                self.emitter.quoted_text(&mut self.out, symbol, quote)?;
                self.after_value();
                Ok(())
            }
            FloatFormatHandling::DefaultValue => {
                if nullable {
                    self.write_null()
                } else {
                    self.write_number_text("0.0")
                }
            }
        }
    }

    pub fn write_decimal(&mut self, value: Decimal) -> Result<(), WriterError> {
        let mut text = value.to_string();
        ensure_decimal_place(&mut text);
        self.write_number_text(&text)
    }

    fn write_number_text(&mut self, text: &str) -> Result<(), WriterError> {
        self.check_cancel()?;
        self.auto_complete(JsonToken::Integer)?;
        self.emitter.number(&mut self.out, text)?;
        self.after_value();
        Ok(())
    }

    pub fn write_string(&mut self, value: &str) -> Result<(), WriterError> {
        self.check_cancel()?;
        self.auto_complete(JsonToken::String)?;
        let ctx = self.emit_context();
        self.emitter.string(&mut self.out, value, &ctx)?;
        self.after_value();
        Ok(())
    }

    /// Write binary data as a base64 string.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), WriterError> {
        self.check_cancel()?;
        self.auto_complete(JsonToken::Bytes)?;
        let quote = self.options.quote_char;
        if let Some(pool) = self.options.buffer_pool.clone() {
            let mut lease = Lease::rent(pool.as_ref(), data.len().div_ceil(3) * 4);
            {
                let mut encoder = Base64Encoder::new(&mut *lease);
                encoder.encode(data)?;
                encoder.flush()?;
            }
            let text = std::str::from_utf8(&lease).expect("base64 output is ASCII");
            self.emitter.quoted_text(&mut self.out, text, quote)?;
        } else {
            let mut buf = Vec::with_capacity(data.len().div_ceil(3) * 4);
            let mut encoder = Base64Encoder::new(&mut buf);
            encoder.encode(data)?;
            encoder.flush()?;
            let text = std::str::from_utf8(&buf).expect("base64 output is ASCII");
            self.emitter.quoted_text(&mut self.out, text, quote)?;
        }
        self.after_value();
        Ok(())
    }

    pub fn write_date(&mut self, date: JsonDate) -> Result<(), WriterError> {
        self.check_cancel()?;
        self.auto_complete(JsonToken::Date)?;
        let text = format_date(
            &date,
            self.options.date_format_handling,
            self.options.date_format_string.as_deref(),
        );
        let quote = self.options.quote_char;
        self.emitter.quoted_text(&mut self.out, &text, quote)?;
        self.after_value();
        Ok(())
    }

    // -------------------------------------------------------- raw & comments

    /// Write raw text verbatim with no separator or state bookkeeping.
    pub fn write_raw(&mut self, text: &str) -> Result<(), WriterError> {
        self.check_cancel()?;
        self.emitter.raw(&mut self.out, text)?;
        Ok(())
    }

    /// Write raw text as a value: separators and state advance normally.
    pub fn write_raw_value(&mut self, text: &str) -> Result<(), WriterError> {
        self.check_cancel()?;
        self.auto_complete(JsonToken::Raw)?;
        self.emitter.raw(&mut self.out, text)?;
        self.after_value();
        Ok(())
    }

    pub fn write_comment(&mut self, text: &str) -> Result<(), WriterError> {
        self.check_cancel()?;
        if matches!(self.state, WriteState::Closed | WriteState::Error) {
            return Err(WriterError::state(
                format!(
                    "Token Comment in state {} would result in an invalid JSON object.",
                    self.state.name()
                ),
                self.path(),
            ));
        }
        // Comments take an element position (own line) inside arrays and
        // constructors, and sit inline everywhere else.
        if self.options.formatting == Formatting::Indented
            && matches!(self.state, WriteState::Array | WriteState::Constructor)
        {
            let depth = self.frame_count();
            self.write_indent(depth)?;
        }
        if self.state == WriteState::Property {
            self.space_before_value = true;
        }
        self.emitter.comment(&mut self.out, text)?;
        Ok(())
    }

    // ------------------------------------------------------------ write_token

    /// Low-level emission of an explicit token/value pair.
    pub fn write_token(
        &mut self,
        token: JsonToken,
        value: Option<JsonValue>,
    ) -> Result<(), WriterError> {
        match token {
            JsonToken::None => Ok(()),
            JsonToken::StartObject => self.write_start_object(),
            JsonToken::StartArray => self.write_start_array(),
            JsonToken::StartConstructor => {
                let name = require_value(&value, "name")?;
                match name.as_str() {
                    Some(name) => self.write_start_constructor(name),
                    None => Err(WriterError::Format),
                }
            }
            JsonToken::PropertyName => {
                let v = require_value(&value, "name")?;
                match v.as_str() {
                    Some(name) => self.write_property_name(name),
                    None => Err(WriterError::Format),
                }
            }
            JsonToken::Comment => {
                let v = require_value(&value, "text")?;
                match v.as_str() {
                    Some(text) => self.write_comment(text),
                    None => Err(WriterError::Format),
                }
            }
            JsonToken::Raw => {
                let v = require_value(&value, "value")?;
                match v.as_str() {
                    Some(text) => self.write_raw_value(text),
                    None => Err(WriterError::Format),
                }
            }
            JsonToken::Integer => {
                let v = require_value(&value, "value")?;
                match v {
                    JsonValue::Int(i) => self.write_i64(*i),
                    JsonValue::BigInt(b) => {
                        let b = b.clone();
                        self.write_bigint(&b)
                    }
                    JsonValue::Str(s) => match s.parse::<i64>() {
                        Ok(i) => self.write_i64(i),
                        Err(_) => Err(WriterError::Format),
                    },
                    _ => Err(WriterError::Format),
                }
            }
            JsonToken::Float => {
                let v = require_value(&value, "value")?;
                match v {
                    JsonValue::Float(f) => self.write_f64(*f),
                    JsonValue::Int(i) => {
                        #[allow(clippy::cast_precision_loss)]
                        self.write_f64(*i as f64)
                    }
                    JsonValue::Decimal(d) => self.write_decimal(*d),
                    JsonValue::Str(s) => match s.parse::<f64>() {
                        Ok(f) => self.write_f64(f),
                        Err(_) => Err(WriterError::Format),
                    },
                    _ => Err(WriterError::Format),
                }
            }
            JsonToken::String => {
                let v = require_value(&value, "value")?;
                match v.as_str() {
                    Some(s) => self.write_string(s),
                    None => Err(WriterError::Format),
                }
            }
            JsonToken::Boolean => {
                let v = require_value(&value, "value")?;
                match v {
                    JsonValue::Bool(b) => self.write_bool(*b),
                    JsonValue::Str(s) => match s.to_ascii_lowercase().parse::<bool>() {
                        Ok(b) => self.write_bool(b),
                        Err(_) => Err(WriterError::Format),
                    },
                    _ => Err(WriterError::Format),
                }
            }
            JsonToken::Null => self.write_null(),
            JsonToken::Undefined => self.write_undefined(),
            JsonToken::EndObject => self.write_end_object(),
            JsonToken::EndArray => self.write_end_array(),
            JsonToken::EndConstructor => self.write_end_constructor(),
            JsonToken::Date => {
                let v = require_value(&value, "value")?;
                match v {
                    JsonValue::Date(d) => self.write_date(*d),
                    _ => Err(WriterError::Format),
                }
            }
            JsonToken::Bytes => {
                let v = require_value(&value, "value")?;
                match v {
                    JsonValue::Bytes(b) => {
                        let b = b.clone();
                        self.write_bytes(&b)
                    }
                    _ => Err(WriterError::Format),
                }
            }
        }
    }

    /// Copy the reader's current token into this writer. When
    /// `write_children` is set and the token opens a container, the entire
    /// subtree is copied, including comments and constructors.
    pub fn write_token_from<R: Read>(
        &mut self,
        reader: &mut JsonTextReader<R>,
        write_children: bool,
    ) -> Result<(), WriterError> {
        let initial_depth = match reader.token_type() {
            JsonToken::None => -1,
            t if t.is_start() => i64::try_from(reader.depth()).unwrap_or(i64::MAX),
            _ => i64::try_from(reader.depth()).unwrap_or(i64::MAX - 1) + 1,
        };
        loop {
            self.write_reader_token(reader.token_type(), reader.value())?;
            let depth = i64::try_from(reader.depth()).unwrap_or(i64::MAX);
            let end_adjust = i64::from(reader.token_type().is_end());
            if !(write_children && initial_depth - 1 < depth - end_adjust) {
                return Ok(());
            }
            if !reader.read()? {
                return Ok(());
            }
        }
    }

    fn write_reader_token(
        &mut self,
        token: JsonToken,
        value: Option<&JsonValue>,
    ) -> Result<(), WriterError> {
        match token {
            // End tokens from a balanced reader stream close exactly one
            // container each.
            JsonToken::EndObject | JsonToken::EndArray | JsonToken::EndConstructor => {
                self.write_end()
            }
            _ => self.write_token(token, value.cloned()),
        }
    }

    // --------------------------------------------------------------- closing

    /// Auto-complete any open containers and flush when `close_output` is
    /// set. Content left open is completed, never reported as an error.
    pub fn close(&mut self) -> Result<(), WriterError> {
        if self.state == WriteState::Closed {
            return Ok(());
        }
        let open = self.frame_count();
        if open > 0 {
            tracing::debug!(open, "auto-completing open containers on close");
        }
        while self.current.is_some() {
            self.close_one()?;
        }
        if self.options.close_output {
            self.out.flush()?;
        }
        self.state = WriteState::Closed;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), WriterError> {
        self.out.flush()?;
        Ok(())
    }

    // ---------------------------------------------------------- state helpers

    fn auto_complete(&mut self, token: JsonToken) -> Result<(), WriterError> {
        let writing_name = token == JsonToken::PropertyName;
        match self.state {
            WriteState::Start if !writing_name => Ok(()),
            WriteState::Property if !writing_name => {
                if self.space_before_value {
                    self.space_before_value = false;
                    self.out.write_all(b" ")?;
                }
                Ok(())
            }
            WriteState::Object if writing_name => {
                let has_items = self.current.as_ref().is_some_and(|f| f.has_items);
                if has_items {
                    self.out.write_all(b",")?;
                }
                if self.options.formatting == Formatting::Indented {
                    let depth = self.frame_count();
                    self.write_indent(depth)?;
                }
                Ok(())
            }
            WriteState::Array | WriteState::Constructor if !writing_name => {
                let has_items = self.current.as_ref().is_some_and(|f| f.has_items);
                if has_items {
                    self.out.write_all(b",")?;
                }
                if self.options.formatting == Formatting::Indented {
                    let depth = self.frame_count();
                    self.write_indent(depth)?;
                }
                Ok(())
            }
            state => {
                self.state = WriteState::Error;
                Err(WriterError::state(
                    format!(
                        "Token {token} in state {} would result in an invalid JSON object.",
                        state.name()
                    ),
                    self.path(),
                ))
            }
        }
    }

    fn after_value(&mut self) {
        if let Some(frame) = &mut self.current {
            frame.pos.value_started();
            frame.has_items = true;
        }
        self.state = self.container_state();
    }

    fn container_state(&self) -> WriteState {
        match self.current.as_ref().map(|f| f.pos.kind) {
            None => WriteState::Start,
            Some(ContainerKind::Object) => WriteState::Object,
            Some(ContainerKind::Array) => WriteState::Array,
            Some(ContainerKind::Constructor) => WriteState::Constructor,
        }
    }

    fn push_frame(&mut self, kind: ContainerKind) {
        if let Some(mut parent) = self.current.take() {
            parent.pos.value_started();
            parent.has_items = true;
            self.stack.push(parent);
        }
        self.current = Some(Frame {
            pos: JsonPosition::new(kind),
            has_items: false,
        });
    }

    fn frame_count(&self) -> usize {
        self.stack.len() + usize::from(self.current.is_some())
    }

    fn write_indent(&mut self, depth: usize) -> Result<(), io::Error> {
        self.out.write_all(b"\n")?;
        let mut cbuf = [0u8; 4];
        let c = self.options.indent_char.encode_utf8(&mut cbuf);
        for _ in 0..depth * self.options.indentation {
            self.out.write_all(c.as_bytes())?;
        }
        Ok(())
    }

    fn emit_context(&self) -> EmitContext {
        EmitContext {
            quote_char: self.options.quote_char,
            quote_name: self.options.quote_name,
            escape_handling: self.options.string_escape_handling,
            indented: self.options.formatting == Formatting::Indented,
        }
    }

    fn check_cancel(&self) -> Result<(), WriterError> {
        match &self.options.cancel {
            Some(token) if token.is_canceled() => Err(WriterError::Canceled),
            _ => Ok(()),
        }
    }
}

impl<W: Write, E: TokenEmitter> Drop for JsonTextWriter<W, E> {
    fn drop(&mut self) {
        // Cleanup never raises; open content is completed best-effort.
        let _ = self.close();
    }
}

fn require_value<'v>(
    value: &'v Option<JsonValue>,
    parameter: &'static str,
) -> Result<&'v JsonValue, WriterError> {
    value
        .as_ref()
        .ok_or(WriterError::MissingValue { parameter })
}

/// `10` prints as `10.0`; anything already carrying a fraction or exponent
/// is left alone.
fn ensure_decimal_place(text: &mut String) {
    if !text.contains(['.', 'e', 'E']) {
        text.push_str(".0");
    }
}

fn format_date(date: &JsonDate, handling: DateFormatHandling, pattern: Option<&str>) -> String {
    if let Some(pattern) = pattern {
        return match date {
            JsonDate::Utc(d) => d.format(pattern).to_string(),
            JsonDate::Offset(d) => d.format(pattern).to_string(),
            JsonDate::Naive(d) => d.format(pattern).to_string(),
        };
    }
    match handling {
        DateFormatHandling::IsoDateFormat => {
            let (naive, suffix) = match date {
                JsonDate::Utc(d) => (d.naive_utc(), "Z".to_string()),
                JsonDate::Offset(d) => (d.naive_local(), format_offset(d.offset().local_minus_utc())),
                JsonDate::Naive(d) => (*d, String::new()),
            };
            let mut text = naive.format("%Y-%m-%dT%H:%M:%S%.f").to_string();
            text.push_str(&suffix);
            text
        }
        DateFormatHandling::MicrosoftDateFormat => {
            let ms = date.to_utc().timestamp_millis();
            match date {
                JsonDate::Utc(_) | JsonDate::Naive(_) => format!("\\/Date({ms})\\/"),
                JsonDate::Offset(d) => {
                    let total = d.offset().local_minus_utc();
                    let sign = if total < 0 { '-' } else { '+' };
                    let total = total.abs();
                    format!(
                        "\\/Date({ms}{sign}{:02}{:02})\\/",
                        total / 3600,
                        (total % 3600) / 60
                    )
                }
            }
        }
    }
}

fn format_offset(total_seconds: i32) -> String {
    let sign = if total_seconds < 0 { '-' } else { '+' };
    let total = total_seconds.abs();
    format!("{sign}{:02}:{:02}", total / 3600, (total % 3600) / 60)
}

#[cfg(test)]
mod tests;
