//! The streaming JSON text reader.

mod scanner;

use std::io::Read;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use num_bigint::BigInt;
use rust_decimal::Decimal;

use crate::error::ReaderError;
use crate::options::{DateParseHandling, FloatParseHandling, ReaderOptions};
use crate::position::{ContainerKind, JsonPosition, build_path};
use crate::token::{JsonDate, JsonToken, JsonValue};

use self::scanner::{LiteralKind, LiteralPolicy, NumKind, RawToken, Scanner};

/// What the reader is positioned to parse next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Start,
    /// Inside `{`, before the first property.
    ObjectStart,
    /// Inside an object after a separator.
    Object,
    ArrayStart,
    Array,
    ConstructorStart,
    Constructor,
    /// A property name has been read; a value must follow.
    Property,
    /// A value just completed inside a container.
    PostValue,
    /// The root value completed.
    Finished,
}

impl ReadState {
    fn name(self) -> &'static str {
        match self {
            ReadState::Start => "Start",
            ReadState::ObjectStart => "ObjectStart",
            ReadState::Object => "Object",
            ReadState::ArrayStart => "ArrayStart",
            ReadState::Array => "Array",
            ReadState::ConstructorStart => "ConstructorStart",
            ReadState::Constructor => "Constructor",
            ReadState::Property => "Property",
            ReadState::PostValue => "PostValue",
            ReadState::Finished => "Finished",
        }
    }
}

/// Target of a typed read; drives which lexemes are acceptable and how
/// failures are phrased.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadMode {
    Read,
    Str,
    Int32,
    Double,
    Decimal,
    Bool,
    Date,
    Bytes,
}

/// Streaming reader over JSON text pulled from any [`Read`] source.
///
/// Tokens are produced one at a time by [`read`](Self::read); the current
/// token, its value, the nesting depth and a human-readable path are
/// available between calls. The `read_as_*` family positions on the next
/// value token and converts it on demand; a failed conversion still advances
/// past the offending token so subsequent siblings stay readable.
///
/// The accepted grammar is a relaxed superset of JSON: comments, single
/// quoted strings, unquoted property names, `new Name(...)` constructor
/// syntax, `undefined`, `NaN`, `Infinity`, and hex/octal integers.
///
/// # Examples
///
/// ```rust
/// use jsontext::{JsonTextReader, JsonToken};
///
/// let mut reader = JsonTextReader::new(r#"{"a": [1, true]}"#.as_bytes());
/// let mut kinds = Vec::new();
/// while reader.read().unwrap() {
///     kinds.push(reader.token_type());
/// }
/// assert_eq!(
///     kinds,
///     [
///         JsonToken::StartObject,
///         JsonToken::PropertyName,
///         JsonToken::StartArray,
///         JsonToken::Integer,
///         JsonToken::Boolean,
///         JsonToken::EndArray,
///         JsonToken::EndObject,
///     ]
/// );
/// ```
pub struct JsonTextReader<R: Read> {
    scanner: Scanner<R>,
    state: ReadState,
    token: JsonToken,
    value: Option<JsonValue>,

    current: Option<JsonPosition>,
    stack: Vec<JsonPosition>,
    exceeded_max_depth: bool,

    /// A property name whose `:` has not been consumed yet; survives a
    /// transient fault between the two.
    pending_name: Option<String>,
    /// Partial result of a byte-array read interrupted by a transient fault.
    pending_bytes: Option<Vec<u8>>,

    options: ReaderOptions,
}

impl<R: Read> JsonTextReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_options(inner, ReaderOptions::default())
    }

    pub fn with_options(inner: R, options: ReaderOptions) -> Self {
        Self {
            scanner: Scanner::new(inner),
            state: ReadState::Start,
            token: JsonToken::None,
            value: None,
            current: None,
            stack: Vec::new(),
            exceeded_max_depth: false,
            pending_name: None,
            pending_bytes: None,
            options,
        }
    }

    /// Consume the reader, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.scanner.into_inner()
    }

    /// Kind of the current token.
    #[must_use]
    pub fn token_type(&self) -> JsonToken {
        self.token
    }

    /// Payload of the current token, if it carries one.
    #[must_use]
    pub fn value(&self) -> Option<&JsonValue> {
        self.value.as_ref()
    }

    /// Nesting depth of the current token.
    #[must_use]
    pub fn depth(&self) -> usize {
        let depth = self.stack.len();
        if self.token.is_start() || self.current.is_none() {
            depth
        } else {
            depth + 1
        }
    }

    /// Breadcrumb of the current position, e.g. `items[2].name`.
    #[must_use]
    pub fn path(&self) -> String {
        build_path(self.stack.iter().chain(self.current.iter()))
    }

    /// Line of the next unread character, 1-based.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.scanner.line()
    }

    /// Characters consumed on the current line.
    #[must_use]
    pub fn line_position(&self) -> usize {
        self.scanner.column()
    }

    // ------------------------------------------------------------ main loop

    /// Advance to the next token. Returns `false` only at a clean end of
    /// content.
    pub fn read(&mut self) -> Result<bool, ReaderError> {
        self.check_cancel()?;
        loop {
            match self.state {
                ReadState::Start
                | ReadState::Property
                | ReadState::ArrayStart
                | ReadState::Array
                | ReadState::ConstructorStart
                | ReadState::Constructor => {
                    return self.parse_value();
                }
                ReadState::ObjectStart | ReadState::Object => {
                    return self.parse_property();
                }
                ReadState::PostValue => {
                    if let Some(flow) = self.parse_post_value()? {
                        return Ok(flow);
                    }
                }
                ReadState::Finished => {
                    if let Some(flow) = self.parse_finished()? {
                        return Ok(flow);
                    }
                }
            }
        }
    }

    // ------------------------------------------------------- typed accessors

    /// Read the next value as a 32-bit integer.
    pub fn read_as_int32(&mut self) -> Result<Option<i32>, ReaderError> {
        match self.read_typed(ReadMode::Int32)? {
            Some(JsonValue::Int(i)) => Ok(Some(
                i32::try_from(i).expect("int32 conversion checked before token set"),
            )),
            _ => Ok(None),
        }
    }

    /// Read the next value as a string.
    pub fn read_as_string(&mut self) -> Result<Option<String>, ReaderError> {
        match self.read_typed(ReadMode::Str)? {
            Some(JsonValue::Str(s)) => Ok(Some(s)),
            _ => Ok(None),
        }
    }

    /// Read the next value as a double.
    pub fn read_as_double(&mut self) -> Result<Option<f64>, ReaderError> {
        match self.read_typed(ReadMode::Double)? {
            Some(JsonValue::Float(f)) => Ok(Some(f)),
            _ => Ok(None),
        }
    }

    /// Read the next value as a decimal.
    pub fn read_as_decimal(&mut self) -> Result<Option<Decimal>, ReaderError> {
        match self.read_typed(ReadMode::Decimal)? {
            Some(JsonValue::Decimal(d)) => Ok(Some(d)),
            _ => Ok(None),
        }
    }

    /// Read the next value as a boolean.
    pub fn read_as_boolean(&mut self) -> Result<Option<bool>, ReaderError> {
        match self.read_typed(ReadMode::Bool)? {
            Some(JsonValue::Bool(b)) => Ok(Some(b)),
            _ => Ok(None),
        }
    }

    /// Read the next value as a date, treating zoneless text as UTC.
    pub fn read_as_date(&mut self) -> Result<Option<DateTime<Utc>>, ReaderError> {
        match self.read_typed(ReadMode::Date)? {
            Some(JsonValue::Date(d)) => Ok(Some(d.to_utc())),
            _ => Ok(None),
        }
    }

    /// Read the next value as a date with its offset preserved.
    pub fn read_as_date_with_offset(
        &mut self,
    ) -> Result<Option<DateTime<FixedOffset>>, ReaderError> {
        match self.read_typed(ReadMode::Date)? {
            Some(JsonValue::Date(d)) => Ok(Some(d.to_fixed_offset())),
            _ => Ok(None),
        }
    }

    /// Read the next value as binary data: either a base64 string or an
    /// array of byte-sized integers.
    pub fn read_as_bytes(&mut self) -> Result<Option<Vec<u8>>, ReaderError> {
        self.check_cancel()?;
        if self.pending_bytes.is_some() {
            // A fault interrupted a byte-array read; keep collecting.
            return self.collect_byte_array();
        }
        match self.read_typed_inner(ReadMode::Bytes)? {
            Some(JsonValue::Bytes(b)) => Ok(Some(b)),
            _ => Ok(None),
        }
    }

    fn read_typed(&mut self, mode: ReadMode) -> Result<Option<JsonValue>, ReaderError> {
        self.check_cancel()?;
        self.read_typed_inner(mode)
    }

    fn read_typed_inner(&mut self, mode: ReadMode) -> Result<Option<JsonValue>, ReaderError> {
        loop {
            match self.state {
                ReadState::Start
                | ReadState::Property
                | ReadState::ArrayStart
                | ReadState::Array
                | ReadState::ConstructorStart
                | ReadState::Constructor => {
                    return self.parse_typed_value(mode);
                }
                ReadState::PostValue => {
                    if let Some(flow) = self.parse_post_value()? {
                        if !flow || self.token.is_end() {
                            return Ok(None);
                        }
                        if self.token == JsonToken::Comment {
                            continue;
                        }
                        return Ok(None);
                    }
                }
                ReadState::ObjectStart | ReadState::Object => {
                    return Err(self.err(format!("Unexpected state: {}.", self.state.name())));
                }
                ReadState::Finished => {
                    match self.parse_finished()? {
                        // Comments are skipped, end of content maps to None.
                        Some(true) | None => continue,
                        Some(false) => return Ok(None),
                    }
                }
            }
        }
    }

    // --------------------------------------------------------- value parsing

    /// Parse one token in a plain-`read` value position.
    fn parse_value(&mut self) -> Result<bool, ReaderError> {
        if let Some(raw) = self.resume_scan()? {
            self.finish_plain_raw(raw)?;
            return Ok(true);
        }
        let next = self.skip_ws()?;
        let Some(c) = next else {
            return match self.state {
                ReadState::Start => {
                    self.set_token(JsonToken::None, None, false);
                    Ok(false)
                }
                _ => Err(self.scan_err(self.scanner.unexpected_end())),
            };
        };

        match c {
            '"' | '\'' => {
                let raw = self.scan(|s| s.start_string(c))?;
                self.finish_plain_raw(raw)?;
                Ok(true)
            }
            '{' => {
                self.consume()?;
                self.begin_container(ContainerKind::Object, JsonToken::StartObject)?;
                Ok(true)
            }
            '[' => {
                self.consume()?;
                self.begin_container(ContainerKind::Array, JsonToken::StartArray)?;
                Ok(true)
            }
            ']' if self.in_array_value_position() => {
                self.consume()?;
                self.end_container(JsonToken::EndArray, ContainerKind::Array)?;
                Ok(true)
            }
            ')' if self.in_constructor_value_position() => {
                self.consume()?;
                self.end_container(JsonToken::EndConstructor, ContainerKind::Constructor)?;
                Ok(true)
            }
            ',' if self.in_array_value_position() || self.in_constructor_value_position() => {
                // A stray comma reads as an empty slot; the comma itself is
                // left for the post-value separator pass.
                self.set_token(JsonToken::Undefined, Some(JsonValue::Undefined), true);
                self.state = ReadState::PostValue;
                Ok(true)
            }
            '/' => {
                let raw = self.scan(|s| s.start_comment())?;
                self.finish_plain_raw(raw)?;
                Ok(true)
            }
            't' => self.plain_literal(LiteralKind::True),
            'f' => self.plain_literal(LiteralKind::False),
            'u' => self.plain_literal(LiteralKind::Undefined),
            'N' => self.plain_literal(LiteralKind::NaN),
            'I' => self.plain_literal(LiteralKind::Infinity),
            'n' => {
                let raw = self.scan(Scanner::start_n)?;
                self.finish_plain_raw(raw)?;
                Ok(true)
            }
            '-' | '.' | '0'..='9' => {
                let raw = self.scan(|s| s.start_number(c))?;
                self.finish_plain_raw(raw)?;
                Ok(true)
            }
            c => Err(self.plain_value_error(c)),
        }
    }

    fn plain_literal(&mut self, kind: LiteralKind) -> Result<bool, ReaderError> {
        let raw = self.scan(|s| s.start_literal(kind, LiteralPolicy::PLAIN))?;
        self.finish_plain_raw(raw)?;
        Ok(true)
    }

    /// Turn a completed scan into the current token (plain `read` path).
    fn finish_plain_raw(&mut self, raw: RawToken) -> Result<(), ReaderError> {
        match raw {
            RawToken::Comment(text) => {
                self.set_token(JsonToken::Comment, Some(JsonValue::Str(text)), false);
            }
            RawToken::Str(text) => {
                let value = self.detect_date(&text);
                match value {
                    Some(date) => {
                        self.set_token(JsonToken::Date, Some(JsonValue::Date(date)), true);
                    }
                    None => self.set_token(JsonToken::String, Some(JsonValue::Str(text)), true),
                }
                self.state = self.post_value_state();
            }
            RawToken::Number { text, kind } => {
                let (token, value) = self.number_token_plain(&text, kind)?;
                self.set_token(token, Some(value), true);
                self.state = self.post_value_state();
            }
            RawToken::True | RawToken::False => {
                let b = raw == RawToken::True;
                self.set_token(JsonToken::Boolean, Some(JsonValue::Bool(b)), true);
                self.state = self.post_value_state();
            }
            RawToken::Null => {
                self.set_token(JsonToken::Null, Some(JsonValue::Null), true);
                self.state = self.post_value_state();
            }
            RawToken::Undefined => {
                self.set_token(JsonToken::Undefined, Some(JsonValue::Undefined), true);
                self.state = self.post_value_state();
            }
            RawToken::NaN => self.float_literal(f64::NAN, "NaN")?,
            RawToken::PosInfinity => self.float_literal(f64::INFINITY, "Infinity")?,
            RawToken::NegInfinity => self.float_literal(f64::NEG_INFINITY, "-Infinity")?,
            RawToken::ConstructorStart(name) => {
                self.begin_container(ContainerKind::Constructor, JsonToken::StartConstructor)?;
                self.value = Some(JsonValue::Str(name));
            }
            RawToken::UnquotedName(_) => unreachable!("names are scanned from parse_property"),
        }
        Ok(())
    }

    fn float_literal(&mut self, v: f64, name: &str) -> Result<(), ReaderError> {
        if self.options.float_parse_handling == FloatParseHandling::Decimal {
            return Err(self.err(format!("Cannot read {name} value.")));
        }
        self.set_token(JsonToken::Float, Some(JsonValue::Float(v)), true);
        self.state = self.post_value_state();
        Ok(())
    }

    // --------------------------------------------------- typed value parsing

    fn parse_typed_value(&mut self, mode: ReadMode) -> Result<Option<JsonValue>, ReaderError> {
        loop {
            if let Some(raw) = self.resume_scan()? {
                return self.finish_typed_raw(raw, mode);
            }
            let next = self.skip_ws()?;
            let Some(c) = next else {
                if self.state == ReadState::Start {
                    self.set_token(JsonToken::None, None, false);
                    return Ok(None);
                }
                return Err(self.scan_err(self.scanner.unexpected_end()));
            };

            match c {
                '"' | '\'' => {
                    let raw = self.scan(|s| s.start_string(c))?;
                    return self.finish_typed_raw(raw, mode);
                }
                '/' => {
                    // Comments are skipped, not surfaced, on typed reads.
                    self.scan(|s| s.start_comment())?;
                    continue;
                }
                ']' if self.in_array_value_position() => {
                    self.consume()?;
                    self.end_container(JsonToken::EndArray, ContainerKind::Array)?;
                    return Ok(None);
                }
                ')' if self.in_constructor_value_position() => {
                    self.consume()?;
                    self.end_container(JsonToken::EndConstructor, ContainerKind::Constructor)?;
                    return Ok(None);
                }
                ',' if self.in_array_value_position() || self.in_constructor_value_position() => {
                    // The slot counts, the comma is consumed, and the error
                    // leaves the reader able to read the next sibling.
                    self.mark_value_start();
                    self.consume()?;
                    let err = self
                        .scanner
                        .value_char_error(',', self.scanner.column());
                    return Err(self.scan_err(err));
                }
                'n' => {
                    let raw = self
                        .scan(|s| s.start_literal(LiteralKind::Null, LiteralPolicy::TYPED_NULL))?;
                    debug_assert_eq!(raw, RawToken::Null);
                    self.set_token(JsonToken::Null, Some(JsonValue::Null), true);
                    self.state = self.post_value_state();
                    return Ok(None);
                }
                '[' if mode == ReadMode::Bytes => {
                    self.consume()?;
                    self.begin_container(ContainerKind::Array, JsonToken::StartArray)?;
                    self.pending_bytes = Some(Vec::new());
                    return self.collect_byte_array().map(|b| b.map(JsonValue::Bytes));
                }
                '{' if mode == ReadMode::Bytes => {
                    self.consume()?;
                    self.begin_container(ContainerKind::Object, JsonToken::StartObject)?;
                    // Objects are not a byte source; the error is raised
                    // after the start token so diagnostics can name it.
                    self.read()?;
                    return Err(self.err("Error reading bytes. Unexpected token: StartObject."));
                }
                't' | 'f' if matches!(mode, ReadMode::Str | ReadMode::Bool) => {
                    let kind = if c == 't' {
                        LiteralKind::True
                    } else {
                        LiteralKind::False
                    };
                    let raw = self.scan(|s| s.start_literal(kind, LiteralPolicy::TYPED))?;
                    return self.finish_typed_raw(raw, mode);
                }
                'N' if matches!(mode, ReadMode::Str | ReadMode::Double | ReadMode::Decimal | ReadMode::Int32) => {
                    let raw = self.scan(|s| s.start_literal(LiteralKind::NaN, LiteralPolicy::PLAIN))?;
                    return self.finish_typed_raw(raw, mode);
                }
                'I' if matches!(mode, ReadMode::Str | ReadMode::Double | ReadMode::Decimal | ReadMode::Int32) => {
                    let raw =
                        self.scan(|s| s.start_literal(LiteralKind::Infinity, LiteralPolicy::PLAIN))?;
                    return self.finish_typed_raw(raw, mode);
                }
                '-' | '.' | '0'..='9' if mode != ReadMode::Date => {
                    let raw = self.scan(|s| s.start_number(c))?;
                    return self.finish_typed_raw(raw, mode);
                }
                c => {
                    self.consume()?;
                    let err = self.scanner.value_char_error(c, self.scanner.column());
                    return Err(self.scan_err(err));
                }
            }
        }
    }

    fn finish_typed_raw(
        &mut self,
        raw: RawToken,
        mode: ReadMode,
    ) -> Result<Option<JsonValue>, ReaderError> {
        match raw {
            RawToken::Comment(_) => unreachable!("typed reads skip comments before scanning"),
            RawToken::Str(text) => self.convert_string(text, mode).map(Some),
            RawToken::Number { text, kind } => self.convert_number(&text, kind, mode).map(Some),
            RawToken::True | RawToken::False => {
                let b = raw == RawToken::True;
                match mode {
                    ReadMode::Bool => {
                        self.set_token(JsonToken::Boolean, Some(JsonValue::Bool(b)), true);
                        self.state = self.post_value_state();
                        Ok(Some(JsonValue::Bool(b)))
                    }
                    ReadMode::Str => {
                        let text = if b { "true" } else { "false" };
                        self.set_token(JsonToken::String, Some(JsonValue::Str(text.into())), true);
                        self.state = self.post_value_state();
                        Ok(Some(JsonValue::Str(text.into())))
                    }
                    _ => unreachable!("boolean literals gated by dispatch"),
                }
            }
            RawToken::Null => {
                self.set_token(JsonToken::Null, Some(JsonValue::Null), true);
                self.state = self.post_value_state();
                Ok(None)
            }
            RawToken::NaN | RawToken::PosInfinity | RawToken::NegInfinity => {
                let (v, name) = match raw {
                    RawToken::NaN => (f64::NAN, "NaN"),
                    RawToken::PosInfinity => (f64::INFINITY, "Infinity"),
                    _ => (f64::NEG_INFINITY, "-Infinity"),
                };
                match mode {
                    ReadMode::Double => {
                        self.set_token(JsonToken::Float, Some(JsonValue::Float(v)), true);
                        self.state = self.post_value_state();
                        Ok(Some(JsonValue::Float(v)))
                    }
                    ReadMode::Str => {
                        self.set_token(JsonToken::String, Some(JsonValue::Str(name.into())), true);
                        self.state = self.post_value_state();
                        Ok(Some(JsonValue::Str(name.into())))
                    }
                    _ => Err(self.err(format!("Cannot read {name} value."))),
                }
            }
            RawToken::Undefined | RawToken::ConstructorStart(_) | RawToken::UnquotedName(_) => {
                unreachable!("not producible from typed dispatch")
            }
        }
    }

    fn convert_string(&mut self, text: String, mode: ReadMode) -> Result<JsonValue, ReaderError> {
        self.set_token(JsonToken::String, Some(JsonValue::Str(text.clone())), true);
        self.state = self.post_value_state();
        match mode {
            ReadMode::Str | ReadMode::Read => Ok(JsonValue::Str(text)),
            ReadMode::Int32 => {
                if text.is_empty() {
                    self.set_token(JsonToken::Null, Some(JsonValue::Null), false);
                    return Ok(JsonValue::Null);
                }
                match text.parse::<i32>() {
                    Ok(v) => {
                        self.set_token(JsonToken::Integer, Some(JsonValue::Int(v.into())), false);
                        Ok(JsonValue::Int(v.into()))
                    }
                    Err(_) => {
                        Err(self.err(format!("Could not convert string to integer: {text}.")))
                    }
                }
            }
            ReadMode::Double => {
                if text.is_empty() {
                    self.set_token(JsonToken::Null, Some(JsonValue::Null), false);
                    return Ok(JsonValue::Null);
                }
                match text.parse::<f64>() {
                    Ok(v) => {
                        self.set_token(JsonToken::Float, Some(JsonValue::Float(v)), false);
                        Ok(JsonValue::Float(v))
                    }
                    Err(_) => Err(self.err(format!("Could not convert string to double: {text}."))),
                }
            }
            ReadMode::Decimal => {
                if text.is_empty() {
                    self.set_token(JsonToken::Null, Some(JsonValue::Null), false);
                    return Ok(JsonValue::Null);
                }
                match parse_decimal(&text) {
                    Some(v) => {
                        self.set_token(JsonToken::Float, Some(JsonValue::Decimal(v)), false);
                        Ok(JsonValue::Decimal(v))
                    }
                    None => {
                        Err(self.err(format!("Could not convert string to decimal: {text}.")))
                    }
                }
            }
            ReadMode::Bool => {
                if text.is_empty() {
                    self.set_token(JsonToken::Null, Some(JsonValue::Null), false);
                    return Ok(JsonValue::Null);
                }
                match text.to_ascii_lowercase().parse::<bool>() {
                    Ok(v) => {
                        self.set_token(JsonToken::Boolean, Some(JsonValue::Bool(v)), false);
                        Ok(JsonValue::Bool(v))
                    }
                    Err(_) => {
                        Err(self.err(format!("Could not convert string to boolean: {text}.")))
                    }
                }
            }
            ReadMode::Date => {
                if text.is_empty() {
                    self.set_token(JsonToken::Null, Some(JsonValue::Null), false);
                    return Ok(JsonValue::Null);
                }
                match parse_date(&text) {
                    Some(d) => {
                        self.set_token(JsonToken::Date, Some(JsonValue::Date(d)), false);
                        Ok(JsonValue::Date(d))
                    }
                    None => {
                        Err(self.err(format!("Could not convert string to DateTime: {text}.")))
                    }
                }
            }
            ReadMode::Bytes => {
                if text.is_empty() {
                    self.set_token(JsonToken::Bytes, Some(JsonValue::Bytes(Vec::new())), false);
                    return Ok(JsonValue::Bytes(Vec::new()));
                }
                use base64::Engine as _;
                match base64::engine::general_purpose::STANDARD.decode(&text) {
                    Ok(bytes) => {
                        self.set_token(
                            JsonToken::Bytes,
                            Some(JsonValue::Bytes(bytes.clone())),
                            false,
                        );
                        Ok(JsonValue::Bytes(bytes))
                    }
                    Err(_) => Err(self.err(format!("Input string '{text}' is not valid base64."))),
                }
            }
        }
    }

    fn convert_number(
        &mut self,
        text: &str,
        kind: NumKind,
        mode: ReadMode,
    ) -> Result<JsonValue, ReaderError> {
        // Tokenize first so conversion failures still advance the cursor.
        let (token, value) = self.number_token_plain_lenient(text, kind);
        self.set_token(token, value.clone(), true);
        self.state = self.post_value_state();

        match mode {
            ReadMode::Read => match value {
                Some(v) => Ok(v),
                None => Err(self.err(format!("Input string '{text}' is not a valid number."))),
            },
            ReadMode::Int32 => {
                let out_of_range =
                    || format!("JSON integer {text} is too large or small for an Int32.");
                match (kind, &value) {
                    (_, Some(JsonValue::Int(i))) => match i32::try_from(*i) {
                        Ok(v) => {
                            self.set_token(
                                JsonToken::Integer,
                                Some(JsonValue::Int(v.into())),
                                false,
                            );
                            Ok(JsonValue::Int(v.into()))
                        }
                        Err(_) => Err(self.err(out_of_range())),
                    },
                    (_, Some(JsonValue::BigInt(_))) => Err(self.err(out_of_range())),
                    _ => Err(self.err(format!("Input string '{text}' is not a valid integer."))),
                }
            }
            ReadMode::Double | ReadMode::Bool => {
                let parsed = match &value {
                    #[allow(clippy::cast_precision_loss)]
                    Some(JsonValue::Int(i)) => Some(*i as f64),
                    Some(JsonValue::BigInt(_)) | Some(JsonValue::Float(_)) => {
                        text.parse::<f64>().ok()
                    }
                    _ => None,
                };
                match parsed {
                    Some(v) if mode == ReadMode::Double => {
                        self.set_token(JsonToken::Float, Some(JsonValue::Float(v)), false);
                        Ok(JsonValue::Float(v))
                    }
                    Some(v) => {
                        let b = v != 0.0;
                        self.set_token(JsonToken::Boolean, Some(JsonValue::Bool(b)), false);
                        Ok(JsonValue::Bool(b))
                    }
                    None => Err(self.err(format!("Input string '{text}' is not a valid number."))),
                }
            }
            ReadMode::Decimal => match parse_decimal(text) {
                Some(v) => {
                    self.set_token(JsonToken::Float, Some(JsonValue::Decimal(v)), false);
                    Ok(JsonValue::Decimal(v))
                }
                None => Err(self.err(format!("Input string '{text}' is not a valid decimal."))),
            },
            ReadMode::Bytes => {
                Err(self.err(format!("Unexpected token when reading bytes: {}.", self.token)))
            }
            ReadMode::Str => {
                // Numbers read as strings surface their raw text unvalidated.
                self.set_token(
                    JsonToken::String,
                    Some(JsonValue::Str(text.to_string())),
                    false,
                );
                Ok(JsonValue::Str(text.to_string()))
            }
            ReadMode::Date => unreachable!("digits rejected before number scan in date mode"),
        }
    }

    /// Number-to-token conversion for plain reads; errors on spans no
    /// interpretation accepts.
    fn number_token_plain(
        &mut self,
        text: &str,
        kind: NumKind,
    ) -> Result<(JsonToken, JsonValue), ReaderError> {
        let (token, value) = self.number_token_plain_lenient(text, kind);
        match value {
            Some(v) => Ok((token, v)),
            None => {
                let message = match self.options.float_parse_handling {
                    FloatParseHandling::Decimal if kind == NumKind::Float => {
                        format!("Input string '{text}' is not a valid decimal.")
                    }
                    _ => format!("Input string '{text}' is not a valid number."),
                };
                Err(self.err(message))
            }
        }
    }

    fn number_token_plain_lenient(
        &mut self,
        text: &str,
        kind: NumKind,
    ) -> (JsonToken, Option<JsonValue>) {
        match kind {
            NumKind::Int => match text.parse::<i64>() {
                Ok(i) => (JsonToken::Integer, Some(JsonValue::Int(i))),
                Err(_) => match BigInt::from_str(text) {
                    Ok(b) => (JsonToken::Integer, Some(JsonValue::BigInt(b))),
                    Err(_) => (JsonToken::Integer, None),
                },
            },
            NumKind::Float => match self.options.float_parse_handling {
                FloatParseHandling::Double => match text.parse::<f64>() {
                    Ok(f) => (JsonToken::Float, Some(JsonValue::Float(f))),
                    Err(_) => (JsonToken::Float, None),
                },
                FloatParseHandling::Decimal => match parse_decimal(text) {
                    Some(d) => (JsonToken::Float, Some(JsonValue::Decimal(d))),
                    None => (JsonToken::Float, None),
                },
            },
            NumKind::NonBase10 => match parse_non_base10(text) {
                Some(i) => (JsonToken::Integer, Some(JsonValue::Int(i))),
                None => (JsonToken::Integer, None),
            },
        }
    }

    // ---------------------------------------------------------- byte arrays

    fn collect_byte_array(&mut self) -> Result<Option<Vec<u8>>, ReaderError> {
        let result = self.collect_byte_array_inner();
        // Only a transient source fault keeps the partial result around for
        // a retry; hard errors discard it.
        if let Err(e) = &result {
            if !matches!(e, ReaderError::Io(_)) {
                self.pending_bytes = None;
            }
        }
        result
    }

    fn collect_byte_array_inner(&mut self) -> Result<Option<Vec<u8>>, ReaderError> {
        loop {
            let more = self.read()?;
            if !more {
                let err = self.scanner.syntax(
                    "Unexpected end when reading bytes.",
                    self.scanner.column(),
                );
                return Err(self.scan_err(err));
            }
            match (self.token, &self.value) {
                (JsonToken::Integer, Some(JsonValue::Int(i))) => match u8::try_from(*i) {
                    Ok(b) => self
                        .pending_bytes
                        .as_mut()
                        .expect("byte array in progress")
                        .push(b),
                    Err(_) => {
                        return Err(
                            self.err(format!("JSON integer {i} is too large or small for a Byte."))
                        );
                    }
                },
                (JsonToken::Comment, _) => {}
                (JsonToken::EndArray, _) => {
                    let bytes = self.pending_bytes.take().expect("byte array in progress");
                    self.set_token(JsonToken::Bytes, Some(JsonValue::Bytes(bytes.clone())), false);
                    return Ok(Some(bytes));
                }
                (token, _) => {
                    return Err(
                        self.err(format!("Unexpected token when reading bytes: {token}."))
                    );
                }
            }
        }
    }

    // ---------------------------------------------------- structural parsing

    fn parse_property(&mut self) -> Result<bool, ReaderError> {
        if let Some(name) = self.pending_name.take() {
            return self.finish_property(name);
        }
        if let Some(raw) = self.resume_scan()? {
            return match raw {
                RawToken::Comment(text) => {
                    self.set_token(JsonToken::Comment, Some(JsonValue::Str(text)), false);
                    Ok(true)
                }
                RawToken::Str(name) | RawToken::UnquotedName(name) => self.finish_property(name),
                _ => unreachable!("only names and comments scan in property position"),
            };
        }
        let next = self.skip_ws()?;
        let Some(c) = next else {
            return Err(self.scan_err(self.scanner.unexpected_end()));
        };
        match c {
            '}' => {
                self.consume()?;
                self.end_container(JsonToken::EndObject, ContainerKind::Object)?;
                Ok(true)
            }
            '"' | '\'' => {
                let raw = self.scan(|s| s.start_string(c))?;
                let RawToken::Str(name) = raw else {
                    unreachable!()
                };
                self.finish_property(name)
            }
            '/' => {
                let raw = self.scan(|s| s.start_comment())?;
                let RawToken::Comment(text) = raw else {
                    unreachable!()
                };
                self.set_token(JsonToken::Comment, Some(JsonValue::Str(text)), false);
                Ok(true)
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let raw = self.scan(Scanner::start_unquoted_name)?;
                let RawToken::UnquotedName(name) = raw else {
                    unreachable!()
                };
                self.finish_property(name)
            }
            c => {
                let err = self.scanner.syntax(
                    format!("Invalid property identifier character: {c}."),
                    self.scanner.column(),
                );
                Err(self.scan_err(err))
            }
        }
    }

    /// The name is scanned; consume the `:` and surface the token. A fault
    /// in between parks the name in `pending_name`.
    fn finish_property(&mut self, name: String) -> Result<bool, ReaderError> {
        self.pending_name = Some(name);
        let next = self.skip_ws()?;
        match next {
            None => Err(self.scan_err(self.scanner.unexpected_end())),
            Some(':') => {
                self.consume()?;
                let name = self.pending_name.take().expect("name parked above");
                if let Some(cur) = &mut self.current {
                    cur.property_name = Some(name.clone());
                }
                self.set_token(JsonToken::PropertyName, Some(JsonValue::Str(name)), false);
                self.state = ReadState::Property;
                Ok(true)
            }
            Some(c) => {
                let err = self.scanner.syntax(
                    format!("Invalid character after parsing property name. Expected ':' but got: {c}."),
                    self.scanner.column(),
                );
                Err(self.scan_err(err))
            }
        }
    }

    /// Separators and container closers after a value. `Ok(Some(flow))`
    /// surfaces a result; `Ok(None)` consumed a separator, keep going.
    fn parse_post_value(&mut self) -> Result<Option<bool>, ReaderError> {
        if let Some(raw) = self.resume_scan()? {
            let RawToken::Comment(text) = raw else {
                unreachable!("only comments scan in post-value position")
            };
            self.set_token(JsonToken::Comment, Some(JsonValue::Str(text)), false);
            return Ok(Some(true));
        }
        let next = self.skip_ws()?;
        let Some(c) = next else {
            self.set_token(JsonToken::None, None, false);
            return Ok(Some(false));
        };
        match c {
            ',' => {
                self.consume()?;
                self.state = match self.current.as_ref().map(|p| p.kind) {
                    Some(ContainerKind::Object) => ReadState::Object,
                    Some(ContainerKind::Array) => ReadState::Array,
                    Some(ContainerKind::Constructor) => ReadState::Constructor,
                    None => unreachable!("post-value outside a container is Finished"),
                };
                Ok(None)
            }
            '}' => {
                self.consume()?;
                self.end_container(JsonToken::EndObject, ContainerKind::Object)?;
                Ok(Some(true))
            }
            ']' => {
                self.consume()?;
                self.end_container(JsonToken::EndArray, ContainerKind::Array)?;
                Ok(Some(true))
            }
            ')' => {
                self.consume()?;
                self.end_container(JsonToken::EndConstructor, ContainerKind::Constructor)?;
                Ok(Some(true))
            }
            '/' => {
                let raw = self.scan(|s| s.start_comment())?;
                let RawToken::Comment(text) = raw else {
                    unreachable!()
                };
                self.set_token(JsonToken::Comment, Some(JsonValue::Str(text)), false);
                Ok(Some(true))
            }
            c => {
                let err = self.scanner.syntax(
                    format!("After parsing a value an unexpected character was encountered: {c}."),
                    self.scanner.column(),
                );
                Err(self.scan_err(err))
            }
        }
    }

    /// After the root value: trailing comments, end of input, or (with
    /// multiple-content support) the start of the next document. `Ok(None)`
    /// means the caller's loop should re-dispatch.
    fn parse_finished(&mut self) -> Result<Option<bool>, ReaderError> {
        if let Some(raw) = self.resume_scan()? {
            let RawToken::Comment(text) = raw else {
                unreachable!("only comments scan after the root value")
            };
            self.set_token(JsonToken::Comment, Some(JsonValue::Str(text)), false);
            return Ok(Some(true));
        }
        let next = self.skip_ws()?;
        let Some(c) = next else {
            self.set_token(JsonToken::None, None, false);
            return Ok(Some(false));
        };
        if c == '/' {
            let raw = self.scan(|s| s.start_comment())?;
            let RawToken::Comment(text) = raw else {
                unreachable!()
            };
            self.set_token(JsonToken::Comment, Some(JsonValue::Str(text)), false);
            return Ok(Some(true));
        }
        if self.options.support_multiple_content {
            self.state = ReadState::Start;
            self.set_token(JsonToken::None, None, false);
            return Ok(None);
        }
        let err = self.scanner.syntax(
            format!("Additional text encountered after finished reading JSON content: {c}."),
            self.scanner.column(),
        );
        Err(self.scan_err(err))
    }

    // ------------------------------------------------------- stack and state

    fn begin_container(
        &mut self,
        kind: ContainerKind,
        token: JsonToken,
    ) -> Result<(), ReaderError> {
        self.mark_value_start();
        let depth_check = match self.current.take() {
            Some(parent) => {
                self.stack.push(parent);
                true
            }
            None => false,
        };
        self.current = Some(JsonPosition::new(kind));
        self.set_token(token, None, false);
        self.state = match kind {
            ContainerKind::Object => ReadState::ObjectStart,
            ContainerKind::Array => ReadState::ArrayStart,
            ContainerKind::Constructor => ReadState::ConstructorStart,
        };
        if depth_check {
            if let Some(max) = self.options.max_depth {
                if self.stack.len() + 1 > max && !self.exceeded_max_depth {
                    self.exceeded_max_depth = true;
                    tracing::debug!(max_depth = max, path = %self.path(), "max depth exceeded");
                    return Err(
                        self.err(format!("The reader's MaxDepth of {max} has been exceeded."))
                    );
                }
            }
        }
        Ok(())
    }

    fn end_container(
        &mut self,
        token: JsonToken,
        expected: ContainerKind,
    ) -> Result<(), ReaderError> {
        match self.current.as_ref() {
            Some(p) if p.kind == expected => {}
            Some(p) => {
                return Err(self.err(format!(
                    "JsonToken {token} is not valid for closing JsonType {}.",
                    p.kind.name()
                )));
            }
            None => {
                return Err(self.err(format!(
                    "JsonToken {token} is not valid for closing JsonType None."
                )));
            }
        }
        self.current = self.stack.pop();
        self.set_token(token, None, false);
        self.state = if self.current.is_none() {
            ReadState::Finished
        } else {
            ReadState::PostValue
        };
        if let Some(max) = self.options.max_depth {
            let depth = self.stack.len() + usize::from(self.current.is_some());
            if depth <= max {
                self.exceeded_max_depth = false;
            }
        }
        Ok(())
    }

    fn set_token(&mut self, token: JsonToken, value: Option<JsonValue>, update_scope: bool) {
        if update_scope {
            self.mark_value_start();
        }
        self.token = token;
        self.value = value;
    }

    fn mark_value_start(&mut self) {
        if let Some(cur) = &mut self.current {
            cur.value_started();
        }
    }

    fn post_value_state(&self) -> ReadState {
        if self.current.is_none() {
            ReadState::Finished
        } else {
            ReadState::PostValue
        }
    }

    fn in_array_value_position(&self) -> bool {
        matches!(self.state, ReadState::ArrayStart | ReadState::Array)
    }

    fn in_constructor_value_position(&self) -> bool {
        matches!(
            self.state,
            ReadState::ConstructorStart | ReadState::Constructor
        )
    }

    // --------------------------------------------------------------- helpers

    fn check_cancel(&self) -> Result<(), ReaderError> {
        match &self.options.cancel {
            Some(token) if token.is_canceled() => Err(ReaderError::Canceled),
            _ => Ok(()),
        }
    }

    fn scan<T>(
        &mut self,
        op: impl FnOnce(&mut Scanner<R>) -> Result<T, scanner::ScanError>,
    ) -> Result<T, ReaderError> {
        let path = build_path(self.stack.iter().chain(self.current.iter()));
        op(&mut self.scanner).map_err(|e| e.with_path(|| path))
    }

    fn resume_scan(&mut self) -> Result<Option<RawToken>, ReaderError> {
        self.scan(Scanner::resume_pending)
    }

    fn skip_ws(&mut self) -> Result<Option<char>, ReaderError> {
        self.scan(Scanner::skip_whitespace)
    }

    fn consume(&mut self) -> Result<Option<char>, ReaderError> {
        self.scan(Scanner::consume)
    }

    fn scan_err(&self, err: scanner::ScanError) -> ReaderError {
        err.with_path(|| self.path())
    }

    fn err(&self, message: impl Into<String>) -> ReaderError {
        ReaderError::parse(
            message,
            self.path(),
            self.scanner.line(),
            self.scanner.column(),
        )
    }

    fn plain_value_error(&self, c: char) -> ReaderError {
        ReaderError::parse(
            format!("Unexpected character encountered while parsing value: {c}."),
            self.path(),
            self.scanner.line(),
            self.scanner.column().max(1),
        )
    }

    fn detect_date(&self, text: &str) -> Option<JsonDate> {
        if self.options.date_parse_handling == DateParseHandling::None {
            return None;
        }
        parse_date(text)
    }
}

// ------------------------------------------------------------- conversions

fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.contains(['e', 'E']) {
        Decimal::from_scientific(text).ok()
    } else {
        Decimal::from_str(text).ok()
    }
}

/// Hex (`0x2A`) and octal (`052`) integer spans, with an optional sign.
fn parse_non_base10(text: &str) -> Option<i64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if body.len() > 1 && body.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        i64::from_str_radix(body, 8).ok()?
    } else {
        return None;
    };
    Some(if negative { -value } else { value })
}

/// Recognize ISO 8601 (`2000-01-01T01:01:01[.fff][Z|±hh:mm]`) and epoch
/// milliseconds (`/Date(946688461000[+hhmm])/`) date strings.
fn parse_date(text: &str) -> Option<JsonDate> {
    if let Some(inner) = text
        .strip_prefix("/Date(")
        .and_then(|t| t.strip_suffix(")/"))
    {
        if inner.is_empty() {
            return None;
        }
        // Skip a leading sign so negative epochs keep their own minus.
        let split = inner[1..]
            .find(['+', '-'])
            .map_or(inner.len(), |i| i + 1);
        let (ms_text, offset_text) = inner.split_at(split);
        let ms: i64 = ms_text.parse().ok()?;
        let utc = Utc.timestamp_millis_opt(ms).single()?;
        if offset_text.is_empty() {
            return Some(JsonDate::Utc(utc));
        }
        if offset_text.len() != 5 {
            return None;
        }
        let sign: i32 = if offset_text.starts_with('-') { -1 } else { 1 };
        let hours: i32 = offset_text[1..3].parse().ok()?;
        let minutes: i32 = offset_text[3..5].parse().ok()?;
        let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))?;
        return Some(JsonDate::Offset(utc.with_timezone(&offset)));
    }

    let bytes = text.as_bytes();
    if bytes.len() < 19
        || !bytes[..4].iter().all(u8::is_ascii_digit)
        || bytes[4] != b'-'
        || bytes[7] != b'-'
        || bytes[10] != b'T'
        || bytes[13] != b':'
        || bytes[16] != b':'
    {
        return None;
    }
    if let Some(stripped) = text.strip_suffix('Z') {
        let naive = parse_naive(stripped)?;
        return Some(JsonDate::Utc(naive.and_utc()));
    }
    if bytes[19..].iter().any(|b| matches!(b, b'+' | b'-')) {
        return DateTime::parse_from_rfc3339(text).ok().map(JsonDate::Offset);
    }
    parse_naive(text).map(JsonDate::Naive)
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok()
}
