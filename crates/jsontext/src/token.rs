//! Token kinds and payload values produced by the reader and consumed by the
//! writer.

use core::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use num_bigint::BigInt;
use rust_decimal::Decimal;

/// One classified unit of JSON syntax.
///
/// A token is either a structural marker (`StartObject`, `EndArray`, ...) or
/// a scalar value carrier. The payload for value-carrying kinds lives in
/// [`JsonValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonToken {
    /// No token has been read yet, or the end of content was reached.
    None,
    StartObject,
    StartArray,
    /// `new Identifier(` constructor syntax.
    StartConstructor,
    PropertyName,
    Comment,
    /// Raw JSON text passed through verbatim (writer only).
    Raw,
    Integer,
    Float,
    String,
    Boolean,
    Null,
    Undefined,
    EndObject,
    EndArray,
    EndConstructor,
    Date,
    Bytes,
}

impl JsonToken {
    /// `StartObject`, `StartArray` or `StartConstructor`.
    #[must_use]
    pub fn is_start(self) -> bool {
        matches!(
            self,
            JsonToken::StartObject | JsonToken::StartArray | JsonToken::StartConstructor
        )
    }

    /// `EndObject`, `EndArray` or `EndConstructor`.
    #[must_use]
    pub fn is_end(self) -> bool {
        matches!(
            self,
            JsonToken::EndObject | JsonToken::EndArray | JsonToken::EndConstructor
        )
    }

    /// Whether this kind carries a scalar payload.
    #[must_use]
    pub fn is_value(self) -> bool {
        matches!(
            self,
            JsonToken::Integer
                | JsonToken::Float
                | JsonToken::String
                | JsonToken::Boolean
                | JsonToken::Null
                | JsonToken::Undefined
                | JsonToken::Date
                | JsonToken::Bytes
                | JsonToken::Raw
        )
    }
}

impl fmt::Display for JsonToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Diagnostic messages spell out the variant name.
        let name = match self {
            JsonToken::None => "None",
            JsonToken::StartObject => "StartObject",
            JsonToken::StartArray => "StartArray",
            JsonToken::StartConstructor => "StartConstructor",
            JsonToken::PropertyName => "PropertyName",
            JsonToken::Comment => "Comment",
            JsonToken::Raw => "Raw",
            JsonToken::Integer => "Integer",
            JsonToken::Float => "Float",
            JsonToken::String => "String",
            JsonToken::Boolean => "Boolean",
            JsonToken::Null => "Null",
            JsonToken::Undefined => "Undefined",
            JsonToken::EndObject => "EndObject",
            JsonToken::EndArray => "EndArray",
            JsonToken::EndConstructor => "EndConstructor",
            JsonToken::Date => "Date",
            JsonToken::Bytes => "Bytes",
        };
        f.write_str(name)
    }
}

/// A date token payload.
///
/// The three variants preserve how much zone information the source text
/// carried, so round-tripping `"...Z"`, `"...+01:00"` and zoneless
/// `"...T12:00:00"` forms does not invent or lose an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonDate {
    Utc(DateTime<Utc>),
    Offset(DateTime<FixedOffset>),
    /// No zone designator in the source text.
    Naive(NaiveDateTime),
}

impl JsonDate {
    /// The instant as UTC, treating a zoneless value as already being UTC.
    #[must_use]
    pub fn to_utc(self) -> DateTime<Utc> {
        match self {
            JsonDate::Utc(d) => d,
            JsonDate::Offset(d) => d.with_timezone(&Utc),
            JsonDate::Naive(d) => d.and_utc(),
        }
    }

    /// The instant with its offset, treating a zoneless value as `+00:00`.
    #[must_use]
    pub fn to_fixed_offset(self) -> DateTime<FixedOffset> {
        match self {
            JsonDate::Utc(d) => d.fixed_offset(),
            JsonDate::Offset(d) => d,
            JsonDate::Naive(d) => d.and_utc().fixed_offset(),
        }
    }
}

/// Scalar payload attached to a token.
///
/// Numbers keep their exact representation: integers that fit `i64` stay
/// `Int`, larger magnitudes become `BigInt`, and floating point values are
/// `Float` or `Decimal` depending on [`FloatParseHandling`]
/// (never silently widened).
///
/// [`FloatParseHandling`]: crate::options::FloatParseHandling
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    Null,
    Undefined,
    Bool(bool),
    Int(i64),
    BigInt(BigInt),
    Float(f64),
    Decimal(Decimal),
    Str(String),
    Bytes(Vec<u8>),
    Date(JsonDate),
    /// Raw JSON text (writer pass-through).
    Raw(String),
}

impl JsonValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::Str(s) | JsonValue::Raw(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            JsonValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            JsonValue::Float(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            JsonValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for JsonValue {
    fn from(v: bool) -> Self {
        JsonValue::Bool(v)
    }
}

macro_rules! impl_from_int_for_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for JsonValue {
                fn from(v: $t) -> Self {
                    JsonValue::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int_for_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for JsonValue {
    fn from(v: u64) -> Self {
        // u64 values beyond i64::MAX must not be squeezed through a signed
        // representation.
        match i64::try_from(v) {
            Ok(i) => JsonValue::Int(i),
            Err(_) => JsonValue::BigInt(BigInt::from(v)),
        }
    }
}

impl From<f64> for JsonValue {
    fn from(v: f64) -> Self {
        JsonValue::Float(v)
    }
}

impl From<f32> for JsonValue {
    fn from(v: f32) -> Self {
        JsonValue::Float(f64::from(v))
    }
}

impl From<BigInt> for JsonValue {
    fn from(v: BigInt) -> Self {
        JsonValue::BigInt(v)
    }
}

impl From<Decimal> for JsonValue {
    fn from(v: Decimal) -> Self {
        JsonValue::Decimal(v)
    }
}

impl From<&str> for JsonValue {
    fn from(v: &str) -> Self {
        JsonValue::Str(v.to_string())
    }
}

impl From<String> for JsonValue {
    fn from(v: String) -> Self {
        JsonValue::Str(v)
    }
}

impl From<char> for JsonValue {
    fn from(v: char) -> Self {
        JsonValue::Str(v.to_string())
    }
}

impl From<&[u8]> for JsonValue {
    fn from(v: &[u8]) -> Self {
        JsonValue::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for JsonValue {
    fn from(v: Vec<u8>) -> Self {
        JsonValue::Bytes(v)
    }
}

impl From<JsonDate> for JsonValue {
    fn from(v: JsonDate) -> Self {
        JsonValue::Date(v)
    }
}

impl From<DateTime<Utc>> for JsonValue {
    fn from(v: DateTime<Utc>) -> Self {
        JsonValue::Date(JsonDate::Utc(v))
    }
}

impl From<DateTime<FixedOffset>> for JsonValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        JsonValue::Date(JsonDate::Offset(v))
    }
}

impl From<NaiveDateTime> for JsonValue {
    fn from(v: NaiveDateTime) -> Self {
        JsonValue::Date(JsonDate::Naive(v))
    }
}

impl<T: Into<JsonValue>> From<Option<T>> for JsonValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => JsonValue::Null,
        }
    }
}
