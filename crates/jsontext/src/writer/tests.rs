use std::io;

use super::*;
use crate::cancel::CancelToken;
use crate::pool::BufferPool;
use crate::token::JsonDate;
use chrono::{FixedOffset, TimeZone, Utc};

fn writer(out: &mut Vec<u8>) -> JsonTextWriter<&mut Vec<u8>> {
    JsonTextWriter::new(out)
}

fn indented(out: &mut Vec<u8>) -> JsonTextWriter<&mut Vec<u8>> {
    JsonTextWriter::with_options(
        out,
        WriterOptions {
            formatting: Formatting::Indented,
            ..Default::default()
        },
    )
}

fn text(out: Vec<u8>) -> String {
    String::from_utf8(out).unwrap()
}

#[test]
fn object_with_comment_in_array_indented() {
    let mut out = Vec::new();
    {
        let mut w = indented(&mut out);
        w.write_start_object().unwrap();
        w.write_property_name("CPU").unwrap();
        w.write_value("Intel").unwrap();
        w.write_property_name("PSU").unwrap();
        w.write_value("500W").unwrap();
        w.write_property_name("Drives").unwrap();
        w.write_start_array().unwrap();
        w.write_value("DVD read/writer").unwrap();
        w.write_comment("(broken)").unwrap();
        w.write_value("500 gigabyte hard drive").unwrap();
        w.write_value("200 gigabype hard drive").unwrap();
        w.write_end_object().unwrap();
        assert_eq!(w.write_state(), WriteState::Start);
    }
    assert_eq!(
        text(out),
        "{\n  \"CPU\": \"Intel\",\n  \"PSU\": \"500W\",\n  \"Drives\": [\n    \"DVD read/writer\"\n    /*(broken)*/,\n    \"500 gigabyte hard drive\",\n    \"200 gigabype hard drive\"\n  ]\n}"
    );
}

#[test]
fn close_auto_completes_open_containers() {
    let mut out = Vec::new();
    {
        let mut w = indented(&mut out);
        w.write_start_object().unwrap();
        w.write_property_name("Drives").unwrap();
        w.write_start_array().unwrap();
        w.write_value("DVD read/writer").unwrap();
        w.close().unwrap();
        assert_eq!(w.write_state(), WriteState::Closed);
    }
    assert_eq!(
        text(out),
        "{\n  \"Drives\": [\n    \"DVD read/writer\"\n  ]\n}"
    );
}

#[test]
fn drop_closes_quietly() {
    let mut out = Vec::new();
    {
        let mut w = writer(&mut out);
        w.write_start_array().unwrap();
        w.write_value(1).unwrap();
        // No close; Drop completes the array.
    }
    assert_eq!(text(out), "[1]");
}

#[test]
fn unquoted_property_names() {
    let mut out = Vec::new();
    {
        let mut w = JsonTextWriter::with_options(
            &mut out,
            WriterOptions {
                quote_name: false,
                ..Default::default()
            },
        );
        w.write_start_object().unwrap();
        w.write_property_name("name").unwrap();
        w.write_value("value").unwrap();
        w.write_end_object().unwrap();
    }
    assert_eq!(text(out), "{name:\"value\"}");
}

#[test]
fn indentation_settings_apply_mid_stream() {
    let mut out = Vec::new();
    {
        let mut w = indented(&mut out);
        w.set_float_format_handling(FloatFormatHandling::Symbol);
        w.set_indentation(5);
        w.set_indent_char('_');
        w.set_quote_char('\'');

        w.write_start_object().unwrap();
        w.write_property_name("propertyName").unwrap();
        w.write_f64(f64::NAN).unwrap();

        w.set_indent_char('?');
        w.set_indentation(6);

        w.write_property_name("prop2").unwrap();
        w.write_value(123).unwrap();
        w.write_end_object().unwrap();
    }
    assert_eq!(
        text(out),
        "{\n_____'propertyName': NaN,\n??????'prop2': 123\n}"
    );
}

#[test]
fn non_finite_floats_as_symbols() {
    let mut out = Vec::new();
    {
        let mut w = JsonTextWriter::with_options(
            &mut out,
            WriterOptions {
                float_format_handling: FloatFormatHandling::Symbol,
                ..Default::default()
            },
        );
        w.write_start_array().unwrap();
        w.write_f64(f64::NAN).unwrap();
        w.write_f64(f64::INFINITY).unwrap();
        w.write_f64(f64::NEG_INFINITY).unwrap();
        w.write_end_array().unwrap();
    }
    assert_eq!(text(out), "[NaN,Infinity,-Infinity]");
}

#[test]
fn non_finite_floats_as_strings() {
    let mut out = Vec::new();
    {
        let mut w = writer(&mut out);
        w.write_start_array().unwrap();
        w.write_f64(f64::NAN).unwrap();
        w.write_f32(f32::INFINITY).unwrap();
        w.write_end_array().unwrap();
    }
    assert_eq!(text(out), "[\"NaN\",\"Infinity\"]");
}

#[test]
fn non_finite_floats_as_default_values() {
    let mut out = Vec::new();
    {
        let mut w = JsonTextWriter::with_options(
            &mut out,
            WriterOptions {
                float_format_handling: FloatFormatHandling::DefaultValue,
                ..Default::default()
            },
        );
        w.write_start_array().unwrap();
        w.write_f64(f64::NAN).unwrap();
        w.write_f64(f64::INFINITY).unwrap();
        w.write_f64_option(Some(f64::NAN)).unwrap();
        w.write_f64_option(None).unwrap();
        w.write_end_array().unwrap();
    }
    assert_eq!(text(out), "[0.0,0.0,null,null]");
}

#[test]
fn non_finite_strings_use_the_configured_quote_char() {
    let mut out = Vec::new();
    {
        let mut w = JsonTextWriter::with_options(
            &mut out,
            WriterOptions {
                quote_char: '\'',
                ..Default::default()
            },
        );
        w.write_f64(f64::NAN).unwrap();
    }
    assert_eq!(text(out), "'NaN'");
}

#[test]
fn integer_formatting_covers_the_full_unsigned_range() {
    let mut out = Vec::new();
    {
        let mut w = writer(&mut out);
        w.write_start_array().unwrap();
        w.write_value(i32::MAX).unwrap();
        w.write_value(i32::MIN).unwrap();
        w.write_value(0).unwrap();
        w.write_i64(i64::MAX).unwrap();
        w.write_i64(i64::MIN).unwrap();
        w.write_u64(u64::MAX).unwrap();
        w.write_u64(u64::MIN).unwrap();
        w.write_value(u64::MAX).unwrap();
        w.write_end_array().unwrap();
    }
    assert_eq!(
        text(out),
        "[2147483647,-2147483648,0,9223372036854775807,-9223372036854775808,18446744073709551615,0,18446744073709551615]"
    );
}

#[test]
fn float_and_decimal_formatting() {
    let mut out = Vec::new();
    {
        let mut w = writer(&mut out);
        w.write_start_array().unwrap();
        w.write_f64(0.0).unwrap();
        w.write_f64(1.0).unwrap();
        w.write_f64(0.1).unwrap();
        w.write_f64(1.000001).unwrap();
        w.write_decimal("0.000000000000000001".parse().unwrap()).unwrap();
        w.write_decimal("10".parse().unwrap()).unwrap();
        w.write_f32(0.5).unwrap();
        w.write_end_array().unwrap();
    }
    assert_eq!(
        text(out),
        "[0.0,1.0,0.1,1.000001,0.000000000000000001,10.0,0.5]"
    );
}

#[test]
fn string_escaping_matches_input_quirks() {
    let mut out = Vec::new();
    {
        let mut w = writer(&mut out);
        w.write_start_array().unwrap();
        w.write_value("\"These pretzels are making me thirsty!\"").unwrap();
        w.write_value("Jeff's house was burninated.").unwrap();
        w.write_value("35% of\t statistics\n are made\r up.").unwrap();
        w.write_end_array().unwrap();
    }
    assert_eq!(
        text(out),
        "[\"\\\"These pretzels are making me thirsty!\\\"\",\"Jeff's house was burninated.\",\"35% of\\t statistics\\n are made\\r up.\"]"
    );
}

#[test]
fn html_escape_handling_round_trips_through_the_reader() {
    let mut out = Vec::new();
    {
        let mut w = JsonTextWriter::with_options(
            &mut out,
            WriterOptions {
                string_escape_handling: StringEscapeHandling::EscapeHtml,
                ..Default::default()
            },
        );
        w.write_value("<script type=\"text/javascript\">alert('hi');</script>")
            .unwrap();
    }
    let json = text(out);
    assert_eq!(
        json,
        "\"\\u003cscript type=\\u0022text/javascript\\u0022\\u003ealert(\\u0027hi\\u0027);\\u003c/script\\u003e\""
    );
    let mut r = crate::reader::JsonTextReader::new(json.as_bytes());
    assert_eq!(
        r.read_as_string().unwrap().as_deref(),
        Some("<script type=\"text/javascript\">alert('hi');</script>")
    );
}

#[test]
fn non_ascii_escape_handling() {
    let mut out = Vec::new();
    {
        let mut w = JsonTextWriter::with_options(
            &mut out,
            WriterOptions {
                string_escape_handling: StringEscapeHandling::EscapeNonAscii,
                ..Default::default()
            },
        );
        w.write_value("\u{5f20}").unwrap();
    }
    assert_eq!(text(out), "\"\\u5f20\"");
}

#[test]
fn write_end_closes_inner_containers_down_to_the_requested_kind() {
    let mut out = Vec::new();
    {
        let mut w = writer(&mut out);
        w.write_start_object().unwrap();
        w.write_property_name("a").unwrap();
        w.write_start_array().unwrap();
        w.write_value(1).unwrap();
        // Closes the array, then the object.
        w.write_end_object().unwrap();
        assert_eq!(w.write_state(), WriteState::Start);
    }
    assert_eq!(text(out), "{\"a\":[1]}");
}

#[test]
fn write_end_on_dangling_property_completes_with_null() {
    let mut out = Vec::new();
    {
        let mut w = JsonTextWriter::with_options(
            &mut out,
            WriterOptions {
                quote_char: '\'',
                ..Default::default()
            },
        );
        w.write_start_object().unwrap();
        w.write_property_name("Blah").unwrap();
        w.write_end().unwrap();
    }
    assert_eq!(text(out), "{'Blah':null}");
}

#[test]
fn closing_with_nothing_open_errors() {
    let mut out = Vec::new();
    let mut w = writer(&mut out);
    w.write_start_array().unwrap();
    w.write_f64(0.0).unwrap();
    w.write_end_array().unwrap();
    assert_eq!(
        w.write_end_array().unwrap_err().to_string(),
        "No token to close. Path ''."
    );
}

#[test]
fn value_where_a_property_name_is_required_errors() {
    let mut out = Vec::new();
    let mut w = writer(&mut out);
    w.write_start_object().unwrap();
    let err = w.write_value(1).unwrap_err().to_string();
    assert_eq!(
        err,
        "Token Integer in state Object would result in an invalid JSON object. Path ''."
    );
    assert_eq!(w.write_state(), WriteState::Error);
}

#[test]
fn path_tracking_through_nested_containers() {
    let mut out = Vec::new();
    let mut w = writer(&mut out);

    w.write_start_array().unwrap();
    assert_eq!(w.path(), "");
    w.write_start_object().unwrap();
    assert_eq!(w.path(), "[0]");
    w.write_property_name("Property1").unwrap();
    assert_eq!(w.path(), "[0].Property1");
    w.write_start_array().unwrap();
    assert_eq!(w.path(), "[0].Property1");
    w.write_value(1).unwrap();
    assert_eq!(w.path(), "[0].Property1[0]");
    w.write_start_array().unwrap();
    assert_eq!(w.path(), "[0].Property1[1]");
    w.write_start_array().unwrap();
    assert_eq!(w.path(), "[0].Property1[1][0]");
    w.write_end_object().unwrap();
    assert_eq!(w.path(), "[0]");
    w.write_start_object().unwrap();
    assert_eq!(w.path(), "[1]");
    w.write_property_name("Property2").unwrap();
    assert_eq!(w.path(), "[1].Property2");
    w.write_start_constructor("Constructor1").unwrap();
    assert_eq!(w.path(), "[1].Property2");
    w.write_null().unwrap();
    assert_eq!(w.path(), "[1].Property2[0]");
    w.write_start_array().unwrap();
    assert_eq!(w.path(), "[1].Property2[1]");
    w.write_value(1).unwrap();
    assert_eq!(w.path(), "[1].Property2[1][0]");
    w.write_end().unwrap();
    assert_eq!(w.path(), "[1].Property2[1]");
    w.write_end_object().unwrap();
    assert_eq!(w.path(), "[1]");
    w.write_end_array().unwrap();
    assert_eq!(w.path(), "");
}

#[test]
fn constructor_nested_in_object() {
    let mut out = Vec::new();
    {
        let mut w = writer(&mut out);
        w.write_start_object().unwrap();
        w.write_property_name("con").unwrap();
        w.write_start_constructor("Ext.data.JsonStore").unwrap();
        w.write_start_object().unwrap();
        w.write_property_name("aa").unwrap();
        w.write_value("aa").unwrap();
        w.write_end_object().unwrap();
        w.write_end_constructor().unwrap();
        w.write_end_object().unwrap();
    }
    assert_eq!(text(out), "{\"con\":new Ext.data.JsonStore({\"aa\":\"aa\"})}");
}

#[test]
fn raw_values_carry_separators() {
    let mut out = Vec::new();
    {
        let mut w = writer(&mut out);
        w.write_start_object().unwrap();
        for i in 0..3 {
            w.write_property_name(&format!("d{i}")).unwrap();
            w.write_raw_value("[1,2]").unwrap();
        }
        w.write_end_object().unwrap();
    }
    assert_eq!(text(out), "{\"d0\":[1,2],\"d1\":[1,2],\"d2\":[1,2]}");
}

#[test]
fn bytes_write_as_base64() {
    let mut out = Vec::new();
    {
        let mut w = writer(&mut out);
        w.write_start_array().unwrap();
        w.write_bytes(b"Hello world.").unwrap();
        w.write_value(b"Hello world.".to_vec()).unwrap();
        w.write_end_array().unwrap();
    }
    assert_eq!(text(out), "[\"SGVsbG8gd29ybGQu\",\"SGVsbG8gd29ybGQu\"]");
}

#[test]
fn date_formats() {
    let utc = Utc.with_ymd_and_hms(2000, 1, 1, 1, 1, 1).unwrap();
    let offset = FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2000, 1, 1, 1, 1, 1)
        .unwrap();

    let mut out = Vec::new();
    {
        let mut w = JsonTextWriter::with_options(
            &mut out,
            WriterOptions {
                quote_char: '\'',
                ..Default::default()
            },
        );
        w.write_start_array().unwrap();
        w.write_date(JsonDate::Utc(utc)).unwrap();
        w.write_date(JsonDate::Offset(offset)).unwrap();
        w.set_date_format_handling(DateFormatHandling::MicrosoftDateFormat);
        w.write_date(JsonDate::Utc(utc)).unwrap();
        w.write_date(JsonDate::Offset(offset)).unwrap();
        w.set_date_format_string(Some("%Y".into()));
        w.write_date(JsonDate::Utc(utc)).unwrap();
        w.write_end_array().unwrap();
    }
    assert_eq!(
        text(out),
        "['2000-01-01T01:01:01Z','2000-01-01T01:01:01+00:00','\\/Date(946688461000)\\/','\\/Date(946688461000+0000)\\/','2000']"
    );
}

#[test]
fn date_with_positive_offset_in_microsoft_format() {
    let offset = FixedOffset::east_opt(9 * 3600 + 30 * 60)
        .unwrap()
        .with_ymd_and_hms(2000, 1, 1, 1, 1, 1)
        .unwrap();
    let mut out = Vec::new();
    {
        let mut w = JsonTextWriter::with_options(
            &mut out,
            WriterOptions {
                date_format_handling: DateFormatHandling::MicrosoftDateFormat,
                ..Default::default()
            },
        );
        w.write_date(JsonDate::Offset(offset)).unwrap();
    }
    // 2000-01-01T01:01:01+09:30 is 1999-12-31T15:31:01Z.
    assert_eq!(text(out), "\"\\/Date(946654261000+0930)\\/\"");
}

#[test]
fn write_token_direct_sequence() {
    let mut out = Vec::new();
    {
        let mut w = writer(&mut out);
        w.write_token(JsonToken::StartArray, None).unwrap();
        w.write_token(JsonToken::Integer, Some(JsonValue::Int(1))).unwrap();
        w.write_token(JsonToken::StartObject, None).unwrap();
        w.write_token(
            JsonToken::PropertyName,
            Some(JsonValue::Str("string".into())),
        )
        .unwrap();
        w.write_token(JsonToken::Integer, Some(JsonValue::Int(i64::from(i32::MAX))))
            .unwrap();
        w.write_token(JsonToken::EndObject, None).unwrap();
        w.write_token(JsonToken::EndArray, None).unwrap();
    }
    assert_eq!(text(out), "[1,{\"string\":2147483647}]");
}

#[test]
fn write_token_bad_value_is_a_format_error() {
    let mut out = Vec::new();
    let mut w = writer(&mut out);
    w.write_token(JsonToken::StartArray, None).unwrap();
    assert_eq!(
        w.write_token(JsonToken::Integer, Some(JsonValue::Str("three".into())))
            .unwrap_err()
            .to_string(),
        "Input string was not in a correct format."
    );
}

#[test]
fn write_token_missing_value_names_the_parameter() {
    let mut out = Vec::new();
    let mut w = writer(&mut out);
    w.write_token(JsonToken::StartArray, None).unwrap();
    assert_eq!(
        w.write_token(JsonToken::Integer, None)
            .unwrap_err()
            .to_string(),
        "Value cannot be null. Parameter name: value"
    );
}

#[test]
fn write_token_from_reader_scalar() {
    let mut reader = crate::reader::JsonTextReader::new("[1,2,3,4,5]".as_bytes());
    reader.read().unwrap();
    reader.read().unwrap();

    let mut out = Vec::new();
    {
        let mut w = writer(&mut out);
        w.write_token_from(&mut reader, true).unwrap();
    }
    assert_eq!(text(out), "1");
}

#[test]
fn write_token_from_reader_subtree() {
    let json = r#"{"a":[1,{"b":null}],"c":new Thing(true)}"#;
    let mut reader = crate::reader::JsonTextReader::new(json.as_bytes());
    reader.read().unwrap();

    let mut out = Vec::new();
    {
        let mut w = writer(&mut out);
        w.write_token_from(&mut reader, true).unwrap();
    }
    assert_eq!(text(out), json);
}

#[test]
fn write_value_option_maps_none_to_null() {
    let mut out = Vec::new();
    {
        let mut w = writer(&mut out);
        w.write_start_array().unwrap();
        w.write_value(Option::<i32>::None).unwrap();
        w.write_value(Some('c')).unwrap();
        w.write_value(Option::<bool>::Some(true)).unwrap();
        w.write_end_array().unwrap();
    }
    assert_eq!(text(out), "[null,\"c\",true]");
}

// ------------------------------------------------------------ custom emitter

struct ShoutingEmitter;

impl TokenEmitter for ShoutingEmitter {
    fn start_object(&mut self, out: &mut dyn io::Write) -> io::Result<()> {
        out.write_all(b"{{{")
    }

    fn end_object(&mut self, out: &mut dyn io::Write) -> io::Result<()> {
        out.write_all(b"}}}")
    }

    fn property_name(
        &mut self,
        out: &mut dyn io::Write,
        name: &str,
        ctx: &EmitContext,
    ) -> io::Result<()> {
        let reversed: String = name.chars().rev().collect();
        DefaultEmitter.property_name(out, &reversed, ctx)
    }

    fn null(&mut self, out: &mut dyn io::Write) -> io::Result<()> {
        out.write_all(b"NULL!!!")
    }
}

#[test]
fn custom_emitter_transforms_output_without_touching_state() {
    let mut out = Vec::new();
    {
        let mut w = JsonTextWriter::with_emitter(
            &mut out,
            WriterOptions {
                formatting: Formatting::Indented,
                ..Default::default()
            },
            ShoutingEmitter,
        );
        w.write_start_object().unwrap();
        assert_eq!(w.write_state(), WriteState::Object);
        w.write_property_name("Property1").unwrap();
        assert_eq!(w.write_state(), WriteState::Property);
        assert_eq!(w.path(), "Property1");
        w.write_null().unwrap();
        assert_eq!(w.write_state(), WriteState::Object);
        w.write_end_object().unwrap();
        assert_eq!(w.write_state(), WriteState::Start);
    }
    assert_eq!(text(out), "{{{\n  \"1ytreporP\": NULL!!!\n}}}");
}

// -------------------------------------------------------- pool and cancel

#[derive(Debug, Default)]
struct CountingPool {
    outstanding: std::sync::atomic::AtomicUsize,
}

impl CountingPool {
    fn outstanding(&self) -> usize {
        self.outstanding.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl BufferPool for CountingPool {
    fn rent(&self, min_capacity: usize) -> Vec<u8> {
        self.outstanding
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Vec::with_capacity(min_capacity)
    }

    fn give_back(&self, _buf: Vec<u8>) {
        self.outstanding
            .fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
    }
}

#[test]
fn borrowed_buffers_are_returned_even_when_the_sink_fails() {
    struct Sink {
        budget: usize,
    }
    impl io::Write for Sink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf.len() > self.budget {
                return Err(io::Error::other("sink full"));
            }
            self.budget -= buf.len();
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let pool = std::sync::Arc::new(CountingPool::default());
    {
        let mut w = JsonTextWriter::with_options(
            Sink { budget: 2 },
            WriterOptions {
                buffer_pool: Some(pool.clone()),
                ..Default::default()
            },
        );
        w.write_start_array().unwrap();
        // The base64 text no longer fits the sink budget; the write fails
        // mid-value but the leased buffer still goes back.
        let err = w.write_bytes(&[1, 2, 3, 4, 5, 6]).unwrap_err();
        assert!(matches!(err, WriterError::Io(_)));
        assert_eq!(pool.outstanding(), 0);
    }
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn pre_canceled_write_leaves_the_sink_untouched() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut out = Vec::new();
    {
        let mut w = JsonTextWriter::with_options(
            &mut out,
            WriterOptions {
                cancel: Some(cancel),
                ..Default::default()
            },
        );
        assert!(matches!(
            w.write_start_object(),
            Err(WriterError::Canceled)
        ));
        assert!(matches!(w.write_value(1), Err(WriterError::Canceled)));
        assert_eq!(w.write_state(), WriteState::Start);
        // Drop: close writes nothing since no container ever opened.
    }
    assert!(out.is_empty());
}

#[test]
fn comment_between_property_and_value_gets_a_space() {
    let mut out = Vec::new();
    {
        let mut w = indented(&mut out);
        w.write_start_object().unwrap();
        w.write_property_name("Name").unwrap();
        w.write_comment("comment").unwrap();
        w.write_value(true).unwrap();
        w.write_end_object().unwrap();
    }
    assert_eq!(text(out), "{\n  \"Name\": /*comment*/ true\n}");
}

#[test]
fn comment_placement_non_indented() {
    let mut out = Vec::new();
    {
        let mut w = writer(&mut out);
        w.write_comment("root").unwrap();
        w.write_start_array().unwrap();
        w.write_value(1).unwrap();
        w.write_comment("after").unwrap();
        w.write_value(2).unwrap();
        w.write_end_array().unwrap();
    }
    assert_eq!(text(out), "/*root*/[1/*after*/,2]");
}
