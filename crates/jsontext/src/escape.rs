//! Character classification and string escaping shared by the scanner and
//! the writer.

use std::fmt::Write as _;

use crate::options::StringEscapeHandling;

/// What the escaper decides to do with one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EscapeAction {
    Pass,
    /// Two-character escape, e.g. `\n`; payload is the char after the
    /// backslash.
    Short(char),
    /// One or two `\uXXXX` units (two for characters above U+FFFF, which are
    /// emitted as a surrogate pair and never split).
    Unicode,
}

fn is_html_sensitive(c: char) -> bool {
    matches!(c, '<' | '>' | '&' | '\'' | '"')
}

/// Classify `c` for output inside a string delimited by `quote`.
pub(crate) fn classify(c: char, quote: char, handling: StringEscapeHandling) -> EscapeAction {
    let escape_html = matches!(
        handling,
        StringEscapeHandling::EscapeHtml | StringEscapeHandling::EscapeNonAsciiOrHtml
    );
    let escape_non_ascii = matches!(
        handling,
        StringEscapeHandling::EscapeNonAscii | StringEscapeHandling::EscapeNonAsciiOrHtml
    );

    if escape_html && is_html_sensitive(c) {
        return EscapeAction::Unicode;
    }
    match c {
        '\t' => EscapeAction::Short('t'),
        '\n' => EscapeAction::Short('n'),
        '\r' => EscapeAction::Short('r'),
        '\u{8}' => EscapeAction::Short('b'),
        '\u{c}' => EscapeAction::Short('f'),
        '\\' => EscapeAction::Short('\\'),
        // Line separators are legal JSON but break JavaScript eval.
        '\u{85}' | '\u{2028}' | '\u{2029}' => EscapeAction::Unicode,
        c if c == quote => EscapeAction::Short(quote),
        c if (c as u32) < 0x20 => EscapeAction::Unicode,
        c if escape_non_ascii && !c.is_ascii() => EscapeAction::Unicode,
        _ => EscapeAction::Pass,
    }
}

/// Append the escaped form of `s` to `dst` (no delimiters).
pub(crate) fn escape_into(dst: &mut String, s: &str, quote: char, handling: StringEscapeHandling) {
    for c in s.chars() {
        match classify(c, quote, handling) {
            EscapeAction::Pass => dst.push(c),
            EscapeAction::Short(e) => {
                dst.push('\\');
                dst.push(e);
            }
            EscapeAction::Unicode => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(dst, "\\u{unit:04x}");
                }
            }
        }
    }
}

/// The escaped form of `s` with `quote` delimiters.
pub(crate) fn quoted(s: &str, quote: char, handling: StringEscapeHandling) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    escape_into(&mut out, s, quote, handling);
    out.push(quote);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_escapes_controls_and_active_quote() {
        assert_eq!(
            quoted("a\"b'c\n", '"', StringEscapeHandling::Default),
            "\"a\\\"b'c\\n\""
        );
        // With the alternate quote active, the roles flip.
        assert_eq!(
            quoted("a\"b'c\n", '\'', StringEscapeHandling::Default),
            "'a\"b\\'c\\n'"
        );
    }

    #[test]
    fn html_sensitive_chars_use_unicode_escapes() {
        assert_eq!(
            quoted(
                "<script type=\"text/javascript\">alert('hi');</script>",
                '"',
                StringEscapeHandling::EscapeHtml
            ),
            "\"\\u003cscript type=\\u0022text/javascript\\u0022\\u003ealert(\\u0027hi\\u0027);\\u003c/script\\u003e\""
        );
    }

    #[test]
    fn non_ascii_policy_escapes_bmp_char() {
        assert_eq!(
            quoted("\u{5f20}", '"', StringEscapeHandling::EscapeNonAscii),
            "\"\\u5f20\""
        );
    }

    #[test]
    fn astral_chars_escape_as_surrogate_pairs() {
        assert_eq!(
            quoted("\u{1f600}", '"', StringEscapeHandling::EscapeNonAscii),
            "\"\\ud83d\\ude00\""
        );
        // Passed through untouched when no policy requires escaping.
        assert_eq!(
            quoted("\u{1f600}", '"', StringEscapeHandling::Default),
            "\"\u{1f600}\""
        );
    }

    #[test]
    fn control_chars_always_escape() {
        assert_eq!(
            quoted("\u{1}", '"', StringEscapeHandling::Default),
            "\"\\u0001\""
        );
    }
}
