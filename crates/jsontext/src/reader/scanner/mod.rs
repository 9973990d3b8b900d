//! Resumable token scanner.
//!
//! The scanner owns the character source and all mid-token progress: the
//! current micro-state, the shared text accumulator and surrogate
//! bookkeeping. Every public operation drives the same state machine one
//! peeked character at a time, so an `Err` return (a transient fault from
//! the source) leaves the partial token intact and
//! [`resume_pending`](Scanner::resume_pending) picks up exactly where the
//! fault hit. End of input is just another peek outcome, never a separate
//! code path.

use std::io::{self, Read};

use crate::error::ReaderError;
use crate::source::CharSource;

/// Completed scanner output. Whether a `Str` is a value or a property name
/// is the reader's call, not the scanner's.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawToken {
    Str(String),
    Number { text: String, kind: NumKind },
    True,
    False,
    Null,
    Undefined,
    NaN,
    PosInfinity,
    NegInfinity,
    Comment(String),
    ConstructorStart(String),
    UnquotedName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumKind {
    Int,
    Float,
    /// Leading-zero span that is not a plain decimal: hex (`0x2A`), octal
    /// (`052`) or malformed (`0f`). Interpretation is context dependent.
    NonBase10,
}

/// Scanner-level failure; the reader attaches the path.
#[derive(Debug)]
pub(crate) enum ScanError {
    Io(io::Error),
    Syntax {
        message: String,
        line: usize,
        position: usize,
    },
}

impl From<io::Error> for ScanError {
    fn from(e: io::Error) -> Self {
        ScanError::Io(e)
    }
}

impl ScanError {
    pub(crate) fn with_path(self, path: impl FnOnce() -> String) -> ReaderError {
        match self {
            ScanError::Io(e) => ReaderError::Io(e),
            ScanError::Syntax {
                message,
                line,
                position,
            } => ReaderError::parse(message, path(), line, position),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LiteralKind {
    Null,
    True,
    False,
    Undefined,
    NaN,
    Infinity,
    NegInfinity,
    /// The `new` keyword; completion continues into constructor scanning
    /// instead of producing a token.
    New,
}

impl LiteralKind {
    fn remaining(self) -> &'static str {
        match self {
            LiteralKind::Null => "ull",
            LiteralKind::True => "rue",
            LiteralKind::False => "alse",
            LiteralKind::Undefined => "ndefined",
            LiteralKind::NaN => "aN",
            LiteralKind::Infinity => "nfinity",
            LiteralKind::NegInfinity => "nfinity",
            LiteralKind::New => "ew",
        }
    }

    fn error_name(self) -> &'static str {
        match self {
            LiteralKind::Null => "null",
            LiteralKind::True | LiteralKind::False => "boolean",
            LiteralKind::Undefined => "undefined",
            LiteralKind::NaN => "NaN",
            LiteralKind::Infinity => "Infinity",
            LiteralKind::NegInfinity => "-Infinity",
            LiteralKind::New => "new",
        }
    }

    fn token(self) -> RawToken {
        match self {
            LiteralKind::Null => RawToken::Null,
            LiteralKind::True => RawToken::True,
            LiteralKind::False => RawToken::False,
            LiteralKind::Undefined => RawToken::Undefined,
            LiteralKind::NaN => RawToken::NaN,
            LiteralKind::Infinity => RawToken::PosInfinity,
            LiteralKind::NegInfinity => RawToken::NegInfinity,
            LiteralKind::New => unreachable!("new completes into constructor scanning"),
        }
    }
}

/// How literal mismatches are reported. Plain reads name the literal
/// ("Error parsing null value."); typed reads consume the offending
/// character and name it instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LiteralPolicy {
    pub(crate) mismatch_names_char: bool,
    pub(crate) trailing_names_char: bool,
}

impl LiteralPolicy {
    pub(crate) const PLAIN: Self = Self {
        mismatch_names_char: false,
        trailing_names_char: false,
    };
    pub(crate) const TYPED_NULL: Self = Self {
        mismatch_names_char: true,
        trailing_names_char: false,
    };
    pub(crate) const TYPED: Self = Self {
        mismatch_names_char: true,
        trailing_names_char: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumStage {
    Sign,
    Zero,
    Int,
    Dot,
    Frac,
    ExpMark,
    ExpSign,
    ExpDigits,
    NonBase10,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Idle,
    Str,
    StrEscape,
    /// `\u` consumed; four hex digits pending.
    StrEscapeUnicode,
    Num(NumStage),
    /// `n` consumed; the next character picks `null` or `new`.
    NDispatch,
    Literal(LiteralKind, LiteralPolicy),
    LiteralTrailing(LiteralKind, LiteralPolicy),
    CommentStart,
    CommentLine,
    CommentBlock,
    CtorAfterNew,
    CtorName,
    CtorAfterName,
    UnquotedName,
}

pub(crate) struct Scanner<R> {
    source: CharSource<R>,
    state: ScanState,
    buf: String,
    quote: char,
    literal_progress: &'static str,
    pending_high_surrogate: Option<u16>,
}

impl<R: Read> Scanner<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            source: CharSource::new(inner),
            state: ScanState::Idle,
            buf: String::new(),
            quote: '"',
            literal_progress: "",
            pending_high_surrogate: None,
        }
    }

    pub(crate) fn into_inner(self) -> R {
        self.source.into_inner()
    }

    pub(crate) fn line(&self) -> usize {
        self.source.line()
    }

    pub(crate) fn column(&self) -> usize {
        self.source.column()
    }

    pub(crate) fn peek(&mut self) -> Result<Option<char>, ScanError> {
        Ok(self.source.peek()?)
    }

    pub(crate) fn consume(&mut self) -> Result<Option<char>, ScanError> {
        Ok(self.source.next()?)
    }

    /// Consume whitespace, returning the first non-whitespace character
    /// still unconsumed (or `None` at end of input).
    pub(crate) fn skip_whitespace(&mut self) -> Result<Option<char>, ScanError> {
        loop {
            match self.source.peek()? {
                Some(c) if c.is_whitespace() => {
                    self.source.next()?;
                }
                other => return Ok(other),
            }
        }
    }

    /// Continue an operation interrupted by a transient fault. Returns
    /// `None` when nothing was in flight.
    pub(crate) fn resume_pending(&mut self) -> Result<Option<RawToken>, ScanError> {
        match self.state {
            ScanState::Idle => Ok(None),
            _ => self.drive().map(Some),
        }
    }

    // ---------------------------------------------------------------- entry

    /// Scan a string delimited by `quote` (the delimiter is still
    /// unconsumed).
    pub(crate) fn start_string(&mut self, quote: char) -> Result<RawToken, ScanError> {
        self.source.next()?;
        self.quote = quote;
        self.buf.clear();
        self.pending_high_surrogate = None;
        self.state = ScanState::Str;
        self.drive()
    }

    /// Scan a number beginning with the unconsumed `first` (`-`, `.` or a
    /// digit).
    pub(crate) fn start_number(&mut self, first: char) -> Result<RawToken, ScanError> {
        self.source.next()?;
        self.buf.clear();
        self.buf.push(first);
        self.state = ScanState::Num(match first {
            '-' => NumStage::Sign,
            '0' => NumStage::Zero,
            '.' => NumStage::Dot,
            _ => NumStage::Int,
        });
        self.drive()
    }

    /// Scan a literal whose unconsumed first character selects `kind`.
    pub(crate) fn start_literal(
        &mut self,
        kind: LiteralKind,
        policy: LiteralPolicy,
    ) -> Result<RawToken, ScanError> {
        self.source.next()?;
        self.literal_progress = kind.remaining();
        self.state = ScanState::Literal(kind, policy);
        self.drive()
    }

    /// Scan after an unconsumed `n`, branching between `null` and `new`
    /// (relaxed value position only).
    pub(crate) fn start_n(&mut self) -> Result<RawToken, ScanError> {
        self.source.next()?;
        self.state = ScanState::NDispatch;
        self.drive()
    }

    /// Scan a `//` or `/* */` comment (the leading `/` is unconsumed).
    pub(crate) fn start_comment(&mut self) -> Result<RawToken, ScanError> {
        self.source.next()?;
        self.buf.clear();
        self.state = ScanState::CommentStart;
        self.drive()
    }

    /// Scan an unquoted property name (first identifier char unconsumed).
    pub(crate) fn start_unquoted_name(&mut self) -> Result<RawToken, ScanError> {
        self.buf.clear();
        self.state = ScanState::UnquotedName;
        self.drive()
    }

    // ---------------------------------------------------------------- drive

    fn drive(&mut self) -> Result<RawToken, ScanError> {
        loop {
            let next = self.source.peek()?;
            if let Some(token) = self.step(next)? {
                self.state = ScanState::Idle;
                return Ok(token);
            }
        }
    }

    fn step(&mut self, next: Option<char>) -> Result<Option<RawToken>, ScanError> {
        match self.state {
            ScanState::Idle => unreachable!("drive() entered without an operation"),
            ScanState::Str => self.step_string(next),
            ScanState::StrEscape => self.step_string_escape(next),
            ScanState::StrEscapeUnicode => self.step_string_escape_unicode(),
            ScanState::Num(stage) => self.step_number(stage, next),
            ScanState::NDispatch => self.step_n_dispatch(next),
            ScanState::Literal(kind, policy) => self.step_literal(kind, policy, next),
            ScanState::LiteralTrailing(kind, policy) => {
                self.step_literal_trailing(kind, policy, next)
            }
            ScanState::CommentStart => self.step_comment_start(next),
            ScanState::CommentLine => self.step_comment_line(next),
            ScanState::CommentBlock => self.step_comment_block(next),
            ScanState::CtorAfterNew => self.step_ctor_after_new(next),
            ScanState::CtorName => self.step_ctor_name(next),
            ScanState::CtorAfterName => self.step_ctor_after_name(next),
            ScanState::UnquotedName => self.step_unquoted_name(next),
        }
    }

    // --------------------------------------------------------------- string

    fn step_string(&mut self, next: Option<char>) -> Result<Option<RawToken>, ScanError> {
        // A high surrogate is only kept while waiting for the matching low
        // half; anything else downgrades it to U+FFFD.
        if self.pending_high_surrogate.is_some() {
            self.settle_pending_surrogate(next)?;
            return Ok(None);
        }
        match next {
            None => Err(self.unterminated_string()),
            Some('\\') => {
                self.source.next()?;
                self.state = ScanState::StrEscape;
                Ok(None)
            }
            Some(c) if c == self.quote => {
                self.source.next()?;
                Ok(Some(RawToken::Str(std::mem::take(&mut self.buf))))
            }
            Some(c) => {
                self.source.next()?;
                self.buf.push(c);
                Ok(None)
            }
        }
    }

    fn step_string_escape(&mut self, next: Option<char>) -> Result<Option<RawToken>, ScanError> {
        let Some(c) = next else {
            return Err(self.unterminated_string());
        };
        match c {
            'b' => self.push_escaped('\u{8}')?,
            'f' => self.push_escaped('\u{c}')?,
            'n' => self.push_escaped('\n')?,
            'r' => self.push_escaped('\r')?,
            't' => self.push_escaped('\t')?,
            '"' | '\'' | '/' | '\\' => self.push_escaped(c)?,
            'u' => {
                self.source.next()?;
                self.state = ScanState::StrEscapeUnicode;
            }
            other => {
                self.source.next()?;
                return Err(self.syntax(
                    format!("Bad JSON escape sequence: \\{other}."),
                    self.source.column(),
                ));
            }
        }
        Ok(None)
    }

    fn step_string_escape_unicode(&mut self) -> Result<Option<RawToken>, ScanError> {
        let unit = self.read_hex4(0)?;
        // The four digits are buffered after a successful lookahead;
        // consuming them cannot fault.
        for _ in 0..4 {
            self.source.next()?;
        }
        match unit {
            0xD800..=0xDBFF => self.pending_high_surrogate = Some(unit),
            0xDC00..=0xDFFF => self.buf.push('\u{fffd}'),
            _ => self
                .buf
                .push(char::from_u32(u32::from(unit)).unwrap_or('\u{fffd}')),
        }
        self.state = ScanState::Str;
        Ok(None)
    }

    fn push_escaped(&mut self, decoded: char) -> Result<(), ScanError> {
        self.source.next()?;
        self.buf.push(decoded);
        self.state = ScanState::Str;
        Ok(())
    }

    // Peek `\uXXXX` hex digits starting `offset` characters ahead without
    // consuming, so a fault or EOF mid-sequence stays retryable.
    fn read_hex4(&mut self, offset: usize) -> Result<u16, ScanError> {
        let mut value: u16 = 0;
        for i in 0..4 {
            match self.source.peek_at(offset + i)? {
                Some(c) => match c.to_digit(16) {
                    #[allow(clippy::cast_possible_truncation)]
                    Some(d) => value = (value << 4) | d as u16,
                    None => {
                        return Err(self.syntax(
                            format!("Invalid character escape sequence: \\u{c}."),
                            self.source.column(),
                        ));
                    }
                },
                None => {
                    return Err(self.syntax(
                        "Unexpected end while parsing unicode character.",
                        self.source.column(),
                    ));
                }
            }
        }
        Ok(value)
    }

    fn settle_pending_surrogate(&mut self, next: Option<char>) -> Result<(), ScanError> {
        let high = self.pending_high_surrogate.expect("checked by caller");
        if next == Some('\\') && self.source.peek_at(1)? == Some('u') {
            let low = self.read_hex4(2)?;
            if (0xDC00..=0xDFFF).contains(&low) {
                for _ in 0..6 {
                    self.source.next()?;
                }
                let combined =
                    0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
                self.buf
                    .push(char::from_u32(combined).unwrap_or('\u{fffd}'));
                self.pending_high_surrogate = None;
                return Ok(());
            }
        }
        // Unpaired; substitute and reprocess the current character normally.
        self.buf.push('\u{fffd}');
        self.pending_high_surrogate = None;
        Ok(())
    }

    fn unterminated_string(&self) -> ScanError {
        self.syntax(
            format!("Unterminated string. Expected delimiter: {}.", self.quote),
            self.source.column(),
        )
    }

    // --------------------------------------------------------------- number

    fn step_number(
        &mut self,
        stage: NumStage,
        next: Option<char>,
    ) -> Result<Option<RawToken>, ScanError> {
        use NumStage::*;

        let c = match next {
            Some(c) => c,
            None => return self.finish_number(stage, true),
        };

        let advance = |this: &mut Self, c: char, to: NumStage| -> Result<Option<RawToken>, ScanError> {
            this.source.next()?;
            this.buf.push(c);
            this.state = ScanState::Num(to);
            Ok(None)
        };

        match stage {
            Sign => match c {
                '0' => advance(self, c, Zero),
                '1'..='9' => advance(self, c, Int),
                '.' => advance(self, c, Dot),
                'I' => {
                    self.source.next()?;
                    self.literal_progress = LiteralKind::NegInfinity.remaining();
                    self.state = ScanState::Literal(LiteralKind::NegInfinity, LiteralPolicy::PLAIN);
                    Ok(None)
                }
                c => self.bad_number_char(c, true),
            },
            Zero => match c {
                '.' => advance(self, c, Dot),
                'e' | 'E' => advance(self, c, ExpMark),
                c if c.is_ascii_hexdigit() || c == 'x' || c == 'X' => advance(self, c, NonBase10),
                c if Self::is_number_terminator(c) => self.finish_number(stage, false),
                c => self.bad_number_char(c, true),
            },
            Int => match c {
                '0'..='9' => advance(self, c, Int),
                '.' => advance(self, c, Dot),
                'e' | 'E' => advance(self, c, ExpMark),
                c if Self::is_number_terminator(c) => self.finish_number(stage, false),
                c => self.bad_number_char(c, true),
            },
            Dot => match c {
                '0'..='9' => advance(self, c, Frac),
                'e' | 'E' => advance(self, c, ExpMark),
                c if Self::is_number_terminator(c) => self.finish_number(stage, false),
                c => self.bad_number_char(c, true),
            },
            Frac => match c {
                '0'..='9' => advance(self, c, Frac),
                'e' | 'E' => advance(self, c, ExpMark),
                c if Self::is_number_terminator(c) => self.finish_number(stage, false),
                c => self.bad_number_char(c, true),
            },
            ExpMark => match c {
                '+' | '-' => advance(self, c, ExpSign),
                '0'..='9' => advance(self, c, ExpDigits),
                c => self.bad_number_char(c, true),
            },
            ExpSign => match c {
                '0'..='9' => advance(self, c, ExpDigits),
                c => self.bad_number_char(c, true),
            },
            ExpDigits => match c {
                '0'..='9' => advance(self, c, ExpDigits),
                c if Self::is_number_terminator(c) => self.finish_number(stage, false),
                c => self.bad_number_char(c, true),
            },
            NonBase10 => match c {
                c if c.is_ascii_hexdigit() || c == 'x' || c == 'X' => advance(self, c, NonBase10),
                c if Self::is_number_terminator(c) => self.finish_number(stage, false),
                // The span scan stops without consuming here.
                c => self.bad_number_char(c, false),
            },
        }
    }

    fn is_number_terminator(c: char) -> bool {
        c.is_whitespace() || matches!(c, ',' | ']' | '}' | ')' | '/')
    }

    fn bad_number_char(&mut self, c: char, consume: bool) -> Result<Option<RawToken>, ScanError> {
        if consume {
            self.source.next()?;
        }
        Err(self.syntax(
            format!("Unexpected character encountered while parsing number: {c}."),
            self.source.column(),
        ))
    }

    fn finish_number(
        &mut self,
        stage: NumStage,
        at_eof: bool,
    ) -> Result<Option<RawToken>, ScanError> {
        use NumStage::*;
        let kind = match stage {
            Zero | Int => NumKind::Int,
            Dot | Frac | ExpDigits => NumKind::Float,
            NonBase10 => NumKind::NonBase10,
            Sign | ExpMark | ExpSign => {
                if at_eof {
                    return Err(self.unexpected_end());
                }
                return Err(self.syntax(
                    format!("Input string '{}' is not a valid number.", self.buf),
                    self.source.column(),
                ));
            }
        };
        Ok(Some(RawToken::Number {
            text: std::mem::take(&mut self.buf),
            kind,
        }))
    }

    // -------------------------------------------------------------- literal

    fn step_n_dispatch(&mut self, next: Option<char>) -> Result<Option<RawToken>, ScanError> {
        match next {
            None => Err(self.unexpected_end()),
            Some('u') => {
                self.source.next()?;
                self.literal_progress = "ll";
                self.state = ScanState::Literal(LiteralKind::Null, LiteralPolicy::PLAIN);
                Ok(None)
            }
            Some('e') => {
                self.source.next()?;
                self.literal_progress = "w";
                self.state = ScanState::Literal(LiteralKind::New, LiteralPolicy::PLAIN);
                Ok(None)
            }
            Some(_) => Err(self.syntax(
                "Unexpected character encountered while parsing value: n.",
                self.source.column().max(1),
            )),
        }
    }

    fn step_literal(
        &mut self,
        kind: LiteralKind,
        policy: LiteralPolicy,
        next: Option<char>,
    ) -> Result<Option<RawToken>, ScanError> {
        let Some(c) = next else {
            return Err(self.unexpected_end());
        };
        let mut chars = self.literal_progress.chars();
        let expected = chars.next().expect("literal progress never empty here");
        if c != expected {
            if policy.mismatch_names_char {
                self.source.next()?;
                return Err(self.value_char_error(c, self.source.column()));
            }
            if kind == LiteralKind::New {
                return Err(self.syntax(
                    "Unexpected content while parsing JSON.",
                    self.source.column(),
                ));
            }
            return Err(self.literal_kind_error(kind));
        }
        self.source.next()?;
        self.literal_progress = chars.as_str();
        if self.literal_progress.is_empty() {
            self.state = if kind == LiteralKind::New {
                ScanState::CtorAfterNew
            } else {
                ScanState::LiteralTrailing(kind, policy)
            };
        }
        Ok(None)
    }

    fn step_literal_trailing(
        &mut self,
        kind: LiteralKind,
        policy: LiteralPolicy,
        next: Option<char>,
    ) -> Result<Option<RawToken>, ScanError> {
        let ok = match next {
            None => true,
            Some(c) if c.is_whitespace() => true,
            Some(',' | ']' | '}' | ')' | ':') => true,
            Some('/') => matches!(self.source.peek_at(1)?, Some('/' | '*')),
            Some(_) => false,
        };
        if ok {
            return Ok(Some(kind.token()));
        }
        if policy.trailing_names_char {
            let c = next.expect("non-separator implies a character");
            Err(self.value_char_error(c, self.source.column()))
        } else {
            Err(self.literal_kind_error(kind))
        }
    }

    fn literal_kind_error(&self, kind: LiteralKind) -> ScanError {
        self.syntax(
            format!("Error parsing {} value.", kind.error_name()),
            self.source.column(),
        )
    }

    // ------------------------------------------------------------- comments

    fn step_comment_start(&mut self, next: Option<char>) -> Result<Option<RawToken>, ScanError> {
        match next {
            None => Err(self.comment_end_error()),
            Some('/') => {
                self.source.next()?;
                self.state = ScanState::CommentLine;
                Ok(None)
            }
            Some('*') => {
                self.source.next()?;
                self.state = ScanState::CommentBlock;
                Ok(None)
            }
            Some(c) => Err(self.syntax(
                format!("Error parsing comment. Expected: *, got {c}."),
                self.source.column(),
            )),
        }
    }

    fn step_comment_line(&mut self, next: Option<char>) -> Result<Option<RawToken>, ScanError> {
        match next {
            None | Some('\r' | '\n') => Ok(Some(RawToken::Comment(std::mem::take(&mut self.buf)))),
            Some(c) => {
                self.source.next()?;
                self.buf.push(c);
                Ok(None)
            }
        }
    }

    fn step_comment_block(&mut self, next: Option<char>) -> Result<Option<RawToken>, ScanError> {
        match next {
            None => Err(self.comment_end_error()),
            Some('*') if self.source.peek_at(1)? == Some('/') => {
                self.source.next()?;
                self.source.next()?;
                Ok(Some(RawToken::Comment(std::mem::take(&mut self.buf))))
            }
            Some(c) => {
                self.source.next()?;
                self.buf.push(c);
                Ok(None)
            }
        }
    }

    fn comment_end_error(&self) -> ScanError {
        self.syntax("Unexpected end while parsing comment.", self.source.column())
    }

    // ---------------------------------------------------------- constructor

    fn step_ctor_after_new(&mut self, next: Option<char>) -> Result<Option<RawToken>, ScanError> {
        match next {
            None => Err(self.ctor_end_error()),
            Some(c) if c.is_whitespace() => {
                self.source.next()?;
                self.buf.clear();
                self.state = ScanState::CtorName;
                Ok(None)
            }
            Some(_) => Err(self.syntax(
                "Unexpected content while parsing JSON.",
                self.source.column(),
            )),
        }
    }

    fn step_ctor_name(&mut self, next: Option<char>) -> Result<Option<RawToken>, ScanError> {
        match next {
            None => Err(self.ctor_end_error()),
            Some(c) if c.is_whitespace() => {
                if self.buf.is_empty() {
                    self.source.next()?;
                    Ok(None)
                } else {
                    self.source.next()?;
                    self.state = ScanState::CtorAfterName;
                    Ok(None)
                }
            }
            Some('(') if !self.buf.is_empty() => {
                self.source.next()?;
                Ok(Some(RawToken::ConstructorStart(std::mem::take(
                    &mut self.buf,
                ))))
            }
            Some(c) if c.is_alphanumeric() || matches!(c, '_' | '$' | '.') => {
                self.source.next()?;
                self.buf.push(c);
                Ok(None)
            }
            Some(c) => Err(self.ctor_char_error(c)),
        }
    }

    fn step_ctor_after_name(&mut self, next: Option<char>) -> Result<Option<RawToken>, ScanError> {
        match next {
            None => Err(self.ctor_end_error()),
            Some(c) if c.is_whitespace() => {
                self.source.next()?;
                Ok(None)
            }
            Some('(') => {
                self.source.next()?;
                Ok(Some(RawToken::ConstructorStart(std::mem::take(
                    &mut self.buf,
                ))))
            }
            Some(c) => Err(self.ctor_char_error(c)),
        }
    }

    fn ctor_end_error(&self) -> ScanError {
        self.syntax(
            "Unexpected end while parsing constructor.",
            self.source.column(),
        )
    }

    fn ctor_char_error(&self, c: char) -> ScanError {
        self.syntax(
            format!("Unexpected character while parsing constructor: {c}."),
            self.source.column(),
        )
    }

    // ------------------------------------------------------- unquoted names

    fn step_unquoted_name(&mut self, next: Option<char>) -> Result<Option<RawToken>, ScanError> {
        match next {
            None => Err(self.syntax(
                "Unexpected end while parsing unquoted property name.",
                self.source.column(),
            )),
            Some(c) if c.is_alphanumeric() || matches!(c, '_' | '$') => {
                self.source.next()?;
                self.buf.push(c);
                Ok(None)
            }
            Some(c) if c.is_whitespace() || c == ':' => Ok(Some(RawToken::UnquotedName(
                std::mem::take(&mut self.buf),
            ))),
            Some(c) => Err(self.syntax(
                format!("Invalid JavaScript property identifier character: {c}."),
                self.source.column(),
            )),
        }
    }

    // --------------------------------------------------------------- errors

    pub(crate) fn syntax(&self, message: impl Into<String>, position: usize) -> ScanError {
        ScanError::Syntax {
            message: message.into(),
            line: self.source.line(),
            position,
        }
    }

    pub(crate) fn unexpected_end(&self) -> ScanError {
        self.syntax("Unexpected end when reading JSON.", self.source.column())
    }

    pub(crate) fn value_char_error(&self, c: char, position: usize) -> ScanError {
        self.syntax(
            format!("Unexpected character encountered while parsing value: {c}."),
            position,
        )
    }
}
