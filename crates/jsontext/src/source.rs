//! Pull-based character supply over a byte reader.

use std::io::{self, Read};

const FILL_SIZE: usize = 1024;

/// Buffered, position-tracking character source.
///
/// Bytes are pulled from the inner reader on demand and decoded
/// incrementally as UTF-8. Faults from the inner reader propagate without
/// consuming input or advancing the position, so a retried call observes the
/// same character the failed one would have. End of input is idempotent:
/// once the inner reader reports it, every further call keeps reporting it.
#[derive(Debug)]
pub(crate) struct CharSource<R> {
    inner: R,
    buf: Vec<u8>,
    start: usize,
    eof: bool,

    line: usize,
    column: usize,
    last_was_cr: bool,
}

impl<R: Read> CharSource<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(FILL_SIZE),
            start: 0,
            eof: false,
            line: 1,
            column: 0,
            last_was_cr: false,
        }
    }

    /// Line of the next unread character, 1-based.
    pub(crate) fn line(&self) -> usize {
        self.line
    }

    /// Characters consumed on the current line; resets to 0 at each newline.
    pub(crate) fn column(&self) -> usize {
        self.column
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner
    }

    /// Decode the next character without consuming it.
    pub(crate) fn peek(&mut self) -> io::Result<Option<char>> {
        self.peek_at(0)
    }

    /// Decode the character `index` positions ahead without consuming
    /// anything. Used for the small fixed lookaheads (`\uXXXX`, comment
    /// separators, literal disambiguation).
    pub(crate) fn peek_at(&mut self, index: usize) -> io::Result<Option<char>> {
        let mut offset = self.start;
        let mut remaining = index;
        loop {
            match self.decode_at(offset)? {
                Some((ch, len)) => {
                    if remaining == 0 {
                        return Ok(Some(ch));
                    }
                    remaining -= 1;
                    offset += len;
                }
                None => return Ok(None),
            }
        }
    }

    /// Consume one character, advancing the position counters.
    pub(crate) fn next(&mut self) -> io::Result<Option<char>> {
        match self.decode_at(self.start)? {
            Some((ch, len)) => {
                self.start += len;
                self.bump_position(ch);
                self.compact();
                Ok(Some(ch))
            }
            None => Ok(None),
        }
    }

    fn bump_position(&mut self, ch: char) {
        match ch {
            '\r' => {
                self.line += 1;
                self.column = 0;
                self.last_was_cr = true;
            }
            '\n' => {
                if !self.last_was_cr {
                    self.line += 1;
                }
                self.column = 0;
                self.last_was_cr = false;
            }
            _ => {
                self.column += 1;
                self.last_was_cr = false;
            }
        }
    }

    // Decode the character starting at `offset`, filling from the inner
    // reader as needed. Returns None at end of input.
    fn decode_at(&mut self, offset: usize) -> io::Result<Option<(char, usize)>> {
        loop {
            let available = &self.buf[offset.min(self.buf.len())..];
            if available.is_empty() {
                if self.eof {
                    return Ok(None);
                }
                self.fill()?;
                continue;
            }
            let (ch, len) = bstr::decode_utf8(available);
            match ch {
                Some(ch) => return Ok(Some((ch, len))),
                None => {
                    // Either an incomplete sequence at the buffer end (need
                    // more bytes) or genuinely invalid UTF-8.
                    if offset + len == self.buf.len() && !self.eof {
                        self.fill()?;
                        continue;
                    }
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "invalid UTF-8 in JSON input",
                    ));
                }
            }
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; FILL_SIZE];
        // A fault here leaves the buffer and position untouched.
        let n = self.inner.read(&mut chunk)?;
        if n == 0 {
            self.eof = true;
        } else {
            self.buf.extend_from_slice(&chunk[..n]);
        }
        Ok(())
    }

    fn compact(&mut self) {
        if self.start >= FILL_SIZE {
            self.buf.drain(..self.start);
            self.start = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_line_and_column() {
        let mut src = CharSource::new("ab\ncd\r\nef".as_bytes());
        assert_eq!((src.line(), src.column()), (1, 0));
        src.next().unwrap();
        src.next().unwrap();
        assert_eq!((src.line(), src.column()), (1, 2));
        src.next().unwrap(); // \n
        assert_eq!((src.line(), src.column()), (2, 0));
        src.next().unwrap();
        src.next().unwrap();
        src.next().unwrap(); // \r
        assert_eq!((src.line(), src.column()), (3, 0));
        src.next().unwrap(); // \n of \r\n, same newline
        assert_eq!((src.line(), src.column()), (3, 0));
        src.next().unwrap();
        assert_eq!((src.line(), src.column()), (3, 1));
    }

    #[test]
    fn peek_does_not_consume() {
        let mut src = CharSource::new("xy".as_bytes());
        assert_eq!(src.peek().unwrap(), Some('x'));
        assert_eq!(src.peek().unwrap(), Some('x'));
        assert_eq!(src.column(), 0);
        assert_eq!(src.next().unwrap(), Some('x'));
        assert_eq!(src.peek().unwrap(), Some('y'));
    }

    #[test]
    fn peek_ahead() {
        let mut src = CharSource::new("abcd".as_bytes());
        assert_eq!(src.peek_at(2).unwrap(), Some('c'));
        assert_eq!(src.peek_at(3).unwrap(), Some('d'));
        assert_eq!(src.peek_at(4).unwrap(), None);
        assert_eq!(src.next().unwrap(), Some('a'));
        assert_eq!(src.peek_at(0).unwrap(), Some('b'));
    }

    #[test]
    fn eof_is_idempotent() {
        let mut src = CharSource::new("".as_bytes());
        assert_eq!(src.next().unwrap(), None);
        assert_eq!(src.next().unwrap(), None);
        assert_eq!(src.peek().unwrap(), None);
    }

    #[test]
    fn multibyte_chars_round_trip() {
        let mut src = CharSource::new("é≈🙂".as_bytes());
        assert_eq!(src.next().unwrap(), Some('é'));
        assert_eq!(src.next().unwrap(), Some('≈'));
        assert_eq!(src.next().unwrap(), Some('🙂'));
        assert_eq!(src.next().unwrap(), None);
        // Multibyte characters still advance the column by one each.
        assert_eq!(src.column(), 3);
    }

    struct FlakyReader<'a> {
        data: &'a [u8],
        pos: usize,
        fail_next: bool,
    }

    impl Read for FlakyReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.fail_next {
                self.fail_next = false;
                return Err(io::Error::other("Read error"));
            }
            if self.pos >= self.data.len() {
                return Ok(0);
            }
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn fault_preserves_position_and_retries() {
        let mut src = CharSource::new(FlakyReader {
            data: b"ab",
            pos: 0,
            fail_next: false,
        });
        assert_eq!(src.next().unwrap(), Some('a'));
        src.inner.fail_next = true;
        assert!(src.peek().is_err());
        assert_eq!((src.line(), src.column()), (1, 1));
        // Fault cleared; identical call yields the character the failed one
        // would have.
        assert_eq!(src.peek().unwrap(), Some('b'));
        assert_eq!(src.next().unwrap(), Some('b'));
    }
}
