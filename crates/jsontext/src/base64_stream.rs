//! Incremental base64 encoding for binary values.

use std::io::{self, Write};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

const LINE_SIZE_CHARS: usize = 76;
const LINE_SIZE_BYTES: usize = 57;

/// Streaming base64 encoder.
///
/// Byte chunks of any size (including empty) can be fed with
/// [`encode`](Self::encode); up to two leftover bytes are buffered between
/// calls so 3-byte groups stay aligned, and output is handed to the sink in
/// chunks of at most 76 characters (57 source bytes). [`flush`](Self::flush)
/// emits the final partial group; without it up to two bytes stay pending.
///
/// The concatenated output is exactly the base64 encoding of the
/// concatenated input; the 76-character chunking only shapes the individual
/// sink writes.
///
/// ```rust
/// use jsontext::Base64Encoder;
///
/// let mut out = Vec::new();
/// let mut enc = Base64Encoder::new(&mut out);
/// enc.encode(b"Hello ").unwrap();
/// enc.encode(b"world.").unwrap();
/// enc.flush().unwrap();
/// assert_eq!(out, b"SGVsbG8gd29ybGQu");
/// ```
#[derive(Debug)]
pub struct Base64Encoder<W> {
    out: W,
    leftover: [u8; 3],
    leftover_len: usize,
}

impl<W: Write> Base64Encoder<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            leftover: [0; 3],
            leftover_len: 0,
        }
    }

    /// Feed one chunk of input bytes.
    pub fn encode(&mut self, mut buf: &[u8]) -> io::Result<()> {
        if buf.is_empty() {
            return Ok(());
        }

        if self.leftover_len > 0 {
            while self.leftover_len < 3 && !buf.is_empty() {
                self.leftover[self.leftover_len] = buf[0];
                self.leftover_len += 1;
                buf = &buf[1..];
            }
            if self.leftover_len < 3 {
                return Ok(());
            }
            let group = self.leftover;
            self.write_group(&group)?;
            self.leftover_len = 0;
        }

        let keep = buf.len() % 3;
        let (body, tail) = buf.split_at(buf.len() - keep);
        self.leftover[..keep].copy_from_slice(tail);
        self.leftover_len = keep;

        for chunk in body.chunks(LINE_SIZE_BYTES) {
            self.write_group(chunk)?;
        }
        Ok(())
    }

    /// Emit any buffered partial group.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.leftover_len > 0 {
            let len = self.leftover_len;
            let group = self.leftover;
            // Clear before writing so a sink fault does not re-emit the
            // group on a later flush.
            self.leftover_len = 0;
            self.write_group(&group[..len])?;
        }
        Ok(())
    }

    fn write_group(&mut self, bytes: &[u8]) -> io::Result<()> {
        debug_assert!(bytes.len() <= LINE_SIZE_BYTES);
        let mut line = [0u8; LINE_SIZE_CHARS];
        let n = STANDARD
            .encode_slice(bytes, &mut line)
            .expect("line buffer sized for a full group");
        self.out.write_all(&line[..n])
    }
}
