//! Newline-delimited record decoder for the remote byte stream.
//!
//! TCP is a *stream* protocol: a single `read()` may return half a line, or
//! several lines at once.  [`RecordCodec`] accumulates bytes (via
//! `tokio_util::codec::FramedRead`) and hands back one complete record at a
//! time.
//!
//! # Record rules
//!
//! - A record ends at `\n`.  The `\n` and a directly preceding `\r` are not
//!   part of the record (line-oriented servers commonly send CRLF).
//! - Record bytes are decoded as UTF-8; invalid sequences are replaced with
//!   U+FFFD so that every record can travel as a WebSocket *text* frame.
//! - When the stream ends with an unterminated tail, the tail is delivered as
//!   a final record.
//! - A record longer than `max_length` bytes (terminator excluded) is an
//!   error: the remote side is not speaking a line protocol, and buffering it
//!   without bound would let one peer exhaust the bridge's memory.

use bytes::BytesMut;
use thiserror::Error;
use tokio_util::codec::Decoder;

/// Errors produced while splitting the remote stream into records.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A record grew past the configured limit without a terminator.
    #[error("record exceeds {limit} bytes without a line terminator")]
    TooLong { limit: usize },

    /// The underlying read failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Splits a byte stream into newline-terminated text records.
#[derive(Debug, Clone)]
pub struct RecordCodec {
    max_length: usize,
    /// Where the next search for `\n` starts, so that a long partial record
    /// is not rescanned from the beginning on every read.
    next_index: usize,
}

impl RecordCodec {
    /// Creates a codec that rejects records longer than `max_length` bytes.
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
        }
    }

    /// Removes `consumed` bytes from `buf` and returns the first `len` of them
    /// as a record.
    fn take_record(
        &mut self,
        buf: &mut BytesMut,
        len: usize,
        consumed: usize,
    ) -> Result<String, RecordError> {
        self.next_index = 0;
        let mut record = buf.split_to(consumed);
        record.truncate(len);
        if record.last() == Some(&b'\r') {
            record.truncate(record.len() - 1);
        }
        if record.len() > self.max_length {
            return Err(RecordError::TooLong {
                limit: self.max_length,
            });
        }
        Ok(String::from_utf8_lossy(&record).into_owned())
    }
}

impl Decoder for RecordCodec {
    type Item = String;
    type Error = RecordError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, RecordError> {
        let newline = buf[self.next_index..]
            .iter()
            .position(|b| *b == b'\n')
            .map(|offset| self.next_index + offset);

        match newline {
            Some(end) => self.take_record(buf, end, end + 1).map(Some),
            None => {
                // Allow one extra byte for a pending `\r`.
                if buf.len() > self.max_length + 1 {
                    return Err(RecordError::TooLong {
                        limit: self.max_length,
                    });
                }
                self.next_index = buf.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, RecordError> {
        if let Some(record) = self.decode(buf)? {
            return Ok(Some(record));
        }
        if buf.is_empty() {
            return Ok(None);
        }
        let len = buf.len();
        self.take_record(buf, len, len).map(Some)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(bytes: &[u8]) -> BytesMut {
        BytesMut::from(bytes)
    }

    #[test]
    fn test_single_record_is_stripped_of_newline() {
        let mut codec = RecordCodec::new(1024);
        let mut b = buf(b"HELLO\n");
        assert_eq!(codec.decode(&mut b).unwrap(), Some("HELLO".to_string()));
        assert!(b.is_empty());
    }

    #[test]
    fn test_crlf_terminator_is_stripped() {
        let mut codec = RecordCodec::new(1024);
        let mut b = buf(b"Welcome!\r\n");
        assert_eq!(codec.decode(&mut b).unwrap(), Some("Welcome!".to_string()));
    }

    #[test]
    fn test_lone_carriage_return_inside_record_is_kept() {
        let mut codec = RecordCodec::new(1024);
        let mut b = buf(b"a\rb\n");
        assert_eq!(codec.decode(&mut b).unwrap(), Some("a\rb".to_string()));
    }

    #[test]
    fn test_partial_record_waits_for_more_bytes() {
        // Arrange: the first read delivers half a line
        let mut codec = RecordCodec::new(1024);
        let mut b = buf(b"HEL");

        // Act / Assert: nothing yet
        assert_eq!(codec.decode(&mut b).unwrap(), None);

        // The rest arrives
        b.extend_from_slice(b"LO\nWOR");
        assert_eq!(codec.decode(&mut b).unwrap(), Some("HELLO".to_string()));
        assert_eq!(codec.decode(&mut b).unwrap(), None);
        assert_eq!(&b[..], b"WOR");
    }

    #[test]
    fn test_coalesced_records_decode_in_order() {
        let mut codec = RecordCodec::new(1024);
        let mut b = buf(b"one\ntwo\n\nthree\n");
        let mut out = Vec::new();
        while let Some(record) = codec.decode(&mut b).unwrap() {
            out.push(record);
        }
        // Empty lines are records too.
        assert_eq!(out, vec!["one", "two", "", "three"]);
    }

    #[test]
    fn test_unterminated_tail_is_delivered_at_eof() {
        let mut codec = RecordCodec::new(1024);
        let mut b = buf(b"prompt> ");
        assert_eq!(codec.decode(&mut b).unwrap(), None);
        assert_eq!(
            codec.decode_eof(&mut b).unwrap(),
            Some("prompt> ".to_string())
        );
        assert_eq!(codec.decode_eof(&mut b).unwrap(), None);
    }

    #[test]
    fn test_eof_on_empty_buffer_yields_nothing() {
        let mut codec = RecordCodec::new(1024);
        let mut b = BytesMut::new();
        assert_eq!(codec.decode_eof(&mut b).unwrap(), None);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut codec = RecordCodec::new(1024);
        let mut b = buf(b"caf\xe9\n");
        assert_eq!(codec.decode(&mut b).unwrap(), Some("caf\u{FFFD}".to_string()));
    }

    #[test]
    fn test_overlong_unterminated_record_is_an_error() {
        let mut codec = RecordCodec::new(4);
        let mut b = buf(b"abcdefg");
        let err = codec.decode(&mut b).unwrap_err();
        assert!(matches!(err, RecordError::TooLong { limit: 4 }));
    }

    #[test]
    fn test_overlong_terminated_record_is_an_error() {
        let mut codec = RecordCodec::new(4);
        let mut b = buf(b"abcdefg\n");
        assert!(matches!(
            codec.decode(&mut b),
            Err(RecordError::TooLong { limit: 4 })
        ));
    }

    #[test]
    fn test_record_at_limit_with_crlf_is_accepted() {
        let mut codec = RecordCodec::new(4);
        let mut b = buf(b"abcd\r");
        assert_eq!(codec.decode(&mut b).unwrap(), None);
        b.extend_from_slice(b"\n");
        assert_eq!(codec.decode(&mut b).unwrap(), Some("abcd".to_string()));
    }
}
