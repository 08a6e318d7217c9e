//! Length-prefixed JSON.
//!
//! Each document is preceded by its byte length in ASCII decimal, with no
//! separator on either side:
//!
//! ```text
//! 7{"a":1}7{"b":2}
//! ```
//!
//! The prefix ends at the first non-digit byte, which is also the first byte
//! of the body. Any framing or I/O failure latches: the reader can no longer
//! tell where the next prefix starts.

use crate::document::RawDocument;
use crate::error::{FramingError, StreamError};
use crate::latch::ErrorLatch;
use crate::stream::{
    read_byte, read_up_to, DocumentReader, DocumentWriter, DEFAULT_MAX_DOCUMENT_SIZE,
};
use bytes::{BufMut, BytesMut};
use std::io::{BufReader, Read, Write};

/// Longest length prefix accepted (enough for any `u64`).
const MAX_LENGTH_DIGITS: usize = 20;

/// Encodes one document with its length prefix.
///
/// Empty documents are rejected: nothing would follow the digits to mark
/// where the prefix ends.
pub fn encode(doc: &[u8]) -> Result<BytesMut, StreamError> {
    if doc.is_empty() {
        return Err(StreamError::EmptyDocument);
    }
    let prefix = doc.len().to_string();
    let mut buf = BytesMut::with_capacity(prefix.len() + doc.len());
    buf.put_slice(prefix.as_bytes());
    buf.put_slice(doc);
    Ok(buf)
}

fn parse_length(digits: &str) -> Result<usize, FramingError> {
    let len: usize = digits
        .parse()
        .map_err(|_| FramingError::InvalidLength(digits.to_string()))?;
    if len == 0 {
        return Err(FramingError::ZeroLength);
    }
    Ok(len)
}

/// Reads length-prefixed documents.
pub struct LengthPrefixedReader<R> {
    inner: BufReader<R>,
    max_document_size: usize,
    latch: ErrorLatch,
}

impl<R: Read> LengthPrefixedReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            latch: ErrorLatch::default(),
        }
    }

    pub fn with_max_document_size(mut self, max: usize) -> Self {
        self.max_document_size = max;
        self
    }

    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    /// Returns whether the reader has failed permanently.
    pub fn is_failed(&self) -> bool {
        self.latch.is_set()
    }

    fn read_document(&mut self) -> Result<Option<RawDocument>, StreamError> {
        // Length phase: accumulate digits up to the first non-digit byte.
        let mut digits = String::new();
        let first = loop {
            match read_byte(&mut self.inner)? {
                Some(b) if b.is_ascii_digit() => {
                    if digits.len() == MAX_LENGTH_DIGITS {
                        digits.push(b as char);
                        return Err(FramingError::InvalidLength(digits).into());
                    }
                    digits.push(b as char);
                }
                Some(b) => break b,
                None if digits.is_empty() => return Ok(None),
                None => {
                    let expected = parse_length(&digits)?;
                    return Err(FramingError::Truncated {
                        expected,
                        received: 0,
                    }
                    .into());
                }
            }
        };

        let expected = parse_length(&digits)?;
        if expected > self.max_document_size {
            return Err(FramingError::DocumentTooLarge {
                size: expected,
                max: self.max_document_size,
            }
            .into());
        }

        // Body phase: the terminating byte is the first body byte.
        let mut body = Vec::with_capacity(expected);
        body.push(first);
        let received = 1 + read_up_to(&mut self.inner, &mut body, expected - 1)?;
        if received < expected {
            return Err(FramingError::Truncated { expected, received }.into());
        }

        tracing::trace!("read length-prefixed document of {} bytes", expected);
        Ok(Some(RawDocument::from(body)))
    }
}

impl<R: Read> DocumentReader for LengthPrefixedReader<R> {
    fn read_raw(&mut self) -> Result<Option<RawDocument>, StreamError> {
        self.latch.check()?;
        let result = self.read_document();
        self.latch.guard("length-prefixed", result)
    }
}

/// Writes length-prefixed documents.
pub struct LengthPrefixedWriter<W> {
    inner: W,
    latch: ErrorLatch,
}

impl<W: Write> LengthPrefixedWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: writer,
            latch: ErrorLatch::default(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> DocumentWriter for LengthPrefixedWriter<W> {
    fn write_raw(&mut self, doc: &[u8]) -> Result<(), StreamError> {
        self.latch.check()?;
        // Rejected input never reaches the sink, so it does not latch.
        let frame = encode(doc)?;
        let result = self.inner.write_all(&frame).map_err(StreamError::from);
        self.latch.guard("length-prefixed", result)?;
        tracing::trace!("wrote length-prefixed document of {} bytes", doc.len());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        self.latch.check()?;
        let result = self.inner.flush().map_err(StreamError::from);
        self.latch.guard("length-prefixed", result)
    }
}
