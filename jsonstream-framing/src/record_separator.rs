//! Record-separator delimited JSON.
//!
//! Documents are joined by a single separator byte, `0x1E` by default:
//!
//! ```text
//! {"a":1}<RS>{"b":2}
//! ```
//!
//! The separator joins documents rather than terminating them. A reader
//! accepts a final document with no separator after it, and a trailing
//! separator followed by end of input is a clean end of stream.

use crate::document::RawDocument;
use crate::error::{FramingError, StreamError};
use crate::latch::ErrorLatch;
use crate::stream::{DocumentReader, DocumentWriter, DEFAULT_MAX_DOCUMENT_SIZE};
use std::io::{self, BufRead, BufReader, Read, Write};

/// ASCII record separator.
pub const DEFAULT_SEPARATOR: u8 = 0x1E;

/// Reads separator-joined documents.
pub struct RecordSeparatorReader<R> {
    inner: BufReader<R>,
    separator: u8,
    max_document_size: usize,
    latch: ErrorLatch,
}

impl<R: Read> RecordSeparatorReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_separator(reader, DEFAULT_SEPARATOR)
    }

    pub fn with_separator(reader: R, separator: u8) -> Self {
        Self {
            inner: BufReader::new(reader),
            separator,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            latch: ErrorLatch::default(),
        }
    }

    pub fn with_max_document_size(mut self, max: usize) -> Self {
        self.max_document_size = max;
        self
    }

    pub fn separator(&self) -> u8 {
        self.separator
    }

    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    /// Returns whether the reader has failed permanently.
    pub fn is_failed(&self) -> bool {
        self.latch.is_set()
    }

    fn read_document(&mut self) -> Result<Option<RawDocument>, StreamError> {
        let separator = self.separator;
        let mut doc = Vec::new();

        loop {
            let (used, found) = {
                let available = match self.inner.fill_buf() {
                    Ok(buf) => buf,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                };
                if available.is_empty() {
                    break;
                }
                match available.iter().position(|&b| b == separator) {
                    Some(i) => {
                        doc.extend_from_slice(&available[..i]);
                        (i + 1, true)
                    }
                    None => {
                        doc.extend_from_slice(available);
                        (available.len(), false)
                    }
                }
            };
            self.inner.consume(used);

            if doc.len() > self.max_document_size {
                return Err(FramingError::DocumentTooLarge {
                    size: doc.len(),
                    max: self.max_document_size,
                }
                .into());
            }
            if found {
                tracing::trace!("read record of {} bytes", doc.len());
                return Ok(Some(RawDocument::from(doc)));
            }
        }

        // End of input. Unlike the length-prefixed framing, an unterminated
        // final record is a document, not a truncation.
        if doc.is_empty() {
            return Ok(None);
        }
        tracing::trace!("read final record of {} bytes", doc.len());
        Ok(Some(RawDocument::from(doc)))
    }
}

impl<R: Read> DocumentReader for RecordSeparatorReader<R> {
    fn read_raw(&mut self) -> Result<Option<RawDocument>, StreamError> {
        self.latch.check()?;
        let result = self.read_document();
        self.latch.guard("record-separator", result)
    }
}

/// Writes separator-joined documents.
pub struct RecordSeparatorWriter<W> {
    inner: W,
    separator: u8,
    first: bool,
    latch: ErrorLatch,
}

impl<W: Write> RecordSeparatorWriter<W> {
    pub fn new(writer: W) -> Self {
        Self::with_separator(writer, DEFAULT_SEPARATOR)
    }

    pub fn with_separator(writer: W, separator: u8) -> Self {
        Self {
            inner: writer,
            separator,
            first: true,
            latch: ErrorLatch::default(),
        }
    }

    pub fn separator(&self) -> u8 {
        self.separator
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> DocumentWriter for RecordSeparatorWriter<W> {
    /// Writes `doc`, preceded by the separator unless this is the first
    /// document.
    fn write_raw(&mut self, doc: &[u8]) -> Result<(), StreamError> {
        self.latch.check()?;

        let mut record = Vec::with_capacity(doc.len() + 1);
        if !self.first {
            record.push(self.separator);
        }
        record.extend_from_slice(doc);

        let result = self.inner.write_all(&record).map_err(StreamError::from);
        self.latch.guard("record-separator", result)?;
        self.first = false;
        tracing::trace!("wrote record of {} bytes", doc.len());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        self.latch.check()?;
        let result = self.inner.flush().map_err(StreamError::from);
        self.latch.guard("record-separator", result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Event {
        kind: String,
        seq: u32,
    }

    #[test]
    fn test_writer_joins_without_trailing_separator() {
        let mut writer = RecordSeparatorWriter::new(Vec::new());
        writer.write_raw(br#"{"a":1}"#).unwrap();
        writer.write_raw(br#"{"b":2}"#).unwrap();
        assert_eq!(writer.into_inner(), b"{\"a\":1}\x1e{\"b\":2}");
    }

    #[test]
    fn test_reader_joined() {
        let input: &[u8] = b"{\"a\":1}\x1e{\"b\":2}";
        let mut reader = RecordSeparatorReader::new(input);
        assert_eq!(reader.read_raw().unwrap().unwrap(), br#"{"a":1}"#);
        assert_eq!(reader.read_raw().unwrap().unwrap(), br#"{"b":2}"#);
        assert!(reader.read_raw().unwrap().is_none());
    }

    #[test]
    fn test_reader_trailing_separator_is_end_of_stream() {
        let input: &[u8] = b"{\"a\":1}\x1e{\"b\":2}\x1e";
        let mut reader = RecordSeparatorReader::new(input);
        assert_eq!(reader.read_raw().unwrap().unwrap(), br#"{"a":1}"#);
        assert_eq!(reader.read_raw().unwrap().unwrap(), br#"{"b":2}"#);
        assert!(reader.read_raw().unwrap().is_none());
    }

    // Intentional asymmetry: an unterminated last record is returned as a
    // document here, while a short length-prefixed body is a framing error.
    #[test]
    fn test_unterminated_final_record_is_a_document() {
        let input: &[u8] = b"[1]\x1e{\"partial\":";
        let mut reader = RecordSeparatorReader::new(input);
        assert_eq!(reader.read_raw().unwrap().unwrap(), b"[1]");
        assert_eq!(reader.read_raw().unwrap().unwrap(), br#"{"partial":"#);
        assert!(reader.read_raw().unwrap().is_none());
    }

    #[test]
    fn test_empty_record_between_separators() {
        let input: &[u8] = b"1\x1e\x1e2";
        let mut reader = RecordSeparatorReader::new(input);
        assert_eq!(reader.read_raw().unwrap().unwrap(), b"1");
        assert!(reader.read_raw().unwrap().unwrap().is_empty());
        assert_eq!(reader.read_raw().unwrap().unwrap(), b"2");
        assert!(reader.read_raw().unwrap().is_none());
    }

    #[test]
    fn test_custom_separator_roundtrip() {
        let events: Vec<Event> = (1..=3)
            .map(|seq| Event {
                kind: "tick".to_string(),
                seq,
            })
            .collect();

        let mut writer = RecordSeparatorWriter::with_separator(Vec::new(), b'|');
        assert_eq!(writer.separator(), b'|');
        for e in &events {
            writer.marshal(e).unwrap();
        }
        let buf = writer.into_inner();
        assert_eq!(buf.iter().filter(|&&b| b == b'|').count(), 2);

        let mut reader = RecordSeparatorReader::with_separator(buf.as_slice(), b'|');
        for e in &events {
            assert_eq!(reader.unmarshal::<Event>().unwrap().as_ref(), Some(e));
        }
        assert!(reader.unmarshal::<Event>().unwrap().is_none());
    }

    #[test]
    fn test_decode_error_is_local() {
        let input: &[u8] = b"{oops}\x1e{\"kind\":\"x\",\"seq\":7}";
        let mut reader = RecordSeparatorReader::new(input);
        assert!(reader.unmarshal::<Event>().unwrap_err().is_decode());
        assert!(!reader.is_failed());
        assert_eq!(
            reader.unmarshal::<Event>().unwrap(),
            Some(Event {
                kind: "x".to_string(),
                seq: 7
            })
        );
    }

    #[test]
    fn test_oversized_record_latches() {
        let input: &[u8] = b"[1,2,3,4,5]\x1e[1]";
        let mut reader = RecordSeparatorReader::new(input).with_max_document_size(4);
        let err = reader.read_raw().unwrap_err();
        assert!(matches!(
            err,
            StreamError::Framing(FramingError::DocumentTooLarge { max: 4, .. })
        ));
        assert!(reader.is_failed());
        assert_eq!(reader.read_raw().unwrap_err().to_string(), err.to_string());
    }

    struct FlakyWriter {
        fail_next: bool,
        written: Vec<u8>,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_next {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_first_write_latches() {
        let mut writer = RecordSeparatorWriter::new(FlakyWriter {
            fail_next: true,
            written: Vec::new(),
        });
        assert!(writer.write_raw(b"1").unwrap_err().is_io());
        assert!(writer.first);

        writer.inner.fail_next = false;
        assert!(writer.write_raw(b"2").unwrap_err().is_io());
        assert!(writer.get_ref().written.is_empty());
    }
}
