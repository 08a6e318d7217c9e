//! Concatenated JSON.
//!
//! Documents are placed back to back with nothing between them:
//!
//! ```text
//! {"a":1}{"b":2}[3]
//! ```
//!
//! Boundaries are found structurally by decoding one value at a time.
//! Whitespace between values is tolerated on read. Any failure, including a
//! failed typed decode, latches, since the stream position can no longer be
//! trusted to sit on a document boundary.

use crate::codec::PrefixDecoder;
use crate::document::RawDocument;
use crate::error::{FramingError, StreamError};
use crate::latch::ErrorLatch;
use crate::stream::{DocumentReader, DocumentWriter, DEFAULT_MAX_DOCUMENT_SIZE};
use std::io::{BufReader, Read, Write};

/// Reads concatenated documents.
// `serde_json::de::IoRead` requires `R: Read` on the type itself.
pub struct ConcatReader<R: Read> {
    decoder: PrefixDecoder<BufReader<R>>,
    max_document_size: usize,
    latch: ErrorLatch,
}

impl<R: Read> ConcatReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            decoder: PrefixDecoder::new(BufReader::new(reader)),
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            latch: ErrorLatch::default(),
        }
    }

    pub fn with_max_document_size(mut self, max: usize) -> Self {
        self.max_document_size = max;
        self
    }

    /// Number of bytes consumed by successfully read documents.
    pub fn byte_offset(&self) -> usize {
        self.decoder.byte_offset()
    }

    /// Returns whether the reader has failed permanently.
    pub fn is_failed(&self) -> bool {
        self.latch.is_set()
    }

    fn read_document(&mut self) -> Result<Option<RawDocument>, StreamError> {
        let doc = match self.decoder.next_document()? {
            Some(doc) => doc,
            None => return Ok(None),
        };
        if doc.len() > self.max_document_size {
            return Err(FramingError::DocumentTooLarge {
                size: doc.len(),
                max: self.max_document_size,
            }
            .into());
        }
        tracing::trace!(
            "read concatenated document of {} bytes at offset {}",
            doc.len(),
            self.decoder.byte_offset()
        );
        Ok(Some(doc))
    }
}

impl<R: Read> DocumentReader for ConcatReader<R> {
    fn read_raw(&mut self) -> Result<Option<RawDocument>, StreamError> {
        self.latch.check()?;
        let result = self.read_document();
        self.latch.guard("concatenated", result)
    }

    fn decode_failed(&mut self, err: &StreamError) {
        self.latch.record("concatenated", err);
    }
}

/// Writes concatenated documents.
///
/// Every document must be a complete, self-terminating JSON value for the
/// stream to be readable again. Two bare numbers written back to back, for
/// instance, merge into one. This is not checked.
pub struct ConcatWriter<W> {
    inner: W,
    latch: ErrorLatch,
}

impl<W: Write> ConcatWriter<W> {
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

impl<W: Write> DocumentWriter for ConcatWriter<W> {
    fn write_raw(&mut self, doc: &[u8]) -> Result<(), StreamError> {
        self.latch.check()?;
        let result = self.inner.write_all(doc).map_err(StreamError::from);
        self.latch.guard("concatenated", result)?;
        tracing::trace!("wrote concatenated document of {} bytes", doc.len());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        self.latch.check()?;
        let result = self.inner.flush().map_err(StreamError::from);
        self.latch.guard("concatenated", result)
    }
}
