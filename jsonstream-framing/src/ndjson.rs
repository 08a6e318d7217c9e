//! Newline-delimited JSON: one document per line.
//!
//! ```text
//! {"a":1}\n{"b":2}\n
//! ```
//!
//! Every line is its own failure domain. A line that fails to decode, or one
//! that exceeds the size limit, fails only that call; the next call starts at
//! the following line.

use crate::document::RawDocument;
use crate::error::{FramingError, StreamError};
use crate::stream::{DocumentReader, DocumentWriter, DEFAULT_MAX_DOCUMENT_SIZE};
use std::io::{self, BufRead, BufReader, Read, Write};

/// Reads one document per line.
pub struct NdjsonReader<R> {
    inner: BufReader<R>,
    max_document_size: usize,
}

impl<R: Read> NdjsonReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
        }
    }

    pub fn with_max_document_size(mut self, max: usize) -> Self {
        self.max_document_size = max;
        self
    }

    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }
}

impl<R: Read> DocumentReader for NdjsonReader<R> {
    fn read_raw(&mut self) -> Result<Option<RawDocument>, StreamError> {
        let mut line = Vec::new();
        // Bytes past the size limit are counted but not kept.
        let mut dropped = 0usize;
        let mut read_any = false;

        loop {
            let (used, done) = {
                let available = match self.inner.fill_buf() {
                    Ok(buf) => buf,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                };
                if available.is_empty() {
                    break;
                }
                read_any = true;

                let (chunk, done) = match available.iter().position(|&b| b == b'\n') {
                    Some(i) => (&available[..i], true),
                    None => (available, false),
                };
                // One extra byte of room for a trailing '\r'.
                let room = (self.max_document_size + 1).saturating_sub(line.len());
                let keep = chunk.len().min(room);
                line.extend_from_slice(&chunk[..keep]);
                dropped += chunk.len() - keep;
                (chunk.len() + usize::from(done), done)
            };
            self.inner.consume(used);
            if done {
                break;
            }
        }

        if !read_any {
            return Ok(None);
        }
        if dropped == 0 && line.last() == Some(&b'\r') {
            line.pop();
        }

        let size = line.len() + dropped;
        if size > self.max_document_size {
            tracing::debug!("skipping oversized line of {} bytes", size);
            return Err(FramingError::DocumentTooLarge {
                size,
                max: self.max_document_size,
            }
            .into());
        }

        tracing::trace!("read line of {} bytes", line.len());
        Ok(Some(RawDocument::from(line)))
    }
}

/// Writes one document per line.
pub struct NdjsonWriter<W> {
    inner: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { inner: writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> DocumentWriter for NdjsonWriter<W> {
    /// Writes `doc` followed by `\n`. Line terminators inside `doc` are
    /// removed; in valid JSON they can only be insignificant whitespace.
    fn write_raw(&mut self, doc: &[u8]) -> Result<(), StreamError> {
        let mut line = Vec::with_capacity(doc.len() + 1);
        line.extend(doc.iter().copied().filter(|&b| b != b'\n' && b != b'\r'));
        line.push(b'\n');
        self.inner.write_all(&line)?;
        tracing::trace!("wrote line of {} bytes", line.len());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        self.inner.flush()?;
        Ok(())
    }
}
