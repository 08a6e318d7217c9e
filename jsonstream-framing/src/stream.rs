//! The read/write contract shared by every framing.

use crate::codec;
use crate::document::RawDocument;
use crate::error::StreamError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, BufRead};
use std::marker::PhantomData;

/// Default upper bound on a single document (16 MiB).
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Pulls documents off a framed byte stream.
///
/// `Ok(None)` signals a clean end of stream. It is not latched: a source that
/// receives more data may yield further documents on a later call.
pub trait DocumentReader {
    /// Reads the next document verbatim, delimiter stripped.
    fn read_raw(&mut self) -> Result<Option<RawDocument>, StreamError>;

    /// Reads the next document and decodes it into `T`.
    fn unmarshal<T: DeserializeOwned>(&mut self) -> Result<Option<T>, StreamError>
    where
        Self: Sized,
    {
        let doc = match self.read_raw()? {
            Some(doc) => doc,
            None => return Ok(None),
        };
        match codec::decode(&doc) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                self.decode_failed(&e);
                Err(e)
            }
        }
    }

    /// Called by [`unmarshal`](Self::unmarshal) when a document read by this
    /// reader fails to decode. Readers that cannot trust their position
    /// afterwards latch `err` here.
    fn decode_failed(&mut self, _err: &StreamError) {}

    /// Iterates over the remaining raw documents.
    fn documents(&mut self) -> Documents<'_, Self>
    where
        Self: Sized,
    {
        Documents {
            reader: self,
            done: false,
        }
    }

    /// Iterates over the remaining documents decoded as `T`.
    fn values<T: DeserializeOwned>(&mut self) -> Values<'_, Self, T>
    where
        Self: Sized,
    {
        Values {
            reader: self,
            done: false,
            _marker: PhantomData,
        }
    }
}

/// Pushes documents onto a framed byte stream.
pub trait DocumentWriter {
    /// Writes one document's bytes, adding this framing's delimiters.
    ///
    /// The bytes are not checked for being well-formed JSON.
    fn write_raw(&mut self, doc: &[u8]) -> Result<(), StreamError>;

    /// Flushes the underlying sink.
    fn flush(&mut self) -> Result<(), StreamError>;

    /// Encodes `value` as one JSON document and writes it.
    ///
    /// Arrays are written as a single document, not as one per element.
    fn marshal<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), StreamError>
    where
        Self: Sized,
    {
        let bytes = codec::encode(value)?;
        self.write_raw(&bytes)
    }
}

impl<D: DocumentReader + ?Sized> DocumentReader for &mut D {
    fn read_raw(&mut self) -> Result<Option<RawDocument>, StreamError> {
        (**self).read_raw()
    }

    fn decode_failed(&mut self, err: &StreamError) {
        (**self).decode_failed(err)
    }
}

impl<D: DocumentReader + ?Sized> DocumentReader for Box<D> {
    fn read_raw(&mut self) -> Result<Option<RawDocument>, StreamError> {
        (**self).read_raw()
    }

    fn decode_failed(&mut self, err: &StreamError) {
        (**self).decode_failed(err)
    }
}

impl<D: DocumentWriter + ?Sized> DocumentWriter for &mut D {
    fn write_raw(&mut self, doc: &[u8]) -> Result<(), StreamError> {
        (**self).write_raw(doc)
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        (**self).flush()
    }
}

impl<D: DocumentWriter + ?Sized> DocumentWriter for Box<D> {
    fn write_raw(&mut self, doc: &[u8]) -> Result<(), StreamError> {
        (**self).write_raw(doc)
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        (**self).flush()
    }
}

/// Iterator returned by [`DocumentReader::documents`].
///
/// Ends at end of stream or after yielding the first error.
pub struct Documents<'a, D> {
    reader: &'a mut D,
    done: bool,
}

impl<D: DocumentReader> Iterator for Documents<'_, D> {
    type Item = Result<RawDocument, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_raw() {
            Ok(Some(doc)) => Some(Ok(doc)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Iterator returned by [`DocumentReader::values`].
pub struct Values<'a, D, T> {
    reader: &'a mut D,
    done: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<D: DocumentReader, T: DeserializeOwned> Iterator for Values<'_, D, T> {
    type Item = Result<T, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.unmarshal() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Reads a single byte, or `None` at end of input.
pub(crate) fn read_byte<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    loop {
        let byte = match reader.fill_buf() {
            Ok([]) => return Ok(None),
            Ok(buf) => buf[0],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        reader.consume(1);
        return Ok(Some(byte));
    }
}

/// Fills `out` with up to `want` more bytes; returns how many were read
/// before end of input.
pub(crate) fn read_up_to<R: BufRead>(
    reader: &mut R,
    out: &mut Vec<u8>,
    want: usize,
) -> io::Result<usize> {
    let mut got = 0;
    while got < want {
        let available = match reader.fill_buf() {
            Ok([]) => break,
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        let n = available.len().min(want - got);
        out.extend_from_slice(&available[..n]);
        reader.consume(n);
        got += n;
    }
    Ok(got)
}
