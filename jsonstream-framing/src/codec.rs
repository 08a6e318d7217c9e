//! JSON document codec.
//!
//! Thin layer over `serde_json` that maps its errors into [`StreamError`].
//! The concatenated framer additionally relies on [`PrefixDecoder`], which
//! pulls exactly one complete value at a time off a byte stream.

use crate::document::RawDocument;
use crate::error::{FramingError, StreamError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::de::IoRead;
use serde_json::value::RawValue;
use serde_json::StreamDeserializer;
use std::io::Read;

/// Serializes a value into a compact JSON document.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StreamError> {
    serde_json::to_vec(value).map_err(StreamError::encode)
}

/// Decodes a whole buffer as exactly one JSON value.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, StreamError> {
    serde_json::from_slice(data).map_err(StreamError::decode)
}

/// Decodes one value at a time from the front of a byte stream.
///
/// Whitespace between values is skipped; no other delimiter is required as
/// long as each value is structurally self-terminating.
pub struct PrefixDecoder<R: Read> {
    inner: StreamDeserializer<'static, IoRead<R>, Box<RawValue>>,
}

impl<R: Read> PrefixDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: serde_json::Deserializer::from_reader(reader).into_iter(),
        }
    }

    /// Decodes the next value and returns its exact bytes.
    ///
    /// Returns `Ok(None)` when the stream ends between values.
    pub fn next_document(&mut self) -> Result<Option<RawDocument>, StreamError> {
        match self.inner.next() {
            None => Ok(None),
            Some(Ok(raw)) => Ok(Some(RawDocument::copy_from_slice(raw.get().as_bytes()))),
            Some(Err(e)) if e.is_io() => Err(StreamError::from(std::io::Error::from(e))),
            Some(Err(e)) if e.is_eof() => Err(FramingError::Incomplete.into()),
            Some(Err(e)) => Err(StreamError::decode(e)),
        }
    }

    /// Number of bytes consumed from the stream so far.
    pub fn byte_offset(&self) -> usize {
        self.inner.byte_offset()
    }
}
