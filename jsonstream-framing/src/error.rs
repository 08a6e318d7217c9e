//! Stream error types.

use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by document readers, writers, and the bulk helpers.
///
/// End of stream is not an error: readers report it as `Ok(None)`.
///
/// The type is `Clone` so that a reader or writer which has latched a failure
/// can hand back the very same error on every later call. I/O and JSON errors
/// are not `Clone` themselves and are therefore shared through an `Arc`.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("JSON decode error: {0}")]
    Decode(Arc<serde_json::Error>),

    #[error("JSON encode error: {0}")]
    Encode(Arc<serde_json::Error>),

    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    #[error("type error: {0}")]
    Type(String),

    #[error("empty document cannot be length-prefixed")]
    EmptyDocument,
}

impl StreamError {
    pub(crate) fn decode(err: serde_json::Error) -> Self {
        StreamError::Decode(Arc::new(err))
    }

    pub(crate) fn encode(err: serde_json::Error) -> Self {
        StreamError::Encode(Arc::new(err))
    }

    /// Returns whether the delimiter structure of the stream was malformed.
    pub fn is_framing(&self) -> bool {
        matches!(self, StreamError::Framing(_))
    }

    /// Returns whether the codec rejected a document.
    pub fn is_decode(&self) -> bool {
        matches!(self, StreamError::Decode(_))
    }

    /// Returns whether the underlying source or sink failed.
    pub fn is_io(&self) -> bool {
        matches!(self, StreamError::Io(_))
    }

    /// Returns the I/O error kind, if this is an I/O error.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            StreamError::Io(e) => Some(e.kind()),
            _ => None,
        }
    }
}

impl From<io::Error> for StreamError {
    fn from(err: io::Error) -> Self {
        StreamError::Io(Arc::new(err))
    }
}

/// Malformed delimiter structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FramingError {
    #[error("invalid length prefix: {0:?}")]
    InvalidLength(String),

    #[error("length prefix must be positive")]
    ZeroLength,

    #[error("truncated document: expected {expected} bytes, got {received}")]
    Truncated { expected: usize, received: usize },

    #[error("document too large: {size} bytes (max {max})")]
    DocumentTooLarge { size: usize, max: usize },

    #[error("stream ended inside a document")]
    Incomplete,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = StreamError::from(FramingError::ZeroLength);
        assert!(err.is_framing());
        assert!(!err.is_io());

        let err = StreamError::from(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(err.is_io());
        assert_eq!(err.io_kind(), Some(io::ErrorKind::BrokenPipe));

        let json_err = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        let err = StreamError::decode(json_err);
        assert!(err.is_decode());
        assert_eq!(err.io_kind(), None);
    }

    #[test]
    fn test_error_display() {
        let err = StreamError::from(FramingError::InvalidLength("".to_string()));
        assert!(err.to_string().contains("invalid length prefix"));

        let err = StreamError::from(FramingError::Truncated {
            expected: 10,
            received: 4,
        });
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains('4'));

        let err = StreamError::from(FramingError::DocumentTooLarge { size: 100, max: 50 });
        assert!(err.to_string().contains("100"));

        assert!(StreamError::EmptyDocument.to_string().contains("empty"));
        assert!(StreamError::Type("not an array".into())
            .to_string()
            .contains("not an array"));
    }

    #[test]
    fn test_cloned_io_error_shares_source() {
        let err = StreamError::from(io::Error::new(io::ErrorKind::TimedOut, "deadline"));
        let cloned = err.clone();
        match (&err, &cloned) {
            (StreamError::Io(a), StreamError::Io(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("expected I/O errors"),
        }
    }
}
