//! Sticky failure state shared by the framers that cannot resynchronize.

use crate::error::StreamError;

/// Holds the first failure seen by a reader or writer.
///
/// Once set, the latch is never cleared.
#[derive(Debug, Default)]
pub(crate) struct ErrorLatch {
    err: Option<StreamError>,
}

impl ErrorLatch {
    /// Returns the latched error, if any.
    pub(crate) fn check(&self) -> Result<(), StreamError> {
        match &self.err {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// Records the failure of `result`, then passes it through unchanged.
    pub(crate) fn guard<T>(
        &mut self,
        kind: &'static str,
        result: Result<T, StreamError>,
    ) -> Result<T, StreamError> {
        if let Err(e) = &result {
            self.record(kind, e);
        }
        result
    }

    /// Latches `err` unless an earlier failure is already held.
    pub(crate) fn record(&mut self, kind: &'static str, err: &StreamError) {
        if self.err.is_none() {
            tracing::debug!("{} stream failed, latching error: {}", kind, err);
            self.err = Some(err.clone());
        }
    }

    pub(crate) fn is_set(&self) -> bool {
        self.err.is_some()
    }
}
