//! Re-framing documents from one stream into another.

use jsonstream_framing::codec;
use jsonstream_framing::{DocumentReader, DocumentWriter, StreamError};
use serde_json::Value;

/// Options for [`convert`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Decode every document and re-encode it compactly.
    pub validate: bool,
    /// Skip documents that fail on their own instead of aborting.
    ///
    /// Read failures are only skippable when the input framing does not
    /// latch errors; decode and write-rejection failures always are.
    pub skip_invalid: bool,
    /// Whether read errors leave the input reader usable.
    pub recoverable_reads: bool,
}

/// Counters reported after a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertStats {
    pub documents: u64,
    pub empty: u64,
    pub skipped: u64,
}

/// Copies every document from `reader` to `writer`, then flushes.
pub fn convert<D, W>(
    reader: &mut D,
    writer: &mut W,
    options: ConvertOptions,
) -> Result<ConvertStats, StreamError>
where
    D: DocumentReader + ?Sized,
    W: DocumentWriter + ?Sized,
{
    let mut stats = ConvertStats::default();

    loop {
        let doc = match reader.read_raw() {
            Ok(Some(doc)) => doc,
            Ok(None) => break,
            // I/O failures do not advance past the bad document.
            Err(e) if options.skip_invalid && options.recoverable_reads && !e.is_io() => {
                tracing::warn!("skipping unreadable document: {}", e);
                stats.skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        if is_blank(&doc) {
            stats.empty += 1;
            continue;
        }

        let result = if options.validate {
            codec::decode::<Value>(&doc)
                .and_then(|value| codec::encode(&value))
                .and_then(|bytes| writer.write_raw(&bytes))
        } else {
            writer.write_raw(&doc)
        };

        match result {
            Ok(()) => stats.documents += 1,
            Err(e) if options.skip_invalid && !e.is_io() && !e.is_framing() => {
                let position = stats.documents + stats.skipped + 1;
                tracing::warn!("skipping document {}: {}", position, e);
                stats.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    writer.flush()?;
    Ok(stats)
}

/// Counts the documents remaining in `reader`, ignoring blank ones the same
/// way [`convert`] does.
pub fn count<D: DocumentReader + ?Sized>(reader: &mut D) -> Result<u64, StreamError> {
    let mut n = 0;
    while let Some(doc) = reader.read_raw()? {
        if !is_blank(&doc) {
            n += 1;
        }
    }
    Ok(n)
}

/// Blank lines and empty records carry no document.
fn is_blank(doc: &[u8]) -> bool {
    doc.iter().all(u8::is_ascii_whitespace)
}
