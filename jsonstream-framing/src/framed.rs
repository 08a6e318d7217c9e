//! Runtime selection of a framing.

use crate::concat::{ConcatReader, ConcatWriter};
use crate::document::RawDocument;
use crate::error::StreamError;
use crate::length_prefixed::{LengthPrefixedReader, LengthPrefixedWriter};
use crate::ndjson::{NdjsonReader, NdjsonWriter};
use crate::record_separator::{RecordSeparatorReader, RecordSeparatorWriter, DEFAULT_SEPARATOR};
use crate::stream::{DocumentReader, DocumentWriter, DEFAULT_MAX_DOCUMENT_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

/// The four supported framings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framing {
    /// One document per line.
    #[default]
    #[serde(alias = "jsonl", alias = "lines")]
    Ndjson,
    /// Decimal byte length before each document.
    #[serde(alias = "lp")]
    LengthPrefixed,
    /// Documents joined by a separator byte.
    #[serde(alias = "seq", alias = "rs")]
    RecordSeparator,
    /// Documents back to back.
    #[serde(alias = "concat")]
    Concatenated,
}

impl Framing {
    pub const ALL: [Framing; 4] = [
        Framing::Ndjson,
        Framing::LengthPrefixed,
        Framing::RecordSeparator,
        Framing::Concatenated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Framing::Ndjson => "ndjson",
            Framing::LengthPrefixed => "length-prefixed",
            Framing::RecordSeparator => "record-separator",
            Framing::Concatenated => "concatenated",
        }
    }

    /// Returns whether a failure permanently disables readers and writers of
    /// this framing.
    pub fn latches_errors(&self) -> bool {
        !matches!(self, Framing::Ndjson)
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown framing name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown framing {0:?} (expected ndjson, length-prefixed, record-separator or concatenated)")]
pub struct ParseFramingError(String);

impl FromStr for Framing {
    type Err = ParseFramingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ndjson" | "jsonl" | "lines" => Ok(Framing::Ndjson),
            "length-prefixed" | "lp" => Ok(Framing::LengthPrefixed),
            "record-separator" | "seq" | "rs" => Ok(Framing::RecordSeparator),
            "concatenated" | "concat" => Ok(Framing::Concatenated),
            _ => Err(ParseFramingError(s.to_string())),
        }
    }
}

/// Framing configuration for one side of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    /// Which framing to use.
    pub framing: Framing,
    /// Separator byte for the record-separator framing.
    pub separator: u8,
    /// Largest document a reader will accept, in bytes.
    pub max_document_size: usize,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            framing: Framing::default(),
            separator: DEFAULT_SEPARATOR,
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
        }
    }
}

impl FramingConfig {
    pub fn new(framing: Framing) -> Self {
        Self {
            framing,
            ..Self::default()
        }
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_max_document_size(mut self, max: usize) -> Self {
        self.max_document_size = max;
        self
    }

    /// Builds a reader over `source`.
    pub fn reader<R: Read>(&self, source: R) -> FramedReader<R> {
        let max = self.max_document_size;
        match self.framing {
            Framing::Ndjson => {
                FramedReader::Ndjson(NdjsonReader::new(source).with_max_document_size(max))
            }
            Framing::LengthPrefixed => FramedReader::LengthPrefixed(
                LengthPrefixedReader::new(source).with_max_document_size(max),
            ),
            Framing::RecordSeparator => FramedReader::RecordSeparator(
                RecordSeparatorReader::with_separator(source, self.separator)
                    .with_max_document_size(max),
            ),
            Framing::Concatenated => {
                FramedReader::Concatenated(ConcatReader::new(source).with_max_document_size(max))
            }
        }
    }

    /// Builds a writer over `sink`.
    pub fn writer<W: Write>(&self, sink: W) -> FramedWriter<W> {
        match self.framing {
            Framing::Ndjson => FramedWriter::Ndjson(NdjsonWriter::new(sink)),
            Framing::LengthPrefixed => FramedWriter::LengthPrefixed(LengthPrefixedWriter::new(sink)),
            Framing::RecordSeparator => FramedWriter::RecordSeparator(
                RecordSeparatorWriter::with_separator(sink, self.separator),
            ),
            Framing::Concatenated => FramedWriter::Concatenated(ConcatWriter::new(sink)),
        }
    }
}

impl From<Framing> for FramingConfig {
    fn from(framing: Framing) -> Self {
        Self::new(framing)
    }
}

/// A reader of any framing, chosen at runtime.
pub enum FramedReader<R: Read> {
    Ndjson(NdjsonReader<R>),
    LengthPrefixed(LengthPrefixedReader<R>),
    RecordSeparator(RecordSeparatorReader<R>),
    Concatenated(ConcatReader<R>),
}

impl<R: Read> FramedReader<R> {
    pub fn framing(&self) -> Framing {
        match self {
            FramedReader::Ndjson(_) => Framing::Ndjson,
            FramedReader::LengthPrefixed(_) => Framing::LengthPrefixed,
            FramedReader::RecordSeparator(_) => Framing::RecordSeparator,
            FramedReader::Concatenated(_) => Framing::Concatenated,
        }
    }
}

impl<R: Read> DocumentReader for FramedReader<R> {
    fn read_raw(&mut self) -> Result<Option<RawDocument>, StreamError> {
        match self {
            FramedReader::Ndjson(r) => r.read_raw(),
            FramedReader::LengthPrefixed(r) => r.read_raw(),
            FramedReader::RecordSeparator(r) => r.read_raw(),
            FramedReader::Concatenated(r) => r.read_raw(),
        }
    }

    fn decode_failed(&mut self, err: &StreamError) {
        match self {
            FramedReader::Ndjson(r) => r.decode_failed(err),
            FramedReader::LengthPrefixed(r) => r.decode_failed(err),
            FramedReader::RecordSeparator(r) => r.decode_failed(err),
            FramedReader::Concatenated(r) => r.decode_failed(err),
        }
    }
}

/// A writer of any framing, chosen at runtime.
pub enum FramedWriter<W: Write> {
    Ndjson(NdjsonWriter<W>),
    LengthPrefixed(LengthPrefixedWriter<W>),
    RecordSeparator(RecordSeparatorWriter<W>),
    Concatenated(ConcatWriter<W>),
}

impl<W: Write> FramedWriter<W> {
    pub fn framing(&self) -> Framing {
        match self {
            FramedWriter::Ndjson(_) => Framing::Ndjson,
            FramedWriter::LengthPrefixed(_) => Framing::LengthPrefixed,
            FramedWriter::RecordSeparator(_) => Framing::RecordSeparator,
            FramedWriter::Concatenated(_) => Framing::Concatenated,
        }
    }

    pub fn into_inner(self) -> W {
        match self {
            FramedWriter::Ndjson(w) => w.into_inner(),
            FramedWriter::LengthPrefixed(w) => w.into_inner(),
            FramedWriter::RecordSeparator(w) => w.into_inner(),
            FramedWriter::Concatenated(w) => w.into_inner(),
        }
    }
}

impl<W: Write> DocumentWriter for FramedWriter<W> {
    fn write_raw(&mut self, doc: &[u8]) -> Result<(), StreamError> {
        match self {
            FramedWriter::Ndjson(w) => w.write_raw(doc),
            FramedWriter::LengthPrefixed(w) => w.write_raw(doc),
            FramedWriter::RecordSeparator(w) => w.write_raw(doc),
            FramedWriter::Concatenated(w) => w.write_raw(doc),
        }
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        match self {
            FramedWriter::Ndjson(w) => w.flush(),
            FramedWriter::LengthPrefixed(w) => w.flush(),
            FramedWriter::RecordSeparator(w) => w.flush(),
            FramedWriter::Concatenated(w) => w.flush(),
        }
    }
}
