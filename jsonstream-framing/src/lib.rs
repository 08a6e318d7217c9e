//! # jsonstream-framing
//!
//! Reading and writing streams made of many JSON documents.
//!
//! This crate provides:
//! - Four framings: newline-delimited, length-prefixed, record-separator
//!   joined, and concatenated
//! - A common [`DocumentReader`] / [`DocumentWriter`] contract, raw and typed
//! - Runtime framing selection through [`FramingConfig`]
//! - Bulk helpers that drain a reader into a collection
//!
//! ```
//! use jsonstream_framing::{DocumentReader, DocumentWriter, LengthPrefixedReader, LengthPrefixedWriter};
//!
//! let mut writer = LengthPrefixedWriter::new(Vec::new());
//! writer.write_raw(br#"{"a":1}"#).unwrap();
//! writer.marshal(&serde_json::json!({"b": 2})).unwrap();
//! let buf = writer.into_inner();
//! assert_eq!(buf, br#"7{"a":1}7{"b":2}"#);
//!
//! let mut reader = LengthPrefixedReader::new(buf.as_slice());
//! assert_eq!(reader.read_raw().unwrap().unwrap(), br#"{"a":1}"#);
//! let b: serde_json::Value = reader.unmarshal().unwrap().unwrap();
//! assert_eq!(b["b"], 2);
//! assert!(reader.read_raw().unwrap().is_none());
//! ```

pub mod bulk;
pub mod codec;
pub mod concat;
pub mod document;
pub mod error;
pub mod framed;
mod latch;
pub mod length_prefixed;
pub mod ndjson;
pub mod record_separator;
pub mod stream;

pub use bulk::{read_raw_all, unmarshal_all, unmarshal_all_value, Appendable, PartialRead};
pub use concat::{ConcatReader, ConcatWriter};
pub use document::RawDocument;
pub use error::{FramingError, StreamError};
pub use framed::{FramedReader, FramedWriter, Framing, FramingConfig, ParseFramingError};
pub use length_prefixed::{LengthPrefixedReader, LengthPrefixedWriter};
pub use ndjson::{NdjsonReader, NdjsonWriter};
pub use record_separator::{RecordSeparatorReader, RecordSeparatorWriter, DEFAULT_SEPARATOR};
pub use stream::{DocumentReader, DocumentWriter, Documents, Values, DEFAULT_MAX_DOCUMENT_SIZE};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Doc {
        text: String,
        n: i64,
        tags: Vec<String>,
        flag: Option<bool>,
    }

    fn doc_strategy() -> impl Strategy<Value = Doc> {
        (
            ".{0,24}",
            any::<i64>(),
            prop::collection::vec("[a-z\n\u{1e}]{0,6}", 0..4),
            any::<Option<bool>>(),
        )
            .prop_map(|(text, n, tags, flag)| Doc {
                text,
                n,
                tags,
                flag,
            })
    }

    fn write_all(framing: Framing, docs: &[Doc]) -> Vec<u8> {
        let mut writer = FramingConfig::new(framing).writer(Vec::new());
        for doc in docs {
            writer.marshal(doc).unwrap();
        }
        writer.into_inner()
    }

    proptest! {
        #[test]
        fn prop_roundtrip_every_framing(docs in prop::collection::vec(doc_strategy(), 0..8)) {
            for framing in Framing::ALL {
                let buf = write_all(framing, &docs);
                let mut reader = FramingConfig::new(framing).reader(buf.as_slice());
                let mut back: Vec<Doc> = Vec::new();
                let n = unmarshal_all(&mut reader, &mut back).unwrap();
                prop_assert_eq!(n, docs.len());
                prop_assert_eq!(&back, &docs);
                prop_assert!(reader.read_raw().unwrap().is_none());
            }
        }

        #[test]
        fn prop_raw_matches_typed(docs in prop::collection::vec(doc_strategy(), 1..6)) {
            for framing in Framing::ALL {
                let buf = write_all(framing, &docs);

                let mut raw_reader = FramingConfig::new(framing).reader(buf.as_slice());
                let raw = read_raw_all(&mut raw_reader).unwrap();

                let mut typed_reader = FramingConfig::new(framing).reader(buf.as_slice());
                for doc in &raw {
                    let from_raw: Doc = codec::decode(doc).unwrap();
                    let typed: Doc = typed_reader.unmarshal().unwrap().unwrap();
                    prop_assert_eq!(from_raw, typed);
                }
            }
        }

        #[test]
        fn prop_length_prefix_is_exact(body in "[ -~]{1,200}") {
            let mut writer = LengthPrefixedWriter::new(Vec::new());
            writer.write_raw(body.as_bytes()).unwrap();
            let expected = format!("{}{}", body.len(), body);
            prop_assert_eq!(writer.into_inner(), expected.into_bytes());
        }
    }
}
