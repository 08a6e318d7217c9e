//! Drain a reader into a collection.

use crate::codec;
use crate::document::RawDocument;
use crate::error::StreamError;
use crate::stream::DocumentReader;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::VecDeque;
use thiserror::Error;

/// A bulk read that stopped on an error.
///
/// Carries every document read before the failure.
#[derive(Debug, Clone, Error)]
#[error("read failed after {} document(s): {error}", .documents.len())]
pub struct PartialRead {
    pub documents: Vec<RawDocument>,
    #[source]
    pub error: StreamError,
}

impl PartialRead {
    pub fn into_parts(self) -> (Vec<RawDocument>, StreamError) {
        (self.documents, self.error)
    }
}

/// Reads raw documents until end of stream, in order.
pub fn read_raw_all<D: DocumentReader + ?Sized>(
    reader: &mut D,
) -> Result<Vec<RawDocument>, PartialRead> {
    let mut documents = Vec::new();
    loop {
        match reader.read_raw() {
            Ok(Some(doc)) => documents.push(doc),
            Ok(None) => return Ok(documents),
            Err(error) => return Err(PartialRead { documents, error }),
        }
    }
}

/// A sequence that decoded documents can be pushed onto.
///
/// The element type is fixed by the collection, so callers never have to
/// name it.
pub trait Appendable {
    type Item;

    fn append_item(&mut self, item: Self::Item);
}

impl<T> Appendable for Vec<T> {
    type Item = T;

    fn append_item(&mut self, item: T) {
        self.push(item);
    }
}

impl<T> Appendable for VecDeque<T> {
    type Item = T;

    fn append_item(&mut self, item: T) {
        self.push_back(item);
    }
}

/// Decodes every remaining document as the element type of `out` and
/// appends it, in read order.
///
/// Values decoded before a failure stay in `out`.
pub fn unmarshal_all<C, D>(reader: &mut D, out: &mut C) -> Result<usize, StreamError>
where
    C: Appendable + ?Sized,
    C::Item: DeserializeOwned,
    D: DocumentReader,
{
    let mut count = 0;
    while let Some(value) = reader.unmarshal::<C::Item>()? {
        out.append_item(value);
        count += 1;
    }
    Ok(count)
}

/// Decodes every remaining document and appends it to the JSON array `out`.
///
/// Fails with [`StreamError::Type`] before reading anything if `out` is not
/// an array.
pub fn unmarshal_all_value<D: DocumentReader + ?Sized>(
    reader: &mut D,
    out: &mut Value,
) -> Result<usize, StreamError> {
    let items = match out {
        Value::Array(items) => items,
        other => {
            return Err(StreamError::Type(format!(
                "expected a JSON array to append to, got {}",
                json_type_name(other)
            )))
        }
    };

    let mut count = 0;
    while let Some(doc) = reader.read_raw()? {
        items.push(codec::decode(&doc)?);
        count += 1;
    }
    Ok(count)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
