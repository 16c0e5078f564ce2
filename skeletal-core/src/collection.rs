use std::iter::FusedIterator;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::flat::Flat;

/// Error type for the textual and binary forms of a collection.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cbor encode error: {0}")]
    CborEncode(#[from] ciborium::ser::Error<std::io::Error>),
    #[error("cbor decode error: {0}")]
    CborDecode(#[from] ciborium::de::Error<std::io::Error>),
}

/// The encoded form: schema text → value array, in input order.
///
/// Schema text is the only identifier of an entry. Inserting under a schema
/// that is already present replaces the values and keeps the entry's original
/// position.
///
/// Serializes as a plain ordered map, e.g.
/// `{"{\"a\":0,\"b\":1}":[1,2]}` in JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedCollection {
    entries: IndexMap<String, Vec<Flat>>,
}

impl EncodedCollection {
    /// Creates a new empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, returning the values it replaced, if any.
    pub fn insert(&mut self, schema: impl Into<String>, values: Vec<Flat>) -> Option<Vec<Flat>> {
        self.entries.insert(schema.into(), values)
    }

    /// Returns the values stored under a schema.
    pub fn get(&self, schema: &str) -> Option<&[Flat]> {
        self.entries.get(schema).map(Vec::as_slice)
    }

    /// Iterates over (schema text, values) pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[Flat])> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Starts a fresh pass over the value arrays in insertion order.
    pub fn values(&self) -> Values<'_> {
        Values {
            inner: self.entries.values(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> Result<String, FormatError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, FormatError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serializes this collection to CBOR bytes.
    pub fn to_cbor(&self) -> Result<Vec<u8>, FormatError> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes)?;
        Ok(bytes)
    }

    /// Deserializes a collection from CBOR bytes.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, FormatError> {
        Ok(ciborium::from_reader(bytes)?)
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<Flat>)> for EncodedCollection {
    fn from_iter<I: IntoIterator<Item = (S, Vec<Flat>)>>(iter: I) -> Self {
        let mut collection = EncodedCollection::new();
        for (schema, values) in iter {
            collection.insert(schema, values);
        }
        collection
    }
}

impl<'a> IntoIterator for &'a EncodedCollection {
    type Item = &'a [Flat];
    type IntoIter = Values<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.values()
    }
}

/// Forward pass over the value arrays of an [`EncodedCollection`].
#[derive(Debug, Clone)]
pub struct Values<'a> {
    inner: indexmap::map::Values<'a, String, Vec<Flat>>,
}

impl<'a> Iterator for Values<'a> {
    type Item = &'a [Flat];

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Vec::as_slice)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Values<'_> {}

impl FusedIterator for Values<'_> {}

/// Iterates over the value arrays of a collection.
pub fn iterate(collection: &EncodedCollection) -> Values<'_> {
    collection.values()
}
