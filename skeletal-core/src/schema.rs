use std::fmt;

use indexmap::IndexMap;
use serde::de::IgnoredAny;
use serde::{Serialize, Serializer};

/// The ordered key list of one encoded entry.
///
/// Its text form is a JSON object mapping each key to its zero-based position,
/// e.g. keys `a, b, c` render as `{"a":0,"b":1,"c":2}`. The text is the entry's
/// identifier inside an [`EncodedCollection`](crate::EncodedCollection).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySchema {
    keys: Vec<String>,
}

impl KeySchema {
    /// Creates a schema from keys in iteration order.
    pub fn from_keys<K: Into<String>>(keys: impl IntoIterator<Item = K>) -> Self {
        KeySchema {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses schema text back into its ordered key list.
    ///
    /// Only the order of the keys matters; the index values are not checked.
    /// A key repeated in the text keeps its first position.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let map: IndexMap<String, IgnoredAny> = serde_json::from_str(text)?;
        Ok(KeySchema {
            keys: map.into_keys().collect(),
        })
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn into_keys(self) -> Vec<String> {
        self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Serialize for KeySchema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.keys.iter().enumerate().map(|(i, k)| (k, i)))
    }
}

impl fmt::Display for KeySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
