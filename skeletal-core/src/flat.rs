use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, MapAccess, SeqAccess, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;

/// A value as stored inside an encoded value array.
///
/// Flat values are plain trees with no identities: a repeated instance is
/// written as a reference marker string (see [`crate::marker`]).
///
/// Serializes as the natural self-describing form (JSON null, bool, number,
/// string, array, map), so any format that keeps map order and tells arrays
/// from maps can carry it.
#[derive(Debug, Clone, PartialEq)]
pub enum Flat {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Flat>),
    Object(IndexMap<String, Flat>),
}

impl Flat {
    /// Returns true for arrays and objects.
    pub fn is_structured(&self) -> bool {
        matches!(self, Flat::Array(_) | Flat::Object(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Flat::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Flat {
    fn from(v: &str) -> Self {
        Flat::String(v.to_string())
    }
}

impl From<i64> for Flat {
    fn from(v: i64) -> Self {
        Flat::Number(v.into())
    }
}

impl From<i32> for Flat {
    fn from(v: i32) -> Self {
        Flat::Number(v.into())
    }
}

fn out_of_range<E: de::Error>(v: impl fmt::Display) -> E {
    E::custom(format_args!("integer {v} is outside the 64-bit range"))
}

impl Serialize for Flat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Flat::Null => serializer.serialize_unit(),
            Flat::Bool(b) => serializer.serialize_bool(*b),
            Flat::Number(n) => n.serialize(serializer),
            Flat::String(s) => serializer.serialize_str(s),
            Flat::Array(items) => serializer.collect_seq(items),
            Flat::Object(entries) => serializer.collect_map(entries),
        }
    }
}

impl<'de> Deserialize<'de> for Flat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FlatVisitor;

        impl<'de> Visitor<'de> for FlatVisitor {
            type Value = Flat;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("null, bool, number, string, array or map")
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Flat::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Flat::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Flat::deserialize(deserializer)
            }

            fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Flat::Bool(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Flat::Number(v.into()))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Flat::Number(v.into()))
            }

            // Numbers are bounded by `serde_json::Number`.
            fn visit_i128<E>(self, v: i128) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                match i64::try_from(v) {
                    Ok(v) => Ok(Flat::Number(v.into())),
                    Err(_) => Err(out_of_range(v)),
                }
            }

            fn visit_u128<E>(self, v: u128) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                match u64::try_from(v) {
                    Ok(v) => Ok(Flat::Number(v.into())),
                    Err(_) => Err(out_of_range(v)),
                }
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Number::from_f64(v)
                    .map(Flat::Number)
                    .ok_or_else(|| E::invalid_value(Unexpected::Float(v), &"a finite number"))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Flat::String(v.to_string()))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Flat::String(v))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Flat::Array(items))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, Flat>()? {
                    entries.insert(key, value);
                }
                Ok(Flat::Object(entries))
            }
        }

        deserializer.deserialize_any(FlatVisitor)
    }
}
