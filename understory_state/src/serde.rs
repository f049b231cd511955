// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `serde` support, mapped onto the JSON data model.
//!
//! Absent object members are skipped, absent array items and an absent
//! top-level value serialize as `null`. Numbers with no fractional part that
//! fit an `i64` serialize as integers.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use ::serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use ::serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::key::Key;
use crate::value::Value;

// 2^63, the first f64 past i64::MAX.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent | Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => {
                if n.fract() == 0.0 && *n >= -I64_BOUND && *n < I64_BOUND {
                    #[expect(
                        clippy::cast_possible_truncation,
                        reason = "integral and in range"
                    )]
                    let int = *n as i64;
                    serializer.serialize_i64(int)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(members) => {
                let present = members.iter().filter(|(_, v)| !v.is_absent());
                let mut map = serializer.serialize_map(Some(present.clone().count()))?;
                for (name, member) in present {
                    map.serialize_entry(name, member)?;
                }
                map.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON-like value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        // Same rounding as JSON numbers.
        Ok(Value::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut members = BTreeMap::new();
        while let Some((name, member)) = map.next_entry::<String, Value>()? {
            members.insert(name, member);
        }
        Ok(Value::Object(members))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Field(name) => serializer.serialize_str(name),
            Self::Index(index) => serializer.serialize_u64(*index as u64),
        }
    }
}

struct KeyVisitor;

impl Visitor<'_> for KeyVisitor {
    type Value = Key;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a field name or an array index")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Key, E> {
        usize::try_from(v)
            .map(Key::Index)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Key, E> {
        usize::try_from(v)
            .map(Key::Index)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Key, E> {
        Ok(Key::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Key, E> {
        Ok(Key::Field(v))
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(KeyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn absent_members_are_skipped() {
        let mut members = BTreeMap::new();
        members.insert(String::from("a"), Value::from(1));
        members.insert(String::from("b"), Value::Absent);
        members.insert(String::from("c"), Value::array([Value::Absent, Value::from(0.5)]));
        let json = serde_json::to_string(&Value::Object(members)).unwrap();
        assert_eq!(json, r#"{"a":1,"c":[null,0.5]}"#);
        assert_eq!(serde_json::to_string(&Value::Absent).unwrap(), "null");
    }

    #[test]
    fn parses_json() {
        let value: Value = serde_json::from_str(r#"{"n":[1,2.5,null],"s":"x","t":true}"#).unwrap();
        assert_eq!(
            value,
            Value::object([
                ("n", Value::array([Value::from(1), Value::from(2.5), Value::Null])),
                ("s", Value::from("x")),
                ("t", Value::from(true)),
            ])
        );
    }

    #[test]
    fn keys_keep_their_kind() {
        let path = vec![Key::from("a"), Key::Index(2)];
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#"["a",2]"#);
        let back: Vec<Key> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
