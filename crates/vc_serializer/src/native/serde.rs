use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use serde_core::de::{self, MapAccess, SeqAccess, Visitor};
use serde_core::ser::{SerializeMap, SerializeSeq};
use serde_core::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Native, NativeMap, Node, Scalar};

// -----------------------------------------------------------------------------
// Serialize

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Decimal(d) => serializer.serialize_str(d.as_str()),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Date(_) | Self::Time(_) | Self::DateTime(_) => {
                serializer.collect_str(self)
            }
        }
    }
}

impl Serialize for Native {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(scalar) => scalar.serialize(serializer),
            Self::Mapping(map) => {
                let mut state = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    state.serialize_entry(key, &value.value)?;
                }
                state.end()
            }
            Self::Sequence(seq) => {
                let mut state = serializer.serialize_seq(Some(seq.len()))?;
                for item in seq {
                    state.serialize_element(&item.value)?;
                }
                state.end()
            }
        }
    }
}

impl Serialize for Node {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

// -----------------------------------------------------------------------------
// Deserialize

struct NativeVisitor;

impl<'de> Visitor<'de> for NativeVisitor {
    type Value = Native;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a native value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Native, E> {
        Ok(Native::NULL)
    }

    fn visit_none<E: de::Error>(self) -> Result<Native, E> {
        Ok(Native::NULL)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Native, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Native, E> {
        Ok(Native::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Native, E> {
        Ok(Native::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Native, E> {
        Ok(match i64::try_from(v) {
            Ok(v) => Native::from(v),
            Err(_) => Native::from(v as f64),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Native, E> {
        Ok(Native::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Native, E> {
        Ok(Native::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Native, E> {
        Ok(Native::from(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Native, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Native>()? {
            items.push(Node::new(item));
        }
        Ok(Native::Sequence(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Native, A::Error> {
        let mut map = NativeMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<MapKey, Native>()? {
            map.insert(key.0, Node::new(value));
        }
        Ok(Native::Mapping(map))
    }
}

impl<'de> Deserialize<'de> for Native {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NativeVisitor)
    }
}

impl<'de> Deserialize<'de> for Node {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Native::deserialize(deserializer).map(Node::new)
    }
}

/// A mapping key; non-string keys are stringified.
struct MapKey(String);

struct MapKeyVisitor;

impl Visitor<'_> for MapKeyVisitor {
    type Value = MapKey;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a mapping key")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<MapKey, E> {
        Ok(MapKey(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<MapKey, E> {
        Ok(MapKey(v.to_string()))
    }
}

impl<'de> Deserialize<'de> for MapKey {
    #[inline]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MapKeyVisitor)
    }
}
