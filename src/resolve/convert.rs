//! Conversion of untyped leaf values into typed targets.
//!
//! Leaves frequently arrive as text (environment variables, string-valued
//! overrides), so a text leaf parses into numeric and boolean targets, and a
//! numeric or boolean leaf renders to text for string targets. Tables and
//! arrays convert recursively with the same rules.
//!
//! Matching a key to a struct field or enum variant name is left to the
//! store, which passes its rule in as a [`KeyMatch`].

use serde::de::value::{MapAccessDeserializer, MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::{self, DeserializeOwned, Deserializer, IntoDeserializer, Visitor};
use serde::{forward_to_deserialize_any, ser};
use thiserror::Error;
use toml::Value;

use super::node::Node;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConvertError(String);

impl de::Error for ConvertError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

impl ser::Error for ConvertError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Self(msg.to_string())
    }
}

/// Decides whether a store key names a field or variant: `(key, name)`.
pub(crate) type KeyMatch<'m> = &'m dyn Fn(&str, &str) -> bool;

/// Converts a raw leaf (or subtree) into `T`.
pub(crate) fn from_leaf<T: DeserializeOwned>(leaf: Value, keys: KeyMatch<'_>) -> Result<T, ConvertError> {
    from_node(Node::from(leaf), keys)
}

pub(crate) fn from_node<T: DeserializeOwned>(node: Node, keys: KeyMatch<'_>) -> Result<T, ConvertError> {
    T::deserialize(Leaf { node, keys })
}

/// A [`Node`] viewed as a serde deserializer with text coercion.
struct Leaf<'m> {
    node: Node,
    keys: KeyMatch<'m>,
}

impl<'de, 'm> IntoDeserializer<'de, ConvertError> for Leaf<'m> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Returns the candidate `name` refers to, preferring an exact match.
fn match_name(name: String, candidates: &'static [&'static str], keys: KeyMatch<'_>) -> String {
    if candidates.contains(&name.as_str()) {
        return name;
    }
    candidates
        .iter()
        .find(|&&candidate| keys(name.as_str(), candidate))
        .map_or(name, |candidate| (*candidate).to_owned())
}

fn visit_entries<'de, V: Visitor<'de>>(
    entries: Vec<(Node, Node)>,
    keys: KeyMatch<'_>,
    visitor: V,
) -> Result<V::Value, ConvertError> {
    let mut map = MapDeserializer::<_, ConvertError>::new(
        entries
            .into_iter()
            .map(move |(k, v)| (Leaf { node: k, keys }, Leaf { node: v, keys })),
    );
    let value = visitor.visit_map(&mut map)?;
    map.end()?;
    Ok(value)
}

macro_rules! deserialize_integer {
    ($($method:ident)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                let keys = self.keys;
                match self.node {
                    Node::Text(text) => {
                        let text = text.trim();
                        if let Ok(v) = text.parse::<i64>() {
                            visitor.visit_i64(v)
                        } else if let Ok(v) = text.parse::<u64>() {
                            visitor.visit_u64(v)
                        } else if let Ok(v) = text.parse::<i128>() {
                            visitor.visit_i128(v)
                        } else if let Ok(v) = text.parse::<u128>() {
                            visitor.visit_u128(v)
                        } else {
                            Err(de::Error::invalid_value(de::Unexpected::Str(text), &visitor))
                        }
                    }
                    node => Leaf { node, keys }.deserialize_any(visitor),
                }
            }
        )*
    };
}

macro_rules! deserialize_float {
    ($($method:ident)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                let keys = self.keys;
                match self.node {
                    Node::Text(text) => match text.trim().parse::<f64>() {
                        Ok(float) => visitor.visit_f64(float),
                        Err(_) => Err(de::Error::invalid_value(de::Unexpected::Str(&text), &visitor)),
                    },
                    node => Leaf { node, keys }.deserialize_any(visitor),
                }
            }
        )*
    };
}

impl<'de, 'm> Deserializer<'de> for Leaf<'m> {
    type Error = ConvertError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let keys = self.keys;
        match self.node {
            Node::Unit => visitor.visit_unit(),
            Node::Bool(b) => visitor.visit_bool(b),
            Node::Integer(i) => {
                if let Ok(v) = i64::try_from(i) {
                    visitor.visit_i64(v)
                } else if let Ok(v) = u64::try_from(i) {
                    visitor.visit_u64(v)
                } else {
                    visitor.visit_i128(i)
                }
            }
            Node::Unsigned(u) => visitor.visit_u128(u),
            Node::Float(f) => visitor.visit_f64(f),
            Node::Text(s) => visitor.visit_string(s),
            Node::Bytes(bytes) => visitor.visit_byte_buf(bytes),
            Node::Seq(items) => {
                let mut seq = SeqDeserializer::<_, ConvertError>::new(
                    items.into_iter().map(move |node| Leaf { node, keys }),
                );
                let value = visitor.visit_seq(&mut seq)?;
                seq.end()?;
                Ok(value)
            }
            Node::Map(entries) => visit_entries(entries, keys, visitor),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        let keys = self.keys;
        match self.node {
            Node::Text(text) => match parse_bool(&text) {
                Some(b) => visitor.visit_bool(b),
                None => Err(de::Error::invalid_value(de::Unexpected::Str(&text), &visitor)),
            },
            node => Leaf { node, keys }.deserialize_any(visitor),
        }
    }

    deserialize_integer! {
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64 deserialize_i128
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64 deserialize_u128
    }

    deserialize_float! { deserialize_f32 deserialize_f64 }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.node.render() {
            Some(text) => visitor.visit_string(text),
            None => self.deserialize_any(visitor),
        }
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.node {
            Node::Unit => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let keys = self.keys;
        match self.node {
            Node::Map(entries) => {
                let entries = entries
                    .into_iter()
                    .map(|(key, value)| match key {
                        Node::Text(name) => (Node::Text(match_name(name, fields, keys)), value),
                        key => (key, value),
                    })
                    .collect();
                visit_entries(entries, keys, visitor)
            }
            node => Leaf { node, keys }.deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let keys = self.keys;
        match self.node {
            Node::Text(text) => {
                let variant = match_name(text.trim().to_owned(), variants, keys);
                let variant: StringDeserializer<ConvertError> = variant.into_deserializer();
                visitor.visit_enum(variant)
            }
            Node::Map(mut entries) if entries.len() == 1 => {
                let (key, value) = entries.remove(0);
                let key = match key {
                    Node::Text(name) => Node::Text(match_name(name, variants, keys)),
                    key => key,
                };
                let entry = (Leaf { node: key, keys }, Leaf { node: value, keys });
                let access = MapDeserializer::<_, ConvertError>::new(std::iter::once(entry));
                visitor.visit_enum(MapAccessDeserializer::new(access))
            }
            node => Leaf { node, keys }.deserialize_any(visitor),
        }
    }

    forward_to_deserialize_any! {
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier ignored_any
    }
}
