//! An untyped tree covering the serde data model.
//!
//! Leaves from the store and the current state of a bind target both become
//! a [`Node`], so a section can be overlaid on a target whose fields TOML
//! could not represent (unit fields, `u64` above `i64::MAX`, integer map keys).

use serde::ser::{self, Serialize};
use toml::Value;

use super::convert::ConvertError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    /// `()`, unit structs and `None`.
    Unit,
    Bool(bool),
    Integer(i128),
    /// Only used for values above `i128::MAX`.
    Unsigned(u128),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Seq(Vec<Node>),
    Map(Vec<(Node, Node)>),
}

impl Node {
    /// Renders scalar nodes as text.
    pub(crate) fn render(&self) -> Option<String> {
        match self {
            Node::Text(s) => Some(s.clone()),
            Node::Integer(i) => Some(i.to_string()),
            Node::Unsigned(u) => Some(u.to_string()),
            Node::Float(f) => Some(f.to_string()),
            Node::Bool(b) => Some(b.to_string()),
            Node::Unit | Node::Bytes(_) | Node::Seq(_) | Node::Map(_) => None,
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Node::Text(s),
            Value::Integer(i) => Node::Integer(i.into()),
            Value::Float(f) => Node::Float(f),
            Value::Boolean(b) => Node::Bool(b),
            Value::Datetime(dt) => Node::Text(dt.to_string()),
            Value::Array(items) => Node::Seq(items.into_iter().map(Node::from).collect()),
            Value::Table(table) => Node::Map(
                table
                    .into_iter()
                    .map(|(k, v)| (Node::Text(k), Node::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Captures the serialized form of `value`.
pub(crate) fn capture<T: Serialize + ?Sized>(value: &T) -> Result<Node, ConvertError> {
    value.serialize(Capture)
}

struct Capture;

impl ser::Serializer for Capture {
    type Ok = Node;
    type Error = ConvertError;

    type SerializeSeq = SeqCapture;
    type SerializeTuple = SeqCapture;
    type SerializeTupleStruct = SeqCapture;
    type SerializeTupleVariant = VariantCapture<SeqCapture>;
    type SerializeMap = MapCapture;
    type SerializeStruct = MapCapture;
    type SerializeStructVariant = VariantCapture<MapCapture>;

    fn serialize_bool(self, v: bool) -> Result<Node, ConvertError> {
        Ok(Node::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Node, ConvertError> {
        Ok(Node::Integer(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Node, ConvertError> {
        Ok(Node::Integer(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Node, ConvertError> {
        Ok(Node::Integer(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<Node, ConvertError> {
        Ok(Node::Integer(v.into()))
    }

    fn serialize_i128(self, v: i128) -> Result<Node, ConvertError> {
        Ok(Node::Integer(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Node, ConvertError> {
        Ok(Node::Integer(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<Node, ConvertError> {
        Ok(Node::Integer(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Node, ConvertError> {
        Ok(Node::Integer(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<Node, ConvertError> {
        Ok(Node::Integer(v.into()))
    }

    fn serialize_u128(self, v: u128) -> Result<Node, ConvertError> {
        Ok(i128::try_from(v).map_or(Node::Unsigned(v), Node::Integer))
    }

    fn serialize_f32(self, v: f32) -> Result<Node, ConvertError> {
        Ok(Node::Float(v.into()))
    }

    fn serialize_f64(self, v: f64) -> Result<Node, ConvertError> {
        Ok(Node::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Node, ConvertError> {
        Ok(Node::Text(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Node, ConvertError> {
        Ok(Node::Text(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Node, ConvertError> {
        Ok(Node::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Node, ConvertError> {
        Ok(Node::Unit)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Node, ConvertError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Node, ConvertError> {
        Ok(Node::Unit)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Node, ConvertError> {
        Ok(Node::Unit)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Node, ConvertError> {
        Ok(Node::Text(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Node, ConvertError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Node, ConvertError> {
        Ok(variant_node(variant, value.serialize(Capture)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqCapture, ConvertError> {
        Ok(SeqCapture(Vec::with_capacity(len.unwrap_or(0))))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqCapture, ConvertError> {
        Ok(SeqCapture(Vec::with_capacity(len)))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqCapture, ConvertError> {
        Ok(SeqCapture(Vec::with_capacity(len)))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantCapture<SeqCapture>, ConvertError> {
        Ok(VariantCapture {
            variant,
            inner: SeqCapture(Vec::with_capacity(len)),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapCapture, ConvertError> {
        Ok(MapCapture::default())
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<MapCapture, ConvertError> {
        Ok(MapCapture::default())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<VariantCapture<MapCapture>, ConvertError> {
        Ok(VariantCapture {
            variant,
            inner: MapCapture::default(),
        })
    }
}

struct SeqCapture(Vec<Node>);

impl SeqCapture {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), ConvertError> {
        self.0.push(value.serialize(Capture)?);
        Ok(())
    }
}

impl ser::SerializeSeq for SeqCapture {
    type Ok = Node;
    type Error = ConvertError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), ConvertError> {
        self.push(value)
    }

    fn end(self) -> Result<Node, ConvertError> {
        Ok(Node::Seq(self.0))
    }
}

impl ser::SerializeTuple for SeqCapture {
    type Ok = Node;
    type Error = ConvertError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), ConvertError> {
        self.push(value)
    }

    fn end(self) -> Result<Node, ConvertError> {
        Ok(Node::Seq(self.0))
    }
}

impl ser::SerializeTupleStruct for SeqCapture {
    type Ok = Node;
    type Error = ConvertError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), ConvertError> {
        self.push(value)
    }

    fn end(self) -> Result<Node, ConvertError> {
        Ok(Node::Seq(self.0))
    }
}

#[derive(Default)]
struct MapCapture {
    entries: Vec<(Node, Node)>,
    pending_key: Option<Node>,
}

impl ser::SerializeMap for MapCapture {
    type Ok = Node;
    type Error = ConvertError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), ConvertError> {
        self.pending_key = Some(key.serialize(Capture)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), ConvertError> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| <ConvertError as ser::Error>::custom("map value without a key"))?;
        self.entries.push((key, value.serialize(Capture)?));
        Ok(())
    }

    fn end(self) -> Result<Node, ConvertError> {
        Ok(Node::Map(self.entries))
    }
}

impl ser::SerializeStruct for MapCapture {
    type Ok = Node;
    type Error = ConvertError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ConvertError> {
        self.entries
            .push((Node::Text(key.to_owned()), value.serialize(Capture)?));
        Ok(())
    }

    fn end(self) -> Result<Node, ConvertError> {
        Ok(Node::Map(self.entries))
    }
}

struct VariantCapture<S> {
    variant: &'static str,
    inner: S,
}

fn variant_node(variant: &str, content: Node) -> Node {
    Node::Map(vec![(Node::Text(variant.to_owned()), content)])
}

impl ser::SerializeTupleVariant for VariantCapture<SeqCapture> {
    type Ok = Node;
    type Error = ConvertError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), ConvertError> {
        self.inner.push(value)
    }

    fn end(self) -> Result<Node, ConvertError> {
        Ok(variant_node(self.variant, Node::Seq(self.inner.0)))
    }
}

impl ser::SerializeStructVariant for VariantCapture<MapCapture> {
    type Ok = Node;
    type Error = ConvertError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ConvertError> {
        ser::SerializeStruct::serialize_field(&mut self.inner, key, value)
    }

    fn end(self) -> Result<Node, ConvertError> {
        Ok(variant_node(self.variant, Node::Map(self.inner.entries)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    enum Shape {
        Point,
        Circle(u32),
        Rect { w: u32, h: u32 },
    }

    #[test]
    fn test_capture_values_toml_cannot_hold() {
        assert_eq!(capture(&u64::MAX).unwrap(), Node::Integer(u64::MAX.into()));
        assert_eq!(capture(&u128::MAX).unwrap(), Node::Unsigned(u128::MAX));
        assert_eq!(capture(&()).unwrap(), Node::Unit);
        assert_eq!(capture(&None::<u8>).unwrap(), Node::Unit);
    }

    #[test]
    fn test_capture_integer_keys() {
        let map = BTreeMap::from([(1u32, "a")]);
        assert_eq!(
            capture(&map).unwrap(),
            Node::Map(vec![(Node::Integer(1), Node::Text("a".into()))])
        );
    }

    #[test]
    fn test_capture_enum_variants() {
        assert_eq!(capture(&Shape::Point).unwrap(), Node::Text("Point".into()));
        assert_eq!(
            capture(&Shape::Circle(3)).unwrap(),
            Node::Map(vec![(Node::Text("Circle".into()), Node::Integer(3))])
        );
        assert_eq!(
            capture(&Shape::Rect { w: 1, h: 2 }).unwrap(),
            Node::Map(vec![(
                Node::Text("Rect".into()),
                Node::Map(vec![
                    (Node::Text("w".into()), Node::Integer(1)),
                    (Node::Text("h".into()), Node::Integer(2)),
                ])
            )])
        );
    }

    #[test]
    fn test_render_scalars() {
        assert_eq!(Node::Integer(7).render().as_deref(), Some("7"));
        assert_eq!(Node::Unit.render(), None);
    }
}
