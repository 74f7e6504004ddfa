//! OData URL literals for keys and function parameters.
//!
//! Values are written through a small serde serializer rather than through
//! JSON, so that types like [`crate::Guid`] can pick their literal form.
//! Scalars become one literal; structs and string-keyed maps of scalars become
//! `name=literal` parts for composite keys. Anything else is structured and
//! has no literal form.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use serde::Serialize;
use serde::ser::{self, Impossible};
use serde_json::Value;
use thiserror::Error;

use crate::error::ODataError;
use crate::guid::GUID_MARKER;

/// A rendered key or parameter value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Literal {
    Scalar(String),
    /// Named parts in serialization order.
    Record(Vec<(String, String)>),
}

#[derive(Debug, Error)]
pub(crate) enum LiteralError {
    #[error("structured values cannot be written as URL literals")]
    Structured,

    #[error("{0}")]
    Custom(String),
}

impl ser::Error for LiteralError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}

/// Renders `value` as an OData URL literal.
///
/// Strings are single-quoted with embedded quotes doubled; numbers, booleans
/// and `null` are written as is; GUIDs are unquoted. Arrays and objects have
/// no literal form.
///
/// ## Examples
///
/// ```
/// use odata_client::literal;
///
/// assert_eq!(literal("id", &42).unwrap(), "42");
/// assert_eq!(literal("name", &"O'Neil").unwrap(), "'O''Neil'");
/// ```
pub fn literal<V: Serialize + ?Sized>(name: &str, value: &V) -> Result<String, ODataError> {
    let error = |message: String| ODataError::Parameter {
        name: name.to_string(),
        message,
    };
    match render(value) {
        Ok(Literal::Scalar(text)) => Ok(text),
        Ok(Literal::Record(_)) => Err(error(LiteralError::Structured.to_string())),
        Err(e) => Err(error(e.to_string())),
    }
}

pub(crate) fn render<V: Serialize + ?Sized>(value: &V) -> Result<Literal, LiteralError> {
    value.serialize(LiteralSerializer)
}

fn quoted(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn float(value: f64, json: Result<String, serde_json::Error>) -> Result<Literal, LiteralError> {
    let text = if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let keyword = if value > 0.0 { "INF" } else { "-INF" };
        keyword.to_string()
    } else {
        json.map_err(|e| LiteralError::Custom(e.to_string()))?
    };
    Ok(Literal::Scalar(text))
}

fn scalar(text: impl ToString) -> Result<Literal, LiteralError> {
    Ok(Literal::Scalar(text.to_string()))
}

struct LiteralSerializer;

impl ser::Serializer for LiteralSerializer {
    type Ok = Literal;
    type Error = LiteralError;
    type SerializeSeq = Impossible<Literal, LiteralError>;
    type SerializeTuple = Impossible<Literal, LiteralError>;
    type SerializeTupleStruct = Impossible<Literal, LiteralError>;
    type SerializeTupleVariant = Impossible<Literal, LiteralError>;
    type SerializeMap = RecordSerializer;
    type SerializeStruct = RecordSerializer;
    type SerializeStructVariant = Impossible<Literal, LiteralError>;

    fn serialize_bool(self, v: bool) -> Result<Literal, LiteralError> {
        scalar(v)
    }

    fn serialize_i8(self, v: i8) -> Result<Literal, LiteralError> {
        scalar(v)
    }

    fn serialize_i16(self, v: i16) -> Result<Literal, LiteralError> {
        scalar(v)
    }

    fn serialize_i32(self, v: i32) -> Result<Literal, LiteralError> {
        scalar(v)
    }

    fn serialize_i64(self, v: i64) -> Result<Literal, LiteralError> {
        scalar(v)
    }

    fn serialize_i128(self, v: i128) -> Result<Literal, LiteralError> {
        scalar(v)
    }

    fn serialize_u8(self, v: u8) -> Result<Literal, LiteralError> {
        scalar(v)
    }

    fn serialize_u16(self, v: u16) -> Result<Literal, LiteralError> {
        scalar(v)
    }

    fn serialize_u32(self, v: u32) -> Result<Literal, LiteralError> {
        scalar(v)
    }

    fn serialize_u64(self, v: u64) -> Result<Literal, LiteralError> {
        scalar(v)
    }

    fn serialize_u128(self, v: u128) -> Result<Literal, LiteralError> {
        scalar(v)
    }

    fn serialize_f32(self, v: f32) -> Result<Literal, LiteralError> {
        float(f64::from(v), serde_json::to_string(&v))
    }

    fn serialize_f64(self, v: f64) -> Result<Literal, LiteralError> {
        float(v, serde_json::to_string(&v))
    }

    fn serialize_char(self, v: char) -> Result<Literal, LiteralError> {
        Ok(Literal::Scalar(quoted(v.encode_utf8(&mut [0; 4]))))
    }

    fn serialize_str(self, v: &str) -> Result<Literal, LiteralError> {
        Ok(Literal::Scalar(quoted(v)))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Literal, LiteralError> {
        Ok(Literal::Scalar(format!("binary'{}'", URL_SAFE.encode(v))))
    }

    fn serialize_none(self) -> Result<Literal, LiteralError> {
        scalar("null")
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Literal, LiteralError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Literal, LiteralError> {
        scalar("null")
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Literal, LiteralError> {
        scalar("null")
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Literal, LiteralError> {
        Ok(Literal::Scalar(quoted(variant)))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Literal, LiteralError> {
        if name != GUID_MARKER {
            return value.serialize(self);
        }
        match serde_json::to_value(value) {
            Ok(Value::String(text)) => Ok(Literal::Scalar(text)),
            Ok(other) => Err(LiteralError::Custom(format!("invalid GUID value {other}"))),
            Err(e) => Err(LiteralError::Custom(e.to_string())),
        }
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Literal, LiteralError> {
        Err(LiteralError::Structured)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, LiteralError> {
        Err(LiteralError::Structured)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, LiteralError> {
        Err(LiteralError::Structured)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, LiteralError> {
        Err(LiteralError::Structured)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, LiteralError> {
        Err(LiteralError::Structured)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, LiteralError> {
        Ok(RecordSerializer::default())
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, LiteralError> {
        Ok(RecordSerializer::default())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, LiteralError> {
        Err(LiteralError::Structured)
    }
}

/// Collects the parts of a struct or map; every part must be a scalar.
#[derive(Default)]
struct RecordSerializer {
    parts: Vec<(String, String)>,
    pending_key: Option<String>,
}

impl RecordSerializer {
    fn push<T: Serialize + ?Sized>(&mut self, name: String, value: &T) -> Result<(), LiteralError> {
        match render(value)? {
            Literal::Scalar(text) => {
                self.parts.push((name, text));
                Ok(())
            }
            Literal::Record(_) => Err(LiteralError::Structured),
        }
    }
}

impl ser::SerializeStruct for RecordSerializer {
    type Ok = Literal;
    type Error = LiteralError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), LiteralError> {
        self.push(key.to_string(), value)
    }

    fn end(self) -> Result<Literal, LiteralError> {
        Ok(Literal::Record(self.parts))
    }
}

impl ser::SerializeMap for RecordSerializer {
    type Ok = Literal;
    type Error = LiteralError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), LiteralError> {
        match serde_json::to_value(key) {
            Ok(Value::String(name)) => {
                self.pending_key = Some(name);
                Ok(())
            }
            Ok(other) => Err(LiteralError::Custom(format!(
                "map keys must be strings, got {other}"
            ))),
            Err(e) => Err(LiteralError::Custom(e.to_string())),
        }
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), LiteralError> {
        let name = self
            .pending_key
            .take()
            .ok_or_else(|| LiteralError::Custom("map value without a key".to_string()))?;
        self.push(name, value)
    }

    fn end(self) -> Result<Literal, LiteralError> {
        Ok(Literal::Record(self.parts))
    }
}
