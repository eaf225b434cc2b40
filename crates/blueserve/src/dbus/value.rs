//! Decoded bus values
//!
//! The transport layer hands the router already-decoded arguments and
//! encodes whatever the router returns. `Value` is that shared currency.

use super::path::ObjectPath;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::Cursor;

/// Type tag of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    String,
    ObjectPath,
    Bytes,
    StringArray,
    ObjectPathArray,
    Dict,
}

impl ValueKind {
    /// Bus type signature for this kind
    pub fn signature(&self) -> &'static str {
        match self {
            ValueKind::Bool => "b",
            ValueKind::Byte => "y",
            ValueKind::Int16 => "n",
            ValueKind::UInt16 => "q",
            ValueKind::Int32 => "i",
            ValueKind::UInt32 => "u",
            ValueKind::Int64 => "x",
            ValueKind::UInt64 => "t",
            ValueKind::Double => "d",
            ValueKind::String => "s",
            ValueKind::ObjectPath => "o",
            ValueKind::Bytes => "ay",
            ValueKind::StringArray => "as",
            ValueKind::ObjectPathArray => "ao",
            ValueKind::Dict => "a{sv}",
        }
    }

    /// Encoded width of fixed-size scalar kinds
    fn fixed_width(&self) -> Option<usize> {
        match self {
            ValueKind::Bool | ValueKind::Byte => Some(1),
            ValueKind::Int16 | ValueKind::UInt16 => Some(2),
            ValueKind::Int32 | ValueKind::UInt32 => Some(4),
            ValueKind::Int64 | ValueKind::UInt64 | ValueKind::Double => Some(8),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signature())
    }
}

/// A decoded bus value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    String(String),
    ObjectPath(ObjectPath),
    Bytes(Vec<u8>),
    StringArray(Vec<String>),
    ObjectPathArray(Vec<ObjectPath>),
    /// `a{sv}` dictionary; entry order is preserved
    Dict(Vec<(String, Value)>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Byte(_) => ValueKind::Byte,
            Value::Int16(_) => ValueKind::Int16,
            Value::UInt16(_) => ValueKind::UInt16,
            Value::Int32(_) => ValueKind::Int32,
            Value::UInt32(_) => ValueKind::UInt32,
            Value::Int64(_) => ValueKind::Int64,
            Value::UInt64(_) => ValueKind::UInt64,
            Value::Double(_) => ValueKind::Double,
            Value::String(_) => ValueKind::String,
            Value::ObjectPath(_) => ValueKind::ObjectPath,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::StringArray(_) => ValueKind::StringArray,
            Value::ObjectPathArray(_) => ValueKind::ObjectPathArray,
            Value::Dict(_) => ValueKind::Dict,
        }
    }

    pub fn signature(&self) -> &'static str {
        self.kind().signature()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::ObjectPath(p) => Some(p.as_str()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Look up an entry of an `a{sv}` dictionary
    pub fn dict_get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Dict(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Encode as the little-endian byte payload carried by GATT values
    ///
    /// Container kinds other than byte arrays have no GATT encoding.
    pub fn to_le_bytes(&self) -> Option<Vec<u8>> {
        let mut out = Vec::new();
        // Writes into a Vec cannot fail
        let written = match self {
            Value::Bool(b) => out.write_u8(u8::from(*b)),
            Value::Byte(v) => out.write_u8(*v),
            Value::Int16(v) => out.write_i16::<LittleEndian>(*v),
            Value::UInt16(v) => out.write_u16::<LittleEndian>(*v),
            Value::Int32(v) => out.write_i32::<LittleEndian>(*v),
            Value::UInt32(v) => out.write_u32::<LittleEndian>(*v),
            Value::Int64(v) => out.write_i64::<LittleEndian>(*v),
            Value::UInt64(v) => out.write_u64::<LittleEndian>(*v),
            Value::Double(v) => out.write_f64::<LittleEndian>(*v),
            Value::String(s) => return Some(s.as_bytes().to_vec()),
            Value::ObjectPath(p) => return Some(p.as_str().as_bytes().to_vec()),
            Value::Bytes(b) => return Some(b.clone()),
            Value::StringArray(_) | Value::ObjectPathArray(_) | Value::Dict(_) => return None,
        };
        written.ok().map(|_| out)
    }

    /// Decode a GATT byte payload into a value of the given kind
    ///
    /// Fixed-width kinds require an exact length.
    pub fn from_le_bytes(kind: ValueKind, bytes: &[u8]) -> Option<Value> {
        if let Some(width) = kind.fixed_width() {
            if bytes.len() != width {
                return None;
            }
        }

        let mut cursor = Cursor::new(bytes);
        let value = match kind {
            ValueKind::Bool => Value::Bool(cursor.read_u8().ok()? != 0),
            ValueKind::Byte => Value::Byte(cursor.read_u8().ok()?),
            ValueKind::Int16 => Value::Int16(cursor.read_i16::<LittleEndian>().ok()?),
            ValueKind::UInt16 => Value::UInt16(cursor.read_u16::<LittleEndian>().ok()?),
            ValueKind::Int32 => Value::Int32(cursor.read_i32::<LittleEndian>().ok()?),
            ValueKind::UInt32 => Value::UInt32(cursor.read_u32::<LittleEndian>().ok()?),
            ValueKind::Int64 => Value::Int64(cursor.read_i64::<LittleEndian>().ok()?),
            ValueKind::UInt64 => Value::UInt64(cursor.read_u64::<LittleEndian>().ok()?),
            ValueKind::Double => Value::Double(cursor.read_f64::<LittleEndian>().ok()?),
            ValueKind::String => Value::String(String::from_utf8(bytes.to_vec()).ok()?),
            ValueKind::ObjectPath => {
                let text = std::str::from_utf8(bytes).ok()?;
                Value::ObjectPath(ObjectPath::new(text).ok()?)
            }
            ValueKind::Bytes => Value::Bytes(bytes.to_vec()),
            ValueKind::StringArray | ValueKind::ObjectPathArray | ValueKind::Dict => return None,
        };
        Some(value)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Byte(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::UInt16(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::UInt32(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<ObjectPath> for Value {
    fn from(v: ObjectPath) -> Self {
        Value::ObjectPath(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::StringArray(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signatures() {
        assert_eq!(Value::Byte(87).signature(), "y");
        assert_eq!(Value::from("text").signature(), "s");
        assert_eq!(Value::Bytes(vec![1, 2]).signature(), "ay");
        assert_eq!(Value::Dict(Vec::new()).signature(), "a{sv}");
        assert_eq!(ValueKind::ObjectPathArray.to_string(), "ao");
    }

    #[test]
    fn test_gatt_byte_encoding() {
        assert_eq!(Value::Byte(87).to_le_bytes(), Some(vec![87]));
        assert_eq!(Value::UInt16(0x0102).to_le_bytes(), Some(vec![0x02, 0x01]));
        assert_eq!(Value::Bool(true).to_le_bytes(), Some(vec![1]));
        assert_eq!(Value::from("hi").to_le_bytes(), Some(b"hi".to_vec()));
        assert_eq!(Value::StringArray(vec!["a".into()]).to_le_bytes(), None);

        assert_eq!(
            Value::from_le_bytes(ValueKind::Int16, &[0xFF, 0xFF]),
            Some(Value::Int16(-1))
        );
        assert_eq!(
            Value::from_le_bytes(ValueKind::String, b"Hello"),
            Some(Value::from("Hello"))
        );
        // Fixed-width kinds reject short or long payloads
        assert_eq!(Value::from_le_bytes(ValueKind::UInt32, &[1, 2, 3]), None);
        assert_eq!(Value::from_le_bytes(ValueKind::Byte, &[1, 2]), None);
        // Invalid UTF-8
        assert_eq!(Value::from_le_bytes(ValueKind::String, &[0xC3, 0x28]), None);
    }

    #[test]
    fn test_dict_lookup() {
        let options = Value::Dict(vec![
            ("offset".to_string(), Value::UInt16(4)),
            ("device".to_string(), Value::from("/org/bluez/hci0/dev_00")),
        ]);
        assert_eq!(options.dict_get("offset"), Some(&Value::UInt16(4)));
        assert_eq!(options.dict_get("mtu"), None);
        assert_eq!(Value::Byte(0).dict_get("offset"), None);
    }
}
