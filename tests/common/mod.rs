#![allow(dead_code)]
// Owned document tree used by the integration tests. The library itself
// never materializes documents; tests build them to drive both trees.

use std::io::Write as _;

use docstream::{
    read_cbor, read_json, write_cbor, write_json, Document, Error, TokenRead, TokenWrite,
    ValueWriter, Writer,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn text(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

pub fn write_root<T: TokenWrite>(
    writer: &mut Writer<T>,
    value: &Value,
    sized: bool,
) -> Result<(), Error> {
    match value {
        Value::Undefined => writer.write_undefined(),
        Value::Null => writer.write_null(),
        Value::Bool(v) => writer.write_bool(*v),
        Value::Unsigned(v) => writer.write_u64(*v),
        Value::Signed(v) => writer.write_i64(*v),
        Value::Float(v) => writer.write_f64(*v),
        Value::Bytes(b) => {
            let mut s = if sized {
                writer.write_byte_string_sized(b.len() as u64)?
            } else {
                writer.write_byte_string()?
            };
            s.write_all(b).map_err(Error::from)?;
            s.finish()
        }
        Value::Text(t) => {
            let mut s = if sized {
                writer.write_text_sized(t.len() as u64)?
            } else {
                writer.write_text()?
            };
            s.write_all(t.as_bytes()).map_err(Error::from)?;
            s.finish()
        }
        Value::Array(items) => {
            let mut a = if sized {
                writer.write_array_sized(items.len() as u64)?
            } else {
                writer.write_array()?
            };
            for item in items {
                write_slot(a.append()?, item, sized)?;
            }
            a.finish()
        }
        Value::Map(pairs) => {
            let mut m = if sized {
                writer.write_map_sized(pairs.len() as u64)?
            } else {
                writer.write_map()?
            };
            for (k, v) in pairs {
                write_slot(m.append_key()?, k, sized)?;
                write_slot(m.append_value()?, v, sized)?;
            }
            m.finish()
        }
    }
}

pub fn write_slot<T: TokenWrite>(
    slot: ValueWriter<'_, T>,
    value: &Value,
    sized: bool,
) -> Result<(), Error> {
    match value {
        Value::Undefined => slot.write_undefined(),
        Value::Null => slot.write_null(),
        Value::Bool(v) => slot.write_bool(*v),
        Value::Unsigned(v) => slot.write_u64(*v),
        Value::Signed(v) => slot.write_i64(*v),
        Value::Float(v) => slot.write_f64(*v),
        Value::Bytes(b) => {
            let mut s = if sized {
                slot.write_byte_string_sized(b.len() as u64)?
            } else {
                slot.write_byte_string()?
            };
            s.write_all(b).map_err(Error::from)?;
            s.finish()
        }
        Value::Text(t) => {
            let mut s = if sized {
                slot.write_text_sized(t.len() as u64)?
            } else {
                slot.write_text()?
            };
            s.write_all(t.as_bytes()).map_err(Error::from)?;
            s.finish()
        }
        Value::Array(items) => {
            let mut a = if sized {
                slot.write_array_sized(items.len() as u64)?
            } else {
                slot.write_array()?
            };
            for item in items {
                write_slot(a.append()?, item, sized)?;
            }
            a.finish()
        }
        Value::Map(pairs) => {
            let mut m = if sized {
                slot.write_map_sized(pairs.len() as u64)?
            } else {
                slot.write_map()?
            };
            for (k, v) in pairs {
                write_slot(m.append_key()?, k, sized)?;
                write_slot(m.append_value()?, v, sized)?;
            }
            m.finish()
        }
    }
}

pub fn read_value<T: TokenRead>(doc: Document<'_, T>) -> Result<Value, Error> {
    Ok(match doc {
        Document::Undefined => Value::Undefined,
        Document::Null => Value::Null,
        Document::Boolean(v) => Value::Bool(v),
        Document::UnsignedInt(v) => Value::Unsigned(v),
        Document::SignedInt(v) => Value::Signed(v),
        Document::FloatingPoint(v) => Value::Float(v),
        Document::ByteString(s) => Value::Bytes(s.read_all()?),
        Document::TextString(s) => Value::Text(s.read_all_text()?),
        Document::Array(mut a) => {
            let mut items = Vec::new();
            while let Some(d) = a.read()? {
                items.push(read_value(d)?);
            }
            Value::Array(items)
        }
        Document::Map(mut m) => {
            let mut pairs = Vec::new();
            while let Some(k) = m.read_key()? {
                let key = read_value(k)?;
                let val = read_value(m.read_value()?)?;
                pairs.push((key, val));
            }
            Value::Map(pairs)
        }
    })
}

pub fn to_cbor(value: &Value, sized: bool) -> Vec<u8> {
    let mut writer = write_cbor(Vec::new());
    write_root(&mut writer, value, sized).unwrap();
    writer.finish().unwrap().into_inner()
}

pub fn from_cbor(bytes: &[u8]) -> Value {
    let mut reader = read_cbor(bytes);
    read_value(reader.document().unwrap()).unwrap()
}

pub fn to_json(value: &Value, sized: bool) -> Vec<u8> {
    let mut writer = write_json(Vec::new());
    write_root(&mut writer, value, sized).unwrap();
    writer.finish().unwrap().into_inner()
}

pub fn from_json(bytes: &[u8]) -> Value {
    let mut reader = read_json(bytes);
    read_value(reader.document().unwrap()).unwrap()
}
