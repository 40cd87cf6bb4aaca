use bytes::Buf;

use crate::error::{AmfError, Result};
use crate::marker;
use crate::value::{Properties, Value};

/// Maximum nesting of objects and arrays accepted by [`decode`].
pub const MAX_NESTING_DEPTH: usize = 64;

/// Decode exactly one value from `src`.
///
/// Consumes the marker and the value's payload and nothing else. Any length
/// that runs past `src.remaining()` fails with [`AmfError::Truncated`], so
/// limiting `src` (e.g. with [`Buf::take`]) bounds the read.
pub fn decode<B: Buf>(src: &mut B) -> Result<Value> {
    decode_nested(src, 0)
}

fn decode_nested<B: Buf>(src: &mut B, depth: usize) -> Result<Value> {
    if depth > MAX_NESTING_DEPTH {
        return Err(AmfError::NestingTooDeep(MAX_NESTING_DEPTH));
    }

    ensure(src, 1)?;
    let marker = src.get_u8();
    match marker {
        marker::NUMBER => {
            ensure(src, 8)?;
            Ok(Value::Number(src.get_f64()))
        }
        marker::BOOLEAN => {
            ensure(src, 1)?;
            // Only 0 and 1 re-encode to the same byte.
            match src.get_u8() {
                0x00 => Ok(Value::Boolean(false)),
                0x01 => Ok(Value::Boolean(true)),
                other => Err(AmfError::InvalidBoolean(other)),
            }
        }
        marker::STRING => Ok(Value::String(read_short_utf8(src)?)),
        marker::OBJECT => Ok(Value::Object(read_properties(src, depth)?)),
        marker::NULL => Ok(Value::Null),
        marker::UNDEFINED => Ok(Value::Undefined),
        marker::REFERENCE => {
            ensure(src, 2)?;
            Ok(Value::Reference(src.get_u16()))
        }
        marker::ECMA_ARRAY => {
            ensure(src, 4)?;
            let count = src.get_u32();
            let properties = read_properties(src, depth)?;
            Ok(Value::EcmaArray { count, properties })
        }
        marker::STRICT_ARRAY => {
            ensure(src, 4)?;
            let count = src.get_u32() as usize;
            // Every element takes at least one byte.
            ensure(src, count)?;
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(decode_nested(src, depth + 1)?);
            }
            Ok(Value::StrictArray(items))
        }
        marker::DATE => {
            ensure(src, 10)?;
            let millis = src.get_f64();
            let timezone = src.get_i16();
            Ok(Value::Date { millis, timezone })
        }
        marker::LONG_STRING => Ok(Value::LongString(read_long_utf8(src)?)),
        marker::UNSUPPORTED => Ok(Value::Unsupported),
        marker::XML_DOCUMENT => Ok(Value::XmlDocument(read_long_utf8(src)?)),
        marker::TYPED_OBJECT => {
            let class_name = read_short_utf8(src)?;
            let properties = read_properties(src, depth)?;
            Ok(Value::TypedObject {
                class_name,
                properties,
            })
        }
        marker::MOVIECLIP | marker::OBJECT_END | marker::RECORDSET | marker::AVMPLUS => {
            Err(AmfError::UnsupportedMarker(marker))
        }
        other => Err(AmfError::UnknownMarker(other)),
    }
}

fn read_properties<B: Buf>(src: &mut B, depth: usize) -> Result<Properties> {
    let mut properties = Vec::new();
    loop {
        let key = read_short_utf8(src)?;
        if key.is_empty() {
            ensure(src, 1)?;
            let end = src.get_u8();
            if end != marker::OBJECT_END {
                return Err(AmfError::MissingObjectEnd(end));
            }
            return Ok(properties);
        }
        let value = decode_nested(src, depth + 1)?;
        properties.push((key, value));
    }
}

fn read_short_utf8<B: Buf>(src: &mut B) -> Result<String> {
    ensure(src, 2)?;
    let len = src.get_u16() as usize;
    read_utf8(src, len)
}

fn read_long_utf8<B: Buf>(src: &mut B) -> Result<String> {
    ensure(src, 4)?;
    let len = src.get_u32() as usize;
    read_utf8(src, len)
}

fn read_utf8<B: Buf>(src: &mut B, len: usize) -> Result<String> {
    ensure(src, len)?;
    let mut raw = vec![0u8; len];
    src.copy_to_slice(&mut raw);
    String::from_utf8(raw).map_err(|_| AmfError::InvalidUtf8)
}

fn ensure<B: Buf>(src: &B, needed: usize) -> Result<()> {
    let remaining = src.remaining();
    if remaining < needed {
        return Err(AmfError::Truncated { needed, remaining });
    }
    Ok(())
}
