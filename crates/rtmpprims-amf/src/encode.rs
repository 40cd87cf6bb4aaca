use bytes::{BufMut, BytesMut};

use crate::error::{AmfError, Result};
use crate::marker;
use crate::value::Value;

/// Encode exactly one value (marker + payload) into `dst`.
///
/// On error `dst` may hold a partial encoding; callers should discard it.
pub fn encode(value: &Value, dst: &mut BytesMut) -> Result<()> {
    dst.put_u8(value.marker());
    match value {
        Value::Number(n) => dst.put_f64(*n),
        Value::Boolean(b) => dst.put_u8(u8::from(*b)),
        Value::String(text) => put_short_utf8(text, dst)?,
        Value::Object(properties) => put_properties(properties, dst)?,
        Value::Null | Value::Undefined | Value::Unsupported => {}
        Value::Reference(index) => dst.put_u16(*index),
        Value::EcmaArray { count, properties } => {
            dst.put_u32(*count);
            put_properties(properties, dst)?;
        }
        Value::StrictArray(items) => {
            dst.put_u32(u32_len(items.len())?);
            for item in items {
                encode(item, dst)?;
            }
        }
        Value::Date { millis, timezone } => {
            dst.put_f64(*millis);
            dst.put_i16(*timezone);
        }
        Value::LongString(text) | Value::XmlDocument(text) => put_long_utf8(text, dst)?,
        Value::TypedObject {
            class_name,
            properties,
        } => {
            put_short_utf8(class_name, dst)?;
            put_properties(properties, dst)?;
        }
    }
    Ok(())
}

fn put_properties(properties: &[(String, Value)], dst: &mut BytesMut) -> Result<()> {
    for (key, value) in properties {
        put_short_utf8(key, dst)?;
        encode(value, dst)?;
    }
    dst.put_u16(0);
    dst.put_u8(marker::OBJECT_END);
    Ok(())
}

fn put_short_utf8(text: &str, dst: &mut BytesMut) -> Result<()> {
    let len = u16::try_from(text.len()).map_err(|_| AmfError::StringTooLong(text.len()))?;
    dst.put_u16(len);
    dst.put_slice(text.as_bytes());
    Ok(())
}

fn put_long_utf8(text: &str, dst: &mut BytesMut) -> Result<()> {
    dst.put_u32(u32_len(text.len())?);
    dst.put_slice(text.as_bytes());
    Ok(())
}

fn u32_len(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| AmfError::LengthOverflow(len))
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::decode::decode;

    fn encode_to_vec(value: &Value) -> Vec<u8> {
        let mut dst = BytesMut::new();
        encode(value, &mut dst).unwrap();
        dst.to_vec()
    }

    #[test]
    fn number_is_big_endian_double() {
        assert_eq!(
            encode_to_vec(&Value::Number(1.0)),
            vec![0x00, 0x3F, 0xF0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn string_has_u16_length_prefix() {
        assert_eq!(
            encode_to_vec(&Value::text("connect")),
            vec![0x02, 0x00, 0x07, b'c', b'o', b'n', b'n', b'e', b'c', b't']
        );
    }

    #[test]
    fn object_ends_with_empty_key_and_end_marker() {
        let bytes = encode_to_vec(&Value::object([("app", Value::text("live"))]));
        assert_eq!(
            bytes,
            vec![
                0x03, 0x00, 0x03, b'a', b'p', b'p', 0x02, 0x00, 0x04, b'l', b'i', b'v', b'e',
                0x00, 0x00, 0x09
            ]
        );
    }

    #[test]
    fn oversized_short_string_fails() {
        let mut dst = BytesMut::new();
        let value = Value::String("x".repeat(u16::MAX as usize + 1));
        let err = encode(&value, &mut dst).unwrap_err();
        assert_eq!(err, AmfError::StringTooLong(u16::MAX as usize + 1));
    }

    #[test]
    fn oversized_property_key_fails() {
        let mut dst = BytesMut::new();
        let value = Value::object([("k".repeat(70_000), Value::Null)]);
        assert!(matches!(
            encode(&value, &mut dst),
            Err(AmfError::StringTooLong(70_000))
        ));
    }

    #[test]
    fn nested_values_reencode_identically() {
        let value = Value::TypedObject {
            class_name: "flex.Message".into(),
            properties: vec![
                (
                    "list".into(),
                    Value::StrictArray(vec![Value::Number(2.5), Value::Undefined]),
                ),
                (
                    "meta".into(),
                    Value::EcmaArray {
                        count: 7,
                        properties: vec![("width".into(), Value::Number(1280.0))],
                    },
                ),
                (
                    "when".into(),
                    Value::Date {
                        millis: 0.0,
                        timezone: 0,
                    },
                ),
                ("doc".into(), Value::XmlDocument("<a/>".into())),
                ("ref".into(), Value::Reference(1)),
            ],
        };
        let bytes = encode_to_vec(&value);
        let mut src = Bytes::from(bytes.clone());
        let decoded = decode(&mut src).unwrap();
        assert_eq!(decoded, value);
        assert!(src.is_empty());
        assert_eq!(encode_to_vec(&decoded), bytes);
    }
}
