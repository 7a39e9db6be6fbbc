//! Response encoding.
//!
//! Walks the response schema in declaration order and serializes the struct's
//! values with the same wire rules the decoder enforces. A value missing for
//! a field the version requires, or a value that cannot be represented (for
//! instance a string longer than an INT16 prefix can carry), surfaces as
//! `BrokerError::Encoding`; it indicates a handler bug, not a client fault.

use bytes::{BufMut, BytesMut};

use crate::broker::error::{BrokerError, Result};
use crate::broker::messages::ResponseMessage;

use super::schema::{Field, Schema, SchemaSet};
use super::types::DataType;
use super::value::{Struct, Value};

/// Encode a complete response: header per the schema set's response header
/// version, then the body. The frame size prefix is not written here; the
/// transport layer prepends it.
pub fn encode_message(
    response: &ResponseMessage,
    schemas: &SchemaSet,
    api_version: i16,
) -> Result<BytesMut> {
    let mut buf = BytesMut::with_capacity(64);
    buf.put_i32(response.correlation_id);
    if schemas.response_header.is_flexible() {
        // Header V1 carries a tagged block; none are declared today.
        write_unsigned_varint(&mut buf, 0);
    }
    encode_body(&response.body, &schemas.response_body, &mut buf, api_version, schemas.is_flexible())?;
    Ok(buf)
}

/// Encode a body struct against its schema: untagged fields in declaration
/// order, filtered by version, then the tagged block when flexible.
pub fn encode_body(
    value: &Struct,
    schema: &Schema,
    buf: &mut BytesMut,
    api_version: i16,
    flexible: bool,
) -> Result<()> {
    for field in schema.fields() {
        if field.tag.is_none() && field.versions.contains(api_version) {
            let v = value.get(field.name).ok_or_else(|| {
                BrokerError::Encoding(format!(
                    "missing value for field '{}' required at version {api_version}",
                    field.name
                ))
            })?;
            encode_value(v, field, buf, api_version, flexible)?;
        }
    }
    if flexible {
        encode_tagged_fields(value, schema, buf, api_version)?;
    }
    Ok(())
}

/// Write the tagged block: uvarint count of the declared tags that have a
/// value, then each as (tag, payload size, payload), in declaration order.
fn encode_tagged_fields(
    value: &Struct,
    schema: &Schema,
    buf: &mut BytesMut,
    api_version: i16,
) -> Result<()> {
    let present: Vec<(&Field, &Value)> = schema
        .fields()
        .iter()
        .filter(|f| f.tag.is_some() && f.versions.contains(api_version))
        .filter_map(|f| value.get(f.name).map(|v| (f, v)))
        .collect();

    write_unsigned_varint(buf, present.len() as u64);
    for (field, v) in present {
        // The size prefix needs the payload length up front, so each tagged
        // payload is encoded into a scratch buffer first.
        let mut payload = BytesMut::new();
        encode_value(v, field, &mut payload, api_version, true)?;
        write_unsigned_varint(buf, u64::from(field.tag.unwrap_or(0)));
        write_unsigned_varint(buf, payload.len() as u64);
        buf.put_slice(&payload);
    }
    Ok(())
}

fn encode_value(
    value: &Value,
    field: &Field,
    buf: &mut BytesMut,
    api_version: i16,
    flexible: bool,
) -> Result<()> {
    match (value, field.data_type) {
        (Value::Boolean(v), DataType::Boolean) => buf.put_u8(u8::from(*v)),
        (Value::Int8(v), DataType::Int8) => buf.put_i8(*v),
        (Value::Int16(v), DataType::Int16) => buf.put_i16(*v),
        (Value::Int32(v), DataType::Int32) => buf.put_i32(*v),
        (Value::Int64(v), DataType::Int64) => buf.put_i64(*v),
        (Value::Varint(v), DataType::Varint) => {
            write_unsigned_varint(buf, u64::from(encode_zigzag32(*v)));
        }
        (Value::UnsignedVarint(v), DataType::UnsignedVarint) => write_unsigned_varint(buf, *v),
        (Value::Float64(v), DataType::Float64) => buf.put_f64(*v),
        (Value::String(v), DataType::String | DataType::NullableString) => {
            write_string(buf, field, v.as_deref())?;
        }
        (Value::String(v), DataType::CompactString | DataType::CompactNullableString) => {
            write_compact_string(buf, field, v.as_deref())?;
        }
        (Value::Array(v), DataType::Array) => {
            match v {
                None => buf.put_i32(-1),
                Some(elements) => {
                    let len = i32::try_from(elements.len()).map_err(|_| {
                        BrokerError::Encoding(format!(
                            "array '{}' has too many elements for an INT32 count",
                            field.name
                        ))
                    })?;
                    buf.put_i32(len);
                    write_elements(elements, field, buf, api_version, flexible)?;
                }
            }
        }
        (Value::Array(v), DataType::CompactArray) => {
            match v {
                None => write_unsigned_varint(buf, 0),
                Some(elements) => {
                    write_unsigned_varint(buf, elements.len() as u64 + 1);
                    write_elements(elements, field, buf, api_version, flexible)?;
                }
            }
        }
        (Value::Struct(v), DataType::Struct) => {
            let schema = nested_schema(field)?;
            encode_body(v, schema, buf, api_version, flexible)?;
        }
        (v, t) => {
            return Err(BrokerError::Encoding(format!(
                "value for field '{}' has shape {v:?}, cannot encode as {t:?}",
                field.name
            )));
        }
    }
    Ok(())
}

fn write_elements(
    elements: &[Value],
    field: &Field,
    buf: &mut BytesMut,
    api_version: i16,
    flexible: bool,
) -> Result<()> {
    let schema = nested_schema(field)?;
    for element in elements {
        match (schema.fields(), element) {
            // Single-field element schemas carry bare values on the wire
            ([single], v) if !matches!(v, Value::Struct(_)) => {
                encode_value(v, single, buf, api_version, flexible)?;
            }
            (_, Value::Struct(s)) => encode_body(s, schema, buf, api_version, flexible)?,
            (_, v) => {
                return Err(BrokerError::Encoding(format!(
                    "array '{}' element has shape {v:?}, expected a struct",
                    field.name
                )));
            }
        }
    }
    Ok(())
}

fn nested_schema(field: &Field) -> Result<&Schema> {
    field.nested.as_deref().ok_or_else(|| {
        BrokerError::Encoding(format!(
            "schema bug: composite field '{}' declared without a nested schema",
            field.name
        ))
    })
}

// ===== Primitive writers =====

fn write_string(buf: &mut BytesMut, field: &Field, value: Option<&str>) -> Result<()> {
    match value {
        None => buf.put_i16(-1),
        Some(s) => {
            let len = i16::try_from(s.len()).map_err(|_| {
                BrokerError::Encoding(format!(
                    "string for field '{}' is {} bytes, too long for an INT16 length prefix",
                    field.name,
                    s.len()
                ))
            })?;
            buf.put_i16(len);
            buf.put_slice(s.as_bytes());
        }
    }
    Ok(())
}

fn write_compact_string(buf: &mut BytesMut, field: &Field, value: Option<&str>) -> Result<()> {
    match value {
        None => write_unsigned_varint(buf, 0),
        Some(s) => {
            let len = u32::try_from(s.len()).map_err(|_| {
                BrokerError::Encoding(format!(
                    "string for field '{}' is {} bytes, too long for a compact length prefix",
                    field.name,
                    s.len()
                ))
            })?;
            write_unsigned_varint(buf, u64::from(len) + 1);
            buf.put_slice(s.as_bytes());
        }
    }
    Ok(())
}

/// Base-128 little-endian: 7 value bits per byte, high bit marks continuation
pub fn write_unsigned_varint(buf: &mut BytesMut, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | 0x80);
    }
}

/// `(v << 1) ^ (v >> 31)`, the inverse of the decoder's zig-zag
pub fn encode_zigzag32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::protocol::decoding::{decode_zigzag32, read_unsigned_varint64};
    use crate::broker::protocol::version::VersionRange;

    #[test]
    fn test_write_varint_boundaries() {
        let mut buf = BytesMut::new();
        write_unsigned_varint(&mut buf, 0);
        assert_eq!(&buf[..], &[0x00]);

        let mut buf = BytesMut::new();
        write_unsigned_varint(&mut buf, 127);
        assert_eq!(&buf[..], &[0x7f]);

        let mut buf = BytesMut::new();
        write_unsigned_varint(&mut buf, 128);
        assert_eq!(&buf[..], &[0x80, 0x01]);

        let mut buf = BytesMut::new();
        write_unsigned_varint(&mut buf, 300);
        assert_eq!(&buf[..], &[0xac, 0x02]);
    }

    #[test]
    fn test_varint64_max_round_trip() {
        let mut buf = BytesMut::new();
        write_unsigned_varint(&mut buf, u64::MAX);
        assert_eq!(buf.len(), 10);
        let mut bytes = buf.freeze();
        assert_eq!(read_unsigned_varint64(&mut bytes, "t").unwrap(), u64::MAX);
    }

    #[test]
    fn test_zigzag_encode_pairs() {
        assert_eq!(encode_zigzag32(0), 0);
        assert_eq!(encode_zigzag32(-1), 1);
        assert_eq!(encode_zigzag32(1), 2);
        assert_eq!(encode_zigzag32(-2), 3);
        assert_eq!(encode_zigzag32(i32::MIN), u32::MAX);
        assert_eq!(decode_zigzag32(encode_zigzag32(i32::MAX)), i32::MAX);
    }

    #[test]
    fn test_nullable_string_null_sentinels() {
        let plain = Field::plain("s", DataType::NullableString, VersionRange::since(0));
        let mut buf = BytesMut::new();
        encode_value(&Value::String(None), &plain, &mut buf, 0, false).unwrap();
        assert_eq!(&buf[..], &(-1i16).to_be_bytes());

        let compact = Field::plain("s", DataType::CompactNullableString, VersionRange::since(0));
        let mut buf = BytesMut::new();
        encode_value(&Value::String(None), &compact, &mut buf, 0, true).unwrap();
        assert_eq!(&buf[..], &[0x00]);
    }

    #[test]
    fn test_compact_string_length_biased_by_one() {
        let field = Field::plain("s", DataType::CompactString, VersionRange::since(0));
        let mut buf = BytesMut::new();
        encode_value(&Value::String(Some("abc".into())), &field, &mut buf, 0, true).unwrap();
        assert_eq!(&buf[..], &[0x04, b'a', b'b', b'c']);
    }

    #[test]
    fn test_missing_required_field_is_an_error() {
        let schema = Schema::new(vec![Field::plain(
            "error_code",
            DataType::Int16,
            VersionRange::since(0),
        )]);
        let err = encode_body(&Struct::new(), &schema, &mut BytesMut::new(), 0, false).unwrap_err();
        assert!(err.to_string().contains("missing value for field 'error_code'"));
    }

    #[test]
    fn test_version_excluded_field_is_skipped() {
        let schema = Schema::new(vec![
            Field::plain("error_code", DataType::Int16, VersionRange::since(0)),
            Field::plain("throttle_time_ms", DataType::Int32, VersionRange::since(1)),
        ]);
        let mut body = Struct::new();
        body.set("error_code", DataType::Int16, Value::Int16(0));

        // throttle_time_ms only exists from version 1 on, so v0 encodes
        // without it and does not miss it.
        let mut buf = BytesMut::new();
        encode_body(&body, &schema, &mut buf, 0, false).unwrap();
        assert_eq!(buf.len(), 2);

        let err = encode_body(&body, &schema, &mut BytesMut::new(), 1, false).unwrap_err();
        assert!(err.to_string().contains("throttle_time_ms"));
    }

    #[test]
    fn test_empty_tagged_block_when_flexible() {
        let schema = Schema::new(vec![Field::plain(
            "error_code",
            DataType::Int16,
            VersionRange::since(0),
        )]);
        let mut body = Struct::new();
        body.set("error_code", DataType::Int16, Value::Int16(0));

        let mut buf = BytesMut::new();
        encode_body(&body, &schema, &mut buf, 3, true).unwrap();
        // INT16 plus a zero tagged-field count
        assert_eq!(&buf[..], &[0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_tagged_field_carries_tag_size_payload() {
        let schema = Schema::new(vec![
            Field::plain("error_code", DataType::Int16, VersionRange::since(0)),
            Field::tagged("session_id", DataType::Int32, VersionRange::since(0), 5),
        ]);
        let mut body = Struct::new();
        body.set("error_code", DataType::Int16, Value::Int16(0));
        body.set("session_id", DataType::Int32, Value::Int32(77));

        let mut buf = BytesMut::new();
        encode_body(&body, &schema, &mut buf, 0, true).unwrap();
        // error_code, count=1, tag=5, size=4, INT32 77
        assert_eq!(&buf[..], &[0x00, 0x00, 0x01, 0x05, 0x04, 0x00, 0x00, 0x00, 0x4d]);
    }
}
