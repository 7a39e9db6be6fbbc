//! Request decoding.
//!
//! Turns a raw byte frame into the common header (`RequestInfo`) and, given a
//! schema set, into a fully structured message. Every violation of the wire
//! format is reported as `BrokerError::InvalidRequest` with the field being
//! read and the byte deficit; no error here ever aborts the process.
//!
//! Decoding is a pure function over the input buffer and the schema. It holds
//! no shared state and is safe to run concurrently across connections.

use bytes::{Buf, Bytes};

use crate::broker::constants::{MAX_REASONABLE_SIZE, MAX_VARINT32_BYTES, MAX_VARINT64_BYTES};
use crate::broker::error::{BrokerError, Result};
use crate::broker::messages::{RequestInfo, RequestMessage};

use super::schema::{Field, Schema, SchemaSet};
use super::types::DataType;
use super::value::{Struct, Value};

/// Parse the common request header from a raw frame.
///
/// The frame includes its own leading INT32 size, which must account for
/// every remaining byte exactly: under- and over-sized frames are rejected
/// before any field parsing begins.
pub fn parse_commons(frame: Bytes) -> Result<RequestInfo> {
    let mut buf = frame;
    if buf.remaining() < 4 {
        return Err(BrokerError::InvalidRequest(format!(
            "request too short to contain message size: {} bytes, minimum 4 required",
            buf.remaining()
        )));
    }
    let message_size = buf.get_i32();
    if buf.remaining() != message_size as usize {
        return Err(BrokerError::InvalidRequest(format!(
            "message size mismatch: header declares {message_size} bytes but {} follow",
            buf.remaining()
        )));
    }

    ensure_remaining(&buf, 8, "request headers (api_key, api_version, correlation_id)")?;
    let api_key = buf.get_i16();
    let api_version = buf.get_i16();
    let correlation_id = buf.get_i32();
    let client_id = read_nullable_string(&mut buf)?;

    Ok(RequestInfo {
        message_size,
        api_key,
        api_version,
        correlation_id,
        client_id,
        payload: buf,
    })
}

/// Parse the remaining request bytes into a structured message.
///
/// The header `Struct` is reconstructed from the fields already decoded into
/// `RequestInfo`; a V2 header additionally consumes its tagged-field block.
/// After header and body are decoded, any unconsumed byte is a protocol
/// error: the schema must account for the payload exactly.
pub fn parse_message(info: &RequestInfo, schemas: &SchemaSet) -> Result<RequestMessage> {
    let mut buf = info.payload.clone();
    let flexible = schemas.is_flexible();

    let mut header = Struct::new();
    header.set("request_api_key", DataType::Int16, Value::Int16(info.api_key));
    header.set("request_api_version", DataType::Int16, Value::Int16(info.api_version));
    header.set("correlation_id", DataType::Int32, Value::Int32(info.correlation_id));
    header.set(
        "client_id",
        DataType::NullableString,
        Value::String(info.client_id.clone()),
    );
    if schemas.request_header.is_flexible() {
        parse_tagged_fields(
            schemas.request_header.tag_schema(),
            info.api_version,
            &mut buf,
            &mut header,
        )?;
    }

    let body = parse_body(&schemas.request_body, &mut buf, info.api_version, flexible)?;

    if buf.has_remaining() {
        return Err(BrokerError::InvalidRequest(format!(
            "request has {} trailing bytes that were not read",
            buf.remaining()
        )));
    }

    Ok(RequestMessage { header, body })
}

/// Parse a message body: ordered untagged fields filtered by version, then
/// the tagged block when the negotiated schema set is flexible.
pub fn parse_body(
    schema: &Schema,
    buf: &mut Bytes,
    api_version: i16,
    flexible: bool,
) -> Result<Struct> {
    let mut body = Struct::new();
    for field in schema.fields() {
        if field.tag.is_none() && field.versions.contains(api_version) {
            let value = decode_value(field, buf, api_version, flexible)?;
            body.set(field.name, field.data_type, value);
        }
    }
    if flexible {
        parse_tagged_fields(schema, api_version, buf, &mut body)?;
    }
    Ok(body)
}

/// Walk a tagged-field block: uvarint count, then per entry
/// (uvarint tag, uvarint size, size bytes of payload).
///
/// A declared tag valid for this version decodes its payload sub-range and
/// must consume it exactly; unknown tags are skipped by byte count for
/// forward compatibility. Tags are walked strictly sequentially and are not
/// deduplicated: a repeated tag simply overwrites the earlier value.
fn parse_tagged_fields(
    schema: &Schema,
    api_version: i16,
    buf: &mut Bytes,
    target: &mut Struct,
) -> Result<()> {
    let count = read_unsigned_varint32(buf, "tagged field count")?;
    for _ in 0..count {
        let tag = read_unsigned_varint32(buf, "tagged field tag")?;
        let size = read_unsigned_varint32(buf, "tagged field size")? as usize;
        ensure_remaining(buf, size, &format!("tagged field {tag}"))?;
        let mut field_buf = buf.split_to(size);

        match schema.tagged_field(tag) {
            Some(field) if field.versions.contains(api_version) => {
                let value = decode_value(field, &mut field_buf, api_version, true)?;
                if field_buf.has_remaining() {
                    return Err(BrokerError::InvalidRequest(format!(
                        "tagged field {tag} has {} trailing bytes that were not read",
                        field_buf.remaining()
                    )));
                }
                target.set(field.name, field.data_type, value);
            }
            // Unknown or version-excluded tag: the payload was already
            // consumed by split_to, which is exactly the skip-by-size rule.
            _ => {}
        }
    }
    Ok(())
}

/// Decode one value according to its declared wire type
fn decode_value(
    field: &Field,
    buf: &mut Bytes,
    api_version: i16,
    flexible: bool,
) -> Result<Value> {
    match field.data_type {
        DataType::Boolean => {
            ensure_remaining(buf, 1, "BOOLEAN")?;
            Ok(Value::Boolean(buf.get_u8() != 0))
        }
        DataType::Int8 => {
            ensure_remaining(buf, 1, "INT8")?;
            Ok(Value::Int8(buf.get_i8()))
        }
        DataType::Int16 => {
            ensure_remaining(buf, 2, "INT16")?;
            Ok(Value::Int16(buf.get_i16()))
        }
        DataType::Int32 => {
            ensure_remaining(buf, 4, "INT32")?;
            Ok(Value::Int32(buf.get_i32()))
        }
        DataType::Int64 => {
            ensure_remaining(buf, 8, "INT64")?;
            Ok(Value::Int64(buf.get_i64()))
        }
        DataType::Varint => {
            let raw = read_unsigned_varint32(buf, "VARINT")?;
            Ok(Value::Varint(decode_zigzag32(raw)))
        }
        DataType::UnsignedVarint => {
            let raw = read_unsigned_varint64(buf, "UNSIGNED_VARINT")?;
            Ok(Value::UnsignedVarint(raw))
        }
        DataType::Float64 => {
            ensure_remaining(buf, 8, "FLOAT64")?;
            Ok(Value::Float64(buf.get_f64()))
        }
        DataType::String => {
            ensure_remaining(buf, 2, "string length")?;
            let len = buf.get_i16();
            Ok(Value::String(Some(read_string(buf, len as i32)?)))
        }
        DataType::NullableString => Ok(Value::String(read_nullable_string(buf)?)),
        DataType::CompactString => {
            let len = read_unsigned_varint32(buf, "compact string length")? as i64 - 1;
            if len == -1 {
                return Err(BrokerError::InvalidRequest(
                    "compact string must not be null".to_string(),
                ));
            }
            Ok(Value::String(Some(read_string(buf, len as i32)?)))
        }
        DataType::CompactNullableString => {
            let len = read_unsigned_varint32(buf, "compact string length")? as i64 - 1;
            if len == -1 {
                return Ok(Value::String(None));
            }
            Ok(Value::String(Some(read_string(buf, len as i32)?)))
        }
        DataType::Array => {
            ensure_remaining(buf, 4, "array length")?;
            let len = buf.get_i32();
            read_array(buf, field, len, api_version, flexible)
        }
        DataType::CompactArray => {
            let len = read_unsigned_varint32(buf, "compact array length")? as i64 - 1;
            read_array(buf, field, len as i32, api_version, flexible)
        }
        DataType::Struct => {
            let schema = nested_schema(field)?;
            Ok(Value::Struct(parse_struct(schema, buf, api_version, flexible)?))
        }
    }
}

/// Decode a nested struct: its fields filtered by version, then its own
/// tagged block when the message is flexible
fn parse_struct(
    schema: &Schema,
    buf: &mut Bytes,
    api_version: i16,
    flexible: bool,
) -> Result<Struct> {
    let mut value = Struct::new();
    for field in schema.fields() {
        if field.tag.is_none() && field.versions.contains(api_version) {
            let decoded = decode_value(field, buf, api_version, flexible)?;
            value.set(field.name, field.data_type, decoded);
        }
    }
    if flexible {
        parse_tagged_fields(schema, api_version, buf, &mut value)?;
    }
    Ok(value)
}

fn read_array(
    buf: &mut Bytes,
    field: &Field,
    len: i32,
    api_version: i16,
    flexible: bool,
) -> Result<Value> {
    if len == -1 {
        return Ok(Value::Array(None));
    }
    if len < 0 {
        return Err(BrokerError::InvalidRequest(format!("invalid array length: {len}")));
    }
    if len as usize > MAX_REASONABLE_SIZE {
        return Err(BrokerError::InvalidRequest(format!(
            "array length {len} exceeds maximum reasonable size of {MAX_REASONABLE_SIZE}"
        )));
    }

    let schema = nested_schema(field)?;
    let mut elements = Vec::with_capacity(len as usize);
    for i in 0..len {
        let element = parse_element(schema, buf, api_version, flexible).map_err(|e| {
            BrokerError::InvalidRequest(format!("error parsing element {i} of array: {e}"))
        })?;
        elements.push(element);
    }
    Ok(Value::Array(Some(elements)))
}

/// An array element whose schema has exactly one field is a bare primitive;
/// otherwise each element is a full nested struct.
fn parse_element(
    schema: &Schema,
    buf: &mut Bytes,
    api_version: i16,
    flexible: bool,
) -> Result<Value> {
    match schema.fields() {
        [single] => decode_value(single, buf, api_version, flexible),
        _ => Ok(Value::Struct(parse_struct(schema, buf, api_version, flexible)?)),
    }
}

fn nested_schema(field: &Field) -> Result<&Schema> {
    field.nested.as_deref().ok_or_else(|| {
        BrokerError::Internal(format!(
            "schema bug: composite field '{}' declared without a nested schema",
            field.name
        ))
    })
}

// ===== Primitive readers =====

fn read_string(buf: &mut Bytes, len: i32) -> Result<String> {
    if len < 0 {
        return Err(BrokerError::InvalidRequest(format!("invalid string length: {len}")));
    }
    if len as usize > MAX_REASONABLE_SIZE {
        return Err(BrokerError::InvalidRequest(format!(
            "string length {len} exceeds maximum reasonable size of {MAX_REASONABLE_SIZE}"
        )));
    }
    ensure_remaining(buf, len as usize, &format!("string of length {len}"))?;
    let bytes = buf.split_to(len as usize);
    String::from_utf8(bytes.to_vec())
        .map_err(|e| BrokerError::InvalidRequest(format!("string is not valid UTF-8: {e}")))
}

pub(crate) fn read_nullable_string(buf: &mut Bytes) -> Result<Option<String>> {
    ensure_remaining(buf, 2, "nullable string length")?;
    let len = buf.get_i16();
    if len == -1 {
        return Ok(None);
    }
    Ok(Some(read_string(buf, len as i32)?))
}

/// Base-128 little-endian varint limited to the 32-bit domain (5 bytes)
pub fn read_unsigned_varint32(buf: &mut Bytes, what: &str) -> Result<u32> {
    let value = read_unsigned_varint(buf, MAX_VARINT32_BYTES, what)?;
    u32::try_from(value).map_err(|_| {
        BrokerError::InvalidRequest(format!("malformed varint for {what}: exceeds 32-bit range"))
    })
}

/// Base-128 little-endian varint limited to the 64-bit domain (10 bytes)
pub fn read_unsigned_varint64(buf: &mut Bytes, what: &str) -> Result<u64> {
    read_unsigned_varint(buf, MAX_VARINT64_BYTES, what)
}

fn read_unsigned_varint(buf: &mut Bytes, max_bytes: usize, what: &str) -> Result<u64> {
    let mut value = 0u64;
    let mut shift = 0;
    for _ in 0..max_bytes {
        if !buf.has_remaining() {
            return Err(BrokerError::InvalidRequest(format!(
                "malformed varint for {what}: insufficient bytes"
            )));
        }
        let b = buf.get_u8();
        value |= u64::from(b & 0x7f) << shift;
        if b & 0x80 == 0 {
            return Ok(value);
        }
        shift += 7;
    }
    Err(BrokerError::InvalidRequest(format!(
        "malformed varint for {what}: longer than {max_bytes} bytes"
    )))
}

/// `(u >> 1) ^ -(u & 1)` maps small-magnitude negatives onto small varints
pub fn decode_zigzag32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

fn ensure_remaining(buf: &Bytes, needed: usize, what: &str) -> Result<()> {
    if buf.remaining() < needed {
        return Err(BrokerError::InvalidRequest(format!(
            "buffer exhausted while reading {what}: expected {needed} bytes, but only {} are available",
            buf.remaining()
        )));
    }
    Ok(())
}
