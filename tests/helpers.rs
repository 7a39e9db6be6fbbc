//! Shared builders for integration tests.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use wirebroker::broker::handlers::ApiVersionsHandler;
use wirebroker::broker::HandlerRegistry;

/// Registry with the standard handler set
pub fn default_registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register(Box::new(ApiVersionsHandler::new()))
        .expect("registry build must succeed");
    registry
}

/// Build a complete request frame: size prefix, common header, body bytes
pub fn request_frame(
    api_key: i16,
    api_version: i16,
    correlation_id: i32,
    client_id: Option<&str>,
    body: &[u8],
) -> Bytes {
    let client_len = client_id.map_or(0, str::len);
    let mut buf = BytesMut::new();
    buf.put_i32((2 + 2 + 4 + 2 + client_len + body.len()) as i32);
    buf.put_i16(api_key);
    buf.put_i16(api_version);
    buf.put_i32(correlation_id);
    match client_id {
        Some(id) => {
            buf.put_i16(id.len() as i16);
            buf.put_slice(id.as_bytes());
        }
        None => buf.put_i16(-1),
    }
    buf.put_slice(body);
    buf.freeze()
}

/// Append a compact (length+1 uvarint prefixed) string
pub fn put_compact_string(buf: &mut BytesMut, s: &str) {
    wirebroker::broker::protocol::encoding::write_unsigned_varint(buf, s.len() as u64 + 1);
    buf.put_slice(s.as_bytes());
}

/// Read an INT16-prefixed string out of a response buffer
pub fn take_string(buf: &mut Bytes) -> Option<String> {
    let len = buf.get_i16();
    if len == -1 {
        return None;
    }
    let raw = buf.split_to(len as usize);
    Some(String::from_utf8(raw.to_vec()).expect("response strings are UTF-8"))
}
