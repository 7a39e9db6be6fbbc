//! Per-request dispatch: frame in, frame out.
//!
//! `process_frame` is infallible by construction. Every error raised while
//! parsing, validating or handling a request is converted into a correlated
//! error response so the connection can keep serving subsequent requests. A
//! request whose correlation id could not even be read is answered with
//! correlation id 0.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, warn};

use crate::broker::error::BrokerError;
use crate::broker::messages::ResponseMessage;
use crate::broker::protocol::decoding;
use crate::broker::registry::HandlerRegistry;

/// Handle one raw request frame (including its leading size prefix) and
/// produce the response payload, without the response size prefix.
pub fn process_frame(registry: &HandlerRegistry, frame: Bytes) -> BytesMut {
    match handle_frame(registry, frame) {
        Ok(response) => response,
        Err((correlation_id, err)) => {
            warn!(error = %err, code = err.error_code().code(), "request failed");
            encode_error_response(correlation_id, &err)
        }
    }
}

/// The fallible path: errors carry the correlation id when it was readable.
fn handle_frame(
    registry: &HandlerRegistry,
    frame: Bytes,
) -> Result<BytesMut, (Option<i32>, BrokerError)> {
    // Header failures happen before the correlation id is known.
    let info = decoding::parse_commons(frame).map_err(|e| (None, e))?;
    let correlation_id = info.correlation_id;
    let fail = |e| (Some(correlation_id), e);

    debug!(
        api_key = info.api_key,
        api_version = info.api_version,
        correlation_id,
        client_id = info.client_id.as_deref().unwrap_or("<null>"),
        "dispatching request"
    );

    let handler = registry
        .lookup(info.api_key)
        .ok_or_else(|| fail(BrokerError::UnknownApiKey(info.api_key)))?;

    if !handler.supported_versions().contains(info.api_version) {
        return Err(fail(BrokerError::UnsupportedVersion {
            api_key: info.api_key,
            api_version: info.api_version,
        }));
    }

    let schemas = handler.schemas(info.api_version).ok_or_else(|| {
        fail(BrokerError::Internal(format!(
            "handler for api key {} accepts version {} but declares no schemas for it",
            info.api_key, info.api_version
        )))
    })?;

    let request = decoding::parse_message(&info, schemas).map_err(fail)?;
    let body = handler
        .handle(&request, &info, &registry.supported_apis())
        .map_err(fail)?;

    ResponseMessage::new(correlation_id, body)
        .encode(schemas, info.api_version)
        .map_err(fail)
}

/// A minimal correlated error response: INT32 correlation id, INT16 error
/// code, nullable string message. Sent for any failed request regardless of
/// the api version, so even clients we could not fully parse get a readable
/// failure.
fn encode_error_response(correlation_id: Option<i32>, err: &BrokerError) -> BytesMut {
    let code = err.error_code();
    let mut buf = BytesMut::with_capacity(8 + code.message().len());
    buf.put_i32(correlation_id.unwrap_or(0));
    buf.put_i16(code.code());
    let message = code.message();
    buf.put_i16(message.len() as i16);
    buf.put_slice(message.as_bytes());
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::constants::{ERROR_INVALID_REQUEST, ERROR_UNSUPPORTED_VERSION};
    use crate::broker::handlers::api_versions::ApiVersionsHandler;

    fn registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register(Box::new(ApiVersionsHandler::new())).unwrap();
        registry
    }

    fn frame(api_key: i16, api_version: i16, correlation_id: i32, body: &[u8]) -> Bytes {
        let mut buf = BytesMut::new();
        let size = 2 + 2 + 4 + 2 + body.len();
        buf.put_i32(size as i32);
        buf.put_i16(api_key);
        buf.put_i16(api_version);
        buf.put_i32(correlation_id);
        buf.put_i16(-1); // null client id
        buf.put_slice(body);
        buf.freeze()
    }

    #[test]
    fn test_unknown_api_key_answered_with_invalid_request() {
        let response = process_frame(&registry(), frame(9999, 0, 55, &[]));
        assert_eq!(&response[..4], &55i32.to_be_bytes());
        assert_eq!(&response[4..6], &ERROR_INVALID_REQUEST.to_be_bytes());
    }

    #[test]
    fn test_version_above_max_answered_with_unsupported_version() {
        let response = process_frame(&registry(), frame(18, 99, 7, &[]));
        assert_eq!(&response[..4], &7i32.to_be_bytes());
        assert_eq!(&response[4..6], &ERROR_UNSUPPORTED_VERSION.to_be_bytes());
    }

    #[test]
    fn test_unreadable_header_answered_with_correlation_id_zero() {
        let mut buf = BytesMut::new();
        buf.put_i32(2);
        buf.put_i16(18); // frame ends before api_version
        let response = process_frame(&registry(), buf.freeze());
        assert_eq!(&response[..4], &0i32.to_be_bytes());
        assert_eq!(&response[4..6], &ERROR_INVALID_REQUEST.to_be_bytes());
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        // Version 0 has an empty body, so any payload byte is trailing.
        let response = process_frame(&registry(), frame(18, 0, 3, &[0xde, 0xad]));
        assert_eq!(&response[..4], &3i32.to_be_bytes());
        assert_eq!(&response[4..6], &ERROR_INVALID_REQUEST.to_be_bytes());
    }

    #[test]
    fn test_successful_dispatch_echoes_correlation_id() {
        let response = process_frame(&registry(), frame(18, 0, 1234, &[]));
        assert_eq!(&response[..4], &1234i32.to_be_bytes());
        // error_code NONE follows the correlation id
        assert_eq!(&response[4..6], &0i16.to_be_bytes());
    }
}
