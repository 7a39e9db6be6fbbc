//! Request and response message types shared across the broker.

use bytes::{BufMut, Bytes, BytesMut};

use crate::broker::error::Result;
use crate::broker::protocol::{encoding, SchemaSet, Struct};

/// The common request header, decoded before any schema is consulted.
///
/// `payload` holds the bytes remaining after the header fields; dispatch
/// passes them on for body parsing once the api key resolves to a handler.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    /// Size the client declared, already verified against the frame
    pub message_size: i32,
    pub api_key: i16,
    pub api_version: i16,
    pub correlation_id: i32,
    pub client_id: Option<String>,
    pub payload: Bytes,
}

/// A fully decoded request: header and body as structured values
#[derive(Debug, Clone)]
pub struct RequestMessage {
    pub header: Struct,
    pub body: Struct,
}

/// A response body paired with the correlation id it answers
#[derive(Debug)]
pub struct ResponseMessage {
    pub correlation_id: i32,
    pub body: Struct,
}

impl ResponseMessage {
    pub fn new(correlation_id: i32, body: Struct) -> Self {
        ResponseMessage { correlation_id, body }
    }

    /// Serialize header and body per the schema set, without the size prefix
    pub fn encode(&self, schemas: &SchemaSet, api_version: i16) -> Result<BytesMut> {
        encoding::encode_message(self, schemas, api_version)
    }

    /// Serialize including the leading INT32 size prefix
    pub fn frame(&self, schemas: &SchemaSet, api_version: i16) -> Result<BytesMut> {
        let payload = self.encode(schemas, api_version)?;
        let mut framed = BytesMut::with_capacity(4 + payload.len());
        framed.put_i32(payload.len() as i32);
        framed.put_slice(&payload);
        Ok(framed)
    }
}

/// One row of the advertised API table: an api key and the inclusive version
/// range the broker accepts for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedApi {
    pub api_key: i16,
    pub min_version: i16,
    pub max_version: i16,
}
